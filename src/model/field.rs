use std::fmt::Write;

use crate::{error::InfluxError, InfluxResult};

/// Typed field value of a measurement
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Integer(i64),
    Float(f64),
    String(String),
    Boolean(bool),
}

impl FieldValue {
    /// Append the line protocol form of the value to `out`.
    ///
    /// - Float: fixed point with exactly `decimals` digits after the decimal point, e.g. `-100.00`
    /// - Integer: suffixed with `i`, e.g. `42i`
    /// - String: double quoted, `"` and `\` escaped
    /// - Boolean: `true` or `false`
    pub(crate) fn write_line_protocol(&self, out: &mut String, decimals: usize) -> InfluxResult<()> {
        match self {
            Self::Float(v) => {
                if !v.is_finite() {
                    return Err(InfluxError::EncodingError(format!("float field value must be finite, got {}", v)));
                }
                let _ = write!(out, "{:.*}", decimals, v);
            }

            Self::Integer(n) => {
                let _ = write!(out, "{}i", n);
            }

            Self::String(s) => {
                out.push('"');
                for c in s.chars() {
                    if c == '"' || c == '\\' {
                        out.push('\\');
                    }
                    out.push(c);
                }
                out.push('"');
            }

            Self::Boolean(b) => out.push_str(if *b { "true" } else { "false" }),
        }

        Ok(())
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<f32> for FieldValue {
    fn from(value: f32) -> Self {
        Self::Float(value as f64)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

/// A named field of a measurement
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub value: FieldValue,
}

impl Field {
    pub fn new(name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    pub fn from_float(name: impl Into<String>, value: f64) -> Self {
        Self::new(name, FieldValue::Float(value))
    }

    pub fn from_integer(name: impl Into<String>, value: i64) -> Self {
        Self::new(name, FieldValue::Integer(value))
    }

    pub fn from_string(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(name, FieldValue::String(value.into()))
    }

    pub fn from_bool(name: impl Into<String>, value: bool) -> Self {
        Self::new(name, FieldValue::Boolean(value))
    }
}
