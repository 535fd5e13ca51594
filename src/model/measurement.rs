use std::fmt::Write;

use crate::{error::InfluxError, InfluxResult};

use super::{
    normalize,
    rules::{escape_key, escape_measurement, validate_identifier},
    Field, FieldValue, Precision,
};

/// Default number of digits after the decimal point for float fields
pub const DEFAULT_DECIMALS: usize = 3;

/// One point: series name, tags, fields and an optional timestamp.
///
/// Tags and fields are rendered in the order they were added.
///
/// ```
/// use influxdb_line_client::model::Measurement;
///
/// let m = Measurement::new("Tilt")
///     .tag("sensor", "1")
///     .field_float("X", -100.0)
///     .field_float("Y", 720.0)
///     .timestamp(1451471803567000000);
///
/// assert_eq!("Tilt,sensor=1 X=-100.00,Y=720.00 1451471803567000000\n", m.to_line(2).unwrap());
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Measurement {
    /// Series name
    pub name: String,

    /// Tags, in insertion order
    pub tags: Vec<(String, String)>,

    /// Fields, in insertion order
    pub fields: Vec<Field>,

    /// Epoch at `precision`. `None` lets the server assign the ingestion time
    pub timestamp: Option<i64>,

    /// Unit of `timestamp`
    pub precision: Precision,
}

impl Measurement {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Add a tag. Setting an existing key replaces its value and keeps its position
    pub fn tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let key = key.into();
        let value = value.into();

        match self.tags.iter_mut().find(|(k, _)| *k == key) {
            Some(tag) => tag.1 = value,
            None => self.tags.push((key, value)),
        }

        self
    }

    /// Set all tags
    pub fn tags(mut self, tags: impl IntoIterator<Item = (impl Into<String>, impl Into<String>)>) -> Self {
        self.tags = tags.into_iter().map(|(k, v)| (k.into(), v.into())).collect();
        self
    }

    /// Add a field. Setting an existing key replaces its value and keeps its position
    pub fn field(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        let field = Field::new(name, value);

        match self.fields.iter_mut().find(|f| f.name == field.name) {
            Some(f) => f.value = field.value,
            None => self.fields.push(field),
        }

        self
    }

    /// Set all fields
    pub fn fields(mut self, fields: impl IntoIterator<Item = Field>) -> Self {
        self.fields = fields.into_iter().collect();
        self
    }

    pub fn field_float(self, name: impl Into<String>, value: f64) -> Self {
        self.field(name, FieldValue::Float(value))
    }

    pub fn field_integer(self, name: impl Into<String>, value: i64) -> Self {
        self.field(name, FieldValue::Integer(value))
    }

    pub fn field_string(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.field(name, FieldValue::String(value.into()))
    }

    pub fn field_bool(self, name: impl Into<String>, value: bool) -> Self {
        self.field(name, FieldValue::Boolean(value))
    }

    /// Set the timestamp as an epoch already expressed in the measurement precision
    pub fn timestamp(mut self, ts: i64) -> Self {
        self.timestamp = Some(ts);
        self
    }

    /// Set the timestamp from a date time string, e.g. `2015-12-30 10:36:43.567`.
    /// It is converted with the precision set on this measurement, so set the precision first.
    ///
    /// Fails with [`InfluxError::InvalidTimestamp`] if the string does not match any supported layout.
    pub fn timestamp_str(mut self, s: &str) -> InfluxResult<Self> {
        match normalize(s, self.precision) {
            Some(ts) => {
                self.timestamp = Some(ts);
                Ok(self)
            }
            None => Err(InfluxError::InvalidTimestamp(format!("unsupported date time layout: {}", s))),
        }
    }

    /// Set the unit of the timestamp. The value itself is not converted
    pub fn precision(mut self, precision: Precision) -> Self {
        self.precision = precision;
        self
    }

    pub fn validate(&self) -> InfluxResult<()> {
        if !validate_identifier(&self.name) {
            return Err(InfluxError::EncodingError(format!("invalid measurement name: {:?}", self.name)));
        }

        if self.fields.is_empty() {
            return Err(InfluxError::EncodingError(format!("measurement {} has no fields", self.name)));
        }

        for (k, v) in &self.tags {
            if !validate_identifier(k) {
                return Err(InfluxError::EncodingError(format!("invalid tag key: {:?}", k)));
            }
            if !validate_identifier(v) {
                return Err(InfluxError::EncodingError(format!("invalid value of tag {}: {:?}", k, v)));
            }
        }

        for f in &self.fields {
            if !validate_identifier(&f.name) {
                return Err(InfluxError::EncodingError(format!("invalid field key: {:?}", f.name)));
            }
        }

        Ok(())
    }

    /// Line protocol representation, terminated with a single `\n`
    pub fn to_line(&self, decimals: usize) -> InfluxResult<String> {
        self.validate()?;

        let mut line = String::with_capacity(self.name.len() + 16 * (self.tags.len() + self.fields.len()) + 24);

        escape_measurement(&self.name, &mut line);

        for (k, v) in &self.tags {
            line.push(',');
            escape_key(k, &mut line);
            line.push('=');
            escape_key(v, &mut line);
        }

        line.push(' ');

        for (i, f) in self.fields.iter().enumerate() {
            if i > 0 {
                line.push(',');
            }
            escape_key(&f.name, &mut line);
            line.push('=');
            f.value.write_line_protocol(&mut line, decimals)?;
        }

        if let Some(ts) = self.timestamp {
            let _ = write!(line, " {}", ts);
        }

        line.push('\n');

        Ok(line)
    }

    /// Line protocol representation as bytes
    pub fn to_bytes(&self, decimals: usize) -> InfluxResult<Vec<u8>> {
        self.to_line(decimals).map(String::into_bytes)
    }
}
