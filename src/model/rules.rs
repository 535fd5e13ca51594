/// Validate a measurement name, tag key, tag value or field key.
///
/// - Non-empty
/// - No line breaks. A line break would end the point in the middle of the line
pub fn validate_identifier(s: &str) -> bool {
    !s.is_empty() && !s.contains(['\n', '\r'])
}

/// Validate a database name.
///
/// - Non-empty, at most 255 bytes
/// - No whitespace, double quote, semicolon or backslash. The name is interpolated into an InfluxQL statement
pub fn validate_database_name(name: &str) -> bool {
    if name.is_empty() || name.len() > 255 {
        return false;
    }

    name.chars().all(|c| !c.is_whitespace() && c != '"' && c != ';' && c != '\\')
}

/// Escape measurement name. Commas and spaces are escaped with backslash
pub(crate) fn escape_measurement(s: &str, out: &mut String) {
    escape_into(s, &[',', ' '], out);
}

/// Escape tag key, tag value and field key. Commas, equals signs and spaces are escaped with backslash
pub(crate) fn escape_key(s: &str, out: &mut String) {
    escape_into(s, &[',', '=', ' '], out);
}

fn escape_into(s: &str, special: &[char], out: &mut String) {
    for c in s.chars() {
        if special.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }
}
