use std::io::Write;

use chrono::Utc;
use flate2::{write::GzEncoder, Compression};

use crate::InfluxResult;

/// Current UTC time as nanoseconds since Unix epoch
pub(crate) fn current_time_ns() -> i64 {
    let now = Utc::now();
    now.timestamp_nanos_opt().unwrap_or(i64::MAX)
}

/// Gzip the whole buffer in memory
pub(crate) fn gzip(data: &[u8]) -> InfluxResult<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::with_capacity(data.len() / 4), Compression::default());
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}

#[cfg(test)]
pub(crate) fn gunzip(data: &[u8]) -> Vec<u8> {
    use std::io::Read;

    let mut decoder = flate2::read::GzDecoder::new(data);
    let mut out = vec![];
    decoder.read_to_end(&mut out).unwrap();
    out
}
