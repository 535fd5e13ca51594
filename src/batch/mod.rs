//! Batches of points: materialized batches, the synthetic point generator and chunk planning

mod chunk_plan;
mod dummy_points;
mod measurement_batch;
mod point_stream;

use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

pub use chunk_plan::*;
pub use dummy_points::*;
pub use measurement_batch::*;
pub use point_stream::*;

use crate::{util::gzip, InfluxResult};

/// Concatenate all points in memory, gzip the result if `compress` is set
pub(crate) fn serialize_points(points: impl Iterator<Item = InfluxResult<EncodedPoint>>, compress: bool) -> InfluxResult<Vec<u8>> {
    let mut buf = vec![];
    for point in points {
        buf.extend_from_slice(&point?);
    }

    if compress {
        gzip(&buf)
    } else {
        Ok(buf)
    }
}

/// Write all points to the file at `path`.
///
/// Plain text is written point by point. Gzip needs the whole content, so a compressed dump
/// holds all points in memory before the single write.
/// The file is not removed if writing fails halfway.
pub(crate) fn dump_points(points: impl Iterator<Item = InfluxResult<EncodedPoint>>, path: impl AsRef<Path>, compress: bool) -> InfluxResult<()> {
    let path = path.as_ref();

    if compress {
        let bytes = serialize_points(points, true)?;
        std::fs::write(path, bytes).inspect_err(|e| log::error!("error dumping to {}: {}", path.display(), e))?;
        return Ok(());
    }

    let mut writer = BufWriter::new(File::create(path)?);
    let mut count = 0usize;

    for point in points {
        writer.write_all(&point?).inspect_err(|e| log::error!("error dumping to {}: {}", path.display(), e))?;
        count += 1;
    }

    writer.flush()?;
    log::debug!("{} points dumped to {}", count, path.display());

    Ok(())
}
