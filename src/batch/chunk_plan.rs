use crate::{error::InfluxError, InfluxResult};

/// Splits a total point count into parcels of at most `max_chunk` points.
///
/// Every chunk is `max_chunk` except the last, which takes the remainder.
///
/// ```
/// use influxdb_line_client::batch::ChunkPlan;
///
/// let sizes = ChunkPlan::new(25000, 10000).unwrap().collect::<Vec<_>>();
/// assert_eq!(vec![10000, 10000, 5000], sizes);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkPlan {
    total: u64,
    max_chunk: u64,
    remaining_chunks: u64,
    remainder: i128,
}

impl ChunkPlan {
    pub fn new(total: u64, max_chunk: u64) -> InfluxResult<Self> {
        if max_chunk == 0 {
            return Err(InfluxError::ValidationFailed("max chunk size must be greater than 0".to_string()));
        }

        Ok(Self {
            total,
            max_chunk,
            remaining_chunks: total.div_ceil(max_chunk),
            remainder: total as i128,
        })
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn max_chunk(&self) -> u64 {
        self.max_chunk
    }
}

impl Iterator for ChunkPlan {
    type Item = u64;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining_chunks == 0 {
            return None;
        }

        self.remaining_chunks -= 1;
        self.remainder -= self.max_chunk as i128;

        let size = if self.remainder >= 0 {
            self.max_chunk
        } else {
            (self.remainder + self.max_chunk as i128) as u64
        };

        Some(size)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.remaining_chunks as usize;
        (n, Some(n))
    }
}

impl ExactSizeIterator for ChunkPlan {}
