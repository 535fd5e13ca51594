use crate::InfluxResult;

/// Line protocol bytes of exactly one point, `\n` terminated
pub type EncodedPoint = Vec<u8>;

/// A finite, single-pass, lazily produced sequence of encoded points.
///
/// Once consumed it can not be restarted. Use [`MeasurementBatch::points`](`super::MeasurementBatch::points`)
/// when the points need to be walked more than once.
pub struct PointStream {
    inner: Box<dyn Iterator<Item = InfluxResult<EncodedPoint>> + Send>,
}

impl PointStream {
    pub fn new<I>(iter: I) -> Self
    where
        I: Iterator<Item = InfluxResult<EncodedPoint>> + Send + 'static,
    {
        Self { inner: Box::new(iter) }
    }

    /// Consume the stream and concatenate all points
    pub fn collect_bytes(self) -> InfluxResult<Vec<u8>> {
        let mut buf = vec![];
        for point in self {
            buf.extend_from_slice(&point?);
        }
        Ok(buf)
    }
}

impl Iterator for PointStream {
    type Item = InfluxResult<EncodedPoint>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl std::fmt::Debug for PointStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PointStream").field("size_hint", &self.inner.size_hint()).finish()
    }
}
