use std::path::Path;

use crate::{model::Measurement, model::DEFAULT_DECIMALS, InfluxResult};

use super::{dump_points, serialize_points, EncodedPoint, PointStream};

#[derive(Debug, Clone, PartialEq)]
pub enum BatchItem {
    Measurement(Measurement),

    /// Already encoded line protocol, used verbatim
    Encoded(Vec<u8>),
}

impl BatchItem {
    fn encode(&self, decimals: usize) -> InfluxResult<EncodedPoint> {
        match self {
            Self::Measurement(m) => m.to_bytes(decimals),
            Self::Encoded(bytes) => Ok(bytes.clone()),
        }
    }
}

/// An ordered, materialized collection of points.
///
/// Points are encoded at serialization time with the batch `decimals`, in insertion order.
/// The batch can be walked any number of times.
#[derive(Debug, Clone, PartialEq)]
pub struct MeasurementBatch {
    items: Vec<BatchItem>,
    decimals: usize,
}

impl Default for MeasurementBatch {
    fn default() -> Self {
        Self::new(DEFAULT_DECIMALS)
    }
}

impl MeasurementBatch {
    pub fn new(decimals: usize) -> Self {
        Self { items: vec![], decimals }
    }

    pub fn decimals(&self) -> usize {
        self.decimals
    }

    pub fn set_decimals(&mut self, decimals: usize) {
        self.decimals = decimals;
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[BatchItem] {
        &self.items
    }

    pub fn append(&mut self, m: Measurement) -> &mut Self {
        self.items.push(BatchItem::Measurement(m));
        self
    }

    /// Append a pre-encoded point. A missing trailing `\n` is added
    pub fn append_encoded(&mut self, bytes: impl Into<Vec<u8>>) -> &mut Self {
        let mut bytes = bytes.into();
        if bytes.last() != Some(&b'\n') {
            bytes.push(b'\n');
        }
        self.items.push(BatchItem::Encoded(bytes));
        self
    }

    /// Encoded points in insertion order
    pub fn points(&self) -> impl Iterator<Item = InfluxResult<EncodedPoint>> + '_ {
        self.items.iter().map(|item| item.encode(self.decimals))
    }

    /// Turn the batch into a single-pass stream, e.g. for a chunked write
    pub fn into_stream(self) -> PointStream {
        let Self { items, decimals } = self;
        PointStream::new(items.into_iter().map(move |item| item.encode(decimals)))
    }

    /// All points concatenated in memory, optionally gzip compressed
    pub fn serialize(&self, compress: bool) -> InfluxResult<Vec<u8>> {
        serialize_points(self.points(), compress)
    }

    /// Write all points to a file, optionally gzip compressed
    pub fn dump(&self, path: impl AsRef<Path>, compress: bool) -> InfluxResult<()> {
        dump_points(self.points(), path, compress)
    }
}

impl Extend<Measurement> for MeasurementBatch {
    fn extend<T: IntoIterator<Item = Measurement>>(&mut self, iter: T) {
        self.items.extend(iter.into_iter().map(BatchItem::Measurement));
    }
}

impl FromIterator<Measurement> for MeasurementBatch {
    fn from_iter<T: IntoIterator<Item = Measurement>>(iter: T) -> Self {
        let mut batch = Self::default();
        batch.extend(iter);
        batch
    }
}
