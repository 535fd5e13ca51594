use std::path::PathBuf;

use bytes::Bytes;
use reqwest::{
    header::{HeaderValue, CONTENT_ENCODING, CONTENT_TYPE},
    StatusCode,
};

use crate::{
    add_per_request_options,
    batch::{MeasurementBatch, PointStream},
    error::InfluxError,
    model::{rules::validate_database_name, Precision},
    util::gzip,
    InfluxClient, InfluxOp, InfluxRequest, InfluxResult, RequestBody,
};

/// Points to post, already encoded as line protocol
#[derive(Debug)]
pub enum WriteBody {
    /// An in-memory buffer, sent with a content length
    Bytes(Bytes),

    /// A lazy sequence of points, sent with chunked transfer encoding.
    /// It is consumed by the request, so it is never retried
    Stream(PointStream),

    /// A file, streamed from disk
    File(PathBuf),
}

impl Default for WriteBody {
    fn default() -> Self {
        Self::Bytes(Bytes::new())
    }
}

impl WriteBody {
    /// Read the whole body into memory
    async fn materialize(self) -> InfluxResult<Vec<u8>> {
        match self {
            Self::Bytes(bytes) => Ok(bytes.to_vec()),
            Self::Stream(stream) => stream.collect_bytes(),
            Self::File(path) => Ok(tokio::fs::read(&path).await?),
        }
    }
}

impl From<Vec<u8>> for WriteBody {
    fn from(value: Vec<u8>) -> Self {
        Self::Bytes(Bytes::from(value))
    }
}

impl From<Bytes> for WriteBody {
    fn from(value: Bytes) -> Self {
        Self::Bytes(value)
    }
}

impl From<&'static [u8]> for WriteBody {
    fn from(value: &'static [u8]) -> Self {
        Self::Bytes(Bytes::from_static(value))
    }
}

impl From<String> for WriteBody {
    fn from(value: String) -> Self {
        Self::Bytes(Bytes::from(value))
    }
}

impl From<PointStream> for WriteBody {
    fn from(value: PointStream) -> Self {
        Self::Stream(value)
    }
}

impl From<MeasurementBatch> for WriteBody {
    fn from(value: MeasurementBatch) -> Self {
        Self::Stream(value.into_stream())
    }
}

impl From<PathBuf> for WriteBody {
    fn from(value: PathBuf) -> Self {
        Self::File(value)
    }
}

/// Write points to a database.
///
/// Official document: <https://docs.influxdata.com/influxdb/v1/tools/api/#write-http-endpoint>
#[derive(Debug, Default)]
pub struct WriteRequest {
    /// Target database
    pub database: String,

    pub body: WriteBody,

    /// Retention policy, forwarded as is. The server uses the default policy if not set
    pub retention_policy: Option<String>,

    /// Unit of the timestamps in the body
    pub precision: Option<Precision>,

    /// Write consistency, forwarded as is (`any`, `one`, `quorum`, `all` on clustered servers)
    pub consistency: Option<String>,

    /// Gzip the body before sending it
    pub compress: bool,

    /// The body is already gzip data, e.g. a compressed dump file
    pub gzipped: bool,
}

impl WriteRequest {
    pub fn new(database: &str) -> Self {
        Self {
            database: database.to_string(),
            ..Default::default()
        }
    }

    pub fn body(mut self, body: impl Into<WriteBody>) -> Self {
        self.body = body.into();
        self
    }

    /// Stream the body from a file
    pub fn file(mut self, path: impl Into<PathBuf>) -> Self {
        self.body = WriteBody::File(path.into());
        self
    }

    pub fn retention_policy(mut self, rp: impl Into<String>) -> Self {
        self.retention_policy = Some(rp.into());
        self
    }

    pub fn precision(mut self, precision: Precision) -> Self {
        self.precision = Some(precision);
        self
    }

    pub fn consistency(mut self, consistency: impl Into<String>) -> Self {
        self.consistency = Some(consistency.into());
        self
    }

    /// Gzip the body in memory before sending. Streams and files are read fully first
    pub fn compress(mut self, compress: bool) -> Self {
        self.compress = compress;
        self
    }

    /// Mark the body as already gzip compressed
    pub fn gzipped(mut self, gzipped: bool) -> Self {
        self.gzipped = gzipped;
        self
    }

    pub(crate) fn validate(&self) -> InfluxResult<()> {
        if !validate_database_name(&self.database) {
            return Err(InfluxError::ValidationFailed(format!("invalid database name: {}", self.database)));
        }

        if self.compress && self.gzipped {
            return Err(InfluxError::ValidationFailed("body is already gzipped, can not compress it again".to_string()));
        }

        Ok(())
    }

    pub(crate) fn query_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![("db", self.database.clone())];

        if let Some(rp) = &self.retention_policy {
            params.push(("rp", rp.clone()));
        }

        if let Some(p) = &self.precision {
            params.push(("precision", p.to_string()));
        }

        if let Some(c) = &self.consistency {
            params.push(("consistency", c.clone()));
        }

        params
    }
}

/// Outcome of a successful write
#[derive(Debug, Clone)]
pub struct WriteResponse {
    pub status: StatusCode,

    /// Size of the request body, `None` for streamed bodies
    pub body_size: Option<usize>,
}

#[derive(Debug)]
pub struct WriteOperation {
    client: InfluxClient,
    request: WriteRequest,
}

add_per_request_options!(WriteOperation);

impl WriteOperation {
    pub(crate) fn new(client: InfluxClient, request: WriteRequest) -> Self {
        Self { client, request }
    }

    pub async fn send(self) -> InfluxResult<WriteResponse> {
        self.request.validate()?;

        let Self { client, mut request } = self;

        let query = request.query_params();
        let mut req = InfluxRequest {
            operation: InfluxOp::Write,
            query,
            ..Default::default()
        };

        req.headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/plain; charset=utf-8"));

        if request.compress || request.gzipped {
            req.headers.insert(CONTENT_ENCODING, HeaderValue::from_static("gzip"));
        }

        let body = std::mem::take(&mut request.body);

        let body = if request.compress {
            let plain = body.materialize().await?;
            let compressed = gzip(&plain)?;
            log::debug!("write body compressed from {} to {} bytes", plain.len(), compressed.len());
            RequestBody::Bytes(Bytes::from(compressed))
        } else {
            match body {
                WriteBody::Bytes(b) => RequestBody::Bytes(b),
                WriteBody::Stream(s) => RequestBody::stream(s),
                WriteBody::File(p) => RequestBody::File(p),
            }
        };

        let body_size = match &body {
            RequestBody::Bytes(b) => Some(b.len()),
            _ => None,
        };

        req.body = body;

        let response = client.send(req).await?;
        let status = response.status();
        response.bytes().await?;

        log::info!("points added to database <{}>, code {}", request.database, status);

        Ok(WriteResponse { status, body_size })
    }
}
