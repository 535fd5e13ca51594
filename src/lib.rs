use std::{
    fmt::Display,
    path::PathBuf,
    sync::{Arc, Mutex},
    time::Duration,
};

use bytes::Bytes;
use database::{CreateDatabaseOperation, DropDatabaseOperation};
use error::InfluxError;
use query::{QueryOperation, QueryRequest};
use reqwest::{header::HeaderMap, Method, Response};
use url::Url;
use write::{WriteOperation, WriteRequest};

use batch::PointStream;

pub mod batch;
pub mod database;
pub mod error;
pub mod macros;
pub mod model;
pub mod query;
pub mod util;
pub mod write;

#[cfg(test)]
pub mod test_util;

const USER_AGENT: &str = "influxdb-line-client/0.1.0";

pub const DEFAULT_PORT: u16 = 8086;

pub type InfluxResult<T> = Result<T, InfluxError>;

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub enum InfluxOp {
    #[default]
    Undefined,

    CreateDatabase,
    DropDatabase,
    Write,
    Query,
}

impl From<InfluxOp> for String {
    fn from(value: InfluxOp) -> Self {
        value.to_string()
    }
}

impl Display for InfluxOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            InfluxOp::Undefined => "_Undefined_",
            InfluxOp::CreateDatabase => "CreateDatabase",
            InfluxOp::DropDatabase => "DropDatabase",
            InfluxOp::Write => "Write",
            InfluxOp::Query => "Query",
        };

        write!(f, "{}", s)
    }
}

impl InfluxOp {
    /// Endpoint path, relative to the server base url
    pub fn path(&self) -> &'static str {
        match self {
            Self::Write => "write",
            _ => "query",
        }
    }

    pub fn method(&self) -> Method {
        match self {
            Self::Write => Method::POST,
            _ => Method::GET,
        }
    }

    /// Status codes the operation is successful with
    pub fn expected_codes(&self) -> &'static [u16] {
        match self {
            Self::Write => &[204],
            Self::CreateDatabase | Self::DropDatabase | Self::Query => &[200],
            Self::Undefined => &[],
        }
    }

    /// Sending the operation twice has the same effect as sending it once.
    /// A repeated write stores duplicate points
    pub fn is_idempotent(&self) -> bool {
        matches!(self, Self::CreateDatabase | Self::DropDatabase | Self::Query)
    }
}

/// Body of a request to send
#[derive(Debug, Default)]
pub(crate) enum RequestBody {
    #[default]
    Empty,
    Bytes(Bytes),
    File(PathBuf),

    /// Taken on first send, so it can not be retried.
    /// The slot keeps the first error the stream yields, reqwest only sees a copy of its message
    Stream(Option<PointStream>, Arc<Mutex<Option<InfluxError>>>),
}

impl RequestBody {
    pub(crate) fn stream(stream: PointStream) -> Self {
        Self::Stream(Some(stream), Arc::new(Mutex::new(None)))
    }

    fn is_replayable(&self) -> bool {
        !matches!(self, Self::Stream(..))
    }

    /// The error that made the stream body fail, if any
    fn take_stream_error(&self) -> Option<InfluxError> {
        match self {
            Self::Stream(_, slot) => slot.lock().ok().and_then(|mut e| e.take()),
            _ => None,
        }
    }

    async fn take_body(&mut self) -> InfluxResult<Option<reqwest::Body>> {
        match self {
            Self::Empty => Ok(None),
            Self::Bytes(bytes) => Ok(Some(reqwest::Body::from(bytes.clone()))),
            Self::File(path) => {
                let file = tokio::fs::File::open(path.as_path()).await?;
                Ok(Some(reqwest::Body::from(file)))
            }
            Self::Stream(stream, slot) => match stream.take() {
                Some(s) => {
                    let slot = slot.clone();
                    let points = s.map(move |point| {
                        point.map_err(|e| {
                            let msg = e.to_string();
                            if let Ok(mut first) = slot.lock() {
                                first.get_or_insert(e);
                            }
                            std::io::Error::other(msg)
                        })
                    });
                    Ok(Some(reqwest::Body::wrap_stream(futures::stream::iter(points))))
                }
                None => Err(InfluxError::ValidationFailed("point stream has been consumed and can not be sent again".to_string())),
            },
        }
    }
}

/// The request to send to the InfluxDB server
#[derive(Debug, Default)]
pub struct InfluxRequest {
    operation: InfluxOp,
    headers: HeaderMap,
    query: Vec<(&'static str, String)>,
    body: RequestBody,
}

pub trait RetryPolicy: std::fmt::Debug + Send + Sync {
    /// Whether to send the request again. Arguments are the retried times, the operation and the error
    fn should_retry(&self, retried: u32, op: InfluxOp, error: &InfluxError) -> bool;

    /// Time to wait before the next attempt
    fn delay_ms(&self) -> u32;

    fn clone_box(&self) -> Box<dyn RetryPolicy>;
}

impl Clone for Box<dyn RetryPolicy> {
    fn clone(&self) -> Box<dyn RetryPolicy> {
        self.clone_box()
    }
}

/// Retries transport failures (connection refused, DNS, timeout) up to `max_retry_times`,
/// waiting `delay_ms` between attempts. Responses from the server are never retried.
#[derive(Debug, Copy, Clone)]
pub struct DefaultRetryPolicy {
    pub max_retry_times: u32,
    pub delay_ms: u32,
}

impl Default for DefaultRetryPolicy {
    fn default() -> Self {
        Self {
            max_retry_times: 3,
            delay_ms: 1000,
        }
    }
}

impl RetryPolicy for DefaultRetryPolicy {
    fn should_retry(&self, retried: u32, op: InfluxOp, error: &InfluxError) -> bool {
        if retried >= self.max_retry_times {
            log::info!("max retry reached {} times for operation {} with error {}", self.max_retry_times, op, error);
            return false;
        }

        matches!(error, InfluxError::TransportError(_))
    }

    fn delay_ms(&self) -> u32 {
        self.delay_ms
    }

    fn clone_box(&self) -> Box<dyn RetryPolicy> {
        Box::new(*self)
    }
}

#[derive(Debug, Clone)]
pub struct InfluxClientOptions {
    pub timeout_ms: Option<u64>,
    pub retry_policy: Box<dyn RetryPolicy>,

    /// Idle connections kept per host by the connection pool
    pub pool_max_idle_per_host: usize,
}

impl InfluxClientOptions {
    pub fn new() -> Self {
        Self {
            timeout_ms: Some(50_000),
            retry_policy: Box::new(DefaultRetryPolicy::default()),
            pool_max_idle_per_host: 100,
        }
    }

    pub fn timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = Some(timeout_ms);
        self
    }

    pub fn no_timeout(mut self) -> Self {
        self.timeout_ms = None;
        self
    }

    pub fn retry_policy(mut self, policy: impl RetryPolicy + 'static) -> Self {
        self.retry_policy = Box::new(policy);
        self
    }

    /// Shortcut for a [`DefaultRetryPolicy`] with the given budget
    pub fn max_retries(mut self, max_retry_times: u32) -> Self {
        self.retry_policy = Box::new(DefaultRetryPolicy {
            max_retry_times,
            ..Default::default()
        });
        self
    }

    pub fn pool_max_idle_per_host(mut self, n: usize) -> Self {
        self.pool_max_idle_per_host = n;
        self
    }

    pub fn retry_policy_mut(&mut self) -> &mut Box<dyn RetryPolicy> {
        &mut self.retry_policy
    }
}

impl Default for InfluxClientOptions {
    fn default() -> Self {
        Self::new()
    }
}

/// InfluxDB HTTP client.
///
/// Cloning is cheap and clones share the connection pool, so one client can be handed to many workers.
#[derive(Clone)]
pub struct InfluxClient {
    base_url: Url,
    user: Option<String>,
    password: Option<String>,
    http_client: reqwest::Client,
    options: InfluxClientOptions,
}

impl std::fmt::Debug for InfluxClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InfluxClient")
            .field("base_url", &self.base_url.as_str())
            .field("user", &self.user)
            .field("http_client", &self.http_client)
            .field("options", &self.options)
            .finish()
    }
}

impl InfluxClient {
    /// Client for `http://host:port` with default options
    pub fn new(host: &str, port: u16) -> InfluxResult<Self> {
        Self::with_options(host, port, InfluxClientOptions::default())
    }

    /// `host` may carry a scheme and a path prefix, e.g. `https://influx.example.com/influx`.
    /// Plain http is used if no scheme is given. A port inside `host` is replaced by `port`
    pub fn with_options(host: &str, port: u16, options: InfluxClientOptions) -> InfluxResult<Self> {
        let mut base_url = if host.contains("://") {
            Url::parse(host)?
        } else {
            Url::parse(&format!("http://{}", host))?
        };

        base_url
            .set_port(Some(port))
            .map_err(|_| InfluxError::ConfigError(format!("can not set port {} on host {}", port, host)))?;

        // endpoints are joined relative to the base, which needs a trailing slash
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .pool_max_idle_per_host(options.pool_max_idle_per_host)
            .build()?;

        Ok(Self {
            base_url,
            user: None,
            password: None,
            http_client,
            options,
        })
    }

    /// Build an InfluxClient from env values. All of them are optional:
    ///
    /// - `INFLUXDB_HOST`: defaults to `localhost`
    /// - `INFLUXDB_PORT`: defaults to `8086`
    /// - `INFLUXDB_USER` and `INFLUXDB_PASSWORD`: credentials, sent only when the user is set
    /// - `INFLUXDB_TIMEOUT_MS`: request timeout
    /// - `INFLUXDB_MAX_RETRIES`: retry budget for transport failures
    pub fn from_env() -> InfluxResult<Self> {
        let host = std::env::var("INFLUXDB_HOST").unwrap_or_else(|_| "localhost".to_string());
        let port = env_parse("INFLUXDB_PORT")?.unwrap_or(DEFAULT_PORT);

        let mut options = InfluxClientOptions::default();
        if let Some(ms) = env_parse("INFLUXDB_TIMEOUT_MS")? {
            options = options.timeout_ms(ms);
        }
        if let Some(n) = env_parse("INFLUXDB_MAX_RETRIES")? {
            options = options.max_retries(n);
        }

        let client = Self::with_options(&host, port, options)?;

        match std::env::var("INFLUXDB_USER") {
            Ok(user) => Ok(client.credentials(user, std::env::var("INFLUXDB_PASSWORD").unwrap_or_default())),
            Err(_) => Ok(client),
        }
    }

    /// Set the user and password sent as `u` and `p` with every request
    pub fn credentials(mut self, user: impl Into<String>, password: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self.password = Some(password.into());
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn options(&self) -> &InfluxClientOptions {
        &self.options
    }

    pub(crate) async fn send(&self, req: InfluxRequest) -> InfluxResult<Response> {
        let InfluxRequest {
            operation,
            headers,
            mut query,
            mut body,
        } = req;

        if let Some(user) = &self.user {
            query.push(("u", user.clone()));
            query.push(("p", self.password.clone().unwrap_or_default()));
        }

        let url = self.base_url.join(operation.path())?;
        let method = operation.method();

        let mut retried = 0u32;

        loop {
            let mut request_builder = self.http_client.request(method.clone(), url.clone()).query(&query).headers(headers.clone());

            if let Some(b) = body.take_body().await? {
                request_builder = request_builder.body(b);
            }

            // Handle per-request options
            if let Some(ms) = self.options.timeout_ms {
                request_builder = request_builder.timeout(Duration::from_millis(ms));
            }

            log::debug!(">> {} {} {}", operation, method, url);

            let e = match request_builder.send().await {
                Ok(response) => {
                    let status = response.status();
                    log::debug!("<< {} {}", operation, status);

                    if operation.expected_codes().contains(&status.as_u16()) {
                        return Ok(response);
                    }

                    let body = response.text().await.unwrap_or_default();

                    InfluxError::ApiResponseError {
                        operation,
                        code: status,
                        body,
                        expected: operation.expected_codes().to_vec(),
                    }
                }

                Err(e) => match body.take_stream_error() {
                    Some(stream_error) => stream_error,
                    None => InfluxError::TransportError(e),
                },
            };

            log::error!("api call failed, check retry against retry policy for operation {} and error {}", operation, e);

            if !body.is_replayable() {
                log::info!("request body of operation {} can not be replayed, no retry", operation);
                return Err(e);
            }

            let should_retry = self.options.retry_policy.should_retry(retried, operation, &e);
            log::info!("should retry {} for operation {} with error {}", should_retry, operation, e);

            if !should_retry {
                return Err(e);
            }

            let next_delay = self.options.retry_policy.delay_ms();
            log::info!("delay for {} ms to retry", next_delay);
            tokio::time::sleep(Duration::from_millis(next_delay as u64)).await;

            retried += 1;
        }
    }

    /// Create a database. Succeeds too if the database already exists
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # async fn run() -> influxdb_line_client::InfluxResult<()> {
    /// let client = influxdb_line_client::InfluxClient::new("localhost", 8086)?;
    /// client.create_database("unittestdb").send().await?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn create_database(&self, name: &str) -> CreateDatabaseOperation {
        CreateDatabaseOperation::new(self.clone(), name)
    }

    /// Drop a database with all its data
    pub fn drop_database(&self, name: &str) -> DropDatabaseOperation {
        DropDatabaseOperation::new(self.clone(), name)
    }

    /// Write points in line protocol
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # async fn run() -> influxdb_line_client::InfluxResult<()> {
    /// use influxdb_line_client::{batch::DummyPoints, model::Precision, write::WriteRequest, InfluxClient};
    ///
    /// let client = InfluxClient::new("localhost", 8086)?;
    /// let mut dummies = DummyPoints::new("Tilt5").npoints(1000).decimals(4).delta_seconds(600);
    ///
    /// // streamed as a chunked HTTP POST
    /// let request = WriteRequest::new("unittestdb").body(dummies.generate()).precision(Precision::Nanosecond);
    /// client.write(request).send().await?;
    ///
    /// // in memory, gzip compressed
    /// let request = WriteRequest::new("unittestdb").body(dummies.serialize(false)?).compress(true);
    /// client.write(request).send().await?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn write(&self, request: WriteRequest) -> WriteOperation {
        WriteOperation::new(self.clone(), request)
    }

    /// Run an InfluxQL query against a database
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # async fn run() -> influxdb_line_client::InfluxResult<()> {
    /// use influxdb_line_client::{query::QueryRequest, InfluxClient};
    ///
    /// let client = InfluxClient::new("localhost", 8086)?;
    /// let response = client.query(QueryRequest::new("unittestdb", "SELECT count(Y) FROM Tilt")).send().await?;
    /// for series in response.series() {
    ///     println!("{}: {:?}", series.name, series.values);
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub fn query(&self, request: QueryRequest) -> QueryOperation {
        QueryOperation::new(self.clone(), request)
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> InfluxResult<Option<T>>
where
    T::Err: Display,
{
    match std::env::var(key) {
        Ok(s) => s
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| InfluxError::ConfigError(format!("invalid value of {}: {}", key, e))),
        Err(_) => Ok(None),
    }
}
