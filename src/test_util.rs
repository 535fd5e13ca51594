use std::{
    collections::HashMap,
    sync::{Arc, Mutex, Once},
    time::Duration,
};

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{HeaderMap, Method, StatusCode, Uri},
    Router,
};

use crate::{DefaultRetryPolicy, InfluxClient, InfluxClientOptions};

static INIT: Once = Once::new();

pub(crate) fn setup() {
    INIT.call_once(|| {
        let _ = simple_logger::init_with_level(log::Level::Debug);
        let _ = dotenvy::dotenv();
    });
}

/// A request as received by [`MockInflux`]
#[derive(Debug, Clone)]
pub(crate) struct CapturedRequest {
    pub method: Method,
    pub path: String,
    pub params: HashMap<String, String>,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

#[derive(Debug, Clone, Default)]
struct MockState {
    responses: Arc<Mutex<HashMap<String, (u16, String)>>>,
    delay_ms: Arc<Mutex<u64>>,
    captured: Arc<Mutex<Vec<CapturedRequest>>>,
}

/// In-process stand-in for the InfluxDB HTTP api. `/write` answers `204` and `/query` answers `200`
/// with an empty result unless told otherwise.
pub(crate) struct MockInflux {
    pub port: u16,
    state: MockState,
}

impl MockInflux {
    pub async fn start() -> Self {
        setup();

        let state = MockState::default();
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let app = Router::new().fallback(handle).with_state(state.clone());
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { port, state }
    }

    /// Client without retries, pointed at this server
    pub fn client(&self) -> InfluxClient {
        self.client_with_retries(0)
    }

    /// Client retrying transport errors up to `max_retry_times` without delay
    pub fn client_with_retries(&self, max_retry_times: u32) -> InfluxClient {
        let options = InfluxClientOptions::new().timeout_ms(5000).retry_policy(DefaultRetryPolicy {
            max_retry_times,
            delay_ms: 0,
        });

        InfluxClient::with_options("127.0.0.1", self.port, options).unwrap()
    }

    /// Answer requests to `path` (e.g. `/write`) with this status and body
    pub fn respond(&self, path: &str, status: u16, body: &str) {
        self.state.responses.lock().unwrap().insert(path.to_string(), (status, body.to_string()));
    }

    /// Wait before answering any request
    pub fn delay(&self, ms: u64) {
        *self.state.delay_ms.lock().unwrap() = ms;
    }

    pub fn requests(&self) -> Vec<CapturedRequest> {
        self.state.captured.lock().unwrap().clone()
    }

    pub fn last_request(&self) -> CapturedRequest {
        self.requests().pop().unwrap()
    }
}

async fn handle(
    State(state): State<MockState>,
    method: Method,
    uri: Uri,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, String) {
    let path = uri.path().to_string();

    state.captured.lock().unwrap().push(CapturedRequest {
        method,
        path: path.clone(),
        params,
        headers,
        body: body.to_vec(),
    });

    let delay = *state.delay_ms.lock().unwrap();
    if delay > 0 {
        tokio::time::sleep(Duration::from_millis(delay)).await;
    }

    let configured = state.responses.lock().unwrap().get(&path).cloned();

    let (status, body) = match configured {
        Some(r) => r,
        None if path == "/write" => (204, String::new()),
        None => (200, r#"{"results":[{"statement_id":0}]}"#.to_string()),
    };

    (StatusCode::from_u16(status).unwrap(), body)
}
