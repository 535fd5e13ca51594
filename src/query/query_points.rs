use std::collections::HashMap;

use serde::Deserialize;

use crate::{
    add_per_request_options,
    error::InfluxError,
    model::{rules::validate_database_name, Precision},
    InfluxClient, InfluxOp, InfluxRequest, InfluxResult,
};

/// Run an InfluxQL statement against a database.
///
/// Official document: <https://docs.influxdata.com/influxdb/v1/tools/api/#query-http-endpoint>
#[derive(Debug, Default, Clone)]
pub struct QueryRequest {
    pub database: String,
    pub query: String,

    /// Unit of returned timestamps. Timestamps are RFC3339 strings if not set
    pub epoch: Option<Precision>,
}

impl QueryRequest {
    pub fn new(database: &str, query: &str) -> Self {
        Self {
            database: database.to_string(),
            query: query.to_string(),
            epoch: None,
        }
    }

    pub fn epoch(mut self, epoch: Precision) -> Self {
        self.epoch = Some(epoch);
        self
    }

    fn validate(&self) -> InfluxResult<()> {
        if !validate_database_name(&self.database) {
            return Err(InfluxError::ValidationFailed(format!("invalid database name: {}", self.database)));
        }

        if self.query.trim().is_empty() {
            return Err(InfluxError::ValidationFailed("query can not be empty".to_string()));
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Series {
    pub name: String,

    /// Present for `GROUP BY` queries
    #[serde(default)]
    pub tags: Option<HashMap<String, String>>,

    #[serde(default)]
    pub columns: Vec<String>,

    #[serde(default)]
    pub values: Vec<Vec<serde_json::Value>>,
}

impl Series {
    /// Position of a column by name
    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    /// Values of one column, as integers. Rows with a non-integer value are skipped
    pub fn column_i64(&self, column: &str) -> Vec<i64> {
        let Some(idx) = self.column_index(column) else {
            return vec![];
        };

        self.values.iter().filter_map(|row| row.get(idx).and_then(|v| v.as_i64())).collect()
    }
}

/// Result of one statement of the query
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct StatementResult {
    #[serde(default)]
    pub statement_id: u32,

    #[serde(default)]
    pub series: Vec<Series>,

    /// Statement level error, e.g. `database not found: unittestdb`
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct QueryResponse {
    #[serde(default)]
    pub results: Vec<StatementResult>,

    /// Request level error
    #[serde(default)]
    pub error: Option<String>,
}

impl QueryResponse {
    /// All series of all statements
    pub fn series(&self) -> impl Iterator<Item = &Series> {
        self.results.iter().flat_map(|r| r.series.iter())
    }

    /// First error reported by the server, request level before statement level
    pub fn first_error(&self) -> Option<&str> {
        self.error.as_deref().or_else(|| self.results.iter().find_map(|r| r.error.as_deref()))
    }
}

#[derive(Debug, Clone)]
pub struct QueryOperation {
    client: InfluxClient,
    request: QueryRequest,
}

add_per_request_options!(QueryOperation);

impl QueryOperation {
    pub(crate) fn new(client: InfluxClient, request: QueryRequest) -> Self {
        Self { client, request }
    }

    /// Statement level errors are returned in the response, see [`QueryResponse::first_error`]
    pub async fn send(self) -> InfluxResult<QueryResponse> {
        self.request.validate()?;

        let Self { client, request } = self;

        let mut query = vec![("db", request.database.clone()), ("q", request.query.clone())];
        if let Some(epoch) = &request.epoch {
            query.push(("epoch", epoch.to_string()));
        }

        let req = InfluxRequest {
            operation: InfluxOp::Query,
            query,
            ..Default::default()
        };

        let response = client.send(req).await?;
        let bytes = response.bytes().await?;
        let resp: QueryResponse = serde_json::from_slice(&bytes)?;

        log::debug!("query <{}> returned {} series", request.query, resp.series().count());

        Ok(resp)
    }
}
