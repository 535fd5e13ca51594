use crate::{add_per_request_options, error::InfluxError, model::rules::validate_database_name, InfluxClient, InfluxOp, InfluxRequest, InfluxResult};

#[derive(Debug, Default, Clone)]
pub struct CreateDatabaseRequest {
    pub database: String,
}

impl CreateDatabaseRequest {
    pub fn new(database: &str) -> Self {
        Self { database: database.to_string() }
    }

    pub(crate) fn validate(&self) -> InfluxResult<()> {
        if !validate_database_name(&self.database) {
            return Err(InfluxError::ValidationFailed(format!("invalid database name: {}", self.database)));
        }

        Ok(())
    }

    pub(crate) fn statement(&self) -> String {
        format!("CREATE DATABASE \"{}\"", self.database)
    }
}

/// Create a database. The server answers `200` when the database already exists as well
#[derive(Debug, Clone)]
pub struct CreateDatabaseOperation {
    client: InfluxClient,
    request: CreateDatabaseRequest,
}

add_per_request_options!(CreateDatabaseOperation);

impl CreateDatabaseOperation {
    pub(crate) fn new(client: InfluxClient, database: &str) -> Self {
        Self {
            client,
            request: CreateDatabaseRequest::new(database),
        }
    }

    pub async fn send(self) -> InfluxResult<()> {
        self.request.validate()?;

        let Self { client, request } = self;

        let req = InfluxRequest {
            operation: InfluxOp::CreateDatabase,
            query: vec![("q", request.statement())],
            ..Default::default()
        };

        let response = client.send(req).await?;
        let text = response.text().await?;

        log::info!("database <{}> created or already exists: {}", request.database, text);

        Ok(())
    }
}
