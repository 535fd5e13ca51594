use crate::{add_per_request_options, error::InfluxError, model::rules::validate_database_name, InfluxClient, InfluxOp, InfluxRequest, InfluxResult};

#[derive(Debug, Default, Clone)]
pub struct DropDatabaseRequest {
    pub database: String,
}

impl DropDatabaseRequest {
    pub fn new(database: &str) -> Self {
        Self { database: database.to_string() }
    }

    fn validate(&self) -> InfluxResult<()> {
        if !validate_database_name(&self.database) {
            return Err(InfluxError::ValidationFailed(format!("invalid database name: {}", self.database)));
        }

        Ok(())
    }
}

/// Drop a database with all its series and retention policies
#[derive(Debug, Clone)]
pub struct DropDatabaseOperation {
    client: InfluxClient,
    request: DropDatabaseRequest,
}

add_per_request_options!(DropDatabaseOperation);

impl DropDatabaseOperation {
    pub(crate) fn new(client: InfluxClient, database: &str) -> Self {
        Self {
            client,
            request: DropDatabaseRequest::new(database),
        }
    }

    pub async fn send(self) -> InfluxResult<()> {
        self.request.validate()?;

        let Self { client, request } = self;

        let req = InfluxRequest {
            operation: InfluxOp::DropDatabase,
            query: vec![("q", format!("DROP DATABASE \"{}\"", request.database))],
            ..Default::default()
        };

        let response = client.send(req).await?;
        response.bytes().await?;

        log::info!("database <{}> dropped", request.database);

        Ok(())
    }
}
