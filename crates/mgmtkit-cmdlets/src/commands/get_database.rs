//! `Get-AzureSqlDatabase`.

use std::sync::Arc;

use async_trait::async_trait;
use mgmtkit_core::MgmtError;

use super::Cmdlet;
use crate::context::ExecutionContext;
use crate::runtime::{CommandRuntime, ErrorRecord};
use crate::sql::{Database, SqlDatabaseClient};

/// Which databases to get.
#[derive(Debug, Clone)]
enum Selection {
    All,
    Named(String),
    Piped(Database),
}

/// Gets every database on a server, one by name, or refreshes a piped one.
///
/// Service failures do not terminate the command: they are written as an
/// error record followed by two warnings carrying the client session id and
/// the client request id the client actually sent.
#[derive(Debug, Clone)]
pub struct GetAzureSqlDatabaseCommand {
    client: Arc<SqlDatabaseClient>,
    selection: Selection,
}

impl GetAzureSqlDatabaseCommand {
    /// Get every database.
    #[must_use]
    pub fn new(client: Arc<SqlDatabaseClient>) -> Self {
        Self {
            client,
            selection: Selection::All,
        }
    }

    /// Get only the database called `name`.
    #[must_use]
    pub fn with_database_name(mut self, name: impl Into<String>) -> Self {
        self.selection = Selection::Named(name.into());
        self
    }

    /// Refresh a database object received from the pipeline.
    #[must_use]
    pub fn with_database(mut self, database: Database) -> Self {
        self.selection = Selection::Piped(database);
        self
    }

    fn target(&self) -> Option<String> {
        match &self.selection {
            Selection::All => None,
            Selection::Named(name) => Some(name.clone()),
            Selection::Piped(db) => Some(db.name.clone()),
        }
    }

    async fn fetch(&self) -> Result<Vec<Database>, MgmtError> {
        match &self.selection {
            Selection::All => self.client.list_databases().await,
            Selection::Named(name) => Ok(vec![self.client.get_database(name).await?]),
            Selection::Piped(db) => Ok(vec![self.client.get_database(&db.name).await?]),
        }
    }
}

#[async_trait]
impl Cmdlet for GetAzureSqlDatabaseCommand {
    fn name(&self) -> &'static str {
        "Get-AzureSqlDatabase"
    }

    async fn execute_cmdlet(
        &mut self,
        _context: &ExecutionContext,
        runtime: &mut dyn CommandRuntime,
    ) -> Result<(), MgmtError> {
        match self.fetch().await {
            Ok(databases) => {
                tracing::debug!(server = self.client.server_name(), count = databases.len(), "Databases retrieved");
                for db in databases {
                    runtime.write_object(db.into());
                }
            }
            Err(e) => {
                tracing::warn!(server = self.client.server_name(), error = %e, "Get-AzureSqlDatabase failed");
                runtime.write_error(ErrorRecord::from_error(&e, "GetAzureSqlDatabase", self.target()));
                runtime.write_warning(format!("Client Session Id: '{}'", self.client.client_session_id()));
                runtime.write_warning(format!(
                    "Client Request Id: '{}'",
                    self.client.last_request_id().unwrap_or_default()
                ));
            }
        }
        Ok(())
    }
}
