//! # mgmtkit-cmdlets
//!
//! Management commands for mgmtkit.
//!
//! Commands are thin: they turn their parameters into calls against the
//! management service and write what comes back to a [`CommandRuntime`].
//!
//! - **`Get-AzureSqlDatabase`**: [`GetAzureSqlDatabaseCommand`] over [`SqlDatabaseClient`]
//! - **`New-AzureStoreAddOn`**: [`NewAzureStoreAddOnCommand`] over any [`StoreClient`]
//!
//! Every command receives an [`ExecutionContext`] carrying the user agent,
//! the client session id and the selected subscription.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use mgmtkit_cmdlets::prelude::*;
//! use url::Url;
//!
//! # async fn run() -> Result<(), mgmtkit_core::MgmtError> {
//! let ctx = ExecutionContext::new();
//! let config = SqlClientConfig::new(Url::parse("https://mgmt.example.net/")?, "testserver");
//! let client = Arc::new(SqlDatabaseClient::new(config, &ctx)?);
//!
//! let mut streams = OutputStreams::new();
//! GetAzureSqlDatabaseCommand::new(client)
//!     .with_database_name("testdb1")
//!     .execute_cmdlet(&ctx, &mut streams)
//!     .await?;
//!
//! for db in streams.databases() {
//!     println!("{} ({})", db.name, db.edition);
//! }
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]

pub mod commands;
pub mod confirmation;
pub mod context;
pub mod runtime;
pub mod sql;
pub mod store;

// Re-export commonly used types at the crate root
pub use commands::{Cmdlet, GetAzureSqlDatabaseCommand, NewAzureStoreAddOnCommand};
pub use confirmation::{AutoConfirm, Confirmation};
pub use context::ExecutionContext;
pub use runtime::{CommandRuntime, ErrorRecord, OutputStreams, PipelineObject};
pub use sql::{Database, SqlClientConfig, SqlDatabaseClient};
pub use store::{AddOn, HttpStoreClient, OperationType, StoreClient, StoreClientConfig};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::commands::{Cmdlet, GetAzureSqlDatabaseCommand, NewAzureStoreAddOnCommand};
    pub use crate::confirmation::{AutoConfirm, Confirmation};
    pub use crate::context::ExecutionContext;
    pub use crate::runtime::{CommandRuntime, ErrorRecord, OutputStreams, PipelineObject};
    pub use crate::sql::{Database, SqlClientConfig, SqlDatabaseClient};
    pub use crate::store::{AddOn, HttpStoreClient, OperationType, StoreClient, StoreClientConfig};
}
