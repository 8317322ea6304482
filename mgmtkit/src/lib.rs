//! # mgmtkit
//!
//! Cloud management commands, tested against recorded HTTP sessions.
//!
//! ## Features
//!
//! - **Commands** that marshal parameters into management API calls and
//!   write pipeline objects, error records and warnings
//! - **Deterministic replay**: a local mock server answers from recorded
//!   sessions and validates every request the command sends
//! - **VHD footer** layout declared as a static field table
//! - **Rich error handling** with context chains and miette diagnostics
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use mgmtkit::prelude::*;
//!
//! # async fn run() -> Result<(), MgmtError> {
//! let ctx = ExecutionContext::new();
//! let base = url::Url::parse("https://mgmt.example.net/")?;
//! let client = Arc::new(SqlDatabaseClient::new(SqlClientConfig::new(base, "testserver"), &ctx)?);
//!
//! let mut streams = OutputStreams::new();
//! GetAzureSqlDatabaseCommand::new(client)
//!     .execute_cmdlet(&ctx, &mut streams)
//!     .await?;
//! println!("{} databases", streams.databases().len());
//! # Ok(())
//! # }
//! ```
//!
//! ## Crate Organization
//!
//! - [`mgmtkit_core`] - HTTP sessions, request validation, VHD layouts (no async runtime)
//! - [`mgmtkit_cmdlets`] - The commands and their service clients
//! - `mgmtkit_testing` - The replay harness (feature `testing`)

#![deny(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]

// Re-export all public items from core
pub use mgmtkit_core::*;

// Re-export command types
pub use mgmtkit_cmdlets::{
    AddOn, AutoConfirm, Cmdlet, CommandRuntime, Confirmation, Database, ErrorRecord,
    ExecutionContext, GetAzureSqlDatabaseCommand, HttpStoreClient, NewAzureStoreAddOnCommand,
    OperationType, OutputStreams, PipelineObject, SqlClientConfig, SqlDatabaseClient, StoreClient,
    StoreClientConfig,
};

pub mod prelude;

/// Command module re-exports
pub mod cmdlets {
    //! Commands and service clients.
    pub use mgmtkit_cmdlets::*;
}

/// Replay harness re-exports
#[cfg(feature = "testing")]
pub mod testing {
    //! Mock server, exception manager and fixtures.
    pub use mgmtkit_testing::*;
}
