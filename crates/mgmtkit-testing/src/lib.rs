//! HTTP replay harness for mgmtkit.
//!
//! Commands talk to the management service over HTTP. In tests they talk to
//! a [`MockHttpServer`] instead, which answers from a recorded
//! [`HttpSession`](mgmtkit_core::session::HttpSession) and validates every
//! request against the recording. This crate includes:
//!
//! - The mock server, in replay and record modes
//! - The [`ExceptionManager`] carrying validation faults back to the test
//! - Recorded fixture sessions and validators for the bundled commands
//! - Fault and response assertions
//!
//! # Overview
//!
//! ```rust,no_run
//! use mgmtkit_testing::prelude::*;
//! use mgmtkit_testing::fixtures;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! mgmtkit_testing::init_tracing();
//!
//! let exceptions = ExceptionManager::new();
//! let session = fixtures::get_database_session().with_validator(fixtures::odata_validator());
//! let server = MockHttpServer::start(&exceptions, "http://127.0.0.1:0/", session)?;
//!
//! // ... run the command against server.uri() ...
//!
//! server.stop()?.assert_all_consumed();
//! exceptions.finish()?;
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]

pub mod assertions;
pub mod config;
pub mod exceptions;
pub mod fixtures;
pub mod mock;
pub mod session;

use tracing_subscriber::EnvFilter;

// Re-export commonly used types
pub use config::{MockServerConfig, ReplayMode};
pub use exceptions::{ExceptionManager, FaultReporter, ReplayFault};
pub use mock::{MockHttpServer, NO_MORE_REQUESTS, ReplayReport};
pub use session::SessionDiff;

/// Install a test-friendly tracing subscriber.
///
/// Honors `RUST_LOG`, defaulting to `warn`. Output goes through the test
/// harness capture. Safe to call from every test.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::assertions::{assert_fault, assert_fault_at, assert_no_fault};
    pub use crate::config::{MockServerConfig, ReplayMode};
    pub use crate::exceptions::{ExceptionManager, FaultReporter, ReplayFault};
    pub use crate::mock::{MockHttpServer, ReplayReport};
    pub use crate::session::SessionDiff;
}
