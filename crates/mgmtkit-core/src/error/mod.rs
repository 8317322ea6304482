//! Unified error handling for mgmtkit.
//!
//! All fallible operations return [`MgmtError`]. The variants follow the
//! failure taxonomy of the replay harness and the commands built on it:
//!
//! | Failure | Variant | Surfaced as |
//! |---------|---------|-------------|
//! | Named session missing from the store | [`MgmtError::SessionNotFound`] | immediately, at load time |
//! | Name already in use at the service | [`MgmtError::ResourceConflict`] | terminating command error |
//! | Resource does not exist | [`MgmtError::ResourceNotFound`] | error record plus trace-id warnings |
//! | Service answered with an error status | [`MgmtError::Service`] | error record plus trace-id warnings |
//!
//! Replay validation failures are not `MgmtError`s: they are assertion
//! failures, see [`crate::validator::ValidationError`].
//!
//! ## Context Chaining
//!
//! ```rust
//! use mgmtkit_core::error::{MgmtError, MgmtResultExt};
//!
//! fn open_fixture() -> Result<(), MgmtError> {
//!     let name = "UnitTests.GetDatabase";
//!     let result: Result<(), MgmtError> = Err(MgmtError::session_not_found(name));
//!     result.with_context(|| format!("while preparing {name}"))?;
//!     Ok(())
//! }
//! ```

mod category;
mod context;
mod details;
mod types;

pub use category::ErrorCategory;
pub use context::MgmtResultExt;
pub use details::{BoxError, ServiceErrorDetails};
pub use types::MgmtError;
