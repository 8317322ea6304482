//! # mgmtkit-core
//!
//! Core types for mgmtkit, the cloud management command toolkit.
//!
//! This crate provides the building blocks shared by the commands and the
//! replay test harness:
//!
//! - **HTTP model**: recorded and observed requests and responses
//! - **Sessions**: named recordings of HTTP exchanges, a file-backed store and a recorder
//! - **Validation**: the pluggable contract comparing observed requests with recorded ones
//! - **VHD layouts**: static field tables for fixed-size disk structures, and the VHD footer
//! - **Error handling**: unified `MgmtError` type with rich diagnostics
//!
//! This crate does not depend on any async runtime.
//!
//! # Example
//!
//! ```rust
//! use mgmtkit_core::{
//!     http::{HttpRequest, HttpResponse},
//!     session::{HttpSession, SessionCollection},
//! };
//!
//! let session = HttpSession::new("UnitTests.Ping")
//!     .with_exchange(HttpRequest::new("GET", "/ping"), HttpResponse::new(204));
//!
//! let collection: SessionCollection = [session].into_iter().collect();
//! assert!(collection.get_session("UnitTests.Ping").is_ok());
//! assert!(collection.get_session("UnitTests.Pong").is_err());
//! ```
//!
//! # Feature Flags
//!
//! - `fancy-errors`: terminal-friendly `miette` reports.

#![deny(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod http;
pub mod session;
pub mod validator;
pub mod vhd;

// Re-export commonly used types at the crate root
pub use error::{ErrorCategory, MgmtError, MgmtResultExt};
pub use http::{Headers, HttpMessage, HttpRequest, HttpResponse};
pub use session::{HttpSession, SessionCollection, SessionRecorder, SessionSettings, SessionStore};
pub use validator::{DefaultRequestValidator, RequestValidator, ValidationError};

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```rust
/// use mgmtkit_core::prelude::*;
/// ```
pub mod prelude {
    pub use crate::error::{ErrorCategory, MgmtError, MgmtResultExt};
    pub use crate::http::{Headers, HttpMessage, HttpRequest, HttpResponse};
    pub use crate::session::{
        HttpSession, SessionCollection, SessionRecorder, SessionSettings, SessionStore,
    };
    pub use crate::validator::{DefaultRequestValidator, RequestValidator, ValidationError};
    pub use crate::vhd::{VhdEntity, VhdFooter, VhdSerializer};
}
