//! Prelude module for convenient imports.
//!
//! ```rust
//! use mgmtkit::prelude::*;
//!
//! let ctx = ExecutionContext::new();
//! let streams = OutputStreams::new();
//! assert!(streams.objects.is_empty());
//! assert!(!ctx.client_session_id().is_empty());
//! ```
//!
//! ## Included Types
//!
//! ### Core Types
//! - HTTP model and sessions (`HttpRequest`, `HttpSession`, `SessionStore`, ...)
//! - Validation (`RequestValidator`, `ValidationError`)
//! - Errors (`MgmtError`, `ErrorCategory`)
//! - VHD (`VhdFooter`, `VhdSerializer`)
//!
//! ### Command Types
//! - `Cmdlet`, `ExecutionContext`, `CommandRuntime`, `OutputStreams`
//! - The commands and their clients

// Core types
pub use mgmtkit_core::prelude::*;

// Command types
pub use mgmtkit_cmdlets::prelude::*;
