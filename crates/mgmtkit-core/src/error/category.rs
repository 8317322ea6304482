//! Error categories reported alongside error records.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Coarse classification of an error, as shown to the user of a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// A named fixture or setting could not be found.
    Lookup,
    /// The target resource already exists.
    ResourceExists,
    /// The target resource does not exist.
    ObjectNotFound,
    /// The caller is not allowed to perform the operation.
    PermissionDenied,
    /// The service failed for another reason.
    Service,
    /// The connection to the service failed.
    Connection,
    /// An argument was malformed.
    InvalidArgument,
    /// Data could not be parsed or packed.
    InvalidData,
    /// Local file access failed.
    Io,
    /// An unexpected internal state.
    Internal,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lookup => write!(f, "lookup failed"),
            Self::ResourceExists => write!(f, "resource exists"),
            Self::ObjectNotFound => write!(f, "object not found"),
            Self::PermissionDenied => write!(f, "permission denied"),
            Self::Service => write!(f, "service error"),
            Self::Connection => write!(f, "connection error"),
            Self::InvalidArgument => write!(f, "invalid argument"),
            Self::InvalidData => write!(f, "invalid data"),
            Self::Io => write!(f, "I/O error"),
            Self::Internal => write!(f, "internal error"),
        }
    }
}
