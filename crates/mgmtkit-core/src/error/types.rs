//! The primary error type for mgmtkit.
//!
//! Every fallible operation in the workspace returns [`MgmtError`]. Large
//! variants are boxed to keep `Result<T, MgmtError>` small.

use miette::Diagnostic;
use thiserror::Error;

use super::category::ErrorCategory;
use super::details::{BoxError, ServiceErrorDetails};

/// The primary error type for mgmtkit.
#[derive(Error, Diagnostic, Debug)]
pub enum MgmtError {
    // ========================================================================
    // Session Store Errors
    // ========================================================================
    /// No session was recorded under the requested name.
    #[error("Session not found: {name}")]
    #[diagnostic(
        code(mgmt::session::not_found),
        help("Record the session first or check the session fixture file")
    )]
    SessionNotFound {
        /// The session name that was looked up.
        name: String,
    },

    // ========================================================================
    // Service Resource Errors
    // ========================================================================
    /// The service reported that a resource name is already taken.
    #[error("{message}")]
    #[diagnostic(code(mgmt::resource::conflict))]
    ResourceConflict {
        /// The resource that conflicted.
        resource: String,
        /// User-visible message.
        message: String,
    },

    /// The requested resource does not exist.
    #[error("{message}")]
    #[diagnostic(
        code(mgmt::resource::not_found),
        help("Verify the resource name and the server it lives on")
    )]
    ResourceNotFound {
        /// The resource that was not found.
        resource: String,
        /// User-visible message.
        message: String,
    },

    /// The service answered with a non-success status (details boxed).
    #[error("Service returned {}: {}", .0.status, .0.message)]
    #[diagnostic(code(mgmt::service::error))]
    Service(#[source] Box<ServiceErrorDetails>),

    // ========================================================================
    // Transport Errors
    // ========================================================================
    /// The HTTP call itself failed (connect, timeout, read).
    #[error("HTTP request failed: {message}")]
    #[diagnostic(code(mgmt::http::failed))]
    Http {
        /// Human-readable error message.
        message: String,
        /// The underlying error, if available.
        #[source]
        source: Option<BoxError>,
    },

    /// A listener could not bind its address.
    #[error("Failed to bind {address}: {source}")]
    #[diagnostic(
        code(mgmt::listener::bind),
        help("Another listener may still own this address")
    )]
    Bind {
        /// The address that could not be bound.
        address: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A URL or socket address could not be parsed.
    #[error("Invalid address '{address}': {reason}")]
    #[diagnostic(code(mgmt::address::invalid))]
    InvalidAddress {
        /// The offending address.
        address: String,
        /// Why it was rejected.
        reason: String,
    },

    // ========================================================================
    // Data Errors
    // ========================================================================
    /// JSON serialization or deserialization failed.
    #[error("Serialization error: {message}")]
    #[diagnostic(code(mgmt::serialization))]
    Serialization {
        /// Human-readable error message.
        message: String,
        /// The underlying error, if available.
        #[source]
        source: Option<BoxError>,
    },

    /// Reading or writing a file failed.
    #[error("I/O error: {source}")]
    #[diagnostic(code(mgmt::io))]
    Io {
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A VHD structure could not be packed or unpacked.
    #[error("Invalid VHD data in '{field}': {message}")]
    #[diagnostic(code(mgmt::vhd::format))]
    VhdFormat {
        /// The field (or structure) that failed.
        field: String,
        /// Human-readable error message.
        message: String,
    },

    // ========================================================================
    // Context-Wrapped Errors
    // ========================================================================
    /// An error with additional context.
    #[error("{context}: {source}")]
    #[diagnostic(code(mgmt::context))]
    WithContext {
        /// The context message.
        context: String,
        /// The underlying error.
        #[source]
        source: Box<MgmtError>,
    },

    /// A simple internal error with just a message.
    #[error("Internal error: {message}")]
    #[diagnostic(code(mgmt::internal))]
    Internal {
        /// Human-readable error message.
        message: String,
    },
}

// ============================================================================
// Error Construction Helpers
// ============================================================================

impl MgmtError {
    /// Create a session-not-found error.
    pub fn session_not_found(name: impl Into<String>) -> Self {
        Self::SessionNotFound { name: name.into() }
    }

    /// Create a resource conflict error.
    pub fn resource_conflict(resource: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ResourceConflict {
            resource: resource.into(),
            message: message.into(),
        }
    }

    /// Create a resource not found error.
    pub fn resource_not_found(resource: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ResourceNotFound {
            resource: resource.into(),
            message: message.into(),
        }
    }

    /// Create a service error from a status code and message.
    pub fn service(status: u16, message: impl Into<String>) -> Self {
        Self::Service(Box::new(ServiceErrorDetails {
            status,
            code: None,
            message: message.into(),
        }))
    }

    /// Create a service error carrying the service's own error code.
    pub fn service_with_code(
        status: u16,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Service(Box::new(ServiceErrorDetails {
            status,
            code: Some(code.into()),
            message: message.into(),
        }))
    }

    /// Create an HTTP transport error.
    pub fn http(message: impl Into<String>) -> Self {
        Self::Http {
            message: message.into(),
            source: None,
        }
    }

    /// Create an HTTP transport error with a source.
    pub fn http_with_source<E: std::error::Error + Send + Sync + 'static>(
        message: impl Into<String>,
        source: E,
    ) -> Self {
        Self::Http {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a bind error.
    pub fn bind(address: impl Into<String>, source: std::io::Error) -> Self {
        Self::Bind {
            address: address.into(),
            source,
        }
    }

    /// Create an invalid address error.
    pub fn invalid_address(address: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidAddress {
            address: address.into(),
            reason: reason.into(),
        }
    }

    /// Create a serialization error.
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
            source: None,
        }
    }

    /// Create a VHD format error.
    pub fn vhd_format(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::VhdFormat {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Classify this error for error records.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::SessionNotFound { .. } => ErrorCategory::Lookup,
            Self::ResourceConflict { .. } => ErrorCategory::ResourceExists,
            Self::ResourceNotFound { .. } => ErrorCategory::ObjectNotFound,
            Self::Service(details) => match details.status {
                404 => ErrorCategory::ObjectNotFound,
                409 => ErrorCategory::ResourceExists,
                401 | 403 => ErrorCategory::PermissionDenied,
                _ => ErrorCategory::Service,
            },
            Self::Http { .. } | Self::Bind { .. } => ErrorCategory::Connection,
            Self::InvalidAddress { .. } => ErrorCategory::InvalidArgument,
            Self::Serialization { .. } | Self::VhdFormat { .. } => ErrorCategory::InvalidData,
            Self::Io { .. } => ErrorCategory::Io,
            Self::WithContext { source, .. } => source.category(),
            Self::Internal { .. } => ErrorCategory::Internal,
        }
    }

    /// Check whether this error means "the resource does not exist".
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.category() == ErrorCategory::ObjectNotFound
    }

    /// Get the innermost error, skipping context wrappers.
    #[must_use]
    pub fn root(&self) -> &MgmtError {
        match self {
            Self::WithContext { source, .. } => source.root(),
            other => other,
        }
    }
}

// ============================================================================
// Standard Error Conversions
// ============================================================================

impl From<serde_json::Error> for MgmtError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}

impl From<std::io::Error> for MgmtError {
    fn from(err: std::io::Error) -> Self {
        Self::Io { source: err }
    }
}

impl From<url::ParseError> for MgmtError {
    fn from(err: url::ParseError) -> Self {
        Self::InvalidAddress {
            address: String::new(),
            reason: err.to_string(),
        }
    }
}
