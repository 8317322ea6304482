//! Boxed error detail types to reduce `MgmtError` enum size.

use std::fmt;

/// Type alias for boxed errors that are Send + Sync.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Details for a non-success answer from the management service.
#[derive(Debug, Clone)]
pub struct ServiceErrorDetails {
    /// HTTP status code.
    pub status: u16,
    /// The service's own error code, when the body carried one.
    pub code: Option<String>,
    /// Human-readable error message.
    pub message: String,
}

impl fmt::Display for ServiceErrorDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.code {
            Some(code) => write!(f, "{} ({code}): {}", self.status, self.message),
            None => write!(f, "{}: {}", self.status, self.message),
        }
    }
}

impl std::error::Error for ServiceErrorDetails {}
