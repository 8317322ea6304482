//! Request validation for replayed HTTP sessions.
//!
//! A [`RequestValidator`] compares each request observed during replay
//! against the request recorded at the same position. Validation failures
//! are assertion failures: the replay harness captures them and fails the
//! test, it never retries or recovers.
//!
//! # Example
//!
//! ```rust
//! use mgmtkit_core::http::{HttpMessage, HttpRequest};
//! use mgmtkit_core::validator::{self, ValidationError};
//!
//! let odata = |index: usize,
//!              expected: Option<&HttpMessage>,
//!              actual: &HttpRequest|
//!  -> Result<(), ValidationError> {
//!     let expected = expected.ok_or_else(|| validator::no_more_requests(index))?;
//!     validator::validate_method(expected, actual)?;
//!     validator::validate_user_agent(expected, actual)?;
//!     validator::validate_headers(expected, actual, &["DataServiceVersion"])
//! };
//! # let _ = odata;
//! ```

use crate::http::{HttpMessage, HttpRequest};

/// A mismatch between a recorded request and the request actually sent.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// The request method differs.
    #[error("request #{index}: expected method {expected}, got {actual}")]
    MethodMismatch {
        /// Sequence position.
        index: usize,
        /// Recorded method.
        expected: String,
        /// Observed method.
        actual: String,
    },

    /// The user agent differs.
    #[error("request #{index}: expected user agent {expected:?}, got {actual:?}")]
    UserAgentMismatch {
        /// Sequence position.
        index: usize,
        /// Recorded user agent.
        expected: Option<String>,
        /// Observed user agent.
        actual: Option<String>,
    },

    /// A required header differs or is missing.
    #[error("request #{index}: header {header} expected {expected:?}, got {actual:?}")]
    HeaderMismatch {
        /// Sequence position.
        index: usize,
        /// Header name.
        header: String,
        /// Recorded value.
        expected: Option<String>,
        /// Observed value.
        actual: Option<String>,
    },

    /// The path or query differs.
    #[error("request #{index}: expected {expected}, got {actual}")]
    UrlMismatch {
        /// Sequence position.
        index: usize,
        /// Recorded path and query.
        expected: String,
        /// Observed path and query.
        actual: String,
    },

    /// The body differs.
    #[error("request #{index}: body does not match the recording")]
    BodyMismatch {
        /// Sequence position.
        index: usize,
        /// Recorded body.
        expected: String,
        /// Observed body.
        actual: String,
    },

    /// More requests arrived than were recorded.
    #[error("request #{index}: No more requests expected.")]
    NoMoreRequests {
        /// Sequence position of the unexpected request.
        index: usize,
    },

    /// An assertion inside a validator panicked.
    #[error("request #{index}: assertion failed: {message}")]
    Assertion {
        /// Sequence position.
        index: usize,
        /// Panic message.
        message: String,
    },

    /// A check specific to one API dialect failed.
    #[error("request #{index}: {message}")]
    Custom {
        /// Sequence position.
        index: usize,
        /// Failure description.
        message: String,
    },
}

impl ValidationError {
    /// The sequence position of the offending request.
    #[must_use]
    pub fn index(&self) -> usize {
        match self {
            Self::MethodMismatch { index, .. }
            | Self::UserAgentMismatch { index, .. }
            | Self::HeaderMismatch { index, .. }
            | Self::UrlMismatch { index, .. }
            | Self::BodyMismatch { index, .. }
            | Self::NoMoreRequests { index }
            | Self::Assertion { index, .. }
            | Self::Custom { index, .. } => *index,
        }
    }

    /// Create a dialect-specific failure.
    pub fn custom(index: usize, message: impl Into<String>) -> Self {
        Self::Custom {
            index,
            message: message.into(),
        }
    }
}

/// Compares an observed request with the one recorded at its position.
///
/// `expected` is `None` when `index` is past the end of the recording.
pub trait RequestValidator: Send + Sync {
    /// Validate one request.
    fn validate(
        &self,
        index: usize,
        expected: Option<&HttpMessage>,
        actual: &HttpRequest,
    ) -> Result<(), ValidationError>;
}

impl<F> RequestValidator for F
where
    F: Fn(usize, Option<&HttpMessage>, &HttpRequest) -> Result<(), ValidationError>
        + Send
        + Sync,
{
    fn validate(
        &self,
        index: usize,
        expected: Option<&HttpMessage>,
        actual: &HttpRequest,
    ) -> Result<(), ValidationError> {
        self(index, expected, actual)
    }
}

/// The validator used when a session has none assigned.
///
/// Checks method and user agent, and rejects requests past the recording.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultRequestValidator;

impl RequestValidator for DefaultRequestValidator {
    fn validate(
        &self,
        index: usize,
        expected: Option<&HttpMessage>,
        actual: &HttpRequest,
    ) -> Result<(), ValidationError> {
        let expected = expected.ok_or_else(|| no_more_requests(index))?;
        validate_method(expected, actual)?;
        validate_user_agent(expected, actual)
    }
}

/// The failure for a request past the end of the recording.
#[must_use]
pub fn no_more_requests(index: usize) -> ValidationError {
    ValidationError::NoMoreRequests { index }
}

/// Check that the methods match (case-insensitively).
pub fn validate_method(expected: &HttpMessage, actual: &HttpRequest) -> Result<(), ValidationError> {
    if expected.request.method.eq_ignore_ascii_case(&actual.method) {
        Ok(())
    } else {
        Err(ValidationError::MethodMismatch {
            index: expected.index,
            expected: expected.request.method.clone(),
            actual: actual.method.clone(),
        })
    }
}

/// Check that the user agents match exactly.
pub fn validate_user_agent(
    expected: &HttpMessage,
    actual: &HttpRequest,
) -> Result<(), ValidationError> {
    let want = expected.request.user_agent();
    let got = actual.user_agent();
    if want == got {
        Ok(())
    } else {
        Err(ValidationError::UserAgentMismatch {
            index: expected.index,
            expected: want.map(str::to_string),
            actual: got.map(str::to_string),
        })
    }
}

/// Check that each named header has the recorded value.
pub fn validate_headers(
    expected: &HttpMessage,
    actual: &HttpRequest,
    names: &[&str],
) -> Result<(), ValidationError> {
    for name in names {
        let want = expected.request.headers.get(name);
        let got = actual.headers.get(name);
        if want != got {
            return Err(ValidationError::HeaderMismatch {
                index: expected.index,
                header: (*name).to_string(),
                expected: want.map(str::to_string),
                actual: got.map(str::to_string),
            });
        }
    }
    Ok(())
}

/// Check that each named header is present, whatever its value.
///
/// Used for per-request identifiers that differ on every run.
pub fn validate_headers_present(
    expected: &HttpMessage,
    actual: &HttpRequest,
    names: &[&str],
) -> Result<(), ValidationError> {
    match names.iter().find(|name| !actual.headers.contains(name)) {
        Some(missing) => Err(ValidationError::HeaderMismatch {
            index: expected.index,
            header: (*missing).to_string(),
            expected: expected.request.headers.get(missing).map(str::to_string),
            actual: None,
        }),
        None => Ok(()),
    }
}

/// Check that path and decoded query pairs match, ignoring scheme and host.
pub fn validate_path_and_query(
    expected: &HttpMessage,
    actual: &HttpRequest,
) -> Result<(), ValidationError> {
    let same_path = expected.request.path() == actual.path();
    let same_query = expected.request.query_pairs() == actual.query_pairs();
    if same_path && same_query {
        Ok(())
    } else {
        Err(ValidationError::UrlMismatch {
            index: expected.index,
            expected: expected.request.path_and_query(),
            actual: actual.path_and_query(),
        })
    }
}

/// Check that bodies match, comparing as JSON when both sides parse.
pub fn validate_body(expected: &HttpMessage, actual: &HttpRequest) -> Result<(), ValidationError> {
    let want = &expected.request.body;
    let got = &actual.body;
    let equal = match (
        serde_json::from_str::<serde_json::Value>(want),
        serde_json::from_str::<serde_json::Value>(got),
    ) {
        (Ok(a), Ok(b)) => a == b,
        _ => want == got,
    };
    if equal {
        Ok(())
    } else {
        Err(ValidationError::BodyMismatch {
            index: expected.index,
            expected: want.clone(),
            actual: got.clone(),
        })
    }
}

/// Validate a full sequence of observed requests against a recording.
///
/// Returns every failure, in request order.
#[must_use]
pub fn validate_request_sequence(
    recorded: &[HttpMessage],
    observed: &[HttpRequest],
    validator: &dyn RequestValidator,
) -> Vec<ValidationError> {
    observed
        .iter()
        .enumerate()
        .filter_map(|(index, actual)| validator.validate(index, recorded.get(index), actual).err())
        .collect()
}
