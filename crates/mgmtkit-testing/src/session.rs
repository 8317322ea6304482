//! Comparing a fresh recording with a stored session.
//!
//! When a session is re-recorded against a live service, [`SessionDiff`]
//! reports which requests changed, using the stored session's validator so
//! per-run values such as request ids do not count as differences.

use mgmtkit_core::http::HttpRequest;
use mgmtkit_core::session::HttpSession;
use mgmtkit_core::validator::{ValidationError, validate_request_sequence};

/// Differences between a stored session and a new recording of it.
#[derive(Debug, Default)]
pub struct SessionDiff {
    /// Positions recorded before but not requested now.
    pub only_in_stored: Vec<usize>,
    /// Positions requested now but not recorded before.
    pub only_in_recorded: Vec<usize>,
    /// Requests the stored session's validator rejected.
    pub different: Vec<ValidationError>,
    /// Positions whose response status changed.
    pub status_changed: Vec<(usize, u16, u16)>,
}

impl SessionDiff {
    /// Compare `recorded` against `stored`, request by request.
    #[must_use]
    pub fn compare(stored: &HttpSession, recorded: &HttpSession) -> Self {
        let stored = stored.resolved();
        let shared = stored.len().min(recorded.len());
        let observed: Vec<HttpRequest> = recorded.messages[..shared]
            .iter()
            .map(|message| message.request.clone())
            .collect();
        let mut diff = Self {
            only_in_stored: (shared..stored.len()).collect(),
            only_in_recorded: (shared..recorded.len()).collect(),
            different: validate_request_sequence(&stored.messages, &observed, stored.validator().as_ref()),
            status_changed: Vec::new(),
        };

        for (old, new) in stored.messages.iter().zip(&recorded.messages) {
            if old.response.status != new.response.status {
                diff.status_changed
                    .push((old.index, old.response.status, new.response.status));
            }
        }

        diff
    }

    /// Check if the recordings are equivalent.
    #[must_use]
    pub fn is_identical(&self) -> bool {
        self.only_in_stored.is_empty()
            && self.only_in_recorded.is_empty()
            && self.different.is_empty()
            && self.status_changed.is_empty()
    }

    /// Assert that the recordings are equivalent.
    ///
    /// # Panics
    ///
    /// Panics with a summary of every difference.
    pub fn assert_identical(&self) {
        assert!(self.is_identical(), "Sessions differ: {self:#?}");
    }
}
