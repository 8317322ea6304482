//! Assertions for replay tests.
//!
//! Helpers that make it easier to check the faults an
//! [`ExceptionManager`] collected and the responses a mock server returned.

use mgmtkit_core::http::HttpResponse;
use mgmtkit_core::validator::ValidationError;

use crate::exceptions::{ExceptionManager, ReplayFault};

/// Assert that the replay finished without faults.
///
/// # Panics
///
/// Panics with the pending fault, if any.
pub fn assert_no_fault(exceptions: ExceptionManager) {
    if let Err(fault) = exceptions.finish() {
        panic!("Expected a clean replay, but got: {fault}");
    }
}

/// Assert that a fault is pending and take it.
///
/// # Panics
///
/// Panics if no fault was reported.
pub fn assert_fault(exceptions: &mut ExceptionManager) -> ReplayFault {
    match exceptions.take_fault() {
        Some(fault) => fault,
        None => panic!("Expected a replay fault, but none was reported"),
    }
}

/// Assert that a fault is pending for the request at `index` and that its
/// message contains `expected_message`.
///
/// # Panics
///
/// Panics if no fault is pending or it does not match.
pub fn assert_fault_at(
    exceptions: &mut ExceptionManager,
    index: usize,
    expected_message: &str,
) -> ReplayFault {
    let fault = assert_fault(exceptions);
    assert_eq!(
        fault.index(),
        index,
        "Expected fault at request #{index}, but got: {fault}"
    );
    let text = fault.to_string();
    assert!(
        text.contains(expected_message),
        "Expected fault to contain '{expected_message}', but got '{text}'"
    );
    fault
}

/// Assert that the pending fault is a request past the end of the recording.
///
/// # Panics
///
/// Panics if no fault is pending or it is of another kind.
pub fn assert_no_more_requests(exceptions: &mut ExceptionManager, index: usize) {
    let fault = assert_fault(exceptions);
    assert!(
        matches!(fault.error, ValidationError::NoMoreRequests { index: i } if i == index),
        "Expected 'No more requests expected.' at request #{index}, but got: {fault}"
    );
}

/// Assert that a response has the given status and its body contains text.
///
/// # Panics
///
/// Panics if the status differs or the body lacks `expected_text`.
pub fn assert_response(response: &HttpResponse, status: u16, expected_text: &str) {
    assert_eq!(
        response.status, status,
        "Expected status {status}, but got {} with body '{}'",
        response.status, response.body
    );
    assert!(
        response.body.contains(expected_text),
        "Expected response body to contain '{expected_text}', but got '{}'",
        response.body
    );
}

/// Macro for asserting a clean replay.
///
/// # Example
///
/// ```rust
/// use mgmtkit_testing::{ExceptionManager, assert_replay_clean};
///
/// let exceptions = ExceptionManager::new();
/// assert_replay_clean!(exceptions);
/// ```
#[macro_export]
macro_rules! assert_replay_clean {
    ($exceptions:expr) => {
        $crate::assertions::assert_no_fault($exceptions)
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager_with(error: ValidationError) -> ExceptionManager {
        let manager = ExceptionManager::new();
        manager
            .reporter()
            .report(ReplayFault::new("UnitTests.Sample", error));
        manager
    }

    #[test]
    fn test_assert_no_fault_passes() {
        assert_no_fault(ExceptionManager::new());
    }

    #[test]
    #[should_panic(expected = "Expected a clean replay")]
    fn test_assert_no_fault_fails_on_fault() {
        assert_no_fault(manager_with(ValidationError::NoMoreRequests { index: 0 }));
    }

    #[test]
    fn test_assert_fault_at() {
        let mut manager = manager_with(ValidationError::MethodMismatch {
            index: 1,
            expected: "GET".to_string(),
            actual: "POST".to_string(),
        });
        let fault = assert_fault_at(&mut manager, 1, "POST");
        assert_eq!(fault.session, "UnitTests.Sample");
        assert_no_fault(manager);
    }

    #[test]
    fn test_assert_no_more_requests() {
        let mut manager = manager_with(ValidationError::NoMoreRequests { index: 4 });
        assert_no_more_requests(&mut manager, 4);
    }

    #[test]
    #[should_panic(expected = "Expected a replay fault")]
    fn test_assert_fault_fails_when_clean() {
        let mut manager = ExceptionManager::new();
        let _ = assert_fault(&mut manager);
    }

    #[test]
    fn test_assert_response() {
        let response = HttpResponse::new(500).with_body("No more requests expected.");
        assert_response(&response, 500, "No more requests");
    }
}
