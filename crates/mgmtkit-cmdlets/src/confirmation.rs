//! Asking the user before changing anything.

/// Decides whether a state-changing operation goes ahead.
///
/// Implemented for closures, so tests can script the answer.
pub trait Confirmation: Send + Sync {
    /// Return `true` to proceed with the operation described by `message`.
    fn should_process(&self, caption: &str, message: &str) -> bool;
}

impl<F> Confirmation for F
where
    F: Fn(&str, &str) -> bool + Send + Sync,
{
    fn should_process(&self, caption: &str, message: &str) -> bool {
        self(caption, message)
    }
}

/// Confirms everything, as with `-Force`.
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoConfirm;

impl Confirmation for AutoConfirm {
    fn should_process(&self, caption: &str, message: &str) -> bool {
        tracing::debug!(caption, message, "Confirmed automatically");
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closure_confirmation() {
        let deny = |_: &str, message: &str| !message.contains("delete");
        assert!(deny.should_process("caption", "create things"));
        assert!(!deny.should_process("caption", "delete things"));
        assert!(AutoConfirm.should_process("caption", "delete things"));
    }
}
