//! Carrying replay faults from the mock server back to the test thread.
//!
//! The mock server validates requests on its own worker thread, where a
//! failed assertion cannot fail the test directly. Handlers report faults
//! through a [`FaultReporter`]; the [`ExceptionManager`] owned by the test
//! collects them and raises the fault at teardown.

use std::sync::mpsc;

use mgmtkit_core::validator::ValidationError;

/// A validation failure captured while replaying a session.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("replay of session '{session}' failed: {error}")]
pub struct ReplayFault {
    /// The session being replayed.
    pub session: String,
    /// What went wrong.
    pub error: ValidationError,
}

impl ReplayFault {
    /// Create a fault for `session`.
    pub fn new(session: impl Into<String>, error: ValidationError) -> Self {
        Self {
            session: session.into(),
            error,
        }
    }

    /// The sequence position of the offending request.
    #[must_use]
    pub fn index(&self) -> usize {
        self.error.index()
    }
}

/// The sending side of the fault channel, handed to request handlers.
#[derive(Debug, Clone)]
pub struct FaultReporter {
    sender: mpsc::Sender<ReplayFault>,
}

impl FaultReporter {
    /// Report a fault. Never blocks.
    pub fn report(&self, fault: ReplayFault) {
        if let Err(mpsc::SendError(fault)) = self.sender.send(fault) {
            tracing::error!(%fault, "Replay fault reported after the exception manager was dropped");
        }
    }
}

/// Collects faults raised on the mock server and re-raises them on the test
/// thread.
///
/// Holds at most one fault: a later fault overwrites a pending one, and the
/// overwritten fault is logged. Call [`finish`](Self::finish) at the end of a
/// test to get the fault as a `Result`; dropping the manager with a pending
/// fault panics instead, unless the thread is already panicking.
#[derive(Debug)]
pub struct ExceptionManager {
    sender: mpsc::Sender<ReplayFault>,
    receiver: mpsc::Receiver<ReplayFault>,
    pending: Option<ReplayFault>,
}

impl ExceptionManager {
    /// Create a manager with an empty fault slot.
    #[must_use]
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::channel();
        Self {
            sender,
            receiver,
            pending: None,
        }
    }

    /// A reporter feeding this manager.
    #[must_use]
    pub fn reporter(&self) -> FaultReporter {
        FaultReporter {
            sender: self.sender.clone(),
        }
    }

    fn drain(&mut self) {
        while let Ok(fault) = self.receiver.try_recv() {
            if let Some(previous) = self.pending.replace(fault) {
                tracing::warn!(overwritten = %previous, "Replay fault overwritten by a later fault");
            }
        }
    }

    /// Check whether a fault is pending.
    pub fn has_fault(&mut self) -> bool {
        self.drain();
        self.pending.is_some()
    }

    /// Take the pending fault, leaving the slot empty.
    pub fn take_fault(&mut self) -> Option<ReplayFault> {
        self.drain();
        self.pending.take()
    }

    /// Finish the test: return the pending fault, if any.
    pub fn finish(mut self) -> Result<(), ReplayFault> {
        match self.take_fault() {
            Some(fault) => Err(fault),
            None => Ok(()),
        }
    }
}

impl Default for ExceptionManager {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ExceptionManager {
    fn drop(&mut self) {
        self.drain();
        if let Some(fault) = self.pending.take() {
            if std::thread::panicking() {
                tracing::error!(%fault, "Replay fault discarded while unwinding");
            } else {
                panic!("{fault}");
            }
        }
    }
}
