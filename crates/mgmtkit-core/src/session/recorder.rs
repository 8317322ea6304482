//! Session recording.
//!
//! The recorder captures live request/response pairs in the order they
//! complete and finalizes them into an [`HttpSession`] that can be added to
//! a [`SessionStore`](super::SessionStore) and replayed later.

use std::sync::{Arc, RwLock};
use std::time::Instant;

use chrono::Utc;

use super::{HttpSession, SessionSettings};
use crate::http::{HttpMessage, HttpRequest, HttpResponse};

/// Captures HTTP exchanges into a session.
///
/// Cloning yields another handle onto the same recording.
#[derive(Debug, Clone)]
pub struct SessionRecorder {
    name: String,
    started: Instant,
    state: Arc<RwLock<RecorderState>>,
}

#[derive(Debug)]
struct RecorderState {
    messages: Vec<HttpMessage>,
    settings: SessionSettings,
    recording: bool,
}

impl SessionRecorder {
    /// Create a new session recorder.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            started: Instant::now(),
            state: Arc::new(RwLock::new(RecorderState {
                messages: Vec::new(),
                settings: SessionSettings::default(),
                recording: true,
            })),
        }
    }

    /// Set the settings stamp the finalized session carries.
    pub fn set_settings(&self, settings: SessionSettings) {
        if let Ok(mut state) = self.state.write() {
            state.settings = settings;
        }
    }

    /// Check if recording is active.
    #[must_use]
    pub fn is_recording(&self) -> bool {
        self.state.read().map(|s| s.recording).unwrap_or(false)
    }

    /// Stop recording. Later exchanges are ignored.
    pub fn stop(&self) {
        if let Ok(mut state) = self.state.write() {
            state.recording = false;
        }
    }

    /// Record one exchange, returning its index.
    ///
    /// Returns `None` once recording has stopped.
    pub fn record(&self, request: HttpRequest, response: HttpResponse) -> Option<usize> {
        let mut state = self.state.write().ok()?;
        if !state.recording {
            return None;
        }
        let index = state.messages.len();
        tracing::trace!(
            session = %self.name,
            index,
            method = %request.method,
            status = response.status,
            elapsed_ms = self.started.elapsed().as_millis() as u64,
            "Recorded exchange"
        );
        state
            .messages
            .push(HttpMessage::new(index, request, response));
        Some(index)
    }

    /// Get the number of recorded exchanges.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.read().map(|s| s.messages.len()).unwrap_or(0)
    }

    /// Check if nothing was recorded yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Stop recording and return the session.
    #[must_use]
    pub fn finalize(self) -> HttpSession {
        self.stop();

        let (messages, settings) = self
            .state
            .read()
            .map(|s| (s.messages.clone(), s.settings.clone()))
            .unwrap_or_default();

        let mut session = HttpSession::new(self.name).with_settings(settings);
        session.messages = messages;
        session.recorded_at = Some(Utc::now());
        session
    }
}
