//! Recorded HTTP sessions.
//!
//! A session is a named, ordered recording of request/response pairs. Tests
//! load sessions from a [`SessionStore`] and replay them through a mock
//! server; the [`SessionRecorder`] produces new ones from live traffic.
//!
//! Sessions carry a settings stamp ([`SessionSettings`]). Recorded URLs and
//! response bodies may contain `$(Name)` tokens which are replaced from the
//! settings' properties when the session is resolved for replay.

mod collection;
mod recorder;
mod store;

pub use collection::SessionCollection;
pub use recorder::SessionRecorder;
pub use store::{DEFAULT_FIXTURE_PATH, SESSION_FIXTURES_ENV, SessionStore};

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::http::{HttpMessage, HttpRequest, HttpResponse};
use crate::validator::{DefaultRequestValidator, RequestValidator};

/// The default settings stamp applied to a session before replay.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSettings {
    /// The upstream service the session was recorded against.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_base_uri: Option<Url>,
    /// Values substituted for `$(Name)` tokens.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, String>,
}

impl SessionSettings {
    /// Create empty settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the upstream base URI.
    #[must_use]
    pub fn with_service_base_uri(mut self, uri: Url) -> Self {
        self.service_base_uri = Some(uri);
        self
    }

    /// Set a substitution property.
    #[must_use]
    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(name.into(), value.into());
        self
    }

    /// Replace every known `$(Name)` token in `text`.
    ///
    /// Unknown tokens and unterminated `$(` are left as they are.
    #[must_use]
    pub fn substitute(&self, text: &str) -> String {
        if self.properties.is_empty() || !text.contains("$(") {
            return text.to_string();
        }

        let mut out = String::with_capacity(text.len());
        let mut rest = text;
        while let Some(start) = rest.find("$(") {
            out.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            match after.find(')') {
                Some(end) => {
                    let name = &after[..end];
                    match self.properties.get(name) {
                        Some(value) => out.push_str(value),
                        None => out.push_str(&rest[start..start + 2 + end + 1]),
                    }
                    rest = &after[end + 1..];
                }
                None => {
                    out.push_str(&rest[start..]);
                    rest = "";
                }
            }
        }
        out.push_str(rest);
        out
    }
}

/// A named, ordered recording of HTTP exchanges.
#[derive(Clone, Serialize, Deserialize)]
pub struct HttpSession {
    /// Unique session name, usually the name of the test that uses it.
    #[serde(default)]
    pub name: String,
    /// When the session was recorded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recorded_at: Option<DateTime<Utc>>,
    /// Settings stamp applied before replay.
    #[serde(default)]
    pub settings: SessionSettings,
    /// Recorded exchanges, in order.
    #[serde(default)]
    pub messages: Vec<HttpMessage>,
    #[serde(skip)]
    validator: Option<Arc<dyn RequestValidator>>,
}

impl HttpSession {
    /// Create an empty session.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            recorded_at: None,
            settings: SessionSettings::default(),
            messages: Vec::new(),
            validator: None,
        }
    }

    /// Append an exchange at the next index.
    #[must_use]
    pub fn with_exchange(mut self, request: HttpRequest, response: HttpResponse) -> Self {
        self.push(request, response);
        self
    }

    /// Replace the settings stamp.
    #[must_use]
    pub fn with_settings(mut self, settings: SessionSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Assign a request validator.
    #[must_use]
    pub fn with_validator(mut self, validator: impl RequestValidator + 'static) -> Self {
        self.set_validator(validator);
        self
    }

    /// Append an exchange at the next index, returning that index.
    pub fn push(&mut self, request: HttpRequest, response: HttpResponse) -> usize {
        let index = self.messages.len();
        self.messages
            .push(HttpMessage::new(index, request, response));
        index
    }

    /// Assign a request validator.
    pub fn set_validator(&mut self, validator: impl RequestValidator + 'static) {
        self.validator = Some(Arc::new(validator));
    }

    /// Check whether a validator was assigned.
    #[must_use]
    pub fn has_validator(&self) -> bool {
        self.validator.is_some()
    }

    /// The assigned validator, or [`DefaultRequestValidator`].
    #[must_use]
    pub fn validator(&self) -> Arc<dyn RequestValidator> {
        self.validator
            .clone()
            .unwrap_or_else(|| Arc::new(DefaultRequestValidator))
    }

    /// The exchange at `index`, if recorded.
    #[must_use]
    pub fn message(&self, index: usize) -> Option<&HttpMessage> {
        self.messages.get(index)
    }

    /// Number of recorded exchanges.
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Check if nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Apply the settings stamp: substitute `$(Name)` tokens in request
    /// URLs and response bodies.
    #[must_use]
    pub fn resolved(&self) -> Self {
        let mut session = self.clone();
        for message in &mut session.messages {
            message.request.url = self.settings.substitute(&message.request.url);
            message.response.body = self.settings.substitute(&message.response.body);
        }
        session
    }
}

impl fmt::Debug for HttpSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpSession")
            .field("name", &self.name)
            .field("recorded_at", &self.recorded_at)
            .field("settings", &self.settings)
            .field("messages", &self.messages.len())
            .field("custom_validator", &self.validator.is_some())
            .finish()
    }
}
