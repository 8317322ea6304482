//! Named session collections.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::HttpSession;
use crate::error::MgmtError;

/// Sessions keyed by unique name.
///
/// Serialized as `{ "sessions": { "<name>": <session>, ... } }`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionCollection {
    #[serde(default)]
    sessions: BTreeMap<String, HttpSession>,
}

impl SessionCollection {
    /// Create an empty collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a session by name.
    ///
    /// Returns a full copy, never a partially populated session.
    pub fn get_session(&self, name: &str) -> Result<HttpSession, MgmtError> {
        self.sessions
            .get(name)
            .cloned()
            .ok_or_else(|| MgmtError::session_not_found(name))
    }

    /// Insert a session under its own name, returning the one it replaced.
    pub fn insert(&mut self, session: HttpSession) -> Option<HttpSession> {
        self.sessions.insert(session.name.clone(), session)
    }

    /// Check whether a session is present.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.sessions.contains_key(name)
    }

    /// Session names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.sessions.keys().map(String::as_str)
    }

    /// Number of sessions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Check if there are no sessions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Parse a collection from JSON.
    ///
    /// Sessions stored without a name take the key they are stored under.
    pub fn from_json(json: &str) -> Result<Self, MgmtError> {
        let mut collection: Self = serde_json::from_str(json)?;
        for (key, session) in &mut collection.sessions {
            if session.name.is_empty() {
                session.name.clone_from(key);
            }
        }
        Ok(collection)
    }

    /// Serialize to pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, MgmtError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl FromIterator<HttpSession> for SessionCollection {
    fn from_iter<I: IntoIterator<Item = HttpSession>>(iter: I) -> Self {
        let mut collection = Self::new();
        for session in iter {
            collection.insert(session);
        }
        collection
    }
}
