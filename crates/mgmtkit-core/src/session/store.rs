//! File-backed session store.

use std::fs;
use std::path::{Path, PathBuf};

use super::{HttpSession, SessionCollection};
use crate::error::{MgmtError, MgmtResultExt};

/// Environment variable naming the session fixture file.
pub const SESSION_FIXTURES_ENV: &str = "MGMTKIT_SESSION_FIXTURES";

/// Fixture file used when [`SESSION_FIXTURES_ENV`] is unset.
pub const DEFAULT_FIXTURE_PATH: &str = "tests/fixtures/sessions.json";

/// A [`SessionCollection`] loaded from, and saved back to, a fixture file.
#[derive(Debug)]
pub struct SessionStore {
    path: PathBuf,
    collection: SessionCollection,
    dirty: bool,
}

impl SessionStore {
    /// Load the store at `path`. A missing file yields an empty store.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, MgmtError> {
        let path = path.into();
        let collection = match fs::read_to_string(&path) {
            Ok(text) => SessionCollection::from_json(&text).for_path("parse session fixtures", &path)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No session fixtures, starting empty");
                SessionCollection::new()
            }
            Err(e) => {
                return Err(e).for_path("read session fixtures", &path);
            }
        };

        tracing::debug!(path = %path.display(), sessions = collection.len(), "Loaded session fixtures");
        Ok(Self {
            path,
            collection,
            dirty: false,
        })
    }

    /// Load the store named by [`SESSION_FIXTURES_ENV`], or the default path.
    pub fn from_env() -> Result<Self, MgmtError> {
        let path = std::env::var_os(SESSION_FIXTURES_ENV)
            .map_or_else(|| PathBuf::from(DEFAULT_FIXTURE_PATH), PathBuf::from);
        Self::open(path)
    }

    /// Wrap an in-memory collection that saves to `path`.
    pub fn with_collection(path: impl Into<PathBuf>, collection: SessionCollection) -> Self {
        Self {
            path: path.into(),
            collection,
            dirty: false,
        }
    }

    /// The fixture file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The loaded sessions.
    #[must_use]
    pub fn collection(&self) -> &SessionCollection {
        &self.collection
    }

    /// Look up a session by name.
    pub fn get_session(&self, name: &str) -> Result<HttpSession, MgmtError> {
        self.collection.get_session(name)
    }

    /// Add or replace a session. The store must be saved to persist it.
    pub fn add_session(&mut self, session: HttpSession) {
        tracing::debug!(session = %session.name, exchanges = session.len(), "Adding session");
        self.collection.insert(session);
        self.dirty = true;
    }

    /// Check for unsaved changes.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Persist unsaved changes back to the fixture file.
    ///
    /// Writes a sibling temp file and renames it over the target, so a
    /// failed save never leaves a truncated fixture behind. Does nothing
    /// when there are no changes.
    pub fn save_default_session_collection(&mut self) -> Result<(), MgmtError> {
        if !self.dirty {
            return Ok(());
        }

        let json = self.collection.to_json()?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).for_path("create", parent)?;
        }

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        fs::write(&tmp, json).for_path("write", &tmp)?;
        fs::rename(&tmp, &self.path).for_path("replace", &self.path)?;

        self.dirty = false;
        tracing::info!(path = %self.path.display(), sessions = self.collection.len(), "Saved session fixtures");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{HttpRequest, HttpResponse};

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::open(dir.path().join("none.json")).unwrap();
        assert!(store.collection().is_empty());
        assert!(!store.is_dirty());
    }

    #[test]
    fn test_corrupt_file_fails_with_context() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sessions.json");
        fs::write(&path, "{ not json").unwrap();

        let err = SessionStore::open(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse session fixtures"));
    }

    #[test]
    fn test_save_then_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("sessions.json");

        let mut store = SessionStore::open(&path).unwrap();
        store.add_session(
            HttpSession::new("UnitTests.Ping")
                .with_exchange(HttpRequest::new("GET", "/ping"), HttpResponse::new(200)),
        );
        assert!(store.is_dirty());
        store.save_default_session_collection().unwrap();
        assert!(!store.is_dirty());
        assert!(!dir.path().join("nested").join("sessions.json.tmp").exists());

        let reopened = SessionStore::open(&path).unwrap();
        assert_eq!(reopened.get_session("UnitTests.Ping").unwrap().len(), 1);
    }

    #[test]
    fn test_clean_save_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sessions.json");
        let mut store = SessionStore::open(&path).unwrap();
        store.save_default_session_collection().unwrap();
        assert!(!path.exists());
    }
}
