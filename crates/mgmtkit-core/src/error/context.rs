//! Context layering for fallible results.

use std::path::Path;

use super::types::MgmtError;

/// Adds context to any `Result` whose error converts into [`MgmtError`].
///
/// I/O and JSON errors convert on the way in, so store code can chain
/// `fs::read_to_string(path).for_path("read session fixtures", path)?`.
///
/// ```rust
/// use mgmtkit_core::error::{MgmtError, MgmtResultExt};
///
/// fn open() -> Result<(), MgmtError> {
///     let missing: Result<(), MgmtError> = Err(MgmtError::session_not_found("UnitTests.Db"));
///     missing.context("Failed to load fixtures")?;
///     Ok(())
/// }
/// assert_eq!(open().unwrap_err().root().to_string(), "Session not found: UnitTests.Db");
/// ```
pub trait MgmtResultExt<T> {
    /// Wrap the error with a fixed message.
    fn context(self, context: impl Into<String>) -> Result<T, MgmtError>;

    /// Wrap the error with a message built only on failure.
    fn with_context<C: Into<String>>(self, f: impl FnOnce() -> C) -> Result<T, MgmtError>;

    /// Wrap the error as "Failed to {action} {path}".
    fn for_path(self, action: &str, path: &Path) -> Result<T, MgmtError>;
}

impl<T, E: Into<MgmtError>> MgmtResultExt<T> for Result<T, E> {
    fn context(self, context: impl Into<String>) -> Result<T, MgmtError> {
        self.map_err(|e| wrap(context.into(), e.into()))
    }

    fn with_context<C: Into<String>>(self, f: impl FnOnce() -> C) -> Result<T, MgmtError> {
        self.map_err(|e| wrap(f().into(), e.into()))
    }

    fn for_path(self, action: &str, path: &Path) -> Result<T, MgmtError> {
        self.with_context(|| format!("Failed to {action} {}", path.display()))
    }
}

fn wrap(context: String, source: MgmtError) -> MgmtError {
    MgmtError::WithContext {
        context,
        source: Box::new(source),
    }
}
