//! Per-run execution context for commands.
//!
//! Everything a command needs to know about who is calling and on whose
//! behalf travels in an [`ExecutionContext`] passed to every command. There
//! is no process-wide session state.
//!
//! # Example
//!
//! ```rust
//! use mgmtkit_cmdlets::ExecutionContext;
//! use uuid::Uuid;
//!
//! let subscription = Uuid::new_v4();
//! let ctx = ExecutionContext::new()
//!     .with_user_agent("my-tool/1.0")
//!     .with_subscription_id(subscription);
//!
//! assert_eq!(ctx.user_agent(), "my-tool/1.0");
//! assert_eq!(ctx.subscription_id(), Some(subscription));
//! assert_ne!(ctx.new_request_id(), ctx.new_request_id());
//! ```

use chrono::Utc;
use mgmtkit_core::MgmtError;
use uuid::Uuid;

/// User agent sent when none is configured.
pub const DEFAULT_USER_AGENT: &str = concat!("mgmtkit/", env!("CARGO_PKG_VERSION"));

/// Caller identity and tracing ids for one run of the tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionContext {
    user_agent: String,
    client_session_id: String,
    subscription_id: Option<Uuid>,
}

impl ExecutionContext {
    /// Create a context with a fresh client session id.
    #[must_use]
    pub fn new() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            client_session_id: new_client_session_id(),
            subscription_id: None,
        }
    }

    /// Set the user agent.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set the client session id, e.g. to correlate with an earlier run.
    #[must_use]
    pub fn with_client_session_id(mut self, id: impl Into<String>) -> Self {
        self.client_session_id = id.into();
        self
    }

    /// Select the subscription commands act on.
    #[must_use]
    pub const fn with_subscription_id(mut self, id: Uuid) -> Self {
        self.subscription_id = Some(id);
        self
    }

    /// The user agent sent with every request.
    #[must_use]
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// The id shared by every request of this run.
    #[must_use]
    pub fn client_session_id(&self) -> &str {
        &self.client_session_id
    }

    /// The selected subscription, if any.
    #[must_use]
    pub const fn subscription_id(&self) -> Option<Uuid> {
        self.subscription_id
    }

    /// The selected subscription, or an error naming the missing setting.
    pub fn require_subscription(&self) -> Result<Uuid, MgmtError> {
        self.subscription_id
            .ok_or_else(|| MgmtError::internal("No subscription selected for this run"))
    }

    /// A fresh id for a single request.
    #[must_use]
    pub fn new_request_id(&self) -> String {
        Uuid::new_v4().to_string()
    }
}

impl Default for ExecutionContext {
    fn default() -> Self {
        Self::new()
    }
}

fn new_client_session_id() -> String {
    format!("{}-{}", Uuid::new_v4(), Utc::now().format("%Y-%m-%d %H:%M:%SZ"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let ctx = ExecutionContext::new();
        assert!(ctx.user_agent().starts_with("mgmtkit/"));
        assert!(ctx.subscription_id().is_none());
        assert!(ctx.require_subscription().is_err());
        assert!(ctx.client_session_id().len() > 36);
    }

    #[test]
    fn test_each_context_has_its_own_session() {
        assert_ne!(
            ExecutionContext::new().client_session_id(),
            ExecutionContext::new().client_session_id()
        );
    }

    #[test]
    fn test_overrides() {
        let ctx = ExecutionContext::new().with_client_session_id("fixed");
        assert_eq!(ctx.client_session_id(), "fixed");
    }
}
