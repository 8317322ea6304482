//! Store client: the trait commands depend on and its HTTP implementation.

use std::time::Duration;

use async_trait::async_trait;
use mgmtkit_core::MgmtError;
use reqwest::header::{CONTENT_TYPE, HeaderValue};
use reqwest::{Client, StatusCode};
use url::Url;
use uuid::Uuid;

use super::model::{AddOn, NewAddOnRequest, OperationType};
use crate::context::ExecutionContext;

/// Header carrying the management API version.
pub const API_VERSION_HEADER: &str = "x-ms-version";

/// API version sent to the store.
pub const STORE_API_VERSION: &str = "2013-06-01";

/// Operations on store add-ons.
#[async_trait]
pub trait StoreClient: Send + Sync {
    /// Look up an add-on by name. `Ok(None)` when there is none.
    async fn try_get_add_on(&self, name: &str) -> Result<Option<AddOn>, MgmtError>;

    /// Purchase an add-on.
    async fn new_add_on(
        &self,
        name: &str,
        add_on: &str,
        plan: &str,
        location: &str,
        promotion_code: Option<&str>,
    ) -> Result<AddOn, MgmtError>;

    /// The text shown when asking the user to confirm `operation`.
    fn get_confirmation_message(&self, operation: OperationType, add_on: &str, plan: &str) -> String {
        format!("You are about to {operation} the '{add_on}' add-on with the '{plan}' plan.")
    }
}

/// Configuration for [`HttpStoreClient`].
#[derive(Debug, Clone)]
pub struct StoreClientConfig {
    /// Base URL of the management service.
    pub base_url: Url,
    /// Value of the `x-ms-version` header.
    pub api_version: String,
    /// Connection timeout.
    pub connect_timeout: Duration,
    /// Request timeout.
    pub request_timeout: Duration,
}

impl StoreClientConfig {
    /// Create a configuration for the service at `base_url`.
    #[must_use]
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            api_version: STORE_API_VERSION.to_string(),
            connect_timeout: Duration::from_secs(30),
            request_timeout: Duration::from_secs(60),
        }
    }

    /// Set the API version.
    #[must_use]
    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = version.into();
        self
    }

    /// Set the request timeout.
    #[must_use]
    pub const fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

/// [`StoreClient`] over the store REST endpoint of one subscription.
#[derive(Debug)]
pub struct HttpStoreClient {
    config: StoreClientConfig,
    subscription_id: Uuid,
    client: Client,
}

impl HttpStoreClient {
    /// Create a client for the subscription selected in `context`.
    pub fn new(config: StoreClientConfig, context: &ExecutionContext) -> Result<Self, MgmtError> {
        let subscription_id = context.require_subscription()?;
        let client = Client::builder()
            .user_agent(context.user_agent())
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| MgmtError::http_with_source("Failed to create HTTP client", e))?;

        Ok(Self {
            config,
            subscription_id,
            client,
        })
    }

    fn add_on_url(&self, name: &str) -> Result<Url, MgmtError> {
        let mut url = self.config.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| MgmtError::invalid_address(self.config.base_url.as_str(), "cannot be a base URL"))?
            .pop_if_empty()
            .push(&self.subscription_id.to_string())
            .push("store")
            .push("addons")
            .push(name);
        Ok(url)
    }

    fn request(&self, method: reqwest::Method, url: Url) -> Result<reqwest::RequestBuilder, MgmtError> {
        let version = HeaderValue::from_str(&self.config.api_version)
            .map_err(|e| MgmtError::http_with_source("Invalid API version header", e))?;
        Ok(self.client.request(method, url).header(API_VERSION_HEADER, version))
    }
}

#[async_trait]
impl StoreClient for HttpStoreClient {
    async fn try_get_add_on(&self, name: &str) -> Result<Option<AddOn>, MgmtError> {
        let url = self.add_on_url(name)?;
        tracing::debug!(%url, "Looking up add-on");
        let response = self
            .request(reqwest::Method::GET, url)?
            .send()
            .await
            .map_err(|e| MgmtError::http_with_source("Store request failed", e))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let body = response
            .text()
            .await
            .map_err(|e| MgmtError::http_with_source("Failed to read response body", e))?;
        if !status.is_success() {
            return Err(MgmtError::service(status.as_u16(), body));
        }
        Ok(Some(serde_json::from_str(&body)?))
    }

    async fn new_add_on(
        &self,
        name: &str,
        add_on: &str,
        plan: &str,
        location: &str,
        promotion_code: Option<&str>,
    ) -> Result<AddOn, MgmtError> {
        let url = self.add_on_url(name)?;
        let body = serde_json::to_string(&NewAddOnRequest {
            add_on,
            plan,
            location,
            promotion_code,
        })?;
        tracing::info!(%url, add_on, plan, location, "Purchasing add-on");

        let response = self
            .request(reqwest::Method::PUT, url)?
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| MgmtError::http_with_source("Store request failed", e))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| MgmtError::http_with_source("Failed to read response body", e))?;
        match status {
            StatusCode::CONFLICT => Err(MgmtError::resource_conflict(
                name,
                format!("Add-on name {name} is already used."),
            )),
            s if s.is_success() && text.trim().is_empty() => Ok(AddOn {
                name: name.to_string(),
                add_on: add_on.to_string(),
                plan: plan.to_string(),
                location: location.to_string(),
                state: None,
            }),
            s if s.is_success() => Ok(serde_json::from_str(&text)?),
            s => Err(MgmtError::service(s.as_u16(), text)),
        }
    }
}
