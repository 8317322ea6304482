//! HTTP client for the SQL database OData endpoint.

use std::sync::RwLock;
use std::time::Duration;

use mgmtkit_core::MgmtError;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use reqwest::{Client, Response};
use url::Url;

use super::model::{Database, ODataErrorBody, ODataFeed};
use crate::context::ExecutionContext;

/// OData content negotiation sent with every request.
pub const ODATA_ACCEPT: &str = "application/json;odata=minimalmetadata";

/// OData protocol version sent in `DataServiceVersion` and
/// `MaxDataServiceVersion`.
pub const ODATA_VERSION: &str = "3.0;NetFx";

/// Header carrying the per-run client session id.
pub const CLIENT_SESSION_ID_HEADER: &str = "x-ms-client-session-id";

/// Header carrying the per-request id.
pub const CLIENT_REQUEST_ID_HEADER: &str = "x-ms-client-request-id";

/// Header carrying the OData protocol version of the request.
pub const DATA_SERVICE_VERSION_HEADER: &str = "dataserviceversion";

/// Header carrying the highest OData version the client understands.
pub const MAX_DATA_SERVICE_VERSION_HEADER: &str = "maxdataserviceversion";

const SERVICE_PATH: &str = "v1/ManagementService.svc";

/// Configuration for [`SqlDatabaseClient`].
#[derive(Debug, Clone)]
pub struct SqlClientConfig {
    /// Base URL of the management service.
    pub base_url: Url,
    /// The server whose databases are managed.
    pub server_name: String,
    /// Connection timeout.
    pub connect_timeout: Duration,
    /// Request timeout.
    pub request_timeout: Duration,
}

impl SqlClientConfig {
    /// Create a configuration for `server_name` behind `base_url`.
    #[must_use]
    pub fn new(base_url: Url, server_name: impl Into<String>) -> Self {
        Self {
            base_url,
            server_name: server_name.into(),
            connect_timeout: Duration::from_secs(30),
            request_timeout: Duration::from_secs(60),
        }
    }

    /// Set the connection timeout.
    #[must_use]
    pub const fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the request timeout.
    #[must_use]
    pub const fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

/// Reads databases from a SQL server over OData.
///
/// Every request carries the OData headers, the run's client session id
/// and a fresh client request id. The last request id is kept so failures
/// can be reported with it.
#[derive(Debug)]
pub struct SqlDatabaseClient {
    config: SqlClientConfig,
    context: ExecutionContext,
    client: Client,
    last_request_id: RwLock<Option<String>>,
}

impl SqlDatabaseClient {
    /// Create a client acting within `context`.
    pub fn new(config: SqlClientConfig, context: &ExecutionContext) -> Result<Self, MgmtError> {
        let client = Client::builder()
            .user_agent(context.user_agent())
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| MgmtError::http_with_source("Failed to create HTTP client", e))?;

        Ok(Self {
            config,
            context: context.clone(),
            client,
            last_request_id: RwLock::new(None),
        })
    }

    /// The server this client talks to.
    #[must_use]
    pub fn server_name(&self) -> &str {
        &self.config.server_name
    }

    /// The run's client session id.
    #[must_use]
    pub fn client_session_id(&self) -> &str {
        self.context.client_session_id()
    }

    /// The id of the most recent request, if one was sent.
    #[must_use]
    pub fn last_request_id(&self) -> Option<String> {
        self.last_request_id.read().ok().and_then(|id| id.clone())
    }

    /// List every database on the server.
    pub async fn list_databases(&self) -> Result<Vec<Database>, MgmtError> {
        let url = self.databases_url(false)?;
        let feed: ODataFeed<Database> = self.get(url).await?;
        Ok(feed.value)
    }

    /// Get one database by name.
    ///
    /// Fails with [`MgmtError::ResourceNotFound`] when the server has no
    /// database of that name.
    pub async fn get_database(&self, name: &str) -> Result<Database, MgmtError> {
        let mut url = self.databases_url(true)?;
        url.set_query(Some(&format!("$filter=Name eq '{}'", name.replace('\'', "''"))));

        let feed: ODataFeed<Database> = self.get(url).await?;
        feed.value.into_iter().next().ok_or_else(|| {
            let resource = format!("{}.{name}", self.config.server_name);
            let message = format!("Database '{resource}' not found.");
            MgmtError::resource_not_found(resource, message)
        })
    }

    fn databases_url(&self, filtered: bool) -> Result<Url, MgmtError> {
        let path = format!(
            "{SERVICE_PATH}/Servers('{}')/Databases{}",
            self.config.server_name,
            if filtered { "()" } else { "" }
        );
        Ok(self.config.base_url.join(&path)?)
    }

    fn headers(&self, request_id: &str) -> Result<HeaderMap, MgmtError> {
        let value = |v: &str| {
            HeaderValue::from_str(v).map_err(|e| MgmtError::http_with_source("Invalid header value", e))
        };
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(ODATA_ACCEPT));
        headers.insert(DATA_SERVICE_VERSION_HEADER, HeaderValue::from_static(ODATA_VERSION));
        headers.insert(MAX_DATA_SERVICE_VERSION_HEADER, HeaderValue::from_static(ODATA_VERSION));
        headers.insert(CLIENT_SESSION_ID_HEADER, value(self.context.client_session_id())?);
        headers.insert(CLIENT_REQUEST_ID_HEADER, value(request_id)?);
        Ok(headers)
    }

    async fn get<T: serde::de::DeserializeOwned>(&self, url: Url) -> Result<T, MgmtError> {
        let request_id = self.context.new_request_id();
        if let Ok(mut last) = self.last_request_id.write() {
            *last = Some(request_id.clone());
        }
        tracing::debug!(%url, request_id = %request_id, "GET");

        let response = self
            .client
            .get(url)
            .headers(self.headers(&request_id)?)
            .send()
            .await
            .map_err(|e| MgmtError::http_with_source("OData request failed", e))?;

        let body = check_status(response).await?;
        Ok(serde_json::from_str(&body)?)
    }
}

async fn check_status(response: Response) -> Result<String, MgmtError> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| MgmtError::http_with_source("Failed to read response body", e))?;
    if status.is_success() {
        return Ok(body);
    }

    tracing::warn!(status = status.as_u16(), "OData request rejected");
    match serde_json::from_str::<ODataErrorBody>(&body) {
        Ok(ODataErrorBody { error }) => match error.code {
            Some(code) => Err(MgmtError::service_with_code(status.as_u16(), code, error.message.value)),
            None => Err(MgmtError::service(status.as_u16(), error.message.value)),
        },
        Err(_) => Err(MgmtError::service(status.as_u16(), body)),
    }
}
