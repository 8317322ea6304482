//! HTTP request/response model.
//!
//! These types describe both recorded exchanges (loaded from session
//! fixtures) and the live requests observed by the mock server. They are
//! plain data: no client or server machinery lives here.

use serde::{Deserialize, Serialize};
use url::Url;

/// Header name for the user agent.
pub const USER_AGENT_HEADER: &str = "User-Agent";

/// Header name for the request content type.
pub const CONTENT_TYPE_HEADER: &str = "Content-Type";

/// An ordered list of header name/value pairs.
///
/// Order and duplicates are preserved as recorded; lookups ignore ASCII case.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Headers(Vec<(String, String)>);

impl Headers {
    /// Create an empty header list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the first value for a header.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Get every value for a header, in recorded order.
    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.0
            .iter()
            .filter(move |(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Check whether a header is present.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Append a header, keeping any existing values.
    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.push((name.into(), value.into()));
    }

    /// Set a header, replacing any existing values.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        self.remove(&name);
        self.0.push((name, value.into()));
    }

    /// Remove every value for a header.
    pub fn remove(&mut self, name: &str) {
        self.0.retain(|(n, _)| !n.eq_ignore_ascii_case(name));
    }

    /// Iterate over name/value pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Number of header entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if there are no headers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for Headers
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// An HTTP request: method, URL, headers and body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpRequest {
    /// Request method, upper case (`GET`, `POST`, ...).
    pub method: String,
    /// Absolute URL, or path and query when the host is irrelevant.
    pub url: String,
    /// Request headers, including `User-Agent`.
    #[serde(default)]
    pub headers: Headers,
    /// Request body as text.
    #[serde(default)]
    pub body: String,
}

impl HttpRequest {
    /// Create a request with no headers and an empty body.
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            url: url.into(),
            headers: Headers::new(),
            body: String::new(),
        }
    }

    /// Add a header.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.append(name, value);
        self
    }

    /// Set the body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    /// The `User-Agent` header, if sent.
    #[must_use]
    pub fn user_agent(&self) -> Option<&str> {
        self.headers.get(USER_AGENT_HEADER)
    }

    /// Parse the URL, resolving a bare path against a placeholder host.
    #[must_use]
    pub fn parsed_url(&self) -> Option<Url> {
        Url::parse(&self.url).ok().or_else(|| {
            Url::parse("http://localhost/")
                .ok()
                .and_then(|base| base.join(&self.url).ok())
        })
    }

    /// The path of the URL.
    #[must_use]
    pub fn path(&self) -> String {
        self.parsed_url()
            .map_or_else(|| self.url.clone(), |url| url.path().to_string())
    }

    /// The path and raw query of the URL, as sent on the request line.
    #[must_use]
    pub fn path_and_query(&self) -> String {
        match self.parsed_url() {
            Some(url) => match url.query() {
                Some(query) => format!("{}?{query}", url.path()),
                None => url.path().to_string(),
            },
            None => self.url.clone(),
        }
    }

    /// Decoded query pairs, in order.
    #[must_use]
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        self.parsed_url()
            .map(|url| {
                url.query_pairs()
                    .map(|(k, v)| (k.into_owned(), v.into_owned()))
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// An HTTP response: status, headers and body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpResponse {
    /// Status code.
    pub status: u16,
    /// Response headers.
    #[serde(default)]
    pub headers: Headers,
    /// Response body as text.
    #[serde(default)]
    pub body: String,
}

impl HttpResponse {
    /// Create a response with a status and nothing else.
    #[must_use]
    pub fn new(status: u16) -> Self {
        Self {
            status,
            headers: Headers::new(),
            body: String::new(),
        }
    }

    /// Create a JSON response.
    #[must_use]
    pub fn json(status: u16, body: &serde_json::Value) -> Self {
        Self::new(status)
            .with_header(CONTENT_TYPE_HEADER, "application/json")
            .with_body(body.to_string())
    }

    /// Add a header.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.append(name, value);
        self
    }

    /// Set the body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    /// Check for a 2xx status.
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// One recorded exchange: a request and the response recorded for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpMessage {
    /// Position of this exchange within its session, starting at 0.
    pub index: usize,
    /// The recorded request.
    pub request: HttpRequest,
    /// The response recorded for `request`.
    pub response: HttpResponse,
}

impl HttpMessage {
    /// Pair a request with its response.
    #[must_use]
    pub fn new(index: usize, request: HttpRequest, response: HttpResponse) -> Self {
        Self {
            index,
            request,
            response,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_lookup_ignores_case() {
        let request = HttpRequest::new("GET", "/")
            .with_header("user-agent", "mgmtkit/0.4.0")
            .with_header("Accept", "application/json");

        assert_eq!(request.user_agent(), Some("mgmtkit/0.4.0"));
        assert_eq!(request.headers.get("ACCEPT"), Some("application/json"));
        assert!(!request.headers.contains("DataServiceVersion"));
    }

    #[test]
    fn test_header_insert_replaces() {
        let mut headers = Headers::new();
        headers.append("x-ms-version", "2012-03-01");
        headers.append("X-MS-VERSION", "2012-08-01");
        assert_eq!(headers.get_all("x-ms-version").count(), 2);

        headers.insert("x-ms-version", "2013-06-01");
        assert_eq!(headers.len(), 1);
        assert_eq!(headers.get("x-ms-version"), Some("2013-06-01"));
    }

    #[test]
    fn test_path_and_query_for_absolute_and_relative_urls() {
        let absolute = HttpRequest::new(
            "GET",
            "https://mgmt.example.net/v1/ManagementService.svc/Servers('testserver')/Databases?$top=2",
        );
        assert_eq!(
            absolute.path_and_query(),
            "/v1/ManagementService.svc/Servers('testserver')/Databases?$top=2"
        );

        let relative = HttpRequest::new("GET", "/store/addons/search");
        assert_eq!(relative.path(), "/store/addons/search");
        assert_eq!(relative.path_and_query(), "/store/addons/search");
    }

    #[test]
    fn test_query_pairs_are_decoded() {
        let request = HttpRequest::new("GET", "/Databases()?%24filter=Name%20eq%20%27testdb1%27");
        assert_eq!(
            request.query_pairs(),
            vec![("$filter".to_string(), "Name eq 'testdb1'".to_string())]
        );
    }

    #[test]
    fn test_message_json_shape() {
        let message = HttpMessage::new(
            0,
            HttpRequest::new("GET", "/ping").with_header("User-Agent", "ua"),
            HttpResponse::json(200, &serde_json::json!({"ok": true})),
        );
        let json = serde_json::to_value(&message).unwrap();
        assert_eq!(json["request"]["headers"][0][0], "User-Agent");
        assert_eq!(json["response"]["status"], 200);

        let restored: HttpMessage = serde_json::from_value(json).unwrap();
        assert_eq!(restored, message);
    }
}
