//! Local HTTP listener replaying a recorded session.
//!
//! The server runs on its own thread with a single-threaded tokio runtime,
//! so it can be driven from plain `#[test]` functions as well as from
//! `#[tokio::test]` ones. Stopping or dropping the server signals a graceful
//! shutdown and joins that thread: once `stop` or `drop` returns, the
//! listening address has been released.
//!
//! # Example
//!
//! ```rust,no_run
//! use mgmtkit_core::http::{HttpRequest, HttpResponse};
//! use mgmtkit_core::session::HttpSession;
//! use mgmtkit_testing::{ExceptionManager, MockHttpServer};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let exceptions = ExceptionManager::new();
//! let session = HttpSession::new("UnitTests.Ping")
//!     .with_exchange(HttpRequest::new("GET", "/ping"), HttpResponse::new(204));
//!
//! let server = MockHttpServer::start(&exceptions, "http://127.0.0.1:0/", session)?;
//! // ... point the client under test at server.uri() ...
//! let report = server.stop()?;
//! report.assert_all_consumed();
//! exceptions.finish()?;
//! # Ok(())
//! # }
//! ```

use std::net::SocketAddr;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::thread::JoinHandle;

use axum::Router;
use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use mgmtkit_core::MgmtError;
use mgmtkit_core::http::{Headers, HttpRequest, HttpResponse};
use mgmtkit_core::session::{HttpSession, SessionRecorder};
use mgmtkit_core::validator::{RequestValidator, ValidationError};
use tokio::net::{TcpListener, TcpSocket};
use tokio::sync::oneshot;
use url::Url;

use crate::config::{MockServerConfig, ReplayMode};
use crate::exceptions::{ExceptionManager, FaultReporter, ReplayFault};

/// Body of the answer to a request past the end of the recording.
pub const NO_MORE_REQUESTS: &str = "No more requests expected.";

/// Headers describing message framing, recomputed rather than replayed.
const FRAMING_HEADERS: &[&str] = &["content-length", "transfer-encoding", "connection"];

/// Summary of a finished replay.
#[derive(Debug, Clone)]
pub struct ReplayReport {
    /// The replayed session.
    pub session: String,
    /// Requests the server answered.
    pub served: usize,
    /// Exchanges in the session.
    pub expected: usize,
    /// The session captured in record mode.
    pub recorded: Option<HttpSession>,
}

impl ReplayReport {
    /// Check that every recorded exchange was requested exactly once.
    #[must_use]
    pub fn all_consumed(&self) -> bool {
        self.served == self.expected
    }

    /// Assert that every recorded exchange was requested exactly once.
    ///
    /// # Panics
    ///
    /// Panics if fewer or more requests were served than recorded.
    pub fn assert_all_consumed(&self) {
        assert!(
            self.all_consumed(),
            "Session '{}' served {} of {} recorded requests",
            self.session,
            self.served,
            self.expected
        );
    }
}

enum Backend {
    Replay {
        session: HttpSession,
        validator: Arc<dyn RequestValidator>,
    },
    Record {
        client: reqwest::Client,
        upstream: Url,
        recorder: SessionRecorder,
    },
}

struct ReplayState {
    session_name: String,
    backend: Backend,
    next_index: AtomicUsize,
    faults: FaultReporter,
    max_body_size: usize,
}

/// A local HTTP listener answering from a recorded [`HttpSession`].
///
/// Each inbound request takes the next position in the session. The
/// session's validator compares it with the recorded request; failures are
/// reported to the [`ExceptionManager`] the server was started with. The
/// recorded response is returned either way, and requests past the end of
/// the recording get `500 No more requests expected.`.
pub struct MockHttpServer {
    address: SocketAddr,
    uri: Url,
    state: Arc<ReplayState>,
    expected: usize,
    shutdown: Option<oneshot::Sender<()>>,
    worker: Option<JoinHandle<Result<(), MgmtError>>>,
}

impl MockHttpServer {
    /// Start replaying `session` on `prefix`, e.g. `http://127.0.0.1:12345/`.
    pub fn start(
        exceptions: &ExceptionManager,
        prefix: &str,
        session: HttpSession,
    ) -> Result<Self, MgmtError> {
        Self::start_with_config(exceptions, MockServerConfig::new(prefix), session)
    }

    /// Start with full configuration.
    pub fn start_with_config(
        exceptions: &ExceptionManager,
        config: MockServerConfig,
        session: HttpSession,
    ) -> Result<Self, MgmtError> {
        let requested = config.socket_addr()?;
        let mut uri = config.prefix_url()?;
        let session_name = session.name.clone();

        let (backend, expected) = match &config.mode {
            ReplayMode::Replay => {
                let session = session.resolved();
                let expected = session.len();
                let validator = session.validator();
                (Backend::Replay { session, validator }, expected)
            }
            ReplayMode::Record { upstream } => {
                let client = reqwest::Client::builder()
                    .build()
                    .map_err(|e| MgmtError::http_with_source("Failed to build upstream client", e))?;
                let recorder = SessionRecorder::new(&session.name);
                let mut settings = session.settings.clone();
                settings.service_base_uri = Some(upstream.clone());
                recorder.set_settings(settings);
                let backend = Backend::Record {
                    client,
                    upstream: upstream.clone(),
                    recorder,
                };
                (backend, 0)
            }
        };

        let state = Arc::new(ReplayState {
            session_name,
            backend,
            next_index: AtomicUsize::new(0),
            faults: exceptions.reporter(),
            max_body_size: config.max_body_size,
        });

        let (ready_tx, ready_rx) = mpsc::channel();
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let worker_state = Arc::clone(&state);
        let worker = std::thread::Builder::new()
            .name(format!("mock-http-{}", requested.port()))
            .spawn(move || run_worker(requested, worker_state, ready_tx, shutdown_rx))
            .map_err(|e| MgmtError::internal(format!("Failed to spawn mock server thread: {e}")))?;

        let bound = match ready_rx.recv_timeout(config.bind_timeout) {
            Ok(Ok(bound)) => bound,
            Ok(Err(e)) => {
                let _ = worker.join();
                return Err(e);
            }
            Err(_) => {
                drop(shutdown_tx);
                let _ = worker.join();
                return Err(MgmtError::bind(
                    requested.to_string(),
                    std::io::Error::new(
                        std::io::ErrorKind::TimedOut,
                        format!("listener not ready within {:?}", config.bind_timeout),
                    ),
                ));
            }
        };

        uri.set_port(Some(bound.port()))
            .map_err(|()| MgmtError::invalid_address(&config.prefix, "cannot set port"))?;
        tracing::info!(address = %bound, session = %state.session_name, expected, "Mock server listening");

        Ok(Self {
            address: bound,
            uri,
            state,
            expected,
            shutdown: Some(shutdown_tx),
            worker: Some(worker),
        })
    }

    /// The URL clients should call, with the port actually bound.
    #[must_use]
    pub fn uri(&self) -> &Url {
        &self.uri
    }

    /// The bound socket address.
    #[must_use]
    pub fn address(&self) -> SocketAddr {
        self.address
    }

    /// Name of the session being served.
    #[must_use]
    pub fn session_name(&self) -> &str {
        &self.state.session_name
    }

    /// Requests answered so far.
    #[must_use]
    pub fn served(&self) -> usize {
        self.state.next_index.load(Ordering::SeqCst)
    }

    /// Check if the listener is still running.
    #[must_use]
    pub fn is_listening(&self) -> bool {
        self.worker.as_ref().is_some_and(|w| !w.is_finished())
    }

    /// Stop listening and report what was served.
    ///
    /// Returns once the listening address has been released.
    pub fn stop(mut self) -> Result<ReplayReport, MgmtError> {
        self.shutdown()?;

        let served = self.served();
        let recorded = match &self.state.backend {
            Backend::Record { recorder, .. } => Some(recorder.clone().finalize()),
            Backend::Replay { .. } => None,
        };
        let expected = recorded.as_ref().map_or(self.expected, HttpSession::len);

        Ok(ReplayReport {
            session: self.state.session_name.clone(),
            served,
            expected,
            recorded,
        })
    }

    fn shutdown(&mut self) -> Result<(), MgmtError> {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        let Some(worker) = self.worker.take() else {
            return Ok(());
        };
        let result = worker
            .join()
            .map_err(|_| MgmtError::internal("Mock server thread panicked"))?;
        tracing::info!(address = %self.address, served = self.served(), "Mock server stopped");
        result
    }
}

impl Drop for MockHttpServer {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            tracing::error!(error = %e, "Mock server did not shut down cleanly");
        }
    }
}

impl std::fmt::Debug for MockHttpServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockHttpServer")
            .field("uri", &self.uri.as_str())
            .field("session", &self.state.session_name)
            .field("served", &self.served())
            .field("expected", &self.expected)
            .finish_non_exhaustive()
    }
}

fn run_worker(
    address: SocketAddr,
    state: Arc<ReplayState>,
    ready: mpsc::Sender<Result<SocketAddr, MgmtError>>,
    shutdown: oneshot::Receiver<()>,
) -> Result<(), MgmtError> {
    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            let _ = ready.send(Err(MgmtError::internal(format!(
                "Failed to start mock server runtime: {e}"
            ))));
            return Ok(());
        }
    };

    runtime.block_on(async move {
        let listener = match bind_listener(address) {
            Ok(listener) => listener,
            Err(e) => {
                let _ = ready.send(Err(e));
                return Ok(());
            }
        };
        let bound = match listener.local_addr() {
            Ok(bound) => bound,
            Err(e) => {
                let _ = ready.send(Err(MgmtError::bind(address.to_string(), e)));
                return Ok(());
            }
        };
        if ready.send(Ok(bound)).is_err() {
            // The caller gave up waiting.
            return Ok(());
        }

        let router = Router::new().fallback(replay_handler).with_state(state);
        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.await;
            })
            .await
            .map_err(|e| MgmtError::bind(bound.to_string(), e))
    })
}

fn bind_listener(address: SocketAddr) -> Result<TcpListener, MgmtError> {
    let bind_error = |e| MgmtError::bind(address.to_string(), e);
    let socket = if address.is_ipv4() {
        TcpSocket::new_v4()
    } else {
        TcpSocket::new_v6()
    }
    .map_err(bind_error)?;
    socket.set_reuseaddr(true).map_err(bind_error)?;
    socket.bind(address).map_err(bind_error)?;
    socket.listen(1024).map_err(bind_error)
}

async fn replay_handler(State(state): State<Arc<ReplayState>>, request: Request) -> Response {
    let index = state.next_index.fetch_add(1, Ordering::SeqCst);
    let (parts, body) = request.into_parts();
    let body = match axum::body::to_bytes(body, state.max_body_size).await {
        Ok(body) => body,
        Err(e) => {
            tracing::warn!(session = %state.session_name, index, error = %e, "Request body rejected");
            state.faults.report(ReplayFault::new(
                &state.session_name,
                ValidationError::custom(index, format!("request body rejected: {e}")),
            ));
            return (
                StatusCode::PAYLOAD_TOO_LARGE,
                format!("Request body rejected: {e}"),
            )
                .into_response();
        }
    };

    let url = parts
        .uri
        .path_and_query()
        .map_or_else(|| parts.uri.path().to_string(), ToString::to_string);
    let headers: Headers = parts
        .headers
        .iter()
        .map(|(name, value)| {
            (
                name.as_str().to_string(),
                String::from_utf8_lossy(value.as_bytes()).into_owned(),
            )
        })
        .collect();
    let observed = HttpRequest {
        method: parts.method.as_str().to_string(),
        url,
        headers,
        body: String::from_utf8_lossy(&body).into_owned(),
    };

    match &state.backend {
        Backend::Replay { session, validator } => {
            state.replay(session, validator.as_ref(), index, &observed)
        }
        Backend::Record {
            client,
            upstream,
            recorder,
        } => state.forward(client, upstream, recorder, index, observed).await,
    }
}

impl ReplayState {
    fn replay(
        &self,
        session: &HttpSession,
        validator: &dyn RequestValidator,
        index: usize,
        observed: &HttpRequest,
    ) -> Response {
        let expected = session.message(index);
        let verdict = catch_unwind(AssertUnwindSafe(|| {
            validator.validate(index, expected, observed)
        }))
        .unwrap_or_else(|payload| {
            Err(ValidationError::Assertion {
                index,
                message: panic_message(payload.as_ref()),
            })
        });

        match verdict {
            Ok(()) => tracing::debug!(
                session = %self.session_name,
                index,
                method = %observed.method,
                url = %observed.url,
                "Replayed request"
            ),
            Err(error) => {
                tracing::warn!(session = %self.session_name, index, %error, "Request failed validation");
                self.faults.report(ReplayFault::new(&self.session_name, error));
            }
        }

        match expected {
            Some(message) => to_response(&message.response),
            None => (StatusCode::INTERNAL_SERVER_ERROR, NO_MORE_REQUESTS).into_response(),
        }
    }

    async fn forward(
        &self,
        client: &reqwest::Client,
        upstream: &Url,
        recorder: &SessionRecorder,
        index: usize,
        mut observed: HttpRequest,
    ) -> Response {
        let target = format!(
            "{}{}",
            upstream.as_str().trim_end_matches('/'),
            observed.path_and_query()
        );
        observed.url = target;
        for name in FRAMING_HEADERS.iter().copied().chain(["host"]) {
            observed.headers.remove(name);
        }

        match send_upstream(client, &observed).await {
            Ok(response) => {
                tracing::debug!(
                    session = %self.session_name,
                    index,
                    url = %observed.url,
                    status = response.status,
                    "Recorded upstream exchange"
                );
                let reply = to_response(&response);
                recorder.record(observed, response);
                reply
            }
            Err(e) => {
                tracing::warn!(session = %self.session_name, index, error = %e, "Upstream request failed");
                self.faults.report(ReplayFault::new(
                    &self.session_name,
                    ValidationError::custom(index, format!("upstream request failed: {e}")),
                ));
                (StatusCode::BAD_GATEWAY, e.to_string()).into_response()
            }
        }
    }
}

async fn send_upstream(
    client: &reqwest::Client,
    request: &HttpRequest,
) -> Result<HttpResponse, MgmtError> {
    let method = reqwest::Method::from_bytes(request.method.as_bytes())
        .map_err(|e| MgmtError::http_with_source("Invalid method", e))?;
    let mut builder = client.request(method, &request.url);
    for (name, value) in request.headers.iter() {
        builder = builder.header(name, value);
    }
    if !request.body.is_empty() {
        builder = builder.body(request.body.clone());
    }

    let response = builder
        .send()
        .await
        .map_err(|e| MgmtError::http_with_source("Upstream request failed", e))?;
    let status = response.status().as_u16();
    let headers: Headers = response
        .headers()
        .iter()
        .filter(|(name, _)| !FRAMING_HEADERS.contains(&name.as_str()))
        .map(|(name, value)| {
            (
                name.as_str().to_string(),
                String::from_utf8_lossy(value.as_bytes()).into_owned(),
            )
        })
        .collect();
    let body = response
        .text()
        .await
        .map_err(|e| MgmtError::http_with_source("Failed to read upstream body", e))?;

    Ok(HttpResponse {
        status,
        headers,
        body,
    })
}

fn to_response(recorded: &HttpResponse) -> Response {
    let status = StatusCode::from_u16(recorded.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let mut response = Response::new(Body::from(recorded.body.clone()));
    *response.status_mut() = status;

    let headers = response.headers_mut();
    for (name, value) in recorded.headers.iter() {
        if FRAMING_HEADERS.iter().any(|h| h.eq_ignore_ascii_case(name)) {
            continue;
        }
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                headers.append(name, value);
            }
            _ => tracing::warn!(header = %name, "Skipping recorded header that is not valid HTTP"),
        }
    }
    response
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_framing_headers_not_replayed() {
        let recorded = HttpResponse::new(201)
            .with_header("Content-Type", "application/json")
            .with_header("Content-Length", "999")
            .with_header("Transfer-Encoding", "chunked")
            .with_body("{}");

        let response = to_response(&recorded);
        assert_eq!(response.status(), StatusCode::CREATED);
        assert!(response.headers().get("content-length").is_none());
        assert!(response.headers().get("transfer-encoding").is_none());
        assert_eq!(
            response.headers().get("content-type").map(|v| v.to_str().unwrap()),
            Some("application/json")
        );
    }

    #[test]
    fn test_invalid_status_becomes_server_error() {
        let response = to_response(&HttpResponse::new(42));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_panic_message_extraction() {
        let payload = catch_unwind(|| panic!("expected GET")).unwrap_err();
        assert_eq!(panic_message(payload.as_ref()), "expected GET");

        let payload = catch_unwind(|| std::panic::panic_any(7_u8)).unwrap_err();
        assert_eq!(panic_message(payload.as_ref()), "unknown panic");
    }
}
