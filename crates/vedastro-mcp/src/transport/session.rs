//! Legacy session-stream transport: a long-lived `GET /sse` event stream per
//! client, with client messages arriving on `POST /messages`.

use std::convert::Infallible;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{header, HeaderMap, HeaderName, HeaderValue, Method, StatusCode},
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
};
use serde::Deserialize;
use tokio::sync::mpsc;
use uuid::Uuid;

use super::credentials::extract_api_key;
use super::registry::{Session, SessionRegistry};
use super::server::AppState;
use super::{envelope, framing, inbound_channel, InboundReceiver, InboundSlot, Transport};
use crate::protocol::ProtocolHandler;
use crate::types::{JsonRpcMessage, McpError, McpResult};

/// Header carrying the session token, on the stream response and on POSTs.
pub const SESSION_HEADER: &str = "x-session-id";

/// Outbound frames buffered per session before `send` waits.
const OUTBOUND_CAPACITY: usize = 64;

/// Engine-facing half of one session stream.
pub struct SseSessionTransport {
    session_id: String,
    endpoint: String,
    outbound: Mutex<Option<mpsc::Sender<Event>>>,
    inbound: InboundSlot,
    closed: AtomicBool,
}

impl SseSessionTransport {
    pub fn new(
        session_id: &str,
        endpoint: &str,
        outbound: mpsc::Sender<Event>,
        inbound: InboundReceiver,
    ) -> Self {
        Self {
            session_id: session_id.to_string(),
            endpoint: endpoint.to_string(),
            outbound: Mutex::new(Some(outbound)),
            inbound: InboundSlot::new(inbound),
            closed: AtomicBool::new(false),
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Drop the outbound sender, ending the stream. Returns `false` if the
    /// transport was already shut down.
    pub fn shutdown(&self) -> bool {
        if self.closed.swap(true, Ordering::SeqCst) {
            return false;
        }
        self.outbound
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        tracing::debug!(session_id = %self.session_id, "Session transport closed");
        true
    }

    async fn push(&self, event: Event) -> McpResult<()> {
        let sender = self
            .outbound
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or_else(|| McpError::Transport("Session stream is closed".to_string()))?;

        sender
            .send(event)
            .await
            .map_err(|_| McpError::Transport("Session stream is closed".to_string()))
    }
}

#[async_trait]
impl Transport for SseSessionTransport {
    async fn start(&self) -> McpResult<()> {
        self.push(framing::endpoint_event(&self.endpoint)).await
    }

    async fn send(&self, message: JsonRpcMessage) -> McpResult<()> {
        self.push(framing::message_event(&message)?).await
    }

    async fn close(&self) -> McpResult<()> {
        self.shutdown();
        Ok(())
    }

    async fn subscribe(&self) -> Option<InboundReceiver> {
        self.inbound.take().await
    }
}

/// Removes the session when its stream is dropped, whoever drops it.
struct SessionGuard {
    token: String,
    sessions: SessionRegistry,
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        if let Some(session) = self.sessions.delete(&self.token) {
            session.transport().shutdown();
            let lasted = chrono::Utc::now() - session.connected_at();
            tracing::info!(
                session_id = %self.token,
                seconds = lasted.num_seconds(),
                "SSE session ended"
            );
        }
    }
}

/// `GET /sse`: open a session stream.
pub async fn handle_establish(
    State(state): State<Arc<AppState>>,
    method: Method,
    headers: HeaderMap,
) -> Response {
    if method != Method::GET {
        return envelope::method_not_allowed(
            "Method not allowed. Use GET to establish SSE connection.",
        );
    }

    match establish(&state, &headers).await {
        Ok(response) => response,
        Err(e) => {
            tracing::error!("Error establishing SSE session: {e}");
            envelope::session_failure(&e.to_string())
        }
    }
}

async fn establish(state: &Arc<AppState>, headers: &HeaderMap) -> McpResult<Response> {
    let token = Uuid::new_v4().to_string();
    let token_header =
        HeaderValue::from_str(&token).map_err(|e| McpError::Transport(e.to_string()))?;

    let (event_tx, mut event_rx) = mpsc::channel(OUTBOUND_CAPACITY);
    let (sink, inbound_rx) = inbound_channel();
    let transport = Arc::new(SseSessionTransport::new(
        &token,
        &state.config.messages_endpoint(),
        event_tx,
        inbound_rx,
    ));

    let engine = Arc::new(ProtocolHandler::new(
        state.client.with_api_key(extract_api_key(headers)),
    ));
    engine.clone().connect(transport.clone()).await?;
    transport.start().await?;

    state
        .sessions
        .put(Session::new(token.clone(), transport, engine, sink));
    tracing::info!(session_id = %token, "SSE session established");

    let guard = SessionGuard {
        token,
        sessions: state.sessions.clone(),
    };
    let stream = async_stream::stream! {
        let _guard = guard;
        while let Some(event) = event_rx.recv().await {
            yield Ok::<_, Infallible>(event);
        }
    };

    let sse = Sse::new(stream).keep_alive(KeepAlive::new().interval(state.config.keep_alive));

    Ok((
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("text/event-stream")),
            (header::CACHE_CONTROL, HeaderValue::from_static("no-cache")),
            (header::CONNECTION, HeaderValue::from_static("keep-alive")),
            (HeaderName::from_static(SESSION_HEADER), token_header),
        ],
        sse,
    )
        .into_response())
}

#[derive(Debug, Default, Deserialize)]
pub struct SubmitQuery {
    #[serde(rename = "sessionId")]
    pub session_id: Option<String>,
}

/// `POST /messages`: hand one client message to an existing session.
///
/// The reply, if any, travels on the session's stream; this response only
/// acknowledges receipt.
pub async fn handle_submit(
    State(state): State<Arc<AppState>>,
    method: Method,
    headers: HeaderMap,
    Query(query): Query<SubmitQuery>,
    body: Bytes,
) -> Response {
    if method != Method::POST {
        return envelope::method_not_allowed("Method not allowed. Use POST to send messages.");
    }

    let token = headers
        .get(SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .or_else(|| query.session_id.filter(|v| !v.trim().is_empty()));

    let Some(token) = token else {
        return envelope::plain(
            StatusCode::BAD_REQUEST,
            "Missing X-Session-Id header or sessionId query parameter",
        );
    };

    let not_found = || {
        envelope::plain(
            StatusCode::NOT_FOUND,
            format!(
                "Session not found. Please reconnect to {}",
                state.config.sse_endpoint()
            ),
        )
    };

    let Some(session) = state.sessions.get(&token) else {
        tracing::debug!(session_id = %token, "Message for unknown session");
        return not_found();
    };

    let message = match framing::parse_message(&body) {
        Ok(message) => message,
        Err(e) => {
            tracing::warn!(session_id = %token, "Rejected session message: {e}");
            return envelope::session_failure(&e.to_string());
        }
    };

    if session.is_stale() || session.deliver(message).is_err() {
        tracing::info!(session_id = %token, "Session engine stopped; evicting");
        if let Some(stale) = state.sessions.delete(&token) {
            stale.transport().shutdown();
        }
        return not_found();
    }

    (StatusCode::ACCEPTED, "Accepted").into_response()
}
