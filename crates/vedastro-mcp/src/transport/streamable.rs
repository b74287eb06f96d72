//! Stateless streaming transport on `/mcp`.
//!
//! Each POST gets a fresh engine bound to a one-shot [`ExchangeTransport`].
//! The request body is fed in, the inbound side is closed, and the engine's
//! replies are collected into a single HTTP response: a JSON body, or
//! event-stream frames when JSON responses are disabled.

use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
};

use super::credentials::extract_api_key;
use super::framing::{self, Incoming};
use super::server::AppState;
use super::{envelope, inbound_channel, InboundReceiver, InboundSink, InboundSlot, Transport};
use crate::protocol::ProtocolHandler;
use crate::types::{error_codes, JsonRpcMessage, McpError, McpResult};

const JSON_CONTENT_TYPE: &str = "application/json";
const EVENT_STREAM_CONTENT_TYPE: &str = "text/event-stream";

/// Transport for one request/response exchange. Replies accumulate in memory.
pub struct ExchangeTransport {
    inbound: InboundSlot,
    replies: Mutex<Vec<JsonRpcMessage>>,
}

impl ExchangeTransport {
    pub fn new(inbound: InboundReceiver) -> Self {
        Self {
            inbound: InboundSlot::new(inbound),
            replies: Mutex::new(Vec::new()),
        }
    }

    /// Take every reply sent so far, in send order.
    pub fn take_replies(&self) -> Vec<JsonRpcMessage> {
        std::mem::take(&mut *self.replies.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

#[async_trait]
impl Transport for ExchangeTransport {
    async fn start(&self) -> McpResult<()> {
        Ok(())
    }

    async fn send(&self, message: JsonRpcMessage) -> McpResult<()> {
        self.replies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message);
        Ok(())
    }

    async fn close(&self) -> McpResult<()> {
        Ok(())
    }

    async fn subscribe(&self) -> Option<InboundReceiver> {
        self.inbound.take().await
    }
}

/// Fully materialized HTTP response for one exchange.
#[derive(Debug, Clone)]
pub struct ExchangeResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl ExchangeResponse {
    fn new(status: StatusCode, content_type: Option<&'static str>, body: String) -> Self {
        let mut headers = HeaderMap::new();
        if let Some(ct) = content_type {
            headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(ct));
            headers.insert(header::CONTENT_LENGTH, HeaderValue::from(body.len()));
        }
        if content_type == Some(EVENT_STREAM_CONTENT_TYPE) {
            headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
        }
        Self {
            status,
            headers,
            body,
        }
    }

    /// Error envelope that could not be correlated to a request.
    fn rejection(status: StatusCode, error: &McpError) -> Self {
        let body = serde_json::json!({
            "jsonrpc": crate::types::JSONRPC_VERSION,
            "error": { "code": error.code(), "message": error.to_string() },
            "id": null
        });
        Self::new(status, Some(JSON_CONTENT_TYPE), body.to_string())
    }

    pub fn accepted() -> Self {
        Self::new(StatusCode::ACCEPTED, None, String::new())
    }
}

impl IntoResponse for ExchangeResponse {
    fn into_response(self) -> Response {
        let mut headers = self.headers;
        // The body is re-framed on the way out; a stale length would truncate it.
        headers.remove(header::CONTENT_LENGTH);
        (self.status, headers, self.body).into_response()
    }
}

/// `/mcp`: POST carries messages, GET has no standalone stream, DELETE is a
/// no-op session teardown.
pub async fn handle_mcp(
    State(state): State<Arc<AppState>>,
    method: Method,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    match method {
        Method::POST => match exchange(&state, &headers, &body).await {
            Ok(response) => response.into_response(),
            Err(e) => {
                tracing::error!("Error handling MCP request: {e}");
                envelope::internal_failure(&e.to_string())
            }
        },
        Method::DELETE => StatusCode::OK.into_response(),
        _ => envelope::jsonrpc_failure(
            StatusCode::METHOD_NOT_ALLOWED,
            error_codes::INVALID_REQUEST,
            "Method not allowed. This endpoint is stateless; send messages with POST.",
        ),
    }
}

/// Validate, run, and render one exchange.
///
/// Client mistakes come back as `Ok` with a 4xx status; `Err` means the
/// engine or transport failed.
pub async fn exchange(
    state: &AppState,
    headers: &HeaderMap,
    body: &[u8],
) -> McpResult<ExchangeResponse> {
    if !content_type_ok(headers) {
        return Ok(ExchangeResponse::rejection(
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            &McpError::InvalidRequest("Content-Type must be application/json".to_string()),
        ));
    }

    if !accept_ok(headers) {
        return Ok(ExchangeResponse::rejection(
            StatusCode::NOT_ACCEPTABLE,
            &McpError::InvalidRequest(
                "Client must accept application/json or text/event-stream".to_string(),
            ),
        ));
    }

    let incoming = match framing::parse_body(body) {
        Ok(incoming) => incoming,
        Err(e) => {
            tracing::debug!("Rejected MCP request body: {e}");
            return Ok(ExchangeResponse::rejection(StatusCode::BAD_REQUEST, &e));
        }
    };

    let engine = Arc::new(ProtocolHandler::new(
        state.client.with_api_key(extract_api_key(headers)),
    ));
    let replies = run(engine, &incoming).await?;

    if replies.is_empty() {
        return Ok(ExchangeResponse::accepted());
    }

    render(&incoming, replies, state.config.json_response)
}

/// Feed `incoming` to `engine` over a fresh exchange transport.
pub async fn run(
    engine: Arc<ProtocolHandler>,
    incoming: &Incoming,
) -> McpResult<Vec<JsonRpcMessage>> {
    let (sink, inbound) = inbound_channel();
    let transport = Arc::new(ExchangeTransport::new(inbound));
    drive(engine, transport.clone(), sink, incoming.messages.clone()).await?;
    Ok(in_request_order(&incoming.messages, transport.take_replies()))
}

/// Replies arrive in completion order; a response lists them in the order
/// their requests appeared.
fn in_request_order(
    requests: &[JsonRpcMessage],
    mut replies: Vec<JsonRpcMessage>,
) -> Vec<JsonRpcMessage> {
    replies.sort_by_key(|reply| {
        reply
            .id()
            .and_then(|id| {
                requests
                    .iter()
                    .position(|m| m.expects_reply() && m.id() == Some(id))
            })
            .unwrap_or(usize::MAX)
    });
    replies
}

async fn drive(
    engine: Arc<ProtocolHandler>,
    transport: Arc<dyn Transport>,
    sink: InboundSink,
    messages: Vec<JsonRpcMessage>,
) -> McpResult<()> {
    let task = engine.connect(transport.clone()).await?;
    transport.start().await?;

    for message in messages {
        sink.deliver(message)?;
    }
    drop(sink);

    task.await
        .map_err(|e| McpError::InternalError(format!("Exchange task failed: {e}")))?
}

fn render(
    incoming: &Incoming,
    replies: Vec<JsonRpcMessage>,
    json_response: bool,
) -> McpResult<ExchangeResponse> {
    if json_response {
        let body = if incoming.batch {
            serde_json::to_string(&replies)?
        } else {
            match replies.first() {
                Some(reply) => serde_json::to_string(reply)?,
                None => String::new(),
            }
        };
        return Ok(ExchangeResponse::new(
            StatusCode::OK,
            Some(JSON_CONTENT_TYPE),
            body,
        ));
    }

    let mut body = String::new();
    for reply in &replies {
        body.push_str(&framing::encode_message(reply)?);
    }
    Ok(ExchangeResponse::new(
        StatusCode::OK,
        Some(EVENT_STREAM_CONTENT_TYPE),
        body,
    ))
}

fn content_type_ok(headers: &HeaderMap) -> bool {
    match headers.get(header::CONTENT_TYPE).and_then(|v| v.to_str().ok()) {
        Some(ct) => ct.to_ascii_lowercase().contains(JSON_CONTENT_TYPE),
        None => true,
    }
}

fn accept_ok(headers: &HeaderMap) -> bool {
    match headers.get(header::ACCEPT).and_then(|v| v.to_str().ok()) {
        Some(accept) => {
            let accept = accept.to_ascii_lowercase();
            accept.contains(JSON_CONTENT_TYPE)
                || accept.contains(EVENT_STREAM_CONTENT_TYPE)
                || accept.contains("*/*")
                || accept.contains("application/*")
        }
        None => true,
    }
}
