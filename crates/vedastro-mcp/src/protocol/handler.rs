//! Protocol engine — receives JSON-RPC messages, routes them to tools, and
//! pushes replies back out through whichever transport it is connected to.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::Mutex;
use tokio::task::{AbortHandle, JoinHandle, JoinSet};
use vedastro::VedAstroClient;

use crate::tools::ToolRegistry;
use crate::transport::Transport;
use crate::types::*;

use super::negotiation::NegotiatedCapabilities;
use super::validator::validate_request;

/// Requests one engine runs at once; further inbound messages wait.
const MAX_IN_FLIGHT: usize = 32;

/// The protocol engine. Create one per session or per stateless exchange so
/// negotiated state never crosses clients.
pub struct ProtocolHandler {
    client: VedAstroClient,
    capabilities: Arc<Mutex<NegotiatedCapabilities>>,
}

impl ProtocolHandler {
    pub fn new(client: VedAstroClient) -> Self {
        Self {
            client,
            capabilities: Arc::new(Mutex::new(NegotiatedCapabilities::default())),
        }
    }

    pub async fn is_initialized(&self) -> bool {
        self.capabilities.lock().await.initialized
    }

    /// Subscribe to the transport's inbound channel and serve it.
    ///
    /// Messages are read in arrival order. Notifications are handled inline;
    /// each request runs on its own task and its reply is sent when it
    /// completes, so replies may overtake each other (clients match them by
    /// id). A `notifications/cancelled` aborts the named request if it is
    /// still running. The task ends once the inbound channel has closed and
    /// every request has finished, closing the transport, or as soon as a
    /// reply cannot be sent, in which case the send error is its output.
    pub async fn connect(
        self: Arc<Self>,
        transport: Arc<dyn Transport>,
    ) -> McpResult<JoinHandle<McpResult<()>>> {
        let mut inbound = transport
            .subscribe()
            .await
            .ok_or_else(|| McpError::Transport("Transport already connected".to_string()))?;

        Ok(tokio::spawn(async move {
            let mut running: JoinSet<(String, McpResult<()>)> = JoinSet::new();
            let mut abort_handles: HashMap<String, AbortHandle> = HashMap::new();
            let mut outcome = Ok(());
            let mut open = true;

            while open || !running.is_empty() {
                tokio::select! {
                    received = inbound.recv(), if open && running.len() < MAX_IN_FLIGHT => {
                        match received {
                            Some(JsonRpcMessage::Request(request)) => {
                                let key = request.id.to_string();
                                let engine = self.clone();
                                let transport = transport.clone();
                                let task_key = key.clone();
                                let handle = running.spawn(async move {
                                    let reply = engine.handle_request(request).await;
                                    (task_key, transport.send(reply).await)
                                });
                                abort_handles.insert(key, handle);
                            }
                            Some(other) => {
                                if let Some(key) = cancelled_request(&other) {
                                    if let Some(handle) = abort_handles.remove(&key) {
                                        handle.abort();
                                        tracing::debug!(request_id = %key, "Aborted cancelled request");
                                    }
                                }
                                self.handle_message(other).await;
                            }
                            None => open = false,
                        }
                    }
                    Some(joined) = running.join_next(), if !running.is_empty() => {
                        match joined {
                            Ok((key, sent)) => {
                                abort_handles.remove(&key);
                                if let Err(e) = sent {
                                    tracing::warn!("Failed to deliver reply: {e}");
                                    outcome = Err(e);
                                    break;
                                }
                            }
                            Err(e) if e.is_cancelled() => {}
                            Err(e) => tracing::error!("Request task failed: {e}"),
                        }
                    }
                }
            }

            if let Err(e) = transport.close().await {
                tracing::debug!("Transport close failed: {e}");
            }
            outcome
        }))
    }

    pub async fn handle_message(&self, msg: JsonRpcMessage) -> Option<JsonRpcMessage> {
        match msg {
            JsonRpcMessage::Request(req) => Some(self.handle_request(req).await),
            JsonRpcMessage::Notification(notif) => {
                self.handle_notification(notif).await;
                None
            }
            _ => {
                tracing::warn!("Received unexpected message type from client");
                None
            }
        }
    }

    async fn handle_request(&self, request: JsonRpcRequest) -> JsonRpcMessage {
        if let Err(e) = validate_request(&request) {
            return e.to_json_rpc_error(request.id).into();
        }

        let id = request.id.clone();
        match self.dispatch_request(&request).await {
            Ok(value) => JsonRpcResponse::new(id, value).into(),
            Err(e) => {
                tracing::debug!(method = %request.method, id = %id, "Request failed: {e}");
                e.to_json_rpc_error(id).into()
            }
        }
    }

    async fn dispatch_request(&self, request: &JsonRpcRequest) -> McpResult<Value> {
        match request.method.as_str() {
            "initialize" => self.handle_initialize(request.params.clone()).await,
            "tools/list" => self.handle_tools_list().await,
            "tools/call" => self.handle_tools_call(request.params.clone()).await,
            "ping" => Ok(Value::Object(serde_json::Map::new())),
            _ => Err(McpError::MethodNotFound(request.method.clone())),
        }
    }

    async fn handle_notification(&self, notification: JsonRpcNotification) {
        match notification.method.as_str() {
            "notifications/initialized" | "initialized" => {
                self.capabilities.lock().await.mark_initialized();
            }
            "notifications/cancelled" => {
                let cancelled = notification
                    .params
                    .and_then(|p| serde_json::from_value::<CancelledParams>(p).ok());
                match cancelled {
                    Some(c) => tracing::info!(request_id = %c.request_id, "Client cancelled request"),
                    None => tracing::info!("Received cancellation notification"),
                }
            }
            _ => {
                tracing::debug!("Unknown notification: {}", notification.method);
            }
        }
    }

    async fn handle_initialize(&self, params: Option<Value>) -> McpResult<Value> {
        let init_params: InitializeParams = params
            .map(serde_json::from_value)
            .transpose()
            .map_err(|e| McpError::InvalidParams(e.to_string()))?
            .ok_or_else(|| McpError::InvalidParams("Initialize params required".to_string()))?;

        let mut caps = self.capabilities.lock().await;
        let result = caps.negotiate(init_params)?;

        serde_json::to_value(result).map_err(|e| McpError::InternalError(e.to_string()))
    }

    async fn handle_tools_list(&self) -> McpResult<Value> {
        let result = ToolListResult {
            tools: ToolRegistry::list_tools(),
            next_cursor: None,
        };
        serde_json::to_value(result).map_err(|e| McpError::InternalError(e.to_string()))
    }

    async fn handle_tools_call(&self, params: Option<Value>) -> McpResult<Value> {
        let call_params: ToolCallParams = params
            .map(serde_json::from_value)
            .transpose()
            .map_err(|e| McpError::InvalidParams(e.to_string()))?
            .ok_or_else(|| McpError::InvalidParams("Tool call params required".to_string()))?;

        let result =
            ToolRegistry::call(&call_params.name, call_params.arguments, &self.client).await?;

        serde_json::to_value(result).map_err(|e| McpError::InternalError(e.to_string()))
    }
}

/// Key of the request a `notifications/cancelled` message names, if any.
fn cancelled_request(message: &JsonRpcMessage) -> Option<String> {
    let JsonRpcMessage::Notification(notification) = message else {
        return None;
    };
    if notification.method != "notifications/cancelled" {
        return None;
    }

    let params: CancelledParams = serde_json::from_value(notification.params.clone()?).ok()?;
    let id: RequestId = serde_json::from_value(params.request_id).ok()?;
    Some(id.to_string())
}
