//! Transport layer for MCP communication.
//!
//! A transport is anything the [`ProtocolHandler`](crate::protocol::ProtocolHandler)
//! can be connected to: it owns an inbound message channel the engine
//! subscribes to, and a `send` path for replies.

pub mod credentials;
pub mod envelope;
pub mod framing;
pub mod registry;
pub mod server;
pub mod session;
pub mod streamable;

pub use registry::{Session, SessionRegistry};
pub use server::{create_router, mounted_router, AppState, HttpServer};
pub use session::SseSessionTransport;
pub use streamable::ExchangeTransport;

use async_trait::async_trait;
use tokio::sync::{mpsc, Mutex};

use crate::types::{JsonRpcMessage, McpError, McpResult};

/// Receiving end of a transport's inbound channel.
pub type InboundReceiver = mpsc::UnboundedReceiver<JsonRpcMessage>;

/// Contract between the protocol engine and a wire binding.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Emit whatever the wire needs before the first reply.
    async fn start(&self) -> McpResult<()>;

    /// Push one outbound message.
    async fn send(&self, message: JsonRpcMessage) -> McpResult<()>;

    /// Release the outbound side. Safe to call more than once.
    async fn close(&self) -> McpResult<()>;

    /// Hand the inbound receiver to the engine. Yields `None` once taken.
    async fn subscribe(&self) -> Option<InboundReceiver>;
}

/// Writing end of an inbound channel, held by whoever accepts client messages.
#[derive(Debug, Clone)]
pub struct InboundSink {
    tx: mpsc::UnboundedSender<JsonRpcMessage>,
}

impl InboundSink {
    /// Queue a message for the engine. Fails once the engine has stopped.
    pub fn deliver(&self, message: JsonRpcMessage) -> McpResult<()> {
        self.tx
            .send(message)
            .map_err(|_| McpError::Transport("Engine is no longer receiving".to_string()))
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Create a connected sink/receiver pair.
pub fn inbound_channel() -> (InboundSink, InboundReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (InboundSink { tx }, rx)
}

/// Holds an inbound receiver until the engine subscribes.
#[derive(Debug)]
pub struct InboundSlot {
    rx: Mutex<Option<InboundReceiver>>,
}

impl InboundSlot {
    pub fn new(rx: InboundReceiver) -> Self {
        Self {
            rx: Mutex::new(Some(rx)),
        }
    }

    pub async fn take(&self) -> Option<InboundReceiver> {
        self.rx.lock().await.take()
    }
}
