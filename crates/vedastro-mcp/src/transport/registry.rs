//! Process-wide table of live session-stream connections.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;

use super::session::SseSessionTransport;
use super::InboundSink;
use crate::protocol::ProtocolHandler;
use crate::types::{JsonRpcMessage, McpResult};

/// One established session: its stream transport, its engine, and the sink
/// feeding that engine.
pub struct Session {
    token: String,
    transport: Arc<SseSessionTransport>,
    engine: Arc<ProtocolHandler>,
    inbound: InboundSink,
    connected_at: DateTime<Utc>,
}

impl Session {
    pub fn new(
        token: String,
        transport: Arc<SseSessionTransport>,
        engine: Arc<ProtocolHandler>,
        inbound: InboundSink,
    ) -> Self {
        Self {
            token,
            transport,
            engine,
            inbound,
            connected_at: Utc::now(),
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn transport(&self) -> &Arc<SseSessionTransport> {
        &self.transport
    }

    pub fn engine(&self) -> &Arc<ProtocolHandler> {
        &self.engine
    }

    pub fn connected_at(&self) -> DateTime<Utc> {
        self.connected_at
    }

    /// Hand a client message to this session's engine.
    pub fn deliver(&self, message: JsonRpcMessage) -> McpResult<()> {
        self.inbound.deliver(message)
    }

    /// Whether the engine has stopped receiving.
    pub fn is_stale(&self) -> bool {
        self.inbound.is_closed()
    }
}

/// Token → session map. Cloning yields another handle to the same table.
#[derive(Clone, Default)]
pub struct SessionRegistry {
    sessions: Arc<DashMap<String, Arc<Session>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a session, returning whatever was under the same token.
    pub fn put(&self, session: Session) -> Option<Arc<Session>> {
        let token = session.token().to_string();
        let displaced = self.sessions.insert(token.clone(), Arc::new(session));
        if displaced.is_some() {
            tracing::warn!(session_id = %token, "Replaced an existing session");
        }
        displaced
    }

    pub fn get(&self, token: &str) -> Option<Arc<Session>> {
        self.sessions.get(token).map(|entry| entry.value().clone())
    }

    /// Remove a session, returning it if it was present.
    pub fn delete(&self, token: &str) -> Option<Arc<Session>> {
        self.sessions.remove(token).map(|(_, session)| session)
    }

    /// Current sessions, detached from the map so callers may await on them.
    pub fn snapshot(&self) -> Vec<Arc<Session>> {
        self.sessions
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
