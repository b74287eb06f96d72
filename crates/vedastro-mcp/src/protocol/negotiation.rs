//! MCP capability negotiation during initialization.

use crate::types::{
    ClientCapabilities, InitializeParams, InitializeResult, McpResult, MCP_VERSION,
    SUPPORTED_VERSIONS,
};

/// Client capabilities stored after negotiation. One per engine instance.
#[derive(Debug, Clone, Default)]
pub struct NegotiatedCapabilities {
    pub client: ClientCapabilities,
    pub protocol_version: Option<String>,
    pub initialized: bool,
}

impl NegotiatedCapabilities {
    pub fn negotiate(&mut self, params: InitializeParams) -> McpResult<InitializeResult> {
        let version = if SUPPORTED_VERSIONS.contains(&params.protocol_version.as_str()) {
            params.protocol_version.clone()
        } else {
            tracing::warn!(
                "Client requested protocol version {}, answering with {}",
                params.protocol_version,
                MCP_VERSION
            );
            MCP_VERSION.to_string()
        };

        self.client = params.capabilities;
        self.protocol_version = Some(version.clone());

        tracing::info!(
            "Initialized with client: {} v{} (protocol {version})",
            params.client_info.name,
            params.client_info.version
        );

        Ok(InitializeResult::for_version(&version))
    }

    pub fn mark_initialized(&mut self) {
        self.initialized = true;
        tracing::debug!("MCP handshake complete");
    }
}
