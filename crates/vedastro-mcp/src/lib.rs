//! VedAstro MCP Server — Vedic astrology calculations for LLM clients over
//! streamable HTTP and the legacy SSE session transport.

pub mod config;
pub mod protocol;
pub mod tools;
pub mod transport;
pub mod types;

pub use config::ServerConfig;
pub use protocol::ProtocolHandler;
pub use transport::{create_router, mounted_router, AppState, HttpServer, SessionRegistry};
