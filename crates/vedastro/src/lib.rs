//! VedAstro — client for the VedAstro calculation API: birth-chart paths, envelope decoding, and fan-out joins.

pub mod client;
pub mod fanout;
pub mod types;

pub use client::{VedAstroClient, API_KEY_HEADER, DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS};
pub use fanout::{join_calls, JoinPolicy};
pub use types::*;
