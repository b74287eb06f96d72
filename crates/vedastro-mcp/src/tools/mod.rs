//! MCP tool implementations.

pub mod ashtakvarga_data;
pub mod astrology_raw_data;
pub mod general_astro_data;
pub mod horoscope_predictions;
pub mod match_report;
pub mod numerology_prediction;
pub mod registry;

pub use registry::ToolRegistry;

use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use crate::types::{McpError, McpResult};

/// Deserialize tool arguments into their typed form.
pub(crate) fn parse_args<T: DeserializeOwned>(args: Value) -> McpResult<T> {
    serde_json::from_value(args).map_err(|e| McpError::InvalidParams(e.to_string()))
}

/// JSON schema properties for one birth chart. `prefix` is prepended to every
/// field name and `who` to every description (both may be empty).
pub(crate) fn chart_properties(prefix: &str, who: &str) -> serde_json::Map<String, Value> {
    let fields = [
        ("latitude", "birth location latitude (e.g., '19.0760' for Mumbai)"),
        ("longitude", "birth location longitude (e.g., '72.8777' for Mumbai)"),
        ("birth_time", "birth time in HH:MM 24-hour format (e.g., '14:30')"),
        ("birth_date", "birth date in DD/MM/YYYY format (e.g., '25/10/1992')"),
        ("timezone", "timezone offset in +HH:MM or -HH:MM format (e.g., '+05:30' for India)"),
    ];

    fields
        .iter()
        .map(|(name, desc)| {
            let description = if who.is_empty() {
                capitalize(desc)
            } else {
                format!("{who} {desc}")
            };
            (
                format!("{prefix}{name}"),
                json!({ "type": "string", "description": description }),
            )
        })
        .collect()
}

/// Input schema for tools that take a single birth chart.
pub(crate) fn chart_schema() -> Value {
    let properties = chart_properties("", "");
    let required: Vec<String> = properties.keys().cloned().collect();
    json!({
        "type": "object",
        "properties": properties,
        "required": required
    })
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
