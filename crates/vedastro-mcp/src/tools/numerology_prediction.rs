//! Tool: get_numerology_prediction — Chaldean name-number reading.

use serde::Deserialize;
use serde_json::{json, Value};
use vedastro::VedAstroClient;

use crate::types::{McpResult, ToolCallResult, ToolDefinition};

use super::parse_args;

#[derive(Debug, Deserialize)]
struct NumerologyParams {
    name: String,
}

pub fn definition() -> ToolDefinition {
    ToolDefinition {
        name: "get_numerology_prediction".to_string(),
        description: Some(
            "Get a numerology prediction based on a name using the Chaldean system. \
             Returns the name number, ruling planet, detailed prediction, and life aspect \
             scores (Finance, Romance, Education, Health, Family, Growth, Career, \
             Reputation, Spirituality, Luck). Works for person names, business names, \
             project names, house numbers, or car numbers."
                .to_string(),
        ),
        input_schema: json!({
            "type": "object",
            "properties": {
                "name": {
                    "type": "string",
                    "description": "Name to analyze (person, business, project, house number, etc.)"
                }
            },
            "required": ["name"]
        }),
    }
}

pub async fn execute(args: Value, client: &VedAstroClient) -> McpResult<ToolCallResult> {
    let params: NumerologyParams = parse_args(args)?;
    let payload = client.name_number_prediction(&params.name).await?;
    Ok(ToolCallResult::json(&payload))
}
