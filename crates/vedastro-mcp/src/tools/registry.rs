//! Tool registration and dispatch.

use serde_json::Value;
use vedastro::VedAstroClient;

use crate::types::{McpError, McpResult, ToolCallResult, ToolDefinition};

use super::{
    ashtakvarga_data, astrology_raw_data, general_astro_data, horoscope_predictions,
    match_report, numerology_prediction,
};

pub struct ToolRegistry;

impl ToolRegistry {
    pub fn list_tools() -> Vec<ToolDefinition> {
        vec![
            horoscope_predictions::definition(),
            match_report::definition(),
            numerology_prediction::definition(),
            astrology_raw_data::definition(),
            general_astro_data::definition(),
            ashtakvarga_data::definition(),
        ]
    }

    pub async fn call(
        name: &str,
        arguments: Option<Value>,
        client: &VedAstroClient,
    ) -> McpResult<ToolCallResult> {
        let args = arguments.unwrap_or(Value::Object(serde_json::Map::new()));

        match name {
            "get_horoscope_predictions" => horoscope_predictions::execute(args, client).await,
            "get_match_report" => match_report::execute(args, client).await,
            "get_numerology_prediction" => numerology_prediction::execute(args, client).await,
            "get_astrology_raw_data" => astrology_raw_data::execute(args, client).await,
            "get_general_astro_data" => general_astro_data::execute(args, client).await,
            "get_ashtakvarga_data" => ashtakvarga_data::execute(args, client).await,
            _ => Err(McpError::ToolNotFound(name.to_string())),
        }
    }
}
