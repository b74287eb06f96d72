//! Tool: get_horoscope_predictions — life predictions for one birth chart.

use serde_json::Value;
use vedastro::{BirthChart, VedAstroClient};

use crate::types::{McpResult, ToolCallResult, ToolDefinition};

use super::{chart_schema, parse_args};

pub fn definition() -> ToolDefinition {
    ToolDefinition {
        name: "get_horoscope_predictions".to_string(),
        description: Some(
            "Get Vedic astrology horoscope predictions for a person based on their \
             birth time and location. Returns life predictions about personality, \
             career, relationships, health, wealth, marriage, children, longevity, \
             and more based on planetary positions, yogas, and house placements. \
             Uses the Raman Ayanamsa system."
                .to_string(),
        ),
        input_schema: chart_schema(),
    }
}

pub async fn execute(args: Value, client: &VedAstroClient) -> McpResult<ToolCallResult> {
    let chart: BirthChart = parse_args(args)?;
    let path = format!("HoroscopePredictions/{}", chart.path());
    let payload = client.calculate(None, &path).await?;
    Ok(ToolCallResult::json(&payload))
}
