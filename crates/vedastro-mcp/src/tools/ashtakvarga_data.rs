//! Tool: get_ashtakvarga_data — Sarva and Bhinna ashtakavarga charts.

use serde_json::{json, Value};
use vedastro::{join_calls, BirthChart, JoinPolicy, VedAstroClient};

use crate::types::{McpResult, ToolCallResult, ToolDefinition};

use super::{chart_schema, parse_args};

/// Both charts or nothing.
pub const JOIN_POLICY: JoinPolicy = JoinPolicy::All;

pub fn definition() -> ToolDefinition {
    ToolDefinition {
        name: "get_ashtakvarga_data".to_string(),
        description: Some(
            "Get Ashtakvarga charts for a birth chart. Returns both \
             Sarvashtakavarga (combined strength of all planets across 12 signs) \
             and Bhinnashtakavarga (individual planet contributions). \
             Each chart contains rows per planet with 12 sign values and totals. \
             Used for assessing planetary strength in transit analysis. \
             Uses the Raman Ayanamsa system."
                .to_string(),
        ),
        input_schema: chart_schema(),
    }
}

pub async fn execute(args: Value, client: &VedAstroClient) -> McpResult<ToolCallResult> {
    let chart: BirthChart = parse_args(args)?;
    let tail = chart.path();

    let sarva_path = format!("SarvashtakavargaChart/{tail}");
    let bhinna_path = format!("BhinnashtakavargaChart/{tail}");
    let calls = [
        client.calculate(Some("sarva"), &sarva_path),
        client.calculate(Some("bhinna"), &bhinna_path),
    ];

    let mut charts = join_calls(JOIN_POLICY, calls).await?.into_iter();
    let combined = json!({
        "SarvashtakavargaChart": charts.next().unwrap_or(Value::Null),
        "BhinnashtakavargaChart": charts.next().unwrap_or(Value::Null),
    });

    Ok(ToolCallResult::json(&combined))
}
