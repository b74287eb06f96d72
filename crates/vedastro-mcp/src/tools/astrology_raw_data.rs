//! Tool: get_astrology_raw_data — planet and house tables for one chart.
//!
//! Two calls joined with [`JoinPolicy::All`]: either both tables come back or
//! the tool fails.

use serde_json::{json, Value};
use vedastro::{join_calls, BirthChart, JoinPolicy, VedAstroClient};

use crate::types::{McpResult, ToolCallResult, ToolDefinition};

use super::{chart_schema, parse_args};

pub const JOIN_POLICY: JoinPolicy = JoinPolicy::All;

pub fn definition() -> ToolDefinition {
    ToolDefinition {
        name: "get_astrology_raw_data".to_string(),
        description: Some(
            "Get raw Vedic astrology data for all 9 planets and 12 houses. \
             Returns detailed planet data (sign placement, constellation, house occupied, \
             houses owned, lord of sign/constellation, degrees, retrograde status, etc.) \
             and house data (sign, constellation, planets in house, lord, aspecting planets, etc.). \
             Use this for detailed chart analysis when you need the underlying astronomical data. \
             Uses the Raman Ayanamsa system."
                .to_string(),
        ),
        input_schema: chart_schema(),
    }
}

pub async fn execute(args: Value, client: &VedAstroClient) -> McpResult<ToolCallResult> {
    let chart: BirthChart = parse_args(args)?;
    let tail = chart.path();

    let planet_path = format!("AllPlanetData/PlanetName/All/{tail}");
    let house_path = format!("AllHouseData/HouseName/All/{tail}");
    let calls = [
        client.calculate(Some("planet"), &planet_path),
        client.calculate(Some("house"), &house_path),
    ];

    let mut tables = join_calls(JOIN_POLICY, calls).await?.into_iter();
    let combined = json!({
        "PlanetData": tables.next().unwrap_or(Value::Null),
        "HouseData": tables.next().unwrap_or(Value::Null),
    });

    Ok(ToolCallResult::json(&combined))
}
