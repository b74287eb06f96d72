//! Tool: get_general_astro_data — 24 single-value chart properties.
//!
//! Each property is its own endpoint. Calls are joined with
//! [`JoinPolicy::AllSettled`]: properties whose call fails are left out of the
//! result instead of failing the tool.

use serde_json::{Map, Value};
use vedastro::{join_calls, ApiError, BirthChart, JoinPolicy, VedAstroClient};

use crate::types::{McpResult, ToolCallResult, ToolDefinition};

use super::{chart_schema, parse_args};

pub const JOIN_POLICY: JoinPolicy = JoinPolicy::AllSettled;

/// Endpoint names; each payload carries its value under the same key.
pub const PROPERTIES: [&str; 24] = [
    "LocalMeanTime",
    "AyanamsaDegree",
    "YoniKutaAnimal",
    "MarakaPlanetList",
    "LagnaSignName",
    "MoonSignName",
    "MoonConstellation",
    "SunriseTime",
    "SunsetTime",
    "NithyaYoga",
    "Karana",
    "DayDurationHours",
    "IsDayBirth",
    "LunarDay",
    "BirthVarna",
    "HoraAtBirth",
    "DayOfWeek",
    "LordOfWeekday",
    "ShubKartariPlanets",
    "PaapaKartariPlanets",
    "ShubKartariHouses",
    "PaapaKartariHouses",
    "KujaDosaScore",
    "PanchaPakshiBirthBird",
];

pub fn definition() -> ToolDefinition {
    ToolDefinition {
        name: "get_general_astro_data".to_string(),
        description: Some(
            "Get general Vedic astrology data for a birth chart including: \
             Ascendant/Lagna, Moon Sign, Moon Constellation/Nakshatra, \
             Sunrise/Sunset times, Nithya Yoga, Karana, Tithi (Lunar Day), \
             Day/Night birth, Varna, Hora, Weekday & Lord, Ayanamsa degree, \
             Kuja Dosa Score, Maraka Planets, Kartari Yoga planets/houses, \
             Pancha Pakshi Birth Bird, and more. \
             Returns raw values for 24 astrological properties. \
             Uses the Raman Ayanamsa system."
                .to_string(),
        ),
        input_schema: chart_schema(),
    }
}

async fn fetch_property(
    client: &VedAstroClient,
    name: &'static str,
    tail: &str,
) -> Result<(&'static str, Value), ApiError> {
    let payload = client.calculate(Some(name), &format!("{name}/{tail}")).await?;
    let value = payload
        .get(name)
        .cloned()
        .ok_or_else(|| ApiError::MissingField(name.to_string()))?;
    Ok((name, value))
}

pub async fn execute(args: Value, client: &VedAstroClient) -> McpResult<ToolCallResult> {
    let chart: BirthChart = parse_args(args)?;
    let tail = chart.path();

    let calls = PROPERTIES
        .iter()
        .map(|&name| fetch_property(client, name, &tail));
    let settled = join_calls(JOIN_POLICY, calls).await?;

    let combined: Map<String, Value> = settled
        .into_iter()
        .map(|(name, value)| (name.to_string(), value))
        .collect();

    Ok(ToolCallResult::json(&combined))
}
