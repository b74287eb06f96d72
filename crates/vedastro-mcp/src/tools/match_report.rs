//! Tool: get_match_report — Kuta compatibility between two charts.

use serde::Deserialize;
use serde_json::{json, Value};
use vedastro::{BirthChart, VedAstroClient, AYANAMSA};

use crate::types::{McpResult, ToolCallResult, ToolDefinition};

use super::{chart_properties, parse_args};

#[derive(Debug, Deserialize)]
struct MatchParams {
    male_latitude: String,
    male_longitude: String,
    male_birth_time: String,
    male_birth_date: String,
    male_timezone: String,
    female_latitude: String,
    female_longitude: String,
    female_birth_time: String,
    female_birth_date: String,
    female_timezone: String,
}

impl MatchParams {
    fn charts(self) -> (BirthChart, BirthChart) {
        (
            BirthChart {
                latitude: self.male_latitude,
                longitude: self.male_longitude,
                birth_time: self.male_birth_time,
                birth_date: self.male_birth_date,
                timezone: self.male_timezone,
            },
            BirthChart {
                latitude: self.female_latitude,
                longitude: self.female_longitude,
                birth_time: self.female_birth_time,
                birth_date: self.female_birth_date,
                timezone: self.female_timezone,
            },
        )
    }
}

pub fn definition() -> ToolDefinition {
    let mut properties = chart_properties("male_", "Male");
    properties.extend(chart_properties("female_", "Female"));
    let required: Vec<String> = properties.keys().cloned().collect();

    ToolDefinition {
        name: "get_match_report".to_string(),
        description: Some(
            "Get a Vedic astrology compatibility/match report between two people. \
             Returns Kuta score percentage and detailed predictions for \
             all 16 Kuta factors (Dina, Gana, Mahendra, Stree Deergha, etc.). \
             Each factor is rated as Good or Bad with detailed explanation. \
             Uses the Raman Ayanamsa system."
                .to_string(),
        ),
        input_schema: json!({
            "type": "object",
            "properties": properties,
            "required": required
        }),
    }
}

pub async fn execute(args: Value, client: &VedAstroClient) -> McpResult<ToolCallResult> {
    let params: MatchParams = parse_args(args)?;
    let (male, female) = params.charts();
    let path = format!(
        "MatchReport/{}/{}/Ayanamsa/{AYANAMSA}",
        male.location_time(),
        female.location_time()
    );
    let payload = client.calculate(None, &path).await?;
    Ok(ToolCallResult::json(&payload))
}
