//! Core data types for VedAstro calculation requests and responses.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Ayanamsa applied to every chart calculation.
pub const AYANAMSA: &str = "RAMAN";

/// Status string the API uses for a successful calculation.
pub const STATUS_PASS: &str = "Pass";

/// Response envelope returned by every `Calculate/*` endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(rename = "Status")]
    pub status: String,
    #[serde(rename = "Payload", default)]
    pub payload: Value,
}

impl Envelope {
    pub fn is_pass(&self) -> bool {
        self.status == STATUS_PASS
    }

    /// Render the payload the way it appears in error messages: strings
    /// verbatim, anything else as compact JSON.
    pub fn payload_text(&self) -> String {
        match &self.payload {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

/// Birth moment and place, as accepted by the chart endpoints.
///
/// All fields are kept as the caller supplied them; the API does its own
/// parsing. Dates are `DD/MM/YYYY`, times `HH:MM`, offsets `+HH:MM`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BirthChart {
    pub latitude: String,
    pub longitude: String,
    pub birth_time: String,
    pub birth_date: String,
    pub timezone: String,
}

impl BirthChart {
    /// `Location/{lat},{lon}/Time/{time}/{date}/{tz}` without the ayanamsa suffix.
    ///
    /// The date keeps its slashes: the API reads day, month and year as
    /// separate path segments.
    pub fn location_time(&self) -> String {
        format!(
            "Location/{},{}/Time/{}/{}/{}",
            self.latitude, self.longitude, self.birth_time, self.birth_date, self.timezone
        )
    }

    /// Full time/location path including the ayanamsa segment.
    pub fn path(&self) -> String {
        format!("{}/Ayanamsa/{AYANAMSA}", self.location_time())
    }
}

/// Errors raised while talking to the VedAstro API.
#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    /// Non-2xx HTTP status.
    #[error("VedAstro API error{}: {status}", label_suffix(.label))]
    Http { label: Option<String>, status: u16 },

    /// The envelope came back with a status other than `Pass`.
    #[error("VedAstro API error{}: {payload}", label_suffix(.label))]
    Rejected {
        label: Option<String>,
        payload: String,
    },

    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Invalid response body: {0}")]
    Decode(String),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("Missing field in payload: {0}")]
    MissingField(String),
}

fn label_suffix(label: &Option<String>) -> String {
    match label {
        Some(l) => format!(" ({l})"),
        None => String::new(),
    }
}

/// Convenience result type.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn mumbai() -> BirthChart {
        BirthChart {
            latitude: "19.0760".to_string(),
            longitude: "72.8777".to_string(),
            birth_time: "14:30".to_string(),
            birth_date: "25/10/1992".to_string(),
            timezone: "+05:30".to_string(),
        }
    }

    #[test]
    fn test_chart_path() {
        assert_eq!(
            mumbai().path(),
            "Location/19.0760,72.8777/Time/14:30/25/10/1992/+05:30/Ayanamsa/RAMAN"
        );
    }

    #[test]
    fn test_envelope_pass() {
        let env: Envelope =
            serde_json::from_value(json!({"Status": "Pass", "Payload": {"a": 1}})).unwrap();
        assert!(env.is_pass());
        assert_eq!(env.payload["a"], 1);
    }

    #[test]
    fn test_envelope_missing_payload() {
        let env: Envelope = serde_json::from_value(json!({"Status": "Fail"})).unwrap();
        assert!(!env.is_pass());
        assert_eq!(env.payload, Value::Null);
    }

    #[test]
    fn test_payload_text_string_is_verbatim() {
        let env = Envelope {
            status: "Fail".to_string(),
            payload: json!("quota exceeded"),
        };
        assert_eq!(env.payload_text(), "quota exceeded");
    }

    #[test]
    fn test_error_messages() {
        let plain = ApiError::Http {
            label: None,
            status: 503,
        };
        assert_eq!(plain.to_string(), "VedAstro API error: 503");

        let labeled = ApiError::Rejected {
            label: Some("planet".to_string()),
            payload: "bad time".to_string(),
        };
        assert_eq!(labeled.to_string(), "VedAstro API error (planet): bad time");
    }
}
