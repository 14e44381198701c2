//! JSON output formatting.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};

// ============================================================================
// Output Types
// ============================================================================

/// JSON output for the status command.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusOutput {
    pub mode: String,
    pub store_dir: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<ConfigOutput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversion: Option<ConversionOutput>,
    pub push: PushOutput,
    pub onboarding_completed: bool,
}

/// Cached remote configuration.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigOutput {
    pub url: String,
    pub expires: i64,
    pub expired: bool,
    #[serde(serialize_with = "serialize_datetime")]
    pub saved_at: DateTime<Utc>,
}

/// Cached conversion result.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionOutput {
    pub classification: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub campaign: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attribution_id: Option<String>,
}

/// Push permission records.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PushOutput {
    pub permission_requested: bool,
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_datetime_opt"
    )]
    pub last_skipped_at: Option<DateTime<Utc>>,
    pub has_token: bool,
}

/// JSON output for the simulate command.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationOutput {
    pub scenario: String,
    pub transitions: Vec<String>,
    pub final_state: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub mode: String,
    pub decision_requests: usize,
}

/// JSON output for the decide command.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionOutput {
    pub accepted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// JSON output for the reset command.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetOutput {
    pub store_dir: String,
    pub records: Vec<String>,
    pub removed: bool,
}

// ============================================================================
// Serialization helpers
// ============================================================================

fn serialize_datetime<S>(dt: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    s.serialize_str(&dt.to_rfc3339())
}

fn serialize_datetime_opt<S>(dt: &Option<DateTime<Utc>>, s: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match dt {
        Some(dt) => s.serialize_str(&dt.to_rfc3339()),
        None => s.serialize_none(),
    }
}

// ============================================================================
// JSON Formatter
// ============================================================================

/// JSON formatter.
pub struct JsonFormatter {
    pretty: bool,
}

impl JsonFormatter {
    /// Creates a new JSON formatter.
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }

    /// Formats any serializable value.
    pub fn format<T: Serialize>(&self, data: &T) -> Result<String> {
        let json = if self.pretty {
            serde_json::to_string_pretty(data)?
        } else {
            serde_json::to_string(data)?
        };
        Ok(json)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_pretty() {
        let formatter = JsonFormatter::new(true);
        let data = serde_json::json!({"key": "value"});
        let output = formatter.format(&data).unwrap();
        assert!(output.contains('\n'));
    }

    #[test]
    fn test_format_compact() {
        let formatter = JsonFormatter::new(false);
        let data = serde_json::json!({"key": "value"});
        let output = formatter.format(&data).unwrap();
        assert_eq!(output, r#"{"key":"value"}"#);
    }

    #[test]
    fn test_status_output_field_names() {
        let status = StatusOutput {
            mode: "web".to_string(),
            store_dir: "/tmp/records".to_string(),
            config: Some(ConfigOutput {
                url: "https://web.example.com/app".to_string(),
                expires: 1_900_000_000,
                expired: false,
                saved_at: Utc::now(),
            }),
            conversion: None,
            push: PushOutput {
                permission_requested: true,
                last_skipped_at: None,
                has_token: false,
            },
            onboarding_completed: false,
        };

        let json: serde_json::Value =
            serde_json::from_str(&JsonFormatter::new(false).format(&status).unwrap()).unwrap();
        assert_eq!(json["mode"], "web");
        assert_eq!(json["storeDir"], "/tmp/records");
        assert_eq!(json["config"]["expires"], 1_900_000_000);
        assert_eq!(json["push"]["permissionRequested"], true);
        // Absent options are omitted entirely
        assert!(json.get("conversion").is_none());
        assert!(json["push"].get("lastSkippedAt").is_none());
    }
}
