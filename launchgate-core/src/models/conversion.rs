//! Attribution conversion types.
//!
//! The attribution SDK delivers loosely structured key/value payloads; the
//! engine keeps them raw and reads the well-known keys through typed
//! accessors so unknown fields pass through to decision requests untouched.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Install classification derived from the conversion payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    /// The install was not driven by a tracked campaign.
    Organic,
    /// The install is attributed to a campaign.
    NonOrganic,
    /// The payload carried no recognizable status.
    Unknown,
}

impl Classification {
    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Organic => "organic",
            Self::NonOrganic => "non-organic",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

// ============================================================================
// Conversion Result
// ============================================================================

/// Conversion payload delivered by the attribution SDK.
///
/// The last received value is cached on disk and used as non-authoritative
/// fallback context for decision requests on later launches.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConversionResult {
    /// Raw conversion payload as delivered by the SDK.
    #[serde(default)]
    pub payload: Map<String, Value>,
    /// Stable attribution identifier assigned by the SDK, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribution_id: Option<String>,
}

impl ConversionResult {
    /// Creates a conversion result from a raw payload.
    pub fn new(payload: Map<String, Value>) -> Self {
        Self {
            payload,
            attribution_id: None,
        }
    }

    /// Sets the SDK-assigned attribution identifier.
    pub fn with_attribution_id(mut self, id: impl Into<String>) -> Self {
        self.attribution_id = Some(id.into());
        self
    }

    /// Reads a payload value as a string slice.
    pub fn str_field(&self, key: &str) -> Option<&str> {
        self.payload.get(key).and_then(Value::as_str)
    }

    /// Classification derived from the `af_status` key (case-insensitive).
    pub fn classification(&self) -> Classification {
        match self.str_field("af_status") {
            Some(status) if status.eq_ignore_ascii_case("organic") => Classification::Organic,
            Some(status)
                if status.eq_ignore_ascii_case("non-organic")
                    || status.eq_ignore_ascii_case("non_organic") =>
            {
                Classification::NonOrganic
            }
            Some(_) => Classification::Unknown,
            None => Classification::Unknown,
        }
    }

    /// Returns true if the payload classifies this install as organic.
    pub fn is_organic(&self) -> bool {
        self.classification() == Classification::Organic
    }

    /// The attributed media source, when present.
    pub fn media_source(&self) -> Option<&str> {
        self.str_field("media_source")
    }

    /// The attributed campaign, when present.
    pub fn campaign(&self) -> Option<&str> {
        self.str_field("campaign")
    }
}

// ============================================================================
// Deep Link Context
// ============================================================================

/// Deferred or direct deep-link payload delivered by the attribution SDK.
///
/// Held only in memory. When merged into a decision request its keys never
/// override values already present from the conversion payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeepLinkContext {
    /// Raw deep-link values as delivered by the SDK.
    #[serde(default)]
    pub values: Map<String, Value>,
}

impl DeepLinkContext {
    /// Creates a deep-link context from raw values.
    pub fn new(values: Map<String, Value>) -> Self {
        Self { values }
    }

    /// The resolved deep-link target, when present.
    pub fn deep_link_value(&self) -> Option<&str> {
        self.values.get("deep_link_value").and_then(Value::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn result_with_status(status: &str) -> ConversionResult {
        let mut payload = Map::new();
        payload.insert("af_status".to_string(), json!(status));
        ConversionResult::new(payload)
    }

    #[test]
    fn test_classification_is_case_insensitive() {
        assert_eq!(
            result_with_status("Organic").classification(),
            Classification::Organic
        );
        assert_eq!(
            result_with_status("organic").classification(),
            Classification::Organic
        );
        assert_eq!(
            result_with_status("Non-organic").classification(),
            Classification::NonOrganic
        );
        assert_eq!(
            result_with_status("non_organic").classification(),
            Classification::NonOrganic
        );
    }

    #[test]
    fn test_unrecognized_status_is_unknown() {
        assert_eq!(
            result_with_status("paid").classification(),
            Classification::Unknown
        );
        assert_eq!(
            ConversionResult::default().classification(),
            Classification::Unknown
        );
    }

    #[test]
    fn test_typed_accessors_read_payload_keys() {
        let mut payload = Map::new();
        payload.insert("af_status".to_string(), json!("Non-organic"));
        payload.insert("media_source".to_string(), json!("adnet"));
        payload.insert("campaign".to_string(), json!("spring_launch"));
        let result = ConversionResult::new(payload).with_attribution_id("1699-0001");

        assert!(!result.is_organic());
        assert_eq!(result.media_source(), Some("adnet"));
        assert_eq!(result.campaign(), Some("spring_launch"));
        assert_eq!(result.attribution_id.as_deref(), Some("1699-0001"));
    }

    #[test]
    fn test_non_string_status_is_unknown() {
        let mut payload = Map::new();
        payload.insert("af_status".to_string(), json!(42));
        assert_eq!(
            ConversionResult::new(payload).classification(),
            Classification::Unknown
        );
    }
}
