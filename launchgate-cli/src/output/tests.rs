//! CLI output formatting tests.
//!
//! These tests verify that CLI output is correctly formatted for both
//! text and JSON output modes.

#[cfg(test)]
mod text_formatter_tests {
    use super::super::json::{
        ConfigOutput, ConversionOutput, DecisionOutput, PushOutput, ResetOutput, SimulationOutput,
        StatusOutput,
    };
    use super::super::text::TextFormatter;
    use chrono::Utc;

    fn sample_status() -> StatusOutput {
        StatusOutput {
            mode: "web".to_string(),
            store_dir: "/tmp/records".to_string(),
            config: Some(ConfigOutput {
                url: "https://web.example.com/app".to_string(),
                expires: 1_900_000_000,
                expired: false,
                saved_at: Utc::now(),
            }),
            conversion: Some(ConversionOutput {
                classification: "non-organic".to_string(),
                media_source: Some("newsfeed_ads".to_string()),
                campaign: Some("summer_launch".to_string()),
                attribution_id: None,
            }),
            push: PushOutput {
                permission_requested: true,
                last_skipped_at: None,
                has_token: true,
            },
            onboarding_completed: false,
        }
    }

    #[test]
    fn test_status_lists_every_record() {
        let formatter = TextFormatter::new(false);
        let output = formatter.format_status(&sample_status());

        assert!(output.contains("Mode:        web"));
        assert!(output.contains("https://web.example.com/app"));
        assert!(output.contains("valid"));
        assert!(output.contains("non-organic"));
        assert!(output.contains("newsfeed_ads"));
        assert!(output.contains("Requested: yes"));
        assert!(output.contains("Skipped:   never"));
        assert!(output.contains("Token:     cached"));
        assert!(output.contains("not completed"));
    }

    #[test]
    fn test_status_omits_missing_sections() {
        let formatter = TextFormatter::new(false);
        let mut status = sample_status();
        status.config = None;
        status.conversion = None;

        let output = formatter.format_status(&status);
        assert!(!output.contains("Remote config"));
        assert!(!output.contains("Conversion"));
        assert!(output.contains("Push"));
    }

    #[test]
    fn test_status_marks_expired_config() {
        let formatter = TextFormatter::new(false);
        let mut status = sample_status();
        status.config.as_mut().unwrap().expired = true;

        let output = formatter.format_status(&status);
        assert!(output.contains("(expired)"));
    }

    #[test]
    fn test_status_colors_web_mode() {
        let formatter = TextFormatter::new(true);
        let output = formatter.format_status(&sample_status());
        assert!(output.contains("\x1b[36m"));
    }

    #[test]
    fn test_simulation_numbers_transitions() {
        let formatter = TextFormatter::new(false);
        let sim = SimulationOutput {
            scenario: "first-launch".to_string(),
            transitions: vec![
                "loading (initializing)".to_string(),
                "loading (checking connectivity)".to_string(),
                "web (https://web.example.com/app)".to_string(),
            ],
            final_state: "web (https://web.example.com/app)".to_string(),
            url: Some("https://web.example.com/app".to_string()),
            mode: "web".to_string(),
            decision_requests: 1,
        };

        let output = formatter.format_simulation(&sim);
        assert!(output.contains("Scenario: first-launch"));
        assert!(output.contains("  1. loading (initializing)"));
        assert!(output.contains("  3. web (https://web.example.com/app)"));
        assert!(output.contains("Decision requests: 1"));
    }

    #[test]
    fn test_decision_accepted() {
        let formatter = TextFormatter::new(false);
        let output = formatter.format_decision(&DecisionOutput {
            accepted: true,
            url: Some("https://web.example.com/app".to_string()),
            expires: Some(1_900_000_000),
            error: None,
        });

        assert!(output.contains("accepted"));
        assert!(output.contains("https://web.example.com/app"));
        assert!(output.contains("1900000000"));
    }

    #[test]
    fn test_decision_rejected_shows_reason() {
        let formatter = TextFormatter::new(false);
        let output = formatter.format_decision(&DecisionOutput {
            accepted: false,
            url: None,
            expires: None,
            error: Some("unsupported region".to_string()),
        });

        assert!(output.contains("rejected"));
        assert!(output.contains("unsupported region"));
    }

    #[test]
    fn test_reset_dry_run_lists_records() {
        let formatter = TextFormatter::new(false);
        let output = formatter.format_reset(&ResetOutput {
            store_dir: "/tmp/records".to_string(),
            records: vec!["mode.json".to_string(), "push_gate.json".to_string()],
            removed: false,
        });

        assert!(output.contains("  - mode.json"));
        assert!(output.contains("--yes"));
    }

    #[test]
    fn test_reset_reports_removal() {
        let formatter = TextFormatter::new(false);
        let output = formatter.format_reset(&ResetOutput {
            store_dir: "/tmp/records".to_string(),
            records: vec!["mode.json".to_string()],
            removed: true,
        });

        assert!(output.contains("Removed 1 record(s)"));
        assert!(!output.contains("--yes"));
    }

    #[test]
    fn test_reset_empty_store() {
        let formatter = TextFormatter::new(false);
        let output = formatter.format_reset(&ResetOutput {
            store_dir: "/tmp/records".to_string(),
            records: Vec::new(),
            removed: false,
        });

        assert!(output.contains("No records"));
    }
}

#[cfg(test)]
mod json_formatter_tests {
    use super::super::json::{DecisionOutput, JsonFormatter, SimulationOutput};

    #[test]
    fn test_simulation_output_shape() {
        let formatter = JsonFormatter::new(false);
        let sim = SimulationOutput {
            scenario: "organic".to_string(),
            transitions: vec!["native".to_string()],
            final_state: "native".to_string(),
            url: None,
            mode: "native".to_string(),
            decision_requests: 0,
        };

        let json: serde_json::Value =
            serde_json::from_str(&formatter.format(&sim).unwrap()).unwrap();
        assert_eq!(json["scenario"], "organic");
        assert_eq!(json["finalState"], "native");
        assert_eq!(json["decisionRequests"], 0);
        assert!(json.get("url").is_none());
    }

    #[test]
    fn test_decision_output_omits_absent_fields() {
        let formatter = JsonFormatter::new(false);
        let decision = DecisionOutput {
            accepted: false,
            url: None,
            expires: None,
            error: Some("status 503".to_string()),
        };

        let json: serde_json::Value =
            serde_json::from_str(&formatter.format(&decision).unwrap()).unwrap();
        assert_eq!(json["accepted"], false);
        assert_eq!(json["error"], "status 503");
        assert!(json.get("url").is_none());
        assert!(json.get("expires").is_none());
    }
}
