//! Text output formatting with colors.

use chrono::{DateTime, Utc};

use super::json::{DecisionOutput, ResetOutput, SimulationOutput, StatusOutput};

// ============================================================================
// ANSI Colors
// ============================================================================

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";
const CYAN: &str = "\x1b[36m";

const RULE_WIDTH: usize = 50;

/// Text formatter with optional colors.
pub struct TextFormatter {
    use_colors: bool,
}

impl TextFormatter {
    /// Creates a new text formatter.
    pub fn new(use_colors: bool) -> Self {
        Self { use_colors }
    }

    /// Formats the persisted launch records.
    pub fn format_status(&self, status: &StatusOutput) -> String {
        let mut lines = Vec::new();

        lines.push(self.bold("Launchgate Records"));
        lines.push("─".repeat(RULE_WIDTH));
        lines.push(format!("Mode:        {}", self.mode_label(&status.mode)));
        lines.push(format!("Store:       {}", status.store_dir));

        if let Some(config) = &status.config {
            let validity = if config.expired {
                self.red("expired")
            } else {
                self.green("valid")
            };
            lines.push(String::new());
            lines.push(self.bold("Remote config"));
            lines.push(format!("  URL:       {}", self.cyan(&config.url)));
            lines.push(format!("  Expires:   {} ({})", config.expires, validity));
            lines.push(format!("  Saved:     {}", format_timestamp(config.saved_at)));
        }

        if let Some(conversion) = &status.conversion {
            lines.push(String::new());
            lines.push(self.bold("Conversion"));
            lines.push(format!("  Status:    {}", conversion.classification));
            if let Some(source) = &conversion.media_source {
                lines.push(format!("  Source:    {source}"));
            }
            if let Some(campaign) = &conversion.campaign {
                lines.push(format!("  Campaign:  {campaign}"));
            }
        }

        lines.push(String::new());
        lines.push(self.bold("Push"));
        lines.push(format!(
            "  Requested: {}",
            yes_no(status.push.permission_requested)
        ));
        let skipped = match status.push.last_skipped_at {
            Some(at) => format_timestamp(at),
            None => "never".to_string(),
        };
        lines.push(format!("  Skipped:   {skipped}"));
        lines.push(format!(
            "  Token:     {}",
            if status.push.has_token {
                "cached"
            } else {
                "none"
            }
        ));

        lines.push(String::new());
        lines.push(format!(
            "Onboarding:  {}",
            if status.onboarding_completed {
                "completed"
            } else {
                "not completed"
            }
        ));

        lines.join("\n")
    }

    /// Formats a simulation run: the state timeline plus the outcome.
    pub fn format_simulation(&self, sim: &SimulationOutput) -> String {
        let mut lines = Vec::new();

        lines.push(format!("Scenario: {}", self.bold(&sim.scenario)));
        lines.push("─".repeat(RULE_WIDTH));

        for (i, transition) in sim.transitions.iter().enumerate() {
            lines.push(format!("  {}. {}", i + 1, transition));
        }

        lines.push(String::new());
        lines.push(format!(
            "Final state:       {}",
            self.cyan(&sim.final_state)
        ));
        lines.push(format!(
            "Mode:              {}",
            self.mode_label(&sim.mode)
        ));
        lines.push(format!("Decision requests: {}", sim.decision_requests));

        lines.join("\n")
    }

    /// Formats a one-shot decision outcome.
    pub fn format_decision(&self, decision: &DecisionOutput) -> String {
        let mut lines = Vec::new();

        if decision.accepted {
            lines.push(format!("Decision: {}", self.green("accepted")));
            if let Some(url) = &decision.url {
                lines.push(format!("URL:      {}", self.cyan(url)));
            }
            if let Some(expires) = decision.expires {
                lines.push(format!("Expires:  {expires}"));
            }
        } else {
            lines.push(format!("Decision: {}", self.red("rejected")));
            if let Some(error) = &decision.error {
                lines.push(format!("Reason:   {error}"));
            }
        }

        lines.join("\n")
    }

    /// Formats the reset outcome or its dry run.
    pub fn format_reset(&self, reset: &ResetOutput) -> String {
        if reset.records.is_empty() {
            return format!("No records at {}.", reset.store_dir);
        }

        if reset.removed {
            return format!(
                "Removed {} record(s) from {}.",
                reset.records.len(),
                reset.store_dir
            );
        }

        let mut lines = Vec::new();
        lines.push(format!("Records at {}:", reset.store_dir));
        for record in &reset.records {
            lines.push(format!("  - {record}"));
        }
        lines.push(String::new());
        lines.push(self.dim("Pass --yes to remove them."));
        lines.join("\n")
    }

    fn mode_label(&self, mode: &str) -> String {
        match mode {
            "web" => self.cyan(mode),
            "native" => self.green(mode),
            _ => self.dim(mode),
        }
    }

    // ========================================================================
    // Color/style helpers
    // ========================================================================

    fn bold(&self, text: &str) -> String {
        if self.use_colors {
            format!("{BOLD}{text}{RESET}")
        } else {
            text.to_string()
        }
    }

    fn dim(&self, text: &str) -> String {
        if self.use_colors {
            format!("{DIM}{text}{RESET}")
        } else {
            text.to_string()
        }
    }

    fn green(&self, text: &str) -> String {
        if self.use_colors {
            format!("{GREEN}{text}{RESET}")
        } else {
            text.to_string()
        }
    }

    fn red(&self, text: &str) -> String {
        if self.use_colors {
            format!("{RED}{text}{RESET}")
        } else {
            text.to_string()
        }
    }

    fn cyan(&self, text: &str) -> String {
        if self.use_colors {
            format!("{CYAN}{text}{RESET}")
        } else {
            text.to_string()
        }
    }
}

fn format_timestamp(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

fn yes_no(value: bool) -> &'static str {
    if value { "yes" } else { "no" }
}
