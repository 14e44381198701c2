//! Output formatting for CLI.

mod json;
mod text;

pub use json::{
    ConfigOutput, ConversionOutput, DecisionOutput, JsonFormatter, PushOutput, ResetOutput,
    SimulationOutput, StatusOutput,
};
pub use text::TextFormatter;
#[cfg(test)]
mod tests;
