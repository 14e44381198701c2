//! CLI command implementations.

pub mod decide;
pub mod reset;
pub mod simulate;
pub mod status;
