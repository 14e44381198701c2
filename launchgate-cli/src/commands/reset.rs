//! Reset command - wipe persisted launch records.
//!
//! Without `--yes` this is a dry run that lists what would be removed.

use anyhow::Result;
use clap::Args;
use tracing::info;

use crate::output::{JsonFormatter, ResetOutput, TextFormatter};
use crate::{Cli, OutputFormat};

/// Arguments for the reset command.
#[derive(Args)]
pub struct ResetArgs {
    /// Actually remove the records instead of listing them.
    #[arg(long)]
    pub yes: bool,
}

/// Runs the reset command.
pub async fn run(args: &ResetArgs, cli: &Cli) -> Result<()> {
    let store = cli.store();
    let records = store.existing_records().await;

    let removed = args.yes && !records.is_empty();
    if removed {
        store.reset().await?;
        info!(count = records.len(), "Removed launch records");
    }

    let outcome = ResetOutput {
        store_dir: store.dir().display().to_string(),
        records,
        removed,
    };

    match cli.format {
        OutputFormat::Text => {
            let formatter = TextFormatter::new(!cli.no_color);
            println!("{}", formatter.format_reset(&outcome));
        }
        OutputFormat::Json => {
            let formatter = JsonFormatter::new(cli.pretty);
            println!("{}", formatter.format(&outcome)?);
        }
    }

    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
