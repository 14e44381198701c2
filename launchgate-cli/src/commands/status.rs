//! Status command - show the persisted launch records.

use anyhow::Result;
use launchgate_store::LaunchStore;
use tracing::debug;

use crate::output::{
    ConfigOutput, ConversionOutput, JsonFormatter, PushOutput, StatusOutput, TextFormatter,
};
use crate::{Cli, OutputFormat};

/// Runs the status command.
pub async fn run(cli: &Cli) -> Result<()> {
    let store = cli.store();
    debug!(dir = %store.dir().display(), "Reading launch records");

    let status = collect(&store).await;

    match cli.format {
        OutputFormat::Text => {
            let formatter = TextFormatter::new(!cli.no_color);
            println!("{}", formatter.format_status(&status));
        }
        OutputFormat::Json => {
            let formatter = JsonFormatter::new(cli.pretty);
            println!("{}", formatter.format(&status)?);
        }
    }

    Ok(())
}

/// Collects every persisted record into one report.
async fn collect(store: &LaunchStore) -> StatusOutput {
    let mode = store.load_mode().await;

    let config = store.load_remote_config().await.map(|stored| ConfigOutput {
        url: stored.url().to_string(),
        expires: stored.config.expires,
        expired: stored.is_expired(),
        saved_at: stored.saved_at,
    });

    let conversion = store
        .load_conversion()
        .await
        .map(|result| ConversionOutput {
            classification: result.classification().label().to_string(),
            media_source: result.media_source().map(str::to_string),
            campaign: result.campaign().map(str::to_string),
            attribution_id: result.attribution_id.clone(),
        });

    let gate = store.load_push_gate().await;
    let push = PushOutput {
        permission_requested: gate.has_requested_permission,
        last_skipped_at: gate.last_skipped_at,
        has_token: store.load_push_token().await.is_some(),
    };

    StatusOutput {
        mode: mode.label().to_string(),
        store_dir: store.dir().display().to_string(),
        config,
        conversion,
        push,
        onboarding_completed: store.has_completed_onboarding().await,
    }
}

// ============================================================================
// Tests
// ============================================================================
