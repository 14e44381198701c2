//! Decide command - issue one decision request against a real endpoint.
//!
//! Builds the same merged request body the launch flow sends and prints
//! the endpoint's verdict. Nothing is persisted; this is a diagnostic for
//! endpoint behavior.

use std::time::Duration;

use anyhow::Result;
use clap::Args;
use serde_json::{Map, Value};
use tracing::debug;

use launchgate_core::{AppIdentity, Connectivity, ConversionResult};
use launchgate_fetch::{
    ConfigFetcher, DecisionClient, DecisionContext, DecisionError, DecisionRequest,
    DecisionResponse, HttpClient, ProbeConnectivity,
};

use crate::output::{DecisionOutput, JsonFormatter, TextFormatter};
use crate::{Cli, ExitCode, OutputFormat};

/// Longest a preflight probe will wait for connectivity.
const PREFLIGHT_WAIT: Duration = Duration::from_secs(5);

/// Arguments for the decide command.
#[derive(Args)]
pub struct DecideArgs {
    /// Decision endpoint URL.
    #[arg(long, short)]
    pub endpoint: String,

    /// App bundle identifier.
    #[arg(long, default_value = "com.example.app")]
    pub bundle_id: String,

    /// Operating system identifier.
    #[arg(long, default_value = "ios")]
    pub os: String,

    /// App Store identifier.
    #[arg(long, default_value = "id0000000000")]
    pub store_id: String,

    /// Device locale.
    #[arg(long, default_value = "en_US")]
    pub locale: String,

    /// Firebase project identifier.
    #[arg(long)]
    pub firebase_project_id: Option<String>,

    /// Device push token to include.
    #[arg(long)]
    pub push_token: Option<String>,

    /// Conversion payload as inline JSON (e.g. '{"af_status":"Organic"}').
    #[arg(long)]
    pub conversion: Option<String>,

    /// Probe this URL for connectivity before sending the request.
    #[arg(long, value_name = "URL")]
    pub preflight: Option<String>,

    /// Request timeout in seconds.
    #[arg(long, default_value = "30")]
    pub timeout: u64,
}

/// Runs the decide command.
pub async fn run(args: &DecideArgs, cli: &Cli) -> Result<()> {
    let client = HttpClient::with_timeout(Duration::from_secs(args.timeout))?;
    let endpoint = DecisionClient::with_client(&args.endpoint, client.clone())?;

    if let Some(check_url) = &args.preflight {
        let probe = ProbeConnectivity::new(client, [check_url.clone()]);
        debug!(check_url = %check_url, "Running preflight probe");
        if !probe.wait_for_connection(PREFLIGHT_WAIT).await {
            eprintln!("Error: no connectivity (preflight probe failed)");
            std::process::exit(ExitCode::Offline as i32);
        }
    }

    let request = build_request(args)?;
    debug!(endpoint = %endpoint.endpoint(), "Sending decision request");

    let outcome = match endpoint
        .fetch_decision(&request)
        .await
        .and_then(DecisionResponse::into_config)
    {
        Ok(config) => DecisionOutput {
            accepted: true,
            url: Some(config.url.to_string()),
            expires: Some(config.expires),
            error: None,
        },
        Err(DecisionError::ServerRejected(message)) => DecisionOutput {
            accepted: false,
            url: None,
            expires: None,
            error: Some(message),
        },
        Err(e) => return Err(e.into()),
    };

    match cli.format {
        OutputFormat::Text => {
            let formatter = TextFormatter::new(!cli.no_color);
            println!("{}", formatter.format_decision(&outcome));
        }
        OutputFormat::Json => {
            let formatter = JsonFormatter::new(cli.pretty);
            println!("{}", formatter.format(&outcome)?);
        }
    }

    if !outcome.accepted {
        std::process::exit(ExitCode::Rejected as i32);
    }

    Ok(())
}

/// Assembles the merged request body from the arguments.
fn build_request(args: &DecideArgs) -> Result<DecisionRequest> {
    let mut identity = AppIdentity::new(
        args.bundle_id.clone(),
        args.os.clone(),
        args.store_id.clone(),
        args.locale.clone(),
    );
    if let Some(project) = &args.firebase_project_id {
        identity = identity.with_firebase_project_id(project.clone());
    }

    let conversion = match &args.conversion {
        Some(raw) => {
            let payload: Map<String, Value> = serde_json::from_str(raw)
                .map_err(|e| anyhow::anyhow!("--conversion is not a JSON object: {e}"))?;
            Some(ConversionResult::new(payload))
        }
        None => None,
    };

    let context = DecisionContext {
        conversion,
        deep_link: None,
        push_token: args.push_token.clone(),
    };

    Ok(DecisionRequest::build(&context, &identity))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> DecideArgs {
        DecideArgs {
            endpoint: "https://decide.example.com/v1/launch".to_string(),
            bundle_id: "com.example.app".to_string(),
            os: "ios".to_string(),
            store_id: "id0000000000".to_string(),
            locale: "en_US".to_string(),
            firebase_project_id: None,
            push_token: None,
            conversion: None,
            preflight: None,
            timeout: 30,
        }
    }

    #[test]
    fn test_build_request_with_identity_only() {
        let request = build_request(&args()).unwrap();
        let body = request.body();

        assert_eq!(body["bundle_id"], "com.example.app");
        assert_eq!(body["os"], "ios");
        assert!(body.get("push_token").is_none());
        assert!(body.get("af_status").is_none());
    }

    #[test]
    fn test_build_request_merges_conversion_payload() {
        let mut args = args();
        args.conversion = Some(r#"{"af_status":"Organic","campaign":"x"}"#.to_string());
        args.push_token = Some("tok-1".to_string());

        let request = build_request(&args).unwrap();
        let body = request.body();

        assert_eq!(body["af_status"], "Organic");
        assert_eq!(body["campaign"], "x");
        assert_eq!(body["push_token"], "tok-1");
    }

    #[test]
    fn test_build_request_rejects_bad_conversion_json() {
        let mut args = args();
        args.conversion = Some("not json".to_string());

        assert!(build_request(&args).is_err());
    }
}
