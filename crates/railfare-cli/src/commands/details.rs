use serde_json::{json, Value};

use railfare_core::details::write_json;
use railfare_core::raw_store::read_raw_document;
use railfare_core::{lookup_all, train_refs, DetailEndpoint, HttpClient, RequestThrottle};

use crate::cli::DetailsArgs;
use crate::error::CliError;

use super::Settings;

pub async fn run(
    args: &DetailsArgs,
    settings: &Settings,
    client: &dyn HttpClient,
) -> Result<Value, CliError> {
    let mut trains = Vec::new();
    read_raw_document(&args.raw, |response| trains.extend(train_refs(&response)))?;
    log::info!("looking up {} trains from {}", trains.len(), args.raw.display());

    let endpoint = DetailEndpoint {
        timeout_ms: settings.endpoint.timeout_ms,
        ..DetailEndpoint::default()
    };
    let throttle = RequestThrottle::new(settings.policy.jitter, settings.policy.quota);
    let report = lookup_all(client, &endpoint, &trains, &throttle).await;

    write_json(&args.output, &report.details)?;
    write_json(&args.errors, &report.errors)?;

    Ok(json!({
        "trains": trains.len(),
        "found": report.details.len(),
        "failed": report.errors.len(),
        "output": args.output.display().to_string(),
        "errors": args.errors.display().to_string(),
    }))
}
