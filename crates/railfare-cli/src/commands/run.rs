use std::sync::Arc;

use serde_json::{json, Value};

use railfare_core::probe::DEFAULT_PROBE_URL;
use railfare_core::{probe, HttpClient};

use crate::cli::RunArgs;
use crate::error::CliError;

use super::{flatten, harvest, Settings};

pub async fn run(
    args: &RunArgs,
    settings: &Settings,
    client: Arc<dyn HttpClient>,
) -> Result<Value, CliError> {
    if !args.skip_probe {
        match probe(client.as_ref(), DEFAULT_PROBE_URL, settings.endpoint.timeout_ms).await {
            Ok(()) => log::info!("provider reachable at {DEFAULT_PROBE_URL}"),
            Err(failure) => log::warn!("{failure}; continuing anyway"),
        }
    }

    let outcome = harvest::harvest_to_document(&args.routes, &args.raw, settings, client).await?;
    let (rows, stats) = flatten::document_to_report(&args.raw, &args.report, settings)?;

    Ok(json!({
        "planned": outcome.planned,
        "responses": outcome.succeeded(),
        "failed": outcome.failed,
        "rows": rows,
        "no_service": stats.no_service,
        "raw_document": args.raw.display().to_string(),
        "report": args.report.display().to_string(),
    }))
}
