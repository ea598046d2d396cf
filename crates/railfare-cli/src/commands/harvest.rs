use std::path::Path;
use std::sync::Arc;

use serde_json::{json, Value};

use railfare_core::{
    harvest, plan_tasks, read_routes, write_raw_document, FareFetcher, HarvestOutcome, HttpClient,
};

use crate::cli::HarvestArgs;
use crate::error::CliError;

use super::Settings;

pub async fn run(
    args: &HarvestArgs,
    settings: &Settings,
    client: Arc<dyn HttpClient>,
) -> Result<Value, CliError> {
    let outcome = harvest_to_document(&args.routes, &args.raw, settings, client).await?;
    Ok(json!({
        "planned": outcome.planned,
        "responses": outcome.succeeded(),
        "failed": outcome.failed,
        "raw_document": args.raw.display().to_string(),
    }))
}

/// Loads routes, harvests every planned task, and persists the raw document.
pub(super) async fn harvest_to_document(
    routes_path: &Path,
    raw_path: &Path,
    settings: &Settings,
    client: Arc<dyn HttpClient>,
) -> Result<HarvestOutcome, CliError> {
    let routes = read_routes(routes_path)?;
    let tasks = plan_tasks(
        &routes,
        settings.start_date,
        settings.window_days,
        &settings.weekdays,
    )?;
    log::info!(
        "planned {} tasks for {} routes from {} over {} days",
        tasks.len(),
        routes.len(),
        settings.start_date,
        settings.window_days
    );

    let fetcher = FareFetcher::new(client, settings.endpoint.clone());
    log::debug!("pricing endpoint {}", fetcher.endpoint().url);
    let outcome = harvest(&fetcher, &tasks, &settings.policy).await?;
    write_raw_document(raw_path, &outcome.responses)?;
    Ok(outcome)
}
