use std::path::Path;

use serde_json::{json, Value};

use railfare_core::{flatten_document, write_report, FlattenStats};

use crate::cli::FlattenArgs;
use crate::error::CliError;

use super::Settings;

pub fn run(args: &FlattenArgs, settings: &Settings) -> Result<Value, CliError> {
    let (rows, stats) = document_to_report(&args.raw, &args.report, settings)?;
    Ok(json!({
        "responses": stats.responses,
        "rows": rows,
        "no_service": stats.no_service,
        "provider_errors": stats.provider_errors,
        "report": args.report.display().to_string(),
    }))
}

/// Streams the raw document through the flattener and writes the sorted report.
/// Returns the number of report rows.
pub(super) fn document_to_report(
    raw_path: &Path,
    report_path: &Path,
    settings: &Settings,
) -> Result<(usize, FlattenStats), CliError> {
    let (mut records, stats) =
        flatten_document(raw_path, &settings.flatten, settings.search_date)?;
    write_report(report_path, &mut records, settings.report)?;
    Ok((records.len(), stats))
}
