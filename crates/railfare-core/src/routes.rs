//! Route source: reads [`RouteSpec`] rows from the `routes` sheet of a
//! workbook, or from a CSV file.
//!
//! Workbook columns are positional (origin name, destination name, origin
//! code, destination code) below one header row. CSV files carry the header
//! `origin_name,destination_name,origin_code,destination_code`.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};

use crate::domain::RouteSpec;
use crate::CoreError;

/// Sheet holding the route list in a parameters workbook.
pub const ROUTES_SHEET: &str = "routes";

pub fn read_routes(path: &Path) -> Result<Vec<RouteSpec>, CoreError> {
    let routes = if is_csv(path) {
        read_routes_from(File::open(path)?)?
    } else {
        read_routes_workbook(path, ROUTES_SHEET)?
    };
    log::info!("loaded {} routes from {}", routes.len(), path.display());
    Ok(routes)
}

pub fn read_routes_workbook(path: &Path, sheet: &str) -> Result<Vec<RouteSpec>, CoreError> {
    let mut workbook = open_workbook_auto(path)?;
    let range = workbook.worksheet_range(sheet)?;
    routes_from_rows(range.rows().skip(1))
}

pub fn read_routes_from<R: Read>(reader: R) -> Result<Vec<RouteSpec>, CoreError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut routes = Vec::new();
    for row in csv_reader.deserialize::<RouteSpec>() {
        routes.push(row?.validated()?);
    }
    non_empty(routes)
}

fn routes_from_rows<'r>(rows: impl Iterator<Item = &'r [Data]>) -> Result<Vec<RouteSpec>, CoreError> {
    let mut routes = Vec::new();
    for row in rows {
        let cell = |column: usize| row.get(column).map(cell_text).unwrap_or_default();
        let cells = [cell(0), cell(1), cell(2), cell(3)];
        if cells.iter().all(String::is_empty) {
            continue;
        }
        let [origin_name, destination_name, origin_code, destination_code] = cells;
        routes.push(RouteSpec::new(
            origin_name,
            destination_name,
            origin_code,
            destination_code,
        )?);
    }
    non_empty(routes)
}

// Numeric cells hold station codes as floats; `2000000.0` must read as `2000000`.
fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(text) => text.trim().to_owned(),
        Data::Int(value) => value.to_string(),
        Data::Float(value) if value.fract() == 0.0 => format!("{value:.0}"),
        other => other.to_string(),
    }
}

fn non_empty(routes: Vec<RouteSpec>) -> Result<Vec<RouteSpec>, CoreError> {
    if routes.is_empty() {
        return Err(CoreError::EmptyRouteList);
    }
    Ok(routes)
}

fn is_csv(path: &Path) -> bool {
    path.extension()
        .and_then(|extension| extension.to_str())
        .is_some_and(|extension| extension.eq_ignore_ascii_case("csv"))
}
