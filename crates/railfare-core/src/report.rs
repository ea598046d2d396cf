//! Report sink: sorted export of flat records as an xlsx workbook or CSV.
//!
//! The format follows the report path extension: `.csv` writes CSV, any
//! other extension writes a workbook with one `fares` sheet.

use std::borrow::Cow;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use rust_xlsxwriter::{Format, Workbook, Worksheet, XlsxError};

use crate::domain::FlatRecord;
use crate::CoreError;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Sheet name of the workbook report.
pub const REPORT_SHEET: &str = "fares";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportOptions {
    /// Prefix CSV output with a UTF-8 byte-order mark so spreadsheet
    /// applications detect the encoding of Cyrillic text. Workbooks ignore it.
    pub bom: bool,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self { bom: true }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Xlsx,
    Csv,
}

impl ReportFormat {
    pub fn from_path(path: &Path) -> Self {
        let is_csv = path
            .extension()
            .and_then(|extension| extension.to_str())
            .is_some_and(|extension| extension.eq_ignore_ascii_case("csv"));
        if is_csv {
            Self::Csv
        } else {
            Self::Xlsx
        }
    }
}

/// Stable ascending sort by (departure date, train number).
pub fn sort_records(records: &mut [FlatRecord]) {
    records.sort_by(|left, right| left.sort_key().cmp(&right.sort_key()));
}

pub fn write_report(
    path: &Path,
    records: &mut [FlatRecord],
    options: ReportOptions,
) -> Result<(), CoreError> {
    let format = ReportFormat::from_path(path);
    match format {
        ReportFormat::Csv => {
            let file = File::create(path)?;
            write_report_to(BufWriter::new(file), records, options)?;
        }
        ReportFormat::Xlsx => write_workbook(path, records)?,
    }
    log::info!("wrote {} rows to {} ({format:?})", records.len(), path.display());
    Ok(())
}

/// Sorts `records` in place, then writes the CSV header and one row per record.
pub fn write_report_to<W: Write>(
    mut writer: W,
    records: &mut [FlatRecord],
    options: ReportOptions,
) -> Result<(), CoreError> {
    sort_records(records);

    if options.bom {
        writer.write_all(UTF8_BOM)?;
    }

    let mut csv_writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    csv_writer.write_record(FlatRecord::COLUMNS)?;
    for record in records.iter() {
        csv_writer.serialize(record)?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Sorts `records` in place, then saves a workbook with a bold header row
/// and one row per record. Absent values stay blank cells.
pub fn write_workbook(path: &Path, records: &mut [FlatRecord]) -> Result<(), CoreError> {
    sort_records(records);

    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name(REPORT_SHEET)?;

    let header = Format::new().set_bold();
    for (column, name) in (0u16..).zip(FlatRecord::COLUMNS) {
        sheet.write_string_with_format(0, column, name, &header)?;
    }
    for (row, record) in (1u32..).zip(records.iter()) {
        write_row(sheet, row, record)?;
    }

    workbook.save(path)?;
    Ok(())
}

enum Cell<'a> {
    Text(Cow<'a, str>),
    Number(i64),
    Flag(bool),
    Blank,
}

impl<'a> From<&'a Option<String>> for Cell<'a> {
    fn from(value: &'a Option<String>) -> Self {
        value
            .as_deref()
            .map_or(Cell::Blank, |text| Cell::Text(Cow::Borrowed(text)))
    }
}

fn cells(record: &FlatRecord) -> [Cell<'_>; 21] {
    [
        Cell::Text(Cow::Owned(record.date_search.to_string())),
        Cell::Text(Cow::Owned(record.departure_date.to_string())),
        Cell::Text(Cow::Borrowed(&record.train_number)),
        Cell::from(&record.origin_name),
        Cell::from(&record.destination_name),
        Cell::from(&record.origin_station_code),
        Cell::from(&record.destination_station_code),
        Cell::Text(Cow::Borrowed(&record.car_type_name)),
        Cell::Number(record.min_price),
        Cell::Number(record.max_price),
        record.service_cost.map_or(Cell::Blank, Cell::Number),
        Cell::from(&record.service_class),
        Cell::from(&record.carrier),
        Cell::Flag(record.has_non_refundable_tariff),
        Cell::Flag(record.has_places_for_disabled_persons),
        Cell::from(&record.initial_station_name),
        Cell::from(&record.final_station_name),
        Cell::from(&record.initial_station_code),
        Cell::from(&record.final_station_code),
        Cell::Text(Cow::Borrowed(&record.train_description)),
        Cell::Text(Cow::Borrowed(&record.train_brand_code)),
    ]
}

fn write_row(sheet: &mut Worksheet, row: u32, record: &FlatRecord) -> Result<(), XlsxError> {
    for (column, cell) in (0u16..).zip(cells(record)) {
        match cell {
            Cell::Text(text) if text.is_empty() => {}
            Cell::Text(text) => {
                sheet.write_string(row, column, text.as_ref())?;
            }
            // Prices are whole currency units, exact in f64.
            Cell::Number(value) => {
                sheet.write_number(row, column, value as f64)?;
            }
            Cell::Flag(value) => {
                sheet.write_boolean(row, column, value)?;
            }
            Cell::Blank => {}
        }
    }
    Ok(())
}
