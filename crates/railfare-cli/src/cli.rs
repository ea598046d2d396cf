//! CLI argument definitions for railfare.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `run` | Probe, harvest, write raw document, flatten, write report |
//! | `harvest` | Harvest and write the raw document only |
//! | `flatten` | Turn an existing raw document into a report |
//! | `details` | Car-pricing lookup for every train in a raw document |
//!
//! # Global Options
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `--window-days` | `120` | Look-ahead window from the start date |
//! | `--weekdays` | `tue,thu` | Departure weekdays to harvest |
//! | `--max-concurrency` | `7` | Requests in flight |
//! | `--jitter-min-ms` | `2000` | Lower bound of the pre-request pause |
//! | `--jitter-max-ms` | `3000` | Upper bound of the pre-request pause |
//! | `--timeout-ms` | `10000` | Per-request timeout |
//! | `--quota-per-minute` | none | Optional request budget |
//! | `--start-date` | today | First departure date considered |
//! | `--utc-offset-hours` | `3` | Offset used to compute "today" |
//! | `--no-bom` | `false` | Omit the UTF-8 BOM from a CSV report |
//! | `--carrier` | `ФПК` | Allowed carrier, repeatable |
//! | `--no-service-label` | `Поезд не курсирует` | Text of no-service rows |
//! | `--no-service-price` | `3000000` | Price of no-service rows |
//!
//! Routes and reports are xlsx workbooks unless the path ends in `.csv`.
//!
//! # Examples
//!
//! ```bash
//! railfare run --routes parameters.xlsx --report fares.xlsx
//! RUST_LOG=debug railfare harvest --window-days 14 --weekdays fri
//! railfare flatten --raw raw_responses.json --report fares.csv --no-bom
//! railfare flatten --carrier ФПК --carrier ДОСС
//! ```

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use railfare_core::policy::NO_SERVICE_LABEL;

#[derive(Debug, Parser)]
#[command(
    name = "railfare",
    author,
    version,
    about = "Rail fare availability harvester",
    long_about = "Collects fare and availability snapshots for a list of routes over a \
departure-date window, keeps every provider response in a raw JSON document, and \
flattens it into a sorted xlsx report (CSV when the report path ends in .csv).\n\
\n\
Set RAILFARE_API_BASE to point the harvester at another host and RUST_LOG to change \
the log level."
)]
pub struct Cli {
    /// Number of days, starting at the start date, to consider.
    #[arg(long, global = true, default_value_t = 120)]
    pub window_days: u32,

    /// Comma-separated departure weekdays (e.g. `tue,thu`).
    #[arg(long, global = true, default_value = "tue,thu")]
    pub weekdays: String,

    #[arg(long, global = true, default_value_t = 7)]
    pub max_concurrency: usize,

    #[arg(long, global = true, default_value_t = 2000)]
    pub jitter_min_ms: u64,

    #[arg(long, global = true, default_value_t = 3000)]
    pub jitter_max_ms: u64,

    /// Request timeout budget in milliseconds.
    #[arg(long, global = true, default_value_t = 10_000)]
    pub timeout_ms: u64,

    /// Cap on upstream requests per minute, on top of the jitter.
    #[arg(long, global = true)]
    pub quota_per_minute: Option<u32>,

    /// First departure date (YYYY-MM-DD). Defaults to today.
    #[arg(long, global = true)]
    pub start_date: Option<String>,

    #[arg(long, global = true, default_value_t = 3, allow_negative_numbers = true)]
    pub utc_offset_hours: i8,

    /// Write a CSV report without a UTF-8 byte-order mark.
    #[arg(long, global = true, default_value_t = false)]
    pub no_bom: bool,

    /// Carrier whose car groups are kept; repeat for several. Defaults to the
    /// national passenger carrier.
    #[arg(long = "carrier", global = true, value_name = "NAME")]
    pub carriers: Vec<String>,

    #[arg(long, global = true, default_value = NO_SERVICE_LABEL)]
    pub no_service_label: String,

    #[arg(long, global = true, default_value_t = 3_000_000)]
    pub no_service_price: i64,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Full pipeline: probe, harvest, flatten, report.
    Run(RunArgs),
    /// Harvest and persist raw responses only.
    Harvest(HarvestArgs),
    /// Flatten a raw document into a report.
    Flatten(FlattenArgs),
    /// Look up car pricing for every train in a raw document.
    Details(DetailsArgs),
}

#[derive(Debug, Clone, Args)]
pub struct RunArgs {
    #[arg(long, default_value = "parameters.xlsx")]
    pub routes: PathBuf,

    #[arg(long, default_value = "raw_responses.json")]
    pub raw: PathBuf,

    #[arg(long, default_value = "fares.xlsx")]
    pub report: PathBuf,

    /// Skip the reachability check before harvesting.
    #[arg(long, default_value_t = false)]
    pub skip_probe: bool,
}

#[derive(Debug, Clone, Args)]
pub struct HarvestArgs {
    #[arg(long, default_value = "parameters.xlsx")]
    pub routes: PathBuf,

    #[arg(long, default_value = "raw_responses.json")]
    pub raw: PathBuf,
}

#[derive(Debug, Clone, Args)]
pub struct FlattenArgs {
    #[arg(long, default_value = "raw_responses.json")]
    pub raw: PathBuf,

    #[arg(long, default_value = "fares.xlsx")]
    pub report: PathBuf,
}

#[derive(Debug, Clone, Args)]
pub struct DetailsArgs {
    #[arg(long, default_value = "raw_responses.json")]
    pub raw: PathBuf,

    #[arg(long, default_value = "train_details.json")]
    pub output: PathBuf,

    #[arg(long, default_value = "train_details_errors.json")]
    pub errors: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_describe_the_standard_run() {
        let cli = Cli::try_parse_from(["railfare", "run"]).expect("valid arguments");
        assert_eq!(cli.window_days, 120);
        assert_eq!(cli.weekdays, "tue,thu");
        assert_eq!(cli.max_concurrency, 7);
        assert_eq!((cli.jitter_min_ms, cli.jitter_max_ms), (2000, 3000));
        assert_eq!(cli.quota_per_minute, None);
        assert!(!cli.no_bom);
        assert!(cli.carriers.is_empty());
        assert_eq!(cli.no_service_label, NO_SERVICE_LABEL);
        assert_eq!(cli.no_service_price, 3_000_000);
        match cli.command {
            Command::Run(args) => {
                assert_eq!(args.routes, PathBuf::from("parameters.xlsx"));
                assert_eq!(args.report, PathBuf::from("fares.xlsx"));
                assert!(!args.skip_probe);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn global_options_follow_subcommand() {
        let cli = Cli::try_parse_from([
            "railfare",
            "flatten",
            "--raw",
            "in.json",
            "--no-bom",
            "--utc-offset-hours=-5",
        ])
        .expect("valid arguments");
        assert!(cli.no_bom);
        assert_eq!(cli.utc_offset_hours, -5);
        assert!(matches!(cli.command, Command::Flatten(ref args) if args.raw == PathBuf::from("in.json")));
    }
}
