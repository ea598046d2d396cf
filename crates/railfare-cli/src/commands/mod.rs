mod details;
mod flatten;
mod harvest;
mod run;

use std::sync::Arc;

use serde_json::Value;
use time::{Date, Weekday};

use railfare_core::domain::{parse_iso_date, parse_weekdays, today_at_offset};
use railfare_core::{
    FareEndpoint, FlattenPolicy, HarvestPolicy, HttpClient, JitterPolicy, QuotaPolicy,
    ReportOptions, ReqwestHttpClient,
};

use crate::cli::{Cli, Command};
use crate::error::CliError;

/// Options shared by every command, resolved once from the global flags.
#[derive(Debug, Clone)]
pub struct Settings {
    pub policy: HarvestPolicy,
    pub endpoint: FareEndpoint,
    pub weekdays: Vec<Weekday>,
    pub window_days: u32,
    pub start_date: Date,
    /// Stamped into every record as `date_search`.
    pub search_date: Date,
    pub report: ReportOptions,
    pub flatten: FlattenPolicy,
}

impl Settings {
    pub fn from_cli(cli: &Cli) -> Result<Self, CliError> {
        let policy = HarvestPolicy {
            max_concurrency: cli.max_concurrency,
            jitter: JitterPolicy::from_millis(cli.jitter_min_ms, cli.jitter_max_ms)?,
            quota: cli.quota_per_minute.map(QuotaPolicy::per_minute),
            request_timeout: std::time::Duration::from_millis(cli.timeout_ms),
        };
        policy.validate()?;

        let search_date = today_at_offset(cli.utc_offset_hours)?;
        let start_date = match &cli.start_date {
            Some(raw) => parse_iso_date(raw)?,
            None => search_date,
        };

        let mut flatten = FlattenPolicy::default()
            .with_no_service(cli.no_service_label.as_str(), cli.no_service_price);
        if !cli.carriers.is_empty() {
            flatten = flatten.with_carriers(cli.carriers.iter().map(String::as_str));
        }
        flatten.validate()?;

        Ok(Self {
            endpoint: FareEndpoint::from_env().with_timeout_ms(policy.request_timeout_ms()),
            policy,
            weekdays: parse_weekdays(&cli.weekdays)?,
            window_days: cli.window_days,
            start_date,
            search_date,
            report: ReportOptions { bom: !cli.no_bom },
            flatten,
        })
    }
}

pub async fn run(cli: &Cli) -> Result<Value, CliError> {
    let settings = Settings::from_cli(cli)?;
    let client: Arc<dyn HttpClient> = Arc::new(ReqwestHttpClient::new());

    match &cli.command {
        Command::Run(args) => run::run(args, &settings, client).await,
        Command::Harvest(args) => harvest::run(args, &settings, client).await,
        Command::Flatten(args) => flatten::run(args, &settings),
        Command::Details(args) => details::run(args, &settings, client.as_ref()).await,
    }
}
