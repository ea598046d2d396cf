//! Per-train detail lookup against the car-pricing endpoint.
//!
//! Train references are taken from priced responses in a raw document. Each
//! lookup either yields the provider payload or a [`DetailError`]; neither
//! outcome aborts the batch.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use time::Date;

use crate::domain::{date_part, parse_iso_date, RawResponse};
use crate::fetcher::PROVIDER_HEADERS;
use crate::http_client::{HttpClient, HttpRequest};
use crate::throttling::RequestThrottle;
use crate::CoreError;

pub const DEFAULT_CAR_PRICING_URL: &str =
    "https://ticket.rzd.ru/apib2b/p/Railway/V1/Search/CarPricing";

/// Train identity needed for a car-pricing lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainRef {
    pub number: String,
    pub origin_code: String,
    pub destination_code: String,
    #[serde(with = "crate::domain::iso_date")]
    pub departure_date: Date,
}

/// Failed lookup: either an API-level message or a transport error text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetailError {
    pub train: String,
    #[serde(with = "crate::domain::iso_date")]
    pub date: Date,
    pub origin: String,
    pub destination: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DetailError {
    fn new(train: &TrainRef) -> Self {
        Self {
            train: train.number.clone(),
            date: train.departure_date,
            origin: train.origin_code.clone(),
            destination: train.destination_code.clone(),
            api_message: None,
            error: None,
        }
    }

    fn upstream(train: &TrainRef, message: impl Into<String>) -> Self {
        Self {
            api_message: Some(message.into()),
            ..Self::new(train)
        }
    }

    fn transport(train: &TrainRef, message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            ..Self::new(train)
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DetailOutcome {
    Found(Value),
    Failed(DetailError),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetailReport {
    pub details: Vec<Value>,
    pub errors: Vec<DetailError>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailEndpoint {
    pub url: String,
    pub timeout_ms: u64,
}

impl Default for DetailEndpoint {
    fn default() -> Self {
        Self {
            url: String::from(DEFAULT_CAR_PRICING_URL),
            timeout_ms: 10_000,
        }
    }
}

impl DetailEndpoint {
    pub fn request_for(&self, train: &TrainRef) -> HttpRequest {
        let body = json!({
            "service_provider": "B2B_RZD",
            "OriginCode": code_value(&train.origin_code),
            "DestinationCode": code_value(&train.destination_code),
            "departureDate": train.departure_date.to_string(),
            "specialPlacesDemand": "StandardPlacesAndForDisabledPersons",
            "TrainNumber": train.number,
        });

        HttpRequest::post(&self.url)
            .with_headers(PROVIDER_HEADERS)
            .with_header("Content-Type", "application/json")
            .with_body(body.to_string())
            .with_timeout_ms(self.timeout_ms)
    }
}

/// Trains of a priced response that carry a number, station codes, and a
/// parseable departure timestamp.
pub fn train_refs(response: &RawResponse) -> Vec<TrainRef> {
    let RawResponse::Priced(priced) = response else {
        return Vec::new();
    };

    priced
        .trains
        .iter()
        .filter_map(|train| {
            let number = train.train_number.clone().filter(|n| !n.is_empty())?;
            let departure_date =
                parse_iso_date(date_part(train.departure_date_time.as_deref()?)).ok()?;
            Some(TrainRef {
                number,
                origin_code: train.origin_station_info.station_code.clone()?,
                destination_code: train.destination_station_info.station_code.clone()?,
                departure_date,
            })
        })
        .collect()
}

pub async fn lookup(
    client: &dyn HttpClient,
    endpoint: &DetailEndpoint,
    train: &TrainRef,
) -> DetailOutcome {
    let response = match client.execute(endpoint.request_for(train)).await {
        Ok(response) => response,
        Err(error) => return DetailOutcome::Failed(DetailError::transport(train, error.message())),
    };
    log::debug!("detail lookup for train {} -> status {}", train.number, response.status);

    if !response.is_ok() {
        return DetailOutcome::Failed(DetailError::transport(
            train,
            format!("upstream returned status {}", response.status),
        ));
    }

    let payload: Value = match serde_json::from_str(&response.body) {
        Ok(payload) => payload,
        Err(error) => {
            return DetailOutcome::Failed(DetailError::transport(
                train,
                format!("invalid JSON body: {error}"),
            ))
        }
    };

    if is_truthy(payload.get("ProviderError")) || is_truthy(payload.get("Message")) {
        let message = payload
            .get("Message")
            .and_then(Value::as_str)
            .unwrap_or("unknown API error");
        log::warn!(
            "provider rejected train {} ({}): {message}",
            train.number,
            train.departure_date
        );
        return DetailOutcome::Failed(DetailError::upstream(train, message));
    }

    DetailOutcome::Found(payload)
}

/// Sequential lookups, each gated by `throttle`.
pub async fn lookup_all(
    client: &dyn HttpClient,
    endpoint: &DetailEndpoint,
    trains: &[TrainRef],
    throttle: &RequestThrottle,
) -> DetailReport {
    let mut report = DetailReport::default();
    for train in trains {
        throttle.wait().await;
        match lookup(client, endpoint, train).await {
            DetailOutcome::Found(payload) => report.details.push(payload),
            DetailOutcome::Failed(error) => report.errors.push(error),
        }
    }
    log::info!(
        "detail lookup finished: {} found, {} failed",
        report.details.len(),
        report.errors.len()
    );
    report
}

pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), CoreError> {
    let file = File::create(path)?;
    serde_json::to_writer_pretty(BufWriter::new(file), value)?;
    Ok(())
}

fn code_value(code: &str) -> Value {
    code.parse::<u64>()
        .map(Value::from)
        .unwrap_or_else(|_| Value::from(code))
}

fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(flag)) => *flag,
        Some(Value::String(text)) => !text.is_empty(),
        Some(Value::Number(number)) => number.as_f64().is_some_and(|n| n != 0.0),
        Some(Value::Array(items)) => !items.is_empty(),
        Some(Value::Object(fields)) => !fields.is_empty(),
    }
}
