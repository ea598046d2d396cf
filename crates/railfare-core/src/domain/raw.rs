use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use time::Date;

use super::iso_date;
use super::lenient::{null_as_default, optional_code, optional_text};
use crate::RouteSpec;

/// `errorInfo.Code` the pricing endpoint returns when no train runs on the date.
pub const NO_SERVICE_CODE: i64 = 310;

/// One pricing-endpoint outcome for a single (route, date) task.
///
/// Persisted as an internally tagged object (`"kind": "priced" | "no_service" |
/// "provider_error"`) so the raw document can be streamed back without any
/// side-channel correlation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RawResponse {
    Priced(PricedResponse),
    NoService(NoServiceContext),
    ProviderError(ErrorInfo),
}

impl RawResponse {
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Priced(_) => "priced",
            Self::NoService(_) => "no_service",
            Self::ProviderError(_) => "provider_error",
        }
    }
}

/// Train listing plus the route-level station envelope.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PricedResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    pub origin_station_info: StationInfo,
    #[serde(default, deserialize_with = "null_as_default")]
    pub destination_station_info: StationInfo,
    #[serde(default, deserialize_with = "null_as_default")]
    pub trains: Vec<TrainEntry>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StationInfo {
    #[serde(default)]
    pub station_name: Option<String>,
    #[serde(default, deserialize_with = "optional_code")]
    pub station_code: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TrainEntry {
    #[serde(default)]
    pub train_number: Option<String>,
    #[serde(default)]
    pub departure_date_time: Option<String>,
    #[serde(default)]
    pub arrival_date_time: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub origin_station_info: StationInfo,
    #[serde(default, deserialize_with = "null_as_default")]
    pub destination_station_info: StationInfo,
    #[serde(default)]
    pub initial_station_name: Option<String>,
    #[serde(default)]
    pub final_station_name: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub initial_train_station_info: StationInfo,
    #[serde(default, deserialize_with = "null_as_default")]
    pub final_train_station_info: StationInfo,
    #[serde(default)]
    pub train_description: Option<String>,
    #[serde(default)]
    pub train_brand_code: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub car_groups: Vec<CarGroup>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Fare class / carrier grouping inside a train entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CarGroup {
    #[serde(default)]
    pub car_type_name: Option<String>,
    #[serde(default)]
    pub min_price: Option<f64>,
    #[serde(default)]
    pub max_price: Option<f64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub service_costs: Vec<f64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub service_classes: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub carriers: Vec<String>,
    #[serde(default)]
    pub has_non_refundable_tariff: Option<bool>,
    #[serde(default)]
    pub has_places_for_disabled_persons: Option<bool>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CarGroup {
    pub fn first_carrier(&self) -> Option<&str> {
        self.carriers.first().map(String::as_str)
    }
}

/// Route/date context for a date with no scheduled service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoServiceContext {
    #[serde(with = "iso_date")]
    pub departure_date: Date,
    pub origin_name: String,
    pub destination_name: String,
    pub origin_code: String,
    pub destination_code: String,
    #[serde(default)]
    pub message: Option<String>,
}

impl NoServiceContext {
    pub fn new(route: &RouteSpec, departure_date: Date, message: Option<String>) -> Self {
        Self {
            departure_date,
            origin_name: route.origin_name.clone(),
            destination_name: route.destination_name.clone(),
            origin_code: route.origin_code.clone(),
            destination_code: route.destination_code.clone(),
            message,
        }
    }
}

/// Provider `errorInfo` envelope; unknown fields are kept verbatim.
///
/// Decoding accepts any JSON object: codes may be numbers or strings, and a
/// non-string message is kept as its JSON text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ErrorInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<ErrorCode>,
    #[serde(
        default,
        deserialize_with = "optional_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub message: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ErrorInfo {
    pub fn is_no_service(&self) -> bool {
        self.code.as_ref().and_then(ErrorCode::as_i64) == Some(NO_SERVICE_CODE)
    }
}

/// `errorInfo.Code` exactly as the provider sent it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ErrorCode {
    Number(i64),
    Text(String),
    Other(Value),
}

impl ErrorCode {
    /// Numeric value, when the code is an integer, a numeric string, or an
    /// integral float.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Number(code) => Some(*code),
            Self::Text(text) => text.trim().parse().ok(),
            Self::Other(value) => value
                .as_f64()
                .filter(|code| code.fract() == 0.0)
                .map(|code| code as i64),
        }
    }
}

impl From<i64> for ErrorCode {
    fn from(code: i64) -> Self {
        Self::Number(code)
    }
}
