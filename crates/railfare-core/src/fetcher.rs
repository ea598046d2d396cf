//! Fare fetcher: one pricing-endpoint call per harvest task.
//!
//! The fetcher turns every outcome into either a [`RawResponse`] or a
//! [`FetchFailure`]. Transport errors, timeouts, non-200 statuses, and
//! undecodable bodies are all failures; the scheduler logs and drops them.
//! A `310` error envelope becomes [`RawResponse::NoService`] carrying the
//! task's route and date.

use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde_json::Value;

use crate::domain::{departure_timestamp, ErrorInfo, NoServiceContext, PricedResponse, RawResponse};
use crate::http_client::{HttpClient, HttpError, HttpErrorKind, HttpRequest};
use crate::scheduler::HarvestTask;

pub const DEFAULT_PRICING_URL: &str =
    "https://ticket.rzd.ru/api/v1/railway-service/prices/train-pricing";

/// Environment variable overriding the provider host, e.g. for a staging mirror.
pub const API_BASE_ENV: &str = "RAILFARE_API_BASE";

const PRICING_PATH: &str = "/api/v1/railway-service/prices/train-pricing";

/// Browser-like header set the provider's same-origin policy expects.
pub const PROVIDER_HEADERS: [(&str, &str); 7] = [
    ("Accept", "application/json, text/plain, */*"),
    ("Accept-Language", "ru-RU,ru;q=0.8,en-US;q=0.5,en;q=0.3"),
    ("Origin", "https://ticket.rzd.ru"),
    ("Referer", "https://ticket.rzd.ru/"),
    ("Sec-Fetch-Site", "same-origin"),
    ("Sec-Fetch-Mode", "cors"),
    (
        "User-Agent",
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:144.0) Gecko/20100101 Firefox/144.0",
    ),
];

/// Fixed passenger/demand parameters sent with every pricing query.
const FIXED_PARAMS: [(&str, &str); 9] = [
    ("service_provider", "B2B_RZD"),
    ("getByLocalTime", "true"),
    ("carGrouping", "DontGroup"),
    ("specialPlacesDemand", "StandardPlacesAndForDisabledPersons"),
    ("carIssuingType", "Passenger"),
    ("getTrainsFromSchedule", "true"),
    ("adultPassengersQuantity", "1"),
    ("childrenPassengersQuantity", "0"),
    ("hasPlacesForLargeFamily", "false"),
];

/// Pricing endpoint location and per-request timeout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FareEndpoint {
    pub url: String,
    pub timeout_ms: u64,
}

impl Default for FareEndpoint {
    fn default() -> Self {
        Self {
            url: String::from(DEFAULT_PRICING_URL),
            timeout_ms: 10_000,
        }
    }
}

impl FareEndpoint {
    /// Default endpoint, with the host taken from `RAILFARE_API_BASE` when set.
    pub fn from_env() -> Self {
        match std::env::var(API_BASE_ENV) {
            Ok(base) if !base.trim().is_empty() => Self::with_base(&base),
            _ => Self::default(),
        }
    }

    pub fn with_base(base: &str) -> Self {
        Self {
            url: format!("{}{PRICING_PATH}", base.trim().trim_end_matches('/')),
            ..Self::default()
        }
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn request_for(&self, task: &HarvestTask) -> HttpRequest {
        let mut request = HttpRequest::get(&self.url)
            .with_headers(PROVIDER_HEADERS)
            .with_timeout_ms(self.timeout_ms);

        for (name, value) in FIXED_PARAMS {
            request = request.with_query(name, value);
        }

        request
            .with_query("origin", &task.route.origin_code)
            .with_query("destination", &task.route.destination_code)
            .with_query("departureDate", departure_timestamp(task.departure_date))
    }
}

/// Transport-class failure of a single task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchFailureKind {
    Transport,
    Timeout,
    Status,
    Decode,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchFailure {
    kind: FetchFailureKind,
    message: String,
}

impl FetchFailure {
    pub fn status(status: u16) -> Self {
        Self {
            kind: FetchFailureKind::Status,
            message: format!("upstream returned status {status}"),
        }
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self {
            kind: FetchFailureKind::Decode,
            message: message.into(),
        }
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self {
            kind: FetchFailureKind::Timeout,
            message: message.into(),
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            kind: FetchFailureKind::Transport,
            message: message.into(),
        }
    }

    pub const fn kind(&self) -> FetchFailureKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<HttpError> for FetchFailure {
    fn from(error: HttpError) -> Self {
        let kind = match error.kind() {
            HttpErrorKind::Timeout => FetchFailureKind::Timeout,
            HttpErrorKind::Connect | HttpErrorKind::Body | HttpErrorKind::Other => {
                FetchFailureKind::Transport
            }
        };
        Self {
            kind,
            message: error.message().to_owned(),
        }
    }
}

impl Display for FetchFailure {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for FetchFailure {}

/// Source of one raw response per harvest task.
pub trait FareSource: Send + Sync {
    fn fetch<'a>(
        &'a self,
        task: &'a HarvestTask,
    ) -> Pin<Box<dyn Future<Output = Result<RawResponse, FetchFailure>> + Send + 'a>>;
}

/// Pricing-endpoint fare source.
#[derive(Clone)]
pub struct FareFetcher {
    http_client: Arc<dyn HttpClient>,
    endpoint: FareEndpoint,
}

impl FareFetcher {
    pub fn new(http_client: Arc<dyn HttpClient>, endpoint: FareEndpoint) -> Self {
        Self {
            http_client,
            endpoint,
        }
    }

    pub fn endpoint(&self) -> &FareEndpoint {
        &self.endpoint
    }
}

impl FareSource for FareFetcher {
    fn fetch<'a>(
        &'a self,
        task: &'a HarvestTask,
    ) -> Pin<Box<dyn Future<Output = Result<RawResponse, FetchFailure>> + Send + 'a>> {
        Box::pin(async move {
            let request = self.endpoint.request_for(task);
            let response = self.http_client.execute(request).await?;
            log::debug!("status {} for {task}", response.status);

            if !response.is_ok() {
                return Err(FetchFailure::status(response.status));
            }

            decode_response(task, &response.body)
        })
    }
}

/// Classifies a 200 body into the three response variants.
///
/// Only a non-empty `errorInfo` object counts as an error envelope. A
/// non-310 error that still lists trains is kept as a priced response, with
/// the envelope preserved among its extra fields.
pub fn decode_response(task: &HarvestTask, body: &str) -> Result<RawResponse, FetchFailure> {
    let payload: Value = serde_json::from_str(body)
        .map_err(|error| FetchFailure::decode(format!("invalid JSON body: {error}")))?;

    if !payload.is_object() {
        return Err(FetchFailure::decode("response body is not a JSON object"));
    }

    let error_info = payload
        .get("errorInfo")
        .filter(|value| value.as_object().is_some_and(|fields| !fields.is_empty()));
    if let Some(error_info) = error_info {
        let error_info: ErrorInfo = serde_json::from_value(error_info.clone())
            .map_err(|error| FetchFailure::decode(format!("invalid errorInfo: {error}")))?;

        if error_info.is_no_service() {
            return Ok(RawResponse::NoService(NoServiceContext::new(
                &task.route,
                task.departure_date,
                error_info.message,
            )));
        }
        if !lists_trains(&payload) {
            return Ok(RawResponse::ProviderError(error_info));
        }
        log::warn!("{task}: errorInfo {:?} alongside a train listing", error_info.code);
    }

    let priced: PricedResponse = serde_json::from_value(payload)
        .map_err(|error| FetchFailure::decode(format!("invalid train listing: {error}")))?;
    Ok(RawResponse::Priced(priced))
}

fn lists_trains(payload: &Value) -> bool {
    payload
        .get("Trains")
        .and_then(Value::as_array)
        .is_some_and(|trains| !trains.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http_client::HttpResponse;
    use crate::domain::ErrorCode;
    use crate::RouteSpec;
    use std::sync::Mutex;
    use time::{Date, Month};

    #[derive(Debug)]
    struct RecordingHttpClient {
        response: Result<HttpResponse, HttpError>,
        requests: Mutex<Vec<HttpRequest>>,
    }

    impl RecordingHttpClient {
        fn replying(response: Result<HttpResponse, HttpError>) -> Self {
            Self {
                response,
                requests: Mutex::new(Vec::new()),
            }
        }

        fn recorded_requests(&self) -> Vec<HttpRequest> {
            self.requests
                .lock()
                .expect("request store should not be poisoned")
                .clone()
        }
    }

    impl HttpClient for RecordingHttpClient {
        fn execute<'a>(
            &'a self,
            request: HttpRequest,
        ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>> {
            self.requests
                .lock()
                .expect("request store should not be poisoned")
                .push(request);
            let response = self.response.clone();
            Box::pin(async move { response })
        }
    }

    fn task() -> HarvestTask {
        HarvestTask {
            route: RouteSpec::new("Москва", "Казань", "2000000", "2060500").expect("valid route"),
            departure_date: Date::from_calendar_date(2026, Month::October, 20).expect("valid"),
        }
    }

    #[tokio::test]
    async fn request_carries_fixed_params_route_codes_and_midnight_date() {
        let client = Arc::new(RecordingHttpClient::replying(Ok(HttpResponse::ok_json(
            r#"{"Trains": []}"#,
        ))));
        let fetcher = FareFetcher::new(client.clone(), FareEndpoint::default());

        let response = fetcher.fetch(&task()).await.expect("fetch should succeed");
        assert!(matches!(response, RawResponse::Priced(_)));

        let requests = client.recorded_requests();
        assert_eq!(requests.len(), 1);
        let request = &requests[0];
        assert_eq!(request.url, DEFAULT_PRICING_URL);
        assert_eq!(request.timeout_ms, 10_000);
        assert_eq!(request.query_value("origin"), Some("2000000"));
        assert_eq!(request.query_value("destination"), Some("2060500"));
        assert_eq!(request.query_value("departureDate"), Some("2026-10-20T00:00:00"));
        assert_eq!(request.query_value("service_provider"), Some("B2B_RZD"));
        assert_eq!(request.query_value("adultPassengersQuantity"), Some("1"));
        assert_eq!(
            request.headers.get("referer").map(String::as_str),
            Some("https://ticket.rzd.ru/")
        );
    }

    #[tokio::test]
    async fn non_200_status_is_a_status_failure() {
        let client = Arc::new(RecordingHttpClient::replying(Ok(HttpResponse::with_status(
            503, "busy",
        ))));
        let fetcher = FareFetcher::new(client, FareEndpoint::default());

        let failure = fetcher.fetch(&task()).await.expect_err("must fail");
        assert_eq!(failure.kind(), FetchFailureKind::Status);
        assert!(failure.message().contains("503"));
    }

    #[tokio::test]
    async fn transport_timeout_maps_to_timeout_failure() {
        let client = Arc::new(RecordingHttpClient::replying(Err(HttpError::timeout(
            "request timeout",
        ))));
        let fetcher = FareFetcher::new(client, FareEndpoint::default());

        let failure = fetcher.fetch(&task()).await.expect_err("must fail");
        assert_eq!(failure.kind(), FetchFailureKind::Timeout);
    }

    #[test]
    fn code_310_becomes_no_service_with_task_context() {
        let body = r#"{"errorInfo": {"Code": 310, "Message": "Поезда не курсируют"}}"#;

        let response = decode_response(&task(), body).expect("must decode");
        let RawResponse::NoService(context) = response else {
            panic!("expected no-service variant, got {response:?}");
        };
        assert_eq!(context.origin_code, "2000000");
        assert_eq!(context.destination_name, "Казань");
        assert_eq!(context.departure_date.to_string(), "2026-10-20");
        assert_eq!(context.message.as_deref(), Some("Поезда не курсируют"));
    }

    #[test]
    fn other_error_codes_pass_through() {
        let body = r#"{"errorInfo": {"Code": 5, "Message": "Ошибка", "Extra": 1}}"#;

        let response = decode_response(&task(), body).expect("must decode");
        let RawResponse::ProviderError(info) = response else {
            panic!("expected provider error, got {response:?}");
        };
        assert_eq!(info.code, Some(ErrorCode::Number(5)));
        assert_eq!(info.extra.get("Extra"), Some(&serde_json::json!(1)));
    }

    #[test]
    fn undecodable_body_is_a_decode_failure() {
        let failure = decode_response(&task(), "<html>").expect_err("must fail");
        assert_eq!(failure.kind(), FetchFailureKind::Decode);

        let failure = decode_response(&task(), "[]").expect_err("must fail");
        assert_eq!(failure.kind(), FetchFailureKind::Decode);
    }

    #[test]
    fn empty_error_envelope_is_ignored() {
        let body = r#"{"errorInfo": {}, "Trains": [{"TrainNumber": "002А", "CarGroups": [{"Carriers": ["ФПК"]}]}]}"#;

        let response = decode_response(&task(), body).expect("must decode");
        let RawResponse::Priced(priced) = response else {
            panic!("expected priced variant, got {response:?}");
        };
        assert_eq!(priced.trains.len(), 1);

        let response = decode_response(&task(), r#"{"errorInfo": "", "Trains": []}"#)
            .expect("must decode");
        assert!(matches!(response, RawResponse::Priced(_)));
    }

    #[test]
    fn string_code_310_becomes_no_service() {
        let body = r#"{"errorInfo": {"Code": "310"}}"#;

        let response = decode_response(&task(), body).expect("must decode");
        assert!(matches!(response, RawResponse::NoService(_)));
    }

    #[test]
    fn non_numeric_code_is_kept_as_provider_error() {
        let body = r#"{"errorInfo": {"Code": "E_BUSY", "Message": {"ru": "Занято"}}}"#;

        let response = decode_response(&task(), body).expect("must decode");
        let RawResponse::ProviderError(info) = response else {
            panic!("expected provider error, got {response:?}");
        };
        assert_eq!(info.code, Some(ErrorCode::Text(String::from("E_BUSY"))));
        assert!(info.message.as_deref().is_some_and(|message| message.contains("Занято")));
    }

    #[test]
    fn error_alongside_trains_keeps_the_listing() {
        let body = r#"{"errorInfo": {"Code": 7}, "Trains": [{"TrainNumber": "002А"}]}"#;

        let response = decode_response(&task(), body).expect("must decode");
        let RawResponse::Priced(priced) = response else {
            panic!("expected priced variant, got {response:?}");
        };
        assert_eq!(priced.trains.len(), 1);
        assert_eq!(priced.extra.get("errorInfo"), Some(&serde_json::json!({"Code": 7})));
    }

    #[test]
    fn endpoint_base_override_keeps_pricing_path() {
        let endpoint = FareEndpoint::with_base("http://127.0.0.1:8080/").with_timeout_ms(500);
        assert_eq!(
            endpoint.url,
            "http://127.0.0.1:8080/api/v1/railway-service/prices/train-pricing"
        );
        assert_eq!(endpoint.timeout_ms, 500);
    }

    #[test]
    fn endpoint_host_comes_from_the_environment() {
        std::env::set_var(API_BASE_ENV, "http://127.0.0.1:9/");
        let overridden = FareEndpoint::from_env();
        std::env::set_var(API_BASE_ENV, "  ");
        let blank = FareEndpoint::from_env();
        std::env::remove_var(API_BASE_ENV);

        assert_eq!(
            overridden.url,
            "http://127.0.0.1:9/api/v1/railway-service/prices/train-pricing"
        );
        assert_eq!(blank, FareEndpoint::default());
        assert_eq!(FareEndpoint::from_env().url, DEFAULT_PRICING_URL);
    }
}
