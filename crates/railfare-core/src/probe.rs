//! One-time reachability check of the provider site.

use thiserror::Error;

use crate::fetcher::PROVIDER_HEADERS;
use crate::http_client::{HttpClient, HttpRequest};

pub const DEFAULT_PROBE_URL: &str = "https://www.rzd.ru/";

/// Informational only: a failed probe never blocks a run.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConnectivityFailure {
    #[error("probe of {url} returned status {status}")]
    Status { url: String, status: u16 },
    #[error("probe of {url} failed: {message}")]
    Transport { url: String, message: String },
}

pub async fn probe(client: &dyn HttpClient, url: &str, timeout_ms: u64) -> Result<(), ConnectivityFailure> {
    let request = HttpRequest::get(url)
        .with_headers(PROVIDER_HEADERS)
        .with_timeout_ms(timeout_ms);

    let response = client
        .execute(request)
        .await
        .map_err(|error| ConnectivityFailure::Transport {
            url: url.to_owned(),
            message: error.message().to_owned(),
        })?;

    if !response.is_ok() {
        return Err(ConnectivityFailure::Status {
            url: url.to_owned(),
            status: response.status,
        });
    }
    Ok(())
}
