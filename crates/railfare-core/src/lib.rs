//! # Railfare Core
//!
//! Harvest pipeline for rail-fare availability snapshots.
//!
//! ## Overview
//!
//! A run expands a route list into (route, departure date) tasks, fetches
//! each task from the provider with bounded concurrency, persists every
//! response in a raw JSON document, and flattens that document into sorted
//! report rows.
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`details`] | Per-train car-pricing lookups |
//! | [`domain`] | Routes, raw responses, and flat records |
//! | [`error`] | Core error types |
//! | [`fetcher`] | Provider request building and response classification |
//! | [`flatten`] | Raw response to report row projection |
//! | [`http_client`] | HTTP client abstraction |
//! | [`policy`] | Concurrency, jitter, quota, and flatten policies |
//! | [`probe`] | Provider reachability check |
//! | [`raw_store`] | Raw document persistence |
//! | [`report`] | Sorted workbook or CSV report export |
//! | [`routes`] | Routes workbook or CSV loading |
//! | [`scheduler`] | Task planning and concurrent dispatch |
//! | [`throttling`] | Jitter and quota gate |

pub mod details;
pub mod domain;
pub mod error;
pub mod fetcher;
pub mod flatten;
pub mod http_client;
pub mod policy;
pub mod probe;
pub mod raw_store;
pub mod report;
pub mod routes;
pub mod scheduler;
pub mod throttling;

pub use details::{
    lookup_all, train_refs, DetailEndpoint, DetailError, DetailOutcome, DetailReport, TrainRef,
};
pub use domain::{FlatRecord, RawResponse, RouteSpec};
pub use error::{CoreError, ValidationError};
pub use fetcher::{FareEndpoint, FareFetcher, FareSource, FetchFailure, FetchFailureKind};
pub use flatten::{flatten_document, flatten_reader, flatten_response, FlattenStats, Flattener};
pub use http_client::{
    HttpClient, HttpError, HttpErrorKind, HttpMethod, HttpRequest, HttpResponse,
    ReqwestHttpClient,
};
pub use policy::{FlattenPolicy, HarvestPolicy, JitterPolicy, QuotaPolicy};
pub use probe::{probe, ConnectivityFailure};
pub use raw_store::{read_raw_document, write_raw_document};
pub use report::{sort_records, write_report, write_workbook, ReportFormat, ReportOptions};
pub use routes::read_routes;
pub use scheduler::{harvest, plan_tasks, HarvestOutcome, HarvestTask};
pub use throttling::RequestThrottle;
