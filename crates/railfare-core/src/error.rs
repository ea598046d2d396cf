use thiserror::Error;

/// Validation and contract errors exposed by `railfare-core`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("station code cannot be empty (route '{origin}' -> '{destination}')")]
    EmptyStationCode { origin: String, destination: String },
    #[error("station name cannot be empty for code '{code}'")]
    EmptyStationName { code: String },

    #[error("window must cover at least one day")]
    EmptyWindow,
    #[error("weekday set cannot be empty")]
    EmptyWeekdaySet,
    #[error("invalid weekday '{value}', expected one of mon, tue, wed, thu, fri, sat, sun")]
    InvalidWeekday { value: String },
    #[error("date must be formatted as YYYY-MM-DD: '{value}'")]
    InvalidDate { value: String },
    #[error("utc offset of {hours}h is out of range")]
    InvalidUtcOffset { hours: i8 },

    #[error("max_concurrency must be greater than zero")]
    ZeroConcurrency,
    #[error("jitter range is inverted: min {min_ms}ms > max {max_ms}ms")]
    InvertedJitter { min_ms: u64, max_ms: u64 },
    #[error("quota limit must be greater than zero")]
    ZeroQuota,

    #[error("carrier allow-list cannot be empty")]
    EmptyCarrierAllowList,
}

/// Top-level error type for fatal pipeline conditions.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("route list is empty")]
    EmptyRouteList,

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("workbook read error: {0}")]
    Workbook(#[from] calamine::Error),

    #[error("workbook write error: {0}")]
    Spreadsheet(#[from] rust_xlsxwriter::XlsxError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
