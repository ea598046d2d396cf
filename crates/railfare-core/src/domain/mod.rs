//! Domain records for the harvest pipeline.
//!
//! | Type | Stage |
//! |------|-------|
//! | [`RouteSpec`] | input, one per routes-file row |
//! | [`RawResponse`] | fetch output, persisted in the raw document |
//! | [`FlatRecord`] | flatten output, one report row |

pub mod date;
mod lenient;
pub mod raw;
pub mod record;
pub mod route;

pub use date::{
    date_part, departure_timestamp, parse_iso_date, parse_weekday, parse_weekdays,
    today_at_offset,
};
pub use raw::{
    CarGroup, ErrorCode, ErrorInfo, NoServiceContext, PricedResponse, RawResponse, StationInfo,
    TrainEntry, NO_SERVICE_CODE,
};
pub use record::FlatRecord;
pub use route::RouteSpec;

time::serde::format_description!(pub(crate) iso_date, Date, "[year]-[month]-[day]");
