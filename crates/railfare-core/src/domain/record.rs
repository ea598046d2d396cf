use serde::{Deserialize, Serialize};
use time::Date;

use super::iso_date;

/// Normalized report row: one per (train, kept car group) or one per
/// no-service date. Field order is the report column order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlatRecord {
    #[serde(with = "iso_date")]
    pub date_search: Date,
    #[serde(rename = "DepartureDateTime", with = "iso_date")]
    pub departure_date: Date,
    #[serde(rename = "TrainNumber")]
    pub train_number: String,
    #[serde(rename = "OriginName")]
    pub origin_name: Option<String>,
    #[serde(rename = "DestinationName")]
    pub destination_name: Option<String>,
    #[serde(rename = "OriginStationCode")]
    pub origin_station_code: Option<String>,
    #[serde(rename = "DestinationStationCode")]
    pub destination_station_code: Option<String>,
    #[serde(rename = "CarTypeName")]
    pub car_type_name: String,
    #[serde(rename = "MinPrice")]
    pub min_price: i64,
    #[serde(rename = "MaxPrice")]
    pub max_price: i64,
    #[serde(rename = "ServiceCosts")]
    pub service_cost: Option<i64>,
    #[serde(rename = "ServiceClasses")]
    pub service_class: Option<String>,
    #[serde(rename = "Carriers")]
    pub carrier: Option<String>,
    #[serde(rename = "HasNonRefundableTariff")]
    pub has_non_refundable_tariff: bool,
    #[serde(rename = "HasPlacesForDisabledPersons")]
    pub has_places_for_disabled_persons: bool,
    #[serde(rename = "InitialStationName")]
    pub initial_station_name: Option<String>,
    #[serde(rename = "FinalStationName")]
    pub final_station_name: Option<String>,
    #[serde(rename = "InitialTrainStationInfo")]
    pub initial_station_code: Option<String>,
    #[serde(rename = "FinalTrainStationInfo")]
    pub final_station_code: Option<String>,
    #[serde(rename = "TrainDescription")]
    pub train_description: String,
    #[serde(rename = "TrainBrandCode")]
    pub train_brand_code: String,
}

impl FlatRecord {
    /// Report column names in output order.
    pub const COLUMNS: [&'static str; 21] = [
        "date_search",
        "DepartureDateTime",
        "TrainNumber",
        "OriginName",
        "DestinationName",
        "OriginStationCode",
        "DestinationStationCode",
        "CarTypeName",
        "MinPrice",
        "MaxPrice",
        "ServiceCosts",
        "ServiceClasses",
        "Carriers",
        "HasNonRefundableTariff",
        "HasPlacesForDisabledPersons",
        "InitialStationName",
        "FinalStationName",
        "InitialTrainStationInfo",
        "FinalTrainStationInfo",
        "TrainDescription",
        "TrainBrandCode",
    ];

    pub fn sort_key(&self) -> (Date, &str) {
        (self.departure_date, self.train_number.as_str())
    }
}
