//! Projection of raw responses into flat report records.

use std::io::Read;
use std::path::Path;

use time::Date;

use crate::domain::{
    date_part, parse_iso_date, CarGroup, FlatRecord, NoServiceContext, PricedResponse,
    RawResponse, TrainEntry,
};
use crate::policy::FlattenPolicy;
use crate::raw_store::{read_raw_document, read_raw_document_from};
use crate::CoreError;

/// Per-run counters reported after flattening.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlattenStats {
    pub responses: usize,
    pub no_service: usize,
    pub provider_errors: usize,
    pub kept_car_groups: usize,
    pub filtered_car_groups: usize,
    pub skipped_trains: usize,
}

/// Stateful flattener: applies one policy and one `date_search` stamp to a
/// sequence of responses, accumulating records and counters.
#[derive(Debug)]
pub struct Flattener<'p> {
    policy: &'p FlattenPolicy,
    search_date: Date,
    records: Vec<FlatRecord>,
    stats: FlattenStats,
}

impl<'p> Flattener<'p> {
    pub fn new(policy: &'p FlattenPolicy, search_date: Date) -> Self {
        Self {
            policy,
            search_date,
            records: Vec::new(),
            stats: FlattenStats::default(),
        }
    }

    pub fn push(&mut self, response: &RawResponse) {
        self.stats.responses += 1;
        match response {
            RawResponse::Priced(priced) => self.push_priced(priced),
            RawResponse::NoService(context) => {
                self.stats.no_service += 1;
                let record = self.no_service_record(context);
                self.records.push(record);
            }
            RawResponse::ProviderError(info) => {
                self.stats.provider_errors += 1;
                log::debug!(
                    "skipping provider error {:?}: {}",
                    info.code,
                    info.message.as_deref().unwrap_or("")
                );
            }
        }
    }

    pub fn stats(&self) -> FlattenStats {
        self.stats
    }

    pub fn finish(self) -> (Vec<FlatRecord>, FlattenStats) {
        (self.records, self.stats)
    }

    fn push_priced(&mut self, priced: &PricedResponse) {
        for train in &priced.trains {
            let Some(departure_date) = train_departure_date(train) else {
                log::warn!(
                    "skipping train {:?}: missing or malformed DepartureDateTime {:?}",
                    train.train_number,
                    train.departure_date_time
                );
                self.stats.skipped_trains += 1;
                continue;
            };

            for car in &train.car_groups {
                if !self.policy.allows_carrier(car.first_carrier()) {
                    self.stats.filtered_car_groups += 1;
                    continue;
                }
                self.stats.kept_car_groups += 1;
                let record = self.priced_record(priced, train, car, departure_date);
                self.records.push(record);
            }
        }
    }

    fn priced_record(
        &self,
        priced: &PricedResponse,
        train: &TrainEntry,
        car: &CarGroup,
        departure_date: Date,
    ) -> FlatRecord {
        FlatRecord {
            date_search: self.search_date,
            departure_date,
            train_number: train.train_number.clone().unwrap_or_default(),
            origin_name: priced.origin_station_info.station_name.clone(),
            destination_name: priced.destination_station_info.station_name.clone(),
            origin_station_code: priced.origin_station_info.station_code.clone(),
            destination_station_code: priced.destination_station_info.station_code.clone(),
            car_type_name: car.car_type_name.clone().unwrap_or_default(),
            min_price: car.min_price.map_or(0, truncate_price),
            max_price: car.max_price.map_or(0, truncate_price),
            service_cost: car.service_costs.first().copied().map(truncate_price),
            service_class: car.service_classes.first().cloned(),
            carrier: car.carriers.first().cloned(),
            has_non_refundable_tariff: car.has_non_refundable_tariff.unwrap_or(false),
            has_places_for_disabled_persons: car.has_places_for_disabled_persons.unwrap_or(false),
            initial_station_name: train.initial_station_name.clone(),
            final_station_name: train.final_station_name.clone(),
            initial_station_code: train.initial_train_station_info.station_code.clone(),
            final_station_code: train.final_train_station_info.station_code.clone(),
            train_description: train.train_description.clone().unwrap_or_default(),
            train_brand_code: train.train_brand_code.clone().unwrap_or_default(),
        }
    }

    fn no_service_record(&self, context: &NoServiceContext) -> FlatRecord {
        let label = &self.policy.no_service_label;
        FlatRecord {
            date_search: self.search_date,
            departure_date: context.departure_date,
            train_number: label.clone(),
            origin_name: Some(context.origin_name.clone()),
            destination_name: Some(context.destination_name.clone()),
            origin_station_code: Some(context.origin_code.clone()),
            destination_station_code: Some(context.destination_code.clone()),
            car_type_name: label.clone(),
            min_price: self.policy.no_service_price,
            max_price: self.policy.no_service_price,
            service_cost: Some(self.policy.no_service_cost),
            service_class: Some(label.clone()),
            carrier: Some(label.clone()),
            has_non_refundable_tariff: false,
            has_places_for_disabled_persons: false,
            initial_station_name: None,
            final_station_name: None,
            initial_station_code: None,
            final_station_code: None,
            train_description: label.clone(),
            train_brand_code: label.clone(),
        }
    }
}

/// Records for a single response.
pub fn flatten_response(
    response: &RawResponse,
    policy: &FlattenPolicy,
    search_date: Date,
) -> Vec<FlatRecord> {
    let mut flattener = Flattener::new(policy, search_date);
    flattener.push(response);
    flattener.finish().0
}

/// Streams a raw document from `reader` through a [`Flattener`].
pub fn flatten_reader<R: Read>(
    reader: R,
    policy: &FlattenPolicy,
    search_date: Date,
) -> Result<(Vec<FlatRecord>, FlattenStats), CoreError> {
    policy.validate()?;
    let mut flattener = Flattener::new(policy, search_date);
    read_raw_document_from(reader, |response| flattener.push(&response))?;
    Ok(finish_logged(flattener))
}

pub fn flatten_document(
    path: &Path,
    policy: &FlattenPolicy,
    search_date: Date,
) -> Result<(Vec<FlatRecord>, FlattenStats), CoreError> {
    policy.validate()?;
    let mut flattener = Flattener::new(policy, search_date);
    read_raw_document(path, |response| flattener.push(&response))?;
    Ok(finish_logged(flattener))
}

fn finish_logged(flattener: Flattener<'_>) -> (Vec<FlatRecord>, FlattenStats) {
    let (records, stats) = flattener.finish();
    log::info!(
        "flattened {} responses into {} records ({} no-service, {} car groups filtered, {} trains skipped)",
        stats.responses,
        records.len(),
        stats.no_service,
        stats.filtered_car_groups,
        stats.skipped_trains
    );
    (records, stats)
}

fn train_departure_date(train: &TrainEntry) -> Option<Date> {
    let timestamp = train.departure_date_time.as_deref()?;
    parse_iso_date(date_part(timestamp)).ok()
}

// Provider prices are decimal roubles; the report keeps whole roubles.
fn truncate_price(value: f64) -> i64 {
    value.trunc() as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::NO_SERVICE_LABEL;
    use crate::RouteSpec;
    use serde_json::json;
    use time::Month;

    fn search_date() -> Date {
        Date::from_calendar_date(2026, Month::October, 19).expect("valid")
    }

    fn priced(payload: serde_json::Value) -> RawResponse {
        RawResponse::Priced(serde_json::from_value(payload).expect("valid payload"))
    }

    #[test]
    fn priced_car_group_takes_route_level_stations_and_first_list_items() {
        let response = priced(json!({
            "OriginStationInfo": { "StationName": "МОСКВА", "StationCode": "2000000" },
            "DestinationStationInfo": { "StationName": "КАЗАНЬ", "StationCode": "2060500" },
            "Trains": [{
                "TrainNumber": "002Й",
                "DepartureDateTime": "2026-10-20T23:30:00",
                "OriginStationInfo": { "StationName": "МОСКВА КАЗАНСКАЯ", "StationCode": "2000003" },
                "InitialStationName": "МОСКВА",
                "FinalStationName": "КАЗАНЬ",
                "InitialTrainStationInfo": { "StationCode": "2000003" },
                "FinalTrainStationInfo": { "StationCode": "2060615" },
                "TrainDescription": "СК ФИРМ",
                "TrainBrandCode": "Премиум",
                "CarGroups": [{
                    "CarTypeName": "КУПЕ",
                    "MinPrice": 1500.9,
                    "MaxPrice": 4200.0,
                    "ServiceCosts": [350.4, 500.0],
                    "ServiceClasses": ["2К", "2У"],
                    "Carriers": ["ФПК", "ДОСС"],
                    "HasNonRefundableTariff": true,
                    "HasPlacesForDisabledPersons": false
                }]
            }]
        }));

        let records = flatten_response(&response, &FlattenPolicy::default(), search_date());
        assert_eq!(records.len(), 1);

        let record = &records[0];
        assert_eq!(record.date_search, search_date());
        assert_eq!(record.departure_date.to_string(), "2026-10-20");
        assert_eq!(record.train_number, "002Й");
        assert_eq!(record.origin_name.as_deref(), Some("МОСКВА"));
        assert_eq!(record.origin_station_code.as_deref(), Some("2000000"));
        assert_eq!(record.min_price, 1500);
        assert_eq!(record.max_price, 4200);
        assert_eq!(record.service_cost, Some(350));
        assert_eq!(record.service_class.as_deref(), Some("2К"));
        assert_eq!(record.carrier.as_deref(), Some("ФПК"));
        assert!(record.has_non_refundable_tariff);
        assert_eq!(record.final_station_code.as_deref(), Some("2060615"));
        assert_eq!(record.train_brand_code, "Премиум");
    }

    #[test]
    fn missing_fields_fall_back_to_empty_defaults() {
        let response = priced(json!({
            "Trains": [{
                "DepartureDateTime": "2026-10-22T06:00:00",
                "CarGroups": [{ "Carriers": ["ФПК"] }]
            }]
        }));

        let records = flatten_response(&response, &FlattenPolicy::default(), search_date());
        let record = &records[0];
        assert_eq!(record.train_number, "");
        assert_eq!(record.car_type_name, "");
        assert_eq!(record.min_price, 0);
        assert_eq!(record.max_price, 0);
        assert_eq!(record.service_cost, None);
        assert_eq!(record.service_class, None);
        assert!(!record.has_places_for_disabled_persons);
        assert_eq!(record.origin_name, None);
        assert_eq!(record.train_description, "");
    }

    #[test]
    fn train_without_departure_timestamp_is_skipped() {
        let response = priced(json!({
            "Trains": [
                { "TrainNumber": "100", "CarGroups": [{ "Carriers": ["ФПК"] }] },
                { "TrainNumber": "102", "DepartureDateTime": "garbage", "CarGroups": [{ "Carriers": ["ФПК"] }] }
            ]
        }));

        let policy = FlattenPolicy::default();
        let mut flattener = Flattener::new(&policy, search_date());
        flattener.push(&response);
        assert_eq!(flattener.stats().responses, 1);
        let (records, stats) = flattener.finish();

        assert!(records.is_empty());
        assert_eq!(stats.skipped_trains, 2);
    }

    #[test]
    fn no_service_record_uses_sentinels_and_route_context() {
        let route = RouteSpec::new("Москва", "Казань", "2000000", "2060500").expect("valid");
        let date = Date::from_calendar_date(2026, Month::October, 22).expect("valid");
        let response = RawResponse::NoService(NoServiceContext::new(&route, date, None));

        let records = flatten_response(&response, &FlattenPolicy::default(), search_date());
        assert_eq!(records.len(), 1);

        let record = &records[0];
        assert_eq!(record.departure_date, date);
        assert_eq!(record.train_number, NO_SERVICE_LABEL);
        assert_eq!(record.car_type_name, NO_SERVICE_LABEL);
        assert_eq!(record.train_description, NO_SERVICE_LABEL);
        assert_eq!(record.train_brand_code, NO_SERVICE_LABEL);
        assert_eq!(record.carrier.as_deref(), Some(NO_SERVICE_LABEL));
        assert_eq!(record.min_price, 3_000_000);
        assert_eq!(record.max_price, 3_000_000);
        assert_eq!(record.service_cost, Some(0));
        assert_eq!(record.origin_name.as_deref(), Some("Москва"));
        assert_eq!(record.destination_station_code.as_deref(), Some("2060500"));
        assert_eq!(record.initial_station_name, None);
    }

    #[test]
    fn sentinel_values_follow_policy() {
        let policy = FlattenPolicy {
            no_service_label: String::from("no service"),
            no_service_price: 9_999,
            ..FlattenPolicy::default()
        };
        let route = RouteSpec::new("A", "B", "1", "2").expect("valid");
        let date = Date::from_calendar_date(2026, Month::October, 22).expect("valid");

        let records = flatten_response(
            &RawResponse::NoService(NoServiceContext::new(&route, date, None)),
            &policy,
            search_date(),
        );
        assert_eq!(records[0].train_number, "no service");
        assert_eq!(records[0].max_price, 9_999);
    }

    #[test]
    fn provider_errors_produce_no_records() {
        let response = RawResponse::ProviderError(crate::domain::ErrorInfo::default());
        assert!(flatten_response(&response, &FlattenPolicy::default(), search_date()).is_empty());
    }
}
