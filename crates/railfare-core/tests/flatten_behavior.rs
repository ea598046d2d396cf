//! Behavior-driven tests for flattening raw documents
//!
//! These tests feed persisted raw documents through the flattener and check
//! the carrier filter, sentinel rows, and determinism.

use railfare_core::policy::{NATIONAL_CARRIER, NO_SERVICE_LABEL};
use railfare_core::{flatten_reader, CoreError, FlattenPolicy};
use time::{Date, Month};

const RAW_DOCUMENT: &str = r#"[
  {
    "kind": "priced",
    "OriginStationInfo": { "StationName": "МОСКВА", "StationCode": 2000000 },
    "DestinationStationInfo": { "StationName": "КАЗАНЬ", "StationCode": "2060500" },
    "Id": 17,
    "Trains": [
      {
        "TrainNumber": "112",
        "DepartureDateTime": "2026-10-22T08:10:00",
        "CarGroups": [
          { "CarTypeName": "ПЛАЦ", "MinPrice": 900.5, "MaxPrice": 1100.0, "Carriers": ["ДОСС"] },
          { "CarTypeName": "КУПЕ", "MinPrice": 1500.0, "MaxPrice": 4200.0, "Carriers": ["ФПК"] },
          { "CarTypeName": "СВ", "MinPrice": 7000.0, "MaxPrice": 9000.0, "Carriers": [] }
        ]
      },
      {
        "TrainNumber": "004",
        "DepartureDateTime": null,
        "CarGroups": [
          { "CarTypeName": "КУПЕ", "MinPrice": 1.0, "MaxPrice": 2.0, "Carriers": ["ФПК"] }
        ]
      }
    ]
  },
  {
    "kind": "no_service",
    "departure_date": "2026-10-20",
    "origin_name": "Москва",
    "destination_name": "Казань",
    "origin_code": "2000000",
    "destination_code": "2060500",
    "message": "Поезда не курсируют"
  },
  {
    "kind": "provider_error",
    "Code": 5,
    "Message": "Внутренняя ошибка"
  }
]"#;

fn search_date() -> Date {
    Date::from_calendar_date(2026, Month::October, 19).expect("valid date")
}

// =============================================================================
// Flatten: Carrier Filter
// =============================================================================

#[test]
fn when_car_groups_have_foreign_or_missing_carriers_system_keeps_only_allowed_ones() {
    // Given: A raw document mixing carriers
    let policy = FlattenPolicy::default();

    // When: The system flattens it
    let (records, stats) =
        flatten_reader(RAW_DOCUMENT.as_bytes(), &policy, search_date()).expect("valid document");

    // Then: Only national-carrier rows and the sentinel row remain
    assert!(records
        .iter()
        .all(|record| matches!(record.carrier.as_deref(), Some(NATIONAL_CARRIER) | Some(NO_SERVICE_LABEL))));
    assert!(records
        .iter()
        .any(|record| record.carrier.as_deref() == Some(NATIONAL_CARRIER)));
    assert_eq!(stats.filtered_car_groups, 2);
    assert_eq!(stats.kept_car_groups, 1);
}

#[test]
fn when_allow_list_is_widened_system_keeps_the_extra_carrier() {
    // Given: A policy that also allows a second carrier
    let mut policy = FlattenPolicy::default();
    policy.carrier_allow_list.push(String::from("ДОСС"));

    // When: The system flattens the same document
    let (records, _) =
        flatten_reader(RAW_DOCUMENT.as_bytes(), &policy, search_date()).expect("valid document");

    // Then: The second carrier's row appears with its price truncated
    let doss = records
        .iter()
        .find(|record| record.carrier.as_deref() == Some("ДОСС"))
        .expect("ДОСС row kept");
    assert_eq!(doss.min_price, 900);
}

// =============================================================================
// Flatten: Sentinel and Skipped Inputs
// =============================================================================

#[test]
fn when_document_has_no_service_and_provider_errors_system_emits_one_sentinel_only() {
    // Given: A document with one no-service and one provider error entry
    let policy = FlattenPolicy::default();

    // When: The system flattens it
    let (records, stats) =
        flatten_reader(RAW_DOCUMENT.as_bytes(), &policy, search_date()).expect("valid document");

    // Then: Exactly one sentinel row, none for the provider error or the undated train
    let sentinels = records
        .iter()
        .filter(|record| record.train_number == NO_SERVICE_LABEL)
        .collect::<Vec<_>>();
    assert_eq!(sentinels.len(), 1);
    assert_eq!(sentinels[0].min_price, 3_000_000);
    assert_eq!(sentinels[0].max_price, 3_000_000);
    assert_eq!(sentinels[0].service_cost, Some(0));
    assert_eq!(sentinels[0].departure_date.to_string(), "2026-10-20");

    assert_eq!(stats.responses, 3);
    assert_eq!(stats.provider_errors, 1);
    assert_eq!(stats.skipped_trains, 1);
    assert_eq!(records.len(), 2);
    assert!(records.iter().all(|record| record.date_search == search_date()));
}

// =============================================================================
// Flatten: Determinism and Malformed Input
// =============================================================================

#[test]
fn when_the_same_bytes_are_flattened_twice_system_yields_identical_records() {
    // Given: One document and one policy
    let policy = FlattenPolicy::default();

    // When: The system flattens the bytes twice
    let first = flatten_reader(RAW_DOCUMENT.as_bytes(), &policy, search_date()).expect("first");
    let second = flatten_reader(RAW_DOCUMENT.as_bytes(), &policy, search_date()).expect("second");

    // Then: Records and counters match exactly
    assert_eq!(first, second);
}

#[test]
fn when_the_document_is_truncated_system_returns_a_serialization_error() {
    // Given: A document cut off mid-array
    let truncated = &RAW_DOCUMENT.as_bytes()[..RAW_DOCUMENT.len() / 2];

    // When: The system flattens it
    let result = flatten_reader(truncated, &FlattenPolicy::default(), search_date());

    // Then: The failure is fatal and typed
    assert!(matches!(result, Err(CoreError::Serialization(_))));
}

#[test]
fn when_allow_list_is_empty_system_rejects_the_policy() {
    // Given: A policy without any allowed carrier
    let policy = FlattenPolicy {
        carrier_allow_list: Vec::new(),
        ..FlattenPolicy::default()
    };

    // When: The system flattens
    let result = flatten_reader(RAW_DOCUMENT.as_bytes(), &policy, search_date());

    // Then: Validation fails
    assert!(matches!(result, Err(CoreError::Validation(_))));
}
