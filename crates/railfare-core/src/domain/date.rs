use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::{Date, OffsetDateTime, UtcOffset, Weekday};

use crate::ValidationError;

const ISO_DATE: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");

pub fn parse_iso_date(input: &str) -> Result<Date, ValidationError> {
    Date::parse(input.trim(), ISO_DATE).map_err(|_| ValidationError::InvalidDate {
        value: input.to_owned(),
    })
}

/// Provider `departureDate` parameter: the ISO date at local midnight.
pub fn departure_timestamp(date: Date) -> String {
    format!("{date}T00:00:00")
}

/// Date component of a provider timestamp such as `2026-10-20T08:15:00`.
pub fn date_part(timestamp: &str) -> &str {
    timestamp
        .split_once('T')
        .map_or(timestamp, |(date, _)| date)
        .trim()
}

/// Calendar date "now" at the given fixed offset from UTC.
pub fn today_at_offset(hours: i8) -> Result<Date, ValidationError> {
    let offset =
        UtcOffset::from_hms(hours, 0, 0).map_err(|_| ValidationError::InvalidUtcOffset { hours })?;
    Ok(OffsetDateTime::now_utc().to_offset(offset).date())
}

pub fn parse_weekday(input: &str) -> Result<Weekday, ValidationError> {
    let weekday = match input.trim().to_ascii_lowercase().as_str() {
        "mon" | "monday" => Weekday::Monday,
        "tue" | "tuesday" => Weekday::Tuesday,
        "wed" | "wednesday" => Weekday::Wednesday,
        "thu" | "thursday" => Weekday::Thursday,
        "fri" | "friday" => Weekday::Friday,
        "sat" | "saturday" => Weekday::Saturday,
        "sun" | "sunday" => Weekday::Sunday,
        _ => {
            return Err(ValidationError::InvalidWeekday {
                value: input.to_owned(),
            })
        }
    };
    Ok(weekday)
}

/// Parses a comma-separated weekday list such as `tue,thu`.
pub fn parse_weekdays(input: &str) -> Result<Vec<Weekday>, ValidationError> {
    let mut weekdays = Vec::new();
    for part in input.split(',').filter(|part| !part.trim().is_empty()) {
        let weekday = parse_weekday(part)?;
        if !weekdays.contains(&weekday) {
            weekdays.push(weekday);
        }
    }

    if weekdays.is_empty() {
        return Err(ValidationError::EmptyWeekdaySet);
    }
    Ok(weekdays)
}
