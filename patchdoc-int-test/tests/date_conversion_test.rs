use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Timelike, Utc};
use patchdoc::common::Value;
use patchdoc::convert::{
    date_to_naive_date_in, date_to_naive_date_time_in, date_zone, naive_date_time_to_date_in,
    naive_date_to_date_in, DateZone,
};
use patchdoc::doc;
use patchdoc::errors::{ErrorKind, PatchResult};
use patchdoc::repository::{Query, RepositoryFactory};
use patchdoc::repository_config::RepositoryConfig;
use patchdoc::update::build_partial_update;
use patchdoc_derive::{Convertible, Entity, Patchable};
use patchdoc_int_test::test_util::{random_database, sample_instant, RecordingOperations};
use std::sync::Arc;

#[ctor::ctor]
fn init() {
    colog::init();
}

#[derive(Debug, Default, Clone, PartialEq, Patchable, Convertible, Entity)]
#[entity(name = "events")]
pub struct Event {
    #[patch(rename = "_id")]
    pub id: Option<String>,
    pub day: Option<NaiveDate>,
    pub starts_at: Option<NaiveDateTime>,
    pub created: Option<DateTime<Utc>>,
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

// The only test in this binary that reads the process-wide zone.
#[test]
fn test_configured_zone_drives_entity_dates() -> PatchResult<()> {
    let config = RepositoryConfig::builder()
        .database_name(&random_database())
        .fixed_offset(2 * 3600)
        .build()?;
    assert_eq!(config.date_zone(), DateZone::Fixed(7200));
    assert_eq!(date_zone(), DateZone::Fixed(7200));

    let factory = RepositoryFactory::new(config, Arc::new(RecordingOperations::new()))?;
    let events = factory.repository::<Event>()?;

    let starts_at = date(2024, 3, 1)
        .and_hms_nano_opt(10, 30, 0, 123_456_789)
        .unwrap();
    let event = Event {
        id: Some("e1".to_string()),
        day: Some(date(2024, 3, 1)),
        starts_at: Some(starts_at),
        created: Some(sample_instant()),
    };

    let payload = build_partial_update(&event, &[])?;
    assert_eq!(
        payload.get("day"),
        Some(&Value::DateTime(Utc.with_ymd_and_hms(2024, 2, 29, 22, 0, 0).unwrap()))
    );
    let stored_start = payload.get("starts_at").and_then(|v| v.as_date_time()).copied();
    assert_eq!(stored_start.map(|dt| dt.hour()), Some(8));
    assert_eq!(stored_start.map(|dt| dt.nanosecond()), Some(123_000_000));

    let update = events.build_base_update(&event, &["_id"])?;
    let query = Query::new(doc! { "_id": "e1" });
    events.upsert(&query, &update)?;

    let stored = events.find_one(&query)?.unwrap_or_default();
    assert_eq!(stored.day, Some(date(2024, 3, 1)));
    assert_eq!(
        stored.starts_at,
        Some(date(2024, 3, 1).and_hms_milli_opt(10, 30, 0, 123).unwrap())
    );
    assert_eq!(stored.created, Some(sample_instant()));
    Ok(())
}

#[test]
fn test_invalid_offset_fails_configuration() {
    let result = RepositoryConfig::builder()
        .database_name("zones")
        .fixed_offset(25 * 3600)
        .build();

    let err = result.err().map(|e| e.kind().clone());
    assert_eq!(err, Some(ErrorKind::ConversionError));
}

#[test]
fn test_calendar_date_depends_on_zone() {
    let day = date(2023, 12, 31);

    let east = naive_date_to_date_in(&day, DateZone::Fixed(10 * 3600)).unwrap();
    let west = naive_date_to_date_in(&day, DateZone::Fixed(-8 * 3600)).unwrap();
    assert_ne!(east, west);

    // read back in the zone it was written in
    assert_eq!(date_to_naive_date_in(&east, DateZone::Fixed(10 * 3600)).unwrap(), day);
    assert_eq!(date_to_naive_date_in(&west, DateZone::Fixed(-8 * 3600)).unwrap(), day);

    // read back in UTC, the eastern midnight is still the previous day
    assert_eq!(date_to_naive_date_in(&east, DateZone::Utc).unwrap(), date(2023, 12, 30));
}

#[test]
fn test_wall_clock_round_trip_in_fixed_zone() {
    let zone = DateZone::fixed(-(3 * 3600 + 30 * 60)).unwrap();
    let wall_clock = date(2020, 2, 29).and_hms_opt(23, 59, 59).unwrap();

    let value = naive_date_time_to_date_in(&wall_clock, zone).unwrap();
    assert_eq!(
        value,
        Value::DateTime(Utc.with_ymd_and_hms(2020, 3, 1, 3, 29, 59).unwrap())
    );
    assert_eq!(date_to_naive_date_time_in(&value, zone).unwrap(), wall_clock);
}

#[test]
fn test_non_date_value_is_rejected() {
    let err = date_to_naive_date_in(&Value::from("2024-01-01"), DateZone::Utc).unwrap_err();
    assert_eq!(err.kind(), &ErrorKind::ConversionError);
}
