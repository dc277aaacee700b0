use crate::common::{atomic, Atomic, Convertible, ReadExecutor, Value, WriteExecutor};
use crate::errors::{ErrorKind, PatchError, PatchResult};
use chrono::{
    DateTime, FixedOffset, Local, NaiveDate, NaiveDateTime, NaiveTime, Offset, TimeZone, Utc,
};
use std::fmt::{Display, Formatter};
use std::sync::LazyLock;

/// The zone used to attach an offset to store dates, and to place naive
/// dates and times on the timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DateZone {
    /// The process's local time zone, including its daylight saving rules.
    #[default]
    Local,
    Utc,
    /// A fixed offset east of UTC, in seconds.
    Fixed(i32),
}

impl DateZone {
    /// Creates a fixed-offset zone, rejecting offsets of a day or more.
    pub fn fixed(seconds_east: i32) -> PatchResult<DateZone> {
        match FixedOffset::east_opt(seconds_east) {
            Some(_) => Ok(DateZone::Fixed(seconds_east)),
            None => {
                log::error!("Invalid zone offset {} seconds", seconds_east);
                Err(PatchError::new(
                    &format!("Invalid zone offset of {} seconds", seconds_east),
                    ErrorKind::ConversionError,
                ))
            }
        }
    }

    fn fixed_offset(seconds_east: i32) -> PatchResult<FixedOffset> {
        FixedOffset::east_opt(seconds_east).ok_or_else(|| {
            log::error!("Invalid zone offset {} seconds", seconds_east);
            PatchError::new(
                &format!("Invalid zone offset of {} seconds", seconds_east),
                ErrorKind::ConversionError,
            )
        })
    }

    /// The offset in effect in this zone at `instant`.
    pub fn offset_at(&self, instant: &DateTime<Utc>) -> PatchResult<FixedOffset> {
        match self {
            DateZone::Local => Ok(instant.with_timezone(&Local).offset().fix()),
            DateZone::Utc => Ok(Utc.fix()),
            DateZone::Fixed(seconds) => DateZone::fixed_offset(*seconds),
        }
    }

    /// Places a wall-clock time of this zone on the timeline.
    ///
    /// Ambiguous times (a clock set back) resolve to the earliest instant.
    /// Times skipped by a clock set forward do not exist and fail with
    /// [ErrorKind::ConversionError].
    pub fn resolve(&self, local: &NaiveDateTime) -> PatchResult<DateTime<Utc>> {
        let resolved = match self {
            DateZone::Local => Local
                .from_local_datetime(local)
                .earliest()
                .map(|dt| dt.with_timezone(&Utc)),
            DateZone::Utc => Some(Utc.from_utc_datetime(local)),
            DateZone::Fixed(seconds) => DateZone::fixed_offset(*seconds)?
                .from_local_datetime(local)
                .earliest()
                .map(|dt| dt.with_timezone(&Utc)),
        };

        resolved.ok_or_else(|| {
            log::error!("Local time {} does not exist in zone {}", local, self);
            PatchError::new(
                &format!("Local time {} does not exist in zone {}", local, self),
                ErrorKind::ConversionError,
            )
        })
    }
}

impl Display for DateZone {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            DateZone::Local => write!(f, "Local"),
            DateZone::Utc => write!(f, "UTC"),
            DateZone::Fixed(seconds) => match FixedOffset::east_opt(*seconds) {
                Some(offset) => write!(f, "{}", offset),
                None => write!(f, "Fixed({})", seconds),
            },
        }
    }
}

pub(crate) static DATE_ZONE: LazyLock<Atomic<DateZone>> =
    LazyLock::new(|| atomic(DateZone::Local));

/// Returns the process-wide zone used by the date converters.
pub fn date_zone() -> DateZone {
    DATE_ZONE.read_with(|zone| *zone)
}

/// Replaces the process-wide zone used by the date converters.
pub fn set_date_zone(zone: DateZone) {
    DATE_ZONE.write_with(|current| *current = zone);
    log::debug!("Date zone set to {}", zone);
}

fn truncate_to_millis(instant: DateTime<Utc>) -> PatchResult<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp_millis(instant.timestamp_millis()).ok_or_else(|| {
        log::error!("Instant {} is out of the store date range", instant);
        PatchError::new(
            &format!("Instant {} is out of the store date range", instant),
            ErrorKind::ConversionError,
        )
    })
}

/// Reads a store date out of `value`.
pub fn store_date(value: &Value) -> PatchResult<DateTime<Utc>> {
    match value {
        Value::DateTime(dt) => Ok(*dt),
        _ => {
            log::error!("Value {} is not a date", value);
            Err(PatchError::new(
                "Value is not a date",
                ErrorKind::ConversionError,
            ))
        }
    }
}

/// Converts a zoned date-time to a store date. The instant is kept; precision
/// below a millisecond is dropped.
pub fn zoned_to_date<Tz: TimeZone>(value: &DateTime<Tz>) -> PatchResult<Value> {
    Ok(Value::DateTime(truncate_to_millis(value.with_timezone(&Utc))?))
}

/// Converts a store date to a date-time in the process-wide zone.
pub fn date_to_zoned(value: &Value) -> PatchResult<DateTime<FixedOffset>> {
    date_to_zoned_in(value, date_zone())
}

pub fn date_to_zoned_in(value: &Value, zone: DateZone) -> PatchResult<DateTime<FixedOffset>> {
    let instant = store_date(value)?;
    let offset = zone.offset_at(&instant)?;
    Ok(instant.with_timezone(&offset))
}

/// Converts a calendar date to the store date of its start of day in the
/// process-wide zone.
pub fn naive_date_to_date(date: &NaiveDate) -> PatchResult<Value> {
    naive_date_to_date_in(date, date_zone())
}

pub fn naive_date_to_date_in(date: &NaiveDate, zone: DateZone) -> PatchResult<Value> {
    let start_of_day = date.and_time(NaiveTime::default());
    Ok(Value::DateTime(truncate_to_millis(zone.resolve(&start_of_day)?)?))
}

pub fn date_to_naive_date(value: &Value) -> PatchResult<NaiveDate> {
    date_to_naive_date_in(value, date_zone())
}

pub fn date_to_naive_date_in(value: &Value, zone: DateZone) -> PatchResult<NaiveDate> {
    Ok(date_to_zoned_in(value, zone)?.date_naive())
}

/// Converts a wall-clock date-time of the process-wide zone to a store date.
pub fn naive_date_time_to_date(value: &NaiveDateTime) -> PatchResult<Value> {
    naive_date_time_to_date_in(value, date_zone())
}

pub fn naive_date_time_to_date_in(value: &NaiveDateTime, zone: DateZone) -> PatchResult<Value> {
    Ok(Value::DateTime(truncate_to_millis(zone.resolve(value)?)?))
}

pub fn date_to_naive_date_time(value: &Value) -> PatchResult<NaiveDateTime> {
    date_to_naive_date_time_in(value, date_zone())
}

pub fn date_to_naive_date_time_in(value: &Value, zone: DateZone) -> PatchResult<NaiveDateTime> {
    Ok(date_to_zoned_in(value, zone)?.naive_local())
}

impl Convertible for DateTime<Utc> {
    type Output = DateTime<Utc>;

    fn to_value(&self) -> PatchResult<Value> {
        zoned_to_date(self)
    }

    fn from_value(value: &Value) -> PatchResult<Self::Output> {
        store_date(value)
    }
}

impl Convertible for DateTime<FixedOffset> {
    type Output = DateTime<FixedOffset>;

    fn to_value(&self) -> PatchResult<Value> {
        zoned_to_date(self)
    }

    fn from_value(value: &Value) -> PatchResult<Self::Output> {
        date_to_zoned(value)
    }
}

impl Convertible for DateTime<Local> {
    type Output = DateTime<Local>;

    fn to_value(&self) -> PatchResult<Value> {
        zoned_to_date(self)
    }

    fn from_value(value: &Value) -> PatchResult<Self::Output> {
        Ok(store_date(value)?.with_timezone(&Local))
    }
}

impl Convertible for NaiveDate {
    type Output = NaiveDate;

    fn to_value(&self) -> PatchResult<Value> {
        naive_date_to_date(self)
    }

    fn from_value(value: &Value) -> PatchResult<Self::Output> {
        date_to_naive_date(value)
    }
}

impl Convertible for NaiveDateTime {
    type Output = NaiveDateTime;

    fn to_value(&self) -> PatchResult<Value> {
        naive_date_time_to_date(self)
    }

    fn from_value(value: &Value) -> PatchResult<Self::Output> {
        date_to_naive_date_time(value)
    }
}
