//! Conversions between chrono date/time types and store dates.
//!
//! A store date is a [Value::DateTime](crate::common::Value::DateTime): an
//! instant in UTC with millisecond precision. Zoned types keep their instant.
//! Naive types are interpreted in the process-wide [DateZone], which
//! defaults to the local zone and is set from
//! [RepositoryConfig](crate::repository_config::RepositoryConfig).
//!
//! Every conversion has an `_in` variant taking an explicit zone.

mod date;

pub use date::*;
