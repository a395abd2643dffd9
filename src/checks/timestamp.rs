use chrono::{DateTime, NaiveDateTime};

use crate::error::ParseError;

/// Parse an ISO-8601 timestamp and drop its UTC offset.
///
/// The wall-clock time is kept as written (`13:13:29+02:00` becomes
/// `13:13:29`), not converted to UTC. Checks compare it against a naive
/// local "now". Strings without an offset are taken as already naive.
pub fn normalize(value: &str) -> Result<NaiveDateTime, ParseError> {
    let value = value.trim();
    match DateTime::parse_from_rfc3339(value) {
        Ok(dt) => Ok(dt.naive_local()),
        Err(rfc_err) => NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
            .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f"))
            .map_err(|_| ParseError::Timestamp {
                value: value.to_string(),
                source: rfc_err,
            }),
    }
}
