//! # Time Origin
//!
//! All harmonic angles are measured from a single origin, T0 =
//! 1900-01-01T00:00:00Z. Inputs must be timezone aware: a naive date-time is
//! rejected instead of being silently read as UTC.

use crate::error::{Result, TideError};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};

const SECONDS_PER_DAY: i64 = 86_400;

/// Origin of every angle in the program, 1900-01-01T00:00:00Z.
pub fn epoch() -> DateTime<Utc> {
    NaiveDate::from_ymd_opt(1900, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// Anything that may stand for an instant.
///
/// Aware chrono types convert; naive ones fail with
/// [`TideError::NaiveTimestamp`]. Strings are read as RFC 3339 and reported
/// as naive when they parse without an offset.
pub trait Timestamp {
    fn to_utc(&self) -> Result<DateTime<Utc>>;
}

impl<Tz: TimeZone> Timestamp for DateTime<Tz> {
    fn to_utc(&self) -> Result<DateTime<Utc>> {
        Ok(self.with_timezone(&Utc))
    }
}

impl Timestamp for NaiveDateTime {
    fn to_utc(&self) -> Result<DateTime<Utc>> {
        Err(TideError::NaiveTimestamp(self.to_string()))
    }
}

impl Timestamp for str {
    fn to_utc(&self) -> Result<DateTime<Utc>> {
        parse_aware(self).map(|t| t.with_timezone(&Utc))
    }
}

impl Timestamp for String {
    fn to_utc(&self) -> Result<DateTime<Utc>> {
        self.as_str().to_utc()
    }
}

/// Parse an RFC 3339 timestamp, keeping its offset.
pub fn parse_aware(text: &str) -> Result<DateTime<FixedOffset>> {
    let text = text.trim();
    if let Ok(t) = DateTime::parse_from_rfc3339(text) {
        return Ok(t);
    }
    // Same shape without an offset: valid date-time, wrong kind.
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if NaiveDateTime::parse_from_str(text, format).is_ok() {
            return Err(TideError::NaiveTimestamp(text.to_string()));
        }
    }
    Err(TideError::InvalidTimestamp(text.to_string()))
}

/// Hours elapsed since [`epoch`], as `days * 24 + remainder_seconds / 3600`.
///
/// The day count is floored so the seconds remainder is never negative, which
/// keeps instants before 1900 on the same arithmetic as later ones.
pub fn hours_since_epoch<T: Timestamp + ?Sized>(t: &T) -> Result<f64> {
    Ok(hours_since_epoch_utc(&t.to_utc()?))
}

/// [`hours_since_epoch`] for an instant already known to be aware.
pub fn hours_since_epoch_utc(t: &DateTime<Utc>) -> f64 {
    let elapsed = t.signed_duration_since(epoch());
    let seconds = elapsed.num_seconds();
    let nanos = elapsed.subsec_nanos();
    let (seconds, nanos) = if nanos < 0 {
        (seconds - 1, nanos + 1_000_000_000)
    } else {
        (seconds, nanos)
    };
    let days = seconds.div_euclid(SECONDS_PER_DAY);
    let remainder = seconds.rem_euclid(SECONDS_PER_DAY) as f64 + nanos as f64 / 1e9;
    days as f64 * 24.0 + remainder / 3600.0
}
