//! Civil (UTC) time helpers.
//!
//! The kernel calling convention separates the date from the time of day, and the
//! space weather dataset is indexed by whole UTC days and 3-hour slots. Both need a
//! leap-second-free view of an [`Epoch`]: an integer day number plus the seconds
//! elapsed since UTC midnight. This module builds that view on top of hifitime's
//! Gregorian conversions.
use hifitime::Epoch;
use std::str::FromStr;

use crate::{constants::SECONDS_PER_DAY, msis_errors::MsisError};

/// An epoch split along civil UTC boundaries.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CivilTime {
    /// Modified Julian Day number of the UTC midnight starting this day
    pub mjd_day: i64,
    /// Day of year, 1 on January 1st
    pub day_of_year: u16,
    /// Seconds elapsed since UTC midnight
    pub seconds_of_day: f64,
}

impl CivilTime {
    /// Fractional number of days elapsed since the midnight of `mjd_origin`.
    pub fn days_since(&self, mjd_origin: i64) -> f64 {
        (self.mjd_day - mjd_origin) as f64 + self.seconds_of_day / SECONDS_PER_DAY
    }
}

/// Decompose an epoch into its UTC day number, day of year and seconds of day.
///
/// Argument
/// --------
/// * `epoch`: the instant to decompose
///
/// Return
/// ------
/// * the [`CivilTime`] of the instant. The seconds of day are computed from the UTC
///   broken-down time, so a leap second shows up as `86400.0` instead of spilling into
///   the next day.
pub fn civil_time(epoch: &Epoch) -> CivilTime {
    let (year, month, day, hour, minute, second, nanos) = epoch.to_gregorian_utc();

    let mjd_day = mjd_at_midnight(year, month, day);
    let day_of_year = (mjd_day - mjd_at_midnight(year, 1, 1) + 1) as u16;

    let seconds_of_day = f64::from(hour) * 3600.0
        + f64::from(minute) * 60.0
        + f64::from(second)
        + f64::from(nanos) * 1e-9;

    CivilTime {
        mjd_day,
        day_of_year,
        seconds_of_day,
    }
}

/// MJD number of the UTC midnight of a Gregorian date, assumed valid.
pub(crate) fn mjd_at_midnight(year: i32, month: u8, day: u8) -> i64 {
    Epoch::from_gregorian_utc_at_midnight(year, month, day)
        .to_mjd_utc_days()
        .round() as i64
}

/// Parse a `YYYY-MM-DD` calendar date into the epoch of its UTC midnight.
///
/// Argument
/// --------
/// * `date`: a calendar date, e.g. `"2000-07-01"`
///
/// Return
/// ------
/// * the midnight epoch, or [`MsisError::InvalidDate`] if the date is malformed
pub fn parse_calendar_day(date: &str) -> Result<Epoch, MsisError> {
    let invalid = || MsisError::InvalidDate(date.to_string());

    let mut parts = date.trim().splitn(3, '-');
    let year = parts
        .next()
        .and_then(|s| i32::from_str(s).ok())
        .ok_or_else(invalid)?;
    let month = parts
        .next()
        .and_then(|s| u8::from_str(s).ok())
        .ok_or_else(invalid)?;
    let day = parts
        .next()
        .and_then(|s| u8::from_str(s).ok())
        .ok_or_else(invalid)?;

    Epoch::maybe_from_gregorian_utc(year, month, day, 0, 0, 0, 0).map_err(|_| invalid())
}

/// Transformation from dates in the format YYYY-MM-ddTHH:mm:ss to UTC epochs
///
/// Argument
/// --------
/// * `dates`: a slice of ISO 8601 dates, interpreted as UTC when no time scale is given
///
/// Return
/// ------
/// * the parsed epochs, or [`MsisError::InvalidDate`] naming the first bad entry
pub fn parse_epochs(dates: &[&str]) -> Result<Vec<Epoch>, MsisError> {
    dates
        .iter()
        .map(|date| {
            Epoch::from_str(date).map_err(|err| MsisError::InvalidDate(format!("{date}: {err}")))
        })
        .collect()
}
