//! # Driver time series
//!
//! [`DriverTimeSeries`] is the cleaned, immutable form of the space weather table.
//! It holds:
//!
//! - one 7-component [`ApVector`] per 3-hour slot (see [`ApVector`] for the layout),
//! - the F10.7 of the **previous** day and the 81-day centred F10.7 average, per day,
//! - provenance flags marking samples the upstream source interpolated or predicted.
//!
//! ## Cleaning rules
//!
//! - Negative ap / Ap entries are missing data and become NaN.
//! - F10.7 values `<= 0` or above [`SOLAR_RADIO_BURST`] are replaced by the 81-day
//!   average of the same day and flagged.
//! - The F10.7 flag follows the value: since a day uses the flux of the previous
//!   day, the flag is shifted one day forward.
//! - An ap vector is flagged when any slot it draws from (current slot back to the
//!   oldest sample of the 36-57 hour window) belongs to a non-observed day.
//!
//! ## Lookup
//!
//! Lookups are pure offset arithmetic from the first day: a daily index for the flux
//! series and a 3-hour index for the ap series. This relies on the table being gap
//! free, which [`crate::drivers::sw_reader`] enforces. Requests outside of
//! `[first slot, last slot + 3h)` fail with [`MsisError::DateOutOfRange`].
use hifitime::{Epoch, Unit};
use tracing::warn;

use crate::{
    constants::{
        ApVector, AP_HISTORY_SLOTS, AP_SLOTS_PER_DAY, AP_WINDOW, AP_WINDOW_12H_OFFSET,
        AP_WINDOW_36H_OFFSET, SECONDS_PER_AP_SLOT, SECONDS_PER_DAY, SOLAR_RADIO_BURST,
    },
    drivers::sw_reader::SwTable,
    msis_errors::MsisError,
    time::civil_time,
};

/// Drivers for a set of requested times, one entry per time.
#[derive(Debug, Clone, PartialEq)]
pub struct DriverLookup {
    /// Daily F10.7 of the previous day
    pub f107: Vec<f64>,
    /// F10.7 81-day average centred on the day
    pub f107a: Vec<f64>,
    /// ap vectors
    pub ap: Vec<ApVector>,
    /// At least one returned value was interpolated or predicted upstream
    pub flagged: bool,
}

impl DriverLookup {
    pub fn len(&self) -> usize {
        self.f107.len()
    }

    pub fn is_empty(&self) -> bool {
        self.f107.is_empty()
    }
}

/// Position of a time inside a series: lower sample and weight of the next one.
#[derive(Debug, Clone, Copy)]
struct Bracket {
    index: usize,
    weight: f64,
}

impl Bracket {
    /// Step sampling: the sample holding at this time.
    fn step(index: usize) -> Self {
        Bracket { index, weight: 0.0 }
    }

    /// Linear sampling between `index` and `index + 1`, held at the last sample.
    fn linear(index: usize, fraction: f64, len: usize) -> Self {
        if fraction <= 0.0 {
            return Bracket::step(index);
        }
        if fraction >= 1.0 {
            return Bracket::step((index + 1).min(len - 1));
        }
        if index + 1 >= len {
            return Bracket::step(index);
        }
        Bracket {
            index,
            weight: fraction,
        }
    }

    fn sample(&self, values: &[f64]) -> f64 {
        if self.weight == 0.0 {
            values[self.index]
        } else {
            values[self.index] * (1.0 - self.weight) + values[self.index + 1] * self.weight
        }
    }

    fn sample_ap(&self, values: &[ApVector]) -> ApVector {
        if self.weight == 0.0 {
            values[self.index]
        } else {
            values[self.index] * (1.0 - self.weight) + values[self.index + 1] * self.weight
        }
    }

    fn flagged(&self, flags: &[bool]) -> bool {
        flags[self.index] || (self.weight > 0.0 && flags[self.index + 1])
    }
}

/// Cleaned F10.7 and ap series on a gap-free time axis.
#[derive(Debug, Clone)]
pub struct DriverTimeSeries {
    first_epoch: Epoch,
    last_epoch: Epoch,
    start_mjd: i64,
    ap: Vec<ApVector>,
    ap_flagged: Vec<bool>,
    f107: Vec<f64>,
    f107a: Vec<f64>,
    f107_flagged: Vec<bool>,
}

/// Mean of the [`AP_WINDOW`] samples ending `offset` slots before `slot`.
fn window_mean(ap: &[f64], slot: usize, offset: usize) -> f64 {
    match slot.checked_sub(offset + AP_WINDOW - 1) {
        Some(oldest) => ap[oldest..=slot - offset].iter().sum::<f64>() / AP_WINDOW as f64,
        None => f64::NAN,
    }
}

impl DriverTimeSeries {
    /// Build the derived series out of the raw daily table.
    ///
    /// Arguments
    /// ---------
    /// * `table`: the daily table read from the space weather file
    ///
    /// Return
    /// ------
    /// * the cleaned series, see the module documentation for the rules applied
    pub fn from_table(table: &SwTable) -> Self {
        let n_days = table.n_days();
        let n_slots = n_days * AP_SLOTS_PER_DAY;

        let ap_3h: Vec<f64> = table.ap.iter().flatten().copied().collect();

        let ap: Vec<ApVector> = (0..n_slots)
            .map(|slot| {
                let mut vector = ApVector::from_element(f64::NAN);
                vector[0] = table.daily_ap[slot / AP_SLOTS_PER_DAY];
                vector[1] = ap_3h[slot];
                for lag in 1..=3 {
                    if let Some(previous) = slot.checked_sub(lag) {
                        vector[1 + lag] = ap_3h[previous];
                    }
                }
                vector[5] = window_mean(&ap_3h, slot, AP_WINDOW_12H_OFFSET);
                vector[6] = window_mean(&ap_3h, slot, AP_WINDOW_36H_OFFSET);
                vector
            })
            .collect();

        let derived_day: Vec<bool> = table.data_type.iter().map(|t| t.is_derived()).collect();

        let ap_flagged: Vec<bool> = (0..n_slots)
            .map(|slot| {
                let oldest_day = slot.saturating_sub(AP_HISTORY_SLOTS) / AP_SLOTS_PER_DAY;
                let day = slot / AP_SLOTS_PER_DAY;
                derived_day[oldest_day..=day].iter().any(|&flag| flag)
            })
            .collect();

        let mut flux = table.f107.clone();
        let mut flux_flagged = derived_day;
        for (day, value) in flux.iter_mut().enumerate() {
            if *value <= 0.0 || *value > SOLAR_RADIO_BURST {
                *value = table.f107a[day];
                flux_flagged[day] = true;
            }
        }

        // a day is evaluated with the flux of the day before
        let mut f107 = vec![f64::NAN; n_days];
        let mut f107_flagged = vec![false; n_days];
        if n_days > 1 {
            f107[1..].copy_from_slice(&flux[..n_days - 1]);
            f107_flagged[1..].copy_from_slice(&flux_flagged[..n_days - 1]);
        }

        DriverTimeSeries {
            first_epoch: table.first_day,
            last_epoch: table.last_day + Unit::Hour * 21,
            start_mjd: table.start_mjd,
            ap,
            ap_flagged,
            f107,
            f107a: table.f107a.clone(),
            f107_flagged,
        }
    }

    /// First 3-hour sample of the series.
    pub fn first_epoch(&self) -> Epoch {
        self.first_epoch
    }

    /// Last 3-hour sample of the series.
    pub fn last_epoch(&self) -> Epoch {
        self.last_epoch
    }

    pub fn n_days(&self) -> usize {
        self.f107.len()
    }

    pub fn n_slots(&self) -> usize {
        self.ap.len()
    }

    /// ap vectors, one per 3-hour slot.
    pub fn ap(&self) -> &[ApVector] {
        &self.ap
    }

    /// F10.7 of the previous day, one per day.
    pub fn f107(&self) -> &[f64] {
        &self.f107
    }

    /// 81-day centred F10.7 average, one per day.
    pub fn f107a(&self) -> &[f64] {
        &self.f107a
    }

    fn out_of_range(&self) -> MsisError {
        MsisError::DateOutOfRange {
            start: self.first_epoch.to_string(),
            end: self.last_epoch.to_string(),
        }
    }

    /// Daily and 3-hourly brackets of one epoch.
    fn locate(&self, epoch: &Epoch, interpolate: bool) -> Result<(Bracket, Bracket), MsisError> {
        let civil = civil_time(epoch);

        let day_offset = civil.mjd_day - self.start_mjd;
        // a leap second (86400 s) still belongs to the last slot of its day
        let slot_in_day = ((civil.seconds_of_day / SECONDS_PER_AP_SLOT).floor() as i64)
            .min(AP_SLOTS_PER_DAY as i64 - 1);
        let slot = day_offset * AP_SLOTS_PER_DAY as i64 + slot_in_day;

        if day_offset < 0 || slot < 0 || slot >= self.n_slots() as i64 {
            return Err(self.out_of_range());
        }
        let day = day_offset as usize;
        let slot = slot as usize;

        if !interpolate {
            return Ok((Bracket::step(day), Bracket::step(slot)));
        }

        let day_fraction = civil.seconds_of_day / SECONDS_PER_DAY;
        let slot_fraction =
            (civil.seconds_of_day - slot_in_day as f64 * SECONDS_PER_AP_SLOT) / SECONDS_PER_AP_SLOT;

        Ok((
            Bracket::linear(day, day_fraction, self.n_days()),
            Bracket::linear(slot, slot_fraction, self.n_slots()),
        ))
    }

    /// Retrieve the F10.7 and ap drivers for the given times.
    ///
    /// Arguments
    /// ---------
    /// * `times`: the epochs of interest
    /// * `interpolate`: linearly interpolate between the native samples (daily for
    ///   F10.7, 3-hourly for ap) instead of holding each sample over its interval
    ///
    /// Return
    /// ------
    /// * a [`DriverLookup`] with one entry per time. A warning is logged (and
    ///   [`DriverLookup::flagged`] set) when any value was interpolated or predicted
    ///   upstream.
    ///
    /// Errors
    /// ------
    /// * [`MsisError::DateOutOfRange`] if any time falls outside of the series
    pub fn lookup(&self, times: &[Epoch], interpolate: bool) -> Result<DriverLookup, MsisError> {
        let brackets = times
            .iter()
            .map(|epoch| self.locate(epoch, interpolate))
            .collect::<Result<Vec<_>, _>>()?;

        let mut lookup = DriverLookup {
            f107: Vec::with_capacity(brackets.len()),
            f107a: Vec::with_capacity(brackets.len()),
            ap: Vec::with_capacity(brackets.len()),
            flagged: false,
        };

        for (day, slot) in &brackets {
            lookup.f107.push(day.sample(&self.f107));
            lookup.f107a.push(day.sample(&self.f107a));
            lookup.ap.push(slot.sample_ap(&self.ap));
            lookup.flagged |= day.flagged(&self.f107_flagged) || slot.flagged(&self.ap_flagged);
        }

        if lookup.flagged {
            warn!(
                "There is data that was either interpolated or predicted (not observed), use at your own risk."
            );
        }

        Ok(lookup)
    }
}

#[cfg(test)]
mod driver_series_test {
    use super::*;
    use crate::drivers::sw_reader::parse_sw_reader;
    use std::str::FromStr;

    const HEADER: &str =
        "DATE,AP1,AP2,AP3,AP4,AP5,AP6,AP7,AP8,AP_AVG,F10.7_OBS,F10.7_DATA_TYPE,F10.7_OBS_CENTER81";

    /// Four days, ap slots numbered 0..32 so every window is easy to check.
    fn series() -> DriverTimeSeries {
        let mut rows = vec![HEADER.to_string()];
        for day in 0..4 {
            let ap: Vec<String> = (0..8).map(|i| (day * 8 + i).to_string()).collect();
            let flux = 100.0 + day as f64;
            let kind = if day == 3 { "PRD" } else { "OBS" };
            rows.push(format!(
                "2000-01-0{},{},{},{flux},{kind},{}",
                day + 1,
                ap.join(","),
                10 * day,
                150.0 + day as f64
            ));
        }
        let table = parse_sw_reader(rows.join("\n").as_bytes()).unwrap();
        DriverTimeSeries::from_table(&table)
    }

    fn epoch(s: &str) -> Epoch {
        Epoch::from_str(s).unwrap()
    }

    #[test]
    fn test_axis() {
        let s = series();
        assert_eq!(s.n_days(), 4);
        assert_eq!(s.n_slots(), 32);
        assert_eq!(s.first_epoch(), epoch("2000-01-01T00:00:00"));
        assert_eq!(s.last_epoch(), epoch("2000-01-04T21:00:00"));
    }

    #[test]
    fn test_ap_components() {
        let s = series();
        // slot 20 is 2000-01-03T12:00
        let ap = s.ap()[20];
        assert_eq!(ap[0], 20.0);
        assert_eq!(ap[1], 20.0);
        assert_eq!(ap[2], 19.0);
        assert_eq!(ap[3], 18.0);
        assert_eq!(ap[4], 17.0);
        // slots 9..=16
        assert_eq!(ap[5], 12.5);
        // slots 1..=8
        assert_eq!(ap[6], 4.5);

        // the 36-57h window needs 19 previous slots
        assert!(s.ap()[18][6].is_nan());
        assert!(!s.ap()[19][6].is_nan());
        assert!(s.ap()[10][5].is_nan());
        assert!(!s.ap()[11][5].is_nan());
    }

    #[test]
    fn test_flux_is_shifted() {
        let s = series();
        assert!(s.f107()[0].is_nan());
        assert_eq!(s.f107()[1], 100.0);
        assert_eq!(s.f107()[3], 102.0);
        assert_eq!(s.f107a()[3], 153.0);
    }

    #[test]
    fn test_step_lookup() {
        let s = series();
        let res = s
            .lookup(&[epoch("2000-01-03T13:30:00")], false)
            .unwrap();
        assert_eq!(res.f107, vec![101.0]);
        assert_eq!(res.f107a, vec![152.0]);
        assert_eq!(res.ap[0], s.ap()[20]);
        assert!(!res.flagged);
    }

    #[test]
    fn test_interpolated_lookup() {
        let s = series();
        let res = s.lookup(&[epoch("2000-01-02T13:30:00")], true).unwrap();
        // 1.5625 days after the start: between day 1 (100) and day 2 (101)
        assert_eq!(res.f107, vec![100.5625]);
        // halfway between slots 12 and 13
        assert_eq!(res.ap[0][1], 12.5);

        // on a sample the interpolation reproduces the step value
        let on_grid = s.lookup(&[epoch("2000-01-03T12:00:00")], true).unwrap();
        let step = s.lookup(&[epoch("2000-01-03T12:00:00")], false).unwrap();
        assert_eq!(on_grid.ap, step.ap);
    }

    #[test]
    fn test_predicted_day_is_flagged() {
        let s = series();
        assert!(s.lookup(&[epoch("2000-01-04T03:00:00")], false).unwrap().flagged);
        // interpolating towards a predicted ap slot also warns
        assert!(s.lookup(&[epoch("2000-01-03T22:30:00")], true).unwrap().flagged);
        assert!(!s.lookup(&[epoch("2000-01-03T22:30:00")], false).unwrap().flagged);
    }

    #[test]
    fn test_out_of_range() {
        let s = series();
        let err = s.lookup(&[epoch("1999-12-31T21:00:00")], false).unwrap_err();
        assert!(matches!(err, MsisError::DateOutOfRange { .. }));
        assert!(s.lookup(&[epoch("2000-01-05T00:00:00")], false).is_err());
        assert!(s.lookup(&[epoch("2000-01-04T23:59:59")], false).is_ok());
    }

    #[test]
    fn test_solar_radio_burst_is_replaced() {
        let text = format!(
            "{HEADER}\n2000-01-01,3,3,3,3,3,3,3,3,3,450.0,OBS,140.0\n2000-01-02,3,3,3,3,3,3,3,3,3,120.0,OBS,141.0"
        );
        let table = parse_sw_reader(text.as_bytes()).unwrap();
        let s = DriverTimeSeries::from_table(&table);
        let res = s.lookup(&[epoch("2000-01-02T00:00:00")], false).unwrap();
        assert_eq!(res.f107, vec![140.0]);
        assert!(res.flagged);
    }
}
