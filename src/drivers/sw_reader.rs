//! Reader for the CelesTrak `SW-All.csv` space weather file.
//!
//! The file holds one row per UTC day with (among many other columns) the eight
//! 3-hourly ap values, the daily Ap, the observed F10.7, a data-type flag telling
//! whether the day was observed, interpolated or predicted, and the 81-day centred
//! F10.7 average. Only those columns are kept, matched by header name.
//!
//! Monthly-predicted (`PRM`) rows trail the file with a one-month cadence; they are
//! dropped here so the daily sequence stays contiguous.
use std::io::Read;

use camino::Utf8Path;
use hifitime::Epoch;
use serde::Deserialize;

use crate::{
    constants::AP_SLOTS_PER_DAY,
    msis_errors::MsisError,
    time::{civil_time, parse_calendar_day},
};

/// Origin of a daily F10.7 value, as declared by the upstream source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataType {
    Observed,
    Interpolated,
    Predicted,
    MonthlyPredicted,
}

impl DataType {
    fn from_label(label: &str) -> Result<Self, MsisError> {
        match label.trim() {
            "OBS" => Ok(DataType::Observed),
            "INT" => Ok(DataType::Interpolated),
            "PRD" => Ok(DataType::Predicted),
            "PRM" => Ok(DataType::MonthlyPredicted),
            other => Err(MsisError::MalformedDriverFile(format!(
                "unknown F10.7 data type: {other}"
            ))),
        }
    }

    /// True when the value was not directly observed.
    pub fn is_derived(&self) -> bool {
        !matches!(self, DataType::Observed)
    }
}

#[derive(Debug, Deserialize)]
struct SwRow {
    #[serde(rename = "DATE")]
    date: String,
    #[serde(rename = "AP1", deserialize_with = "csv::invalid_option")]
    ap1: Option<f64>,
    #[serde(rename = "AP2", deserialize_with = "csv::invalid_option")]
    ap2: Option<f64>,
    #[serde(rename = "AP3", deserialize_with = "csv::invalid_option")]
    ap3: Option<f64>,
    #[serde(rename = "AP4", deserialize_with = "csv::invalid_option")]
    ap4: Option<f64>,
    #[serde(rename = "AP5", deserialize_with = "csv::invalid_option")]
    ap5: Option<f64>,
    #[serde(rename = "AP6", deserialize_with = "csv::invalid_option")]
    ap6: Option<f64>,
    #[serde(rename = "AP7", deserialize_with = "csv::invalid_option")]
    ap7: Option<f64>,
    #[serde(rename = "AP8", deserialize_with = "csv::invalid_option")]
    ap8: Option<f64>,
    #[serde(rename = "AP_AVG", deserialize_with = "csv::invalid_option")]
    ap_avg: Option<f64>,
    #[serde(rename = "F10.7_OBS", deserialize_with = "csv::invalid_option")]
    f107_obs: Option<f64>,
    #[serde(rename = "F10.7_DATA_TYPE")]
    f107_data_type: String,
    #[serde(rename = "F10.7_OBS_CENTER81", deserialize_with = "csv::invalid_option")]
    f107_obs_center81: Option<f64>,
}

/// Negative or absent index values are missing data.
fn index_value(value: Option<f64>) -> f64 {
    match value {
        Some(v) if v >= 0.0 => v,
        _ => f64::NAN,
    }
}

fn flux_value(value: Option<f64>) -> f64 {
    value.unwrap_or(f64::NAN)
}

/// Daily columns of the space weather file, one entry per contiguous UTC day.
#[derive(Debug, Clone)]
pub struct SwTable {
    /// UTC midnight of the first day
    pub first_day: Epoch,
    /// UTC midnight of the last day
    pub last_day: Epoch,
    /// MJD number of the first day
    pub start_mjd: i64,
    /// 3-hourly ap values of each day (00-03h first)
    pub ap: Vec<[f64; AP_SLOTS_PER_DAY]>,
    /// Daily Ap
    pub daily_ap: Vec<f64>,
    /// Observed F10.7 of the day
    pub f107: Vec<f64>,
    /// 81-day centred F10.7 average
    pub f107a: Vec<f64>,
    /// Upstream provenance of the day
    pub data_type: Vec<DataType>,
}

impl SwTable {
    pub fn n_days(&self) -> usize {
        self.f107.len()
    }
}

/// Parse a space weather file from disk.
///
/// Arguments
/// ---------
/// * `path`: location of a `SW-All.csv` formatted file
///
/// Return
/// ------
/// * the contiguous daily table, or an error if the file cannot be read, has
///   unexpected columns, or its dates are not a gap-free increasing sequence
pub fn read_sw_file(path: &Utf8Path) -> Result<SwTable, MsisError> {
    let file = std::fs::File::open(path)?;
    parse_sw_reader(file)
}

/// Parse a space weather table from any reader (see [`read_sw_file`]).
pub fn parse_sw_reader<R: Read>(reader: R) -> Result<SwTable, MsisError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut first_day: Option<Epoch> = None;
    let mut last_day: Option<Epoch> = None;
    let mut last_mjd: Option<(i64, String)> = None;

    let mut ap = Vec::new();
    let mut daily_ap = Vec::new();
    let mut f107 = Vec::new();
    let mut f107a = Vec::new();
    let mut data_type = Vec::new();

    for result in csv_reader.deserialize() {
        let row: SwRow = result?;

        let kind = DataType::from_label(&row.f107_data_type)?;
        if kind == DataType::MonthlyPredicted {
            continue;
        }

        let day = parse_calendar_day(&row.date)?;
        let mjd = civil_time(&day).mjd_day;

        match &last_mjd {
            None => first_day = Some(day),
            Some((prev, prev_date)) if mjd != prev + 1 => {
                return Err(MsisError::MalformedDriverFile(format!(
                    "dates must be contiguous days, found {} after {}",
                    row.date, prev_date
                )));
            }
            Some(_) => {}
        }
        last_mjd = Some((mjd, row.date.clone()));
        last_day = Some(day);

        ap.push([
            index_value(row.ap1),
            index_value(row.ap2),
            index_value(row.ap3),
            index_value(row.ap4),
            index_value(row.ap5),
            index_value(row.ap6),
            index_value(row.ap7),
            index_value(row.ap8),
        ]);
        daily_ap.push(index_value(row.ap_avg));
        f107.push(flux_value(row.f107_obs));
        f107a.push(flux_value(row.f107_obs_center81));
        data_type.push(kind);
    }

    let (Some(first_day), Some(last_day)) = (first_day, last_day) else {
        return Err(MsisError::MalformedDriverFile(
            "no daily records found".to_string(),
        ));
    };

    Ok(SwTable {
        first_day,
        last_day,
        start_mjd: civil_time(&first_day).mjd_day,
        ap,
        daily_ap,
        f107,
        f107a,
        data_type,
    })
}
