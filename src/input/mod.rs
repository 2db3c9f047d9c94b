//! # Input marshaling
//!
//! Turns the caller's coordinate, time and driver arrays into the flat table of
//! evaluation rows the kernels consume.
//!
//! ## Row layout
//!
//! Each row holds 14 single precision fields, see the `COL_*` constants in
//! [`crate::constants`]:
//!
//! ```text
//! [doy, seconds, lon, lat, alt, f107, f107a, ap0, ap1, ap2, ap3, ap4, ap5, ap6]
//! ```
//!
//! ## Trajectory or grid
//!
//! * When times, longitudes, latitudes and altitudes all have the same length `n`, the
//!   inputs describe `n` points (e.g. a satellite track): row `i` takes element `i` of
//!   every array and the shape is `(n,)`.
//! * Otherwise the rows cover the full grid `(n_time, n_lon, n_lat, n_alt)`, flattened
//!   row-major (altitude fastest). The drivers follow the time index.
//!
//! [`GridMode::Grid`] forces the grid interpretation even when the lengths match.
//!
//! ## Drivers
//!
//! Any of F10.7, F10.7a or ap that is not given is read from a [`DriverIndexStore`]
//! for each requested time, with a single query covering all missing arrays. Given
//! drivers are used as-is. After defaulting each driver array must have one entry per
//! time.
use hifitime::Epoch;
use itertools::izip;

use crate::{
    constants::{
        ApVector, Degree, InputRow, Kilometer, COL_ALT, COL_AP, COL_DOY, COL_F107, COL_F107A,
        COL_LAT, COL_LON, COL_SECONDS, N_AP, N_INPUT_FIELDS,
    },
    drivers::{default_store, DriverIndexStore},
    msis_errors::MsisError,
    time::civil_time,
};

/// Coordinates, times and optional drivers of an evaluation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EvaluationRequest<'a> {
    pub times: &'a [Epoch],
    pub lons: &'a [Degree],
    pub lats: &'a [Degree],
    pub alts: &'a [Kilometer],
    /// Daily F10.7 of the previous day, one per time
    pub f107: Option<&'a [f64]>,
    /// 81-day centred F10.7 average, one per time
    pub f107a: Option<&'a [f64]>,
    /// ap vectors, one per time
    pub ap: Option<&'a [ApVector]>,
}

impl<'a> EvaluationRequest<'a> {
    pub fn new(
        times: &'a [Epoch],
        lons: &'a [Degree],
        lats: &'a [Degree],
        alts: &'a [Kilometer],
    ) -> Self {
        EvaluationRequest {
            times,
            lons,
            lats,
            alts,
            f107: None,
            f107a: None,
            ap: None,
        }
    }

    pub fn with_f107(mut self, f107: &'a [f64]) -> Self {
        self.f107 = Some(f107);
        self
    }

    pub fn with_f107a(mut self, f107a: &'a [f64]) -> Self {
        self.f107a = Some(f107a);
        self
    }

    pub fn with_ap(mut self, ap: &'a [ApVector]) -> Self {
        self.ap = Some(ap);
        self
    }

    fn needs_drivers(&self) -> bool {
        self.f107.is_none() || self.f107a.is_none() || self.ap.is_none()
    }
}

/// How matching axis lengths are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GridMode {
    /// Trajectory when all four axes have the same length, grid otherwise
    #[default]
    Auto,
    /// Always build the full grid
    Grid,
}

/// Logical shape of an evaluation batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchShape {
    /// `n` independent points
    Trajectory(usize),
    /// `(n_time, n_lon, n_lat, n_alt)`
    Grid([usize; 4]),
}

impl BatchShape {
    pub fn dims(&self) -> Vec<usize> {
        match self {
            BatchShape::Trajectory(n) => vec![*n],
            BatchShape::Grid(dims) => dims.to_vec(),
        }
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        match self {
            BatchShape::Trajectory(n) => *n,
            BatchShape::Grid(dims) => dims.iter().product(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Flat table of evaluation rows with its logical shape.
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationBatch {
    pub shape: BatchShape,
    pub rows: Vec<InputRow>,
}

impl EvaluationBatch {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Resolved per-time drivers.
struct Drivers {
    f107: Vec<f64>,
    f107a: Vec<f64>,
    ap: Vec<ApVector>,
}

fn resolve_drivers(
    request: &EvaluationRequest,
    store: &DriverIndexStore,
    interpolate: bool,
) -> Result<Drivers, MsisError> {
    let looked_up = if request.needs_drivers() {
        Some(store.query(request.times, interpolate)?)
    } else {
        None
    };

    let (f107, f107a, ap) = match looked_up {
        Some(lookup) => (
            request.f107.map_or(lookup.f107, <[f64]>::to_vec),
            request.f107a.map_or(lookup.f107a, <[f64]>::to_vec),
            request.ap.map_or(lookup.ap, <[ApVector]>::to_vec),
        ),
        None => (
            request.f107.unwrap_or_default().to_vec(),
            request.f107a.unwrap_or_default().to_vec(),
            request.ap.unwrap_or_default().to_vec(),
        ),
    };

    let n_times = request.times.len();
    if f107.len() != n_times || f107a.len() != n_times || ap.len() != n_times {
        return Err(MsisError::DriverLengthMismatch {
            dates: n_times,
            f107s: f107.len(),
            f107as: f107a.len(),
            aps: ap.len(),
        });
    }

    Ok(Drivers { f107, f107a, ap })
}

/// Row with the time dependent fields set and zero coordinates.
fn time_row(time: &Epoch, f107: f64, f107a: f64, ap: &ApVector) -> InputRow {
    let civil = civil_time(time);
    let mut row: InputRow = [0.0; N_INPUT_FIELDS];
    row[COL_DOY] = f32::from(civil.day_of_year);
    row[COL_SECONDS] = civil.seconds_of_day as f32;
    row[COL_F107] = f107 as f32;
    row[COL_F107A] = f107a as f32;
    for (dst, src) in row[COL_AP..COL_AP + N_AP].iter_mut().zip(ap.iter()) {
        *dst = *src as f32;
    }
    row
}

/// Write `values` into column `col`, each value repeated over `repeat` consecutive
/// rows and the whole pattern tiled until the table is full.
fn broadcast_column(rows: &mut [InputRow], col: usize, values: &[f64], repeat: usize) {
    for (chunk, value) in rows.chunks_mut(repeat).zip(values.iter().cycle()) {
        for row in chunk {
            row[col] = *value as f32;
        }
    }
}

fn check_finite(rows: &[InputRow]) -> Result<(), MsisError> {
    for (row_idx, row) in rows.iter().enumerate() {
        if let Some(field) = row.iter().position(|v| !v.is_finite()) {
            return Err(MsisError::NonFiniteInput {
                row: row_idx,
                field,
            });
        }
    }
    Ok(())
}

/// Build the evaluation table, defaulting missing drivers from `store`.
///
/// Arguments
/// ---------
/// * `request`: coordinates, times and optional drivers
/// * `store`: where missing drivers are read from; not touched when every driver is given
/// * `interpolate`: interpolate the looked-up drivers instead of step values
/// * `mode`: trajectory/grid selection
///
/// Return
/// ------
/// * the batch of rows with its logical shape
///
/// Errors
/// ------
/// * [`MsisError::DriverLengthMismatch`] when a driver array does not have one entry per time
/// * [`MsisError::NonFiniteInput`] when a field of the table is NaN or infinite
/// * any error of [`DriverIndexStore::query`] when drivers had to be looked up
pub fn create_input_from_store(
    request: &EvaluationRequest,
    store: &DriverIndexStore,
    interpolate: bool,
    mode: GridMode,
) -> Result<EvaluationBatch, MsisError> {
    let drivers = resolve_drivers(request, store, interpolate)?;

    let n_times = request.times.len();
    let (n_lon, n_lat, n_alt) = (request.lons.len(), request.lats.len(), request.alts.len());

    let trajectory =
        mode == GridMode::Auto && n_times == n_lon && n_times == n_lat && n_times == n_alt;

    let shape = if trajectory {
        BatchShape::Trajectory(n_times)
    } else {
        BatchShape::Grid([n_times, n_lon, n_lat, n_alt])
    };

    if shape.is_empty() {
        return Ok(EvaluationBatch {
            shape,
            rows: Vec::new(),
        });
    }

    let templates = izip!(request.times, &drivers.f107, &drivers.f107a, &drivers.ap)
        .map(|(time, f107, f107a, ap)| time_row(time, *f107, *f107a, ap));

    let rows: Vec<InputRow> = if trajectory {
        izip!(templates, request.lons, request.lats, request.alts)
            .map(|(mut row, lon, lat, alt)| {
                row[COL_LON] = *lon as f32;
                row[COL_LAT] = *lat as f32;
                row[COL_ALT] = *alt as f32;
                row
            })
            .collect()
    } else {
        let block = n_lon * n_lat * n_alt;
        let mut rows: Vec<InputRow> = vec![[0.0; N_INPUT_FIELDS]; shape.len()];
        for (chunk, template) in rows.chunks_mut(block).zip(templates) {
            chunk.fill(template);
        }
        broadcast_column(&mut rows, COL_LON, request.lons, n_lat * n_alt);
        broadcast_column(&mut rows, COL_LAT, request.lats, n_alt);
        broadcast_column(&mut rows, COL_ALT, request.alts, 1);
        rows
    };

    check_finite(&rows)?;

    Ok(EvaluationBatch { shape, rows })
}

/// [`create_input_from_store`] on the process-wide driver store.
pub fn create_input(
    request: &EvaluationRequest,
    interpolate: bool,
    mode: GridMode,
) -> Result<EvaluationBatch, MsisError> {
    create_input_from_store(request, &default_store(), interpolate, mode)
}

#[cfg(test)]
mod input_test {
    use super::*;
    use camino::Utf8Path;
    use std::str::FromStr;

    const EXPECTED: InputRow = [
        1.0, 43200.0, 0.0, 0.0, 200.0, 150.0, 150.0, 3.0, 3.0, 3.0, 3.0, 3.0, 3.0, 3.0,
    ];

    /// Store that fails on any access.
    fn unreachable_store() -> DriverIndexStore {
        DriverIndexStore::from_local_file(Utf8Path::new("/no/such/dir/SW-All.csv"))
    }

    fn noon() -> Epoch {
        Epoch::from_str("2010-01-01T12:00:00").unwrap()
    }

    fn marshal(request: &EvaluationRequest) -> Result<EvaluationBatch, MsisError> {
        create_input_from_store(request, &unreachable_store(), false, GridMode::Auto)
    }

    #[test]
    fn test_single_point() {
        let times = [noon()];
        let ap = [ApVector::from_element(3.0)];
        let request = EvaluationRequest::new(&times, &[0.0], &[0.0], &[200.0])
            .with_f107(&[150.0])
            .with_f107a(&[150.0])
            .with_ap(&ap);

        let batch = marshal(&request).unwrap();
        assert_eq!(batch.shape, BatchShape::Trajectory(1));
        assert_eq!(batch.rows, vec![EXPECTED]);
    }

    #[test]
    fn test_multi_axes() {
        let times = [noon()];
        let ap = [ApVector::from_element(3.0)];
        let five = [0.0; 5];
        let alts = [200.0; 5];
        let base = EvaluationRequest::new(&times, &[0.0], &[0.0], &[200.0])
            .with_f107(&[150.0])
            .with_f107a(&[150.0])
            .with_ap(&ap);

        let cases = [
            (EvaluationRequest { lons: &five, ..base }, [1, 5, 1, 1]),
            (EvaluationRequest { lats: &five, ..base }, [1, 1, 5, 1]),
            (EvaluationRequest { alts: &alts, ..base }, [1, 1, 1, 5]),
            (
                EvaluationRequest {
                    lons: &five,
                    lats: &five,
                    ..base
                },
                [1, 5, 5, 1],
            ),
        ];

        for (request, dims) in cases {
            let batch = marshal(&request).unwrap();
            assert_eq!(batch.shape, BatchShape::Grid(dims));
            assert_eq!(batch.rows, vec![EXPECTED; dims.iter().product()]);
        }
    }

    #[test]
    fn test_multi_date() {
        let times = [noon(); 5];
        let ap = [ApVector::from_element(3.0); 5];
        let request = EvaluationRequest::new(&times, &[0.0], &[0.0], &[200.0])
            .with_f107(&[150.0; 5])
            .with_f107a(&[150.0; 5])
            .with_ap(&ap);

        let batch = marshal(&request).unwrap();
        assert_eq!(batch.shape, BatchShape::Grid([5, 1, 1, 1]));
        assert_eq!(batch.rows, vec![EXPECTED; 5]);
    }

    #[test]
    fn test_driver_length_mismatch() {
        let times = [noon(); 5];
        let ap = [ApVector::from_element(3.0)];
        let request = EvaluationRequest::new(&times, &[0.0], &[0.0], &[200.0])
            .with_f107(&[150.0])
            .with_f107a(&[150.0])
            .with_ap(&ap);

        let err = marshal(&request).unwrap_err();
        assert_eq!(
            err,
            MsisError::DriverLengthMismatch {
                dates: 5,
                f107s: 1,
                f107as: 1,
                aps: 1
            }
        );
        assert!(err.to_string().starts_with("The length of dates (5)"));
    }

    #[test]
    fn test_grid_ordering() {
        let times = [noon(), Epoch::from_str("2010-01-02T06:00:00").unwrap()];
        let ap = [ApVector::from_element(3.0), ApVector::from_element(9.0)];
        let lons = [10.0, 20.0, 30.0];
        let lats = [-5.0, 5.0];
        let alts = [100.0, 200.0, 300.0, 400.0];
        let request = EvaluationRequest::new(&times, &lons, &lats, &alts)
            .with_f107(&[150.0, 160.0])
            .with_f107a(&[151.0, 161.0])
            .with_ap(&ap);

        let batch = marshal(&request).unwrap();
        assert_eq!(batch.shape, BatchShape::Grid([2, 3, 2, 4]));
        assert_eq!(batch.len(), 48);

        for (t, i, j, k) in itertools::iproduct!(0..2, 0..3, 0..2, 0..4) {
            let row = batch.rows[((t * 3 + i) * 2 + j) * 4 + k];
            assert_eq!(row[COL_LON], lons[i] as f32);
            assert_eq!(row[COL_LAT], lats[j] as f32);
            assert_eq!(row[COL_ALT], alts[k] as f32);
            assert_eq!(row[COL_F107], [150.0, 160.0][t]);
            assert_eq!(row[COL_F107A], [151.0, 161.0][t]);
            assert_eq!(row[COL_AP + 6], [3.0, 9.0][t]);
            assert_eq!(row[COL_DOY], [1.0, 2.0][t]);
            assert_eq!(row[COL_SECONDS], [43200.0, 21600.0][t]);
        }
    }

    #[test]
    fn test_trajectory_pairs_elements() {
        let times = [noon(), Epoch::from_str("2010-03-01T00:00:30").unwrap()];
        let ap = [ApVector::from_element(3.0); 2];
        let request = EvaluationRequest::new(&times, &[10.0, 20.0], &[1.0, 2.0], &[300.0, 400.0])
            .with_f107(&[150.0; 2])
            .with_f107a(&[150.0; 2])
            .with_ap(&ap);

        let batch = marshal(&request).unwrap();
        assert_eq!(batch.shape, BatchShape::Trajectory(2));
        assert_eq!(batch.rows[1][COL_DOY], 60.0);
        assert_eq!(batch.rows[1][COL_SECONDS], 30.0);
        assert_eq!(batch.rows[1][COL_LON], 20.0);
        assert_eq!(batch.rows[1][COL_LAT], 2.0);
        assert_eq!(batch.rows[1][COL_ALT], 400.0);

        // same inputs, grid forced
        let grid =
            create_input_from_store(&request, &unreachable_store(), false, GridMode::Grid).unwrap();
        assert_eq!(grid.shape, BatchShape::Grid([2, 2, 2, 2]));
        assert_eq!(grid.len(), 16);
    }

    #[test]
    fn test_non_finite_input() {
        let times = [noon()];
        let ap = [ApVector::from_element(3.0)];
        let request = EvaluationRequest::new(&times, &[0.0], &[f64::NAN], &[200.0])
            .with_f107(&[150.0])
            .with_f107a(&[150.0])
            .with_ap(&ap);

        assert_eq!(
            marshal(&request).unwrap_err(),
            MsisError::NonFiniteInput { row: 0, field: 3 }
        );
    }

    #[test]
    fn test_empty_axis() {
        let times = [noon()];
        let ap = [ApVector::from_element(3.0)];
        let request = EvaluationRequest::new(&times, &[], &[0.0], &[200.0])
            .with_f107(&[150.0])
            .with_f107a(&[150.0])
            .with_ap(&ap);

        let batch = marshal(&request).unwrap();
        assert_eq!(batch.shape, BatchShape::Grid([1, 0, 1, 1]));
        assert!(batch.is_empty());
    }

    #[test]
    fn test_missing_driver_reads_the_store() {
        let times = [noon()];
        let request = EvaluationRequest::new(&times, &[0.0], &[0.0], &[200.0]);
        assert!(matches!(marshal(&request), Err(MsisError::IoError(_))));
    }
}
