//! # Msis: session handle over the kernel family
//!
//! This module defines [`Msis`](crate::msis::Msis), the façade that wires together:
//!
//! 1. **Kernel table** ([`KernelTable`](crate::kernel::KernelTable)): one implementation per
//!    [`MsisVersion`](crate::kernel::msis_version::MsisVersion).
//! 2. **Switch cache**: the last switch vector loaded into each kernel, so a kernel is only
//!    reinitialized when the switches actually change.
//! 3. **Driver store** ([`DriverIndexStore`](crate::drivers::DriverIndexStore)): source of the
//!    F10.7 and ap values the caller did not provide.
//!
//! ## Concurrency
//!
//! Kernels keep their switches as process state. Each version therefore has its own
//! mutex, held from the switch comparison until the evaluation returns, so a thread can
//! never reinitialize a kernel another thread is evaluating with. Marshaling and driver
//! lookups happen before the lock is taken; different versions never contend.
//!
//! ## Output
//!
//! Kernel outputs are normalized to 11 columns ([`Variable`](crate::variable::Variable)):
//! releases without NO get a NaN column, and values in the kernel's "not computed"
//! sentinel band `[9.9e-38, 1e-37)` become NaN.
//!
//! ## Typical usage
//!
//! ```rust, ignore
//! use std::sync::Arc;
//! use msiskit::kernel::{KernelTable, msis_version::MsisVersion};
//! use msiskit::input::EvaluationRequest;
//! use msiskit::msis::{CalculateOptions, Msis};
//! use msiskit::variable::Variable;
//!
//! let kernels = KernelTable::new().with_kernel(MsisVersion::V21, Arc::new(my_kernel))?;
//! let msis = Msis::new(kernels);
//!
//! let times = msiskit::time::parse_epochs(&["2003-10-29T12:00:00"])?;
//! let request = EvaluationRequest::new(&times, &[0.0], &[0.0], &[400.0]);
//! let output = msis.calculate(&request, &CalculateOptions::default())?;
//! println!("rho = {}", output.get(0, Variable::MassDensity));
//! ```
//!
//! ## See also
//! ------------
//! * [`create_input_from_store`](crate::input::create_input_from_store) – marshaling step.
//! * [`MsisKernel`](crate::kernel::MsisKernel) – kernel contract.
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use crate::{
    constants::{N_OUTPUT_FIELDS, SENTINEL_HIGH, SENTINEL_LOW},
    drivers::{default_store, DriverIndexStore},
    input::{create_input_from_store, EvaluationBatch, EvaluationRequest, GridMode},
    kernel::{msis_version::MsisVersion, KernelColumns, KernelTable},
    msis_errors::MsisError,
    switches::{create_switches, Switch, Switches},
    variable::Variable,
};

/// Options of [`Msis::calculate`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CalculateOptions {
    pub version: MsisVersion,
    /// Raw 25-value switch vector; when set, `flags` are ignored
    pub switches: Option<Vec<f64>>,
    /// Named switches, every other switch at 1
    pub flags: Vec<(Switch, f64)>,
    /// Interpolate the looked-up drivers
    pub interpolate: bool,
    pub grid_mode: GridMode,
}

impl CalculateOptions {
    pub fn with_version(mut self, version: MsisVersion) -> Self {
        self.version = version;
        self
    }

    pub fn with_switches(mut self, switches: Vec<f64>) -> Self {
        self.switches = Some(switches);
        self
    }

    pub fn with_switch(mut self, switch: Switch, value: f64) -> Self {
        self.flags.push((switch, value));
        self
    }

    pub fn with_interpolation(mut self, interpolate: bool) -> Self {
        self.interpolate = interpolate;
        self
    }

    pub fn with_grid_mode(mut self, grid_mode: GridMode) -> Self {
        self.grid_mode = grid_mode;
        self
    }

    /// The switch vector these options select.
    pub fn resolve_switches(&self) -> Result<Switches, MsisError> {
        match &self.switches {
            Some(raw) => Switches::from_slice(raw),
            None => Ok(create_switches(self.flags.iter().copied())),
        }
    }
}

/// Normalized kernel output: the batch shape with 11 values per point.
#[derive(Debug, Clone, PartialEq)]
pub struct MsisOutput {
    shape: Vec<usize>,
    values: Vec<f64>,
}

impl MsisOutput {
    /// Batch dimensions followed by the number of variables.
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// All values, row-major.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn n_points(&self) -> usize {
        self.values.len() / N_OUTPUT_FIELDS
    }

    /// The 11 values of the `index`-th point in flat row order.
    pub fn point(&self, index: usize) -> &[f64] {
        &self.values[index * N_OUTPUT_FIELDS..(index + 1) * N_OUTPUT_FIELDS]
    }

    pub fn get(&self, index: usize, variable: Variable) -> f64 {
        self.values[index * N_OUTPUT_FIELDS + variable.column()]
    }

    /// One variable over every point.
    pub fn variable(&self, variable: Variable) -> Vec<f64> {
        self.values
            .iter()
            .skip(variable.column())
            .step_by(N_OUTPUT_FIELDS)
            .copied()
            .collect()
    }

    pub fn points(&self) -> impl Iterator<Item = &[f64]> {
        self.values.chunks_exact(N_OUTPUT_FIELDS)
    }
}

/// True for values the kernel flags as not computed.
fn is_sentinel(value: f64) -> bool {
    (SENTINEL_LOW..SENTINEL_HIGH).contains(&value.abs())
}

/// Map the sentinel band to NaN and bring every row to 11 columns.
fn normalize_output(raw: &[f64], width: usize) -> Vec<f64> {
    let clean = |v: &f64| if is_sentinel(*v) { f64::NAN } else { *v };

    if width == N_OUTPUT_FIELDS {
        return raw.iter().map(clean).collect();
    }

    let no_column = Variable::NO.column();
    let mut values = Vec::with_capacity(raw.len() / width * N_OUTPUT_FIELDS);
    for row in raw.chunks_exact(width) {
        values.extend(row[..no_column].iter().map(clean));
        values.push(f64::NAN);
        values.extend(row[no_column..].iter().map(clean));
    }
    values
}

/// Session over a set of kernels.
#[derive(Debug)]
pub struct Msis {
    kernels: KernelTable,
    last_switches: [Mutex<Option<Switches>>; MsisVersion::COUNT],
    store: Arc<DriverIndexStore>,
}

impl Msis {
    /// Session using the process-wide driver store.
    pub fn new(kernels: KernelTable) -> Self {
        Msis::with_store(kernels, default_store())
    }

    pub fn with_store(kernels: KernelTable, store: Arc<DriverIndexStore>) -> Self {
        Msis {
            kernels,
            last_switches: std::array::from_fn(|_| Mutex::new(None)),
            store,
        }
    }

    pub fn store(&self) -> &DriverIndexStore {
        &self.store
    }

    pub fn kernels(&self) -> &KernelTable {
        &self.kernels
    }

    /// Switches currently loaded into the kernel of `version`, if it was initialized.
    pub fn last_switches(&self, version: MsisVersion) -> Option<Switches> {
        *self.last_switches[version.index()].lock()
    }

    /// Marshal the request and evaluate it.
    ///
    /// Arguments
    /// ---------
    /// * `request`: coordinates, times and optional drivers
    /// * `options`: version, switches, driver interpolation and grid mode
    ///
    /// Return
    /// ------
    /// * the normalized output with shape `(n, 11)` or `(n_time, n_lon, n_lat, n_alt, 11)`
    ///
    /// Errors
    /// ------
    /// * switch and version errors are raised before anything else, no kernel is called
    /// * marshaling errors of [`create_input_from_store`]
    /// * kernel errors
    pub fn calculate(
        &self,
        request: &EvaluationRequest,
        options: &CalculateOptions,
    ) -> Result<MsisOutput, MsisError> {
        let switches = options.resolve_switches()?;
        self.kernels.get(options.version)?;

        let batch =
            create_input_from_store(request, &self.store, options.interpolate, options.grid_mode)?;

        self.evaluate(&batch, options.version, &switches)
    }

    /// Evaluate an already marshaled batch.
    pub fn evaluate(
        &self,
        batch: &EvaluationBatch,
        version: MsisVersion,
        switches: &Switches,
    ) -> Result<MsisOutput, MsisError> {
        let entry = self.kernels.get(version)?;

        let mut shape = batch.shape.dims();
        shape.push(N_OUTPUT_FIELDS);

        if batch.is_empty() {
            return Ok(MsisOutput {
                shape,
                values: Vec::new(),
            });
        }

        let columns = KernelColumns::from_rows(&batch.rows);

        let raw = {
            let mut last = self.last_switches[version.index()].lock();
            if last.as_ref() != Some(switches) {
                debug!("Initializing MSIS {version} kernel with new switches");
                entry
                    .kernel
                    .init_switches(switches, entry.parameter_dir.as_deref())?;
                *last = Some(*switches);
            }
            entry.kernel.calculate(&columns)?
        };

        let expected = batch.len() * entry.output_width;
        if raw.len() != expected {
            return Err(MsisError::KernelOutputShape {
                expected,
                got: raw.len(),
            });
        }

        Ok(MsisOutput {
            shape,
            values: normalize_output(&raw, entry.output_width),
        })
    }
}

#[cfg(test)]
mod msis_test {
    use super::*;

    #[test]
    fn test_sentinel_band() {
        assert!(is_sentinel(9.9e-38));
        assert!(is_sentinel(9.99e-38));
        assert!(is_sentinel(-9.95e-38));
        assert!(!is_sentinel(1.0e-37));
        assert!(!is_sentinel(9.8e-38));
        assert!(!is_sentinel(0.0));
        assert!(!is_sentinel(1.0e20));
    }

    #[test]
    fn test_sentinel_band_edges_in_double_precision() {
        // both round to the same f32 as the nearest bound
        assert!(!is_sentinel(9.8999999e-38));
        assert!(is_sentinel(9.9999999e-38));
        assert!(is_sentinel(-9.9999999e-38));
    }

    #[test]
    fn test_normalize_full_width() {
        let raw = vec![1.0, 9.99e-38, 3.0, 1.0e-37, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0, 11.0];
        let values = normalize_output(&raw, 11);
        assert_eq!(values.len(), 11);
        assert!(values[1].is_nan());
        assert_eq!(values[3], 1.0e-37);
        assert_eq!(values[10], 11.0);
    }

    #[test]
    fn test_normalize_widens_rows() {
        let raw: Vec<f64> = (0..20).map(f64::from).collect();
        let values = normalize_output(&raw, 10);
        assert_eq!(values.len(), 22);
        assert!(values[9].is_nan());
        assert!(values[20].is_nan());
        assert_eq!(values[10], 9.0);
        assert_eq!(values[11], 10.0);
        assert_eq!(values[21], 19.0);
    }

    #[test]
    fn test_output_accessors() {
        let output = MsisOutput {
            shape: vec![2, 11],
            values: (0..22).map(f64::from).collect(),
        };
        assert_eq!(output.n_points(), 2);
        assert_eq!(output.point(1)[0], 11.0);
        assert_eq!(output.get(1, Variable::Temperature), 21.0);
        assert_eq!(output.variable(Variable::N2), vec![1.0, 12.0]);
        assert_eq!(output.points().count(), 2);
    }

    #[test]
    fn test_options_switches() {
        let options = CalculateOptions::default().with_switch(Switch::Diurnal, 0.0);
        assert_eq!(options.resolve_switches().unwrap().get(Switch::Diurnal), 0.0);

        let options = options.with_switches(vec![1.0; 22]);
        assert_eq!(
            options.resolve_switches().unwrap_err(),
            MsisError::InvalidSwitchCount {
                expected: 25,
                got: 22
            }
        );
    }
}
