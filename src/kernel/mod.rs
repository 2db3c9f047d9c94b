//! # Kernel contract
//!
//! The physics itself lives in external, versioned kernels. This module defines the
//! narrow contract they are reached through and the table mapping each
//! [`MsisVersion`] to its implementation.
//!
//! ## Calling convention
//!
//! 1. [`MsisKernel::init_switches`] loads the switch vector (and the kernel parameter
//!    files for releases that need them). It must be called before the first
//!    evaluation and after every switch change.
//! 2. [`MsisKernel::calculate`] evaluates a batch given as named columns
//!    ([`KernelColumns`]) and returns `n × width` values, row-major.
//!
//! Kernels hold their switches as process state, so a kernel must never be
//! reinitialized while it is evaluating. [`crate::msis::Msis`] enforces this with one
//! lock per version.
//!
//! ## See also
//! ------------
//! * [`msis_version`] – version selector and aliases.
//! * [`crate::msis::Msis`] – dispatcher built on top of this table.
use std::{collections::HashMap, fmt, sync::Arc};

use camino::{Utf8Path, Utf8PathBuf};

use crate::{
    constants::{
        InputRow, COL_ALT, COL_AP, COL_DOY, COL_F107, COL_F107A, COL_LAT, COL_LON, COL_SECONDS,
        N_AP, N_OUTPUT_FIELDS,
    },
    msis_errors::MsisError,
    switches::Switches,
};

pub mod msis_version;

use msis_version::MsisVersion;

/// Column arrays of an evaluation batch, in the kernel's single precision.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KernelColumns {
    pub day: Vec<f32>,
    pub utsec: Vec<f32>,
    pub lon: Vec<f32>,
    pub lat: Vec<f32>,
    pub alt: Vec<f32>,
    pub f107: Vec<f32>,
    pub f107a: Vec<f32>,
    pub ap: Vec<[f32; N_AP]>,
}

impl KernelColumns {
    /// Split evaluation rows into columns.
    pub fn from_rows(rows: &[InputRow]) -> Self {
        let column = |col: usize| rows.iter().map(|row| row[col]).collect::<Vec<f32>>();

        let ap = rows
            .iter()
            .map(|row| {
                let mut ap = [0.0; N_AP];
                ap.copy_from_slice(&row[COL_AP..COL_AP + N_AP]);
                ap
            })
            .collect();

        KernelColumns {
            day: column(COL_DOY),
            utsec: column(COL_SECONDS),
            lon: column(COL_LON),
            lat: column(COL_LAT),
            alt: column(COL_ALT),
            f107: column(COL_F107),
            f107a: column(COL_F107A),
            ap,
        }
    }

    pub fn len(&self) -> usize {
        self.day.len()
    }

    pub fn is_empty(&self) -> bool {
        self.day.is_empty()
    }
}

/// An MSIS kernel implementation.
pub trait MsisKernel: Send + Sync {
    /// Load the switches, with the directory holding the kernel parameter files if any.
    fn init_switches(
        &self,
        switches: &Switches,
        parameter_dir: Option<&Utf8Path>,
    ) -> Result<(), MsisError>;

    /// Evaluate every row, returning `n × width` values row-major.
    fn calculate(&self, columns: &KernelColumns) -> Result<Vec<f64>, MsisError>;
}

/// A registered kernel.
#[derive(Clone)]
pub struct KernelEntry {
    pub kernel: Arc<dyn MsisKernel>,
    /// Number of values per output row: 10 without NO, 11 with it
    pub output_width: usize,
    pub parameter_dir: Option<Utf8PathBuf>,
}

impl fmt::Debug for KernelEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KernelEntry")
            .field("output_width", &self.output_width)
            .field("parameter_dir", &self.parameter_dir)
            .finish_non_exhaustive()
    }
}

/// Version → kernel table.
#[derive(Debug, Clone, Default)]
pub struct KernelTable {
    entries: HashMap<MsisVersion, KernelEntry>,
}

impl KernelTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a kernel, replacing any previous one for that version.
    ///
    /// Arguments
    /// ---------
    /// * `version`: the release the kernel implements
    /// * `kernel`: the implementation
    /// * `output_width`: values per output row, 10 or 11
    /// * `parameter_dir`: directory of the kernel parameter files, if the kernel needs one
    ///
    /// Return
    /// ------
    /// * [`MsisError::InvalidKernelWidth`] if the width is neither 10 nor 11
    pub fn register(
        &mut self,
        version: MsisVersion,
        kernel: Arc<dyn MsisKernel>,
        output_width: usize,
        parameter_dir: Option<Utf8PathBuf>,
    ) -> Result<(), MsisError> {
        if output_width != N_OUTPUT_FIELDS && output_width != N_OUTPUT_FIELDS - 1 {
            return Err(MsisError::InvalidKernelWidth {
                version,
                width: output_width,
            });
        }
        self.entries.insert(
            version,
            KernelEntry {
                kernel,
                output_width,
                parameter_dir,
            },
        );
        Ok(())
    }

    /// Builder form of [`KernelTable::register`] using the release's native width.
    pub fn with_kernel(
        mut self,
        version: MsisVersion,
        kernel: Arc<dyn MsisKernel>,
    ) -> Result<Self, MsisError> {
        self.register(version, kernel, version.output_width(), None)?;
        Ok(self)
    }

    pub fn get(&self, version: MsisVersion) -> Result<&KernelEntry, MsisError> {
        self.entries
            .get(&version)
            .ok_or(MsisError::KernelNotRegistered(version))
    }

    pub fn versions(&self) -> Vec<MsisVersion> {
        let mut versions: Vec<MsisVersion> = self.entries.keys().copied().collect();
        versions.sort();
        versions
    }
}
