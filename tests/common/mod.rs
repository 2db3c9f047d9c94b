#![allow(dead_code)]

use std::{
    str::FromStr,
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc,
    },
};

use camino::{Utf8Path, Utf8PathBuf};
use hifitime::Epoch;
use msiskit::{
    drivers::DriverIndexStore,
    kernel::{msis_version::MsisVersion, KernelColumns, KernelTable, MsisKernel},
    msis::Msis,
    msis_errors::MsisError,
    switches::Switches,
};
use parking_lot::Mutex;

/// Altitude below which the mock reports O, H and N as not computed
pub const MOCK_SENTINEL_ALTITUDE: f32 = 72.5;

/// Deterministic stand-in for a compiled kernel.
///
/// Each value depends on the altitude, the column, the F10.7 and the sum of the loaded
/// switches. The switches are read again for every row so an evaluation racing with a
/// reinitialization produces inconsistent rows.
pub struct MockKernel {
    version: MsisVersion,
    switches: Mutex<Option<Switches>>,
    fail_init: AtomicBool,
    init_calls: AtomicUsize,
    calc_calls: AtomicUsize,
}

impl MockKernel {
    pub fn new(version: MsisVersion) -> Self {
        MockKernel {
            version,
            switches: Mutex::new(None),
            fail_init: AtomicBool::new(false),
            init_calls: AtomicUsize::new(0),
            calc_calls: AtomicUsize::new(0),
        }
    }

    pub fn init_calls(&self) -> usize {
        self.init_calls.load(Ordering::SeqCst)
    }

    pub fn calc_calls(&self) -> usize {
        self.calc_calls.load(Ordering::SeqCst)
    }

    pub fn set_fail_init(&self, fail: bool) {
        self.fail_init.store(fail, Ordering::SeqCst);
    }

    /// Value the mock writes for one row and column.
    pub fn expected_value(alt: f32, f107: f32, column: usize, switch_sum: f64) -> f64 {
        f64::from(alt) * (column + 1) as f64 + f64::from(f107) + switch_sum
    }
}

impl MsisKernel for MockKernel {
    fn init_switches(
        &self,
        switches: &Switches,
        _parameter_dir: Option<&Utf8Path>,
    ) -> Result<(), MsisError> {
        self.init_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_init.load(Ordering::SeqCst) {
            return Err(MsisError::KernelFailure {
                version: self.version,
                message: "parameter file not found".to_string(),
            });
        }
        *self.switches.lock() = Some(*switches);
        Ok(())
    }

    fn calculate(&self, columns: &KernelColumns) -> Result<Vec<f64>, MsisError> {
        self.calc_calls.fetch_add(1, Ordering::SeqCst);
        let width = self.version.output_width();
        let mut output = Vec::with_capacity(columns.len() * width);

        for (alt, f107) in columns.alt.iter().zip(&columns.f107) {
            let loaded = *self.switches.lock();
            let switch_sum: f64 = loaded
                .ok_or_else(|| MsisError::KernelFailure {
                    version: self.version,
                    message: "switches not initialized".to_string(),
                })?
                .as_slice()
                .iter()
                .sum();

            for column in 0..width {
                let sentinel = *alt < MOCK_SENTINEL_ALTITUDE && matches!(column, 3 | 5 | 7);
                output.push(if sentinel {
                    9.99e-38
                } else {
                    MockKernel::expected_value(*alt, *f107, column, switch_sum)
                });
            }
        }
        Ok(output)
    }
}

pub struct MockSetup {
    pub msis: Msis,
    pub kernels: Vec<Arc<MockKernel>>,
}

impl MockSetup {
    pub fn kernel(&self, version: MsisVersion) -> &MockKernel {
        &self.kernels[version.index()]
    }
}

/// Session with one mock kernel per version and the fixture driver store.
pub fn mock_setup() -> MockSetup {
    let kernels: Vec<Arc<MockKernel>> = MsisVersion::ALL
        .iter()
        .map(|version| Arc::new(MockKernel::new(*version)))
        .collect();

    let table = MsisVersion::ALL
        .iter()
        .zip(&kernels)
        .try_fold(KernelTable::new(), |table, (version, kernel)| {
            table.with_kernel(*version, Arc::clone(kernel) as Arc<dyn MsisKernel>)
        })
        .unwrap();

    MockSetup {
        msis: Msis::with_store(table, fixture_store()),
        kernels,
    }
}

pub fn fixture_path() -> Utf8PathBuf {
    Utf8PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("data")
        .join("sw_test_data.csv")
}

/// Store reading the 2000 fixture in place.
pub fn fixture_store() -> Arc<DriverIndexStore> {
    Arc::new(DriverIndexStore::from_local_file(&fixture_path()))
}

pub fn epoch(date: &str) -> Epoch {
    Epoch::from_str(date).unwrap()
}
