//! # Driver index store
//!
//! The [`DriverIndexStore`] serves the solar (F10.7) and geomagnetic (ap) drivers the
//! kernel needs for each evaluation time, taken from the CelesTrak space weather file.
//!
//! ## Lifecycle
//!
//! 1. The store is created with a [`DriverStoreConfig`]; nothing is read yet.
//! 2. The first [`query`](DriverIndexStore::query) (or an explicit
//!    [`load`](DriverIndexStore::load)) makes sure a local copy of the file exists,
//!    downloading it once if needed, then parses it into a [`DriverTimeSeries`].
//! 3. The parsed series is kept for the lifetime of the store and shared between
//!    threads. [`reload`](DriverIndexStore::reload) fetches the file again and swaps the
//!    series.
//!
//! A process-wide store is available through [`default_store`] and the
//! [`lookup_drivers`] shortcut. Its cache path can be moved with the `MSISKIT_SW_FILE`
//! environment variable.
//!
//! ## Example
//!
//! ```rust, no_run
//! use msiskit::drivers::{DriverIndexStore, DriverStoreConfig};
//! use msiskit::time::parse_epochs;
//!
//! let store = DriverIndexStore::new(DriverStoreConfig::default());
//! let times = parse_epochs(&["2003-10-29T12:00:00"]).unwrap();
//! let drivers = store.query(&times, false).unwrap();
//! println!("F10.7 = {}, Ap = {}", drivers.f107[0], drivers.ap[0][0]);
//! ```
//!
//! ## See also
//! ------------
//! * [`sw_reader`] – Parser of the space weather file.
//! * [`driver_series`] – Derived series and lookup rules.
//! * [`download_sw_file`] – Local cache management.
use std::{sync::Arc, time::Duration};

use camino::{Utf8Path, Utf8PathBuf};
use hifitime::Epoch;
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use tracing::{debug, info};

use crate::{
    constants::{SW_FILE_ENV, SW_FILE_URL},
    env_state::MsisEnv,
    msis_errors::MsisError,
};

pub mod download_sw_file;
pub mod driver_series;
pub mod sw_reader;

pub use driver_series::{DriverLookup, DriverTimeSeries};

use download_sw_file::{default_cache_path, download_sw_file, ensure_local_file};
use sw_reader::read_sw_file;

/// Where the space weather file comes from and where it is cached.
#[derive(Debug, Clone, PartialEq)]
pub struct DriverStoreConfig {
    /// Remote location of the file (`http(s)://` or `file://`)
    pub url: String,
    /// Local copy; `None` selects the user cache directory
    pub local_path: Option<Utf8PathBuf>,
    /// Global timeout of the HTTP request
    pub timeout: Duration,
}

impl Default for DriverStoreConfig {
    fn default() -> Self {
        DriverStoreConfig {
            url: SW_FILE_URL.to_string(),
            local_path: None,
            timeout: Duration::from_secs(30),
        }
    }
}

impl DriverStoreConfig {
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn with_local_path(mut self, path: impl Into<Utf8PathBuf>) -> Self {
        self.local_path = Some(path.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Configuration of the process-wide store: defaults, with the cache path taken
    /// from `MSISKIT_SW_FILE` when it is set.
    pub fn from_env() -> Self {
        let config = DriverStoreConfig::default();
        match std::env::var(SW_FILE_ENV) {
            Ok(path) if !path.is_empty() => config.with_local_path(path),
            _ => config,
        }
    }

    /// Resolve the local file location.
    pub fn resolve_local_path(&self) -> Result<Utf8PathBuf, MsisError> {
        match &self.local_path {
            Some(path) => Ok(path.clone()),
            None => default_cache_path(),
        }
    }
}

/// Lazily loaded, thread-safe access to the driver time series.
#[derive(Debug)]
pub struct DriverIndexStore {
    config: DriverStoreConfig,
    env: MsisEnv,
    series: RwLock<Option<Arc<DriverTimeSeries>>>,
}

impl DriverIndexStore {
    pub fn new(config: DriverStoreConfig) -> Self {
        let env = MsisEnv::new(config.timeout);
        DriverIndexStore {
            config,
            env,
            series: RwLock::new(None),
        }
    }

    /// Store reading an existing local file, never touching the network.
    pub fn from_local_file(path: &Utf8Path) -> Self {
        let config = DriverStoreConfig::default()
            .with_url(format!("file://{path}"))
            .with_local_path(path);
        DriverIndexStore::new(config)
    }

    pub fn config(&self) -> &DriverStoreConfig {
        &self.config
    }

    /// True once the series has been parsed.
    pub fn is_loaded(&self) -> bool {
        self.series.read().is_some()
    }

    fn parse(&self, path: &Utf8Path) -> Result<Arc<DriverTimeSeries>, MsisError> {
        let table = read_sw_file(path)?;
        let series = DriverTimeSeries::from_table(&table);
        info!(
            "Loaded space weather data from {path}: {} days, {} to {}",
            series.n_days(),
            series.first_epoch(),
            series.last_epoch()
        );
        Ok(Arc::new(series))
    }

    /// Get the driver series, reading (and downloading if needed) the file on first use.
    ///
    /// Return
    /// ------
    /// * A shared handle on the parsed series. Subsequent calls return the same series
    ///   without touching the filesystem.
    pub fn load(&self) -> Result<Arc<DriverTimeSeries>, MsisError> {
        if let Some(series) = self.series.read().as_ref() {
            return Ok(Arc::clone(series));
        }

        let mut slot = self.series.write();
        // another thread may have loaded while we waited for the write lock
        if let Some(series) = slot.as_ref() {
            debug!("Space weather data already loaded");
            return Ok(Arc::clone(series));
        }

        let path = self.config.resolve_local_path()?;
        let path = ensure_local_file(&self.env, &self.config.url, &path)?;
        let series = self.parse(&path)?;
        *slot = Some(Arc::clone(&series));
        Ok(series)
    }

    /// Download the file again and replace the loaded series.
    ///
    /// On failure the previously loaded series, if any, is kept.
    pub fn reload(&self) -> Result<Arc<DriverTimeSeries>, MsisError> {
        let path = self.config.resolve_local_path()?;
        download_sw_file(&self.env, &self.config.url, &path)?;
        let series = self.parse(&path)?;
        *self.series.write() = Some(Arc::clone(&series));
        Ok(series)
    }

    /// Retrieve the F10.7 and ap drivers for the given times.
    ///
    /// Arguments
    /// ---------
    /// * `times`: the epochs of interest
    /// * `interpolate`: linear interpolation between samples instead of step values
    ///
    /// Return
    /// ------
    /// * one F10.7, F10.7a and ap vector per time, see [`DriverTimeSeries::lookup`]
    pub fn query(&self, times: &[Epoch], interpolate: bool) -> Result<DriverLookup, MsisError> {
        self.load()?.lookup(times, interpolate)
    }
}

static DEFAULT_STORE: Lazy<Arc<DriverIndexStore>> =
    Lazy::new(|| Arc::new(DriverIndexStore::new(DriverStoreConfig::from_env())));

/// The process-wide store, loaded on first query and never expired.
pub fn default_store() -> Arc<DriverIndexStore> {
    Arc::clone(&DEFAULT_STORE)
}

/// Query the process-wide store (see [`DriverIndexStore::query`]).
pub fn lookup_drivers(times: &[Epoch], interpolate: bool) -> Result<DriverLookup, MsisError> {
    DEFAULT_STORE.query(times, interpolate)
}

#[cfg(test)]
mod drivers_test {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = DriverStoreConfig::default()
            .with_url("file:///tmp/sw.csv")
            .with_local_path("/tmp/cache/sw.csv")
            .with_timeout(Duration::from_secs(5));
        assert_eq!(config.url, "file:///tmp/sw.csv");
        assert_eq!(
            config.resolve_local_path().unwrap(),
            Utf8PathBuf::from("/tmp/cache/sw.csv")
        );
        assert_eq!(config.timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_default_config() {
        let config = DriverStoreConfig::default();
        assert_eq!(config.url, SW_FILE_URL);
        assert!(config.local_path.is_none());
    }

    #[test]
    fn test_store_is_lazy() {
        let store = DriverIndexStore::from_local_file(Utf8Path::new("/no/such/SW-All.csv"));
        assert!(!store.is_loaded());
        assert!(store.load().is_err());
        assert!(!store.is_loaded());
    }
}
