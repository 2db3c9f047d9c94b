//! # Constants and type definitions for msiskit
//!
//! This module centralizes the **table layouts**, **time-step constants**, **sentinel
//! thresholds** and **common type aliases** shared by the marshaling, driver and
//! dispatch layers.
//!
//! ## Overview
//!
//! - Layout of one evaluation row (14 fields) and of one output row (11 fields)
//! - Cadence of the space weather dataset (daily flux, 3-hourly ap)
//! - Kernel sentinel band mapped to NaN
//! - Remote source of the space weather file

use nalgebra::SVector;

// -------------------------------------------------------------------------------------------------
// Evaluation table layout
// -------------------------------------------------------------------------------------------------

/// Number of scalar fields in one evaluation row
pub const N_INPUT_FIELDS: usize = 14;

/// Number of ap components handed to the kernel
pub const N_AP: usize = 7;

/// Column of the day of year (1-366)
pub const COL_DOY: usize = 0;
/// Column of the seconds since UTC midnight
pub const COL_SECONDS: usize = 1;
/// Column of the geodetic longitude (degrees)
pub const COL_LON: usize = 2;
/// Column of the geodetic latitude (degrees)
pub const COL_LAT: usize = 3;
/// Column of the altitude (km)
pub const COL_ALT: usize = 4;
/// Column of the F10.7 of the previous day
pub const COL_F107: usize = 5;
/// Column of the 81-day centred F10.7 average
pub const COL_F107A: usize = 6;
/// First of the 7 ap columns
pub const COL_AP: usize = 7;

/// Width of the normalized output row (see [`crate::variable::Variable`])
pub const N_OUTPUT_FIELDS: usize = 11;

/// Number of kernel switches (14 physical switches + 11 reserved)
pub const N_SWITCHES: usize = 25;

/// Number of named physical switches
pub const N_NAMED_SWITCHES: usize = 14;

// -------------------------------------------------------------------------------------------------
// Time constants
// -------------------------------------------------------------------------------------------------

/// Number of seconds in a civil day
pub const SECONDS_PER_DAY: f64 = 86_400.0;

/// Length of one ap sample (3 hours) in seconds
pub const SECONDS_PER_AP_SLOT: f64 = 10_800.0;

/// Number of 3-hour ap samples in one day
pub const AP_SLOTS_PER_DAY: usize = 8;

// -------------------------------------------------------------------------------------------------
// Driver data cleaning
// -------------------------------------------------------------------------------------------------

/// F10.7 above this value is a solar radio burst, not a usable flux
pub const SOLAR_RADIO_BURST: f64 = 400.0;

/// Length of the ap rolling windows (8 samples = 24 hours)
pub const AP_WINDOW: usize = 8;

/// Number of slots between the current slot and the newest sample of the 12-33h window
pub const AP_WINDOW_12H_OFFSET: usize = 4;

/// Number of slots between the current slot and the newest sample of the 36-57h window
pub const AP_WINDOW_36H_OFFSET: usize = 12;

/// Oldest slot (relative to the current one) contributing to any ap component
pub const AP_HISTORY_SLOTS: usize = AP_WINDOW_36H_OFFSET + AP_WINDOW - 1;

// -------------------------------------------------------------------------------------------------
// Kernel sentinel
// -------------------------------------------------------------------------------------------------

/// Lower bound (inclusive) of the "not computed" sentinel band
pub const SENTINEL_LOW: f64 = 9.9e-38;

/// Upper bound (exclusive) of the "not computed" sentinel band
pub const SENTINEL_HIGH: f64 = 1.0e-37;

// -------------------------------------------------------------------------------------------------
// Remote data source
// -------------------------------------------------------------------------------------------------

/// Name of the space weather file, kept identical in the local cache
pub const SW_FILE_NAME: &str = "SW-All.csv";

/// CelesTrak location of the space weather file
pub const SW_FILE_URL: &str = "https://celestrak.org/SpaceData/SW-All.csv";

/// Environment variable overriding the cached file location of the default store
pub const SW_FILE_ENV: &str = "MSISKIT_SW_FILE";

// -------------------------------------------------------------------------------------------------
// Type aliases
// -------------------------------------------------------------------------------------------------

/// Angle in degrees
pub type Degree = f64;

/// Altitude in kilometers
pub type Kilometer = f64;

/// The 7 ap components of one evaluation time:
///
/// | index | meaning                                                         |
/// |-------|-----------------------------------------------------------------|
/// | 0     | daily Ap                                                        |
/// | 1     | 3 hr ap index for the current time                              |
/// | 2     | 3 hr ap index 3 hrs before the current time                     |
/// | 3     | 3 hr ap index 6 hrs before the current time                     |
/// | 4     | 3 hr ap index 9 hrs before the current time                     |
/// | 5     | average of eight 3 hr ap indices from 12 to 33 hrs prior        |
/// | 6     | average of eight 3 hr ap indices from 36 to 57 hrs prior        |
pub type ApVector = SVector<f64, N_AP>;

/// One row of the evaluation table, in the order given by the `COL_*` constants
pub type InputRow = [f32; N_INPUT_FIELDS];
