use thiserror::Error;

use crate::kernel::msis_version::MsisVersion;

#[derive(Error, Debug)]
pub enum MsisError {
    #[error("The MSIS version selected: {0} is not one of the valid version numbers: (0, 2, 2.0, 2.1)")]
    InvalidVersion(String),

    #[error("No kernel registered for MSIS version {0}")]
    KernelNotRegistered(MsisVersion),

    #[error("Invalid kernel output width for MSIS version {version}: {width} (expected 10 or 11)")]
    InvalidKernelWidth { version: MsisVersion, width: usize },

    #[error("options needs to be a list of length {expected}, got {got}")]
    InvalidSwitchCount { expected: usize, got: usize },

    #[error("Unknown switch name: {0}")]
    UnknownSwitch(String),

    #[error(
        "The length of dates ({dates}), f107s ({f107s}), f107as ({f107as}), \
         and aps ({aps}) must all be equal"
    )]
    DriverLengthMismatch {
        dates: usize,
        f107s: usize,
        f107as: usize,
        aps: usize,
    },

    #[error("Input data has non-finite values, all input data must be valid (non-finite input at row {row}, field {field})")]
    NonFiniteInput { row: usize, field: usize },

    #[error("The geomagnetic data is not available for these dates. Dates should be between {start} and {end}.")]
    DateOutOfRange { start: String, end: String },

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Unable to download the space weather file from {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: ureq::Error,
    },

    #[error("Unable to perform file operation: {0}")]
    IoError(#[from] std::io::Error),

    #[error("CSV parsing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Malformed space weather file: {0}")]
    MalformedDriverFile(String),

    #[error("Base dir creation error for the space weather cache: {0}")]
    UnableToCreateBaseDir(String),

    #[error("UTF-8 Path error: {0}")]
    Utf8PathError(String),

    #[error("Kernel failure ({version}): {message}")]
    KernelFailure {
        version: MsisVersion,
        message: String,
    },

    #[error("Kernel output has {got} values, expected {expected}")]
    KernelOutputShape { expected: usize, got: usize },
}

impl MsisError {
    /// Configuration errors: bad switch vectors, unknown versions, mismatched lengths.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            MsisError::InvalidVersion(_)
                | MsisError::KernelNotRegistered(_)
                | MsisError::InvalidKernelWidth { .. }
                | MsisError::InvalidSwitchCount { .. }
                | MsisError::UnknownSwitch(_)
                | MsisError::DriverLengthMismatch { .. }
        )
    }
}

impl PartialEq for MsisError {
    fn eq(&self, other: &Self) -> bool {
        use MsisError::*;
        match (self, other) {
            (InvalidVersion(a), InvalidVersion(b)) => a == b,
            (KernelNotRegistered(a), KernelNotRegistered(b)) => a == b,
            (
                InvalidKernelWidth {
                    version: v1,
                    width: w1,
                },
                InvalidKernelWidth {
                    version: v2,
                    width: w2,
                },
            ) => v1 == v2 && w1 == w2,
            (
                InvalidSwitchCount {
                    expected: e1,
                    got: g1,
                },
                InvalidSwitchCount {
                    expected: e2,
                    got: g2,
                },
            ) => e1 == e2 && g1 == g2,
            (UnknownSwitch(a), UnknownSwitch(b)) => a == b,
            (
                DriverLengthMismatch {
                    dates: d1,
                    f107s: f1,
                    f107as: fa1,
                    aps: a1,
                },
                DriverLengthMismatch {
                    dates: d2,
                    f107s: f2,
                    f107as: fa2,
                    aps: a2,
                },
            ) => d1 == d2 && f1 == f2 && fa1 == fa2 && a1 == a2,
            (NonFiniteInput { row: r1, field: f1 }, NonFiniteInput { row: r2, field: f2 }) => {
                r1 == r2 && f1 == f2
            }
            (
                DateOutOfRange { start: s1, end: e1 },
                DateOutOfRange { start: s2, end: e2 },
            ) => s1 == s2 && e1 == e2,
            (InvalidDate(a), InvalidDate(b)) => a == b,

            // the wrapped errors are not comparable, same variant is enough
            (Transport { url: a, .. }, Transport { url: b, .. }) => a == b,
            (IoError(_), IoError(_)) => true,
            (CsvError(_), CsvError(_)) => true,

            (MalformedDriverFile(a), MalformedDriverFile(b)) => a == b,
            (UnableToCreateBaseDir(a), UnableToCreateBaseDir(b)) => a == b,
            (Utf8PathError(a), Utf8PathError(b)) => a == b,
            (
                KernelFailure {
                    version: v1,
                    message: m1,
                },
                KernelFailure {
                    version: v2,
                    message: m2,
                },
            ) => v1 == v2 && m1 == m2,
            (
                KernelOutputShape {
                    expected: e1,
                    got: g1,
                },
                KernelOutputShape {
                    expected: e2,
                    got: g2,
                },
            ) => e1 == e2 && g1 == g2,

            _ => false,
        }
    }
}
