//! Columns of the normalized kernel output.
//!
//! Number densities are in m⁻³, mass density in kg/m³ and temperature in K.
use std::fmt;

use crate::constants::N_OUTPUT_FIELDS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Variable {
    /// Total mass density (kg/m³)
    MassDensity,
    N2,
    O2,
    O,
    He,
    H,
    Ar,
    N,
    /// Anomalous oxygen
    AnomalousO,
    /// Only computed by 2.1 and later kernels, NaN otherwise
    NO,
    /// Temperature (K)
    Temperature,
}

impl Variable {
    pub const ALL: [Variable; N_OUTPUT_FIELDS] = [
        Variable::MassDensity,
        Variable::N2,
        Variable::O2,
        Variable::O,
        Variable::He,
        Variable::H,
        Variable::Ar,
        Variable::N,
        Variable::AnomalousO,
        Variable::NO,
        Variable::Temperature,
    ];

    /// Column of the variable in an output row.
    pub fn column(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Variable::MassDensity => "mass density",
            Variable::N2 => "N2",
            Variable::O2 => "O2",
            Variable::O => "O",
            Variable::He => "He",
            Variable::H => "H",
            Variable::Ar => "Ar",
            Variable::N => "N",
            Variable::AnomalousO => "anomalous O",
            Variable::NO => "NO",
            Variable::Temperature => "temperature",
        };
        write!(f, "{name}")
    }
}
