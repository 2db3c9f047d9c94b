//! # Kernel switches
//!
//! Every MSIS kernel is configured by a vector of 25 switches. The first 14 turn
//! individual physical terms of the model on (`1`) or off (`0`); the remaining 11 are
//! reserved and left at `1`.
//!
//! The geomagnetic switch is special: `1` selects the daily Ap mode and `-1` the
//! storm-time mode that uses the 3-hourly ap history (components 1 to 6 of the ap
//! vector).
//!
//! ```rust
//! use msiskit::switches::{create_switches, Switch};
//!
//! let switches = create_switches([(Switch::GeomagneticActivity, -1.0)]);
//! assert_eq!(switches.get(Switch::GeomagneticActivity), -1.0);
//! assert_eq!(switches.as_slice().len(), 25);
//! ```
use std::{fmt, str::FromStr};

use crate::{
    constants::{N_NAMED_SWITCHES, N_SWITCHES},
    msis_errors::MsisError,
};

/// Named physical switches, in kernel order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Switch {
    /// F10.7 effects
    F107,
    /// Time independent terms
    TimeIndependent,
    SymmetricalAnnual,
    SymmetricalSemiannual,
    AsymmetricalAnnual,
    AsymmetricalSemiannual,
    Diurnal,
    Semidiurnal,
    /// 1 = daily Ap mode, -1 = storm-time ap mode
    GeomagneticActivity,
    /// All UT/longitudinal effects
    AllUtEffects,
    Longitudinal,
    /// UT and mixed UT/longitudinal effects
    MixedUtLong,
    /// Mixed Ap, UT and longitudinal effects
    MixedApUtLong,
    Terdiurnal,
}

impl Switch {
    pub const ALL: [Switch; N_NAMED_SWITCHES] = [
        Switch::F107,
        Switch::TimeIndependent,
        Switch::SymmetricalAnnual,
        Switch::SymmetricalSemiannual,
        Switch::AsymmetricalAnnual,
        Switch::AsymmetricalSemiannual,
        Switch::Diurnal,
        Switch::Semidiurnal,
        Switch::GeomagneticActivity,
        Switch::AllUtEffects,
        Switch::Longitudinal,
        Switch::MixedUtLong,
        Switch::MixedApUtLong,
        Switch::Terdiurnal,
    ];

    /// Position of the switch in the kernel vector.
    pub fn index(&self) -> usize {
        *self as usize
    }

    pub fn name(&self) -> &'static str {
        match self {
            Switch::F107 => "f107",
            Switch::TimeIndependent => "time_independent",
            Switch::SymmetricalAnnual => "symmetrical_annual",
            Switch::SymmetricalSemiannual => "symmetrical_semiannual",
            Switch::AsymmetricalAnnual => "asymmetrical_annual",
            Switch::AsymmetricalSemiannual => "asymmetrical_semiannual",
            Switch::Diurnal => "diurnal",
            Switch::Semidiurnal => "semidiurnal",
            Switch::GeomagneticActivity => "geomagnetic_activity",
            Switch::AllUtEffects => "all_ut_effects",
            Switch::Longitudinal => "longitudinal",
            Switch::MixedUtLong => "mixed_ut_long",
            Switch::MixedApUtLong => "mixed_ap_ut_long",
            Switch::Terdiurnal => "terdiurnal",
        }
    }
}

impl fmt::Display for Switch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Switch {
    type Err = MsisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Switch::ALL
            .iter()
            .find(|switch| switch.name() == s)
            .copied()
            .ok_or_else(|| MsisError::UnknownSwitch(s.to_string()))
    }
}

/// The full 25-value switch vector handed to the kernel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Switches([f64; N_SWITCHES]);

impl Default for Switches {
    fn default() -> Self {
        Switches([1.0; N_SWITCHES])
    }
}

impl Switches {
    /// Build a switch vector from raw values.
    ///
    /// Return
    /// ------
    /// * the switches, or [`MsisError::InvalidSwitchCount`] unless exactly 25 values are given
    pub fn from_slice(values: &[f64]) -> Result<Self, MsisError> {
        let array: [f64; N_SWITCHES] =
            values
                .try_into()
                .map_err(|_| MsisError::InvalidSwitchCount {
                    expected: N_SWITCHES,
                    got: values.len(),
                })?;
        Ok(Switches(array))
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn get(&self, switch: Switch) -> f64 {
        self.0[switch.index()]
    }

    pub fn set(&mut self, switch: Switch, value: f64) {
        self.0[switch.index()] = value;
    }

    pub fn with(mut self, switch: Switch, value: f64) -> Self {
        self.set(switch, value);
        self
    }
}

/// Create a switch vector from named values, every other switch at `1`.
///
/// Arguments
/// ---------
/// * `flags`: the switches to change and their value
///
/// Return
/// ------
/// * the 25 switches ready for the kernel
pub fn create_switches<I>(flags: I) -> Switches
where
    I: IntoIterator<Item = (Switch, f64)>,
{
    flags
        .into_iter()
        .fold(Switches::default(), |switches, (switch, value)| {
            switches.with(switch, value)
        })
}

/// Same as [`create_switches`] with switches given by name (`"geomagnetic_activity"`, ...).
pub fn create_switches_by_name<'a, I>(flags: I) -> Result<Switches, MsisError>
where
    I: IntoIterator<Item = (&'a str, f64)>,
{
    flags
        .into_iter()
        .map(|(name, value)| Ok((name.parse::<Switch>()?, value)))
        .collect::<Result<Vec<_>, MsisError>>()
        .map(create_switches)
}
