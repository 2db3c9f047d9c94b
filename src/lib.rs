//! # msiskit
//!
//! Input layer of the NRLMSIS family of atmosphere models: builds the evaluation
//! table from coordinates and times, serves the F10.7 and ap drivers from the
//! CelesTrak space weather file, and dispatches batches to versioned kernels.
//!
//! * [`input`] – trajectory and grid marshaling.
//! * [`drivers`] – space weather download, parsing and lookup.
//! * [`msis`] – session handle, switch cache and output normalization.
//! * [`kernel`] – kernel contract and version table.
pub mod constants;
pub mod drivers;
pub mod env_state;
pub mod input;
pub mod kernel;
pub mod msis;
pub mod msis_errors;
pub mod switches;
pub mod time;
pub mod variable;

pub use input::{create_input, create_input_from_store, EvaluationRequest, GridMode};
pub use msis::{CalculateOptions, Msis, MsisOutput};
pub use msis_errors::MsisError;
