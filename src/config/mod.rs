//! Configuration and parameters
//!
//! Default constants and the solver parameter set passed to every phase.

pub mod constants;
pub mod solver_params;

pub use constants::*;
pub use solver_params::*;
