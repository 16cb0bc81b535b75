//! Materials for MPM simulation
//!
//! * `corotated` - corotated elasticity with snow hardening
//! * `plasticity` - optional plastic projection of the deformation gradient

pub mod corotated;
pub mod plasticity;
pub mod utils;

pub use corotated::{CorotatedModel, RotationExtraction, VolumeTerm};
pub use plasticity::{NoPlasticity, PlasticModel, SnowPlasticity};

pub use utils::check;
pub use utils::physics;
