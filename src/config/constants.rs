// Default physical constants for the snow simulation
use crate::math::{Real, Vector};

// Discretisation
pub const GRID_RESOLUTION: usize = 80;
pub const TIME_STEP: Real = 1e-4;
pub const FRAME_TIME_STEP: Real = 1e-3;

// Particles
pub const PARTICLE_MASS: Real = 1.0;
pub const PARTICLE_VOLUME: Real = 1.0;

// Snow material
pub const HARDENING: Real = 10.0;
pub const YOUNG_MODULUS: Real = 1e4;
pub const POISSON_RATIO: Real = 0.2;

// Global physics
pub const GRAVITY: Vector = Vector::new(0.0, -200.0);

// Domain boundary band, in normalized domain units
pub const BOUNDARY_THICKNESS: Real = 0.05;

// Snow plasticity band (Stomakhin et al. 2013)
pub const CRITICAL_COMPRESSION: Real = 2.5e-2;
pub const CRITICAL_STRETCH: Real = 7.5e-3;
pub const MIN_VOLUME_RATIO: Real = 0.6;
pub const MAX_VOLUME_RATIO: Real = 20.0;

// Divergence handling
pub const MAX_OUT_OF_DOMAIN_STEPS: u32 = 64;
