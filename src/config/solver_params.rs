use bevy::log::warn;
use bevy::prelude::Resource;

use crate::config::constants;
use crate::core::BoundaryConditions;
use crate::error::{DivergencePolicy, SimulationError};
use crate::materials::utils::{check, physics};
use crate::materials::{RotationExtraction, VolumeTerm};
use crate::math::{Real, Vector};

/// Solver parameters shared by every phase of a simulation step.
#[derive(Resource, Clone, Debug, PartialEq)]
pub struct SolverParams {
    /// Number of grid cells per axis; the lattice has `N + 1` nodes per axis.
    pub grid_resolution: usize,
    /// Substep size.
    pub dt: Real,
    /// Simulated time covered by one frame (a whole number of substeps).
    pub frame_dt: Real,
    pub particle_mass: Real,
    pub particle_volume: Real,
    /// Hardening coefficient `k` in `exp(k (1 - J))`.
    pub hardening: Real,
    pub young_modulus: Real,
    pub poisson_ratio: Real,
    pub gravity: Vector,
    pub boundary: BoundaryConditions,
    pub rotation: RotationExtraction,
    pub volume_term: VolumeTerm,
    pub divergence: DivergencePolicy,
}

impl Default for SolverParams {
    fn default() -> Self {
        Self {
            grid_resolution: constants::GRID_RESOLUTION,
            dt: constants::TIME_STEP,
            frame_dt: constants::FRAME_TIME_STEP,
            particle_mass: constants::PARTICLE_MASS,
            particle_volume: constants::PARTICLE_VOLUME,
            hardening: constants::HARDENING,
            young_modulus: constants::YOUNG_MODULUS,
            poisson_ratio: constants::POISSON_RATIO,
            gravity: constants::GRAVITY,
            boundary: BoundaryConditions::default(),
            rotation: RotationExtraction::default(),
            volume_term: VolumeTerm::default(),
            divergence: DivergencePolicy::default(),
        }
    }
}

impl SolverParams {
    /// Parameters reproducing the reference stress formulation
    /// (QR rotation, constant-filled volume term).
    pub fn reference() -> Self {
        Self {
            rotation: RotationExtraction::Qr,
            volume_term: VolumeTerm::ConstantFill,
            ..Self::default()
        }
    }

    pub fn with_grid_resolution(mut self, grid_resolution: usize) -> Self {
        self.grid_resolution = grid_resolution;
        self
    }

    pub fn with_dt(mut self, dt: Real) -> Self {
        self.dt = dt;
        self
    }

    pub fn with_frame_dt(mut self, frame_dt: Real) -> Self {
        self.frame_dt = frame_dt;
        self
    }

    pub fn with_gravity(mut self, gravity: Vector) -> Self {
        self.gravity = gravity;
        self
    }

    pub fn with_material(mut self, young_modulus: Real, poisson_ratio: Real, hardening: Real) -> Self {
        self.young_modulus = young_modulus;
        self.poisson_ratio = poisson_ratio;
        self.hardening = hardening;
        self
    }

    pub fn with_boundary(mut self, boundary: BoundaryConditions) -> Self {
        self.boundary = boundary;
        self
    }

    pub fn with_stress_formulation(
        mut self,
        rotation: RotationExtraction,
        volume_term: VolumeTerm,
    ) -> Self {
        self.rotation = rotation;
        self.volume_term = volume_term;
        self
    }

    pub fn with_divergence_policy(mut self, divergence: DivergencePolicy) -> Self {
        self.divergence = divergence;
        self
    }

    #[inline(always)]
    pub fn cell_width(&self) -> Real {
        1.0 / self.grid_resolution as Real
    }

    #[inline(always)]
    pub fn inv_cell_width(&self) -> Real {
        self.grid_resolution as Real
    }

    /// Number of substeps per frame.
    pub fn substeps_per_frame(&self) -> usize {
        ((self.frame_dt / self.dt).round() as usize).max(1)
    }

    /// CFL estimate `dx / c` with the dilational wave speed of the unhardened
    /// material, `c = sqrt((λ0 + 2μ0) V / m)`.
    pub fn stable_timestep(&self) -> Real {
        let (lambda, mu) = physics::lame_lambda_mu(self.young_modulus, self.poisson_ratio);
        let wave_speed = ((lambda + 2.0 * mu) * self.particle_volume / self.particle_mass).sqrt();
        self.cell_width() / wave_speed
    }

    pub fn validate(&self) -> Result<(), SimulationError> {
        let invalid = |msg: String| Err(SimulationError::InvalidConfig(msg));

        if self.grid_resolution < 2 {
            return invalid(format!(
                "grid resolution must be at least 2, got {}",
                self.grid_resolution
            ));
        }
        if !(self.dt > 0.0 && self.dt.is_finite()) {
            return invalid(format!("timestep must be positive, got {}", self.dt));
        }
        if !(self.frame_dt >= self.dt && self.frame_dt.is_finite()) {
            return invalid(format!(
                "frame timestep {} must be at least the substep {}",
                self.frame_dt, self.dt
            ));
        }
        if !(self.particle_mass > 0.0 && self.particle_mass.is_finite()) {
            return invalid(format!("particle mass must be positive, got {}", self.particle_mass));
        }
        if !(self.particle_volume > 0.0 && self.particle_volume.is_finite()) {
            return invalid(format!(
                "particle volume must be positive, got {}",
                self.particle_volume
            ));
        }
        if !check::young_modulus_ok(self.young_modulus) {
            return invalid(format!("Young's modulus out of range: {}", self.young_modulus));
        }
        if !check::poisson_ratio_ok(self.poisson_ratio) {
            return invalid(format!("Poisson ratio out of range: {}", self.poisson_ratio));
        }
        if !self.hardening.is_finite() {
            return invalid(format!("hardening must be finite, got {}", self.hardening));
        }
        if !self.gravity.is_finite() {
            return invalid(format!("gravity must be finite, got {:?}", self.gravity));
        }
        if !(self.boundary.thickness >= 0.0 && self.boundary.thickness < 0.5) {
            return invalid(format!(
                "boundary thickness must lie in [0, 0.5), got {}",
                self.boundary.thickness
            ));
        }

        let stable = self.stable_timestep();
        if self.dt > stable {
            warn!(
                "timestep {:e} exceeds the CFL estimate {:e}; expect instability",
                self.dt, stable
            );
        }

        Ok(())
    }
}
