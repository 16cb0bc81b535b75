//! Material particles for MPM simulation
//!
//! Particles carry position, velocity, mass and deformation state.

use crate::config::SolverParams;
use crate::math::{
    Matrix, Real, Vector, identity_matrix, matrix_determinant, matrix_is_finite, zero_matrix,
    zero_vector,
};

#[derive(Clone, Debug, PartialEq)]
pub struct Particle {
    pub position: Vector,
    pub velocity: Vector,
    pub mass: Real,
    pub volume0: Real,
    pub affine_momentum_matrix: Matrix, // APIC affine velocity field (C matrix)
    pub deformation_gradient: Matrix,
    /// `J`: `det(F)` after the last step, or the plastic volume ratio when a
    /// plastic model is active. Drives hardening.
    pub volume_ratio: Real,

    // Health tracking
    pub failed: bool,
    pub out_of_domain_steps: u32,
}

impl Particle {
    pub fn new(position: Vector, mass: Real, volume: Real) -> Self {
        Self {
            position,
            velocity: zero_vector(),
            mass,
            volume0: volume,
            affine_momentum_matrix: zero_matrix(),
            deformation_gradient: identity_matrix(),
            volume_ratio: 1.0,
            failed: false,
            out_of_domain_steps: 0,
        }
    }

    pub fn with_velocity(mut self, velocity: Vector) -> Self {
        self.velocity = velocity;
        self
    }

    pub fn with_deformation_gradient(mut self, deformation_gradient: Matrix) -> Self {
        self.deformation_gradient = deformation_gradient;
        self.volume_ratio = matrix_determinant(&deformation_gradient);
        self
    }

    #[inline(always)]
    pub fn jacobian(&self) -> Real {
        matrix_determinant(&self.deformation_gradient)
    }

    #[inline(always)]
    pub fn momentum(&self) -> Vector {
        self.velocity * self.mass
    }

    pub fn is_finite(&self) -> bool {
        self.position.is_finite()
            && self.velocity.is_finite()
            && matrix_is_finite(&self.affine_momentum_matrix)
            && matrix_is_finite(&self.deformation_gradient)
            && self.volume_ratio.is_finite()
    }

    /// Stop evolving this particle. Position and `F` keep their last valid
    /// values; it no longer exchanges momentum with the grid.
    pub fn freeze(&mut self) {
        self.failed = true;
        self.velocity = zero_vector();
        self.affine_momentum_matrix = zero_matrix();
    }
}

/// Append one resting, undeformed particle per position.
pub fn initialize_particles(
    particles: &mut Vec<Particle>,
    positions: &[Vector],
    params: &SolverParams,
) {
    particles.reserve(positions.len());
    particles.extend(
        positions
            .iter()
            .map(|&position| Particle::new(position, params.particle_mass, params.particle_volume)),
    );
}
