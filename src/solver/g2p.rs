//! Grid-to-Particle (G2P) transfer operations
//!
//! Gathers grid velocities back onto particles, rebuilds the APIC affine
//! matrix, advects positions and updates the deformation gradient.

use crate::config::SolverParams;
use crate::core::{Grid, Particle, TransferWeights};
use crate::error::{Diagnostic, StepReport};
use crate::materials::{PlasticModel, check};
use crate::math::{
    Real, Vector, matrix_determinant, matrix_is_finite, outer_product, zero_matrix, zero_vector,
};

pub fn grid_to_particle(
    grid: &Grid,
    particles: &mut [Particle],
    plasticity: &dyn PlasticModel,
    params: &SolverParams,
    report: &mut StepReport,
) {
    let inv_cell_width = params.inv_cell_width();
    let dt = params.dt;
    // Dinv * dx, since offsets are in cell units.
    let apic_scale = 4.0 * inv_cell_width;

    for (index, particle) in particles.iter_mut().enumerate() {
        if particle.failed {
            continue;
        }

        if !particle.position.is_finite() {
            particle.freeze();
            report_degenerate(report, index, particle.jacobian());
            continue;
        }

        let transfer = TransferWeights::compute(particle.position, inv_cell_width);
        if !grid.stencil_in_bounds(transfer.base) {
            // Skipped by P2G; bring it back without a transfer.
            if !report.has_out_of_domain(index) {
                report.push(Diagnostic::OutOfDomain {
                    index,
                    position: particle.position,
                });
            }
            particle.position = clamp_to_domain(particle.position);
            particle.out_of_domain_steps += 1;
            continue;
        }

        let mut velocity = zero_vector();
        let mut affine = zero_matrix();
        for (coord, weight, offset) in transfer.iter_neighbors() {
            let Some(node) = grid.node(coord) else {
                continue;
            };
            let weighted_velocity = node.velocity * weight;
            velocity += weighted_velocity;
            affine += outer_product(weighted_velocity, offset) * apic_scale;
        }

        let position = particle.position + velocity * dt;
        let deformation_gradient =
            particle.deformation_gradient + dt * affine * particle.deformation_gradient;
        let determinant = matrix_determinant(&deformation_gradient);

        if !check::deformation_gradient_ok(determinant)
            || !velocity.is_finite()
            || !position.is_finite()
            || !matrix_is_finite(&affine)
        {
            particle.freeze();
            report_degenerate(report, index, determinant);
            continue;
        }

        let (deformation_gradient, volume_ratio) =
            plasticity.project(deformation_gradient, particle.volume_ratio);

        particle.velocity = velocity;
        particle.affine_momentum_matrix = affine;
        particle.deformation_gradient = deformation_gradient;
        particle.volume_ratio = volume_ratio;

        let clamped = clamp_to_domain(position);
        if clamped != position {
            report.push(Diagnostic::OutOfDomain { index, position });
            particle.out_of_domain_steps += 1;
        } else {
            particle.out_of_domain_steps = 0;
        }
        particle.position = clamped;
    }
}

/// P2G may already have reported the same particle this step.
fn report_degenerate(report: &mut StepReport, index: usize, determinant: Real) {
    if !report.has_degenerate(index) {
        report.push(Diagnostic::DegenerateDeformation { index, determinant });
    }
}

#[inline(always)]
fn clamp_to_domain(position: Vector) -> Vector {
    position.clamp(Vector::ZERO, Vector::ONE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::GridNode;
    use crate::materials::NoPlasticity;
    use crate::math::{Coord, Matrix, identity_matrix, matrix_norm};

    /// Grid where every node moves with `velocity_at(node position)`.
    fn velocity_field(params: &SolverParams, velocity_at: impl Fn(Vector) -> Vector) -> Grid {
        let mut grid = Grid::new(params.grid_resolution);
        let (lo, hi) = grid.coord_range();
        for y in lo..=hi {
            for x in lo..=hi {
                let coord = Coord::new(x, y);
                let velocity = velocity_at(grid.node_position(coord));
                *grid.node_mut(coord).unwrap() = GridNode {
                    momentum: velocity,
                    mass: 1.0,
                    velocity,
                };
            }
        }
        grid
    }

    fn gather(grid: &Grid, particles: &mut [Particle], params: &SolverParams) -> StepReport {
        let mut report = StepReport::new(0);
        grid_to_particle(grid, particles, &NoPlasticity, params, &mut report);
        report
    }

    #[test]
    fn test_uniform_field_is_reproduced() {
        let params = SolverParams::default();
        let grid = velocity_field(&params, |_| Vector::new(1.5, -0.5));
        let mut particles = vec![Particle::new(Vector::new(0.437, 0.612), 1.0, 1.0)];

        let report = gather(&grid, &mut particles, &params);

        let p = &particles[0];
        assert!(report.is_clean());
        assert!((p.velocity - Vector::new(1.5, -0.5)).length() < 1e-12);
        assert!(matrix_norm(&p.affine_momentum_matrix) < 1e-9);
        let expected = Vector::new(0.437, 0.612) + Vector::new(1.5, -0.5) * params.dt;
        assert!((p.position - expected).length() < 1e-14);
        assert!(matrix_norm(&(p.deformation_gradient - identity_matrix())) < 1e-9);
    }

    #[test]
    fn test_linear_field_recovers_velocity_gradient() {
        let params = SolverParams::default();
        let gradient = Matrix::from_cols(Vector::new(0.2, -0.1), Vector::new(0.4, 0.3));
        let grid = velocity_field(&params, |x| gradient * x);
        let position = Vector::new(0.5137, 0.4821);
        let mut particles = vec![Particle::new(position, 1.0, 1.0)];

        gather(&grid, &mut particles, &params);

        let p = &particles[0];
        assert!((p.velocity - gradient * position).length() < 1e-12);
        assert!(matrix_norm(&(p.affine_momentum_matrix - gradient)) < 1e-9);

        let expected_f = identity_matrix() + params.dt * gradient;
        assert!(matrix_norm(&(p.deformation_gradient - expected_f)) < 1e-12);
        assert!((p.volume_ratio - expected_f.determinant()).abs() < 1e-12);
    }

    #[test]
    fn test_collapse_freezes_particle() {
        let mut params = SolverParams::default();
        params.dt = 1.0;
        // Squeezing only along x flips that axis within one step.
        let grid = velocity_field(&params, |x| Vector::new((0.5 - x.x) * 50.0, 0.0));
        let start = Vector::new(0.55, 0.45);
        let mut particles = vec![Particle::new(start, 1.0, 1.0)];

        let report = gather(&grid, &mut particles, &params);

        let p = &particles[0];
        assert_eq!(report.degenerate_count(), 1);
        assert!(p.failed);
        assert_eq!(p.position, start);
        assert_eq!(p.deformation_gradient, identity_matrix());
        assert_eq!(p.velocity, Vector::ZERO);
    }

    #[test]
    fn test_degenerate_particle_reported_once_per_step() {
        let params = SolverParams::default();
        let grid = velocity_field(&params, |_| Vector::ZERO);
        let inverted = Matrix::from_cols(Vector::new(-1.0, 0.0), Vector::new(0.0, 1.0));
        let mut particles =
            vec![Particle::new(Vector::splat(0.5), 1.0, 1.0).with_deformation_gradient(inverted)];
        let mut report = StepReport::new(0);
        report.push(Diagnostic::DegenerateDeformation {
            index: 0,
            determinant: -1.0,
        });

        grid_to_particle(&grid, &mut particles, &NoPlasticity, &params, &mut report);

        assert!(particles[0].failed);
        assert_eq!(report.degenerate_count(), 1);
    }

    #[test]
    fn test_escaping_particle_is_clamped() {
        let params = SolverParams::default().with_dt(1e-2);
        let grid = velocity_field(&params, |_| Vector::new(5.0, 0.0));
        let mut particles = vec![Particle::new(Vector::new(0.99, 0.5), 1.0, 1.0)];

        let report = gather(&grid, &mut particles, &params);

        let p = &particles[0];
        assert_eq!(report.out_of_domain_count(), 1);
        assert_eq!(p.position.x, 1.0);
        assert_eq!(p.out_of_domain_steps, 1);
        assert!(!p.failed);
    }

    #[test]
    fn test_out_of_stencil_particle_is_brought_back() {
        let params = SolverParams::default();
        let grid = velocity_field(&params, |_| Vector::ZERO);
        let mut particles = vec![Particle::new(Vector::new(-0.5, 0.5), 1.0, 1.0)];

        let report = gather(&grid, &mut particles, &params);

        assert_eq!(report.out_of_domain_count(), 1);
        assert_eq!(particles[0].position, Vector::new(0.0, 0.5));
        assert_eq!(particles[0].out_of_domain_steps, 1);
    }

    #[test]
    fn test_in_domain_step_resets_counter() {
        let params = SolverParams::default();
        let grid = velocity_field(&params, |_| Vector::ZERO);
        let mut particles = vec![Particle::new(Vector::splat(0.5), 1.0, 1.0)];
        particles[0].out_of_domain_steps = 5;

        gather(&grid, &mut particles, &params);
        assert_eq!(particles[0].out_of_domain_steps, 0);
    }
}
