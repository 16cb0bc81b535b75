//! Particle-to-Grid (P2G) transfer operations
//!
//! Scatters mass, momentum and the MLS-MPM affine momentum (stress plus APIC
//! `C`) from particles onto the 3x3 stencil of grid nodes.

use crate::config::SolverParams;
use crate::core::{Grid, NEIGHBOR_COUNT, Particle, TransferWeights};
use crate::error::{Diagnostic, StepReport};
use crate::materials::CorotatedModel;
use crate::math::{Coord, Real, Vector};

/// Scatter every active particle onto `grid`. Particles are not modified.
///
/// A particle that cannot be transferred is reported and skipped as a whole,
/// so it never leaves a partial contribution on the grid.
pub fn particle_to_grid(
    grid: &mut Grid,
    particles: &[Particle],
    model: &CorotatedModel,
    params: &SolverParams,
    report: &mut StepReport,
) {
    let inv_cell_width = params.inv_cell_width();
    let cell_width = params.cell_width();
    let mut contributions = [(Coord::ZERO, Vector::ZERO, 0.0 as Real); NEIGHBOR_COUNT];

    for (index, particle) in particles.iter().enumerate() {
        if particle.failed {
            continue;
        }

        if !particle.position.is_finite() {
            report.push(Diagnostic::OutOfDomain {
                index,
                position: particle.position,
            });
            continue;
        }

        let transfer = TransferWeights::compute(particle.position, inv_cell_width);
        if !grid.stencil_in_bounds(transfer.base) {
            report.push(Diagnostic::OutOfDomain {
                index,
                position: particle.position,
            });
            continue;
        }

        let Some(stress) = model.affine_stress(
            &particle.deformation_gradient,
            particle.volume_ratio,
            particle.volume0,
            params.dt,
            cell_width,
        ) else {
            report.push(Diagnostic::DegenerateDeformation {
                index,
                determinant: particle.jacobian(),
            });
            continue;
        };

        let affine = stress + particle.mass * particle.affine_momentum_matrix;
        let momentum = particle.momentum();

        let mut finite = true;
        for (slot, (coord, weight, offset)) in
            contributions.iter_mut().zip(transfer.iter_neighbors())
        {
            let node_momentum = weight * (momentum + affine * (offset * cell_width));
            finite &= node_momentum.is_finite();
            *slot = (coord, node_momentum, weight * particle.mass);
        }

        if !finite {
            report.push(Diagnostic::DegenerateDeformation {
                index,
                determinant: particle.jacobian(),
            });
            continue;
        }

        for &(coord, node_momentum, node_mass) in &contributions {
            grid.accumulate(coord, node_momentum, node_mass);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Matrix;

    fn transfer(particles: &[Particle], params: &SolverParams) -> (Grid, StepReport) {
        let mut grid = Grid::new(params.grid_resolution);
        let mut report = StepReport::new(0);
        let model = CorotatedModel::from_params(params);
        particle_to_grid(&mut grid, particles, &model, params, &mut report);
        (grid, report)
    }

    fn block(params: &SolverParams) -> Vec<Particle> {
        let mut particles = Vec::new();
        for i in 0..6 {
            for j in 0..5 {
                let position = Vector::new(0.4 + 0.013 * i as Real, 0.35 + 0.017 * j as Real);
                particles.push(
                    Particle::new(position, params.particle_mass, params.particle_volume)
                        .with_velocity(Vector::new(0.3 * i as Real, -0.2 * j as Real)),
                );
            }
        }
        particles
    }

    #[test]
    fn test_mass_conservation() {
        let params = SolverParams::default();
        let particles = block(&params);
        let (grid, report) = transfer(&particles, &params);

        let particle_mass: Real = particles.iter().map(|p| p.mass).sum();
        assert!(report.is_clean());
        assert!((grid.total_mass() - particle_mass).abs() < 1e-9);
    }

    #[test]
    fn test_momentum_conservation_for_unstressed_particles() {
        let params = SolverParams::default();
        let particles = block(&params);
        let (grid, _) = transfer(&particles, &params);

        let particle_momentum = particles
            .iter()
            .fold(Vector::ZERO, |acc, p| acc + p.momentum());
        assert!((grid.total_momentum() - particle_momentum).length() < 1e-9);
    }

    #[test]
    fn test_stressed_particle_adds_no_net_momentum() {
        // The affine term has zero first moment over the stencil.
        let params = SolverParams::default();
        let stretched = Matrix::from_cols(Vector::new(1.05, 0.02), Vector::new(0.0, 0.97));
        let particles = vec![
            Particle::new(Vector::new(0.52, 0.48), 1.0, 1.0).with_deformation_gradient(stretched),
        ];
        let (grid, report) = transfer(&particles, &params);
        assert!(report.is_clean());
        assert!(grid.total_momentum().length() < 1e-9);
        assert!(grid.iter_nodes().any(|(_, n)| n.momentum.length() > 1e-6));
    }

    #[test]
    fn test_failed_particles_are_skipped() {
        let params = SolverParams::default();
        let mut particles = block(&params);
        particles[0].freeze();
        let (grid, report) = transfer(&particles, &params);
        assert!(report.is_clean());
        assert!((grid.total_mass() - (particles.len() - 1) as Real).abs() < 1e-9);
    }

    #[test]
    fn test_out_of_domain_particle_is_isolated() {
        let params = SolverParams::default();
        let mut particles = block(&params);
        particles.push(Particle::new(Vector::new(1.2, 0.5), 1.0, 1.0));
        particles.push(Particle::new(Vector::new(Real::NAN, 0.5), 1.0, 1.0));
        let (grid, report) = transfer(&particles, &params);

        assert_eq!(report.out_of_domain_count(), 2);
        assert!(report.has_out_of_domain(particles.len() - 2));
        assert!((grid.total_mass() - (particles.len() - 2) as Real).abs() < 1e-9);
    }

    #[test]
    fn test_degenerate_particle_is_isolated() {
        let params = SolverParams::default();
        let mut particles = block(&params);
        let inverted = Matrix::from_cols(Vector::new(-1.0, 0.0), Vector::new(0.0, 1.0));
        particles[3] = particles[3].clone().with_deformation_gradient(inverted);
        let (grid, report) = transfer(&particles, &params);

        assert_eq!(report.degenerate_count(), 1);
        assert_eq!(report.diagnostics[0].particle_index(), 3);
        assert!((grid.total_mass() - (particles.len() - 1) as Real).abs() < 1e-9);
        assert!(grid.total_momentum().is_finite());
    }

    #[test]
    fn test_boundary_particle_uses_padding() {
        let params = SolverParams::default();
        let particles = vec![Particle::new(Vector::new(0.001, 0.999), 1.0, 1.0)];
        let (grid, report) = transfer(&particles, &params);
        assert!(report.is_clean());
        assert!(grid.node(Coord::new(-1, 81)).unwrap().mass > 0.0);
        assert!((grid.total_mass() - 1.0).abs() < 1e-12);
    }
}
