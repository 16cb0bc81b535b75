//! Text dump and conservation metrics for manual inspection.
//!
//! The dump layout is meant for people, not for parsing.

use std::io::{self, Write};

use crate::core::{Grid, Particle};
use crate::math::{Coord, Real, Vector, zero_vector};

/// Write particle positions followed by one row per grid line with the node
/// masses and momenta of the unpadded lattice.
pub fn dump(out: &mut impl Write, particles: &[Particle], grid: &Grid, step: u64) -> io::Result<()> {
    writeln!(out, "step {step}")?;
    writeln!(out, "particles {}", particles.len())?;
    for (index, particle) in particles.iter().enumerate() {
        let state = if particle.failed { " frozen" } else { "" };
        writeln!(
            out,
            "{index} {:.6} {:.6}{state}",
            particle.position.x, particle.position.y
        )?;
    }

    let n = grid.resolution() as i32;
    writeln!(out, "grid {}x{}", n + 1, n + 1)?;
    for j in (0..=n).rev() {
        for i in 0..=n {
            let Some(node) = grid.node(Coord::new(i, j)) else {
                continue;
            };
            write!(
                out,
                "({:.3e},{:.3e},{:.3e}) ",
                node.momentum.x, node.momentum.y, node.mass
            )?;
        }
        writeln!(out)?;
    }
    Ok(())
}

pub fn total_particle_mass(particles: &[Particle]) -> Real {
    particles.iter().map(|p| p.mass).sum()
}

pub fn total_momentum(particles: &[Particle]) -> Vector {
    particles
        .iter()
        .fold(zero_vector(), |acc, p| acc + p.momentum())
}

pub fn kinetic_energy(particles: &[Particle]) -> Real {
    particles
        .iter()
        .map(|p| 0.5 * p.mass * p.velocity.length_squared())
        .sum()
}

/// Lowest particle height, `None` for an empty set.
pub fn min_height(particles: &[Particle]) -> Option<Real> {
    particles.iter().map(|p| p.position.y).reduce(Real::min)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair() -> Vec<Particle> {
        vec![
            Particle::new(Vector::new(0.25, 0.5), 1.0, 1.0).with_velocity(Vector::new(2.0, 0.0)),
            Particle::new(Vector::new(0.75, 0.25), 3.0, 1.0).with_velocity(Vector::new(0.0, -1.0)),
        ]
    }

    #[test]
    fn test_metrics() {
        let particles = pair();
        assert_eq!(total_particle_mass(&particles), 4.0);
        assert_eq!(total_momentum(&particles), Vector::new(2.0, -3.0));
        assert_eq!(kinetic_energy(&particles), 2.0 + 1.5);
        assert_eq!(min_height(&particles), Some(0.25));
        assert_eq!(min_height(&[]), None);
    }

    #[test]
    fn test_dump_layout() {
        let mut particles = pair();
        particles[1].freeze();
        let mut grid = Grid::new(2);
        grid.accumulate(Coord::new(1, 2), Vector::new(1.0, 0.0), 0.5);

        let mut out = Vec::new();
        dump(&mut out, &particles, &grid, 7).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "step 7");
        assert_eq!(lines[1], "particles 2");
        assert_eq!(lines[2], "0 0.250000 0.500000");
        assert!(lines[3].ends_with("frozen"));
        assert_eq!(lines[4], "grid 3x3");
        // Top row first.
        assert!(lines[5].contains("5.000e-1"));
        assert_eq!(lines.len(), 8);
    }
}
