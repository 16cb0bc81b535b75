//! Initial particle placement.

use rand::Rng;

use crate::math::{Real, Vector};

// Absorbs rounding so the top and right edges are sampled.
const EDGE_EPSILON: Real = 1e-9;

/// Regular lattice over `[bottom_left, top_right]`, edges included, row by
/// row from the bottom. Empty for a non-positive spacing or an inverted box.
pub fn create_box(bottom_left: Vector, top_right: Vector, spacing: Real) -> Vec<Vector> {
    if !(spacing > 0.0) || top_right.x < bottom_left.x || top_right.y < bottom_left.y {
        return Vec::new();
    }

    let counts = ((top_right - bottom_left) / spacing + Vector::splat(EDGE_EPSILON))
        .floor()
        .as_uvec2()
        + 1;

    let mut positions = Vec::with_capacity((counts.x * counts.y) as usize);
    for j in 0..counts.y {
        for i in 0..counts.x {
            positions.push(bottom_left + Vector::new(i as Real, j as Real) * spacing);
        }
    }
    positions
}

/// Lattice from [`create_box`] with every point displaced by up to
/// `jitter * spacing` per axis, then kept inside the box.
pub fn create_jittered_box(
    bottom_left: Vector,
    top_right: Vector,
    spacing: Real,
    jitter: Real,
    rng: &mut impl Rng,
) -> Vec<Vector> {
    let amplitude = (jitter * spacing).abs();
    let mut positions = create_box(bottom_left, top_right, spacing);
    if amplitude == 0.0 {
        return positions;
    }

    for position in positions.iter_mut() {
        let offset = Vector::new(
            rng.random_range(-amplitude..=amplitude),
            rng.random_range(-amplitude..=amplitude),
        );
        *position = (*position + offset).clamp(bottom_left, top_right);
    }
    positions
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_box_includes_edges() {
        let points = create_box(Vector::new(0.5, 0.5), Vector::new(0.6, 0.6), 0.01);
        assert_eq!(points.len(), 11 * 11);
        assert_eq!(points[0], Vector::new(0.5, 0.5));
        let last = points[points.len() - 1];
        assert!((last - Vector::new(0.6, 0.6)).length() < 1e-12);
    }

    #[test]
    fn test_rectangular_box() {
        let points = create_box(Vector::new(0.45, 0.4), Vector::new(0.55, 0.55), 0.01);
        assert_eq!(points.len(), 11 * 16);
        assert!((points[11] - Vector::new(0.45, 0.41)).length() < 1e-12);
    }

    #[test]
    fn test_degenerate_inputs() {
        assert!(create_box(Vector::ZERO, Vector::ONE, 0.0).is_empty());
        assert!(create_box(Vector::ONE, Vector::ZERO, 0.1).is_empty());
        assert_eq!(create_box(Vector::splat(0.5), Vector::splat(0.5), 0.1).len(), 1);
    }

    #[test]
    fn test_jittered_box_is_seeded_and_bounded() {
        let lo = Vector::new(0.2, 0.3);
        let hi = Vector::new(0.3, 0.35);
        let a = create_jittered_box(lo, hi, 0.01, 0.4, &mut StdRng::seed_from_u64(7));
        let b = create_jittered_box(lo, hi, 0.01, 0.4, &mut StdRng::seed_from_u64(7));
        let lattice = create_box(lo, hi, 0.01);

        assert_eq!(a, b);
        assert_eq!(a.len(), lattice.len());
        assert_ne!(a, lattice);
        for (p, q) in a.iter().zip(&lattice) {
            assert!(p.x >= lo.x && p.x <= hi.x && p.y >= lo.y && p.y <= hi.y);
            assert!((*p - *q).abs().max_element() <= 0.004 + 1e-12);
        }
    }

    #[test]
    fn test_zero_jitter_is_the_lattice() {
        let mut rng = StdRng::seed_from_u64(1);
        let points = create_jittered_box(Vector::ZERO, Vector::splat(0.1), 0.05, 0.0, &mut rng);
        assert_eq!(points, create_box(Vector::ZERO, Vector::splat(0.1), 0.05));
    }
}
