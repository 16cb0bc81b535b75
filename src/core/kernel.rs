//! Quadratic B-spline transfer kernel.

use crate::math::{Coord, Real, Vector};

/// MPM kernel size (3x3 B-spline)
pub const KERNEL_SIZE: usize = 3;
/// Number of neighbors in 3x3 kernel
pub const NEIGHBOR_COUNT: usize = KERNEL_SIZE * KERNEL_SIZE;

/// Compute the inverse dimension factor used by MLS-MPM kernels.
///
/// `Dinv = 4 / dx²` is the inverse of the quadratic kernel's second moment.
/// Keeping it in one place keeps P2G and G2P consistent.
#[inline]
pub fn inv_d(cell_width: Real) -> Real {
    4.0 / (cell_width * cell_width)
}

/// Per-axis quadratic B-spline weights for a fractional offset `frac`
/// measured from the base node, in cell units.
#[inline(always)]
pub fn quadratic_bspline_weights(frac: Vector) -> [Vector; KERNEL_SIZE] {
    let d0 = Vector::splat(1.5) - frac;
    let d1 = frac - Vector::ONE;
    let d2 = frac - Vector::splat(0.5);
    [0.5 * d0 * d0, Vector::splat(0.75) - d1 * d1, 0.5 * d2 * d2]
}

/// Base node and interpolation weights of one particle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TransferWeights {
    /// Lower-left node of the 3x3 stencil.
    pub base: Coord,
    /// `grid_pos - base`, in cell units.
    pub frac: Vector,
    /// Weights `[w0, w1, w2]`, x and y packed per entry.
    pub weights: [Vector; KERNEL_SIZE],
}

impl TransferWeights {
    /// Weights for a finite particle position in normalized domain units.
    ///
    /// The returned base is not bounds checked; see `Grid::stencil_in_bounds`.
    #[inline]
    pub fn compute(position: Vector, inv_cell_width: Real) -> Self {
        let grid_pos = position * inv_cell_width;
        let base = (grid_pos - Vector::splat(0.5)).floor().as_ivec2();
        let frac = grid_pos - base.as_dvec2();

        Self {
            base,
            frac,
            weights: quadratic_bspline_weights(frac),
        }
    }

    #[inline(always)]
    pub fn weight(&self, i: usize, j: usize) -> Real {
        self.weights[i].x * self.weights[j].y
    }

    /// Offset from the particle to stencil node `(i, j)`, in cell units.
    #[inline(always)]
    pub fn node_offset(&self, i: usize, j: usize) -> Vector {
        Vector::new(i as Real, j as Real) - self.frac
    }

    /// Iterator over `(node coordinate, weight, offset)` for the 3x3 stencil.
    #[inline]
    pub fn iter_neighbors(&self) -> impl Iterator<Item = (Coord, Real, Vector)> + '_ {
        (0..NEIGHBOR_COUNT).map(move |idx| {
            let i = idx % KERNEL_SIZE;
            let j = idx / KERNEL_SIZE;
            (
                self.base + Coord::new(i as i32, j as i32),
                self.weight(i, j),
                self.node_offset(i, j),
            )
        })
    }
}
