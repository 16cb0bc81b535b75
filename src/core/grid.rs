//! Background grid for MPM simulation
//!
//! Collocated `(N+1)x(N+1)` lattice over the unit square, stored with one
//! padding ring on every side so every 3x3 stencil of a particle inside
//! `[0, 1]²` is addressable.

use crate::materials::utils;
use crate::math::{Coord, Real, Vector, zero_vector};

/// Extra node ring stored around the `0..=N` lattice.
pub const PADDING: i32 = 1;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct GridNode {
    /// Momentum accumulated during P2G.
    pub momentum: Vector,
    pub mass: Real,
    /// `momentum / mass` after the grid update; zero for empty nodes.
    pub velocity: Vector,
}

impl GridNode {
    #[inline(always)]
    pub fn zeroed() -> Self {
        Self::default()
    }

    #[inline(always)]
    pub fn zero(&mut self) {
        *self = Self::zeroed();
    }
}

#[derive(Clone, Debug)]
pub struct Grid {
    resolution: usize,
    side: usize,
    nodes: Vec<GridNode>,
}

impl Grid {
    pub fn new(resolution: usize) -> Self {
        let side = resolution + 1 + 2 * PADDING as usize;
        Self {
            resolution,
            side,
            nodes: vec![GridNode::zeroed(); side * side],
        }
    }

    pub fn resolution(&self) -> usize {
        self.resolution
    }

    pub fn cell_width(&self) -> Real {
        1.0 / self.resolution as Real
    }

    /// Smallest and largest stored node coordinate per axis.
    #[inline(always)]
    pub fn coord_range(&self) -> (i32, i32) {
        (-PADDING, self.resolution as i32 + PADDING)
    }

    #[inline(always)]
    pub fn contains(&self, coord: Coord) -> bool {
        let (lo, hi) = self.coord_range();
        coord.x >= lo && coord.x <= hi && coord.y >= lo && coord.y <= hi
    }

    /// Whether the 3x3 stencil starting at `base` is stored.
    #[inline(always)]
    pub fn stencil_in_bounds(&self, base: Coord) -> bool {
        self.contains(base) && self.contains(base + Coord::splat(2))
    }

    #[inline(always)]
    fn linear_index(&self, coord: Coord) -> Option<usize> {
        if !self.contains(coord) {
            return None;
        }
        let x = (coord.x + PADDING) as usize;
        let y = (coord.y + PADDING) as usize;
        Some(y * self.side + x)
    }

    #[inline(always)]
    fn coord_of(&self, linear_index: usize) -> Coord {
        Coord::new(
            (linear_index % self.side) as i32 - PADDING,
            (linear_index / self.side) as i32 - PADDING,
        )
    }

    /// Normalized domain position of a node.
    #[inline(always)]
    pub fn node_position(&self, coord: Coord) -> Vector {
        coord.as_dvec2() * self.cell_width()
    }

    pub fn node(&self, coord: Coord) -> Option<&GridNode> {
        self.linear_index(coord).map(|idx| &self.nodes[idx])
    }

    pub fn node_mut(&mut self, coord: Coord) -> Option<&mut GridNode> {
        self.linear_index(coord).map(move |idx| &mut self.nodes[idx])
    }

    /// Zero every node.
    pub fn reset(&mut self) {
        for node in self.nodes.iter_mut() {
            node.zero();
        }
    }

    /// Add momentum and mass to a node; `false` when `coord` is not stored.
    #[inline]
    pub fn accumulate(&mut self, coord: Coord, momentum: Vector, mass: Real) -> bool {
        match self.node_mut(coord) {
            Some(node) => {
                node.momentum += momentum;
                node.mass += mass;
                true
            }
            None => false,
        }
    }

    pub fn iter_nodes(&self) -> impl Iterator<Item = (Coord, &GridNode)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(idx, node)| (self.coord_of(idx), node))
    }

    /// Turn momentum into velocity, add gravity and apply the boundary
    /// conditions. Empty nodes are left untouched.
    pub fn update_velocities(&mut self, dt: Real, gravity: Vector, boundary: &BoundaryConditions) {
        let gravity_step = gravity * dt;
        let cell_width = self.cell_width();
        let side = self.side;

        for (idx, node) in self.nodes.iter_mut().enumerate() {
            if node.mass <= 0.0 {
                continue;
            }

            node.velocity = node.momentum * utils::inv_exact(node.mass);
            node.velocity += gravity_step;

            let coord = Coord::new(
                (idx % side) as i32 - PADDING,
                (idx / side) as i32 - PADDING,
            );
            apply_boundary_conditions(node, coord.as_dvec2() * cell_width, boundary);
        }
    }

    pub fn total_mass(&self) -> Real {
        self.nodes.iter().map(|node| node.mass).sum()
    }

    pub fn total_momentum(&self) -> Vector {
        self.nodes
            .iter()
            .fold(zero_vector(), |acc, node| acc + node.momentum)
    }
}

// Boundary handling modes
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BoundaryHandling {
    /// Velocity forced to zero.
    Stick,
    /// Only motion into the wall is removed; lift-off is allowed.
    Separate,
    /// Normal component removed, tangential motion kept.
    Slip,
    /// Open boundary.
    None,
}

impl BoundaryHandling {
    /// `outward` is the unit normal pointing out of the domain.
    #[inline]
    pub fn apply(&self, velocity: &mut Vector, outward: Vector) {
        match self {
            Self::Stick => *velocity = zero_vector(),
            Self::Separate => {
                let normal_speed = velocity.dot(outward);
                if normal_speed > 0.0 {
                    *velocity -= outward * normal_speed;
                }
            }
            Self::Slip => {
                let normal_speed = velocity.dot(outward);
                *velocity -= outward * normal_speed;
            }
            Self::None => {}
        }
    }
}

/// Per-side boundary behaviour within a band of `thickness` around the
/// unit square.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundaryConditions {
    pub thickness: Real,
    pub left: BoundaryHandling,
    pub right: BoundaryHandling,
    pub floor: BoundaryHandling,
    pub ceiling: BoundaryHandling,
}

impl Default for BoundaryConditions {
    fn default() -> Self {
        Self {
            thickness: crate::config::constants::BOUNDARY_THICKNESS,
            left: BoundaryHandling::Stick,
            right: BoundaryHandling::Stick,
            floor: BoundaryHandling::Separate,
            ceiling: BoundaryHandling::Stick,
        }
    }
}

impl BoundaryConditions {
    pub fn uniform(thickness: Real, handling: BoundaryHandling) -> Self {
        Self {
            thickness,
            left: handling,
            right: handling,
            floor: handling,
            ceiling: handling,
        }
    }
}

/// Apply the boundary policy to a node at normalized position `position`.
#[inline]
pub fn apply_boundary_conditions(node: &mut GridNode, position: Vector, boundary: &BoundaryConditions) {
    let b = boundary.thickness;

    if position.x < b {
        boundary.left.apply(&mut node.velocity, Vector::NEG_X);
    }
    if position.x > 1.0 - b {
        boundary.right.apply(&mut node.velocity, Vector::X);
    }
    if position.y > 1.0 - b {
        boundary.ceiling.apply(&mut node.velocity, Vector::Y);
    }
    if position.y < b {
        boundary.floor.apply(&mut node.velocity, Vector::NEG_Y);
    }
}
