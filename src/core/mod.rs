pub mod grid;
pub mod kernel;
pub mod mpm_state;
pub mod particle;

pub use grid::{
    BoundaryConditions, BoundaryHandling, Grid, GridNode, PADDING, apply_boundary_conditions,
};
pub use kernel::{KERNEL_SIZE, NEIGHBOR_COUNT, TransferWeights, inv_d, quadratic_bspline_weights};
pub use mpm_state::{MpmState, advance_simulation_system};
pub use particle::{Particle, initialize_particles};
