use crate::config::SolverParams;
use crate::core::Grid;

/// Grid update stage (divides momentum by mass, applies gravity, clamps boundaries).
pub fn grid_update(grid: &mut Grid, params: &SolverParams) {
    grid.update_velocities(params.dt, params.gravity, &params.boundary);
}
