use bevy::log::{error, info};
use bevy::prelude::*;

pub mod config;
pub mod core;
pub mod diagnostics;
pub mod error;
pub mod geometry;
pub mod materials;
pub mod math;
pub mod solver;

// Public re-exports for clean API
pub use config::SolverParams;
pub use crate::core::{
    BoundaryConditions, BoundaryHandling, Grid, GridNode, MpmState, Particle,
    advance_simulation_system, initialize_particles,
};
pub use error::{Diagnostic, DivergencePolicy, SimulationError, StepReport};
pub use geometry::{create_box, create_jittered_box};
pub use materials::{
    CorotatedModel, NoPlasticity, PlasticModel, RotationExtraction, SnowPlasticity, VolumeTerm,
};
pub use solver::{Simulation, StepPhase};

use crate::math::Vector;

/// Inserts an [`MpmState`] seeded with `positions` and advances it by one
/// frame on every `Update`.
#[derive(Default)]
pub struct MpmPlugin {
    pub params: SolverParams,
    pub positions: Vec<Vector>,
    pub plasticity: Option<SnowPlasticity>,
}

impl MpmPlugin {
    pub fn new(params: SolverParams) -> Self {
        Self {
            params,
            ..Default::default()
        }
    }

    pub fn with_positions(mut self, positions: Vec<Vector>) -> Self {
        self.positions.extend(positions);
        self
    }

    pub fn with_snow_plasticity(mut self, plasticity: SnowPlasticity) -> Self {
        self.plasticity = Some(plasticity);
        self
    }
}

impl Plugin for MpmPlugin {
    fn build(&self, app: &mut App) {
        let mut state = match MpmState::new(self.params.clone()) {
            Ok(state) => state,
            Err(err) => {
                error!("MPM plugin not started: {}", err);
                return;
            }
        };
        if let Some(plasticity) = self.plasticity {
            state = state.with_plasticity(plasticity);
        }
        state.initialize(&self.positions);

        info!(
            "MPM: {} particles, {}x{} grid, dt {:e}, {} substeps per frame",
            state.particle_count(),
            self.params.grid_resolution,
            self.params.grid_resolution,
            self.params.dt,
            self.params.substeps_per_frame()
        );

        app.insert_resource(self.params.clone())
            .insert_resource(state)
            .add_systems(Update, advance_simulation_system);
    }
}
