// src/solver/mod.rs
pub mod g2p;
pub mod grid_update;
pub mod p2g;

pub use g2p::grid_to_particle;
pub use grid_update::grid_update;
pub use p2g::particle_to_grid;

use bevy::log::debug;

use crate::config::SolverParams;
use crate::core::{Grid, Particle};
use crate::error::{Result, StepReport};
use crate::materials::{CorotatedModel, NoPlasticity, PlasticModel};

/// Phase the stepper is about to run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StepPhase {
    #[default]
    Reset,
    ParticleToGrid,
    GridSolve,
    GridToParticle,
}

impl StepPhase {
    pub fn next(self) -> Self {
        match self {
            Self::Reset => Self::ParticleToGrid,
            Self::ParticleToGrid => Self::GridSolve,
            Self::GridSolve => Self::GridToParticle,
            Self::GridToParticle => Self::Reset,
        }
    }
}

/// Owns the grid and material models and advances a particle set in time.
pub struct Simulation {
    params: SolverParams,
    grid: Grid,
    model: CorotatedModel,
    plasticity: Box<dyn PlasticModel>,
    phase: StepPhase,
    step: u64,
}

impl Simulation {
    pub fn new(params: SolverParams) -> Result<Self> {
        params.validate()?;
        Ok(Self {
            grid: Grid::new(params.grid_resolution),
            model: CorotatedModel::from_params(&params),
            plasticity: Box::new(NoPlasticity),
            phase: StepPhase::Reset,
            step: 0,
            params,
        })
    }

    pub fn with_plasticity(mut self, plasticity: impl PlasticModel + 'static) -> Self {
        self.plasticity = Box::new(plasticity);
        self
    }

    pub fn params(&self) -> &SolverParams {
        &self.params
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn phase(&self) -> StepPhase {
        self.phase
    }

    /// Number of completed steps.
    pub fn step_count(&self) -> u64 {
        self.step
    }

    /// Run one full step: reset, P2G, grid solve, G2P.
    ///
    /// Recoverable per-particle problems are returned in the report; an
    /// error means the divergence policy considers the run lost.
    pub fn advance(&mut self, particles: &mut [Particle]) -> Result<StepReport> {
        let mut report = StepReport::empty(self.step);
        self.advance_into(particles, &mut report)?;
        Ok(report)
    }

    /// Run one step, appending its diagnostics to `report`. They are kept
    /// even when the divergence policy then fails the step.
    pub fn advance_into(&mut self, particles: &mut [Particle], report: &mut StepReport) -> Result<()> {
        let first = report.diagnostics.len();

        loop {
            match self.phase {
                StepPhase::Reset => self.grid.reset(),
                StepPhase::ParticleToGrid => {
                    particle_to_grid(&mut self.grid, particles, &self.model, &self.params, report)
                }
                StepPhase::GridSolve => grid_update(&mut self.grid, &self.params),
                StepPhase::GridToParticle => grid_to_particle(
                    &self.grid,
                    particles,
                    self.plasticity.as_ref(),
                    &self.params,
                    report,
                ),
            }
            self.phase = self.phase.next();
            if self.phase == StepPhase::Reset {
                break;
            }
        }

        self.step += 1;
        report.steps += 1;

        let diagnostics = &report.diagnostics[first..];
        if !diagnostics.is_empty() {
            debug!("step {}: {} diagnostics", self.step - 1, diagnostics.len());
        }
        self.params.divergence.escalate(diagnostics, particles)
    }

    /// Run the substeps covering one frame and merge their reports.
    pub fn advance_frame(&mut self, particles: &mut [Particle]) -> Result<StepReport> {
        let mut report = StepReport::empty(self.step);
        self.advance_frame_into(particles, &mut report)?;
        Ok(report)
    }

    /// Frame counterpart of [`Simulation::advance_into`]; stops at the first
    /// fatal substep.
    pub fn advance_frame_into(
        &mut self,
        particles: &mut [Particle],
        report: &mut StepReport,
    ) -> Result<()> {
        for _ in 0..self.params.substeps_per_frame() {
            self.advance_into(particles, report)?;
        }
        Ok(())
    }
}
