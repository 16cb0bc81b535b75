use std::io::{self, Write};

use bevy::log::{error, warn};
use bevy::prelude::{ResMut, Resource};

use crate::config::SolverParams;
use crate::diagnostics;
use crate::error::{Diagnostic, Result, SimulationError, StepReport};
use crate::materials::PlasticModel;
use crate::math::Vector;
use crate::solver::Simulation;

use super::grid::Grid;
use super::particle::{Particle, initialize_particles};

/// Aggregate simulation state: the particle set, the stepper and the
/// diagnostics collected since the driver last drained them.
#[derive(Resource)]
pub struct MpmState {
    particles: Vec<Particle>,
    simulation: Simulation,
    diagnostics: Vec<Diagnostic>,
    frame: u64,
    halted: Option<SimulationError>,
}

impl MpmState {
    pub fn new(params: SolverParams) -> Result<Self> {
        Ok(Self {
            particles: Vec::new(),
            simulation: Simulation::new(params)?,
            diagnostics: Vec::new(),
            frame: 0,
            halted: None,
        })
    }

    pub fn with_plasticity(mut self, plasticity: impl PlasticModel + 'static) -> Self {
        self.simulation = self.simulation.with_plasticity(plasticity);
        self
    }

    /// Append one resting particle per position.
    pub fn initialize(&mut self, positions: &[Vector]) {
        let params = self.simulation.params().clone();
        initialize_particles(&mut self.particles, positions, &params);
    }

    pub fn add_particle(&mut self, particle: Particle) -> usize {
        self.particles.push(particle);
        self.particles.len() - 1
    }

    pub fn particle_count(&self) -> usize {
        self.particles.len()
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn grid(&self) -> &Grid {
        self.simulation.grid()
    }

    pub fn solver_params(&self) -> &SolverParams {
        self.simulation.params()
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn step_count(&self) -> u64 {
        self.simulation.step_count()
    }

    pub fn is_halted(&self) -> bool {
        self.halted.is_some()
    }

    /// The error that stopped the run, if any.
    pub fn halt_reason(&self) -> Option<&SimulationError> {
        self.halted.as_ref()
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }

    /// Advance a single substep.
    pub fn advance(&mut self) -> Result<()> {
        self.ensure_running()?;
        let mut report = StepReport::empty(self.simulation.step_count());
        let outcome = self.simulation.advance_into(&mut self.particles, &mut report);
        self.record(report, outcome)
    }

    /// Advance one frame worth of substeps.
    pub fn advance_frame(&mut self) -> Result<()> {
        self.ensure_running()?;
        let mut report = StepReport::empty(self.simulation.step_count());
        let outcome = self
            .simulation
            .advance_frame_into(&mut self.particles, &mut report);
        self.record(report, outcome)?;
        self.frame += 1;
        Ok(())
    }

    fn ensure_running(&self) -> Result<()> {
        match &self.halted {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    /// Keep the diagnostics of every step that ran, including a failed one.
    fn record(&mut self, report: StepReport, outcome: Result<()>) -> Result<()> {
        self.diagnostics.extend(report.diagnostics);
        if let Err(err) = &outcome {
            self.halted = Some(err.clone());
        }
        outcome
    }

    /// Write the particle positions and grid masses to `out`.
    pub fn dump(&self, out: &mut impl Write) -> io::Result<()> {
        diagnostics::dump(out, &self.particles, self.grid(), self.step_count())
    }
}

/// Advance the simulation by one frame per app update.
pub fn advance_simulation_system(mut state: ResMut<MpmState>) {
    if state.is_halted() {
        return;
    }

    let outcome = state.advance_frame();

    let diagnostics = state.take_diagnostics();
    if !diagnostics.is_empty() {
        warn!(
            "frame {}: {} particle diagnostics",
            state.frame(),
            diagnostics.len()
        );
        for diagnostic in diagnostics.iter().take(8) {
            warn!("  {}", diagnostic);
        }
    }

    if let Err(err) = outcome {
        error!("simulation halted at frame {}: {}", state.frame(), err);
    }
}
