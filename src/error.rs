//! Error types and per-step diagnostics.

use std::fmt;

use thiserror::Error;

use crate::config::constants;
use crate::core::Particle;
use crate::math::{Real, Vector};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SimulationError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("particle {index} left the grid for {steps} consecutive steps (last at {position})")]
    OutOfDomainParticle {
        index: usize,
        position: Vector,
        steps: u32,
    },

    #[error("particle {index} has a degenerate deformation gradient (det F = {determinant})")]
    DegenerateDeformation { index: usize, determinant: Real },
}

pub type Result<T> = std::result::Result<T, SimulationError>;

/// Recoverable per-particle event recorded during a step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Diagnostic {
    /// The particle was outside the grid; `position` is where it was found.
    /// G2P clamps it back into the domain.
    OutOfDomain { index: usize, position: Vector },
    /// `det(F) <= 0` or non-finite state; the particle is frozen.
    DegenerateDeformation { index: usize, determinant: Real },
}

impl Diagnostic {
    pub fn particle_index(&self) -> usize {
        match self {
            Self::OutOfDomain { index, .. } | Self::DegenerateDeformation { index, .. } => *index,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfDomain { index, position } => {
                write!(f, "particle {index} out of domain at {position}")
            }
            Self::DegenerateDeformation { index, determinant } => {
                write!(f, "particle {index} frozen, det F = {determinant}")
            }
        }
    }
}

/// Diagnostics produced by one or more consecutive steps.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StepReport {
    /// Index of the first step covered by this report.
    pub step: u64,
    pub steps: u32,
    pub diagnostics: Vec<Diagnostic>,
}

impl StepReport {
    pub fn new(step: u64) -> Self {
        Self {
            step,
            steps: 1,
            diagnostics: Vec::new(),
        }
    }

    /// Report that accumulates steps as they run.
    pub fn empty(step: u64) -> Self {
        Self {
            step,
            steps: 0,
            diagnostics: Vec::new(),
        }
    }

    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn has_out_of_domain(&self, index: usize) -> bool {
        self.diagnostics
            .iter()
            .any(|d| matches!(d, Diagnostic::OutOfDomain { index: i, .. } if *i == index))
    }

    pub fn has_degenerate(&self, index: usize) -> bool {
        self.diagnostics.iter().any(
            |d| matches!(d, Diagnostic::DegenerateDeformation { index: i, .. } if *i == index),
        )
    }

    pub fn out_of_domain_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| matches!(d, Diagnostic::OutOfDomain { .. }))
            .count()
    }

    pub fn degenerate_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| matches!(d, Diagnostic::DegenerateDeformation { .. }))
            .count()
    }

    /// Append a later report.
    pub fn merge(&mut self, other: StepReport) {
        self.steps += other.steps;
        self.diagnostics.extend(other.diagnostics);
    }
}

/// Decides which diagnostics end the run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DivergencePolicy {
    /// Fail the step on the first degenerate particle instead of freezing it.
    pub abort_on_degenerate: bool,
    /// A particle clamped back into the domain on more consecutive steps than
    /// this is treated as divergence.
    pub max_out_of_domain_steps: u32,
}

impl Default for DivergencePolicy {
    fn default() -> Self {
        Self {
            abort_on_degenerate: false,
            max_out_of_domain_steps: constants::MAX_OUT_OF_DOMAIN_STEPS,
        }
    }
}

impl DivergencePolicy {
    pub fn strict() -> Self {
        Self {
            abort_on_degenerate: true,
            max_out_of_domain_steps: 0,
        }
    }

    /// First fatal event among `diagnostics`, judged against the current
    /// particle state.
    pub fn escalate(&self, diagnostics: &[Diagnostic], particles: &[Particle]) -> Result<()> {
        for diagnostic in diagnostics {
            match *diagnostic {
                Diagnostic::DegenerateDeformation { index, determinant } => {
                    if self.abort_on_degenerate {
                        return Err(SimulationError::DegenerateDeformation { index, determinant });
                    }
                }
                Diagnostic::OutOfDomain { index, .. } => {
                    let Some(particle) = particles.get(index) else {
                        continue;
                    };
                    if particle.out_of_domain_steps > self.max_out_of_domain_steps {
                        return Err(SimulationError::OutOfDomainParticle {
                            index,
                            position: particle.position,
                            steps: particle.out_of_domain_steps,
                        });
                    }
                }
            }
        }
        Ok(())
    }
}
