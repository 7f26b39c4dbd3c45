use crate::global_variables::Float;
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SimulationError {
    #[error("Invalid configuration: {message}")]
    InvalidConfiguration { message: String },

    #[error("Numerical divergence at step {step}: {reason}")]
    NumericalDivergence { step: usize, reason: DivergenceReason },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SimulationError {
    pub fn invalid_configuration(message: impl Into<String>) -> Self {
        SimulationError::InvalidConfiguration {
            message: message.into(),
        }
    }
}

/// The first offending node found by the check that failed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DivergenceReason {
    NonPositiveDensity { x: usize, y: usize, density: Float },
    NonFiniteVelocity { x: usize, y: usize },
    NonFinitePopulation { x: usize, y: usize, direction: usize },
}

impl fmt::Display for DivergenceReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DivergenceReason::NonPositiveDensity { x, y, density } => {
                write!(f, "density {density:e} at node ({x}, {y})")
            }
            DivergenceReason::NonFiniteVelocity { x, y } => {
                write!(f, "non-finite velocity at node ({x}, {y})")
            }
            DivergenceReason::NonFinitePopulation { x, y, direction } => {
                write!(f, "non-finite population f[{direction}] at node ({x}, {y})")
            }
        }
    }
}

pub type SimulationResult<T> = Result<T, SimulationError>;
