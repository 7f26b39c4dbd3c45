pub mod d2q9;
pub mod error;
pub mod global_variables;
pub mod io;
pub mod post;
pub mod snapshot;

pub use error::{DivergenceReason, SimulationError, SimulationResult};
pub use global_variables::*;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum NodeType {
    Fluid = 0,
    Solid = 1,
}
