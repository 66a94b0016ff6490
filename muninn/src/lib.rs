//! Muninn is the cognitive pipeline of an SPL soccer robot: a graph of per-cycle modules
//! that turns perception, referee state and team radio traffic into one action command
//! per tick, a coordinated role assignment across the team, and a shared belief about
//! where the ball is.

pub mod config;
pub mod data;
pub mod math;
pub mod modules;

pub use miette::Result;

/// Commonly needed types and traits for writing brain modules.
pub mod prelude {
    pub use crate::Result;
    pub use mimir::prelude::*;
}
