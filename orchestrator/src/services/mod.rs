//! Service implementations
//!
//! This module contains implementations of the node runtime trait.

pub mod loopback;

#[cfg(test)]
mod tests;

pub use loopback::{LoopbackRuntime, SimulationSettings};
