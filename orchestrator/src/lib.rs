//! Orchestrator library for coordinating a multi-stage ML pipeline
//!
//! This library submits tasks to a set of specialised worker nodes, correlates
//! the partial results each worker publishes back, chains follow-up iterations
//! when more outputs are requested and routes configuration requests to the
//! worker that can answer them. The node transport is injected through the
//! [`NodeRuntime`] trait.

pub mod config;
pub mod core;
pub mod error;
pub mod orchestrator;
pub mod services;
pub mod traits;

// Re-export commonly used types
pub use config::OrchestratorConfig;
pub use core::{OrchestratorState, ResultLedger, TaskRecord, WorkerRegistry};
pub use error::{OrchestratorError, OrchestratorResult};
pub use orchestrator::{Orchestrator, StatusReport, WorkerResult};
pub use services::{LoopbackRuntime, SimulationSettings};
pub use traits::NodeRuntime;
