//! Core types used throughout the orchestration system

pub mod node;
pub mod task;

pub use node::{WorkerKind, WorkerStatus};
pub use task::TaskId;
