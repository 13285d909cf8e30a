//! Orchestrator-specific error types

use shared::{SharedError, TaskId, WorkerKind};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OrchestratorError {
    #[error("Invalid input: {field}")]
    InvalidInput { field: String },

    #[error("No results to show for {worker}")]
    UnknownWorker { worker: WorkerKind },

    #[error("No worker handles configuration request: {configuration}")]
    RoutingFailure { configuration: String },

    #[error("Node runtime failure: {message}")]
    TransportFailure { message: String },

    #[error("No {worker} data found for task {task_id}")]
    NotFound { worker: WorkerKind, task_id: TaskId },

    #[error("No task has been submitted yet")]
    NoTasks,

    #[error("Timed out waiting for {worker} result of task {task_id}")]
    WaitTimedOut { worker: WorkerKind, task_id: TaskId },

    #[error("Configuration error: {field}")]
    ConfigurationError { field: String },

    #[error("Shared component error: {0}")]
    SharedError(#[from] SharedError),

    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl OrchestratorError {
    pub fn invalid_input(field: impl Into<String>) -> Self {
        Self::InvalidInput { field: field.into() }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::TransportFailure { message: message.into() }
    }

    pub fn config(field: impl Into<String>) -> Self {
        Self::ConfigurationError { field: field.into() }
    }

    /// Stable short name for structured error reporting
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidInput { .. } => "invalid_input",
            Self::UnknownWorker { .. } => "unknown_worker",
            Self::RoutingFailure { .. } => "routing_failure",
            Self::TransportFailure { .. } => "transport_failure",
            Self::NotFound { .. } => "not_found",
            Self::NoTasks => "no_tasks",
            Self::WaitTimedOut { .. } => "wait_timed_out",
            Self::ConfigurationError { .. } => "configuration_error",
            Self::SharedError(_) => "shared_error",
            Self::JsonError(_) => "json_error",
        }
    }
}

pub type OrchestratorResult<T> = Result<T, OrchestratorError>;
