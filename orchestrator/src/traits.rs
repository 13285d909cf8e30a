//! Trait definitions with mockall annotations for testing
//!
//! The node runtime is the transport that carries tasks to the workers and
//! their outputs back. The orchestrator only sees it through this trait, which
//! keeps the engine testable with mocks or the in-process loopback runtime.

use shared::{ConfigurationRequest, ConfigurationResponse, NodeOutput, TaskId, UserInput, WorkerKind};

use crate::error::OrchestratorResult;

/// Node runtime abstraction for dependency injection
///
/// Inbound notifications (status changes, new outputs) are not part of this
/// trait: runtimes deliver them as [`shared::NodeEvent`] messages on a
/// channel consumed by [`crate::Orchestrator::run`].
#[mockall::automock]
#[async_trait::async_trait]
pub trait NodeRuntime: Send + Sync {
    /// Allocate a fresh problem
    ///
    /// # Returns
    /// The new task id (iteration 0) and an empty task template
    async fn allocate_task(&self) -> OrchestratorResult<(TaskId, UserInput)>;

    /// Allocate the next iteration of an existing problem
    ///
    /// # Parameters
    /// - `base`: Task the new iteration continues from
    ///
    /// # Returns
    /// The successor task id and a template seeded from the base task's input
    async fn allocate_iteration(&self, base: TaskId) -> OrchestratorResult<(TaskId, UserInput)>;

    /// Publish a filled task template to all workers
    async fn publish(&self, task_id: TaskId, input: UserInput) -> OrchestratorResult<()>;

    /// Fetch the payload a node produced for a task
    ///
    /// Addressing `WorkerKind::Orchestrator` returns the task's own input
    /// record. `None` when the runtime holds no such payload.
    async fn fetch_payload(&self, worker: WorkerKind, task_id: TaskId) -> OrchestratorResult<Option<NodeOutput>>;

    /// Send a configuration request and wait for the worker's reply
    async fn request_response(&self, request: ConfigurationRequest) -> OrchestratorResult<ConfigurationResponse>;
}
