//! Notifications delivered by the node runtime to the orchestrator

use serde::{Deserialize, Serialize};

use crate::messages::outputs::NodeOutput;
use crate::types::{TaskId, WorkerKind, WorkerStatus};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NodeEvent {
    /// A worker reported a new lifecycle status
    StatusChanged { worker: WorkerKind, status: WorkerStatus },

    /// A worker published output. `task_id` is `None` for output that is not
    /// scoped to a task.
    NewOutput {
        worker: WorkerKind,
        task_id: Option<TaskId>,
        output: NodeOutput,
    },
}
