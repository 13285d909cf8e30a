//! Message types for the pipeline orchestration system
//!
//! This module organizes the data exchanged through the node runtime by category:
//! - `task`: Task input published to the workers and its extra-data side channel
//! - `outputs`: Partial results produced by each worker
//! - `events`: Notifications delivered by the node runtime to the orchestrator
//! - `config`: Configuration request/response exchange

pub mod config;
pub mod events;
pub mod outputs;
pub mod task;

pub use config::{ConfigurationRequest, ConfigurationResponse, ErrorCode};
pub use events::NodeEvent;
pub use outputs::{AppRequirements, CO2Footprint, HWConstraints, HWResource, MLModel, MLModelMetadata, NodeOutput};
pub use task::{ExtraData, TaskInput, UserInput};
