//! Shared types for the ML pipeline orchestration system
//!
//! Contains the value types and messages exchanged between the orchestrator
//! and the worker nodes through the node runtime.

pub mod errors;
pub mod logging;
pub mod messages;
pub mod types;

pub use errors::*;
pub use types::*;

pub use messages::{
    // Task payloads
    ExtraData, TaskInput, UserInput,

    // Worker outputs
    AppRequirements, CO2Footprint, HWConstraints, HWResource, MLModel, MLModelMetadata, NodeOutput,

    // Node runtime events
    NodeEvent,

    // Configuration request/response
    ConfigurationRequest, ConfigurationResponse, ErrorCode,
};
