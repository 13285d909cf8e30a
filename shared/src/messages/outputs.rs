//! Partial results produced by the pipeline workers

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::SharedResult;
use crate::messages::task::{ExtraData, UserInput};
use crate::types::{TaskId, WorkerKind};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppRequirements {
    pub task_id: Option<TaskId>,
    pub app_requirements: Vec<String>,
    pub extra_data: Vec<u8>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CO2Footprint {
    pub task_id: Option<TaskId>,
    pub carbon_footprint: f64,
    pub energy_consumption: f64,
    pub carbon_intensity: f64,
    pub extra_data: Vec<u8>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HWConstraints {
    pub task_id: Option<TaskId>,
    pub max_memory_footprint: u32,
    pub extra_data: Vec<u8>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HWResource {
    pub task_id: Option<TaskId>,
    pub hw_description: String,
    pub power_consumption: f64,
    pub latency: f64,
    pub memory_footprint_of_ml_model: f64,
    pub max_hw_memory_footprint: f64,
    pub extra_data: Vec<u8>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MLModelMetadata {
    pub task_id: Option<TaskId>,
    pub keywords: Vec<String>,
    pub ml_model_metadata: Vec<String>,
    pub extra_data: Vec<u8>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MLModel {
    pub task_id: Option<TaskId>,
    pub model: String,
    pub model_path: String,
    pub model_properties: String,
    pub model_properties_path: String,
    pub input_batch: Vec<String>,
    pub target_latency: f64,
    pub extra_data: Vec<u8>,
}

/// Payload stored by the node runtime for one worker and one task
///
/// `UserInput` is the task record itself, addressed to the orchestrator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NodeOutput {
    AppRequirements(AppRequirements),
    CarbonFootprint(CO2Footprint),
    HwConstraints(HWConstraints),
    HwResource(HWResource),
    MlModelMetadata(MLModelMetadata),
    MlModel(MLModel),
    UserInput(UserInput),
}

impl NodeOutput {
    /// Node that produced (or, for the task record, owns) this payload
    pub fn worker(&self) -> WorkerKind {
        match self {
            NodeOutput::AppRequirements(_) => WorkerKind::AppRequirements,
            NodeOutput::CarbonFootprint(_) => WorkerKind::CarbonFootprint,
            NodeOutput::HwConstraints(_) => WorkerKind::HwConstraints,
            NodeOutput::HwResource(_) => WorkerKind::HwProvider,
            NodeOutput::MlModelMetadata(_) => WorkerKind::MlModelMetadata,
            NodeOutput::MlModel(_) => WorkerKind::MlModelProvider,
            NodeOutput::UserInput(_) => WorkerKind::Orchestrator,
        }
    }

    pub fn task_id(&self) -> Option<TaskId> {
        match self {
            NodeOutput::AppRequirements(o) => o.task_id,
            NodeOutput::CarbonFootprint(o) => o.task_id,
            NodeOutput::HwConstraints(o) => o.task_id,
            NodeOutput::HwResource(o) => o.task_id,
            NodeOutput::MlModelMetadata(o) => o.task_id,
            NodeOutput::MlModel(o) => o.task_id,
            NodeOutput::UserInput(o) => o.task_id,
        }
    }

    pub fn extra_data(&self) -> &[u8] {
        match self {
            NodeOutput::AppRequirements(o) => &o.extra_data,
            NodeOutput::CarbonFootprint(o) => &o.extra_data,
            NodeOutput::HwConstraints(o) => &o.extra_data,
            NodeOutput::HwResource(o) => &o.extra_data,
            NodeOutput::MlModelMetadata(o) => &o.extra_data,
            NodeOutput::MlModel(o) => &o.extra_data,
            NodeOutput::UserInput(o) => &o.extra_data,
        }
    }

    pub fn decoded_extra_data(&self) -> SharedResult<ExtraData> {
        ExtraData::decode(self.extra_data())
    }

    /// JSON view of the payload with the extra-data block decoded in place
    pub fn to_json(&self) -> SharedResult<Value> {
        let mut value = serde_json::to_value(self).map_err(|e| crate::SharedError::SerializationError {
            message: e.to_string(),
        })?;
        if let Value::Object(map) = &mut value {
            map.remove("kind");
            let extra = serde_json::to_value(self.decoded_extra_data()?).map_err(|e| {
                crate::SharedError::SerializationError { message: e.to_string() }
            })?;
            map.insert("extra_data".to_string(), extra);
        }
        Ok(value)
    }
}
