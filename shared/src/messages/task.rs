//! Task input published to the pipeline workers
//!
//! `UserInput` is the record the node runtime carries to every worker.
//! `TaskInput` is the caller-facing submission shape with the extra-data side
//! channel already decoded.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::{SharedError, SharedResult};
use crate::types::TaskId;

/// Decoded side-channel block attached to task inputs and worker outputs
///
/// Keys this system does not interpret are kept in `other` and written back
/// unchanged, so hints exchanged between workers survive resubmission.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtraData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hardware_required: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_memory_footprint: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub goal: Option<String>,

    /// Number of refinement outputs still requested for this problem
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_outputs: Option<u32>,

    /// Models the next iteration must not select again
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub model_restrains: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_problem_id: Option<u32>,

    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub dataset_type: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub dataset_path: Option<String>,

    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl ExtraData {
    /// Decode an extra-data block. An empty block decodes to the default.
    pub fn decode(bytes: &[u8]) -> SharedResult<Self> {
        if bytes.iter().all(|b| b.is_ascii_whitespace()) {
            return Ok(Self::default());
        }
        serde_json::from_slice(bytes).map_err(|e| SharedError::InvalidExtraData { message: e.to_string() })
    }

    pub fn encode(&self) -> SharedResult<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| SharedError::SerializationError { message: e.to_string() })
    }

    /// Whether the producing worker asked for another refinement pass
    pub fn requests_more_outputs(&self) -> bool {
        self.num_outputs.is_some_and(|n| n > 1)
    }
}

/// Task record distributed to every worker through the node runtime
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserInput {
    pub task_id: Option<TaskId>,
    pub modality: String,
    pub problem_short_description: String,
    pub problem_definition: String,
    pub inputs: Vec<String>,
    pub outputs: Vec<String>,
    pub minimum_samples: u32,
    pub maximum_samples: u32,
    pub optimize_carbon_footprint_manual: bool,
    pub previous_iteration: u32,
    pub optimize_carbon_footprint_auto: bool,
    pub desired_carbon_footprint: f64,
    pub geo_location_continent: String,
    pub geo_location_region: String,
    pub extra_data: Vec<u8>,
}

impl UserInput {
    pub fn decoded_extra_data(&self) -> SharedResult<ExtraData> {
        ExtraData::decode(&self.extra_data)
    }
}

/// Submission as provided by a caller (or rebuilt by the iteration chain)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskInput {
    pub modality: String,
    pub problem_short_description: String,
    pub problem_definition: String,
    pub inputs: Vec<String>,
    pub outputs: Vec<String>,
    pub minimum_samples: u32,
    pub maximum_samples: u32,
    pub optimize_carbon_footprint_manual: bool,
    pub optimize_carbon_footprint_auto: bool,
    pub desired_carbon_footprint: f64,
    pub geo_location_continent: String,
    pub geo_location_region: String,

    /// Iteration this submission continues from. `None` for a fresh problem.
    pub previous_iteration: Option<u32>,

    pub extra: ExtraData,
}

impl TaskInput {
    pub fn new(problem_short_description: impl Into<String>) -> Self {
        Self {
            problem_short_description: problem_short_description.into(),
            ..Self::default()
        }
    }

    /// Task this submission continues, if it carries a complete predecessor reference
    pub fn predecessor(&self) -> Option<TaskId> {
        match (self.extra.previous_problem_id, self.previous_iteration) {
            (Some(problem_id), Some(iteration_id)) => Some(TaskId::new(problem_id, iteration_id)),
            _ => None,
        }
    }

    /// Rebuild a submission from a previously published task record
    pub fn from_user_input(input: &UserInput) -> SharedResult<Self> {
        let extra = input.decoded_extra_data()?;
        let previous_iteration = extra.previous_problem_id.map(|_| input.previous_iteration);

        Ok(Self {
            modality: input.modality.clone(),
            problem_short_description: input.problem_short_description.clone(),
            problem_definition: input.problem_definition.clone(),
            inputs: input.inputs.clone(),
            outputs: input.outputs.clone(),
            minimum_samples: input.minimum_samples,
            maximum_samples: input.maximum_samples,
            optimize_carbon_footprint_manual: input.optimize_carbon_footprint_manual,
            optimize_carbon_footprint_auto: input.optimize_carbon_footprint_auto,
            desired_carbon_footprint: input.desired_carbon_footprint,
            geo_location_continent: input.geo_location_continent.clone(),
            geo_location_region: input.geo_location_region.clone(),
            previous_iteration,
            extra,
        })
    }

    /// Populate a task template allocated by the node runtime
    ///
    /// Hardware requirement and memory footprint fall back to the given
    /// defaults when the submission leaves them out.
    pub fn fill(
        &self,
        template: &mut UserInput,
        task_id: TaskId,
        default_hardware: &str,
        default_max_memory_footprint: u32,
    ) -> SharedResult<()> {
        template.task_id = Some(task_id);
        template.modality = self.modality.clone();
        template.problem_short_description = self.problem_short_description.clone();
        template.problem_definition = self.problem_definition.clone();
        template.inputs = self.inputs.clone();
        template.outputs = self.outputs.clone();
        template.minimum_samples = self.minimum_samples;
        template.maximum_samples = self.maximum_samples;
        template.optimize_carbon_footprint_manual = self.optimize_carbon_footprint_manual;
        template.optimize_carbon_footprint_auto = self.optimize_carbon_footprint_auto;
        template.desired_carbon_footprint = self.desired_carbon_footprint;
        template.geo_location_continent = self.geo_location_continent.clone();
        template.geo_location_region = self.geo_location_region.clone();
        template.previous_iteration = self.previous_iteration.unwrap_or(0);

        let mut extra = self.extra.clone();
        extra
            .hardware_required
            .get_or_insert_with(|| default_hardware.to_string());
        extra.max_memory_footprint.get_or_insert(default_max_memory_footprint);
        template.extra_data = extra.encode()?;

        Ok(())
    }
}
