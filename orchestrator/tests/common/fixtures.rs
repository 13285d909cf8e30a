//! Test fixtures and data for orchestrator tests
//!
//! This module provides consistent test data and fixtures used across all test suites.

use orchestrator::services::loopback::simulated_output;
use shared::{CO2Footprint, ExtraData, NodeOutput, TaskId, TaskInput, UserInput, WorkerKind};

/// Standard test data and fixtures
pub struct TestFixtures;

impl TestFixtures {
    pub const PROBLEM: &'static str = "Classify customer churn";
    pub const MODALITY: &'static str = "tabular";
    pub const GOAL: &'static str = "classification";

    /// Problem id used by the reverse-order delivery scenario
    pub const SCENARIO_PROBLEM_ID: u32 = 7;

    /// Problem id of the marker output used to settle the event loop
    pub const SETTLE_PROBLEM_ID: u32 = 9_999;

    /// Fresh submission without chaining hints
    pub fn task_input() -> TaskInput {
        let mut input = TaskInput::new(Self::PROBLEM);
        input.modality = Self::MODALITY.to_string();
        input.inputs = vec!["customer record".to_string()];
        input.outputs = vec!["churn probability".to_string()];
        input.extra.goal = Some(Self::GOAL.to_string());
        input
    }

    /// Fresh submission asking for `num_outputs` model suggestions
    pub fn task_input_with_outputs(num_outputs: u32) -> TaskInput {
        let mut input = Self::task_input();
        input.extra.num_outputs = Some(num_outputs);
        input
    }

    /// Explicit continuation of `previous`
    pub fn continuation_of(previous: TaskId) -> TaskInput {
        let mut input = Self::task_input();
        input.previous_iteration = Some(previous.iteration_id);
        input.extra.previous_problem_id = Some(previous.problem_id);
        input
    }

    /// Task record as the runtime would store it after publication
    pub fn published_input(task_id: TaskId, extra: &ExtraData) -> UserInput {
        UserInput {
            task_id: Some(task_id),
            modality: Self::MODALITY.to_string(),
            problem_short_description: Self::PROBLEM.to_string(),
            extra_data: extra.encode().unwrap(),
            ..UserInput::default()
        }
    }

    /// Carbon footprint output carrying the given extra data
    pub fn carbon_output(task_id: TaskId, extra: &ExtraData) -> NodeOutput {
        NodeOutput::CarbonFootprint(CO2Footprint {
            task_id: Some(task_id),
            carbon_footprint: 1.25,
            energy_consumption: 12.0,
            carbon_intensity: 210.0,
            extra_data: extra.encode().unwrap(),
        })
    }

    /// Carbon footprint output requesting `num_outputs` outputs
    pub fn carbon_output_requesting(task_id: TaskId, num_outputs: u32) -> NodeOutput {
        let extra = ExtraData {
            num_outputs: Some(num_outputs),
            ..ExtraData::default()
        };
        Self::carbon_output(task_id, &extra)
    }

    /// Plausible output of any tracked worker for a task without chaining hints
    pub fn worker_output(worker: WorkerKind, task_id: TaskId) -> NodeOutput {
        match worker {
            WorkerKind::CarbonFootprint => Self::carbon_output(task_id, &ExtraData::default()),
            _ => simulated_output(worker, task_id, &Self::published_input(task_id, &ExtraData::default())).unwrap(),
        }
    }
}
