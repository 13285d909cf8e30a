//! Worker node identities and their lifecycle status

use crate::errors::SharedError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of node taking part in the pipeline
///
/// The first six variants are the pipeline workers whose results are tracked
/// per task. `Orchestrator` and `Unknown` are only used for addressing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkerKind {
    AppRequirements,
    CarbonFootprint,
    HwConstraints,
    HwProvider,
    MlModelMetadata,
    MlModelProvider,
    Orchestrator,
    Unknown,
}

impl WorkerKind {
    /// Workers with a result slot in every task record, in enumeration order
    pub const TRACKED: [WorkerKind; 6] = [
        WorkerKind::AppRequirements,
        WorkerKind::CarbonFootprint,
        WorkerKind::HwConstraints,
        WorkerKind::HwProvider,
        WorkerKind::MlModelMetadata,
        WorkerKind::MlModelProvider,
    ];

    /// Numeric node id as used on the node runtime. Id 6 marks the end of the
    /// worker range and is never assigned.
    pub fn id(&self) -> u32 {
        match self {
            WorkerKind::AppRequirements => 0,
            WorkerKind::CarbonFootprint => 1,
            WorkerKind::HwConstraints => 2,
            WorkerKind::HwProvider => 3,
            WorkerKind::MlModelMetadata => 4,
            WorkerKind::MlModelProvider => 5,
            WorkerKind::Orchestrator => 7,
            WorkerKind::Unknown => 8,
        }
    }

    pub fn from_id(id: u32) -> Self {
        match id {
            0 => WorkerKind::AppRequirements,
            1 => WorkerKind::CarbonFootprint,
            2 => WorkerKind::HwConstraints,
            3 => WorkerKind::HwProvider,
            4 => WorkerKind::MlModelMetadata,
            5 => WorkerKind::MlModelProvider,
            7 => WorkerKind::Orchestrator,
            _ => WorkerKind::Unknown,
        }
    }

    /// Whether this kind produces task results
    pub fn is_tracked(&self) -> bool {
        !matches!(self, WorkerKind::Orchestrator | WorkerKind::Unknown)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            WorkerKind::AppRequirements => "app_requirements",
            WorkerKind::CarbonFootprint => "carbon_footprint",
            WorkerKind::HwConstraints => "hw_constraints",
            WorkerKind::HwProvider => "hw_provider",
            WorkerKind::MlModelMetadata => "ml_model_metadata",
            WorkerKind::MlModelProvider => "ml_model_provider",
            WorkerKind::Orchestrator => "orchestrator",
            WorkerKind::Unknown => "unknown",
        }
    }

    /// Human readable node name used in status reports
    pub fn description(&self) -> &'static str {
        match self {
            WorkerKind::AppRequirements => "Application-level requirements",
            WorkerKind::CarbonFootprint => "Carbontracker",
            WorkerKind::HwConstraints => "HW Constraints for inference",
            WorkerKind::HwProvider => "HW Provider",
            WorkerKind::MlModelMetadata => "ML Model Metadata",
            WorkerKind::MlModelProvider => "ML Model Provider",
            WorkerKind::Orchestrator => "Orchestrator",
            WorkerKind::Unknown => "Unknown node",
        }
    }
}

impl fmt::Display for WorkerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for WorkerKind {
    type Err = SharedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "app_requirements" => Ok(WorkerKind::AppRequirements),
            "carbon_footprint" | "carbontracker" => Ok(WorkerKind::CarbonFootprint),
            "hw_constraints" => Ok(WorkerKind::HwConstraints),
            "hw_provider" | "hw_resources" => Ok(WorkerKind::HwProvider),
            "ml_model_metadata" => Ok(WorkerKind::MlModelMetadata),
            "ml_model_provider" | "ml_model" => Ok(WorkerKind::MlModelProvider),
            "orchestrator" => Ok(WorkerKind::Orchestrator),
            _ => match normalized.parse::<u32>() {
                Ok(id) if WorkerKind::from_id(id) != WorkerKind::Unknown => Ok(WorkerKind::from_id(id)),
                _ => Err(SharedError::UnknownWorker { input: s.to_string() }),
            },
        }
    }
}

/// Last reported lifecycle status of a worker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkerStatus {
    #[default]
    Inactive,
    Error,
    Idle,
    Initializing,
    Running,
    Terminating,
}

impl WorkerStatus {
    pub fn from_id(id: u32) -> Option<Self> {
        match id {
            0 => Some(WorkerStatus::Inactive),
            1 => Some(WorkerStatus::Error),
            2 => Some(WorkerStatus::Idle),
            3 => Some(WorkerStatus::Initializing),
            4 => Some(WorkerStatus::Running),
            5 => Some(WorkerStatus::Terminating),
            _ => None,
        }
    }
}

impl fmt::Display for WorkerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WorkerStatus::Inactive => "INACTIVE",
            WorkerStatus::Error => "ERROR",
            WorkerStatus::Idle => "IDLE",
            WorkerStatus::Initializing => "INITIALIZING",
            WorkerStatus::Running => "RUNNING",
            WorkerStatus::Terminating => "TERMINATING",
        };
        f.write_str(name)
    }
}

impl std::str::FromStr for WorkerStatus {
    type Err = SharedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "INACTIVE" => Ok(WorkerStatus::Inactive),
            "ERROR" => Ok(WorkerStatus::Error),
            "IDLE" => Ok(WorkerStatus::Idle),
            "INITIALIZING" => Ok(WorkerStatus::Initializing),
            "RUNNING" => Ok(WorkerStatus::Running),
            "TERMINATING" => Ok(WorkerStatus::Terminating),
            _ => Err(SharedError::UnknownStatus { input: s.to_string() }),
        }
    }
}
