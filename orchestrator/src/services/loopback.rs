//! In-process node runtime
//!
//! Keeps every published task and delivered output in memory and reports
//! node activity on an unbounded event channel, the same way a networked
//! runtime would. Optionally simulates the six pipeline workers so a full
//! iteration runs without any external node.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use tokio::sync::{mpsc, Mutex};

use shared::{
    node_debug, AppRequirements, CO2Footprint, ConfigurationRequest, ConfigurationResponse, ExtraData, HWConstraints,
    HWResource, MLModel, MLModelMetadata, NodeEvent, NodeOutput, TaskId, UserInput, WorkerKind, WorkerStatus,
};

use crate::config::DEFAULT_MAX_MEMORY_FOOTPRINT;
use crate::error::{OrchestratorError, OrchestratorResult};
use crate::traits::NodeRuntime;

/// Produces the reply to a configuration request
pub type Responder = Arc<dyn Fn(&ConfigurationRequest) -> ConfigurationResponse + Send + Sync>;

/// Delay range of simulated workers
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationSettings {
    pub min_delay: Duration,
    pub max_delay: Duration,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            min_delay: Duration::from_millis(5),
            max_delay: Duration::from_millis(50),
        }
    }
}

impl SimulationSettings {
    pub fn with_max_delay(max_delay: Duration) -> Self {
        Self {
            min_delay: Duration::ZERO,
            max_delay,
        }
    }

    fn jittered_delay(&self) -> Duration {
        let min = self.min_delay.as_millis() as u64;
        let max = (self.max_delay.as_millis() as u64).max(min);
        Duration::from_millis(rand::thread_rng().gen_range(min..=max))
    }
}

#[derive(Debug, Default)]
struct LoopbackStore {
    allocated: HashSet<TaskId>,
    inputs: HashMap<TaskId, UserInput>,
    outputs: HashMap<(WorkerKind, TaskId), NodeOutput>,
    published: Vec<TaskId>,
    requests: Vec<ConfigurationRequest>,
}

/// Node runtime living entirely inside the orchestrator process
#[derive(Clone)]
pub struct LoopbackRuntime {
    next_problem_id: Arc<AtomicU32>,
    store: Arc<Mutex<LoopbackStore>>,
    events: mpsc::UnboundedSender<NodeEvent>,
    responder: Responder,
    reject_publish: Arc<AtomicBool>,
    simulation: Option<SimulationSettings>,
}

impl LoopbackRuntime {
    /// Create a runtime and the event stream the orchestrator consumes
    pub fn new() -> (Self, mpsc::UnboundedReceiver<NodeEvent>) {
        let (events, rx) = mpsc::unbounded_channel();
        let runtime = Self {
            next_problem_id: Arc::new(AtomicU32::new(1)),
            store: Arc::new(Mutex::new(LoopbackStore::default())),
            events,
            responder: Arc::new(|request: &ConfigurationRequest| {
                ConfigurationResponse::success(request, request.configuration.clone())
            }),
            reject_publish: Arc::new(AtomicBool::new(false)),
            simulation: None,
        };
        (runtime, rx)
    }

    /// Allocate problem ids from `problem_id` onwards
    pub fn starting_at(self, problem_id: u32) -> Self {
        self.next_problem_id.store(problem_id, Ordering::SeqCst);
        self
    }

    pub fn with_responder<F>(mut self, responder: F) -> Self
    where
        F: Fn(&ConfigurationRequest) -> ConfigurationResponse + Send + Sync + 'static,
    {
        self.responder = Arc::new(responder);
        self
    }

    /// Answer every published task with simulated worker activity
    pub fn with_simulated_workers(mut self, settings: SimulationSettings) -> Self {
        self.simulation = Some(settings);
        self
    }

    /// Make subsequent publishes fail
    pub fn set_reject_publish(&self, reject: bool) {
        self.reject_publish.store(reject, Ordering::SeqCst);
    }

    /// Store a worker output and announce it
    pub async fn deliver_output(&self, worker: WorkerKind, output: NodeOutput) -> OrchestratorResult<()> {
        let task_id = output.task_id();
        if let Some(task_id) = task_id {
            self.store.lock().await.outputs.insert((worker, task_id), output.clone());
        }
        self.emit(NodeEvent::NewOutput { worker, task_id, output })
    }

    pub fn deliver_status(&self, worker: WorkerKind, status: WorkerStatus) -> OrchestratorResult<()> {
        self.emit(NodeEvent::StatusChanged { worker, status })
    }

    /// Task ids in publication order
    pub async fn published(&self) -> Vec<TaskId> {
        self.store.lock().await.published.clone()
    }

    pub async fn published_input(&self, task_id: TaskId) -> Option<UserInput> {
        self.store.lock().await.inputs.get(&task_id).cloned()
    }

    /// Configuration requests received so far
    pub async fn requests(&self) -> Vec<ConfigurationRequest> {
        self.store.lock().await.requests.clone()
    }

    fn emit(&self, event: NodeEvent) -> OrchestratorResult<()> {
        self.events
            .send(event)
            .map_err(|_| OrchestratorError::transport("orchestrator event channel closed"))
    }

    fn simulate(&self, task_id: TaskId, input: UserInput, settings: SimulationSettings) {
        for worker in WorkerKind::TRACKED {
            let runtime = self.clone();
            let input = input.clone();
            // Carbon footprint closes the iteration, so it reports after the others
            let delay = match worker {
                WorkerKind::CarbonFootprint => settings.max_delay + settings.jittered_delay(),
                _ => settings.jittered_delay(),
            };

            tokio::spawn(async move {
                let _ = runtime.deliver_status(worker, WorkerStatus::Running);
                tokio::time::sleep(delay).await;

                let output = match simulated_output(worker, task_id, &input) {
                    Ok(output) => output,
                    Err(e) => {
                        let _ = runtime.deliver_status(worker, WorkerStatus::Error);
                        node_debug!(worker, "Simulated worker failed on task {}: {}", task_id, e);
                        return;
                    }
                };
                if runtime.deliver_output(worker, output).await.is_ok() {
                    let _ = runtime.deliver_status(worker, WorkerStatus::Idle);
                }
            });
        }
    }
}

#[async_trait]
impl NodeRuntime for LoopbackRuntime {
    async fn allocate_task(&self) -> OrchestratorResult<(TaskId, UserInput)> {
        let task_id = TaskId::first(self.next_problem_id.fetch_add(1, Ordering::SeqCst));
        self.store.lock().await.allocated.insert(task_id);

        let template = UserInput {
            task_id: Some(task_id),
            ..UserInput::default()
        };
        Ok((task_id, template))
    }

    async fn allocate_iteration(&self, base: TaskId) -> OrchestratorResult<(TaskId, UserInput)> {
        let task_id = base
            .next_iteration()
            .ok_or_else(|| OrchestratorError::transport(format!("problem {} has no iterations left", base.problem_id)))?;
        let mut store = self.store.lock().await;
        if !store.allocated.insert(task_id) {
            return Err(OrchestratorError::transport(format!("task {task_id} is already allocated")));
        }

        let mut template = store.inputs.get(&base).cloned().unwrap_or_default();
        template.task_id = Some(task_id);
        Ok((task_id, template))
    }

    async fn publish(&self, task_id: TaskId, input: UserInput) -> OrchestratorResult<()> {
        if self.reject_publish.load(Ordering::SeqCst) {
            return Err(OrchestratorError::transport(format!("publish of task {task_id} rejected")));
        }

        {
            let mut store = self.store.lock().await;
            store.inputs.insert(task_id, input.clone());
            store.published.push(task_id);
        }

        if let Some(settings) = self.simulation {
            self.simulate(task_id, input, settings);
        }
        Ok(())
    }

    async fn fetch_payload(&self, worker: WorkerKind, task_id: TaskId) -> OrchestratorResult<Option<NodeOutput>> {
        let store = self.store.lock().await;
        let payload = match worker {
            WorkerKind::Orchestrator => store.inputs.get(&task_id).cloned().map(NodeOutput::UserInput),
            _ => store.outputs.get(&(worker, task_id)).cloned(),
        };
        Ok(payload)
    }

    async fn request_response(&self, request: ConfigurationRequest) -> OrchestratorResult<ConfigurationResponse> {
        self.store.lock().await.requests.push(request.clone());
        Ok((self.responder)(&request))
    }
}

/// Output a simulated worker produces for a task
///
/// The carbon footprint output echoes the task's extra data and adds the
/// simulated model to `model_restrains`, so a follow-up iteration steers away
/// from it.
pub fn simulated_output(worker: WorkerKind, task_id: TaskId, input: &UserInput) -> OrchestratorResult<NodeOutput> {
    let extra = input.decoded_extra_data()?;
    let model = simulated_model_name(task_id, input);
    let mut rng = rand::thread_rng();

    let output = match worker {
        WorkerKind::AppRequirements => NodeOutput::AppRequirements(AppRequirements {
            task_id: Some(task_id),
            app_requirements: vec![format!("serve '{}'", input.problem_short_description)],
            extra_data: input.extra_data.clone(),
        }),
        WorkerKind::CarbonFootprint => {
            let mut carbon_extra = ExtraData {
                num_outputs: extra.num_outputs,
                model_restrains: extra.model_restrains.clone(),
                ..ExtraData::default()
            };
            carbon_extra.model_restrains.push(model);

            NodeOutput::CarbonFootprint(CO2Footprint {
                task_id: Some(task_id),
                carbon_footprint: rng.gen_range(0.1..5.0),
                energy_consumption: rng.gen_range(1.0..50.0),
                carbon_intensity: rng.gen_range(50.0..500.0),
                extra_data: carbon_extra.encode()?,
            })
        }
        WorkerKind::HwConstraints => NodeOutput::HwConstraints(HWConstraints {
            task_id: Some(task_id),
            max_memory_footprint: extra.max_memory_footprint.unwrap_or(DEFAULT_MAX_MEMORY_FOOTPRINT),
            extra_data: input.extra_data.clone(),
        }),
        WorkerKind::HwProvider => NodeOutput::HwResource(HWResource {
            task_id: Some(task_id),
            hw_description: extra.hardware_required.clone().unwrap_or_default(),
            power_consumption: rng.gen_range(1.0..30.0),
            latency: rng.gen_range(0.5..20.0),
            memory_footprint_of_ml_model: rng.gen_range(10.0..90.0),
            max_hw_memory_footprint: f64::from(extra.max_memory_footprint.unwrap_or(DEFAULT_MAX_MEMORY_FOOTPRINT)),
            extra_data: input.extra_data.clone(),
        }),
        WorkerKind::MlModelMetadata => NodeOutput::MlModelMetadata(MLModelMetadata {
            task_id: Some(task_id),
            keywords: input
                .problem_short_description
                .split_whitespace()
                .map(str::to_lowercase)
                .collect(),
            ml_model_metadata: vec![input.modality.clone()],
            extra_data: input.extra_data.clone(),
        }),
        WorkerKind::MlModelProvider => NodeOutput::MlModel(MLModel {
            task_id: Some(task_id),
            model,
            input_batch: input.inputs.clone(),
            target_latency: rng.gen_range(1.0..100.0),
            extra_data: input.extra_data.clone(),
            ..MLModel::default()
        }),
        WorkerKind::Orchestrator | WorkerKind::Unknown => {
            return Err(OrchestratorError::UnknownWorker { worker });
        }
    };

    Ok(output)
}

fn simulated_model_name(task_id: TaskId, input: &UserInput) -> String {
    let modality = if input.modality.is_empty() { "generic" } else { &input.modality };
    format!("{}-candidate-{}", modality, task_id.iteration_id)
}
