//! Main orchestrator implementation
//!
//! The orchestrator submits tasks to the worker pipeline, correlates the
//! partial results each worker publishes back, tracks worker health and
//! relays configuration requests. It is a cheap cloneable handle: caller
//! tasks use clones concurrently while one clone drives [`Orchestrator::run`].

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tokio::sync::{mpsc, Mutex, Notify};

use shared::{
    logging, node_debug, node_error, node_info, node_warn, ConfigurationRequest, ConfigurationResponse, NodeEvent,
    NodeOutput, TaskId, TaskInput, WorkerKind, WorkerStatus,
};

use crate::{
    config::OrchestratorConfig,
    core::{chain, route, OrchestratorState, TaskRecord},
    error::{OrchestratorError, OrchestratorResult},
    traits::NodeRuntime,
};

const NODE: WorkerKind = WorkerKind::Orchestrator;

/// A worker's result for one task as handed to callers
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkerResult {
    pub worker: WorkerKind,
    pub task_id: TaskId,

    /// Payload fields with the extra-data block decoded
    pub data: Value,
}

/// Answer to a status query
#[derive(Debug, Clone, PartialEq)]
pub enum StatusReport {
    Single { worker: WorkerKind, status: WorkerStatus },
    All(BTreeMap<WorkerKind, WorkerStatus>),
}

impl fmt::Display for StatusReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusReport::Single { worker, status } => {
                writeln!(f, "{} node status {}", worker.description(), status)
            }
            StatusReport::All(statuses) if statuses.is_empty() => {
                writeln!(f, "No nodes have reported their status yet.")
            }
            StatusReport::All(statuses) => {
                for (worker, status) in statuses {
                    writeln!(f, "{} node status {}", worker.description(), status)?;
                }
                Ok(())
            }
        }
    }
}

/// Main orchestrator that coordinates the worker pipeline
pub struct Orchestrator<R: NodeRuntime> {
    runtime: Arc<R>,

    /// Registry, ledger and transaction counter
    state: Arc<Mutex<OrchestratorState>>,

    /// Broadcast after every result registration
    results_changed: Arc<Notify>,

    config: Arc<OrchestratorConfig>,
}

impl<R: NodeRuntime> Clone for Orchestrator<R> {
    fn clone(&self) -> Self {
        Self {
            runtime: Arc::clone(&self.runtime),
            state: Arc::clone(&self.state),
            results_changed: Arc::clone(&self.results_changed),
            config: Arc::clone(&self.config),
        }
    }
}

impl<R: NodeRuntime> Orchestrator<R> {
    pub fn new(runtime: R, config: OrchestratorConfig) -> Self {
        Self::with_shared_runtime(Arc::new(runtime), config)
    }

    /// Create an orchestrator over a runtime handle the caller keeps a reference to
    pub fn with_shared_runtime(runtime: Arc<R>, config: OrchestratorConfig) -> Self {
        let state = OrchestratorState::new(config.max_tracked_problems);
        Self {
            runtime,
            state: Arc::new(Mutex::new(state)),
            results_changed: Arc::new(Notify::new()),
            config: Arc::new(config),
        }
    }

    pub fn runtime(&self) -> &Arc<R> {
        &self.runtime
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Consume node runtime events until the channel closes or shutdown is signalled
    ///
    /// Handler errors are logged; they never stop the loop.
    pub async fn run(
        &self,
        mut events: mpsc::UnboundedReceiver<NodeEvent>,
        mut shutdown: mpsc::Receiver<()>,
    ) -> OrchestratorResult<()> {
        logging::log_startup(NODE, "orchestrator event loop");

        loop {
            tokio::select! {
                event = events.recv() => match event {
                    Some(event) => {
                        if let Err(e) = self.handle_event(event).await {
                            node_error!(NODE, "❌ Error handling node event: {}", e);
                        }
                    }
                    None => {
                        logging::log_shutdown(NODE, "node runtime closed its event channel");
                        break;
                    }
                },

                Some(_) = shutdown.recv() => {
                    logging::log_shutdown(NODE, "shutdown requested");
                    break;
                }
            }
        }

        Ok(())
    }

    /// Apply one inbound notification from the node runtime
    pub async fn handle_event(&self, event: NodeEvent) -> OrchestratorResult<()> {
        match event {
            NodeEvent::StatusChanged { worker, status } => {
                self.on_status_changed(worker, status).await;
                Ok(())
            }
            NodeEvent::NewOutput { worker, task_id, output } => self.on_new_output(worker, task_id, output).await,
        }
    }

    pub async fn on_status_changed(&self, worker: WorkerKind, status: WorkerStatus) {
        self.state.lock().await.registry.on_status_changed(worker, status);
        node_info!(NODE, "{} node status {} received", worker.description(), status);
    }

    /// Record an arrived result and, for carbon footprint results, continue the chain
    pub async fn on_new_output(
        &self,
        worker: WorkerKind,
        task_id: Option<TaskId>,
        output: NodeOutput,
    ) -> OrchestratorResult<()> {
        let Some(task_id) = task_id else {
            node_debug!(NODE, "Ignoring {} output without task id", worker);
            return Ok(());
        };

        let newly_arrived = self.register_result(task_id, worker).await;
        node_info!(NODE, task_id = %task_id, "{} node output received", worker.description());

        // A redelivered carbon result must not extend the chain again
        if worker == WorkerKind::CarbonFootprint && newly_arrived {
            match self.continue_chain(task_id, &output).await {
                Ok(Some(next)) => node_info!(NODE, "🔁 Task {} continues as {}", task_id, next),
                Ok(None) => {}
                Err(e) => logging::log_error(NODE, &format!("Iteration chain after task {task_id}"), &e),
            }
        }

        Ok(())
    }

    /// Mark a result as arrived and wake every waiter
    ///
    /// Returns `false` when the result had already been registered.
    pub async fn register_result(&self, task_id: TaskId, worker: WorkerKind) -> bool {
        let newly_arrived = self.state.lock().await.ledger.register_result(task_id, worker);
        if !newly_arrived {
            node_debug!(NODE, "Duplicate {} result for task {}", worker, task_id);
        }
        self.results_changed.notify_waiters();
        newly_arrived
    }

    pub async fn results_available(&self, task_id: TaskId, worker: WorkerKind) -> bool {
        self.state.lock().await.ledger.results_available(task_id, worker)
    }

    pub async fn last_task_id(&self) -> Option<TaskId> {
        self.state.lock().await.ledger.last_task_id()
    }

    pub async fn task_record(&self, task_id: TaskId) -> Option<TaskRecord> {
        self.state.lock().await.ledger.record(task_id).cloned()
    }

    /// Publish a new task or the next iteration of an existing problem
    ///
    /// # Returns
    /// The id the node runtime allocated for the published task
    pub async fn submit(&self, input: TaskInput) -> OrchestratorResult<TaskId> {
        if input.problem_short_description.trim().is_empty() {
            return Err(OrchestratorError::invalid_input("problem_short_description must not be empty"));
        }

        match (input.previous_iteration, input.extra.previous_problem_id) {
            (Some(_), None) => {
                return Err(OrchestratorError::invalid_input(
                    "previous_iteration given without extra.previous_problem_id",
                ))
            }
            (None, Some(_)) => {
                return Err(OrchestratorError::invalid_input(
                    "extra.previous_problem_id given without previous_iteration",
                ))
            }
            _ => {}
        }

        let (task_id, mut template) = match input.predecessor() {
            None => self.runtime.allocate_task().await?,
            Some(candidate) => {
                let base = self.state.lock().await.ledger.continuation_base(candidate);
                if base != candidate {
                    node_debug!(NODE, "Problem already at {}, iterating from there instead of {}", base, candidate);
                }
                self.runtime.allocate_iteration(base).await?
            }
        };

        input.fill(
            &mut template,
            task_id,
            &self.config.default_hardware,
            self.config.default_max_memory_footprint,
        )?;

        // Results may arrive as soon as the task is published
        self.state.lock().await.ledger.reserve_task(task_id);

        if let Err(e) = self.runtime.publish(task_id, template).await {
            self.state.lock().await.ledger.release_task(task_id);
            return Err(e);
        }

        self.state.lock().await.ledger.register_task(task_id);
        node_info!(NODE, "📤 Published task {}", task_id);

        Ok(task_id)
    }

    /// Status of one worker, or every reported status when `worker` is `None`
    pub async fn status(&self, worker: Option<WorkerKind>) -> OrchestratorResult<StatusReport> {
        let state = self.state.lock().await;
        match worker {
            None => Ok(StatusReport::All(state.registry.snapshot())),
            Some(worker) if worker.is_tracked() => Ok(StatusReport::Single {
                worker,
                status: state.registry.get_status(worker),
            }),
            Some(worker) => Err(OrchestratorError::UnknownWorker { worker }),
        }
    }

    /// Fetch a worker's result
    ///
    /// Without a task id the most recent task is used and the call waits
    /// until that worker's result arrives (bounded by `result_timeout` when
    /// configured). A concrete task id is fetched directly without waiting.
    pub async fn result(&self, task_id: Option<TaskId>, worker: WorkerKind) -> OrchestratorResult<WorkerResult> {
        if !worker.is_tracked() {
            return Err(OrchestratorError::UnknownWorker { worker });
        }

        let task_id = match task_id {
            Some(task_id) => task_id,
            None => {
                let last = self.last_task_id().await.ok_or(OrchestratorError::NoTasks)?;
                self.wait_for_result(last, worker).await?;
                last
            }
        };

        let payload = self
            .runtime
            .fetch_payload(worker, task_id)
            .await?
            .ok_or(OrchestratorError::NotFound { worker, task_id })?;

        Ok(WorkerResult {
            worker,
            task_id,
            data: payload.to_json()?,
        })
    }

    /// Wait for a result, honouring the configured timeout
    pub async fn wait_for_result(&self, task_id: TaskId, worker: WorkerKind) -> OrchestratorResult<()> {
        match self.config.result_timeout {
            Some(limit) => tokio::time::timeout(limit, self.wait_until_available(task_id, worker))
                .await
                .map_err(|_| OrchestratorError::WaitTimedOut { worker, task_id }),
            None => {
                self.wait_until_available(task_id, worker).await;
                Ok(())
            }
        }
    }

    /// Block until the ledger reports the result as arrived
    pub async fn wait_until_available(&self, task_id: TaskId, worker: WorkerKind) {
        loop {
            // Register interest before checking so a registration in between is not missed
            let notified = self.results_changed.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if self.results_available(task_id, worker).await {
                return;
            }

            node_debug!(NODE, "Waiting for {} result of task {}", worker, task_id);
            notified.await;
        }
    }

    /// Route a configuration request to its worker and wait for the reply
    pub async fn send_request(&self, configuration: &str) -> OrchestratorResult<ConfigurationResponse> {
        let transaction_id = self.state.lock().await.transactions.next_id();

        let node_id = route(configuration);
        if node_id == WorkerKind::Unknown {
            node_warn!(NODE, "No worker handles configuration request {}: {}", transaction_id, configuration);
            return Err(OrchestratorError::RoutingFailure {
                configuration: configuration.to_string(),
            });
        }

        let request = ConfigurationRequest {
            node_id,
            transaction_id,
            configuration: configuration.to_string(),
        };
        node_debug!(NODE, "Sending configuration request {} to {}", transaction_id, node_id);

        let response = self.runtime.request_response(request).await?;

        if response.transaction_id != transaction_id {
            return Err(OrchestratorError::transport(format!(
                "reply for transaction {} received for request {}",
                response.transaction_id, transaction_id
            )));
        }
        if !response.success {
            return Err(OrchestratorError::transport(format!(
                "{} rejected configuration request {} ({:?})",
                node_id, transaction_id, response.err_code
            )));
        }

        Ok(response)
    }

    /// Configuration request whose reply is returned as JSON
    ///
    /// Replies that are not valid JSON are returned as a JSON string.
    pub async fn config_request(&self, configuration: &str) -> OrchestratorResult<Value> {
        let response = self.send_request(configuration).await?;
        Ok(serde_json::from_str(&response.configuration).unwrap_or(Value::String(response.configuration)))
    }

    /// Build and submit the next iteration after a carbon footprint result
    async fn continue_chain(&self, task_id: TaskId, output: &NodeOutput) -> OrchestratorResult<Option<TaskId>> {
        let carbon_extra = output.decoded_extra_data()?;
        if !carbon_extra.requests_more_outputs() {
            return Ok(None);
        }

        let original = match self.runtime.fetch_payload(WorkerKind::Orchestrator, task_id).await? {
            Some(NodeOutput::UserInput(input)) => input,
            _ => {
                return Err(OrchestratorError::NotFound {
                    worker: WorkerKind::Orchestrator,
                    task_id,
                })
            }
        };

        match chain::follow_up(task_id, &carbon_extra, &original)? {
            Some(next) => Ok(Some(self.submit(next).await?)),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::MockNodeRuntime;
    use shared::{CO2Footprint, ErrorCode, ExtraData, HWResource};
    use tokio_test::{assert_pending, assert_ready};

    fn orchestrator(runtime: MockNodeRuntime) -> Orchestrator<MockNodeRuntime> {
        Orchestrator::new(runtime, OrchestratorConfig::default())
    }

    fn hw_output(task_id: TaskId) -> NodeOutput {
        NodeOutput::HwResource(HWResource {
            task_id: Some(task_id),
            hw_description: "PIM_AI_1chip".to_string(),
            power_consumption: 3.5,
            ..HWResource::default()
        })
    }

    #[test]
    fn test_status_report_rendering() {
        assert_eq!(
            StatusReport::All(BTreeMap::new()).to_string(),
            "No nodes have reported their status yet.\n"
        );

        let mut statuses = BTreeMap::new();
        statuses.insert(WorkerKind::HwProvider, WorkerStatus::Running);
        statuses.insert(WorkerKind::CarbonFootprint, WorkerStatus::Idle);
        let report = StatusReport::All(statuses).to_string();
        assert_eq!(report, "Carbontracker node status IDLE\nHW Provider node status RUNNING\n");
    }

    #[tokio::test]
    async fn test_status_of_unreported_worker_is_inactive() {
        let orchestrator = orchestrator(MockNodeRuntime::new());

        let report = orchestrator.status(Some(WorkerKind::MlModelProvider)).await.unwrap();
        assert_eq!(
            report,
            StatusReport::Single {
                worker: WorkerKind::MlModelProvider,
                status: WorkerStatus::Inactive
            }
        );

        let err = orchestrator.status(Some(WorkerKind::Orchestrator)).await.unwrap_err();
        assert!(matches!(err, OrchestratorError::UnknownWorker { .. }));
    }

    #[tokio::test]
    async fn test_result_without_tasks() {
        let orchestrator = orchestrator(MockNodeRuntime::new());
        let err = orchestrator.result(None, WorkerKind::HwProvider).await.unwrap_err();
        assert!(matches!(err, OrchestratorError::NoTasks));

        let err = orchestrator.result(None, WorkerKind::Unknown).await.unwrap_err();
        assert_eq!(err.to_string(), "No results to show for unknown");
    }

    #[tokio::test]
    async fn test_blocked_result_wakes_on_registration() {
        let task = TaskId::first(1);
        let mut runtime = MockNodeRuntime::new();
        runtime
            .expect_fetch_payload()
            .withf(move |worker, task_id| *worker == WorkerKind::HwProvider && *task_id == task)
            .times(1)
            .returning(move |_, task_id| Ok(Some(hw_output(task_id))));

        let orchestrator = orchestrator(runtime);
        orchestrator.state.lock().await.ledger.register_task(task);

        let waiter = orchestrator.clone();
        let mut pending = tokio_test::task::spawn(async move { waiter.result(None, WorkerKind::HwProvider).await });
        assert_pending!(pending.poll());

        // A different worker's result does not satisfy the wait
        orchestrator.register_result(task, WorkerKind::CarbonFootprint).await;
        assert!(pending.is_woken());
        assert_pending!(pending.poll());

        orchestrator.register_result(task, WorkerKind::HwProvider).await;
        assert!(pending.is_woken());
        let result = assert_ready!(pending.poll()).unwrap();

        assert_eq!(result.task_id, task);
        assert_eq!(result.data["hw_description"], "PIM_AI_1chip");
    }

    #[tokio::test(start_paused = true)]
    async fn test_blocked_result_times_out() {
        let config = OrchestratorConfig::default().with_result_timeout(std::time::Duration::from_millis(50));
        let orchestrator = Orchestrator::new(MockNodeRuntime::new(), config);
        orchestrator.state.lock().await.ledger.register_task(TaskId::first(2));

        let err = orchestrator.result(None, WorkerKind::MlModelProvider).await.unwrap_err();
        assert!(matches!(
            err,
            OrchestratorError::WaitTimedOut {
                worker: WorkerKind::MlModelProvider,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_direct_fetch_reports_missing_payload() {
        let mut runtime = MockNodeRuntime::new();
        runtime.expect_fetch_payload().returning(|_, _| Ok(None));

        let orchestrator = orchestrator(runtime);
        let err = orchestrator
            .result(Some(TaskId::new(3, 1)), WorkerKind::HwConstraints)
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "No hw_constraints data found for task {3, 1}");
    }

    #[tokio::test]
    async fn test_send_request_rejects_failed_reply() {
        let mut runtime = MockNodeRuntime::new();
        runtime
            .expect_request_response()
            .returning(|request| Ok(ConfigurationResponse::failure(&request, ErrorCode::InternalError)));

        let orchestrator = orchestrator(runtime);
        let err = orchestrator.send_request("hardwares").await.unwrap_err();
        assert!(matches!(err, OrchestratorError::TransportFailure { .. }));
    }

    #[tokio::test]
    async fn test_send_request_detects_correlation_mismatch() {
        let mut runtime = MockNodeRuntime::new();
        runtime.expect_request_response().returning(|request| {
            let mut response = ConfigurationResponse::success(&request, "{}");
            response.transaction_id += 10;
            Ok(response)
        });

        let orchestrator = orchestrator(runtime);
        let err = orchestrator.send_request("model_from_goal").await.unwrap_err();
        assert!(err.to_string().contains("reply for transaction 11"));
    }

    #[tokio::test]
    async fn test_unroutable_request_is_not_dispatched() {
        let mut runtime = MockNodeRuntime::new();
        runtime.expect_request_response().never();

        let orchestrator = orchestrator(runtime);
        let err = orchestrator.send_request("weather").await.unwrap_err();
        assert!(matches!(err, OrchestratorError::RoutingFailure { .. }));
    }

    #[tokio::test]
    async fn test_config_request_parses_json_reply() {
        let mut runtime = MockNodeRuntime::new();
        runtime
            .expect_request_response()
            .returning(|request| Ok(ConfigurationResponse::success(&request, r#"{"hardwares": ["PIM_AI_1chip"]}"#)));

        let orchestrator = orchestrator(runtime);
        let reply = orchestrator.config_request("hardwares").await.unwrap();
        assert_eq!(reply["hardwares"][0], "PIM_AI_1chip");
    }

    #[tokio::test]
    async fn test_carbon_output_without_num_outputs_does_not_chain() {
        let mut runtime = MockNodeRuntime::new();
        runtime.expect_fetch_payload().never();
        runtime.expect_allocate_iteration().never();

        let orchestrator = orchestrator(runtime);
        let task = TaskId::first(1);
        let output = NodeOutput::CarbonFootprint(CO2Footprint {
            task_id: Some(task),
            extra_data: ExtraData::default().encode().unwrap(),
            ..CO2Footprint::default()
        });

        orchestrator
            .on_new_output(WorkerKind::CarbonFootprint, Some(task), output)
            .await
            .unwrap();
        assert!(orchestrator.results_available(task, WorkerKind::CarbonFootprint).await);
    }

    #[tokio::test]
    async fn test_output_without_task_id_is_ignored() {
        let orchestrator = orchestrator(MockNodeRuntime::new());
        orchestrator
            .on_new_output(WorkerKind::HwProvider, None, hw_output(TaskId::first(1)))
            .await
            .unwrap();

        assert_eq!(orchestrator.last_task_id().await, None);
    }
}
