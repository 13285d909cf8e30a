//! Test helpers and builder patterns for orchestrator tests
//!
//! This module provides convenient helper functions and builder patterns
//! to reduce test boilerplate and improve maintainability.

use std::future::Future;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use orchestrator::traits::MockNodeRuntime;
use orchestrator::{
    LoopbackRuntime, NodeRuntime, Orchestrator, OrchestratorConfig, OrchestratorError, OrchestratorResult,
    SimulationSettings,
};
use shared::{NodeEvent, TaskId, UserInput, WorkerKind};

use super::fixtures::TestFixtures;

/// Standard timeout for anything a test waits on
pub const TEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Type alias for test orchestrator with a mocked runtime
pub type TestOrchestrator = Orchestrator<MockNodeRuntime>;

/// Builder pattern for creating mock-backed orchestrators with sensible defaults
pub struct OrchestratorBuilder {
    runtime: MockNodeRuntime,
    config: OrchestratorConfig,
}

impl OrchestratorBuilder {
    /// Create a new builder whose runtime expects no calls
    pub fn new() -> Self {
        Self {
            runtime: MockNodeRuntime::new(),
            config: OrchestratorConfig::default(),
        }
    }

    /// Allocate fresh problems from `first_problem_id` onwards
    pub fn with_fresh_problems(mut self, first_problem_id: u32) -> Self {
        let next = Arc::new(AtomicU32::new(first_problem_id));
        self.runtime.expect_allocate_task().times(0..).returning(move || {
            let task_id = TaskId::first(next.fetch_add(1, Ordering::SeqCst));
            Ok((
                task_id,
                UserInput {
                    task_id: Some(task_id),
                    ..UserInput::default()
                },
            ))
        });
        self
    }

    /// Allocate successors of any base task
    pub fn with_iterations(mut self) -> Self {
        self.runtime.expect_allocate_iteration().times(0..).returning(|base| {
            let task_id = base
                .next_iteration()
                .ok_or_else(|| OrchestratorError::transport(format!("no iteration after {base}")))?;
            Ok((
                task_id,
                UserInput {
                    task_id: Some(task_id),
                    ..UserInput::default()
                },
            ))
        });
        self
    }

    /// Accept every publish
    pub fn with_successful_publish(mut self) -> Self {
        self.runtime.expect_publish().times(0..).returning(|_, _| Ok(()));
        self
    }

    /// Configure the runtime mock with a setup function
    pub fn with_runtime<F>(mut self, setup: F) -> Self
    where
        F: FnOnce(&mut MockNodeRuntime),
    {
        setup(&mut self.runtime);
        self
    }

    pub fn with_config(mut self, config: OrchestratorConfig) -> Self {
        self.config = config;
        self
    }

    /// Build the orchestrator with the configured mock
    pub fn build(self) -> TestOrchestrator {
        Orchestrator::new(self.runtime, self.config)
    }
}

impl Default for OrchestratorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Orchestrator on a loopback runtime with its event loop running
pub struct LoopbackHarness {
    pub orchestrator: Orchestrator<LoopbackRuntime>,
    pub runtime: Arc<LoopbackRuntime>,
    shutdown: mpsc::Sender<()>,
    event_loop: JoinHandle<OrchestratorResult<()>>,
}

impl LoopbackHarness {
    pub fn start(runtime: LoopbackRuntime, events: mpsc::UnboundedReceiver<NodeEvent>) -> Self {
        Self::start_with_config(runtime, events, OrchestratorConfig::default())
    }

    pub fn start_with_config(
        runtime: LoopbackRuntime,
        events: mpsc::UnboundedReceiver<NodeEvent>,
        config: OrchestratorConfig,
    ) -> Self {
        let runtime = Arc::new(runtime);
        let orchestrator = Orchestrator::with_shared_runtime(Arc::clone(&runtime), config);
        let (shutdown, shutdown_rx) = mpsc::channel(1);

        let looper = orchestrator.clone();
        let event_loop = tokio::spawn(async move { looper.run(events, shutdown_rx).await });

        Self {
            orchestrator,
            runtime,
            shutdown,
            event_loop,
        }
    }

    /// Plain loopback runtime, problem ids starting at `first_problem_id`
    pub fn manual(first_problem_id: u32) -> Self {
        let (runtime, events) = LoopbackRuntime::new();
        Self::start(runtime.starting_at(first_problem_id), events)
    }

    /// Loopback runtime answering every task with simulated workers
    pub fn simulated() -> Self {
        let (runtime, events) = LoopbackRuntime::new();
        let runtime = runtime.with_simulated_workers(SimulationSettings::with_max_delay(Duration::from_millis(10)));
        Self::start(runtime, events)
    }

    /// Wait until every event delivered so far has been handled by the loop
    ///
    /// Events are handled in order, so once a marker output is registered
    /// everything before it has been processed.
    pub async fn settle(&self) {
        let marker = TaskId::first(TestFixtures::SETTLE_PROBLEM_ID);
        self.runtime
            .deliver_output(
                WorkerKind::AppRequirements,
                TestFixtures::worker_output(WorkerKind::AppRequirements, marker),
            )
            .await
            .unwrap();
        TestHelpers::within_timeout(self.orchestrator.wait_until_available(marker, WorkerKind::AppRequirements)).await;
    }

    /// Stop the event loop and surface its outcome
    pub async fn stop(self) {
        self.shutdown.send(()).await.unwrap();
        TestHelpers::within_timeout(self.event_loop).await.unwrap().unwrap();
    }
}

/// Helper functions for common test operations
pub struct TestHelpers;

impl TestHelpers {
    /// Await a future, failing the test when it takes longer than [`TEST_TIMEOUT`]
    pub async fn within_timeout<F: Future>(future: F) -> F::Output {
        tokio::time::timeout(TEST_TIMEOUT, future)
            .await
            .expect("operation did not finish in time")
    }

    /// Deliver every tracked worker's output for a task, in the given order
    pub async fn deliver_all(runtime: &LoopbackRuntime, task_id: TaskId, order: &[WorkerKind]) {
        for worker in order {
            runtime
                .deliver_output(*worker, TestFixtures::worker_output(*worker, task_id))
                .await
                .unwrap();
        }
    }

    /// Wait for one iteration to have every worker's result
    pub async fn wait_for_iteration<R: NodeRuntime>(orchestrator: &Orchestrator<R>, task_id: TaskId) {
        for worker in WorkerKind::TRACKED {
            Self::within_timeout(orchestrator.wait_until_available(task_id, worker)).await;
        }
    }
}
