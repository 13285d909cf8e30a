//! Main entry point for the orchestrator binary
//!
//! Runs one problem through the simulated worker pipeline on the in-process
//! loopback runtime and prints every worker's result as JSON.

use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tokio::{signal, sync::mpsc};

use orchestrator::{LoopbackRuntime, Orchestrator, OrchestratorConfig, SimulationSettings};
use shared::{logging, node_debug, node_info, ExtraData, TaskId, TaskInput, WorkerKind};

const NODE: WorkerKind = WorkerKind::Orchestrator;

/// Orchestrator for the ML pipeline worker nodes
#[derive(Parser)]
#[command(name = "orchestrator")]
#[command(about = "Submits a problem to the ML pipeline workers and collects their results")]
pub struct Args {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Short description of the problem to solve
    #[arg(long, default_value = "Classify customer churn")]
    pub problem: String,

    /// Input modality of the problem
    #[arg(long, default_value = "tabular")]
    pub modality: String,

    /// Number of model suggestions to produce; each one is a pipeline iteration
    #[arg(long, default_value = "1")]
    pub num_outputs: u32,

    /// Goal passed to the model provider
    #[arg(long)]
    pub goal: Option<String>,

    /// Bound on each result wait in milliseconds
    #[arg(long)]
    pub result_timeout_ms: Option<u64>,

    /// Maximum simulated worker delay in milliseconds
    #[arg(long, default_value = "200")]
    pub worker_delay_ms: u64,

    /// Configuration request to send once the results are in (e.g. "hardwares")
    #[arg(long)]
    pub config_request: Option<String>,
}

const DEMO_RESULT_TIMEOUT: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    logging::init_tracing_with_level(Some(&args.log_level));

    let mut config = OrchestratorConfig::from_env().context("loading orchestrator configuration")?;
    if let Some(ms) = args.result_timeout_ms {
        config.result_timeout = Some(Duration::from_millis(ms));
    }
    // The demo never waits forever on a stalled simulation
    config.result_timeout.get_or_insert(DEMO_RESULT_TIMEOUT);

    logging::log_startup(NODE, "orchestrator on the loopback node runtime");
    node_debug!(NODE, "Configuration: {:?}", config);

    let (runtime, events) = LoopbackRuntime::new();
    let runtime =
        runtime.with_simulated_workers(SimulationSettings::with_max_delay(Duration::from_millis(args.worker_delay_ms)));
    let orchestrator = Orchestrator::new(runtime, config);

    let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
    let event_loop = {
        let orchestrator = orchestrator.clone();
        tokio::spawn(async move { orchestrator.run(events, shutdown_rx).await })
    };

    tokio::select! {
        outcome = run_problem(&orchestrator, &args) => outcome?,
        interrupted = signal::ctrl_c() => {
            interrupted.context("listening for Ctrl+C")?;
            logging::log_shutdown(NODE, "Received Ctrl+C signal");
        }
    }

    let _ = shutdown_tx.send(()).await;
    event_loop.await??;

    logging::log_success(NODE, "Orchestrator stopped gracefully");
    Ok(())
}

/// Submit the problem and print every iteration's results
async fn run_problem(orchestrator: &Orchestrator<LoopbackRuntime>, args: &Args) -> anyhow::Result<()> {
    let mut input = TaskInput::new(args.problem.clone());
    input.modality = args.modality.clone();
    input.extra = ExtraData {
        goal: args.goal.clone(),
        num_outputs: Some(args.num_outputs.max(1)),
        ..ExtraData::default()
    };

    let first = orchestrator.submit(input).await.context("submitting problem")?;
    node_info!(NODE, "Problem submitted as task {}", first);

    for iteration in 0..args.num_outputs.max(1) {
        let task_id = TaskId::new(first.problem_id, iteration);
        for worker in WorkerKind::TRACKED {
            orchestrator
                .wait_for_result(task_id, worker)
                .await
                .with_context(|| format!("waiting for {worker} on task {task_id}"))?;
            let result = orchestrator.result(Some(task_id), worker).await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
    }

    print!("{}", orchestrator.status(None).await?);

    if let Some(configuration) = &args.config_request {
        let reply = orchestrator.config_request(configuration).await?;
        println!("{}", serde_json::to_string_pretty(&reply)?);
    }

    Ok(())
}
