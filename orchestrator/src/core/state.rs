//! Core orchestrator state management
//!
//! Everything the orchestrator mutates lives in [`OrchestratorState`] and is
//! guarded by a single mutex owned by the façade.

use super::{ResultLedger, TransactionCounter, WorkerRegistry};

#[derive(Debug, Default)]
pub struct OrchestratorState {
    /// Last reported status per worker
    pub registry: WorkerRegistry,

    /// Result arrival flags, last task id and per-problem progress
    pub ledger: ResultLedger,

    /// Configuration request correlation ids
    pub transactions: TransactionCounter,
}

impl OrchestratorState {
    pub fn new(max_tracked_problems: Option<usize>) -> Self {
        Self {
            registry: WorkerRegistry::new(),
            ledger: ResultLedger::new(max_tracked_problems),
            transactions: TransactionCounter::new(),
        }
    }
}
