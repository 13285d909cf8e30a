//! Core business logic modules
//!
//! This module contains pure business logic with no I/O dependencies.
//! All functions are deterministic and easily testable.

pub mod chain;
pub mod ledger;
pub mod registry;
pub mod router;
pub mod state;

pub use ledger::{ResultLedger, TaskRecord};
pub use registry::WorkerRegistry;
pub use router::{route, TransactionCounter};
pub use state::OrchestratorState;
