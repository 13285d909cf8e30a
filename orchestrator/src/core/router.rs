//! Keyword routing of configuration requests and transaction id allocation

use shared::WorkerKind;

/// Ordered routing table; the first entry with a matching keyword wins
const ROUTES: &[(&[&str], WorkerKind)] = &[
    (&["hardwares"], WorkerKind::HwProvider),
    (
        &[
            "modality",
            "in_out_modalities",
            "metrics",
            "model_info",
            "problem_from_modality",
            "dataset_path",
        ],
        WorkerKind::MlModelMetadata,
    ),
    (&["goal", "model_from_goal"], WorkerKind::MlModelProvider),
];

/// Destination worker of a configuration string, `Unknown` when no keyword matches
pub fn route(configuration: &str) -> WorkerKind {
    ROUTES
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|keyword| configuration.contains(keyword)))
        .map(|(_, worker)| *worker)
        .unwrap_or(WorkerKind::Unknown)
}

/// Process-wide transaction id counter
#[derive(Debug, Default)]
pub struct TransactionCounter {
    last: u32,
}

impl TransactionCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next id, starting at 1
    pub fn next_id(&mut self) -> u32 {
        self.last = self.last.wrapping_add(1).max(1);
        self.last
    }

    pub fn last_issued(&self) -> u32 {
        self.last
    }
}
