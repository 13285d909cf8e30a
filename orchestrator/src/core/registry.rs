//! Last reported lifecycle status of every worker

use std::collections::BTreeMap;

use shared::{WorkerKind, WorkerStatus};

#[derive(Debug, Default)]
pub struct WorkerRegistry {
    statuses: BTreeMap<WorkerKind, WorkerStatus>,
}

impl WorkerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a status report. Any transition is accepted.
    pub fn on_status_changed(&mut self, worker: WorkerKind, status: WorkerStatus) {
        let entry = self.statuses.entry(worker).or_default();
        *entry = status;
    }

    /// Status of one worker; `Inactive` until it reports
    pub fn get_status(&self, worker: WorkerKind) -> WorkerStatus {
        self.statuses.get(&worker).copied().unwrap_or_default()
    }

    /// Copy of every reported status, ordered by worker kind
    pub fn snapshot(&self) -> BTreeMap<WorkerKind, WorkerStatus> {
        self.statuses.clone()
    }

    pub fn is_empty(&self) -> bool {
        self.statuses.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unreported_worker_is_inactive() {
        let registry = WorkerRegistry::new();
        assert_eq!(registry.get_status(WorkerKind::HwProvider), WorkerStatus::Inactive);
        assert!(registry.snapshot().is_empty());
    }

    #[test]
    fn test_latest_report_wins() {
        let mut registry = WorkerRegistry::new();
        registry.on_status_changed(WorkerKind::HwProvider, WorkerStatus::Initializing);
        registry.on_status_changed(WorkerKind::HwProvider, WorkerStatus::Running);
        registry.on_status_changed(WorkerKind::HwProvider, WorkerStatus::Error);
        registry.on_status_changed(WorkerKind::HwProvider, WorkerStatus::Idle);

        assert_eq!(registry.get_status(WorkerKind::HwProvider), WorkerStatus::Idle);
    }

    #[test]
    fn test_snapshot_contains_only_reported_workers() {
        let mut registry = WorkerRegistry::new();
        registry.on_status_changed(WorkerKind::MlModelProvider, WorkerStatus::Running);
        registry.on_status_changed(WorkerKind::AppRequirements, WorkerStatus::Idle);

        let snapshot = registry.snapshot();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(
            snapshot.keys().copied().collect::<Vec<_>>(),
            vec![WorkerKind::AppRequirements, WorkerKind::MlModelProvider]
        );
    }
}
