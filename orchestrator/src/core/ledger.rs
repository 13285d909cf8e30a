//! Per-task bookkeeping of which worker results have arrived
//!
//! The ledger is pure data: waking blocked readers is the job of the owner,
//! which broadcasts after every [`ResultLedger::register_result`].

use std::collections::{BTreeMap, HashMap};

use shared::{TaskId, WorkerKind};

/// Arrival flags of one task, one slot per tracked worker
#[derive(Debug, Clone, PartialEq)]
pub struct TaskRecord {
    pub task_id: TaskId,
    pub arrived: BTreeMap<WorkerKind, bool>,
}

impl TaskRecord {
    pub fn new(task_id: TaskId) -> Self {
        let arrived = WorkerKind::TRACKED.iter().map(|worker| (*worker, false)).collect();
        Self { task_id, arrived }
    }

    pub fn has_arrived(&self, worker: WorkerKind) -> bool {
        self.arrived.get(&worker).copied().unwrap_or(false)
    }

    pub fn is_complete(&self) -> bool {
        self.arrived.values().all(|arrived| *arrived)
    }

    /// Workers whose result is still outstanding
    pub fn pending(&self) -> Vec<WorkerKind> {
        self.arrived
            .iter()
            .filter(|(_, arrived)| !**arrived)
            .map(|(worker, _)| *worker)
            .collect()
    }
}

#[derive(Debug, Default)]
pub struct ResultLedger {
    records: HashMap<TaskId, TaskRecord>,

    /// Most advanced task seen, used when a caller asks for "the latest" result
    last_task_id: Option<TaskId>,

    /// Highest iteration seen per problem, keyed by problem id
    latest_per_problem: BTreeMap<u32, TaskId>,

    max_tracked_problems: Option<usize>,
}

impl ResultLedger {
    pub fn new(max_tracked_problems: Option<usize>) -> Self {
        Self {
            max_tracked_problems,
            ..Self::default()
        }
    }

    /// Seed the arrival record of a task about to be published
    ///
    /// Results can already be registered against it, but it does not become
    /// the latest task until [`ResultLedger::register_task`] confirms it.
    pub fn reserve_task(&mut self, task_id: TaskId) {
        self.records.entry(task_id).or_insert_with(|| TaskRecord::new(task_id));
    }

    /// Drop a reserved task that was never published
    ///
    /// Tasks already confirmed or referenced by a result are kept.
    pub fn release_task(&mut self, task_id: TaskId) {
        if !self.is_known(task_id) {
            self.records.remove(&task_id);
        }
    }

    /// Track a published task and make it the latest when it supersedes the last one
    pub fn register_task(&mut self, task_id: TaskId) {
        self.touch(task_id);
    }

    /// Mark a worker's result as arrived, creating the record on first reference
    ///
    /// Returns `false` when the flag was already set. Results from workers
    /// without a slot (`Orchestrator`, `Unknown`) only touch the record.
    pub fn register_result(&mut self, task_id: TaskId, worker: WorkerKind) -> bool {
        let record = self.touch(task_id);
        match record.arrived.get_mut(&worker) {
            Some(flag) if !*flag => {
                *flag = true;
                true
            }
            _ => false,
        }
    }

    /// Non-blocking check; an unknown task has no results
    pub fn results_available(&self, task_id: TaskId, worker: WorkerKind) -> bool {
        self.records
            .get(&task_id)
            .map(|record| record.has_arrived(worker))
            .unwrap_or(false)
    }

    pub fn record(&self, task_id: TaskId) -> Option<&TaskRecord> {
        self.records.get(&task_id)
    }

    pub fn last_task_id(&self) -> Option<TaskId> {
        self.last_task_id
    }

    pub fn latest_for_problem(&self, problem_id: u32) -> Option<TaskId> {
        self.latest_per_problem.get(&problem_id).copied()
    }

    pub fn tracked_problems(&self) -> usize {
        self.latest_per_problem.len()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Task a continuation of `candidate` must iterate from
    ///
    /// When the problem has already moved past `candidate` (another chain
    /// trigger got there first), the newest known iteration is used instead so
    /// the new task never collides with an existing one.
    pub fn continuation_base(&self, candidate: TaskId) -> TaskId {
        match self.latest_for_problem(candidate.problem_id) {
            Some(latest) if latest.iteration_id > candidate.iteration_id => latest,
            _ => candidate,
        }
    }

    /// Whether the task has been confirmed or referenced by a result
    fn is_known(&self, task_id: TaskId) -> bool {
        self.latest_for_problem(task_id.problem_id)
            .map(|latest| latest.iteration_id >= task_id.iteration_id)
            .unwrap_or(false)
    }

    fn touch(&mut self, task_id: TaskId) -> &mut TaskRecord {
        self.advance(task_id);
        self.records.entry(task_id).or_insert_with(|| TaskRecord::new(task_id));
        self.evict_oldest_problems(task_id.problem_id);
        self.records.entry(task_id).or_insert_with(|| TaskRecord::new(task_id))
    }

    fn advance(&mut self, task_id: TaskId) {
        let supersedes_last = match self.last_task_id {
            None => true,
            Some(last) if task_id.problem_id > last.problem_id => true,
            Some(last) => task_id > last,
        };
        if supersedes_last {
            self.last_task_id = Some(task_id);
        }

        self.latest_per_problem
            .entry(task_id.problem_id)
            .and_modify(|latest| {
                if task_id > *latest {
                    *latest = task_id;
                }
            })
            .or_insert(task_id);
    }

    /// Drop whole problems, lowest id first, until the retention limit holds.
    /// The problem of the last task and the one just touched are kept.
    fn evict_oldest_problems(&mut self, touched: u32) {
        let Some(limit) = self.max_tracked_problems else {
            return;
        };
        let last = self.last_task_id.map(|task| task.problem_id);

        while self.latest_per_problem.len() > limit {
            let Some(oldest) = self
                .latest_per_problem
                .keys()
                .copied()
                .find(|problem_id| *problem_id != touched && Some(*problem_id) != last)
            else {
                break;
            };

            self.latest_per_problem.remove(&oldest);
            self.records.retain(|task_id, _| task_id.problem_id != oldest);
            tracing::debug!(problem_id = oldest, "Evicted task records of problem");
        }
    }
}
