//! Task identity and refinement generations

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Identifies one pipeline execution: a problem and its refinement generation.
///
/// `iteration_id` 0 is the original submission of a problem; iteration N is
/// the N-th automatic re-iteration chained from it.
///
/// Task ids are only ordered within a single problem. Comparing ids from
/// different problems yields `None` from [`PartialOrd::partial_cmp`], so
/// both `a > b` and `a < b` are false.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskId {
    pub problem_id: u32,
    pub iteration_id: u32,
}

impl TaskId {
    pub fn new(problem_id: u32, iteration_id: u32) -> Self {
        Self { problem_id, iteration_id }
    }

    /// Original submission of a problem
    pub fn first(problem_id: u32) -> Self {
        Self::new(problem_id, 0)
    }

    /// The task id of the next refinement generation of the same problem
    ///
    /// `None` once the iteration counter is exhausted.
    pub fn next_iteration(&self) -> Option<Self> {
        let iteration_id = self.iteration_id.checked_add(1)?;
        Some(Self::new(self.problem_id, iteration_id))
    }

    pub fn same_problem(&self, other: &TaskId) -> bool {
        self.problem_id == other.problem_id
    }
}

impl PartialOrd for TaskId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        if self.same_problem(other) {
            Some(self.iteration_id.cmp(&other.iteration_id))
        } else {
            None
        }
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}, {}}}", self.problem_id, self.iteration_id)
    }
}
