//! Automatic re-iteration of a problem when more outputs were requested
//!
//! A carbon footprint result closes one iteration. When its extra data still
//! asks for more than one output, a follow-up submission is built from the
//! task's original input and sent back through the normal submission path.

use shared::{ExtraData, SharedResult, TaskId, TaskInput, UserInput};

/// Follow-up submission for a finished iteration, if more outputs are wanted
///
/// `carbon_extra` is the decoded extra data of the carbon footprint output and
/// `original` the input record published for `task_id`.
pub fn follow_up(task_id: TaskId, carbon_extra: &ExtraData, original: &UserInput) -> SharedResult<Option<TaskInput>> {
    let remaining = match carbon_extra.num_outputs {
        Some(requested) if requested > 1 => requested - 1,
        _ => return Ok(None),
    };

    let mut next = TaskInput::from_user_input(original)?;
    next.previous_iteration = Some(task_id.iteration_id);
    next.extra.previous_problem_id = Some(task_id.problem_id);
    next.extra.num_outputs = Some(remaining);
    if !carbon_extra.model_restrains.is_empty() {
        next.extra.model_restrains = carbon_extra.model_restrains.clone();
    }

    Ok(Some(next))
}
