//! Invariant assertions over reducer state.

use pp_core::state::PipelineState;

#[allow(dead_code)]
/// Active ids are known tasks and none of them is finished.
pub fn assert_active_set_consistent(state: &PipelineState) {
    for id in &state.active_task_ids {
        let task = state
            .tasks
            .get(id)
            .unwrap_or_else(|| panic!("active id '{id}' is not a known task"));
        assert!(
            !task.status.is_terminal(),
            "finished task '{id}' is still active: {:?}",
            task.status
        );
    }
    assert!(state.active_set_is_consistent());
}

/// Whether any retained log entry mentions `needle`.
#[allow(dead_code)]
pub fn logs_mention(state: &PipelineState, needle: &str) -> bool {
    state.logs.iter().any(|entry| entry.message.contains(needle))
}
