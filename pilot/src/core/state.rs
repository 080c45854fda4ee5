//! Task lifecycle state machine, transitions as data.
//!
//! The retry driver in [`crate::run`] owns the attempt counter and failure
//! context; this module only answers "given this state and this event, what
//! is the next state", which keeps the lifecycle testable without user
//! input or network.

/// Lifecycle states for one task invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    /// Requesting a plan from the model.
    Generating,
    /// Plan presented, waiting for the user's yes/no. The only state that
    /// takes external input.
    AwaitingApproval,
    /// Running plan steps in order.
    Executing,
    /// Inspecting the execution results.
    Verifying,
    /// All steps exited 0.
    Done,
    /// A step failed and attempts remain; re-enters Generating.
    Retrying,
    /// Terminal: user rejection or retry budget exhausted.
    Aborted,
}

impl TaskState {
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskState::Done | TaskState::Aborted)
    }
}

/// Events produced by the driver and its collaborators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskEvent {
    /// A plan (possibly degraded) is ready for review.
    PlanReady,
    /// User approved the plan.
    Approved,
    /// User rejected the plan.
    Rejected,
    /// Every step was either executed or skipped after a failure.
    StepsFinished,
    /// Verification saw exit code 0 on every step.
    AllStepsPassed,
    /// Verification saw a non-zero exit code.
    StepFailed { attempts_left: bool },
    /// Retry bookkeeping complete, go generate again.
    Regenerate,
}

/// Pure transition function.
///
/// Total: an event that does not apply to a state leaves the state
/// unchanged, and terminal states absorb everything.
pub fn transition(state: TaskState, event: TaskEvent) -> TaskState {
    match (state, event) {
        (TaskState::Generating, TaskEvent::PlanReady) => TaskState::AwaitingApproval,
        (TaskState::AwaitingApproval, TaskEvent::Approved) => TaskState::Executing,
        (TaskState::AwaitingApproval, TaskEvent::Rejected) => TaskState::Aborted,
        (TaskState::Executing, TaskEvent::StepsFinished) => TaskState::Verifying,
        (TaskState::Verifying, TaskEvent::AllStepsPassed) => TaskState::Done,
        (
            TaskState::Verifying,
            TaskEvent::StepFailed {
                attempts_left: true,
            },
        ) => TaskState::Retrying,
        (
            TaskState::Verifying,
            TaskEvent::StepFailed {
                attempts_left: false,
            },
        ) => TaskState::Aborted,
        (TaskState::Retrying, TaskEvent::Regenerate) => TaskState::Generating,
        (state, _) => state,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn happy_path_reaches_done() {
        let mut state = TaskState::Generating;
        for event in [
            TaskEvent::PlanReady,
            TaskEvent::Approved,
            TaskEvent::StepsFinished,
            TaskEvent::AllStepsPassed,
        ] {
            state = transition(state, event);
        }
        assert_eq!(state, TaskState::Done);
        assert!(state.is_terminal());
    }

    #[test]
    fn rejection_aborts_directly() {
        let state = transition(TaskState::AwaitingApproval, TaskEvent::Rejected);
        assert_eq!(state, TaskState::Aborted);
    }

    #[test]
    fn failure_with_attempts_left_loops_back_to_generating() {
        let mut state = transition(
            TaskState::Verifying,
            TaskEvent::StepFailed {
                attempts_left: true,
            },
        );
        assert_eq!(state, TaskState::Retrying);
        state = transition(state, TaskEvent::Regenerate);
        assert_eq!(state, TaskState::Generating);
    }

    #[test]
    fn failure_without_attempts_left_aborts() {
        let state = transition(
            TaskState::Verifying,
            TaskEvent::StepFailed {
                attempts_left: false,
            },
        );
        assert_eq!(state, TaskState::Aborted);
    }

    #[test]
    fn inapplicable_events_leave_state_unchanged() {
        assert_eq!(
            transition(TaskState::Generating, TaskEvent::Approved),
            TaskState::Generating
        );
        assert_eq!(
            transition(TaskState::Executing, TaskEvent::AllStepsPassed),
            TaskState::Executing
        );
    }

    #[test]
    fn terminal_states_absorb_all_events() {
        for event in [
            TaskEvent::PlanReady,
            TaskEvent::Approved,
            TaskEvent::Rejected,
            TaskEvent::StepsFinished,
            TaskEvent::AllStepsPassed,
            TaskEvent::Regenerate,
        ] {
            assert_eq!(transition(TaskState::Done, event), TaskState::Done);
            assert_eq!(transition(TaskState::Aborted, event), TaskState::Aborted);
        }
    }
}
