//! Orchestration for one task invocation.
//!
//! Drives the lifecycle machine from [`crate::core::state`] through
//! generation, approval, execution, and verification, retrying with the
//! prior failure context appended to the next generation request.
//! Rejection and an exhausted retry budget are normal results reported to
//! the caller, not errors.

use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use tracing::{debug, info, instrument, warn};

use crate::core::plan::{Plan, PlanStep, is_unsafe_command, parse_plan};
use crate::core::state::{TaskEvent, TaskState, transition};
use crate::io::config::PilotConfig;
use crate::io::console::Approval;
use crate::io::model::Completion;
use crate::io::process::{ExecutionResult, FAILURE_EXIT_CODE, run_shell};
use crate::io::prompt::plan_prompt;
use crate::io::script::{script_file_name, write_script};
use crate::synth::generate_artifact;

/// Number of trailing characters of command output fed back into the next
/// generation request.
const FAILURE_CONTEXT_CHARS: usize = 2000;

/// Why a task invocation stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStop {
    /// Every step of an approved plan exited 0.
    Completed,
    /// The user rejected the proposed plan.
    ApprovalRejected,
    /// The retry budget ran out without a passing attempt.
    RetriesExhausted,
}

/// Result of one executed (or refused) step.
#[derive(Debug, Clone)]
pub struct StepReport {
    pub description: String,
    /// The shell command that ran, including the interpreter invocation for
    /// synthesized scripts.
    pub command: String,
    pub result: ExecutionResult,
}

/// Summary of a task invocation.
#[derive(Debug, Clone)]
pub struct TaskOutcome {
    /// Plan attempts consumed (1-indexed count).
    pub attempts: u32,
    pub stop: TaskStop,
    /// Step results from the final attempt.
    pub reports: Vec<StepReport>,
}

/// Drive one task to a terminal state.
///
/// `root` is the working directory for commands and script artifacts.
/// `on_step` is invoked after each step finishes, for progress display.
/// Returns an error only when a collaborator fails in a way the state
/// machine cannot absorb (an approval I/O failure); model and command
/// failures are folded into retries.
#[instrument(skip_all, fields(max_attempts = cfg.max_attempts))]
pub fn run_task<M, A, F>(
    root: &Path,
    task: &str,
    model: &M,
    approval: &mut A,
    cfg: &PilotConfig,
    mut on_step: F,
) -> Result<TaskOutcome>
where
    M: Completion,
    A: Approval,
    F: FnMut(&StepReport),
{
    let mut state = TaskState::Generating;
    let mut attempts = 0u32;
    let mut failure_context: Option<String> = None;

    loop {
        attempts += 1;
        info!(attempt = attempts, "generating plan");
        let plan = generate_plan(model, task, failure_context.as_deref());
        state = transition(state, TaskEvent::PlanReady);
        debug!(state = ?state, steps = plan.steps.len(), degraded = plan.degraded, "plan ready");

        let approved = approval.approve_plan(&plan)?;
        state = transition(
            state,
            if approved {
                TaskEvent::Approved
            } else {
                TaskEvent::Rejected
            },
        );
        if state == TaskState::Aborted {
            info!("plan rejected by user");
            return Ok(TaskOutcome {
                attempts,
                stop: TaskStop::ApprovalRejected,
                reports: Vec::new(),
            });
        }

        let reports = execute_plan(root, &plan, model, cfg, &mut on_step);
        state = transition(state, TaskEvent::StepsFinished);

        match reports.iter().find(|report| !report.result.success()) {
            None => {
                state = transition(state, TaskEvent::AllStepsPassed);
                debug!(state = ?state, "all steps passed");
                return Ok(TaskOutcome {
                    attempts,
                    stop: TaskStop::Completed,
                    reports,
                });
            }
            Some(failed) => {
                let attempts_left = attempts < cfg.max_attempts;
                warn!(
                    exit_code = failed.result.exit_code,
                    attempts_left, "step failed"
                );
                state = transition(state, TaskEvent::StepFailed { attempts_left });
                if state == TaskState::Aborted {
                    return Ok(TaskOutcome {
                        attempts,
                        stop: TaskStop::RetriesExhausted,
                        reports,
                    });
                }
                failure_context = Some(describe_failure(failed));
                state = transition(state, TaskEvent::Regenerate);
            }
        }
    }
}

/// Request a plan from the model and parse it.
///
/// A transport error degrades to a single-step plan carrying the task text,
/// so execution can still proceed on best effort.
fn generate_plan<M: Completion>(model: &M, task: &str, failure: Option<&str>) -> Plan {
    let prompt = plan_prompt(task, failure);
    match model.complete(&prompt) {
        Ok(completion) => {
            let plan = parse_plan(&completion);
            if plan.degraded {
                warn!("no numbered steps in completion; using best-effort single-step plan");
            }
            plan
        }
        Err(err) => {
            warn!(err = %err, "plan generation failed; degrading to a single-step plan");
            Plan {
                steps: vec![PlanStep {
                    description: task.trim().to_string(),
                    command: None,
                }],
                degraded: true,
            }
        }
    }
}

/// Execute plan steps in order, stopping at the first failure.
fn execute_plan<M: Completion, F: FnMut(&StepReport)>(
    root: &Path,
    plan: &Plan,
    model: &M,
    cfg: &PilotConfig,
    on_step: &mut F,
) -> Vec<StepReport> {
    let timeout = Duration::from_secs(cfg.command_timeout_secs);
    let mut reports = Vec::new();

    for (index, step) in plan.steps.iter().enumerate() {
        info!(step = index + 1, "executing step");
        let report = execute_step(root, step, model, cfg, timeout);
        let failed = !report.result.success();
        on_step(&report);
        reports.push(report);
        if failed {
            warn!(step = index + 1, "step failed, skipping remaining steps");
            break;
        }
    }

    reports
}

fn execute_step<M: Completion>(
    root: &Path,
    step: &PlanStep,
    model: &M,
    cfg: &PilotConfig,
    timeout: Duration,
) -> StepReport {
    match &step.command {
        Some(command) if is_unsafe_command(command) => StepReport {
            description: step.description.clone(),
            command: command.clone(),
            result: ExecutionResult {
                exit_code: FAILURE_EXIT_CODE,
                stdout: String::new(),
                stderr: format!("refusing to run deny-listed command: {command}"),
            },
        },
        Some(command) => StepReport {
            description: step.description.clone(),
            command: command.clone(),
            result: run_shell(command, root, timeout, cfg.output_limit_bytes),
        },
        None => run_code_step(root, step, model, cfg, timeout),
    }
}

/// A step without a command produces code: synthesize an artifact, write it
/// next to the other artifacts, and run it with the configured interpreter.
fn run_code_step<M: Completion>(
    root: &Path,
    step: &PlanStep,
    model: &M,
    cfg: &PilotConfig,
    timeout: Duration,
) -> StepReport {
    let artifact = generate_artifact(model, &step.description);
    let file_name = script_file_name(&step.description);
    let command = format!("{} {}", cfg.python_command, file_name);

    if let Err(err) = write_script(&root.join(&file_name), &artifact) {
        return StepReport {
            description: step.description.clone(),
            command,
            result: ExecutionResult {
                exit_code: FAILURE_EXIT_CODE,
                stdout: String::new(),
                stderr: format!("failed to write script: {err:#}"),
            },
        };
    }

    debug!(file = %file_name, source = ?artifact.source, "running synthesized script");
    StepReport {
        description: step.description.clone(),
        command: command.clone(),
        result: run_shell(&command, root, timeout, cfg.output_limit_bytes),
    }
}

/// Summarize a failed step for the next generation request.
fn describe_failure(report: &StepReport) -> String {
    let mut out = format!(
        "step \"{}\" ran `{}` and exited with code {}",
        report.description, report.command, report.result.exit_code
    );
    if !report.result.stderr.is_empty() {
        out.push_str("\nstderr:\n");
        out.push_str(tail(&report.result.stderr, FAILURE_CONTEXT_CHARS));
    } else if !report.result.stdout.is_empty() {
        out.push_str("\nstdout:\n");
        out.push_str(tail(&report.result.stdout, FAILURE_CONTEXT_CHARS));
    }
    out
}

fn tail(text: &str, max_chars: usize) -> &str {
    let total = text.chars().count();
    if total <= max_chars {
        return text;
    }
    text.char_indices()
        .nth(total - max_chars)
        .map(|(idx, _)| &text[idx..])
        .unwrap_or(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tail_keeps_short_text_intact() {
        assert_eq!(tail("short", 10), "short");
    }

    #[test]
    fn tail_keeps_only_the_last_chars() {
        assert_eq!(tail("abcdef", 3), "def");
    }

    #[test]
    fn describe_failure_prefers_stderr() {
        let report = StepReport {
            description: "list".to_string(),
            command: "ls /missing".to_string(),
            result: ExecutionResult {
                exit_code: 2,
                stdout: "ignored".to_string(),
                stderr: "No such file or directory".to_string(),
            },
        };
        let described = describe_failure(&report);

        assert!(described.contains("exited with code 2"));
        assert!(described.contains("No such file or directory"));
        assert!(!described.contains("ignored"));
    }
}
