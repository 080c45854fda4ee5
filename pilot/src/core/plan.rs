//! Plan parsing for numbered model completions.
//!
//! Completions are expected to follow a `"<n>. <description>"` convention
//! with optional `"Command: <cmd>"` lines. Anything else is tolerated:
//! unmatched lines are folded into the current step's description, and a
//! completion with no numbered line at all becomes a single-step plan
//! flagged as degraded.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

static STEP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)\.\s*(.*)$").expect("step regex should be valid"));

const COMMAND_MARKER: &str = "command:";

/// Command values the model uses to say "nothing to run".
const ABSENT_COMMAND_VALUES: [&str; 3] = ["n/a", "none", "no command"];

/// Commands that are never executed, regardless of what the model planned.
const UNSAFE_COMMANDS: [&str; 4] = ["rm -rf /", "mkfs", ":(){:|:&};:", "format c:"];

/// One unit of work, with a description and an optional shell command.
///
/// Immutable once parsed; ordering within a [`Plan`] is execution order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanStep {
    pub description: String,
    /// Shell command for this step. `None` marks a code-producing step.
    pub command: Option<String>,
}

/// Ordered sequence of steps for one task invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    pub steps: Vec<PlanStep>,
    /// Set when no numbered line was found and the whole completion was
    /// folded into a single best-effort step.
    pub degraded: bool,
}

/// Parse a completion into an ordered plan.
///
/// - A line matching `^\d+\.` starts a new step and clears the pending
///   command.
/// - A line starting with `Command:` (case-insensitive) attaches a command
///   to the current step, overwriting any prior value.
/// - Other non-blank lines are appended to the current step's description,
///   so wrapped text survives. Lines before the first numbered line are
///   preamble and dropped.
///
/// Never fails: a completion without a single numbered line yields a
/// one-step plan (the trimmed completion as its description, no command)
/// with `degraded = true`. The returned plan always has at least one step.
pub fn parse_plan(completion: &str) -> Plan {
    let mut steps: Vec<PlanStep> = Vec::new();

    for raw_line in completion.lines() {
        let line = raw_line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(caps) = STEP_RE.captures(line) {
            let description = caps
                .get(2)
                .map(|m| m.as_str().trim().to_string())
                .unwrap_or_default();
            steps.push(PlanStep {
                description,
                command: None,
            });
            continue;
        }

        if let Some(value) = strip_command_marker(line) {
            if let Some(step) = steps.last_mut() {
                if let Some(command) = clean_command_value(value) {
                    step.command = Some(command);
                }
                continue;
            }
            // No current step yet: treated as preamble below.
        }

        if let Some(step) = steps.last_mut() {
            if !step.description.is_empty() {
                step.description.push(' ');
            }
            step.description.push_str(line);
        }
    }

    if steps.is_empty() {
        return Plan {
            steps: vec![PlanStep {
                description: completion.trim().to_string(),
                command: None,
            }],
            degraded: true,
        };
    }

    Plan {
        steps,
        degraded: false,
    }
}

/// Returns true for commands on the fixed deny-list.
///
/// Matching is lowercased substring search; the executor refuses these with
/// exit code -1 instead of running them.
pub fn is_unsafe_command(command: &str) -> bool {
    let lower = command.to_lowercase();
    UNSAFE_COMMANDS.iter().any(|unsafe_cmd| lower.contains(unsafe_cmd))
}

fn strip_command_marker(line: &str) -> Option<&str> {
    let (head, rest) = line.split_at_checked(COMMAND_MARKER.len())?;
    head.eq_ignore_ascii_case(COMMAND_MARKER).then_some(rest)
}

/// Trim a command value, strip surrounding backticks, and drop placeholder
/// values like `n/a`.
fn clean_command_value(value: &str) -> Option<String> {
    let cleaned = value.trim().trim_matches('`').trim();
    if cleaned.is_empty() {
        return None;
    }
    if ABSENT_COMMAND_VALUES
        .iter()
        .any(|absent| cleaned.eq_ignore_ascii_case(absent))
    {
        return None;
    }
    Some(cleaned.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_numbered_steps_with_commands() {
        let completion = "\
1. List the current directory contents
Command: ls -la
2. Show the working directory
Command: pwd
";
        let plan = parse_plan(completion);

        assert!(!plan.degraded);
        assert_eq!(plan.steps.len(), 2);
        assert_eq!(plan.steps[0].description, "List the current directory contents");
        assert_eq!(plan.steps[0].command.as_deref(), Some("ls -la"));
        assert_eq!(plan.steps[1].command.as_deref(), Some("pwd"));
    }

    #[test]
    fn numbered_line_resets_pending_command() {
        let completion = "\
1. First step
Command: echo one
2. Second step without a command
";
        let plan = parse_plan(completion);

        assert_eq!(plan.steps[0].command.as_deref(), Some("echo one"));
        assert_eq!(plan.steps[1].command, None);
    }

    #[test]
    fn later_command_line_overwrites_earlier_one() {
        let completion = "\
1. Create a file
Command: touch a.txt
Command: touch b.txt
";
        let plan = parse_plan(completion);

        assert_eq!(plan.steps[0].command.as_deref(), Some("touch b.txt"));
    }

    #[test]
    fn wrapped_text_appends_to_current_description() {
        let completion = "\
1. Create a file that holds
the weekly report summary
Command: touch report.txt
";
        let plan = parse_plan(completion);

        assert_eq!(
            plan.steps[0].description,
            "Create a file that holds the weekly report summary"
        );
    }

    #[test]
    fn placeholder_command_values_are_absent() {
        for value in ["n/a", "None", "no command"] {
            let completion = format!("1. Think about the task\nCommand: {value}\n");
            let plan = parse_plan(&completion);
            assert_eq!(plan.steps[0].command, None, "value {value:?}");
        }
    }

    #[test]
    fn backticks_are_stripped_from_commands() {
        let plan = parse_plan("1. List files\nCommand: `ls`\n");
        assert_eq!(plan.steps[0].command.as_deref(), Some("ls"));
    }

    #[test]
    fn unnumbered_completion_degrades_to_single_step() {
        let completion = "Just run the tests and report back.";
        let plan = parse_plan(completion);

        assert!(plan.degraded);
        assert_eq!(plan.steps.len(), 1);
        assert_eq!(plan.steps[0].description, completion);
        assert_eq!(plan.steps[0].command, None);
    }

    #[test]
    fn empty_completion_still_yields_one_step() {
        let plan = parse_plan("");
        assert!(plan.degraded);
        assert_eq!(plan.steps.len(), 1);
    }

    #[test]
    fn preamble_before_first_step_is_dropped() {
        let completion = "\
Here is the plan I came up with:
1. Print the date
Command: date
";
        let plan = parse_plan(completion);

        assert_eq!(plan.steps.len(), 1);
        assert_eq!(plan.steps[0].description, "Print the date");
    }

    #[test]
    fn parse_is_deterministic() {
        let completion = "1. Step\nCommand: echo hi\nextra context\n";
        assert_eq!(parse_plan(completion), parse_plan(completion));
    }

    #[test]
    fn deny_list_matches_case_insensitively() {
        assert!(is_unsafe_command("rm -rf / --no-preserve-root"));
        assert!(is_unsafe_command("FORMAT C:"));
        assert!(is_unsafe_command("mkfs.ext4 /dev/sda1"));
        assert!(!is_unsafe_command("rm -rf ./build"));
        assert!(!is_unsafe_command("echo hello"));
    }
}
