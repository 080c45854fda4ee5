//! Plan display and the yes/no approval gate.
//!
//! The [`Approval`] trait is the only interactive seam in the tool; tests
//! script it instead of driving a terminal.

use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};

use crate::core::plan::Plan;

/// Binary approval gate consulted before any execution.
pub trait Approval {
    /// Present `plan` and return whether the user accepted it.
    fn approve_plan(&mut self, plan: &Plan) -> Result<bool>;
}

/// Terminal approval: renders the plan to stdout and reads one line.
///
/// Only `y`/`yes` (case-insensitive) approve; anything else, including EOF,
/// rejects. Execution never proceeds on an ambiguous answer.
pub struct StdinApproval;

impl Approval for StdinApproval {
    fn approve_plan(&mut self, plan: &Plan) -> Result<bool> {
        print!("{}", render_plan(plan));
        print!("\nProceed with this plan? [y/N] ");
        io::stdout().flush().context("flush stdout")?;

        let mut line = String::new();
        let read = io::stdin()
            .lock()
            .read_line(&mut line)
            .context("read approval answer")?;
        if read == 0 {
            return Ok(false);
        }
        let answer = line.trim().to_lowercase();
        Ok(answer == "y" || answer == "yes")
    }
}

/// Render a plan as a numbered listing for review.
pub fn render_plan(plan: &Plan) -> String {
    let mut out = String::from("Proposed plan:\n");
    if plan.degraded {
        out.push_str("(no numbered steps found; treating the response as a single step)\n");
    }
    for (index, step) in plan.steps.iter().enumerate() {
        out.push_str(&format!("\nStep {}: {}\n", index + 1, step.description));
        match &step.command {
            Some(command) => out.push_str(&format!("  Command: {command}\n")),
            None => out.push_str("  Command: (generate and run a Python script)\n"),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::plan::PlanStep;

    #[test]
    fn render_numbers_steps_and_shows_commands() {
        let plan = Plan {
            steps: vec![
                PlanStep {
                    description: "List files".to_string(),
                    command: Some("ls".to_string()),
                },
                PlanStep {
                    description: "Write a script".to_string(),
                    command: None,
                },
            ],
            degraded: false,
        };

        let rendered = render_plan(&plan);
        assert!(rendered.contains("Step 1: List files"));
        assert!(rendered.contains("Command: ls"));
        assert!(rendered.contains("Step 2: Write a script"));
        assert!(rendered.contains("generate and run a Python script"));
    }

    #[test]
    fn degraded_plans_are_labeled() {
        let plan = Plan {
            steps: vec![PlanStep {
                description: "do the thing".to_string(),
                command: None,
            }],
            degraded: true,
        };

        assert!(render_plan(&plan).contains("no numbered steps found"));
    }
}
