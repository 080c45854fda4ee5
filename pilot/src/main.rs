//! Natural-language task pilot.
//!
//! Plans a task with a text model, asks for approval, executes the steps,
//! and retries with failure context until the task passes or the attempt
//! budget runs out.

use std::io::{BufRead, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use pilot::exit_codes;
use pilot::io::config::{default_config_path, load_config};
use pilot::io::console::StdinApproval;
use pilot::io::model::HttpCompletion;
use pilot::run::{StepReport, TaskOutcome, TaskStop, run_task};

#[derive(Parser)]
#[command(name = "pilot", version, about = "Natural-language task pilot")]
struct Cli {
    /// Path to the config file (defaults to .pilot/config.toml).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Plan and execute a single task.
    Run {
        /// Task description in natural language.
        task: String,
    },
    /// Read tasks interactively until `exit`.
    Interactive,
}

fn main() {
    pilot::logging::init();
    let code = match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{:#}", err);
            exit_codes::INVALID
        }
    };
    std::process::exit(code);
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    let root = std::env::current_dir().context("resolve working directory")?;
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| default_config_path(&root));
    let cfg = load_config(&config_path)?;
    let model = HttpCompletion::new(cfg.model.clone())?;
    let mut approval = StdinApproval;

    match cli.command {
        Command::Run { task } => {
            let outcome = run_task(&root, &task, &model, &mut approval, &cfg, print_step)?;
            report_outcome(&outcome);
            Ok(outcome_exit_code(&outcome))
        }
        Command::Interactive => {
            println!("Enter your task in natural language. Type 'exit' to quit.");
            let stdin = std::io::stdin();
            loop {
                print!("\nWhat would you like me to do? ");
                std::io::stdout().flush().context("flush stdout")?;

                let mut line = String::new();
                if stdin.lock().read_line(&mut line).context("read task")? == 0 {
                    break;
                }
                let task = line.trim();
                if task.is_empty() {
                    continue;
                }
                if matches!(task.to_lowercase().as_str(), "exit" | "quit" | "q") {
                    println!("Goodbye!");
                    break;
                }

                let outcome = run_task(&root, task, &model, &mut approval, &cfg, print_step)?;
                report_outcome(&outcome);
            }
            Ok(exit_codes::OK)
        }
    }
}

fn print_step(report: &StepReport) {
    if report.result.success() {
        println!("✓ {} ({})", report.description, report.command);
        if !report.result.stdout.is_empty() {
            print!("{}", report.result.stdout);
            if !report.result.stdout.ends_with('\n') {
                println!();
            }
        }
    } else {
        println!(
            "✗ {} ({}) failed with exit code {}",
            report.description, report.command, report.result.exit_code
        );
        if !report.result.stderr.is_empty() {
            eprintln!("{}", report.result.stderr.trim_end());
        }
    }
}

fn report_outcome(outcome: &TaskOutcome) {
    match outcome.stop {
        TaskStop::Completed => println!("\nTask completed successfully."),
        TaskStop::ApprovalRejected => println!("\nTask cancelled by user."),
        TaskStop::RetriesExhausted => {
            println!("\nGiving up after {} attempts.", outcome.attempts);
        }
    }
}

fn outcome_exit_code(outcome: &TaskOutcome) -> i32 {
    match outcome.stop {
        TaskStop::Completed => exit_codes::OK,
        TaskStop::ApprovalRejected => exit_codes::REJECTED,
        TaskStop::RetriesExhausted => exit_codes::EXHAUSTED,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_run() {
        let cli = Cli::parse_from(["pilot", "run", "list the current directory"]);
        assert!(matches!(
            cli.command,
            Command::Run { ref task } if task == "list the current directory"
        ));
        assert_eq!(cli.config, None);
    }

    #[test]
    fn parse_interactive() {
        let cli = Cli::parse_from(["pilot", "interactive"]);
        assert!(matches!(cli.command, Command::Interactive));
    }

    #[test]
    fn parse_config_flag() {
        let cli = Cli::parse_from(["pilot", "--config", "custom.toml", "run", "task"]);
        assert_eq!(cli.config.as_deref(), Some(std::path::Path::new("custom.toml")));
    }

    #[test]
    fn exit_codes_cover_all_stops() {
        let outcome = |stop| TaskOutcome {
            attempts: 1,
            stop,
            reports: Vec::new(),
        };
        assert_eq!(outcome_exit_code(&outcome(TaskStop::Completed)), exit_codes::OK);
        assert_eq!(
            outcome_exit_code(&outcome(TaskStop::ApprovalRejected)),
            exit_codes::REJECTED
        );
        assert_eq!(
            outcome_exit_code(&outcome(TaskStop::RetriesExhausted)),
            exit_codes::EXHAUSTED
        );
    }
}
