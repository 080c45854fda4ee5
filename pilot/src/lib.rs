//! Natural-language task pilot.
//!
//! This crate turns a free-text task description into an ordered plan of
//! shell steps, synthesizes (or repairs) Python source returned by a text
//! model, and executes the result locally behind a user approval gate. The
//! architecture enforces a strict separation:
//!
//! - **[`core`]**: Pure, deterministic logic (plan parsing, code
//!   normalization, validation, fallback rules, the task state machine).
//!   No I/O, fully testable in isolation.
//! - **[`io`]**: Side-effecting operations (process execution, model HTTP
//!   transport, config, console approval, script files). Isolated to enable
//!   scripted fakes in tests.
//!
//! Orchestration modules ([`run`], [`synth`]) coordinate core logic with I/O
//! to implement CLI commands.

pub mod core;
pub mod exit_codes;
pub mod io;
pub mod logging;
pub mod run;
pub mod synth;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
