//! Stable exit codes for pilot CLI commands.

/// Task completed with every step exiting 0.
pub const OK: i32 = 0;
/// Command failed due to invalid config, unreadable input, or other errors.
pub const INVALID: i32 = 1;
/// User rejected the proposed plan.
pub const REJECTED: i32 = 2;
/// Retry budget exhausted without a passing run.
pub const EXHAUSTED: i32 = 3;
