//! Shared deterministic types for pilot core logic.
//!
//! These types define stable contracts between core components. They should
//! not depend on external state or I/O and must remain deterministic across
//! runs.

use serde::{Deserialize, Serialize};

/// Where the code in a [`CodeArtifact`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CodeSource {
    /// Normalized model completion that passed validation.
    Generated,
    /// Deterministic template substituted after generation or validation
    /// failed.
    Fallback,
}

/// Source text ready to be written to a script file and executed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeArtifact {
    /// Model completion as received, before any cleanup. Empty when the
    /// model call itself failed.
    pub raw: String,
    /// Normalized (or fallback) code, the text that gets written to disk.
    pub code: String,
    /// Heuristic verdict on `code`. Fallback templates always pass.
    pub valid: bool,
    pub source: CodeSource,
}
