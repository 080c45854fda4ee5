//! Script file artifacts for code-producing steps.

use std::fs;
use std::path::Path;
use std::sync::LazyLock;

use anyhow::{Context, Result};
use regex::Regex;

use crate::core::types::CodeArtifact;

const DEFAULT_SCRIPT_NAME: &str = "script.py";

static FILE_NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"in a file called ["']?([^"'\s]+)["']?"#).expect("file name regex should be valid")
});

/// Derive the script file name from a step description.
///
/// Honors an explicit `in a file called <name>` phrase, defaults to
/// `script.py`, and appends the canonical `.py` extension when missing.
pub fn script_file_name(description: &str) -> String {
    let mut name = FILE_NAME_RE
        .captures(description)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim_end_matches(['.', ',']).to_string())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| DEFAULT_SCRIPT_NAME.to_string());
    if !name.ends_with(".py") {
        name.push_str(".py");
    }
    name
}

/// Write an artifact's code to `path` with `\n` endings and a trailing
/// newline.
pub fn write_script(path: &Path, artifact: &CodeArtifact) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("create script directory {}", parent.display()))?;
    }
    let mut contents = artifact.code.replace("\r\n", "\n");
    if !contents.ends_with('\n') {
        contents.push('\n');
    }
    fs::write(path, contents).with_context(|| format!("write script {}", path.display()))
}
