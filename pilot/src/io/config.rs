//! Pilot configuration stored under `.pilot/config.toml`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

/// Pilot configuration (TOML).
///
/// This file is intended to be edited by humans and must remain stable and
/// automatable. Missing fields default to sensible values.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PilotConfig {
    /// Maximum plan attempts per task before giving up.
    pub max_attempts: u32,

    /// Wall-clock budget in seconds for each executed command.
    pub command_timeout_secs: u64,

    /// Truncate captured stdout/stderr beyond this many bytes.
    pub output_limit_bytes: usize,

    /// Interpreter used to run synthesized scripts.
    pub python_command: String,

    pub model: ModelConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ModelConfig {
    /// Chat-completions endpoint.
    pub api_url: String,

    /// Model identifier sent with each request.
    pub model: String,

    /// Environment variable holding the API key.
    pub api_key_env: String,

    pub max_tokens: u32,
    pub temperature: f64,

    /// Wall-clock budget in seconds for one completion request.
    pub request_timeout_secs: u64,
}

impl Default for PilotConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            command_timeout_secs: 30,
            output_limit_bytes: 100_000,
            python_command: "python3".to_string(),
            model: ModelConfig::default(),
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            api_url: "https://openrouter.ai/api/v1/chat/completions".to_string(),
            model: "mistralai/mistral-7b-instruct".to_string(),
            api_key_env: "OPENROUTER_API_KEY".to_string(),
            max_tokens: 1000,
            temperature: 0.1,
            request_timeout_secs: 30,
        }
    }
}

impl PilotConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_attempts == 0 {
            return Err(anyhow!("max_attempts must be > 0"));
        }
        if self.command_timeout_secs == 0 {
            return Err(anyhow!("command_timeout_secs must be > 0"));
        }
        if self.output_limit_bytes == 0 {
            return Err(anyhow!("output_limit_bytes must be > 0"));
        }
        if self.python_command.trim().is_empty() {
            return Err(anyhow!("python_command must be non-empty"));
        }
        self.model.validate()
    }
}

impl ModelConfig {
    pub fn validate(&self) -> Result<()> {
        if self.api_url.trim().is_empty() {
            return Err(anyhow!("model.api_url must be non-empty"));
        }
        if self.model.trim().is_empty() {
            return Err(anyhow!("model.model must be non-empty"));
        }
        if self.api_key_env.trim().is_empty() {
            return Err(anyhow!("model.api_key_env must be non-empty"));
        }
        if self.max_tokens == 0 {
            return Err(anyhow!("model.max_tokens must be > 0"));
        }
        if self.request_timeout_secs == 0 {
            return Err(anyhow!("model.request_timeout_secs must be > 0"));
        }
        Ok(())
    }
}

/// Default config location under a workspace root.
pub fn default_config_path(root: &Path) -> PathBuf {
    root.join(".pilot").join("config.toml")
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `PilotConfig::default()`.
pub fn load_config(path: &Path) -> Result<PilotConfig> {
    if !path.exists() {
        let cfg = PilotConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: PilotConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()?;
    Ok(cfg)
}

/// Atomically write config to disk (temp file + rename).
pub fn write_config(path: &Path, cfg: &PilotConfig) -> Result<()> {
    cfg.validate()?;
    let mut buf = toml::to_string_pretty(cfg).context("serialize config toml")?;
    buf.push('\n');
    write_atomic(path, &buf)
}

fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let parent = path
        .parent()
        .with_context(|| format!("config path missing parent {}", path.display()))?;
    fs::create_dir_all(parent).with_context(|| format!("create directory {}", parent.display()))?;
    let tmp_path = path.with_extension("toml.tmp");
    fs::write(&tmp_path, contents)
        .with_context(|| format!("write temp config {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace config {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_missing_returns_default() {
        let temp = tempfile::tempdir().expect("tempdir");
        let cfg = load_config(&temp.path().join("missing.toml")).expect("load");
        assert_eq!(cfg, PilotConfig::default());
    }

    #[test]
    fn write_then_load_round_trips() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("config.toml");
        let cfg = PilotConfig {
            max_attempts: 5,
            ..PilotConfig::default()
        };
        write_config(&path, &cfg).expect("write");
        let loaded = load_config(&path).expect("load");
        assert_eq!(loaded, cfg);
    }

    #[test]
    fn zero_attempts_is_rejected() {
        let cfg = PilotConfig {
            max_attempts: 0,
            ..PilotConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("config.toml");
        fs::write(&path, "max_attempts = 2\n").expect("write");

        let cfg = load_config(&path).expect("load");
        assert_eq!(cfg.max_attempts, 2);
        assert_eq!(cfg.command_timeout_secs, 30);
    }
}
