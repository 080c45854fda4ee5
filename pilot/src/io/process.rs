//! Shell command execution with a bounded timeout and captured output.
//!
//! The contract is "always answer": every failure mode, including spawn
//! errors and timeouts, is folded into a well-formed [`ExecutionResult`].
//! Exit code -1 is reserved for timeout and internal execution errors; a
//! command the shell itself cannot find exits with the shell's own code.

use std::io::Read;
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::Duration;

use tracing::{debug, error, instrument, warn};
use wait_timeout::ChildExt;

/// Exit code reported for timeouts and internal execution failures.
pub const FAILURE_EXIT_CODE: i32 = -1;

/// Captured outcome of one shell command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionResult {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl ExecutionResult {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    fn internal_failure(message: String) -> Self {
        Self {
            exit_code: FAILURE_EXIT_CODE,
            stdout: String::new(),
            stderr: message,
        }
    }
}

/// Run `command` through `sh -c` in `workdir`, capturing stdout/stderr.
///
/// Output is drained concurrently while the child runs so pipes cannot
/// deadlock; `output_limit_bytes` bounds what is kept in memory (excess is
/// discarded while still draining). On timeout the child is killed and the
/// result carries exit code -1 with a fixed sentinel message in stderr.
#[instrument(skip_all, fields(timeout_secs = timeout.as_secs(), output_limit_bytes))]
pub fn run_shell(
    command: &str,
    workdir: &Path,
    timeout: Duration,
    output_limit_bytes: usize,
) -> ExecutionResult {
    let mut cmd = Command::new("sh");
    cmd.arg("-c")
        .arg(command)
        .current_dir(workdir)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    debug!(command, "spawning shell command");
    let mut child = match cmd.spawn() {
        Ok(child) => child,
        Err(err) => {
            error!(err = %err, "failed to spawn shell");
            return ExecutionResult::internal_failure(format!("failed to spawn shell: {err}"));
        }
    };

    let stdout_handle = spawn_reader(child.stdout.take(), output_limit_bytes);
    let stderr_handle = spawn_reader(child.stderr.take(), output_limit_bytes);

    let status = match child.wait_timeout(timeout) {
        Ok(Some(status)) => status,
        Ok(None) => {
            warn!(timeout_secs = timeout.as_secs(), "command timed out, killing");
            kill_quietly(&mut child);
            let stdout = join_reader(stdout_handle);
            join_reader(stderr_handle);
            return ExecutionResult {
                exit_code: FAILURE_EXIT_CODE,
                stdout,
                stderr: format!("command timed out after {}s", timeout.as_secs()),
            };
        }
        Err(err) => {
            error!(err = %err, "failed waiting for command");
            kill_quietly(&mut child);
            join_reader(stdout_handle);
            join_reader(stderr_handle);
            return ExecutionResult::internal_failure(format!("failed waiting for command: {err}"));
        }
    };

    let stdout = join_reader(stdout_handle);
    let mut stderr = join_reader(stderr_handle);

    let exit_code = match status.code() {
        Some(code) => code,
        None => {
            // Killed by a signal before reporting a code.
            if !stderr.is_empty() {
                stderr.push('\n');
            }
            stderr.push_str("command terminated by signal");
            FAILURE_EXIT_CODE
        }
    };

    debug!(exit_code, "command finished");
    ExecutionResult {
        exit_code,
        stdout,
        stderr,
    }
}

fn kill_quietly(child: &mut Child) {
    if let Err(err) = child.kill() {
        warn!(err = %err, "failed to kill child");
    }
    if let Err(err) = child.wait() {
        warn!(err = %err, "failed to reap child after kill");
    }
}

fn spawn_reader<R: Read + Send + 'static>(
    reader: Option<R>,
    limit: usize,
) -> Option<thread::JoinHandle<(Vec<u8>, usize)>> {
    reader.map(|r| thread::spawn(move || read_stream_limited(r, limit)))
}

/// Join a reader thread and render its bytes as text, noting truncation.
fn join_reader(handle: Option<thread::JoinHandle<(Vec<u8>, usize)>>) -> String {
    let Some(handle) = handle else {
        return String::new();
    };
    match handle.join() {
        Ok((bytes, truncated)) => {
            let mut text = String::from_utf8_lossy(&bytes).into_owned();
            if truncated > 0 {
                warn!(truncated, "output truncated");
                text.push_str(&format!("\n[truncated {truncated} bytes]"));
            }
            text
        }
        Err(_) => {
            warn!("output reader thread panicked");
            String::new()
        }
    }
}

fn read_stream_limited<R: Read>(mut reader: R, limit: usize) -> (Vec<u8>, usize) {
    let mut buf = Vec::new();
    let mut truncated = 0usize;
    let mut chunk = [0u8; 8192];

    loop {
        let n = match reader.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => n,
            Err(_) => break,
        };
        let remaining = limit.saturating_sub(buf.len());
        if remaining > 0 {
            let keep = n.min(remaining);
            buf.extend_from_slice(&chunk[..keep]);
            truncated += n.saturating_sub(keep);
        } else {
            truncated += n;
        }
    }

    (buf, truncated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    const LIMIT: usize = 100_000;

    fn timeout() -> Duration {
        Duration::from_secs(10)
    }

    #[test]
    fn captures_stdout_and_exit_zero() {
        let temp = tempfile::tempdir().expect("tempdir");
        let result = run_shell("echo hello", temp.path(), timeout(), LIMIT);

        assert!(result.success());
        assert_eq!(result.stdout, "hello\n");
        assert_eq!(result.stderr, "");
    }

    #[test]
    fn reports_nonzero_exit_codes() {
        let temp = tempfile::tempdir().expect("tempdir");
        let result = run_shell("exit 3", temp.path(), timeout(), LIMIT);

        assert_eq!(result.exit_code, 3);
        assert!(!result.success());
    }

    #[test]
    fn missing_command_fails_with_shell_code_not_sentinel() {
        let temp = tempfile::tempdir().expect("tempdir");
        let result = run_shell("definitely-not-a-command-xyz", temp.path(), timeout(), LIMIT);

        assert!(!result.success());
        assert_ne!(result.exit_code, FAILURE_EXIT_CODE);
        assert!(!result.stderr.is_empty());
    }

    #[test]
    fn runs_in_the_given_workdir() {
        let temp = tempfile::tempdir().expect("tempdir");
        let result = run_shell("pwd", temp.path(), timeout(), LIMIT);

        let canonical = temp.path().canonicalize().expect("canonicalize");
        assert_eq!(result.stdout.trim(), canonical.to_string_lossy());
    }

    #[test]
    fn timeout_yields_sentinel_within_bounded_overhead() {
        let temp = tempfile::tempdir().expect("tempdir");
        let start = Instant::now();
        let result = run_shell("exec sleep 5", temp.path(), Duration::from_millis(300), LIMIT);

        assert_eq!(result.exit_code, FAILURE_EXIT_CODE);
        assert!(result.stderr.contains("timed out"));
        assert!(
            start.elapsed() < Duration::from_secs(3),
            "kill must not wait for the child's own sleep"
        );
    }

    #[test]
    fn output_beyond_limit_is_truncated_with_notice() {
        let temp = tempfile::tempdir().expect("tempdir");
        let result = run_shell("printf 'aaaaaaaaaaaaaaaaaaaa'", temp.path(), timeout(), 10);

        assert!(result.success());
        assert!(result.stdout.starts_with("aaaaaaaaaa"));
        assert!(result.stdout.contains("[truncated 10 bytes]"));
    }
}
