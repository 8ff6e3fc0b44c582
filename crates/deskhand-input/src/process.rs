use std::process::Stdio;
use std::time::Duration;

use thiserror::Error;
use tokio::process::Command;
use tracing::trace;

// ─── Tool invocation ──────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub(crate) enum ToolError {
    #[error("failed to spawn '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("'{program}' timed out after {timeout_ms}ms")]
    Timeout { program: String, timeout_ms: u128 },

    #[error("failed to wait for '{program}': {source}")]
    Wait {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{}", exit_message(program, *code, stderr))]
    Failed {
        program: String,
        code: Option<i32>,
        stderr: String,
    },
}

fn exit_message(program: &str, code: Option<i32>, stderr: &str) -> String {
    let status = match code {
        Some(code) => format!("'{program}' exited with code {code}"),
        None => format!("'{program}' terminated by signal"),
    };
    let stderr = stderr.trim();
    if stderr.is_empty() {
        status
    } else {
        format!("{status}\nstderr: {stderr}")
    }
}

/// Run `program args…` to completion and return its stdout.
///
/// Stdin is closed. The child is killed if `timeout` elapses. A non-zero exit
/// is an error carrying the captured stderr.
pub(crate) async fn run_tool(
    program: &str,
    args: &[String],
    timeout: Duration,
) -> Result<Vec<u8>, ToolError> {
    trace!(program, ?args, "running tool");

    let child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|source| ToolError::Spawn {
            program: program.to_string(),
            source,
        })?;

    let output = tokio::time::timeout(timeout, child.wait_with_output())
        .await
        .map_err(|_| ToolError::Timeout {
            program: program.to_string(),
            timeout_ms: timeout.as_millis(),
        })?
        .map_err(|source| ToolError::Wait {
            program: program.to_string(),
            source,
        })?;

    if !output.status.success() {
        return Err(ToolError::Failed {
            program: program.to_string(),
            code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        });
    }

    Ok(output.stdout)
}

/// Whether `program` resolves to an executable (absolute path or on `PATH`).
pub(crate) fn program_exists(program: &str) -> bool {
    which::which(program).is_ok()
}
