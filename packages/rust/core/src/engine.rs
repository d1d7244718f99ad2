//! External tool invocation.
//!
//! Wraps a single typesetting or bibliography invocation: argv, working
//! directory, the child-scoped `TEXINPUTS` search path, a bounded wait,
//! and captured output. The parent process environment is never
//! mutated — the search path is an explicit per-invocation parameter.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tracing::debug;

use texforge_shared::{Result, TexforgeError};

/// Search-path environment variable understood by the TeX toolchain.
const SEARCH_PATH_VAR: &str = "TEXINPUTS";

/// How much of a failing tool's output to surface in errors.
pub const LOG_TAIL_BYTES: usize = 2000;

/// A single external tool invocation.
#[derive(Debug, Clone)]
pub struct ToolInvocation {
    /// Program to run.
    pub program: String,
    /// Arguments.
    pub args: Vec<String>,
    /// Working directory (the build output directory).
    pub cwd: PathBuf,
    /// Style-asset directory exported via `TEXINPUTS` to the child only.
    pub search_path: Option<PathBuf>,
    /// Bounded wait; expiry kills the child.
    pub timeout: Duration,
}

/// Captured outcome of a completed invocation.
#[derive(Debug)]
pub struct ToolOutput {
    /// Whether the tool exited with status zero.
    pub success: bool,
    /// Raw exit code, when the process was not killed by a signal.
    pub code: Option<i32>,
    /// Combined stdout + stderr.
    pub log: String,
}

/// Run one external tool to completion and capture its output.
///
/// `pass` names the protocol step for error reporting. A spawn failure
/// or an expired wait is an error here; a non-zero exit is not — the
/// caller decides whether that pass is fatal.
pub async fn run_tool(pass: &str, invocation: &ToolInvocation) -> Result<ToolOutput> {
    debug!(
        program = %invocation.program,
        args = ?invocation.args,
        cwd = %invocation.cwd.display(),
        pass,
        "spawning external tool"
    );

    let mut cmd = Command::new(&invocation.program);
    cmd.args(&invocation.args)
        .current_dir(&invocation.cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        // reaps the child if the bounded wait below expires
        .kill_on_drop(true);

    if let Some(dir) = &invocation.search_path {
        // trailing separator keeps the engine's default search path active
        cmd.env(SEARCH_PATH_VAR, format!("{}//:", dir.display()));
    }

    let child = cmd.spawn().map_err(|e| TexforgeError::Tool {
        tool: invocation.program.clone(),
        message: e.to_string(),
    })?;

    let output = tokio::time::timeout(invocation.timeout, child.wait_with_output())
        .await
        .map_err(|_| TexforgeError::Timeout {
            pass: pass.to_string(),
            secs: invocation.timeout.as_secs(),
        })?
        .map_err(|e| TexforgeError::Tool {
            tool: invocation.program.clone(),
            message: e.to_string(),
        })?;

    let mut log = String::from_utf8_lossy(&output.stdout).into_owned();
    if !output.stderr.is_empty() {
        log.push_str(&String::from_utf8_lossy(&output.stderr));
    }

    debug!(code = ?output.status.code(), pass, "external tool finished");

    Ok(ToolOutput {
        success: output.status.success(),
        code: output.status.code(),
        log,
    })
}

/// Tail of a tool log for diagnostics. LaTeX failures are diagnosed
/// from tool output, so fatal errors carry this excerpt.
pub fn log_tail(log: &str) -> &str {
    let trimmed = log.trim_end();
    if trimmed.len() <= LOG_TAIL_BYTES {
        return trimmed;
    }
    let mut start = trimmed.len() - LOG_TAIL_BYTES;
    while !trimmed.is_char_boundary(start) {
        start += 1;
    }
    &trimmed[start..]
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
