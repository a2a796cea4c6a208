// Copyright (c) 2026 Pegasus Heavy Industries LLC
// Licensed under the MIT License

//! Bounded external tool execution.
//!
//! Every sensor read and fan write shells out to a vendor tool. Each call
//! gets a hard timeout; the child is killed when the timeout elapses.

use crate::error::ToolError;
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use tokio::process::Command;

/// Run `program` with `args` and return its stdout.
pub async fn run_tool<S: AsRef<str>>(
    program: &Path,
    args: &[S],
    timeout: Duration,
) -> Result<String, ToolError> {
    run_tool_accepting(program, args, timeout, ExitStatus::success).await
}

/// Like [`run_tool`], but any exit status for which `accept` returns true
/// counts as success. For tools that report warnings in their exit code.
pub async fn run_tool_accepting<S, F>(
    program: &Path,
    args: &[S],
    timeout: Duration,
    accept: F,
) -> Result<String, ToolError>
where
    S: AsRef<str>,
    F: Fn(&ExitStatus) -> bool,
{
    let tool = program.display().to_string();
    let mut cmd = Command::new(program);
    cmd.args(args.iter().map(|a| a.as_ref()))
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    log::trace!(
        "Executing: {tool} {}",
        args.iter().map(|a| a.as_ref()).collect::<Vec<_>>().join(" ")
    );

    let output = match tokio::time::timeout(timeout, cmd.output()).await {
        Ok(result) => result.map_err(|source| ToolError::Spawn {
            tool: tool.clone(),
            source,
        })?,
        Err(_) => return Err(ToolError::Timeout { tool, timeout }),
    };

    if !accept(&output.status) {
        return Err(ToolError::Failed {
            tool,
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    if !output.status.success() {
        log::debug!("{tool} exited with {}, output accepted", output.status);
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn captures_stdout() {
        let out = run_tool(Path::new("/bin/sh"), &["-c", "echo 42"], Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(out.trim(), "42");
    }

    #[tokio::test]
    async fn nonzero_exit_is_an_error() {
        let err = run_tool(
            Path::new("/bin/sh"),
            &["-c", "echo boom >&2; exit 3"],
            Duration::from_secs(5),
        )
        .await
        .unwrap_err();
        match err {
            ToolError::Failed { stderr, .. } => assert_eq!(stderr, "boom"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn accepted_exit_status_keeps_stdout() {
        let out = run_tool_accepting(
            Path::new("/bin/sh"),
            &["-c", "echo 37; exit 64"],
            Duration::from_secs(5),
            |status| status.code() == Some(64),
        )
        .await
        .unwrap();
        assert_eq!(out.trim(), "37");

        let err = run_tool_accepting(
            Path::new("/bin/sh"),
            &["-c", "echo 37; exit 2"],
            Duration::from_secs(5),
            |status| status.code() == Some(64),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ToolError::Failed { .. }));
    }

    #[tokio::test]
    async fn slow_tool_times_out() {
        let err = run_tool(
            Path::new("/bin/sh"),
            &["-c", "sleep 5"],
            Duration::from_millis(100),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ToolError::Timeout { .. }));
    }

    #[tokio::test]
    async fn missing_tool_fails_to_spawn() {
        let err = run_tool(
            Path::new("/nonexistent/ipmitool"),
            &["sdr"],
            Duration::from_secs(1),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ToolError::Spawn { .. }));
    }
}
