//! Spawning external tools.

use crate::error::DocumentError;
use std::process::{Output, Stdio};
use tokio::process::Command;
use tracing::debug;

/// Run `cmd` to completion, capturing stdout and stderr.
///
/// Only a failure to start the process is an error here; the caller decides
/// what a non-zero exit status means.
pub async fn run_tool(mut cmd: Command, tool: &str) -> Result<Output, DocumentError> {
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    debug!("Running {:?}", cmd.as_std());

    cmd.output()
        .await
        .map_err(|e| DocumentError::ToolLaunchFailed {
            tool: tool.to_string(),
            detail: e.to_string(),
        })
}

/// Last non-empty stderr line, or the whole (trimmed) stderr when it has only one.
///
/// Tools like ocrmypdf log progress on stderr and put the actual cause last.
pub fn stderr_summary(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    stderr
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .next_back()
        .unwrap_or("no diagnostic output")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    fn output(stderr: &str) -> Output {
        use std::os::unix::process::ExitStatusExt;
        Output {
            status: std::process::ExitStatus::from_raw(256),
            stdout: Vec::new(),
            stderr: stderr.as_bytes().to_vec(),
        }
    }

    #[cfg(unix)]
    #[test]
    fn summary_takes_last_line() {
        let out = output("Scanning contents\n   \nPriorOcrFoundError: page already has text\n\n");
        assert_eq!(stderr_summary(&out), "PriorOcrFoundError: page already has text");
    }

    #[cfg(unix)]
    #[test]
    fn summary_of_empty_stderr() {
        assert_eq!(stderr_summary(&output("")), "no diagnostic output");
    }

    #[tokio::test]
    async fn missing_binary_is_launch_failure() {
        let cmd = Command::new("bulkocr-no-such-tool-xyz");
        let err = run_tool(cmd, "bulkocr-no-such-tool-xyz").await.unwrap_err();
        assert!(matches!(err, DocumentError::ToolLaunchFailed { .. }));
    }
}
