//! External tool invocation shared by the preprocessor and payload stages.

use headerpack_core::{Error, Result, Stage};
use std::io::ErrorKind;
use std::path::Path;
use std::process::{Command, ExitStatus, Output, Stdio};
use tracing::debug;

/// Run a command to completion, capturing stdout and stderr
///
/// A missing executable maps to [`Error::ToolNotFound`], any other spawn
/// failure to [`Error::ToolSpawn`] and a non-zero exit to [`Error::ToolFailed`]
/// carrying the tool's stderr unchanged.
pub(crate) fn run_tool(stage: Stage, tool: &Path, command: &mut Command) -> Result<Output> {
    debug!("[{}] running {:?}", stage, command);

    let output = command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .map_err(|e| match e.kind() {
            ErrorKind::NotFound => Error::ToolNotFound {
                stage,
                path: tool.to_path_buf(),
            },
            _ => Error::ToolSpawn {
                stage,
                path: tool.to_path_buf(),
                source: e,
            },
        })?;

    if !output.status.success() {
        return Err(Error::ToolFailed {
            stage,
            tool: tool.to_path_buf(),
            status: describe_status(output.status),
            diagnostics: String::from_utf8_lossy(&output.stderr).into_owned(),
        });
    }

    Ok(output)
}

fn describe_status(status: ExitStatus) -> String {
    match status.code() {
        Some(code) => format!("exited with status {}", code),
        None => "was terminated by a signal".to_string(),
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn test_missing_tool() {
        let tool = Path::new("/nonexistent/headerpack-tool");
        let result = run_tool(Stage::Emit, tool, &mut Command::new(tool));

        match result {
            Err(Error::ToolNotFound { stage, path }) => {
                assert_eq!(stage, Stage::Emit);
                assert_eq!(path, tool);
            }
            other => panic!("expected ToolNotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_non_executable_tool_names_stage_and_path() {
        let temp = tempfile::TempDir::new().unwrap();
        let tool = temp.path().join("clang++");
        std::fs::write(&tool, "not a program\n").unwrap();

        let mut command = Command::new(&tool);
        match run_tool(Stage::Preprocess, &tool, &mut command) {
            Err(err @ Error::ToolSpawn { .. }) => {
                assert_eq!(err.stage(), Some(Stage::Preprocess));
                assert!(err.to_string().contains(&tool.display().to_string()));
            }
            other => panic!("expected ToolSpawn, got {:?}", other),
        }
    }

    #[test]
    fn test_failing_tool_keeps_stderr() {
        let tool = Path::new("sh");
        let mut command = Command::new(tool);
        command.args(["-c", "echo 'fatal: broken' >&2; exit 4"]);

        match run_tool(Stage::Preprocess, tool, &mut command) {
            Err(Error::ToolFailed {
                status,
                diagnostics,
                ..
            }) => {
                assert_eq!(status, "exited with status 4");
                assert_eq!(diagnostics, "fatal: broken\n");
            }
            other => panic!("expected ToolFailed, got {:?}", other),
        }
    }

    #[test]
    fn test_successful_tool_output() {
        let tool = Path::new("sh");
        let mut command = Command::new(tool);
        command.args(["-c", "printf 'int x;'"]);

        let output = run_tool(Stage::Preprocess, tool, &mut command).unwrap();
        assert_eq!(output.stdout, b"int x;");
    }
}
