//! Python_REPL: run a python snippet and return what it printed
//!
//! Each call runs a fresh interpreter in isolated mode (`-I`) inside a
//! scratch directory. Only `PATH` is passed through, and a wall-clock
//! limit applies.

use std::process::Stdio;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use tokio::process::Command;
use tokio::time::timeout;

use super::tool::{text_input, Tool, ToolResult};

/// Maximum output length in characters
const MAX_OUTPUT_LENGTH: usize = 30000;

/// Tool that executes python code
pub struct PythonReplTool {
    python_bin: String,
    timeout: Duration,
}

impl PythonReplTool {
    pub fn new(python_bin: impl Into<String>, timeout: Duration) -> Self {
        Self {
            python_bin: python_bin.into(),
            timeout,
        }
    }

    async fn run_code(&self, code: &str) -> Result<ToolResult> {
        tracing::info!("[PythonReplTool] Running {} bytes of code", code.len());

        let scratch = tempfile::tempdir().context("Failed to create scratch directory")?;
        let script = scratch.path().join("snippet.py");
        tokio::fs::write(&script, code)
            .await
            .context("Failed to write snippet")?;

        let mut command = Command::new(&self.python_bin);
        command
            .arg("-I")
            .arg(&script)
            .current_dir(scratch.path())
            .env_clear()
            .env("PATH", std::env::var_os("PATH").unwrap_or_default())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = match timeout(self.timeout, command.output()).await {
            Ok(result) => result
                .with_context(|| format!("Failed to start {}", self.python_bin))?,
            Err(_) => {
                return Ok(ToolResult::error(format!(
                    "TimeoutError: execution exceeded {}s",
                    self.timeout.as_secs()
                )));
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        tracing::debug!("[PythonReplTool] Exit status: {}", output.status);

        let mut result = stdout.into_owned();
        if !stderr.is_empty() {
            if !result.is_empty() {
                result.push('\n');
            }
            result.push_str(&stderr);
        }
        truncate(&mut result);

        if output.status.success() {
            Ok(ToolResult::success(result))
        } else {
            Ok(ToolResult::error(result))
        }
    }
}

#[async_trait]
impl Tool for PythonReplTool {
    fn name(&self) -> &str {
        "Python_REPL"
    }

    fn description(&self) -> &str {
        "A Python shell. Use this to execute python commands. Input should be a valid python command. \
         If you want to see the output of a value, you should print it out with `print(...)`. \
         Every call starts a fresh interpreter: variables and imports from earlier calls are gone, \
         so send the complete code each time."
    }

    async fn execute(&self, input: &Value) -> Result<ToolResult> {
        let raw = text_input(input, self.input_field())?;
        let code = sanitize_input(&raw);
        if code.is_empty() {
            return Ok(ToolResult::error("No code given"));
        }
        self.run_code(&code).await
    }
}

/// Strip whitespace, backticks and a leading `python` tag from model input
pub fn sanitize_input(code: &str) -> String {
    let code = code.trim().trim_start_matches('`');
    let code = match code.strip_prefix("python") {
        Some(rest) if rest.starts_with(char::is_whitespace) => rest,
        _ => code,
    };
    code.trim().trim_end_matches('`').trim().to_string()
}

fn truncate(output: &mut String) {
    if output.len() > MAX_OUTPUT_LENGTH {
        let mut cut = MAX_OUTPUT_LENGTH;
        while !output.is_char_boundary(cut) {
            cut -= 1;
        }
        output.truncate(cut);
        output.push_str("\n... (output truncated)");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn python_available() -> bool {
        std::process::Command::new("python3")
            .arg("--version")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    #[test]
    fn test_sanitize_input() {
        assert_eq!(sanitize_input("```python\nprint(1)\n```"), "print(1)");
        assert_eq!(sanitize_input("  print(2)  "), "print(2)");
        assert_eq!(sanitize_input("`print(3)`"), "print(3)");
        assert_eq!(sanitize_input("pythonic = 4"), "pythonic = 4");
    }

    #[tokio::test]
    async fn test_prints_are_returned() {
        if !python_available() {
            return;
        }
        let tool = PythonReplTool::new("python3", Duration::from_secs(10));
        let result = tool.execute(&json!("print(6 * 7)")).await.unwrap();
        assert!(!result.is_error);
        assert_eq!(result.output.trim(), "42");
    }

    #[tokio::test]
    async fn test_snippet_ending_in_a_quoted_string_runs_intact() {
        if !python_available() {
            return;
        }
        let tool = PythonReplTool::new("python3", Duration::from_secs(10));
        let result = tool
            .execute(&json!({ "query": "print(1)\nlabel = \"Revenue\"\nprint(label)" }))
            .await
            .unwrap();
        assert!(!result.is_error, "{}", result.output);
        assert_eq!(result.output.trim(), "1\nRevenue");

        let result = tool
            .execute(&json!({ "query": "print(1)\nlabel = \"Revenue\"" }))
            .await
            .unwrap();
        assert!(!result.is_error, "{}", result.output);
    }

    #[test]
    fn test_description_warns_state_is_not_kept() {
        let tool = PythonReplTool::new("python3", Duration::from_secs(1));
        assert!(tool.description().contains("fresh interpreter"));
    }

    #[tokio::test]
    async fn test_exceptions_are_observations() {
        if !python_available() {
            return;
        }
        let tool = PythonReplTool::new("python3", Duration::from_secs(10));
        let result = tool.execute(&json!({ "query": "1/0" })).await.unwrap();
        assert!(result.is_error);
        assert!(result.output.contains("ZeroDivisionError"));
    }

    #[tokio::test]
    async fn test_environment_is_cleared() {
        if !python_available() {
            return;
        }
        let tool = PythonReplTool::new("python3", Duration::from_secs(10));
        let result = tool
            .execute(&json!("import os; print(len(os.environ.get('OPENAI_API_KEY', '')))"))
            .await
            .unwrap();
        assert_eq!(result.output.trim(), "0");
    }

    #[tokio::test]
    async fn test_timeout() {
        if !python_available() {
            return;
        }
        let tool = PythonReplTool::new("python3", Duration::from_millis(300));
        let result = tool
            .execute(&json!("import time; time.sleep(5)"))
            .await
            .unwrap();
        assert!(result.is_error);
        assert!(result.output.starts_with("TimeoutError"));
    }
}
