//! External command execution seam.
//!
//! Every external tool invocation (identity checks, state probes, applies,
//! builds, object sync) goes through the [`CommandRunner`] trait, so each
//! adapter exchanges typed results instead of ad-hoc text and tests can
//! substitute a scripted runner.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use tokio::sync::mpsc;

use crate::Result;

/// Specification for a single external command invocation.
///
/// Credentials and profile selection are threaded through `args`/`env`
/// per invocation; the runner never mutates the ambient process
/// environment.
#[derive(Debug, Clone)]
pub struct CommandSpec {
    /// Program to execute.
    pub program: String,
    /// Arguments, in order.
    pub args: Vec<String>,
    /// Working directory for the command.
    pub cwd: Option<PathBuf>,
    /// Environment variables added for this invocation only.
    pub env: HashMap<String, String>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
            env: HashMap::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// One-line rendering for logs and diagnostics.
    pub fn display_line(&self) -> String {
        if self.args.is_empty() {
            self.program.clone()
        } else {
            format!("{} {}", self.program, self.args.join(" "))
        }
    }
}

/// Captured result of an external command.
#[derive(Debug, Clone, Default)]
pub struct ToolOutput {
    /// Exit code, if the process exited normally.
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Combined stdout and stderr for diagnostics.
    pub fn combined(&self) -> String {
        if self.stdout.is_empty() {
            self.stderr.clone()
        } else if self.stderr.is_empty() {
            self.stdout.clone()
        } else {
            format!("{}\n{}", self.stdout, self.stderr)
        }
    }
}

/// Runs external commands on behalf of the tool adapters.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run a command to completion, capturing its output.
    ///
    /// A non-zero exit is not an error at this level; callers interpret
    /// exit codes per tool.
    async fn run(&self, spec: CommandSpec) -> Result<ToolOutput>;

    /// Run a command, forwarding each output line as it is produced.
    ///
    /// Used for long-running applies where the operator wants live
    /// output; the full output is still captured and returned.
    async fn run_streaming(
        &self,
        spec: CommandSpec,
        lines: Option<mpsc::Sender<String>>,
    ) -> Result<ToolOutput>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_line_joins_program_and_args() {
        let spec = CommandSpec::new("terraform").args(["workspace", "list"]);
        assert_eq!(spec.display_line(), "terraform workspace list");
    }

    #[test]
    fn combined_output_skips_empty_streams() {
        let out = ToolOutput {
            exit_code: Some(0),
            stdout: "hello".to_string(),
            stderr: String::new(),
        };
        assert_eq!(out.combined(), "hello");

        let err = ToolOutput {
            exit_code: Some(1),
            stdout: String::new(),
            stderr: "boom".to_string(),
        };
        assert_eq!(err.combined(), "boom");
        assert!(!err.success());
    }
}
