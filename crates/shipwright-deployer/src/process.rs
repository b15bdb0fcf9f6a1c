//! Process-backed command runner.

use async_trait::async_trait;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use shipwright_core::{CommandRunner, CommandSpec, Error, Result, ToolOutput};

/// Runs commands as local child processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

impl ProcessRunner {
    fn command(spec: &CommandSpec) -> Command {
        let mut cmd = Command::new(&spec.program);
        cmd.args(&spec.args);
        if let Some(dir) = &spec.cwd {
            cmd.current_dir(dir);
        }
        cmd.envs(&spec.env);
        cmd.stdout(Stdio::piped()).stderr(Stdio::piped());
        cmd
    }
}

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(&self, spec: CommandSpec) -> Result<ToolOutput> {
        debug!(command = %spec.display_line(), "running command");

        let output = Self::command(&spec)
            .output()
            .await
            .map_err(|source| Error::Spawn {
                program: spec.program.clone(),
                source,
            })?;

        Ok(ToolOutput {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }

    async fn run_streaming(
        &self,
        spec: CommandSpec,
        lines: Option<mpsc::Sender<String>>,
    ) -> Result<ToolOutput> {
        debug!(command = %spec.display_line(), "running command (streamed)");

        let mut child = Self::command(&spec).spawn().map_err(|source| Error::Spawn {
            program: spec.program.clone(),
            source,
        })?;

        let stdout = child.stdout.take().unwrap();
        let stderr = child.stderr.take().unwrap();

        let mut stdout_reader = BufReader::new(stdout).lines();
        let mut stderr_reader = BufReader::new(stderr).lines();

        let mut captured_out = Vec::new();
        let mut captured_err = Vec::new();
        let mut out_done = false;
        let mut err_done = false;

        while !(out_done && err_done) {
            tokio::select! {
                line = stdout_reader.next_line(), if !out_done => match line {
                    Ok(Some(line)) => {
                        if let Some(tx) = &lines {
                            let _ = tx.send(line.clone()).await;
                        }
                        captured_out.push(line);
                    }
                    Ok(None) => out_done = true,
                    Err(e) => {
                        warn!(error = %e, "error reading stdout");
                        out_done = true;
                    }
                },
                line = stderr_reader.next_line(), if !err_done => match line {
                    Ok(Some(line)) => {
                        if let Some(tx) = &lines {
                            let _ = tx.send(line.clone()).await;
                        }
                        captured_err.push(line);
                    }
                    Ok(None) => err_done = true,
                    Err(e) => {
                        warn!(error = %e, "error reading stderr");
                        err_done = true;
                    }
                },
            }
        }

        let status = child.wait().await?;

        Ok(ToolOutput {
            exit_code: status.code(),
            stdout: captured_out.join("\n"),
            stderr: captured_err.join("\n"),
        })
    }
}
