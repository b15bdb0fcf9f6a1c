//! CLI command implementations.

mod deploy;
mod destroy;

pub use deploy::deploy;
pub use destroy::destroy;

use std::sync::Arc;

use shipwright_config::DeploySettings;
use shipwright_core::Environment;
use shipwright_deployer::{Pipeline, ProcessRunner};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Build a pipeline for the parsed environment and project.
fn pipeline(environment: &str, project: &str) -> anyhow::Result<Pipeline> {
    let environment: Environment = environment.parse()?;
    let settings = DeploySettings::default();
    Ok(Pipeline::new(
        settings,
        project,
        environment,
        Arc::new(ProcessRunner),
    ))
}

/// Forward tool output lines to the terminal as they arrive.
fn spawn_printer() -> (mpsc::Sender<String>, JoinHandle<()>) {
    let (tx, mut rx) = mpsc::channel(100);
    let handle = tokio::spawn(async move {
        while let Some(line) = rx.recv().await {
            println!("  {}", line);
        }
    });
    (tx, handle)
}
