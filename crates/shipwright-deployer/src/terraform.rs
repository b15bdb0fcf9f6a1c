//! Typed adapter over the infrastructure tool.

use serde_json::Value;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info};

use shipwright_config::ApplyVars;
use shipwright_core::{CommandRunner, CommandSpec, Environment, StateBackendConfig};

use crate::error::{DeployError, DeployResult};

/// Adapter over the `terraform` CLI, bound to one stack directory.
///
/// The identity profile is threaded into every invocation's environment;
/// the tool reads it for backend and provider access.
#[derive(Clone)]
pub struct TerraformCli {
    bin: String,
    dir: PathBuf,
    profile: String,
    runner: Arc<dyn CommandRunner>,
}

impl TerraformCli {
    pub fn new(
        bin: impl Into<String>,
        dir: impl Into<PathBuf>,
        profile: impl Into<String>,
        runner: Arc<dyn CommandRunner>,
    ) -> Self {
        Self {
            bin: bin.into(),
            dir: dir.into(),
            profile: profile.into(),
            runner,
        }
    }

    fn spec(&self) -> CommandSpec {
        CommandSpec::new(&self.bin)
            .current_dir(&self.dir)
            .env("AWS_PROFILE", &self.profile)
    }

    /// Initialize the remote state connection.
    ///
    /// `-reconfigure` because the state key changes per environment while
    /// the stack directory stays the same.
    pub async fn init(&self, backend: &StateBackendConfig) -> DeployResult<()> {
        info!(dir = %self.dir.display(), store = %backend.store, "initializing remote state");

        let spec = self
            .spec()
            .args(["init", "-input=false", "-no-color", "-reconfigure"])
            .args(backend.backend_args());

        let output = self.runner.run(spec).await?;
        if !output.success() {
            error!(output = %output.combined(), "state init failed");
            return Err(DeployError::Init(output.combined()));
        }
        Ok(())
    }

    /// List existing workspaces.
    ///
    /// The listing marks the selected workspace with `*`; the marker is
    /// stripped.
    pub async fn workspace_list(&self) -> DeployResult<Vec<String>> {
        let spec = self.spec().args(["workspace", "list", "-no-color"]);
        let output = self.runner.run(spec).await?;
        if !output.success() {
            return Err(DeployError::Workspace(output.combined()));
        }

        Ok(output
            .stdout
            .lines()
            .map(|line| line.trim_start_matches('*').trim())
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect())
    }

    pub async fn workspace_select(&self, name: &str) -> DeployResult<()> {
        let spec = self.spec().args(["workspace", "select", "-no-color", name]);
        let output = self.runner.run(spec).await?;
        if !output.success() {
            return Err(DeployError::Workspace(output.combined()));
        }
        Ok(())
    }

    pub async fn workspace_new(&self, name: &str) -> DeployResult<()> {
        let spec = self.spec().args(["workspace", "new", "-no-color", name]);
        let output = self.runner.run(spec).await?;
        if !output.success() {
            // A create losing the race against a concurrent run surfaces
            // as a conflict, not as a silent select.
            if output.combined().contains("already exists") {
                return Err(DeployError::WorkspaceConflict(name.to_string()));
            }
            return Err(DeployError::Workspace(output.combined()));
        }
        Ok(())
    }

    /// Ensure the environment's workspace exists and is selected.
    ///
    /// Create-if-absent, else select. Running this twice leaves exactly
    /// one workspace for the environment and never fails merely because
    /// it already exists.
    pub async fn ensure_workspace(&self, environment: Environment) -> DeployResult<()> {
        let name = environment.as_str();
        let existing = self.workspace_list().await?;

        if existing.iter().any(|workspace| workspace == name) {
            info!(workspace = %name, "selecting existing workspace");
            self.workspace_select(name).await
        } else {
            info!(workspace = %name, "creating workspace");
            self.workspace_new(name).await
        }
    }

    /// Apply the stack, non-interactively and auto-approved.
    ///
    /// There is no human gate before resource mutation here; on failure
    /// the tool's diagnostic is surfaced verbatim and nothing is retried
    /// or rolled back.
    pub async fn apply(
        &self,
        vars: &ApplyVars,
        output_tx: Option<mpsc::Sender<String>>,
    ) -> DeployResult<()> {
        info!(dir = %self.dir.display(), "applying stack");

        let spec = self
            .spec()
            .args(["apply", "-input=false", "-no-color", "-auto-approve"])
            .args(vars.to_args());

        let output = self.runner.run_streaming(spec, output_tx).await?;
        if !output.success() {
            error!(output = %output.combined(), "apply failed");
            return Err(DeployError::Apply(output.combined()));
        }
        Ok(())
    }

    /// Destroy the stack, non-interactively and auto-approved.
    pub async fn destroy(
        &self,
        vars: &ApplyVars,
        output_tx: Option<mpsc::Sender<String>>,
    ) -> DeployResult<()> {
        info!(dir = %self.dir.display(), "destroying stack");

        let spec = self
            .spec()
            .args(["destroy", "-input=false", "-no-color", "-auto-approve"])
            .args(vars.to_args());

        let output = self.runner.run_streaming(spec, output_tx).await?;
        if !output.success() {
            error!(output = %output.combined(), "destroy failed");
            return Err(DeployError::Destroy(output.combined()));
        }
        Ok(())
    }

    /// Read the stack's outputs as a raw value map.
    pub async fn outputs(&self) -> DeployResult<HashMap<String, Value>> {
        let spec = self.spec().args(["output", "-json", "-no-color"]);
        let output = self.runner.run(spec).await?;
        if !output.success() {
            return Err(DeployError::Outputs(output.combined()));
        }

        #[derive(serde::Deserialize)]
        struct TerraformOutput {
            value: Value,
        }

        let outputs: HashMap<String, TerraformOutput> = serde_json::from_str(&output.stdout)
            .map_err(|e| DeployError::Outputs(format!("unreadable output listing: {}", e)))?;

        Ok(outputs.into_iter().map(|(k, v)| (k, v.value)).collect())
    }
}
