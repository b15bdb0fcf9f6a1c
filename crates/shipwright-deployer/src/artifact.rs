//! Backend bundle build.

use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::info;

use shipwright_config::DeploySettings;
use shipwright_core::{CommandRunner, CommandSpec};

use crate::error::{DeployError, DeployResult};

/// The packaged backend bundle the apply step deploys.
#[derive(Debug, Clone)]
pub struct ArtifactPackage {
    pub path: PathBuf,
}

/// Runs the external backend packaging step and observes its result.
///
/// Packaging itself is owned by the collaborator; the pipeline only
/// blocks on it and requires the bundle to exist before apply proceeds.
pub struct ArtifactBuilder {
    npm_bin: String,
    backend_dir: PathBuf,
    artifact_path: PathBuf,
    runner: Arc<dyn CommandRunner>,
}

impl ArtifactBuilder {
    pub fn new(settings: &DeploySettings, runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            npm_bin: settings.npm_bin.clone(),
            backend_dir: settings.backend_dir(),
            artifact_path: settings.artifact_path(),
            runner,
        }
    }

    pub async fn build(
        &self,
        output_tx: Option<mpsc::Sender<String>>,
    ) -> DeployResult<ArtifactPackage> {
        info!(dir = %self.backend_dir.display(), "packaging backend");

        let spec = CommandSpec::new(&self.npm_bin)
            .args(["run", "package"])
            .current_dir(&self.backend_dir);

        let output = self.runner.run_streaming(spec, output_tx).await?;
        if !output.success() {
            return Err(DeployError::Build(output.combined()));
        }

        if !self.artifact_path.exists() {
            return Err(DeployError::Build(format!(
                "bundle not found at {} after packaging",
                self.artifact_path.display()
            )));
        }

        Ok(ArtifactPackage {
            path: self.artifact_path.clone(),
        })
    }
}
