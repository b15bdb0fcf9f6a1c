//! Frontend build and mirror publish.

use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::info;
use url::Url;

use shipwright_config::DeploySettings;
use shipwright_core::{CommandRunner, CommandSpec, StackOutputs};

use crate::aws::AwsCli;
use crate::error::{DeployError, DeployResult};

/// Key of the generated config line the frontend build consumes.
pub const PUBLIC_API_URL_KEY: &str = "VITE_API_URL";

/// Builds the static frontend and mirrors it to the frontend store.
pub struct FrontendPublisher {
    npm_bin: String,
    frontend_dir: PathBuf,
    build_dir: PathBuf,
    env_file: PathBuf,
    invalidate_cdn: bool,
    aws: AwsCli,
    runner: Arc<dyn CommandRunner>,
}

impl FrontendPublisher {
    pub fn new(settings: &DeploySettings, aws: AwsCli, runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            npm_bin: settings.npm_bin.clone(),
            frontend_dir: settings.frontend_dir(),
            build_dir: settings.frontend_build_dir(),
            env_file: settings.frontend_env_file(),
            invalidate_cdn: settings.invalidate_cdn,
            aws,
            runner,
        }
    }

    /// Write the generated runtime-config line.
    ///
    /// The file is created fresh on every run; a single line, fully
    /// overwritten, never appended.
    pub fn write_runtime_config(&self, api_endpoint: &Url) -> DeployResult<()> {
        info!(file = %self.env_file.display(), "writing frontend runtime config");

        let line = format!("{}={}\n", PUBLIC_API_URL_KEY, api_endpoint);
        std::fs::write(&self.env_file, line).map_err(|e| {
            DeployError::Build(format!("writing {}: {}", self.env_file.display(), e))
        })
    }

    /// Run the frontend build (external collaborator).
    pub async fn build(&self, output_tx: Option<mpsc::Sender<String>>) -> DeployResult<()> {
        info!(dir = %self.frontend_dir.display(), "building frontend");

        let spec = CommandSpec::new(&self.npm_bin)
            .args(["run", "build"])
            .current_dir(&self.frontend_dir);

        let output = self.runner.run_streaming(spec, output_tx).await?;
        if !output.success() {
            return Err(DeployError::Build(output.combined()));
        }
        Ok(())
    }

    /// Mirror the build output to the frontend store.
    ///
    /// Delete-extraneous semantics; the publish is not atomic, so readers
    /// may see a mixed object set while it runs. The fronting CDN cache is
    /// only invalidated when the invalidation setting is on; when it is on,
    /// the stack must export a distribution id.
    pub async fn publish(
        &self,
        outputs: &StackOutputs,
        output_tx: Option<mpsc::Sender<String>>,
    ) -> DeployResult<()> {
        self.aws
            .sync_dir(&self.build_dir, &outputs.frontend_bucket, output_tx)
            .await?;

        if self.invalidate_cdn {
            match &outputs.cdn_distribution_id {
                Some(id) => self.aws.invalidate_distribution(id).await?,
                None => {
                    return Err(DeployError::Publish(
                        "CDN invalidation is enabled but the stack exported no distribution id"
                            .to_string(),
                    ));
                }
            }
        }

        Ok(())
    }
}
