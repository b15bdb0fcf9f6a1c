//! Typed adapter over the cloud CLI.
//!
//! The identity profile is threaded explicitly into every invocation;
//! nothing here mutates the ambient process environment.

use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};

use shipwright_core::{CommandRunner, CommandSpec};

use crate::error::{DeployError, DeployResult};

/// Identity of the caller the pipeline acts as.
#[derive(Debug, Clone, Deserialize)]
pub struct CallerIdentity {
    #[serde(rename = "Account")]
    pub account: String,
    #[serde(rename = "Arn")]
    pub arn: String,
}

/// Adapter over the `aws` CLI.
#[derive(Clone)]
pub struct AwsCli {
    bin: String,
    profile: String,
    runner: Arc<dyn CommandRunner>,
}

impl AwsCli {
    pub fn new(
        bin: impl Into<String>,
        profile: impl Into<String>,
        runner: Arc<dyn CommandRunner>,
    ) -> Self {
        Self {
            bin: bin.into(),
            profile: profile.into(),
            runner,
        }
    }

    fn spec(&self) -> CommandSpec {
        CommandSpec::new(&self.bin)
    }

    fn with_profile(&self, spec: CommandSpec) -> CommandSpec {
        spec.args(["--profile", &self.profile])
    }

    /// Verify the caller identity, renewing the session once if needed.
    ///
    /// A failed check triggers a single interactive renewal followed by a
    /// re-check; if either fails the pipeline stops here, before any other
    /// network operation.
    pub async fn ensure_credentials(
        &self,
        output_tx: Option<mpsc::Sender<String>>,
    ) -> DeployResult<CallerIdentity> {
        if let Some(identity) = self.caller_identity().await? {
            return Ok(identity);
        }

        warn!(profile = %self.profile, "identity check failed, attempting session renewal");
        let login_spec = self.spec().args(["sso", "login", "--profile", &self.profile]);
        let login = self.runner.run_streaming(login_spec, output_tx).await?;
        if !login.success() {
            return Err(DeployError::Credentials(renewal_hint(
                &self.profile,
                &login.combined(),
            )));
        }

        match self.caller_identity().await? {
            Some(identity) => Ok(identity),
            None => Err(DeployError::Credentials(renewal_hint(
                &self.profile,
                "identity check still failing after renewal",
            ))),
        }
    }

    /// One identity check; `None` means the check failed (expired or
    /// missing session), which is recoverable via renewal.
    async fn caller_identity(&self) -> DeployResult<Option<CallerIdentity>> {
        let spec = self.with_profile(
            self.spec()
                .args(["sts", "get-caller-identity", "--output", "json"]),
        );
        let output = self.runner.run(spec).await?;
        if !output.success() {
            return Ok(None);
        }

        let identity: CallerIdentity = serde_json::from_str(&output.stdout)
            .map_err(|e| DeployError::Credentials(format!("unreadable identity response: {}", e)))?;
        Ok(Some(identity))
    }

    /// Probe the true region of a store.
    ///
    /// Returns `None` when the store does not exist yet (probe failure) or
    /// when the probe reports the "no region specified" sentinel; callers
    /// fall back to the configured default region in both cases.
    pub async fn bucket_region(&self, bucket: &str) -> DeployResult<Option<String>> {
        let spec = self.with_profile(self.spec().args([
            "s3api",
            "get-bucket-location",
            "--bucket",
            bucket,
            "--output",
            "json",
        ]));
        let output = self.runner.run(spec).await?;
        if !output.success() {
            return Ok(None);
        }

        #[derive(Deserialize)]
        struct Location {
            #[serde(rename = "LocationConstraint")]
            location_constraint: Option<String>,
        }

        match serde_json::from_str::<Location>(&output.stdout) {
            Ok(location) => Ok(normalize_location_constraint(location.location_constraint)),
            Err(e) => {
                warn!(bucket = %bucket, error = %e, "unreadable store location response");
                Ok(None)
            }
        }
    }

    /// Mirror a directory to a store, deleting stale objects.
    ///
    /// Multi-object and non-atomic: concurrent readers may observe a mixed
    /// old/new object set while the sync runs.
    pub async fn sync_dir(
        &self,
        dir: &Path,
        bucket: &str,
        output_tx: Option<mpsc::Sender<String>>,
    ) -> DeployResult<()> {
        info!(dir = %dir.display(), bucket = %bucket, "mirroring directory to store");
        let spec = self.with_profile(self.spec().args([
            "s3",
            "sync",
            &dir.display().to_string(),
            &format!("s3://{}", bucket),
            "--delete",
        ]));
        let output = self.runner.run_streaming(spec, output_tx).await?;
        if !output.success() {
            return Err(DeployError::Publish(output.combined()));
        }
        Ok(())
    }

    /// Invalidate every path on a CDN distribution.
    pub async fn invalidate_distribution(&self, distribution_id: &str) -> DeployResult<()> {
        info!(distribution = %distribution_id, "invalidating CDN cache");
        let spec = self.with_profile(self.spec().args([
            "cloudfront",
            "create-invalidation",
            "--distribution-id",
            distribution_id,
            "--paths",
            "/*",
        ]));
        let output = self.runner.run(spec).await?;
        if !output.success() {
            return Err(DeployError::Publish(output.combined()));
        }
        Ok(())
    }
}

/// Normalize the probe's "no region specified" sentinel.
///
/// The location API reports its oldest region as a null or empty
/// constraint. Downstream tooling cannot interpret the sentinel, so it
/// maps to `None`, meaning "use the configured default region".
pub fn normalize_location_constraint(constraint: Option<String>) -> Option<String> {
    match constraint.as_deref() {
        None | Some("") | Some("null") => None,
        Some(region) => Some(region.to_string()),
    }
}

fn renewal_hint(profile: &str, detail: &str) -> String {
    format!(
        "{}; renew the session manually with `aws sso login --profile {}` and re-run",
        detail, profile
    )
}
