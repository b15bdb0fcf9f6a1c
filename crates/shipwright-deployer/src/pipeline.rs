//! The deploy and teardown pipelines.
//!
//! Control flow is strictly linear: each step's typed output is a hard
//! precondition for the next, and the first failure aborts everything
//! after it. Serialization across concurrent runs targeting the same
//! environment is delegated to the external lock table named in the
//! backend config.

use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::info;

use shipwright_config::{ApplyVars, DeploySettings};
use shipwright_core::{CommandRunner, DeploymentTarget, Environment, StackOutputs};

use crate::artifact::ArtifactBuilder;
use crate::aws::AwsCli;
use crate::error::DeployResult;
use crate::frontend::FrontendPublisher;
use crate::resolver::resolve_backend;
use crate::terraform::TerraformCli;

/// One pipeline invocation: fixed environment, project and settings.
pub struct Pipeline {
    settings: DeploySettings,
    project: String,
    environment: Environment,
    runner: Arc<dyn CommandRunner>,
}

impl Pipeline {
    pub fn new(
        settings: DeploySettings,
        project: impl Into<String>,
        environment: Environment,
        runner: Arc<dyn CommandRunner>,
    ) -> Self {
        Self {
            settings,
            project: project.into(),
            environment,
            runner,
        }
    }

    fn aws(&self) -> AwsCli {
        AwsCli::new(
            &self.settings.aws_bin,
            &self.settings.profile,
            self.runner.clone(),
        )
    }

    fn terraform(&self) -> TerraformCli {
        TerraformCli::new(
            &self.settings.terraform_bin,
            self.settings.infra_dir(),
            &self.settings.profile,
            self.runner.clone(),
        )
    }

    /// Deploy the stack for this invocation's environment.
    ///
    /// Returns the applied stack's outputs for reporting.
    pub async fn deploy(
        &self,
        output_tx: Option<mpsc::Sender<String>>,
    ) -> DeployResult<StackOutputs> {
        let aws = self.aws();

        // Hard precondition for every network operation that follows.
        let identity = aws.ensure_credentials(output_tx.clone()).await?;
        info!(account = %identity.account, environment = %self.environment, "credentials verified");

        let artifact = ArtifactBuilder::new(&self.settings, self.runner.clone())
            .build(output_tx.clone())
            .await?;
        info!(bundle = %artifact.path.display(), "backend bundle ready");

        let backend = resolve_backend(
            &aws,
            &self.settings,
            &self.project,
            self.environment,
            &identity.account,
        )
        .await?;
        let target = DeploymentTarget {
            account_id: identity.account.clone(),
            region: backend.region.clone(),
        };

        let terraform = self.terraform();
        terraform.init(&backend).await?;
        terraform.ensure_workspace(self.environment).await?;

        let vars = ApplyVars::for_environment(
            self.environment,
            &self.project,
            &target,
            &self.settings.profile,
            Some(&artifact.path),
            &self.settings.prod_var_file(),
        );
        terraform.apply(&vars, output_tx.clone()).await?;

        let values = terraform.outputs().await?;
        let outputs = StackOutputs::from_values(&values)?;

        let publisher = FrontendPublisher::new(&self.settings, aws, self.runner.clone());
        publisher.write_runtime_config(&outputs.api_endpoint)?;
        publisher.build(output_tx.clone()).await?;
        publisher.publish(&outputs, output_tx).await?;

        info!(environment = %self.environment, "deployment complete");
        Ok(outputs)
    }

    /// Tear down the stack for this invocation's environment.
    ///
    /// Same gate, resolution and workspace steps as a deploy; no artifact
    /// build and no frontend publish.
    pub async fn destroy(&self, output_tx: Option<mpsc::Sender<String>>) -> DeployResult<()> {
        let aws = self.aws();

        let identity = aws.ensure_credentials(output_tx.clone()).await?;
        info!(account = %identity.account, environment = %self.environment, "credentials verified");

        let backend = resolve_backend(
            &aws,
            &self.settings,
            &self.project,
            self.environment,
            &identity.account,
        )
        .await?;
        let target = DeploymentTarget {
            account_id: identity.account.clone(),
            region: backend.region.clone(),
        };

        let terraform = self.terraform();
        terraform.init(&backend).await?;
        terraform.ensure_workspace(self.environment).await?;

        let vars = ApplyVars::for_environment(
            self.environment,
            &self.project,
            &target,
            &self.settings.profile,
            None,
            &self.settings.prod_var_file(),
        );
        terraform.destroy(&vars, output_tx).await?;

        info!(environment = %self.environment, "teardown complete");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DeployError;
    use crate::mock::{self, MockRunner};

    const IDENTITY_JSON: &str =
        r#"{"UserId":"AROA:ops","Account":"123456789012","Arn":"arn:aws:sts::123456789012:assumed-role/ops"}"#;

    const OUTPUTS_JSON: &str = r#"{
        "api_endpoint": {"sensitive": false, "type": "string", "value": "https://api.example.com/v1"},
        "frontend_bucket": {"sensitive": false, "type": "string", "value": "chattis-frontend"},
        "cdn_url": {"sensitive": false, "type": "string", "value": "https://d123.cdn.example.net"}
    }"#;

    /// Workspace root with the backend bundle and frontend layout in place.
    fn workspace_root() -> tempfile::TempDir {
        let root = tempfile::tempdir().unwrap();
        let dist = root.path().join("backend").join("dist");
        std::fs::create_dir_all(&dist).unwrap();
        std::fs::write(dist.join("backend.zip"), b"bundle").unwrap();
        std::fs::create_dir_all(root.path().join("frontend").join("dist")).unwrap();
        std::fs::create_dir_all(root.path().join("infra")).unwrap();
        root
    }

    fn settings_in(root: &std::path::Path) -> DeploySettings {
        let mut settings = DeploySettings::default().with_root(root);
        settings.profile = "ops".to_string();
        settings.default_region = "us-east-1".to_string();
        settings.invalidate_cdn = false;
        settings
    }

    /// Happy-path responses shared by the scenarios. Rules match in
    /// registration order, so a test overrides a step by registering its
    /// own rule first and layering these on top.
    fn happy_rules(runner: MockRunner) -> MockRunner {
        runner
            .on("sts get-caller-identity", mock::ok(IDENTITY_JSON))
            .on("run package", mock::ok("packaged"))
            .on("get-bucket-location", mock::fail(254, "NoSuchBucket"))
            .on("init", mock::ok("Terraform has been successfully initialized!"))
            .on("workspace list", mock::ok("  default\n"))
            .on("workspace new", mock::ok(""))
            .on("workspace select", mock::ok(""))
            .on("apply", mock::ok("Apply complete!"))
            .on("output -json", mock::ok(OUTPUTS_JSON))
            .on("run build", mock::ok("built"))
            .on("s3 sync", mock::ok(""))
            .on("destroy", mock::ok("Destroy complete!"))
    }

    fn happy_runner() -> MockRunner {
        happy_rules(MockRunner::new())
    }

    fn pipeline(root: &std::path::Path, runner: MockRunner, environment: Environment) -> Pipeline {
        Pipeline::new(
            settings_in(root),
            "chattis",
            environment,
            Arc::new(runner),
        )
    }

    #[tokio::test]
    async fn fresh_dev_deploy_uses_default_region_and_inline_vars_only() {
        let root = workspace_root();
        let runner = happy_runner();
        let outputs = pipeline(root.path(), runner.clone(), Environment::Dev)
            .deploy(None)
            .await
            .unwrap();

        // Probe failed, so the backend landed in the default region.
        let init = &runner.calls_matching("init")[0];
        assert!(init.contains("-backend-config=region=us-east-1"));
        assert!(init.contains("-backend-config=key=env/dev/terraform.tfstate"));

        // Fresh workspace.
        assert_eq!(runner.call_count("workspace new"), 1);

        // Inline overrides only, no extended var file.
        let apply = &runner.calls_matching("apply")[0];
        assert!(apply.contains("-var=environment=dev"));
        assert!(!apply.contains("-var-file"));

        assert_eq!(outputs.frontend_bucket, "chattis-frontend");
    }

    #[tokio::test]
    async fn prod_deploy_honors_discovered_region_and_extended_vars() {
        let root = workspace_root();
        let runner = happy_rules(
            MockRunner::new()
                .on(
                    "get-bucket-location",
                    mock::ok(r#"{"LocationConstraint":"eu-central-1"}"#),
                )
                .on("workspace list", mock::ok("  default\n  prod\n")),
        );

        pipeline(root.path(), runner.clone(), Environment::Prod)
            .deploy(None)
            .await
            .unwrap();

        // The store already exists elsewhere; its region wins.
        let init = &runner.calls_matching("init")[0];
        assert!(init.contains("-backend-config=region=eu-central-1"));
        assert!(init.contains("-backend-config=key=env/prod/terraform.tfstate"));

        // Existing workspace is selected, never re-created.
        assert_eq!(runner.call_count("workspace new"), 0);
        assert_eq!(runner.call_count("workspace select"), 1);

        // Extended var file on top of the inline overrides.
        let apply = &runner.calls_matching("apply")[0];
        assert!(apply.contains("prod.tfvars"));
        assert!(apply.contains("-var=environment=prod"));
        assert!(apply.contains("-var=aws_region=eu-central-1"));
    }

    #[tokio::test]
    async fn credential_failure_stops_before_any_backend_step() {
        let root = workspace_root();
        let runner = MockRunner::new()
            .on("sts get-caller-identity", mock::fail(255, "expired"))
            .on("sso login", mock::fail(1, "no browser"));

        let err = pipeline(root.path(), runner.clone(), Environment::Dev)
            .deploy(None)
            .await
            .unwrap_err();

        assert!(matches!(err, DeployError::Credentials(_)));
        assert_eq!(runner.call_count("get-bucket-location"), 0);
        assert_eq!(runner.call_count("init"), 0);
        assert_eq!(runner.call_count("apply"), 0);
    }

    #[tokio::test]
    async fn absent_custom_domain_deploys_cleanly_without_it() {
        let root = workspace_root();
        let outputs = pipeline(root.path(), happy_runner(), Environment::Dev)
            .deploy(None)
            .await
            .unwrap();

        assert!(outputs.custom_domain_url.is_none());
        assert_eq!(outputs.cdn_url.as_str(), "https://d123.cdn.example.net/");
    }

    #[tokio::test]
    async fn apply_failure_aborts_before_the_frontend_steps() {
        let root = workspace_root();
        let runner = happy_rules(
            MockRunner::new().on("apply", mock::fail(1, "Error: AccessDenied creating function")),
        );

        let err = pipeline(root.path(), runner.clone(), Environment::Dev)
            .deploy(None)
            .await
            .unwrap_err();

        assert!(matches!(err, DeployError::Apply(diagnostic) if diagnostic.contains("AccessDenied")));
        assert_eq!(runner.call_count("output -json"), 0);
        assert_eq!(runner.call_count("run build"), 0);
        assert_eq!(runner.call_count("s3 sync"), 0);
    }

    #[tokio::test]
    async fn destroy_skips_artifact_and_frontend_steps() {
        let root = workspace_root();
        let runner = happy_runner();
        pipeline(root.path(), runner.clone(), Environment::Dev)
            .destroy(None)
            .await
            .unwrap();

        assert_eq!(runner.call_count("run package"), 0);
        assert_eq!(runner.call_count("run build"), 0);
        assert_eq!(runner.call_count("s3 sync"), 0);
        assert_eq!(runner.call_count("destroy"), 1);

        let destroy = &runner.calls_matching("destroy")[0];
        assert!(!destroy.contains("backend_artifact"));
        assert!(!destroy.contains("-var-file"));
    }
}
