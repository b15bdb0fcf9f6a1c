//! Per-environment apply-variable selection.

use std::path::{Path, PathBuf};

use shipwright_core::{DeploymentTarget, Environment};

/// Variable selection for an apply or destroy of the stack.
///
/// Production carries the extended variable file on top of the inline
/// overrides; every other environment passes inline overrides only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplyVars {
    /// Extended variable file, production only.
    pub var_file: Option<PathBuf>,
    /// Inline overrides passed on every run.
    pub inline: Vec<(String, String)>,
}

impl ApplyVars {
    pub fn for_environment(
        environment: Environment,
        project: &str,
        target: &DeploymentTarget,
        profile: &str,
        artifact: Option<&Path>,
        prod_var_file: &Path,
    ) -> Self {
        let mut inline = vec![
            ("environment".to_string(), environment.to_string()),
            ("project".to_string(), project.to_string()),
            ("aws_region".to_string(), target.region.clone()),
            ("aws_profile".to_string(), profile.to_string()),
        ];
        if let Some(path) = artifact {
            inline.push(("backend_artifact".to_string(), path.display().to_string()));
        }

        let var_file = environment
            .is_production()
            .then(|| prod_var_file.to_path_buf());

        Self { var_file, inline }
    }

    /// Render as tool arguments, var file first.
    pub fn to_args(&self) -> Vec<String> {
        let mut args = Vec::new();
        if let Some(file) = &self.var_file {
            args.push(format!("-var-file={}", file.display()));
        }
        for (key, value) in &self.inline {
            args.push(format!("-var={}={}", key, value));
        }
        args
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target() -> DeploymentTarget {
        DeploymentTarget {
            account_id: "123456789012".to_string(),
            region: "eu-west-1".to_string(),
        }
    }

    fn vars_for(environment: Environment) -> ApplyVars {
        ApplyVars::for_environment(
            environment,
            "chattis",
            &target(),
            "ops",
            Some(Path::new("backend/dist/backend.zip")),
            Path::new("infra/prod.tfvars"),
        )
    }

    #[test]
    fn production_gets_the_extended_var_file() {
        let vars = vars_for(Environment::Prod);
        assert_eq!(vars.var_file.as_deref(), Some(Path::new("infra/prod.tfvars")));

        let args = vars.to_args();
        assert_eq!(args[0], "-var-file=infra/prod.tfvars");
        assert!(args.contains(&"-var=environment=prod".to_string()));
    }

    #[test]
    fn other_environments_use_inline_overrides_only() {
        for environment in [Environment::Dev, Environment::Test] {
            let vars = vars_for(environment);
            assert!(vars.var_file.is_none());
            assert!(
                vars.to_args()
                    .iter()
                    .all(|arg| !arg.starts_with("-var-file"))
            );
        }
    }

    #[test]
    fn inline_overrides_carry_region_and_profile() {
        let args = vars_for(Environment::Dev).to_args();
        assert!(args.contains(&"-var=aws_region=eu-west-1".to_string()));
        assert!(args.contains(&"-var=aws_profile=ops".to_string()));
        assert!(args.contains(&"-var=backend_artifact=backend/dist/backend.zip".to_string()));
    }

    #[test]
    fn artifact_var_is_omitted_when_not_building() {
        let vars = ApplyVars::for_environment(
            Environment::Dev,
            "chattis",
            &target(),
            "ops",
            None,
            Path::new("infra/prod.tfvars"),
        );
        assert!(
            vars.to_args()
                .iter()
                .all(|arg| !arg.contains("backend_artifact"))
        );
    }
}
