//! Ambient deployment settings.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Settings every pipeline run resolves once, up front.
///
/// Each field has a documented environment-variable override and a
/// fallback, so a bare invocation works against a conventional checkout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploySettings {
    /// Identity profile used for every cloud call.
    pub profile: String,
    /// Region used when the state store does not yet exist.
    pub default_region: String,
    /// Whether publishing also invalidates the fronting CDN cache.
    pub invalidate_cdn: bool,
    /// Cloud CLI binary.
    pub aws_bin: String,
    /// Infrastructure tool binary.
    pub terraform_bin: String,
    /// Frontend/backend build tool binary.
    pub npm_bin: String,
    /// Repository root the layout paths below are resolved against.
    pub root: PathBuf,
}

impl Default for DeploySettings {
    fn default() -> Self {
        Self {
            profile: std::env::var("SHIPWRIGHT_AWS_PROFILE")
                .unwrap_or_else(|_| "default".to_string()),
            default_region: std::env::var("SHIPWRIGHT_AWS_REGION")
                .unwrap_or_else(|_| "us-east-1".to_string()),
            invalidate_cdn: std::env::var("SHIPWRIGHT_CDN_INVALIDATE")
                .map(|v| truthy(&v))
                .unwrap_or(false),
            aws_bin: std::env::var("AWS_BIN").unwrap_or_else(|_| "aws".to_string()),
            terraform_bin: std::env::var("TERRAFORM_BIN")
                .unwrap_or_else(|_| "terraform".to_string()),
            npm_bin: std::env::var("NPM_BIN").unwrap_or_else(|_| "npm".to_string()),
            root: PathBuf::from("."),
        }
    }
}

impl DeploySettings {
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = root.into();
        self
    }

    /// Directory holding the declarative stack definitions.
    pub fn infra_dir(&self) -> PathBuf {
        self.root.join("infra")
    }

    /// Extended variable file applied for production only.
    pub fn prod_var_file(&self) -> PathBuf {
        self.infra_dir().join("prod.tfvars")
    }

    /// Directory of the backend function sources.
    pub fn backend_dir(&self) -> PathBuf {
        self.root.join("backend")
    }

    /// Path the packaged backend bundle is expected at after a build.
    pub fn artifact_path(&self) -> PathBuf {
        self.backend_dir().join("dist").join("backend.zip")
    }

    /// Directory of the frontend sources.
    pub fn frontend_dir(&self) -> PathBuf {
        self.root.join("frontend")
    }

    /// Build output directory mirrored to the frontend store.
    pub fn frontend_build_dir(&self) -> PathBuf {
        self.frontend_dir().join("dist")
    }

    /// Build-time config file the generated API endpoint line is written to.
    pub fn frontend_env_file(&self) -> PathBuf {
        self.frontend_dir().join(".env.production")
    }
}

fn truthy(value: &str) -> bool {
    matches!(value.trim(), "1" | "true" | "TRUE" | "yes" | "on")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_paths_are_rooted() {
        let settings = DeploySettings::default().with_root("/srv/chattis");
        assert_eq!(
            settings.frontend_env_file(),
            PathBuf::from("/srv/chattis/frontend/.env.production")
        );
        assert_eq!(
            settings.artifact_path(),
            PathBuf::from("/srv/chattis/backend/dist/backend.zip")
        );
        assert_eq!(
            settings.prod_var_file(),
            PathBuf::from("/srv/chattis/infra/prod.tfvars")
        );
    }

    #[test]
    fn truthy_accepts_common_spellings() {
        assert!(truthy("1"));
        assert!(truthy("true"));
        assert!(truthy(" yes "));
        assert!(!truthy("0"));
        assert!(!truthy(""));
    }
}
