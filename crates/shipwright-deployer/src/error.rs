//! Deployment pipeline errors.
//!
//! Propagation is fail-fast top to bottom; no step compensates for a
//! failure in an earlier one.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DeployError {
    #[error("credential check failed: {0}")]
    Credentials(String),

    #[error("state init failed: {0}")]
    Init(String),

    #[error("workspace operation failed: {0}")]
    Workspace(String),

    #[error("workspace '{0}' was created concurrently")]
    WorkspaceConflict(String),

    #[error("apply failed: {0}")]
    Apply(String),

    #[error("reading stack outputs failed: {0}")]
    Outputs(String),

    #[error(transparent)]
    MissingOutput(#[from] shipwright_core::OutputError),

    #[error("build failed: {0}")]
    Build(String),

    #[error("publish failed: {0}")]
    Publish(String),

    #[error("destroy failed: {0}")]
    Destroy(String),

    #[error(transparent)]
    Runner(#[from] shipwright_core::Error),
}

pub type DeployResult<T> = std::result::Result<T, DeployError>;
