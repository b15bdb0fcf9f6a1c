//! Remote state backend configuration and deterministic resource naming.

use serde::{Deserialize, Serialize};

use crate::Environment;

/// The resolved account and effective region a deployment targets.
///
/// Derived from the caller identity probe and backend resolution, never
/// configured directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentTarget {
    pub account_id: String,
    pub region: String,
}

/// Location of the remote, lock-protected state store.
///
/// Exactly one of these is active per pipeline run. Store and lock-table
/// names are deterministic so repeated runs converge on the same state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateBackendConfig {
    /// Object store holding the state.
    pub store: String,
    /// State key, namespaced per environment.
    pub key: String,
    /// Region the store actually lives in.
    pub region: String,
    /// Distributed lock table serializing concurrent applies.
    pub lock_table: String,
    /// Whether state objects are encrypted at rest.
    pub encrypt: bool,
}

impl StateBackendConfig {
    /// Deterministic store name: fixed project prefix plus account id.
    pub fn store_name(project: &str, account_id: &str) -> String {
        format!("{}-state-{}", project, account_id)
    }

    /// Deterministic lock table name.
    pub fn lock_table_name(project: &str) -> String {
        format!("{}-state-locks", project)
    }

    /// State key for an environment. Keys never collide across environments.
    pub fn state_key(environment: Environment) -> String {
        format!("env/{}/terraform.tfstate", environment)
    }

    pub fn new(
        project: &str,
        environment: Environment,
        account_id: &str,
        region: impl Into<String>,
    ) -> Self {
        Self {
            store: Self::store_name(project, account_id),
            key: Self::state_key(environment),
            region: region.into(),
            lock_table: Self::lock_table_name(project),
            encrypt: true,
        }
    }

    /// Render as `-backend-config` arguments for the state init call.
    pub fn backend_args(&self) -> Vec<String> {
        vec![
            format!("-backend-config=bucket={}", self.store),
            format!("-backend-config=key={}", self.key),
            format!("-backend-config=region={}", self.region),
            format!("-backend-config=dynamodb_table={}", self.lock_table),
            format!("-backend-config=encrypt={}", self.encrypt),
        ]
    }
}
