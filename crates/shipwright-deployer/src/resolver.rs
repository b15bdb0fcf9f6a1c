//! Remote state backend resolution.

use tracing::info;

use shipwright_config::DeploySettings;
use shipwright_core::{Environment, StateBackendConfig};

use crate::aws::AwsCli;
use crate::error::DeployResult;

/// Resolve where the environment's remote state lives.
///
/// The store name is deterministic (project prefix plus account id). The
/// probe discovers the store's true region, because the creation region
/// can diverge from the operator's configured default; when the store
/// does not exist yet, the configured default region is used without
/// treating the miss as an error.
pub async fn resolve_backend(
    aws: &AwsCli,
    settings: &DeploySettings,
    project: &str,
    environment: Environment,
    account_id: &str,
) -> DeployResult<StateBackendConfig> {
    let store = StateBackendConfig::store_name(project, account_id);

    let region = match aws.bucket_region(&store).await? {
        Some(region) => {
            info!(store = %store, region = %region, "state store found");
            region
        }
        None => {
            info!(
                store = %store,
                region = %settings.default_region,
                "state store not found, falling back to the default region"
            );
            settings.default_region.clone()
        }
    };

    Ok(StateBackendConfig::new(
        project,
        environment,
        account_id,
        region,
    ))
}
