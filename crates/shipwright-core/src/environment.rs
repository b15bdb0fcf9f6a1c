//! Deployment environments.

use derive_more::Display;
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// A deployment environment.
///
/// Each environment maps 1:1 to an isolated state workspace and, for
/// production, to an extended variable file. The environment is fixed for
/// the lifetime of a pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[display("dev")]
    Dev,
    #[display("test")]
    Test,
    #[display("prod")]
    Prod,
}

impl Environment {
    /// The environment used when the invocation does not name one.
    pub const DEFAULT: Environment = Environment::Dev;

    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Dev => "dev",
            Environment::Test => "test",
            Environment::Prod => "prod",
        }
    }

    /// Production gets the extended variable file during apply.
    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Prod)
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl std::str::FromStr for Environment {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dev" => Ok(Environment::Dev),
            "test" => Ok(Environment::Test),
            "prod" => Ok(Environment::Prod),
            other => Err(Error::InvalidInput(format!(
                "unknown environment '{}', expected dev, test or prod",
                other
            ))),
        }
    }
}
