//! Core domain types for the Shipwright deployment pipeline.
//!
//! This crate contains:
//! - Deployment environments and the resolved deployment target
//! - Remote state backend configuration and deterministic resource naming
//! - Typed outputs read back from an applied stack
//! - The command-runner seam all external tool invocations go through

pub mod environment;
pub mod error;
pub mod outputs;
pub mod runner;
pub mod state;

pub use environment::Environment;
pub use error::{Error, Result};
pub use outputs::{OutputError, StackOutputs};
pub use runner::{CommandRunner, CommandSpec, ToolOutput};
pub use state::{DeploymentTarget, StateBackendConfig};
