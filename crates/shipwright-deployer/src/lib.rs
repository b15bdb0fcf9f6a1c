//! Deployment and teardown orchestration for the Chattis stack.
//!
//! This crate contains:
//! - One typed adapter per external tool (`aws`, `terraform`, the
//!   frontend/backend build tool)
//! - Remote state backend resolution
//! - The frontend publisher
//! - The strictly linear deploy and teardown pipelines
//! - A scripted mock runner for exercising the above in tests

pub mod artifact;
pub mod aws;
pub mod error;
pub mod frontend;
pub mod mock;
pub mod pipeline;
pub mod process;
pub mod resolver;
pub mod terraform;

pub use error::{DeployError, DeployResult};
pub use pipeline::Pipeline;
pub use process::ProcessRunner;
