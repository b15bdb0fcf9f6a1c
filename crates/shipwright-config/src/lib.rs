//! Configuration for the Shipwright pipeline.
//!
//! This crate handles:
//! - Ambient settings resolved from environment variables with documented
//!   fallbacks (identity profile, default region, tool binaries, layout)
//! - Per-environment apply-variable selection

pub mod settings;
pub mod vars;

pub use settings::DeploySettings;
pub use vars::ApplyVars;
