pub mod artifact;
pub mod config;
pub mod error;
pub mod types;

pub use artifact::DeployArtifact;
pub use config::DeployConfig;
pub use error::{DeployError, Result};
pub use types::*;
