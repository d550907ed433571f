pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliArgs;
pub use config::DeployConfig;

pub use crate::adapters::AzureClient;
pub use crate::core::git_deploy::GitDeployCommand;
pub use crate::core::readiness::{wait_for_app_ready, ReadinessPoller};
pub use crate::core::scenario::{DeploymentScenario, ScenarioSettings};
pub use crate::domain::model::SampleApp;
pub use crate::utils::error::{DeployError, Result};
