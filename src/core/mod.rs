pub mod git_deploy;
pub mod readiness;
pub mod scenario;
pub mod selection;
pub mod staging;

pub use crate::domain::model::{GitDeployCommandData, SampleApp, ScenarioReport};
pub use crate::domain::ports::{CloudProvider, Deployer};
pub use crate::utils::error::Result;
