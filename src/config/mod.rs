#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
pub use cli::{AppSelection, CliArgs, Command};
pub use toml_config::{DeployConfig, ServicePrincipal};
