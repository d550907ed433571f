use crate::domain::model::SampleApp;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "appservice-git-deploy")]
#[command(about = "Provision an Azure web app, git-deploy a sample application and wait for it to answer")]
pub struct CliArgs {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "appservice-it.toml", global = true)]
    pub config: PathBuf,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Run the provision, stage, deploy and verify workflow
    Deploy {
        #[arg(long, value_enum, default_value = "all")]
        app: AppSelection,

        /// Leave the resource group in place after the run
        #[arg(long)]
        keep_resources: bool,

        /// Override the readiness timeout in seconds
        #[arg(long)]
        timeout: Option<u64>,
    },
    /// Stage a sample application into a directory without touching Azure
    Stage {
        #[arg(long, value_enum)]
        app: AppSelection,

        #[arg(long)]
        out: PathBuf,
    },
    /// Delete the configured resource group
    Cleanup,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum AppSelection {
    Nodejs,
    Php,
    Python,
    All,
}

impl AppSelection {
    pub fn apps(&self) -> Vec<SampleApp> {
        match self {
            AppSelection::Nodejs => vec![SampleApp::NodeJs],
            AppSelection::Php => vec![SampleApp::Php],
            AppSelection::Python => vec![SampleApp::Python],
            AppSelection::All => SampleApp::ALL.to_vec(),
        }
    }
}
