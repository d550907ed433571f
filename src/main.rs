use appservice_git_deploy::config::{CliArgs, Command};
use appservice_git_deploy::core::staging::stage_sample_app;
use appservice_git_deploy::utils::{logger, validation::Validate};
use appservice_git_deploy::{
    AzureClient, DeployConfig, DeployError, DeploymentScenario, GitDeployCommand,
    ScenarioSettings,
};
use clap::Parser;

fn fail(e: &DeployError) -> ! {
    tracing::error!("❌ {} (Category: {:?})", e, e.category());
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());
    std::process::exit(e.exit_code());
}

fn load_config(args: &CliArgs) -> DeployConfig {
    tracing::info!("📁 Loading configuration from: {}", args.config.display());
    let config = match DeployConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => fail(&e),
    };
    if args.verbose {
        tracing::debug!("Config: {:?}", config);
    }
    config
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let args = CliArgs::parse();

    if args.json_logs {
        logger::init_json_logger(args.verbose);
    } else {
        logger::init_cli_logger(args.verbose);
    }

    match &args.command {
        Command::Deploy {
            app,
            keep_resources,
            timeout,
        } => {
            let mut config = load_config(&args);
            if *keep_resources {
                config.deploy.keep_resources = true;
            }
            if let Some(timeout) = timeout {
                config.verify.timeout_seconds = *timeout;
                tracing::info!("🔧 Readiness timeout overridden to {}s", timeout);
            }
            if let Err(e) = config.validate() {
                fail(&e);
            }

            let settings = match ScenarioSettings::from_config(&config) {
                Ok(settings) => settings,
                Err(e) => fail(&e),
            };
            let provider = AzureClient::new(config.azure.clone());
            let scenario = DeploymentScenario::new(provider, GitDeployCommand::new(), settings);

            match scenario.run_with_teardown(&app.apps()).await {
                Ok(reports) => {
                    for report in reports {
                        println!(
                            "✅ {} deployed to {} (commit {}, {} file(s), {:.0?})",
                            report.app,
                            report.site_url,
                            report.commit_id,
                            report.deployed_files.len(),
                            report.elapsed
                        );
                    }
                }
                Err(e) => fail(&e),
            }
        }
        Command::Stage { app, out } => {
            if let Err(e) = std::fs::create_dir_all(out) {
                fail(&DeployError::IoError(e));
            }
            for sample in app.apps() {
                match stage_sample_app(sample, out) {
                    Ok(payload) => println!(
                        "📦 {}: {} (pattern '{}')",
                        sample,
                        payload.files.join(", "),
                        payload.pattern
                    ),
                    Err(e) => fail(&e),
                }
            }
        }
        Command::Cleanup => {
            let config = load_config(&args);
            if let Err(e) = config.validate() {
                fail(&e);
            }
            let settings = match ScenarioSettings::from_config(&config) {
                Ok(settings) => settings,
                Err(e) => fail(&e),
            };
            let provider = AzureClient::new(config.azure.clone());
            DeploymentScenario::new(provider, GitDeployCommand::new(), settings)
                .cleanup()
                .await;
        }
    }
}
