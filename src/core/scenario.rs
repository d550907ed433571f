use crate::config::DeployConfig;
use crate::core::readiness::ReadinessPoller;
use crate::core::staging::{stage_sample_app, Workspace};
use crate::domain::model::{
    AppServicePlan, GitDeployCommandData, JobContext, OperatingSystem, PricingTier, ResourceGroup,
    SampleApp, ScenarioReport, WebApp,
};
use crate::domain::ports::{CloudProvider, Deployer};
use crate::utils::error::{DeployError, Result};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// 一次執行所需的設定，從 `DeployConfig` 轉換而來
#[derive(Debug, Clone)]
pub struct ScenarioSettings {
    pub location: String,
    pub resource_group: String,
    pub plan_name: String,
    pub pricing_tier: PricingTier,
    pub operating_system: OperatingSystem,
    pub app_name: String,
    pub build_tag: String,
    pub branch: String,
    pub source_directory: Option<String>,
    pub target_directory: Option<String>,
    pub verify_timeout: Duration,
    pub verify_interval: Duration,
    pub scheme: String,
    pub keep_resources: bool,
}

impl ScenarioSettings {
    pub fn from_config(config: &DeployConfig) -> Result<Self> {
        Ok(Self {
            location: config.environment.location.clone(),
            resource_group: config.environment.resource_group.clone(),
            plan_name: config.environment.plan_name.clone(),
            pricing_tier: config.pricing_tier()?,
            operating_system: config.environment.operating_system,
            app_name: config.environment.app_name.clone(),
            build_tag: config.deploy.build_tag.clone(),
            branch: config.deploy.branch.clone(),
            source_directory: config.deploy.source_directory.clone(),
            target_directory: config.deploy.target_directory.clone(),
            verify_timeout: config.verify.timeout(),
            verify_interval: config.verify.interval(),
            scheme: config.verify.scheme.clone(),
            keep_resources: config.deploy.keep_resources,
        })
    }

    /// 多個情境共用環境時，Web App 名稱加上 `-nodejs` / `-php` / `-python`
    pub fn app_name_for(&self, app: SampleApp, shared: bool) -> String {
        if shared {
            format!("{}-{}", self.app_name, app.name())
        } else {
            self.app_name.clone()
        }
    }

    /// 樣本檔案要寫入的目錄，設定了 `source_directory` 時放在工作區底下的子目錄
    pub fn staging_dir(&self, workspace: &Path) -> PathBuf {
        match self.source_directory.as_deref().map(str::trim) {
            Some(dir) if !dir.is_empty() => workspace.join(dir),
            _ => workspace.to_path_buf(),
        }
    }
}

fn ensure_handle(label: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(DeployError::provisioning(
            label,
            "provider returned an empty handle",
        ));
    }
    Ok(())
}

/// 依序執行 建立環境 → 建立 Web App → 準備檔案 → 部署並驗證
///
/// 任何一步失敗都會中止後續步驟，錯誤原樣往上傳，這一層不重試。
pub struct DeploymentScenario<P: CloudProvider, D: Deployer> {
    provider: P,
    deployer: D,
    settings: ScenarioSettings,
}

impl<P: CloudProvider, D: Deployer> DeploymentScenario<P, D> {
    pub fn new(provider: P, deployer: D, settings: ScenarioSettings) -> Self {
        Self {
            provider,
            deployer,
            settings,
        }
    }

    pub async fn setup_environment(&self) -> Result<(ResourceGroup, AppServicePlan)> {
        let resource_group = self
            .provider
            .create_resource_group(&self.settings.resource_group, &self.settings.location)
            .await?;
        ensure_handle("resource group", &resource_group.id)?;

        let plan = self
            .provider
            .create_app_service_plan(
                &resource_group,
                &self.settings.plan_name,
                &self.settings.pricing_tier,
                self.settings.operating_system,
            )
            .await?;
        ensure_handle("app service plan", &plan.id)?;

        Ok((resource_group, plan))
    }

    pub async fn provision_web_app(
        &self,
        plan: &AppServicePlan,
        app: SampleApp,
        name: &str,
    ) -> Result<WebApp> {
        let web_app = self
            .provider
            .create_web_app(plan, name, app.runtime_version())
            .await?;
        ensure_handle("web app", &web_app.id)?;
        ensure_handle("web app host name", &web_app.default_host_name)?;
        Ok(web_app)
    }

    /// 單一情境：建立環境並部署一個樣本應用
    pub async fn run(&self, app: SampleApp) -> Result<ScenarioReport> {
        let mut reports = self.run_all(&[app]).await?;
        reports
            .pop()
            .ok_or_else(|| DeployError::deployment("scenario produced no report"))
    }

    /// 多個情境共用同一個資源群組與方案，Web App 名稱加上種類後綴
    pub async fn run_all(&self, apps: &[SampleApp]) -> Result<Vec<ScenarioReport>> {
        let (_resource_group, plan) = self.setup_environment().await?;

        let mut reports = Vec::with_capacity(apps.len());
        for app in apps {
            let name = self.settings.app_name_for(*app, apps.len() > 1);
            reports.push(self.deploy_sample(&plan, *app, &name).await?);
        }
        Ok(reports)
    }

    /// 執行後依設定清除資源；清除失敗只記錄，不影響結果
    pub async fn run_with_teardown(&self, apps: &[SampleApp]) -> Result<Vec<ScenarioReport>> {
        let result = self.run_all(apps).await;
        if self.settings.keep_resources {
            tracing::info!(
                "📌 Keeping resource group {}",
                self.settings.resource_group
            );
        } else {
            self.cleanup().await;
        }
        result
    }

    pub async fn cleanup(&self) {
        tracing::info!("🧹 Deleting resource group {}", self.settings.resource_group);
        if let Err(e) = self
            .provider
            .delete_resource_group(&self.settings.resource_group)
            .await
        {
            tracing::warn!(
                "⚠️ Could not delete resource group {}: {}",
                self.settings.resource_group,
                e
            );
        }
    }

    async fn deploy_sample(
        &self,
        plan: &AppServicePlan,
        app: SampleApp,
        name: &str,
    ) -> Result<ScenarioReport> {
        let started = Instant::now();
        tracing::info!("🚀 Starting {} scenario with web app {}", app, name);

        let web_app = self.provision_web_app(plan, app, name).await?;
        let publishing_profile = self.provider.publishing_profile(&web_app).await?;

        let workspace = Workspace::create()?;
        let stage_dir = self.settings.staging_dir(workspace.path());
        std::fs::create_dir_all(&stage_dir)?;
        let payload = stage_sample_app(app, &stage_dir)?;

        let data = GitDeployCommandData {
            publishing_profile,
            web_app: web_app.clone(),
            job_context: JobContext {
                workspace: workspace.path().to_path_buf(),
                build_tag: self.settings.build_tag.clone(),
            },
            file_path: payload.pattern.clone(),
            source_directory: self.settings.source_directory.clone(),
            target_directory: self.settings.target_directory.clone(),
            branch: self.settings.branch.clone(),
        };
        let outcome = self.deployer.execute(&data).await?;

        let site_url = web_app.site_url(&self.settings.scheme);
        ReadinessPoller::new(self.settings.verify_timeout)
            .with_interval(self.settings.verify_interval)
            .wait_for(&site_url, app.expected_response())
            .await?;

        let elapsed = started.elapsed();
        tracing::info!("🎉 {} scenario passed in {:?}", app, elapsed);

        Ok(ScenarioReport {
            app,
            site_url,
            deployed_files: outcome.files,
            commit_id: outcome.commit_id,
            elapsed,
        })
    }
}
