use crate::domain::model::{
    AppServicePlan, DeployOutcome, GitDeployCommandData, OperatingSystem, PricingTier,
    PublishingProfile, ResourceGroup, RuntimeVersion, WebApp,
};
use crate::utils::error::Result;
use async_trait::async_trait;

/// 雲端資源管理：建立資源群組、方案與 Web App
#[async_trait]
pub trait CloudProvider: Send + Sync {
    async fn create_resource_group(&self, name: &str, location: &str) -> Result<ResourceGroup>;

    async fn create_app_service_plan(
        &self,
        resource_group: &ResourceGroup,
        name: &str,
        pricing_tier: &PricingTier,
        operating_system: OperatingSystem,
    ) -> Result<AppServicePlan>;

    async fn create_web_app(
        &self,
        plan: &AppServicePlan,
        name: &str,
        runtime: Option<RuntimeVersion>,
    ) -> Result<WebApp>;

    async fn publishing_profile(&self, web_app: &WebApp) -> Result<PublishingProfile>;

    async fn delete_resource_group(&self, name: &str) -> Result<()>;
}

/// 把工作目錄的檔案推送到 Web App
#[async_trait]
pub trait Deployer: Send + Sync {
    async fn execute(&self, data: &GitDeployCommandData) -> Result<DeployOutcome>;
}
