use crate::domain::model::{OperatingSystem, PricingTier};
use crate::utils::error::{DeployError, Result};
use crate::utils::validation::{
    validate_non_empty_string, validate_range, validate_resource_name, validate_site_name,
    validate_url, Validate,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_MANAGEMENT_ENDPOINT: &str = "https://management.azure.com";
pub const DEFAULT_AUTHORITY_HOST: &str = "https://login.microsoftonline.com";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeployConfig {
    pub azure: ServicePrincipal,
    #[serde(default)]
    pub environment: EnvironmentConfig,
    #[serde(default)]
    pub deploy: DeploySettings,
    #[serde(default)]
    pub verify: VerifyConfig,
}

/// 服務主體認證資訊
#[derive(Clone, Serialize, Deserialize)]
pub struct ServicePrincipal {
    pub subscription_id: String,
    pub client_id: String,
    pub client_secret: String,
    pub tenant_id: String,
    #[serde(default = "default_management_endpoint")]
    pub management_endpoint: String,
    #[serde(default = "default_authority_host")]
    pub authority_host: String,
}

impl fmt::Debug for ServicePrincipal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServicePrincipal")
            .field("subscription_id", &self.subscription_id)
            .field("client_id", &self.client_id)
            .field("client_secret", &"***")
            .field("tenant_id", &self.tenant_id)
            .field("management_endpoint", &self.management_endpoint)
            .field("authority_host", &self.authority_host)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvironmentConfig {
    #[serde(default = "default_location")]
    pub location: String,
    #[serde(default = "default_resource_group")]
    pub resource_group: String,
    #[serde(default = "default_plan_name")]
    pub plan_name: String,
    #[serde(default = "default_pricing_tier")]
    pub pricing_tier: String,
    #[serde(default = "default_app_name")]
    pub app_name: String,
    #[serde(default = "default_operating_system")]
    pub operating_system: OperatingSystem,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            location: default_location(),
            resource_group: default_resource_group(),
            plan_name: default_plan_name(),
            pricing_tier: default_pricing_tier(),
            app_name: default_app_name(),
            operating_system: default_operating_system(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploySettings {
    #[serde(default = "default_build_tag")]
    pub build_tag: String,
    #[serde(default = "default_branch")]
    pub branch: String,
    pub source_directory: Option<String>,
    pub target_directory: Option<String>,
    #[serde(default)]
    pub keep_resources: bool,
}

impl Default for DeploySettings {
    fn default() -> Self {
        Self {
            build_tag: default_build_tag(),
            branch: default_branch(),
            source_directory: None,
            target_directory: None,
            keep_resources: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyConfig {
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    #[serde(default = "default_interval_seconds")]
    pub interval_seconds: u64,
    #[serde(default = "default_scheme")]
    pub scheme: String,
}

impl Default for VerifyConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_timeout_seconds(),
            interval_seconds: default_interval_seconds(),
            scheme: default_scheme(),
        }
    }
}

impl VerifyConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_seconds)
    }
}

fn default_management_endpoint() -> String {
    DEFAULT_MANAGEMENT_ENDPOINT.to_string()
}

fn default_authority_host() -> String {
    DEFAULT_AUTHORITY_HOST.to_string()
}

fn default_location() -> String {
    "westus".to_string()
}

fn run_suffix() -> String {
    chrono::Utc::now().format("%m%d%H%M%S").to_string()
}

fn default_resource_group() -> String {
    format!("appservice-it-rg-{}", run_suffix())
}

fn default_plan_name() -> String {
    format!("appservice-it-plan-{}", run_suffix())
}

fn default_pricing_tier() -> String {
    "S1".to_string()
}

fn default_app_name() -> String {
    format!("appservice-it-app-{}", run_suffix())
}

fn default_operating_system() -> OperatingSystem {
    OperatingSystem::Windows
}

fn default_build_tag() -> String {
    std::env::var("BUILD_TAG").unwrap_or_else(|_| "jenkins-job-1".to_string())
}

fn default_branch() -> String {
    "master".to_string()
}

fn default_timeout_seconds() -> u64 {
    300
}

fn default_interval_seconds() -> u64 {
    5
}

fn default_scheme() -> String {
    "https".to_string()
}

impl DeployConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(|e| DeployError::ConfigError {
            message: format!("Cannot read {}: {}", path.as_ref().display(), e),
        })?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| DeployError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${AZURE_CLIENT_SECRET})，未設定的保留原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| DeployError::ConfigError {
            message: format!("Invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn pricing_tier(&self) -> Result<PricingTier> {
        self.environment.pricing_tier.parse()
    }

    pub fn validate_config(&self) -> Result<()> {
        validate_non_empty_string("azure.subscription_id", &self.azure.subscription_id)?;
        validate_non_empty_string("azure.client_id", &self.azure.client_id)?;
        validate_non_empty_string("azure.client_secret", &self.azure.client_secret)?;
        validate_non_empty_string("azure.tenant_id", &self.azure.tenant_id)?;
        validate_url("azure.management_endpoint", &self.azure.management_endpoint)?;
        validate_url("azure.authority_host", &self.azure.authority_host)?;

        validate_non_empty_string("environment.location", &self.environment.location)?;
        validate_resource_name("environment.resource_group", &self.environment.resource_group, 90)?;
        validate_site_name("environment.plan_name", &self.environment.plan_name, 40)?;
        // 保留空間給 "-python" 之類的後綴
        validate_site_name("environment.app_name", &self.environment.app_name, 52)?;
        self.pricing_tier()?;

        validate_non_empty_string("deploy.build_tag", &self.deploy.build_tag)?;
        validate_non_empty_string("deploy.branch", &self.deploy.branch)?;

        validate_range("verify.timeout_seconds", self.verify.timeout_seconds, 1, 3600)?;
        validate_range("verify.interval_seconds", self.verify.interval_seconds, 1, 300)?;
        match self.verify.scheme.as_str() {
            "http" | "https" => Ok(()),
            other => Err(DeployError::InvalidConfigValueError {
                field: "verify.scheme".to_string(),
                value: other.to_string(),
                reason: "Expected http or https".to_string(),
            }),
        }
    }
}

impl Validate for DeployConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
