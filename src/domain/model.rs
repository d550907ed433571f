use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::utils::error::{DeployError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperatingSystem {
    Windows,
    Linux,
}

/// App Service 方案的定價層，例如 `S1` 對應 `Standard`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricingTier {
    pub tier: String,
    pub size: String,
}

impl PricingTier {
    pub fn standard_s1() -> Self {
        Self {
            tier: "Standard".to_string(),
            size: "S1".to_string(),
        }
    }
}

impl FromStr for PricingTier {
    type Err = DeployError;

    fn from_str(s: &str) -> Result<Self> {
        // 同時接受 "S1" 與 "STANDARD_S1" 兩種寫法
        let size = s.rsplit('_').next().unwrap_or(s).trim();
        let upper = size.to_ascii_uppercase();

        let tier = match upper.as_str() {
            "F1" => "Free",
            "D1" => "Shared",
            "B1" | "B2" | "B3" => "Basic",
            "S1" | "S2" | "S3" => "Standard",
            "P1V2" | "P2V2" | "P3V2" => "PremiumV2",
            "P1V3" | "P2V3" | "P3V3" => "PremiumV3",
            _ => {
                return Err(DeployError::InvalidConfigValueError {
                    field: "environment.pricing_tier".to_string(),
                    value: s.to_string(),
                    reason: "Unknown pricing tier, expected one of F1, D1, B1-B3, S1-S3, P1v2-P3v2, P1v3-P3v3"
                        .to_string(),
                })
            }
        };

        // Premium 系列的 SKU 名稱小寫 v，例如 P1v2
        let size = if upper.starts_with('P') {
            upper.replace('V', "v")
        } else {
            upper
        };

        Ok(Self {
            tier: tier.to_string(),
            size,
        })
    }
}

impl fmt::Display for PricingTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.tier, self.size)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeVersion {
    Php(&'static str),
    Python(&'static str),
}

/// 樣本應用程式的種類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SampleApp {
    NodeJs,
    Php,
    Python,
}

impl SampleApp {
    pub const ALL: [SampleApp; 3] = [SampleApp::NodeJs, SampleApp::Php, SampleApp::Python];

    pub fn name(&self) -> &'static str {
        match self {
            SampleApp::NodeJs => "nodejs",
            SampleApp::Php => "php",
            SampleApp::Python => "python",
        }
    }

    pub fn runtime_version(&self) -> Option<RuntimeVersion> {
        match self {
            SampleApp::NodeJs => None,
            SampleApp::Php => Some(RuntimeVersion::Php("5.6")),
            SampleApp::Python => Some(RuntimeVersion::Python("3.4")),
        }
    }

    pub fn file_pattern(&self) -> &'static str {
        match self {
            SampleApp::NodeJs => "*.js,*.json",
            SampleApp::Php => "*.php",
            SampleApp::Python => "*.py,*.config,requirements.txt",
        }
    }

    pub fn expected_response(&self) -> &'static str {
        match self {
            SampleApp::NodeJs => "Hello NodeJS!",
            SampleApp::Php => "Hello PHP!",
            SampleApp::Python => "Hello, Python!",
        }
    }
}

impl FromStr for SampleApp {
    type Err = DeployError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "nodejs" | "node" => Ok(SampleApp::NodeJs),
            "php" => Ok(SampleApp::Php),
            "python" => Ok(SampleApp::Python),
            other => Err(DeployError::InvalidConfigValueError {
                field: "app".to_string(),
                value: other.to_string(),
                reason: "Expected nodejs, php or python".to_string(),
            }),
        }
    }
}

impl fmt::Display for SampleApp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceGroup {
    pub id: String,
    pub name: String,
    pub location: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppServicePlan {
    pub id: String,
    pub name: String,
    pub resource_group: String,
    pub location: String,
    pub pricing_tier: PricingTier,
    pub operating_system: OperatingSystem,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebApp {
    pub id: String,
    pub name: String,
    pub resource_group: String,
    pub default_host_name: String,
}

impl WebApp {
    pub fn site_url(&self, scheme: &str) -> String {
        format!("{}://{}/", scheme, self.default_host_name)
    }
}

/// 推送部署使用的發佈憑證
#[derive(Clone, PartialEq, Eq)]
pub struct PublishingProfile {
    pub git_url: String,
    pub git_username: String,
    pub git_password: String,
}

impl fmt::Debug for PublishingProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PublishingProfile")
            .field("git_url", &self.git_url)
            .field("git_username", &self.git_username)
            .field("git_password", &"***")
            .finish()
    }
}

/// 一次建置的上下文：工作目錄與 BUILD_TAG
#[derive(Debug, Clone)]
pub struct JobContext {
    pub workspace: PathBuf,
    pub build_tag: String,
}

/// 部署指令需要的所有輸入，每個情境建立一次
#[derive(Debug, Clone)]
pub struct GitDeployCommandData {
    pub publishing_profile: PublishingProfile,
    pub web_app: WebApp,
    pub job_context: JobContext,
    pub file_path: String,
    pub source_directory: Option<String>,
    pub target_directory: Option<String>,
    pub branch: String,
}

#[derive(Debug, Clone)]
pub struct DeployOutcome {
    pub commit_id: String,
    pub files: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct ScenarioReport {
    pub app: SampleApp,
    pub site_url: String,
    pub deployed_files: Vec<String>,
    pub commit_id: String,
    pub elapsed: std::time::Duration,
}
