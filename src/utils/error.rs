use thiserror::Error;

#[derive(Error, Debug)]
pub enum DeployError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Git error: {0}")]
    GitError(#[from] git2::Error),

    #[error("Directory walk failed: {0}")]
    WalkError(#[from] walkdir::Error),

    #[error("Invalid file pattern: {0}")]
    PatternError(#[from] glob::PatternError),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing configuration value: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Authentication failed: {message}")]
    AuthError { message: String },

    #[error("Provisioning of {resource} failed: {message}")]
    ProvisioningError { resource: String, message: String },

    #[error("Staging error: {message}")]
    StagingError { message: String },

    #[error("Deployment failed: {message}")]
    DeploymentError { message: String },

    #[error("Timed out after {elapsed_secs}s waiting for {url}")]
    Timeout { url: String, elapsed_secs: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Provisioning,
    Staging,
    Deployment,
    Readiness,
}

impl DeployError {
    pub fn provisioning(resource: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ProvisioningError {
            resource: resource.into(),
            message: message.into(),
        }
    }

    pub fn deployment(message: impl Into<String>) -> Self {
        Self::DeploymentError {
            message: message.into(),
        }
    }

    pub fn staging(message: impl Into<String>) -> Self {
        Self::StagingError {
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::ConfigError { .. }
            | Self::MissingConfigError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::PatternError(_) => ErrorCategory::Configuration,
            Self::AuthError { .. } | Self::ProvisioningError { .. } | Self::HttpError(_) => {
                ErrorCategory::Provisioning
            }
            Self::IoError(_)
            | Self::WalkError(_)
            | Self::SerializationError(_)
            | Self::StagingError { .. } => ErrorCategory::Staging,
            Self::GitError(_) | Self::DeploymentError { .. } => ErrorCategory::Deployment,
            Self::Timeout { .. } => ErrorCategory::Readiness,
        }
    }

    /// CLI 結束碼
    pub fn exit_code(&self) -> i32 {
        match self.category() {
            ErrorCategory::Configuration => 1,
            ErrorCategory::Provisioning => 2,
            ErrorCategory::Staging | ErrorCategory::Deployment => 3,
            ErrorCategory::Readiness => 4,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Configuration => format!("Configuration problem: {}", self),
            ErrorCategory::Provisioning => format!("Could not provision Azure resources: {}", self),
            ErrorCategory::Staging => format!("Could not stage the sample application: {}", self),
            ErrorCategory::Deployment => format!("Git deployment failed: {}", self),
            ErrorCategory::Readiness => format!("The web app never became ready: {}", self),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            Self::AuthError { .. } => {
                "Check the service principal client id, secret and tenant in the [azure] section"
            }
            Self::MissingConfigError { .. } | Self::InvalidConfigValueError { .. } => {
                "Fix the configuration file or export the referenced environment variables"
            }
            Self::ProvisioningError { .. } | Self::HttpError(_) => {
                "Verify the subscription quota, region and pricing tier, then rerun"
            }
            Self::GitError(_) | Self::DeploymentError { .. } => {
                "Make sure local git deployment is enabled and the publishing credentials are valid"
            }
            Self::Timeout { .. } => {
                "Inspect the site's deployment log in the Kudu console or raise --timeout"
            }
            _ => "Rerun with --verbose for more details",
        }
    }
}

pub type Result<T> = std::result::Result<T, DeployError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_message_names_url_and_elapsed() {
        let err = DeployError::Timeout {
            url: "https://demo.azurewebsites.net/".to_string(),
            elapsed_secs: 300,
        };
        assert_eq!(
            err.to_string(),
            "Timed out after 300s waiting for https://demo.azurewebsites.net/"
        );
        assert_eq!(err.category(), ErrorCategory::Readiness);
        assert_eq!(err.exit_code(), 4);
    }

    #[test]
    fn test_exit_codes_follow_category() {
        assert_eq!(
            DeployError::MissingConfigError {
                field: "azure.client_id".to_string()
            }
            .exit_code(),
            1
        );
        assert_eq!(DeployError::provisioning("web app", "conflict").exit_code(), 2);
        assert_eq!(DeployError::deployment("push rejected").exit_code(), 3);
    }
}
