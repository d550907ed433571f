use crate::utils::error::{DeployError, Result};
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_url(field_name: &str, url_str: &str) -> Result<()> {
    if url_str.is_empty() {
        return Err(DeployError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: "URL cannot be empty".to_string(),
        });
    }

    match Url::parse(url_str) {
        Ok(url) => match url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(DeployError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: url_str.to_string(),
                reason: format!("Unsupported URL scheme: {}", scheme),
            }),
        },
        Err(e) => Err(DeployError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: format!("Invalid URL format: {}", e),
        }),
    }
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(DeployError::MissingConfigError {
            field: field_name.to_string(),
        });
    }
    // 未被替換的 ${VAR} 代表環境變數沒有設定
    if value.starts_with("${") && value.ends_with('}') {
        return Err(DeployError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Environment variable is not set".to_string(),
        });
    }
    Ok(())
}

/// 資源群組名稱：英數字、`-`、`_`、`.`，不可以連字號開頭或結尾
pub fn validate_resource_name(field_name: &str, value: &str, max_len: usize) -> Result<()> {
    validate_non_empty_string(field_name, value)?;

    let reason = if value.len() > max_len {
        Some(format!("Name must be at most {} characters", max_len))
    } else if !value
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.')
    {
        Some("Name may only contain letters, digits, '-', '_' and '.'".to_string())
    } else if value.starts_with('-') || value.ends_with('-') {
        Some("Name cannot start or end with '-'".to_string())
    } else {
        None
    };

    match reason {
        Some(reason) => Err(DeployError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason,
        }),
        None => Ok(()),
    }
}

/// Web App 與 App Service 方案名稱會成為 `<name>.azurewebsites.net` 的一段，
/// 只接受英數字與連字號
pub fn validate_site_name(field_name: &str, value: &str, max_len: usize) -> Result<()> {
    validate_non_empty_string(field_name, value)?;

    let reason = if value.len() > max_len {
        Some(format!("Name must be at most {} characters", max_len))
    } else if !value.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
        Some("Name may only contain letters, digits and '-'".to_string())
    } else if value.starts_with('-') || value.ends_with('-') {
        Some("Name cannot start or end with '-'".to_string())
    } else {
        None
    };

    match reason {
        Some(reason) => Err(DeployError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason,
        }),
        None => Ok(()),
    }
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value < min || value > max {
        return Err(DeployError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be between {} and {}", min, max),
        });
    }
    Ok(())
}
