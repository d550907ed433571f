use crate::config::ServicePrincipal;
use crate::domain::model::{
    AppServicePlan, OperatingSystem, PricingTier, PublishingProfile, ResourceGroup,
    RuntimeVersion, WebApp,
};
use crate::domain::ports::CloudProvider;
use crate::utils::error::{DeployError, Result};
use async_trait::async_trait;
use reqwest::{Client, Method, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use url::Url;

const RESOURCES_API_VERSION: &str = "2021-04-01";
const WEB_API_VERSION: &str = "2022-03-01";
const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(60);

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

#[derive(Debug, Clone)]
struct AccessToken {
    value: String,
    expires_at: Instant,
}

#[derive(Debug, Default, Deserialize)]
struct ArmResource {
    id: Option<String>,
    name: Option<String>,
    location: Option<String>,
    #[serde(default)]
    properties: ArmProperties,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ArmProperties {
    provisioning_state: Option<String>,
    default_host_name: Option<String>,
    publishing_user_name: Option<String>,
    publishing_password: Option<String>,
    scm_uri: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ArmErrorBody {
    error: ArmErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ArmErrorDetail {
    code: String,
    message: String,
}

/// Azure Resource Manager REST 客戶端
///
/// 以服務主體的 client credentials 取得權杖，建立資源群組、App Service 方案與 Web App。
/// PUT 回傳 201/202 或 `provisioningState` 尚未完成時，會輪詢資源直到 `Succeeded`。
pub struct AzureClient {
    client: Client,
    principal: ServicePrincipal,
    token: Mutex<Option<AccessToken>>,
    poll_interval: Duration,
    max_poll_attempts: u32,
}

impl AzureClient {
    pub fn new(principal: ServicePrincipal) -> Self {
        Self {
            client: Client::new(),
            principal,
            token: Mutex::new(None),
            poll_interval: Duration::from_secs(5),
            max_poll_attempts: 120,
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration, max_attempts: u32) -> Self {
        self.poll_interval = interval;
        self.max_poll_attempts = max_attempts;
        self
    }

    fn management_endpoint(&self) -> &str {
        self.principal.management_endpoint.trim_end_matches('/')
    }

    fn resource_group_path(&self, name: &str) -> String {
        format!(
            "/subscriptions/{}/resourcegroups/{}",
            self.principal.subscription_id, name
        )
    }

    fn web_path(&self, resource_group: &str, kind: &str, name: &str) -> String {
        format!(
            "/subscriptions/{}/resourceGroups/{}/providers/Microsoft.Web/{}/{}",
            self.principal.subscription_id, resource_group, kind, name
        )
    }

    async fn access_token(&self) -> Result<String> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref() {
            if token.expires_at > Instant::now() {
                return Ok(token.value.clone());
            }
        }

        let token_url = format!(
            "{}/{}/oauth2/v2.0/token",
            self.principal.authority_host.trim_end_matches('/'),
            self.principal.tenant_id
        );
        let scope = format!("{}/.default", self.management_endpoint());
        tracing::debug!("Requesting management token from {}", token_url);

        let response = self
            .client
            .post(&token_url)
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", self.principal.client_id.as_str()),
                ("client_secret", self.principal.client_secret.as_str()),
                ("scope", scope.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DeployError::AuthError {
                message: format!("token endpoint returned {}: {}", status, body),
            });
        }

        let token: TokenResponse = response.json().await?;
        let lifetime = Duration::from_secs(token.expires_in).saturating_sub(TOKEN_EXPIRY_MARGIN);
        *cached = Some(AccessToken {
            value: token.access_token.clone(),
            expires_at: Instant::now() + lifetime,
        });
        tracing::debug!("Acquired management token valid for {:?}", lifetime);

        Ok(token.access_token)
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        api_version: &str,
        body: Option<&Value>,
    ) -> Result<(StatusCode, String)> {
        let url = format!(
            "{}{}?api-version={}",
            self.management_endpoint(),
            path,
            api_version
        );
        let token = self.access_token().await?;

        let mut request = self.client.request(method.clone(), &url).bearer_auth(token);
        if let Some(body) = body {
            request = request.json(body);
        }

        tracing::debug!("{} {}", method, url);
        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;
        Ok((status, text))
    }

    async fn put_resource(
        &self,
        label: &str,
        path: &str,
        api_version: &str,
        body: &Value,
    ) -> Result<ArmResource> {
        let (status, text) = self.send(Method::PUT, path, api_version, Some(body)).await?;
        if !status.is_success() {
            return Err(arm_error(label, status, &text));
        }

        let resource = parse_resource(&text)?;
        let state = resource.properties.provisioning_state.as_deref();
        let settled = match state {
            Some(state) => state == "Succeeded",
            None => status == StatusCode::OK,
        };
        if settled {
            return Ok(resource);
        }

        tracing::info!("⏳ Waiting for {} to finish provisioning", label);
        self.wait_for_provisioning(label, path, api_version).await
    }

    async fn wait_for_provisioning(
        &self,
        label: &str,
        path: &str,
        api_version: &str,
    ) -> Result<ArmResource> {
        for attempt in 1..=self.max_poll_attempts {
            tokio::time::sleep(self.poll_interval).await;

            let (status, text) = self.send(Method::GET, path, api_version, None).await?;
            if status == StatusCode::NOT_FOUND {
                tracing::debug!("{} not visible yet (attempt {})", label, attempt);
                continue;
            }
            if !status.is_success() {
                return Err(arm_error(label, status, &text));
            }

            let resource = parse_resource(&text)?;
            match resource.properties.provisioning_state.as_deref() {
                None | Some("Succeeded") => return Ok(resource),
                Some(state @ ("Failed" | "Canceled")) => {
                    return Err(DeployError::provisioning(
                        label,
                        format!("provisioning state is {}", state),
                    ))
                }
                Some(state) => {
                    tracing::debug!("{} is {} (attempt {})", label, state, attempt);
                }
            }
        }

        Err(DeployError::provisioning(
            label,
            format!(
                "still provisioning after {} checks",
                self.max_poll_attempts
            ),
        ))
    }
}

fn parse_resource(text: &str) -> Result<ArmResource> {
    if text.trim().is_empty() {
        return Ok(ArmResource::default());
    }
    Ok(serde_json::from_str(text)?)
}

fn arm_error(label: &str, status: StatusCode, body: &str) -> DeployError {
    let message = match serde_json::from_str::<ArmErrorBody>(body) {
        Ok(parsed) => format!("{} ({}): {}", parsed.error.code, status, parsed.error.message),
        Err(_) if body.trim().is_empty() => format!("HTTP {}", status),
        Err(_) => format!("HTTP {}: {}", status, body),
    };
    DeployError::provisioning(label, message)
}

fn required(label: &str, field: &str, value: Option<String>) -> Result<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(DeployError::provisioning(
            label,
            format!("response did not include {}", field),
        )),
    }
}

/// 由 scmUri 推出 Git 端點，去掉內嵌的帳密
fn git_url_from_scm_uri(scm_uri: &str, app_name: &str) -> Result<String> {
    let mut url = Url::parse(scm_uri).map_err(|e| {
        DeployError::provisioning("publishing profile", format!("invalid scmUri: {}", e))
    })?;
    // set_username / set_password 只會在 cannot-be-a-base 的 URL 上失敗
    let _ = url.set_username("");
    let _ = url.set_password(None);
    url.set_path(&format!("/{}.git", app_name));
    url.set_query(None);
    Ok(url.to_string())
}

#[async_trait]
impl CloudProvider for AzureClient {
    async fn create_resource_group(&self, name: &str, location: &str) -> Result<ResourceGroup> {
        let label = format!("resource group {}", name);
        tracing::info!("🏗️ Creating {} in {}", label, location);

        let body = json!({ "location": location });
        let resource = self
            .put_resource(&label, &self.resource_group_path(name), RESOURCES_API_VERSION, &body)
            .await?;

        Ok(ResourceGroup {
            id: required(&label, "id", resource.id)?,
            name: resource.name.unwrap_or_else(|| name.to_string()),
            location: resource.location.unwrap_or_else(|| location.to_string()),
        })
    }

    async fn create_app_service_plan(
        &self,
        resource_group: &ResourceGroup,
        name: &str,
        pricing_tier: &PricingTier,
        operating_system: OperatingSystem,
    ) -> Result<AppServicePlan> {
        let label = format!("app service plan {}", name);
        tracing::info!("🏗️ Creating {} ({})", label, pricing_tier);

        let linux = operating_system == OperatingSystem::Linux;
        let kind = if linux { "linux" } else { "app" };
        let body = json!({
            "location": resource_group.location,
            "kind": kind,
            "sku": { "name": pricing_tier.size, "tier": pricing_tier.tier },
            "properties": { "reserved": linux },
        });
        let path = self.web_path(&resource_group.name, "serverfarms", name);
        let resource = self.put_resource(&label, &path, WEB_API_VERSION, &body).await?;

        Ok(AppServicePlan {
            id: required(&label, "id", resource.id)?,
            name: resource.name.unwrap_or_else(|| name.to_string()),
            resource_group: resource_group.name.clone(),
            location: resource
                .location
                .unwrap_or_else(|| resource_group.location.clone()),
            pricing_tier: pricing_tier.clone(),
            operating_system,
        })
    }

    async fn create_web_app(
        &self,
        plan: &AppServicePlan,
        name: &str,
        runtime: Option<RuntimeVersion>,
    ) -> Result<WebApp> {
        let label = format!("web app {}", name);
        tracing::info!("🏗️ Creating {} on plan {}", label, plan.name);

        let linux = plan.operating_system == OperatingSystem::Linux;
        let mut site_config = json!({ "scmType": "LocalGit" });
        match (runtime, linux) {
            (Some(RuntimeVersion::Php(version)), false) => {
                site_config["phpVersion"] = json!(version);
            }
            (Some(RuntimeVersion::Python(version)), false) => {
                site_config["pythonVersion"] = json!(version);
            }
            (Some(RuntimeVersion::Php(version)), true) => {
                site_config["linuxFxVersion"] = json!(format!("PHP|{}", version));
            }
            (Some(RuntimeVersion::Python(version)), true) => {
                site_config["linuxFxVersion"] = json!(format!("PYTHON|{}", version));
            }
            (None, _) => {}
        }

        let kind = if linux { "app,linux" } else { "app" };
        let body = json!({
            "location": plan.location,
            "kind": kind,
            "properties": {
                "serverFarmId": plan.id,
                "siteConfig": site_config,
            },
        });
        let path = self.web_path(&plan.resource_group, "sites", name);
        let resource = self.put_resource(&label, &path, WEB_API_VERSION, &body).await?;

        Ok(WebApp {
            id: required(&label, "id", resource.id)?,
            name: resource.name.unwrap_or_else(|| name.to_string()),
            resource_group: plan.resource_group.clone(),
            default_host_name: required(
                &label,
                "properties.defaultHostName",
                resource.properties.default_host_name,
            )?,
        })
    }

    async fn publishing_profile(&self, web_app: &WebApp) -> Result<PublishingProfile> {
        let label = "publishing profile";
        let path = format!(
            "{}/config/publishingcredentials/list",
            self.web_path(&web_app.resource_group, "sites", &web_app.name)
        );

        let (status, text) = self.send(Method::POST, &path, WEB_API_VERSION, None).await?;
        if !status.is_success() {
            return Err(arm_error(label, status, &text));
        }
        let resource = parse_resource(&text)?;
        let properties = resource.properties;

        let git_url = match properties.scm_uri.as_deref() {
            Some(uri) if !uri.is_empty() => git_url_from_scm_uri(uri, &web_app.name)?,
            _ => format!(
                "https://{}.scm.azurewebsites.net:443/{}.git",
                web_app.name, web_app.name
            ),
        };

        tracing::debug!("Git endpoint for {} is {}", web_app.name, git_url);
        Ok(PublishingProfile {
            git_url,
            git_username: required(label, "publishingUserName", properties.publishing_user_name)?,
            git_password: required(label, "publishingPassword", properties.publishing_password)?,
        })
    }

    async fn delete_resource_group(&self, name: &str) -> Result<()> {
        let label = format!("resource group {}", name);
        let (status, text) = self
            .send(
                Method::DELETE,
                &self.resource_group_path(name),
                RESOURCES_API_VERSION,
                None,
            )
            .await?;

        match status {
            StatusCode::NOT_FOUND => {
                tracing::info!("🧹 {} was already gone", label);
                Ok(())
            }
            s if s.is_success() => {
                tracing::info!("🧹 Deletion of {} accepted ({})", label, s);
                Ok(())
            }
            s => Err(arm_error(&label, s, &text)),
        }
    }
}
