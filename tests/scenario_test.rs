use anyhow::Result;
use appservice_git_deploy::domain::model::{
    AppServicePlan, DeployOutcome, GitDeployCommandData, OperatingSystem, PricingTier,
    PublishingProfile, ResourceGroup, RuntimeVersion, WebApp,
};
use appservice_git_deploy::domain::ports::{CloudProvider, Deployer};
use appservice_git_deploy::{
    DeployError, DeploymentScenario, GitDeployCommand, SampleApp, ScenarioSettings,
};
use async_trait::async_trait;
use git2::Repository;
use httpmock::prelude::*;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

#[derive(Debug, Clone, Copy, PartialEq)]
enum EmptyHandle {
    None,
    ResourceGroup,
    Plan,
    WebApp,
}

/// 記錄呼叫順序的雲端替身，Web App 的主機名稱指向本機測試伺服器
#[derive(Clone)]
struct FakeCloud {
    calls: Arc<Mutex<Vec<String>>>,
    site_host: String,
    git_url: String,
    empty: EmptyHandle,
    fail_web_app: bool,
}

impl FakeCloud {
    fn new(site_host: String, git_url: String) -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            site_host,
            git_url,
            empty: EmptyHandle::None,
            fail_web_app: false,
        }
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn id(&self, handle: EmptyHandle, id: &str) -> String {
        if self.empty == handle {
            String::new()
        } else {
            id.to_string()
        }
    }
}

#[async_trait]
impl CloudProvider for FakeCloud {
    async fn create_resource_group(
        &self,
        name: &str,
        location: &str,
    ) -> appservice_git_deploy::Result<ResourceGroup> {
        self.record(format!("resource_group:{}", name));
        Ok(ResourceGroup {
            id: self.id(EmptyHandle::ResourceGroup, "rg-id"),
            name: name.to_string(),
            location: location.to_string(),
        })
    }

    async fn create_app_service_plan(
        &self,
        resource_group: &ResourceGroup,
        name: &str,
        pricing_tier: &PricingTier,
        operating_system: OperatingSystem,
    ) -> appservice_git_deploy::Result<AppServicePlan> {
        self.record(format!("plan:{}", name));
        Ok(AppServicePlan {
            id: self.id(EmptyHandle::Plan, "plan-id"),
            name: name.to_string(),
            resource_group: resource_group.name.clone(),
            location: resource_group.location.clone(),
            pricing_tier: pricing_tier.clone(),
            operating_system,
        })
    }

    async fn create_web_app(
        &self,
        plan: &AppServicePlan,
        name: &str,
        runtime: Option<RuntimeVersion>,
    ) -> appservice_git_deploy::Result<WebApp> {
        self.record(format!("web_app:{}:{:?}", name, runtime));
        if self.fail_web_app {
            return Err(DeployError::provisioning(
                format!("web app {}", name),
                "quota exceeded",
            ));
        }
        Ok(WebApp {
            id: self.id(EmptyHandle::WebApp, "site-id"),
            name: name.to_string(),
            resource_group: plan.resource_group.clone(),
            default_host_name: self.site_host.clone(),
        })
    }

    async fn publishing_profile(
        &self,
        web_app: &WebApp,
    ) -> appservice_git_deploy::Result<PublishingProfile> {
        self.record(format!("publishing_profile:{}", web_app.name));
        Ok(PublishingProfile {
            git_url: self.git_url.clone(),
            git_username: format!("${}", web_app.name),
            git_password: "pw".to_string(),
        })
    }

    async fn delete_resource_group(&self, name: &str) -> appservice_git_deploy::Result<()> {
        self.record(format!("delete:{}", name));
        Ok(())
    }
}

#[derive(Clone, Default)]
struct RecordingDeployer {
    received: Arc<Mutex<Vec<GitDeployCommandData>>>,
}

#[async_trait]
impl Deployer for RecordingDeployer {
    async fn execute(
        &self,
        data: &GitDeployCommandData,
    ) -> appservice_git_deploy::Result<DeployOutcome> {
        self.received.lock().unwrap().push(data.clone());
        Ok(DeployOutcome {
            commit_id: "0000000".to_string(),
            files: vec![],
        })
    }
}

fn settings(keep_resources: bool) -> ScenarioSettings {
    ScenarioSettings {
        location: "westus".to_string(),
        resource_group: "it-rg".to_string(),
        plan_name: "it-plan".to_string(),
        pricing_tier: PricingTier::standard_s1(),
        operating_system: OperatingSystem::Windows,
        app_name: "it-app".to_string(),
        build_tag: "jenkins-job-1".to_string(),
        branch: "master".to_string(),
        source_directory: None,
        target_directory: None,
        verify_timeout: Duration::from_secs(5),
        verify_interval: Duration::from_millis(50),
        scheme: "http".to_string(),
        keep_resources,
    }
}

#[tokio::test]
async fn test_python_scenario_end_to_end_with_local_git_remote() -> Result<()> {
    let site = MockServer::start();
    let site_mock = site.mock(|when, then| {
        when.method(GET).path("/");
        then.status(200).body("Hello, Python!");
    });

    let remote_dir = TempDir::new()?;
    let remote = Repository::init_bare(remote_dir.path())?;
    let cloud = FakeCloud::new(
        site.address().to_string(),
        remote_dir.path().to_str().unwrap().to_string(),
    );

    let scenario = DeploymentScenario::new(cloud.clone(), GitDeployCommand::new(), settings(false));
    let reports = scenario.run_with_teardown(&[SampleApp::Python]).await?;

    assert_eq!(reports.len(), 1);
    let report = &reports[0];
    assert_eq!(report.app, SampleApp::Python);
    assert_eq!(report.site_url, format!("http://{}/", site.address()));
    assert_eq!(
        report.deployed_files,
        vec!["main.py", "requirements.txt", "virtualenv_proxy.py", "web.3.4.config"]
    );
    site_mock.assert();

    let head = remote.find_reference("refs/heads/master")?.peel_to_commit()?;
    assert_eq!(head.id().to_string(), report.commit_id);

    assert_eq!(
        cloud.calls(),
        vec![
            "resource_group:it-rg".to_string(),
            "plan:it-plan".to_string(),
            "web_app:it-app:Some(Python(\"3.4\"))".to_string(),
            "publishing_profile:it-app".to_string(),
            "delete:it-rg".to_string(),
        ]
    );
    Ok(())
}

#[tokio::test]
async fn test_php_scenario_with_source_and_target_directories() -> Result<()> {
    let site = MockServer::start();
    site.mock(|when, then| {
        when.method(GET).path("/");
        then.status(200).body("Hello PHP!");
    });

    let remote_dir = TempDir::new()?;
    let remote = Repository::init_bare(remote_dir.path())?;
    let cloud = FakeCloud::new(
        site.address().to_string(),
        remote_dir.path().to_str().unwrap().to_string(),
    );

    let mut settings = settings(true);
    settings.source_directory = Some("dist".to_string());
    settings.target_directory = Some("site".to_string());
    let scenario = DeploymentScenario::new(cloud, GitDeployCommand::new(), settings);

    let report = scenario.run(SampleApp::Php).await?;
    assert_eq!(report.deployed_files, vec!["site/index.php"]);

    let head = remote.find_reference("refs/heads/master")?.peel_to_commit()?;
    let tree = head.tree()?;
    assert!(tree.get_path(std::path::Path::new("site/index.php")).is_ok());
    assert!(tree.get_path(std::path::Path::new("index.php")).is_err());
    Ok(())
}

#[tokio::test]
async fn test_all_apps_share_environment_with_suffixed_names() -> Result<()> {
    let site = MockServer::start();
    site.mock(|when, then| {
        when.method(GET).path("/");
        then.status(200)
            .body("Hello NodeJS! Hello PHP! Hello, Python!");
    });

    let cloud = FakeCloud::new(site.address().to_string(), "unused".to_string());
    let deployer = RecordingDeployer::default();
    let scenario = DeploymentScenario::new(cloud.clone(), deployer.clone(), settings(true));

    let reports = scenario.run_with_teardown(&SampleApp::ALL).await?;
    assert_eq!(reports.len(), 3);

    let calls = cloud.calls();
    assert_eq!(calls.iter().filter(|c| c.starts_with("resource_group:")).count(), 1);
    assert!(calls.contains(&"web_app:it-app-nodejs:None".to_string()));
    assert!(calls.contains(&"web_app:it-app-php:Some(Php(\"5.6\"))".to_string()));
    assert!(!calls.iter().any(|c| c.starts_with("delete:")));

    let received = deployer.received.lock().unwrap();
    let patterns: Vec<&str> = received.iter().map(|d| d.file_path.as_str()).collect();
    assert_eq!(patterns, vec!["*.js,*.json", "*.php", "*.py,*.config,requirements.txt"]);
    assert!(received.iter().all(|d| d.job_context.build_tag == "jenkins-job-1"));
    Ok(())
}

#[tokio::test]
async fn test_empty_handles_abort_before_staging() {
    for empty in [EmptyHandle::ResourceGroup, EmptyHandle::Plan, EmptyHandle::WebApp] {
        let mut cloud = FakeCloud::new("127.0.0.1:1".to_string(), "unused".to_string());
        cloud.empty = empty;
        let deployer = RecordingDeployer::default();
        let scenario = DeploymentScenario::new(cloud.clone(), deployer.clone(), settings(true));

        let err = scenario.run(SampleApp::NodeJs).await.unwrap_err();

        assert!(
            matches!(err, DeployError::ProvisioningError { .. }),
            "unexpected error for {:?}: {:?}",
            empty,
            err
        );
        assert!(deployer.received.lock().unwrap().is_empty());
        assert!(!cloud
            .calls()
            .iter()
            .any(|c| c.starts_with("publishing_profile:")));
    }
}

#[tokio::test]
async fn test_provisioning_failure_surfaces_unchanged_and_still_cleans_up() {
    let mut cloud = FakeCloud::new("127.0.0.1:1".to_string(), "unused".to_string());
    cloud.fail_web_app = true;
    let deployer = RecordingDeployer::default();
    let scenario = DeploymentScenario::new(cloud.clone(), deployer.clone(), settings(false));

    let err = scenario
        .run_with_teardown(&[SampleApp::Php])
        .await
        .unwrap_err();

    assert_eq!(
        err.to_string(),
        "Provisioning of web app it-app failed: quota exceeded"
    );
    assert!(deployer.received.lock().unwrap().is_empty());
    assert_eq!(cloud.calls().last().map(String::as_str), Some("delete:it-rg"));
}

#[tokio::test]
async fn test_never_ready_site_times_out() {
    let site = MockServer::start();
    site.mock(|when, then| {
        when.method(GET).path("/");
        then.status(500);
    });

    let cloud = FakeCloud::new(site.address().to_string(), "unused".to_string());
    let mut settings = settings(true);
    settings.verify_timeout = Duration::from_millis(400);
    let scenario = DeploymentScenario::new(cloud, RecordingDeployer::default(), settings);

    let err = scenario.run(SampleApp::Php).await.unwrap_err();

    match err {
        DeployError::Timeout { url, .. } => assert_eq!(url, format!("http://{}/", site.address())),
        other => panic!("expected timeout, got {:?}", other),
    }
}
