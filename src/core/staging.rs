use crate::domain::model::SampleApp;
use crate::utils::error::{DeployError, Result};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// 內嵌的樣本檔案：(檔名, 內容)
pub type SampleFile = (&'static str, &'static str);

const NODEJS_FILES: &[SampleFile] = &[
    ("index.js", include_str!("../../assets/sample-nodejs-app/index.js")),
    ("package.json", include_str!("../../assets/sample-nodejs-app/package.json")),
    ("process.json", include_str!("../../assets/sample-nodejs-app/process.json")),
];

const PHP_FILES: &[SampleFile] = &[("index.php", include_str!("../../assets/sample-php-app/index.php"))];

const PYTHON_FILES: &[SampleFile] = &[
    ("main.py", include_str!("../../assets/sample-python-app/main.py")),
    (
        "virtualenv_proxy.py",
        include_str!("../../assets/sample-python-app/virtualenv_proxy.py"),
    ),
    (
        "requirements.txt",
        include_str!("../../assets/sample-python-app/requirements.txt"),
    ),
    (
        "web.3.4.config",
        include_str!("../../assets/sample-python-app/web.3.4.config"),
    ),
];

pub fn sample_files(app: SampleApp) -> &'static [SampleFile] {
    match app {
        SampleApp::NodeJs => NODEJS_FILES,
        SampleApp::Php => PHP_FILES,
        SampleApp::Python => PYTHON_FILES,
    }
}

/// 已經寫入工作目錄的部署內容
#[derive(Debug, Clone)]
pub struct StagedPayload {
    pub app: SampleApp,
    pub workspace: PathBuf,
    pub files: Vec<String>,
    pub pattern: String,
}

/// 暫存工作目錄，drop 時自動刪除
pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    pub fn create() -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix("appservice-deploy-")
            .tempdir()?;
        tracing::debug!("Created workspace {}", dir.path().display());
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }
}

/// 把樣本檔案複製到工作目錄，並確認每個檔案都已落地
pub fn stage_sample_app(app: SampleApp, workspace: &Path) -> Result<StagedPayload> {
    let mut files = Vec::new();

    for (name, contents) in sample_files(app) {
        let target = workspace.join(name);
        std::fs::write(&target, contents)?;

        if !target.is_file() {
            return Err(DeployError::staging(format!(
                "{} was not written to {}",
                name,
                workspace.display()
            )));
        }
        tracing::debug!("Staged {} ({} bytes)", name, contents.len());
        files.push(name.to_string());
    }

    files.sort();
    tracing::info!(
        "📦 Staged {} file(s) for the {} sample into {}",
        files.len(),
        app,
        workspace.display()
    );

    Ok(StagedPayload {
        app,
        workspace: workspace.to_path_buf(),
        files,
        pattern: app.file_pattern().to_string(),
    })
}
