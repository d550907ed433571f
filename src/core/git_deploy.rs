use crate::core::selection::FileSelector;
use crate::domain::model::{DeployOutcome, GitDeployCommandData, PublishingProfile};
use crate::domain::ports::Deployer;
use crate::utils::error::{DeployError, Result};
use async_trait::async_trait;
use git2::{
    Commit, Cred, ErrorCode, FetchOptions, PushOptions, RemoteCallbacks, Repository, Signature,
};
use std::path::{Path, PathBuf};

const REMOTE_NAME: &str = "origin";
const COMMITTER_NAME: &str = "appservice-git-deploy";
const COMMITTER_EMAIL: &str = "appservice-git-deploy@localhost";
const MAX_CREDENTIAL_ATTEMPTS: u32 = 3;

/// 透過 Web App 的 Local Git 端點部署
///
/// 先抓取遠端分支，把上一版的檔案樹載入索引，再放入這次選到的檔案、
/// 以 `Deploy {BUILD_TAG}` 提交並推送。遠端是空倉庫時直接建立第一個提交。
#[derive(Debug, Clone, Default)]
pub struct GitDeployCommand;

impl GitDeployCommand {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Deployer for GitDeployCommand {
    async fn execute(&self, data: &GitDeployCommandData) -> Result<DeployOutcome> {
        let data = data.clone();
        tokio::task::spawn_blocking(move || deploy(&data))
            .await
            .map_err(|e| DeployError::deployment(format!("Deploy task aborted: {}", e)))?
    }
}

fn remote_callbacks(profile: &PublishingProfile) -> RemoteCallbacks<'_> {
    let mut callbacks = RemoteCallbacks::new();
    let mut attempts = 0;
    callbacks.credentials(move |_url, _username_from_url, _allowed| {
        attempts += 1;
        if attempts > MAX_CREDENTIAL_ATTEMPTS {
            return Err(git2::Error::from_str(
                "publishing credentials were rejected by the remote",
            ));
        }
        Cred::userpass_plaintext(&profile.git_username, &profile.git_password)
    });
    callbacks
}

fn source_root(data: &GitDeployCommandData) -> PathBuf {
    match data.source_directory.as_deref().map(str::trim) {
        Some(dir) if !dir.is_empty() => data.job_context.workspace.join(dir),
        _ => data.job_context.workspace.clone(),
    }
}

fn target_path(target_directory: Option<&str>, file: &str) -> String {
    match target_directory.map(|d| d.trim().trim_matches('/')) {
        Some(dir) if !dir.is_empty() => format!("{}/{}", dir, file),
        _ => file.to_string(),
    }
}

fn deploy(data: &GitDeployCommandData) -> Result<DeployOutcome> {
    let source = source_root(data);
    let selector = FileSelector::parse(&data.file_path)?;
    let files = selector.select(&source)?;

    if files.is_empty() {
        return Err(DeployError::deployment(format!(
            "No files in {} match '{}'",
            source.display(),
            data.file_path
        )));
    }
    tracing::info!(
        "🚚 Deploying {} file(s) to {} via git",
        files.len(),
        data.web_app.name
    );

    let clone_dir = tempfile::Builder::new()
        .prefix("appservice-git-")
        .tempdir()?;
    let repo = Repository::init(clone_dir.path())?;
    let mut remote = repo.remote(REMOTE_NAME, &data.publishing_profile.git_url)?;
    let profile = &data.publishing_profile;

    let tracking_ref = format!("refs/remotes/{}/{}", REMOTE_NAME, data.branch);
    let mut fetch_options = FetchOptions::new();
    fetch_options.remote_callbacks(remote_callbacks(profile));
    remote.fetch(
        &[format!("+refs/heads/*:refs/remotes/{}/*", REMOTE_NAME)],
        Some(&mut fetch_options),
        None,
    )?;

    let parent = match repo.find_reference(&tracking_ref) {
        Ok(reference) => Some(reference.peel_to_commit()?),
        Err(e) if e.code() == ErrorCode::NotFound => None,
        Err(e) => return Err(e.into()),
    };
    match &parent {
        Some(commit) => tracing::debug!("Remote {} is at {}", data.branch, commit.id()),
        None => tracing::debug!("Remote has no {} branch yet", data.branch),
    }

    let mut index = repo.index()?;
    if let Some(commit) = &parent {
        index.read_tree(&commit.tree()?)?;
    }

    let mut deployed = Vec::with_capacity(files.len());
    for file in &files {
        let relative = target_path(data.target_directory.as_deref(), file);
        let destination = clone_dir.path().join(&relative);
        if let Some(dir) = destination.parent() {
            std::fs::create_dir_all(dir)?;
        }
        std::fs::copy(source.join(file), &destination)?;
        index.add_path(Path::new(&relative))?;
        tracing::debug!("Added {}", relative);
        deployed.push(relative);
    }
    index.write()?;

    let tree = repo.find_tree(index.write_tree()?)?;
    let signature = Signature::now(COMMITTER_NAME, COMMITTER_EMAIL)?;
    let message = format!("Deploy {}", data.job_context.build_tag);
    let parents: Vec<&Commit> = parent.iter().collect();
    let commit_id = repo.commit(None, &signature, &signature, &message, &tree, &parents)?;

    let local_ref = format!("refs/heads/{}", data.branch);
    repo.reference(&local_ref, commit_id, true, &message)?;

    let mut rejected = Vec::new();
    {
        let mut callbacks = remote_callbacks(profile);
        callbacks.push_update_reference(|refname, status| {
            if let Some(status) = status {
                rejected.push(format!("{}: {}", refname, status));
            }
            Ok(())
        });
        let mut push_options = PushOptions::new();
        push_options.remote_callbacks(callbacks);
        remote.push(
            &[format!("{}:{}", local_ref, local_ref)],
            Some(&mut push_options),
        )?;
    }

    if !rejected.is_empty() {
        return Err(DeployError::deployment(format!(
            "Remote rejected the push: {}",
            rejected.join(", ")
        )));
    }

    tracing::info!("✅ Pushed {} ({})", commit_id, message);
    Ok(DeployOutcome {
        commit_id: commit_id.to_string(),
        files: deployed,
    })
}
