use super::archive::load_zip_bytes;
use super::{LoadedSource, SourceKind};
use crate::errors::PackError;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use std::env;
use tracing::{debug, info};

const API_BASE: &str = "https://api.github.com";
const API_VERSION: &str = "2022-11-28";
const DEFAULT_REF: &str = "main";

static REPO_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^https?://github\.com/([^/]+)/([^/]+)(?:/|$)").expect("repo url regex is valid")
});
static REPO_SLUG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([^/]+)/([^/]+)$").expect("repo slug regex is valid"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoRef {
    pub owner: String,
    pub repo: String,
}

impl std::fmt::Display for RepoRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

/// Accepts `owner/repo` or a `https://github.com/owner/repo[/...]` URL.
pub fn parse_repo(input: &str) -> Result<RepoRef, PackError> {
    let input = input.trim();
    let captures = REPO_URL
        .captures(input)
        .or_else(|| REPO_SLUG.captures(input))
        .ok_or_else(|| PackError::InvalidRepository(input.to_owned()))?;
    let repo = captures[2].trim_end_matches(".git");
    Ok(RepoRef {
        owner: captures[1].to_owned(),
        repo: repo.to_owned(),
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RepoInfo {
    pub full_name: String,
    pub default_branch: String,
}

#[derive(Debug, Deserialize)]
struct BranchEntry {
    name: String,
}

/// Branch listing in one canonical shape: plain names plus the default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BranchList {
    pub owner: String,
    pub repo: String,
    pub default_branch: String,
    pub branches: Vec<String>,
}

impl BranchList {
    /// The default branch if listed, else `main`, else `master`, else the
    /// first branch, else `main`.
    pub fn preferred(&self) -> String {
        [self.default_branch.as_str(), "main", "master"]
            .into_iter()
            .find(|candidate| self.branches.iter().any(|b| b == candidate))
            .map(str::to_owned)
            .or_else(|| self.branches.first().cloned())
            .unwrap_or_else(|| DEFAULT_REF.to_owned())
    }
}

pub struct GitHubClient {
    client: Client,
    token: Option<String>,
    api_base: String,
}

impl GitHubClient {
    pub fn new(token: Option<String>) -> Self {
        GitHubClient {
            client: Client::new(),
            token: token.filter(|t| !t.trim().is_empty()),
            api_base: API_BASE.to_owned(),
        }
    }

    /// Reads the token from `GITHUB_TOKEN`, then `GITHUB_FINE_GRAINED_TOKEN`.
    pub fn from_env() -> Self {
        let token = env::var("GITHUB_TOKEN")
            .or_else(|_| env::var("GITHUB_FINE_GRAINED_TOKEN"))
            .ok();
        Self::new(token)
    }

    /// Points the client at another API root, e.g. a GitHub Enterprise host.
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_owned();
        self
    }

    async fn get(&self, path: &str) -> Result<Response, PackError> {
        let url = format!("{}{}", self.api_base, path);
        debug!("GET {}", url);
        let mut request = self
            .client
            .get(&url)
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", API_VERSION)
            .header("User-Agent", concat!("promptpack/", env!("CARGO_PKG_VERSION")));
        if let Some(token) = &self.token {
            request = request.header("Authorization", format!("Bearer {}", token));
        }
        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PackError::GitHubError {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    pub async fn repository(&self, repo: &RepoRef) -> Result<RepoInfo, PackError> {
        let response = self.get(&format!("/repos/{}/{}", repo.owner, repo.repo)).await?;
        Ok(response.json().await?)
    }

    pub async fn branches(&self, repo: &RepoRef) -> Result<BranchList, PackError> {
        let info = self.repository(repo).await?;
        let response = self
            .get(&format!("/repos/{}/{}/branches?per_page=100", repo.owner, repo.repo))
            .await?;
        let entries: Vec<BranchEntry> = response.json().await?;
        Ok(BranchList {
            owner: repo.owner.clone(),
            repo: repo.repo.clone(),
            default_branch: info.default_branch,
            branches: entries.into_iter().map(|b| b.name).collect(),
        })
    }

    pub async fn archive(&self, repo: &RepoRef, git_ref: Option<&str>) -> Result<Vec<u8>, PackError> {
        let git_ref = git_ref.unwrap_or(DEFAULT_REF);
        let response = self
            .get(&format!("/repos/{}/{}/zipball/{}", repo.owner, repo.repo, git_ref))
            .await?;
        let bytes = response.bytes().await?;
        info!("Downloaded {} archive at {} ({} bytes)", repo, git_ref, bytes.len());
        Ok(bytes.to_vec())
    }
}

/// Downloads the repository archive at `git_ref` and reads it like a ZIP upload.
pub async fn load_github(
    client: &GitHubClient,
    repo: &RepoRef,
    git_ref: Option<&str>,
) -> Result<LoadedSource, PackError> {
    let bytes = client.archive(repo, git_ref).await?;
    load_zip_bytes(bytes, SourceKind::GitHub, repo.to_string()).await
}
