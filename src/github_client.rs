use crate::aggregator::{CommitQuery, CommitSource};
use crate::error::EodError;
use crate::models::{Branch, CommitWithFiles, RawCommit, RepoRef};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use serde::de::DeserializeOwned;
use std::sync::Arc;

pub const DEFAULT_API_BASE: &str = "https://api.github.com";
const CLIENT_ID: &str = "eod-assistant";

#[derive(Clone)]
pub struct GithubClient {
    client: Arc<reqwest::Client>,
    api_base: String,
}

impl GithubClient {
    pub fn new(token: &str, api_base: Option<&str>) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(CLIENT_ID));
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github.v3+json"));
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", token))
                .context("GitHub token contains characters not allowed in a header")?,
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;
        Ok(Self::from_parts(client, api_base.unwrap_or(DEFAULT_API_BASE)))
    }

    pub(crate) fn from_parts(client: reqwest::Client, api_base: &str) -> Self {
        Self {
            client: Arc::new(client),
            api_base: api_base.trim_end_matches('/').to_string(),
        }
    }

    fn repo_url(&self, repo: &RepoRef, rest: &str) -> String {
        format!("{}/repos/{}/{}/{}", self.api_base, repo.owner, repo.name, rest)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str, query: &[(&str, String)]) -> Result<T> {
        let response = self.client.get(url).query(query).send().await?;

        let status = response.status();
        if status.is_success() {
            let body = response
                .json()
                .await
                .with_context(|| format!("Unexpected response body from {}", url))?;
            Ok(body)
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(EodError::Upstream {
                service: "GitHub",
                status: status.as_u16(),
                body,
            }
            .into())
        }
    }

    /// File names touched by one commit.
    pub async fn commit_files(&self, repo: &RepoRef, sha: &str) -> Result<Vec<String>> {
        let url = self.repo_url(repo, &format!("commits/{}", sha));
        let detail: CommitWithFiles = self.get_json(&url, &[]).await?;
        Ok(detail
            .files
            .unwrap_or_default()
            .into_iter()
            .map(|f| f.filename)
            .collect())
    }
}

#[async_trait]
impl CommitSource for GithubClient {
    async fn list_branches_page(
        &self,
        repo: &RepoRef,
        page: u32,
        per_page: usize,
    ) -> Result<Vec<Branch>> {
        let url = self.repo_url(repo, "branches");
        let query = [("per_page", per_page.to_string()), ("page", page.to_string())];
        self.get_json(&url, &query).await
    }

    async fn list_commits(&self, repo: &RepoRef, query: &CommitQuery) -> Result<Vec<RawCommit>> {
        let url = self.repo_url(repo, "commits");
        self.get_json(&url, &commit_params(query)).await
    }
}

fn commit_params(query: &CommitQuery) -> Vec<(&'static str, String)> {
    let mut params = Vec::with_capacity(5);
    if let Some(branch) = query.branch.as_param() {
        params.push(("sha", branch.to_string()));
    }
    params.push(("author", query.author.clone()));
    params.push(("since", query.since.clone()));
    params.push(("until", query.until.clone()));
    params.push(("per_page", query.per_page.to_string()));
    params
}
