use crate::error::{EodError, Result};
use crate::jira::JiraTicket;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoRef {
    pub owner: String,
    pub name: String,
}

impl RepoRef {
    /// Accepts a bare repo name, `owner/repo`, or a full GitHub URL for the
    /// repository and keeps only the repo segment.
    pub fn parse(owner: &str, raw_repo: &str) -> Result<Self> {
        let owner = owner.trim();
        let name = sanitize_repo(raw_repo);
        if owner.is_empty() || name.is_empty() {
            return Err(EodError::MissingRepo);
        }
        Ok(Self {
            owner: owner.to_string(),
            name,
        })
    }
}

fn sanitize_repo(raw: &str) -> String {
    let cleaned = raw.trim().trim_end_matches('/');

    if let Some(idx) = cleaned.find("github.com/") {
        let mut segments = cleaned[idx + "github.com/".len()..]
            .split('/')
            .filter(|s| !s.is_empty());
        if let (Some(_owner), Some(repo)) = (segments.next(), segments.next()) {
            return repo.to_string();
        }
    }

    if cleaned.contains('/') {
        return cleaned
            .split('/')
            .filter(|s| !s.is_empty())
            .last()
            .unwrap_or_default()
            .to_string();
    }

    cleaned.to_string()
}

impl fmt::Display for RepoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// Which ref a commit listing walks. `Default` leaves the `sha` parameter
/// off so upstream uses the repository's default branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BranchSelector {
    Named(String),
    Default,
}

impl BranchSelector {
    pub fn as_param(&self) -> Option<&str> {
        match self {
            BranchSelector::Named(name) => Some(name),
            BranchSelector::Default => None,
        }
    }
}

impl fmt::Display for BranchSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BranchSelector::Named(name) => f.write_str(name),
            BranchSelector::Default => f.write_str("<default>"),
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct Branch {
    pub name: String,
}

#[derive(Deserialize, Debug, Clone)]
pub struct RawCommit {
    pub sha: String,
    pub html_url: String,
    pub commit: CommitDetails,
}

#[derive(Deserialize, Debug, Clone)]
pub struct CommitDetails {
    pub message: String,
    pub author: CommitAuthor,
}

#[derive(Deserialize, Debug, Clone)]
pub struct CommitAuthor {
    pub date: DateTime<Utc>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct CommitWithFiles {
    #[serde(default)]
    pub files: Option<Vec<ChangedFile>>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct ChangedFile {
    pub filename: String,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedCommit {
    pub sha: String,
    pub full_sha: String,
    pub message: String,
    pub date: DateTime<Utc>,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub files_changed: Option<Vec<String>>,
}

impl From<RawCommit> for AggregatedCommit {
    fn from(raw: RawCommit) -> Self {
        let short = raw.sha.get(..7).unwrap_or(&raw.sha).to_string();
        let message = raw.commit.message.lines().next().unwrap_or("").to_string();
        Self {
            sha: short,
            full_sha: raw.sha,
            message,
            date: raw.commit.author.date,
            url: raw.html_url,
            files_changed: None,
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct ContributionDay {
    #[serde(with = "day_format")]
    pub date: NaiveDate,
    pub count: u32,
}

mod day_format {
    use chrono::NaiveDate;
    use serde::Serializer;

    pub fn serialize<S: Serializer>(date: &NaiveDate, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(&date.format("%Y-%m-%d"))
    }
}

#[derive(Serialize, Debug, Clone)]
pub struct DateRange {
    pub since: String,
    pub until: String,
}

#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CommitsReport {
    pub commits: Vec<AggregatedCommit>,
    pub repo: String,
    pub author: String,
    pub all_branches: bool,
    pub date_range: DateRange,
    pub failed_requests: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tickets: Option<Vec<JiraTicket>>,
}

#[derive(Serialize, Debug, Clone)]
pub struct TicketsReport {
    pub tickets: Vec<JiraTicket>,
    pub project: String,
    pub assignee: String,
}

#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ContributionsReport {
    pub contributions: Vec<ContributionDay>,
    pub total_commits: usize,
    pub repo: String,
    pub author: String,
    pub weeks: u32,
    pub failed_requests: usize,
}
