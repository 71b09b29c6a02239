use crate::models::{AggregatedCommit, Branch, BranchSelector, ContributionDay, RawCommit, RepoRef};
use crate::window::{contribution_window, Window};
use anyhow::Result;
use async_trait::async_trait;
use chrono::{NaiveDate, TimeZone};
use futures::future::join_all;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};

pub const PAGE_SIZE: usize = 100;
pub const BATCH_SIZE: usize = 5;

#[derive(Debug, Clone)]
pub struct CommitQuery {
    pub branch: BranchSelector,
    pub author: String,
    pub since: String,
    pub until: String,
    pub per_page: usize,
}

/// Upstream listing endpoints. A non-success response is an `Err`.
#[async_trait]
pub trait CommitSource: Send + Sync {
    async fn list_branches_page(
        &self,
        repo: &RepoRef,
        page: u32,
        per_page: usize,
    ) -> Result<Vec<Branch>>;

    async fn list_commits(&self, repo: &RepoRef, query: &CommitQuery) -> Result<Vec<RawCommit>>;
}

#[derive(Debug, Clone, Default)]
pub struct Aggregation {
    pub commits: Vec<AggregatedCommit>,
    pub failed_requests: usize,
}

#[derive(Debug, Clone)]
pub struct ContributionSeries {
    pub days: Vec<ContributionDay>,
    pub total_commits: usize,
    pub failed_requests: usize,
}

/// Walks every branch of a repository and merges the author's commits.
///
/// Upstream failures never escape: a failed page or branch contributes
/// nothing, is reported on stderr and counted in `failed_requests`.
pub struct CommitAggregator<S> {
    source: S,
    failures: AtomicUsize,
}

impl<S: CommitSource> CommitAggregator<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            failures: AtomicUsize::new(0),
        }
    }

    #[cfg(test)]
    fn source(&self) -> &S {
        &self.source
    }

    fn record_failure(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    fn take_failures(&self) -> usize {
        self.failures.swap(0, Ordering::Relaxed)
    }

    pub async fn list_branches(&self, repo: &RepoRef) -> Vec<String> {
        let mut branches = Vec::new();
        let mut page = 1;

        loop {
            let batch = match self.source.list_branches_page(repo, page, PAGE_SIZE).await {
                Ok(batch) => batch,
                Err(e) => {
                    eprintln!("Failed to list branches for {} (page {}): {:#}", repo, page, e);
                    self.record_failure();
                    break;
                }
            };
            if batch.is_empty() {
                break;
            }

            let full_page = batch.len() >= PAGE_SIZE;
            branches.extend(batch.into_iter().map(|b| b.name));
            if !full_page {
                break;
            }
            page += 1;
        }

        branches
    }

    // Only the first page is read: at most PAGE_SIZE commits per branch.
    pub async fn fetch_commits_for_branch(
        &self,
        repo: &RepoRef,
        branch: &BranchSelector,
        author: &str,
        window: &Window,
    ) -> Vec<AggregatedCommit> {
        let query = CommitQuery {
            branch: branch.clone(),
            author: author.to_string(),
            since: window.since_param(),
            until: window.until_param(),
            per_page: PAGE_SIZE,
        };

        match self.source.list_commits(repo, &query).await {
            Ok(raw) => raw.into_iter().map(AggregatedCommit::from).collect(),
            Err(e) => {
                eprintln!("Failed to fetch commits for {} on {}: {:#}", repo, branch, e);
                self.record_failure();
                Vec::new()
            }
        }
    }

    pub async fn aggregate(
        &self,
        repo: &RepoRef,
        author: &str,
        window: &Window,
    ) -> Vec<AggregatedCommit> {
        self.aggregate_with_diagnostics(repo, author, window).await.commits
    }

    pub async fn aggregate_with_diagnostics(
        &self,
        repo: &RepoRef,
        author: &str,
        window: &Window,
    ) -> Aggregation {
        let commits = self.collect(repo, author, window).await;
        Aggregation {
            commits,
            failed_requests: self.take_failures(),
        }
    }

    async fn collect(
        &self,
        repo: &RepoRef,
        author: &str,
        window: &Window,
    ) -> Vec<AggregatedCommit> {
        let branches = self.list_branches(repo).await;

        if branches.is_empty() {
            return self
                .fetch_commits_for_branch(repo, &BranchSelector::Default, author, window)
                .await;
        }

        let mut seen = HashSet::new();
        let mut all_commits = Vec::new();

        for batch in branches.chunks(BATCH_SIZE) {
            let selectors: Vec<_> = batch.iter().cloned().map(BranchSelector::Named).collect();
            let results = join_all(
                selectors
                    .iter()
                    .map(|branch| self.fetch_commits_for_branch(repo, branch, author, window)),
            )
            .await;

            for commit in results.into_iter().flatten() {
                if seen.insert(commit.full_sha.clone()) {
                    all_commits.push(commit);
                }
            }
        }

        all_commits.sort_by(|a, b| b.date.cmp(&a.date));
        all_commits
    }

    pub async fn build_contribution_series<Tz: TimeZone>(
        &self,
        repo: &RepoRef,
        author: &str,
        weeks: u32,
        today: NaiveDate,
        tz: &Tz,
    ) -> ContributionSeries {
        let window = contribution_window(today, weeks, tz);
        let aggregation = self.aggregate_with_diagnostics(repo, author, &window).await;

        // Bucket in the zone that drew the window so every commit lands on a listed day.
        let mut counts: HashMap<NaiveDate, u32> = HashMap::new();
        for commit in &aggregation.commits {
            let day = commit.date.with_timezone(tz).date_naive();
            *counts.entry(day).or_insert(0) += 1;
        }

        let days = window
            .days()
            .map(|date| ContributionDay {
                date,
                count: counts.get(&date).copied().unwrap_or(0),
            })
            .collect();

        ContributionSeries {
            days,
            total_commits: aggregation.commits.len(),
            failed_requests: aggregation.failed_requests,
        }
    }
}
