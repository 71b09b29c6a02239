use crate::aggregator::{CommitAggregator, BATCH_SIZE};
use crate::config::{JiraCredentials, Settings};
use crate::error::EodError;
use crate::github_client::GithubClient;
use crate::jira::{JiraClient, JiraTicket};
use crate::models::{AggregatedCommit, CommitsReport, ContributionsReport, DateRange, RepoRef, TicketsReport};
use crate::window::day_window;
use crate::{slack, summary};
use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Args, Parser, Subcommand};
use futures::future::join_all;
use std::future::Future;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "eod-assist")]
#[command(about = "Collect a day's GitHub commits across all branches for an end-of-day report")]
#[command(version)]
pub struct Cli {
    #[clap(flatten)]
    pub common: CommonArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args, Clone)]
pub struct CommonArgs {
    #[arg(long, global = true, help = "GitHub token (defaults to GITHUB_TOKEN)")]
    pub token: Option<String>,

    #[arg(long, global = true, help = "GitHub API base URL (defaults to GITHUB_API_BASE or api.github.com)")]
    pub api_base: Option<String>,

    #[arg(long, global = true, default_value_t = 60, help = "Give up on GitHub or Jira after this many seconds")]
    pub timeout_secs: u64,
}

#[derive(Args, Clone)]
pub struct RepoArgs {
    #[arg(long, help = "Repository owner or organization")]
    pub owner: Option<String>,

    #[arg(long, help = "Repository name, owner/repo, or GitHub URL")]
    pub repo: Option<String>,

    #[arg(long, help = "Commit author login (defaults to GITHUB_USERNAME)")]
    pub author: Option<String>,
}

#[derive(Args, Clone)]
pub struct JiraArgs {
    #[arg(long = "jira-domain", help = "Jira site, e.g. acme.atlassian.net (defaults to JIRA_DOMAIN)")]
    pub domain: Option<String>,

    #[arg(long = "jira-project", help = "Jira project key")]
    pub project: Option<String>,

    #[arg(long = "jira-assignee", help = "Ticket assignee (defaults to JIRA_EMAIL)")]
    pub assignee: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Commits authored on one day, deduplicated across branches
    Commits {
        #[clap(flatten)]
        target: RepoArgs,
        #[arg(long, help = "Day to report (YYYY-MM-DD, defaults to today)")]
        date: Option<String>,
        #[arg(long, help = "Also list the files each commit touched")]
        files: bool,
        #[arg(long, help = "Output as JSON")]
        json: bool,
        #[arg(long, help = "Post the summary to Slack")]
        post: bool,
        #[arg(long, help = "Slack webhook URL (defaults to SLACK_WEBHOOK_URL)")]
        webhook: Option<String>,
        #[clap(flatten)]
        jira: JiraArgs,
    },
    /// Per-day commit counts for a heatmap
    Contributions {
        #[clap(flatten)]
        target: RepoArgs,
        #[arg(long, default_value_t = 12, help = "Number of weeks to cover")]
        weeks: u32,
        #[arg(long, help = "Output as JSON")]
        json: bool,
    },
    /// In-progress Jira tickets of a project
    Tickets {
        #[clap(flatten)]
        jira: JiraArgs,
        #[arg(long, help = "Output as JSON")]
        json: bool,
    },
    /// Post a message to a Slack webhook
    Post {
        #[arg(long, help = "Slack webhook URL (defaults to SLACK_WEBHOOK_URL)")]
        webhook: Option<String>,
        message: String,
    },
}

struct Target {
    repo: RepoRef,
    author: String,
}

fn resolve_target(settings: &Settings, args: RepoArgs) -> Result<Target, EodError> {
    let repo = match (args.owner.as_deref(), args.repo.as_deref()) {
        (Some(owner), Some(repo)) => RepoRef::parse(owner, repo)?,
        _ => return Err(EodError::MissingRepo),
    };
    let author = settings.author(args.author)?;
    Ok(Target { repo, author })
}

struct JiraQuery {
    domain: String,
    credentials: JiraCredentials,
    project: String,
    assignee: String,
}

impl JiraQuery {
    async fn fetch(&self) -> Result<Vec<JiraTicket>> {
        let client = JiraClient::new(&self.domain, &self.credentials.email, &self.credentials.api_token)?;
        client
            .in_progress_tickets(&self.project, Some(&self.assignee))
            .await
            .with_context(|| format!("Failed to fetch Jira tickets for {}", self.project))
    }
}

fn resolve_jira(settings: &Settings, args: JiraArgs) -> Result<JiraQuery, EodError> {
    let credentials = settings.jira_credentials()?;
    let domain = settings.jira_domain(args.domain)?;
    let project = args
        .project
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .ok_or(EodError::MissingJiraProject)?;
    let assignee = args
        .assignee
        .filter(|a| !a.trim().is_empty())
        .unwrap_or_else(|| credentials.email.clone());
    Ok(JiraQuery {
        domain,
        credentials,
        project,
        assignee,
    })
}

fn parse_date(raw: Option<&str>) -> Result<NaiveDate, EodError> {
    match raw {
        Some(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .map_err(|_| EodError::InvalidDate(s.to_string())),
        None => Ok(Local::now().date_naive()),
    }
}

async fn with_timeout<T>(secs: u64, fut: impl Future<Output = T>) -> Result<T, EodError> {
    tokio::time::timeout(Duration::from_secs(secs), fut)
        .await
        .map_err(|_| EodError::Timeout(secs))
}

impl Cli {
    pub async fn execute(self, settings: Settings) -> Result<()> {
        let common = self.common;
        match self.command {
            Commands::Commits {
                target,
                date,
                files,
                json,
                post,
                webhook,
                jira,
            } => {
                let token = settings.token(common.token.clone())?;
                let target = resolve_target(&settings, target)?;
                let date = parse_date(date.as_deref())?;
                let webhook = if post {
                    Some(settings.webhook(webhook)?)
                } else {
                    None
                };
                let jira = if jira.project.is_some() {
                    Some(resolve_jira(&settings, jira)?)
                } else {
                    None
                };
                let client = github_client(&settings, &common, &token)?;
                let mut report = commits(&client, &common, &target, date, files).await?;
                if let Some(jira) = jira {
                    report.tickets = Some(with_timeout(common.timeout_secs, jira.fetch()).await??);
                }

                let text = summary::commits_text(&report, &date.to_string());
                if json {
                    println!("{}", serde_json::to_string_pretty(&report)?);
                } else {
                    print!("{}", text);
                }

                if let Some(webhook) = webhook {
                    slack::post_message(&reqwest::Client::new(), &webhook, &text).await?;
                    eprintln!("Posted summary to Slack");
                }
                Ok(())
            }
            Commands::Contributions { target, weeks, json } => {
                let token = settings.token(common.token.clone())?;
                let target = resolve_target(&settings, target)?;
                let client = github_client(&settings, &common, &token)?;
                let aggregator = CommitAggregator::new(client);

                let today = Local::now().date_naive();
                let series = with_timeout(
                    common.timeout_secs,
                    aggregator.build_contribution_series(&target.repo, &target.author, weeks, today, &Local),
                )
                .await?;

                let report = ContributionsReport {
                    contributions: series.days,
                    total_commits: series.total_commits,
                    repo: target.repo.to_string(),
                    author: target.author,
                    weeks,
                    failed_requests: series.failed_requests,
                };
                if json {
                    println!("{}", serde_json::to_string_pretty(&report)?);
                } else {
                    print!("{}", summary::contributions_text(&report));
                }
                Ok(())
            }
            Commands::Tickets { jira, json } => {
                let query = resolve_jira(&settings, jira)?;
                let tickets = with_timeout(common.timeout_secs, query.fetch()).await??;

                let report = TicketsReport {
                    tickets,
                    project: query.project,
                    assignee: query.assignee,
                };
                if json {
                    println!("{}", serde_json::to_string_pretty(&report)?);
                } else {
                    print!("{}", summary::tickets_text(&report));
                }
                Ok(())
            }
            Commands::Post { webhook, message } => {
                let webhook = settings.webhook(webhook)?;
                slack::post_message(&reqwest::Client::new(), &webhook, &message).await?;
                println!("Posted to Slack");
                Ok(())
            }
        }
    }
}

fn github_client(settings: &Settings, common: &CommonArgs, token: &str) -> Result<GithubClient> {
    let api_base = common
        .api_base
        .as_deref()
        .or(settings.github_api_base.as_deref());
    GithubClient::new(token, api_base)
}

async fn commits(
    client: &GithubClient,
    common: &CommonArgs,
    target: &Target,
    date: NaiveDate,
    with_files: bool,
) -> Result<CommitsReport> {
    let window = day_window(date, &Local);
    let aggregator = CommitAggregator::new(client.clone());
    let gather = async {
        let mut aggregation = aggregator
            .aggregate_with_diagnostics(&target.repo, &target.author, &window)
            .await;
        if with_files {
            aggregation.failed_requests +=
                attach_files(client, &target.repo, &mut aggregation.commits).await;
        }
        aggregation
    };
    let aggregation = with_timeout(common.timeout_secs, gather).await?;

    Ok(CommitsReport {
        commits: aggregation.commits,
        repo: target.repo.to_string(),
        author: target.author.clone(),
        all_branches: true,
        date_range: DateRange {
            since: window.since_param(),
            until: window.until_param(),
        },
        failed_requests: aggregation.failed_requests,
        tickets: None,
    })
}

/// Fills `files_changed` batch by batch; returns how many lookups failed.
async fn attach_files(client: &GithubClient, repo: &RepoRef, commits: &mut [AggregatedCommit]) -> usize {
    let mut failures = 0;
    for batch in commits.chunks_mut(BATCH_SIZE) {
        let results = join_all(
            batch
                .iter()
                .map(|commit| client.commit_files(repo, &commit.full_sha)),
        )
        .await;
        for (commit, result) in batch.iter_mut().zip(results) {
            match result {
                Ok(files) => commit.files_changed = Some(files),
                Err(e) => {
                    eprintln!("Failed to fetch files for commit {}: {:#}", commit.sha, e);
                    failures += 1;
                }
            }
        }
    }
    failures
}
