use thiserror::Error;

pub type Result<T> = std::result::Result<T, EodError>;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum EodError {
    #[error("GitHub token not configured. Set GITHUB_TOKEN or pass --token.")]
    MissingToken,
    #[error("GitHub username not configured. Set GITHUB_USERNAME or pass --author.")]
    MissingAuthor,
    #[error("owner and repo are required")]
    MissingRepo,
    #[error("Slack webhook URL is required. Set SLACK_WEBHOOK_URL or pass --webhook.")]
    MissingWebhook,
    #[error("Jira credentials not configured. Set JIRA_EMAIL and JIRA_API_TOKEN.")]
    MissingJiraCredentials,
    #[error("Jira domain and project key are required")]
    MissingJiraProject,
    #[error("Invalid date: {0}")]
    InvalidDate(String),
    #[error("{service} API error ({status}): {body}")]
    Upstream {
        service: &'static str,
        status: u16,
        body: String,
    },
    #[error("Timed out after {0}s waiting for upstream")]
    Timeout(u64),
}
