use crate::error::{EodError, Result};
use std::env;

/// Credentials and endpoints read from the environment (and `.env`).
/// Empty variables are treated as unset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Settings {
    pub github_token: Option<String>,
    pub github_username: Option<String>,
    pub github_api_base: Option<String>,
    pub slack_webhook_url: Option<String>,
    pub jira_email: Option<String>,
    pub jira_api_token: Option<String>,
    pub jira_domain: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JiraCredentials {
    pub email: String,
    pub api_token: String,
}

impl Settings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        Self {
            github_token: get("GITHUB_TOKEN"),
            github_username: get("GITHUB_USERNAME"),
            github_api_base: get("GITHUB_API_BASE"),
            slack_webhook_url: get("SLACK_WEBHOOK_URL").or_else(|| get("SLACK_DEFAULT_WEBHOOK_URL")),
            jira_email: get("JIRA_EMAIL"),
            jira_api_token: get("JIRA_API_TOKEN"),
            jira_domain: get("JIRA_DOMAIN"),
        }
    }

    /// Flags win over the environment.
    pub fn token(&self, flag: Option<String>) -> Result<String> {
        pick(flag, &self.github_token).ok_or(EodError::MissingToken)
    }

    pub fn author(&self, flag: Option<String>) -> Result<String> {
        pick(flag, &self.github_username).ok_or(EodError::MissingAuthor)
    }

    pub fn webhook(&self, flag: Option<String>) -> Result<String> {
        pick(flag, &self.slack_webhook_url).ok_or(EodError::MissingWebhook)
    }

    pub fn jira_credentials(&self) -> Result<JiraCredentials> {
        match (&self.jira_email, &self.jira_api_token) {
            (Some(email), Some(api_token)) => Ok(JiraCredentials {
                email: email.clone(),
                api_token: api_token.clone(),
            }),
            _ => Err(EodError::MissingJiraCredentials),
        }
    }

    pub fn jira_domain(&self, flag: Option<String>) -> Result<String> {
        pick(flag, &self.jira_domain).ok_or(EodError::MissingJiraProject)
    }
}

fn pick(flag: Option<String>, fallback: &Option<String>) -> Option<String> {
    flag.map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .or_else(|| fallback.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn settings(vars: &[(&str, &str)]) -> Settings {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn blank_values_count_as_missing() {
        let s = settings(&[("GITHUB_TOKEN", "  "), ("GITHUB_USERNAME", "octocat")]);
        assert_eq!(s.github_token, None);
        assert_eq!(s.token(None), Err(EodError::MissingToken));
        assert_eq!(s.author(None), Ok("octocat".to_string()));
    }

    #[test]
    fn flag_overrides_environment() {
        let s = settings(&[("GITHUB_USERNAME", "octocat")]);
        assert_eq!(s.author(Some("hubot".into())), Ok("hubot".to_string()));
        assert_eq!(s.author(Some("".into())), Ok("octocat".to_string()));
        assert_eq!(s.webhook(None), Err(EodError::MissingWebhook));
    }

    #[test]
    fn legacy_slack_variable_is_a_fallback() {
        let s = settings(&[("SLACK_DEFAULT_WEBHOOK_URL", "https://hooks.slack.com/old")]);
        assert_eq!(s.webhook(None), Ok("https://hooks.slack.com/old".to_string()));

        let s = settings(&[
            ("SLACK_WEBHOOK_URL", "https://hooks.slack.com/new"),
            ("SLACK_DEFAULT_WEBHOOK_URL", "https://hooks.slack.com/old"),
        ]);
        assert_eq!(s.webhook(None), Ok("https://hooks.slack.com/new".to_string()));
    }

    #[test]
    fn jira_needs_both_email_and_token() {
        let s = settings(&[("JIRA_EMAIL", "dev@acme.io")]);
        assert_eq!(s.jira_credentials(), Err(EodError::MissingJiraCredentials));

        let s = settings(&[("JIRA_EMAIL", "dev@acme.io"), ("JIRA_API_TOKEN", "secret")]);
        assert_eq!(s.jira_credentials().unwrap().email, "dev@acme.io");
        assert_eq!(s.jira_domain(None), Err(EodError::MissingJiraProject));
    }
}
