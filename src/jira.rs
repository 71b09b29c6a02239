use crate::error::EodError;
use anyhow::{Context, Result};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use serde::{Deserialize, Serialize};

const MAX_RESULTS: u32 = 50;

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct JiraTicket {
    pub key: String,
    pub summary: String,
    pub status: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
}

#[derive(Deserialize, Debug)]
struct SearchResponse {
    #[serde(default)]
    issues: Vec<Issue>,
}

#[derive(Deserialize, Debug)]
struct Issue {
    key: String,
    fields: IssueFields,
}

#[derive(Deserialize, Debug)]
struct IssueFields {
    summary: String,
    status: Named,
    issuetype: Named,
    #[serde(default)]
    priority: Option<Named>,
}

#[derive(Deserialize, Debug)]
struct Named {
    name: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SearchRequest<'a> {
    jql: &'a str,
    fields: [&'a str; 4],
    max_results: u32,
}

/// `acme.atlassian.net` from a pasted URL or bare host.
pub fn sanitize_domain(raw: &str) -> String {
    let trimmed = raw.trim();
    let without_scheme = trimmed
        .strip_prefix("https://")
        .or_else(|| trimmed.strip_prefix("http://"))
        .unwrap_or(trimmed);
    without_scheme.trim_end_matches('/').to_string()
}

/// In-progress issues of a project, most recently updated first.
pub fn build_jql(project_key: &str, assignee: Option<&str>) -> String {
    let mut conditions = vec![
        format!("project = \"{}\"", project_key),
        "status = \"In Progress\"".to_string(),
    ];
    if let Some(assignee) = assignee {
        conditions.push(format!("assignee = \"{}\"", assignee));
    }
    format!("{} ORDER BY updated DESC", conditions.join(" AND "))
}

pub struct JiraClient {
    client: reqwest::Client,
    base_url: String,
    domain: String,
    email: String,
    api_token: String,
}

impl JiraClient {
    pub fn new(domain: &str, email: &str, api_token: &str) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;
        let domain = sanitize_domain(domain);
        Ok(Self::from_parts(client, &format!("https://{}", domain), &domain, email, api_token))
    }

    fn from_parts(
        client: reqwest::Client,
        base_url: &str,
        domain: &str,
        email: &str,
        api_token: &str,
    ) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            domain: domain.to_string(),
            email: email.to_string(),
            api_token: api_token.to_string(),
        }
    }

    pub async fn in_progress_tickets(
        &self,
        project_key: &str,
        assignee: Option<&str>,
    ) -> Result<Vec<JiraTicket>> {
        let jql = build_jql(project_key, assignee);
        let url = format!("{}/rest/api/3/search/jql", self.base_url);

        let response = self
            .client
            .post(&url)
            .basic_auth(&self.email, Some(&self.api_token))
            .json(&SearchRequest {
                jql: &jql,
                fields: ["summary", "status", "issuetype", "priority"],
                max_results: MAX_RESULTS,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EodError::Upstream {
                service: "Jira",
                status: status.as_u16(),
                body,
            }
            .into());
        }

        let search: SearchResponse = response
            .json()
            .await
            .with_context(|| format!("Unexpected response body from {}", url))?;
        Ok(search
            .issues
            .into_iter()
            .map(|issue| to_ticket(issue, &self.domain))
            .collect())
    }
}

fn to_ticket(issue: Issue, domain: &str) -> JiraTicket {
    JiraTicket {
        url: format!("https://{}/browse/{}", domain, issue.key),
        key: issue.key,
        summary: issue.fields.summary,
        status: issue.fields.status.name,
        kind: issue.fields.issuetype.name,
        priority: issue.fields.priority.map(|p| p.name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{local_client, serve_once};
    use pretty_assertions::assert_eq;

    #[test]
    fn domain_loses_scheme_and_trailing_slashes() {
        assert_eq!(sanitize_domain(" https://acme.atlassian.net// "), "acme.atlassian.net");
        assert_eq!(sanitize_domain("http://jira.local"), "jira.local");
        assert_eq!(sanitize_domain("acme.atlassian.net"), "acme.atlassian.net");
    }

    #[test]
    fn jql_filters_in_progress_and_optional_assignee() {
        assert_eq!(
            build_jql("EOD", None),
            r#"project = "EOD" AND status = "In Progress" ORDER BY updated DESC"#
        );
        assert_eq!(
            build_jql("EOD", Some("dev@acme.io")),
            r#"project = "EOD" AND status = "In Progress" AND assignee = "dev@acme.io" ORDER BY updated DESC"#
        );
    }

    #[test]
    fn search_request_uses_max_results_key() {
        let body = serde_json::to_value(SearchRequest {
            jql: "project = \"EOD\"",
            fields: ["summary", "status", "issuetype", "priority"],
            max_results: MAX_RESULTS,
        })
        .unwrap();
        assert_eq!(body["maxResults"], 50);
        assert_eq!(body["fields"][2], "issuetype");
    }

    #[test]
    fn issues_map_to_tickets_with_browse_url() {
        let search: SearchResponse = serde_json::from_value(serde_json::json!({
            "issues": [
                {
                    "key": "EOD-7",
                    "fields": {
                        "summary": "Heatmap colors",
                        "status": { "name": "In Progress" },
                        "issuetype": { "name": "Story" },
                        "priority": { "name": "High" }
                    }
                },
                {
                    "key": "EOD-9",
                    "fields": {
                        "summary": "Slack footer",
                        "status": { "name": "In Progress" },
                        "issuetype": { "name": "Task" },
                        "priority": null
                    }
                }
            ]
        }))
        .unwrap();

        let tickets: Vec<_> = search
            .issues
            .into_iter()
            .map(|issue| to_ticket(issue, "acme.atlassian.net"))
            .collect();

        assert_eq!(tickets[0].url, "https://acme.atlassian.net/browse/EOD-7");
        assert_eq!(tickets[0].priority.as_deref(), Some("High"));
        assert_eq!(tickets[1].kind, "Task");
        assert_eq!(tickets[1].priority, None);

        let json = serde_json::to_value(&tickets[1]).unwrap();
        assert_eq!(json["type"], "Task");
        assert!(json.get("priority").is_none());
    }

    #[tokio::test]
    async fn error_status_becomes_upstream_error() {
        let addr = serve_once("401 Unauthorized", r#"{"errorMessages":["no"]}"#).await;
        let jira = JiraClient::from_parts(
            local_client(),
            &format!("http://{}", addr),
            "acme.atlassian.net",
            "dev@acme.io",
            "secret",
        );

        let err = jira.in_progress_tickets("EOD", None).await.unwrap_err();
        match err.downcast_ref::<EodError>() {
            Some(EodError::Upstream { service, status, body }) => {
                assert_eq!(*service, "Jira");
                assert_eq!(*status, 401);
                assert!(body.contains("errorMessages"));
            }
            other => panic!("expected upstream error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn search_results_come_back_as_tickets() {
        let addr = serve_once(
            "200 OK",
            r#"{"issues":[{"key":"EOD-1","fields":{"summary":"Ship it","status":{"name":"In Progress"},"issuetype":{"name":"Bug"}}}]}"#,
        )
        .await;
        let jira = JiraClient::from_parts(
            local_client(),
            &format!("http://{}", addr),
            "acme.atlassian.net",
            "dev@acme.io",
            "secret",
        );

        let tickets = jira.in_progress_tickets("EOD", Some("dev@acme.io")).await.unwrap();
        assert_eq!(tickets.len(), 1);
        assert_eq!(tickets[0].key, "EOD-1");
        assert_eq!(tickets[0].url, "https://acme.atlassian.net/browse/EOD-1");
    }
}
