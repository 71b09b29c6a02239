use crate::error::EodError;
use anyhow::Result;
use serde::Serialize;

#[derive(Serialize)]
struct WebhookPayload<'a> {
    text: &'a str,
}

/// Posts `text` to a Slack incoming webhook.
pub async fn post_message(client: &reqwest::Client, webhook_url: &str, text: &str) -> Result<()> {
    if webhook_url.trim().is_empty() {
        return Err(EodError::MissingWebhook.into());
    }

    let response = client
        .post(webhook_url)
        .json(&WebhookPayload { text })
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(EodError::Upstream {
            service: "Slack",
            status: status.as_u16(),
            body,
        }
        .into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn blank_webhook_is_rejected_before_sending() {
        let client = reqwest::Client::new();
        let err = post_message(&client, "  ", "hello").await.unwrap_err();
        assert_eq!(err.downcast_ref::<EodError>(), Some(&EodError::MissingWebhook));
    }

    #[test]
    fn payload_is_text_object() {
        let json = serde_json::to_value(WebhookPayload { text: "done" }).unwrap();
        assert_eq!(json, serde_json::json!({ "text": "done" }));
    }
}
