//! restage-slack — posts workflow status text to a Slack channel.
//!
//! Delivery is best effort: a clone run never fails because a status
//! message did not land. HTTP and API failures are logged and
//! swallowed.

use reqwest::Client;
use serde_json::json;
use tracing::warn;

use restage_core::Notifier;

const POST_MESSAGE_URL: &str = "https://slack.com/api/chat.postMessage";

/// Posts messages via `chat.postMessage`.
pub struct SlackNotifier {
    http: Client,
    token: String,
    channel: String,
}

impl SlackNotifier {
    pub fn new(token: String, channel: String) -> Self {
        Self {
            http: Client::new(),
            token,
            channel,
        }
    }

    /// Build from `SLACK_TOKEN` and `SLACK_CHANNEL`. `None` when
    /// either is unset.
    pub fn from_env() -> Option<Self> {
        let token = std::env::var("SLACK_TOKEN").ok()?;
        let channel = std::env::var("SLACK_CHANNEL").ok()?;
        Some(Self::new(token, channel))
    }

    async fn post(&self, text: &str) -> anyhow::Result<()> {
        let response = self
            .http
            .post(POST_MESSAGE_URL)
            .bearer_auth(&self.token)
            .json(&message_payload(&self.channel, text))
            .send()
            .await?
            .error_for_status()?;

        // Slack reports API-level failures in the body, not the status.
        let body: serde_json::Value = response.json().await?;
        if body["ok"] != json!(true) {
            anyhow::bail!(
                "slack api error: {}",
                body["error"].as_str().unwrap_or("unknown")
            );
        }
        Ok(())
    }
}

impl Notifier for SlackNotifier {
    async fn notify(&self, text: &str) {
        if let Err(err) = self.post(text).await {
            warn!(error = %err, "failed to post to slack");
        }
    }
}

fn message_payload(channel: &str, text: &str) -> serde_json::Value {
    json!({
        "channel": channel,
        "text": text,
    })
}
