//! Slack and Discord webhook channels.

use std::time::Duration;

use chrono::{Local, Utc};
use docket_core::config::NotifyConfig;
use docket_core::notify::{Level, NotificationSink, Notifier, channel_title};
use serde_json::{Value, json};
use tracing::{debug, warn};

const BOT_NAME: &str = "Docket";
const FOOTER: &str = "docket";
const TIMEOUT: Duration = Duration::from_secs(10);

/// Slack incoming-webhook body: one attachment colored by level.
pub fn slack_payload(message: &str, channel: &str, level: Level, ts: i64) -> Value {
    json!({
        "username": BOT_NAME,
        "icon_emoji": ":robot_face:",
        "attachments": [{
            "color": level.hex_color(),
            "title": channel_title(channel),
            "text": message,
            "footer": FOOTER,
            "ts": ts,
        }],
    })
}

/// Discord webhook body: one embed colored by level.
pub fn discord_payload(message: &str, channel: &str, level: Level, timestamp: &str) -> Value {
    json!({
        "username": BOT_NAME,
        "embeds": [{
            "title": channel_title(channel),
            "description": message,
            "color": level.color(),
            "timestamp": timestamp,
            "footer": { "text": FOOTER },
        }],
    })
}

fn post(name: &str, url: &str, body: &Value) -> bool {
    let agent = ureq::AgentBuilder::new().timeout(TIMEOUT).build();
    match agent
        .post(url)
        .set("User-Agent", "docket-cli")
        .send_json(body.clone())
    {
        Ok(response) => {
            debug!(sink = name, status = response.status(), "webhook accepted");
            true
        }
        Err(err) => {
            warn!(sink = name, error = %err, "webhook delivery failed");
            false
        }
    }
}

pub struct SlackWebhook {
    url: String,
}

impl NotificationSink for SlackWebhook {
    fn name(&self) -> &str {
        "slack"
    }

    fn send(&self, message: &str, channel: &str, level: Level) -> bool {
        let body = slack_payload(message, channel, level, Local::now().timestamp());
        post(self.name(), &self.url, &body)
    }
}

pub struct DiscordWebhook {
    url: String,
}

impl NotificationSink for DiscordWebhook {
    fn name(&self) -> &str {
        "discord"
    }

    fn send(&self, message: &str, channel: &str, level: Level) -> bool {
        let body = discord_payload(message, channel, level, &Utc::now().to_rfc3339());
        post(self.name(), &self.url, &body)
    }
}

/// A notifier with one sink per configured webhook URL.
pub fn notifier_from_config(config: &NotifyConfig) -> Notifier {
    let mut sinks: Vec<Box<dyn NotificationSink + Send + Sync>> = Vec::new();
    if let Some(url) = config.slack_webhook_url.as_deref().filter(|u| !u.is_empty()) {
        sinks.push(Box::new(SlackWebhook { url: url.to_string() }));
    }
    if let Some(url) = config.discord_webhook_url.as_deref().filter(|u| !u.is_empty()) {
        sinks.push(Box::new(DiscordWebhook { url: url.to_string() }));
    }
    Notifier::new(sinks)
}
