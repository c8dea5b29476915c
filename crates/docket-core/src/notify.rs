//! Notification fan-out.
//!
//! Channels (Slack, Discord, ...) implement [`NotificationSink`] in the
//! binary. [`Notifier`] sends to every configured channel independently and
//! reports success when at least one accepted the message.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{info, warn};

use crate::dates::DATE_FORMAT;
use crate::model::item::{ParseEnumError, Status};

/// Delivery level; channels map it to a color.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    High,
    #[default]
    Normal,
    Low,
    Warning,
    Info,
}

impl Level {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Normal => "normal",
            Self::Low => "low",
            Self::Warning => "warning",
            Self::Info => "info",
        }
    }

    /// RGB color used by webhook attachments and embeds.
    #[must_use]
    pub const fn color(self) -> u32 {
        match self {
            Self::High => 0xff_00_00,
            Self::Normal | Self::Info => 0x00_99_ff,
            Self::Low => 0x00_ff_00,
            Self::Warning => 0xff_99_00,
        }
    }

    /// `#rrggbb` form of [`Level::color`].
    #[must_use]
    pub fn hex_color(self) -> String {
        format!("#{:06x}", self.color())
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Level {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "high" => Ok(Self::High),
            "normal" => Ok(Self::Normal),
            "low" => Ok(Self::Low),
            "warning" => Ok(Self::Warning),
            "info" => Ok(Self::Info),
            _ => Err(ParseEnumError {
                expected: "notification level",
                got: s.to_string(),
            }),
        }
    }
}

/// A destination for notifications.
pub trait NotificationSink {
    /// Short channel name for logs and test results (`slack`, `discord`).
    fn name(&self) -> &str;

    /// Deliver `message` under the topic `channel`. Returns whether the
    /// destination accepted it; delivery failures are logged, not raised.
    fn send(&self, message: &str, channel: &str, level: Level) -> bool;
}

/// Human title for a topic: `overdue_tasks` → `Overdue Tasks Notification`.
#[must_use]
pub fn channel_title(channel: &str) -> String {
    let words: Vec<String> = channel
        .split('_')
        .filter(|w| !w.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect()
            })
        })
        .collect();
    format!("{} Notification", words.join(" "))
}

#[derive(Default)]
pub struct Notifier {
    sinks: Vec<Box<dyn NotificationSink + Send + Sync>>,
}

impl Notifier {
    #[must_use]
    pub fn new(sinks: Vec<Box<dyn NotificationSink + Send + Sync>>) -> Self {
        Self { sinks }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    #[must_use]
    pub fn channel_names(&self) -> Vec<&str> {
        self.sinks.iter().map(|s| s.name()).collect()
    }

    /// Send a test message to each channel and report per-channel results.
    #[must_use]
    pub fn test(&self) -> BTreeMap<String, bool> {
        self.sinks
            .iter()
            .map(|sink| {
                let ok = sink.send(
                    "🔔 This is a test notification from docket",
                    "test",
                    Level::Info,
                );
                (sink.name().to_string(), ok)
            })
            .collect()
    }
}

impl fmt::Debug for Notifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Notifier")
            .field("sinks", &self.channel_names())
            .finish()
    }
}

impl NotificationSink for Notifier {
    fn name(&self) -> &str {
        "all"
    }

    fn send(&self, message: &str, channel: &str, level: Level) -> bool {
        if self.sinks.is_empty() {
            warn!("no notification channels configured");
            return false;
        }
        let mut delivered = false;
        for sink in &self.sinks {
            let ok = sink.send(message, channel, level);
            info!(sink = sink.name(), channel, ok, "notification dispatched");
            delivered |= ok;
        }
        delivered
    }
}

/// Message for a newly assigned item.
#[must_use]
pub fn assignment_message(title: &str, assignee: &str, due: Option<NaiveDate>) -> String {
    let mut message = format!(
        "📝 **New Task Assignment**\n\n**Task:** {title}\n**Assigned to:** {assignee}\n"
    );
    if let Some(due) = due {
        message.push_str(&format!("**Due Date:** {}\n", due.format(DATE_FORMAT)));
    }
    message
}

/// Message and level for a status transition; moving to blocked is high.
#[must_use]
pub fn status_change_message(title: &str, from: Status, to: Status) -> (String, Level) {
    let level = if to == Status::Blocked {
        Level::High
    } else {
        Level::Normal
    };
    (
        format!("🔄 **Task Status Update**\n\n**Task:** {title}\n**Status:** {from} → {to}\n"),
        level,
    )
}
