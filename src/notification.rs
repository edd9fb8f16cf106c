//! The chat-agnostic message record produced by rendering.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::utils::cap_chars;

pub const COLOR_GREEN: u32 = 0x28a745;
pub const COLOR_RED: u32 = 0xdc3545;
pub const COLOR_PURPLE: u32 = 0x6f42c1;
pub const COLOR_BLUE: u32 = 0x17a2b8;
pub const COLOR_GRAY: u32 = 0x6c757d;
pub const COLOR_AMBER: u32 = 0xffc107;
pub const COLOR_ALERT: u32 = 0xff0000;
pub const COLOR_ONLINE: u32 = 0x00ff00;

const BOT_NAME: &str = "Patchy";
const BOT_FOOTER: &str = "Patchy - GitHub Webhook Bot";
const MAX_ERROR_DETAILS_LEN: usize = 1000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NotificationAuthor {
    pub name: String,
    pub icon_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    pub title: String,
    pub description: String,
    /// RGB packed as `0xRRGGBB`.
    pub color: u32,
    pub link_url: String,
    /// In display order.
    pub fields: Vec<NotificationField>,
    pub author: NotificationAuthor,
    pub footer_text: String,
    pub timestamp: DateTime<Utc>,
}

impl Notification {
    /// Starts a notification stamped with the current time. Everything else
    /// is empty until set with the builder methods.
    pub fn new(title: impl Into<String>, color: u32) -> Self {
        Self {
            title: title.into(),
            description: String::new(),
            color,
            link_url: String::new(),
            fields: Vec::new(),
            author: NotificationAuthor::default(),
            footer_text: String::new(),
            timestamp: Utc::now(),
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn link(mut self, url: impl Into<String>) -> Self {
        self.link_url = url.into();
        self
    }

    pub fn field(
        mut self,
        name: impl Into<String>,
        value: impl Into<String>,
        inline: bool,
    ) -> Self {
        self.fields.push(NotificationField {
            name: name.into(),
            value: value.into(),
            inline,
        });
        self
    }

    pub fn author(mut self, name: impl Into<String>, icon_url: impl Into<String>) -> Self {
        self.author = NotificationAuthor {
            name: name.into(),
            icon_url: icon_url.into(),
        };
        self
    }

    pub fn footer(mut self, text: impl Into<String>) -> Self {
        self.footer_text = text.into();
        self
    }

    /// Posted once the channel connection is established.
    pub fn startup() -> Self {
        Self::new("🤖 Patchy - GitHub Notification Bot", COLOR_ONLINE)
            .description("Patchy is now online and ready to receive GitHub webhook notifications!")
            .field("Status", "✅ Connected and monitoring", false)
            .author(BOT_NAME, "")
            .footer(BOT_FOOTER)
    }

    /// Posted right before the connection is released.
    pub fn shutdown() -> Self {
        Self::new("🔴 Patchy - GitHub Notification Bot", COLOR_ALERT)
            .description("Patchy is shutting down. Webhook notifications will be paused.")
            .author(BOT_NAME, "")
            .footer(BOT_FOOTER)
    }

    /// Diagnostic sent when a real event couldn't be rendered or delivered.
    pub fn error_report(message: &str, event_type: &str) -> Self {
        let description = format!("An error occurred while processing a {event_type} event:");

        Self::new("⚠️ Webhook Processing Error", COLOR_ALERT)
            .description(description)
            .field(
                "Error Details",
                format!("```{}```", cap_chars(message, MAX_ERROR_DETAILS_LEN)),
                false,
            )
            .author(BOT_NAME, "")
            .footer("Patchy - Error Handler")
    }
}
