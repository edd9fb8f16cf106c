use std::sync::Arc;

use async_trait::async_trait;
use serenity::builder::{CreateEmbed, CreateEmbedAuthor, CreateEmbedFooter, CreateMessage};
use serenity::http::Http;
use serenity::model::Colour;
use serenity::model::Timestamp;
use serenity::model::channel::Channel;
use serenity::model::id::ChannelId;
use tracing::trace;

use crate::discord::errors::classify;
use crate::error::{DispatchError, RelayError};
use crate::notification::Notification;

/// The chat API as seen by the relay: one target channel, one send call.
///
/// Implementations must be callable from concurrent tasks.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Looks the target channel up and returns a display name for it.
    async fn resolve_channel(&self) -> Result<String, DispatchError>;

    async fn send(&self, notification: &Notification) -> Result<(), DispatchError>;
}

/// Posts notifications as embeds through Discord's REST API.
pub struct DiscordBackend {
    http: Arc<Http>,
    channel: ChannelId,
}

impl DiscordBackend {
    pub fn new(token: &str, channel_id: u64) -> crate::error::Result<Self> {
        if channel_id == 0 {
            return Err(RelayError::ConfigError(
                "Discord channel ID must be non-zero".to_string(),
            ));
        }

        Ok(Self {
            http: Arc::new(Http::new(token)),
            channel: ChannelId::new(channel_id),
        })
    }
}

#[async_trait]
impl ChatBackend for DiscordBackend {
    async fn resolve_channel(&self) -> Result<String, DispatchError> {
        let channel = self
            .http
            .get_channel(self.channel)
            .await
            .map_err(|e| classify(&e))?;

        Ok(match channel {
            Channel::Guild(channel) => channel.name,
            other => other.id().to_string(),
        })
    }

    async fn send(&self, notification: &Notification) -> Result<(), DispatchError> {
        trace!(
            "sending notification `{}` to channel {}",
            notification.title, self.channel
        );
        let message = CreateMessage::new().embed(build_embed(notification));

        self.channel
            .send_message(&*self.http, message)
            .await
            .map(|_| ())
            .map_err(|e| classify(&e))
    }
}

/// Discord rejects embeds carrying malformed URLs, so placeholder links
/// like `#` are left out.
fn is_web_url(url: &str) -> bool {
    url.starts_with("https://") || url.starts_with("http://")
}

fn build_embed(notification: &Notification) -> CreateEmbed {
    let mut embed = CreateEmbed::new()
        .title(&notification.title)
        .colour(Colour::new(notification.color));

    if !notification.description.is_empty() {
        embed = embed.description(&notification.description);
    }
    if is_web_url(&notification.link_url) {
        embed = embed.url(&notification.link_url);
    }

    for field in &notification.fields {
        embed = embed.field(&field.name, &field.value, field.inline);
    }

    let author = &notification.author;
    if !author.name.is_empty() {
        let mut embed_author = CreateEmbedAuthor::new(&author.name);
        if is_web_url(&author.icon_url) {
            embed_author = embed_author.icon_url(&author.icon_url);
        }
        embed = embed.author(embed_author);
    }

    if !notification.footer_text.is_empty() {
        embed = embed.footer(CreateEmbedFooter::new(&notification.footer_text));
    }

    if let Ok(timestamp) = Timestamp::from_unix_timestamp(notification.timestamp.timestamp()) {
        embed = embed.timestamp(timestamp);
    }

    embed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholder_links_are_not_web_urls() {
        assert!(is_web_url("https://github.com/o/r"));
        assert!(is_web_url("http://localhost/x"));
        assert!(!is_web_url("#"));
        assert!(!is_web_url(""));
    }

    #[test]
    fn zero_channel_id_is_rejected() {
        assert!(matches!(
            DiscordBackend::new("token", 0),
            Err(RelayError::ConfigError(_))
        ));
    }
}
