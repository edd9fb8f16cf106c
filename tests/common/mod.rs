use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use tokio::sync::mpsc;

use patchy::discord::{ChannelConnection, ChatBackend, Dispatcher};
use patchy::error::DispatchError;
use patchy::notification::Notification;
use patchy::{AppState, FileConfig, RelayConfig, SharedState, api};

pub const SECRET: &str = "It's a Secret to Everybody";

/// Records every notification instead of talking to Discord.
pub struct RecordingBackend {
    sent: mpsc::UnboundedSender<Notification>,
}

#[async_trait]
impl ChatBackend for RecordingBackend {
    async fn resolve_channel(&self) -> Result<String, DispatchError> {
        Ok("github-feed".to_string())
    }

    async fn send(&self, notification: &Notification) -> Result<(), DispatchError> {
        let _ = self.sent.send(notification.clone());
        Ok(())
    }
}

pub fn test_config() -> RelayConfig {
    RelayConfig::from_lookup(
        |key| match key {
            "DISCORD_TOKEN" => Some("test-token".to_string()),
            "DISCORD_CHANNEL_ID" => Some("123456789".to_string()),
            "GITHUB_WEBHOOK_SECRET" => Some(SECRET.to_string()),
            _ => None,
        },
        FileConfig::default(),
    )
}

/// State wired to a ready recording backend, plus the receiving end of
/// everything it sends.
pub async fn test_state() -> (SharedState, mpsc::UnboundedReceiver<Notification>) {
    let (sent, rx) = mpsc::unbounded_channel();
    let connection = Arc::new(ChannelConnection::new(Arc::new(RecordingBackend { sent })));
    connection.establish().await.unwrap();

    let dispatcher = Dispatcher::new(connection);
    let state = Arc::new(AppState::new(test_config(), dispatcher));
    (state, rx)
}

pub async fn test_app() -> (Router, Dispatcher, mpsc::UnboundedReceiver<Notification>) {
    let (state, rx) = test_state().await;
    let dispatcher = state.dispatcher.clone();
    (api::router(state), dispatcher, rx)
}

pub fn sign(body: &[u8]) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(SECRET.as_bytes()).unwrap();
    mac.update(body);
    format!("sha256={}", hex::encode(mac.finalize().into_bytes()))
}
