use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{error, info, warn};

use crate::discord::backend::ChatBackend;
use crate::error::DispatchError;
use crate::notification::Notification;

/// The single outbound chat channel of the process.
///
/// Created unready; [`ChannelConnection::establish`] runs in the background
/// at startup, and sends fail fast with [`DispatchError::NotReady`] until it
/// has completed.
pub struct ChannelConnection {
    backend: Arc<dyn ChatBackend>,
    ready: AtomicBool,
}

impl ChannelConnection {
    pub fn new(backend: Arc<dyn ChatBackend>) -> Self {
        Self {
            backend,
            ready: AtomicBool::new(false),
        }
    }

    /// Resolves the target channel and marks the connection ready.
    pub async fn establish(&self) -> Result<(), DispatchError> {
        let channel_name = self.backend.resolve_channel().await?;
        self.ready.store(true, Ordering::Release);
        info!("Bot ready! Monitoring channel: {}", channel_name);
        Ok(())
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    pub async fn send(&self, notification: &Notification) -> Result<(), DispatchError> {
        if !self.is_ready() {
            return Err(DispatchError::NotReady);
        }
        self.backend.send(notification).await
    }

    /// Posts the farewell message (best effort) and marks the connection
    /// unready. Safe to call on a connection that never became ready.
    pub async fn release(&self) {
        if !self.is_ready() {
            warn!("Channel connection was never established, skipping shutdown message");
            return;
        }

        match self.backend.send(&Notification::shutdown()).await {
            Ok(()) => info!("Shutdown message sent successfully"),
            Err(e) => error!("Failed to send shutdown message: {}", e),
        }

        self.ready.store(false, Ordering::Release);
        info!("Discord channel connection released");
    }
}
