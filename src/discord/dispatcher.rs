use std::sync::{Arc, Mutex, MutexGuard};

use tokio::task::JoinSet;
use tracing::{Instrument, debug, error, info};

use crate::discord::connection::ChannelConnection;
use crate::error::DispatchError;
use crate::notification::Notification;

/// Delivers notifications to the [`ChannelConnection`], either inline or as
/// fire-and-forget background tasks.
#[derive(Clone)]
pub struct Dispatcher {
    connection: Arc<ChannelConnection>,
    in_flight: Arc<Mutex<JoinSet<()>>>,
}

impl Dispatcher {
    pub fn new(connection: Arc<ChannelConnection>) -> Self {
        Self {
            connection,
            in_flight: Arc::new(Mutex::new(JoinSet::new())),
        }
    }

    pub fn connection(&self) -> &Arc<ChannelConnection> {
        &self.connection
    }

    /// Sends `notification`, logging any failure. Never retries.
    pub async fn dispatch(&self, notification: &Notification) -> bool {
        match self.try_dispatch(notification).await {
            Ok(()) => true,
            Err(e) => {
                log_failure(&e);
                false
            }
        }
    }

    pub async fn try_dispatch(&self, notification: &Notification) -> Result<(), DispatchError> {
        self.connection.send(notification).await?;
        info!("GitHub notification sent successfully");
        Ok(())
    }

    /// Posts a diagnostic about a failed event. Its own failures are only
    /// logged.
    pub async fn dispatch_error(&self, message: &str, event_type: &str) {
        let report = Notification::error_report(message, event_type);
        match self.connection.send(&report).await {
            Ok(()) => info!("Error notification sent successfully"),
            Err(e) => error!("Failed to send error notification: {}", e),
        }
    }

    /// Sends `notification` in the background. A failure worth reporting is
    /// followed by a diagnostic for `event_type`.
    pub fn spawn_dispatch(&self, notification: Notification, event_type: String) {
        let dispatcher = self.clone();
        self.spawn(async move {
            if let Err(e) = dispatcher.try_dispatch(&notification).await {
                log_failure(&e);
                error!("Failed to send notification for {} event", event_type);
                if e.is_reportable() {
                    dispatcher.dispatch_error(&e.to_string(), &event_type).await;
                }
            }
        });
    }

    /// Sends a diagnostic in the background.
    pub fn spawn_error_report(&self, message: String, event_type: String) {
        let dispatcher = self.clone();
        self.spawn(async move {
            dispatcher.dispatch_error(&message, &event_type).await;
        });
    }

    /// Number of background sends not yet reaped.
    pub fn in_flight(&self) -> usize {
        self.lock_in_flight().len()
    }

    /// Aborts every background send still running and waits for them to
    /// wind down. Cancellations are expected and swallowed.
    pub async fn shutdown(&self) {
        let mut tasks = std::mem::take(&mut *self.lock_in_flight());
        if tasks.is_empty() {
            return;
        }

        info!("Cancelling {} in-flight dispatch task(s)", tasks.len());
        tasks.abort_all();
        while let Some(result) = tasks.join_next().await {
            match result {
                Ok(()) => {}
                Err(e) if e.is_cancelled() => debug!("dispatch task cancelled"),
                Err(e) => error!("dispatch task failed: {}", e),
            }
        }
    }

    fn spawn<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let mut tasks = self.lock_in_flight();
        // reap finished tasks so the set only holds live ones
        while let Some(result) = tasks.try_join_next() {
            if let Err(e) = result {
                error!("dispatch task failed: {}", e);
            }
        }
        tasks.spawn(task.in_current_span());
    }

    fn lock_in_flight(&self) -> MutexGuard<'_, JoinSet<()>> {
        match self.in_flight.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

fn log_failure(err: &DispatchError) {
    match err {
        DispatchError::NotReady => error!("Target channel not set. Cannot send notification."),
        DispatchError::PermissionDenied(message) => error!(
            "Bot doesn't have permission to send messages to the target channel: {}",
            message
        ),
        DispatchError::Http { status, message } => error!(
            "HTTP error while sending notification (HTTP {}): {}",
            status, message
        ),
        DispatchError::Transport(message) => {
            error!("Unexpected error while sending notification: {}", message)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discord::backend::ChatBackend;
    use async_trait::async_trait;
    use std::time::Duration;
    use tokio::sync::{Notify, mpsc};

    struct ChannelBackend {
        sent: mpsc::UnboundedSender<Notification>,
        fail_with: Option<DispatchError>,
    }

    #[async_trait]
    impl ChatBackend for ChannelBackend {
        async fn resolve_channel(&self) -> Result<String, DispatchError> {
            Ok("general".to_string())
        }

        async fn send(&self, notification: &Notification) -> Result<(), DispatchError> {
            let _ = self.sent.send(notification.clone());
            match &self.fail_with {
                Some(err) => Err(err.clone()),
                None => Ok(()),
            }
        }
    }

    /// Never completes a send.
    struct StuckBackend(Arc<Notify>);

    #[async_trait]
    impl ChatBackend for StuckBackend {
        async fn resolve_channel(&self) -> Result<String, DispatchError> {
            Ok("general".to_string())
        }

        async fn send(&self, _notification: &Notification) -> Result<(), DispatchError> {
            self.0.notify_one();
            std::future::pending().await
        }
    }

    fn dispatcher_with(
        fail_with: Option<DispatchError>,
    ) -> (Dispatcher, mpsc::UnboundedReceiver<Notification>) {
        let (sent, rx) = mpsc::unbounded_channel();
        let backend = Arc::new(ChannelBackend { sent, fail_with });
        let connection = Arc::new(ChannelConnection::new(backend));
        (Dispatcher::new(connection), rx)
    }

    fn sample() -> Notification {
        Notification::new("📝 New Push to main", 0x28a745)
    }

    #[tokio::test]
    async fn dispatch_before_establish_fails_fast() {
        let (dispatcher, mut rx) = dispatcher_with(None);

        assert!(!dispatcher.dispatch(&sample()).await);
        assert_eq!(
            dispatcher.try_dispatch(&sample()).await,
            Err(DispatchError::NotReady)
        );
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn dispatch_after_establish_sends() {
        let (dispatcher, mut rx) = dispatcher_with(None);
        dispatcher.connection().establish().await.unwrap();

        assert!(dispatcher.dispatch(&sample()).await);
        assert_eq!(rx.recv().await.unwrap().title, "📝 New Push to main");
    }

    #[tokio::test]
    async fn failed_send_resolves_to_false() {
        let failure = DispatchError::PermissionDenied("Missing Access".into());
        let (dispatcher, _rx) = dispatcher_with(Some(failure));
        dispatcher.connection().establish().await.unwrap();

        assert!(!dispatcher.dispatch(&sample()).await);
    }

    #[tokio::test]
    async fn diagnostic_on_unready_channel_is_swallowed() {
        let (dispatcher, mut rx) = dispatcher_with(None);

        dispatcher.dispatch_error("Invalid Form Body", "push").await;

        assert!(rx.try_recv().is_err());
        assert_eq!(dispatcher.in_flight(), 0);
    }

    #[tokio::test]
    async fn rejected_diagnostic_is_swallowed() {
        let failure = DispatchError::Transport("connection reset".into());
        let (dispatcher, mut rx) = dispatcher_with(Some(failure));
        dispatcher.connection().establish().await.unwrap();

        dispatcher.dispatch_error("Invalid Form Body", "push").await;

        let report = rx.recv().await.unwrap();
        assert_eq!(report.title, "⚠️ Webhook Processing Error");
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn reportable_background_failure_sends_diagnostic() {
        let (dispatcher, mut rx) = dispatcher_with(Some(DispatchError::Http {
            status: 400,
            message: "Invalid Form Body".into(),
        }));
        dispatcher.connection().establish().await.unwrap();

        dispatcher.spawn_dispatch(sample(), "push".to_string());

        let first = rx.recv().await.unwrap();
        assert_eq!(first.title, "📝 New Push to main");
        let report = tokio::time::timeout(Duration::from_secs(1), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(report.title, "⚠️ Webhook Processing Error");
        assert!(report.fields[0].value.contains("Invalid Form Body"));
    }

    #[tokio::test]
    async fn permission_failure_is_not_reported_back() {
        let failure = DispatchError::PermissionDenied("Forbidden".into());
        let (dispatcher, mut rx) = dispatcher_with(Some(failure));
        dispatcher.connection().establish().await.unwrap();

        dispatcher.spawn_dispatch(sample(), "push".to_string());
        rx.recv().await.unwrap();
        dispatcher.shutdown().await;

        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn shutdown_cancels_in_flight_sends() {
        let started = Arc::new(Notify::new());
        let backend = Arc::new(StuckBackend(started.clone()));
        let connection = Arc::new(ChannelConnection::new(backend));
        connection.establish().await.unwrap();
        let dispatcher = Dispatcher::new(connection);

        dispatcher.spawn_dispatch(sample(), "push".to_string());
        started.notified().await;
        assert_eq!(dispatcher.in_flight(), 1);

        tokio::time::timeout(Duration::from_secs(1), dispatcher.shutdown())
            .await
            .unwrap();
        assert_eq!(dispatcher.in_flight(), 0);
    }

    #[tokio::test]
    async fn release_sends_farewell_once() {
        let (dispatcher, mut rx) = dispatcher_with(None);
        let connection = dispatcher.connection().clone();

        connection.release().await;
        assert!(rx.try_recv().is_err());

        connection.establish().await.unwrap();
        connection.release().await;
        assert_eq!(
            rx.recv().await.unwrap().title,
            "🔴 Patchy - GitHub Notification Bot"
        );
        assert!(!connection.is_ready());
    }
}
