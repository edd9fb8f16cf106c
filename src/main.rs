use patchy::discord::{ChannelConnection, ChatBackend, DiscordBackend, Dispatcher};
use patchy::logging::setup_logging;
use patchy::notification::Notification;
use patchy::{AppState, RelayConfig, api};
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info};

/// Load and validate the configuration
fn load_config() -> patchy::error::Result<RelayConfig> {
    let config = RelayConfig::load()?;
    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();

    let config = match load_config() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    // keep the guard alive so buffered file logs get flushed on exit
    let _log_guard = match setup_logging(config.effective_log_level(), config.log_dir.clone()) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to set up logging: {}", e);
            std::process::exit(1);
        }
    };

    let backend: Arc<dyn ChatBackend> =
        match DiscordBackend::new(&config.discord_token, config.discord_channel_id) {
            Ok(backend) => Arc::new(backend),
            Err(e) => {
                error!("{}", e);
                std::process::exit(1);
            }
        };
    let connection = Arc::new(ChannelConnection::new(backend));
    let dispatcher = Dispatcher::new(connection.clone());

    // The HTTP server comes up without waiting for Discord.
    let announcer = {
        let dispatcher = dispatcher.clone();
        tokio::spawn(async move {
            info!("Starting Discord bot...");
            match dispatcher.connection().establish().await {
                Ok(()) => {
                    dispatcher.dispatch(&Notification::startup()).await;
                }
                Err(e) => error!("Failed to connect to Discord channel: {}", e),
            }
        })
    };

    let bind_address = config.bind_address();
    let state = Arc::new(AppState::new(config, dispatcher.clone()));
    let app = api::router(state);

    let listener = match tokio::net::TcpListener::bind(&bind_address).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind {}: {}", bind_address, e);
            std::process::exit(1);
        }
    };
    info!("Listening on {}", bind_address);

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("Server error: {}", e);
    }

    info!("Shutting down...");
    announcer.abort();
    dispatcher.shutdown().await;
    connection.release().await;
    info!("Bot shutdown complete");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
