//! Health and status endpoints

use axum::{Json, extract::State as AxumState};
use serde_json::{Value, json};

use crate::SharedState;

const SERVICE_NAME: &str = "Patchy - GitHub Discord Webhook Bot";

fn health_payload(state: &SharedState) -> Value {
    let config = &state.config;

    json!({
        "status": "healthy",
        "service": SERVICE_NAME,
        "version": env!("CARGO_PKG_VERSION"),
        "started_at": state.started_at,
        "uptime_seconds": state.start_time.elapsed().as_secs(),
        "channel_ready": state.dispatcher.connection().is_ready(),
        "environment": {
            "discord_token_configured": !config.discord_token.is_empty(),
            "discord_channel_configured": config.discord_channel_id != 0,
            "github_secret_configured": !config.github_webhook_secret.is_empty(),
        }
    })
}

/// GET /health
pub async fn health(AxumState(state): AxumState<SharedState>) -> Json<Value> {
    Json(health_payload(&state))
}

/// GET / - same payload as /health plus a greeting
pub async fn root(AxumState(state): AxumState<SharedState>) -> Json<Value> {
    let mut payload = health_payload(&state);
    payload["message"] = json!(format!("{} is running!", SERVICE_NAME));
    Json(payload)
}
