use axum::{extract::State, http::StatusCode, Json};

use crate::AppState;

#[derive(serde::Deserialize)]
pub struct BroadcastBody {
    message: String,
}

/// POST /admin/broadcast — Announce a message to every player.
pub async fn post_broadcast(
    State(state): State<AppState>,
    Json(body): Json<BroadcastBody>,
) -> Result<StatusCode, (StatusCode, &'static str)> {
    state.events.admin_message(&body.message).map_err(|e| {
        tracing::error!("create broadcast notification: {:?}", e);
        (StatusCode::INTERNAL_SERVER_ERROR, "Failed to create notification")
    })?;
    Ok(StatusCode::ACCEPTED)
}
