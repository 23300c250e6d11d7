//! Notify socket: identity via team/user query params (anonymous without),
//! connection registry, ping/pong keepalive, catch-up push on connect.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use std::sync::Arc;
use tracing::trace;

use crate::registry::ConnectionEntry;
use crate::sched::Task;
use crate::AppState;

#[derive(Deserialize)]
pub struct WsQuery {
    team: Option<String>,
    user: Option<String>,
}

#[derive(Deserialize)]
struct WsMessage {
    #[serde(rename = "type")]
    type_: String,
}

const PONG_JSON: &str = r#"{"type":"pong"}"#;

/// Upgrades the connection after validating the optional team/user query
/// pair. Registers the connection and schedules a catch-up push so
/// notifications accumulated while offline are delivered immediately.
pub async fn ws_handler(
    State(state): State<AppState>,
    Query(q): Query<WsQuery>,
    ws: WebSocketUpgrade,
) -> Response {
    let identity: Option<(i32, i32)> = match (q.team.as_deref(), q.user.as_deref()) {
        (None, None) => None,
        (Some(team), Some(user)) => match (team.trim().parse(), user.trim().parse()) {
            (Ok(team_id), Ok(user_id)) => Some((team_id, user_id)),
            _ => {
                return (
                    axum::http::StatusCode::BAD_REQUEST,
                    "team and user must be valid i32",
                )
                    .into_response();
            }
        },
        _ => {
            return (
                axum::http::StatusCode::BAD_REQUEST,
                "team and user must be supplied together",
            )
                .into_response();
        }
    };

    let (entry, rx) = ConnectionEntry::new(
        identity.map(|(team_id, _)| team_id),
        identity.map(|(_, user_id)| user_id),
    );
    state.registry.register(entry.clone());
    if let Some((team_id, user_id)) = identity {
        state.queue.submit(Task::PushUser { team_id, user_id });
    }

    ws.on_upgrade(move |socket| handle_socket(socket, state, entry, rx))
}

async fn handle_socket(
    mut socket: WebSocket,
    state: AppState,
    entry: Arc<ConnectionEntry>,
    mut rx: tokio::sync::mpsc::Receiver<String>,
) {
    loop {
        tokio::select! {
            msg = rx.recv() => {
                match msg {
                    Some(text) => {
                        if socket.send(Message::Text(text.into())).await.is_err() {
                            break;
                        }
                    }
                    None => break,
                }
            }
            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        if let Ok(parsed) = serde_json::from_str::<WsMessage>(&text) {
                            if parsed.type_ == "ping" {
                                trace!(conn_id = entry.conn_id, "ws ping received");
                                if socket.send(Message::Text(PONG_JSON.into())).await.is_err() {
                                    break;
                                }
                            }
                        }
                    }
                    Some(Err(_)) | None => break,
                    _ => {}
                }
            }
            _ = entry.closed() => {
                let _ = socket.send(Message::Close(None)).await;
                break;
            }
        }
    }
    state.registry.unregister(&entry);
}
