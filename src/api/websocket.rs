//! WebSocket endpoint for real-time wallet and round events.
//!
//! Each connection registers itself in the session registry under its
//! account id, drains its event stream into the socket, and deregisters on
//! close. Delivery into the stream happens at mutation time; this file is
//! only the transport end of it.

use axum::{
    extract::{
        ws::{Message, WebSocket},
        Path, State, WebSocketUpgrade,
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::handlers::AppState;
use crate::events::SessionRegistry;

/// WebSocket endpoint handler
/// GET /ws/:account_id
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    Path(account_id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Response {
    let registry = Arc::clone(&state.registry);
    ws.on_upgrade(move |socket| handle_connection(socket, registry, account_id))
}

async fn handle_connection(socket: WebSocket, registry: Arc<SessionRegistry>, account_id: String) {
    let (connection_id, mut events) = registry.register(&account_id);
    info!(
        "🔌 websocket client {} connected for {} (total: {})",
        connection_id,
        account_id,
        registry.connection_count()
    );

    let (mut sender, mut receiver) = socket.split();

    // Drain registry events into the socket.
    let send_task = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            let message = match serde_json::to_string(&event) {
                Ok(text) => Message::Text(text),
                Err(e) => {
                    warn!(error = %e, "failed to serialize event");
                    continue;
                }
            };
            if sender.send(message).await.is_err() {
                break;
            }
        }
    });

    // Watch the inbound side for close/errors; clients don't send anything
    // we act on.
    let account_for_recv = account_id.clone();
    let recv_task = tokio::spawn(async move {
        while let Some(message) = receiver.next().await {
            match message {
                Ok(Message::Close(_)) => {
                    debug!(account_id = %account_for_recv, "client requested close");
                    break;
                }
                Ok(_) => {}
                Err(e) => {
                    debug!(account_id = %account_for_recv, error = %e, "websocket receive error");
                    break;
                }
            }
        }
    });

    tokio::select! {
        _ = send_task => {}
        _ = recv_task => {}
    }

    registry.deregister(&account_id, connection_id);
    info!(
        "🔌 websocket client {} disconnected from {} (remaining: {})",
        connection_id,
        account_id,
        registry.connection_count()
    );
}
