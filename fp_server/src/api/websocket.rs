//! WebSocket handler for the persistent game connection.
//!
//! # Connection Flow
//!
//! 1. Client connects via `GET /ws`
//! 2. Server assigns a fresh connection id and registers it with the
//!    server actor
//! 3. Two tasks run until disconnect:
//!    - Send task: forwards server broadcasts to the socket
//!    - Receive loop: parses client frames and forwards them to the
//!      server actor
//! 4. On disconnect the actor is notified and tears down the
//!    connection's room
//!
//! Malformed frames are logged and dropped; the connection stays up.

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use log::{error, info, warn};
use uuid::Uuid;

use forfeit_party::{
    entities::PlayerId,
    messages::{ClientEvent, ServerEvent},
    server::ServerCommand,
};

use super::AppState;

/// Upgrade the HTTP connection to the game WebSocket.
pub async fn websocket_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle an established WebSocket connection for its whole lifetime.
async fn handle_socket(socket: WebSocket, state: AppState) {
    // The connection id doubles as the player id for the visit.
    let connection = PlayerId::new(Uuid::new_v4().to_string());
    let (mut sender, mut receiver) = socket.split();

    info!("WebSocket connected: {connection}");

    let (event_tx, mut event_rx) = tokio::sync::mpsc::channel::<ServerEvent>(32);
    if state
        .server
        .send(ServerCommand::Connect {
            connection: connection.clone(),
            sender: event_tx,
        })
        .await
        .is_err()
    {
        error!("server actor is gone, dropping connection {connection}");
        return;
    }

    // Forward server broadcasts to the socket.
    let send_task = tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            let json = match serde_json::to_string(&event) {
                Ok(json) => json,
                Err(e) => {
                    error!("failed to serialize server event: {e}");
                    continue;
                }
            };
            if sender.send(Message::Text(json.into())).await.is_err() {
                break;
            }
        }
    });

    // Receive frames from the client.
    while let Some(msg) = receiver.next().await {
        match msg {
            Ok(Message::Text(text)) => match serde_json::from_str::<ClientEvent>(&text) {
                Ok(event) => {
                    if state
                        .server
                        .send(ServerCommand::Event {
                            connection: connection.clone(),
                            event,
                        })
                        .await
                        .is_err()
                    {
                        break;
                    }
                }
                Err(e) => {
                    warn!("unparseable frame from {connection}: {e}");
                }
            },
            Ok(Message::Close(_)) => {
                info!("WebSocket closed: {connection}");
                break;
            }
            Err(e) => {
                error!("WebSocket error on {connection}: {e}");
                break;
            }
            _ => {}
        }
    }

    send_task.abort();
    let _ = state
        .server
        .send(ServerCommand::Disconnect {
            connection: connection.clone(),
        })
        .await;

    info!("WebSocket disconnected: {connection}");
}
