use crate::signaling::AppState;
use crate::relay::RelayHandle;
use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Path, Query, State, WebSocketUpgrade};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use switchboard_core::{ClientSignal, ConnectionId, ParticipantId, RelaySignal, Role};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

/// Handshake metadata carried in the upgrade request's query string.
#[derive(Debug, Default, Deserialize)]
pub struct ConnectParams {
    #[serde(default)]
    pub role: Role,
}

/// Upgrades `GET /ws/{identity}?role=...` to a relay connection.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Path(identity): Path<String>,
    Query(params): Query<ConnectParams>,
    State(state): State<AppState>,
) -> Response {
    let identity = match ParticipantId::parse(identity) {
        Ok(identity) => identity,
        Err(e) => {
            warn!("Rejecting connection attempt: {}", e);
            return (StatusCode::BAD_REQUEST, e.to_string()).into_response();
        }
    };

    ws.on_upgrade(move |socket| handle_socket(socket, identity, params.role, state.relay))
}

async fn handle_socket(socket: WebSocket, identity: ParticipantId, role: Role, relay: RelayHandle) {
    let connection_id = ConnectionId::new();
    info!(
        "New WebSocket connection: {} as {} ({})",
        identity, role, connection_id
    );

    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<RelaySignal>();

    if let Err(e) = relay
        .connect(identity.clone(), role, connection_id, tx)
        .await
    {
        error!("Cannot register {}: {}", identity, e);
        return;
    }

    // Ends when the relay drops every handle to this connection, which is
    // also what happens when the identity reconnects elsewhere.
    let mut send_task = tokio::spawn(async move {
        while let Some(signal) = rx.recv().await {
            let json = match serde_json::to_string(&signal) {
                Ok(json) => json,
                Err(e) => {
                    error!("Failed to serialize relay signal: {}", e);
                    continue;
                }
            };
            if sender.send(Message::Text(json.into())).await.is_err() {
                return;
            }
        }
        let _ = sender.send(Message::Close(None)).await;
    });

    let mut recv_task = tokio::spawn({
        let relay = relay.clone();
        let identity = identity.clone();

        async move {
            while let Some(Ok(msg)) = receiver.next().await {
                match msg {
                    Message::Text(text) => {
                        match serde_json::from_str::<ClientSignal>(text.as_str()) {
                            Ok(signal) => {
                                if let Err(e) =
                                    relay.signal(identity.clone(), connection_id, signal).await
                                {
                                    error!("Relay died: {}", e);
                                    break;
                                }
                            }
                            Err(e) => warn!("Malformed message from {}: {}", identity, e),
                        }
                    }
                    Message::Close(_) => break,
                    _ => {}
                }
            }
        }
    });

    tokio::select! {
        _ = (&mut send_task) => recv_task.abort(),
        _ = (&mut recv_task) => send_task.abort(),
    };

    let _ = relay.disconnect(identity.clone(), connection_id).await;
    info!("WebSocket disconnected: {} ({})", identity, connection_id);
}
