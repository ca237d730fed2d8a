//! WebSocket handler for playing at the table.
//!
//! # Connection Flow
//!
//! 1. Client connects via `GET /play`
//! 2. Server spawns a send task that pushes a snapshot after every table
//!    change, redacted for whoever holds the seat on this connection
//! 3. Client sends `join`, then `action`, `rebuy` or `leave` messages
//! 4. On disconnect the seat is given up as if the player folded
//!
//! # Example
//!
//! ```javascript
//! const ws = new WebSocket('ws://localhost:6969/play');
//!
//! ws.onmessage = (event) => {
//!   const data = JSON.parse(event.data);
//!   if (data.type === "snapshot") {
//!     updateTable(data.table);
//!   } else {
//!     handleResponse(data);
//!   }
//! };
//!
//! ws.send(JSON.stringify({ type: "join", id: "alice", name: "Alice", buy_in: 1000 }));
//! ws.send(JSON.stringify({ type: "action", action: "raise", amount: 100 }));
//! ```

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use holdem_table::{ActionKind, Chips, PlayerId, TableError, TableSession, TableSnapshot};
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, watch};

use super::AppState;
use crate::{
    logging::{log_connection_event, log_rejection},
    metrics,
};

/// Client messages received via WebSocket
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ClientMessage {
    /// Take a seat. The name defaults to the id and the buy-in to the
    /// table's default.
    Join {
        id: String,
        name: Option<String>,
        buy_in: Option<Chips>,
        avatar: Option<String>,
    },
    /// Act on the current turn
    Action {
        action: ActionKind,
        amount: Option<Chips>,
    },
    /// Add chips to the stack
    Rebuy { amount: Chips },
    /// Give up the seat
    Leave,
}

/// Messages sent to the client
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ServerResponse {
    Success { message: String },
    Error { message: String },
    Snapshot { table: TableSnapshot },
}

impl ServerResponse {
    fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    fn success(message: impl Into<String>) -> Self {
        Self::Success {
            message: message.into(),
        }
    }
}

/// Upgrade an HTTP connection to a table WebSocket.
pub async fn websocket_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle an established WebSocket connection until it closes.
async fn handle_socket(socket: WebSocket, state: AppState) {
    let (mut sender, mut receiver) = socket.split();
    metrics::websocket_connections_total();
    let active = metrics::websocket_opened();
    info!("WebSocket connected ({} active)", active);

    let (response_tx, mut response_rx) = mpsc::channel::<String>(32);
    let (viewer_tx, mut viewer_rx) = watch::channel::<Option<PlayerId>>(None);
    let mut snapshots = state.session.subscribe();
    // the first loop iteration sends the current table
    snapshots.mark_changed();

    let send_task = tokio::spawn(async move {
        loop {
            tokio::select! {
                changed = snapshots.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
                changed = viewer_rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
                Some(response_json) = response_rx.recv() => {
                    if sender.send(Message::Text(response_json.into())).await.is_err() {
                        break;
                    }
                    continue;
                }
            }

            let view = {
                let snapshot = snapshots.borrow_and_update().clone();
                let viewer = viewer_rx.borrow_and_update().clone();
                snapshot.redacted_for(viewer.as_ref())
            };
            let json = match serde_json::to_string(&ServerResponse::Snapshot { table: view }) {
                Ok(j) => j,
                Err(e) => {
                    error!("Failed to serialize snapshot: {}", e);
                    continue;
                }
            };
            if sender.send(Message::Text(json.into())).await.is_err() {
                break;
            }
        }
    });

    let mut seat: Option<PlayerId> = None;
    while let Some(msg) = receiver.next().await {
        match msg {
            Ok(Message::Text(text)) => {
                metrics::websocket_messages_received();

                let response = match serde_json::from_str::<ClientMessage>(&text) {
                    Ok(client_msg) => {
                        handle_client_message(client_msg, &mut seat, &state.session).await
                    }
                    Err(e) => {
                        warn!("Failed to parse client message: {}", e);
                        Some(ServerResponse::error("Invalid message format"))
                    }
                };

                viewer_tx.send_if_modified(|viewer| {
                    if *viewer == seat {
                        return false;
                    }
                    viewer.clone_from(&seat);
                    true
                });

                if let Some(response) = response
                    && let Ok(json) = serde_json::to_string(&response)
                    && response_tx.send(json).await.is_err()
                {
                    break;
                }
            }
            Ok(Message::Close(_)) => {
                info!("WebSocket closed by client");
                break;
            }
            Err(e) => {
                error!("WebSocket error: {}", e);
                break;
            }
            _ => {}
        }
    }

    send_task.abort();

    if let Some(id) = seat {
        state.session.disconnect(&id).await;
        log_connection_event("disconnect", id.as_str(), "seat released on socket close");
        metrics::seated_players(state.session.snapshot().players.len());
    }

    let active = metrics::websocket_closed();
    info!("WebSocket disconnected ({} active)", active);
}

/// Apply one client message to the table.
///
/// Returns `None` when nothing should be reported back, which is the case
/// for an action dropped because another one was in flight.
async fn handle_client_message(
    msg: ClientMessage,
    seat: &mut Option<PlayerId>,
    session: &TableSession,
) -> Option<ServerResponse> {
    match msg {
        ClientMessage::Join {
            id,
            name,
            buy_in,
            avatar,
        } => {
            if seat.is_some() {
                return Some(ServerResponse::error("Already seated on this connection"));
            }
            if id.trim().is_empty() {
                return Some(ServerResponse::error("Player id must not be empty"));
            }

            let name = name.unwrap_or_else(|| id.clone());
            let id = PlayerId::from(id);
            match session.connect(id.clone(), &name, buy_in, avatar).await {
                Ok(player) => {
                    log_connection_event(
                        "join",
                        id.as_str(),
                        &format!("seat {}, {} chips", player.seat_idx, player.chips),
                    );
                    metrics::seated_players(session.snapshot().players.len());
                    *seat = Some(id);
                    Some(ServerResponse::success(format!(
                        "Seated at seat {}",
                        player.seat_idx
                    )))
                }
                Err(e) => {
                    metrics::connects_rejected_total(e.reason());
                    log_rejection(id.as_str(), e.reason(), &e.to_string());
                    Some(ServerResponse::error(e.to_string()))
                }
            }
        }

        ClientMessage::Action { action, amount } => {
            let Some(id) = seat.as_ref() else {
                return Some(ServerResponse::error("Join the table first"));
            };

            match session.submit_action(id, action, amount).await {
                Ok(round) => {
                    metrics::actions_accepted_total(action_label(action));
                    Some(ServerResponse::success(format!("Action accepted, {round}")))
                }
                Err(TableError::Busy) => {
                    metrics::actions_dropped_total();
                    debug!("Dropped {:?} from {}: table busy", action, id);
                    None
                }
                Err(e) => {
                    metrics::actions_rejected_total(e.reason());
                    Some(ServerResponse::error(e.to_string()))
                }
            }
        }

        ClientMessage::Rebuy { amount } => {
            let Some(id) = seat.as_ref() else {
                return Some(ServerResponse::error("Join the table first"));
            };

            match session.rebuy(id, amount).await {
                Ok(()) => Some(ServerResponse::success(format!("Added {amount} chips"))),
                Err(e) => Some(ServerResponse::error(e.to_string())),
            }
        }

        ClientMessage::Leave => {
            let Some(id) = seat.take() else {
                return Some(ServerResponse::error("Not seated"));
            };

            session.disconnect(&id).await;
            log_connection_event("leave", id.as_str(), "left the table");
            metrics::seated_players(session.snapshot().players.len());
            Some(ServerResponse::success("Left table"))
        }
    }
}

fn action_label(kind: ActionKind) -> &'static str {
    match kind {
        ActionKind::Call => "call",
        ActionKind::Check => "check",
        ActionKind::Fold => "fold",
        ActionKind::Raise => "raise",
    }
}
