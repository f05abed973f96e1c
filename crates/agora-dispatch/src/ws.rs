//! `WebSocket` adapter between frontend endpoints and the [`Dispatcher`].
//!
//! Each endpoint connects to `GET /ws` and must open with a `hello`
//! frame naming its agent. The handler then registers the endpoint,
//! answers `hello_ack`, and shuttles frames both ways until either side
//! closes. Malformed frames are logged and skipped.

use std::sync::Arc;

use agora_types::{AgentId, WireMessage};
use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use chrono::Utc;
use tracing::{debug, info, warn};

use crate::dispatcher::Dispatcher;

/// Upgrade an HTTP request to a dispatch `WebSocket`.
///
/// # Route
///
/// `GET /ws`
pub async fn ws_endpoint(
    ws: WebSocketUpgrade,
    State(dispatcher): State<Arc<Dispatcher>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, dispatcher))
}

/// Drive one endpoint connection from `hello` to close.
async fn handle_socket(mut socket: WebSocket, dispatcher: Arc<Dispatcher>) {
    let Some(agent_id) = await_hello(&mut socket).await else {
        debug!("WebSocket closed before hello");
        return;
    };

    let registration = dispatcher.register(agent_id.clone()).await;
    let connection = registration.connection;
    let mut outbound = registration.outbound;

    let hello_ack = WireMessage::HelloAck {
        server_time: Utc::now(),
    };
    if send_frame(&mut socket, &hello_ack).await.is_err() {
        dispatcher.unregister(&agent_id, connection).await;
        return;
    }
    info!(agent_id = %agent_id, connection, "Endpoint connected");

    loop {
        tokio::select! {
            frame = outbound.recv() => {
                let Some(frame) = frame else {
                    debug!(agent_id = %agent_id, "Outbound channel closed");
                    break;
                };
                if send_frame(&mut socket, &frame).await.is_err() {
                    debug!(agent_id = %agent_id, "WebSocket send failed");
                    break;
                }
            }
            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        match serde_json::from_str::<WireMessage>(text.as_str()) {
                            Ok(frame) => dispatcher.handle_inbound(&agent_id, frame).await,
                            Err(e) => warn!(agent_id = %agent_id, error = %e, "Malformed frame"),
                        }
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if socket.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        debug!(agent_id = %agent_id, "WebSocket client disconnected");
                        break;
                    }
                    Some(Err(e)) => {
                        debug!(agent_id = %agent_id, error = %e, "WebSocket error");
                        break;
                    }
                    Some(Ok(_)) => {}
                }
            }
        }
    }

    dispatcher.unregister(&agent_id, connection).await;
    info!(agent_id = %agent_id, connection, "Endpoint disconnected");
}

/// Read frames until a `hello` arrives or the socket closes.
async fn await_hello(socket: &mut WebSocket) -> Option<AgentId> {
    while let Some(msg) = socket.recv().await {
        match msg {
            Ok(Message::Text(text)) => match serde_json::from_str::<WireMessage>(text.as_str()) {
                Ok(WireMessage::Hello { agent_id }) => return Some(agent_id),
                Ok(other) => debug!(frame = ?other, "Ignoring frame before hello"),
                Err(e) => warn!(error = %e, "Malformed frame before hello"),
            },
            Ok(Message::Close(_)) | Err(_) => return None,
            Ok(_) => {}
        }
    }
    None
}

async fn send_frame(socket: &mut WebSocket, frame: &WireMessage) -> Result<(), axum::Error> {
    match serde_json::to_string(frame) {
        Ok(json) => socket.send(Message::Text(json.into())).await,
        Err(e) => {
            warn!(error = %e, "Failed to serialize frame");
            Ok(())
        }
    }
}
