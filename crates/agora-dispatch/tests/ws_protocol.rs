//! End-to-end tests of the dispatch protocol over a real `WebSocket`.
//!
//! The server binds port 0 on localhost. The endpoint side uses a
//! blocking `tungstenite` client on a blocking thread, playing the part
//! of the frontend.

#![allow(clippy::unwrap_used)]

use std::net::TcpStream;
use std::sync::Arc;
use std::time::Duration;

use agora_dispatch::{DispatchConfig, Dispatcher, ServerConfig, build_router, spawn_server};
use agora_types::{AgentId, CommandKind, CommandRequest, LocationId};
use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{Value, json};
use tower::ServiceExt;
use tungstenite::stream::MaybeTlsStream;
use tungstenite::{Message, WebSocket};

type Client = WebSocket<MaybeTlsStream<TcpStream>>;

fn read_json(socket: &mut Client) -> Value {
    loop {
        if let Message::Text(text) = socket.read().unwrap() {
            return serde_json::from_str(&text).unwrap();
        }
    }
}

fn send_json(socket: &mut Client, value: &Value) {
    socket.send(Message::Text(value.to_string())).unwrap();
}

fn local_config() -> ServerConfig {
    ServerConfig {
        host: String::from("127.0.0.1"),
        port: 0,
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn hello_command_complete_round_trip() {
    let dispatcher = Arc::new(Dispatcher::new(DispatchConfig::default()));
    let (addr, server) = spawn_server(&local_config(), Arc::clone(&dispatcher))
        .await
        .unwrap();

    let client = tokio::task::spawn_blocking(move || {
        let (mut socket, _) = tungstenite::connect(format!("ws://{addr}/ws")).unwrap();
        send_json(&mut socket, &json!({"type": "hello", "agent_id": "agent-1"}));
        let hello_ack = read_json(&mut socket);
        assert_eq!(hello_ack["type"], "hello_ack");

        let command = loop {
            let frame = read_json(&mut socket);
            if frame["type"] == "command" {
                break frame;
            }
        };
        let action_id = command["action_id"].clone();
        send_json(&mut socket, &json!({"type": "ack", "action_id": action_id}));
        send_json(
            &mut socket,
            &json!({
                "type": "complete",
                "agent_id": "agent-1",
                "action_id": action_id,
                "status": "ok",
            }),
        );
        command
    });

    let agent = AgentId::from("agent-1");
    dispatcher
        .wait_for_endpoints(std::slice::from_ref(&agent), Duration::from_secs(5))
        .await
        .unwrap();
    let request = CommandRequest::new(CommandKind::GoTo, "cashier", LocationId::from("river"));
    let ack = dispatcher.send(&agent, request).await.unwrap();

    let command = client.await.unwrap();
    assert_eq!(command["cmd"], "go_to");
    assert_eq!(command["target"], "cashier");
    assert_eq!(command["cur_location"], "river");
    assert_eq!(command["action_id"], ack.action_id.to_string());

    dispatcher.shutdown().await;
    tokio::time::timeout(Duration::from_secs(5), server)
        .await
        .unwrap()
        .unwrap()
        .unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn disconnect_unregisters_endpoint() {
    let dispatcher = Arc::new(Dispatcher::new(DispatchConfig::default()));
    let (addr, _server) = spawn_server(&local_config(), Arc::clone(&dispatcher))
        .await
        .unwrap();
    let agent = AgentId::from("agent-2");

    let (tx, rx) = std::sync::mpsc::channel::<()>();
    let client = tokio::task::spawn_blocking(move || {
        let (mut socket, _) = tungstenite::connect(format!("ws://{addr}/ws")).unwrap();
        send_json(&mut socket, &json!({"type": "hello", "agent_id": "agent-2"}));
        assert_eq!(read_json(&mut socket)["type"], "hello_ack");
        rx.recv().unwrap();
        socket.close(None).unwrap();
        let _ = socket.flush();
    });

    dispatcher
        .wait_for_endpoints(std::slice::from_ref(&agent), Duration::from_secs(5))
        .await
        .unwrap();
    tx.send(()).unwrap();
    client.await.unwrap();

    let mut gone = false;
    for _ in 0..50 {
        if !dispatcher.is_connected(&agent).await {
            gone = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert!(gone);
    dispatcher.shutdown().await;
}

#[tokio::test]
async fn endpoints_route_lists_connected_agents() {
    let dispatcher = Arc::new(Dispatcher::new(DispatchConfig::default()));
    let _registration = dispatcher.register(AgentId::from("agent-3")).await;
    let router = build_router(Arc::clone(&dispatcher));

    let response = router
        .oneshot(Request::builder().uri("/endpoints").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let agents: Vec<String> = serde_json::from_slice(&body).unwrap();
    assert_eq!(agents, vec![String::from("agent-3")]);
}
