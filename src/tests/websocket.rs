use crate::config::DisplayConfig;
use crate::display::{DisplayCommand, RemoteLink, WebSocketLink};
use crate::error::LinkError;
use futures::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;

// ── Fake Hime Display server ────────────────────────────────

/// Greets every connection, then answers up to `per_connection` commands
/// with `{"success": true, "action": ...}` before hanging up.
async fn spawn_display(per_connection: usize) -> (SocketAddr, Arc<AtomicUsize>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let accepted = Arc::new(AtomicUsize::new(0));
    let counter = accepted.clone();

    tokio::spawn(async move {
        while let Ok((tcp, _)) = listener.accept().await {
            counter.fetch_add(1, Ordering::SeqCst);
            tokio::spawn(async move {
                let mut ws = accept_async(tcp).await.unwrap();
                ws.send(Message::Text(r#"{"type":"welcome","version":"1.0"}"#.to_string()))
                    .await
                    .unwrap();

                let mut answered = 0;
                while answered < per_connection {
                    let Some(Ok(Message::Text(text))) = ws.next().await else {
                        break;
                    };
                    let request: serde_json::Value = serde_json::from_str(&text).unwrap();
                    let reply = serde_json::json!({
                        "success": true,
                        "action": request["action"],
                    });
                    ws.send(Message::Text(reply.to_string())).await.unwrap();
                    answered += 1;
                }
                let _ = ws.close(None).await;
            });
        }
    });

    (addr, accepted)
}

fn link_to(addr: SocketAddr) -> WebSocketLink {
    WebSocketLink::new(&DisplayConfig {
        ws_url: format!("ws://{}", addr),
        connect_timeout_ms: 2000,
        request_timeout_ms: 2000,
    })
}

// ── Round-trips ─────────────────────────────────────────────

#[tokio::test]
async fn test_greeting_is_discarded_before_first_reply() {
    let (addr, _) = spawn_display(usize::MAX).await;
    let link = link_to(addr);

    link.connect().await.unwrap();
    assert!(link.is_connected());

    let response = link
        .send(DisplayCommand::set_parameter("ParamAngleX", 0.0))
        .await
        .unwrap();
    assert!(response.is_success());

    let response = link
        .send(DisplayCommand::play_random_motion("idle"))
        .await
        .unwrap();
    assert!(response.is_success());

    link.close().await.unwrap();
    assert!(!link.is_connected());
}

#[tokio::test]
async fn test_send_connects_lazily() {
    let (addr, accepted) = spawn_display(usize::MAX).await;
    let link = link_to(addr);
    assert!(!link.is_connected());

    let response = link
        .send(DisplayCommand::SetAutoBreath { enabled: true })
        .await
        .unwrap();
    assert!(response.is_success());
    assert!(link.is_connected());
    assert_eq!(accepted.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_reconnects_after_server_hangs_up() {
    let (addr, accepted) = spawn_display(1).await;
    let link = link_to(addr);

    assert!(link
        .send(DisplayCommand::ShowDisplay {})
        .await
        .unwrap()
        .is_success());

    // The server has hung up; this command is lost and the link resets.
    assert!(link.send(DisplayCommand::ShowDisplay {}).await.is_err());
    assert!(!link.is_connected());

    assert!(link
        .send(DisplayCommand::ShowDisplay {})
        .await
        .unwrap()
        .is_success());
    assert_eq!(accepted.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_unreachable_display_is_an_error_not_a_panic() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let link = link_to(addr);
    let err = link.connect().await.unwrap_err();
    assert!(matches!(
        err,
        LinkError::Connect { .. } | LinkError::ConnectTimeout(_)
    ));
    assert!(!link.is_connected());
}
