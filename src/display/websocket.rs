//! WebSocket link to Hime Display (`ws://localhost:8765` by default).

use super::link::RemoteLink;
use super::protocol::{CommandResponse, DisplayCommand};
use crate::config::DisplayConfig;
use crate::error::LinkError;
use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

pub struct WebSocketLink {
    url: String,
    connect_timeout: Duration,
    request_timeout: Duration,
    stream: Mutex<Option<WsStream>>,
    connected: AtomicBool,
}

impl WebSocketLink {
    pub fn new(config: &DisplayConfig) -> Self {
        Self {
            url: config.ws_url.clone(),
            connect_timeout: Duration::from_millis(config.connect_timeout_ms),
            request_timeout: Duration::from_millis(config.request_timeout_ms),
            stream: Mutex::new(None),
            connected: AtomicBool::new(false),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Open a socket and swallow the greeting. Caller holds the stream lock.
    async fn open(&self) -> Result<WsStream, LinkError> {
        let timeout_ms = self.connect_timeout.as_millis() as u64;
        let (mut ws, _) = tokio::time::timeout(self.connect_timeout, connect_async(self.url.as_str()))
            .await
            .map_err(|_| LinkError::ConnectTimeout(timeout_ms))?
            .map_err(|e| LinkError::Connect {
                url: self.url.clone(),
                reason: e.to_string(),
            })?;

        let greeting = tokio::time::timeout(self.connect_timeout, next_text(&mut ws))
            .await
            .map_err(|_| LinkError::ConnectTimeout(timeout_ms))??;
        debug!("[Display] Greeting: {}", truncate(&greeting, 120));

        info!("[Display] Connected to {}", self.url);
        Ok(ws)
    }

    async fn round_trip(
        &self,
        ws: &mut WsStream,
        command: &DisplayCommand,
    ) -> Result<CommandResponse, LinkError> {
        let frame = serde_json::to_string(command)?;
        ws.send(Message::Text(frame))
            .await
            .map_err(|e| LinkError::Send(e.to_string()))?;

        let reply = tokio::time::timeout(self.request_timeout, next_text(ws))
            .await
            .map_err(|_| LinkError::RequestTimeout {
                action: command.action().to_string(),
                timeout_ms: self.request_timeout.as_millis() as u64,
            })??;

        let value: serde_json::Value = serde_json::from_str(&reply)
            .map_err(|e| LinkError::Protocol(format!("{} — {}", e, truncate(&reply, 200))))?;
        if !value.is_object() {
            return Err(LinkError::Protocol(format!(
                "expected a JSON object, got {}",
                truncate(&reply, 200)
            )));
        }
        Ok(CommandResponse::from_value(&value))
    }
}

#[async_trait]
impl RemoteLink for WebSocketLink {
    async fn connect(&self) -> Result<(), LinkError> {
        let mut guard = self.stream.lock().await;
        if guard.is_some() {
            return Ok(());
        }
        match self.open().await {
            Ok(ws) => {
                *guard = Some(ws);
                self.connected.store(true, Ordering::SeqCst);
                Ok(())
            }
            Err(e) => {
                self.connected.store(false, Ordering::SeqCst);
                Err(e)
            }
        }
    }

    async fn send(&self, command: DisplayCommand) -> Result<CommandResponse, LinkError> {
        let mut guard = self.stream.lock().await;

        if guard.is_none() {
            match self.open().await {
                Ok(ws) => {
                    *guard = Some(ws);
                    self.connected.store(true, Ordering::SeqCst);
                }
                Err(e) => {
                    self.connected.store(false, Ordering::SeqCst);
                    return Err(e);
                }
            }
        }

        let Some(ws) = guard.as_mut() else {
            return Err(LinkError::Closed);
        };

        match self.round_trip(ws, &command).await {
            Ok(response) => Ok(response),
            Err(e) => {
                // Any failure leaves the socket in an unknown state; drop it
                // so the next command starts from a fresh connection.
                warn!("[Display] Command error ({}): {}", command.action(), e);
                *guard = None;
                self.connected.store(false, Ordering::SeqCst);
                Err(e)
            }
        }
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn close(&self) -> Result<(), LinkError> {
        self.connected.store(false, Ordering::SeqCst);
        if let Some(mut ws) = self.stream.lock().await.take() {
            match tokio::time::timeout(Duration::from_secs(5), ws.close(None)).await {
                Ok(Ok(())) => debug!("[Display] Connection closed"),
                Ok(Err(e)) => warn!("[Display] Close error: {}", e),
                Err(_) => warn!("[Display] Close timed out"),
            }
        }
        Ok(())
    }
}

/// Read frames until a text payload arrives. Control frames are skipped.
async fn next_text(ws: &mut WsStream) -> Result<String, LinkError> {
    loop {
        match ws.next().await {
            Some(Ok(Message::Text(text))) => return Ok(text),
            Some(Ok(Message::Binary(bytes))) => {
                return String::from_utf8(bytes)
                    .map_err(|e| LinkError::Protocol(format!("non-UTF-8 binary frame: {}", e)))
            }
            Some(Ok(Message::Close(_))) | None => return Err(LinkError::Closed),
            Some(Ok(_)) => continue,
            Some(Err(e)) => return Err(LinkError::Receive(e.to_string())),
        }
    }
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
