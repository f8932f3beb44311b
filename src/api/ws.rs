//! Live analysis over WebSocket
//!
//! Every client may submit prompts; each analysis result is broadcast to all
//! connected clients.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use chrono::Utc;
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::json;
use tokio::sync::{broadcast, mpsc};

use crate::api::AppState;
use crate::models::AnalysisRequest;

const BROADCAST_CAPACITY: usize = 64;

/// Incoming frame
#[derive(Debug, Deserialize)]
struct LiveRequest {
    #[serde(default)]
    text: String,
    #[serde(default)]
    use_llm: bool,
}

/// Fan-out hub for connected clients
pub struct LiveHub {
    sender: broadcast::Sender<String>,
    next_id: AtomicU64,
    connected: AtomicUsize,
}

impl LiveHub {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self {
            sender,
            next_id: AtomicU64::new(1),
            connected: AtomicUsize::new(0),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<String> {
        self.sender.subscribe()
    }

    /// Send a message to every connected client; returns the receiver count
    pub fn broadcast(&self, message: String) -> usize {
        self.sender.send(message).unwrap_or(0)
    }

    pub fn connected(&self) -> usize {
        self.connected.load(Ordering::Relaxed)
    }

    fn register(&self) -> String {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.connected.fetch_add(1, Ordering::Relaxed);
        format!("client-{}", id)
    }

    fn unregister(&self, client_id: &str) {
        self.connected.fetch_sub(1, Ordering::Relaxed);
        tracing::info!("WebSocket disconnected: {}", client_id);
    }
}

impl Default for LiveHub {
    fn default() -> Self {
        Self::new()
    }
}

pub async fn websocket(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let client_id = state.live.register();
    tracing::info!("WebSocket connected: {}", client_id);

    let (mut sink, mut stream) = socket.split();
    let mut broadcasts = state.live.subscribe();
    let (direct_tx, mut direct_rx) = mpsc::channel::<String>(16);

    let writer_id = client_id.clone();
    let mut writer = tokio::spawn(async move {
        loop {
            let outgoing = tokio::select! {
                message = broadcasts.recv() => match message {
                    Ok(message) => message,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!("[WS] {} lagged, skipped {} messages", writer_id, skipped);
                        continue;
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },
                message = direct_rx.recv() => match message {
                    Some(message) => message,
                    None => break,
                },
            };

            if let Err(e) = sink.send(Message::Text(outgoing)).await {
                tracing::warn!("Failed to send to {}: {}", writer_id, e);
                break;
            }
        }
    });

    let reader_state = state.clone();
    let reader_id = client_id.clone();
    let mut reader = tokio::spawn(async move {
        while let Some(frame) = stream.next().await {
            let text = match frame {
                Ok(Message::Text(text)) => text,
                Ok(Message::Close(_)) => break,
                Ok(_) => continue,
                Err(e) => {
                    tracing::error!("[WS] Error with client {}: {}", reader_id, e);
                    break;
                }
            };

            if let Some(reply) = handle_frame(&reader_state, &reader_id, &text).await {
                if direct_tx.send(reply).await.is_err() {
                    break;
                }
            }
        }
    });

    // Whichever half finishes first ends the session.
    tokio::select! {
        _ = &mut writer => reader.abort(),
        _ = &mut reader => writer.abort(),
    }

    state.live.unregister(&client_id);
}

/// Process one client frame
///
/// A successful analysis is broadcast to every client. Otherwise the error
/// frame meant for the sender alone is returned.
pub async fn handle_frame(state: &AppState, client_id: &str, frame: &str) -> Option<String> {
    match analyze_frame(state, client_id, frame).await {
        Ok(result) => {
            state.live.broadcast(result);
            None
        }
        Err(message) => {
            tracing::warn!("[WS] Rejected frame from {}: {}", client_id, message);
            Some(json!({"type": "error", "message": message}).to_string())
        }
    }
}

async fn analyze_frame(state: &AppState, client_id: &str, frame: &str) -> Result<String, String> {
    let request: LiveRequest =
        serde_json::from_str(frame).map_err(|e| format!("Invalid message: {}", e))?;

    let request = AnalysisRequest::new(request.text, request.use_llm);
    let text = request.normalized_text().map_err(|e| e.to_string())?;

    let preview: String = text.chars().take(50).collect();
    tracing::info!("[WS] Analyzing prompt from {}: {}...", client_id, preview);

    let result = state.service.analyze_text(text, request.use_llm).await;

    Ok(json!({
        "type": "analysis_result",
        "data": {
            "issues": result.issues,
            "quality_score": result.quality_score,
            "token_count": result.token_count,
        },
        "timestamp": Utc::now().to_rfc3339(),
    })
    .to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;
    use std::time::Duration;

    use serde_json::Value;

    use crate::analysis::TokenCounter;
    use crate::cache::CacheManager;
    use crate::config::Config;
    use crate::service::PromptService;

    fn state() -> AppState {
        let service = PromptService::new(
            Config::default(),
            None,
            CacheManager::disabled(),
            TokenCounter::approximate(),
        )
        .unwrap();
        AppState::new(Arc::new(service))
    }

    #[tokio::test]
    async fn test_analysis_frame_shape() {
        let state = state();
        let frame = analyze_frame(&state, "client-1", r#"{"text": "  analyze data "}"#)
            .await
            .unwrap();
        let frame: Value = serde_json::from_str(&frame).unwrap();

        assert_eq!(frame["type"], "analysis_result");
        assert_eq!(frame["data"]["quality_score"], 60);
        assert_eq!(frame["data"]["issues"].as_array().unwrap().len(), 3);
        assert!(frame["data"]["token_count"].as_u64().unwrap() > 0);
        assert!(frame["data"].get("analyzed_at").is_none());
        assert!(chrono::DateTime::parse_from_rfc3339(frame["timestamp"].as_str().unwrap()).is_ok());
    }

    #[tokio::test]
    async fn test_bad_frames_are_errors() {
        let state = state();

        let err = analyze_frame(&state, "client-1", "not json").await.unwrap_err();
        assert!(err.starts_with("Invalid message"));

        let err = analyze_frame(&state, "client-1", r#"{"text": "   "}"#)
            .await
            .unwrap_err();
        assert!(err.contains("empty or whitespace"));

        assert!(analyze_frame(&state, "client-1", "{}").await.is_err());
    }

    #[tokio::test]
    async fn test_error_reply_goes_to_sender_only() {
        let state = state();
        let mut other = state.live.subscribe();

        let reply = handle_frame(&state, "client-1", "{oops").await.unwrap();
        let reply: Value = serde_json::from_str(&reply).unwrap();
        assert_eq!(reply["type"], "error");
        assert!(reply["message"].is_string());

        assert!(matches!(
            other.try_recv(),
            Err(broadcast::error::TryRecvError::Empty)
        ));
    }

    #[tokio::test]
    async fn test_result_broadcast_to_all() {
        let state = state();
        let mut first = state.live.subscribe();
        let mut second = state.live.subscribe();

        assert!(handle_frame(&state, "client-1", r#"{"text": "check this"}"#)
            .await
            .is_none());

        for receiver in [&mut first, &mut second] {
            let frame = tokio::time::timeout(Duration::from_secs(1), receiver.recv())
                .await
                .unwrap()
                .unwrap();
            let frame: Value = serde_json::from_str(&frame).unwrap();
            assert_eq!(frame["type"], "analysis_result");
            assert_eq!(frame["data"]["quality_score"], 65);
        }
    }

    #[tokio::test]
    async fn test_hub_broadcast() {
        let hub = LiveHub::new();
        assert_eq!(hub.broadcast("nobody".to_string()), 0);

        let mut first = hub.subscribe();
        let mut second = hub.subscribe();
        assert_eq!(hub.broadcast("hello".to_string()), 2);
        assert_eq!(first.recv().await.unwrap(), "hello");
        assert_eq!(second.recv().await.unwrap(), "hello");
    }

    #[test]
    fn test_client_registration() {
        let hub = LiveHub::new();
        let a = hub.register();
        let b = hub.register();
        assert_ne!(a, b);
        assert_eq!(hub.connected(), 2);
        hub.unregister(&a);
        assert_eq!(hub.connected(), 1);
    }
}
