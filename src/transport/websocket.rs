//! WebSocket transport.
//!
//! # Responsibilities
//! - Complete the upgrade handshake for `/websocket` and session URLs
//! - Raw mode: text frames go to the handler as-is, replies go back as-is
//! - Session mode: SockJS framing (`o`, `h`, `a[...]`, `c[...]`) with
//!   heartbeats scheduled on the service's [`TaskScheduler`]
//!
//! # Data Flow
//! ```text
//! Client ──── text frame ────→ WebSocketHandler::on_message
//! Client ←─── replies ──────── writer task ←── heartbeat task
//! ```

use std::str::FromStr;

use axum::body::Body;
use axum::extract::ws::{Message, Utf8Bytes, WebSocket, WebSocketUpgrade};
use axum::extract::FromRequestParts;
use axum::http::{Request, Response, StatusCode};
use axum::response::IntoResponse;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::config::ServiceConfig;
use crate::sockjs::{
    RawWebSocketHandler, SharedHandler, SockJsResult, TransportContext, TransportHandler,
};
use crate::transport::TransportType;

const OPEN_FRAME: &str = "o";
const HEARTBEAT_FRAME: &str = "h";
const GO_AWAY_FRAME: &str = "c[3000,\"Go away!\"]";

/// WebSocket collaborator for both raw and SockJS session requests.
#[derive(Debug, Default, Clone, Copy)]
pub struct WebSocketTransport;

impl RawWebSocketHandler for WebSocketTransport {
    async fn handle_raw_websocket_request(
        &self,
        request: Request<Body>,
        response: &mut Response<Body>,
        handler: SharedHandler,
    ) -> std::io::Result<()> {
        let Some(upgrade) = upgrade(request, response).await else {
            return Ok(());
        };
        let session_id = Uuid::new_v4().to_string();
        *response = upgrade.on_upgrade(move |socket| run_raw(socket, handler, session_id));
        Ok(())
    }
}

impl TransportHandler for WebSocketTransport {
    async fn handle_transport_request(
        &self,
        request: Request<Body>,
        response: &mut Response<Body>,
        handler: SharedHandler,
        context: TransportContext,
    ) -> SockJsResult<()> {
        match TransportType::from_str(&context.transport) {
            Ok(transport @ TransportType::WebSocket) => {
                if *request.method() != transport.http_method() {
                    tracing::debug!(
                        session_id = %context.session_id,
                        method = %request.method(),
                        "HTTP method not supported by transport"
                    );
                    *response.status_mut() = StatusCode::NOT_FOUND;
                    return Ok(());
                }
            }
            Ok(other) => {
                tracing::debug!(session_id = %context.session_id, transport = %other, "Transport not supported");
                *response.status_mut() = StatusCode::NOT_FOUND;
                return Ok(());
            }
            Err(e) => {
                tracing::warn!(session_id = %context.session_id, error = %e, "Unknown transport");
                *response.status_mut() = StatusCode::NOT_FOUND;
                return Ok(());
            }
        }

        let Some(upgrade) = upgrade(request, response).await else {
            return Ok(());
        };
        *response = upgrade.on_upgrade(move |socket| run_session(socket, handler, context));
        Ok(())
    }
}

/// Extract the upgrade, or write the rejection into `response`.
async fn upgrade(request: Request<Body>, response: &mut Response<Body>) -> Option<WebSocketUpgrade> {
    let (mut parts, _body) = request.into_parts();
    match WebSocketUpgrade::from_request_parts(&mut parts, &()).await {
        Ok(upgrade) => Some(upgrade),
        Err(rejection) => {
            tracing::debug!(error = %rejection, "WebSocket upgrade rejected");
            *response = rejection.into_response();
            None
        }
    }
}

async fn run_raw(mut socket: WebSocket, handler: SharedHandler, session_id: String) {
    handler.on_open(&session_id);

    'read: while let Some(Ok(message)) = socket.recv().await {
        match message {
            Message::Text(text) => {
                for reply in handler.on_message(&session_id, text.to_string()) {
                    if socket.send(Message::Text(Utf8Bytes::from(reply))).await.is_err() {
                        break 'read;
                    }
                }
            }
            Message::Close(_) => break,
            _ => {}
        }
    }

    handler.on_close(&session_id);
}

async fn run_session(socket: WebSocket, handler: SharedHandler, context: TransportContext) {
    let session_id = context.session_id;
    let (mut sink, mut stream) = socket.split();
    let (tx, mut rx) = mpsc::channel::<Message>(outbound_capacity(&context.config));

    let writer = tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            let closing = matches!(frame, Message::Close(_));
            if sink.send(frame).await.is_err() || closing {
                break;
            }
        }
    });

    let _ = tx.send(text_frame(OPEN_FRAME)).await;
    let heartbeat_tx = tx.clone();
    let heartbeat = context.scheduler.schedule_with_fixed_delay(
        context.config.heartbeat_interval(),
        move || {
            let tx = heartbeat_tx.clone();
            async move {
                // A full queue already has frames on the way to the client.
                let _ = tx.try_send(text_frame(HEARTBEAT_FRAME));
            }
        },
    );
    handler.on_open(&session_id);

    'read: while let Some(Ok(message)) = stream.next().await {
        match message {
            Message::Text(text) => match decode_messages(text.as_str()) {
                Ok(messages) => {
                    for message in messages {
                        let replies = handler.on_message(&session_id, message);
                        if let Some(frame) = encode_messages(&replies) {
                            if tx.send(Message::Text(Utf8Bytes::from(frame))).await.is_err() {
                                break 'read;
                            }
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!(session_id = %session_id, error = %e, "Broken data received, closing session");
                    break;
                }
            },
            Message::Close(_) => break,
            _ => {}
        }
    }

    heartbeat.cancel();
    handler.on_close(&session_id);
    let _ = tx.send(text_frame(GO_AWAY_FRAME)).await;
    let _ = tx.send(Message::Close(None)).await;
    drop(tx);
    let _ = writer.await;
}

/// Frames queued for a session before the reader waits for the client.
fn outbound_capacity(config: &ServiceConfig) -> usize {
    config.http_message_cache_size.max(1)
}

fn text_frame(frame: &'static str) -> Message {
    Message::Text(Utf8Bytes::from_static(frame))
}

/// Decode a client frame: a JSON array of strings or a single JSON string.
pub(crate) fn decode_messages(frame: &str) -> Result<Vec<String>, serde_json::Error> {
    if frame.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str::<Vec<String>>(frame)
        .or_else(|_| serde_json::from_str::<String>(frame).map(|m| vec![m]))
}

/// Encode replies as an `a[...]` frame; `None` when there is nothing to send.
pub(crate) fn encode_messages(messages: &[String]) -> Option<String> {
    if messages.is_empty() {
        return None;
    }
    serde_json::to_string(messages).ok().map(|json| format!("a{json}"))
}
