//! Interfaces between the SockJS service and the code around it.
//!
//! The service only classifies requests and enforces policy. Everything that
//! involves a live connection is delegated:
//! - [`RawWebSocketHandler`]: the `/websocket` upgrade, no SockJS framing
//! - [`TransportHandler`]: `/{server}/{session}/{transport}` requests
//! - [`WebSocketHandler`]: the application, passed through untouched

use std::future::Future;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, Response};

use crate::config::ServiceConfig;
use crate::sockjs::error::SockJsResult;
use crate::sockjs::path;
use crate::sockjs::scheduler::TaskScheduler;

/// Application callbacks for messages on a session.
pub trait WebSocketHandler: Send + Sync + 'static {
    fn on_open(&self, _session_id: &str) {}

    /// Handle one inbound message, returning the messages to send back.
    fn on_message(&self, session_id: &str, message: String) -> Vec<String>;

    fn on_close(&self, _session_id: &str) {}
}

pub type SharedHandler = Arc<dyn WebSocketHandler>;

/// Everything a transport needs to know about one session request.
#[derive(Debug, Clone)]
pub struct TransportContext {
    pub server_id: String,
    pub session_id: String,
    pub transport: String,
    /// Snapshot taken when the request arrived.
    pub config: Arc<ServiceConfig>,
    pub scheduler: TaskScheduler,
}

/// Performs the WebSocket upgrade for `/websocket`.
pub trait RawWebSocketHandler: Send + Sync + 'static {
    fn handle_raw_websocket_request(
        &self,
        request: Request<Body>,
        response: &mut Response<Body>,
        handler: SharedHandler,
    ) -> impl Future<Output = std::io::Result<()>> + Send;
}

/// Serves session URLs: looks up or creates the session and drives the
/// named transport. Owns message buffering, heartbeats and disconnect timing.
pub trait TransportHandler: Send + Sync + 'static {
    /// Check the segments of a session URL before dispatch.
    ///
    /// Returning false answers the request with 404.
    fn validate_request(&self, server_id: &str, session_id: &str, transport: &str) -> bool {
        path::validate_segments(server_id, session_id, transport)
    }

    fn handle_transport_request(
        &self,
        request: Request<Body>,
        response: &mut Response<Body>,
        handler: SharedHandler,
        context: TransportContext,
    ) -> impl Future<Output = SockJsResult<()>> + Send;
}
