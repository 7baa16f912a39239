//! SockJS front door.
//!
//! # Data Flow
//! ```text
//! Request under the mount prefix
//!     → service.rs (entry point, config snapshot)
//!     → path.rs (classify: root, info, iframe, websocket, session)
//!     → info.rs / iframe.rs (served directly)
//!         → origin.rs + cors.rs + cache.rs (policy and headers)
//!     → handler.rs collaborators (raw websocket, transports)
//! ```
//!
//! # Design Decisions
//! - Malformed requests all get a bare 404; details only go to the log
//! - One config snapshot per request, so reloads are never seen half-applied
//! - No per-request state outlives the request

pub mod cache;
pub mod cors;
pub mod error;
pub mod handler;
pub mod iframe;
pub mod info;
pub mod origin;
pub mod path;
pub mod scheduler;
pub mod service;

use axum::http::header::ALLOW;
use axum::http::{HeaderValue, Method, Response, StatusCode};

pub use error::{SockJsError, SockJsResult};
pub use handler::{
    RawWebSocketHandler, SharedHandler, TransportContext, TransportHandler, WebSocketHandler,
};
pub use path::{InvalidPath, SockJsPath};
pub use scheduler::{ScheduledTask, TaskScheduler};
pub use service::SockJsService;

/// Answer 405 with an `Allow` header listing `methods`.
pub fn method_not_allowed<B>(response: &mut Response<B>, methods: &[Method]) {
    tracing::warn!("Sending Method Not Allowed (405)");
    *response.status_mut() = StatusCode::METHOD_NOT_ALLOWED;
    if let Ok(allow) = HeaderValue::from_str(&cors::join_methods(methods)) {
        response.headers_mut().insert(ALLOW, allow);
    }
}
