//! SockJS gateway library.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request           ┌──────────────────────────────────────────────┐
//!     ─────────────────────────┼─▶ http::server ──▶ sockjs::SockJsService     │
//!                              │                      │                        │
//!                              │        ┌─────────────┼──────────────┐         │
//!                              │        ▼             ▼              ▼         │
//!                              │   info / iframe   /websocket   /{srv}/{sess}/ │
//!                              │   (served here)   (raw hook)   {transport}    │
//!                              │                        │          │           │
//!                              │                        ▼          ▼           │
//!                              │                  transport::WebSocketTransport│
//!                              │                        │                      │
//!                              │                        ▼                      │
//!                              │                  WebSocketHandler (app)       │
//!                              │                                               │
//!                              │  config (toml, hot reload) · observability    │
//!                              │  (tracing, metrics) · lifecycle (shutdown)    │
//!                              └──────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod sockjs;
pub mod transport;

pub use config::{GatewayConfig, ServiceConfig};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use sockjs::{SockJsError, SockJsService, WebSocketHandler};
