//! HTTP integration.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware)
//!     → prefix stripped, fresh 200 response created
//!     → sockjs::SockJsService::handle_request
//!     → Send to client (or upgrade to WebSocket)
//! ```

pub mod server;

pub use server::{sockjs_router, HttpServer};
