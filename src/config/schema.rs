//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default location of the SockJS client library loaded by the iframe page.
pub const DEFAULT_CLIENT_LIBRARY_URL: &str = "https://cdn.jsdelivr.net/sockjs/0.3.4/sockjs.min.js";

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address, mount prefix).
    pub listener: ListenerConfig,

    /// SockJS service settings.
    pub sockjs: ServiceConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Path prefix the SockJS endpoint is mounted at (e.g., "/sockjs").
    pub path_prefix: String,

    /// Maximum request body size in bytes.
    pub max_body_size: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            path_prefix: "/sockjs".to_string(),
            max_body_size: 2 * 1024 * 1024, // 2MB
        }
    }
}

/// SockJS service configuration.
///
/// Read on every request, replaced only as a whole snapshot
/// (see [`SockJsService::update_config`](crate::sockjs::SockJsService::update_config)).
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ServiceConfig {
    /// Unique name of the service, mainly for logging.
    pub name: String,

    /// URL of the SockJS client library loaded by the iframe page.
    ///
    /// May be relative to the iframe URL, e.g. "../../sockjs.min.js" when the
    /// endpoint is mounted at "/sockjs".
    pub client_library_url: String,

    /// Bytes a streaming transport may send over one HTTP response before
    /// the client has to reconnect.
    pub stream_bytes_limit: usize,

    /// Reported to clients as "cookie_needed" by the info endpoint.
    pub session_cookie_needed: bool,

    /// Idle time in milliseconds after which a heartbeat frame is sent.
    pub heartbeat_interval_ms: u64,

    /// Time in milliseconds without a receiving connection before a client
    /// is considered disconnected.
    pub disconnect_delay_ms: u64,

    /// Number of server-to-client messages a session buffers between polls.
    pub http_message_cache_size: usize,

    /// Enable the WebSocket transport.
    pub websocket_enabled: bool,

    /// Allowed `Origin` header values. Empty means same origin only,
    /// a "*" entry allows every origin.
    pub allowed_origins: Vec<String>,

    /// Skip automatic CORS response headers.
    pub suppress_cors: bool,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: format!("SockJSService@{:08x}", fastrand::u32(..)),
            client_library_url: DEFAULT_CLIENT_LIBRARY_URL.to_string(),
            stream_bytes_limit: 128 * 1024,
            session_cookie_needed: true,
            heartbeat_interval_ms: 25_000,
            disconnect_delay_ms: 5_000,
            http_message_cache_size: 100,
            websocket_enabled: true,
            allowed_origins: Vec::new(),
            suppress_cors: false,
        }
    }
}

impl ServiceConfig {
    /// Start building a config from the defaults.
    pub fn builder() -> ServiceConfigBuilder {
        ServiceConfigBuilder::default()
    }

    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_millis(self.heartbeat_interval_ms)
    }

    pub fn disconnect_delay(&self) -> Duration {
        Duration::from_millis(self.disconnect_delay_ms)
    }

    /// True when origins are restricted to an explicit list (no "*").
    ///
    /// Iframe based transports cannot check the request origin, so they are
    /// disabled in this mode.
    pub fn restricts_origins(&self) -> bool {
        !self.allowed_origins.is_empty() && !self.allows_any_origin()
    }

    pub fn allows_any_origin(&self) -> bool {
        self.allowed_origins.iter().any(|o| o == "*")
    }
}

/// Fluent builder for [`ServiceConfig`].
#[derive(Debug, Clone, Default)]
pub struct ServiceConfigBuilder {
    config: ServiceConfig,
}

impl ServiceConfigBuilder {
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.config.name = name.into();
        self
    }

    pub fn client_library_url(mut self, url: impl Into<String>) -> Self {
        self.config.client_library_url = url.into();
        self
    }

    pub fn stream_bytes_limit(mut self, limit: usize) -> Self {
        self.config.stream_bytes_limit = limit;
        self
    }

    pub fn session_cookie_needed(mut self, needed: bool) -> Self {
        self.config.session_cookie_needed = needed;
        self
    }

    pub fn heartbeat_interval(mut self, interval: Duration) -> Self {
        self.config.heartbeat_interval_ms = saturating_millis(interval);
        self
    }

    pub fn disconnect_delay(mut self, delay: Duration) -> Self {
        self.config.disconnect_delay_ms = saturating_millis(delay);
        self
    }

    pub fn http_message_cache_size(mut self, size: usize) -> Self {
        self.config.http_message_cache_size = size;
        self
    }

    pub fn websocket_enabled(mut self, enabled: bool) -> Self {
        self.config.websocket_enabled = enabled;
        self
    }

    pub fn allowed_origins<I, S>(mut self, origins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.allowed_origins = origins.into_iter().map(Into::into).collect();
        self
    }

    pub fn suppress_cors(mut self, suppress: bool) -> Self {
        self.config.suppress_cors = suppress;
        self
    }

    pub fn build(self) -> ServiceConfig {
        self.config
    }
}

fn saturating_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: true,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
