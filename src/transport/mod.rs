//! Transport collaborators for the SockJS service.
//!
//! Only WebSocket is served here: raw `/websocket` and the SockJS framed
//! `websocket` session transport. Streaming and polling transports are
//! answered with 404.

pub mod websocket;

use std::fmt;
use std::str::FromStr;

use axum::http::Method;

use crate::sockjs::WebSocketHandler;

pub use websocket::WebSocketTransport;

/// SockJS transport names as they appear in the last URL segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportType {
    WebSocket,
    Xhr,
    XhrSend,
    XhrStreaming,
    EventSource,
    HtmlFile,
    Jsonp,
    JsonpSend,
}

impl TransportType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransportType::WebSocket => "websocket",
            TransportType::Xhr => "xhr",
            TransportType::XhrSend => "xhr_send",
            TransportType::XhrStreaming => "xhr_streaming",
            TransportType::EventSource => "eventsource",
            TransportType::HtmlFile => "htmlfile",
            TransportType::Jsonp => "jsonp",
            TransportType::JsonpSend => "jsonp_send",
        }
    }

    /// Method clients use for this transport.
    pub fn http_method(&self) -> Method {
        match self {
            TransportType::WebSocket
            | TransportType::EventSource
            | TransportType::HtmlFile
            | TransportType::Jsonp => Method::GET,
            TransportType::Xhr
            | TransportType::XhrSend
            | TransportType::XhrStreaming
            | TransportType::JsonpSend => Method::POST,
        }
    }
}

impl fmt::Display for TransportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown transport '{0}'")]
pub struct UnknownTransport(pub String);

impl FromStr for TransportType {
    type Err = UnknownTransport;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "websocket" => Ok(TransportType::WebSocket),
            "xhr" => Ok(TransportType::Xhr),
            "xhr_send" => Ok(TransportType::XhrSend),
            "xhr_streaming" => Ok(TransportType::XhrStreaming),
            "eventsource" => Ok(TransportType::EventSource),
            "htmlfile" => Ok(TransportType::HtmlFile),
            "jsonp" => Ok(TransportType::Jsonp),
            "jsonp_send" => Ok(TransportType::JsonpSend),
            other => Err(UnknownTransport(other.to_string())),
        }
    }
}

/// Sends every message straight back.
#[derive(Debug, Default, Clone, Copy)]
pub struct EchoHandler;

impl WebSocketHandler for EchoHandler {
    fn on_open(&self, session_id: &str) {
        tracing::debug!(session_id, "Session opened");
    }

    fn on_message(&self, _session_id: &str, message: String) -> Vec<String> {
        vec![message]
    }

    fn on_close(&self, session_id: &str) {
        tracing::debug!(session_id, "Session closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_names() {
        for name in [
            "websocket", "xhr", "xhr_send", "xhr_streaming", "eventsource", "htmlfile", "jsonp",
            "jsonp_send",
        ] {
            let transport: TransportType = name.parse().unwrap();
            assert_eq!(transport.to_string(), name);
        }
        assert_eq!(
            "WEBSOCKET".parse::<TransportType>(),
            Err(UnknownTransport("WEBSOCKET".into()))
        );
    }

    #[test]
    fn test_transport_methods() {
        assert_eq!(TransportType::WebSocket.http_method(), Method::GET);
        assert_eq!(TransportType::XhrSend.http_method(), Method::POST);
        assert_eq!(TransportType::EventSource.http_method(), Method::GET);
    }

    #[test]
    fn test_echo() {
        assert_eq!(EchoHandler.on_message("s", "hi".into()), vec!["hi".to_string()]);
    }
}
