//! SockJS path classification.
//!
//! Works on the path suffix left after the endpoint prefix has been removed,
//! e.g. `/info` or `/000/a1b2c3/xhr_streaming` for an endpoint at `/sockjs`.
//! The suffix is percent-decoded before any rule is applied.

use std::fmt;

use percent_encoding::percent_decode_str;

/// A classified SockJS path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SockJsPath {
    /// `""` or `"/"`: the greeting banner.
    Root,
    /// `/info`.
    Info,
    /// `/iframe*.html`, e.g. `/iframe.html` or `/iframe-0.3.4.html`.
    Iframe { filename: String },
    /// `/websocket`: WebSocket without SockJS framing.
    RawWebSocket,
    /// `/{server}/{session}/{transport}`.
    Session {
        server_id: String,
        session_id: String,
        transport: String,
    },
    Invalid(InvalidPath),
}

/// Why a path could not be classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidPath {
    WrongSegmentCount,
    DotNotAllowed,
    /// Percent-decoding did not yield UTF-8.
    BadEncoding,
}

impl fmt::Display for InvalidPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvalidPath::WrongSegmentCount => f.write_str("wrong segment count"),
            InvalidPath::DotNotAllowed => f.write_str("dot not allowed"),
            InvalidPath::BadEncoding => f.write_str("path is not UTF-8 after decoding"),
        }
    }
}

impl SockJsPath {
    /// Short label used for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            SockJsPath::Root => "root",
            SockJsPath::Info => "info",
            SockJsPath::Iframe { .. } => "iframe",
            SockJsPath::RawWebSocket => "raw_websocket",
            SockJsPath::Session { .. } => "session",
            SockJsPath::Invalid(_) => "invalid",
        }
    }
}

/// Classify a SockJS path suffix.
pub fn classify(path: &str) -> SockJsPath {
    let Ok(decoded) = percent_decode_str(path).decode_utf8() else {
        return SockJsPath::Invalid(InvalidPath::BadEncoding);
    };
    let path = decoded.as_ref();

    if path.is_empty() || path == "/" {
        return SockJsPath::Root;
    }
    if path == "/info" {
        return SockJsPath::Info;
    }
    if is_iframe_path(path) {
        return SockJsPath::Iframe {
            filename: path[1..].to_string(),
        };
    }
    if path == "/websocket" {
        return SockJsPath::RawWebSocket;
    }

    let rest = path.strip_prefix('/').unwrap_or(path);
    let segments: Vec<&str> = rest
        .split('/')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();

    let [server_id, session_id, transport] = segments.as_slice() else {
        return SockJsPath::Invalid(InvalidPath::WrongSegmentCount);
    };
    if server_id.contains('.') || session_id.contains('.') {
        return SockJsPath::Invalid(InvalidPath::DotNotAllowed);
    }

    SockJsPath::Session {
        server_id: server_id.to_string(),
        session_id: session_id.to_string(),
        transport: transport.to_string(),
    }
}

/// Check the three segments of a session URL.
///
/// All must be non-blank; server and session ids must not contain `.`.
pub fn validate_segments(server_id: &str, session_id: &str, transport: &str) -> bool {
    if server_id.trim().is_empty() || session_id.trim().is_empty() || transport.trim().is_empty() {
        tracing::warn!("No server, session, or transport path segment in SockJS request");
        return false;
    }

    if server_id.contains('.') || session_id.contains('.') {
        tracing::warn!(
            server_id,
            session_id,
            "Either server or session contains a \".\" which is not allowed by SockJS protocol"
        );
        return false;
    }

    true
}

fn is_iframe_path(path: &str) -> bool {
    path.strip_prefix("/iframe")
        .and_then(|rest| rest.strip_suffix(".html"))
        .is_some_and(|middle| {
            middle
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '_'))
        })
}
