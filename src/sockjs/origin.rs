//! Origin checks against the configured allow-list.
//!
//! # Rules
//! - Missing or empty `Origin` header: allowed
//! - Allow-list contains "*": allowed
//! - Empty allow-list: allowed only for the request's own origin
//!   (scheme, host and port all equal)
//! - Otherwise: allowed iff the header equals one entry, case-sensitively

use axum::http::header::{HOST, ORIGIN};
use axum::http::uri::Authority;
use axum::http::Request;
use url::Url;

const X_FORWARDED_PROTO: &str = "x-forwarded-proto";

/// The scheme, host and port a request was addressed to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerOrigin {
    pub scheme: String,
    pub host: String,
    pub port: u16,
}

impl ServerOrigin {
    /// Derive the server origin from the `Host` header (or the URI authority).
    ///
    /// The scheme comes from an absolute URI, then `X-Forwarded-Proto`,
    /// and defaults to "http".
    pub fn from_request<B>(request: &Request<B>) -> Option<Self> {
        let scheme = request
            .uri()
            .scheme_str()
            .map(str::to_ascii_lowercase)
            .or_else(|| {
                request
                    .headers()
                    .get(X_FORWARDED_PROTO)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.split(',').next())
                    .map(|v| v.trim().to_ascii_lowercase())
            })
            .unwrap_or_else(|| "http".to_string());

        let authority = match request.headers().get(HOST).and_then(|h| h.to_str().ok()) {
            Some(host) => host.parse::<Authority>().ok()?,
            None => request.uri().authority()?.clone(),
        };

        let port = authority.port_u16().or_else(|| default_port(&scheme))?;
        Some(Self {
            host: authority.host().trim_matches(is_bracket).to_ascii_lowercase(),
            scheme,
            port,
        })
    }

    fn matches(&self, origin: &str) -> bool {
        let Ok(url) = Url::parse(origin) else {
            return false;
        };
        let Some(host) = url.host_str() else {
            return false;
        };
        url.scheme() == self.scheme
            && host.trim_matches(is_bracket).eq_ignore_ascii_case(&self.host)
            && url.port_or_known_default() == Some(self.port)
    }
}

fn is_bracket(c: char) -> bool {
    c == '[' || c == ']'
}

fn default_port(scheme: &str) -> Option<u16> {
    match scheme {
        "http" | "ws" => Some(80),
        "https" | "wss" => Some(443),
        _ => None,
    }
}

/// Decide whether `origin` may talk to this service.
///
/// `own_origin` is only consulted for an empty allow-list.
pub fn is_allowed(
    origin: Option<&str>,
    allowed_origins: &[String],
    own_origin: Option<&ServerOrigin>,
) -> bool {
    let origin = match origin {
        None | Some("") => return true,
        Some(origin) => origin,
    };

    if allowed_origins.iter().any(|o| o == "*") {
        return true;
    }
    if allowed_origins.is_empty() {
        return own_origin.is_some_and(|own| own.matches(origin));
    }
    allowed_origins.iter().any(|o| o == origin)
}

/// Check the `Origin` header of `request` against `allowed_origins`.
///
/// A header that is not valid UTF-8 is treated as a non-matching origin.
pub fn is_request_allowed<B>(request: &Request<B>, allowed_origins: &[String]) -> bool {
    let Some(value) = request.headers().get(ORIGIN) else {
        return true;
    };
    let Ok(origin) = value.to_str() else {
        return false;
    };
    if origin.is_empty() {
        return true;
    }

    // Only needed for the same-origin case
    let own = if allowed_origins.is_empty() {
        ServerOrigin::from_request(request)
    } else {
        None
    };
    is_allowed(Some(origin), allowed_origins, own.as_ref())
}
