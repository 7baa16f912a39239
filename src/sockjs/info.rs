//! The `/info` endpoint.

use axum::body::Body;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderValue, Method, Request, Response, StatusCode};
use serde::Serialize;

use crate::config::ServiceConfig;
use crate::sockjs::cache::{add_cache_headers, add_no_cache_headers};
use crate::sockjs::cors::{check_and_add_cors_headers, CorsSettings};
use crate::sockjs::method_not_allowed;

pub(crate) const APPLICATION_JSON_UTF8: &str = "application/json;charset=UTF-8";

/// Capabilities reported to the client before it picks a transport.
#[derive(Debug, Serialize)]
pub struct InfoResponse {
    pub entropy: i32,
    pub origins: [&'static str; 1],
    pub cookie_needed: bool,
    pub websocket: bool,
}

impl InfoResponse {
    /// Fresh response with new entropy; never reuse one across requests.
    pub fn new(config: &ServiceConfig) -> Self {
        Self {
            entropy: rand::random(),
            origins: ["*:*"],
            cookie_needed: config.session_cookie_needed,
            websocket: config.websocket_enabled,
        }
    }
}

/// Answer `GET /info` and its `OPTIONS` preflight.
pub fn handle_info<B>(
    request: &Request<B>,
    response: &mut Response<Body>,
    config: &ServiceConfig,
) -> std::io::Result<()> {
    let cors = CorsSettings::from(config);

    if *request.method() == Method::GET {
        add_no_cache_headers(response);
        if check_and_add_cors_headers(request, response, cors, &[Method::GET]) {
            let content = serde_json::to_vec(&InfoResponse::new(config))?;
            response
                .headers_mut()
                .insert(CONTENT_TYPE, HeaderValue::from_static(APPLICATION_JSON_UTF8));
            *response.body_mut() = Body::from(content);
        }
    } else if *request.method() == Method::OPTIONS {
        if check_and_add_cors_headers(request, response, cors, &[Method::OPTIONS, Method::GET]) {
            add_cache_headers(response);
            *response.status_mut() = StatusCode::NO_CONTENT;
        }
    } else {
        method_not_allowed(response, &[Method::OPTIONS, Method::GET]);
    }
    Ok(())
}
