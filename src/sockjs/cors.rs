//! CORS response headers for SockJS endpoints.

use axum::http::header::{
    ACCESS_CONTROL_ALLOW_CREDENTIALS, ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
    ACCESS_CONTROL_ALLOW_ORIGIN, ACCESS_CONTROL_MAX_AGE, ACCESS_CONTROL_REQUEST_HEADERS, ORIGIN,
};
use axum::http::{HeaderValue, Method, Request, Response, StatusCode};

use crate::config::ServiceConfig;
use crate::sockjs::cache::{append_vary_origin, ONE_YEAR_SECS};
use crate::sockjs::origin;

/// The config fields CORS handling depends on.
#[derive(Debug, Clone, Copy)]
pub struct CorsSettings<'a> {
    pub allowed_origins: &'a [String],
    pub suppress_cors: bool,
}

impl<'a> From<&'a ServiceConfig> for CorsSettings<'a> {
    fn from(config: &'a ServiceConfig) -> Self {
        Self {
            allowed_origins: &config.allowed_origins,
            suppress_cors: config.suppress_cors,
        }
    }
}

/// Check the request origin and add CORS headers when allowed.
///
/// Returns false, with status 403 set, if the origin is rejected. Headers are
/// left alone when CORS is suppressed or `Access-Control-Allow-Origin` is
/// already present (e.g. added by an outer CORS layer).
pub fn check_and_add_cors_headers<B, R>(
    request: &Request<B>,
    response: &mut Response<R>,
    settings: CorsSettings<'_>,
    methods: &[Method],
) -> bool {
    let Some(origin) = request.headers().get(ORIGIN) else {
        return true;
    };

    if !origin::is_request_allowed(request, settings.allowed_origins) {
        tracing::warn!(origin = ?origin, "Origin header value not allowed");
        *response.status_mut() = StatusCode::FORBIDDEN;
        return false;
    }

    let has_cors_headers = response.headers().contains_key(ACCESS_CONTROL_ALLOW_ORIGIN);
    if !settings.suppress_cors && !has_cors_headers {
        add_cors_headers(request, response, methods);
    }
    true
}

/// Unconditionally add CORS headers echoing the request origin.
pub fn add_cors_headers<B, R>(request: &Request<B>, response: &mut Response<R>, methods: &[Method]) {
    let request_headers = request.headers();
    let headers = response.headers_mut();

    if let Some(origin) = request_headers.get(ORIGIN) {
        headers.append(ACCESS_CONTROL_ALLOW_ORIGIN, origin.clone());
    }
    headers.append(ACCESS_CONTROL_ALLOW_CREDENTIALS, HeaderValue::from_static("true"));

    for requested in request_headers.get_all(ACCESS_CONTROL_REQUEST_HEADERS) {
        headers.append(ACCESS_CONTROL_ALLOW_HEADERS, requested.clone());
    }

    if !methods.is_empty() {
        if let Ok(value) = HeaderValue::from_str(&join_methods(methods)) {
            headers.append(ACCESS_CONTROL_ALLOW_METHODS, value);
        }
        headers.append(ACCESS_CONTROL_MAX_AGE, HeaderValue::from(ONE_YEAR_SECS));
    }
    append_vary_origin(headers);
}

/// Comma-separated method list, e.g. "OPTIONS, GET".
pub fn join_methods(methods: &[Method]) -> String {
    methods
        .iter()
        .map(Method::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header::VARY;

    fn settings(allowed: &[String], suppress_cors: bool) -> CorsSettings<'_> {
        CorsSettings {
            allowed_origins: allowed,
            suppress_cors,
        }
    }

    fn cross_origin_request() -> Request<()> {
        Request::builder()
            .uri("/sockjs/info")
            .header("Host", "mydomain.example")
            .header("Origin", "https://client.example")
            .header("Access-Control-Request-Headers", "Last-Event-ID")
            .header("Access-Control-Request-Headers", "X-Custom")
            .body(())
            .unwrap()
    }

    #[test]
    fn test_no_origin_is_not_cors() {
        let request = Request::builder().body(()).unwrap();
        let mut response = Response::new(());
        assert!(check_and_add_cors_headers(&request, &mut response, settings(&[], false), &[Method::GET]));
        assert!(response.headers().is_empty());
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[test]
    fn test_rejected_origin() {
        let allowed = vec!["https://other.example".to_string()];
        let mut response = Response::new(());
        assert!(!check_and_add_cors_headers(
            &cross_origin_request(),
            &mut response,
            settings(&allowed, false),
            &[]
        ));
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert!(!response.headers().contains_key(ACCESS_CONTROL_ALLOW_ORIGIN));
    }

    #[test]
    fn test_headers_added() {
        let allowed = vec!["https://client.example".to_string()];
        let mut response = Response::new(());
        assert!(check_and_add_cors_headers(
            &cross_origin_request(),
            &mut response,
            settings(&allowed, false),
            &[Method::OPTIONS, Method::GET]
        ));

        let headers = response.headers();
        assert_eq!(headers[ACCESS_CONTROL_ALLOW_ORIGIN], "https://client.example");
        assert_eq!(headers[ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");
        let allow_headers: Vec<_> = headers.get_all(ACCESS_CONTROL_ALLOW_HEADERS).iter().collect();
        assert_eq!(allow_headers, vec!["Last-Event-ID", "X-Custom"]);
        assert_eq!(headers[ACCESS_CONTROL_ALLOW_METHODS], "OPTIONS, GET");
        assert_eq!(headers[ACCESS_CONTROL_MAX_AGE], "31536000");
        assert_eq!(headers[VARY], "Origin");
    }

    #[test]
    fn test_no_methods_no_max_age() {
        let allowed = vec!["*".to_string()];
        let mut response = Response::new(());
        assert!(check_and_add_cors_headers(&cross_origin_request(), &mut response, settings(&allowed, false), &[]));
        assert!(!response.headers().contains_key(ACCESS_CONTROL_ALLOW_METHODS));
        assert!(!response.headers().contains_key(ACCESS_CONTROL_MAX_AGE));
    }

    #[test]
    fn test_suppressed() {
        let allowed = vec!["*".to_string()];
        let mut response = Response::new(());
        assert!(check_and_add_cors_headers(&cross_origin_request(), &mut response, settings(&allowed, true), &[Method::GET]));
        assert!(response.headers().is_empty());
    }

    #[test]
    fn test_existing_headers_not_duplicated() {
        let allowed = vec!["*".to_string()];
        let request = cross_origin_request();
        let mut response = Response::new(());
        response
            .headers_mut()
            .insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));

        assert!(check_and_add_cors_headers(&request, &mut response, settings(&allowed, false), &[Method::GET]));
        assert_eq!(response.headers().len(), 1);
        assert_eq!(response.headers()[ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    }

    #[test]
    fn test_idempotent() {
        let allowed = vec!["*".to_string()];
        let request = cross_origin_request();
        let mut response = Response::new(());

        assert!(check_and_add_cors_headers(&request, &mut response, settings(&allowed, false), &[Method::GET]));
        let first = response.headers().clone();
        assert!(check_and_add_cors_headers(&request, &mut response, settings(&allowed, false), &[Method::GET]));

        assert_eq!(response.headers(), &first);
        assert_eq!(response.headers().get_all(VARY).iter().count(), 1);
    }
}
