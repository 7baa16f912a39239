//! Cache-related response headers.

use axum::http::header::{CACHE_CONTROL, EXPIRES, VARY};
use axum::http::{HeaderMap, HeaderValue, Response};
use chrono::{TimeDelta, Utc};

/// One year in seconds, used for max-age values.
pub const ONE_YEAR_SECS: u64 = 365 * 24 * 60 * 60;

const LONG_CACHE: &str = "public, max-age=31536000";
const NO_CACHE: &str = "no-store, no-cache, must-revalidate, max-age=0";

/// Let clients and proxies keep the response for a year.
pub fn add_cache_headers<B>(response: &mut Response<B>) {
    let headers = response.headers_mut();
    headers.insert(CACHE_CONTROL, HeaderValue::from_static(LONG_CACHE));

    let expires = Utc::now() + TimeDelta::seconds(ONE_YEAR_SECS as i64);
    if let Ok(value) = HeaderValue::from_str(&expires.format("%a, %d %b %Y %H:%M:%S GMT").to_string()) {
        headers.insert(EXPIRES, value);
    }
    append_vary_origin(headers);
}

/// Forbid caching, e.g. for `/info` whose entropy changes on every call.
pub fn add_no_cache_headers<B>(response: &mut Response<B>) {
    response
        .headers_mut()
        .insert(CACHE_CONTROL, HeaderValue::from_static(NO_CACHE));
}

/// Append `Vary: Origin` unless an existing `Vary` value already names it.
pub(crate) fn append_vary_origin(headers: &mut HeaderMap) {
    let present = headers
        .get_all(VARY)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .any(|v| v.trim().eq_ignore_ascii_case("origin"));
    if !present {
        headers.append(VARY, HeaderValue::from_static("Origin"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_long_cache() {
        let mut response = Response::new(());
        add_cache_headers(&mut response);

        let headers = response.headers();
        assert_eq!(headers[CACHE_CONTROL], "public, max-age=31536000");
        assert_eq!(headers[VARY], "Origin");

        let expires = headers[EXPIRES].to_str().unwrap();
        assert!(expires.ends_with(" GMT"), "{expires}");
        let year = (Utc::now() + TimeDelta::days(365)).format("%Y").to_string();
        assert!(expires.contains(&year), "{expires}");
    }

    #[test]
    fn test_no_cache() {
        let mut response = Response::new(());
        add_no_cache_headers(&mut response);
        assert_eq!(
            response.headers()[CACHE_CONTROL],
            "no-store, no-cache, must-revalidate, max-age=0"
        );
        assert!(!response.headers().contains_key(VARY));
    }

    #[test]
    fn test_vary_origin_once() {
        let mut headers = HeaderMap::new();
        headers.append(VARY, HeaderValue::from_static("Accept-Encoding, origin"));
        append_vary_origin(&mut headers);
        assert_eq!(headers.get_all(VARY).iter().count(), 1);

        let mut headers = HeaderMap::new();
        headers.append(VARY, HeaderValue::from_static("Accept-Encoding"));
        append_vary_origin(&mut headers);
        assert_eq!(headers.get_all(VARY).iter().count(), 2);
    }
}
