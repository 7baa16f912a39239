//! The `/iframe*.html` bootstrap page used by iframe based transports.

use axum::body::Body;
use axum::http::header::{CONTENT_LENGTH, CONTENT_TYPE, ETAG, IF_NONE_MATCH};
use axum::http::{HeaderValue, Method, Request, Response, StatusCode};
use md5::{Digest, Md5};

use crate::sockjs::cache::add_no_cache_headers;
use crate::sockjs::method_not_allowed;

const TEXT_HTML_UTF8: &str = "text/html;charset=UTF-8";

/// Render the iframe page loading the client library from `client_library_url`.
pub fn render_iframe(client_library_url: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
  <meta http-equiv="X-UA-Compatible" content="IE=edge" />
  <meta http-equiv="Content-Type" content="text/html; charset=UTF-8" />
  <script>
    document.domain = document.domain;
    _sockjs_onload = function(){{SockJS.bootstrap_iframe();}};
  </script>
  <script src="{client_library_url}"></script>
</head>
<body>
  <h2>Don't panic!</h2>
  <p>This is a SockJS hidden iframe. It's used for cross domain magic.</p>
</body>
</html>"#
    )
}

/// Quoted ETag: `"0` followed by the hex MD5 of `content`.
pub fn iframe_etag(content: &[u8]) -> String {
    format!("\"0{}\"", hex::encode(Md5::digest(content)))
}

/// Serve the iframe page, answering 304 when `If-None-Match` matches.
///
/// The page is sent with no-cache headers so that the origin policy, which
/// can change independently of the content, is re-checked on every load.
pub fn handle_iframe<B>(
    request: &Request<B>,
    response: &mut Response<Body>,
    client_library_url: &str,
) -> std::io::Result<()> {
    if *request.method() != Method::GET {
        method_not_allowed(response, &[Method::GET]);
        return Ok(());
    }

    let content = render_iframe(client_library_url).into_bytes();
    let etag = iframe_etag(&content);

    if first_if_none_match(request) == Some(etag.as_str()) {
        *response.status_mut() = StatusCode::NOT_MODIFIED;
        return Ok(());
    }

    let etag = HeaderValue::from_str(&etag)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
    let headers = response.headers_mut();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static(TEXT_HTML_UTF8));
    headers.insert(CONTENT_LENGTH, HeaderValue::from(content.len()));
    add_no_cache_headers(response);
    response.headers_mut().insert(ETAG, etag);
    *response.body_mut() = Body::from(content);
    Ok(())
}

fn first_if_none_match<B>(request: &Request<B>) -> Option<&str> {
    request
        .headers()
        .get(IF_NONE_MATCH)?
        .to_str()
        .ok()?
        .split(',')
        .map(str::trim)
        .find(|tag| !tag.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::DEFAULT_CLIENT_LIBRARY_URL;
    use axum::http::header::{ALLOW, CACHE_CONTROL};

    fn get(if_none_match: Option<&str>) -> Request<()> {
        let mut builder = Request::builder().uri("/sockjs/iframe.html");
        if let Some(tag) = if_none_match {
            builder = builder.header("If-None-Match", tag);
        }
        builder.body(()).unwrap()
    }

    #[test]
    fn test_render_substitutes_url() {
        let page = render_iframe("https://cdn.example/sockjs.js");
        assert!(page.contains(r#"<script src="https://cdn.example/sockjs.js"></script>"#));
        assert!(page.contains("_sockjs_onload = function(){SockJS.bootstrap_iframe();};"));
        assert!(page.starts_with("<!DOCTYPE html>\n<html>\n"));
        assert!(page.ends_with("</html>"));
    }

    #[test]
    fn test_etag_format() {
        let tag = iframe_etag(b"");
        assert_eq!(tag, "\"0d41d8cd98f00b204e9800998ecf8427e\"");

        let a = iframe_etag(render_iframe("a.js").as_bytes());
        let b = iframe_etag(render_iframe("b.js").as_bytes());
        assert_ne!(a, b);
        assert_eq!(a.len(), 35);
    }

    #[tokio::test]
    async fn test_serve_page() {
        let mut response = Response::new(Body::empty());
        handle_iframe(&get(None), &mut response, DEFAULT_CLIENT_LIBRARY_URL).unwrap();

        let expected = render_iframe(DEFAULT_CLIENT_LIBRARY_URL);
        let headers = response.headers();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(headers[CONTENT_TYPE], "text/html;charset=UTF-8");
        assert_eq!(headers[CONTENT_LENGTH], expected.len().to_string().as_str());
        assert_eq!(headers[CACHE_CONTROL], "no-store, no-cache, must-revalidate, max-age=0");
        assert_eq!(headers[ETAG], iframe_etag(expected.as_bytes()).as_str());

        let body = axum::body::to_bytes(response.into_body(), 4096).await.unwrap();
        assert_eq!(body, expected.as_bytes());
    }

    #[test]
    fn test_not_modified() {
        let mut first = Response::new(Body::empty());
        handle_iframe(&get(None), &mut first, DEFAULT_CLIENT_LIBRARY_URL).unwrap();
        let etag = first.headers()[ETAG].to_str().unwrap().to_string();

        let mut second = Response::new(Body::empty());
        handle_iframe(&get(Some(&etag)), &mut second, DEFAULT_CLIENT_LIBRARY_URL).unwrap();
        assert_eq!(second.status(), StatusCode::NOT_MODIFIED);
        assert!(!second.headers().contains_key(CONTENT_TYPE));

        // only the first listed tag is compared
        let listed = format!("\"other\", {etag}");
        let mut third = Response::new(Body::empty());
        handle_iframe(&get(Some(&listed)), &mut third, DEFAULT_CLIENT_LIBRARY_URL).unwrap();
        assert_eq!(third.status(), StatusCode::OK);
        assert_eq!(third.headers()[ETAG], etag.as_str());
    }

    #[test]
    fn test_stale_etag() {
        let mut response = Response::new(Body::empty());
        handle_iframe(&get(Some("\"0stale\"")), &mut response, DEFAULT_CLIENT_LIBRARY_URL).unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[test]
    fn test_only_get() {
        let request = Request::builder()
            .method(Method::OPTIONS)
            .uri("/sockjs/iframe0.html")
            .body(())
            .unwrap();
        let mut response = Response::new(Body::empty());
        handle_iframe(&request, &mut response, DEFAULT_CLIENT_LIBRARY_URL).unwrap();

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.headers()[ALLOW], "GET");
        assert!(!response.headers().contains_key(ETAG));
    }
}
