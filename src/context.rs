//! Per-request state shared between middlewares, extractors and handlers.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use hyper::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE, COOKIE};
use hyper::{Body, Method, Request, Response, StatusCode, Uri};
use parking_lot::Mutex;
use tracing::warn;

use crate::error::{Error, Result};
use crate::handler::Reply;

/// The pattern and method that selected the handler for one request.
///
/// It is created fresh for every dispatch and handed to the extractors by
/// reference; nothing keeps it once the request completes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchContext {
    /// The handler path pattern that matched, relative to the controller.
    pub pattern: String,
    /// The method pattern that matched, `""` for a wildcard.
    pub method: String,
}

enum BodyState {
    Streaming(Body),
    Buffered(Bytes),
}

#[derive(Default)]
struct ResponseParts {
    status: Option<StatusCode>,
    headers: HeaderMap,
    body: Option<Reply>,
}

struct Inner {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    query: HashMap<String, String>,
    cookies: HashMap<String, String>,
    body: tokio::sync::Mutex<BodyState>,
    response: Mutex<ResponseParts>,
}

/// A handle on one in-flight request and the response being built for it.
///
/// Cloning is cheap and every clone refers to the same request.
#[derive(Clone)]
pub struct Context {
    inner: Arc<Inner>,
}

impl Context {
    /// Wraps a transport request.
    pub fn from_request(req: Request<Body>) -> Self {
        let (parts, body) = req.into_parts();
        let query = parts.uri.query().map(parse_query).unwrap_or_default();
        let cookies = parse_cookies(&parts.headers);

        Context {
            inner: Arc::new(Inner {
                method: parts.method,
                uri: parts.uri,
                headers: parts.headers,
                query,
                cookies,
                body: tokio::sync::Mutex::new(BodyState::Streaming(body)),
                response: Mutex::new(ResponseParts::default()),
            }),
        }
    }

    pub fn method(&self) -> &Method {
        &self.inner.method
    }

    pub fn uri(&self) -> &Uri {
        &self.inner.uri
    }

    /// The request path, without the query string.
    pub fn path(&self) -> &str {
        self.inner.uri.path()
    }

    /// The first value of query parameter `key`.
    pub fn query(&self, key: &str) -> Option<&str> {
        self.inner.query.get(key).map(String::as_str)
    }

    /// The first value of request header `key`, looked up case-insensitively.
    pub fn header(&self, key: &str) -> Option<&str> {
        self.inner.headers.get(key).and_then(|v| v.to_str().ok())
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.inner.headers
    }

    pub fn cookie(&self, key: &str) -> Option<&str> {
        self.inner.cookies.get(key).map(String::as_str)
    }

    /// Buffers the whole request body.
    ///
    /// The stream is drained on the first call; later calls return the same
    /// bytes.
    pub async fn body_bytes(&self) -> Result<Bytes> {
        let mut state = self.inner.body.lock().await;
        if let BodyState::Streaming(body) = &mut *state {
            let body = std::mem::take(body);
            let bytes = hyper::body::to_bytes(body).await.map_err(Error::Body)?;
            *state = BodyState::Buffered(bytes);
        }

        match &*state {
            BodyState::Buffered(bytes) => Ok(bytes.clone()),
            BodyState::Streaming(_) => Ok(Bytes::new()),
        }
    }

    /// The response status, `None` while nothing has set one.
    pub fn status(&self) -> Option<StatusCode> {
        self.inner.response.lock().status
    }

    pub fn set_status(&self, status: StatusCode) {
        self.inner.response.lock().status = Some(status);
    }

    /// Sets a response header, replacing earlier values.
    ///
    /// Names or values that are not valid HTTP are logged and skipped.
    pub fn set_header(&self, name: &str, value: &str) {
        let parsed = HeaderName::from_bytes(name.as_bytes())
            .ok()
            .zip(HeaderValue::from_str(value).ok());
        match parsed {
            Some((name, value)) => {
                self.inner.response.lock().headers.insert(name, value);
            }
            None => warn!(header = name, "ignoring invalid response header"),
        }
    }

    /// A response header set so far.
    pub fn response_header(&self, name: &str) -> Option<String> {
        self.inner
            .response
            .lock()
            .headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned)
    }

    /// Sets the response body.
    pub fn set_body(&self, body: impl Into<Reply>) {
        self.inner.response.lock().body = Some(body.into());
    }

    /// The response body set so far.
    pub fn body(&self) -> Option<Reply> {
        self.inner.response.lock().body.clone()
    }

    /// Turns the accumulated response state into a transport response.
    ///
    /// The status falls back to `200` when a body was set and to `404`
    /// otherwise. A `content-type` matching the body is added unless one
    /// was set explicitly.
    pub fn into_response(self) -> Response<Body> {
        let parts = std::mem::take(&mut *self.inner.response.lock());
        let mut headers = parts.headers;

        let (status, body) = match parts.body {
            Some(reply) => {
                if !headers.contains_key(CONTENT_TYPE) {
                    headers.insert(CONTENT_TYPE, HeaderValue::from_static(reply.content_type()));
                }
                (parts.status.unwrap_or(StatusCode::OK), reply.into_body())
            }
            None => match parts.status {
                Some(status) => (status, Body::empty()),
                None => (StatusCode::NOT_FOUND, Body::from("Not Found")),
            },
        };

        let mut res = Response::new(body);
        *res.status_mut() = status;
        *res.headers_mut() = headers;
        res
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("method", &self.inner.method)
            .field("uri", &self.inner.uri)
            .finish()
    }
}

fn parse_query(query: &str) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
        map.entry(key.into_owned()).or_insert_with(|| value.into_owned());
    }
    map
}

fn parse_cookies(headers: &HeaderMap) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for header in headers.get_all(COOKIE) {
        let Ok(header) = header.to_str() else {
            continue;
        };
        for pair in header.split(';') {
            if let Some((name, value)) = pair.trim().split_once('=') {
                map.entry(name.trim().to_owned())
                    .or_insert_with(|| value.trim().to_owned());
            }
        }
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(uri: &str) -> Context {
        Context::from_request(
            Request::builder()
                .uri(uri)
                .header("Cookie", "cookie=test; other=1")
                .header("X-Trace", "abc")
                .body(Body::from("payload"))
                .unwrap(),
        )
    }

    #[test]
    fn request_accessors() {
        let ctx = context("/api/query?param1=1&param1=2&name=a%20b");
        assert_eq!(ctx.path(), "/api/query");
        assert_eq!(ctx.query("param1"), Some("1"));
        assert_eq!(ctx.query("name"), Some("a b"));
        assert_eq!(ctx.query("missing"), None);
        assert_eq!(ctx.header("x-trace"), Some("abc"));
        assert_eq!(ctx.cookie("cookie"), Some("test"));
        assert_eq!(ctx.cookie("other"), Some("1"));
        assert_eq!(ctx.cookie("nope"), None);
    }

    #[tokio::test]
    async fn body_is_buffered_once() {
        let ctx = context("/");
        assert_eq!(ctx.body_bytes().await.unwrap(), Bytes::from("payload"));
        assert_eq!(ctx.clone().body_bytes().await.unwrap(), Bytes::from("payload"));
    }

    #[test]
    fn unset_response_is_not_found() {
        let res = context("/").into_response();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn explicit_content_type_wins() {
        let ctx = context("/");
        ctx.set_header("Content-Type", "application/xml;charset=utf-8");
        ctx.set_body("");
        let res = ctx.into_response();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(res.headers()[CONTENT_TYPE], "application/xml;charset=utf-8");
    }

    #[test]
    fn invalid_header_is_skipped() {
        let ctx = context("/");
        ctx.set_header("bad header", "x");
        assert_eq!(ctx.response_header("bad header"), None);
    }
}
