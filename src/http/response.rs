//! Response model
//!
//! Handlers mutate a [`Response`] (status, headers, cookies, body); the
//! dispatcher renders it into a hyper response at the end of the request.
//! Rendering applies content negotiation for media bodies, strips HEAD
//! bodies while keeping `Content-Length`, and attaches the configured
//! `Server`, CORS and HSTS headers.
//!
//! The bottom of the module keeps plain hyper-level builders for responses
//! that bypass the model (static files, oversized bodies, connection-level
//! failures).

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{HeaderMap, HeaderName, HeaderValue};
use hyper::StatusCode;
use serde::Serialize;
use serde_json::Value;

use crate::config::HttpSettings;
use crate::error::Error;
use crate::http::cookies::Cookie;
use crate::http::media;
use crate::logger;

/// Response body slot. The wire format of `Media` is decided at render time
/// by the request's `Accept` header.
#[derive(Debug)]
enum Body {
    Empty,
    Text(String),
    Html(String),
    Raw { data: Bytes, content_type: String },
    Media(Value),
}

/// Context needed to render a response: negotiation input and the HTTP
/// settings that shape outgoing headers.
pub(crate) struct RenderContext<'a> {
    pub accept: Option<&'a str>,
    pub is_head: bool,
    pub http: &'a HttpSettings,
}

/// An outgoing HTTP response under construction.
#[derive(Debug)]
pub struct Response {
    status: StatusCode,
    headers: HeaderMap,
    cookies: Vec<Cookie>,
    body: Body,
}

impl Response {
    pub fn new() -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            cookies: Vec::new(),
            body: Body::Empty,
        }
    }

    pub const fn status(&self) -> StatusCode {
        self.status
    }

    pub fn set_status(&mut self, status: StatusCode) {
        self.status = status;
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Set a header, replacing any previous value. Invalid names or values
    /// are logged and skipped rather than failing the request.
    pub fn set_header(&mut self, name: &str, value: &str) {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                self.headers.insert(name, value);
            }
            _ => logger::log_warning(&format!("Skipping invalid header '{name}'")),
        }
    }

    /// Add a header without replacing previous values.
    pub fn append_header(&mut self, name: &str, value: &str) {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                self.headers.append(name, value);
            }
            _ => logger::log_warning(&format!("Skipping invalid header '{name}'")),
        }
    }

    /// Attach a cookie to be sent as `Set-Cookie`.
    pub fn set_cookie(&mut self, cookie: Cookie) {
        self.cookies.push(cookie);
    }

    /// Shorthand for a plain name/value cookie.
    pub fn cookie(&mut self, name: &str, value: &str) {
        self.cookies.push(Cookie::new(name, value));
    }

    /// Set a plain text body. Renders with a `text/plain` content type.
    pub fn text(&mut self, text: impl Into<String>) {
        self.body = Body::Text(text.into());
    }

    /// Set an HTML body. Renders with a `text/html` content type.
    pub fn html(&mut self, html: impl Into<String>) {
        self.body = Body::Html(html.into());
    }

    /// Set a raw body with an explicit content type.
    pub fn content(&mut self, data: impl Into<Bytes>, content_type: impl Into<String>) {
        self.body = Body::Raw {
            data: data.into(),
            content_type: content_type.into(),
        };
    }

    /// Set a negotiated body from any serializable value. Rendered as JSON,
    /// or YAML when the request asks for it.
    pub fn media(&mut self, value: &impl Serialize) -> crate::Result<()> {
        self.body = Body::Media(serde_json::to_value(value)?);
        Ok(())
    }

    /// Redirect with 301 Moved Permanently.
    pub fn redirect(&mut self, location: &str) {
        self.redirect_with_status(location, StatusCode::MOVED_PERMANENTLY);
    }

    /// Redirect with an explicit status code.
    pub fn redirect_with_status(&mut self, location: &str, status: StatusCode) {
        self.status = status;
        self.set_header("location", location);
        self.body = Body::Text("Redirecting...".to_string());
    }

    // Canned responses used by the dispatcher.

    pub(crate) fn not_found() -> Self {
        let mut resp = Self::new();
        resp.set_status(StatusCode::NOT_FOUND);
        resp.text("404 Not Found");
        resp
    }

    pub(crate) fn method_not_allowed(allow: &str) -> Self {
        let mut resp = Self::new();
        resp.set_status(StatusCode::METHOD_NOT_ALLOWED);
        resp.set_header("allow", allow);
        resp.text("405 Method Not Allowed");
        resp
    }

    pub(crate) fn invalid_host() -> Self {
        let mut resp = Self::new();
        resp.set_status(StatusCode::BAD_REQUEST);
        resp.text("Invalid host header");
        resp
    }

    pub(crate) fn internal_error() -> Self {
        let mut resp = Self::new();
        resp.set_status(StatusCode::INTERNAL_SERVER_ERROR);
        resp.text("500 Internal Server Error");
        resp
    }

    /// Preflight response for OPTIONS on a matched route.
    pub(crate) fn preflight(allow: &str, enable_cors: bool) -> Self {
        let mut resp = Self::new();
        resp.apply_preflight(allow, enable_cors);
        resp
    }

    /// Turn this response into an OPTIONS preflight answer, keeping any
    /// headers already set.
    pub(crate) fn apply_preflight(&mut self, allow: &str, enable_cors: bool) {
        self.set_status(StatusCode::NO_CONTENT);
        self.set_header("allow", allow);
        if enable_cors {
            self.set_header("access-control-allow-origin", "*");
            self.set_header("access-control-allow-methods", allow);
            self.set_header("access-control-allow-headers", "Content-Type");
            self.set_header("access-control-max-age", "86400");
        }
    }

    /// Map a handler error to a response. Explicitly raised client statuses
    /// carry a JSON error body; everything else is a plain 500 (the caller
    /// logs the detail).
    pub(crate) fn from_error(err: &Error) -> Self {
        let status = err.status();
        if status.is_server_error() {
            return Self::internal_error();
        }

        let mut resp = Self::new();
        resp.set_status(status);
        if resp
            .media(&serde_json::json!({ "error": err.to_string() }))
            .is_err()
        {
            resp.text("400 Bad Request");
        }
        resp
    }

    /// Render into a hyper response. Returns the response and the number of
    /// body bytes actually sent (zero for HEAD).
    pub(crate) fn render(self, ctx: &RenderContext<'_>) -> (hyper::Response<Full<Bytes>>, usize) {
        let (data, content_type) = self.body_bytes(ctx.accept);

        let mut headers = self.headers;
        if let Some(content_type) = content_type {
            if !headers.contains_key("content-type") {
                match HeaderValue::from_str(&content_type) {
                    Ok(value) => {
                        headers.insert("content-type", value);
                    }
                    Err(_) => {
                        logger::log_warning(&format!("Invalid content type '{content_type}'"));
                    }
                }
            }
        }

        // 204/304 must not carry Content-Length or a body.
        let suppress_body = self.status == StatusCode::NO_CONTENT
            || self.status == StatusCode::NOT_MODIFIED;
        if !suppress_body {
            headers.insert("content-length", HeaderValue::from(data.len()));
        }

        if !headers.contains_key("server") {
            if let Ok(value) = HeaderValue::from_str(&ctx.http.server_name) {
                headers.insert("server", value);
            }
        }
        if ctx.http.enable_cors && !headers.contains_key("access-control-allow-origin") {
            headers.insert(
                "access-control-allow-origin",
                HeaderValue::from_static("*"),
            );
        }
        if ctx.http.enable_hsts && !headers.contains_key("strict-transport-security") {
            headers.insert(
                "strict-transport-security",
                HeaderValue::from_static("max-age=63072000; includeSubDomains"),
            );
        }

        for cookie in &self.cookies {
            match HeaderValue::from_str(&cookie.to_header_value()) {
                Ok(value) => {
                    headers.append("set-cookie", value);
                }
                Err(_) => {
                    logger::log_warning(&format!("Skipping invalid cookie '{}'", cookie.name));
                }
            }
        }

        let body = if ctx.is_head || suppress_body {
            Bytes::new()
        } else {
            data
        };
        let sent = body.len();

        let mut response = hyper::Response::new(Full::new(body));
        *response.status_mut() = self.status;
        *response.headers_mut() = headers;
        (response, sent)
    }

    /// Resolve the body slot into bytes and a content type.
    fn body_bytes(&self, accept: Option<&str>) -> (Bytes, Option<String>) {
        match &self.body {
            Body::Empty => (Bytes::new(), None),
            Body::Text(text) => (
                Bytes::copy_from_slice(text.as_bytes()),
                Some("text/plain".to_string()),
            ),
            Body::Html(html) => (
                Bytes::copy_from_slice(html.as_bytes()),
                Some("text/html".to_string()),
            ),
            Body::Raw { data, content_type } => (data.clone(), Some(content_type.clone())),
            Body::Media(value) => {
                let format = media::negotiate(accept);
                let encoded = match format {
                    media::Format::Json => serde_json::to_vec(value)
                        .map(Bytes::from)
                        .map_err(Error::from),
                    media::Format::Yaml => serde_yaml::to_string(value)
                        .map(|s| Bytes::from(s.into_bytes()))
                        .map_err(Error::from),
                };
                match encoded {
                    Ok(data) => (data, Some(format.content_type().to_string())),
                    Err(err) => {
                        logger::log_error(&format!("Failed to encode media body: {err}"));
                        (
                            Bytes::from_static(b"500 Internal Server Error"),
                            Some("text/plain".to_string()),
                        )
                    }
                }
            }
        }
    }
}

impl Default for Response {
    fn default() -> Self {
        Self::new()
    }
}

// Hyper-level canned builders for paths that bypass the response model.

/// Build 304 Not Modified for a conditional request hit.
pub fn build_304_response(etag: &str) -> hyper::Response<Full<Bytes>> {
    hyper::Response::builder()
        .status(304)
        .header("ETag", etag)
        .header("Cache-Control", "public, max-age=3600")
        .body(Full::new(Bytes::new()))
        .unwrap_or_else(|e| {
            log_build_error("304", &e);
            hyper::Response::new(Full::new(Bytes::new()))
        })
}

/// Build 400 Bad Request for connection-level failures.
pub fn build_400_response() -> hyper::Response<Full<Bytes>> {
    hyper::Response::builder()
        .status(400)
        .header("Content-Type", "text/plain")
        .body(Full::new(Bytes::from("400 Bad Request")))
        .unwrap_or_else(|e| {
            log_build_error("400", &e);
            hyper::Response::new(Full::new(Bytes::from("400 Bad Request")))
        })
}

/// Build 413 Payload Too Large.
pub fn build_413_response() -> hyper::Response<Full<Bytes>> {
    hyper::Response::builder()
        .status(413)
        .header("Content-Type", "text/plain")
        .body(Full::new(Bytes::from("413 Payload Too Large")))
        .unwrap_or_else(|e| {
            log_build_error("413", &e);
            hyper::Response::new(Full::new(Bytes::from("413 Payload Too Large")))
        })
}

/// Build 416 Range Not Satisfiable.
pub fn build_416_response(size: usize) -> hyper::Response<Full<Bytes>> {
    hyper::Response::builder()
        .status(416)
        .header("Content-Type", "text/plain")
        .header("Content-Range", format!("bytes */{size}"))
        .body(Full::new(Bytes::from("Range Not Satisfiable")))
        .unwrap_or_else(|e| {
            log_build_error("416", &e);
            hyper::Response::new(Full::new(Bytes::from("Range Not Satisfiable")))
        })
}

/// Build a full static file response with cache headers.
pub fn build_file_response(
    data: Bytes,
    content_type: &str,
    etag: &str,
    is_head: bool,
) -> hyper::Response<Full<Bytes>> {
    let content_length = data.len();
    let body = if is_head { Bytes::new() } else { data };

    hyper::Response::builder()
        .status(200)
        .header("Content-Type", content_type)
        .header("Content-Length", content_length)
        .header("Accept-Ranges", "bytes")
        .header("ETag", etag)
        .header("Cache-Control", "public, max-age=3600")
        .body(Full::new(body))
        .unwrap_or_else(|e| {
            log_build_error("200", &e);
            hyper::Response::new(Full::new(Bytes::new()))
        })
}

/// Build 206 Partial Content for a range request.
pub fn build_partial_response(
    data: Bytes,
    content_type: &str,
    etag: &str,
    start: usize,
    end: usize,
    total_size: usize,
    is_head: bool,
) -> hyper::Response<Full<Bytes>> {
    let content_length = end - start + 1;
    let body = if is_head { Bytes::new() } else { data };

    hyper::Response::builder()
        .status(206)
        .header("Content-Type", content_type)
        .header("Content-Length", content_length)
        .header("Content-Range", format!("bytes {start}-{end}/{total_size}"))
        .header("Accept-Ranges", "bytes")
        .header("ETag", etag)
        .header("Cache-Control", "public, max-age=3600")
        .body(Full::new(body))
        .unwrap_or_else(|e| {
            log_build_error("206", &e);
            hyper::Response::new(Full::new(Bytes::new()))
        })
}

fn log_build_error(status: &str, error: &hyper::http::Error) {
    logger::log_error(&format!("Failed to build {status} response: {error}"));
}
