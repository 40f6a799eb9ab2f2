//! Request model
//!
//! A buffered incoming request. The server collects the body before
//! dispatch, so accessors here are cheap and synchronous; the body is shared
//! bytes and cloning a request is inexpensive.

use hyper::body::Bytes;
use hyper::header::HeaderMap;
use hyper::{Method, Uri, Version};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::net::SocketAddr;

use crate::error::Result;
use crate::http::cookies;
use crate::http::media;
use crate::http::multipart::{self, Part};

/// An incoming HTTP request.
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    uri: Uri,
    version: Version,
    headers: HeaderMap,
    body: Bytes,
    params: HashMap<String, String>,
    remote_addr: Option<SocketAddr>,
}

impl Request {
    pub(crate) fn new(
        method: Method,
        uri: Uri,
        version: Version,
        headers: HeaderMap,
        body: Bytes,
        remote_addr: Option<SocketAddr>,
    ) -> Self {
        Self {
            method,
            uri,
            version,
            headers,
            body,
            params: HashMap::new(),
            remote_addr,
        }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// Request path, without the query string.
    pub fn path(&self) -> &str {
        self.uri.path()
    }

    pub const fn version(&self) -> Version {
        self.version
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// A header value as text. None when absent or not valid UTF-8.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub const fn remote_addr(&self) -> Option<SocketAddr> {
        self.remote_addr
    }

    /// Path parameters captured by the matched route pattern.
    pub fn params(&self) -> &HashMap<String, String> {
        &self.params
    }

    /// One captured path parameter.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    pub(crate) fn set_params(&mut self, params: HashMap<String, String>) {
        self.params = params;
    }

    /// Decoded query parameters. The last value wins for repeated keys.
    pub fn query_params(&self) -> HashMap<String, String> {
        url::form_urlencoded::parse(self.uri.query().unwrap_or("").as_bytes())
            .into_owned()
            .collect()
    }

    /// One decoded query parameter.
    pub fn query(&self, name: &str) -> Option<String> {
        self.query_params().remove(name)
    }

    /// Cookies sent with the request.
    pub fn cookies(&self) -> HashMap<String, String> {
        self.header("cookie")
            .map(cookies::parse_cookie_header)
            .unwrap_or_default()
    }

    /// Raw buffered body.
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Body as text, decoded lossily.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    /// Decode the body into a JSON value based on `Content-Type`.
    ///
    /// JSON, YAML, urlencoded forms and multipart bodies are supported; see
    /// [`crate::http::media`] for the exact mapping.
    pub fn media_value(&self) -> Result<Value> {
        media::decode_body(self.content_type(), &self.body)
    }

    /// Decode the body into a typed value.
    pub fn media<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_value(self.media_value()?)?)
    }

    /// Decode an urlencoded form body. The last value wins for repeated
    /// keys.
    pub fn form(&self) -> HashMap<String, String> {
        media::decode_form(&self.body)
    }

    /// Parse a multipart body into its parts.
    pub fn multipart(&self) -> Result<Vec<Part>> {
        let content_type = self.content_type().unwrap_or_default();
        let boundary = multipart::boundary_from(content_type)?;
        multipart::parse(&self.body, &boundary)
    }

    #[cfg(test)]
    pub(crate) fn test_get(path: &str) -> Self {
        Self::new(
            Method::GET,
            path.parse().unwrap(),
            Version::HTTP_11,
            HeaderMap::new(),
            Bytes::new(),
            None,
        )
    }
}
