//! In-process test client
//!
//! Drives the dispatcher directly, without binding a socket. Startup tasks
//! run before the first request. Requests carry `Host: testserver` unless
//! the test sets its own Host header.

use std::sync::Arc;

use http_body_util::BodyExt;
use hyper::body::Bytes;
use hyper::header::{HeaderMap, HeaderName, HeaderValue};
use hyper::{Method, StatusCode, Uri, Version};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::app::AppService;
use crate::http::Request;

/// Client for exercising an app in-process.
#[derive(Clone)]
pub struct TestClient {
    service: Arc<AppService>,
}

impl TestClient {
    pub(crate) fn new(service: Arc<AppService>) -> Self {
        Self { service }
    }

    pub fn get(&self, path: &str) -> TestRequest {
        self.request(Method::GET, path)
    }

    pub fn post(&self, path: &str) -> TestRequest {
        self.request(Method::POST, path)
    }

    pub fn put(&self, path: &str) -> TestRequest {
        self.request(Method::PUT, path)
    }

    pub fn delete(&self, path: &str) -> TestRequest {
        self.request(Method::DELETE, path)
    }

    pub fn patch(&self, path: &str) -> TestRequest {
        self.request(Method::PATCH, path)
    }

    pub fn head(&self, path: &str) -> TestRequest {
        self.request(Method::HEAD, path)
    }

    pub fn options(&self, path: &str) -> TestRequest {
        self.request(Method::OPTIONS, path)
    }

    /// Start building a request with an explicit method.
    pub fn request(&self, method: Method, path: &str) -> TestRequest {
        TestRequest {
            client: self.clone(),
            method,
            path: path.to_string(),
            headers: Vec::new(),
            body: Bytes::new(),
        }
    }

    /// Reverse a named route, as registered on the app.
    pub fn url_for(&self, name: &str, params: &[(&str, &str)]) -> Option<String> {
        self.service.url_for(name, params)
    }
}

/// A request under construction.
pub struct TestRequest {
    client: TestClient,
    method: Method,
    path: String,
    headers: Vec<(String, String)>,
    body: Bytes,
}

impl TestRequest {
    #[must_use]
    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    #[must_use]
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Attach a JSON body and matching content type.
    #[must_use]
    pub fn json(mut self, value: &impl Serialize) -> Self {
        self.body = Bytes::from(serde_json::to_vec(value).expect("serialize json body"));
        self.headers
            .push(("content-type".to_string(), "application/json".to_string()));
        self
    }

    /// Attach a form-encoded body and matching content type.
    #[must_use]
    pub fn form(mut self, fields: &[(&str, &str)]) -> Self {
        let mut serializer = url::form_urlencoded::Serializer::new(String::new());
        for (name, value) in fields {
            serializer.append_pair(name, value);
        }
        self.body = Bytes::from(serializer.finish().into_bytes());
        self.headers.push((
            "content-type".to_string(),
            "application/x-www-form-urlencoded".to_string(),
        ));
        self
    }

    /// Send the request through the dispatcher and await the response.
    pub async fn send(self) -> TestResponse {
        self.client.service.run_startup().await;

        let uri: Uri = self.path.parse().expect("valid request path");
        let mut headers = HeaderMap::new();
        for (name, value) in &self.headers {
            headers.append(
                HeaderName::from_bytes(name.as_bytes()).expect("valid header name"),
                HeaderValue::from_str(value).expect("valid header value"),
            );
        }
        if !headers.contains_key("host") {
            headers.insert("host", HeaderValue::from_static("testserver"));
        }

        let request = Request::new(self.method, uri, Version::HTTP_11, headers, self.body, None);
        let response = self.client.service.dispatch(request).await;

        let (parts, body) = response.into_parts();
        let bytes = body
            .collect()
            .await
            .expect("collect response body")
            .to_bytes();

        TestResponse {
            status: parts.status,
            headers: parts.headers,
            body: bytes,
        }
    }
}

/// A received response.
#[derive(Debug)]
pub struct TestResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl TestResponse {
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Decode the body as JSON.
    ///
    /// # Panics
    ///
    /// Panics when the body is not valid JSON for `T`.
    pub fn json<T: DeserializeOwned>(&self) -> T {
        serde_json::from_slice(&self.body).expect("response body is valid json")
    }

    /// All `Set-Cookie` header values in order.
    pub fn set_cookies(&self) -> Vec<String> {
        self.headers
            .get_all("set-cookie")
            .iter()
            .filter_map(|value| value.to_str().ok())
            .map(ToString::to_string)
            .collect()
    }
}
