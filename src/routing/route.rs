//! A single registered route: a path pattern plus its endpoints.

use std::collections::HashMap;
use std::sync::Arc;

use hyper::Method;

use crate::endpoint::Endpoint;
use crate::routing::pattern::PathPattern;

pub struct Route {
    pattern: PathPattern,
    name: Option<String>,
    endpoints: HashMap<Method, Arc<dyn Endpoint>>,
    any: Option<Arc<dyn Endpoint>>,
}

impl Route {
    pub fn new(pattern: &str) -> Self {
        Self {
            pattern: PathPattern::parse(pattern),
            name: None,
            endpoints: HashMap::new(),
            any: None,
        }
    }

    pub const fn pattern(&self) -> &PathPattern {
        &self.pattern
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn set_name(&mut self, name: &str) {
        self.name = Some(name.to_string());
    }

    pub fn set_endpoint(&mut self, method: Method, endpoint: Arc<dyn Endpoint>) {
        self.endpoints.insert(method, endpoint);
    }

    pub fn set_any_endpoint(&mut self, endpoint: Arc<dyn Endpoint>) {
        self.any = Some(endpoint);
    }

    /// Endpoint registered for a method. HEAD falls back to the GET
    /// endpoint when no explicit HEAD handler exists; the dispatcher strips
    /// the body at render time.
    pub fn endpoint_for(&self, method: &Method) -> Option<&Arc<dyn Endpoint>> {
        if let Some(endpoint) = self.endpoints.get(method) {
            return Some(endpoint);
        }
        if *method == Method::HEAD {
            return self.endpoints.get(&Method::GET);
        }
        None
    }

    pub const fn any_endpoint(&self) -> Option<&Arc<dyn Endpoint>> {
        self.any.as_ref()
    }

    pub fn has_endpoint(&self, method: &Method) -> bool {
        self.endpoints.contains_key(method)
    }

    /// Methods this route responds to, sorted. HEAD is implied by GET and
    /// OPTIONS is always answerable.
    pub fn allowed_methods(&self) -> Vec<Method> {
        let mut methods: Vec<Method> = self.endpoints.keys().cloned().collect();
        if methods.contains(&Method::GET) && !methods.contains(&Method::HEAD) {
            methods.push(Method::HEAD);
        }
        if !methods.contains(&Method::OPTIONS) {
            methods.push(Method::OPTIONS);
        }
        methods.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        methods
    }

    /// `Allow` header value for this route.
    pub fn allow_header(&self) -> String {
        self.allowed_methods()
            .iter()
            .map(Method::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl std::fmt::Debug for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Route")
            .field("pattern", &self.pattern.as_str())
            .field("name", &self.name)
            .field("methods", &self.endpoints.keys().collect::<Vec<_>>())
            .field("has_any", &self.any.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{Request, Response};

    fn noop() -> Arc<dyn Endpoint> {
        Arc::new(|_req: Request, resp: Response| async move { Ok::<_, crate::Error>(resp) })
    }

    #[test]
    fn test_head_falls_back_to_get() {
        let mut route = Route::new("/");
        route.set_endpoint(Method::GET, noop());

        assert!(route.endpoint_for(&Method::GET).is_some());
        assert!(route.endpoint_for(&Method::HEAD).is_some());
        assert!(route.endpoint_for(&Method::POST).is_none());
    }

    #[test]
    fn test_explicit_head_wins() {
        let mut route = Route::new("/");
        route.set_endpoint(Method::GET, noop());
        route.set_endpoint(Method::HEAD, noop());

        assert!(route.has_endpoint(&Method::HEAD));
    }

    #[test]
    fn test_allow_header() {
        let mut route = Route::new("/");
        route.set_endpoint(Method::GET, noop());
        route.set_endpoint(Method::POST, noop());

        assert_eq!(route.allow_header(), "GET, HEAD, OPTIONS, POST");
    }

    #[test]
    fn test_allow_header_without_get() {
        let mut route = Route::new("/");
        route.set_endpoint(Method::PUT, noop());

        assert_eq!(route.allow_header(), "OPTIONS, PUT");
    }
}
