//! Application builder and dispatcher
//!
//! [`App`] collects routes, hooks, startup tasks and settings. Once built it
//! freezes into an [`AppService`], the shared dispatcher used by both the
//! real server and the in-process test client.
//!
//! Dispatch order for a request:
//! 1. Static file route (when a static directory is configured)
//! 2. Host allowlist check
//! 3. Before hooks, in registration order
//! 4. Route lookup (first match wins) or 404
//! 5. Catch-all endpoint, then the method endpoint (or 405 / preflight)
//! 6. Render, with access logging

use std::sync::Arc;
use std::time::Instant;

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Method, StatusCode};

use crate::config::Settings;
use crate::endpoint::{BoxFuture, Endpoint};
use crate::http::response::RenderContext;
use crate::http::{Request, Response};
use crate::logger::{self, AccessLogEntry};
use crate::routing::{hosts, Route, Router};
use crate::static_files;
use crate::testing::TestClient;

type StartupHook = Box<dyn FnOnce() -> BoxFuture<()> + Send>;

/// An application under construction.
pub struct App {
    settings: Settings,
    router: Router,
    before: Vec<Arc<dyn Endpoint>>,
    startup: Vec<StartupHook>,
}

impl App {
    /// Create an app with default settings.
    pub fn new() -> Self {
        Self::with_settings(Settings::default())
    }

    /// Create an app with explicit settings.
    pub fn with_settings(settings: Settings) -> Self {
        Self {
            settings,
            router: Router::new(),
            before: Vec::new(),
            startup: Vec::new(),
        }
    }

    pub const fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Register a route for `pattern` and return a builder for attaching
    /// method endpoints.
    ///
    /// Patterns may contain `{name}` segments which capture one non-empty
    /// path segment each. Routes are matched in registration order.
    pub fn at(&mut self, pattern: &str) -> RouteBuilder<'_> {
        let index = self.router.push(Route::new(pattern));
        RouteBuilder {
            router: &mut self.router,
            index,
        }
    }

    /// Register a hook that runs before routing, for every request.
    /// Hooks run in registration order and may mutate the response.
    pub fn before(&mut self, endpoint: impl Endpoint) {
        self.before.push(Arc::new(endpoint));
    }

    /// Register a task to run once when the server starts, before the first
    /// request is accepted.
    pub fn on_startup<F, Fut>(&mut self, task: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: std::future::Future<Output = ()> + Send + 'static,
    {
        self.startup.push(Box::new(move || Box::pin(task())));
    }

    /// Reverse a named route into a concrete path.
    pub fn url_for(&self, name: &str, params: &[(&str, &str)]) -> Option<String> {
        self.router.url_for(name, params)
    }

    /// Build a runtime and serve on the configured address. Blocks the
    /// calling thread until shutdown.
    pub fn run(self) -> crate::Result<()> {
        let mut builder = tokio::runtime::Builder::new_multi_thread();
        builder.enable_all();
        if let Some(workers) = self.settings.server.workers {
            builder.worker_threads(workers);
        }
        let runtime = builder.build()?;
        runtime.block_on(crate::server::serve(self))
    }

    /// In-process client for exercising the app without binding a socket.
    pub fn client(self) -> TestClient {
        TestClient::new(self.into_service())
    }

    pub(crate) fn into_service(self) -> Arc<AppService> {
        Arc::new(AppService {
            settings: self.settings,
            router: self.router,
            before: self.before,
            startup: tokio::sync::Mutex::new(self.startup),
        })
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder returned by [`App::at`] for attaching endpoints to a route.
pub struct RouteBuilder<'a> {
    router: &'a mut Router,
    index: usize,
}

impl RouteBuilder<'_> {
    /// Attach an endpoint for an explicit method.
    pub fn method(self, method: Method, endpoint: impl Endpoint) -> Self {
        self.router
            .route_mut(self.index)
            .set_endpoint(method, Arc::new(endpoint));
        self
    }

    pub fn get(self, endpoint: impl Endpoint) -> Self {
        self.method(Method::GET, endpoint)
    }

    pub fn post(self, endpoint: impl Endpoint) -> Self {
        self.method(Method::POST, endpoint)
    }

    pub fn put(self, endpoint: impl Endpoint) -> Self {
        self.method(Method::PUT, endpoint)
    }

    pub fn delete(self, endpoint: impl Endpoint) -> Self {
        self.method(Method::DELETE, endpoint)
    }

    pub fn patch(self, endpoint: impl Endpoint) -> Self {
        self.method(Method::PATCH, endpoint)
    }

    pub fn head(self, endpoint: impl Endpoint) -> Self {
        self.method(Method::HEAD, endpoint)
    }

    pub fn options(self, endpoint: impl Endpoint) -> Self {
        self.method(Method::OPTIONS, endpoint)
    }

    /// Attach a catch-all endpoint that runs for every method on this route,
    /// before any method-specific endpoint.
    pub fn all(self, endpoint: impl Endpoint) -> Self {
        self.router
            .route_mut(self.index)
            .set_any_endpoint(Arc::new(endpoint));
        self
    }

    /// Name the route so it can be reversed with `url_for`.
    pub fn name(self, name: &str) -> Self {
        self.router.route_mut(self.index).set_name(name);
        self
    }
}

/// The frozen application shared by the server and the test client.
pub struct AppService {
    settings: Settings,
    router: Router,
    before: Vec<Arc<dyn Endpoint>>,
    startup: tokio::sync::Mutex<Vec<StartupHook>>,
}

impl AppService {
    pub const fn settings(&self) -> &Settings {
        &self.settings
    }

    pub(crate) fn url_for(&self, name: &str, params: &[(&str, &str)]) -> Option<String> {
        self.router.url_for(name, params)
    }

    /// Run startup tasks once, in registration order.
    pub(crate) async fn run_startup(&self) {
        let tasks: Vec<StartupHook> = {
            let mut pending = self.startup.lock().await;
            pending.drain(..).collect()
        };
        for task in tasks {
            task().await;
        }
    }

    /// Dispatch one request to a rendered hyper response.
    pub(crate) async fn dispatch(&self, req: Request) -> hyper::Response<Full<Bytes>> {
        let started = Instant::now();

        if let Some((response, sent)) = self.try_static(&req).await {
            self.log_request(&req, response.status().as_u16(), sent, started);
            return response;
        }

        let response = self.handle(&req).await;
        let (rendered, sent) = self.render(response, &req);
        self.log_request(&req, rendered.status().as_u16(), sent, started);
        rendered
    }

    /// Serve the request from the static directory when its path falls under
    /// the static route. Returns None when the path is not static.
    async fn try_static(&self, req: &Request) -> Option<(hyper::Response<Full<Bytes>>, usize)> {
        let dir = self.settings.statics.dir.as_deref()?;
        let route = self.settings.statics.route.as_str();

        let path = req.path();
        let under_route = path == route || path.starts_with(&format!("{route}/"));
        if !under_route {
            return None;
        }

        let method = req.method();
        if *method == Method::OPTIONS {
            let resp = Response::preflight("GET, HEAD, OPTIONS", self.settings.http.enable_cors);
            return Some(self.render(resp, req));
        }
        if *method != Method::GET && *method != Method::HEAD {
            let resp = Response::method_not_allowed("GET, HEAD, OPTIONS");
            return Some(self.render(resp, req));
        }

        match static_files::respond(req, dir, route).await {
            Some(served) => Some(served),
            None => Some(self.render(Response::not_found(), req)),
        }
    }

    /// Routing and endpoint execution, producing a response model.
    async fn handle(&self, req: &Request) -> Response {
        if !hosts::host_allowed(req.header("host"), &self.settings.allowed_hosts) {
            logger::log_warning(&format!(
                "Rejected request for host {:?}",
                req.header("host").unwrap_or("<missing>")
            ));
            return Response::invalid_host();
        }

        let mut resp = Response::new();

        for hook in &self.before {
            match hook.call(req.clone(), resp).await {
                Ok(next) => resp = next,
                Err(err) => return self.error_response(&err),
            }
        }

        let Some((route, params)) = self.router.find(req.path()) else {
            resp.set_status(StatusCode::NOT_FOUND);
            resp.text("404 Not Found");
            return resp;
        };

        let method = req.method().clone();

        // OPTIONS is answered from the route's method table unless an
        // explicit OPTIONS or catch-all endpoint exists.
        if method == Method::OPTIONS
            && !route.has_endpoint(&Method::OPTIONS)
            && route.any_endpoint().is_none()
        {
            resp.apply_preflight(&route.allow_header(), self.settings.http.enable_cors);
            return resp;
        }

        let mut scoped = req.clone();
        scoped.set_params(params);

        // The catch-all endpoint runs first; a method endpoint then runs as
        // well on the response it produced.
        if let Some(endpoint) = route.any_endpoint() {
            match endpoint.call(scoped.clone(), resp).await {
                Ok(next) => resp = next,
                Err(err) => return self.error_response(&err),
            }
        }

        match route.endpoint_for(&method) {
            Some(endpoint) => match endpoint.call(scoped, resp).await {
                Ok(next) => resp = next,
                Err(err) => return self.error_response(&err),
            },
            None => {
                if route.any_endpoint().is_none() {
                    resp.set_status(StatusCode::METHOD_NOT_ALLOWED);
                    resp.set_header("allow", &route.allow_header());
                    resp.text("405 Method Not Allowed");
                }
            }
        }

        resp
    }

    fn error_response(&self, err: &crate::Error) -> Response {
        if err.status().is_server_error() {
            logger::log_error(&format!("Handler error: {err}"));
        }
        Response::from_error(err)
    }

    fn render(&self, resp: Response, req: &Request) -> (hyper::Response<Full<Bytes>>, usize) {
        resp.render(&RenderContext {
            accept: req.header("accept"),
            is_head: *req.method() == Method::HEAD,
            http: &self.settings.http,
        })
    }

    fn log_request(&self, req: &Request, status: u16, body_bytes: usize, started: Instant) {
        if !self.settings.logging.access_log {
            return;
        }

        let remote = req
            .remote_addr()
            .map_or_else(|| "-".to_string(), |addr| addr.ip().to_string());
        let mut entry =
            AccessLogEntry::new(remote, req.method().to_string(), req.path().to_string());
        entry.query = req.uri().query().map(ToString::to_string);
        entry.http_version = logger::http_version_label(req.version()).to_string();
        entry.status = status;
        entry.body_bytes = body_bytes;
        entry.referer = req.header("referer").map(ToString::to_string);
        entry.user_agent = req.header("user-agent").map(ToString::to_string);
        entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);

        logger::log_access(&entry, &self.settings.logging.access_log_format);
    }
}
