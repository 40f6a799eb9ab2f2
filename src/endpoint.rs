//! Endpoint trait
//!
//! An endpoint takes the request and the in-flight response, and returns the
//! (possibly mutated) response. Async closures with the `(Request, Response)`
//! signature implement it automatically, so routes can be registered as:
//!
//! ```no_run
//! use dyne::{App, Request, Response};
//!
//! let mut app = App::new();
//! app.at("/").get(|_req: Request, mut resp: Response| async move {
//!     resp.text("hello, world!");
//!     Ok(resp)
//! });
//! ```

use std::future::Future;
use std::pin::Pin;

use crate::http::request::Request;
use crate::http::response::Response;

/// A boxed future, as returned by [`Endpoint::call`].
pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send + 'static>>;

/// A request handler.
///
/// Implemented for any `Fn(Request, Response) -> Future` closure. Before
/// hooks use the same shape, so a hook can decorate the response the same
/// way a route endpoint does.
pub trait Endpoint: Send + Sync + 'static {
    fn call(&self, req: Request, resp: Response) -> BoxFuture<crate::Result<Response>>;
}

impl<F, Fut> Endpoint for F
where
    F: Fn(Request, Response) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = crate::Result<Response>> + Send + 'static,
{
    fn call(&self, req: Request, resp: Response) -> BoxFuture<crate::Result<Response>> {
        Box::pin(self(req, resp))
    }
}
