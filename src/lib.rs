//! dyne - a small async HTTP API toolkit built on hyper
//!
//! Routes map path patterns to async endpoints taking a [`Request`] and a
//! [`Response`] to fill in. Configuration is layered (defaults, `dyne.toml`,
//! `DYNE_*` environment variables, `PORT`), responses negotiate JSON or YAML
//! from the Accept header, and a static directory can be mounted under a
//! route prefix.
//!
//! ```no_run
//! use dyne::{App, Request, Response};
//!
//! fn main() -> dyne::Result<()> {
//!     let mut app = App::new();
//!     app.at("/").get(|_req: Request, mut resp: Response| async move {
//!         resp.text("hello, world!");
//!         Ok(resp)
//!     });
//!     app.run()
//! }
//! ```

pub mod app;
pub mod background;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod http;
pub mod logger;
pub mod routing;
pub mod server;
mod static_files;
pub mod testing;

pub use app::App;
pub use config::Settings;
pub use endpoint::{BoxFuture, Endpoint};
pub use error::{Error, Result};
pub use http::{Cookie, Request, Response};
pub use testing::TestClient;

pub use hyper::{Method, StatusCode};
