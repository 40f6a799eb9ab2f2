//! HTTP request/response model and helpers
//!
//! Submodules cover the request and response types handlers work with,
//! cookie handling, media negotiation and decoding, multipart parsing,
//! content type lookup, and the cache validation / byte range helpers used
//! by static file serving.

pub mod cache;
pub mod cookies;
pub mod media;
pub mod mime;
pub mod multipart;
pub mod range;
pub mod request;
pub mod response;

pub use cookies::Cookie;
pub use request::Request;
pub use response::Response;
