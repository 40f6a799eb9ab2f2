//! Routing module
//!
//! Provides request routing:
//! - Path patterns with `{name}` parameter captures
//! - Per-method endpoint tables with HEAD/OPTIONS handling
//! - First-match-wins route lookup and named-route reversal
//! - Host header validation against an allowlist

pub mod hosts;
mod pattern;
mod route;
mod router;

pub use pattern::PathPattern;
pub use route::Route;
pub use router::Router;
