//! Background tasks
//!
//! Thin wrappers over the runtime for work that outlives a request.
//! Handlers can spawn follow-up work and return without waiting for it.

use tokio::task::JoinHandle;

/// Spawn an async task on the runtime.
pub fn spawn<F>(future: F) -> JoinHandle<F::Output>
where
    F: std::future::Future + Send + 'static,
    F::Output: Send + 'static,
{
    tokio::spawn(future)
}

/// Run blocking work on the blocking thread pool.
pub fn spawn_blocking<F, R>(f: F) -> JoinHandle<R>
where
    F: FnOnce() -> R + Send + 'static,
    R: Send + 'static,
{
    tokio::task::spawn_blocking(f)
}
