//! Server module
//!
//! Owns the listen socket, the accept loop, per-connection limits and
//! graceful shutdown on SIGTERM/SIGINT.

pub mod connection;
pub mod listener;
pub mod signal;

use std::sync::atomic::AtomicUsize;
use std::sync::Arc;

use crate::app::App;
use crate::logger;

/// Bind the configured address and serve the application until a shutdown
/// signal arrives.
#[allow(clippy::ignored_unit_patterns)]
pub async fn serve(app: App) -> crate::Result<()> {
    // Logging may already be initialized when several apps run in-process.
    if let Err(err) = logger::init(app.settings()) {
        if err.kind() != std::io::ErrorKind::AlreadyExists {
            return Err(err.into());
        }
    }

    let addr = app.settings().socket_addr()?;
    let tcp_listener = listener::bind(addr)?;

    let service = app.into_service();
    service.run_startup().await;

    logger::log_server_start(&addr, service.settings());

    let handler = Arc::new(signal::SignalHandler::new());
    signal::start(Arc::clone(&handler));

    let active_connections = Arc::new(AtomicUsize::new(0));

    loop {
        tokio::select! {
            accept_result = tcp_listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => {
                        connection::accept_connection(
                            stream,
                            peer_addr,
                            &service,
                            &active_connections,
                        );
                    }
                    Err(e) => {
                        logger::log_error(&format!("Failed to accept connection: {e}"));
                    }
                }
            }

            _ = handler.shutdown.notified() => {
                logger::log_shutdown();
                break;
            }
        }
    }

    Ok(())
}
