// Connection handling
// Accepts a single TCP connection, enforces limits, buffers request bodies
// and hands requests to the application service.

use std::convert::Infallible;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use http_body_util::{BodyExt, Full};
use hyper::body::Bytes;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;

use crate::app::AppService;
use crate::http::{response, Request};
use crate::logger;

/// Accept and process a connection, checking limits and logging.
pub fn accept_connection(
    stream: tokio::net::TcpStream,
    peer_addr: std::net::SocketAddr,
    service: &Arc<AppService>,
    conn_counter: &Arc<AtomicUsize>,
) {
    // Increment counter first, then check limit (prevents race condition)
    let prev_count = conn_counter.fetch_add(1, Ordering::SeqCst);

    if let Some(max_conn) = service.settings().performance.max_connections {
        if prev_count >= usize::try_from(max_conn).unwrap_or(usize::MAX) {
            // Exceeded limit: rollback counter and reject
            conn_counter.fetch_sub(1, Ordering::SeqCst);
            logger::log_warning(&format!(
                "Max connections reached: {prev_count}/{max_conn}. Connection rejected."
            ));
            drop(stream);
            return;
        }
    }

    if service.settings().logging.access_log {
        logger::log_connection_accepted(&peer_addr);
    }

    handle_connection(
        stream,
        peer_addr,
        Arc::clone(service),
        Arc::clone(conn_counter),
    );
}

/// Serve a connection in a spawned task.
///
/// Wraps the TCP stream in `TokioIo`, configures HTTP/1.1 keep-alive, applies
/// the read/write timeout, and decrements the connection counter when done.
fn handle_connection(
    stream: tokio::net::TcpStream,
    peer_addr: std::net::SocketAddr,
    service: Arc<AppService>,
    conn_counter: Arc<AtomicUsize>,
) {
    tokio::spawn(async move {
        let io = TokioIo::new(stream);

        let keep_alive_timeout = service.settings().performance.keep_alive_timeout;
        let timeout_duration = std::time::Duration::from_secs(std::cmp::max(
            service.settings().performance.read_timeout,
            service.settings().performance.write_timeout,
        ));

        let mut builder = http1::Builder::new();
        if keep_alive_timeout > 0 {
            builder.keep_alive(true);
        }

        let svc = Arc::clone(&service);
        let conn = builder.serve_connection(
            io,
            service_fn(move |req| {
                let service = Arc::clone(&svc);
                async move { Ok::<_, Infallible>(serve_request(req, &service, peer_addr).await) }
            }),
        );

        match tokio::time::timeout(timeout_duration, conn).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => logger::log_connection_error(&err),
            Err(_) => {
                logger::log_warning(&format!(
                    "Connection timeout after {} seconds",
                    timeout_duration.as_secs()
                ));
            }
        }

        conn_counter.fetch_sub(1, Ordering::SeqCst);
    });
}

/// Buffer the request body, bounded by `max_body_size`, and dispatch.
async fn serve_request(
    req: hyper::Request<hyper::body::Incoming>,
    service: &Arc<AppService>,
    peer_addr: std::net::SocketAddr,
) -> hyper::Response<Full<Bytes>> {
    let settings = service.settings();
    let max_body = usize::try_from(settings.http.max_body_size).unwrap_or(usize::MAX);

    logger::log_headers_count(req.headers().len(), settings.logging.show_headers);

    // Reject declared oversized bodies before buffering anything.
    let declared_len = req
        .headers()
        .get("content-length")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<usize>().ok());
    if declared_len.is_some_and(|len| len > max_body) {
        return response::build_413_response();
    }

    let (parts, body) = req.into_parts();
    let bytes = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(err) => {
            logger::log_error(&format!("Failed to read request body: {err}"));
            return response::build_400_response();
        }
    };
    // Chunked bodies carry no declared length; check again after buffering.
    if bytes.len() > max_body {
        return response::build_413_response();
    }

    let request = Request::new(
        parts.method,
        parts.uri,
        parts.version,
        parts.headers,
        bytes,
        Some(peer_addr),
    );
    service.dispatch(request).await
}
