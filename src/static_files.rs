//! Static file serving
//!
//! Serves files from the configured static directory under its route
//! prefix, with `ETag` validation and byte range support. Paths are
//! canonicalized and checked against the static root so traversal attempts
//! cannot escape it. Directory URLs are not listed and return 404.

use std::path::Path;

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Method;
use tokio::fs;

use crate::http::range::RangeOutcome;
use crate::http::{cache, mime, range, response, Request};
use crate::logger;

/// Try to serve `req` from `dir`. Returns the response and the number of
/// body bytes sent, or None when no file exists for the path.
pub(crate) async fn respond(
    req: &Request,
    dir: &str,
    route_prefix: &str,
) -> Option<(hyper::Response<Full<Bytes>>, usize)> {
    let (data, content_type) = load(dir, req.path(), route_prefix).await?;
    Some(build(&data, content_type, req))
}

/// Resolve a request path to a file under the static root.
async fn load(static_dir: &str, path: &str, route_prefix: &str) -> Option<(Vec<u8>, &'static str)> {
    // Remove leading slash and prevent directory traversal
    let clean_path = path.trim_start_matches('/').replace("..", "");

    // Remove route prefix from path
    let prefix_clean = route_prefix.trim_matches('/');
    let relative_path = if prefix_clean.is_empty() {
        clean_path.as_str()
    } else {
        clean_path
            .strip_prefix(&format!("{prefix_clean}/"))
            .unwrap_or(&clean_path)
    };

    let file_path = Path::new(static_dir).join(relative_path);

    // Security: ensure file_path is within static_dir
    let static_dir_canonical = match Path::new(static_dir).canonicalize() {
        Ok(p) => p,
        Err(e) => {
            logger::log_warning(&format!(
                "Static directory not found or inaccessible '{static_dir}': {e}"
            ));
            return None;
        }
    };

    // File not found is common (404), no need to log at warning level
    let Ok(file_path_canonical) = file_path.canonicalize() else {
        return None;
    };
    if !file_path_canonical.starts_with(&static_dir_canonical) {
        logger::log_warning(&format!(
            "Path traversal attempt blocked: {} -> {}",
            path,
            file_path_canonical.display()
        ));
        return None;
    }

    // Directory URLs are not served and have no index fallback.
    if file_path_canonical.is_dir() {
        return None;
    }

    let content = match fs::read(&file_path_canonical).await {
        Ok(c) => c,
        Err(e) => {
            logger::log_error(&format!(
                "Failed to read file '{}': {}",
                file_path_canonical.display(),
                e
            ));
            return None;
        }
    };

    let content_type =
        mime::content_type_for(file_path_canonical.extension().and_then(|e| e.to_str()));

    Some((content, content_type))
}

/// Build the file response with `ETag` and Range handling.
fn build(
    data: &[u8],
    content_type: &str,
    req: &Request,
) -> (hyper::Response<Full<Bytes>>, usize) {
    let etag = cache::etag_for(data);
    let total_size = data.len();
    let is_head = *req.method() == Method::HEAD;

    // Check if client has cached version
    if cache::if_none_match(req.header("if-none-match"), &etag) {
        return (response::build_304_response(&etag), 0);
    }

    match range::parse_range(req.header("range"), total_size) {
        RangeOutcome::Valid(byte_range) => {
            let start = byte_range.start;
            let end = byte_range.end_position(total_size);
            let sent = if is_head { 0 } else { end - start + 1 };
            let body = Bytes::from(data[start..=end].to_vec());
            (
                response::build_partial_response(
                    body,
                    content_type,
                    &etag,
                    start,
                    end,
                    total_size,
                    is_head,
                ),
                sent,
            )
        }
        RangeOutcome::NotSatisfiable => (response::build_416_response(total_size), 0),
        RangeOutcome::None => {
            let sent = if is_head { 0 } else { total_size };
            let body = Bytes::from(data.to_owned());
            (
                response::build_file_response(body, content_type, &etag, is_head),
                sent,
            )
        }
    }
}
