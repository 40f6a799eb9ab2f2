//! Host header validation
//!
//! When `allowed_hosts` is configured, incoming requests must carry a Host
//! header matching one of the patterns:
//! 1. Exact match ("api.example.com")
//! 2. Wildcard suffix match ("*.example.com")
//! 3. Catch-all ("*")
//!
//! An empty allowlist accepts every host.

/// Check a request's Host header against the configured allowlist.
pub fn host_allowed(host: Option<&str>, allowed: &[String]) -> bool {
    if allowed.is_empty() {
        return true;
    }
    let Some(host) = host else {
        return false;
    };
    allowed.iter().any(|pattern| match_host(pattern, host))
}

/// Match a single pattern against a host, ignoring any `:port` suffix.
pub fn match_host(pattern: &str, host: &str) -> bool {
    let host = host.split(':').next().unwrap_or(host);

    if pattern == "*" {
        return true;
    }

    if pattern == host {
        return true;
    }

    if pattern.starts_with("*.") {
        return match_wildcard_host(pattern, host);
    }

    false
}

/// Match a wildcard pattern (*.example.com).
fn match_wildcard_host(pattern: &str, host: &str) -> bool {
    // "*.example.com" should match:
    // - "api.example.com" (one level)
    // - "www.api.example.com" (multiple levels)
    // - "example.com" (the domain itself, without subdomain)

    let suffix = &pattern[1..]; // ".example.com"

    if host.ends_with(suffix) {
        return true;
    }

    host == &pattern[2..]
}
