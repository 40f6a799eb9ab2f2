//! Range header parsing
//!
//! Single-range `bytes=` parsing per RFC 7233, used by static file serving
//! for resumable downloads.

/// A byte range resolved against a known body size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ByteRange {
    /// First byte position.
    pub start: usize,
    /// Last byte position, None for "until the end".
    pub end: Option<usize>,
}

impl ByteRange {
    /// The last byte actually covered, given the body size.
    #[inline]
    pub fn end_position(&self, size: usize) -> usize {
        self.end.unwrap_or_else(|| size.saturating_sub(1))
    }

    #[cfg(test)]
    pub fn len(&self, size: usize) -> usize {
        self.end_position(size).saturating_sub(self.start) + 1
    }
}

/// Outcome of parsing a `Range:` header.
#[derive(Debug)]
pub enum RangeOutcome {
    /// A satisfiable single range.
    Valid(ByteRange),
    /// Out of bounds, answer 416.
    NotSatisfiable,
    /// Absent, malformed, or multi-range: serve the full body.
    None,
}

/// Parse a `Range:` header value against a body of `size` bytes.
///
/// Accepted forms are `bytes=start-end`, `bytes=start-` and `bytes=-suffix`.
/// Multi-range requests are not supported and fall back to the full body.
///
/// # Examples
/// ```
/// use dyne::http::range::{parse_range, RangeOutcome};
///
/// assert!(matches!(parse_range(Some("bytes=0-99"), 1000), RangeOutcome::Valid(_)));
/// assert!(matches!(parse_range(None, 1000), RangeOutcome::None));
/// ```
pub fn parse_range(header: Option<&str>, size: usize) -> RangeOutcome {
    let Some(spec) = header.and_then(|h| h.strip_prefix("bytes=")) else {
        return RangeOutcome::None;
    };

    if spec.contains(',') {
        return RangeOutcome::None;
    }

    let Some((start_str, end_str)) = spec.split_once('-') else {
        return RangeOutcome::None;
    };
    let (start_str, end_str) = (start_str.trim(), end_str.trim());

    if start_str.is_empty() {
        return parse_suffix(end_str, size);
    }

    let Ok(start) = start_str.parse::<usize>() else {
        return RangeOutcome::None;
    };
    if start >= size {
        return RangeOutcome::NotSatisfiable;
    }

    let end = if end_str.is_empty() {
        None
    } else {
        let Ok(e) = end_str.parse::<usize>() else {
            return RangeOutcome::None;
        };
        Some(e.min(size - 1))
    };

    if let Some(e) = end {
        if start > e {
            return RangeOutcome::NotSatisfiable;
        }
    }

    RangeOutcome::Valid(ByteRange { start, end })
}

/// `bytes=-N` asks for the last N bytes.
fn parse_suffix(suffix_str: &str, size: usize) -> RangeOutcome {
    let Ok(suffix) = suffix_str.parse::<usize>() else {
        return RangeOutcome::None;
    };
    if suffix == 0 || size == 0 {
        return RangeOutcome::NotSatisfiable;
    }

    // A suffix longer than the body covers the whole body.
    RangeOutcome::Valid(ByteRange {
        start: size.saturating_sub(suffix),
        end: Some(size.saturating_sub(1)),
    })
}
