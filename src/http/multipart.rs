//! multipart/form-data parsing
//!
//! A minimal parser for buffered multipart bodies: boundary extraction from
//! the `Content-Type` header, part headers, and a split between plain text
//! fields and file parts.

use hyper::body::Bytes;
use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// One part of a multipart body.
#[derive(Debug, Clone)]
pub struct Part {
    /// Field name from `Content-Disposition`.
    pub name: String,
    /// Filename, present for file parts.
    pub filename: Option<String>,
    /// Part-level `Content-Type`, if sent.
    pub content_type: Option<String>,
    /// Raw part content.
    pub data: Bytes,
}

impl Part {
    /// Whether this part carries a file rather than a plain field.
    pub const fn is_file(&self) -> bool {
        self.filename.is_some()
    }

    /// Part content as text. File content is decoded lossily.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.data).into_owned()
    }

    /// JSON representation used by body decoding: plain fields become
    /// strings, file parts become objects with filename and content.
    pub(crate) fn to_value(&self) -> Value {
        match &self.filename {
            None => Value::String(self.text()),
            Some(filename) => {
                let mut out = Map::new();
                out.insert("filename".to_string(), Value::String(filename.clone()));
                out.insert(
                    "content_type".to_string(),
                    self.content_type
                        .as_ref()
                        .map_or(Value::Null, |ct| Value::String(ct.clone())),
                );
                out.insert("content".to_string(), Value::String(self.text()));
                Value::Object(out)
            }
        }
    }
}

/// Extract the boundary parameter from a multipart `Content-Type`.
pub fn boundary_from(content_type: &str) -> Result<String> {
    for param in content_type.split(';').skip(1) {
        if let Some((key, value)) = param.split_once('=') {
            if key.trim().eq_ignore_ascii_case("boundary") {
                let value = value.trim().trim_matches('"');
                if value.is_empty() {
                    break;
                }
                return Ok(value.to_string());
            }
        }
    }
    Err(Error::MalformedBody("missing multipart boundary".to_string()))
}

/// Parse a buffered multipart body.
///
/// Parts without a `Content-Disposition` name are skipped; a body without a
/// closing delimiter is rejected.
pub fn parse(body: &[u8], boundary: &str) -> Result<Vec<Part>> {
    let delimiter = format!("--{boundary}");
    let delimiter = delimiter.as_bytes();

    // Positions of every delimiter occurrence; sections live between them.
    let mut positions = Vec::new();
    let mut offset = 0;
    while let Some(pos) = find(&body[offset..], delimiter) {
        positions.push(offset + pos);
        offset += pos + delimiter.len();
    }
    if positions.len() < 2 {
        return Err(Error::MalformedBody(
            "multipart body has no closing delimiter".to_string(),
        ));
    }

    let mut parts = Vec::new();
    for window in positions.windows(2) {
        let section = &body[window[0] + delimiter.len()..window[1]];
        // The final delimiter is followed by "--"; the section before it is
        // still a regular part.
        if section.starts_with(b"--") {
            break;
        }
        if let Some(part) = parse_section(section)? {
            parts.push(part);
        }
    }

    Ok(parts)
}

/// Parse one section: leading CRLF, headers, blank line, then data up to the
/// CRLF preceding the next delimiter.
fn parse_section(section: &[u8]) -> Result<Option<Part>> {
    let section = section.strip_prefix(b"\r\n").unwrap_or(section);

    let Some(split) = find(section, b"\r\n\r\n") else {
        return Err(Error::MalformedBody(
            "multipart section without header terminator".to_string(),
        ));
    };
    let (header_block, rest) = section.split_at(split);
    let data = rest[4..].strip_suffix(b"\r\n").unwrap_or(&rest[4..]);

    let mut name = None;
    let mut filename = None;
    let mut content_type = None;

    for line in String::from_utf8_lossy(header_block).lines() {
        let Some((header, value)) = line.split_once(':') else {
            continue;
        };
        if header.eq_ignore_ascii_case("content-disposition") {
            name = disposition_param(value, "name");
            filename = disposition_param(value, "filename");
        } else if header.eq_ignore_ascii_case("content-type") {
            content_type = Some(value.trim().to_string());
        }
    }

    Ok(name.map(|name| Part {
        name,
        filename,
        content_type,
        data: Bytes::copy_from_slice(data),
    }))
}

/// Pull a quoted parameter out of a `Content-Disposition` value.
fn disposition_param(value: &str, param: &str) -> Option<String> {
    for piece in value.split(';') {
        if let Some((key, val)) = piece.split_once('=') {
            if key.trim().eq_ignore_ascii_case(param) {
                return Some(val.trim().trim_matches('"').to_string());
            }
        }
    }
    None
}

/// First occurrence of `needle` in `haystack`.
fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}
