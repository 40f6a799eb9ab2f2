//! Media handling
//!
//! Decodes request bodies into JSON values based on `Content-Type`, and
//! picks the response wire format from the request `Accept` header.
//!
//! Supported body formats: JSON, YAML, urlencoded forms, and
//! `multipart/form-data`. Multipart file parts appear as objects carrying
//! the filename, part content type, and content.

use serde_json::{Map, Value};
use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::http::multipart;

/// Response wire format chosen by content negotiation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Json,
    Yaml,
}

impl Format {
    pub const fn content_type(self) -> &'static str {
        match self {
            Self::Json => "application/json",
            Self::Yaml => "application/x-yaml",
        }
    }
}

/// Pick the response format from an `Accept` header.
///
/// Any mention of yaml selects YAML; everything else, including an absent
/// header, selects JSON.
pub fn negotiate(accept: Option<&str>) -> Format {
    match accept {
        Some(value) if value.to_ascii_lowercase().contains("yaml") => Format::Yaml,
        _ => Format::Json,
    }
}

/// Decode a request body into a JSON value based on its `Content-Type`.
pub fn decode_body(content_type: Option<&str>, body: &[u8]) -> Result<Value> {
    let Some(content_type) = content_type else {
        return Err(Error::UnsupportedMediaType("<none>".to_string()));
    };
    let normalized = content_type.to_ascii_lowercase();

    if normalized.contains("json") {
        Ok(serde_json::from_slice(body)?)
    } else if normalized.contains("yaml") {
        Ok(serde_yaml::from_slice(body)?)
    } else if normalized.contains("application/x-www-form-urlencoded") {
        Ok(Value::Object(
            decode_form(body)
                .into_iter()
                .map(|(k, v)| (k, Value::String(v)))
                .collect::<Map<String, Value>>(),
        ))
    } else if normalized.contains("multipart/form-data") {
        let boundary = multipart::boundary_from(content_type)?;
        let parts = multipart::parse(body, &boundary)?;
        let mut out = Map::new();
        for part in parts {
            out.insert(part.name.clone(), part.to_value());
        }
        Ok(Value::Object(out))
    } else {
        Err(Error::UnsupportedMediaType(content_type.to_string()))
    }
}

/// Decode an urlencoded body into a map. The last value wins for repeated
/// keys, matching query parameter handling.
pub fn decode_form(body: &[u8]) -> HashMap<String, String> {
    url::form_urlencoded::parse(body).into_owned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negotiate_defaults_to_json() {
        assert_eq!(negotiate(None), Format::Json);
        assert_eq!(negotiate(Some("application/json")), Format::Json);
        assert_eq!(negotiate(Some("*/*")), Format::Json);
    }

    #[test]
    fn test_negotiate_yaml() {
        assert_eq!(negotiate(Some("yaml")), Format::Yaml);
        assert_eq!(negotiate(Some("application/x-yaml")), Format::Yaml);
        assert_eq!(negotiate(Some("text/YAML")), Format::Yaml);
    }

    #[test]
    fn test_decode_json_body() {
        let value = decode_body(Some("application/json"), br#"{"hello": "world"}"#).unwrap();
        assert_eq!(value["hello"], "world");
    }

    #[test]
    fn test_decode_yaml_body() {
        let value = decode_body(Some("application/x-yaml"), b"hello: world\n").unwrap();
        assert_eq!(value["hello"], "world");
    }

    #[test]
    fn test_decode_form_body() {
        let value = decode_body(
            Some("application/x-www-form-urlencoded"),
            b"name=sam&greeting=hello+there",
        )
        .unwrap();
        assert_eq!(value["name"], "sam");
        assert_eq!(value["greeting"], "hello there");
    }

    #[test]
    fn test_decode_form_last_value_wins() {
        let form = decode_form(b"q=1&q=2&q=3");
        assert_eq!(form.get("q").map(String::as_str), Some("3"));
    }

    #[test]
    fn test_decode_unsupported() {
        let result = decode_body(Some("application/protobuf"), b"...");
        assert!(matches!(result, Err(Error::UnsupportedMediaType(_))));

        let result = decode_body(None, b"{}");
        assert!(matches!(result, Err(Error::UnsupportedMediaType(_))));
    }

    #[test]
    fn test_decode_malformed_json() {
        let result = decode_body(Some("application/json"), b"{nope");
        assert!(matches!(result, Err(Error::Json(_))));
    }
}
