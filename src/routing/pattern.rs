//! Path patterns
//!
//! Route paths are plain segments with `{name}` placeholders, e.g.
//! `/orders/{id}`. A placeholder captures exactly one non-empty segment.
//! Trailing slashes are significant: `/orders` and `/orders/` are distinct
//! patterns.

use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
}

/// A parsed route path.
#[derive(Debug, Clone)]
pub struct PathPattern {
    raw: String,
    segments: Vec<Segment>,
}

impl PathPattern {
    /// Parse a pattern string. Any `{name}` segment becomes a parameter
    /// capture; everything else matches literally.
    pub fn parse(pattern: &str) -> Self {
        let trimmed = pattern.strip_prefix('/').unwrap_or(pattern);
        let segments = trimmed
            .split('/')
            .map(|segment| {
                let is_param = segment.len() > 2
                    && segment.starts_with('{')
                    && segment.ends_with('}');
                if is_param {
                    Segment::Param(segment[1..segment.len() - 1].to_string())
                } else {
                    Segment::Literal(segment.to_string())
                }
            })
            .collect();
        Self {
            raw: pattern.to_string(),
            segments,
        }
    }

    /// Match a request path against this pattern, returning captured
    /// parameters on success.
    pub fn matches(&self, path: &str) -> Option<HashMap<String, String>> {
        let trimmed = path.strip_prefix('/').unwrap_or(path);
        let parts: Vec<&str> = trimmed.split('/').collect();
        if parts.len() != self.segments.len() {
            return None;
        }

        let mut params = HashMap::new();
        for (segment, part) in self.segments.iter().zip(&parts) {
            match segment {
                Segment::Literal(literal) => {
                    if literal != part {
                        return None;
                    }
                }
                Segment::Param(name) => {
                    if part.is_empty() {
                        return None;
                    }
                    params.insert(name.clone(), (*part).to_string());
                }
            }
        }
        Some(params)
    }

    /// Build a concrete path from this pattern and parameter values.
    /// Returns None if any placeholder is missing from `params`.
    pub fn reverse(&self, params: &[(&str, &str)]) -> Option<String> {
        let mut path = String::new();
        for segment in &self.segments {
            path.push('/');
            match segment {
                Segment::Literal(literal) => path.push_str(literal),
                Segment::Param(name) => {
                    let value = params
                        .iter()
                        .find(|(key, _)| key == name)
                        .map(|(_, value)| *value)?;
                    path.push_str(value);
                }
            }
        }
        Some(path)
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl PartialEq for PathPattern {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}
