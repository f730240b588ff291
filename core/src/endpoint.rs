//! Endpoint resolution: placeholder substitution and query encoding.
//!
//! A target such as `webhooks/:id` is resolved against the request options.
//! Every `:name` token takes its value from `options[name]`, and the options
//! that were consumed this way are dropped from what is left over for the
//! query string or body.

use serde_json::Value;

use crate::error::ApiError;
use crate::Options;

/// A target resolved against its options.
#[derive(Debug, Clone, PartialEq)]
pub struct Endpoint {
    /// Resolved path relative to the API base URL, without leading or
    /// trailing slashes.
    pub path: String,
    /// Options not consumed by a placeholder.
    pub remaining: Options,
}

#[derive(Debug, Clone, Copy)]
pub struct EndpointBuilder<'a> {
    resource: Option<&'a str>,
    target: &'a str,
}

impl<'a> EndpointBuilder<'a> {
    pub fn new(target: &'a str) -> Self {
        Self {
            resource: None,
            target,
        }
    }

    /// Prefix the resolved path with a resource name such as `channels`.
    pub fn with_resource(mut self, resource: Option<&'a str>) -> Self {
        self.resource = resource;
        self
    }

    /// Resolve the target against `options`.
    ///
    /// Empty segments of the resource and the target are dropped, so
    /// `channels/` and `/channels` both resolve to `channels`. Substituted
    /// values are never dropped: an empty or dot-segment value fails with
    /// `InvalidPathValue` instead of silently changing the path.
    pub fn build(&self, options: &Options) -> Result<Endpoint, ApiError> {
        let mut consumed: Vec<&str> = Vec::new();
        let mut segments: Vec<String> = self
            .resource
            .into_iter()
            .flat_map(|resource| resource.split('/'))
            .filter(|segment| !segment.is_empty())
            .map(str::to_string)
            .collect();

        for segment in self.target.split('/').filter(|segment| !segment.is_empty()) {
            segments.push(self.resolve_segment(segment, options, &mut consumed)?);
        }

        let remaining = options
            .iter()
            .filter(|(key, _)| !consumed.contains(&key.as_str()))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        Ok(Endpoint {
            path: segments.join("/"),
            remaining,
        })
    }

    fn resolve_segment<'o>(
        &self,
        segment: &'o str,
        options: &Options,
        consumed: &mut Vec<&'o str>,
    ) -> Result<String, ApiError> {
        let mut resolved = String::with_capacity(segment.len());
        let mut rest = segment;

        while let Some(start) = rest.find(':') {
            resolved.push_str(&rest[..start]);
            let after = &rest[start + 1..];
            let len = after
                .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
                .unwrap_or(after.len());
            if len == 0 {
                // A lone colon is literal text.
                resolved.push(':');
                rest = after;
                continue;
            }

            let name = &after[..len];
            let value = options.get(name).ok_or_else(|| ApiError::UnresolvedPlaceholder {
                target: self.target.to_string(),
                name: name.to_string(),
            })?;
            resolved.push_str(&urlencoding::encode(&path_value(name, value)?));
            consumed.push(name);
            rest = &after[len..];
        }
        resolved.push_str(rest);
        Ok(resolved)
    }
}

fn path_value(name: &str, value: &Value) -> Result<String, ApiError> {
    let invalid = || ApiError::InvalidPathValue {
        name: name.to_string(),
    };
    match value {
        Value::String(s) if s.is_empty() || s == "." || s == ".." => Err(invalid()),
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => Err(invalid()),
    }
}

/// Render options as a URL query string, without the leading `?`.
///
/// Null values are skipped, booleans become `1`/`0`, and nested arrays and
/// objects use bracket notation (`reports[notifier]=0`, `ids[0]=7`).
pub fn encode_query(options: &Options) -> String {
    let mut pairs = Vec::new();
    for (key, value) in options {
        collect_pairs(key.clone(), value, &mut pairs);
    }
    pairs
        .iter()
        .map(|(key, value)| format!("{}={}", urlencoding::encode(key), urlencoding::encode(value)))
        .collect::<Vec<_>>()
        .join("&")
}

fn collect_pairs(key: String, value: &Value, pairs: &mut Vec<(String, String)>) {
    match value {
        Value::Null => {}
        Value::Bool(b) => pairs.push((key, if *b { "1" } else { "0" }.to_string())),
        Value::Number(n) => pairs.push((key, n.to_string())),
        Value::String(s) => pairs.push((key, s.clone())),
        Value::Array(items) => {
            for (index, item) in items.iter().enumerate() {
                collect_pairs(format!("{key}[{index}]"), item, pairs);
            }
        }
        Value::Object(map) => {
            for (sub, item) in map {
                collect_pairs(format!("{key}[{sub}]"), item, pairs);
            }
        }
    }
}
