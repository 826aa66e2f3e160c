//! Post-processing of legacy extraction output.
//!
//! Transformers operate on the `{"head": ..., "content": [...]}` document
//! produced by [`extract_legacy_document`](crate::extract::extract_legacy_document)
//! and are applied in the order requested.

use std::fmt;
use std::str::FromStr;

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// A named JSON post-processor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transformer {
    /// Flatten each `content[].section` array by one level.
    Flatten,
    /// Keep only `section` in each `content[]` entry.
    StripMetadata,
    /// Drop nulls, and empty arrays and objects held by object keys.
    Compact,
}

impl Transformer {
    pub const ALL: [Transformer; 3] = [
        Transformer::Flatten,
        Transformer::StripMetadata,
        Transformer::Compact,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Transformer::Flatten => "flatten",
            Transformer::StripMetadata => "strip-metadata",
            Transformer::Compact => "compact",
        }
    }

    pub fn apply(&self, value: Value) -> Value {
        match self {
            Transformer::Flatten => flatten(value),
            Transformer::StripMetadata => strip_metadata(value),
            Transformer::Compact => compact(value).unwrap_or(Value::Null),
        }
    }
}

impl fmt::Display for Transformer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Transformer {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Transformer::ALL
            .into_iter()
            .find(|t| t.name() == s)
            .ok_or_else(|| Error::UnknownTransformer(s.to_string()))
    }
}

/// Apply the transformer called `name`.
///
/// Unknown names are logged and leave `value` unchanged.
pub fn apply_transformer(value: Value, name: &str) -> Value {
    match name.parse::<Transformer>() {
        Ok(transformer) => {
            debug!(transformer = name, "applying transformer");
            transformer.apply(value)
        }
        Err(_) => {
            warn!(transformer = name, "unknown transformer, output unchanged");
            value
        }
    }
}

/// Apply each named transformer in order.
pub fn apply_transformers<S: AsRef<str>>(value: Value, names: &[S]) -> Value {
    names
        .iter()
        .fold(value, |value, name| apply_transformer(value, name.as_ref()))
}

/// Run `f` over every `content[]` entry, if `content` is an array.
fn map_content(mut value: Value, f: impl Fn(Value) -> Value) -> Value {
    if let Some(Value::Array(content)) = value.get_mut("content") {
        let entries = std::mem::take(content);
        *content = entries.into_iter().map(f).collect();
    }
    value
}

fn flatten(value: Value) -> Value {
    map_content(value, |mut entry| {
        if let Some(Value::Array(items)) = entry.get_mut("section") {
            let nested = std::mem::take(items);
            for item in nested {
                match item {
                    Value::Array(inner) => items.extend(inner),
                    other => items.push(other),
                }
            }
        }
        entry
    })
}

fn strip_metadata(value: Value) -> Value {
    map_content(value, |mut entry| {
        let mut stripped = Map::new();
        if let Some(section) = entry.as_object_mut().and_then(|o| o.remove("section")) {
            stripped.insert("section".to_string(), section);
        }
        Value::Object(stripped)
    })
}

/// Compact `value`; `None` means it should be dropped by its parent.
///
/// Arrays only drop null items. Object keys also drop empty arrays and
/// empty objects.
fn compact(value: Value) -> Option<Value> {
    match value {
        Value::Null => None,
        Value::Array(items) => Some(Value::Array(items.into_iter().filter_map(compact).collect())),
        Value::Object(fields) => {
            let fields = fields
                .into_iter()
                .filter_map(|(key, value)| {
                    let value = compact(value)?;
                    let empty = match &value {
                        Value::Array(a) => a.is_empty(),
                        Value::Object(o) => o.is_empty(),
                        _ => false,
                    };
                    (!empty).then_some((key, value))
                })
                .collect();
            Some(Value::Object(fields))
        }
        other => Some(other),
    }
}
