//! Typed records and the field-extraction helper that builds them.
//!
//! Each record has an explicit `from_resource` that walks a JSON-API resource
//! with [`Fields`]: required fields fail with [`Error::Decode`], optional
//! ones resolve to `None` or a default.

mod datapoint;
mod player;
mod server;
mod session;

pub use datapoint::{DataPoint, Resolution};
pub use player::{Identifier, IdentifierType, Player};
pub use server::Server;
pub use session::Session;

#[cfg(test)]
pub(crate) use server::server_json;
#[cfg(test)]
pub(crate) use session::session_json;

use crate::error::{Error, Result};
use crate::utils::parse_datetime;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// Follow `path` through nested objects.
pub fn lookup<'a>(root: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter().try_fold(root, |v, key| v.get(*key))
}

/// Field extraction over one JSON resource.
#[derive(Debug, Clone, Copy)]
pub struct Fields<'a> {
    root: &'a Value,
    record: &'static str,
}

impl<'a> Fields<'a> {
    pub fn new(record: &'static str, root: &'a Value) -> Self {
        Self { root, record }
    }

    pub fn raw(&self, path: &[&str]) -> Option<&'a Value> {
        lookup(self.root, path).filter(|v| !v.is_null())
    }

    fn missing(&self, path: &[&str]) -> Error {
        Error::decode(format!("{} is missing {:?}", self.record, path.join(".")))
    }

    fn convert<T: DeserializeOwned>(&self, path: &[&str], v: &Value) -> Result<T> {
        T::deserialize(v).map_err(|e| {
            Error::decode(format!("{}.{}: {}", self.record, path.join("."), e))
        })
    }

    pub fn required<T: DeserializeOwned>(&self, path: &[&str]) -> Result<T> {
        let v = self.raw(path).ok_or_else(|| self.missing(path))?;
        self.convert(path, v)
    }

    pub fn optional<T: DeserializeOwned>(&self, path: &[&str]) -> Result<Option<T>> {
        self.raw(path).map(|v| self.convert(path, v)).transpose()
    }

    pub fn or_default<T: DeserializeOwned + Default>(&self, path: &[&str]) -> Result<T> {
        Ok(self.optional(path)?.unwrap_or_default())
    }

    /// An id that the API may send as a string or a number.
    pub fn required_id(&self, path: &[&str]) -> Result<u64> {
        let v = self.raw(path).ok_or_else(|| self.missing(path))?;
        parse_id(v).ok_or_else(|| {
            Error::decode(format!("{}.{}: not an id: {}", self.record, path.join("."), v))
        })
    }

    pub fn required_datetime(&self, path: &[&str]) -> Result<DateTime<Utc>> {
        let s: String = self.required(path)?;
        parse_datetime(&s)
    }

    /// Empty strings count as absent.
    pub fn optional_datetime(&self, path: &[&str]) -> Result<Option<DateTime<Utc>>> {
        match self.optional::<String>(path)? {
            Some(s) if !s.is_empty() => parse_datetime(&s).map(Some),
            _ => Ok(None),
        }
    }

    /// A nested object, or an empty one when absent.
    pub fn object_or_empty(&self, path: &[&str]) -> Map<String, Value> {
        self.raw(path)
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default()
    }
}

pub fn parse_id(v: &Value) -> Option<u64> {
    match v {
        Value::String(s) => s.parse().ok(),
        Value::Number(n) => n.as_u64(),
        _ => None,
    }
}

/// The `data` member of a document as a list of resources.
pub fn data_array(doc: &Value) -> Result<&Vec<Value>> {
    doc.get("data")
        .and_then(Value::as_array)
        .ok_or_else(|| Error::decode("document has no \"data\" array"))
}

pub fn data_object(doc: &Value) -> Result<&Value> {
    doc.get("data")
        .filter(|d| d.is_object())
        .ok_or_else(|| Error::decode("document has no \"data\" object"))
}

/// Side-loaded resources of the given `type`.
pub fn included<'a>(doc: &'a Value, kind: &'a str) -> impl Iterator<Item = &'a Value> + 'a {
    doc.get("included")
        .and_then(Value::as_array)
        .map(|items| items.as_slice())
        .unwrap_or_default()
        .iter()
        .filter(move |item| item.get("type").and_then(Value::as_str) == Some(kind))
}

/// Flatten `meta.metadata` (`[{key, value}, ...]`) into one object.
pub fn flatten_metadata(resource: &Value) -> Value {
    let mut out = Map::new();
    if let Some(entries) = lookup(resource, &["meta", "metadata"]).and_then(Value::as_array) {
        for entry in entries {
            if let Some(key) = entry.get("key").and_then(Value::as_str) {
                out.insert(
                    key.to_string(),
                    entry.get("value").cloned().unwrap_or(Value::Null),
                );
            }
        }
    }
    Value::Object(out)
}
