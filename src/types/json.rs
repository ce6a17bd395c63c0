use chrono::{DateTime, Utc};
use serde_json::{Map, Number};

use super::context::DataContext;
use super::error::ErrorKind;
use super::host::Record;
use super::value::Value;

const MAX_DEPTH: usize = 32;

/// Convert a JSON document into a [`Value`]. Objects become [`Record`]s named
/// after their key, and strings in RFC 3339 form become times.
///
/// # Errors
///
/// [`ErrorKind::TypeMismatch`] for arrays, which have no rule representation.
pub fn value_from_json(name: &str, json: &serde_json::Value) -> Result<Value, ErrorKind> {
    Ok(match json {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(*b),
        serde_json::Value::Number(n) => number(n),
        serde_json::Value::String(s) => match DateTime::parse_from_rfc3339(s) {
            Ok(time) => Value::Time(time.with_timezone(&Utc)),
            Err(_) => Value::String(s.clone()),
        },
        serde_json::Value::Object(map) => Value::Object(record(name, map)?.into_ref()),
        serde_json::Value::Array(_) => {
            return Err(ErrorKind::mismatch(format!(
                "'{name}' is an array; arrays are not supported"
            )))
        }
    })
}

/// Render a [`Value`] as JSON, expanding host objects through their field
/// names. Object graphs deeper than 32 levels are cut off with `null`.
#[must_use]
pub fn value_to_json(value: &Value) -> serde_json::Value {
    to_json_at(value, 0)
}

fn to_json_at(value: &Value, depth: usize) -> serde_json::Value {
    match value {
        Value::Int(v) => serde_json::Value::from(*v),
        Value::Uint(v) => serde_json::Value::from(*v),
        Value::Float(v) => Number::from_f64(*v).map_or(serde_json::Value::Null, Into::into),
        Value::String(v) => serde_json::Value::String(v.clone()),
        Value::Bool(v) => serde_json::Value::Bool(*v),
        Value::Time(v) => serde_json::Value::String(v.to_rfc3339()),
        Value::Null => serde_json::Value::Null,
        Value::Object(_) if depth >= MAX_DEPTH => serde_json::Value::Null,
        Value::Object(object) => {
            let guard = object.read();
            let mut map = Map::new();
            for field in guard.field_names() {
                let nested = guard.get_field(&field).unwrap_or(Value::Null);
                map.insert(field, to_json_at(&nested, depth + 1));
            }
            serde_json::Value::Object(map)
        }
    }
}

fn number(n: &Number) -> Value {
    if let Some(v) = n.as_i64() {
        Value::Int(v)
    } else if let Some(v) = n.as_u64() {
        Value::Uint(v)
    } else {
        Value::Float(n.as_f64().unwrap_or(f64::NAN))
    }
}

fn record(name: &str, map: &Map<String, serde_json::Value>) -> Result<Record, ErrorKind> {
    let mut rec = Record::new(name);
    for (key, json) in map {
        rec.insert(key.clone(), value_from_json(key, json)?);
    }
    Ok(rec)
}

impl Record {
    /// Build a record from a JSON object.
    ///
    /// # Errors
    ///
    /// [`ErrorKind::TypeMismatch`] if `json` is not an object or contains an
    /// array.
    pub fn from_json(name: &str, json: &serde_json::Value) -> Result<Self, ErrorKind> {
        match json {
            serde_json::Value::Object(map) => record(name, map),
            other => Err(ErrorKind::mismatch(format!(
                "'{name}' must be a JSON object, found {other}"
            ))),
        }
    }
}

impl DataContext {
    /// Build a context whose roots are the top-level keys of a JSON object.
    ///
    /// # Errors
    ///
    /// [`ErrorKind::TypeMismatch`] if `json` is not an object or contains an
    /// array.
    pub fn from_json(json: &serde_json::Value) -> Result<Self, ErrorKind> {
        let serde_json::Value::Object(map) = json else {
            return Err(ErrorKind::mismatch("facts must be a JSON object"));
        };
        let mut ctx = DataContext::new();
        for (key, value) in map {
            ctx.insert(key, value_from_json(key, value)?);
        }
        Ok(ctx)
    }

    /// Parse JSON text and build a context from it.
    ///
    /// # Errors
    ///
    /// [`RuleforgeError::Json`](crate::RuleforgeError::Json) for malformed
    /// text, [`RuleforgeError::Facts`](crate::RuleforgeError::Facts) when the
    /// document has no rule representation.
    pub fn from_json_str(text: &str) -> Result<Self, crate::RuleforgeError> {
        let json: serde_json::Value = serde_json::from_str(text)?;
        Ok(Self::from_json(&json)?)
    }

    /// Like [`from_json_str`](Self::from_json_str), reading the text from a
    /// file.
    ///
    /// # Errors
    ///
    /// [`RuleforgeError::Io`](crate::RuleforgeError::Io) when the file
    /// cannot be read, otherwise as [`from_json_str`](Self::from_json_str).
    pub fn from_json_file(
        path: impl AsRef<std::path::Path>,
    ) -> Result<Self, crate::RuleforgeError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Render every root except `DEFUNC` as one JSON object.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        let map: Map<String, serde_json::Value> = self
            .roots()
            .map(|(name, value)| (name.to_owned(), value_to_json(value)))
            .collect();
        serde_json::Value::Object(map)
    }
}
