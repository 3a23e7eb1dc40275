use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value as JsonValue;
use std::fmt;

use crate::data::schema::ValueKind;

/// A single cell value in a result row.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Integer(i64),
    Float(f64),
    Text(String),
    Boolean(bool),
    Timestamp(DateTime<Utc>),
    /// A nested row: ordered (name, value) pairs.
    Record(Vec<(String, Value)>),
    /// A repeated field: zero or more values of one kind.
    Repeated(Vec<Value>),
}

impl Value {
    /// Decode a JSON cell using the schema's kind as a hint.
    ///
    /// The backend serializes 64-bit integers as strings to survive JSON
    /// parsers that coerce numbers to doubles, so `Integer` accepts both
    /// forms. Anything that doesn't line up with its declared kind falls
    /// back to a text rendering rather than failing the row.
    pub fn from_json(kind: &ValueKind, json: &JsonValue) -> Self {
        if json.is_null() {
            return Value::Null;
        }

        match kind {
            ValueKind::Null => Value::Null,
            ValueKind::Integer => match json {
                JsonValue::Number(n) => n
                    .as_i64()
                    .map(Value::Integer)
                    .unwrap_or_else(|| Self::best_effort(json)),
                JsonValue::String(s) => s
                    .parse::<i64>()
                    .map(Value::Integer)
                    .unwrap_or_else(|_| Value::Text(s.clone())),
                _ => Self::best_effort(json),
            },
            ValueKind::Float => match json {
                JsonValue::Number(n) => n
                    .as_f64()
                    .map(Value::Float)
                    .unwrap_or_else(|| Self::best_effort(json)),
                JsonValue::String(s) => s
                    .parse::<f64>()
                    .map(Value::Float)
                    .unwrap_or_else(|_| Value::Text(s.clone())),
                _ => Self::best_effort(json),
            },
            ValueKind::Text => match json {
                JsonValue::String(s) => Value::Text(s.clone()),
                other => Self::best_effort(other),
            },
            ValueKind::Boolean => match json {
                JsonValue::Bool(b) => Value::Boolean(*b),
                JsonValue::String(s) if s.eq_ignore_ascii_case("true") => Value::Boolean(true),
                JsonValue::String(s) if s.eq_ignore_ascii_case("false") => Value::Boolean(false),
                other => Self::best_effort(other),
            },
            ValueKind::Timestamp => match json {
                JsonValue::String(s) => DateTime::parse_from_rfc3339(s)
                    .map(|dt| Value::Timestamp(dt.with_timezone(&Utc)))
                    .unwrap_or_else(|_| Value::Text(s.clone())),
                other => Self::best_effort(other),
            },
            ValueKind::Record(fields) => match json {
                JsonValue::Object(map) => Value::Record(
                    fields
                        .iter()
                        .map(|f| {
                            let cell = map.get(&f.name).unwrap_or(&JsonValue::Null);
                            (f.name.clone(), Value::from_json(&f.kind, cell))
                        })
                        .collect(),
                ),
                other => Self::best_effort(other),
            },
            ValueKind::Repeated(inner) => match json {
                JsonValue::Array(items) => Value::Repeated(
                    items.iter().map(|v| Value::from_json(inner, v)).collect(),
                ),
                other => Self::best_effort(other),
            },
        }
    }

    fn best_effort(json: &JsonValue) -> Self {
        match json {
            JsonValue::String(s) => Value::Text(s.clone()),
            other => Value::Text(other.to_string()),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// The locale-independent canonical string form.
    ///
    /// Null renders empty here; display layers that need a visible
    /// sentinel substitute their own. Nested values render as compact
    /// JSON so they stay a single cell.
    pub fn canonical(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Integer(i) => i.to_string(),
            Value::Float(f) => float_to_string(*f),
            Value::Text(s) => s.clone(),
            Value::Boolean(b) => b.to_string(),
            Value::Timestamp(ts) => ts.to_rfc3339_opts(SecondsFormat::AutoSi, true),
            Value::Record(_) | Value::Repeated(_) => self.to_json().to_string(),
        }
    }

    /// Convert to a JSON value without precision loss: integers stay
    /// integers, record field order is preserved.
    pub fn to_json(&self) -> JsonValue {
        match self {
            Value::Null => JsonValue::Null,
            Value::Integer(i) => JsonValue::from(*i),
            Value::Float(f) => serde_json::Number::from_f64(*f)
                .map(JsonValue::Number)
                .unwrap_or_else(|| JsonValue::String(float_to_string(*f))),
            Value::Text(s) => JsonValue::String(s.clone()),
            Value::Boolean(b) => JsonValue::Bool(*b),
            Value::Timestamp(ts) => {
                JsonValue::String(ts.to_rfc3339_opts(SecondsFormat::AutoSi, true))
            }
            Value::Record(fields) => {
                let mut map = serde_json::Map::with_capacity(fields.len());
                for (name, value) in fields {
                    map.insert(name.clone(), value.to_json());
                }
                JsonValue::Object(map)
            }
            Value::Repeated(items) => {
                JsonValue::Array(items.iter().map(Value::to_json).collect())
            }
        }
    }
}

/// JSON has no NaN/Infinity, and `{}` on f64 prints "inf"; pin one
/// spelling for every output format.
fn float_to_string(f: f64) -> String {
    if f.is_nan() {
        "NaN".to_string()
    } else if f.is_infinite() {
        if f > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else {
        format!("{}", f)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.canonical())
    }
}
