//! Parser for the device's bar-and-newline delimited response text
//!
//! A typical navigation response looks like:
//!
//! ```text
//! Cmd = nav
//! responses = 0
//! |x=-5644|y=120|theta=314
//! ```
//!
//! The leading segment may hold several `key = value` lines; every later
//! segment is a single `key=value` pair. Values that read as base-10 integers
//! become [`Value::Integer`], everything else is kept as trimmed text.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

use crate::error::{Result, RovioError};
use crate::response_code::ResponseCode;

/// Key that carries the command outcome in most responses
pub const RESPONSES_KEY: &str = "responses";

/// A single response value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Integer(i64),
    Text(String),
}

impl Value {
    /// Integer if the text reads as one, trimmed text otherwise
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        match trimmed.parse::<i64>() {
            Ok(n) => Value::Integer(n),
            Err(_) => Value::Text(trimmed.to_string()),
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(n) => Some(*n),
            Value::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            Value::Integer(_) => None,
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Integer(n) => write!(f, "{}", n),
            Value::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(n)
    }
}

macro_rules! impl_from_small_int {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(n: $t) -> Self {
                    Value::Integer(i64::from(n))
                }
            }
        )*
    };
}

impl_from_small_int!(i32, u8, u16, u32);

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

/// Parsed key/value pairs of one response
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResponseMap(HashMap<String, Value>);

impl ResponseMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Insert a pair, returning the value it replaced
    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(key.into(), value)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Integer field; `None` when absent, an error when present as text
    pub fn integer(&self, key: &str) -> Result<Option<i64>> {
        match self.0.get(key) {
            None => Ok(None),
            Some(Value::Integer(n)) => Ok(Some(*n)),
            Some(Value::Text(s)) => Err(RovioError::MalformedResponse(format!(
                "field '{}' should be an integer, got '{}'",
                key, s
            ))),
        }
    }

    /// Raw `responses` value, if the response carried one
    pub fn response_code(&self) -> Result<Option<i64>> {
        self.integer(RESPONSES_KEY)
    }

    /// Fail with a response error unless `responses` is absent or SUCCESS
    pub fn check(&self, command: &'static str) -> Result<Option<ResponseCode>> {
        match self.response_code()? {
            None => Ok(None),
            Some(0) => Ok(Some(ResponseCode::Success)),
            Some(code) => Err(RovioError::response(command, code)),
        }
    }
}

impl FromIterator<(String, Value)> for ResponseMap {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Parse a response body into a [`ResponseMap`]
///
/// Trailing whitespace on the body is ignored and an empty body gives an
/// empty map. Any other blank segment is malformed. A repeated key keeps its
/// last value.
pub fn parse_response(text: &str) -> Result<ResponseMap> {
    let mut map = ResponseMap::new();
    let text = text.trim_end();
    if text.is_empty() {
        return Ok(map);
    }

    let mut segments = text.split('|');
    let head = segments.next().unwrap_or_default();

    for segment in head.lines().chain(segments) {
        let (key, value) = segment.split_once('=').ok_or_else(|| {
            RovioError::MalformedResponse(format!("segment without '=': '{}'", segment.trim()))
        })?;

        let key = key.trim();
        if let Some(previous) = map.insert(key, Value::parse(value)) {
            debug!(key = %key, previous = %previous, "Duplicate response key, keeping later value");
        }
    }

    Ok(map)
}
