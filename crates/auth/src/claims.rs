use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Identity claims supplied by the authentication layer.
///
/// A flat key/value mapping, transport-agnostic. Decoding and verifying a
/// token is the host's job; this crate only reads the result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Claims(Map<String, Value>);

impl Claims {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Single scalar claim as text. Integers are rendered in decimal; any
    /// other JSON shape yields `None`.
    pub fn scalar(&self, key: &str) -> Option<String> {
        match self.0.get(key)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    /// Multi-valued claim: a single string or an array of strings. Non-string
    /// array members are skipped.
    pub fn values(&self, key: &str) -> Vec<String> {
        match self.0.get(key) {
            Some(Value::String(s)) => vec![s.clone()],
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect(),
            _ => Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Which claim names carry the identifier and the roles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimMapping {
    pub user_id_claim: String,
    pub role_claim: String,
}

impl Default for ClaimMapping {
    fn default() -> Self {
        Self {
            user_id_claim: "sub".to_string(),
            role_claim: "role".to_string(),
        }
    }
}
