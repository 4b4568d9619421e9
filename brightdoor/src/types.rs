use serde::Serialize;
use serde_json::Value;
use std::fmt;

/// Identifier of an existing BrightDoor contact.
///
/// BrightDoor returns ids as JSON numbers, some proxies as strings. The
/// JSON value is kept as received so it is echoed back in the same form.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ContactId(Value);

impl ContactId {
    /// Accepts a number or a non-empty string; anything else is not an id.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(_) => Some(ContactId(value.clone())),
            Value::String(s) if !s.trim().is_empty() => Some(ContactId(value.clone())),
            _ => None,
        }
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }
}

impl fmt::Display for ContactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Value::String(s) => f.write_str(s),
            other => write!(f, "{other}"),
        }
    }
}

impl From<u64> for ContactId {
    fn from(id: u64) -> Self {
        ContactId(Value::from(id))
    }
}

/// Result of looking a contact up by email address.
#[derive(Debug, Clone, PartialEq)]
pub enum LookupOutcome {
    Found(ContactId),
    NotFound,
}

/// Result of a successful create-or-update call.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncResult {
    pub id: Option<ContactId>,
    pub raw: Value,
}
