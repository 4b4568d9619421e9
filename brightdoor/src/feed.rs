//! Feed configuration and submission records as handed over by the host form
//! platform.
//!
//! The host sends loosely-typed values (numbers where strings are expected,
//! `"1"` for checked boxes), so deserialization is lenient about scalar types.

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Configured mapping and rules connecting one form to the contact sync.
///
/// Field values are already resolved by the host (smart tags replaced with
/// submitted values). `email_address` is the exception: it may still hold the
/// key of the submission field to read the address from.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct FeedConfig {
    #[serde(deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(rename = "emailAddress", deserialize_with = "lenient_string")]
    pub email_address: String,
    #[serde(rename = "firstName", deserialize_with = "lenient_string")]
    pub first_name: String,
    #[serde(rename = "lastName", deserialize_with = "lenient_string")]
    pub last_name: String,
    #[serde(deserialize_with = "lenient_string")]
    pub phone: String,
    #[serde(deserialize_with = "lenient_string")]
    pub address1: String,
    #[serde(deserialize_with = "lenient_string")]
    pub address2: String,
    #[serde(deserialize_with = "lenient_string")]
    pub city: String,
    #[serde(deserialize_with = "lenient_string")]
    pub state: String,
    #[serde(deserialize_with = "lenient_string")]
    pub zip: String,
    #[serde(deserialize_with = "lenient_string")]
    pub country: String,
    #[serde(deserialize_with = "lenient_string")]
    pub note: String,
    #[serde(deserialize_with = "lenient_string")]
    pub contact_status_id: String,
    #[serde(deserialize_with = "lenient_string")]
    pub contact_initial_type: String,
    #[serde(deserialize_with = "lenient_string")]
    pub contact_lead_source: String,
    #[serde(deserialize_with = "lenient_flag")]
    pub check_existing_email: bool,
    #[serde(deserialize_with = "lenient_flag")]
    pub enabled: bool,
    #[serde(deserialize_with = "lenient_pairs")]
    pub extra_fields: Vec<LabeledValue>,
    #[serde(deserialize_with = "lenient_pairs")]
    pub contact_attributes: Vec<LabeledValue>,
}

impl Default for FeedConfig {
    fn default() -> Self {
        FeedConfig {
            name: String::new(),
            email_address: String::new(),
            first_name: String::new(),
            last_name: String::new(),
            phone: String::new(),
            address1: String::new(),
            address2: String::new(),
            city: String::new(),
            state: String::new(),
            zip: String::new(),
            country: String::new(),
            note: String::new(),
            // 6 = UG Prospect
            contact_status_id: "6".into(),
            // 6 = Internet Contact
            contact_initial_type: "6".into(),
            // 22 = This website
            contact_lead_source: "22".into(),
            check_existing_email: false,
            enabled: true,
            extra_fields: Vec::new(),
            contact_attributes: Vec::new(),
        }
    }
}

/// A `{label, item_value}` row from a repeater setting.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct LabeledValue {
    #[serde(default, deserialize_with = "lenient_string")]
    pub label: String,
    #[serde(default, alias = "value", deserialize_with = "lenient_string")]
    pub item_value: String,
}

impl LabeledValue {
    pub fn new<L: Into<String>, V: Into<String>>(label: L, item_value: V) -> Self {
        LabeledValue {
            label: label.into(),
            item_value: item_value.into(),
        }
    }

    /// Rows without a label or without a value are ignored by the mapping.
    pub fn is_set(&self) -> bool {
        !self.label.is_empty() && !self.item_value.is_empty()
    }
}

/// Submitted form values keyed by form field name.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(transparent)]
pub struct SubmissionRecord(IndexMap<String, Value>);

impl SubmissionRecord {
    /// Returns the scalar value under `key` as a string.
    ///
    /// An exact key match wins; otherwise `key` is read as a dotted path into
    /// nested fields (`names.first_name`). Containers and nulls yield `None`.
    pub fn get_str(&self, key: &str) -> Option<String> {
        if let Some(value) = self.0.get(key) {
            return scalar_to_string(value);
        }

        let mut parts = key.split('.');
        let mut current = self.0.get(parts.next()?)?;
        for part in parts {
            current = match current {
                Value::Object(map) => map.get(part)?,
                Value::Array(items) => items.get(part.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        scalar_to_string(current)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for SubmissionRecord {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        SubmissionRecord(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(if *b { "1" } else { "" }.to_string()),
        _ => None,
    }
}

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(scalar_to_string(&value).unwrap_or_default())
}

fn lenient_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Bool(b) => b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => matches!(
            s.trim().to_ascii_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        ),
        _ => false,
    })
}

// A repeater left untouched in the host UI is sent as `null` or `false`.
fn lenient_pairs<'de, D>(deserializer: D) -> Result<Vec<LabeledValue>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    match value {
        Value::Array(items) => items
            .into_iter()
            .map(|item| serde_json::from_value(item).map_err(serde::de::Error::custom))
            .collect(),
        _ => Ok(Vec::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn defaults_match_new_feed() {
        let feed: FeedConfig = serde_json::from_value(json!({})).unwrap();
        assert_eq!(feed.contact_status_id, "6");
        assert_eq!(feed.contact_initial_type, "6");
        assert_eq!(feed.contact_lead_source, "22");
        assert!(!feed.check_existing_email);
        assert!(feed.enabled);
        assert!(feed.extra_fields.is_empty());
    }

    #[test]
    fn lenient_host_values() {
        let feed: FeedConfig = serde_json::from_value(json!({
            "emailAddress": "email",
            "zip": 90210,
            "contact_status_id": 3,
            "check_existing_email": "1",
            "enabled": false,
            "extra_fields": [{"label": "CompanyName", "item_value": "Acme"}],
            "contact_attributes": null,
            "phone": null,
        }))
        .unwrap();

        assert_eq!(feed.zip, "90210");
        assert_eq!(feed.contact_status_id, "3");
        assert!(feed.check_existing_email);
        assert!(!feed.enabled);
        assert_eq!(feed.extra_fields, vec![LabeledValue::new("CompanyName", "Acme")]);
        assert!(feed.contact_attributes.is_empty());
        assert_eq!(feed.phone, "");
    }

    #[test]
    fn labeled_value_accepts_value_alias() {
        let pair: LabeledValue =
            serde_json::from_value(json!({"label": "Honorific", "value": "Mr"})).unwrap();
        assert_eq!(pair.item_value, "Mr");
        assert!(pair.is_set());
        assert!(!LabeledValue::new("Honorific", "").is_set());
        assert!(!LabeledValue::new("", "Mr").is_set());
    }

    #[test]
    fn submission_lookup() {
        let submission: SubmissionRecord = serde_json::from_value(json!({
            "email": "jo@example.com",
            "age": 42,
            "names": {"first_name": "Jo"},
            "tags": ["a", "b"],
            "dotted.key": "exact",
        }))
        .unwrap();

        assert_eq!(submission.get_str("email").as_deref(), Some("jo@example.com"));
        assert_eq!(submission.get_str("age").as_deref(), Some("42"));
        assert_eq!(submission.get_str("names.first_name").as_deref(), Some("Jo"));
        assert_eq!(submission.get_str("tags.1").as_deref(), Some("b"));
        assert_eq!(submission.get_str("dotted.key").as_deref(), Some("exact"));
        assert_eq!(submission.get_str("names"), None);
        assert_eq!(submission.get_str("missing"), None);
    }
}
