//! Prefix-search response payload and ranked items.
//!
//! Upstream fields are loosely typed (years come as numbers, scores as
//! strings or numbers), so everything is read leniently and defaults to empty.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::highlight::Segment;

/// Body of a prefix-search response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Found {
    #[serde(default)]
    pub categories: Vec<FoundCategory>,
}

/// One category of results. Items stay raw so a malformed one can be skipped.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FoundCategory {
    #[serde(default, rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub items: Vec<Value>,
}

/// A single result as sent by the API.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FoundItem {
    #[serde(default, rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub payload: Payload,
}

/// Category-specific details of a result.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Payload {
    #[serde(default)]
    pub media_type: Option<Value>,
    #[serde(default)]
    pub start_year: Option<Value>,
    #[serde(default)]
    pub aired: Option<Value>,
    #[serde(default)]
    pub published: Option<Value>,
    #[serde(default)]
    pub score: Option<Value>,
    #[serde(default)]
    pub status: Option<Value>,
    #[serde(default)]
    pub related_works: Option<Value>,
    #[serde(default)]
    pub alternative_name: Option<Value>,
}

/// Display text of a loosely typed scalar. Empty for null, false, zero and
/// containers.
pub fn scalar_text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) if n.as_f64() != Some(0.0) => n.to_string(),
        Some(Value::Bool(true)) => "true".to_string(),
        _ => String::new(),
    }
}

/// Strings of a loosely typed list, joined with `, `.
pub fn joined_text(value: Option<&Value>) -> String {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .map(|v| scalar_text(Some(v)))
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(", "),
        other => scalar_text(other),
    }
}

/// A result after weighing, as stored in the cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedItem {
    pub name: String,
    #[serde(rename = "type")]
    pub item_type: String,
    pub status: String,
    pub weight: i64,
    pub url: String,
    #[serde(default)]
    pub year: String,
    #[serde(default)]
    pub score: String,
    #[serde(default)]
    pub dates: String,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub segments: Vec<Segment>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_scalar_text() {
        assert_eq!(scalar_text(Some(&json!("7.99"))), "7.99");
        assert_eq!(scalar_text(Some(&json!(2002))), "2002");
        assert_eq!(scalar_text(Some(&json!(0))), "");
        assert_eq!(scalar_text(Some(&Value::Null)), "");
        assert_eq!(scalar_text(None), "");
    }

    #[test]
    fn test_joined_text() {
        assert_eq!(joined_text(Some(&json!(["Naruto", "Boruto"]))), "Naruto, Boruto");
        assert_eq!(joined_text(Some(&json!("Naruto"))), "Naruto");
        assert_eq!(joined_text(Some(&json!([]))), "");
    }

    #[test]
    fn test_item_with_missing_fields() {
        let item: FoundItem = serde_json::from_value(json!({"name": "Bleach"})).unwrap();
        assert_eq!(item.name, "Bleach");
        assert!(item.kind.is_empty());
        assert!(item.payload.status.is_none());
    }

    #[test]
    fn test_found_without_categories() {
        let found: Found = serde_json::from_str("{}").unwrap();
        assert!(found.categories.is_empty());
    }
}
