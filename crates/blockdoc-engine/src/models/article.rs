use serde::{Deserialize, Deserializer, Serialize, de};
use serde_json::{Map, Value};

use crate::models::BlockData;
use crate::models::block::string_or_scalar;
use crate::sanitize::value_text;

/// Title, free-form metadata and the ordered blocks of one document.
///
/// Block order is display order for both render targets.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Article {
    #[serde(default, deserialize_with = "string_or_scalar")]
    pub title: String,
    #[serde(default, deserialize_with = "metadata_or_empty")]
    pub metadata: Map<String, Value>,
    #[serde(default)]
    pub blocks: Vec<BlockData>,
}

impl Article {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// JSON object form, as stored under `article` in the wire format.
    pub fn to_value(&self) -> Value {
        let mut object = Map::new();
        object.insert("title".to_string(), Value::String(self.title.clone()));
        object.insert("metadata".to_string(), Value::Object(self.metadata.clone()));
        object.insert(
            "blocks".to_string(),
            Value::Array(self.blocks.iter().map(BlockData::to_value).collect()),
        );
        Value::Object(object)
    }

    /// Author as display text; falsy values read as absent.
    pub fn author(&self) -> Option<String> {
        self.metadata_text("author")
    }

    pub fn published_date(&self) -> Option<String> {
        self.metadata_text("publishedDate")
    }

    /// Tags as display text. Non-string entries are stringified, `null` as empty.
    pub fn tags(&self) -> Vec<String> {
        self.metadata
            .get("tags")
            .and_then(Value::as_array)
            .map(|tags| {
                tags.iter()
                    .map(|tag| match tag {
                        Value::String(s) => s.clone(),
                        Value::Null => String::new(),
                        other => other.to_string(),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    fn metadata_text(&self, key: &str) -> Option<String> {
        Some(value_text(self.metadata.get(key))).filter(|text| !text.is_empty())
    }
}

/// `null` metadata reads as empty; any other non-object is rejected.
fn metadata_or_empty<'de, D>(deserializer: D) -> Result<Map<String, Value>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Object(metadata) => Ok(metadata),
        Value::Null => Ok(Map::new()),
        _ => Err(de::Error::custom("metadata must be an object")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_article_deserializes_with_defaults() {
        let article: Article = serde_json::from_value(json!({"title": "T"})).unwrap();
        assert_eq!(article.title, "T");
        assert!(article.metadata.is_empty());
        assert!(article.blocks.is_empty());
    }

    #[test]
    fn test_metadata_accessors() {
        let article: Article = serde_json::from_value(json!({
            "title": "T",
            "metadata": {
                "author": "Ada",
                "publishedDate": "2024-01-15",
                "tags": ["rust", 7, "docs"]
            }
        }))
        .unwrap();

        assert_eq!(article.author().as_deref(), Some("Ada"));
        assert_eq!(article.published_date().as_deref(), Some("2024-01-15"));
        assert_eq!(article.tags(), vec!["rust", "7", "docs"]);
    }

    #[test]
    fn test_non_string_metadata_is_stringified() {
        let article: Article = serde_json::from_value(json!({
            "title": "T",
            "metadata": {"author": 42, "tags": [true, null, "x"]}
        }))
        .unwrap();

        assert_eq!(article.author().as_deref(), Some("42"));
        assert_eq!(article.tags(), vec!["true", "", "x"]);
    }

    #[test]
    fn test_null_metadata_reads_as_empty() {
        let article: Article =
            serde_json::from_value(json!({"title": "T", "metadata": null})).unwrap();
        assert!(article.metadata.is_empty());

        let result = serde_json::from_value::<Article>(json!({"title": "T", "metadata": "x"}));
        assert!(result.is_err());
    }

    #[test]
    fn test_to_value_matches_serde() {
        let mut article = Article::new("T");
        article.blocks.push(BlockData::new("a", "text").with_field("extra", 1));

        assert_eq!(article.to_value(), serde_json::to_value(&article).unwrap());
    }

    #[test]
    fn test_missing_metadata_fields() {
        let article = Article::new("T");
        assert_eq!(article.author(), None);
        assert!(article.tags().is_empty());
    }
}
