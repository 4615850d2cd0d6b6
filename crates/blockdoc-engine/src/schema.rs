//! Structural validation of serialized documents.
//!
//! Block construction only checks presence of required fields. The schema
//! goes further: id pattern, field types, heading level range, URI format
//! and id uniqueness across the whole article.

use regex::Regex;
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::sync::OnceLock;

use crate::error::ValidationErrors;
use crate::models::BlockType;

/// Validates the serialized `{"article": ...}` form of a document.
pub trait SchemaValidator {
    fn validate(&self, document: &Value) -> Result<(), ValidationErrors>;
}

/// The built-in BlockDoc article schema. Collects every violation.
#[derive(Debug, Clone, Copy, Default)]
pub struct ArticleSchema;

impl SchemaValidator for ArticleSchema {
    fn validate(&self, document: &Value) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        match document.get("article") {
            Some(Value::Object(article)) => check_article(article, &mut errors),
            Some(_) => errors.push("/article", "must be an object"),
            None => errors.push("/article", "is required"),
        }

        errors.into_result()
    }
}

fn id_pattern() -> &'static Regex {
    static ID_PATTERN: OnceLock<Regex> = OnceLock::new();
    ID_PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z0-9\-_]+$").expect("Invalid id regex"))
}

/// Absolute `scheme:` URIs, protocol-relative URLs and paths.
fn is_uri(value: &str) -> bool {
    static URI_PATTERN: OnceLock<Regex> = OnceLock::new();
    let uri = URI_PATTERN.get_or_init(|| {
        Regex::new(r"^(?:[A-Za-z][A-Za-z0-9+.\-]*:[^\s]+|//[^\s/]+[^\s]*|/?[^\s:]+)$")
            .expect("Invalid URI regex")
    });
    uri.is_match(value)
}

fn check_article(article: &Map<String, Value>, errors: &mut ValidationErrors) {
    match article.get("title") {
        Some(Value::String(title)) if !title.is_empty() => {}
        Some(Value::String(_)) => errors.push("/article/title", "must not be empty"),
        Some(_) => errors.push("/article/title", "must be a string"),
        None => errors.push("/article/title", "is required"),
    }

    match article.get("metadata") {
        None => {}
        Some(Value::Object(metadata)) => check_metadata(metadata, errors),
        Some(_) => errors.push("/article/metadata", "must be an object"),
    }

    match article.get("blocks") {
        Some(Value::Array(blocks)) => {
            let mut seen = HashSet::new();
            for (index, block) in blocks.iter().enumerate() {
                let path = format!("/article/blocks/{index}");
                match block {
                    Value::Object(block) => {
                        if let Some(Value::String(id)) = block.get("id")
                            && !seen.insert(id.as_str())
                        {
                            errors.push(format!("{path}/id"), format!("duplicate id {id:?}"));
                        }
                        check_block(&path, block, errors);
                    }
                    _ => errors.push(path, "must be an object"),
                }
            }
        }
        Some(_) => errors.push("/article/blocks", "must be an array"),
        None => errors.push("/article/blocks", "is required"),
    }
}

fn check_metadata(metadata: &Map<String, Value>, errors: &mut ValidationErrors) {
    for field in ["author", "publishedDate"] {
        if let Some(value) = metadata.get(field)
            && !value.is_string()
        {
            errors.push(format!("/article/metadata/{field}"), "must be a string");
        }
    }
    match metadata.get("tags") {
        None => {}
        Some(Value::Array(tags)) if tags.iter().all(Value::is_string) => {}
        Some(_) => errors.push("/article/metadata/tags", "must be an array of strings"),
    }
}

fn check_block(path: &str, block: &Map<String, Value>, errors: &mut ValidationErrors) {
    match block.get("id") {
        Some(Value::String(id)) if id_pattern().is_match(id) => {}
        Some(Value::String(_)) => errors.push(
            format!("{path}/id"),
            "must match pattern ^[A-Za-z0-9-_]+$",
        ),
        Some(_) => errors.push(format!("{path}/id"), "must be a string"),
        None => errors.push(format!("{path}/id"), "is required"),
    }

    if let Some(content) = block.get("content")
        && !content.is_string()
    {
        errors.push(format!("{path}/content"), "must be a string");
    }

    let block_type = match block.get("type") {
        Some(Value::String(name)) => match name.parse::<BlockType>() {
            Ok(block_type) => block_type,
            Err(_) => {
                errors.push(
                    format!("{path}/type"),
                    format!("must be one of: {}", BlockType::allowed_list()),
                );
                return;
            }
        },
        Some(_) => {
            errors.push(format!("{path}/type"), "must be a string");
            return;
        }
        None => {
            errors.push(format!("{path}/type"), "is required");
            return;
        }
    };

    for &field in block_type.required_fields() {
        if !block.contains_key(field) {
            errors.push(format!("{path}/{field}"), "is required");
        }
    }

    let string_field = |field: &str, errors: &mut ValidationErrors| {
        if let Some(value) = block.get(field)
            && !value.is_string()
        {
            errors.push(format!("{path}/{field}"), "must be a string");
        }
    };
    let uri_field = |field: &str, errors: &mut ValidationErrors| match block.get(field) {
        Some(Value::String(url)) if is_uri(url) => {}
        Some(_) => errors.push(format!("{path}/{field}"), "must be a URI"),
        None => {}
    };

    match block_type {
        BlockType::Heading => match block.get("level").and_then(Value::as_i64) {
            Some(1..=6) => {}
            _ if block.contains_key("level") => errors.push(
                format!("{path}/level"),
                "must be an integer between 1 and 6",
            ),
            _ => {}
        },
        BlockType::Image => {
            uri_field("url", errors);
            string_field("alt", errors);
            string_field("caption", errors);
        }
        BlockType::Code => string_field("language", errors),
        BlockType::List => {
            match block.get("items") {
                Some(Value::Array(items)) if items.iter().all(Value::is_string) => {}
                Some(_) => errors.push(format!("{path}/items"), "must be an array of strings"),
                None => {}
            }
            match block.get("listType").and_then(Value::as_str) {
                Some("ordered" | "unordered") => {}
                _ if block.contains_key("listType") => errors.push(
                    format!("{path}/listType"),
                    "must be \"ordered\" or \"unordered\"",
                ),
                _ => {}
            }
        }
        BlockType::Quote => string_field("attribution", errors),
        BlockType::Embed => {
            uri_field("url", errors);
            string_field("embedType", errors);
            string_field("caption", errors);
        }
        BlockType::Text | BlockType::Divider => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    fn violations(document: Value) -> Vec<String> {
        match ArticleSchema.validate(&document) {
            Ok(()) => Vec::new(),
            Err(errors) => errors.iter().map(|v| v.path.clone()).collect(),
        }
    }

    fn single_block(block: Value) -> Value {
        json!({"article": {"title": "T", "blocks": [block]}})
    }

    #[test]
    fn test_valid_document() {
        let document = json!({
            "article": {
                "title": "Valid",
                "metadata": {"author": "Ada", "tags": ["a"]},
                "blocks": [
                    {"id": "t-1", "type": "text", "content": "hi"},
                    {"id": "h_1", "type": "heading", "level": 2, "content": "H"},
                    {"id": "i1", "type": "image", "url": "https://x.io/a.png", "alt": ""},
                    {"id": "c1", "type": "code", "language": "rust", "content": ""},
                    {"id": "l1", "type": "list", "items": ["a"], "listType": "ordered"},
                    {"id": "q1", "type": "quote", "content": "q", "attribution": "A"},
                    {"id": "e1", "type": "embed", "url": "https://youtu.be/x", "embedType": "youtube"},
                    {"id": "d1", "type": "divider"}
                ]
            }
        });
        assert_eq!(violations(document), Vec::<String>::new());
    }

    #[test]
    fn test_missing_article() {
        assert_eq!(violations(json!({"title": "T"})), vec!["/article"]);
    }

    #[test]
    fn test_article_level_violations_are_collected() {
        let document = json!({"article": {"title": "", "metadata": [], "blocks": {}}});
        assert_eq!(
            violations(document),
            vec!["/article/title", "/article/metadata", "/article/blocks"]
        );
    }

    #[rstest]
    #[case(json!({"id": "has space", "type": "text"}), "/article/blocks/0/id")]
    #[case(json!({"type": "text"}), "/article/blocks/0/id")]
    #[case(json!({"id": "a", "type": "video"}), "/article/blocks/0/type")]
    #[case(json!({"id": "a", "type": "text", "content": 5}), "/article/blocks/0/content")]
    #[case(json!({"id": "a", "type": "heading", "level": 7}), "/article/blocks/0/level")]
    #[case(json!({"id": "a", "type": "heading"}), "/article/blocks/0/level")]
    #[case(json!({"id": "a", "type": "image", "url": "has space", "alt": "x"}), "/article/blocks/0/url")]
    #[case(json!({"id": "a", "type": "code", "language": 1}), "/article/blocks/0/language")]
    #[case(json!({"id": "a", "type": "list", "items": [1], "listType": "ordered"}), "/article/blocks/0/items")]
    #[case(json!({"id": "a", "type": "list", "items": [], "listType": "numbered"}), "/article/blocks/0/listType")]
    #[case(json!({"id": "a", "type": "embed", "url": 3}), "/article/blocks/0/url")]
    fn test_block_violation(#[case] block: Value, #[case] expected_path: &str) {
        assert_eq!(violations(single_block(block)), vec![expected_path]);
    }

    #[test]
    fn test_duplicate_ids() {
        let document = json!({"article": {"title": "T", "blocks": [
            {"id": "a", "type": "text"},
            {"id": "a", "type": "divider"}
        ]}});
        assert_eq!(violations(document), vec!["/article/blocks/1/id"]);
    }

    #[rstest]
    #[case("https://example.com/a", true)]
    #[case("mailto:a@b.c", true)]
    #[case("//cdn.example.com/x.png", true)]
    #[case("/images/a.png", true)]
    #[case("images/a.png", true)]
    #[case("", false)]
    #[case("two words", false)]
    fn test_is_uri(#[case] value: &str, #[case] expected: bool) {
        assert_eq!(is_uri(value), expected);
    }
}
