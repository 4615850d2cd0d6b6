use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

use crate::error::BlockDocError;

/// The eight kinds of block a document can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockType {
    Text,
    Heading,
    Image,
    Code,
    List,
    Quote,
    Embed,
    Divider,
}

impl BlockType {
    pub const ALL: [BlockType; 8] = [
        BlockType::Text,
        BlockType::Heading,
        BlockType::Image,
        BlockType::Code,
        BlockType::List,
        BlockType::Quote,
        BlockType::Embed,
        BlockType::Divider,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            BlockType::Text => "text",
            BlockType::Heading => "heading",
            BlockType::Image => "image",
            BlockType::Code => "code",
            BlockType::List => "list",
            BlockType::Quote => "quote",
            BlockType::Embed => "embed",
            BlockType::Divider => "divider",
        }
    }

    /// Fields that must be present when a block of this type is constructed.
    pub fn required_fields(self) -> &'static [&'static str] {
        match self {
            BlockType::Heading => &["level"],
            BlockType::Image => &["url", "alt"],
            BlockType::Code => &["language"],
            BlockType::List => &["items", "listType"],
            BlockType::Text | BlockType::Quote | BlockType::Embed | BlockType::Divider => &[],
        }
    }

    /// Comma separated list of every type name, for error messages.
    pub fn allowed_list() -> String {
        Self::ALL
            .iter()
            .map(|kind| kind.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for BlockType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BlockType {
    type Err = BlockDocError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| BlockDocError::InvalidType {
                block_type: s.to_string(),
            })
    }
}

/// Ordering of a list block's items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListType {
    Ordered,
    #[default]
    Unordered,
}

impl ListType {
    pub fn as_str(self) -> &'static str {
        match self {
            ListType::Ordered => "ordered",
            ListType::Unordered => "unordered",
        }
    }
}

/// Plain-data form of a block, exactly as it appears on the wire.
///
/// Type-specific and caller-defined fields live side by side in `fields`
/// and are flattened next to `id`, `type` and `content` when serialized.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BlockData {
    #[serde(default, deserialize_with = "string_or_scalar")]
    pub id: String,
    #[serde(rename = "type", default, deserialize_with = "string_or_scalar")]
    pub block_type: String,
    #[serde(default, deserialize_with = "string_or_scalar")]
    pub content: String,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl BlockData {
    pub fn new(id: impl Into<String>, block_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            block_type: block_type.into(),
            ..Self::default()
        }
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// JSON object form: `id`, `type`, `content`, then the remaining fields in order.
    pub fn to_value(&self) -> Value {
        let mut object = Map::new();
        object.insert("id".to_string(), Value::String(self.id.clone()));
        object.insert("type".to_string(), Value::String(self.block_type.clone()));
        object.insert("content".to_string(), Value::String(self.content.clone()));
        for (name, value) in &self.fields {
            object.insert(name.clone(), value.clone());
        }
        Value::Object(object)
    }
}

/// Accept any JSON value where a string is expected: `null` reads as empty,
/// anything else as its JSON text.
///
/// A null id or type then fails in [`Block::new`] with the matching error
/// kind, and renderers see an unknown type instead of a parse failure.
pub(crate) fn string_or_scalar<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    })
}

/// Present required fields were checked by the caller; a missing one reads as null.
fn take_field(fields: &mut Map<String, Value>, name: &str) -> Value {
    fields.shift_remove(name).unwrap_or(Value::Null)
}

/// Typed payload of a block.
///
/// Field values are kept as JSON so that whatever the caller stored is
/// reproduced verbatim by [`Block::to_data`]; construction only checks that
/// required fields are present, and the renderers interpret the values.
#[derive(Debug, Clone, PartialEq)]
pub enum BlockKind {
    Text,
    Heading {
        level: Value,
    },
    Image {
        url: Value,
        alt: Value,
        caption: Option<Value>,
    },
    Code {
        language: Value,
    },
    List {
        items: Value,
        list_type: Value,
    },
    Quote {
        attribution: Option<Value>,
    },
    Embed {
        url: Option<Value>,
        embed_type: Option<Value>,
        caption: Option<Value>,
    },
    Divider,
}

impl BlockKind {
    /// Claim this type's known fields out of `fields`.
    ///
    /// Every required field must be present; an explicit empty string counts
    /// as present.
    fn take(block_type: BlockType, fields: &mut Map<String, Value>) -> Result<Self, BlockDocError> {
        for &field in block_type.required_fields() {
            if !fields.contains_key(field) {
                return Err(BlockDocError::MissingRequiredField { block_type, field });
            }
        }

        let kind = match block_type {
            BlockType::Text => BlockKind::Text,
            BlockType::Heading => BlockKind::Heading {
                level: take_field(fields, "level"),
            },
            BlockType::Image => BlockKind::Image {
                url: take_field(fields, "url"),
                alt: take_field(fields, "alt"),
                caption: fields.shift_remove("caption"),
            },
            BlockType::Code => BlockKind::Code {
                language: take_field(fields, "language"),
            },
            BlockType::List => BlockKind::List {
                items: take_field(fields, "items"),
                list_type: take_field(fields, "listType"),
            },
            BlockType::Quote => BlockKind::Quote {
                attribution: fields.shift_remove("attribution"),
            },
            BlockType::Embed => BlockKind::Embed {
                url: fields.shift_remove("url"),
                embed_type: fields.shift_remove("embedType"),
                caption: fields.shift_remove("caption"),
            },
            BlockType::Divider => BlockKind::Divider,
        };
        Ok(kind)
    }

    pub fn block_type(&self) -> BlockType {
        match self {
            BlockKind::Text => BlockType::Text,
            BlockKind::Heading { .. } => BlockType::Heading,
            BlockKind::Image { .. } => BlockType::Image,
            BlockKind::Code { .. } => BlockType::Code,
            BlockKind::List { .. } => BlockType::List,
            BlockKind::Quote { .. } => BlockType::Quote,
            BlockKind::Embed { .. } => BlockType::Embed,
            BlockKind::Divider => BlockType::Divider,
        }
    }

    /// Known fields in wire order; unset optional fields are skipped.
    pub fn fields(&self) -> Vec<(&'static str, &Value)> {
        let fields: Vec<(&'static str, Option<&Value>)> = match self {
            BlockKind::Text | BlockKind::Divider => Vec::new(),
            BlockKind::Heading { level } => vec![("level", Some(level))],
            BlockKind::Image { url, alt, caption } => vec![
                ("url", Some(url)),
                ("alt", Some(alt)),
                ("caption", caption.as_ref()),
            ],
            BlockKind::Code { language } => vec![("language", Some(language))],
            BlockKind::List { items, list_type } => {
                vec![("items", Some(items)), ("listType", Some(list_type))]
            }
            BlockKind::Quote { attribution } => vec![("attribution", attribution.as_ref())],
            BlockKind::Embed {
                url,
                embed_type,
                caption,
            } => vec![
                ("url", url.as_ref()),
                ("embedType", embed_type.as_ref()),
                ("caption", caption.as_ref()),
            ],
        };
        fields
            .into_iter()
            .filter_map(|(name, value)| value.map(|value| (name, value)))
            .collect()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields()
            .into_iter()
            .find(|(field, _)| *field == name)
            .map(|(_, value)| value)
    }

    /// Overwrite a known field. Hands the value back if this kind has no such field.
    fn set(&mut self, name: &str, value: Value) -> Result<(), Value> {
        let slot = match (self, name) {
            (BlockKind::Heading { level }, "level") => level,
            (BlockKind::Image { url, .. }, "url") => url,
            (BlockKind::Image { alt, .. }, "alt") => alt,
            (BlockKind::Image { caption, .. }, "caption") => caption.insert(Value::Null),
            (BlockKind::Code { language }, "language") => language,
            (BlockKind::List { items, .. }, "items") => items,
            (BlockKind::List { list_type, .. }, "listType") => list_type,
            (BlockKind::Quote { attribution }, "attribution") => attribution.insert(Value::Null),
            (BlockKind::Embed { url, .. }, "url") => url.insert(Value::Null),
            (BlockKind::Embed { embed_type, .. }, "embedType") => embed_type.insert(Value::Null),
            (BlockKind::Embed { caption, .. }, "caption") => caption.insert(Value::Null),
            _ => return Err(value),
        };
        *slot = value;
        Ok(())
    }
}

/// A validated, individually addressable unit of content.
///
/// A `Block` is a live value: once its data has been added to a
/// [`Document`](crate::Document), changing the block does not change the
/// stored copy.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    id: String,
    content: String,
    kind: BlockKind,
    extra: Map<String, Value>,
}

impl Block {
    /// Validate `data` and build a block from it.
    ///
    /// Type-specific fields are claimed first; whatever remains is kept as
    /// extra attributes and passed through untouched.
    pub fn new(data: BlockData) -> Result<Self, BlockDocError> {
        let BlockData {
            id,
            block_type,
            content,
            mut fields,
        } = data;

        if id.is_empty() {
            return Err(BlockDocError::MissingId);
        }
        let block_type: BlockType = block_type.parse()?;
        let kind = BlockKind::take(block_type, &mut fields)?;

        Ok(Self {
            id,
            content,
            kind,
            extra: fields,
        })
    }

    pub fn text(id: impl Into<String>, content: impl Into<String>) -> Result<Self, BlockDocError> {
        Self::new(BlockData::new(id, "text").with_content(content))
    }

    pub fn heading(
        id: impl Into<String>,
        level: u8,
        content: impl Into<String>,
    ) -> Result<Self, BlockDocError> {
        Self::new(
            BlockData::new(id, "heading")
                .with_content(content)
                .with_field("level", level),
        )
    }

    pub fn image(
        id: impl Into<String>,
        url: impl Into<String>,
        alt: impl Into<String>,
        caption: Option<&str>,
    ) -> Result<Self, BlockDocError> {
        let mut data = BlockData::new(id, "image")
            .with_field("url", Value::String(url.into()))
            .with_field("alt", Value::String(alt.into()));
        if let Some(caption) = caption {
            data = data.with_field("caption", caption);
        }
        Self::new(data)
    }

    pub fn code(
        id: impl Into<String>,
        content: impl Into<String>,
        language: impl Into<String>,
    ) -> Result<Self, BlockDocError> {
        Self::new(
            BlockData::new(id, "code")
                .with_content(content)
                .with_field("language", Value::String(language.into())),
        )
    }

    /// List block; `list_type` defaults to unordered.
    pub fn list<I, S>(
        id: impl Into<String>,
        items: I,
        list_type: Option<ListType>,
    ) -> Result<Self, BlockDocError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let items: Vec<Value> = items.into_iter().map(|item| Value::String(item.into())).collect();
        Self::new(
            BlockData::new(id, "list")
                .with_field("items", items)
                .with_field("listType", list_type.unwrap_or_default().as_str()),
        )
    }

    pub fn quote(
        id: impl Into<String>,
        content: impl Into<String>,
        attribution: Option<&str>,
    ) -> Result<Self, BlockDocError> {
        let mut data = BlockData::new(id, "quote").with_content(content);
        if let Some(attribution) = attribution {
            data = data.with_field("attribution", attribution);
        }
        Self::new(data)
    }

    pub fn embed(
        id: impl Into<String>,
        url: impl Into<String>,
        embed_type: Option<&str>,
    ) -> Result<Self, BlockDocError> {
        let mut data = BlockData::new(id, "embed").with_field("url", Value::String(url.into()));
        if let Some(embed_type) = embed_type {
            data = data.with_field("embedType", embed_type);
        }
        Self::new(data)
    }

    pub fn divider(id: impl Into<String>) -> Result<Self, BlockDocError> {
        Self::new(BlockData::new(id, "divider"))
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn block_type(&self) -> BlockType {
        self.kind.block_type()
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn kind(&self) -> &BlockKind {
        &self.kind
    }

    /// Caller-supplied attributes not known to this block type.
    pub fn extra(&self) -> &Map<String, Value> {
        &self.extra
    }

    /// Look up any attribute, known or extra.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.kind.get(name).or_else(|| self.extra.get(name))
    }

    /// Apply `partial` in place; `id` and `type` are ignored.
    ///
    /// No re-validation happens here, so a required field can be nulled out.
    /// [`Document::update_block`](crate::Document::update_block) is the
    /// validating path.
    pub fn update(&mut self, partial: Map<String, Value>) -> &mut Self {
        for (name, value) in partial {
            match name.as_str() {
                "id" | "type" => {}
                "content" => {
                    self.content = match value {
                        Value::String(s) => s,
                        Value::Null => String::new(),
                        other => other.to_string(),
                    }
                }
                _ => {
                    if let Err(value) = self.kind.set(&name, value) {
                        self.extra.insert(name, value);
                    }
                }
            }
        }
        self
    }

    /// Plain-data projection: `id`, `type`, `content`, then every other attribute.
    pub fn to_data(&self) -> BlockData {
        let mut fields = Map::new();
        for (name, value) in self.kind.fields() {
            fields.insert(name.to_string(), value.clone());
        }
        for (name, value) in &self.extra {
            if !fields.contains_key(name) {
                fields.insert(name.clone(), value.clone());
            }
        }
        BlockData {
            id: self.id.clone(),
            block_type: self.block_type().as_str().to_string(),
            content: self.content.clone(),
            fields,
        }
    }
}

impl TryFrom<BlockData> for Block {
    type Error = BlockDocError;

    fn try_from(data: BlockData) -> Result<Self, Self::Error> {
        Block::new(data)
    }
}

impl From<&Block> for BlockData {
    fn from(block: &Block) -> Self {
        block.to_data()
    }
}

/// A fresh id that satisfies the schema's id pattern.
pub fn generate_block_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::json;

    fn data(value: Value) -> BlockData {
        serde_json::from_value(value).unwrap()
    }

    // ============ Construction ============

    #[test]
    fn test_missing_id_fails() {
        let result = Block::new(data(json!({"type": "text", "content": "hi"})));
        assert!(matches!(result, Err(BlockDocError::MissingId)));

        let result = Block::new(data(json!({"id": "", "type": "text"})));
        assert!(matches!(result, Err(BlockDocError::MissingId)));
    }

    #[test]
    fn test_missing_or_unknown_type_fails() {
        let result = Block::new(data(json!({"id": "a"})));
        assert!(matches!(result, Err(BlockDocError::InvalidType { .. })));

        let err = Block::new(data(json!({"id": "a", "type": "video"}))).unwrap_err();
        assert!(err.to_string().contains("divider"));
    }

    #[rstest]
    #[case(json!({"id": "h", "type": "heading"}), "level")]
    #[case(json!({"id": "i", "type": "image", "alt": "x"}), "url")]
    #[case(json!({"id": "i", "type": "image", "url": "x"}), "alt")]
    #[case(json!({"id": "c", "type": "code"}), "language")]
    #[case(json!({"id": "l", "type": "list", "listType": "ordered"}), "items")]
    #[case(json!({"id": "l", "type": "list", "items": []}), "listType")]
    fn test_missing_required_field(#[case] input: Value, #[case] expected: &str) {
        match Block::new(data(input)) {
            Err(BlockDocError::MissingRequiredField { field, .. }) => assert_eq!(field, expected),
            other => panic!("expected missing {expected}, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_string_counts_as_present() {
        let block = Block::new(data(json!({"id": "c", "type": "code", "language": ""}))).unwrap();
        assert_eq!(block.get("language"), Some(&json!("")));
    }

    #[rstest]
    #[case("text")]
    #[case("quote")]
    #[case("embed")]
    #[case("divider")]
    fn test_types_without_required_fields(#[case] block_type: &str) {
        let block = Block::new(BlockData::new("x", block_type)).unwrap();
        assert_eq!(block.block_type().as_str(), block_type);
        assert_eq!(block.content(), "");
    }

    #[test]
    fn test_extra_fields_pass_through() {
        let block = Block::new(data(json!({
            "id": "a",
            "type": "text",
            "content": "hi",
            "className": "lead",
            "meta": {"x": 1}
        })))
        .unwrap();

        assert_eq!(block.get("className"), Some(&json!("lead")));
        assert_eq!(block.extra().len(), 2);
        assert_eq!(
            serde_json::to_value(block.to_data()).unwrap(),
            json!({"id": "a", "type": "text", "content": "hi", "className": "lead", "meta": {"x": 1}})
        );
    }

    #[test]
    fn test_optional_known_fields_are_claimed() {
        let block = Block::new(data(json!({
            "id": "e",
            "type": "embed",
            "url": "https://youtu.be/abc",
            "embedType": "youtube",
            "caption": "Watch"
        })))
        .unwrap();

        assert!(block.extra().is_empty());
        assert!(matches!(block.kind(), BlockKind::Embed { embed_type: Some(_), .. }));
    }

    #[test]
    fn test_loose_scalars_are_coerced() {
        let block = data(json!({"id": null, "type": 7, "content": null}));
        assert_eq!(block, BlockData::new("", "7"));

        let block = data(json!({"id": 12, "type": "text", "content": false}));
        assert_eq!(block.id, "12");
        assert_eq!(block.content, "false");
    }

    #[test]
    fn test_null_id_and_type_map_to_error_kinds() {
        let result = Block::new(data(json!({"id": null, "type": "text"})));
        assert!(matches!(result, Err(BlockDocError::MissingId)));

        let result = Block::new(data(json!({"id": "a", "type": null})));
        assert!(matches!(result, Err(BlockDocError::InvalidType { block_type }) if block_type.is_empty()));
    }

    // ============ Projection ============

    #[test]
    fn test_to_data_is_stable() {
        let block = Block::image("img", "https://x/cat.png", "Cat", Some("A cat")).unwrap();
        assert_eq!(block.to_data(), block.to_data());
    }

    #[test]
    fn test_to_data_round_trips_through_new() {
        let block = Block::new(data(json!({
            "id": "l",
            "type": "list",
            "items": ["a", "b"],
            "listType": "ordered",
            "extra": true
        })))
        .unwrap();

        let rebuilt = Block::new(block.to_data()).unwrap();
        assert_eq!(rebuilt.to_data(), block.to_data());
        assert_eq!(rebuilt, block);
    }

    #[test]
    fn test_to_data_wire_order() {
        let block = Block::heading("h", 2, "Title").unwrap();
        let json = serde_json::to_string(&block.to_data()).unwrap();
        assert_eq!(json, r#"{"id":"h","type":"heading","content":"Title","level":2}"#);
    }

    // ============ Update ============

    #[test]
    fn test_update_ignores_id_and_type() {
        let mut block = Block::text("a", "old").unwrap();
        let partial = json!({"id": "b", "type": "heading", "content": "new"});
        block.update(partial.as_object().unwrap().clone());

        assert_eq!(block.id(), "a");
        assert_eq!(block.block_type(), BlockType::Text);
        assert_eq!(block.content(), "new");
    }

    #[test]
    fn test_update_does_not_revalidate() {
        let mut block = Block::heading("h", 3, "Title").unwrap();
        block.update(json!({"level": null}).as_object().unwrap().clone());

        assert_eq!(block.get("level"), Some(&Value::Null));
    }

    #[test]
    fn test_update_sets_known_and_extra_fields() {
        let mut block = Block::quote("q", "words", None).unwrap();
        block.update(
            json!({"attribution": "Someone", "cite": "https://example.com"})
                .as_object()
                .unwrap()
                .clone(),
        );

        assert!(matches!(block.kind(), BlockKind::Quote { attribution: Some(a) } if a == "Someone"));
        assert_eq!(block.extra().get("cite"), Some(&json!("https://example.com")));
    }

    // ============ Factories ============

    #[test]
    fn test_list_factory_defaults_to_unordered() {
        let block = Block::list("l", ["a", "b"], None).unwrap();
        assert_eq!(block.get("listType"), Some(&json!("unordered")));
        assert_eq!(block.get("items"), Some(&json!(["a", "b"])));
    }

    #[test]
    fn test_factories_match_constructor() {
        let from_factory = Block::code("c", "fn main() {}", "rust").unwrap();
        let from_data = Block::new(
            BlockData::new("c", "code")
                .with_content("fn main() {}")
                .with_field("language", "rust"),
        )
        .unwrap();
        assert_eq!(from_factory, from_data);
    }

    #[test]
    fn test_factory_rejects_empty_id() {
        assert!(matches!(Block::divider(""), Err(BlockDocError::MissingId)));
    }

    #[test]
    fn test_generated_ids_are_unique_and_schema_safe() {
        let a = generate_block_id();
        let b = generate_block_id();
        assert_ne!(a, b);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric() || c == '-'));
    }
}
