use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

use crate::error::BlockDocError;
use crate::models::{Article, Block, BlockData};
use crate::render::{HtmlRenderer, MarkdownRenderer, Render};
use crate::schema::{ArticleSchema, SchemaValidator};

/// Owns one [`Article`] and every mutation of its block list.
///
/// Blocks are stored as plain [`BlockData`]. Every path that stores a block
/// (initial blocks, `add_block`, `insert_block`, `update_block`, loading)
/// runs full [`Block`] construction first, so a failed call leaves the
/// document untouched.
///
/// ```rust
/// # use blockdoc_engine::{Block, Document};
/// let mut doc = Document::new("Notes");
/// doc.add_block(Block::heading("intro", 2, "Intro").unwrap().to_data()).unwrap();
/// doc.add_block(Block::text("body", "Hello **world**").unwrap().to_data()).unwrap();
///
/// assert!(doc.render_to_markdown().starts_with("# Notes\n\n## Intro"));
/// let copy = blockdoc_engine::Document::from_json_str(&doc.to_string()).unwrap();
/// assert_eq!(copy, doc);
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Document {
    article: Article,
}

impl Document {
    /// An empty document with no metadata.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            article: Article::new(title),
        }
    }

    /// Build a document, adding `blocks` one by one through [`Document::add_block`].
    pub fn from_parts(
        title: impl Into<String>,
        metadata: Map<String, Value>,
        blocks: impl IntoIterator<Item = BlockData>,
    ) -> Result<Self, BlockDocError> {
        let mut document = Self::new(title);
        document.article.metadata = metadata;
        for block in blocks {
            document.add_block(block)?;
        }
        Ok(document)
    }

    /// Load from the wire format `{"article": {...}}`, re-validating every block.
    pub fn from_json_value(value: Value) -> Result<Self, BlockDocError> {
        let Value::Object(mut object) = value else {
            return Err(BlockDocError::MissingArticle);
        };
        let article = object.remove("article").ok_or(BlockDocError::MissingArticle)?;
        let Article {
            title,
            metadata,
            blocks,
        } = serde_json::from_value(article)?;
        Self::from_parts(title, metadata, blocks)
    }

    pub fn from_json_str(json: &str) -> Result<Self, BlockDocError> {
        let value: Value = serde_json::from_str(json)?;
        Self::from_json_value(value)
    }

    pub fn article(&self) -> &Article {
        &self.article
    }

    pub fn into_article(self) -> Article {
        self.article
    }

    pub fn title(&self) -> &str {
        &self.article.title
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.article.title = title.into();
    }

    pub fn metadata(&self) -> &Map<String, Value> {
        &self.article.metadata
    }

    pub fn metadata_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.article.metadata
    }

    pub fn blocks(&self) -> &[BlockData] {
        &self.article.blocks
    }

    pub fn len(&self) -> usize {
        self.article.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.article.blocks.is_empty()
    }

    pub fn position_of(&self, id: &str) -> Option<usize> {
        self.article.blocks.iter().position(|block| block.id == id)
    }

    /// Stored plain data for `id`.
    pub fn get_block(&self, id: &str) -> Option<&BlockData> {
        self.article.blocks.iter().find(|block| block.id == id)
    }

    /// Validate `data` and append it.
    ///
    /// The returned [`Block`] is independent of the stored copy.
    pub fn add_block(&mut self, data: BlockData) -> Result<Block, BlockDocError> {
        let block = self.prepare_new_block(data)?;
        self.article.blocks.push(block.to_data());
        log::debug!("Added block {:?} at {}", block.id(), self.len() - 1);
        Ok(block)
    }

    /// Validate `data` and insert it at `position`.
    ///
    /// Positions follow splice semantics: past the end appends, negative
    /// counts back from the end (saturating at the start). Unlike
    /// [`Document::move_block`] this never fails on position.
    pub fn insert_block(&mut self, data: BlockData, position: isize) -> Result<Block, BlockDocError> {
        let block = self.prepare_new_block(data)?;
        let index = splice_index(position, self.len());
        self.article.blocks.insert(index, block.to_data());
        log::debug!("Inserted block {:?} at {index}", block.id());
        Ok(block)
    }

    /// Shallow-merge `updates` over the stored block and re-validate the result.
    ///
    /// Unlike [`Block::update`] this can change `type` and `id`, and the merged
    /// data must satisfy the new type's required fields.
    pub fn update_block(
        &mut self,
        id: &str,
        updates: Map<String, Value>,
    ) -> Result<BlockData, BlockDocError> {
        let index = self
            .position_of(id)
            .ok_or_else(|| BlockDocError::BlockNotFound(id.to_string()))?;

        let mut merged = match self.article.blocks[index].to_value() {
            Value::Object(object) => object,
            _ => Map::new(),
        };
        merged.extend(updates);
        let merged: BlockData = serde_json::from_value(Value::Object(merged))?;

        if merged.id != id && self.get_block(&merged.id).is_some() {
            return Err(BlockDocError::DuplicateId(merged.id));
        }

        let data = Block::new(merged)?.to_data();
        self.article.blocks[index] = data.clone();
        log::debug!("Updated block {id:?}");
        Ok(data)
    }

    /// Remove the first block with `id`; `false` when there was none.
    pub fn remove_block(&mut self, id: &str) -> bool {
        match self.position_of(id) {
            Some(index) => {
                self.article.blocks.remove(index);
                log::debug!("Removed block {id:?}");
                true
            }
            None => false,
        }
    }

    /// Move a block to `new_position`, which must be an occupied index.
    ///
    /// Returns `Ok(false)` when `id` is unknown. Other blocks keep their
    /// relative order.
    pub fn move_block(&mut self, id: &str, new_position: isize) -> Result<bool, BlockDocError> {
        let Some(index) = self.position_of(id) else {
            return Ok(false);
        };

        let max = self.len() as isize - 1;
        if new_position < 0 || new_position > max {
            return Err(BlockDocError::InvalidPosition {
                position: new_position,
                max,
            });
        }

        let block = self.article.blocks.remove(index);
        self.article.blocks.insert(new_position as usize, block);
        log::debug!("Moved block {id:?} from {index} to {new_position}");
        Ok(true)
    }

    /// Check against the built-in [`ArticleSchema`].
    pub fn validate(&self) -> Result<(), BlockDocError> {
        self.validate_with(&ArticleSchema)
    }

    pub fn validate_with(&self, validator: &dyn SchemaValidator) -> Result<(), BlockDocError> {
        validator.validate(&self.to_json())?;
        Ok(())
    }

    /// Render with the default CommonMark converter and syntax highlighter.
    pub fn render_to_html(&self) -> String {
        self.render_with(&HtmlRenderer::default())
    }

    pub fn render_to_markdown(&self) -> String {
        self.render_with(&MarkdownRenderer)
    }

    pub fn render_with(&self, renderer: &dyn Render) -> String {
        renderer.render(&self.article)
    }

    /// Wire form: `{"article": {"title", "metadata", "blocks"}}`.
    pub fn to_json(&self) -> Value {
        let mut object = Map::new();
        object.insert("article".to_string(), self.article.to_value());
        Value::Object(object)
    }

    fn prepare_new_block(&self, data: BlockData) -> Result<Block, BlockDocError> {
        if self.get_block(&data.id).is_some() {
            return Err(BlockDocError::DuplicateId(data.id));
        }
        Block::new(data)
    }
}

/// Index for inserting into a list of `len` items, `Array.prototype.splice` style.
fn splice_index(position: isize, len: usize) -> usize {
    if position < 0 {
        len.saturating_sub(position.unsigned_abs())
    } else {
        (position as usize).min(len)
    }
}

/// Pretty-printed JSON of [`Document::to_json`].
impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = serde_json::to_string_pretty(&self.to_json()).map_err(|_| fmt::Error)?;
        f.write_str(&json)
    }
}

impl FromStr for Document {
    type Err = BlockDocError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_json_str(s)
    }
}
