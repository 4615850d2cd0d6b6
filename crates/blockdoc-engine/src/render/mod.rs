//! One-way render targets for articles.
//!
//! Both renderers are pure functions of an [`Article`]. Rendering never
//! fails on block content: an unknown block type or malformed list degrades
//! to a visible placeholder so the rest of the document still renders.

pub mod commonmark;
pub mod embed;
pub mod highlight;
pub mod html;
pub mod markdown;

pub use commonmark::{CommonMarkConverter, MarkdownConverter, MarkdownExtensions};
pub use embed::youtube_video_id;
pub use highlight::{HighlightError, Highlighter, PlainHighlighter, SyntaxHighlighter};
pub use html::HtmlRenderer;
pub use markdown::MarkdownRenderer;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::BlockDocError;
use crate::models::{Article, BlockData};

/// A render target for whole articles.
pub trait Render {
    fn render(&self, article: &Article) -> String;

    /// Render loosely-typed JSON, checking that it is shaped like an article first.
    fn render_value(&self, article: &Value) -> Result<String, BlockDocError> {
        let article = article_from_value(article)?;
        Ok(self.render(&article))
    }
}

/// Interpret `value` as an article, rejecting anything without a `blocks` array.
///
/// Everything below that is read leniently so one malformed block renders
/// as a placeholder instead of failing the whole article.
pub fn article_from_value(value: &Value) -> Result<Article, BlockDocError> {
    let Some(object) = value.as_object() else {
        return Err(BlockDocError::InvalidArticleStructure("article must be an object"));
    };
    let Some(Value::Array(blocks)) = object.get("blocks") else {
        return Err(BlockDocError::InvalidArticleStructure(
            "article.blocks must be an array",
        ));
    };

    let title = match object.get("title") {
        Some(Value::String(title)) => title.clone(),
        None | Some(Value::Null) => String::new(),
        Some(other) => other.to_string(),
    };
    let metadata = match object.get("metadata") {
        Some(Value::Object(metadata)) => metadata.clone(),
        _ => Map::new(),
    };
    let blocks = blocks
        .iter()
        .enumerate()
        .map(|(index, block)| {
            BlockData::deserialize(block).unwrap_or_else(|e| {
                log::warn!("Unreadable block at index {index}: {e}");
                BlockData::default()
            })
        })
        .collect();

    Ok(Article {
        title,
        metadata,
        blocks,
    })
}

/// Heading level clamped to 1..=6; absent, non-numeric or zero levels become 2.
pub fn heading_level(level: Option<&Value>) -> u8 {
    let parsed = match level {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match parsed.map(|v| (v + 0.5).floor()) {
        Some(rounded) if rounded.is_finite() && rounded != 0.0 => rounded.clamp(1.0, 6.0) as u8,
        _ => 2,
    }
}

/// List items as strings, or `None` when `items` is absent or not an array.
pub fn list_items(items: Option<&Value>) -> Option<Vec<String>> {
    items.and_then(Value::as_array).map(|items| {
        items
            .iter()
            .map(|item| match item {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect()
    })
}

/// `true` only for an explicit `"ordered"` list type.
pub fn is_ordered(list_type: Option<&Value>) -> bool {
    list_type.and_then(Value::as_str) == Some("ordered")
}

/// Human-readable long date (`January 15, 2024`); unparseable input is returned as-is.
pub fn format_published_date(raw: &str) -> String {
    let date = DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.date_naive())
        .or_else(|_| NaiveDate::parse_from_str(raw, "%Y-%m-%d"))
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S").map(|dt| dt.date()));

    match date {
        Ok(date) => date.format("%B %-d, %Y").to_string(),
        Err(_) => raw.to_string(),
    }
}
