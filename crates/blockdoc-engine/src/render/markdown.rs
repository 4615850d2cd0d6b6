use crate::models::{Article, BlockData, BlockType};
use crate::render::{Render, format_published_date, heading_level, is_ordered, list_items};
use crate::sanitize::value_text;

/// Renders articles to Markdown.
///
/// Content of text, heading and quote blocks is already Markdown and is
/// emitted unescaped.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownRenderer;

impl MarkdownRenderer {
    pub fn new() -> Self {
        Self
    }

    /// Render a single block without the trailing blank line.
    pub fn render_block(&self, block: &BlockData) -> String {
        let Ok(block_type) = block.block_type.parse::<BlockType>() else {
            log::warn!("Unknown block type {:?} in block {:?}", block.block_type, block.id);
            return format!("[Unknown block type: {}]", block.block_type);
        };

        match block_type {
            BlockType::Text => block.content.clone(),
            BlockType::Heading => {
                let level = heading_level(block.field("level"));
                format!("{} {}", "#".repeat(level as usize), block.content)
            }
            BlockType::Image => {
                let alt = value_text(block.field("alt"));
                let url = value_text(block.field("url"));
                let mut out = format!("![{alt}]({url})");
                push_caption(&mut out, block);
                out
            }
            BlockType::Code => {
                let language = value_text(block.field("language"));
                format!("```{language}\n{}\n```", block.content)
            }
            BlockType::List => render_list(block),
            BlockType::Quote => {
                let mut out = block
                    .content
                    .split('\n')
                    .map(|line| format!("> {line}"))
                    .collect::<Vec<_>>()
                    .join("\n");
                let attribution = value_text(block.field("attribution"));
                if !attribution.is_empty() {
                    out.push_str("\n>\n>  ");
                    out.push_str(&attribution);
                }
                out
            }
            BlockType::Embed => {
                let url = value_text(block.field("url"));
                let mut label = value_text(block.field("embedType"));
                if label.is_empty() {
                    label = "Embedded content".to_string();
                }
                let mut out = format!("[{label}: {url}]({url})");
                push_caption(&mut out, block);
                out
            }
            BlockType::Divider => "---".to_string(),
        }
    }
}

impl Render for MarkdownRenderer {
    fn render(&self, article: &Article) -> String {
        let mut lines = vec![format!("# {}", article.title), String::new()];

        let mut meta = Vec::new();
        if let Some(author) = article.author() {
            meta.push(format!("> Author: {author}"));
        }
        if let Some(published) = article.published_date() {
            meta.push(format!("> Published: {}", format_published_date(&published)));
        }
        let tags = article.tags();
        if !tags.is_empty() {
            meta.push(format!("> Tags: {}", tags.join(", ")));
        }
        if !meta.is_empty() {
            lines.extend(meta);
            lines.push(String::new());
        }

        for block in &article.blocks {
            lines.push(self.render_block(block));
            lines.push(String::new());
        }

        let mut out = lines.join("\n").trim_end().to_string();
        out.push('\n');
        out
    }
}

fn push_caption(out: &mut String, block: &BlockData) {
    let caption = value_text(block.field("caption"));
    if !caption.is_empty() {
        out.push_str("\n*");
        out.push_str(&caption);
        out.push('*');
    }
}

fn render_list(block: &BlockData) -> String {
    let Some(items) = list_items(block.field("items")) else {
        log::warn!("List block {:?} has no item array", block.id);
        return "[Invalid list items]".to_string();
    };

    let ordered = is_ordered(block.field("listType"));
    items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            if ordered {
                format!("{}. {item}", i + 1)
            } else {
                format!("- {item}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}
