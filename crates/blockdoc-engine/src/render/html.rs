use serde_json::Value;

use crate::models::{Article, BlockData, BlockType};
use crate::render::commonmark::{CommonMarkConverter, MarkdownConverter};
use crate::render::embed::youtube_video_id;
use crate::render::highlight::{Highlighter, SyntaxHighlighter};
use crate::render::{Render, heading_level, is_ordered, list_items};
use crate::sanitize::{sanitize_html, sanitize_url, sanitize_value, value_text};

const YOUTUBE_ALLOW: &str =
    "accelerometer; autoplay; clipboard-write; encrypted-media; gyroscope; picture-in-picture";

/// Renders articles to HTML.
///
/// The Markdown converter and code highlighter are supplied explicitly so
/// callers (and tests) can swap either one out.
pub struct HtmlRenderer {
    converter: Box<dyn MarkdownConverter>,
    highlighter: Box<dyn Highlighter>,
}

impl Default for HtmlRenderer {
    fn default() -> Self {
        Self::new(CommonMarkConverter::default(), SyntaxHighlighter::new())
    }
}

impl HtmlRenderer {
    pub fn new(
        converter: impl MarkdownConverter + 'static,
        highlighter: impl Highlighter + 'static,
    ) -> Self {
        Self {
            converter: Box::new(converter),
            highlighter: Box::new(highlighter),
        }
    }

    /// Inner HTML for one block, without the `blockdoc-block` wrapper.
    pub fn render_block(&self, block: &BlockData) -> String {
        let Ok(block_type) = block.block_type.parse::<BlockType>() else {
            log::warn!("Unknown block type {:?} in block {:?}", block.block_type, block.id);
            return format!(
                "<p>Unknown block type: {}</p>",
                sanitize_html(&block.block_type)
            );
        };

        match block_type {
            BlockType::Text => self.converter.to_html(&block.content),
            BlockType::Heading => {
                let level = heading_level(block.field("level"));
                format!("<h{level}>{}</h{level}>", sanitize_html(&block.content))
            }
            BlockType::Image => {
                let src = sanitize_html(&sanitize_url(&value_text(block.field("url"))));
                let alt = sanitize_value(block.field("alt"));
                let img = format!(r#"<img src="{src}" alt="{alt}" class="blockdoc-image" />"#);
                with_caption(img, block.field("caption"))
            }
            BlockType::Code => self.render_code(block),
            BlockType::List => self.render_list(block),
            BlockType::Quote => {
                let mut out = String::from(r#"<blockquote class="blockdoc-quote">"#);
                out.push_str(&self.converter.to_html(&block.content));
                let attribution = sanitize_value(block.field("attribution"));
                if !attribution.is_empty() {
                    out.push_str(&format!("<cite>{attribution}</cite>"));
                }
                out.push_str("</blockquote>");
                out
            }
            BlockType::Embed => {
                let url = value_text(block.field("url"));
                let inner = match value_text(block.field("embedType")).as_str() {
                    "youtube" => youtube_embed(&url),
                    "twitter" => twitter_embed(&url),
                    _ => format!(
                        r#"<iframe src="{}" class="blockdoc-embed-frame" frameborder="0" allowfullscreen></iframe>"#,
                        sanitize_html(&sanitize_url(&url))
                    ),
                };
                with_caption(inner, block.field("caption"))
            }
            BlockType::Divider => r#"<hr class="blockdoc-divider" />"#.to_string(),
        }
    }

    fn render_code(&self, block: &BlockData) -> String {
        let language = value_text(block.field("language"));
        let highlighted = if !language.is_empty() && self.highlighter.is_known(&language) {
            self.highlighter.highlight(&block.content, &language)
        } else {
            self.highlighter.highlight_auto(&block.content)
        };
        let code = highlighted.unwrap_or_else(|e| {
            log::warn!("Highlighting failed for block {:?}: {e}", block.id);
            sanitize_html(&block.content)
        });

        let class = if language.is_empty() {
            "hljs".to_string()
        } else {
            format!("hljs language-{}", sanitize_html(&language))
        };
        format!(r#"<pre class="blockdoc-code"><code class="{class}">{code}</code></pre>"#)
    }

    fn render_list(&self, block: &BlockData) -> String {
        let Some(items) = list_items(block.field("items")) else {
            log::warn!("List block {:?} has no item array", block.id);
            return "<p>Invalid list items</p>".to_string();
        };

        let (tag, list_type) = if is_ordered(block.field("listType")) {
            ("ol", "ordered")
        } else {
            ("ul", "unordered")
        };
        let items: String = items
            .iter()
            .map(|item| format!("<li>{}</li>", self.converter.to_html(item).trim_end()))
            .collect();
        format!(r#"<{tag} class="blockdoc-list blockdoc-list-{list_type}">{items}</{tag}>"#)
    }
}

impl Render for HtmlRenderer {
    fn render(&self, article: &Article) -> String {
        let mut out = String::from("<article class=\"blockdoc-article\">\n");
        out.push_str(&format!(
            "<h1 class=\"blockdoc-title\">{}</h1>\n",
            sanitize_html(&article.title)
        ));

        for block in &article.blocks {
            let block_type = sanitize_html(&block.block_type);
            out.push_str(&format!(
                "<div class=\"blockdoc-block blockdoc-{block_type}\" data-block-id=\"{}\" data-block-type=\"{block_type}\">\n",
                sanitize_html(&block.id)
            ));
            out.push_str(self.render_block(block).trim_end_matches('\n'));
            out.push_str("\n</div>\n");
        }

        out.push_str("</article>\n");
        out
    }
}

fn with_caption(inner: String, caption: Option<&Value>) -> String {
    let caption = sanitize_value(caption);
    if caption.is_empty() {
        return inner;
    }
    format!(r#"<figure class="blockdoc-figure">{inner}<figcaption>{caption}</figcaption></figure>"#)
}

fn youtube_embed(url: &str) -> String {
    match youtube_video_id(url) {
        Some(id) => format!(
            r#"<div class="blockdoc-embed-responsive"><iframe src="https://www.youtube.com/embed/{}" title="YouTube video" frameborder="0" allow="{YOUTUBE_ALLOW}" allowfullscreen></iframe></div>"#,
            sanitize_html(&id)
        ),
        None => {
            log::warn!("Could not extract a YouTube video id from {url:?}");
            "<p>Invalid YouTube URL</p>".to_string()
        }
    }
}

fn twitter_embed(url: &str) -> String {
    let href = sanitize_html(&sanitize_url(url));
    format!(
        r#"<blockquote class="twitter-tweet"><a href="{href}">{href}</a></blockquote><script async src="https://platform.twitter.com/widgets.js" charset="utf-8"></script>"#
    )
}
