use pulldown_cmark::{Options, Parser, html};

/// Converts a Markdown fragment to HTML.
///
/// The HTML renderer passes text, list item and quote content through this
/// unescaped, so the converter is the sanitization boundary for those blocks.
pub trait MarkdownConverter {
    fn to_html(&self, markdown: &str) -> String;
}

impl<F> MarkdownConverter for F
where
    F: Fn(&str) -> String,
{
    fn to_html(&self, markdown: &str) -> String {
        self(markdown)
    }
}

/// CommonMark extensions enabled on top of the core syntax.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkdownExtensions {
    pub tables: bool,
    pub strikethrough: bool,
    pub footnotes: bool,
    pub tasklists: bool,
}

impl Default for MarkdownExtensions {
    fn default() -> Self {
        Self {
            tables: true,
            strikethrough: true,
            footnotes: false,
            tasklists: false,
        }
    }
}

impl MarkdownExtensions {
    fn options(self) -> Options {
        let mut options = Options::empty();
        options.set(Options::ENABLE_TABLES, self.tables);
        options.set(Options::ENABLE_STRIKETHROUGH, self.strikethrough);
        options.set(Options::ENABLE_FOOTNOTES, self.footnotes);
        options.set(Options::ENABLE_TASKLISTS, self.tasklists);
        options
    }
}

/// `pulldown-cmark` backed converter.
#[derive(Debug, Clone, Copy, Default)]
pub struct CommonMarkConverter {
    extensions: MarkdownExtensions,
}

impl CommonMarkConverter {
    pub fn new(extensions: MarkdownExtensions) -> Self {
        Self { extensions }
    }
}

impl MarkdownConverter for CommonMarkConverter {
    fn to_html(&self, markdown: &str) -> String {
        let parser = Parser::new_ext(markdown, self.extensions.options());
        let mut output = String::new();
        html::push_html(&mut output, parser);
        output
    }
}
