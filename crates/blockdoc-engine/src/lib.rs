pub mod document;
pub mod error;
pub mod models;
pub mod render;
pub mod sanitize;
pub mod schema;

// Re-export key types for easier usage
pub use document::Document;
pub use error::{BlockDocError, SchemaViolation, ValidationErrors};
pub use models::*;
pub use render::{
    CommonMarkConverter, HighlightError, Highlighter, HtmlRenderer, MarkdownConverter,
    MarkdownExtensions, MarkdownRenderer, PlainHighlighter, Render, SyntaxHighlighter,
};
pub use schema::{ArticleSchema, SchemaValidator};
