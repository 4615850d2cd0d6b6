use anyhow::{Context, Result, bail};
use blockdoc_config::{Config, OutputFormat};
use blockdoc_engine::{
    BlockData, CommonMarkConverter, Document, HtmlRenderer, MarkdownExtensions, MarkdownRenderer,
    PlainHighlighter, Render, SyntaxHighlighter, generate_block_id,
};
use serde_json::Value;
use std::path::{Path, PathBuf};

use crate::io;

/// Where rendered output ended up.
#[derive(Debug, PartialEq)]
pub enum Rendered {
    Stdout(String),
    File(PathBuf),
}

/// Build the HTML renderer the config asks for.
pub fn html_renderer(config: &Config) -> HtmlRenderer {
    let options = config.markdown;
    let converter = CommonMarkConverter::new(MarkdownExtensions {
        tables: options.tables,
        strikethrough: options.strikethrough,
        footnotes: options.footnotes,
        tasklists: options.tasklists,
    });
    if config.highlight_code {
        HtmlRenderer::new(converter, SyntaxHighlighter::new())
    } else {
        HtmlRenderer::new(converter, PlainHighlighter)
    }
}

/// Read a document, validating it when `validate_on_load` is set.
pub fn load(path: &Path, config: &Config) -> Result<Document> {
    let document = io::read_document(path)?;
    if config.validate_on_load {
        document
            .validate()
            .with_context(|| format!("{} failed validation", path.display()))?;
    }
    Ok(document)
}

/// Render `path` to `format`.
///
/// Output goes to `output` if given, else into the configured output
/// directory, else back to the caller for stdout.
pub fn render(
    path: &Path,
    format: Option<OutputFormat>,
    output: Option<PathBuf>,
    config: &Config,
) -> Result<Rendered> {
    let document = load(path, config)?;
    let format = format.unwrap_or(config.default_format);
    let text = match format {
        OutputFormat::Html => document.render_with(&html_renderer(config)),
        OutputFormat::Markdown => document.render_with(&MarkdownRenderer),
    };

    let target = output.or_else(|| {
        let stem = path.file_stem()?;
        let dir = config.output_dir.as_ref()?;
        Some(dir.join(format!("{}.{}", stem.to_string_lossy(), format.extension())))
    });
    match target {
        Some(target) => {
            io::write_text(&target, &text)?;
            log::info!("Rendered {} to {}", path.display(), target.display());
            Ok(Rendered::File(target))
        }
        None => Ok(Rendered::Stdout(text)),
    }
}

/// Schema-check a document file.
pub fn validate(path: &Path) -> Result<()> {
    let document = io::read_document(path)?;
    document.validate()?;
    Ok(())
}

/// One `position<TAB>id<TAB>type` line per block.
pub fn list_blocks(path: &Path, config: &Config) -> Result<String> {
    let document = load(path, config)?;
    Ok(document
        .blocks()
        .iter()
        .enumerate()
        .map(|(position, block)| format!("{position}\t{}\t{}\n", block.id, block.block_type))
        .collect())
}

pub fn new_document(title: &str, output: &Path) -> Result<()> {
    if output.exists() {
        bail!("{} already exists", output.display());
    }
    io::write_document(output, &Document::new(title))?;
    Ok(())
}

/// Parameters of `blockdoc add`.
#[derive(Debug, Default)]
pub struct NewBlock {
    pub block_type: String,
    pub id: Option<String>,
    pub content: Option<String>,
    pub fields: Vec<(String, Value)>,
    pub position: Option<isize>,
}

/// Add a block to the document at `path` and write it back. Returns the block id.
pub fn add_block(path: &Path, block: NewBlock, config: &Config) -> Result<String> {
    let mut document = load(path, config)?;

    let mut data = BlockData::new(block.id.unwrap_or_else(generate_block_id), block.block_type);
    if let Some(content) = block.content {
        data = data.with_content(content);
    }
    for (name, value) in block.fields {
        data = data.with_field(name, value);
    }

    let added = match block.position {
        Some(position) => document.insert_block(data, position)?,
        None => document.add_block(data)?,
    };
    io::write_document(path, &document)?;
    Ok(added.id().to_string())
}

/// Parse `key=value`; the value is JSON if it parses as JSON, else a plain string.
pub fn parse_field(raw: &str) -> Result<(String, Value), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got {raw:?}"))?;
    if key.is_empty() {
        return Err(format!("empty field name in {raw:?}"));
    }
    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((key.to_string(), value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    fn new_doc(dir: &TempDir) -> PathBuf {
        let path = dir.path().join("doc.json");
        new_document("Test", &path).unwrap();
        path
    }

    fn block(block_type: &str, id: &str) -> NewBlock {
        NewBlock {
            block_type: block_type.to_string(),
            id: Some(id.to_string()),
            ..NewBlock::default()
        }
    }

    #[test]
    fn test_new_document_refuses_to_overwrite() {
        let temp_dir = TempDir::new().unwrap();
        let path = new_doc(&temp_dir);
        assert!(new_document("Again", &path).is_err());
    }

    #[test]
    fn test_add_and_list_blocks() {
        let temp_dir = TempDir::new().unwrap();
        let path = new_doc(&temp_dir);
        let config = Config::default();

        let heading = NewBlock {
            content: Some("Hello".to_string()),
            fields: vec![("level".to_string(), json!(2))],
            ..block("heading", "h")
        };
        add_block(&path, heading, &config).unwrap();
        add_block(&path, block("divider", "d"), &config).unwrap();
        let first = NewBlock {
            position: Some(0),
            ..block("text", "t")
        };
        add_block(&path, first, &config).unwrap();

        assert_eq!(
            list_blocks(&path, &config).unwrap(),
            "0\tt\ttext\n1\th\theading\n2\td\tdivider\n"
        );
    }

    #[test]
    fn test_add_generates_id() {
        let temp_dir = TempDir::new().unwrap();
        let path = new_doc(&temp_dir);

        let id = add_block(
            &path,
            NewBlock {
                block_type: "divider".to_string(),
                ..NewBlock::default()
            },
            &Config::default(),
        )
        .unwrap();

        assert!(!id.is_empty());
        validate(&path).unwrap();
    }

    #[test]
    fn test_add_invalid_block_leaves_file_untouched() {
        let temp_dir = TempDir::new().unwrap();
        let path = new_doc(&temp_dir);
        let before = fs::read_to_string(&path).unwrap();

        let result = add_block(&path, block("heading", "h"), &Config::default());

        assert!(result.is_err());
        assert_eq!(fs::read_to_string(&path).unwrap(), before);
    }

    #[test]
    fn test_render_to_stdout_and_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = new_doc(&temp_dir);
        let config = Config::default();
        let text = NewBlock {
            content: Some("hi".to_string()),
            ..block("text", "a")
        };
        add_block(&path, text, &config).unwrap();

        let markdown = render(&path, Some(OutputFormat::Markdown), None, &config).unwrap();
        assert_eq!(markdown, Rendered::Stdout("# Test\n\nhi\n".to_string()));

        let out = temp_dir.path().join("out.html");
        let rendered = render(&path, None, Some(out.clone()), &config).unwrap();
        assert_eq!(rendered, Rendered::File(out.clone()));
        assert!(fs::read_to_string(&out).unwrap().contains("<p>hi</p>"));
    }

    #[test]
    fn test_render_into_output_dir() {
        let temp_dir = TempDir::new().unwrap();
        let path = new_doc(&temp_dir);
        let config = Config {
            default_format: OutputFormat::Markdown,
            output_dir: Some(temp_dir.path().join("site")),
            ..Config::default()
        };

        let rendered = render(&path, None, None, &config).unwrap();

        let expected = temp_dir.path().join("site").join("doc.md");
        assert_eq!(rendered, Rendered::File(expected.clone()));
        assert_eq!(fs::read_to_string(expected).unwrap(), "# Test\n");
    }

    #[test]
    fn test_output_dir_keeps_dotted_stems_apart() {
        let temp_dir = TempDir::new().unwrap();
        let config = Config {
            default_format: OutputFormat::Markdown,
            output_dir: Some(temp_dir.path().join("site")),
            ..Config::default()
        };
        let v1 = temp_dir.path().join("notes.v1.json");
        let v2 = temp_dir.path().join("notes.v2.json");
        new_document("One", &v1).unwrap();
        new_document("Two", &v2).unwrap();

        let first = render(&v1, None, None, &config).unwrap();
        let second = render(&v2, None, None, &config).unwrap();

        let site = temp_dir.path().join("site");
        assert_eq!(first, Rendered::File(site.join("notes.v1.md")));
        assert_eq!(second, Rendered::File(site.join("notes.v2.md")));
        assert_eq!(fs::read_to_string(site.join("notes.v1.md")).unwrap(), "# One\n");
    }

    #[test]
    fn test_highlighting_can_be_disabled() {
        let temp_dir = TempDir::new().unwrap();
        let path = new_doc(&temp_dir);
        let config = Config {
            highlight_code: false,
            ..Config::default()
        };
        let code = NewBlock {
            content: Some("fn main() {}".to_string()),
            fields: vec![("language".to_string(), json!("rust"))],
            ..block("code", "c")
        };
        add_block(&path, code, &config).unwrap();

        let Rendered::Stdout(html) = render(&path, None, None, &config).unwrap() else {
            panic!("expected stdout output");
        };
        assert!(html.contains(r#"<code class="hljs language-rust">fn main() {}</code>"#));
    }

    #[test]
    fn test_validate_on_load() {
        let temp_dir = TempDir::new().unwrap();
        let path = new_doc(&temp_dir);
        add_block(&path, block("text", "bad id"), &Config::default()).unwrap();

        assert!(validate(&path).is_err());
        assert!(list_blocks(&path, &Config::default()).is_ok());
        let strict = Config {
            validate_on_load: true,
            ..Config::default()
        };
        assert!(list_blocks(&path, &strict).is_err());
    }

    #[test]
    fn test_parse_field() {
        assert_eq!(parse_field("level=2").unwrap(), ("level".to_string(), json!(2)));
        assert_eq!(
            parse_field("items=[\"a\",\"b\"]").unwrap(),
            ("items".to_string(), json!(["a", "b"]))
        );
        assert_eq!(
            parse_field("url=https://x.io/a=b").unwrap(),
            ("url".to_string(), json!("https://x.io/a=b"))
        );
        assert!(parse_field("novalue").is_err());
        assert!(parse_field("=1").is_err());
    }
}
