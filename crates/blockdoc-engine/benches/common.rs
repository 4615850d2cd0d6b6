// Benchmark helper functions - Rust's dead code analysis doesn't understand
// that these are used by benchmark files in the same directory
// See: https://users.rust-lang.org/t/cargo-rustc-benches-awarnings/110111/2
use blockdoc_engine::{Block, Document, ListType};
use serde_json::{Map, json};

#[allow(dead_code)]
pub fn generate_document(sections: usize) -> Document {
    let mut metadata = Map::new();
    metadata.insert("author".to_string(), json!("Bench"));
    metadata.insert("publishedDate".to_string(), json!("2024-01-15"));
    metadata.insert("tags".to_string(), json!(["bench", "render"]));

    let mut doc = Document::new("Benchmark document");
    *doc.metadata_mut() = metadata;

    for section in 0..sections {
        let blocks = [
            Block::heading(format!("h-{section}"), 2, format!("Section {section}")),
            Block::text(
                format!("t-{section}"),
                "Paragraph with **bold**, *emphasis* and a [link](https://example.com).",
            ),
            Block::code(
                format!("c-{section}"),
                "fn example() {\n    let x = 42;\n    println!(\"{x}\");\n}",
                "rust",
            ),
            Block::list(
                format!("l-{section}"),
                ["First item", "Second item", "Third item"],
                Some(ListType::Unordered),
            ),
            Block::quote(format!("q-{section}"), "Quoted text", Some("Someone")),
            Block::embed(
                format!("e-{section}"),
                "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
                Some("youtube"),
            ),
        ];
        for block in blocks {
            let block = block.expect("bench block must be valid");
            doc.add_block(block.to_data())
                .expect("bench ids must be unique");
        }
    }

    doc
}
