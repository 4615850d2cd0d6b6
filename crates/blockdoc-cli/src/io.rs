use blockdoc_engine::{BlockDocError, Document};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum IoError {
    #[error("File not found: {0}")]
    NotFound(PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid document {path}: {source}")]
    InvalidDocument {
        path: PathBuf,
        source: BlockDocError,
    },
}

/// Read and parse a document from its JSON wire format.
pub fn read_document(path: &Path) -> Result<Document, IoError> {
    if !path.exists() {
        return Err(IoError::NotFound(path.to_path_buf()));
    }
    let content = fs::read_to_string(path)?;
    Document::from_json_str(&content).map_err(|source| IoError::InvalidDocument {
        path: path.to_path_buf(),
        source,
    })
}

/// Write a document as pretty JSON with a trailing newline.
pub fn write_document(path: &Path, document: &Document) -> Result<(), IoError> {
    write_text(path, &format!("{document}\n"))
}

/// Write text, creating parent directories if they don't exist.
pub fn write_text(path: &Path, content: &str) -> Result<(), IoError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_then_read_document() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("docs").join("a.json");
        let document = Document::new("Saved");

        write_document(&path, &document).unwrap();
        let loaded = read_document(&path).unwrap();

        assert_eq!(loaded, document);
        assert!(fs::read_to_string(&path).unwrap().ends_with("}\n"));
    }

    #[test]
    fn test_read_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("missing.json");

        assert!(matches!(read_document(&path), Err(IoError::NotFound(p)) if p == path));
    }

    #[test]
    fn test_read_invalid_document() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("bad.json");
        fs::write(&path, r#"{"title": "no article"}"#).unwrap();

        assert!(matches!(
            read_document(&path),
            Err(IoError::InvalidDocument {
                source: BlockDocError::MissingArticle,
                ..
            })
        ));
    }
}
