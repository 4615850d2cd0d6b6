use std::fmt;

use crate::models::BlockType;

/// Errors raised by block construction, document mutation, rendering and loading.
#[derive(Debug, thiserror::Error)]
pub enum BlockDocError {
    #[error("Block must have an id")]
    MissingId,

    #[error("Invalid block type {block_type:?}; expected one of: {}", BlockType::allowed_list())]
    InvalidType { block_type: String },

    #[error("{block_type} block requires field `{field}`")]
    MissingRequiredField {
        block_type: BlockType,
        field: &'static str,
    },

    #[error("Block with id {0:?} already exists")]
    DuplicateId(String),

    #[error("Block with id {0:?} not found")]
    BlockNotFound(String),

    #[error("Invalid position {position}; must be between 0 and {max}")]
    InvalidPosition { position: isize, max: isize },

    #[error("Invalid article structure: {0}")]
    InvalidArticleStructure(&'static str),

    #[error("Invalid document JSON: missing `article`")]
    MissingArticle,

    #[error("Document validation failed: {0}")]
    Validation(ValidationErrors),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// A single schema rule violation, located by a JSON-pointer style path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaViolation {
    pub path: String,
    pub message: String,
}

impl SchemaViolation {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for SchemaViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// The full list of violations produced by one validation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors(Vec<SchemaViolation>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.0.push(SchemaViolation::new(path, message));
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SchemaViolation> {
        self.0.iter()
    }

    /// `Ok(())` when no violation was recorded.
    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<String> = self.0.iter().map(ToString::to_string).collect();
        write!(f, "{}", messages.join("; "))
    }
}

impl From<ValidationErrors> for BlockDocError {
    fn from(errors: ValidationErrors) -> Self {
        BlockDocError::Validation(errors)
    }
}
