pub mod article;
pub mod block;

pub use article::Article;
pub use block::{Block, BlockData, BlockKind, BlockType, ListType, generate_block_id};
