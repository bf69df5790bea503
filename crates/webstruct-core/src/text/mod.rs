//! Plain-text processing: positioned word tokenization and joining.

pub mod join;
pub mod tokenizer;

pub use join::smart_join;
pub use tokenizer::{DefaultTokenizer, TextToken, TextTokenizer, WordSegments, WordTokenizer};
