//! Full-text search over workspace values: tokenization and an
//! incrementally-maintained inverted index.

#![warn(missing_docs)]

pub mod index;
pub mod tokenizer;

pub use index::InvertedIndex;
pub use tokenizer::{tokenize, tokenize_unique};
