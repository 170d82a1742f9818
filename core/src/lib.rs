//! Lexical retrieval over a fixed corpus of Flux documentation.
//!
//! Documents are tokenized into an [`InvertedIndex`] once, then queried with
//! [`InvertedIndex::search`], which ranks candidates by BM25 plus a boost for
//! curated keyword matches.

pub mod index;
pub mod persist;
pub mod render;
pub mod scorer;
pub mod search;
pub mod tokenizer;

pub use index::{DocId, Document, IndexError, InvertedIndex, Metadata, Posting, SourceDocument};
pub use search::{SearchHit, SearchResult, KEYWORD_WEIGHT};
