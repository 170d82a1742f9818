use crate::tokenizer::tokenize_with_counts;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Position of a document in the index's document list.
pub type DocId = u32;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum IndexError {
    /// An index needs at least one document to be searchable.
    #[error("cannot build an index from an empty corpus")]
    EmptyCorpus,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    /// Stable external-facing category, e.g. `source-controller`.
    pub group: String,
    pub kind: String,
    pub url: String,
    /// Curated tags matched against queries by the keyword booster.
    #[serde(default)]
    pub keywords: Vec<String>,
}

/// A document as supplied to the index builder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceDocument {
    pub id: String,
    pub content: String,
    #[serde(default)]
    pub metadata: Metadata,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub content: String,
    /// Number of tokens retained by the tokenizer, not raw words.
    pub length: u32,
    pub metadata: Metadata,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Posting {
    pub doc_id: DocId,
    pub frequency: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvertedIndex {
    pub postings: HashMap<String, Vec<Posting>>,
    pub documents: Vec<Document>,
    pub total_docs: u32,
    pub avg_doc_length: f64,
}

impl InvertedIndex {
    /// Build an index over `documents`, keeping their order as document positions.
    pub fn build<I>(documents: I) -> Result<Self, IndexError>
    where
        I: IntoIterator<Item = SourceDocument>,
    {
        let mut postings: HashMap<String, Vec<Posting>> = HashMap::new();
        let mut docs: Vec<Document> = Vec::new();
        let mut total_length: u64 = 0;

        for source in documents {
            let doc_id = docs.len() as DocId;
            let counts = tokenize_with_counts(&source.content);
            let length: u32 = counts.values().sum();
            for (term, frequency) in counts {
                postings.entry(term).or_default().push(Posting { doc_id, frequency });
            }
            total_length += u64::from(length);
            docs.push(Document { id: source.id, content: source.content, length, metadata: source.metadata });
        }

        if docs.is_empty() {
            return Err(IndexError::EmptyCorpus);
        }

        let total_docs = docs.len() as u32;
        let avg_doc_length = total_length as f64 / f64::from(total_docs);
        tracing::info!(num_docs = total_docs, num_terms = postings.len(), avg_doc_length, "built inverted index");
        Ok(Self { postings, documents: docs, total_docs, avg_doc_length })
    }

    pub fn document(&self, doc_id: DocId) -> Option<&Document> {
        self.documents.get(doc_id as usize)
    }

    /// Look up a document by its external identifier.
    pub fn find(&self, id: &str) -> Option<&Document> {
        self.documents.iter().find(|d| d.id == id)
    }

    pub fn num_terms(&self) -> usize { self.postings.len() }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(id: &str, content: &str) -> SourceDocument {
        SourceDocument { id: id.into(), content: content.into(), metadata: Metadata::default() }
    }

    #[test]
    fn empty_corpus_is_an_error() {
        let err = InvertedIndex::build(Vec::new()).unwrap_err();
        assert_eq!(err, IndexError::EmptyCorpus);
    }

    #[test]
    fn records_lengths_and_average() {
        let index = InvertedIndex::build(vec![
            doc("a", "helm release drift"),
            doc("b", "the git source"),
        ])
        .unwrap();
        assert_eq!(index.total_docs, 2);
        assert_eq!(index.documents[0].length, 3);
        // "the" is a stop word
        assert_eq!(index.documents[1].length, 2);
        assert!((index.avg_doc_length - 2.5).abs() < 1e-9);
    }

    #[test]
    fn postings_point_at_valid_documents_and_sum_frequencies() {
        let index = InvertedIndex::build(vec![
            doc("a", "retry retry timeout"),
            doc("b", "retry interval"),
            doc("c", "suspend"),
        ])
        .unwrap();
        for plist in index.postings.values() {
            for p in plist {
                assert!((p.doc_id as usize) < index.documents.len());
            }
        }
        let retry: u32 = index.postings["retry"].iter().map(|p| p.frequency).sum();
        assert_eq!(retry, 3);
        assert_eq!(index.postings["retry"].len(), 2);
    }

    #[test]
    fn finds_documents_by_external_id() {
        let index = InvertedIndex::build(vec![doc("a", "alpha"), doc("b", "beta")]).unwrap();
        assert_eq!(index.find("b").map(|d| d.content.as_str()), Some("beta"));
        assert!(index.find("missing").is_none());
        assert_eq!(index.document(0).map(|d| d.id.as_str()), Some("a"));
    }
}
