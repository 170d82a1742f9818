use crate::tokenizer::tokenize;
use crate::{DocId, Document, InvertedIndex};
use serde::{Deserialize, Serialize};
use std::collections::hash_map::Entry;
use std::collections::HashMap;

/// Multiplier applied to the keyword score before adding it to BM25.
///
/// Large enough that a single curated keyword match outweighs ordinary
/// differences in content term frequency.
// TODO: expose as a ranking parameter once scores are normalized across corpora.
pub const KEYWORD_WEIGHT: f64 = 5.0;

#[derive(Debug, Clone)]
pub struct SearchResult<'a> {
    pub document: &'a Document,
    pub score: f64,
    /// Query terms found in the document's content.
    pub matches: Vec<String>,
}

/// Owned, serializable view of a [`SearchResult`] for callers outside the core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub document_id: String,
    pub group: String,
    pub kind: String,
    pub url: String,
    pub score: f64,
    pub matched_terms: Vec<String>,
}

impl SearchResult<'_> {
    pub fn to_hit(&self) -> SearchHit {
        let meta = &self.document.metadata;
        SearchHit {
            document_id: self.document.id.clone(),
            group: meta.group.clone(),
            kind: meta.kind.clone(),
            url: meta.url.clone(),
            score: self.score,
            matched_terms: self.matches.clone(),
        }
    }
}

impl InvertedIndex {
    /// Rank documents for a free-text query.
    ///
    /// Only documents containing at least one query term in their content are
    /// candidates. A `limit` of 0 returns every candidate. Equal scores keep
    /// discovery order, so results are deterministic.
    pub fn search(&self, query: &str, limit: usize) -> Vec<SearchResult<'_>> {
        let terms = tokenize(query);
        if terms.is_empty() {
            tracing::debug!(query, "query has no searchable terms");
            return Vec::new();
        }

        let mut candidates: Vec<(DocId, Vec<String>)> = Vec::new();
        let mut slots: HashMap<DocId, usize> = HashMap::new();
        for term in &terms {
            let Some(plist) = self.postings.get(term) else { continue };
            for p in plist {
                let slot = match slots.entry(p.doc_id) {
                    Entry::Occupied(e) => *e.get(),
                    Entry::Vacant(e) => {
                        candidates.push((p.doc_id, Vec::new()));
                        *e.insert(candidates.len() - 1)
                    }
                };
                candidates[slot].1.push(term.clone());
            }
        }

        let mut results: Vec<SearchResult<'_>> = candidates
            .into_iter()
            .filter_map(|(doc_id, matches)| {
                let document = self.document(doc_id)?;
                let score = self.bm25(&terms, doc_id) + self.keyword_score(&terms, doc_id) * KEYWORD_WEIGHT;
                Some(SearchResult { document, score, matches })
            })
            .collect();
        let total_hits = results.len();

        results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        if limit > 0 {
            results.truncate(limit);
        }

        tracing::debug!(query, num_terms = terms.len(), total_hits, returned = results.len(), "search complete");
        results
    }
}
