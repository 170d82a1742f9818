//! BM25 relevance and curated keyword matching over an [`InvertedIndex`].

use crate::tokenizer::tokenize;
use crate::{DocId, InvertedIndex};
use std::collections::BTreeSet;

/// Term frequency saturation.
pub const K1: f64 = 1.2;
/// Length normalization strength.
pub const B: f64 = 0.75;

impl InvertedIndex {
    /// Occurrences of `term` in the document at `doc_id`, 0 when absent.
    pub fn term_frequency(&self, term: &str, doc_id: DocId) -> u32 {
        self.postings
            .get(term)
            .and_then(|plist| plist.iter().find(|p| p.doc_id == doc_id))
            .map_or(0, |p| p.frequency)
    }

    /// Smoothed inverse document frequency `ln((N - df + 0.5) / (df + 0.5))`.
    ///
    /// Exactly 0.0 for terms not in the index. Negative for terms that occur in
    /// more than half of the documents.
    pub fn idf(&self, term: &str) -> f64 {
        let Some(plist) = self.postings.get(term) else { return 0.0 };
        let n = f64::from(self.total_docs);
        let df = plist.len() as f64;
        ((n - df + 0.5) / (df + 0.5)).ln()
    }

    /// BM25 score of the document at `doc_id` for the given query terms.
    pub fn bm25<'a, I>(&self, terms: I, doc_id: DocId) -> f64
    where
        I: IntoIterator<Item = &'a String>,
    {
        let Some(doc) = self.document(doc_id) else { return 0.0 };
        let length_ratio = if self.avg_doc_length > 0.0 {
            f64::from(doc.length) / self.avg_doc_length
        } else {
            1.0
        };
        let norm = K1 * (1.0 - B + B * length_ratio);

        let mut score = 0.0;
        for term in terms {
            let tf = self.term_frequency(term, doc_id);
            if tf == 0 { continue; }
            let tf = f64::from(tf);
            score += self.idf(term) * (tf * (K1 + 1.0)) / (tf + norm);
        }
        score
    }

    /// Number of query terms found among the document's tokenized keywords.
    pub fn keyword_score<'a, I>(&self, terms: I, doc_id: DocId) -> f64
    where
        I: IntoIterator<Item = &'a String>,
    {
        let Some(doc) = self.document(doc_id) else { return 0.0 };
        let keywords: BTreeSet<String> = doc
            .metadata
            .keywords
            .iter()
            .flat_map(|k| tokenize(k))
            .collect();
        terms.into_iter().filter(|t| keywords.contains(*t)).count() as f64
    }
}

#[cfg(test)]
mod tests {
    use crate::{InvertedIndex, Metadata, SourceDocument};
    use std::collections::BTreeSet;

    fn doc(id: &str, content: &str, keywords: &[&str]) -> SourceDocument {
        SourceDocument {
            id: id.into(),
            content: content.into(),
            metadata: Metadata { keywords: keywords.iter().map(|k| k.to_string()).collect(), ..Default::default() },
        }
    }

    fn terms(words: &[&str]) -> BTreeSet<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    fn corpus() -> InvertedIndex {
        InvertedIndex::build(vec![
            doc("a", "flux retry interval", &["GitRepository", "retries"]),
            doc("b", "flux drift detection", &[]),
            doc("c", "flux suspend resume", &[]),
            doc("d", "kustomize patch", &[]),
        ])
        .unwrap()
    }

    #[test]
    fn unknown_term_has_zero_idf() {
        assert_eq!(corpus().idf("termnotinindex"), 0.0);
    }

    #[test]
    fn rarer_terms_have_higher_idf() {
        let index = corpus();
        // df(retry) = 1, df(flux) = 3
        assert!(index.idf("retry") > index.idf("flux"));
        assert!(index.idf("flux") < 0.0);
    }

    #[test]
    fn term_frequency_defaults_to_zero() {
        let index = corpus();
        assert_eq!(index.term_frequency("retry", 0), 1);
        assert_eq!(index.term_frequency("retry", 1), 0);
        assert_eq!(index.term_frequency("missing", 0), 0);
    }

    #[test]
    fn absent_terms_score_zero() {
        let index = corpus();
        for doc_id in 0..index.total_docs {
            assert_eq!(index.bm25(&terms(&["termabsenteverywhere"]), doc_id), 0.0);
        }
    }

    #[test]
    fn bm25_saturates() {
        let filler = "alpha beta gamma delta epsilon zeta eta theta iota kappa";
        let once = format!("retry {filler} {filler}");
        let many = format!("{}{filler} lambda", "retry ".repeat(10));
        let mut docs = vec![doc("once", &once, &[]), doc("many", &many, &[])];
        for i in 0..8 {
            docs.push(doc(&format!("other{i}"), filler, &[]));
        }
        let index = InvertedIndex::build(docs).unwrap();
        assert_eq!(index.documents[0].length, index.documents[1].length);

        let q = terms(&["retry"]);
        let s1 = index.bm25(&q, 0);
        let s10 = index.bm25(&q, 1);
        assert!(s1 > 0.0);
        assert!(s10 > s1);
        assert!(s10 < 10.0 * s1);
    }

    #[test]
    fn keyword_score_counts_tokenized_keyword_matches() {
        let index = corpus();
        // "GitRepository" splits into "git" and "repository"; "retries" stems to "retry"
        assert_eq!(index.keyword_score(&terms(&["git", "retry", "flux"]), 0), 2.0);
        assert_eq!(index.keyword_score(&terms(&["git"]), 1), 0.0);
    }
}
