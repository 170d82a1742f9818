use lazy_static::lazy_static;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;
use std::collections::{BTreeSet, HashMap, HashSet};

lazy_static! {
    static ref CAMEL: Regex = Regex::new(r"(\p{Ll})(\p{Lu})").expect("valid regex");
    static ref SPLIT: Regex = Regex::new(r"[^\p{L}\p{N}-]+").expect("valid regex");
    static ref STOPWORDS: HashSet<&'static str> = {
        let words: &[&str] = &[
            "a","about","after","all","also","an","and","any","are","as","at",
            "be","been","but","by","can","could","did","do","does","each",
            "for","from","had","has","have","he","her","his","how","if","in","into","is","it","its",
            "may","more","most","must","no","not","of","on","only","or","other","our","out",
            "she","should","so","some","such","than","that","the","their","them","then","there",
            "these","they","this","those","to","too","was","we","were","what","when",
            "where","which","while","who","will","with","would","you","your"
        ];
        words.iter().copied().collect()
    };
}

/// Exact plural forms of Flux and Kubernetes nouns. Checked before the generic
/// suffix rules so e.g. `helmrepositories` does not become `helmrepositorie`.
const IRREGULAR: &[(&str, &str)] = &[
    ("repositories", "repository"),
    ("kustomizations", "kustomization"),
    ("helmreleases", "helmrelease"),
    ("helmrepositories", "helmrepository"),
    ("helmcharts", "helmchart"),
    ("gitrepositories", "gitrepository"),
    ("ocirepositories", "ocirepository"),
    ("buckets", "bucket"),
    ("receivers", "receiver"),
    ("alerts", "alert"),
    ("providers", "provider"),
    ("imagerepositories", "imagerepository"),
    ("imagepolicies", "imagepolicy"),
    ("imageupdateautomations", "imageupdateautomation"),
    ("artifactgenerators", "artifactgenerator"),
    ("reconciliations", "reconciliation"),
    ("configurations", "configuration"),
    ("authentications", "authentication"),
    ("authorizations", "authorization"),
    ("specifications", "specification"),
    ("definitions", "definition"),
    ("deployments", "deployment"),
    ("namespaces", "namespace"),
    ("certificates", "certificate"),
    ("secrets", "secret"),
    ("configmaps", "configmap"),
];

/// Generic plural rules, most specific first. First match wins.
const SUFFIXES: &[(&str, &str)] = &[
    ("ies", "y"),
    ("sses", "ss"),
    ("ches", "ch"),
    ("shes", "sh"),
    ("xes", "x"),
    ("zes", "z"),
    ("ses", "se"),
    ("s", ""),
];

fn is_stopword(token: &str) -> bool { STOPWORDS.contains(token) }

/// A version identifier such as `v1`, `v2beta3` or `v1alpha1`.
pub fn is_version(token: &str) -> bool {
    let mut chars = token.chars();
    matches!((chars.next(), chars.next()), (Some('v'), Some(c)) if c.is_ascii_digit())
}

/// Reduce a lowercased word to its singular form. Single pass.
pub fn stem(word: &str) -> String {
    if let Some((_, singular)) = IRREGULAR.iter().find(|(plural, _)| *plural == word) {
        return (*singular).to_string();
    }
    for (suffix, replacement) in SUFFIXES {
        if let Some(root) = word.strip_suffix(suffix) {
            if root.is_empty() && replacement.is_empty() {
                break;
            }
            return format!("{root}{replacement}");
        }
    }
    word.to_string()
}

fn for_each_term(text: &str, mut emit: impl FnMut(String)) {
    let normalized = text.nfkc().collect::<String>();
    // Split camel case before lowercasing, otherwise the boundary is gone.
    let split = CAMEL.replace_all(&normalized, "$1 $2").to_lowercase();
    for word in SPLIT.split(&split) {
        let word = word.trim();
        if word.is_empty() { continue; }
        let version = is_version(word);
        if !version && word.chars().count() < 2 { continue; }
        if is_stopword(word) { continue; }
        if version {
            emit(word.to_string());
        } else {
            emit(stem(word));
        }
    }
}

/// Tokenize text into normalized terms with their occurrence counts.
///
/// Applies NFKC normalization, camel case splitting, lowercasing, stop word
/// removal and stemming. The sum of the counts is the number of retained tokens.
pub fn tokenize_with_counts(text: &str) -> HashMap<String, u32> {
    let mut counts = HashMap::new();
    for_each_term(text, |term| *counts.entry(term).or_insert(0) += 1);
    counts
}

/// Distinct normalized terms of `text`, in sorted order.
pub fn tokenize(text: &str) -> BTreeSet<String> {
    let mut terms = BTreeSet::new();
    for_each_term(text, |term| { terms.insert(term); });
    terms
}
