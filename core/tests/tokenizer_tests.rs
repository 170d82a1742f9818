use fluxdocs_core::tokenizer::{tokenize, tokenize_with_counts};

#[test]
fn it_splits_camel_case_and_lowercases() {
    let words = tokenize("ImageUpdateAutomation pushes to GitRepository");
    assert!(words.contains("image"));
    assert!(words.contains("update"));
    assert!(words.contains("automation"));
    assert!(words.contains("push"));
    assert!(words.contains("git"));
    assert!(words.contains("repository"));
    assert!(!words.contains("gitrepository"));
}

#[test]
fn it_filters_stopwords_and_short_tokens() {
    let words = tokenize("The source and the target are a match to x");
    assert!(!words.contains("the"));
    assert!(!words.contains("and"));
    assert!(!words.contains("are"));
    assert!(!words.contains("a"));
    assert!(!words.contains("to"));
    assert!(!words.contains("x"));
    assert!(words.contains("source"));
    assert!(words.contains("match"));
}

#[test]
fn it_preserves_versions() {
    let words = tokenize("apiVersion: source.toolkit.fluxcd.io/v1beta2s v1");
    assert!(words.contains("v1beta2s"));
    assert!(words.contains("v1"));
    assert!(words.contains("api"));
    assert!(words.contains("version"));
}

#[test]
fn it_normalizes_compatibility_forms() {
    // full-width letters fold to ASCII
    let words = tokenize("ＨＥＬＭ charts");
    assert!(words.contains("helm"));
    assert!(words.contains("chart"));
}

#[test]
fn it_is_idempotent_on_normalized_text() {
    let text = "HelmReleases reconcile Kustomizations from OCIRepositories with SSH keys, v2beta1 drift-detection";
    let first = tokenize(text);
    let rejoined = first.iter().cloned().collect::<Vec<_>>().join(" ");
    assert_eq!(tokenize(&rejoined), first);
}

#[test]
fn it_only_stems_once() {
    // "classes" -> "class"; a second pass would strip the trailing s again
    let first = tokenize("classes");
    assert!(first.contains("class"));
    let second = tokenize(&first.into_iter().collect::<Vec<_>>().join(" "));
    assert!(second.contains("clas"));
}

#[test]
fn it_counts_every_retained_token() {
    let counts = tokenize_with_counts("retry Retry RETRIES interval the");
    assert_eq!(counts.get("retry"), Some(&3));
    assert_eq!(counts.get("interval"), Some(&1));
    assert_eq!(counts.len(), 2);
}
