//! On-disk index snapshots.
//!
//! Every save writes a fresh generation directory (`gen-00000001/` ...) holding
//! `postings.bin`, `docs.bin` and `meta.json`, then repoints `CURRENT` at it with
//! a rename. Readers resolve `CURRENT` first, so they never see files from two
//! different saves.

use crate::{Document, InvertedIndex, Posting};
use anyhow::{bail, Context, Result};
use bincode;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::{self, create_dir_all, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

/// Bumped whenever the on-disk layout changes.
pub const FORMAT_VERSION: u32 = 2;

const GENERATION_PREFIX: &str = "gen-";

#[derive(Debug, Serialize, Deserialize)]
pub struct MetaFile {
    pub num_docs: u32,
    pub num_terms: usize,
    pub avg_doc_length: f64,
    pub created_at: String,
    pub version: u32,
}

pub struct IndexPaths {
    pub root: PathBuf,
}

impl IndexPaths {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }
    fn current_file(&self) -> PathBuf { self.root.join("CURRENT") }
    fn generation(&self, n: u64) -> PathBuf { self.root.join(format!("{GENERATION_PREFIX}{n:08}")) }

    fn current_generation(&self) -> Result<Option<u64>> {
        let path = self.current_file();
        if !path.exists() {
            return Ok(None);
        }
        let name = fs::read_to_string(&path).with_context(|| format!("reading {}", path.display()))?;
        let n = name
            .trim()
            .strip_prefix(GENERATION_PREFIX)
            .and_then(|n| n.parse().ok())
            .with_context(|| format!("malformed {}: {:?}", path.display(), name.trim()))?;
        Ok(Some(n))
    }

    /// Directory of the snapshot `CURRENT` points at.
    pub fn current_dir(&self) -> Result<PathBuf> {
        match self.current_generation()? {
            Some(n) => Ok(self.generation(n)),
            None => bail!("no index snapshot at {}", self.root.display()),
        }
    }
}

fn write_bytes(path: &Path, bytes: &[u8]) -> Result<()> {
    let mut f = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    f.write_all(bytes)?;
    f.sync_all()?;
    Ok(())
}

fn read_bytes(path: &Path) -> Result<Vec<u8>> {
    let mut f = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let mut buf = Vec::new();
    f.read_to_end(&mut buf)?;
    Ok(buf)
}

pub fn save_postings(dir: &Path, postings: &HashMap<String, Vec<Posting>>) -> Result<()> {
    write_bytes(&dir.join("postings.bin"), &bincode::serialize(postings)?)
}

pub fn load_postings(dir: &Path) -> Result<HashMap<String, Vec<Posting>>> {
    let postings = bincode::deserialize(&read_bytes(&dir.join("postings.bin"))?)?;
    Ok(postings)
}

pub fn save_docs(dir: &Path, docs: &[Document]) -> Result<()> {
    write_bytes(&dir.join("docs.bin"), &bincode::serialize(docs)?)
}

pub fn load_docs(dir: &Path) -> Result<Vec<Document>> {
    let docs = bincode::deserialize(&read_bytes(&dir.join("docs.bin"))?)?;
    Ok(docs)
}

pub fn save_meta(dir: &Path, meta: &MetaFile) -> Result<()> {
    let json = serde_json::to_string_pretty(meta)?;
    write_bytes(&dir.join("meta.json"), json.as_bytes())
}

pub fn load_meta(dir: &Path) -> Result<MetaFile> {
    let path = dir.join("meta.json");
    let mut f = File::open(&path).with_context(|| format!("opening {}", path.display()))?;
    let mut buf = String::new();
    f.read_to_string(&mut buf)?;
    let meta: MetaFile = serde_json::from_str(&buf)?;
    Ok(meta)
}

/// Write a full snapshot of `index` under `paths.root` and make it current.
pub fn save_index(paths: &IndexPaths, index: &InvertedIndex, created_at: &str) -> Result<()> {
    create_dir_all(&paths.root)?;
    let generation = paths.current_generation()?.map_or(1, |n| n + 1);
    let dir = paths.generation(generation);
    // Leftover from a save that died before publishing.
    if dir.exists() {
        fs::remove_dir_all(&dir)?;
    }
    create_dir_all(&dir)?;

    save_postings(&dir, &index.postings)?;
    save_docs(&dir, &index.documents)?;
    let meta = MetaFile {
        num_docs: index.total_docs,
        num_terms: index.num_terms(),
        avg_doc_length: index.avg_doc_length,
        created_at: created_at.to_string(),
        version: FORMAT_VERSION,
    };
    save_meta(&dir, &meta)?;

    let pending = paths.root.join("CURRENT.tmp");
    write_bytes(&pending, format!("{GENERATION_PREFIX}{generation:08}\n").as_bytes())?;
    fs::rename(&pending, paths.current_file())?;
    prune_generations(paths, generation);

    tracing::info!(root = %paths.root.display(), generation, num_docs = meta.num_docs, num_terms = meta.num_terms, "saved index snapshot");
    Ok(())
}

/// Remove superseded generations. A reader still loading one fails and retries later.
fn prune_generations(paths: &IndexPaths, keep: u64) {
    let keep_name = format!("{GENERATION_PREFIX}{keep:08}");
    let Ok(entries) = fs::read_dir(&paths.root) else { return };
    for entry in entries.filter_map(|e| e.ok()) {
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if name.starts_with(GENERATION_PREFIX) && name != keep_name.as_str() && entry.path().is_dir() {
            if let Err(e) = fs::remove_dir_all(entry.path()) {
                tracing::warn!(path = %entry.path().display(), error = %e, "failed to prune old index generation");
            }
        }
    }
}

/// Load the current snapshot written by [`save_index`], checking it is consistent.
///
/// The average document length is taken from the manifest as stored.
pub fn load_index(paths: &IndexPaths) -> Result<InvertedIndex> {
    let dir = paths.current_dir()?;
    let meta = load_meta(&dir)?;
    if meta.version != FORMAT_VERSION {
        bail!("unsupported index format version {} (expected {FORMAT_VERSION})", meta.version);
    }
    let documents = load_docs(&dir)?;
    let postings = load_postings(&dir)?;

    if documents.is_empty() {
        bail!("index snapshot at {} contains no documents", dir.display());
    }
    if documents.len() != meta.num_docs as usize {
        bail!("manifest lists {} documents but docs.bin holds {}", meta.num_docs, documents.len());
    }
    if postings.len() != meta.num_terms {
        bail!("manifest lists {} terms but postings.bin holds {}", meta.num_terms, postings.len());
    }
    if let Some((term, p)) = postings
        .iter()
        .flat_map(|(term, plist)| plist.iter().map(move |p| (term, p)))
        .find(|(_, p)| p.doc_id as usize >= documents.len())
    {
        bail!("posting for term {term:?} references missing document {}", p.doc_id);
    }

    tracing::info!(dir = %dir.display(), num_docs = meta.num_docs, num_terms = postings.len(), "loaded index snapshot");
    Ok(InvertedIndex { postings, documents, total_docs: meta.num_docs, avg_doc_length: meta.avg_doc_length })
}
