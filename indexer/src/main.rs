use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use fluxdocs_core::persist::{load_index, save_index, IndexPaths};
use fluxdocs_core::{render, InvertedIndex, Metadata, SourceDocument};
use serde::Deserialize;
use tracing_subscriber::{EnvFilter, fmt};
use walkdir::WalkDir;

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize)]
struct InputDoc {
    id: String,
    #[serde(alias = "body")]
    content: String,
    #[serde(default)]
    group: String,
    #[serde(default)]
    kind: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    keywords: Vec<String>,
}

impl From<InputDoc> for SourceDocument {
    fn from(doc: InputDoc) -> Self {
        SourceDocument {
            id: doc.id,
            content: doc.content,
            metadata: Metadata { group: doc.group, kind: doc.kind, url: doc.url, keywords: doc.keywords },
        }
    }
}

#[derive(Parser)]
#[command(name = "fluxdocs-indexer")]
#[command(about = "Build and query BM25 indexes of Flux documentation", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the index from input JSON/JSONL files or a directory
    Build {
        /// Input path (file or directory)
        #[arg(long)]
        input: String,
        /// Output index directory
        #[arg(long)]
        output: String,
    },
    /// Run a query against a built index and print the results as markdown
    Query {
        /// Index directory
        #[arg(long, default_value = "./index")]
        index: String,
        /// Free-text query
        #[arg(long)]
        query: String,
        /// Maximum number of results, 0 for all
        #[arg(long, default_value_t = 5)]
        limit: usize,
    },
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Build { input, output } => build_index(&input, &output),
        Commands::Query { index, query, limit } => {
            let index = load_index(&IndexPaths::new(&index))?;
            println!("{}", render::markdown(&index.search(&query, limit)));
            Ok(())
        }
    }
}

fn build_index(input: &str, output: &str) -> Result<()> {
    let files = collect_input_files(Path::new(input))?;
    if files.is_empty() {
        bail!("no .json or .jsonl files found at {input}");
    }

    let mut docs: Vec<SourceDocument> = Vec::new();
    for file in &files {
        let before = docs.len();
        if file.extension().and_then(|s| s.to_str()) == Some("jsonl") {
            read_jsonl(file, &mut docs)?;
        } else {
            read_json(file, &mut docs)?;
        }
        tracing::debug!(file = %file.display(), docs = docs.len() - before, "read input file");
    }
    tracing::info!(num_files = files.len(), num_docs = docs.len(), "ingested documents");

    let index = InvertedIndex::build(docs)?;
    let created_at = time::OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_default();
    save_index(&IndexPaths::new(output), &index, &created_at)?;

    tracing::info!(output, "index build complete");
    Ok(())
}

/// Input files in sorted path order, so document positions are reproducible.
fn collect_input_files(input_path: &Path) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = Vec::new();
    if input_path.is_dir() {
        for entry in WalkDir::new(input_path).sort_by_file_name().into_iter().filter_map(|e| e.ok()) {
            let p = entry.path();
            if p.is_file() {
                if let Some(ext) = p.extension().and_then(|s| s.to_str()) {
                    if matches!(ext, "json" | "jsonl") {
                        files.push(p.to_path_buf());
                    }
                }
            }
        }
    } else if input_path.is_file() {
        files.push(input_path.to_path_buf());
    } else {
        bail!("input path {} does not exist", input_path.display());
    }
    Ok(files)
}

fn read_jsonl(file: &Path, docs: &mut Vec<SourceDocument>) -> Result<()> {
    let f = File::open(file).with_context(|| format!("opening {}", file.display()))?;
    let reader = BufReader::new(f);
    for (lineno, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() { continue; }
        let doc: InputDoc = serde_json::from_str(&line)
            .with_context(|| format!("{}:{}", file.display(), lineno + 1))?;
        docs.push(doc.into());
    }
    Ok(())
}

fn read_json(file: &Path, docs: &mut Vec<SourceDocument>) -> Result<()> {
    let f = File::open(file).with_context(|| format!("opening {}", file.display()))?;
    let reader = BufReader::new(f);
    let json: serde_json::Value = serde_json::from_reader(reader)
        .with_context(|| format!("parsing {}", file.display()))?;
    match json {
        serde_json::Value::Array(arr) => {
            for v in arr {
                let doc: InputDoc = serde_json::from_value(v)?;
                docs.push(doc.into());
            }
        }
        serde_json::Value::Object(_) => {
            let doc: InputDoc = serde_json::from_value(json)?;
            docs.push(doc.into());
        }
        _ => tracing::warn!(file = %file.display(), "skipping JSON file that is neither an object nor an array"),
    }
    Ok(())
}
