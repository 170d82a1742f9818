//! Markdown rendering of ranked results for chat and terminal callers.

use crate::SearchResult;
use std::fmt::{self, Write};

pub const NO_RESULTS: &str = "No matching documents found.";

/// Render results as markdown sections separated by horizontal rules.
pub fn markdown(results: &[SearchResult<'_>]) -> String {
    let mut out = String::new();
    write_markdown(&mut out, results).expect("writing to a String never fails");
    out
}

/// Stream the markdown rendering of `results` into `out`.
pub fn write_markdown<W: Write>(out: &mut W, results: &[SearchResult<'_>]) -> fmt::Result {
    if results.is_empty() {
        return out.write_str(NO_RESULTS);
    }
    for (i, r) in results.iter().enumerate() {
        if i > 0 {
            out.write_str("\n---\n\n")?;
        }
        write_section(out, r)?;
    }
    Ok(())
}

fn write_section<W: Write>(out: &mut W, r: &SearchResult<'_>) -> fmt::Result {
    let doc = r.document;
    let meta = &doc.metadata;
    writeln!(out, "## {}\n", doc.id)?;
    if !meta.group.is_empty() || !meta.kind.is_empty() {
        writeln!(out, "**{}** / {}\n", meta.group, meta.kind)?;
    }
    if !meta.url.is_empty() {
        writeln!(out, "Source: {}", meta.url)?;
    }
    writeln!(out, "Score: {:.2}", r.score)?;
    if !r.matches.is_empty() {
        writeln!(out, "Matched: {}", r.matches.join(", "))?;
    }
    writeln!(out, "\n{}", doc.content.trim_end())
}
