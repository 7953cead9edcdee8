use crate::models::{DocumentChunk, ScoreKind, ScoredResult};
use std::collections::BTreeSet;

pub const UNKNOWN_SOURCE: &str = "Unknown";

/// Rewrites the `.txt` naming used by extracted text back to the published `.pdf`.
pub fn normalize_source(source: Option<&str>) -> String {
    match source {
        Some(source) => match source.strip_suffix(".txt") {
            Some(stem) => format!("{stem}.pdf"),
            None => source.to_string(),
        },
        None => UNKNOWN_SOURCE.to_string(),
    }
}

/// Unique normalized sources of the final result set.
///
/// Unmatched fallback samples contribute nothing.
pub fn extract_sources(results: &[ScoredResult], include_sources: bool) -> BTreeSet<String> {
    if !include_sources {
        return BTreeSet::new();
    }

    results
        .iter()
        .filter(|result| result.kind != ScoreKind::Fallback)
        .map(|result| normalize_source(result.document.source()))
        .collect()
}

/// Sorted, deduplicated sources present in `chunks`; documents without a
/// source are skipped.
pub fn distinct_sources<'a>(
    chunks: impl IntoIterator<Item = &'a DocumentChunk>,
) -> BTreeSet<String> {
    chunks
        .into_iter()
        .filter_map(DocumentChunk::source)
        .map(|source| normalize_source(Some(source)))
        .collect()
}
