// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Text analysis applied before FTS5.
//!
//! FTS5's `porter unicode61` tokenizer already lowercases and stems, but
//! has no stopword filter, so stopword removal happens here, on both
//! document bodies and queries. Keeping the two paths symmetric is what
//! makes a stopword-laden query still match.

/// The standard English stopword set.
const STOPWORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "but", "by", "for", "if", "in", "into", "is",
    "it", "no", "not", "of", "on", "or", "such", "that", "the", "their", "then", "there",
    "these", "they", "this", "to", "was", "will", "with",
];

/// Lowercase, split on non-alphanumeric boundaries, and drop stopwords.
pub fn analyze(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|term| !term.is_empty())
        .map(|term| term.to_lowercase())
        .filter(|term| !STOPWORDS.contains(&term.as_str()))
        .collect()
}

/// The analyzed representation stored in the FTS-backed column.
pub fn analyzed_body(body: &str) -> String {
    analyze(body).join(" ")
}

/// Build an FTS5 phrase-prefix query from user input.
///
/// Returns `None` when analysis leaves no terms (empty input or all
/// stopwords); such a query matches nothing, mirroring an analyzer that
/// emits zero tokens.
pub fn phrase_prefix_query(query: &str) -> Option<String> {
    let terms = analyze(query);
    if terms.is_empty() {
        return None;
    }
    // Terms contain no quotes after analysis, so the phrase is safe to
    // embed verbatim.
    Some(format!("\"{}\" *", terms.join(" ")))
}
