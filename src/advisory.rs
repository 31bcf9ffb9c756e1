//! Advisory parsing: turns an LLM-written advisory text into ordered
//! per-section search queries.
//!
//! The upstream model is asked to emit one line per slide section in the
//! form `[Section Title]: search query`. Everything else in its reply
//! (preamble, chatter, blank lines) is ignored.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// One section's image-search intent, extracted from the advisory text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionQuery {
    /// Heading title the query belongs to, as written between the brackets.
    pub section_title: String,
    /// Free-text search query for that section.
    pub query: String,
}

impl SectionQuery {
    pub fn new(section_title: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            section_title: section_title.into(),
            query: query.into(),
        }
    }
}

/// Extracts `[title]: query` pairs from an advisory text.
///
/// Titles and queries are trimmed of surrounding whitespace. A duplicated
/// title keeps its first position in the result but takes the query of its
/// last occurrence, so a model that revises itself mid-reply ends up with
/// the revised query. Text that never matches the pattern yields an empty
/// vector; the caller decides whether that is an error.
///
/// # Examples
///
/// ```
/// use slidesmith::advisory::extract_section_queries;
///
/// let advisory = "Here you go:\n[Intro]: sunrise over mountains\n[Summary]: handshake";
/// let queries = extract_section_queries(advisory);
/// assert_eq!(queries.len(), 2);
/// assert_eq!(queries[0].section_title, "Intro");
/// assert_eq!(queries[0].query, "sunrise over mountains");
/// ```
pub fn extract_section_queries(advisory_text: &str) -> Vec<SectionQuery> {
    static PATTERN: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\[(.+?)\]:\s*(.+)").unwrap());

    let mut queries: Vec<SectionQuery> = Vec::new();
    for caps in PATTERN.captures_iter(advisory_text) {
        let title = caps[1].trim();
        let query = caps[2].trim();
        match queries.iter_mut().find(|sq| sq.section_title == title) {
            Some(existing) => existing.query = query.to_owned(),
            None => queries.push(SectionQuery::new(title, query)),
        }
    }
    queries
}
