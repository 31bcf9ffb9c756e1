//! Outline splicing: inserts image references into a markdown outline
//! directly below the section headings they illustrate.
//!
//! The outline is treated as an opaque sequence of `\n`-separated lines.
//! Only one structural fact matters here: a line starting with `## ` is a
//! section heading. Everything else passes through byte for byte, so a
//! splice never reorders, rewrites, or drops caller content.

use std::borrow::Cow;

use rustc_hash::FxHashMap;

/// Marker a line must start with to count as a section heading.
pub const SECTION_HEADING_PREFIX: &str = "## ";

/// Returns the trimmed heading title if `line` is a section heading.
///
/// ```
/// use slidesmith::outline::heading_title;
///
/// assert_eq!(heading_title("## Market Trends "), Some("Market Trends"));
/// assert_eq!(heading_title("### Subsection"), None);
/// assert_eq!(heading_title("plain text"), None);
/// ```
pub fn heading_title(line: &str) -> Option<&str> {
    line.strip_prefix(SECTION_HEADING_PREFIX).map(str::trim)
}

/// Splices `![title](path)` lines into `outline` after each `## ` heading
/// whose trimmed title has an entry in `image_pair`.
///
/// Headings without an entry, and map entries without a matching heading,
/// are left alone. The output always has exactly `input lines + matched
/// headings` lines; with an empty map the outline comes back unchanged,
/// trailing newline included.
///
/// # Examples
///
/// ```
/// use rustc_hash::FxHashMap;
/// use slidesmith::outline::insert_images;
///
/// let mut image_pair = FxHashMap::default();
/// image_pair.insert("Intro".to_owned(), "images/x.jpeg".to_owned());
///
/// let spliced = insert_images("## Intro\nSome text\n## Summary\n", &image_pair);
/// assert_eq!(spliced, "## Intro\n![Intro](images/x.jpeg)\nSome text\n## Summary\n");
/// ```
pub fn insert_images(outline: &str, image_pair: &FxHashMap<String, String>) -> String {
    let mut lines: Vec<Cow<'_, str>> = Vec::new();
    for line in outline.split('\n') {
        lines.push(Cow::Borrowed(line));
        if let Some(title) = heading_title(line) {
            if let Some(path) = image_pair.get(title) {
                lines.push(Cow::Owned(format!("![{title}]({path})")));
            }
        }
    }
    lines.join("\n")
}
