//! Text normalization applied to every value lifted out of a page.
//!
//! All functions are total: they never fail and never allocate more than
//! one output string.

use regex::Regex;
use std::sync::LazyLock;

/// Runs of adjacent HTML tags, e.g. `</i></b>` or `<a href="...">`.
static TAG_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(</?[a-zA-Z][^<>]*/?>)+").expect("tag pattern is valid"));

/// Decode numeric and named HTML entities. Unknown entities are kept verbatim.
pub fn unescape_entities(s: &str) -> String {
    html_escape::decode_html_entities(s).into_owned()
}

/// Remove every newline so single-line patterns can span the fragment.
pub fn strip_linebreaks(s: &str) -> String {
    s.replace(['\n', '\r'], "")
}

/// Strip all tag markup, leaving inner text.
///
/// Matches are removed longest first. A short match (`<i>`) can be a
/// substring of a longer run (`</i><b><i>`); removing it first would break
/// the longer run apart and leave `</i><b>` behind.
pub fn remove_tags(s: &str) -> String {
    let mut runs: Vec<&str> = TAG_RUN.find_iter(s).map(|m| m.as_str()).collect();
    runs.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
    runs.dedup();

    let mut out = s.to_string();
    for run in runs {
        if !run.trim().is_empty() {
            out = out.replace(run, "");
        }
    }
    out
}

/// Replace double quotes with single quotes.
pub fn to_single_quotes(s: &str) -> String {
    s.replace('"', "'")
}

/// Replace U+00A0 with a plain space.
pub fn strip_nbsp(s: &str) -> String {
    s.replace('\u{a0}', " ")
}

/// Collapse any run of whitespace to a single space and trim the ends.
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// The normalization applied to table cell text: entities decoded,
/// non-breaking spaces flattened, whitespace collapsed.
pub fn sanitize(s: &str) -> String {
    collapse_whitespace(&strip_nbsp(&unescape_entities(s)))
}

/// Sanitized plain text of an HTML snippet. Source line breaks separate
/// words, so they become spaces here.
pub fn html_to_text(s: &str) -> String {
    sanitize(&remove_tags(&s.replace(['\n', '\r'], " ")))
}
