//! Locating sections of a page.
//!
//! Two strategies coexist: CSS selectors for well-nested DOM ([`Page`] and
//! [`Fragment`]), and regexes applied to a fragment's serialized HTML for
//! flat `<td>` runs and prose ([`match_pattern`]).

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::sync::{LazyLock, OnceLock};
use thiserror::Error;

use crate::error::ScrapeError;
use crate::scraper::text::sanitize;

/// A CSS selector compiled on first use and kept for the life of the process.
pub struct Css {
    source: &'static str,
    compiled: OnceLock<Selector>,
}

impl Css {
    pub const fn new(source: &'static str) -> Self {
        Self {
            source,
            compiled: OnceLock::new(),
        }
    }

    pub fn selector(&self) -> &Selector {
        self.compiled
            .get_or_init(|| Selector::parse(self.source).expect("static selector is valid"))
    }

    pub fn source(&self) -> &'static str {
        self.source
    }
}

static TABLE_CONTAINER: Css = Css::new(".TableContainer");
static CAPTION: Css = Css::new(".Text");
static ROW: Css = Css::new("tr");

static CLASS_ATTR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"class\s*=\s*"([^"]*)""#).expect("class pattern is valid"));

/// An optional section was absent. Callers that require the section turn
/// this into [`ScrapeError::ParseShapeMismatch`] with [`SectionNotFound::required_by`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("section {section:?} not found")]
pub struct SectionNotFound {
    pub section: String,
}

impl SectionNotFound {
    fn new(section: impl Into<String>) -> Self {
        Self {
            section: section.into(),
        }
    }

    pub fn required_by(self, assembler: &'static str) -> ScrapeError {
        ScrapeError::shape(assembler, self.section)
    }
}

/// A parsed HTML document.
pub struct Page {
    document: Html,
}

impl Page {
    pub fn parse(html: &str) -> Self {
        Self {
            document: Html::parse_document(html),
        }
    }

    /// First element matching `css`.
    pub fn find_section(&self, css: &Css) -> Result<Fragment<'_>, SectionNotFound> {
        self.document
            .select(css.selector())
            .next()
            .map(Fragment::new)
            .ok_or_else(|| SectionNotFound::new(css.source()))
    }

    /// Every element matching `css`, in document order.
    pub fn find_all(&self, css: &Css) -> Vec<Fragment<'_>> {
        self.document.select(css.selector()).map(Fragment::new).collect()
    }

    /// The `.TableContainer` whose caption starts with `caption`.
    pub fn table_by_caption(&self, caption: &str) -> Result<Fragment<'_>, SectionNotFound> {
        self.tables()
            .into_iter()
            .find(|(text, _)| text.starts_with(caption))
            .map(|(_, table)| table)
            .ok_or_else(|| SectionNotFound::new(caption))
    }

    /// Every `.TableContainer` with its caption text.
    pub fn tables(&self) -> Vec<(String, Fragment<'_>)> {
        self.find_all(&TABLE_CONTAINER)
            .into_iter()
            .map(|container| {
                let caption = container
                    .find_section(&CAPTION)
                    .map(|c| c.text())
                    .unwrap_or_default();
                (caption, container)
            })
            .collect()
    }

    pub fn html(&self) -> String {
        self.document.root_element().html()
    }
}

/// One element of a [`Page`].
#[derive(Clone, Copy)]
pub struct Fragment<'a> {
    element: ElementRef<'a>,
}

impl<'a> Fragment<'a> {
    fn new(element: ElementRef<'a>) -> Self {
        Self { element }
    }

    pub fn find_section(&self, css: &Css) -> Result<Fragment<'a>, SectionNotFound> {
        self.element
            .select(css.selector())
            .next()
            .map(Fragment::new)
            .ok_or_else(|| SectionNotFound::new(css.source()))
    }

    pub fn find_all(&self, css: &Css) -> Vec<Fragment<'a>> {
        self.element.select(css.selector()).map(Fragment::new).collect()
    }

    pub fn inner_html(&self) -> String {
        self.element.inner_html()
    }

    /// Sanitized text content.
    pub fn text(&self) -> String {
        sanitize(&self.raw_text())
    }

    /// Text content exactly as the parser produced it.
    pub fn raw_text(&self) -> String {
        self.element.text().collect()
    }

    pub fn attr(&self, name: &str) -> Option<&'a str> {
        self.element.value().attr(name)
    }

    /// Direct `<td>` children.
    pub fn cells(&self) -> Vec<Fragment<'a>> {
        self.element
            .children()
            .filter_map(ElementRef::wrap)
            .filter(|child| child.value().name() == "td")
            .map(Fragment::new)
            .collect()
    }

    /// Every descendant row that has at least one `<td>`, as its cells.
    pub fn rows(&self) -> Vec<Vec<Fragment<'a>>> {
        self.find_all(&ROW)
            .into_iter()
            .map(|row| row.cells())
            .filter(|cells| !cells.is_empty())
            .collect()
    }

    /// `Label:` / value pairs of a two-column table, label without the colon.
    pub fn labelled_rows(&self) -> Vec<(String, Fragment<'a>)> {
        self.rows()
            .into_iter()
            .filter(|cells| cells.len() >= 2)
            .map(|cells| {
                let label = cells[0].text().trim_end_matches(':').to_string();
                (label, cells[1])
            })
            .collect()
    }
}

/// All non-overlapping matches of `pattern` in `text`, each as its capture
/// groups 1..n. Groups that did not participate are empty strings.
pub fn match_pattern(text: &str, pattern: &Regex) -> Vec<Vec<String>> {
    pattern
        .captures_iter(text)
        .map(|caps| {
            (1..caps.len())
                .map(|i| caps.get(i).map_or("", |m| m.as_str()).to_string())
                .collect()
        })
        .collect()
}

/// First match of `pattern` in `text`.
pub fn match_first(text: &str, pattern: &Regex) -> Option<Vec<String>> {
    pattern.captures(text).map(|caps| {
        (1..caps.len())
            .map(|i| caps.get(i).map_or("", |m| m.as_str()).to_string())
            .collect()
    })
}

/// How many `class="..."` attributes in `html` carry `token` as a whole class name.
pub fn count_class_token(html: &str, token: &str) -> usize {
    CLASS_ATTR
        .captures_iter(html)
        .filter(|caps| caps[1].split_whitespace().any(|class| class == token))
        .count()
}
