//! News article parser.

use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

use crate::error::{Result, ScrapeError};
use crate::scraper::fragment::{match_first, Css, Page};
use crate::scraper::scalars::parse_date;
use crate::scraper::text::{html_to_text, strip_linebreaks};

static HEADLINE_TEXT: Css = Css::new(".NewsHeadlineText");
static HEADLINE_DATE: Css = Css::new(".NewsHeadlineDate");
static HEADLINE_ICON: Css = Css::new(".NewsHeadlineIcon");
static CONTENT: Css = Css::new(".NewsTableContainer");

static ICON_CATEGORY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"newsicon_([a-z]+)_(?:big|small)").expect("news icon pattern is valid")
});
static LINE_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<br\s*/?>|</p>").expect("line break pattern is valid"));

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct NewsArticle {
    pub id: u32,
    pub date: Option<NaiveDate>,
    pub title: String,
    pub category: String,
    pub news_type: String,
    pub url: String,
    pub content: String,
    pub content_html: String,
}

/// Parser for news archive articles
pub struct NewsParser;

impl NewsParser {
    /// `url` is the page the article was fetched from; the page does not link to itself.
    pub fn parse(html: &str, id: u32, url: &str) -> Result<NewsArticle> {
        let page = Page::parse(html);

        let title = page
            .find_section(&HEADLINE_TEXT)
            .map(|headline| headline.text())
            .unwrap_or_default();
        if title.is_empty() {
            return Err(ScrapeError::NotFound(format!("news article {}", id)));
        }

        // "Jan 10 2022 - "
        let date = page
            .find_section(&HEADLINE_DATE)
            .ok()
            .and_then(|d| parse_date(d.text().trim_end_matches('-').trim()).ok());

        let category = page
            .find_section(&HEADLINE_ICON)
            .ok()
            .and_then(|icon| icon.attr("src"))
            .and_then(|src| match_first(src, &ICON_CATEGORY))
            .map(|caps| caps[0].clone())
            .unwrap_or_default();

        let news_type = match title.as_str() {
            "News Ticker" => "ticker",
            "Featured Article" => "article",
            _ => "news",
        };

        let content_html = page
            .find_section(&CONTENT)
            .map(|content| strip_linebreaks(&content.inner_html()).trim().to_string())
            .unwrap_or_default();
        let content = LINE_BREAK
            .split(&content_html)
            .map(html_to_text)
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join("\n");

        Ok(NewsArticle {
            id,
            date,
            title,
            category,
            news_type: news_type.to_string(),
            url: url.to_string(),
            content,
            content_html,
        })
    }
}
