//! Spell library parser.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

use crate::error::{Result, ScrapeError};
use crate::scraper::fragment::{match_pattern, Css, Page};
use crate::scraper::scalars::parse_integer;
use crate::scraper::text::{sanitize, strip_linebreaks, to_single_quotes};

const ASSEMBLER: &str = "spells";

/// Mana cost of spells whose cost depends on the caster
pub const VARIABLE_MANA: i32 = -1;

static TABLE: Css = Css::new(".TableContent");

static ROW: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r#"<td><a href="[^"]*spell=([a-z0-9]+)[^"]*">(?:<b>)?([^<]+)(?:</b>)?</a> \(([^<]+)\)</td>"#,
        r"<td>([^<]*)</td><td>([^<]*)</td><td>([0-9]+)</td><td>([0-9]+|var\.)</td>",
        r"<td>([0-9,]+|free)</td><td>(yes|no)</td>",
    ))
    .expect("spell row pattern is valid")
});

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SpellList {
    pub spells: Vec<Spell>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Spell {
    pub name: String,
    pub spell_id: String,
    pub formula: String,
    pub group: String,
    pub spell_type: String,
    pub level: u32,
    /// [`VARIABLE_MANA`] when the cost varies
    pub mana: i32,
    pub price: u32,
    pub premium_only: bool,
}

/// Parser for the spell library
pub struct SpellsParser;

impl SpellsParser {
    pub fn parse(html: &str) -> Result<SpellList> {
        let page = Page::parse(html);

        let table = page
            .find_all(&TABLE)
            .into_iter()
            .find(|table| table.raw_text().contains("Exp Lvl"))
            .ok_or_else(|| ScrapeError::shape(ASSEMBLER, "spell table"))?;

        let rows_html = strip_linebreaks(&table.inner_html()).replace("&amp;", "&");
        let spells = match_pattern(&rows_html, &ROW)
            .into_iter()
            .map(|caps| Spell {
                spell_id: caps[0].clone(),
                name: sanitize(&caps[1]),
                formula: to_single_quotes(&sanitize(&caps[2])),
                group: caps[3].clone(),
                spell_type: caps[4].clone(),
                level: parse_integer(&caps[5]) as u32,
                mana: if caps[6] == "var." {
                    VARIABLE_MANA
                } else {
                    parse_integer(&caps[6]) as i32
                },
                price: parse_integer(&caps[7]) as u32,
                premium_only: caps[8] == "yes",
            })
            .collect();

        Ok(SpellList { spells })
    }
}
