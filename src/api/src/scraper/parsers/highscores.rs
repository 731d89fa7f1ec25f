//! Highscores parser for tibia.com.
//!
//! Rows are flat `<td>` runs, so they are matched with a regex over the
//! table's serialized HTML rather than walked as DOM.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::LazyLock;

use crate::error::{Result, ScrapeError};
use crate::scraper::fragment::{count_class_token, match_first, match_pattern, Css, Page};
use crate::scraper::scalars::parse_integer;
use crate::scraper::text::{sanitize, strip_linebreaks};

const ASSEMBLER: &str = "highscores";

/// Tibia.com serves at most 1000 entries, 50 per page.
pub const MAX_PAGE: u32 = 20;

static TABLES: Css = Css::new("table.TableContent");
static PAGE_NAVIGATION: Css = Css::new(".PageNavigation");

/// rank, name, title (loyalty only), vocation, world, level, value
static ROW: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"<td>([0-9]+)</td>\s*",
        r"<td><a[^>]*>([^<]+)</a></td>\s*",
        r"(?:<td>([^<]*)</td>\s*)?",
        r"<td>([^<]*)</td>\s*",
        r"<td>([^<]*)</td>\s*",
        r"<td[^>]*>([0-9,]+)</td>\s*",
        r"<td[^>]*>([0-9,]+)</td>",
    ))
    .expect("highscore row pattern is valid")
});
static LAST_UPDATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Last Update: ([0-9]+) minutes? ago").expect("last update pattern is valid"));
static RESULTS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Results: ([0-9,]+)").expect("results pattern is valid"));

/// Highscore categories with their tibia.com ids
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HighscoreCategory {
    Achievements,
    AxeFighting,
    BossPoints,
    CharmPoints,
    ClubFighting,
    DistanceFighting,
    DromeScore,
    Experience,
    Fishing,
    FistFighting,
    GoshnarsTaint,
    LoyaltyPoints,
    MagicLevel,
    Shielding,
    SwordFighting,
}

impl HighscoreCategory {
    pub fn id(&self) -> u8 {
        match self {
            HighscoreCategory::Achievements => 1,
            HighscoreCategory::AxeFighting => 2,
            HighscoreCategory::CharmPoints => 3,
            HighscoreCategory::ClubFighting => 4,
            HighscoreCategory::DistanceFighting => 5,
            HighscoreCategory::Experience => 6,
            HighscoreCategory::Fishing => 7,
            HighscoreCategory::FistFighting => 8,
            HighscoreCategory::GoshnarsTaint => 9,
            HighscoreCategory::LoyaltyPoints => 10,
            HighscoreCategory::MagicLevel => 11,
            HighscoreCategory::Shielding => 12,
            HighscoreCategory::SwordFighting => 13,
            HighscoreCategory::DromeScore => 14,
            HighscoreCategory::BossPoints => 15,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HighscoreCategory::Achievements => "achievements",
            HighscoreCategory::AxeFighting => "axefighting",
            HighscoreCategory::BossPoints => "bosspoints",
            HighscoreCategory::CharmPoints => "charmpoints",
            HighscoreCategory::ClubFighting => "clubfighting",
            HighscoreCategory::DistanceFighting => "distancefighting",
            HighscoreCategory::DromeScore => "dromescore",
            HighscoreCategory::Experience => "experience",
            HighscoreCategory::Fishing => "fishing",
            HighscoreCategory::FistFighting => "fistfighting",
            HighscoreCategory::GoshnarsTaint => "goshnarstaint",
            HighscoreCategory::LoyaltyPoints => "loyaltypoints",
            HighscoreCategory::MagicLevel => "magiclevel",
            HighscoreCategory::Shielding => "shielding",
            HighscoreCategory::SwordFighting => "swordfighting",
        }
    }
}

impl FromStr for HighscoreCategory {
    type Err = ScrapeError;

    fn from_str(s: &str) -> Result<Self> {
        let category = match s.to_ascii_lowercase().as_str() {
            "achievements" | "achievement" => HighscoreCategory::Achievements,
            "axe" | "axefighting" => HighscoreCategory::AxeFighting,
            "boss" | "bosses" | "bosspoints" => HighscoreCategory::BossPoints,
            "charm" | "charms" | "charmpoints" => HighscoreCategory::CharmPoints,
            "club" | "clubfighting" => HighscoreCategory::ClubFighting,
            "distance" | "distancefighting" => HighscoreCategory::DistanceFighting,
            "drome" | "dromescore" => HighscoreCategory::DromeScore,
            "exp" | "experience" => HighscoreCategory::Experience,
            "fishing" => HighscoreCategory::Fishing,
            "fist" | "fistfighting" => HighscoreCategory::FistFighting,
            "goshnar" | "goshnarstaint" => HighscoreCategory::GoshnarsTaint,
            "loyalty" | "loyaltypoints" => HighscoreCategory::LoyaltyPoints,
            "magic" | "mlvl" | "magiclevel" => HighscoreCategory::MagicLevel,
            "shielding" | "shield" => HighscoreCategory::Shielding,
            "sword" | "swordfighting" => HighscoreCategory::SwordFighting,
            _ => return Err(ScrapeError::Validation(format!("unknown highscore category {:?}", s))),
        };
        Ok(category)
    }
}

/// Vocation filter with tibia.com profession ids
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VocationFilter {
    All,
    None,
    Knights,
    Paladins,
    Sorcerers,
    Druids,
    Monks,
}

impl VocationFilter {
    pub fn id(&self) -> u8 {
        match self {
            VocationFilter::All => 0,
            VocationFilter::None => 1,
            VocationFilter::Knights => 2,
            VocationFilter::Paladins => 3,
            VocationFilter::Sorcerers => 4,
            VocationFilter::Druids => 5,
            VocationFilter::Monks => 6,
        }
    }
}

impl FromStr for VocationFilter {
    type Err = ScrapeError;

    fn from_str(s: &str) -> Result<Self> {
        let vocation = match s.to_ascii_lowercase().as_str() {
            "" | "all" => VocationFilter::All,
            "none" => VocationFilter::None,
            "knight" | "knights" => VocationFilter::Knights,
            "paladin" | "paladins" => VocationFilter::Paladins,
            "sorcerer" | "sorcerers" => VocationFilter::Sorcerers,
            "druid" | "druids" => VocationFilter::Druids,
            "monk" | "monks" => VocationFilter::Monks,
            _ => return Err(ScrapeError::Validation(format!("unknown vocation {:?}", s))),
        };
        Ok(vocation)
    }
}

/// Reject page numbers tibia.com cannot serve.
pub fn validate_page(page: u32) -> Result<u32> {
    if (1..=MAX_PAGE).contains(&page) {
        Ok(page)
    } else {
        Err(ScrapeError::Validation(format!(
            "page must be between 1 and {}, got {}",
            MAX_PAGE, page
        )))
    }
}

/// One page of highscores
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct HighscoresPage {
    pub world: String,
    pub category: String,
    pub vocation: String,
    /// Minutes since tibia.com last refreshed the list
    pub highscore_age: u32,
    pub highscore_list: Vec<Highscore>,
    pub highscore_page: HighscorePagination,
}

/// Highscore entry
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Highscore {
    pub rank: u32,
    pub name: String,
    pub vocation: String,
    pub world: String,
    pub level: u32,
    pub value: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct HighscorePagination {
    pub current_page: u32,
    pub total_pages: u32,
    pub total_records: u32,
}

/// Parser for highscores pages
pub struct HighscoresParser;

impl HighscoresParser {
    /// Parse highscores HTML. `world` is empty for the all-worlds list.
    /// `vocation` is the caller's filter token and is echoed back as given.
    pub fn parse(
        html: &str,
        world: &str,
        category: HighscoreCategory,
        vocation: &str,
        page: u32,
    ) -> Result<HighscoresPage> {
        vocation.parse::<VocationFilter>()?;
        let page_number = validate_page(page)?;
        let document = Page::parse(html);

        let table = document
            .find_all(&TABLES)
            .into_iter()
            .find(|table| table.text().contains("Rank"))
            .ok_or_else(|| ScrapeError::shape(ASSEMBLER, "highscore table"))?;

        let rows = strip_linebreaks(&table.inner_html());
        let highscore_list = match_pattern(&rows, &ROW)
            .into_iter()
            .map(Self::parse_row)
            .collect();

        let total_pages = match document.find_section(&PAGE_NAVIGATION) {
            Ok(nav) => {
                let nav_html = nav.inner_html();
                let links = count_class_token(&nav_html, "PageLink");
                let first_last = count_class_token(&nav_html, "FirstOrLastElement");
                links.saturating_sub(first_last) as u32
            }
            Err(_) => 1,
        };

        if total_pages > 0 && page_number > total_pages {
            return Err(ScrapeError::Validation(format!(
                "page {} is beyond the last page {}",
                page_number, total_pages
            )));
        }

        let page_html = document.html();
        let highscore_age = match_first(&page_html, &LAST_UPDATE)
            .map(|caps| parse_integer(&caps[0]) as u32)
            .unwrap_or(0);
        let total_records = match_first(&page_html, &RESULTS)
            .map(|caps| parse_integer(&caps[0]) as u32)
            .unwrap_or(0);

        Ok(HighscoresPage {
            world: world.to_string(),
            category: category.as_str().to_string(),
            vocation: vocation.to_string(),
            highscore_age,
            highscore_list,
            highscore_page: HighscorePagination {
                current_page: page_number,
                total_pages,
                total_records,
            },
        })
    }

    fn parse_row(caps: Vec<String>) -> Highscore {
        let title = sanitize(&caps[2]);
        Highscore {
            rank: parse_integer(&caps[0]) as u32,
            name: sanitize(&caps[1]),
            title: (!title.is_empty()).then_some(title),
            vocation: sanitize(&caps[3]),
            world: sanitize(&caps[4]),
            level: parse_integer(&caps[5]) as u32,
            value: parse_integer(&caps[6]),
        }
    }
}
