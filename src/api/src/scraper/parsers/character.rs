//! Character profile parser for tibia.com.
//!
//! The profile is a set of captioned tables: Character Information, Account
//! Achievements, Character Deaths, Account Information and Characters. Only
//! the first is always present.

use chrono::{DateTime, NaiveDate, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

use crate::error::{Result, ScrapeError};
use crate::scraper::fragment::{match_first, Css, Fragment, Page};
use crate::scraper::houses::HouseTable;
use crate::scraper::scalars::{parse_date, parse_datetime, parse_integer};
use crate::scraper::text::{html_to_text, remove_tags, sanitize, strip_linebreaks};

const ASSEMBLER: &str = "character";

static LINK: Css = Css::new("a");

static TITLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(.*) \(([0-9]+) titles? unlocked\)$").expect("title pattern is valid")
});
static HOUSE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"houseid=([0-9]+)[^>]*>([^<]+)</a>\s*\(([^)]*)\) is paid until (.+)$")
        .expect("house pattern is valid")
});
static DEATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:Died|Killed) at Level ([0-9]+) by (.+)$").expect("death pattern is valid")
});
static ASSISTED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<br\s*/?>\s*Assisted by ").expect("assist pattern is valid"));
static SUMMON: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.+?) of <a").expect("summon pattern is valid"));
static LINE_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<br\s*/?>").expect("line break pattern is valid"));

/// Full character page
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CharacterPage {
    pub character: CharacterInfo,
    pub achievements: Vec<Achievement>,
    pub deaths: Vec<Death>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_information: Option<AccountInformation>,
    pub other_characters: Vec<OtherCharacter>,
}

/// Character Information table
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CharacterInfo {
    pub name: String,
    pub former_names: Vec<String>,
    pub traded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deletion_date: Option<DateTime<Utc>>,
    pub sex: String,
    pub title: String,
    pub unlocked_titles: u32,
    pub vocation: String,
    pub level: u32,
    pub achievement_points: u32,
    pub world: String,
    pub former_worlds: Vec<String>,
    pub residence: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub married_to: Option<String>,
    pub houses: Vec<CharacterHouse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guild: Option<CharacterGuild>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_login: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
    pub account_status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl CharacterInfo {
    /// Nothing was parsed: the page did not describe a character.
    fn is_empty(&self) -> bool {
        self.name.is_empty() && self.level == 0 && self.world.is_empty() && self.vocation.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct CharacterHouse {
    pub name: String,
    pub town: String,
    /// "house" or "guildhall"; empty when the house mapping is unavailable
    pub house_type: String,
    pub house_id: u32,
    pub paid: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct CharacterGuild {
    pub name: String,
    pub rank: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Achievement {
    pub name: String,
    pub grade: u8,
    pub secret: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Death {
    pub time: DateTime<Utc>,
    pub level: u32,
    pub killers: Vec<Killer>,
    pub assists: Vec<Killer>,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Killer {
    pub name: String,
    pub player: bool,
    pub traded: bool,
    /// Creature summoned by `name`, if the killer was a summon
    #[serde(skip_serializing_if = "String::is_empty")]
    pub summon: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AccountInformation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loyalty_title: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct OtherCharacter {
    pub name: String,
    pub world: String,
    pub status: String,
    pub deleted: bool,
    pub main: bool,
    pub traded: bool,
}

/// Parser for character pages
pub struct CharacterParser;

impl CharacterParser {
    /// Parse a character page. `name` is the requested name, used for the
    /// not-found error.
    pub fn parse(html: &str, name: &str, houses: &HouseTable) -> Result<CharacterPage> {
        let page = Page::parse(html);

        let character = match page.table_by_caption("Character Information") {
            Ok(table) => Self::parse_information(&table, houses)?,
            Err(_) => CharacterInfo::default(),
        };
        if character.is_empty() {
            return Err(ScrapeError::NotFound(format!("character {}", name)));
        }

        let achievements = page
            .table_by_caption("Account Achievements")
            .map(|table| Self::parse_achievements(&table))
            .unwrap_or_default();

        let deaths = match page.table_by_caption("Character Deaths") {
            Ok(table) => Self::parse_deaths(&table)?,
            Err(_) => Vec::new(),
        };

        let account_information = match page.table_by_caption("Account Information") {
            Ok(table) => Some(Self::parse_account_information(&table)?),
            Err(_) => None,
        };

        let other_characters = page
            .table_by_caption("Characters")
            .map(|table| Self::parse_other_characters(&table))
            .unwrap_or_default();

        Ok(CharacterPage {
            character,
            achievements,
            deaths,
            account_information,
            other_characters,
        })
    }

    fn parse_information(table: &Fragment, houses: &HouseTable) -> Result<CharacterInfo> {
        let mut info = CharacterInfo::default();

        for (label, cell) in table.labelled_rows() {
            let value = cell.text();
            match label.as_str() {
                "Name" => Self::parse_name(&value, &mut info)?,
                "Former Names" => info.former_names = split_list(&value),
                "Title" => match match_first(&value, &TITLE) {
                    Some(caps) => {
                        info.title = caps[0].clone();
                        info.unlocked_titles = parse_integer(&caps[1]) as u32;
                    }
                    None => info.title = value,
                },
                "Sex" => info.sex = value,
                "Vocation" => info.vocation = value,
                "Level" => info.level = parse_integer(&value) as u32,
                "Achievement Points" => info.achievement_points = parse_integer(&value) as u32,
                "World" => info.world = value,
                "Former World" => info.former_worlds = split_list(&value),
                "Residence" => info.residence = value,
                "Married To" => info.married_to = Some(value),
                "House" => info.houses.push(Self::parse_house(&cell, houses)?),
                "Guild Membership" => info.guild = Some(Self::parse_guild(&cell, &value)),
                "Last Login" => {
                    if !value.contains("never logged in") {
                        info.last_login = Some(parse_datetime(&value)?);
                    }
                }
                "Position" => info.position = Some(value),
                "Comment" => info.comment = Some(multiline_text(&cell.inner_html())),
                "Account Status" => info.account_status = value,
                _ => {}
            }
        }

        if info.title == "None" {
            info.title.clear();
        }

        Ok(info)
    }

    fn parse_name(value: &str, info: &mut CharacterInfo) -> Result<()> {
        let (name, deletion) = match value.split_once(", will be deleted at ") {
            Some((name, date)) => (name, Some(parse_datetime(date)?)),
            None => (value, None),
        };
        info.deletion_date = deletion;

        match name.strip_suffix("(traded)") {
            Some(stripped) => {
                info.name = stripped.trim().to_string();
                info.traded = true;
            }
            None => info.name = name.trim().to_string(),
        }
        Ok(())
    }

    fn parse_house(cell: &Fragment, houses: &HouseTable) -> Result<CharacterHouse> {
        let html = strip_linebreaks(&cell.inner_html());
        let caps = match_first(&html, &HOUSE)
            .ok_or_else(|| ScrapeError::shape(ASSEMBLER, "House row"))?;

        let house_id = parse_integer(&caps[0]) as u32;
        let (mapped_town, house_type) = houses.resolve(house_id);
        let town = sanitize(&caps[2]);
        let paid = parse_date(&sanitize(&remove_tags(&caps[3]))).ok();

        Ok(CharacterHouse {
            name: sanitize(&caps[1]),
            town: if town.is_empty() { mapped_town } else { town },
            house_type,
            house_id,
            paid,
        })
    }

    fn parse_guild(cell: &Fragment, value: &str) -> CharacterGuild {
        let name = cell
            .find_section(&LINK)
            .map(|link| link.text())
            .unwrap_or_default();
        let rank = value
            .split_once(" of the ")
            .map(|(rank, _)| rank.to_string())
            .unwrap_or_default();
        CharacterGuild { name, rank }
    }

    fn parse_achievements(table: &Fragment) -> Vec<Achievement> {
        table
            .rows()
            .into_iter()
            .filter(|cells| cells.len() >= 2)
            .filter_map(|cells| {
                let grade_html = cells[0].inner_html();
                let name_html = cells[1].inner_html();
                let name = cells[1].text();
                if name.is_empty() {
                    return None;
                }
                Some(Achievement {
                    name,
                    grade: grade_html.matches("achievement-grade-symbol").count() as u8,
                    secret: name_html.contains("achievement-secret-symbol"),
                })
            })
            .collect()
    }

    fn parse_deaths(table: &Fragment) -> Result<Vec<Death>> {
        let mut deaths = Vec::new();

        for cells in table.rows() {
            if cells.len() < 2 {
                continue;
            }
            let description = strip_linebreaks(&cells[1].inner_html());
            let Some(caps) = match_first(description.trim(), &DEATH) else {
                continue;
            };

            let time = parse_datetime(&cells[0].text())?;
            let mut parts = ASSISTED.splitn(&caps[1], 2);
            let killers = parts.next().map(split_killers).unwrap_or_default();
            let assists = parts.next().map(split_killers).unwrap_or_default();

            deaths.push(Death {
                time,
                level: parse_integer(&caps[0]) as u32,
                killers,
                assists,
                reason: html_to_text(&LINE_BREAK.replace_all(&description, " ")),
            });
        }

        Ok(deaths)
    }

    fn parse_account_information(table: &Fragment) -> Result<AccountInformation> {
        let mut account = AccountInformation::default();
        for (label, cell) in table.labelled_rows() {
            let value = cell.text();
            match label.as_str() {
                "Position" => account.position = Some(value),
                "Created" => account.created = Some(parse_datetime(&value)?),
                "Loyalty Title" => {
                    if value != "(no title)" {
                        account.loyalty_title = Some(value);
                    }
                }
                _ => {}
            }
        }
        Ok(account)
    }

    fn parse_other_characters(table: &Fragment) -> Vec<OtherCharacter> {
        table
            .rows()
            .into_iter()
            .filter(|cells| cells.len() >= 3)
            .filter_map(|cells| {
                let raw_name = cells[0].text();
                // Header row
                if raw_name == "Name" {
                    return None;
                }

                let main = raw_name.contains("Main Character");
                let traded = raw_name.contains("(traded)");
                let name = raw_name
                    .replace("Main Character", "")
                    .replace("(traded)", "")
                    .trim()
                    .trim_start_matches(|c: char| c.is_ascii_digit())
                    .trim_start_matches('.')
                    .trim()
                    .to_string();

                let status = cells[2].text();
                Some(OtherCharacter {
                    name,
                    world: cells[1].text(),
                    deleted: status.contains("deleted"),
                    status: if status.contains("online") { "online" } else { "offline" }.to_string(),
                    main,
                    traded,
                })
            })
            .collect()
    }
}

/// Comma-separated list, empty entries dropped.
fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect()
}

/// Text of an HTML block with `<br>` kept as newlines.
fn multiline_text(html: &str) -> String {
    let flat = strip_linebreaks(html);
    let with_newlines = LINE_BREAK.replace_all(&flat, "\n");
    with_newlines
        .split('\n')
        .map(|line| sanitize(&remove_tags(line)))
        .collect::<Vec<_>>()
        .join("\n")
}

/// `"a dragon, <a>Foo</a> and a demon."` -> three killers. The site writes
/// killer lists as prose, so the last entry has to be split on " and ".
fn split_killers(list_html: &str) -> Vec<Killer> {
    let list_html = list_html.trim().trim_end_matches('.');
    let mut items: Vec<&str> = list_html.split(", ").collect();

    if let Some(last) = items.pop() {
        match last_conjunction(last) {
            Some(at) => {
                items.push(&last[..at]);
                items.push(&last[at + CONJUNCTION.len()..]);
            }
            None => items.push(last),
        }
    }

    items
        .into_iter()
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(parse_killer)
        .collect()
}

const CONJUNCTION: &str = " and ";

/// Offset of the last " and " outside link text, so player names such as
/// "Bread and Butter" stay whole.
fn last_conjunction(item_html: &str) -> Option<usize> {
    item_html
        .rmatch_indices(CONJUNCTION)
        .map(|(at, _)| at)
        .find(|&at| {
            let before = &item_html[..at];
            before.matches("<a").count() == before.matches("</a>").count()
        })
}

fn parse_killer(item_html: &str) -> Killer {
    let player = item_html.contains("<a");
    let mut text = sanitize(&remove_tags(item_html));

    let traded = text.ends_with("(traded)");
    if traded {
        text = text.trim_end_matches("(traded)").trim().to_string();
    }

    if player {
        if let Some(caps) = match_first(item_html, &SUMMON) {
            let summon = sanitize(&caps[0]);
            let name = text
                .strip_prefix(&summon)
                .map(|rest| rest.trim_start().trim_start_matches("of").trim())
                .unwrap_or(&text)
                .to_string();
            return Killer {
                name,
                player,
                traded,
                summon,
            };
        }
    }

    Killer {
        name: text,
        player,
        traded,
        summon: String::new(),
    }
}
