//! World overview parser.

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

use crate::error::Result;
use crate::scraper::fragment::{match_first, Css, Fragment, Page};
use crate::scraper::scalars::{parse_datetime, parse_integer};
use crate::scraper::text::unescape_entities;

const ASSEMBLER: &str = "worlds";

static WORLD_LINK: Css = Css::new("a");

static RECORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([0-9,]+) players \(on (.+?)\)").expect("record pattern is valid")
});
static BATTLEYE_SINCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"BattlEye since ([A-Za-z]+ [0-9]+ [0-9]{4})").expect("battleye pattern is valid")
});

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct WorldsOverview {
    pub players_online: u32,
    pub record_players: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_date: Option<DateTime<Utc>>,
    pub regular_worlds: Vec<WorldEntry>,
    pub tournament_worlds: Vec<WorldEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct WorldEntry {
    pub name: String,
    pub status: String,
    pub players_online: u32,
    pub location: String,
    pub pvp_type: String,
    pub premium_only: bool,
    pub transfer_type: String,
    pub battleye_protected: bool,
    /// Date protection started; "release" when the world always had it
    pub battleye_date: String,
    pub game_world_type: String,
}

/// Parser for the world overview page
pub struct WorldsParser;

impl WorldsParser {
    pub fn parse(html: &str) -> Result<WorldsOverview> {
        let page = Page::parse(html);

        let regular = page
            .table_by_caption("Regular Worlds")
            .map_err(|e| e.required_by(ASSEMBLER))?;
        let regular_worlds = Self::parse_worlds(&regular, "regular");
        let tournament_worlds = page
            .table_by_caption("Tournament Worlds")
            .map(|table| Self::parse_worlds(&table, "tournament"))
            .unwrap_or_default();

        let mut overview = WorldsOverview {
            players_online: regular_worlds
                .iter()
                .chain(tournament_worlds.iter())
                .map(|world| world.players_online)
                .sum(),
            regular_worlds,
            tournament_worlds,
            ..Default::default()
        };

        if let Ok(record) = page.table_by_caption("Overall Maximum") {
            if let Some(caps) = match_first(&record.text(), &RECORD) {
                overview.record_players = parse_integer(&caps[0]) as u32;
                overview.record_date = Some(parse_datetime(&caps[1])?);
            }
        }

        Ok(overview)
    }

    fn parse_worlds(table: &Fragment, world_type: &str) -> Vec<WorldEntry> {
        table
            .rows()
            .into_iter()
            .filter(|cells| cells.len() >= 6)
            .filter_map(|cells| {
                let name = cells[0].find_section(&WORLD_LINK).ok()?.text();
                let online = cells[1].text();
                let additional = cells[5].text();
                let (battleye_protected, battleye_date) = parse_battleye(&cells[4]);

                let transfer_type = if additional.contains("blocked") {
                    "blocked"
                } else if additional.contains("locked") {
                    "locked"
                } else {
                    "regular"
                };
                let game_world_type = if additional.contains("experimental") {
                    "experimental"
                } else {
                    world_type
                };

                Some(WorldEntry {
                    name,
                    status: if online == "off" { "offline" } else { "online" }.to_string(),
                    players_online: parse_integer(&online) as u32,
                    location: cells[2].text(),
                    pvp_type: cells[3].text(),
                    premium_only: additional.contains("premium"),
                    transfer_type: transfer_type.to_string(),
                    battleye_protected,
                    battleye_date,
                    game_world_type: game_world_type.to_string(),
                })
            })
            .collect()
    }
}

/// The BattlEye column is an icon whose tooltip carries the start date.
fn parse_battleye(cell: &Fragment) -> (bool, String) {
    let html = unescape_entities(&cell.inner_html());
    if !html.contains("icon_battleye") {
        return (false, String::new());
    }
    let date = match_first(&html, &BATTLEYE_SINCE)
        .map(|caps| caps[0].clone())
        .unwrap_or_else(|| "release".to_string());
    (true, date)
}
