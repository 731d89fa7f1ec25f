//! Single world parser: world information and the players online list.

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

use crate::error::{Result, ScrapeError};
use crate::scraper::fragment::{match_first, Css, Fragment, Page};
use crate::scraper::scalars::{parse_datetime, parse_integer, parse_month};

static LINK: Css = Css::new("a");

static RECORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([0-9,]+) players \(on (.+?)\)").expect("record pattern is valid")
});
static BATTLEYE_SINCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"BattlEye since ([A-Za-z]+ [0-9]+ [0-9]{4})").expect("battleye pattern is valid")
});

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct WorldDetail {
    pub name: String,
    pub status: String,
    pub players_online: u32,
    pub record_players: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_date: Option<DateTime<Utc>>,
    /// `YYYY-MM`
    pub creation_date: String,
    pub location: String,
    pub pvp_type: String,
    pub premium_only: bool,
    pub transfer_type: String,
    pub world_quest_titles: Vec<String>,
    pub battleye_protected: bool,
    pub battleye_date: String,
    pub game_world_type: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub tournament_world_type: String,
    pub online_players: Vec<OnlinePlayer>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct OnlinePlayer {
    pub name: String,
    pub level: u32,
    pub vocation: String,
}

/// Parser for single world pages
pub struct WorldParser;

impl WorldParser {
    pub fn parse(html: &str, name: &str) -> Result<WorldDetail> {
        let page = Page::parse(html);

        let information = page
            .table_by_caption("World Information")
            .map_err(|_| ScrapeError::NotFound(format!("world {}", name)))?;

        let mut world = WorldDetail {
            name: name.to_string(),
            ..Default::default()
        };
        Self::parse_information(&information, &mut world)?;

        if let Ok(table) = page.table_by_caption("Players Online") {
            world.online_players = Self::parse_players(&table);
        }

        Ok(world)
    }

    fn parse_information(table: &Fragment, world: &mut WorldDetail) -> Result<()> {
        for (label, cell) in table.labelled_rows() {
            let value = cell.text();
            match label.as_str() {
                "Status" => world.status = value.to_lowercase(),
                "Players Online" => world.players_online = parse_integer(&value) as u32,
                "Online Record" => {
                    if let Some(caps) = match_first(&value, &RECORD) {
                        world.record_players = parse_integer(&caps[0]) as u32;
                        world.record_date = Some(parse_datetime(&caps[1])?);
                    }
                }
                "Creation Date" => world.creation_date = parse_month(&value)?,
                "Location" => world.location = value,
                "PvP Type" => world.pvp_type = value,
                "Premium Type" => world.premium_only = value.contains("premium"),
                "Transfer Type" => world.transfer_type = value,
                "World Quest Titles" => {
                    if !value.contains("has no title") {
                        world.world_quest_titles = value
                            .split(',')
                            .map(|title| title.trim().to_string())
                            .filter(|title| !title.is_empty())
                            .collect();
                    }
                }
                "BattlEye Status" => {
                    if !value.starts_with("Not protected") {
                        world.battleye_protected = true;
                        world.battleye_date = match_first(&value, &BATTLEYE_SINCE)
                            .map(|caps| caps[0].clone())
                            .unwrap_or_else(|| "release".to_string());
                    }
                }
                "Game World Type" => world.game_world_type = value.to_lowercase(),
                "Tournament World Type" => world.tournament_world_type = value.to_lowercase(),
                _ => {}
            }
        }
        Ok(())
    }

    fn parse_players(table: &Fragment) -> Vec<OnlinePlayer> {
        table
            .rows()
            .into_iter()
            .filter(|cells| cells.len() >= 3)
            .filter_map(|cells| {
                let name = cells[0].find_section(&LINK).ok()?.text();
                Some(OnlinePlayer {
                    name,
                    level: parse_integer(&cells[1].text()) as u32,
                    vocation: cells[2].text(),
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scraper::scalars::format_timestamp;

    const WORLD_HTML: &str = r##"<html><body>
<div class="TableContainer"><div class="CaptionContainer"><div class="Text">World Information</div></div>
<table class="TableContent">
<tr><td class="LabelV200">Status:</td><td><div class="InfoBar Green">Online</div></td></tr>
<tr><td>Players Online:</td><td>512</td></tr>
<tr><td>Online Record:</td><td>1,234 players (on Oct&#160;12&#160;2020,&#160;20:34:10&#160;CEST)</td></tr>
<tr><td>Creation Date:</td><td>01/1997</td></tr>
<tr><td>Location:</td><td>Europe</td></tr>
<tr><td>PvP Type:</td><td>Open PvP</td></tr>
<tr><td>Premium Type:</td><td>premium</td></tr>
<tr><td>Transfer Type:</td><td>regular</td></tr>
<tr><td>World Quest Titles:</td><td><a href="#">Rise of Devovorga</a>, <a href="#">Bewitched</a></td></tr>
<tr><td>BattlEye Status:</td><td>Protected by BattlEye since Aug&#160;29&#160;2017.</td></tr>
<tr><td>Game World Type:</td><td>Regular</td></tr>
</table></div>
<div class="TableContainer"><div class="CaptionContainer"><div class="Text">Players Online</div></div>
<table class="TableContent">
<tr class="LabelH"><td>Name</td><td>Level</td><td>Vocation</td></tr>
<tr><td><a href="https://www.tibia.com/community/?name=Bubble">Bubble</a></td><td>512</td><td>Elite Knight</td></tr>
<tr><td><a href="https://www.tibia.com/community/?name=Alice">Alice</a></td><td>300</td><td>Elder Druid</td></tr>
</table></div>
</body></html>"##;

    #[test]
    fn test_parse_world() {
        let world = WorldParser::parse(WORLD_HTML, "Antica").unwrap();

        assert_eq!(world.name, "Antica");
        assert_eq!(world.status, "online");
        assert_eq!(world.players_online, 512);
        assert_eq!(world.record_players, 1234);
        assert_eq!(
            format_timestamp(world.record_date.as_ref().unwrap()),
            "2020-10-12T18:34:10Z"
        );
        assert_eq!(world.creation_date, "1997-01");
        assert!(world.premium_only);
        assert_eq!(world.world_quest_titles, vec!["Rise of Devovorga", "Bewitched"]);
        assert!(world.battleye_protected);
        assert_eq!(world.battleye_date, "Aug 29 2017");
        assert_eq!(world.game_world_type, "regular");
        assert!(world.tournament_world_type.is_empty());

        assert_eq!(
            world.online_players,
            vec![
                OnlinePlayer {
                    name: "Bubble".to_string(),
                    level: 512,
                    vocation: "Elite Knight".to_string(),
                },
                OnlinePlayer {
                    name: "Alice".to_string(),
                    level: 300,
                    vocation: "Elder Druid".to_string(),
                },
            ]
        );
    }

    #[test]
    fn test_unknown_world_is_not_found() {
        let html = "<html><body><div class=\"BoxContent\">World with this name doesn't exist!</div></body></html>";
        assert!(matches!(
            WorldParser::parse(html, "Nowhere"),
            Err(ScrapeError::NotFound(msg)) if msg == "world Nowhere"
        ));
    }
}
