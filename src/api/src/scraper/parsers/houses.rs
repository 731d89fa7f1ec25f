//! House list parser for one town of one world.
//!
//! Houses and guildhalls are listed on separate pages; the route fetches
//! both and merges them into one [`HouseList`].

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

use crate::error::{Result, ScrapeError};
use crate::scraper::fragment::{match_first, Css, Fragment, Page};
use crate::scraper::scalars::{parse_gold, parse_integer};

const ASSEMBLER: &str = "houses";

static HOUSE_ID_INPUT: Css = Css::new("input[name=houseid]");

static AUCTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^auctioned \((.+)\)$").expect("auction pattern is valid"));

/// Which list page to request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HouseKind {
    House,
    Guildhall,
}

impl HouseKind {
    /// Value of the `type` query parameter
    pub fn query_value(&self) -> &'static str {
        match self {
            HouseKind::House => "houses",
            HouseKind::Guildhall => "guildhalls",
        }
    }

    fn caption(&self) -> &'static str {
        match self {
            HouseKind::House => "Available Houses",
            HouseKind::Guildhall => "Available Guildhalls",
        }
    }
}

/// All houses and guildhalls of one town
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct HouseList {
    pub world: String,
    pub town: String,
    pub house_list: Vec<HouseEntry>,
    pub guildhall_list: Vec<HouseEntry>,
}

impl HouseList {
    pub fn new(world: &str, town: &str, house_list: Vec<HouseEntry>, guildhall_list: Vec<HouseEntry>) -> Self {
        Self {
            world: world.to_string(),
            town: town.to_string(),
            house_list,
            guildhall_list,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct HouseEntry {
    pub name: String,
    pub house_id: u32,
    pub size: u32,
    pub rent: i64,
    pub rented: bool,
    pub auctioned: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auction: Option<HouseAuction>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct HouseAuction {
    pub current_bid: i64,
    pub time_left: String,
    pub finished: bool,
}

/// Parser for house list pages
pub struct HousesParser;

impl HousesParser {
    /// Parse one list page of the given kind.
    pub fn parse(html: &str, kind: HouseKind) -> Result<Vec<HouseEntry>> {
        let page = Page::parse(html);
        let table = page
            .table_by_caption(kind.caption())
            .map_err(|e| e.required_by(ASSEMBLER))?;

        Ok(table
            .rows()
            .into_iter()
            .filter(|cells| cells.len() >= 5)
            .filter_map(|cells| Self::parse_row(&cells))
            .collect())
    }

    fn parse_row(cells: &[Fragment]) -> Option<HouseEntry> {
        let house_id = cells
            .iter()
            .find_map(|cell| cell.find_section(&HOUSE_ID_INPUT).ok())
            .and_then(|input| input.attr("value"))
            .and_then(|value| value.parse().ok())?;

        let status = cells[3].text();
        let auction = match_first(&status, &AUCTION).map(|caps| parse_auction(&caps[0]));

        Some(HouseEntry {
            name: cells[0].text(),
            house_id,
            size: parse_integer(&cells[1].text()) as u32,
            rent: parse_gold(&cells[2].text()),
            rented: status.starts_with("rented"),
            auctioned: auction.is_some(),
            auction,
        })
    }
}

/// `"no bid yet"`, `"1,000 gold; 2 days left"` or `"1,000 gold; finished"`.
fn parse_auction(details: &str) -> HouseAuction {
    let Some((bid, remaining)) = details.split_once("; ") else {
        return HouseAuction::default();
    };

    let finished = remaining == "finished";
    HouseAuction {
        current_bid: parse_gold(bid),
        time_left: if finished {
            String::new()
        } else {
            remaining.trim_end_matches(" left").to_string()
        },
        finished,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(name: &str, size: &str, rent: &str, status: &str, id: u32) -> String {
        format!(
            r#"<tr><td><nobr>{name}</nobr></td><td><nobr>{size}</nobr></td><td><nobr>{rent}</nobr></td><td><nobr>{status}</nobr></td><td><form action="https://www.tibia.com/community/?subtopic=houses&amp;page=view" method="post"><input type="hidden" name="houseid" value="{id}"/><input type="hidden" name="world" value="Antica"/><div class="BigButton">View</div></form></td></tr>"#
        )
    }

    fn list_html(caption: &str, rows: &str) -> String {
        format!(
            r#"<html><body><div class="TableContainer">
<div class="CaptionContainer"><div class="Text">{caption}</div></div>
<table class="TableContent">
<tr class="LabelH"><td>Name</td><td>Size</td><td>Rent</td><td>Status</td><td>&#160;</td></tr>
{rows}
</table></div></body></html>"#
        )
    }

    #[test]
    fn test_parse_houses() {
        let rows = [
            row("Beach Home Apartments, Flat 14", "30&#160;sqm", "50k&#160;gold", "rented", 10001),
            row("Harbour Lane 3", "112 sqm", "1,500 gold", "auctioned (no bid yet)", 10002),
            row("Castle Street 1", "80 sqm", "2kk gold", "auctioned (12,000 gold; 2 days left)", 10003),
            row("Upper Swamp Lane 8", "60 sqm", "80k gold", "auctioned (5,000 gold; finished)", 10004),
        ]
        .concat();
        let html = list_html("Available Houses and Flats in Thais on Antica", &rows);

        let houses = HousesParser::parse(&html, HouseKind::House).unwrap();
        assert_eq!(houses.len(), 4);

        assert_eq!(
            houses[0],
            HouseEntry {
                name: "Beach Home Apartments, Flat 14".to_string(),
                house_id: 10001,
                size: 30,
                rent: 50_000,
                rented: true,
                auctioned: false,
                auction: None,
            }
        );
        assert_eq!(houses[1].rent, 1_500);
        assert_eq!(houses[1].auction, Some(HouseAuction::default()));
        assert_eq!(houses[2].rent, 2_000_000);
        assert_eq!(
            houses[2].auction,
            Some(HouseAuction {
                current_bid: 12_000,
                time_left: "2 days".to_string(),
                finished: false,
            })
        );
        assert!(houses[3].auction.as_ref().unwrap().finished);
        assert_eq!(houses[3].auction.as_ref().unwrap().current_bid, 5_000);
    }

    #[test]
    fn test_empty_town_is_empty_list() {
        let html = list_html(
            "Available Guildhalls in Thais on Antica",
            "<tr><td>No guildhall found.</td></tr>",
        );
        let halls = HousesParser::parse(&html, HouseKind::Guildhall).unwrap();
        assert!(halls.is_empty());
    }

    #[test]
    fn test_wrong_page_is_shape_mismatch() {
        let html = list_html("Available Houses and Flats in Thais on Antica", "");
        let result = HousesParser::parse(&html, HouseKind::Guildhall);
        assert!(matches!(result, Err(ScrapeError::ParseShapeMismatch { assembler: "houses", .. })));
    }

    #[test]
    fn test_query_value() {
        assert_eq!(HouseKind::House.query_value(), "houses");
        assert_eq!(HouseKind::Guildhall.query_value(), "guildhalls");
    }
}
