//! House detail parser.
//!
//! The detail page is one prose paragraph. Town and house type are not on
//! the page and come from the [`HouseTable`].

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

use crate::error::{Result, ScrapeError};
use crate::scraper::fragment::{match_first, Css, Page};
use crate::scraper::houses::HouseTable;
use crate::scraper::scalars::{parse_datetime, parse_gold, parse_integer};
use crate::scraper::text::html_to_text;

static CELL: Css = Css::new("td");
static NAME: Css = Css::new("b");

static LINE_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<br\s*/?>").expect("line break pattern is valid"));
static BEDS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"can have up to ([0-9]+) beds?").expect("beds pattern is valid"));
static SIZE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"has a size of ([0-9]+) square meters?").expect("size pattern is valid")
});
static RENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"monthly rent is ([0-9,kK]+ gold)").expect("rent pattern is valid")
});
static RENTED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"has been rented by (.+?)\. (?:He|She) has paid the rent until (.+?)\.")
        .expect("rented pattern is valid")
});
static MOVE_OUT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"will move out on (.+?) \(time of daily server save\)").expect("move out pattern is valid")
});
static TRANSFER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"wants to pass the house to (.+?) for ([0-9,]+) gold coins\. .+? has (not yet )?accepted")
        .expect("transfer pattern is valid")
});
static AUCTION_END: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"The auction (will end|has ended) at (.+?)\.").expect("auction end pattern is valid")
});
static BID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"highest bid so far is ([0-9,]+) gold and has been submitted by (.+?)\.")
        .expect("bid pattern is valid")
});

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct HouseDetail {
    pub house_id: u32,
    pub world: String,
    /// Empty when the house mapping is unavailable
    pub town: String,
    /// Empty when the house mapping is unavailable
    pub house_type: String,
    pub name: String,
    pub beds: u32,
    pub size: u32,
    pub rent: i64,
    pub status: HouseStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct HouseStatus {
    pub is_rented: bool,
    pub is_auctioned: bool,
    pub original: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rental: Option<HouseRental>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auction: Option<HouseAuctionDetail>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HouseRental {
    pub owner: String,
    pub paid_until: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub moving_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transfer_receiver: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transfer_price: Option<i64>,
    pub transfer_accepted: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HouseAuctionDetail {
    pub current_bid: i64,
    pub current_bidder: String,
    pub auction_ongoing: bool,
    pub auction_end: DateTime<Utc>,
}

/// Parser for house detail pages
pub struct HouseParser;

impl HouseParser {
    pub fn parse(html: &str, world: &str, house_id: u32, houses: &HouseTable) -> Result<HouseDetail> {
        let page = Page::parse(html);

        // Nested tables repeat the text in every ancestor cell; the last
        // match in document order is the innermost one.
        let Some(cell) = page
            .find_all(&CELL)
            .into_iter()
            .filter(|cell| cell.raw_text().contains("monthly rent is"))
            .last()
        else {
            return Err(ScrapeError::NotFound(format!("house {} on {}", house_id, world)));
        };

        let name = cell.find_section(&NAME).map(|b| b.text()).unwrap_or_default();
        let text = html_to_text(&LINE_BREAK.replace_all(&cell.inner_html(), " "));
        let (town, house_type) = houses.resolve(house_id);

        let beds = match_first(&text, &BEDS).map_or(0, |caps| parse_integer(&caps[0]) as u32);
        let size = match_first(&text, &SIZE).map_or(0, |caps| parse_integer(&caps[0]) as u32);
        let rent = match_first(&text, &RENT).map_or(0, |caps| parse_gold(&caps[0]));

        // Everything after the rent sentence describes the current status.
        let status_text = text
            .find("monthly rent is")
            .and_then(|start| text[start..].find(". ").map(|end| start + end + 2))
            .map(|start| text[start..].to_string())
            .unwrap_or_default();

        Ok(HouseDetail {
            house_id,
            world: world.to_string(),
            town,
            house_type,
            name,
            beds,
            size,
            rent,
            status: Self::parse_status(&text, status_text)?,
        })
    }

    fn parse_status(text: &str, original: String) -> Result<HouseStatus> {
        let mut status = HouseStatus {
            original,
            ..Default::default()
        };

        if let Some(caps) = match_first(text, &RENTED) {
            status.is_rented = true;
            let mut rental = HouseRental {
                owner: caps[0].clone(),
                paid_until: parse_datetime(&caps[1])?,
                moving_date: None,
                transfer_receiver: None,
                transfer_price: None,
                transfer_accepted: false,
            };
            if let Some(caps) = match_first(text, &MOVE_OUT) {
                rental.moving_date = Some(parse_datetime(&caps[0])?);
            }
            if let Some(caps) = match_first(text, &TRANSFER) {
                rental.transfer_receiver = Some(caps[0].clone());
                rental.transfer_price = Some(parse_integer(&caps[1]));
                rental.transfer_accepted = caps[2].is_empty();
            }
            status.rental = Some(rental);
        } else if let Some(caps) = match_first(text, &AUCTION_END) {
            status.is_auctioned = true;
            let (current_bid, current_bidder) = match_first(text, &BID)
                .map(|bid| (parse_integer(&bid[0]), bid[1].clone()))
                .unwrap_or_default();
            status.auction = Some(HouseAuctionDetail {
                current_bid,
                current_bidder,
                auction_ongoing: caps[0] == "will end",
                auction_end: parse_datetime(&caps[1])?,
            });
        }

        Ok(status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scraper::houses::{HouseMapping, HouseMappingData};
    use crate::scraper::scalars::format_timestamp;

    fn detail_html(status: &str) -> String {
        format!(
            r#"<html><body><div class="TableContainer"><table class="Table1"><tr><td>
<table class="TableContent"><tr>
<td><img src="https://static.tibia.com/images/houses/house_10001.png"/></td>
<td><b>Beach Home Apartments, Flat 14</b><br/>This house can have up to 2 beds.<br/><br/>The house has a size of 30 square meters. The monthly rent is 50k gold and will be debited to the bank account on Antica.<br/><br/>{status}</td>
</tr></table>
</td></tr></table></div></body></html>"#
        )
    }

    fn table() -> HouseTable {
        HouseTable::from_data(HouseMappingData {
            houses: vec![HouseMapping {
                house_id: 10001,
                town: "Thais".to_string(),
                house_type: "house".to_string(),
            }],
        })
    }

    #[test]
    fn test_parse_rented_house() {
        let html = detail_html(
            r#"The house has been rented by <a href="https://www.tibia.com/community/?name=Bubble">Bubble</a>. He has paid the rent until Jan&#160;10&#160;2022,&#160;10:00:00&#160;CET. He will move out on Jan&#160;05&#160;2022,&#160;10:00:00&#160;CET (time of daily server save) and wants to pass the house to <a href="https://www.tibia.com/community/?name=Alice">Alice</a> for 1,000,000 gold coins. Alice has not yet accepted this offer."#,
        );
        let house = HouseParser::parse(&html, "Antica", 10001, &table()).unwrap();

        assert_eq!(house.name, "Beach Home Apartments, Flat 14");
        assert_eq!(house.town, "Thais");
        assert_eq!(house.house_type, "house");
        assert_eq!(house.beds, 2);
        assert_eq!(house.size, 30);
        assert_eq!(house.rent, 50_000);
        assert!(house.status.is_rented);
        assert!(house.status.original.starts_with("The house has been rented by Bubble."));

        let rental = house.status.rental.unwrap();
        assert_eq!(rental.owner, "Bubble");
        assert_eq!(format_timestamp(&rental.paid_until), "2022-01-10T09:00:00Z");
        assert_eq!(format_timestamp(&rental.moving_date.unwrap()), "2022-01-05T09:00:00Z");
        assert_eq!(rental.transfer_receiver.as_deref(), Some("Alice"));
        assert_eq!(rental.transfer_price, Some(1_000_000));
        assert!(!rental.transfer_accepted);
    }

    #[test]
    fn test_parse_auctioned_house() {
        let html = detail_html(
            r#"The house is currently being auctioned. The auction will end at Jan&#160;12&#160;2022,&#160;10:00:00&#160;CET. The highest bid so far is 120,000 gold and has been submitted by <a href="https://www.tibia.com/community/?name=Bidder">Bidder</a>."#,
        );
        let house = HouseParser::parse(&html, "Antica", 10001, &table()).unwrap();

        assert!(!house.status.is_rented);
        assert!(house.status.is_auctioned);
        let auction = house.status.auction.unwrap();
        assert_eq!(auction.current_bid, 120_000);
        assert_eq!(auction.current_bidder, "Bidder");
        assert!(auction.auction_ongoing);
        assert_eq!(format_timestamp(&auction.auction_end), "2022-01-12T09:00:00Z");
    }

    #[test]
    fn test_unavailable_mapping_leaves_town_empty() {
        let html = detail_html("The house is currently being auctioned. The auction will end at Jan 12 2022, 10:00:00 CET. No bid has been submitted so far.");
        let house = HouseParser::parse(&html, "Antica", 10001, &HouseTable::empty()).unwrap();

        assert_eq!(house.name, "Beach Home Apartments, Flat 14");
        assert_eq!(house.town, "");
        assert_eq!(house.house_type, "");
        assert_eq!(house.status.auction.unwrap().current_bid, 0);
    }

    #[test]
    fn test_unknown_house_is_not_found() {
        let html = "<html><body><table><tr><td>House not found.</td></tr></table></body></html>";
        let result = HouseParser::parse(html, "Antica", 99999, &table());
        assert!(matches!(result, Err(ScrapeError::NotFound(_))));
    }
}
