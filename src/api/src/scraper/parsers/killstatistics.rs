//! Kill statistics parser for one world.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::scraper::fragment::{Css, Page};
use crate::scraper::scalars::parse_integer;

const ASSEMBLER: &str = "killstatistics";

static TABLE: Css = Css::new("#KillStatisticsTable");

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct KillStatistics {
    pub world: String,
    pub entries: Vec<KillEntry>,
    pub total: KillCounts,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct KillEntry {
    pub race: String,
    #[serde(flatten)]
    pub counts: KillCounts,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq)]
pub struct KillCounts {
    pub last_day_players_killed: u32,
    pub last_day_killed: u32,
    pub last_week_players_killed: u32,
    pub last_week_killed: u32,
}

/// Parser for kill statistics pages
pub struct KillStatisticsParser;

impl KillStatisticsParser {
    pub fn parse(html: &str, world: &str) -> Result<KillStatistics> {
        let page = Page::parse(html);
        let table = page.find_section(&TABLE).map_err(|e| e.required_by(ASSEMBLER))?;

        let mut statistics = KillStatistics {
            world: world.to_string(),
            ..Default::default()
        };

        for cells in table.rows() {
            if cells.len() < 5 {
                continue;
            }
            let texts: Vec<String> = cells.iter().map(|cell| cell.text()).collect();
            // Both header rows have text in the count columns
            if !texts[1].chars().all(|c| c.is_ascii_digit() || c == ',') || texts[1].is_empty() {
                continue;
            }

            let counts = KillCounts {
                last_day_players_killed: parse_integer(&texts[1]) as u32,
                last_day_killed: parse_integer(&texts[2]) as u32,
                last_week_players_killed: parse_integer(&texts[3]) as u32,
                last_week_killed: parse_integer(&texts[4]) as u32,
            };

            if texts[0] == "Total" {
                statistics.total = counts;
            } else {
                statistics.entries.push(KillEntry {
                    race: texts[0].clone(),
                    counts,
                });
            }
        }

        Ok(statistics)
    }
}
