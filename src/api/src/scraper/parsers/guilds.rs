//! Guild list parser for one world.

use serde::{Deserialize, Serialize};

use crate::error::{Result, ScrapeError};
use crate::scraper::fragment::{Css, Fragment, Page};

static LOGO: Css = Css::new("img");
static NAME: Css = Css::new("b");

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GuildList {
    pub world: String,
    pub active: Vec<GuildListEntry>,
    pub formation: Vec<GuildListEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct GuildListEntry {
    pub name: String,
    pub logo_url: String,
    pub description: String,
}

/// Parser for the guild list of a world
pub struct GuildsParser;

impl GuildsParser {
    pub fn parse(html: &str, world: &str) -> Result<GuildList> {
        let page = Page::parse(html);

        // A world without guilds still has the (empty) active table; no
        // table at all means the world does not exist.
        let active = page
            .table_by_caption("Active Guilds")
            .map_err(|_| ScrapeError::NotFound(format!("world {}", world)))?;

        Ok(GuildList {
            world: world.to_string(),
            active: Self::parse_entries(&active),
            formation: page
                .table_by_caption("Guilds in Course of Formation")
                .map(|table| Self::parse_entries(&table))
                .unwrap_or_default(),
        })
    }

    fn parse_entries(table: &Fragment) -> Vec<GuildListEntry> {
        table
            .rows()
            .into_iter()
            .filter(|cells| cells.len() >= 2)
            .filter_map(|cells| {
                let name = cells[1].find_section(&NAME).ok()?.text();
                let full = cells[1].text();
                let description = full
                    .strip_prefix(name.as_str())
                    .unwrap_or(&full)
                    .trim()
                    .to_string();
                let logo_url = cells[0]
                    .find_section(&LOGO)
                    .ok()
                    .and_then(|img| img.attr("src"))
                    .unwrap_or_default()
                    .to_string();
                Some(GuildListEntry {
                    name,
                    logo_url,
                    description,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GUILDS_HTML: &str = r#"<html><body>
<div class="TableContainer">
<div class="CaptionContainer"><div class="Text">Active Guilds on Antica</div></div>
<table class="TableContent">
<tr class="LabelH"><td>Logo</td><td>Description</td><td>&#160;</td></tr>
<tr><td><img src="https://static.tibia.com/images/guildlogos/Red_Rose.gif"/></td><td><b>Red Rose</b><br/>A guild of knights.</td><td><form><div class="BigButton">View</div></form></td></tr>
<tr><td><img src="https://static.tibia.com/images/guildlogos/default_logo.gif"/></td><td><b>Blue Sky</b></td><td></td></tr>
</table></div>
<div class="TableContainer">
<div class="CaptionContainer"><div class="Text">Guilds in Course of Formation on Antica</div></div>
<table class="TableContent">
<tr class="LabelH"><td>Logo</td><td>Description</td><td>&#160;</td></tr>
<tr><td><img src="https://static.tibia.com/images/guildlogos/default_logo.gif"/></td><td><b>Newcomers</b><br/>Forming.</td><td></td></tr>
</table></div>
</body></html>"#;

    #[test]
    fn test_parse_guild_list() {
        let list = GuildsParser::parse(GUILDS_HTML, "Antica").unwrap();
        assert_eq!(list.world, "Antica");
        assert_eq!(list.active.len(), 2);
        assert_eq!(
            list.active[0],
            GuildListEntry {
                name: "Red Rose".to_string(),
                logo_url: "https://static.tibia.com/images/guildlogos/Red_Rose.gif".to_string(),
                description: "A guild of knights.".to_string(),
            }
        );
        assert_eq!(list.active[1].description, "");
        assert_eq!(list.formation.len(), 1);
        assert_eq!(list.formation[0].name, "Newcomers");
    }

    #[test]
    fn test_unknown_world_is_not_found() {
        let html = "<html><body><div class=\"BoxContent\">World does not exist.</div></body></html>";
        assert!(matches!(
            GuildsParser::parse(html, "Nowhere"),
            Err(ScrapeError::NotFound(_))
        ));
    }
}
