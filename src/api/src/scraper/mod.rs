//! Scraper core for tibia.com
//!
//! Text normalization, Latin-1 handling, scalar parsing and section
//! extraction shared by the page parsers, plus the fetcher and URL builders.

pub mod encoding;
pub mod fetcher;
pub mod fragment;
pub mod houses;
pub mod parsers;
pub mod scalars;
pub mod text;

pub use fetcher::Fetcher;
pub use houses::HouseTable;

use crate::error::{Result, ScrapeError};
use encoding::latin1_query_escape;
use parsers::highscores::{HighscoreCategory, VocationFilter};
use parsers::houses::HouseKind;

/// Escape a free-text query value, rejecting empty values.
fn query_value(field: &str, value: &str) -> Result<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ScrapeError::Validation(format!("{} must not be empty", field)));
    }
    Ok(latin1_query_escape(value)?)
}

/// Build character page URL
pub fn character_url(base: &str, name: &str) -> Result<String> {
    Ok(format!(
        "{}/community/?subtopic=characters&name={}",
        base,
        query_value("character name", name)?
    ))
}

/// Build guild page URL
pub fn guild_url(base: &str, name: &str) -> Result<String> {
    Ok(format!(
        "{}/community/?subtopic=guilds&page=view&GuildName={}",
        base,
        query_value("guild name", name)?
    ))
}

/// Build guild list URL for a world
pub fn guilds_url(base: &str, world: &str) -> Result<String> {
    Ok(format!(
        "{}/community/?subtopic=guilds&world={}",
        base,
        query_value("world", world)?
    ))
}

/// Build highscores URL. An empty world means all worlds.
pub fn highscores_url(
    base: &str,
    world: &str,
    category: HighscoreCategory,
    vocation: VocationFilter,
    page: u32,
) -> Result<String> {
    Ok(format!(
        "{}/community/?subtopic=highscores&world={}&category={}&profession={}&currentpage={}",
        base,
        latin1_query_escape(world.trim())?,
        category.id(),
        vocation.id(),
        page
    ))
}

/// Build world overview URL
pub fn worlds_url(base: &str) -> String {
    format!("{}/community/?subtopic=worlds", base)
}

/// Build single world URL
pub fn world_url(base: &str, world: &str) -> Result<String> {
    Ok(format!(
        "{}/community/?subtopic=worlds&world={}",
        base,
        query_value("world", world)?
    ))
}

/// Build kill statistics URL
pub fn killstatistics_url(base: &str, world: &str) -> Result<String> {
    Ok(format!(
        "{}/community/?subtopic=killstatistics&world={}",
        base,
        query_value("world", world)?
    ))
}

/// Build news article URL
pub fn news_url(base: &str, id: u32) -> String {
    format!("{}/news/?subtopic=newsarchive&id={}", base, id)
}

/// Build spell library URL
pub fn spells_url(base: &str) -> String {
    format!("{}/library/?subtopic=spells", base)
}

/// Build creature library URL
pub fn creatures_url(base: &str) -> String {
    format!("{}/library/?subtopic=creatures", base)
}

/// Build house list URL for one town and house kind
pub fn houses_url(base: &str, world: &str, town: &str, kind: HouseKind) -> Result<String> {
    Ok(format!(
        "{}/community/?subtopic=houses&world={}&town={}&type={}",
        base,
        query_value("world", world)?,
        query_value("town", town)?,
        kind.query_value()
    ))
}

/// Build house detail URL
pub fn house_url(base: &str, world: &str, house_id: u32) -> Result<String> {
    Ok(format!(
        "{}/community/?subtopic=houses&page=view&world={}&houseid={}",
        base,
        query_value("world", world)?,
        house_id
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://www.tibia.com";

    #[test]
    fn test_character_url_latin1() {
        assert_eq!(
            character_url(BASE, "Näurin").unwrap(),
            "https://www.tibia.com/community/?subtopic=characters&name=N%E4urin"
        );
        assert_eq!(
            character_url(BASE, " Bubble ").unwrap(),
            "https://www.tibia.com/community/?subtopic=characters&name=Bubble"
        );
    }

    #[test]
    fn test_url_validation() {
        assert!(matches!(character_url(BASE, "  "), Err(ScrapeError::Validation(_))));
        assert!(matches!(guild_url(BASE, "Zoë ✓"), Err(ScrapeError::Encoding(_))));
    }

    #[test]
    fn test_highscores_url() {
        let url = highscores_url(
            BASE,
            "",
            HighscoreCategory::Experience,
            VocationFilter::All,
            3,
        )
        .unwrap();
        assert_eq!(
            url,
            "https://www.tibia.com/community/?subtopic=highscores&world=&category=6&profession=0&currentpage=3"
        );
    }

    #[test]
    fn test_house_urls() {
        assert_eq!(
            houses_url(BASE, "Antica", "Ab'Dendriel", HouseKind::Guildhall).unwrap(),
            "https://www.tibia.com/community/?subtopic=houses&world=Antica&town=Ab%27Dendriel&type=guildhalls"
        );
        assert_eq!(
            house_url(BASE, "Antica", 35006).unwrap(),
            "https://www.tibia.com/community/?subtopic=houses&page=view&world=Antica&houseid=35006"
        );
        assert_eq!(news_url(BASE, 6512), "https://www.tibia.com/news/?subtopic=newsarchive&id=6512");
    }
}
