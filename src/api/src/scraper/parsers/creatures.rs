//! Creature library parser: the boosted creature and the creature list.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

use crate::error::{Result, ScrapeError};
use crate::scraper::fragment::{match_first, Css, Fragment, Page};

const ASSEMBLER: &str = "creatures";

static BOOSTED: Css = Css::new(r#"img[title^="Today's boosted creature"]"#);
static CREATURE: Css = Css::new(".Creatures a");
static IMAGE: Css = Css::new("img");

static RACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"race=([a-z0-9]+)").expect("race pattern is valid"));

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CreatureList {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub boosted: Option<Creature>,
    pub creatures: Vec<Creature>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Creature {
    pub name: String,
    pub race: String,
    pub image_url: String,
    pub featured: bool,
}

/// Parser for the creature library
pub struct CreaturesParser;

impl CreaturesParser {
    pub fn parse(html: &str) -> Result<CreatureList> {
        let page = Page::parse(html);

        let mut creatures: Vec<Creature> = page
            .find_all(&CREATURE)
            .iter()
            .map(Self::parse_creature)
            .filter(|creature| !creature.name.is_empty())
            .collect();
        if creatures.is_empty() {
            return Err(ScrapeError::shape(ASSEMBLER, CREATURE.source()));
        }

        let boosted = page.find_section(&BOOSTED).ok().map(|img| {
            let name = img
                .attr("title")
                .unwrap_or_default()
                .trim_start_matches("Today's boosted creature:")
                .trim()
                .to_string();
            let image_url = img.attr("src").unwrap_or_default().to_string();
            let race = creatures
                .iter()
                .find(|creature| creature.name == name)
                .map(|creature| creature.race.clone())
                .unwrap_or_default();
            Creature {
                name,
                race,
                image_url,
                featured: true,
            }
        });

        if let Some(boosted) = &boosted {
            for creature in creatures.iter_mut() {
                creature.featured = creature.name == boosted.name;
            }
        }

        Ok(CreatureList { boosted, creatures })
    }

    fn parse_creature(link: &Fragment) -> Creature {
        Creature {
            name: link.text(),
            race: link
                .attr("href")
                .and_then(|href| match_first(href, &RACE))
                .map(|caps| caps[0].clone())
                .unwrap_or_default(),
            image_url: link
                .find_section(&IMAGE)
                .ok()
                .and_then(|img| img.attr("src"))
                .unwrap_or_default()
                .to_string(),
            featured: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn creature(race: &str, name: &str) -> String {
        format!(
            r#"<div class="Creatures"><a href="https://www.tibia.com/library/?subtopic=creatures&amp;race={race}"><div class="CreatureImage"><img src="https://static.tibia.com/images/library/{race}.gif" border="0"/></div><div>{name}</div></a></div>"#
        )
    }

    fn creatures_html(boosted: &str) -> String {
        format!(
            r#"<html><body>{boosted}<div class="CreatureList">{}{}{}</div></body></html>"#,
            creature("dragonlord", "Dragon Lords"),
            creature("rat", "Rats"),
            creature("demon", "Demons"),
        )
    }

    #[test]
    fn test_parse_creatures_with_boosted() {
        let boosted = r#"<img id="Monster" src="https://static.tibia.com/images/global/header/monsters/rat.gif" title="Today's boosted creature: Rats"/>"#;
        let list = CreaturesParser::parse(&creatures_html(boosted)).unwrap();

        assert_eq!(list.creatures.len(), 3);
        assert_eq!(
            list.creatures[0],
            Creature {
                name: "Dragon Lords".to_string(),
                race: "dragonlord".to_string(),
                image_url: "https://static.tibia.com/images/library/dragonlord.gif".to_string(),
                featured: false,
            }
        );
        assert!(list.creatures[1].featured);

        let boosted = list.boosted.unwrap();
        assert_eq!(boosted.name, "Rats");
        assert_eq!(boosted.race, "rat");
        assert_eq!(boosted.image_url, "https://static.tibia.com/images/global/header/monsters/rat.gif");
    }

    #[test]
    fn test_boosted_is_optional() {
        let list = CreaturesParser::parse(&creatures_html("")).unwrap();
        assert!(list.boosted.is_none());
        assert!(list.creatures.iter().all(|c| !c.featured));
    }

    #[test]
    fn test_empty_library_is_shape_mismatch() {
        assert!(matches!(
            CreaturesParser::parse("<html><body></body></html>"),
            Err(ScrapeError::ParseShapeMismatch { assembler: "creatures", .. })
        ));
    }
}
