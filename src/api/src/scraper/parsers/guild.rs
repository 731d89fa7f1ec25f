//! Guild page parser for tibia.com.

use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

use crate::error::{Result, ScrapeError};
use crate::scraper::fragment::{match_first, Css, Fragment, Page};
use crate::scraper::scalars::{parse_date, parse_integer};
use crate::scraper::text::{html_to_text, sanitize, strip_linebreaks};

const ASSEMBLER: &str = "guild";

static HEADLINE: Css = Css::new("h1");
static INFORMATION: Css = Css::new("#GuildInformationContainer");
static LOGO: Css = Css::new("img");
static LINK: Css = Css::new("a");

static LINE_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<br\s*/?>").expect("line break pattern is valid"));
static FOUNDED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"The guild was founded on (.+?) on ([A-Za-z]+ [0-9]+ [0-9]{4})\.").expect("founded pattern is valid")
});
static GUILDHALL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Their home on (.+?) is (.+?)\. The rent is paid until ([A-Za-z]+ [0-9]+ [0-9]{4})\.")
        .expect("guildhall pattern is valid")
});
static HOMEPAGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"The official homepage is at <a href="([^"]+)""#).expect("homepage pattern is valid")
});
static DISBAND: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"It will be disbanded on ([A-Za-z]+ [0-9]+ [0-9]{4}) (.+?)\.").expect("disband pattern is valid")
});
static TITLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(([^)]*)\)\s*$").expect("member title pattern is valid"));

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Guild {
    pub name: String,
    pub world: String,
    pub logo_url: String,
    pub description: String,
    pub guildhalls: Vec<Guildhall>,
    pub active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub founded: Option<NaiveDate>,
    pub open_applications: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub homepage: Option<String>,
    pub in_war: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disband_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disband_condition: Option<String>,
    pub players_online: u32,
    pub players_offline: u32,
    pub members_total: u32,
    pub members_invited: u32,
    pub members: Vec<GuildMember>,
    pub invites: Vec<GuildInvite>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Guildhall {
    pub name: String,
    pub world: String,
    pub paid_until: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct GuildMember {
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub title: String,
    pub rank: String,
    pub vocation: String,
    pub level: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub joined: Option<NaiveDate>,
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GuildInvite {
    pub name: String,
    pub date: NaiveDate,
}

/// Parser for guild pages
pub struct GuildParser;

impl GuildParser {
    pub fn parse(html: &str, name: &str) -> Result<Guild> {
        let page = Page::parse(html);

        let mut guild = Guild {
            name: page.find_section(&HEADLINE).map(|h| h.text()).unwrap_or_default(),
            ..Default::default()
        };
        if guild.name.is_empty() {
            return Err(ScrapeError::NotFound(format!("guild {}", name)));
        }

        let information = page
            .find_section(&INFORMATION)
            .map_err(|e| e.required_by(ASSEMBLER))?;
        Self::parse_information(&information, &mut guild)?;

        if let Ok(table) = page.table_by_caption("Guild Members") {
            guild.members = Self::parse_members(&table);
        }
        if let Ok(table) = page.table_by_caption("Invited Characters") {
            guild.invites = Self::parse_invites(&table);
        }

        guild.members_total = guild.members.len() as u32;
        guild.members_invited = guild.invites.len() as u32;
        guild.players_online = guild.members.iter().filter(|m| m.status == "online").count() as u32;
        guild.players_offline = guild.members_total - guild.players_online;

        Ok(guild)
    }

    fn parse_information(information: &Fragment, guild: &mut Guild) -> Result<()> {
        let html = strip_linebreaks(&information.inner_html());
        let text = html_to_text(&LINE_BREAK.replace_all(&html, " "));

        guild.logo_url = information
            .find_section(&LOGO)
            .ok()
            .and_then(|img| img.attr("src"))
            .unwrap_or_default()
            .to_string();

        guild.description = text
            .split_once("The guild was founded")
            .map(|(description, _)| description.trim().to_string())
            .unwrap_or_default();

        if let Some(caps) = match_first(&text, &FOUNDED) {
            guild.world = caps[0].clone();
            guild.founded = Some(parse_date(&caps[1])?);
        }

        guild.active = text.contains("It is currently active");
        guild.open_applications = text.contains("opened for applications");
        guild.in_war = text.contains("currently at war");

        if let Some(caps) = match_first(&text, &GUILDHALL) {
            guild.guildhalls.push(Guildhall {
                world: caps[0].clone(),
                name: caps[1].clone(),
                paid_until: parse_date(&caps[2])?,
            });
        }

        guild.homepage = match_first(&html, &HOMEPAGE).map(|caps| sanitize(&caps[0]));

        if let Some(caps) = match_first(&text, &DISBAND) {
            guild.disband_date = Some(parse_date(&caps[0])?);
            guild.disband_condition = Some(caps[1].clone());
        }

        Ok(())
    }

    fn parse_members(table: &Fragment) -> Vec<GuildMember> {
        let mut members = Vec::new();
        let mut rank = String::new();

        for cells in table.rows() {
            if cells.len() < 6 {
                continue;
            }
            let Some(link) = cells[1].find_section(&LINK).ok() else {
                // Header row
                continue;
            };

            // Only the first member of each rank has the rank cell filled.
            let rank_text = cells[0].text();
            if !rank_text.is_empty() {
                rank = rank_text;
            }

            let title = match_first(&cells[1].text(), &TITLE)
                .map(|caps| caps[0].clone())
                .unwrap_or_default();

            members.push(GuildMember {
                name: link.text(),
                title,
                rank: rank.clone(),
                vocation: cells[2].text(),
                level: parse_integer(&cells[3].text()) as u32,
                joined: parse_date(&cells[4].text()).ok(),
                status: cells[5].text(),
            });
        }

        members
    }

    fn parse_invites(table: &Fragment) -> Vec<GuildInvite> {
        table
            .rows()
            .into_iter()
            .filter(|cells| cells.len() >= 2)
            .filter_map(|cells| {
                let link = cells[0].find_section(&LINK).ok()?;
                Some(GuildInvite {
                    name: link.text(),
                    date: parse_date(&cells[1].text()).ok()?,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(caption: &str, rows: &str) -> String {
        format!(
            r#"<div class="TableContainer">
<div class="CaptionContainer"><div class="Text">{caption}</div></div>
<table class="TableContent">{rows}</table></div>"#
        )
    }

    fn guild_html(information: &str, invites: &str) -> String {
        let members = table(
            "Guild Members",
            r#"
<tr class="LabelH"><td>Rank</td><td>Name and Title</td><td>Vocation</td><td>Level</td><td>Joining Date</td><td>Status</td></tr>
<tr><td>Leader</td><td><a href="https://www.tibia.com/community/?subtopic=characters&amp;name=Bubble">Bubble</a> (The Boss)</td><td>Elite Knight</td><td>512</td><td>Jan&#160;02&#160;2007</td><td class="onlinetext"><span class="green"><b>online</b></span></td></tr>
<tr><td>Vice Leader</td><td><a href="https://www.tibia.com/community/?subtopic=characters&amp;name=Alice">Alice</a></td><td>Elder Druid</td><td>300</td><td>Feb&#160;10&#160;2010</td><td>offline</td></tr>
<tr><td>&#160;</td><td><a href="https://www.tibia.com/community/?subtopic=characters&amp;name=Carol">Carol</a></td><td>Master Sorcerer</td><td>250</td><td>Mar&#160;11&#160;2012</td><td>offline</td></tr>
"#,
        );
        format!(
            r#"<html><body><div class="BoxContent">
<h1>Red Rose</h1>
<div id="GuildInformationContainer">{information}</div>
{members}
{}
</div></body></html>"#,
            table("Invited Characters", invites)
        )
    }

    const INFORMATION_HTML: &str = r#"<img src="https://static.tibia.com/images/guildlogos/Red_Rose.gif" width="64" height="64"/>
The Red Rose is a guild of knights.<br/>Join us!<br/><br/>
The guild was founded on Antica on Jan&#160;02&#160;2007.<br/>It is currently active and opened for applications.<br/>
Their home on Antica is Guildhall of the Red Rose. The rent is paid until Jan&#160;10&#160;2022.<br/>
The official homepage is at <a href="https://redrose.example.com" target="_blank">redrose.example.com</a>.<br/>"#;

    const INVITES_HTML: &str = r#"
<tr class="LabelH"><td>Name</td><td>Invitation Date</td></tr>
<tr><td><a href="https://www.tibia.com/community/?subtopic=characters&amp;name=Newbie">Newbie</a></td><td>Jan&#160;05&#160;2022</td></tr>
"#;

    #[test]
    fn test_parse_guild_information() {
        let guild = GuildParser::parse(&guild_html(INFORMATION_HTML, INVITES_HTML), "Red Rose").unwrap();

        assert_eq!(guild.name, "Red Rose");
        assert_eq!(guild.world, "Antica");
        assert_eq!(guild.logo_url, "https://static.tibia.com/images/guildlogos/Red_Rose.gif");
        assert_eq!(guild.description, "The Red Rose is a guild of knights. Join us!");
        assert_eq!(guild.founded, NaiveDate::from_ymd_opt(2007, 1, 2));
        assert!(guild.active);
        assert!(guild.open_applications);
        assert!(!guild.in_war);
        assert_eq!(guild.homepage.as_deref(), Some("https://redrose.example.com"));
        assert_eq!(
            guild.guildhalls,
            vec![Guildhall {
                name: "Guildhall of the Red Rose".to_string(),
                world: "Antica".to_string(),
                paid_until: NaiveDate::from_ymd_opt(2022, 1, 10).unwrap(),
            }]
        );
        assert!(guild.disband_date.is_none());
    }

    #[test]
    fn test_parse_members_carries_rank() {
        let guild = GuildParser::parse(&guild_html(INFORMATION_HTML, INVITES_HTML), "Red Rose").unwrap();

        assert_eq!(guild.members.len(), 3);
        assert_eq!(guild.members[0].name, "Bubble");
        assert_eq!(guild.members[0].title, "The Boss");
        assert_eq!(guild.members[0].status, "online");
        assert_eq!(guild.members[0].joined, NaiveDate::from_ymd_opt(2007, 1, 2));
        assert_eq!(guild.members[1].title, "");
        assert_eq!(guild.members[2].name, "Carol");
        assert_eq!(guild.members[2].rank, "Vice Leader");
        assert_eq!(guild.members[2].level, 250);

        assert_eq!(guild.members_total, 3);
        assert_eq!(guild.players_online, 1);
        assert_eq!(guild.players_offline, 2);

        assert_eq!(
            guild.invites,
            vec![GuildInvite {
                name: "Newbie".to_string(),
                date: NaiveDate::from_ymd_opt(2022, 1, 5).unwrap(),
            }]
        );
        assert_eq!(guild.members_invited, 1);
    }

    #[test]
    fn test_guild_in_formation_with_disband_warning() {
        let information = r#"The guild was founded on Antica on Jan&#160;02&#160;2022.<br/>It is currently in formation.<br/><b>It will be disbanded on Jan&#160;20&#160;2022 if there are still less than four vice leaders or an insufficient amount of premium accounts in the leading ranks by then.</b>"#;
        let guild = GuildParser::parse(&guild_html(information, ""), "Red Rose").unwrap();

        assert!(!guild.active);
        assert!(guild.description.is_empty());
        assert!(guild.guildhalls.is_empty());
        assert!(guild.invites.is_empty());
        assert_eq!(guild.disband_date, NaiveDate::from_ymd_opt(2022, 1, 20));
        assert!(guild.disband_condition.unwrap().starts_with("if there are still less than four"));
    }

    #[test]
    fn test_unknown_guild_is_not_found() {
        let html = "<html><body><div class=\"BoxContent\">An internal error has occurred.</div></body></html>";
        assert!(matches!(
            GuildParser::parse(html, "Nobody"),
            Err(ScrapeError::NotFound(msg)) if msg == "guild Nobody"
        ));
    }

    #[test]
    fn test_missing_information_is_shape_mismatch() {
        let html = "<html><body><h1>Red Rose</h1></body></html>";
        assert!(matches!(
            GuildParser::parse(html, "Red Rose"),
            Err(ScrapeError::ParseShapeMismatch { assembler: "guild", .. })
        ));
    }
}
