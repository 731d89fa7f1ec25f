//! CLI commands for tibia-api.
//!
//! Supports API server mode and offline parsing of saved pages.

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::path::PathBuf;

use crate::scraper::encoding::{decode_page, repair_mojibake};
use crate::scraper::parsers::{
    CharacterParser, CreaturesParser, GuildParser, GuildsParser, HighscoreCategory, HighscoresParser,
    HouseKind, HouseList, HouseParser, HousesParser, KillStatisticsParser, NewsParser, SpellsParser,
    WorldParser, WorldsParser,
};
use crate::scraper::HouseTable;
use crate::types::Envelope;

#[derive(Parser)]
#[command(name = "tibia-api")]
#[command(version, about = "Tibia.com data as a JSON API", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the API server
    Serve {
        /// Host to bind to
        #[arg(short = 'H', long)]
        host: Option<String>,

        /// Port to bind to
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Parse a saved tibia.com page and print the JSON response
    Parse {
        /// Page type of the file
        #[arg(value_enum)]
        page: PageType,

        /// Path to the saved HTML file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Undo one round of UTF-8-read-as-Latin-1 corruption before parsing
        #[arg(long)]
        repair_encoding: bool,

        #[command(flatten)]
        context: ParseContext,
    },
}

/// Page types understood by `parse`
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PageType {
    Character,
    Guild,
    Guilds,
    Highscores,
    Worlds,
    World,
    Killstatistics,
    News,
    Spells,
    Creatures,
    Houses,
    Guildhalls,
    House,
}

/// Values the page does not carry itself
#[derive(Debug, Clone, clap::Args)]
pub struct ParseContext {
    /// Character, guild or world name
    #[arg(short, long, default_value = "")]
    pub name: String,

    /// World name (empty for all worlds on highscores)
    #[arg(short, long, default_value = "")]
    pub world: String,

    /// Town name for house lists
    #[arg(short, long, default_value = "")]
    pub town: String,

    /// Highscore category
    #[arg(long, default_value = "experience")]
    pub category: String,

    /// Highscore vocation filter
    #[arg(long, default_value = "all")]
    pub vocation: String,

    /// Highscore page number
    #[arg(long = "page", id = "page_number", default_value_t = 1)]
    pub page_number: u32,

    /// News or house id
    #[arg(long, default_value_t = 0)]
    pub id: u32,
}

/// Parse a saved page without network access. House towns and types
/// stay empty because the house mapping is not loaded.
pub fn run_parse(page: PageType, input: PathBuf, repair_encoding: bool, context: ParseContext) -> anyhow::Result<()> {
    let bytes = std::fs::read(&input).with_context(|| format!("Failed to read {}", input.display()))?;
    let mut html = decode_page(&bytes);
    if repair_encoding {
        html = repair_mojibake(&html).context("File is not mis-decoded Latin-1 text")?;
    }

    eprintln!("Parsing {} as {:?}", input.display(), page);
    println!("{}", render_page(page, &html, &context)?);
    Ok(())
}

fn render_page(page: PageType, html: &str, ctx: &ParseContext) -> anyhow::Result<String> {
    let houses = HouseTable::empty();

    match page {
        PageType::Character => to_json(CharacterParser::parse(html, &ctx.name, &houses)?),
        PageType::Guild => to_json(GuildParser::parse(html, &ctx.name)?),
        PageType::Guilds => to_json(GuildsParser::parse(html, &ctx.world)?),
        PageType::Highscores => {
            let category: HighscoreCategory = ctx.category.parse()?;
            to_json(HighscoresParser::parse(html, &ctx.world, category, &ctx.vocation, ctx.page_number)?)
        }
        PageType::Worlds => to_json(WorldsParser::parse(html)?),
        PageType::World => to_json(WorldParser::parse(html, &ctx.name)?),
        PageType::Killstatistics => to_json(KillStatisticsParser::parse(html, &ctx.world)?),
        PageType::News => to_json(NewsParser::parse(html, ctx.id, "")?),
        PageType::Spells => to_json(SpellsParser::parse(html)?),
        PageType::Creatures => to_json(CreaturesParser::parse(html)?),
        PageType::Houses => to_json(HouseList::new(
            &ctx.world,
            &ctx.town,
            HousesParser::parse(html, HouseKind::House)?,
            Vec::new(),
        )),
        PageType::Guildhalls => to_json(HouseList::new(
            &ctx.world,
            &ctx.town,
            Vec::new(),
            HousesParser::parse(html, HouseKind::Guildhall)?,
        )),
        PageType::House => to_json(HouseParser::parse(html, &ctx.world, ctx.id, &houses)?),
    }
}

fn to_json<T: Serialize>(data: T) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(&Envelope::new(data))?)
}
