//! HTML parsers for tibia.com pages, one per page type.

pub mod character;
pub mod creatures;
pub mod guild;
pub mod guilds;
pub mod highscores;
pub mod house;
pub mod houses;
pub mod killstatistics;
pub mod news;
pub mod spells;
pub mod world;
pub mod worlds;

pub use character::{CharacterPage, CharacterParser};
pub use creatures::{CreatureList, CreaturesParser};
pub use guild::{Guild, GuildParser};
pub use guilds::{GuildList, GuildsParser};
pub use highscores::{HighscoreCategory, HighscoresPage, HighscoresParser, VocationFilter};
pub use house::{HouseDetail, HouseParser};
pub use houses::{HouseKind, HouseList, HousesParser};
pub use killstatistics::{KillStatistics, KillStatisticsParser};
pub use news::{NewsArticle, NewsParser};
pub use spells::{SpellList, SpellsParser};
pub use world::{WorldDetail, WorldParser};
pub use worlds::{WorldsOverview, WorldsParser};
