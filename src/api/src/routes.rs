//! API route handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;

use crate::config::AppConfig;
use crate::error::ScrapeError;
use crate::scraper::parsers::{
    CharacterPage, CharacterParser, CreatureList, CreaturesParser, Guild, GuildList, GuildParser,
    GuildsParser, HighscoreCategory, HighscoresPage, HighscoresParser, HouseDetail, HouseKind,
    HouseList, HouseParser, HousesParser, KillStatistics, KillStatisticsParser, NewsArticle,
    NewsParser, SpellList, SpellsParser, VocationFilter, WorldDetail, WorldParser, WorldsOverview,
    WorldsParser,
};
use crate::scraper::{self, Fetcher, HouseTable};
use crate::types::{Envelope, ErrorResponse, HealthResponse};

/// World name that selects the all-worlds highscores
const ALL_WORLDS: &str = "all";

/// Application state shared across handlers.
pub struct AppState {
    pub config: AppConfig,
    pub fetcher: Fetcher,
    pub houses: HouseTable,
}

impl AppState {
    fn base_url(&self) -> &str {
        &self.config.upstream.base_url
    }
}

/// Error type for API handlers.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    kind: &'static str,
    message: String,
}

impl ApiError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            kind: "not_found",
            message: msg.into(),
        }
    }
}

impl From<ScrapeError> for ApiError {
    fn from(err: ScrapeError) -> Self {
        let status = match &err {
            ScrapeError::NotFound(_) => StatusCode::NOT_FOUND,
            ScrapeError::Validation(_) | ScrapeError::Encoding(_) => StatusCode::BAD_REQUEST,
            ScrapeError::Maintenance | ScrapeError::ReferenceDataUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            ScrapeError::ParseShapeMismatch { .. }
            | ScrapeError::DateTime(_)
            | ScrapeError::Upstream(_)
            | ScrapeError::UpstreamStatus(_) => StatusCode::BAD_GATEWAY,
        };
        Self {
            status,
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::warn!("{} ({}): {}", self.status, self.kind, self.message);
        }
        let body = Json(ErrorResponse::new(self.status.as_u16(), self.kind, self.message));
        (self.status, body).into_response()
    }
}

type ApiResult<T> = Result<Json<Envelope<T>>, ApiError>;

fn respond<T: serde::Serialize>(data: T) -> ApiResult<T> {
    Ok(Json(Envelope::new(data)))
}

/// Numeric path segment, rejected with a validation error.
fn parse_number(field: &str, value: &str) -> Result<u32, ScrapeError> {
    value
        .parse()
        .map_err(|_| ScrapeError::Validation(format!("{} must be a positive number, got {:?}", field, value)))
}

/// Health check endpoint.
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        reference_data: match state.houses.ensure_available() {
            Ok(()) => "available",
            Err(_) => "unavailable",
        }
        .to_string(),
        houses: state.houses.len(),
    })
}

/// Any path without a route.
pub async fn fallback() -> ApiError {
    ApiError::not_found("no such endpoint")
}

pub async fn character(State(state): State<Arc<AppState>>, Path(name): Path<String>) -> ApiResult<CharacterPage> {
    let url = scraper::character_url(state.base_url(), &name)?;
    let html = state.fetcher.fetch(&url).await?;
    respond(CharacterParser::parse(&html, &name, &state.houses)?)
}

pub async fn guild(State(state): State<Arc<AppState>>, Path(name): Path<String>) -> ApiResult<Guild> {
    let url = scraper::guild_url(state.base_url(), &name)?;
    let html = state.fetcher.fetch(&url).await?;
    respond(GuildParser::parse(&html, &name)?)
}

pub async fn guilds(State(state): State<Arc<AppState>>, Path(world): Path<String>) -> ApiResult<GuildList> {
    let url = scraper::guilds_url(state.base_url(), &world)?;
    let html = state.fetcher.fetch(&url).await?;
    respond(GuildsParser::parse(&html, &world)?)
}

pub async fn highscores(
    State(state): State<Arc<AppState>>,
    Path((world, category, vocation, page)): Path<(String, String, String, String)>,
) -> ApiResult<HighscoresPage> {
    let category: HighscoreCategory = category.parse()?;
    let filter: VocationFilter = vocation.parse()?;
    let page = parse_number("page", &page)?;
    let world = if world.eq_ignore_ascii_case(ALL_WORLDS) {
        String::new()
    } else {
        world
    };

    let url = scraper::highscores_url(state.base_url(), &world, category, filter, page)?;
    let html = state.fetcher.fetch(&url).await?;
    respond(HighscoresParser::parse(&html, &world, category, &vocation, page)?)
}

pub async fn worlds(State(state): State<Arc<AppState>>) -> ApiResult<WorldsOverview> {
    let html = state.fetcher.fetch(&scraper::worlds_url(state.base_url())).await?;
    respond(WorldsParser::parse(&html)?)
}

pub async fn world(State(state): State<Arc<AppState>>, Path(name): Path<String>) -> ApiResult<WorldDetail> {
    let url = scraper::world_url(state.base_url(), &name)?;
    let html = state.fetcher.fetch(&url).await?;
    respond(WorldParser::parse(&html, &name)?)
}

pub async fn killstatistics(
    State(state): State<Arc<AppState>>,
    Path(world): Path<String>,
) -> ApiResult<KillStatistics> {
    let url = scraper::killstatistics_url(state.base_url(), &world)?;
    let html = state.fetcher.fetch(&url).await?;
    respond(KillStatisticsParser::parse(&html, &world)?)
}

pub async fn news(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> ApiResult<NewsArticle> {
    let id = parse_number("news id", &id)?;
    let url = scraper::news_url(state.base_url(), id);
    let html = state.fetcher.fetch(&url).await?;
    respond(NewsParser::parse(&html, id, &url)?)
}

pub async fn spells(State(state): State<Arc<AppState>>) -> ApiResult<SpellList> {
    let html = state.fetcher.fetch(&scraper::spells_url(state.base_url())).await?;
    respond(SpellsParser::parse(&html)?)
}

pub async fn creatures(State(state): State<Arc<AppState>>) -> ApiResult<CreatureList> {
    let html = state.fetcher.fetch(&scraper::creatures_url(state.base_url())).await?;
    respond(CreaturesParser::parse(&html)?)
}

/// Houses and guildhalls of a town, fetched concurrently.
pub async fn houses(
    State(state): State<Arc<AppState>>,
    Path((world, town)): Path<(String, String)>,
) -> ApiResult<HouseList> {
    let houses_url = scraper::houses_url(state.base_url(), &world, &town, HouseKind::House)?;
    let guildhalls_url = scraper::houses_url(state.base_url(), &world, &town, HouseKind::Guildhall)?;

    let (houses_html, guildhalls_html) =
        tokio::try_join!(state.fetcher.fetch(&houses_url), state.fetcher.fetch(&guildhalls_url))?;

    respond(HouseList::new(
        &world,
        &town,
        HousesParser::parse(&houses_html, HouseKind::House)?,
        HousesParser::parse(&guildhalls_html, HouseKind::Guildhall)?,
    ))
}

pub async fn house(
    State(state): State<Arc<AppState>>,
    Path((world, id)): Path<(String, String)>,
) -> ApiResult<HouseDetail> {
    let id = parse_number("house id", &id)?;
    let url = scraper::house_url(state.base_url(), &world, id)?;
    let html = state.fetcher.fetch(&url).await?;
    respond(HouseParser::parse(&html, &world, id, &state.houses)?)
}
