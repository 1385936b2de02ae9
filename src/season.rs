//! Season retrieval: paginate `searchWorks`, flatten works into program rows,
//! and order them by broadcast start.
use chrono::{DateTime, FixedOffset};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};

use crate::annict::model::WorkEdge;
use crate::annict::{AnnictService, FetchError, SearchWorksVariables};
use crate::config;
use crate::model::{SeasonProgramRow, SeasonSlug};

/// Bounds applied to a single season fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchLimits {
    pub page_size: u32,
    pub max_pages: usize,
    pub max_rows: usize,
    pub deadline: Option<Duration>,
}

impl Default for FetchLimits {
    fn default() -> Self {
        FetchLimits::from(&config::Annict::default())
    }
}

impl From<&config::Annict> for FetchLimits {
    fn from(cfg: &config::Annict) -> Self {
        Self {
            page_size: cfg.page_size,
            max_pages: cfg.max_pages,
            max_rows: cfg.max_rows,
            deadline: Some(cfg.fetch_deadline()),
        }
    }
}

/// Annict season identifier, e.g. `2024-autumn`.
pub fn season_identifier(year: i32, season: SeasonSlug) -> String {
    format!("{}-{}", year, season.as_str())
}

/// Fetch every program of a season with default limits and no external
/// cancellation.
pub async fn fetch_season_programs(
    annict: &dyn AnnictService,
    year: i32,
    season: SeasonSlug,
    access_token: &str,
) -> Result<Vec<SeasonProgramRow>, FetchError> {
    fetch_season_programs_with(
        annict,
        year,
        season,
        access_token,
        &FetchLimits::default(),
        &CancellationToken::new(),
    )
    .await
}

/// Fetch every program of a season, sorted ascending by `startedAt`.
/// Programs starting at the same instant keep the order Annict returned them.
#[instrument(skip_all, fields(year = year, season = %season))]
pub async fn fetch_season_programs_with(
    annict: &dyn AnnictService,
    year: i32,
    season: SeasonSlug,
    access_token: &str,
    limits: &FetchLimits,
    cancel: &CancellationToken,
) -> Result<Vec<SeasonProgramRow>, FetchError> {
    let season_id = season_identifier(year, season);
    let collect = collect_pages(annict, &season_id, access_token, limits);
    let bounded = async {
        match limits.deadline {
            Some(deadline) => match tokio::time::timeout(deadline, collect).await {
                Ok(res) => res,
                Err(_) => Err(FetchError::Timeout("season fetch deadline")),
            },
            None => collect.await,
        }
    };

    let mut timed = tokio::select! {
        biased;
        _ = cancel.cancelled() => return Err(FetchError::Cancelled),
        res = bounded => res?,
    };

    timed.sort_by_key(|(at, _)| *at);
    Ok(timed.into_iter().map(|(_, row)| row).collect())
}

type TimedRow = (DateTime<FixedOffset>, SeasonProgramRow);

async fn collect_pages(
    annict: &dyn AnnictService,
    season_id: &str,
    access_token: &str,
    limits: &FetchLimits,
) -> Result<Vec<TimedRow>, FetchError> {
    let mut rows: Vec<TimedRow> = Vec::new();
    let mut after: Option<String> = None;
    let mut pages = 0usize;

    loop {
        if pages >= limits.max_pages {
            return Err(FetchError::PaginationLimit {
                pages,
                rows: rows.len(),
            });
        }

        let variables = SearchWorksVariables {
            seasons: vec![season_id.to_string()],
            first: limits.page_size,
            after: after.take(),
        };
        let page = annict.search_works(access_token, &variables).await?;
        pages += 1;

        let works = page.edges.len();
        flatten_works(page.edges, &mut rows)?;
        debug!(page = pages, works, rows = rows.len(), "annict page received");

        if rows.len() > limits.max_rows {
            return Err(FetchError::PaginationLimit {
                pages,
                rows: rows.len(),
            });
        }

        match page.page_info.next_cursor() {
            Some(cursor) => after = Some(cursor.to_string()),
            None => break,
        }
    }

    info!(pages, rows = rows.len(), "season fetch complete");
    Ok(rows)
}

/// Emit one row per (work, program) pair, in the order given.
fn flatten_works(edges: Vec<WorkEdge>, out: &mut Vec<TimedRow>) -> Result<(), FetchError> {
    for edge in edges {
        let work = edge.node;
        for program in work.programs.edges {
            let program = program.node;
            let at = DateTime::parse_from_rfc3339(&program.started_at).map_err(|err| {
                FetchError::MalformedResponse(format!(
                    "invalid startedAt {:?} for work {}: {}",
                    program.started_at, work.annict_id, err
                ))
            })?;
            out.push((
                at,
                SeasonProgramRow {
                    title: work.title.clone(),
                    channel_name: program.channel.name,
                    started_at: program.started_at,
                },
            ));
        }
    }
    Ok(())
}
