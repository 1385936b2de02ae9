//! HTTP surface: the season query endpoint and the printable recording list.
use axum::{
    body::Bytes,
    extract::{rejection::QueryRejection, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing::{info, instrument, warn};

use crate::annict::AnnictService;
use crate::model::{self, SeasonProgramRow, SeasonSlug};
use crate::recording;
use crate::season::{self, FetchLimits};

const MSG_MISSING_PARAMS: &str = "year and season are required.";
const MSG_INVALID_YEAR: &str = "year must be an integer between 1970 and 2100.";
const MSG_INVALID_SEASON: &str = "season must be one of spring / summer / autumn / winter.";
const MSG_FETCH_FAILED: &str = "Failed to fetch season programs.";

#[derive(Clone)]
pub struct AppState {
    annict: Arc<dyn AnnictService>,
    access_token: Option<Arc<str>>,
    limits: FetchLimits,
    shutdown: CancellationToken,
}

impl AppState {
    pub fn new(
        annict: Arc<dyn AnnictService>,
        access_token: Option<String>,
        limits: FetchLimits,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            annict,
            access_token: access_token.map(Arc::from),
            limits,
            shutdown,
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/season", get(season_programs))
        .route("/api/recording-list", post(recording_sheet))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Raw query parameters; validated by [`validate_season_query`].
#[derive(Debug, Default, Deserialize)]
pub struct SeasonQuery {
    pub year: Option<String>,
    pub season: Option<String>,
}

/// Tagged body of `GET /api/season`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum SeasonApiResponse {
    Success { ok: bool, rows: Vec<SeasonProgramRow> },
    Failure { ok: bool, error: String },
}

impl SeasonApiResponse {
    pub fn success(rows: Vec<SeasonProgramRow>) -> Self {
        SeasonApiResponse::Success { ok: true, rows }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        SeasonApiResponse::Failure {
            ok: false,
            error: error.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("ANNICT_ACCESS_TOKEN is not configured.")]
    MissingCredential,
    #[error("{0}")]
    InvalidInput(&'static str),
    #[error("{0}")]
    Upstream(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingCredential => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ApiError::Upstream(_) => StatusCode::BAD_GATEWAY,
        }
    }

    fn message(&self) -> String {
        match self {
            ApiError::Upstream(msg) if msg.trim().is_empty() => MSG_FETCH_FAILED.to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(SeasonApiResponse::failure(self.message()))).into_response()
    }
}

/// Check presence, year range and season token, in that order.
pub fn validate_season_query(query: &SeasonQuery) -> Result<(i32, SeasonSlug), ApiError> {
    let (year, season) = match (query.year.as_deref(), query.season.as_deref()) {
        (Some(y), Some(s)) if !y.is_empty() && !s.is_empty() => (y, s),
        _ => return Err(ApiError::InvalidInput(MSG_MISSING_PARAMS)),
    };
    let year = model::parse_year(year).ok_or(ApiError::InvalidInput(MSG_INVALID_YEAR))?;
    let season = season
        .parse::<SeasonSlug>()
        .map_err(|_| ApiError::InvalidInput(MSG_INVALID_SEASON))?;
    Ok((year, season))
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

/// `GET /api/season?year=2024&season=autumn`
///
/// `year` must be a plain integer after trimming whitespace: trailing text such
/// as `2024abc` or `2024.0` is rejected rather than truncated to its prefix.
#[instrument(skip_all)]
async fn season_programs(
    State(state): State<AppState>,
    query: Result<Query<SeasonQuery>, QueryRejection>,
) -> Result<Json<SeasonApiResponse>, ApiError> {
    let token = state
        .access_token
        .clone()
        .ok_or(ApiError::MissingCredential)?;
    let Query(query) = query.map_err(|_| ApiError::InvalidInput(MSG_MISSING_PARAMS))?;
    let (year, season) = validate_season_query(&query)?;
    info!(year, %season, "season query");

    let cancel = state.shutdown.child_token();
    let rows = season::fetch_season_programs_with(
        state.annict.as_ref(),
        year,
        season,
        &token,
        &state.limits,
        &cancel,
    )
    .await
    .map_err(|err| {
        warn!(?err, year, %season, "season fetch failed");
        ApiError::Upstream(err.to_string())
    })?;

    Ok(Json(SeasonApiResponse::success(rows)))
}

/// `POST /api/recording-list` renders the selected rows as a printable page.
/// Only `items` is read; a body without readable items gets the empty page.
async fn recording_sheet(body: Bytes) -> Html<String> {
    let items = recording::load_items(std::str::from_utf8(&body).ok());
    if items.is_empty() {
        warn!(bytes = body.len(), "recording list body has no readable items");
    } else {
        info!(items = items.len(), "rendering recording list");
    }
    Html(recording::render_html(&items))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(year: Option<&str>, season: Option<&str>) -> SeasonQuery {
        SeasonQuery {
            year: year.map(str::to_string),
            season: season.map(str::to_string),
        }
    }

    #[test]
    fn missing_or_empty_params_are_rejected_first() {
        for q in [
            query(None, Some("spring")),
            query(Some("2024"), None),
            query(Some(""), Some("spring")),
            query(Some("abcd"), Some("")),
        ] {
            let err = validate_season_query(&q).unwrap_err();
            assert_eq!(err.to_string(), MSG_MISSING_PARAMS);
            assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        }
    }

    #[test]
    fn year_is_checked_before_season() {
        let err = validate_season_query(&query(Some("1969"), Some("fall"))).unwrap_err();
        assert_eq!(err.to_string(), MSG_INVALID_YEAR);
    }

    #[test]
    fn season_error_names_all_options() {
        let err = validate_season_query(&query(Some("2024"), Some("Spring"))).unwrap_err();
        let msg = err.to_string();
        for slug in SeasonSlug::ALL {
            assert!(msg.contains(slug.as_str()), "{msg}");
        }
    }

    #[test]
    fn valid_query() {
        let (year, season) = validate_season_query(&query(Some("2100"), Some("winter"))).unwrap();
        assert_eq!(year, 2100);
        assert_eq!(season, SeasonSlug::Winter);
    }

    #[test]
    fn error_statuses() {
        assert_eq!(ApiError::MissingCredential.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(ApiError::Upstream("x".into()).status(), StatusCode::BAD_GATEWAY);
        assert_eq!(ApiError::Upstream(" ".into()).message(), MSG_FETCH_FAILED);
    }

    #[test]
    fn failure_body_shape() {
        let v = serde_json::to_value(SeasonApiResponse::failure("boom")).unwrap();
        assert_eq!(v, json!({ "ok": false, "error": "boom" }));
        let v = serde_json::to_value(SeasonApiResponse::success(vec![])).unwrap();
        assert_eq!(v, json!({ "ok": true, "rows": [] }));
    }
}
