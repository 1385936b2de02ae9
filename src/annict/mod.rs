use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::Serialize;
use serde_json::json;
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use crate::annict::model::{SearchWorks, SearchWorksResponse};
use crate::config;

pub mod model;

pub const ANNICT_GRAPHQL_ENDPOINT: &str = "https://api.annict.com/graphql";

/// Works of the requested seasons, each with up to 50 programs ordered by
/// start time.
pub const SEARCH_WORKS_QUERY: &str = r#"
  query SearchSeasonWorks($seasons: [String!], $first: Int, $after: String) {
    searchWorks(seasons: $seasons, first: $first, after: $after) {
      edges {
        node {
          annictId
          title
          programs(first: 50, orderBy: { field: STARTED_AT, direction: ASC }) {
            edges {
              node {
                startedAt
                channel {
                  name
                }
              }
            }
          }
        }
      }
      pageInfo {
        hasNextPage
        endCursor
      }
    }
  }
"#;

/// Failures of a season fetch. Every variant is reported to callers as an
/// upstream (gateway) failure.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Annict API error: {}", status_line(.0))]
    Status(StatusCode),
    #[error("Annict API request failed: {0}")]
    Transport(String),
    /// `data.searchWorks` missing; carries the GraphQL error messages.
    #[error("{0}")]
    Api(String),
    #[error("Malformed Annict response: {0}")]
    MalformedResponse(String),
    #[error("Annict pagination limit exceeded after {pages} pages ({rows} rows)")]
    PaginationLimit { pages: usize, rows: usize },
    #[error("Annict request timed out: {0}")]
    Timeout(&'static str),
    #[error("Season fetch was cancelled")]
    Cancelled,
}

/// `"<code> <reason>"`, or just the code when it has no registered reason.
fn status_line(status: &StatusCode) -> String {
    match status.canonical_reason() {
        Some(reason) => format!("{} {}", status.as_u16(), reason),
        None => status.as_u16().to_string(),
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout("page request")
        } else {
            FetchError::Transport(err.to_string())
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SearchWorksVariables {
    pub seasons: Vec<String>,
    pub first: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub after: Option<String>,
}

/// One `searchWorks` page request. The seam between pagination and transport.
#[async_trait]
pub trait AnnictService: Send + Sync {
    async fn search_works(
        &self,
        access_token: &str,
        variables: &SearchWorksVariables,
    ) -> Result<SearchWorks, FetchError>;
}

#[derive(Clone)]
pub struct AnnictClient {
    http: Client,
    endpoint: Url,
    request_timeout: Duration,
}

impl fmt::Debug for AnnictClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnnictClient")
            .field("endpoint", &self.endpoint)
            .field("request_timeout", &self.request_timeout)
            .finish_non_exhaustive()
    }
}

impl AnnictClient {
    pub fn from_config(cfg: &config::Annict) -> Result<Self> {
        let endpoint = cfg.endpoint_url()?;
        Self::with_endpoint(endpoint, &cfg.user_agent, cfg.request_timeout())
    }

    pub fn with_endpoint(
        endpoint: Url,
        user_agent: &str,
        request_timeout: Duration,
    ) -> Result<Self> {
        let http = Client::builder()
            .user_agent(user_agent)
            .no_proxy()
            .build()
            .context("failed to build reqwest client")?;
        Ok(Self {
            http,
            endpoint,
            request_timeout,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub fn build_request(
        &self,
        access_token: &str,
        variables: &SearchWorksVariables,
    ) -> Result<reqwest::Request, FetchError> {
        let body = json!({
            "query": SEARCH_WORKS_QUERY,
            "variables": variables,
        });
        self.http
            .post(self.endpoint.clone())
            .header("Authorization", format!("Bearer {}", access_token))
            .header("Content-Type", "application/json")
            .timeout(self.request_timeout)
            .json(&body)
            .build()
            .map_err(|err| FetchError::Transport(format!("failed to build request: {}", err)))
    }
}

#[async_trait]
impl AnnictService for AnnictClient {
    async fn search_works(
        &self,
        access_token: &str,
        variables: &SearchWorksVariables,
    ) -> Result<SearchWorks, FetchError> {
        let request = self.build_request(access_token, variables)?;
        debug!(
            url = %request.url(),
            seasons = ?variables.seasons,
            after = ?variables.after,
            "sending annict request"
        );

        let res = self.http.execute(request).await?;
        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            warn!(%status, body = %body, "annict returned non-success status");
            return Err(FetchError::Status(status));
        }

        let body = res.text().await?;
        decode_search_works(&body)
    }
}

/// Decode a 2xx GraphQL body into one `searchWorks` page.
///
/// A body without `data.searchWorks` is an API error carrying the joined
/// `errors[].message` values; a body that does not match the expected
/// shape at all is a malformed response.
pub fn decode_search_works(body: &str) -> Result<SearchWorks, FetchError> {
    let payload: SearchWorksResponse = serde_json::from_str(body)
        .map_err(|err| FetchError::MalformedResponse(err.to_string()))?;

    if let Some(page) = payload.data.and_then(|d| d.search_works) {
        return Ok(page);
    }

    let messages: Vec<String> = payload
        .errors
        .unwrap_or_default()
        .into_iter()
        .map(|e| e.message)
        .collect();
    if messages.is_empty() {
        warn!("annict response carried neither data nor errors");
        Err(FetchError::Api("Unknown API error".into()))
    } else {
        warn!(errors = ?messages, "annict returned GraphQL errors");
        Err(FetchError::Api(messages.join(", ")))
    }
}
