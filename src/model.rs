use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Earliest broadcast year accepted by the season query.
pub const MIN_YEAR: i32 = 1970;
/// Latest broadcast year accepted by the season query.
pub const MAX_YEAR: i32 = 2100;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SeasonSlug {
    Spring,
    Summer,
    Autumn,
    Winter,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Invalid season: {0}")]
pub struct InvalidSeason(pub String);

impl SeasonSlug {
    pub const ALL: [SeasonSlug; 4] = [
        SeasonSlug::Spring,
        SeasonSlug::Summer,
        SeasonSlug::Autumn,
        SeasonSlug::Winter,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SeasonSlug::Spring => "spring",
            SeasonSlug::Summer => "summer",
            SeasonSlug::Autumn => "autumn",
            SeasonSlug::Winter => "winter",
        }
    }

    /// Display label used on the listing and print pages.
    pub fn label(&self) -> &'static str {
        match self {
            SeasonSlug::Spring => "春アニメ",
            SeasonSlug::Summer => "夏アニメ",
            SeasonSlug::Autumn => "秋アニメ",
            SeasonSlug::Winter => "冬アニメ",
        }
    }

    pub fn months_label(&self) -> &'static str {
        match self {
            SeasonSlug::Spring => "4~6月",
            SeasonSlug::Summer => "7~9月",
            SeasonSlug::Autumn => "10~12月",
            SeasonSlug::Winter => "1~3月",
        }
    }
}

impl fmt::Display for SeasonSlug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SeasonSlug {
    type Err = InvalidSeason;

    /// Exact, case-sensitive match against the four wire tokens.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SeasonSlug::ALL
            .into_iter()
            .find(|slug| slug.as_str() == s)
            .ok_or_else(|| InvalidSeason(s.to_string()))
    }
}

/// Parse a caller-supplied year and check it against [`MIN_YEAR`]..=[`MAX_YEAR`].
pub fn parse_year(raw: &str) -> Option<i32> {
    raw.trim()
        .parse::<i32>()
        .ok()
        .filter(|year| (MIN_YEAR..=MAX_YEAR).contains(year))
}

/// One broadcast of one work on one channel.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub struct SeasonProgramRow {
    pub title: String,
    pub channel_name: String,
    /// ISO-8601 timestamp with offset, exactly as Annict returned it.
    pub started_at: String,
}
