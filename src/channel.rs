//! Broadcast channel grouping: nationwide networks (plus TOKYO MX), local
//! stations, and satellite/cable/streaming.
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::model::SeasonProgramRow;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum ChannelCategory {
    National,
    Local,
    Other,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Invalid channel category: {0} (expected national / local / other)")]
pub struct InvalidCategory(pub String);

/// Matched first; any channel containing one of these is national.
const NATIONAL_KEYWORDS: &[&str] = &[
    "日本テレビ",
    "NTV",
    "TBS",
    "テレビ朝日",
    "TV朝日",
    "フジテレビ",
    "フジ",
    "テレビ東京",
    "テレ東",
    "TV東京",
    "TOKYO MX",
    "東京MX",
    "MX",
    "NHK総合",
    "NHK Eテレ",
    "NHK教育",
    "NHK・総合",
    "NHK・Eテレ",
];

/// BS/CS and streaming services.
const OTHER_KEYWORDS: &[&str] = &[
    "BS",
    "CS",
    "アニマックス",
    "アニメシアター",
    "キッズステーション",
    "dアニメ",
    "dアニメストア",
    "Abema",
    "ABEMA",
    "Netflix",
    "Amazon",
    "U-NEXT",
    "バンダイチャンネル",
    "YouTube",
    "Youtube",
    "配信",
    "ネット",
    "Disney",
    "ディズニー",
    "Hulu",
    "ひかりTV",
    "テレ朝",
    "BS日テレ",
    "BSフジ",
    "BS11",
    "WOWOW",
    "AT-X",
    "ニコニコ",
    "ニコニコ動画",
];

impl ChannelCategory {
    /// Display order on the listing page.
    pub const ORDER: [ChannelCategory; 3] = [
        ChannelCategory::National,
        ChannelCategory::Local,
        ChannelCategory::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ChannelCategory::National => "national",
            ChannelCategory::Local => "local",
            ChannelCategory::Other => "other",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ChannelCategory::National => "全国ネット＋TOKYO MX",
            ChannelCategory::Local => "地方局",
            ChannelCategory::Other => "その他放送",
        }
    }
}

impl fmt::Display for ChannelCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChannelCategory {
    type Err = InvalidCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ChannelCategory::ORDER
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| InvalidCategory(s.to_string()))
    }
}

/// Classify a channel name. National keywords win over other keywords;
/// anything unmatched is a local station.
pub fn classify(channel_name: &str) -> ChannelCategory {
    let name = channel_name.trim();
    if NATIONAL_KEYWORDS.iter().any(|kw| name.contains(kw)) {
        return ChannelCategory::National;
    }
    if OTHER_KEYWORDS.iter().any(|kw| name.contains(kw)) {
        return ChannelCategory::Other;
    }
    ChannelCategory::Local
}

/// Channel names bucketed by category, each bucket sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChannelGroups {
    pub national: Vec<String>,
    pub local: Vec<String>,
    pub other: Vec<String>,
}

impl ChannelGroups {
    pub fn get(&self, category: ChannelCategory) -> &[String] {
        match category {
            ChannelCategory::National => &self.national,
            ChannelCategory::Local => &self.local,
            ChannelCategory::Other => &self.other,
        }
    }

    /// Non-empty groups in display order.
    pub fn iter(&self) -> impl Iterator<Item = (ChannelCategory, &[String])> {
        ChannelCategory::ORDER
            .into_iter()
            .map(move |c| (c, self.get(c)))
            .filter(|(_, names)| !names.is_empty())
    }
}

pub fn group_by_category<I, S>(channel_names: I) -> ChannelGroups
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut groups = ChannelGroups::default();
    for name in channel_names {
        let name = name.into();
        match classify(&name) {
            ChannelCategory::National => groups.national.push(name),
            ChannelCategory::Local => groups.local.push(name),
            ChannelCategory::Other => groups.other.push(name),
        }
    }
    groups.national.sort();
    groups.local.sort();
    groups.other.sort();
    groups
}

/// Distinct channel names appearing in `rows`, sorted.
pub fn channel_names(rows: &[SeasonProgramRow]) -> Vec<String> {
    rows.iter()
        .map(|r| r.channel_name.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(channel: &str) -> SeasonProgramRow {
        SeasonProgramRow {
            title: "t".into(),
            channel_name: channel.into(),
            started_at: "2024-10-01T00:00:00Z".into(),
        }
    }

    #[test]
    fn classify_by_keyword() {
        assert_eq!(classify("TOKYO MX"), ChannelCategory::National);
        assert_eq!(classify("  NHK総合 "), ChannelCategory::National);
        assert_eq!(classify("テレビ東京"), ChannelCategory::National);
        assert_eq!(classify("AT-X"), ChannelCategory::Other);
        assert_eq!(classify("BS11"), ChannelCategory::Other);
        assert_eq!(classify("dアニメストア"), ChannelCategory::Other);
        assert_eq!(classify("テレビ愛知"), ChannelCategory::Local);
        assert_eq!(classify("サンテレビ"), ChannelCategory::Local);
    }

    #[test]
    fn national_keywords_take_precedence() {
        // "BSフジ" hits both lists; national is checked first.
        assert_eq!(classify("BSフジ"), ChannelCategory::National);
    }

    #[test]
    fn groups_are_sorted_and_ordered() {
        let groups = group_by_category(["BS11", "TOKYO MX", "AT-X", "サンテレビ", "TBS"]);
        assert_eq!(groups.national, vec!["TBS", "TOKYO MX"]);
        assert_eq!(groups.local, vec!["サンテレビ"]);
        assert_eq!(groups.other, vec!["AT-X", "BS11"]);

        let order: Vec<_> = groups.iter().map(|(c, _)| c).collect();
        assert_eq!(order, ChannelCategory::ORDER.to_vec());
    }

    #[test]
    fn iter_skips_empty_groups() {
        let groups = group_by_category(["AT-X"]);
        let order: Vec<_> = groups.iter().map(|(c, _)| c).collect();
        assert_eq!(order, vec![ChannelCategory::Other]);
        assert!(groups.get(ChannelCategory::National).is_empty());
    }

    #[test]
    fn channel_names_are_distinct_and_sorted() {
        let rows = vec![row("b"), row("a"), row("b")];
        assert_eq!(channel_names(&rows), vec!["a", "b"]);
    }

    #[test]
    fn category_parses_wire_token() {
        assert_eq!("local".parse::<ChannelCategory>().unwrap(), ChannelCategory::Local);
        assert!("Local".parse::<ChannelCategory>().is_err());
    }
}
