//! Channel filtering and row selection ahead of the recording hand-off.
use std::collections::HashSet;

use crate::channel::{self, ChannelCategory};
use crate::model::SeasonProgramRow;

/// Selection key of a row: `title|channel|startedAt`.
pub fn row_key(row: &SeasonProgramRow) -> String {
    format!("{}|{}|{}", row.title, row.channel_name, row.started_at)
}

/// Rows broadcast on one of `selected`. An empty selection keeps every row.
pub fn filter_by_channels(
    rows: &[SeasonProgramRow],
    selected: &HashSet<String>,
) -> Vec<SeasonProgramRow> {
    if selected.is_empty() {
        return rows.to_vec();
    }
    rows.iter()
        .filter(|r| selected.contains(&r.channel_name))
        .cloned()
        .collect()
}

/// Rows whose key is in `keys`, in their original order.
pub fn select_rows(rows: &[SeasonProgramRow], keys: &HashSet<String>) -> Vec<SeasonProgramRow> {
    rows.iter()
        .filter(|r| keys.contains(&row_key(r)))
        .cloned()
        .collect()
}

/// Every channel of `rows` that falls in one of `categories`.
pub fn channels_in_categories(
    rows: &[SeasonProgramRow],
    categories: &[ChannelCategory],
) -> HashSet<String> {
    let groups = channel::group_by_category(channel::channel_names(rows));
    categories
        .iter()
        .flat_map(|c| groups.get(*c).iter().cloned())
        .collect()
}

/// Narrow a season down to what goes on the recording list: first to the
/// named channels plus every channel of `categories`, then to the rows whose
/// [`row_key`] is in `keys`. An empty argument skips its step; a channel
/// filter that names no channel of the season leaves nothing.
pub fn narrow_rows(
    rows: &[SeasonProgramRow],
    channels: &[String],
    categories: &[ChannelCategory],
    keys: &[String],
) -> Vec<SeasonProgramRow> {
    let mut rows = rows.to_vec();
    if !channels.is_empty() || !categories.is_empty() {
        let mut selected: HashSet<String> = channels.iter().cloned().collect();
        selected.extend(channels_in_categories(&rows, categories));
        if selected.is_empty() {
            return Vec::new();
        }
        rows = filter_by_channels(&rows, &selected);
    }
    if !keys.is_empty() {
        let keys: HashSet<String> = keys.iter().cloned().collect();
        rows = select_rows(&rows, &keys);
    }
    rows
}
