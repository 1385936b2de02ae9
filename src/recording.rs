//! Recording list hand-off document and the printable schedule page.
use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::model::SeasonProgramRow;

/// Fixed key the hand-off document is stored under.
pub const STORAGE_KEY: &str = "recording-list";

/// Broadcast times are shown in Japan Standard Time.
const JST_OFFSET_SECS: i32 = 9 * 3600;

#[derive(Debug, Error)]
pub enum RecordingError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RecordingList {
    pub items: Vec<SeasonProgramRow>,
    pub created_at: DateTime<Utc>,
}

#[derive(Deserialize)]
struct StoredItems {
    #[serde(default)]
    items: Option<Vec<SeasonProgramRow>>,
}

impl RecordingList {
    pub fn new(items: Vec<SeasonProgramRow>) -> Self {
        Self {
            items,
            created_at: Utc::now(),
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), RecordingError> {
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

/// `recording-list.json` in the working directory.
pub fn default_list_path() -> PathBuf {
    PathBuf::from(format!("{}.json", STORAGE_KEY))
}

/// Rows of a stored hand-off document. Anything unreadable yields no rows.
pub fn load_items(raw: Option<&str>) -> Vec<SeasonProgramRow> {
    raw.and_then(|raw| serde_json::from_str::<StoredItems>(raw).ok())
        .and_then(|stored| stored.items)
        .unwrap_or_default()
}

/// `YYYY/MM/DD` and `HH:MM` of an ISO-8601 timestamp in JST.
pub fn format_started_at(iso: &str) -> Option<(String, String)> {
    let jst = FixedOffset::east_opt(JST_OFFSET_SECS)?;
    let at = DateTime::parse_from_rfc3339(iso).ok()?.with_timezone(&jst);
    Some((at.format("%Y/%m/%d").to_string(), at.format("%H:%M").to_string()))
}

/// Print-ready HTML schedule of `items`.
pub fn render_html(items: &[SeasonProgramRow]) -> String {
    if items.is_empty() {
        return page(
            "録画表",
            "<p class=\"hint\">録画表のデータがありません。</p>",
        );
    }

    let mut body = String::new();
    for row in items {
        let (date, time) = format_started_at(&row.started_at)
            .unwrap_or_else(|| ("-".to_string(), "-".to_string()));
        body.push_str(&format!(
            "<tr><td class=\"title\">{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
            html_escape(&row.title),
            html_escape(&row.channel_name),
            date,
            time
        ));
    }

    let content = format!(
        r#"<div class="toolbar noprint">
        <button type="button" onclick="window.print()">この内容で印刷</button>
      </div>
      <p class="hint">{}件の作品</p>
      <table>
        <thead>
          <tr><th>作品名</th><th>放映局</th><th>放映開始日</th><th>時間</th></tr>
        </thead>
        <tbody>
{}        </tbody>
      </table>"#,
        items.len(),
        body
    );
    page("録画表", &content)
}

fn page(title: &str, content: &str) -> String {
    format!(
        r#"<!doctype html>
<html lang="ja">
  <head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>{}</title>
    <style>{}</style>
  </head>
  <body>
    <header>
      <h1>{}</h1>
    </header>
    <main>
      {}
    </main>
  </body>
</html>"#,
        html_escape(title),
        PRINT_STYLE,
        html_escape(title),
        content
    )
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

const PRINT_STYLE: &str = r#"
body {
  margin: 0;
  color: #222;
  background: #fff;
  font: 14px/1.6 -apple-system, BlinkMacSystemFont, 'Segoe UI', 'Noto Sans JP', sans-serif;
}
header, main {
  padding: 16px;
  max-width: 820px;
  margin: 0 auto;
}
.hint {
  color: #666;
}
table {
  width: 100%;
  border-collapse: collapse;
}
th, td {
  text-align: left;
  padding: 4px 8px;
  border-bottom: 1px solid #ddd;
}
td.title {
  font-weight: 600;
}
@media print {
  .noprint {
    display: none;
  }
  header, main {
    padding: 0;
  }
}
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn row(title: &str, channel: &str, at: &str) -> SeasonProgramRow {
        SeasonProgramRow {
            title: title.into(),
            channel_name: channel.into(),
            started_at: at.into(),
        }
    }

    #[test]
    fn hand_off_document_round_trips_rows() {
        let items = vec![
            row("X", "TOKYO MX", "2024-10-05T01:30:00+09:00"),
            row("X", "TOKYO MX", "2024-10-05T01:30:00+09:00"),
        ];
        let list = RecordingList::new(items.clone());
        let json = serde_json::to_string(&list).unwrap();
        let v: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert!(v.get("createdAt").is_some());
        assert_eq!(v["items"][0]["channelName"], "TOKYO MX");
        assert_eq!(load_items(Some(&json)), items);
    }

    #[test]
    fn default_list_file_is_named_after_the_storage_key() {
        assert_eq!(default_list_path(), PathBuf::from("recording-list.json"));
    }

    #[test]
    fn unreadable_document_has_no_items() {
        assert!(load_items(None).is_empty());
        assert!(load_items(Some("not json")).is_empty());
        assert!(load_items(Some(r#"{"createdAt":"2024-01-01T00:00:00Z"}"#)).is_empty());
        assert!(load_items(Some(r#"{"items":null}"#)).is_empty());
    }

    #[test]
    fn items_are_read_without_a_valid_created_at() {
        let one = r#"{"title":"X","channelName":"AT-X","startedAt":"2024-10-05T01:30:00+09:00"}"#;
        assert_eq!(load_items(Some(&format!(r#"{{"items":[{}]}}"#, one))).len(), 1);
        let raw = format!(r#"{{"items":[{}],"createdAt":"Sat Oct 05 2024"}}"#, one);
        assert_eq!(load_items(Some(&raw)).len(), 1);
    }

    #[test]
    fn save_writes_pretty_json() {
        let td = tempdir().unwrap();
        let path = td.path().join(default_list_path());
        let list = RecordingList::new(vec![row("X", "A", "2024-10-05T01:30:00Z")]);
        list.save(&path).unwrap();
        let raw = fs::read_to_string(&path).unwrap();
        let back: RecordingList = serde_json::from_str(&raw).unwrap();
        assert_eq!(back, list);
    }

    #[test]
    fn started_at_is_shown_in_jst() {
        assert_eq!(
            format_started_at("2024-10-04T16:30:00Z"),
            Some(("2024/10/05".to_string(), "01:30".to_string()))
        );
        assert_eq!(
            format_started_at("2024-10-05T01:30:00+09:00"),
            Some(("2024/10/05".to_string(), "01:30".to_string()))
        );
        assert_eq!(format_started_at("garbage"), None);
    }

    #[test]
    fn render_lists_rows_escaped() {
        let html = render_html(&[
            row("<Re:Zero>", "AT-X", "2024-10-02T13:30:00Z"),
            row("B & C", "TOKYO MX", "bad"),
        ]);
        assert!(html.contains("2件の作品"));
        assert!(html.contains("&lt;Re:Zero&gt;"));
        assert!(html.contains("B &amp; C"));
        assert!(html.contains("<td>2024/10/02</td><td>22:30</td>"));
        assert!(html.contains("<td>-</td><td>-</td>"));
        assert!(html.contains("window.print()"));
    }

    #[test]
    fn render_empty_list() {
        let html = render_html(&[]);
        assert!(html.contains("録画表のデータがありません。"));
        assert!(!html.contains("<table>"));
    }
}
