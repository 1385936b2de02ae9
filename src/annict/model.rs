use serde::{Deserialize, Serialize};

#[derive(Deserialize, Debug)]
pub struct SearchWorksResponse {
    #[serde(default)]
    pub data: Option<SearchWorksData>,
    #[serde(default)]
    pub errors: Option<Vec<GraphQlError>>,
}

#[derive(Deserialize, Debug)]
pub struct SearchWorksData {
    #[serde(rename = "searchWorks", default)]
    pub search_works: Option<SearchWorks>,
}

#[derive(Deserialize, Debug)]
pub struct GraphQlError {
    #[serde(default)]
    pub message: String,
}

/// One page of `searchWorks`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SearchWorks {
    pub edges: Vec<WorkEdge>,
    pub page_info: PageInfo,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct WorkEdge {
    pub node: Work,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Work {
    pub annict_id: i64,
    pub title: String,
    pub programs: ProgramConnection,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ProgramConnection {
    pub edges: Vec<ProgramEdge>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ProgramEdge {
    pub node: Program,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Program {
    pub started_at: String,
    pub channel: Channel,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Channel {
    pub name: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub has_next_page: bool,
    #[serde(default)]
    pub end_cursor: Option<String>,
}

impl PageInfo {
    /// Cursor for the next request. Both `hasNextPage` and a non-empty
    /// `endCursor` are required to keep paginating.
    pub fn next_cursor(&self) -> Option<&str> {
        if !self.has_next_page {
            return None;
        }
        self.end_cursor.as_deref().filter(|c| !c.is_empty())
    }
}
