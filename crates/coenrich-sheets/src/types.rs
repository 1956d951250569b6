use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A spreadsheet visible to the access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpreadsheetSummary {
    pub id: String,
    pub name: String,
}

/// One sheet (tab) of a spreadsheet with the cells of its header row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetHeaders {
    pub title: String,
    pub headers: Vec<String>,
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

/// Values API read response. `values` is omitted entirely for an empty range,
/// and trailing empty rows/cells are trimmed by the server.
#[derive(Debug, Deserialize)]
pub(crate) struct ValueRangeResponse {
    #[serde(default)]
    pub values: Vec<Vec<Value>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ValueRangeUpdate<'a> {
    pub range: &'a str,
    pub major_dimension: &'static str,
    pub values: &'a [Vec<Option<String>>],
}

#[derive(Debug, Deserialize)]
pub(crate) struct SpreadsheetMetadata {
    #[serde(default)]
    pub sheets: Vec<SheetEntry>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SheetEntry {
    pub properties: SheetProperties,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SheetProperties {
    pub title: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DriveFileList {
    #[serde(default)]
    pub files: Vec<SpreadsheetSummary>,
    pub next_page_token: Option<String>,
}

/// Renders a cell value as the string the sheet displays.
pub(crate) fn cell_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
