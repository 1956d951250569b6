use thiserror::Error;

/// Errors returned by the spreadsheet store and the reconciliation driver.
#[derive(Debug, Error)]
pub enum SheetsError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The response body could not be deserialized into the expected type.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// The access token was rejected (HTTP 401 or 403).
    #[error("access token rejected with HTTP {status}")]
    Unauthorized { status: u16 },

    #[error("spreadsheet not found: {0}")]
    SpreadsheetNotFound(String),

    #[error("unexpected HTTP {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    /// The source column header is not present in the sheet's first row.
    #[error("column \"{column}\" not found in the header row of sheet \"{sheet}\"")]
    ColumnNotFound { column: String, sheet: String },

    /// A caller-supplied argument (spreadsheet id, sheet, column, base URL)
    /// is empty or malformed.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}
