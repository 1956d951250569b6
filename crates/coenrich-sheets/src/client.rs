//! HTTP client for the Google Sheets v4 values API and the Drive v3 file list.
//!
//! Authenticates every request with an opaque bearer token supplied by the
//! caller. HTTP 401/403 surface as [`SheetsError::Unauthorized`] and 404 on a
//! spreadsheet as [`SheetsError::SpreadsheetNotFound`].

use std::fmt;
use std::time::Duration;

use coenrich_core::AppConfig;
use reqwest::{Client, Response, Url};
use serde::de::DeserializeOwned;

use crate::a1;
use crate::error::SheetsError;
use crate::store::RangeStore;
use crate::types::{
    cell_text, DriveFileList, SheetHeaders, SpreadsheetMetadata, SpreadsheetSummary,
    ValueRangeResponse, ValueRangeUpdate,
};

const DEFAULT_SHEETS_URL: &str = "https://sheets.googleapis.com/";
const DEFAULT_DRIVE_URL: &str = "https://www.googleapis.com/";
const SPREADSHEET_MIME_QUERY: &str = "mimeType='application/vnd.google-apps.spreadsheet'";

/// Client for the spreadsheet values and file-listing endpoints.
///
/// Use [`GoogleSheetsClient::new`] for production or
/// [`GoogleSheetsClient::with_base_urls`] to point at a mock server in tests.
pub struct GoogleSheetsClient {
    client: Client,
    access_token: String,
    sheets_base: Url,
    drive_base: Url,
}

impl fmt::Debug for GoogleSheetsClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GoogleSheetsClient")
            .field("access_token", &"[redacted]")
            .field("sheets_base", &self.sheets_base.as_str())
            .field("drive_base", &self.drive_base.as_str())
            .finish_non_exhaustive()
    }
}

impl GoogleSheetsClient {
    /// Creates a client pointed at the production Google endpoints.
    ///
    /// # Errors
    ///
    /// Returns [`SheetsError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(access_token: &str, timeout_secs: u64) -> Result<Self, SheetsError> {
        Self::with_base_urls(
            access_token,
            timeout_secs,
            DEFAULT_SHEETS_URL,
            DEFAULT_DRIVE_URL,
        )
    }

    /// Creates a client using the endpoints and timeout from configuration.
    ///
    /// # Errors
    ///
    /// See [`GoogleSheetsClient::with_base_urls`].
    pub fn from_app_config(access_token: &str, config: &AppConfig) -> Result<Self, SheetsError> {
        Self::with_base_urls(
            access_token,
            config.request_timeout_secs,
            &config.sheets_api_url,
            &config.drive_api_url,
        )
    }

    /// Creates a client with custom base URLs (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`SheetsError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`SheetsError::InvalidArgument`] if the token
    /// is blank or a base URL does not parse.
    pub fn with_base_urls(
        access_token: &str,
        timeout_secs: u64,
        sheets_base: &str,
        drive_base: &str,
    ) -> Result<Self, SheetsError> {
        if access_token.trim().is_empty() {
            return Err(SheetsError::InvalidArgument(
                "access token must not be empty".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("coenrich/0.1")
            .build()?;

        Ok(Self {
            client,
            access_token: access_token.trim().to_owned(),
            sheets_base: parse_base(sheets_base)?,
            drive_base: parse_base(drive_base)?,
        })
    }

    /// Reads a range and returns each row's cells as display text.
    ///
    /// # Errors
    ///
    /// - [`SheetsError::Unauthorized`] / [`SheetsError::SpreadsheetNotFound`]
    ///   for 401/403/404.
    /// - [`SheetsError::Http`] on network failure.
    /// - [`SheetsError::Deserialize`] if the body is not a value range.
    pub async fn get_values(
        &self,
        spreadsheet_id: &str,
        range: &str,
    ) -> Result<Vec<Vec<String>>, SheetsError> {
        let url = self.values_url(spreadsheet_id, range)?;
        let response = self
            .client
            .get(url)
            .bearer_auth(&self.access_token)
            .send()
            .await?;
        let response = check_status(response, Some(spreadsheet_id))?;
        let parsed: ValueRangeResponse = parse_json(response, range).await?;

        Ok(parsed
            .values
            .iter()
            .map(|row| row.iter().map(cell_text).collect())
            .collect())
    }

    /// Writes `rows` into `range` with user-entered semantics. `None` cells
    /// are sent as JSON `null` and leave the existing value unchanged.
    ///
    /// # Errors
    ///
    /// Same as [`GoogleSheetsClient::get_values`].
    pub async fn update_values(
        &self,
        spreadsheet_id: &str,
        range: &str,
        rows: &[Vec<Option<String>>],
    ) -> Result<(), SheetsError> {
        let mut url = self.values_url(spreadsheet_id, range)?;
        url.query_pairs_mut()
            .append_pair("valueInputOption", "USER_ENTERED");

        let body = ValueRangeUpdate {
            range,
            major_dimension: "ROWS",
            values: rows,
        };
        let response = self
            .client
            .put(url)
            .bearer_auth(&self.access_token)
            .json(&body)
            .send()
            .await?;
        check_status(response, Some(spreadsheet_id))?;
        tracing::debug!(spreadsheet_id, range, rows = rows.len(), "range updated");
        Ok(())
    }

    /// Returns the title of every sheet in the spreadsheet, in tab order.
    ///
    /// # Errors
    ///
    /// Same as [`GoogleSheetsClient::get_values`].
    pub async fn sheet_titles(&self, spreadsheet_id: &str) -> Result<Vec<String>, SheetsError> {
        let mut url = self.spreadsheet_url(spreadsheet_id)?;
        url.query_pairs_mut()
            .append_pair("fields", "sheets.properties.title");

        let response = self
            .client
            .get(url)
            .bearer_auth(&self.access_token)
            .send()
            .await?;
        let response = check_status(response, Some(spreadsheet_id))?;
        let metadata: SpreadsheetMetadata =
            parse_json(response, &format!("spreadsheet {spreadsheet_id}")).await?;

        Ok(metadata
            .sheets
            .into_iter()
            .map(|sheet| sheet.properties.title)
            .collect())
    }

    /// Maps every sheet of the spreadsheet to the cells of its header row.
    ///
    /// # Errors
    ///
    /// Same as [`GoogleSheetsClient::get_values`].
    pub async fn sheet_details(
        &self,
        spreadsheet_id: &str,
    ) -> Result<Vec<SheetHeaders>, SheetsError> {
        let titles = self.sheet_titles(spreadsheet_id).await?;
        let mut details = Vec::with_capacity(titles.len());
        for title in titles {
            let rows = self
                .get_values(spreadsheet_id, &a1::header_row(&title))
                .await?;
            let headers = rows.into_iter().next().unwrap_or_default();
            details.push(SheetHeaders { title, headers });
        }
        Ok(details)
    }

    /// Lists every spreadsheet visible to the token, following pagination.
    ///
    /// # Errors
    ///
    /// - [`SheetsError::Unauthorized`] for 401/403.
    /// - [`SheetsError::UnexpectedStatus`] for any other non-2xx status.
    /// - [`SheetsError::Http`] / [`SheetsError::Deserialize`] as usual.
    pub async fn list_spreadsheets(&self) -> Result<Vec<SpreadsheetSummary>, SheetsError> {
        let mut files = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let url = self.drive_files_url(page_token.as_deref())?;
            let response = self
                .client
                .get(url)
                .bearer_auth(&self.access_token)
                .send()
                .await?;
            let response = check_status(response, None)?;
            let page: DriveFileList = parse_json(response, "drive file list").await?;
            files.extend(page.files);

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        tracing::debug!(count = files.len(), "listed spreadsheets");
        Ok(files)
    }

    fn spreadsheet_url(&self, spreadsheet_id: &str) -> Result<Url, SheetsError> {
        let id = validate_id(spreadsheet_id)?;
        append_segments(&self.sheets_base, &["v4", "spreadsheets", id])
    }

    fn values_url(&self, spreadsheet_id: &str, range: &str) -> Result<Url, SheetsError> {
        let id = validate_id(spreadsheet_id)?;
        append_segments(
            &self.sheets_base,
            &["v4", "spreadsheets", id, "values", range],
        )
    }

    fn drive_files_url(&self, page_token: Option<&str>) -> Result<Url, SheetsError> {
        let mut url = append_segments(&self.drive_base, &["drive", "v3", "files"])?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("q", SPREADSHEET_MIME_QUERY);
            pairs.append_pair("fields", "nextPageToken,files(id,name)");
            pairs.append_pair("pageSize", "1000");
            if let Some(token) = page_token {
                pairs.append_pair("pageToken", token);
            }
        }
        Ok(url)
    }
}

impl RangeStore for GoogleSheetsClient {
    async fn get_range(
        &self,
        spreadsheet_id: &str,
        range: &str,
    ) -> Result<Vec<Vec<String>>, SheetsError> {
        self.get_values(spreadsheet_id, range).await
    }

    async fn set_range(
        &self,
        spreadsheet_id: &str,
        range: &str,
        rows: &[Vec<Option<String>>],
    ) -> Result<(), SheetsError> {
        self.update_values(spreadsheet_id, range, rows).await
    }
}

fn parse_base(base_url: &str) -> Result<Url, SheetsError> {
    // Exactly one trailing slash so appended segments land under the base path.
    let normalised = format!("{}/", base_url.trim_end_matches('/'));
    Url::parse(&normalised)
        .map_err(|e| SheetsError::InvalidArgument(format!("invalid base URL '{base_url}': {e}")))
}

fn validate_id(spreadsheet_id: &str) -> Result<&str, SheetsError> {
    let id = spreadsheet_id.trim();
    if id.is_empty() {
        return Err(SheetsError::InvalidArgument(
            "spreadsheet id must not be empty".to_string(),
        ));
    }
    Ok(id)
}

/// Appends percent-encoded path segments to `base`.
fn append_segments(base: &Url, segments: &[&str]) -> Result<Url, SheetsError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|()| SheetsError::InvalidArgument(format!("base URL cannot be a base: {base}")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

fn check_status(response: Response, spreadsheet_id: Option<&str>) -> Result<Response, SheetsError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    match (status.as_u16(), spreadsheet_id) {
        (401 | 403, _) => Err(SheetsError::Unauthorized {
            status: status.as_u16(),
        }),
        (404, Some(id)) => Err(SheetsError::SpreadsheetNotFound(id.to_owned())),
        (code, _) => Err(SheetsError::UnexpectedStatus {
            status: code,
            url: response.url().to_string(),
        }),
    }
}

async fn parse_json<T: DeserializeOwned>(
    response: Response,
    context: &str,
) -> Result<T, SheetsError> {
    let body = response.text().await?;
    serde_json::from_str(&body).map_err(|e| SheetsError::Deserialize {
        context: context.to_owned(),
        source: e,
    })
}
