//! Read-only spreadsheet discovery commands.

use coenrich_core::AppConfig;
use coenrich_sheets::GoogleSheetsClient;

fn client(config: &AppConfig, access_token: &str) -> anyhow::Result<GoogleSheetsClient> {
    GoogleSheetsClient::from_app_config(access_token, config)
        .map_err(|e| anyhow::anyhow!("failed to build spreadsheet client: {e}"))
}

/// Print one `id<TAB>name` line per spreadsheet.
///
/// # Errors
///
/// Returns an error if the token is rejected or the listing request fails.
pub(crate) async fn run_list_spreadsheets(
    config: &AppConfig,
    access_token: &str,
) -> anyhow::Result<()> {
    let files = client(config, access_token)?.list_spreadsheets().await?;
    if files.is_empty() {
        println!("no spreadsheets found");
        return Ok(());
    }
    for file in files {
        println!("{}\t{}", file.id, file.name);
    }
    Ok(())
}

/// Print every sheet title with its header row as JSON.
///
/// # Errors
///
/// Returns an error if the spreadsheet does not exist, the token is
/// rejected, or any read fails.
pub(crate) async fn run_sheet_details(
    config: &AppConfig,
    access_token: &str,
    spreadsheet_id: &str,
) -> anyhow::Result<()> {
    let details = client(config, access_token)?
        .sheet_details(spreadsheet_id)
        .await?;
    println!("{}", serde_json::to_string_pretty(&details)?);
    Ok(())
}
