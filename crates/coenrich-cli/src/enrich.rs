//! Enrichment command handlers for the CLI.
//!
//! Both handlers build the scraping pipeline from configuration, optionally
//! loading the proxy pool first. Per-company failures never surface here;
//! only configuration and spreadsheet errors abort the command.

use std::time::Duration;

use coenrich_core::AppConfig;
use coenrich_scraper::Enricher;
use coenrich_sheets::{reconcile, GoogleSheetsClient, ReconcileRequest};

/// Arguments for [`run_enrich`], gathered from the `enrich` subcommand.
#[derive(Debug)]
pub(crate) struct EnrichArgs {
    pub spreadsheet_id: String,
    pub sheet: String,
    pub column: String,
    pub pacing_ms: Option<u64>,
    pub refresh_proxies: bool,
    pub access_token: String,
}

async fn build_enricher(config: &AppConfig, refresh_proxies: bool) -> anyhow::Result<Enricher> {
    let mut enricher = Enricher::from_app_config(config)
        .map_err(|e| anyhow::anyhow!("failed to build enrichment pipeline: {e}"))?;

    if refresh_proxies && config.proxy_refresh {
        let pool = enricher.refresh_proxies().await;
        if pool == 0 {
            tracing::warn!("proxy pool is empty; requests will be sent directly");
        }
    }
    Ok(enricher)
}

/// Enrich one company name and print the JSON result to stdout.
///
/// # Errors
///
/// Returns an error if the pipeline cannot be constructed or the result
/// cannot be serialized.
pub(crate) async fn run_lookup(
    config: &AppConfig,
    company: &str,
    refresh_proxies: bool,
) -> anyhow::Result<()> {
    let enricher = build_enricher(config, refresh_proxies).await?;
    let result = enricher.enrich(company).await;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

/// Reconcile one sheet: fill every incomplete row whose company name is set.
///
/// # Errors
///
/// Returns an error if the spreadsheet client cannot be constructed, the
/// source column is missing, or any spreadsheet read/write fails.
pub(crate) async fn run_enrich(config: &AppConfig, args: EnrichArgs) -> anyhow::Result<()> {
    let store = GoogleSheetsClient::from_app_config(&args.access_token, config)
        .map_err(|e| anyhow::anyhow!("failed to build spreadsheet client: {e}"))?;
    let enricher = build_enricher(config, args.refresh_proxies).await?;

    let request = ReconcileRequest {
        spreadsheet_id: args.spreadsheet_id,
        sheet: args.sheet,
        column: args.column,
        pacing: Duration::from_millis(args.pacing_ms.unwrap_or(config.row_pacing_ms)),
    };
    let summary = reconcile(&store, &enricher, &request).await?;

    println!(
        "{} rows scanned, {} enriched, {} skipped, {} cells written, {} headers added",
        summary.rows_scanned,
        summary.rows_enriched,
        summary.rows_skipped,
        summary.cells_written,
        summary.headers_added
    );
    Ok(())
}
