//! Spreadsheet reconciliation: fill the three output columns for every row
//! whose company name is present but whose outputs are incomplete.
//!
//! Skip decisions are made per cell. A row with some outputs filled is
//! enriched once and only the empty cells are written back, as one range whose
//! untouched interior cells are sent as `None`.

use std::time::Duration;

use coenrich_core::{EnrichmentResult, OUTPUT_HEADERS};
use serde::Serialize;

use crate::a1;
use crate::error::SheetsError;
use crate::store::{first_cell, RangeStore};

/// Anything that can turn a company name into output values.
#[allow(async_fn_in_trait)]
pub trait CompanyEnricher {
    async fn enrich(&self, company_name: &str) -> EnrichmentResult;
}

impl CompanyEnricher for coenrich_scraper::Enricher {
    async fn enrich(&self, company_name: &str) -> EnrichmentResult {
        coenrich_scraper::Enricher::enrich(self, company_name).await
    }
}

/// Which spreadsheet, sheet and source column to reconcile.
#[derive(Debug, Clone)]
pub struct ReconcileRequest {
    pub spreadsheet_id: String,
    pub sheet: String,
    /// Header text of the column holding company names.
    pub column: String,
    /// Delay between consecutive enriched rows.
    pub pacing: Duration,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileSummary {
    pub rows_scanned: usize,
    pub rows_enriched: usize,
    pub rows_skipped: usize,
    pub cells_written: usize,
    pub headers_added: usize,
}

/// Column layout resolved from the header row.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Layout {
    source: usize,
    /// Output column indexes in [`OUTPUT_HEADERS`] order.
    outputs: [usize; 3],
}

/// Runs one reconciliation pass over a sheet.
///
/// # Errors
///
/// - [`SheetsError::InvalidArgument`] if the spreadsheet id, sheet or column
///   is blank.
/// - [`SheetsError::ColumnNotFound`] if the source column header is missing.
/// - Any store error, which aborts the pass. Rows written before the failure
///   stay written.
pub async fn reconcile<S, E>(
    store: &S,
    enricher: &E,
    request: &ReconcileRequest,
) -> Result<ReconcileSummary, SheetsError>
where
    S: RangeStore,
    E: CompanyEnricher,
{
    validate_request(request)?;
    let id = request.spreadsheet_id.trim();
    let sheet = request.sheet.as_str();
    let mut summary = ReconcileSummary::default();

    let layout = prepare_headers(store, request, &mut summary).await?;

    let names = store
        .get_range(id, &a1::column_from_data_start(sheet, layout.source))
        .await?;
    if names.is_empty() {
        tracing::info!(spreadsheet_id = id, sheet, "no data rows to reconcile");
        return Ok(summary);
    }

    let first_row = a1::FIRST_DATA_ROW;
    let last_row = first_row + names.len() - 1;
    let [id_col, location_col, url_col] = layout.outputs;
    let id_range = a1::column_span(sheet, id_col, first_row, last_row);
    let location_range = a1::column_span(sheet, location_col, first_row, last_row);
    let url_range = a1::column_span(sheet, url_col, first_row, last_row);
    let (ids, locations, urls) = tokio::try_join!(
        store.get_range(id, &id_range),
        store.get_range(id, &location_range),
        store.get_range(id, &url_range),
    )?;

    for index in 0..names.len() {
        summary.rows_scanned += 1;
        let row = first_row + index;
        let company = first_cell(&names, index).trim();
        if company.is_empty() {
            summary.rows_skipped += 1;
            continue;
        }

        let existing = [
            first_cell(&ids, index),
            first_cell(&locations, index),
            first_cell(&urls, index),
        ];
        let missing: Vec<usize> = (0..OUTPUT_HEADERS.len())
            .filter(|&field| existing[field].trim().is_empty())
            .collect();
        if missing.is_empty() {
            summary.rows_skipped += 1;
            continue;
        }

        if summary.rows_enriched > 0 && !request.pacing.is_zero() {
            tracing::debug!(
                delay_ms = request.pacing.as_millis(),
                "pacing before next row"
            );
            tokio::time::sleep(request.pacing).await;
        }

        let result = enricher.enrich(company).await;
        summary.rows_enriched += 1;

        let Some(update) = build_row_update(&layout, &missing, &result, sheet, row) else {
            tracing::info!(company, row, "no values found; leaving row unchanged");
            continue;
        };
        store.set_range(id, &update.range, &[update.cells]).await?;
        summary.cells_written += update.written;
        tracing::info!(
            company,
            row,
            range = %update.range,
            cells = update.written,
            "row updated"
        );
    }

    tracing::info!(
        spreadsheet_id = id,
        sheet,
        rows_scanned = summary.rows_scanned,
        rows_enriched = summary.rows_enriched,
        rows_skipped = summary.rows_skipped,
        cells_written = summary.cells_written,
        headers_added = summary.headers_added,
        "reconciliation finished"
    );
    Ok(summary)
}

fn validate_request(request: &ReconcileRequest) -> Result<(), SheetsError> {
    for (name, value) in [
        ("spreadsheet id", &request.spreadsheet_id),
        ("sheet", &request.sheet),
        ("column", &request.column),
    ] {
        if value.trim().is_empty() {
            return Err(SheetsError::InvalidArgument(format!(
                "{name} must not be empty"
            )));
        }
    }
    Ok(())
}

/// Reads the header row, locates the source column and allocates any missing
/// output columns. Appended header cells are written in a single call.
async fn prepare_headers<S: RangeStore>(
    store: &S,
    request: &ReconcileRequest,
    summary: &mut ReconcileSummary,
) -> Result<Layout, SheetsError> {
    let id = request.spreadsheet_id.trim();
    let sheet = request.sheet.as_str();
    let mut headers = store
        .get_range(id, &a1::header_row(sheet))
        .await?
        .into_iter()
        .next()
        .unwrap_or_default();

    let wanted = request.column.trim();
    let source = find_header(&headers, wanted).ok_or_else(|| SheetsError::ColumnNotFound {
        column: wanted.to_owned(),
        sheet: sheet.to_owned(),
    })?;

    let existing_width = headers.len();
    let mut outputs = [0usize; 3];
    for (slot, name) in outputs.iter_mut().zip(OUTPUT_HEADERS) {
        *slot = if let Some(found) = find_header(&headers, name) {
            found
        } else {
            headers.push(name.to_owned());
            summary.headers_added += 1;
            headers.len() - 1
        };
    }

    if summary.headers_added > 0 {
        // Existing header cells are never rewritten; only the appended tail is.
        let cells: Vec<Option<String>> = headers[existing_width..]
            .iter()
            .cloned()
            .map(Some)
            .collect();
        let range = a1::row_span(sheet, 1, existing_width, headers.len() - 1);
        store.set_range(id, &range, &[cells]).await?;
        tracing::info!(
            spreadsheet_id = id,
            sheet,
            added = summary.headers_added,
            "output headers added"
        );
    }

    Ok(Layout { source, outputs })
}

fn find_header(headers: &[String], name: &str) -> Option<usize> {
    headers.iter().position(|h| h.trim() == name)
}

#[derive(Debug, PartialEq, Eq)]
struct RowUpdate {
    range: String,
    cells: Vec<Option<String>>,
    written: usize,
}

/// Builds one horizontal range covering every missing output cell that has a
/// value to write. Cells inside the span that are not being filled are `None`.
/// Returns `None` when there is nothing to write.
fn build_row_update(
    layout: &Layout,
    missing: &[usize],
    result: &EnrichmentResult,
    sheet: &str,
    row: usize,
) -> Option<RowUpdate> {
    let values = result.values();
    let fills: Vec<(usize, &str)> = missing
        .iter()
        .map(|&field| (layout.outputs[field], values[field]))
        .filter(|(_, value)| !value.is_empty())
        .collect();

    let first = fills.iter().map(|(col, _)| *col).min()?;
    let last = fills.iter().map(|(col, _)| *col).max()?;

    let mut cells = vec![None; last - first + 1];
    for (col, value) in &fills {
        cells[col - first] = Some((*value).to_owned());
    }

    Some(RowUpdate {
        range: a1::row_span(sheet, row, first, last),
        cells,
        written: fills.len(),
    })
}

#[cfg(test)]
#[path = "reconcile_test.rs"]
mod tests;
