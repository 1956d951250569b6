use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};

use super::*;

// ---------------------------------------------------------------------------
// In-memory store
// ---------------------------------------------------------------------------

/// Grid keyed by (1-based row, 0-based column) mimicking the values API:
/// reads trim trailing empty rows and cells, `None` writes leave cells alone.
#[derive(Default)]
struct MemoryStore {
    cells: RefCell<BTreeMap<(usize, usize), String>>,
    writes: RefCell<Vec<(String, Vec<Vec<Option<String>>>)>>,
}

impl MemoryStore {
    fn with_rows(rows: &[&[&str]]) -> Self {
        let store = Self::default();
        {
            let mut cells = store.cells.borrow_mut();
            for (r, row) in rows.iter().enumerate() {
                for (c, value) in row.iter().enumerate() {
                    if !value.is_empty() {
                        cells.insert((r + 1, c), (*value).to_string());
                    }
                }
            }
        }
        store
    }

    fn cell(&self, row: usize, col: usize) -> String {
        self.cells
            .borrow()
            .get(&(row, col))
            .cloned()
            .unwrap_or_default()
    }

    fn write_ranges(&self) -> Vec<String> {
        self.writes.borrow().iter().map(|(r, _)| r.clone()).collect()
    }
}

struct Bounds {
    first_row: usize,
    last_row: Option<usize>,
    first_col: usize,
    last_col: Option<usize>,
}

fn parse_endpoint(s: &str) -> (Option<usize>, Option<usize>) {
    let letters: String = s.chars().take_while(char::is_ascii_alphabetic).collect();
    let digits = &s[letters.len()..];
    let col = (!letters.is_empty()).then(|| {
        letters
            .bytes()
            .fold(0usize, |acc, b| acc * 26 + usize::from(b - b'A' + 1))
            - 1
    });
    let row = digits.parse().ok();
    (col, row)
}

fn parse_range(range: &str) -> Bounds {
    let (_, cells) = range.rsplit_once('!').expect("range has a sheet prefix");
    let (start, end) = cells.split_once(':').expect("range has two endpoints");
    let (start_col, start_row) = parse_endpoint(start);
    let (end_col, end_row) = parse_endpoint(end);
    Bounds {
        first_row: start_row.unwrap_or(1),
        last_row: end_row,
        first_col: start_col.unwrap_or(0),
        last_col: end_col,
    }
}

impl RangeStore for MemoryStore {
    async fn get_range(
        &self,
        _spreadsheet_id: &str,
        range: &str,
    ) -> Result<Vec<Vec<String>>, SheetsError> {
        let b = parse_range(range);
        let cells = self.cells.borrow();
        let max_row = cells.keys().map(|(r, _)| *r).max().unwrap_or(0);
        let max_col = cells.keys().map(|(_, c)| *c).max().unwrap_or(0);
        let last_row = b.last_row.unwrap_or(max_row);
        let last_col = b.last_col.unwrap_or(max_col);

        let mut rows: Vec<Vec<String>> = (b.first_row..=last_row)
            .map(|r| {
                let mut row: Vec<String> = (b.first_col..=last_col)
                    .map(|c| cells.get(&(r, c)).cloned().unwrap_or_default())
                    .collect();
                while row.last().is_some_and(String::is_empty) {
                    row.pop();
                }
                row
            })
            .collect();
        while rows.last().is_some_and(Vec::is_empty) {
            rows.pop();
        }
        Ok(rows)
    }

    async fn set_range(
        &self,
        _spreadsheet_id: &str,
        range: &str,
        rows: &[Vec<Option<String>>],
    ) -> Result<(), SheetsError> {
        let b = parse_range(range);
        {
            let mut cells = self.cells.borrow_mut();
            for (r, row) in rows.iter().enumerate() {
                for (c, value) in row.iter().enumerate() {
                    if let Some(value) = value {
                        cells.insert((b.first_row + r, b.first_col + c), value.clone());
                    }
                }
            }
        }
        self.writes
            .borrow_mut()
            .push((range.to_string(), rows.to_vec()));
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Fake enricher
// ---------------------------------------------------------------------------

#[derive(Default)]
struct FakeEnricher {
    results: HashMap<String, EnrichmentResult>,
    calls: RefCell<Vec<String>>,
}

impl FakeEnricher {
    fn with(entries: &[(&str, &str, &str, &str)]) -> Self {
        let results = entries
            .iter()
            .map(|(name, identifier, location, url)| {
                (
                    (*name).to_string(),
                    EnrichmentResult {
                        identifier: (*identifier).to_string(),
                        location: (*location).to_string(),
                        url: (*url).to_string(),
                    },
                )
            })
            .collect();
        Self {
            results,
            calls: RefCell::default(),
        }
    }

    fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }
}

impl CompanyEnricher for FakeEnricher {
    async fn enrich(&self, company_name: &str) -> EnrichmentResult {
        self.calls.borrow_mut().push(company_name.to_string());
        self.results.get(company_name).cloned().unwrap_or_default()
    }
}

fn request(column: &str) -> ReconcileRequest {
    ReconcileRequest {
        spreadsheet_id: "sheet-1".to_string(),
        sheet: "Leads".to_string(),
        column: column.to_string(),
        pacing: Duration::ZERO,
    }
}

const FULL_HEADERS: &[&str] = &["Company", "Company ID", "Company Location", "Company URL"];

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn fully_populated_sheet_is_left_alone() {
    let store = MemoryStore::with_rows(&[
        FULL_HEADERS,
        &["Acme", "1", "Austin, TX", "https://x/company/acme"],
        &["Globex", "2", "Springfield", "https://x/company/globex"],
    ]);
    let enricher = FakeEnricher::default();

    let summary = reconcile(&store, &enricher, &request("Company")).await.unwrap();

    assert!(enricher.calls().is_empty());
    assert!(store.write_ranges().is_empty());
    assert_eq!(summary.rows_scanned, 2);
    assert_eq!(summary.rows_skipped, 2);
    assert_eq!(summary.cells_written, 0);
}

#[tokio::test]
async fn second_run_after_fill_is_a_no_op() {
    let store = MemoryStore::with_rows(&[&["Company"], &["Acme"]]);
    let enricher = FakeEnricher::with(&[("Acme", "1", "Austin, TX", "https://x/company/acme")]);

    reconcile(&store, &enricher, &request("Company")).await.unwrap();
    let writes_after_first = store.write_ranges().len();
    let second = reconcile(&store, &enricher, &request("Company")).await.unwrap();

    assert_eq!(enricher.calls(), vec!["Acme".to_string()]);
    assert_eq!(store.write_ranges().len(), writes_after_first);
    assert_eq!(second.rows_enriched, 0);
    assert_eq!(second.headers_added, 0);
}

#[tokio::test]
async fn only_the_missing_location_cell_is_written() {
    let store = MemoryStore::with_rows(&[
        FULL_HEADERS,
        &["Acme", "1", "", "https://x/company/acme"],
    ]);
    let enricher = FakeEnricher::with(&[("Acme", "999", "Austin, TX", "https://x/other")]);

    let summary = reconcile(&store, &enricher, &request("Company")).await.unwrap();

    assert_eq!(enricher.calls().len(), 1);
    assert_eq!(store.write_ranges(), vec!["'Leads'!C2:C2".to_string()]);
    assert_eq!(store.cell(2, 1), "1");
    assert_eq!(store.cell(2, 2), "Austin, TX");
    assert_eq!(store.cell(2, 3), "https://x/company/acme");
    assert_eq!(summary.cells_written, 1);
}

#[tokio::test]
async fn missing_headers_are_appended_once_before_data() {
    let store = MemoryStore::with_rows(&[&["Name", "Notes"], &["Acme", ""], &["Globex", "vip"]]);
    let enricher = FakeEnricher::with(&[
        ("Acme", "1", "Austin, TX", "https://x/company/acme"),
        ("Globex", "2", "Springfield", "https://x/company/globex"),
    ]);

    let summary = reconcile(&store, &enricher, &request("Name")).await.unwrap();

    let writes = store.write_ranges();
    assert_eq!(
        writes,
        vec![
            "'Leads'!C1:E1".to_string(),
            "'Leads'!C2:E2".to_string(),
            "'Leads'!C3:E3".to_string(),
        ]
    );
    assert_eq!(
        store.writes.borrow()[0].1,
        vec![vec![
            Some("Company ID".to_string()),
            Some("Company Location".to_string()),
            Some("Company URL".to_string()),
        ]]
    );
    assert_eq!(store.cell(1, 0), "Name");
    assert_eq!(store.cell(1, 1), "Notes");
    assert_eq!(store.cell(1, 2), "Company ID");
    assert_eq!(store.cell(1, 3), "Company Location");
    assert_eq!(store.cell(1, 4), "Company URL");
    assert_eq!(store.cell(3, 1), "vip");
    assert_eq!(summary.headers_added, 3);
    assert_eq!(summary.rows_enriched, 2);
    assert_eq!(summary.cells_written, 6);
}

#[tokio::test]
async fn untouched_cells_inside_the_span_are_sent_as_none() {
    let store = MemoryStore::with_rows(&[
        &["Company", "Company ID", "Notes", "Company Location", "Company URL"],
        &["Acme", "", "keep me", "", "https://x/company/acme"],
    ]);
    let enricher = FakeEnricher::with(&[("Acme", "1", "Austin, TX", "https://x/other")]);

    reconcile(&store, &enricher, &request("Company")).await.unwrap();

    let writes = store.writes.borrow();
    assert_eq!(writes.len(), 1);
    assert_eq!(writes[0].0, "'Leads'!B2:D2");
    assert_eq!(
        writes[0].1,
        vec![vec![
            Some("1".to_string()),
            None,
            Some("Austin, TX".to_string()),
        ]]
    );
    assert_eq!(store.cell(2, 2), "keep me");
}

#[tokio::test]
async fn missing_source_column_is_an_error() {
    let store = MemoryStore::with_rows(&[FULL_HEADERS, &["Acme"]]);
    let enricher = FakeEnricher::default();

    let err = reconcile(&store, &enricher, &request("Organisation"))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        SheetsError::ColumnNotFound { ref column, ref sheet } if column == "Organisation" && sheet == "Leads"
    ));
    assert!(store.write_ranges().is_empty());
    assert!(enricher.calls().is_empty());
}

#[tokio::test]
async fn blank_names_are_skipped_and_rows_stay_aligned() {
    let store = MemoryStore::with_rows(&[FULL_HEADERS, &["Acme"], &["  "], &["Globex"]]);
    let enricher = FakeEnricher::with(&[
        ("Acme", "1", "", ""),
        ("Globex", "2", "", ""),
    ]);

    let summary = reconcile(&store, &enricher, &request("Company")).await.unwrap();

    assert_eq!(enricher.calls(), vec!["Acme".to_string(), "Globex".to_string()]);
    assert_eq!(
        store.write_ranges(),
        vec!["'Leads'!B2:B2".to_string(), "'Leads'!B4:B4".to_string()]
    );
    assert_eq!(summary.rows_scanned, 3);
    assert_eq!(summary.rows_skipped, 1);
}

#[tokio::test]
async fn empty_enrichment_writes_nothing() {
    let store = MemoryStore::with_rows(&[FULL_HEADERS, &["Unknown Co"]]);
    let enricher = FakeEnricher::default();

    let summary = reconcile(&store, &enricher, &request("Company")).await.unwrap();

    assert_eq!(enricher.calls().len(), 1);
    assert!(store.write_ranges().is_empty());
    assert_eq!(summary.rows_enriched, 1);
    assert_eq!(summary.cells_written, 0);
}

#[tokio::test]
async fn sheet_without_data_rows_only_prepares_headers() {
    let store = MemoryStore::with_rows(&[&["Company"]]);
    let enricher = FakeEnricher::default();

    let summary = reconcile(&store, &enricher, &request("Company")).await.unwrap();

    assert_eq!(store.write_ranges(), vec!["'Leads'!B1:D1".to_string()]);
    assert_eq!(summary.rows_scanned, 0);
}

#[tokio::test]
async fn blank_spreadsheet_id_is_rejected() {
    let store = MemoryStore::default();
    let enricher = FakeEnricher::default();
    let mut req = request("Company");
    req.spreadsheet_id = " ".to_string();

    let err = reconcile(&store, &enricher, &req).await.unwrap_err();
    assert!(matches!(err, SheetsError::InvalidArgument(_)));
}

#[tokio::test(start_paused = true)]
async fn pacing_separates_enriched_rows_only() {
    let store = MemoryStore::with_rows(&[
        FULL_HEADERS,
        &["Acme"],
        &["Done", "9", "Here", "https://x/company/done"],
        &["Globex"],
    ]);
    let enricher = FakeEnricher::with(&[
        ("Acme", "1", "", ""),
        ("Globex", "2", "", ""),
    ]);
    let mut req = request("Company");
    req.pacing = Duration::from_secs(10);

    let start = tokio::time::Instant::now();
    let summary = reconcile(&store, &enricher, &req).await.unwrap();
    let elapsed = start.elapsed();

    assert_eq!(summary.rows_enriched, 2);
    assert!(elapsed >= Duration::from_secs(10), "elapsed {elapsed:?}");
    assert!(elapsed < Duration::from_secs(20), "elapsed {elapsed:?}");
}

#[test]
fn row_update_spans_only_cells_with_values() {
    let layout = Layout {
        source: 0,
        outputs: [1, 2, 3],
    };
    let result = EnrichmentResult {
        identifier: String::new(),
        location: "Austin, TX".to_string(),
        url: "https://x/company/acme".to_string(),
    };

    let update = build_row_update(&layout, &[0, 1, 2], &result, "Leads", 7).unwrap();
    assert_eq!(update.range, "'Leads'!C7:D7");
    assert_eq!(
        update.cells,
        vec![
            Some("Austin, TX".to_string()),
            Some("https://x/company/acme".to_string()),
        ]
    );
    assert_eq!(update.written, 2);

    assert!(build_row_update(&layout, &[0], &result, "Leads", 7).is_none());
}

#[tokio::test]
async fn existing_headers_are_never_rewritten() {
    let store = MemoryStore::with_rows(&[
        &["Company", "001", "Company URL"],
        &["Acme", "", "https://x/company/acme"],
    ]);
    let enricher = FakeEnricher::with(&[("Acme", "1", "Austin, TX", "")]);

    let summary = reconcile(&store, &enricher, &request("Company")).await.unwrap();

    let writes = store.writes.borrow();
    assert_eq!(writes[0].0, "'Leads'!D1:E1");
    assert_eq!(
        writes[0].1,
        vec![vec![
            Some("Company ID".to_string()),
            Some("Company Location".to_string()),
        ]]
    );
    assert!(writes
        .iter()
        .all(|(range, _)| !range.contains("A1") && !range.contains("B1")));
    assert_eq!(summary.headers_added, 2);
}
