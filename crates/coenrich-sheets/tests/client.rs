//! Integration tests for `GoogleSheetsClient` using wiremock HTTP mocks.

use std::time::Duration;

use coenrich_core::EnrichmentResult;
use coenrich_sheets::{
    reconcile, CompanyEnricher, GoogleSheetsClient, RangeStore, ReconcileRequest, SheetsError,
    SpreadsheetSummary,
};
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_client(base_url: &str) -> GoogleSheetsClient {
    GoogleSheetsClient::with_base_urls("test-token", 30, base_url, base_url)
        .expect("client construction should not fail")
}

#[tokio::test]
async fn get_range_returns_cell_text() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v4/spreadsheets/sheet-1/values/'Leads'!A2:A"))
        .and(header("authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "range": "Leads!A2:A4",
            "majorDimension": "ROWS",
            "values": [["Acme"], [], ["Globex", 42]]
        })))
        .mount(&server)
        .await;

    let rows = test_client(&server.uri())
        .get_range("sheet-1", "'Leads'!A2:A")
        .await
        .expect("should read range");

    assert_eq!(
        rows,
        vec![
            vec!["Acme".to_string()],
            vec![],
            vec!["Globex".to_string(), "42".to_string()],
        ]
    );
}

#[tokio::test]
async fn empty_range_has_no_values_field() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v4/spreadsheets/sheet-1/values/'Leads'!B2:B9"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "range": "Leads!B2:B9",
            "majorDimension": "ROWS"
        })))
        .mount(&server)
        .await;

    let rows = test_client(&server.uri())
        .get_range("sheet-1", "'Leads'!B2:B9")
        .await
        .expect("should read empty range");
    assert!(rows.is_empty());
}

#[tokio::test]
async fn set_range_sends_nulls_for_untouched_cells() {
    let server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path("/v4/spreadsheets/sheet-1/values/'Leads'!B2:D2"))
        .and(query_param("valueInputOption", "USER_ENTERED"))
        .and(body_json(serde_json::json!({
            "range": "'Leads'!B2:D2",
            "majorDimension": "ROWS",
            "values": [["1", null, "Austin, TX"]]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "updatedCells": 2
        })))
        .expect(1)
        .mount(&server)
        .await;

    test_client(&server.uri())
        .set_range(
            "sheet-1",
            "'Leads'!B2:D2",
            &[vec![Some("1".to_string()), None, Some("Austin, TX".to_string())]],
        )
        .await
        .expect("should write range");
}

#[tokio::test]
async fn unauthorized_maps_to_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let err = test_client(&server.uri())
        .get_range("sheet-1", "'Leads'!1:1")
        .await
        .unwrap_err();
    assert!(matches!(err, SheetsError::Unauthorized { status: 401 }));
}

#[tokio::test]
async fn missing_spreadsheet_maps_to_not_found() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let err = test_client(&server.uri())
        .get_range("gone", "'Leads'!1:1")
        .await
        .unwrap_err();
    assert!(matches!(err, SheetsError::SpreadsheetNotFound(ref id) if id == "gone"));
}

#[tokio::test]
async fn sheet_details_maps_titles_to_header_rows() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v4/spreadsheets/sheet-1"))
        .and(query_param("fields", "sheets.properties.title"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "sheets": [
                { "properties": { "title": "Leads" } },
                { "properties": { "title": "Empty" } }
            ]
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v4/spreadsheets/sheet-1/values/'Leads'!1:1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "values": [["Company", "Company URL"]]
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v4/spreadsheets/sheet-1/values/'Empty'!1:1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .mount(&server)
        .await;

    let details = test_client(&server.uri())
        .sheet_details("sheet-1")
        .await
        .expect("should load details");

    assert_eq!(details.len(), 2);
    assert_eq!(details[0].title, "Leads");
    assert_eq!(details[0].headers, vec!["Company", "Company URL"]);
    assert_eq!(details[1].title, "Empty");
    assert!(details[1].headers.is_empty());
}

#[tokio::test]
async fn list_spreadsheets_follows_pagination() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/drive/v3/files"))
        .and(query_param("pageToken", "page-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "files": [{ "id": "b", "name": "Second" }]
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/drive/v3/files"))
        .and(query_param(
            "q",
            "mimeType='application/vnd.google-apps.spreadsheet'",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "files": [{ "id": "a", "name": "First" }],
            "nextPageToken": "page-2"
        })))
        .mount(&server)
        .await;

    let files = test_client(&server.uri())
        .list_spreadsheets()
        .await
        .expect("should list spreadsheets");

    assert_eq!(
        files,
        vec![
            SpreadsheetSummary {
                id: "a".to_string(),
                name: "First".to_string(),
            },
            SpreadsheetSummary {
                id: "b".to_string(),
                name: "Second".to_string(),
            },
        ]
    );
}

#[tokio::test]
async fn list_spreadsheets_forbidden_is_unauthorized() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/drive/v3/files"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let err = test_client(&server.uri())
        .list_spreadsheets()
        .await
        .unwrap_err();
    assert!(matches!(err, SheetsError::Unauthorized { status: 403 }));
}

struct StaticEnricher;

impl CompanyEnricher for StaticEnricher {
    async fn enrich(&self, _company_name: &str) -> EnrichmentResult {
        EnrichmentResult {
            identifier: "1".to_string(),
            location: "Austin, TX".to_string(),
            url: "https://www.linkedin.com/company/acme".to_string(),
        }
    }
}

#[tokio::test]
async fn reconcile_over_http_writes_headers_then_row() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v4/spreadsheets/sheet-1/values/'Leads'!1:1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "values": [["Company"]]
        })))
        .mount(&server)
        .await;

    Mock::given(method("PUT"))
        .and(path("/v4/spreadsheets/sheet-1/values/'Leads'!B1:D1"))
        .and(body_json(serde_json::json!({
            "range": "'Leads'!B1:D1",
            "majorDimension": "ROWS",
            "values": [["Company ID", "Company Location", "Company URL"]]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v4/spreadsheets/sheet-1/values/'Leads'!A2:A"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "values": [["Acme"]]
        })))
        .mount(&server)
        .await;

    for column in ["B", "C", "D"] {
        Mock::given(method("GET"))
            .and(path(format!(
                "/v4/spreadsheets/sheet-1/values/'Leads'!{column}2:{column}2"
            )))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .mount(&server)
            .await;
    }

    Mock::given(method("PUT"))
        .and(path("/v4/spreadsheets/sheet-1/values/'Leads'!B2:D2"))
        .and(body_json(serde_json::json!({
            "range": "'Leads'!B2:D2",
            "majorDimension": "ROWS",
            "values": [["1", "Austin, TX", "https://www.linkedin.com/company/acme"]]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let request = ReconcileRequest {
        spreadsheet_id: "sheet-1".to_string(),
        sheet: "Leads".to_string(),
        column: "Company".to_string(),
        pacing: Duration::ZERO,
    };
    let summary = reconcile(&test_client(&server.uri()), &StaticEnricher, &request)
        .await
        .expect("reconcile should succeed");

    assert_eq!(summary.headers_added, 3);
    assert_eq!(summary.rows_enriched, 1);
    assert_eq!(summary.cells_written, 3);
}
