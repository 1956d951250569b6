pub mod a1;
pub mod client;
pub mod error;
pub mod reconcile;
pub mod store;
pub mod types;

pub use client::GoogleSheetsClient;
pub use error::SheetsError;
pub use reconcile::{reconcile, CompanyEnricher, ReconcileRequest, ReconcileSummary};
pub use store::RangeStore;
pub use types::{SheetHeaders, SpreadsheetSummary};
