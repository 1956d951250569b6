//! A1 notation helpers.
//!
//! Column indexes are 0-based throughout the crate; rows are the 1-based
//! numbers shown in the spreadsheet UI.

/// First sheet row holding data. Row 1 is the header row.
pub const FIRST_DATA_ROW: usize = 2;

/// Converts a 0-based column index to its A1 letters using bijective
/// base-26: `0 -> A`, `25 -> Z`, `26 -> AA`, `701 -> ZZ`, `702 -> AAA`.
#[must_use]
pub fn column_letter(index: usize) -> String {
    let mut n = index + 1;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = u8::try_from((n - 1) % 26).unwrap_or_default();
        letters.push(char::from(b'A' + rem));
        n = (n - 1) / 26;
    }
    letters.iter().rev().collect()
}

/// Quotes a sheet title for use in a range, doubling embedded apostrophes.
#[must_use]
pub fn quote_sheet(sheet: &str) -> String {
    format!("'{}'", sheet.replace('\'', "''"))
}

/// The whole header row: `'Sheet'!1:1`.
#[must_use]
pub fn header_row(sheet: &str) -> String {
    format!("{}!1:1", quote_sheet(sheet))
}

/// An open-ended column from the first data row down: `'Sheet'!C2:C`.
#[must_use]
pub fn column_from_data_start(sheet: &str, column: usize) -> String {
    let letter = column_letter(column);
    format!("{}!{letter}{FIRST_DATA_ROW}:{letter}", quote_sheet(sheet))
}

/// A single column over an inclusive row span: `'Sheet'!C2:C40`.
#[must_use]
pub fn column_span(sheet: &str, column: usize, first_row: usize, last_row: usize) -> String {
    let letter = column_letter(column);
    format!("{}!{letter}{first_row}:{letter}{last_row}", quote_sheet(sheet))
}

/// A horizontal span within one row: `'Sheet'!C5:E5`.
#[must_use]
pub fn row_span(sheet: &str, row: usize, first_column: usize, last_column: usize) -> String {
    format!(
        "{}!{}{row}:{}{row}",
        quote_sheet(sheet),
        column_letter(first_column),
        column_letter(last_column)
    )
}
