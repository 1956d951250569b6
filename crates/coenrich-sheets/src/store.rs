use crate::error::SheetsError;

/// Read/write access to rectangular cell ranges addressed in A1 notation.
///
/// Reads return rows of cell text; rows and trailing cells the store omits
/// are simply absent; see [`first_cell`]. On writes a `None` cell
/// leaves the existing value untouched.
#[allow(async_fn_in_trait)]
pub trait RangeStore {
    /// # Errors
    ///
    /// Returns a [`SheetsError`] when the range cannot be read.
    async fn get_range(
        &self,
        spreadsheet_id: &str,
        range: &str,
    ) -> Result<Vec<Vec<String>>, SheetsError>;

    /// # Errors
    ///
    /// Returns a [`SheetsError`] when the range cannot be written.
    async fn set_range(
        &self,
        spreadsheet_id: &str,
        range: &str,
        rows: &[Vec<Option<String>>],
    ) -> Result<(), SheetsError>;
}

/// Text of the first cell of row `index`, or `""` when the row or cell is
/// absent. Keeps sparse single-column reads aligned with sheet rows.
#[must_use]
pub fn first_cell(rows: &[Vec<String>], index: usize) -> &str {
    rows.get(index)
        .and_then(|row| row.first())
        .map_or("", String::as_str)
}
