//! Boundary discovery over a [`Sheet`] using its "jump to next data cell" primitive.
use crate::spreadsheet::{Direction, ResourceError, Sheet};
use tracing::trace;

/// Finds the last populated data row of `key_column`.
///
/// Jumps upward from the bottom physical row. When the bottom cell is itself
/// populated and the jump lands at or above the header row, the column is
/// filled to the physical end of the sheet and the bottom row is the answer.
/// A result above the header row means there are no data rows and is reported
/// as the header row itself.
pub fn last_populated_row(sheet: &dyn Sheet, header_row: u32, key_column: u32) -> Result<u32, ResourceError> {
    let bottom = sheet.max_rows();
    if header_row > bottom {
        return Err(ResourceError::OutOfBounds {
            row: header_row,
            column: key_column,
            max_rows: bottom,
            max_columns: sheet.max_columns(),
        });
    }
    let (row, _) = sheet.next_populated(bottom, key_column, Direction::Up)?;
    let bottom_populated = !sheet.value_at(bottom, key_column)?.is_empty();
    let last_row = if bottom_populated && row <= header_row {
        bottom
    } else {
        row.max(header_row)
    };
    trace!(bottom, key_column, landed = row, bottom_populated, last_row, "scanned last row");
    Ok(last_row)
}

/// Finds the last header column, jumping right from the header start cell.
///
/// An empty start cell means there is no header and yields `start_column - 1`.
/// Otherwise the column is wherever the jump lands: the end of a contiguous
/// header run, or the next populated cell past a gap (the sheet's last column
/// if there is none).
pub fn last_populated_column(sheet: &dyn Sheet, header_row: u32, start_column: u32) -> Result<u32, ResourceError> {
    if sheet.value_at(header_row, start_column)?.is_empty() {
        trace!(header_row, start_column, "header start cell is empty");
        return Ok(start_column - 1);
    }
    let (_, last_column) = sheet.next_populated(header_row, start_column, Direction::Next)?;
    trace!(header_row, start_column, last_column, "scanned last column");
    Ok(last_column)
}
