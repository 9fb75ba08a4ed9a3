use crate::error::RegionError;
use crate::spreadsheet::reference::{cell_reference, letters_to_column, parse_row};
use regex::Regex;
use std::fmt::Display;
use std::sync::LazyLock;

static A1_RANGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Z]+)(\d+)(?::([A-Z]+)(\d+))?$").expect("Hardcode regex pattern"));

/// Last index of a span of `count` starting at `start`, None past `u32::MAX`.
const fn span_end(start: u32, count: u32) -> Option<u32> {
    match count {
        0 => Some(start.saturating_sub(1)),
        _ => start.checked_add(count - 1),
    }
}

/// Immutable descriptor of a rectangular sub-region of a sheet.
///
/// Rows and columns are 1-based. Counts may be zero, which describes an empty
/// region anchored at the start cell; reading one yields no values.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct RangeAddress {
    start_row: u32,
    start_column: u32,
    row_count: u32,
    column_count: u32,
}

impl RangeAddress {
    /// Creates a single-cell address. Use [`rows`](Self::rows) and
    /// [`columns`](Self::columns) to widen it.
    pub const fn new(start_row: u32, start_column: u32) -> Self {
        Self::with_size(start_row, start_column, 1, 1)
    }

    pub const fn with_size(start_row: u32, start_column: u32, row_count: u32, column_count: u32) -> Self {
        Self {
            start_row,
            start_column,
            row_count,
            column_count,
        }
    }

    /// Returns a copy of this address spanning `row_count` rows.
    pub const fn rows(self, row_count: u32) -> Self {
        Self { row_count, ..self }
    }

    /// Returns a copy of this address spanning `column_count` columns.
    pub const fn columns(self, column_count: u32) -> Self {
        Self { column_count, ..self }
    }

    pub const fn start_row(&self) -> u32 {
        self.start_row
    }

    pub const fn start_column(&self) -> u32 {
        self.start_column
    }

    pub const fn row_count(&self) -> u32 {
        self.row_count
    }

    pub const fn column_count(&self) -> u32 {
        self.column_count
    }

    /// Last row covered; one before `start_row` for an empty region. Saturates
    /// at `u32::MAX` for regions running past the addressable rows.
    pub fn end_row(&self) -> u32 {
        self.checked_end_row().unwrap_or(u32::MAX)
    }

    /// Last column covered; one before `start_column` for an empty region.
    /// Saturates at `u32::MAX` like [`end_row`](Self::end_row).
    pub fn end_column(&self) -> u32 {
        self.checked_end_column().unwrap_or(u32::MAX)
    }

    pub const fn checked_end_row(&self) -> Option<u32> {
        span_end(self.start_row, self.row_count)
    }

    pub const fn checked_end_column(&self) -> Option<u32> {
        span_end(self.start_column, self.column_count)
    }

    pub const fn is_empty(&self) -> bool {
        self.row_count == 0 || self.column_count == 0
    }

    pub fn contains(&self, row: u32, column: u32) -> bool {
        !self.is_empty()
            && (self.start_row..=self.end_row()).contains(&row)
            && (self.start_column..=self.end_column()).contains(&column)
    }
}

impl Display for RangeAddress {
    /// Formats as A1 notation: "B2" for a single cell, "B2:C5" otherwise.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let start = cell_reference(self.start_row, self.start_column);
        if self.row_count == 1 && self.column_count == 1 {
            f.write_str(&start)
        } else {
            write!(f, "{start}:{}", cell_reference(self.end_row(), self.end_column()))
        }
    }
}

impl TryFrom<&str> for RangeAddress {
    type Error = RegionError;

    /// Parses an A1-style range ("C3" or "B2:D10"). Corners may be given in
    /// any order; the address always starts at the top-left one.
    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let value = value.trim().to_ascii_uppercase();
        let invalid = || RegionError::InvalidRange(value.clone());
        let captures = A1_RANGE.captures(&value).ok_or_else(invalid)?;
        let corner = |column: usize, row: usize| -> Option<(u32, u32)> {
            let column = letters_to_column(captures.get(column)?.as_str())?;
            let row = parse_row(captures.get(row)?.as_str())?;
            Some((row, column))
        };
        let (first_row, first_column) = corner(1, 2).ok_or_else(invalid)?;
        let (second_row, second_column) = match captures.get(3) {
            Some(_) => corner(3, 4).ok_or_else(invalid)?,
            None => (first_row, first_column),
        };
        let start_row = first_row.min(second_row);
        let start_column = first_column.min(second_column);
        Ok(RangeAddress::with_size(
            start_row,
            start_column,
            first_row.max(second_row) - start_row + 1,
            first_column.max(second_column) - start_column + 1,
        ))
    }
}
