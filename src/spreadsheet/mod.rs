//! # Tabular Resource Module
//!
//! This module defines the capability the table region controller works
//! through: a provider that opens workbooks, workbooks that hold named sheets,
//! and sheets that read, write, insert and scan cells. Backends implement the
//! [`ResourceProvider`], [`Workbook`] and [`Sheet`] traits; [`memory`] ships an
//! in-memory backend.
//!
//! Handles are shared (`Rc`) and every method takes `&self`: a sheet handle is a
//! view onto a grid owned by its workbook, the way spreadsheet scripting APIs
//! hand out sheet objects. Everything here is single-threaded.
use crate::region::RangeAddress;
use std::fmt::Debug;
use std::rc::Rc;
use thiserror::Error;

pub mod cell;
pub mod memory;
pub mod reference;

pub use cell::CellValue;

/// Errors raised by a tabular resource backend.
#[derive(Error, Debug)]
pub enum ResourceError {
    /// No workbook is registered under the identifier
    #[error("Workbook '{id}' not found")]
    NotFound { id: String },

    /// The provider has no current workbook to fall back to
    #[error("No active workbook")]
    NoActiveWorkbook,

    /// Sheet names are unique within a workbook
    #[error("Sheet '{name}' already exists")]
    DuplicateSheet { name: String },

    /// Access outside the physical grid
    #[error("Cell ({row}, {column}) is outside the sheet bounds {max_rows}x{max_columns}")]
    OutOfBounds {
        row: u32,
        column: u32,
        max_rows: u32,
        max_columns: u32,
    },

    /// Values written do not match the shape of the target range
    #[error("Values are {rows}x{columns} but the range is {expected_rows}x{expected_columns}")]
    ShapeMismatch {
        expected_rows: u32,
        expected_columns: u32,
        rows: u32,
        columns: u32,
    },

    /// Opaque failure reported by a foreign backend
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

/// Direction of a "jump to next data cell" scan.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Direction {
    /// Towards row 1
    Up,
    /// Towards the last physical row
    Down,
    /// Towards the last physical column
    Next,
    /// Towards column 1
    Previous,
}

/// Axis along which inserted cells shift existing ones.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Dimension {
    /// Shift existing cells down
    Rows,
    /// Shift existing cells right
    Columns,
}

/// Opens workbooks by identifier and supplies the ambient "current" one.
pub trait ResourceProvider: Debug {
    fn open_by_id(&self, id: &str) -> Result<Rc<dyn Workbook>, ResourceError>;

    /// Workbook used when a configuration names no identifier.
    fn active(&self) -> Result<Rc<dyn Workbook>, ResourceError>;
}

/// A collection of uniquely named sheets.
pub trait Workbook: Debug {
    fn id(&self) -> String;
    fn sheet_names(&self) -> Vec<String>;
    fn sheet_by_name(&self, name: &str) -> Option<Rc<dyn Sheet>>;
    fn insert_sheet(&self, name: &str) -> Result<Rc<dyn Sheet>, ResourceError>;
}

/// A mutable grid of cells with fixed physical extents.
///
/// Rows and columns are 1-based. Implementations report any access outside
/// `max_rows() x max_columns()` as [`ResourceError::OutOfBounds`].
pub trait Sheet: Debug {
    fn name(&self) -> String;
    fn max_rows(&self) -> u32;
    fn max_columns(&self) -> u32;

    fn value_at(&self, row: u32, column: u32) -> Result<CellValue, ResourceError>;

    /// Moves from a cell the way Ctrl+Arrow does in a spreadsheet frontend:
    ///
    /// - at the sheet edge in `direction`, stays put;
    /// - if the cell and its neighbour are both populated, stops at the last
    ///   populated cell of that contiguous run;
    /// - otherwise stops at the first populated cell in `direction`, or at the
    ///   sheet edge if there is none.
    ///
    /// Returns the `(row, column)` it stopped at.
    fn next_populated(&self, row: u32, column: u32, direction: Direction) -> Result<(u32, u32), ResourceError>;

    /// Reads a rectangular block, row-major.
    fn values(&self, address: &RangeAddress) -> Result<Vec<Vec<CellValue>>, ResourceError>;

    /// Writes a rectangular block whose shape must match `address`.
    fn set_values(&self, address: &RangeAddress, values: &[Vec<CellValue>]) -> Result<(), ResourceError>;

    /// Inserts blank cells over `address`, shifting existing cells along `dimension`.
    fn insert_cells(&self, address: &RangeAddress, dimension: Dimension) -> Result<(), ResourceError>;
}

/// Handle to a rectangular region of a sheet.
#[derive(Clone, Debug)]
pub struct SheetRange {
    sheet: Rc<dyn Sheet>,
    address: RangeAddress,
}

impl SheetRange {
    pub fn new(sheet: Rc<dyn Sheet>, address: RangeAddress) -> Self {
        Self { sheet, address }
    }

    pub fn address(&self) -> RangeAddress {
        self.address
    }

    pub fn sheet(&self) -> &Rc<dyn Sheet> {
        &self.sheet
    }

    /// Returns the A1 notation of the region, qualified by sheet name.
    pub fn a1(&self) -> String {
        format!("'{}'!{}", self.sheet.name().replace('\'', "''"), self.address)
    }

    pub fn values(&self) -> Result<Vec<Vec<CellValue>>, ResourceError> {
        self.sheet.values(&self.address)
    }

    pub fn set_values(&self, values: &[Vec<CellValue>]) -> Result<(), ResourceError> {
        self.sheet.set_values(&self.address, values)
    }

    pub fn insert_cells(&self, dimension: Dimension) -> Result<(), ResourceError> {
        self.sheet.insert_cells(&self.address, dimension)
    }
}
