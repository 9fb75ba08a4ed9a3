//! # Sheet Region
//!
//! Header-addressed table regions inside mutable spreadsheet grids.
//!
//! A [`TableRegion`] observes a sheet through the [`spreadsheet`] capability
//! traits and keeps a cache of positional facts about the table it manages:
//!
//! - **Data boundaries**: the last populated row, found by jumping upward in a
//!   key column, and the last header column, found by jumping right along the
//!   header row
//! - **Header index**: the header cell values and their absolute columns
//! - **Range arithmetic**: header, data area, row and column ranges built from
//!   the cached boundaries
//! - **Invalidation**: configuration updates are diffed against the current
//!   settings and only a change that moves the region triggers a rescan
//!
//! The [`spreadsheet::memory`] backend provides an in-memory grid with the same
//! scan semantics as hosted spreadsheets.
//!
//! ```
//! use sheet_region::spreadsheet::memory::{MemoryProvider, MemoryWorkbook};
//! use sheet_region::{RegionConfig, TableRegion};
//! use std::rc::Rc;
//!
//! let provider = Rc::new(MemoryProvider::with_active(MemoryWorkbook::new("books")));
//! let mut region = TableRegion::initialize(provider, RegionConfig::new("Shelf")).unwrap();
//! region.write_header(["Title", "Author"]).unwrap();
//! assert_eq!(region.header_column_of("Author").unwrap(), 2);
//! ```
mod error;
pub mod region;
pub mod spreadsheet;

pub use error::{RegionError, Result};
pub use region::{
    Invalidation, InvalidationReason, RangeAddress, RegionConfig, RegionSettings, RegionUpdate, TableRegion,
};
pub use spreadsheet::{
    CellValue, Dimension, Direction, ResourceError, ResourceProvider, Sheet, SheetRange, Workbook,
};
