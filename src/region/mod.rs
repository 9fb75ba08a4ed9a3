//! # Table Region Module
//!
//! A table region is a header row plus the dense block of data rows below it,
//! starting at a configurable column. [`TableRegion`] binds to a sheet, caches
//! where the data ends and what the header says, and hands out ranges computed
//! from that cache.
mod config;
mod controller;
mod range;
pub mod scan;

pub use config::{
    Invalidation, InvalidationReason, RegionConfig, RegionSettings, RegionUpdate, DEFAULT_HEADER_ROW,
    DEFAULT_START_COLUMN,
};
pub use controller::TableRegion;
pub use range::RangeAddress;
