use crate::error::{RegionError, Result};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Header row used when a configuration names none.
pub const DEFAULT_HEADER_ROW: u32 = 1;
/// Start column used when a configuration names none.
pub const DEFAULT_START_COLUMN: u32 = 1;

/// Configuration a region is initialized from.
///
/// Absent fields take their defaults: the provider's active workbook, header
/// row 1, start column 1, and a key column equal to the start column.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RegionConfig {
    pub workbook_id: Option<String>,
    pub sheet_name: String,
    pub header_row: Option<u32>,
    pub start_column: Option<u32>,
    pub key_column: Option<u32>,
}

impl RegionConfig {
    pub fn new(sheet_name: impl Into<String>) -> Self {
        Self {
            sheet_name: sheet_name.into(),
            ..Self::default()
        }
    }

    pub fn workbook_id(mut self, workbook_id: impl Into<String>) -> Self {
        self.workbook_id = Some(workbook_id.into());
        self
    }

    pub fn header_row(mut self, header_row: u32) -> Self {
        self.header_row = Some(header_row);
        self
    }

    pub fn start_column(mut self, start_column: u32) -> Self {
        self.start_column = Some(start_column);
        self
    }

    pub fn key_column(mut self, key_column: u32) -> Self {
        self.key_column = Some(key_column);
        self
    }
}

/// Partial configuration: present fields overwrite, absent fields are kept.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RegionUpdate {
    pub workbook_id: Option<String>,
    pub sheet_name: Option<String>,
    pub header_row: Option<u32>,
    pub start_column: Option<u32>,
    pub key_column: Option<u32>,
}

impl RegionUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn workbook_id(mut self, workbook_id: impl Into<String>) -> Self {
        self.workbook_id = Some(workbook_id.into());
        self
    }

    pub fn sheet_name(mut self, sheet_name: impl Into<String>) -> Self {
        self.sheet_name = Some(sheet_name.into());
        self
    }

    pub fn header_row(mut self, header_row: u32) -> Self {
        self.header_row = Some(header_row);
        self
    }

    pub fn start_column(mut self, start_column: u32) -> Self {
        self.start_column = Some(start_column);
        self
    }

    pub fn key_column(mut self, key_column: u32) -> Self {
        self.key_column = Some(key_column);
        self
    }
}

/// Fully resolved configuration of a bound region.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegionSettings {
    /// Identifier of the bound workbook (the active one's, if none was named)
    pub workbook_id: String,
    pub sheet_name: String,
    pub header_row: u32,
    pub start_column: u32,
    pub key_column: u32,
}

impl RegionSettings {
    /// Resolves an initial configuration against the workbook it was bound to.
    pub(crate) fn resolve(config: &RegionConfig, workbook_id: String) -> Result<Self> {
        let start_column = config.start_column.unwrap_or(DEFAULT_START_COLUMN);
        let settings = Self {
            workbook_id,
            sheet_name: config.sheet_name.clone(),
            header_row: config.header_row.unwrap_or(DEFAULT_HEADER_ROW),
            start_column,
            key_column: config.key_column.unwrap_or(start_column),
        };
        settings.validate()?;
        Ok(settings)
    }

    /// Applies a partial update.
    ///
    /// Moving to another workbook or sheet resets the header row, start column
    /// and key column to their defaults unless the update supplies them. Without
    /// a rebind, the key column follows the start column only when the start
    /// column changes and no key column is given.
    pub(crate) fn merge(&self, update: &RegionUpdate) -> Result<Self> {
        let workbook_id = update.workbook_id.clone().unwrap_or_else(|| self.workbook_id.clone());
        let sheet_name = update.sheet_name.clone().unwrap_or_else(|| self.sheet_name.clone());
        let rebound = workbook_id != self.workbook_id || sheet_name != self.sheet_name;

        let settings = if rebound {
            let start_column = update.start_column.unwrap_or(DEFAULT_START_COLUMN);
            Self {
                workbook_id,
                sheet_name,
                header_row: update.header_row.unwrap_or(DEFAULT_HEADER_ROW),
                start_column,
                key_column: update.key_column.unwrap_or(start_column),
            }
        } else {
            let start_column = update.start_column.unwrap_or(self.start_column);
            let key_column = match update.key_column {
                Some(key_column) => key_column,
                None if start_column != self.start_column => start_column,
                None => self.key_column,
            };
            Self {
                workbook_id,
                sheet_name,
                header_row: update.header_row.unwrap_or(self.header_row),
                start_column,
                key_column,
            }
        };
        settings.validate()?;
        Ok(settings)
    }

    pub fn data_start_row(&self) -> u32 {
        self.header_row + 1
    }

    /// Lists what moved between `self` and `next` that stales the cached boundaries.
    pub fn diff(&self, next: &Self) -> Invalidation {
        let mut invalidation = Invalidation::default();
        if self.workbook_id != next.workbook_id {
            invalidation.insert(InvalidationReason::Resource);
        }
        if self.sheet_name != next.sheet_name {
            invalidation.insert(InvalidationReason::Sheet);
        }
        if self.header_row != next.header_row {
            invalidation.insert(InvalidationReason::HeaderRow);
        }
        if self.start_column != next.start_column {
            invalidation.insert(InvalidationReason::StartColumn);
        }
        invalidation
    }

    /// Value copy of these settings as an explicit initial configuration.
    pub fn to_config(&self) -> RegionConfig {
        RegionConfig::new(self.sheet_name.as_str())
            .workbook_id(self.workbook_id.as_str())
            .header_row(self.header_row)
            .start_column(self.start_column)
            .key_column(self.key_column)
    }

    fn validate(&self) -> Result<()> {
        if self.sheet_name.is_empty() {
            return Err(RegionError::InvalidConfig {
                field: "sheetName",
                message: "must not be empty".to_owned(),
            });
        }
        for (field, value) in [
            ("headerRow", self.header_row),
            ("startColumn", self.start_column),
            ("keyColumn", self.key_column),
        ] {
            if value == 0 {
                return Err(RegionError::InvalidConfig {
                    field,
                    message: "positions are 1-based".to_owned(),
                });
            }
        }
        Ok(())
    }
}

/// A configuration change that stales the cached boundaries.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum InvalidationReason {
    Resource,
    Sheet,
    HeaderRow,
    StartColumn,
}

impl InvalidationReason {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Resource => "resource",
            Self::Sheet => "sheet",
            Self::HeaderRow => "header-row",
            Self::StartColumn => "start-column",
        }
    }
}

/// Set of reasons produced by [`RegionSettings::diff`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Invalidation {
    reasons: Vec<InvalidationReason>,
}

impl Invalidation {
    fn insert(&mut self, reason: InvalidationReason) {
        if !self.reasons.contains(&reason) {
            self.reasons.push(reason);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.reasons.is_empty()
    }

    pub fn contains(&self, reason: InvalidationReason) -> bool {
        self.reasons.contains(&reason)
    }

    pub fn reasons(&self) -> &[InvalidationReason] {
        &self.reasons
    }
}

impl Display for Invalidation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.reasons.iter().map(InvalidationReason::as_str).collect();
        f.write_str(&names.join(","))
    }
}
