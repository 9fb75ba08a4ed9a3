use crate::error::{RegionError, Result, ResultOpenTarget};
use crate::region::config::{Invalidation, InvalidationReason, RegionConfig, RegionSettings, RegionUpdate};
use crate::region::range::RangeAddress;
use crate::region::scan::{last_populated_column, last_populated_row};
use crate::spreadsheet::{CellValue, Dimension, ResourceProvider, Sheet, SheetRange, Workbook};
use std::collections::BTreeMap;
use std::rc::Rc;
use tracing::debug;

/// Boundaries derived from the bound sheet, recomputed by the controller only.
///
/// The row pair (`last_row`, `row_count`) and the column triple
/// (`last_column`, `column_count`, `header`) are always refreshed together.
#[derive(Clone, Debug, Default, PartialEq)]
struct Boundaries {
    last_row: u32,
    row_count: u32,
    last_column: u32,
    column_count: u32,
    header: Vec<CellValue>,
}

/// Controller of a header-addressed data region inside a sheet.
///
/// The header row holds the column names starting at the start column; data
/// rows follow directly below it. The last data row (probed in the key column)
/// and the header extent are cached and recomputed whenever a configuration
/// change moves the region, or after this controller writes to the sheet.
/// Changes made to the sheet by anyone else are not noticed until
/// [`refresh`](Self::refresh) is called.
#[derive(Debug)]
pub struct TableRegion {
    provider: Rc<dyn ResourceProvider>,
    workbook: Rc<dyn Workbook>,
    sheet: Rc<dyn Sheet>,
    settings: RegionSettings,
    boundaries: Boundaries,
}

impl TableRegion {
    /// Binds to the configured workbook and sheet, creating the sheet if it does
    /// not exist, then scans the region's boundaries.
    ///
    /// The workbook is opened by identifier, or taken from the provider's active
    /// workbook when the configuration names none.
    ///
    /// # Errors
    ///
    /// Returns [`RegionError::ResourceOpen`] if the workbook cannot be opened or
    /// the sheet cannot be created, and [`RegionError::InvalidConfig`] for
    /// zero positions or an empty sheet name.
    pub fn initialize(provider: Rc<dyn ResourceProvider>, config: RegionConfig) -> Result<Self> {
        let workbook = match &config.workbook_id {
            Some(id) => provider.open_by_id(id).opening(|| id.clone())?,
            None => provider.active().opening(|| "active workbook".to_owned())?,
        };
        let settings = RegionSettings::resolve(&config, workbook.id())?;
        let sheet = Self::bind_sheet(workbook.as_ref(), &settings.sheet_name)?;

        let mut region = Self {
            provider,
            workbook,
            sheet,
            settings,
            boundaries: Boundaries::default(),
        };
        region.refresh()?;
        debug!(
            workbook = %region.settings.workbook_id,
            sheet = %region.settings.sheet_name,
            header_row = region.settings.header_row,
            start_column = region.settings.start_column,
            key_column = region.settings.key_column,
            "initialized table region"
        );
        Ok(region)
    }

    /// Applies a partial configuration and rescans the boundaries if the
    /// region moved.
    ///
    /// A change of workbook, sheet, header row or start column recomputes every
    /// cached boundary. On error the region is left as it was.
    ///
    /// # Errors
    ///
    /// Returns [`RegionError::ResourceOpen`] if a newly named workbook cannot be
    /// opened, [`RegionError::InvalidConfig`] for invalid values, and resource
    /// errors raised while rescanning.
    pub fn update(&mut self, update: RegionUpdate) -> Result<Invalidation> {
        let settings = self.settings.merge(&update)?;
        let invalidation = self.settings.diff(&settings);

        let workbook = if settings.workbook_id != self.settings.workbook_id {
            let id = settings.workbook_id.as_str();
            self.provider.open_by_id(id).opening(|| id.to_owned())?
        } else {
            Rc::clone(&self.workbook)
        };
        let rebound = invalidation.contains(InvalidationReason::Resource) || invalidation.contains(InvalidationReason::Sheet);
        let sheet = if rebound {
            Self::bind_sheet(workbook.as_ref(), &settings.sheet_name)?
        } else {
            Rc::clone(&self.sheet)
        };
        let boundaries = if invalidation.is_empty() {
            self.boundaries.clone()
        } else {
            Self::scan(sheet.as_ref(), &settings)?
        };

        debug!(
            sheet = %settings.sheet_name,
            header_row = settings.header_row,
            start_column = settings.start_column,
            key_column = settings.key_column,
            invalidated = %invalidation,
            "updated table region"
        );
        self.workbook = workbook;
        self.sheet = sheet;
        self.settings = settings;
        self.boundaries = boundaries;
        Ok(invalidation)
    }

    /// Builds a region with the same settings bound to another workbook, for
    /// example after the sheet was copied there.
    ///
    /// # Errors
    ///
    /// Same as [`initialize`](Self::initialize).
    pub fn sibling(&self, workbook_id: &str) -> Result<Self> {
        let config = self.settings.to_config().workbook_id(workbook_id);
        Self::initialize(Rc::clone(&self.provider), config)
    }

    fn bind_sheet(workbook: &dyn Workbook, name: &str) -> Result<Rc<dyn Sheet>> {
        match workbook.sheet_by_name(name) {
            Some(sheet) => Ok(sheet),
            None => {
                debug!(workbook = %workbook.id(), sheet = name, "creating missing sheet");
                workbook.insert_sheet(name).opening(|| format!("{}!{}", workbook.id(), name))
            }
        }
    }

    fn scan(sheet: &dyn Sheet, settings: &RegionSettings) -> Result<Boundaries> {
        let mut boundaries = Boundaries::default();
        Self::scan_rows(sheet, settings, &mut boundaries)?;
        Self::scan_columns(sheet, settings, &mut boundaries)?;
        Ok(boundaries)
    }

    fn scan_rows(sheet: &dyn Sheet, settings: &RegionSettings, boundaries: &mut Boundaries) -> Result<()> {
        let last_row = last_populated_row(sheet, settings.header_row, settings.key_column)?;
        boundaries.last_row = last_row;
        boundaries.row_count = last_row + 1 - settings.data_start_row();
        Ok(())
    }

    fn scan_columns(sheet: &dyn Sheet, settings: &RegionSettings, boundaries: &mut Boundaries) -> Result<()> {
        let last_column = last_populated_column(sheet, settings.header_row, settings.start_column)?;
        let column_count = last_column + 1 - settings.start_column;
        let address = RangeAddress::new(settings.header_row, settings.start_column).columns(column_count);
        boundaries.header = match column_count {
            0 => Vec::new(),
            _ => sheet.values(&address)?.into_iter().next().unwrap_or_default(),
        };
        boundaries.last_column = last_column;
        boundaries.column_count = column_count;
        Ok(())
    }

    /// Recomputes every cached boundary.
    pub fn refresh(&mut self) -> Result<()> {
        self.boundaries = Self::scan(self.sheet.as_ref(), &self.settings)?;
        debug!(
            last_row = self.boundaries.last_row,
            last_column = self.boundaries.last_column,
            row_count = self.boundaries.row_count,
            column_count = self.boundaries.column_count,
            "refreshed boundaries"
        );
        Ok(())
    }

    /// Recomputes the last data row and the row count.
    pub fn refresh_last_row(&mut self) -> Result<()> {
        Self::scan_rows(self.sheet.as_ref(), &self.settings, &mut self.boundaries)?;
        debug!(last_row = self.boundaries.last_row, row_count = self.boundaries.row_count, "refreshed last row");
        Ok(())
    }

    /// Recomputes the last header column, the column count and the header.
    pub fn refresh_last_column(&mut self) -> Result<()> {
        Self::scan_columns(self.sheet.as_ref(), &self.settings, &mut self.boundaries)?;
        debug!(
            last_column = self.boundaries.last_column,
            column_count = self.boundaries.column_count,
            "refreshed last column"
        );
        Ok(())
    }

    /// Handle to an arbitrary region of the bound sheet.
    pub fn range(&self, address: RangeAddress) -> SheetRange {
        SheetRange::new(Rc::clone(&self.sheet), address)
    }

    /// Handle to a region of the bound sheet given in A1 notation, such as "B2:D5".
    ///
    /// # Errors
    ///
    /// Returns [`RegionError::InvalidRange`] if `reference` is not an A1 range.
    pub fn range_a1(&self, reference: &str) -> Result<SheetRange> {
        Ok(self.range(RangeAddress::try_from(reference)?))
    }

    /// Rows `[start_row, start_row + row_count)` across the region's columns,
    /// or across the whole sheet width when `whole_row` is set.
    pub fn row_range(&self, start_row: u32, row_count: u32, whole_row: bool) -> SheetRange {
        let address = if whole_row {
            RangeAddress::with_size(start_row, 1, row_count, self.sheet.max_columns())
        } else {
            RangeAddress::with_size(start_row, self.settings.start_column, row_count, self.boundaries.column_count)
        };
        self.range(address)
    }

    /// Columns `[start_column, start_column + column_count)` across the data
    /// rows, or across the whole sheet height when `whole_column` is set.
    pub fn column_range(&self, start_column: u32, column_count: u32, whole_column: bool) -> SheetRange {
        let address = if whole_column {
            RangeAddress::with_size(1, start_column, self.sheet.max_rows(), column_count)
        } else {
            RangeAddress::with_size(self.data_start_row(), start_column, self.boundaries.row_count, column_count)
        };
        self.range(address)
    }

    /// The header cells as of the last refresh.
    pub fn header_range(&self) -> SheetRange {
        self.range(
            RangeAddress::new(self.settings.header_row, self.settings.start_column)
                .columns(self.boundaries.column_count),
        )
    }

    /// The data rows below the header as of the last refresh.
    pub fn data_area_range(&self) -> SheetRange {
        self.range(RangeAddress::with_size(
            self.data_start_row(),
            self.settings.start_column,
            self.boundaries.row_count,
            self.boundaries.column_count,
        ))
    }

    /// Writes a header starting at the start column, then rescans the columns.
    /// The cached row boundaries are left alone.
    pub fn write_header<V: Into<CellValue>>(&mut self, values: impl IntoIterator<Item = V>) -> Result<()> {
        let values: Vec<CellValue> = values.into_iter().map(Into::into).collect();
        let address = RangeAddress::new(self.settings.header_row, self.settings.start_column).columns(values.len() as u32);
        self.range(address).set_values(&[values])?;
        debug!(range = %address, "wrote header");
        self.refresh_last_column()
    }

    /// Writes a block of equal-length rows at the top of the data area, then
    /// rescans the last row. The cached column boundaries are left alone.
    pub fn write_data_area(&mut self, rows: &[Vec<CellValue>]) -> Result<()> {
        let columns = rows.first().map_or(0, Vec::len) as u32;
        let address = RangeAddress::with_size(self.data_start_row(), self.settings.start_column, rows.len() as u32, columns);
        self.range(address).set_values(rows)?;
        debug!(range = %address, "wrote data area");
        self.refresh_last_row()
    }

    /// Inserts `count` blank rows before `before_row` across the region's
    /// columns, shifting the rows below down, then rescans the last row.
    pub fn insert_rows(&mut self, before_row: u32, count: u32) -> Result<()> {
        self.row_range(before_row, count, false).insert_cells(Dimension::Rows)?;
        debug!(before_row, count, "inserted rows");
        self.refresh_last_row()
    }

    /// Inserts `count` blank columns before `before_column` from the header row
    /// through the last data row, shifting cells right, then rescans everything.
    pub fn insert_columns(&mut self, before_column: u32, count: u32) -> Result<()> {
        let rows = self.boundaries.last_row + 1 - self.settings.header_row;
        self.range(RangeAddress::with_size(self.settings.header_row, before_column, rows, count))
            .insert_cells(Dimension::Columns)?;
        debug!(before_column, count, "inserted columns");
        self.refresh()
    }

    /// 0-based position of `name` in the cached header.
    ///
    /// # Errors
    ///
    /// Returns [`RegionError::ColumnNotFound`] if no header cell holds exactly `name`.
    pub fn header_index_of(&self, name: &str) -> Result<usize> {
        self.boundaries
            .header
            .iter()
            .position(|value| value.as_text() == Some(name))
            .ok_or_else(|| RegionError::ColumnNotFound { name: name.to_owned() })
    }

    /// Absolute sheet column of `name` in the cached header.
    ///
    /// # Errors
    ///
    /// Returns [`RegionError::ColumnNotFound`] if no header cell holds exactly `name`.
    pub fn header_column_of(&self, name: &str) -> Result<u32> {
        Ok(self.header_index_of(name)? as u32 + self.settings.start_column)
    }

    /// Text header names mapped to their absolute columns. The first occurrence
    /// of a repeated name wins.
    pub fn header_columns(&self) -> BTreeMap<String, u32> {
        let mut columns = BTreeMap::new();
        for (column, value) in (self.settings.start_column..).zip(&self.boundaries.header) {
            if let Some(name) = value.as_text().filter(|name| !name.is_empty()) {
                columns.entry(name.to_owned()).or_insert(column);
            }
        }
        columns
    }

    pub fn workbook(&self) -> &Rc<dyn Workbook> {
        &self.workbook
    }

    pub fn sheet(&self) -> &Rc<dyn Sheet> {
        &self.sheet
    }

    pub fn settings(&self) -> &RegionSettings {
        &self.settings
    }

    pub fn header_row(&self) -> u32 {
        self.settings.header_row
    }

    pub fn data_start_row(&self) -> u32 {
        self.settings.data_start_row()
    }

    pub fn start_column(&self) -> u32 {
        self.settings.start_column
    }

    pub fn key_column(&self) -> u32 {
        self.settings.key_column
    }

    pub fn last_row(&self) -> u32 {
        self.boundaries.last_row
    }

    pub fn last_column(&self) -> u32 {
        self.boundaries.last_column
    }

    pub fn row_count(&self) -> u32 {
        self.boundaries.row_count
    }

    pub fn column_count(&self) -> u32 {
        self.boundaries.column_count
    }

    pub fn header(&self) -> &[CellValue] {
        &self.boundaries.header
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spreadsheet::memory::{MemoryProvider, MemorySheet, MemoryWorkbook};
    use crate::spreadsheet::ResourceError;
    use pretty_assertions::assert_eq;

    fn text_row(values: &[&str]) -> Vec<CellValue> {
        values.iter().map(|value| CellValue::from(*value)).collect()
    }

    fn provider_with(sheet: MemorySheet) -> (Rc<MemoryProvider>, Rc<MemorySheet>) {
        let workbook = MemoryWorkbook::new("book");
        let sheet = workbook.add_sheet(sheet).unwrap();
        (Rc::new(MemoryProvider::with_active(workbook)), sheet)
    }

    fn books_sheet() -> MemorySheet {
        let sheet = MemorySheet::with_size("Books", 50, 10);
        sheet
            .fill(1, 2, [["Name", "Age", "City"], ["Ann", "31", "Oslo"], ["Bob", "42", "Rome"]])
            .unwrap();
        sheet
    }

    fn assert_boundary_invariants(region: &TableRegion) {
        assert_eq!(region.data_start_row(), region.header_row() + 1);
        assert_eq!(region.row_count(), region.last_row() + 1 - region.data_start_row());
        assert_eq!(region.column_count(), region.last_column() + 1 - region.start_column());
        assert_eq!(region.header().len(), region.column_count() as usize);
    }

    #[test]
    fn initialize_on_empty_sheet() {
        let (provider, _) = provider_with(MemorySheet::new("Sheet1"));
        let region = TableRegion::initialize(provider, RegionConfig::new("Sheet1").header_row(1).start_column(1)).unwrap();

        assert_eq!(region.data_start_row(), 2);
        assert_eq!(region.key_column(), 1);
        assert_eq!(region.row_count(), 0);
        assert_eq!(region.column_count(), 0);
        assert_eq!(region.header(), &[] as &[CellValue]);
        assert_boundary_invariants(&region);
    }

    #[test]
    fn initialize_scans_existing_table() {
        let (provider, _) = provider_with(books_sheet());
        let region = TableRegion::initialize(provider, RegionConfig::new("Books").start_column(2)).unwrap();

        assert_eq!(region.key_column(), 2);
        assert_eq!(region.last_row(), 3);
        assert_eq!(region.row_count(), 2);
        assert_eq!(region.last_column(), 4);
        assert_eq!(region.column_count(), 3);
        assert_eq!(region.header(), text_row(&["Name", "Age", "City"]).as_slice());
        assert_boundary_invariants(&region);
    }

    #[test]
    fn initialize_creates_missing_sheet() {
        let provider = Rc::new(MemoryProvider::with_active(MemoryWorkbook::new("book")));
        let region = TableRegion::initialize(provider.clone(), RegionConfig::new("Fresh")).unwrap();

        assert_eq!(region.sheet().name(), "Fresh");
        assert_eq!(provider.workbook("book").unwrap().sheet_names(), vec!["Fresh".to_owned()]);
    }

    #[test]
    fn initialize_opens_named_workbook() {
        let provider = Rc::new(MemoryProvider::new());
        provider.add(MemoryWorkbook::new("other"));
        let region = TableRegion::initialize(provider, RegionConfig::new("Sheet1").workbook_id("other")).unwrap();
        assert_eq!(region.workbook().id(), "other");
        assert_eq!(region.settings().workbook_id, "other");
    }

    #[test]
    fn initialize_fails_on_unknown_workbook() {
        let provider = Rc::new(MemoryProvider::new());
        let result = TableRegion::initialize(provider.clone(), RegionConfig::new("Sheet1").workbook_id("missing"));
        assert!(matches!(
            result,
            Err(RegionError::ResourceOpen { source: ResourceError::NotFound { .. }, .. })
        ));

        let result = TableRegion::initialize(provider, RegionConfig::new("Sheet1"));
        assert!(matches!(
            result,
            Err(RegionError::ResourceOpen { source: ResourceError::NoActiveWorkbook, .. })
        ));
    }

    #[test]
    fn update_merges_absent_fields() {
        let (provider, _) = provider_with(books_sheet());
        let mut region = TableRegion::initialize(provider, RegionConfig::new("Books").start_column(2)).unwrap();

        region.update(RegionUpdate::new().header_row(5)).unwrap();
        assert_eq!(region.header_row(), 5);
        assert_eq!(region.data_start_row(), 6);
        assert_eq!(region.start_column(), 2);
        assert_boundary_invariants(&region);
    }

    #[test]
    fn update_tracks_key_column() {
        let (provider, _) = provider_with(MemorySheet::new("Sheet1"));
        let mut region = TableRegion::initialize(provider, RegionConfig::new("Sheet1").start_column(3)).unwrap();
        assert_eq!(region.key_column(), 3);

        region.update(RegionUpdate::new().start_column(7)).unwrap();
        assert_eq!(region.key_column(), 7);

        region.update(RegionUpdate::new().header_row(2)).unwrap();
        assert_eq!(region.key_column(), 7);
    }

    #[test]
    fn update_rescans_only_when_region_moves() {
        let (provider, sheet) = provider_with(books_sheet());
        let mut region = TableRegion::initialize(provider, RegionConfig::new("Books").start_column(2)).unwrap();
        sheet.fill(4, 2, [["Cid", "27", "Lima"]]).unwrap();

        let invalidation = region.update(RegionUpdate::new().key_column(3)).unwrap();
        assert!(invalidation.is_empty());
        assert_eq!(region.row_count(), 2);

        let invalidation = region.update(RegionUpdate::new().start_column(2)).unwrap();
        assert!(invalidation.is_empty());
        assert_eq!(region.row_count(), 2);

        let invalidation = region.update(RegionUpdate::new().start_column(3)).unwrap();
        assert_eq!(invalidation.reasons(), &[InvalidationReason::StartColumn]);
        assert_eq!(region.row_count(), 3);
        assert_eq!(region.header(), text_row(&["Age", "City"]).as_slice());
        assert_boundary_invariants(&region);
    }

    #[test]
    fn update_to_other_sheet_starts_fresh() {
        let (provider, sheet) = provider_with(books_sheet());
        let mut region =
            TableRegion::initialize(provider.clone(), RegionConfig::new("Books").header_row(1).start_column(2)).unwrap();
        let archive = provider.workbook("book").unwrap().add_sheet(MemorySheet::with_size("Archive", 20, 5)).unwrap();
        archive.fill(1, 1, [["Title", "Author"], ["Dune", "Herbert"]]).unwrap();

        let invalidation = region.update(RegionUpdate::new().sheet_name("Archive")).unwrap();
        assert!(invalidation.contains(InvalidationReason::Sheet));
        assert!(invalidation.contains(InvalidationReason::StartColumn));
        assert_eq!(region.sheet().name(), "Archive");
        assert_eq!(region.start_column(), 1);
        assert_eq!(region.key_column(), 1);
        assert_eq!(region.header(), text_row(&["Title", "Author"]).as_slice());
        assert_eq!(region.row_count(), 1);
        // The previous sheet was not touched
        assert_eq!(sheet.populated_count(), 9);
    }

    #[test]
    fn update_to_other_workbook_rebinds_and_rescans() {
        let (provider, _) = provider_with(books_sheet());
        let copy = provider.add(MemoryWorkbook::new("copy"));
        copy.add_sheet(MemorySheet::with_size("Books", 50, 10))
            .unwrap()
            .fill(1, 1, [["Id", "Title"], ["1", "Dune"], ["2", "Emma"], ["3", "Ubik"]])
            .unwrap();
        let mut region = TableRegion::initialize(provider, RegionConfig::new("Books").start_column(2)).unwrap();
        region.update(RegionUpdate::new().key_column(3)).unwrap();

        let invalidation = region.update(RegionUpdate::new().workbook_id("copy")).unwrap();
        assert!(invalidation.contains(InvalidationReason::Resource));
        assert!(!invalidation.contains(InvalidationReason::Sheet));
        assert_eq!(region.workbook().id(), "copy");
        assert_eq!(region.settings().workbook_id, "copy");
        assert_eq!(region.sheet().value_at(2, 2).unwrap(), CellValue::from("Dune"));

        // Rebinding drops the custom start and key columns
        assert_eq!(region.header_row(), 1);
        assert_eq!(region.start_column(), 1);
        assert_eq!(region.key_column(), 1);
        assert_eq!(region.header(), text_row(&["Id", "Title"]).as_slice());
        assert_eq!(region.last_row(), 4);
        assert_eq!(region.row_count(), 3);
        assert_boundary_invariants(&region);
    }

    #[test]
    fn failed_update_keeps_region() {
        let (provider, _) = provider_with(books_sheet());
        let mut region = TableRegion::initialize(provider, RegionConfig::new("Books").start_column(2)).unwrap();

        let result = region.update(RegionUpdate::new().workbook_id("missing").header_row(3));
        assert!(matches!(result, Err(RegionError::ResourceOpen { .. })));
        assert_eq!(region.header_row(), 1);
        assert_eq!(region.workbook().id(), "book");
        assert_eq!(region.row_count(), 2);

        let result = region.update(RegionUpdate::new().start_column(0));
        assert!(matches!(result, Err(RegionError::InvalidConfig { .. })));
        assert_eq!(region.start_column(), 2);
    }

    #[test]
    fn last_row_with_key_column_filled_to_physical_end() {
        let sheet = MemorySheet::with_size("Sheet1", 6, 3);
        sheet.fill(1, 1, [["Id"], ["1"], ["2"], ["3"], ["4"], ["5"]]).unwrap();
        let (provider, _) = provider_with(sheet);
        let region = TableRegion::initialize(provider, RegionConfig::new("Sheet1")).unwrap();

        assert_eq!(region.last_row(), 6);
        assert_eq!(region.row_count(), 5);
        assert_boundary_invariants(&region);
    }

    #[test]
    fn header_filling_sheet_width() {
        let sheet = MemorySheet::with_size("Sheet1", 10, 3);
        sheet.fill(1, 1, [["A", "B", "C"]]).unwrap();
        let (provider, _) = provider_with(sheet);
        let region = TableRegion::initialize(provider, RegionConfig::new("Sheet1")).unwrap();

        assert_eq!(region.last_column(), 3);
        assert_eq!(region.column_count(), 3);
        assert_boundary_invariants(&region);
    }

    #[test]
    fn header_lookup() {
        let (provider, _) = provider_with(books_sheet());
        let region = TableRegion::initialize(provider, RegionConfig::new("Books").start_column(2)).unwrap();

        assert_eq!(region.header_index_of("Age").unwrap(), 1);
        assert_eq!(region.header_column_of("Age").unwrap(), 3);
        assert!(matches!(
            region.header_index_of("Missing"),
            Err(RegionError::ColumnNotFound { name }) if name == "Missing"
        ));
        assert!(region.header_column_of("age").is_err());
    }

    #[test]
    fn header_lookup_reads_cache_only() {
        let (provider, sheet) = provider_with(books_sheet());
        let mut region = TableRegion::initialize(provider, RegionConfig::new("Books").start_column(2)).unwrap();
        sheet.fill(1, 5, [["Zip"]]).unwrap();

        assert!(region.header_index_of("Zip").is_err());
        region.refresh().unwrap();
        assert_eq!(region.header_column_of("Zip").unwrap(), 5);
    }

    #[test]
    fn header_columns_map() {
        let (provider, _) = provider_with(books_sheet());
        let region = TableRegion::initialize(provider, RegionConfig::new("Books").start_column(2)).unwrap();
        let columns = region.header_columns();

        assert_eq!(
            columns.into_iter().collect::<Vec<_>>(),
            vec![("Age".to_owned(), 3), ("City".to_owned(), 4), ("Name".to_owned(), 2)]
        );
    }

    #[test]
    fn write_header_refreshes_columns_only() {
        let (provider, sheet) = provider_with(MemorySheet::new("Sheet1"));
        let mut region = TableRegion::initialize(provider, RegionConfig::new("Sheet1")).unwrap();
        sheet.fill(2, 1, [["x"], ["y"]]).unwrap();

        region.write_header(["A", "B"]).unwrap();
        assert_eq!(region.header_range().values().unwrap(), vec![text_row(&["A", "B"])]);
        assert_eq!(region.column_count(), 2);
        assert_eq!(region.header().len(), 2);
        // Rows written behind the controller's back stay unseen
        assert_eq!(region.row_count(), 0);
    }

    #[test]
    fn write_data_area_refreshes_rows_only() {
        let (provider, _) = provider_with(MemorySheet::new("Sheet1"));
        let mut region = TableRegion::initialize(provider, RegionConfig::new("Sheet1")).unwrap();
        region.write_header(["A", "B"]).unwrap();

        let rows = vec![
            vec![CellValue::from(1), CellValue::from(2)],
            vec![CellValue::from(3), CellValue::from(4)],
        ];
        region.write_data_area(&rows).unwrap();
        assert_eq!(region.row_count(), 2);
        assert_eq!(region.data_area_range().values().unwrap(), rows);
        assert_boundary_invariants(&region);
    }

    #[test]
    fn write_data_area_rejects_ragged_rows() {
        let (provider, _) = provider_with(MemorySheet::new("Sheet1"));
        let mut region = TableRegion::initialize(provider, RegionConfig::new("Sheet1")).unwrap();

        let rows = vec![vec![CellValue::from(1), CellValue::from(2)], vec![CellValue::from(3)]];
        assert!(matches!(
            region.write_data_area(&rows),
            Err(RegionError::Resource(ResourceError::ShapeMismatch { .. }))
        ));
    }

    #[test]
    fn write_beyond_sheet_surfaces_bounds_error() {
        let (provider, _) = provider_with(MemorySheet::with_size("Sheet1", 3, 2));
        let mut region = TableRegion::initialize(provider, RegionConfig::new("Sheet1")).unwrap();

        assert!(matches!(
            region.write_header(["A", "B", "C"]),
            Err(RegionError::Resource(ResourceError::OutOfBounds { column: 3, .. }))
        ));
    }

    #[test]
    fn range_builders() {
        let (provider, _) = provider_with(books_sheet());
        let region = TableRegion::initialize(provider, RegionConfig::new("Books").start_column(2)).unwrap();

        assert_eq!(region.range(RangeAddress::new(2, 2)).address(), RangeAddress::with_size(2, 2, 1, 1));
        assert_eq!(region.row_range(3, 1, false).address(), RangeAddress::with_size(3, 2, 1, 3));
        assert_eq!(region.row_range(3, 2, true).address(), RangeAddress::with_size(3, 1, 2, 10));
        assert_eq!(region.column_range(3, 1, false).address(), RangeAddress::with_size(2, 3, 2, 1));
        assert_eq!(region.column_range(3, 2, true).address(), RangeAddress::with_size(1, 3, 50, 2));
        assert_eq!(region.header_range().address(), RangeAddress::with_size(1, 2, 1, 3));
        assert_eq!(region.data_area_range().address(), RangeAddress::with_size(2, 2, 2, 3));
        assert_eq!(region.data_area_range().a1(), "'Books'!B2:D3");
        assert_eq!(
            region.column_range(3, 1, false).values().unwrap(),
            vec![vec![CellValue::from("31")], vec![CellValue::from("42")]]
        );
    }

    #[test]
    fn range_from_a1_reference() {
        let (provider, _) = provider_with(books_sheet());
        let region = TableRegion::initialize(provider, RegionConfig::new("Books").start_column(2)).unwrap();

        let range = region.range_a1("c2:b3").unwrap();
        assert_eq!(range.address(), RangeAddress::with_size(2, 2, 2, 2));
        assert_eq!(range.values().unwrap(), vec![text_row(&["Ann", "31"]), text_row(&["Bob", "42"])]);
        assert!(matches!(region.range_a1("B0"), Err(RegionError::InvalidRange(_))));
    }

    #[test]
    fn range_past_last_addressable_row_fails_without_panicking() {
        let (provider, _) = provider_with(books_sheet());
        let region = TableRegion::initialize(provider, RegionConfig::new("Books")).unwrap();

        let range = region.range(RangeAddress::with_size(999, 1, u32::MAX, 1));
        assert!(matches!(range.values(), Err(ResourceError::OutOfBounds { .. })));
    }

    #[test]
    fn insert_rows_shifts_data() {
        let (provider, sheet) = provider_with(books_sheet());
        let mut region = TableRegion::initialize(provider, RegionConfig::new("Books").start_column(2)).unwrap();

        region.insert_rows(2, 1).unwrap();
        assert_eq!(sheet.value_at(2, 2).unwrap(), CellValue::Empty);
        assert_eq!(sheet.value_at(3, 2).unwrap(), CellValue::from("Ann"));
        assert_eq!(region.last_row(), 4);
        assert_eq!(region.row_count(), 3);
        assert_boundary_invariants(&region);
    }

    #[test]
    fn insert_columns_shifts_header_and_data() {
        let (provider, sheet) = provider_with(books_sheet());
        let mut region = TableRegion::initialize(provider, RegionConfig::new("Books").start_column(2)).unwrap();

        region.insert_columns(4, 1).unwrap();
        assert_eq!(sheet.value_at(1, 5).unwrap(), CellValue::from("City"));
        assert_eq!(sheet.value_at(3, 5).unwrap(), CellValue::from("Rome"));
        // The blank column splits the header until it is named
        assert_eq!(region.column_count(), 2);

        region.range(RangeAddress::new(1, 4)).set_values(&[text_row(&["Zip"])]).unwrap();
        region.refresh_last_column().unwrap();
        assert_eq!(region.header(), text_row(&["Name", "Age", "Zip", "City"]).as_slice());
        assert_boundary_invariants(&region);
    }

    #[test]
    fn sibling_copies_settings_to_other_workbook() {
        let (provider, _) = provider_with(books_sheet());
        let copy = provider.add(MemoryWorkbook::new("copy"));
        copy.add_sheet(books_sheet()).unwrap();
        let mut region = TableRegion::initialize(provider, RegionConfig::new("Books").start_column(2)).unwrap();
        region.update(RegionUpdate::new().key_column(3)).unwrap();

        let sibling = region.sibling("copy").unwrap();
        assert_eq!(sibling.workbook().id(), "copy");
        assert_eq!(sibling.start_column(), 2);
        assert_eq!(sibling.key_column(), 3);
        assert_eq!(sibling.header(), region.header());
        assert_eq!(sibling.row_count(), 2);
    }
}
