//! In-memory tabular resource backend.
//!
//! Sheets keep their populated cells in a sparse map and have fixed physical
//! extents (1000 rows by 26 columns unless sized explicitly), so boundary scans
//! behave the way they do against a hosted spreadsheet.
use crate::region::RangeAddress;
use anyhow::anyhow;
use crate::spreadsheet::{CellValue, Dimension, Direction, ResourceError, ResourceProvider, Sheet, Workbook};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;
use tracing::debug;

/// Physical row count of a sheet created without explicit extents.
pub const DEFAULT_MAX_ROWS: u32 = 1000;
/// Physical column count of a sheet created without explicit extents.
pub const DEFAULT_MAX_COLUMNS: u32 = 26;

#[derive(Debug)]
struct Grid {
    /// Populated cells keyed by (row, column); empty values are never stored
    cells: BTreeMap<(u32, u32), CellValue>,
    max_rows: u32,
    max_columns: u32,
}

impl Grid {
    fn out_of_bounds(&self, row: u32, column: u32) -> ResourceError {
        ResourceError::OutOfBounds {
            row,
            column,
            max_rows: self.max_rows,
            max_columns: self.max_columns,
        }
    }

    fn check_bounds(&self, row: u32, column: u32) -> Result<(), ResourceError> {
        if row == 0 || column == 0 || row > self.max_rows || column > self.max_columns {
            Err(self.out_of_bounds(row, column))
        } else {
            Ok(())
        }
    }

    fn check_range(&self, address: &RangeAddress) -> Result<(), ResourceError> {
        self.check_bounds(address.start_row(), address.start_column())?;
        match (address.checked_end_row(), address.checked_end_column()) {
            (Some(row), Some(column)) => self.check_bounds(row, column),
            _ => Err(self.out_of_bounds(address.end_row(), address.end_column())),
        }
    }

    fn is_populated(&self, row: u32, column: u32) -> bool {
        self.cells.contains_key(&(row, column))
    }

    /// Neighbouring cell in `direction`, None at the sheet edge.
    fn step(&self, (row, column): (u32, u32), direction: Direction) -> Option<(u32, u32)> {
        match direction {
            Direction::Up if row > 1 => Some((row - 1, column)),
            Direction::Down if row < self.max_rows => Some((row + 1, column)),
            Direction::Next if column < self.max_columns => Some((row, column + 1)),
            Direction::Previous if column > 1 => Some((row, column - 1)),
            _ => None,
        }
    }

    fn store(&mut self, row: u32, column: u32, value: CellValue) {
        if value.is_empty() {
            self.cells.remove(&(row, column));
        } else {
            self.cells.insert((row, column), value);
        }
    }
}

/// A sheet held entirely in memory.
#[derive(Debug)]
pub struct MemorySheet {
    name: String,
    grid: RefCell<Grid>,
}

impl MemorySheet {
    pub fn new(name: &str) -> Self {
        Self::with_size(name, DEFAULT_MAX_ROWS, DEFAULT_MAX_COLUMNS)
    }

    pub fn with_size(name: &str, max_rows: u32, max_columns: u32) -> Self {
        Self {
            name: name.to_owned(),
            grid: RefCell::new(Grid {
                cells: BTreeMap::new(),
                max_rows,
                max_columns,
            }),
        }
    }

    /// Writes rows of values starting at (`row`, `column`). Rows may differ in
    /// length; each is written from `column` rightwards.
    pub fn fill<R, V>(&self, row: u32, column: u32, rows: impl IntoIterator<Item = R>) -> Result<(), ResourceError>
    where
        R: IntoIterator<Item = V>,
        V: Into<CellValue>,
    {
        let mut grid = self.grid.borrow_mut();
        for (row, values) in (row..).zip(rows) {
            for (column, value) in (column..).zip(values) {
                grid.check_bounds(row, column)?;
                grid.store(row, column, value.into());
            }
        }
        Ok(())
    }

    /// Number of populated cells.
    pub fn populated_count(&self) -> usize {
        self.grid.borrow().cells.len()
    }
}

impl Sheet for MemorySheet {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn max_rows(&self) -> u32 {
        self.grid.borrow().max_rows
    }

    fn max_columns(&self) -> u32 {
        self.grid.borrow().max_columns
    }

    fn value_at(&self, row: u32, column: u32) -> Result<CellValue, ResourceError> {
        let grid = self.grid.borrow();
        grid.check_bounds(row, column)?;
        Ok(grid.cells.get(&(row, column)).cloned().unwrap_or_default())
    }

    fn next_populated(&self, row: u32, column: u32, direction: Direction) -> Result<(u32, u32), ResourceError> {
        let grid = self.grid.borrow();
        grid.check_bounds(row, column)?;
        let origin = (row, column);
        let Some(neighbour) = grid.step(origin, direction) else {
            return Ok(origin);
        };

        let mut current = neighbour;
        if grid.is_populated(row, column) && grid.is_populated(neighbour.0, neighbour.1) {
            // Ride the contiguous run to its last populated cell
            while let Some(next) = grid.step(current, direction) {
                if !grid.is_populated(next.0, next.1) {
                    break;
                }
                current = next;
            }
            return Ok(current);
        }

        loop {
            if grid.is_populated(current.0, current.1) {
                return Ok(current);
            }
            match grid.step(current, direction) {
                Some(next) => current = next,
                None => return Ok(current),
            }
        }
    }

    fn values(&self, address: &RangeAddress) -> Result<Vec<Vec<CellValue>>, ResourceError> {
        let grid = self.grid.borrow();
        if address.is_empty() {
            return Ok(vec![Vec::new(); address.row_count() as usize]);
        }
        grid.check_range(address)?;
        Ok((address.start_row()..=address.end_row())
            .map(|row| {
                (address.start_column()..=address.end_column())
                    .map(|column| grid.cells.get(&(row, column)).cloned().unwrap_or_default())
                    .collect()
            })
            .collect())
    }

    fn set_values(&self, address: &RangeAddress, values: &[Vec<CellValue>]) -> Result<(), ResourceError> {
        let rows = values.len() as u32;
        let columns = values.first().map_or(0, |row| row.len() as u32);
        let ragged = values.iter().any(|row| row.len() as u32 != columns);
        if ragged || rows != address.row_count() || (rows > 0 && columns != address.column_count()) {
            return Err(ResourceError::ShapeMismatch {
                expected_rows: address.row_count(),
                expected_columns: address.column_count(),
                rows,
                columns,
            });
        }
        if address.is_empty() {
            return Ok(());
        }

        let mut grid = self.grid.borrow_mut();
        grid.check_range(address)?;
        for (row, record) in (address.start_row()..).zip(values) {
            for (column, value) in (address.start_column()..).zip(record) {
                grid.store(row, column, value.clone());
            }
        }
        Ok(())
    }

    fn insert_cells(&self, address: &RangeAddress, dimension: Dimension) -> Result<(), ResourceError> {
        if address.is_empty() {
            return Ok(());
        }
        let mut grid = self.grid.borrow_mut();
        grid.check_range(address)?;
        let grown = match dimension {
            Dimension::Rows => grid.max_rows.checked_add(address.row_count()).map(|rows| (rows, grid.max_columns)),
            Dimension::Columns => grid
                .max_columns
                .checked_add(address.column_count())
                .map(|columns| (grid.max_rows, columns)),
        };
        let (max_rows, max_columns) = grown.ok_or_else(|| {
            anyhow!(
                "Sheet '{}' cannot grow past {}x{} cells",
                self.name,
                grid.max_rows,
                grid.max_columns
            )
        })?;

        let cells = std::mem::take(&mut grid.cells);
        grid.cells = cells
            .into_iter()
            .map(|((row, column), value)| {
                let shifted = match dimension {
                    Dimension::Rows
                        if row >= address.start_row()
                            && (address.start_column()..=address.end_column()).contains(&column) =>
                    {
                        (row + address.row_count(), column)
                    }
                    Dimension::Columns
                        if column >= address.start_column()
                            && (address.start_row()..=address.end_row()).contains(&row) =>
                    {
                        (row, column + address.column_count())
                    }
                    _ => (row, column),
                };
                (shifted, value)
            })
            .collect();
        grid.max_rows = max_rows;
        grid.max_columns = max_columns;
        debug!(sheet = %self.name, range = %address, ?dimension, "inserted cells");
        Ok(())
    }
}

/// A workbook held entirely in memory.
#[derive(Debug)]
pub struct MemoryWorkbook {
    id: String,
    sheets: RefCell<Vec<Rc<MemorySheet>>>,
}

impl MemoryWorkbook {
    /// Creates a workbook with no sheets.
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_owned(),
            sheets: RefCell::new(Vec::new()),
        }
    }

    /// Adds a prepared sheet, rejecting duplicate names.
    pub fn add_sheet(&self, sheet: MemorySheet) -> Result<Rc<MemorySheet>, ResourceError> {
        if self.memory_sheet(&sheet.name).is_some() {
            return Err(ResourceError::DuplicateSheet { name: sheet.name });
        }
        let sheet = Rc::new(sheet);
        self.sheets.borrow_mut().push(Rc::clone(&sheet));
        Ok(sheet)
    }

    /// Concrete handle to a sheet, for callers that need [`MemorySheet::fill`].
    pub fn memory_sheet(&self, name: &str) -> Option<Rc<MemorySheet>> {
        self.sheets.borrow().iter().find(|sheet| sheet.name == name).cloned()
    }
}

impl Workbook for MemoryWorkbook {
    fn id(&self) -> String {
        self.id.clone()
    }

    fn sheet_names(&self) -> Vec<String> {
        self.sheets.borrow().iter().map(|sheet| sheet.name.clone()).collect()
    }

    fn sheet_by_name(&self, name: &str) -> Option<Rc<dyn Sheet>> {
        self.memory_sheet(name).map(|sheet| sheet as Rc<dyn Sheet>)
    }

    fn insert_sheet(&self, name: &str) -> Result<Rc<dyn Sheet>, ResourceError> {
        let sheet = self.add_sheet(MemorySheet::new(name))?;
        debug!(workbook = %self.id, sheet = name, "inserted sheet");
        Ok(sheet as Rc<dyn Sheet>)
    }
}

/// Registry of in-memory workbooks with an optional active one.
#[derive(Debug, Default)]
pub struct MemoryProvider {
    workbooks: RefCell<BTreeMap<String, Rc<MemoryWorkbook>>>,
    active: RefCell<Option<String>>,
}

impl MemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a provider whose active workbook is `workbook`.
    pub fn with_active(workbook: MemoryWorkbook) -> Self {
        let provider = Self::new();
        let id = provider.add(workbook).id.clone();
        provider.set_active(&id);
        provider
    }

    /// Registers a workbook, replacing any previous one with the same id.
    pub fn add(&self, workbook: MemoryWorkbook) -> Rc<MemoryWorkbook> {
        let workbook = Rc::new(workbook);
        self.workbooks
            .borrow_mut()
            .insert(workbook.id.clone(), Rc::clone(&workbook));
        workbook
    }

    pub fn set_active(&self, id: &str) {
        *self.active.borrow_mut() = Some(id.to_owned());
    }

    pub fn workbook(&self, id: &str) -> Option<Rc<MemoryWorkbook>> {
        self.workbooks.borrow().get(id).cloned()
    }
}

impl ResourceProvider for MemoryProvider {
    fn open_by_id(&self, id: &str) -> Result<Rc<dyn Workbook>, ResourceError> {
        self.workbook(id)
            .map(|workbook| workbook as Rc<dyn Workbook>)
            .ok_or_else(|| ResourceError::NotFound { id: id.to_owned() })
    }

    fn active(&self) -> Result<Rc<dyn Workbook>, ResourceError> {
        let active = self.active.borrow();
        let id = active.as_deref().ok_or(ResourceError::NoActiveWorkbook)?;
        self.open_by_id(id)
    }
}
