//! The document engine contract.
//!
//! The binding layer never touches the file format. Everything it needs from
//! a workbook (row text, cell writes, styles, row edits, formulas) goes
//! through [`DocumentEngine`]. Axes are `A1`-style labels and rows are
//! 1-based.

pub mod memory;
#[cfg(feature = "umya")]
pub mod umya;

pub use memory::{MemoryEngine, MemoryEngineError};
#[cfg(feature = "umya")]
pub use umya::{UmyaEngine, UmyaEngineError};

use crate::style::Style;
use sheetbind_common::CellValue;

/// Opaque handle returned by [`DocumentEngine::new_style`].
pub type StyleId = u32;

pub trait DocumentEngine {
    type Error: std::error::Error + Send + Sync + 'static;

    fn sheet_names(&self) -> Result<Vec<String>, Self::Error>;

    /// Displayed text of every row, top to bottom. Row `n` is at index
    /// `n - 1`; each row extends to its last populated cell.
    fn rows(&self, sheet: &str) -> Result<Vec<Vec<String>>, Self::Error>;

    fn set_cell_value(&mut self, sheet: &str, axis: &str, value: CellValue)
    -> Result<(), Self::Error>;

    /// Register a style and return a handle for [`set_cell_style`](Self::set_cell_style).
    fn new_style(&mut self, style: &Style) -> Result<StyleId, Self::Error>;

    fn set_cell_style(&mut self, sheet: &str, axis: &str, style: StyleId)
    -> Result<(), Self::Error>;

    /// `col` is a column label such as `C`.
    fn set_col_width(&mut self, sheet: &str, col: &str, width: f64) -> Result<(), Self::Error>;

    fn merge_cells(&mut self, sheet: &str, start: &str, end: &str) -> Result<(), Self::Error>;

    /// Insert a copy of `row` at `target`, shifting `target` and below down.
    fn duplicate_row_to(&mut self, sheet: &str, row: u32, target: u32) -> Result<(), Self::Error>;

    /// Delete `row`, shifting everything below it up.
    fn remove_row(&mut self, sheet: &str, row: u32) -> Result<(), Self::Error>;

    fn cell_formula(&self, sheet: &str, axis: &str) -> Result<Option<String>, Self::Error>;

    /// Evaluate the formula at `axis` and return its displayed text.
    fn calc_cell_value(&self, sheet: &str, axis: &str) -> Result<String, Self::Error>;

    /// Refresh formula links after bulk row edits.
    fn update_linked_values(&mut self) -> Result<(), Self::Error>;
}
