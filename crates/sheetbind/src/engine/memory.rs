//! In-memory document engine.
//!
//! Holds a sparse grid per sheet and implements the whole engine contract,
//! which makes it the reference engine for tests and for callers that build
//! grids programmatically. Formulas are stored verbatim together with an
//! optional cached result; `calc_cell_value` returns that cached result and
//! fails when there is none.

use super::{DocumentEngine, StyleId};
use crate::style::Style;
use sheetbind_common::{AxisError, CellValue, parse_axis};
use std::collections::BTreeMap;

#[derive(Debug, thiserror::Error)]
pub enum MemoryEngineError {
    #[error("sheet `{0}` does not exist")]
    SheetNotFound(String),
    #[error(transparent)]
    Axis(#[from] AxisError),
    #[error("row {0} is not a valid row")]
    InvalidRow(u32),
    #[error("style {0} was never registered")]
    UnknownStyle(StyleId),
    #[error("formula at {sheet}!{axis} has no computed value")]
    NoCachedValue { sheet: String, axis: String },
}

#[derive(Debug, Clone, Default, PartialEq)]
struct MemoryCell {
    value: CellValue,
    formula: Option<String>,
    cached: Option<CellValue>,
    style: Option<StyleId>,
}

#[derive(Debug, Clone, Default)]
struct MemorySheet {
    name: String,
    /// Keyed by `(row, col)`, both 1-based.
    cells: BTreeMap<(u32, u32), MemoryCell>,
    col_widths: BTreeMap<String, f64>,
    merges: Vec<(String, String)>,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryEngine {
    sheets: Vec<MemorySheet>,
    styles: Vec<Style>,
    refreshes: usize,
}

impl MemoryEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Engine with the given (empty) sheets, in order.
    pub fn with_sheets<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut engine = Self::new();
        for name in names {
            engine.add_sheet(name);
        }
        engine
    }

    /// Add a sheet unless one with that name already exists.
    pub fn add_sheet(&mut self, name: impl Into<String>) {
        let name = name.into();
        if self.sheet(&name).is_err() {
            self.sheets.push(MemorySheet {
                name,
                ..Default::default()
            });
        }
    }

    /// Fill a sheet from row-major text, starting at `A1`. Empty strings leave
    /// the cell unset.
    pub fn set_rows<R, C>(&mut self, sheet: &str, rows: R) -> Result<(), MemoryEngineError>
    where
        R: IntoIterator<Item = C>,
        C: IntoIterator,
        C::Item: AsRef<str>,
    {
        self.add_sheet(sheet);
        let target = self.sheet_mut(sheet)?;
        for (r, row) in rows.into_iter().enumerate() {
            for (c, text) in row.into_iter().enumerate() {
                let text = text.as_ref();
                if text.is_empty() {
                    continue;
                }
                target.cells.insert(
                    (r as u32 + 1, c as u32 + 1),
                    MemoryCell {
                        value: CellValue::Text(text.to_string()),
                        ..Default::default()
                    },
                );
            }
        }
        Ok(())
    }

    /// Store a formula. The cell shows no text; `cached` is what evaluation yields.
    pub fn set_cell_formula(
        &mut self,
        sheet: &str,
        axis: &str,
        formula: impl Into<String>,
        cached: Option<CellValue>,
    ) -> Result<(), MemoryEngineError> {
        let key = cell_key(axis)?;
        let cell = self.sheet_mut(sheet)?.cells.entry(key).or_default();
        cell.value = CellValue::Empty;
        cell.formula = Some(formula.into());
        cell.cached = cached;
        Ok(())
    }

    pub fn value(&self, sheet: &str, axis: &str) -> Option<&CellValue> {
        let key = cell_key(axis).ok()?;
        self.sheet(sheet).ok()?.cells.get(&key).map(|c| &c.value)
    }

    /// Displayed text of a cell; empty when unset.
    pub fn text(&self, sheet: &str, axis: &str) -> String {
        self.value(sheet, axis)
            .map(ToString::to_string)
            .unwrap_or_default()
    }

    pub fn style_of(&self, sheet: &str, axis: &str) -> Option<&Style> {
        let key = cell_key(axis).ok()?;
        let id = self.sheet(sheet).ok()?.cells.get(&key)?.style?;
        self.styles.get(id as usize)
    }

    pub fn col_width(&self, sheet: &str, col: &str) -> Option<f64> {
        self.sheet(sheet).ok()?.col_widths.get(col).copied()
    }

    pub fn merged_cells(&self, sheet: &str) -> &[(String, String)] {
        self.sheet(sheet).map(|s| s.merges.as_slice()).unwrap_or(&[])
    }

    /// Number of `update_linked_values` calls so far.
    pub fn refresh_count(&self) -> usize {
        self.refreshes
    }

    fn sheet(&self, name: &str) -> Result<&MemorySheet, MemoryEngineError> {
        self.sheets
            .iter()
            .find(|s| s.name == name)
            .ok_or_else(|| MemoryEngineError::SheetNotFound(name.to_string()))
    }

    fn sheet_mut(&mut self, name: &str) -> Result<&mut MemorySheet, MemoryEngineError> {
        self.sheets
            .iter_mut()
            .find(|s| s.name == name)
            .ok_or_else(|| MemoryEngineError::SheetNotFound(name.to_string()))
    }
}

/// `(row, col)` key for an axis label.
fn cell_key(axis: &str) -> Result<(u32, u32), AxisError> {
    let (col, row) = parse_axis(axis)?;
    Ok((row, col))
}

impl DocumentEngine for MemoryEngine {
    type Error = MemoryEngineError;

    fn sheet_names(&self) -> Result<Vec<String>, Self::Error> {
        Ok(self.sheets.iter().map(|s| s.name.clone()).collect())
    }

    fn rows(&self, sheet: &str) -> Result<Vec<Vec<String>>, Self::Error> {
        let sheet = self.sheet(sheet)?;
        let last_row = sheet.cells.keys().map(|(r, _)| *r).max().unwrap_or(0);
        let mut rows = vec![Vec::new(); last_row as usize];
        for ((r, c), cell) in &sheet.cells {
            let row = &mut rows[*r as usize - 1];
            let idx = *c as usize - 1;
            if row.len() <= idx {
                row.resize(idx + 1, String::new());
            }
            row[idx] = cell.value.to_string();
        }
        Ok(rows)
    }

    fn set_cell_value(
        &mut self,
        sheet: &str,
        axis: &str,
        value: CellValue,
    ) -> Result<(), Self::Error> {
        let key = cell_key(axis)?;
        let cell = self.sheet_mut(sheet)?.cells.entry(key).or_default();
        cell.value = value;
        cell.formula = None;
        cell.cached = None;
        Ok(())
    }

    fn new_style(&mut self, style: &Style) -> Result<StyleId, Self::Error> {
        self.styles.push(style.clone());
        Ok((self.styles.len() - 1) as StyleId)
    }

    fn set_cell_style(
        &mut self,
        sheet: &str,
        axis: &str,
        style: StyleId,
    ) -> Result<(), Self::Error> {
        if style as usize >= self.styles.len() {
            return Err(MemoryEngineError::UnknownStyle(style));
        }
        let key = cell_key(axis)?;
        self.sheet_mut(sheet)?.cells.entry(key).or_default().style = Some(style);
        Ok(())
    }

    fn set_col_width(&mut self, sheet: &str, col: &str, width: f64) -> Result<(), Self::Error> {
        self.sheet_mut(sheet)?
            .col_widths
            .insert(col.to_ascii_uppercase(), width);
        Ok(())
    }

    fn merge_cells(&mut self, sheet: &str, start: &str, end: &str) -> Result<(), Self::Error> {
        cell_key(start)?;
        cell_key(end)?;
        self.sheet_mut(sheet)?
            .merges
            .push((start.to_string(), end.to_string()));
        Ok(())
    }

    fn duplicate_row_to(&mut self, sheet: &str, row: u32, target: u32) -> Result<(), Self::Error> {
        if row == 0 {
            return Err(MemoryEngineError::InvalidRow(row));
        }
        if target == 0 {
            return Err(MemoryEngineError::InvalidRow(target));
        }
        let sheet = self.sheet_mut(sheet)?;
        let source: Vec<(u32, MemoryCell)> = sheet
            .cells
            .range((row, 0)..=(row, u32::MAX))
            .map(|((_, c), cell)| (*c, cell.clone()))
            .collect();
        let shifted = std::mem::take(&mut sheet.cells)
            .into_iter()
            .map(|((r, c), cell)| {
                let r = if r >= target { r + 1 } else { r };
                ((r, c), cell)
            })
            .collect();
        sheet.cells = shifted;
        for (c, cell) in source {
            sheet.cells.insert((target, c), cell);
        }
        Ok(())
    }

    fn remove_row(&mut self, sheet: &str, row: u32) -> Result<(), Self::Error> {
        if row == 0 {
            return Err(MemoryEngineError::InvalidRow(row));
        }
        let sheet = self.sheet_mut(sheet)?;
        sheet.cells = std::mem::take(&mut sheet.cells)
            .into_iter()
            .filter(|((r, _), _)| *r != row)
            .map(|((r, c), cell)| {
                let r = if r > row { r - 1 } else { r };
                ((r, c), cell)
            })
            .collect();
        Ok(())
    }

    fn cell_formula(&self, sheet: &str, axis: &str) -> Result<Option<String>, Self::Error> {
        let key = cell_key(axis)?;
        Ok(self
            .sheet(sheet)?
            .cells
            .get(&key)
            .and_then(|c| c.formula.clone()))
    }

    fn calc_cell_value(&self, sheet: &str, axis: &str) -> Result<String, Self::Error> {
        let key = cell_key(axis)?;
        let Some(cell) = self.sheet(sheet)?.cells.get(&key) else {
            return Ok(String::new());
        };
        if cell.formula.is_none() {
            return Ok(cell.value.to_string());
        }
        cell.cached
            .as_ref()
            .map(ToString::to_string)
            .ok_or_else(|| MemoryEngineError::NoCachedValue {
                sheet: sheet.to_string(),
                axis: axis.to_string(),
            })
    }

    fn update_linked_values(&mut self) -> Result<(), Self::Error> {
        self.refreshes += 1;
        Ok(())
    }
}
