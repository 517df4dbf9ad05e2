//! Row-template expansion.
//!
//! A sheet is a template when its cells carry `{{ ... }}` spans. A row holding
//! `{{ range .Path }}` opens a block whose body repeats once per element of
//! the list at `.Path`; a later row holding `{{ end }}` closes it.
//!
//! Rendering runs in two passes over the same sheet:
//!
//! 1. **Structure.** Scan for blocks, resolve each list's length, and build a
//!    [`RowEdit`] plan that grows the body (duplicating its first row) or, for
//!    an empty list, drops the block entirely. The plan is applied in reverse
//!    discovery order, so edits never shift a row another pending edit uses.
//! 2. **Substitution.** Rescan the resized grid, evaluate every span against
//!    the active datum (the root, or the current list element inside a block),
//!    write changed text back, then delete the marker rows bottom-up.
//!
//! Rows are addressed by their absolute 1-based position in the grid; the
//! document's write cursor is neither read nor moved.
//!
//! A failure part-way leaves the grid partially edited; nothing is rolled back.

mod eval;

pub use eval::{EvalError, ExpressionEvaluator, PathEvaluator, lookup};

use crate::document::Document;
use crate::engine::DocumentEngine;
use crate::error::{BindError, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use sheetbind_common::{CellValue, to_axis};

static RANGE_START: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{\{\s*range\s+\.([^}]*?)\s*\}\}").expect("valid range regex")
});
static RANGE_KEYWORD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{\s*range\b").expect("valid range keyword regex"));
static RANGE_END: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{\s*end\s*\}\}").expect("valid end regex"));
static EXPRESSION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{.*\}\}").expect("valid expression regex"));

/// A marker found in one cell.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Marker<'a> {
    RangeStart(&'a str),
    RangeEnd,
}

fn marker(text: &str, row: u32) -> Result<Option<Marker<'_>>> {
    if let Some(caps) = RANGE_START.captures(text) {
        let path = caps.get(1).map_or("", |m| m.as_str());
        return Ok(Some(Marker::RangeStart(path)));
    }
    if RANGE_KEYWORD.is_match(text) {
        return Err(BindError::MarkerSyntax {
            row,
            message: format!("expected `{{{{ range .Field }}}}`, found `{text}`"),
        });
    }
    if RANGE_END.is_match(text) {
        return Ok(Some(Marker::RangeEnd));
    }
    Ok(None)
}

/// First marker of a row, scanning cells left to right.
fn row_marker(cells: &[String], row: u32) -> Result<Option<Marker<'_>>> {
    for text in cells {
        if let Some(m) = marker(text, row)? {
            return Ok(Some(m));
        }
    }
    Ok(None)
}

/// Resolve a range path to its list.
fn resolve_list<'a>(root: &'a Value, path: &str) -> Result<&'a [Value]> {
    let value = lookup(root, path).ok_or_else(|| BindError::UnresolvedPath {
        path: path.trim().to_string(),
    })?;
    value
        .as_array()
        .map(Vec::as_slice)
        .ok_or_else(|| BindError::NotAList {
            path: path.trim().to_string(),
        })
}

/// One `range … end` block found by the structural pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeBlock {
    /// First body row.
    pub copy_row: u32,
    pub start_row: u32,
    pub end_row: u32,
    /// Length of the bound list.
    pub copy_count: usize,
}

/// A single structural edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowEdit {
    Remove(u32),
    /// Insert `copies` duplicates of `row` directly below it.
    Duplicate { row: u32, copies: usize },
}

/// Find every block in `rows`, in discovery (top-down) order.
pub fn scan_blocks(rows: &[Vec<String>], root: &Value) -> Result<Vec<RangeBlock>> {
    let mut blocks: Vec<(u32, u32, Option<u32>, usize)> = Vec::new();
    let mut open: Vec<usize> = Vec::new();
    for (idx, cells) in rows.iter().enumerate() {
        let row = idx as u32 + 1;
        match row_marker(cells, row)? {
            Some(Marker::RangeStart(path)) => {
                let len = resolve_list(root, path)?.len();
                tracing::debug!(row, path, len, "range block opened");
                open.push(blocks.len());
                blocks.push((row + 1, row, None, len));
            }
            Some(Marker::RangeEnd) => match open.pop() {
                Some(block) => blocks[block].2 = Some(row),
                None => tracing::warn!(row, "`end` marker without an open range; ignored"),
            },
            None => {}
        }
    }
    blocks
        .into_iter()
        .map(|(copy_row, start_row, end_row, copy_count)| {
            let end_row = end_row.ok_or_else(|| BindError::MarkerSyntax {
                row: start_row,
                message: "range is never closed with `{{ end }}`".to_string(),
            })?;
            Ok(RangeBlock {
                copy_row,
                start_row,
                end_row,
                copy_count,
            })
        })
        .collect()
}

/// Edits that size every block to its list, in the order they must run.
pub fn plan_edits(blocks: &[RangeBlock]) -> Vec<RowEdit> {
    let mut plan = Vec::new();
    for block in blocks.iter().rev() {
        if block.copy_count == 0 {
            plan.push(RowEdit::Remove(block.end_row));
            plan.push(RowEdit::Remove(block.end_row - 1));
            plan.push(RowEdit::Remove(block.start_row));
        } else if block.copy_count > 1 {
            plan.push(RowEdit::Duplicate {
                row: block.copy_row,
                copies: block.copy_count - 1,
            });
        }
    }
    plan
}

fn apply_edits<E: DocumentEngine>(engine: &mut E, sheet: &str, plan: &[RowEdit]) -> Result<()> {
    for edit in plan {
        match *edit {
            RowEdit::Remove(row) => engine.remove_row(sheet, row).map_err(BindError::engine)?,
            RowEdit::Duplicate { row, copies } => {
                for _ in 0..copies {
                    engine
                        .duplicate_row_to(sheet, row, row + 1)
                        .map_err(BindError::engine)?;
                }
            }
        }
    }
    Ok(())
}

impl<E: DocumentEngine> Document<E> {
    /// Expand and substitute the template on `sheet` with `datum`.
    ///
    /// `datum` is serialized to a field tree first, so field paths follow
    /// its serde names.
    pub fn render<T: Serialize + ?Sized>(&mut self, sheet: &str, datum: &T) -> Result<()> {
        let root = serde_json::to_value(datum).map_err(BindError::Datum)?;
        self.render_value(sheet, &root)
    }

    /// [`render`](Self::render) every sheet, in workbook order.
    pub fn render_all_sheets<T: Serialize + ?Sized>(&mut self, datum: &T) -> Result<()> {
        let root = serde_json::to_value(datum).map_err(BindError::Datum)?;
        let sheets = self.engine.sheet_names().map_err(BindError::engine)?;
        for sheet in sheets {
            self.render_value(&sheet, &root)?;
        }
        Ok(())
    }

    fn render_value(&mut self, sheet: &str, root: &Value) -> Result<()> {
        self.expand_blocks(sheet, root)?;
        self.substitute(sheet, root)
    }

    fn expand_blocks(&mut self, sheet: &str, root: &Value) -> Result<()> {
        let rows = self.engine.rows(sheet).map_err(BindError::engine)?;
        let blocks = scan_blocks(&rows, root)?;
        if blocks.is_empty() {
            return Ok(());
        }
        let plan = plan_edits(&blocks);
        tracing::debug!(sheet, blocks = blocks.len(), ?plan, "applying row edit plan");
        apply_edits(&mut self.engine, sheet, &plan)
    }

    fn substitute(&mut self, sheet: &str, root: &Value) -> Result<()> {
        let rows = self.engine.rows(sheet).map_err(BindError::engine)?;
        let mut datum = root;
        let mut items: Option<&[Value]> = None;
        let mut next_item = 0usize;
        let mut marker_rows = Vec::new();

        for (idx, cells) in rows.iter().enumerate() {
            let row = idx as u32 + 1;
            if let Some(list) = items
                && let Some(item) = list.get(next_item)
            {
                datum = item;
                next_item += 1;
            }
            match row_marker(cells, row)? {
                Some(Marker::RangeStart(path)) => {
                    items = Some(resolve_list(root, path)?);
                    next_item = 0;
                    marker_rows.push(row);
                    continue;
                }
                Some(Marker::RangeEnd) => {
                    items = None;
                    next_item = 0;
                    datum = root;
                    marker_rows.push(row);
                    continue;
                }
                None => {}
            }
            for (col, text) in cells.iter().enumerate() {
                if !EXPRESSION.is_match(text) {
                    continue;
                }
                let rendered = self.evaluator.evaluate(text, datum)?;
                if rendered == *text {
                    continue;
                }
                let value = self.infer_value(rendered);
                let axis = to_axis(col as u32 + 1, Some(row));
                self.engine
                    .set_cell_value(sheet, &axis, value)
                    .map_err(BindError::engine)?;
            }
        }

        marker_rows.sort_unstable_by(|a, b| b.cmp(a));
        marker_rows.dedup();
        tracing::debug!(sheet, rows = ?marker_rows, "removing template marker rows");
        for row in marker_rows {
            self.engine.remove_row(sheet, row).map_err(BindError::engine)?;
        }
        if self.config.refresh_formulas {
            self.engine.update_linked_values().map_err(BindError::engine)?;
        }
        Ok(())
    }

    /// Number first, text otherwise.
    fn infer_value(&self, text: String) -> CellValue {
        if self.config.infer_numbers
            && let Ok(n) = text.parse::<f64>()
            && n.is_finite()
        {
            return CellValue::Number(n);
        }
        CellValue::Text(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn grid(rows: &[&[&str]]) -> Vec<Vec<String>> {
        rows.iter()
            .map(|r| r.iter().map(|s| s.to_string()).collect())
            .collect()
    }

    #[test]
    fn recognises_markers() {
        assert_eq!(
            marker("{{ range .List }}", 1).unwrap(),
            Some(Marker::RangeStart("List"))
        );
        assert_eq!(
            marker("{{range .School.List}}", 1).unwrap(),
            Some(Marker::RangeStart("School.List"))
        );
        assert_eq!(marker("{{ end }}", 1).unwrap(), Some(Marker::RangeEnd));
        assert_eq!(marker("{{.Name}}", 1).unwrap(), None);
        assert!(matches!(
            marker("{{ range List }}", 4),
            Err(BindError::MarkerSyntax { row: 4, .. })
        ));
    }

    #[test]
    fn scan_records_positions_and_lengths() {
        let rows = grid(&[
            &["title"],
            &["{{ range .A }}"],
            &["{{ .x }}"],
            &["{{ end }}"],
            &[],
            &["{{ range .B }}"],
            &["{{ . }}"],
            &["{{ end }}"],
        ]);
        let root = json!({"A": [1, 2, 3], "B": []});
        let blocks = scan_blocks(&rows, &root).unwrap();
        assert_eq!(
            blocks,
            vec![
                RangeBlock {
                    copy_row: 3,
                    start_row: 2,
                    end_row: 4,
                    copy_count: 3
                },
                RangeBlock {
                    copy_row: 7,
                    start_row: 6,
                    end_row: 8,
                    copy_count: 0
                },
            ]
        );
        assert_eq!(
            plan_edits(&blocks),
            vec![
                RowEdit::Remove(8),
                RowEdit::Remove(7),
                RowEdit::Remove(6),
                RowEdit::Duplicate { row: 3, copies: 2 },
            ]
        );
    }

    #[test]
    fn single_element_needs_no_edit() {
        let block = RangeBlock {
            copy_row: 2,
            start_row: 1,
            end_row: 3,
            copy_count: 1,
        };
        assert!(plan_edits(&[block]).is_empty());
    }

    #[test]
    fn scan_errors() {
        let root = json!({"A": 3});
        let rows = grid(&[&["{{ range .A }}"], &["{{ end }}"]]);
        assert!(matches!(
            scan_blocks(&rows, &root),
            Err(BindError::NotAList { .. })
        ));
        let rows = grid(&[&["{{ range .Missing }}"], &["{{ end }}"]]);
        assert!(matches!(
            scan_blocks(&rows, &root),
            Err(BindError::UnresolvedPath { .. })
        ));
        let root = json!({"A": [1]});
        let rows = grid(&[&["{{ range .A }}"], &["x"]]);
        assert!(matches!(
            scan_blocks(&rows, &root),
            Err(BindError::MarkerSyntax { row: 1, .. })
        ));
    }
}
