//! Reading row ranges back into typed records.

use crate::document::Document;
use crate::engine::DocumentEngine;
use crate::error::{BindError, Result};
use crate::schema::{FieldKind, FieldValue, Record, Schema};
use sheetbind_common::to_axis;

impl<E: DocumentEngine> Document<E> {
    /// Read rows `start_row..=end_row` (or to the end of the sheet) into
    /// `target`, one record per non-blank row.
    ///
    /// Field `i` is read from column `i + 1`. A row whose cells in that span
    /// are all empty is skipped. An empty cell holding a formula is replaced
    /// by the formula's evaluated text when the engine can compute it.
    ///
    /// Records are appended only once every row has been read; on error
    /// `target` is left untouched.
    pub fn read_rows<T: Record + Default>(
        &self,
        sheet: &str,
        start_row: u32,
        target: &mut Vec<T>,
        end_row: Option<u32>,
    ) -> Result<()> {
        if start_row == 0 {
            return Err(BindError::InvalidTarget(
                "start row must be 1 or greater".to_string(),
            ));
        }
        let schema = T::descriptor();
        check_readable(schema)?;

        let rows = self.engine.rows(sheet).map_err(BindError::engine)?;
        let last = end_row.map_or(rows.len(), |end| (end as usize).min(rows.len()));
        let first = start_row as usize - 1;
        let width = schema.len();

        let mut records = Vec::new();
        for (idx, cells) in rows.iter().enumerate().take(last).skip(first) {
            let row = idx as u32 + 1;
            let span = &cells[..width.min(cells.len())];
            if span.iter().all(|text| text.is_empty()) {
                tracing::trace!(sheet, row, "skipping blank row");
                continue;
            }

            let mut record = T::default();
            for (index, field) in schema.fields().iter().enumerate() {
                let axis = to_axis(index as u32 + 1, Some(row));
                let raw = span.get(index).map_or("", String::as_str);
                let text = if raw.is_empty() {
                    self.formula_text(sheet, &axis)?
                } else {
                    None
                };
                let text = text.as_deref().unwrap_or(raw);
                let value = coerce(text, field.kind, &axis)?;
                record
                    .set_field(index, value)
                    .map_err(|source| BindError::FieldRange {
                        field: field.name,
                        axis: axis.clone(),
                        source,
                    })?;
            }
            records.push(record);
        }

        tracing::debug!(sheet, start_row, read = records.len(), "rows read");
        target.append(&mut records);
        Ok(())
    }

    /// Evaluated text of the formula at `axis`, if there is one and the
    /// engine can compute it.
    fn formula_text(&self, sheet: &str, axis: &str) -> Result<Option<String>> {
        let Some(formula) = self
            .engine
            .cell_formula(sheet, axis)
            .map_err(BindError::engine)?
        else {
            return Ok(None);
        };
        match self.engine.calc_cell_value(sheet, axis) {
            Ok(text) => Ok(Some(text)),
            Err(err) => {
                tracing::debug!(
                    sheet,
                    axis,
                    formula = %formula,
                    error = %err,
                    "formula evaluation failed; keeping empty text"
                );
                Ok(None)
            }
        }
    }
}

fn check_readable(schema: &Schema) -> Result<()> {
    let unreadable = |kind: FieldKind| matches!(kind, FieldKind::Bool | FieldKind::Unsupported);
    match schema.fields().iter().find(|f| unreadable(f.kind)) {
        Some(field) => Err(BindError::UnsupportedType {
            field: field.name,
            kind: field.kind,
        }),
        None => Ok(()),
    }
}

/// Coerce cell text into a field value of `kind`. Empty text reads as zero
/// for numeric kinds.
fn coerce(text: &str, kind: FieldKind, axis: &str) -> Result<FieldValue> {
    let fail = || BindError::Coerce {
        axis: axis.to_string(),
        kind,
        text: text.to_string(),
    };
    let trimmed = text.trim();
    match kind {
        FieldKind::Text => Ok(FieldValue::Text(text.to_string())),
        FieldKind::Int if trimmed.is_empty() => Ok(FieldValue::Int(0)),
        FieldKind::Uint if trimmed.is_empty() => Ok(FieldValue::Uint(0)),
        FieldKind::Float if trimmed.is_empty() => Ok(FieldValue::Float(0.0)),
        FieldKind::Int => integer_digits(trimmed)
            .parse::<i64>()
            .map(FieldValue::Int)
            .map_err(|_| fail()),
        FieldKind::Uint => integer_digits(trimmed)
            .parse::<u64>()
            .map(FieldValue::Uint)
            .map_err(|_| fail()),
        FieldKind::Float => trimmed
            .parse::<f64>()
            .map(FieldValue::Float)
            .map_err(|_| fail()),
        FieldKind::Bool | FieldKind::Unsupported => Err(fail()),
    }
}

/// Drop an all-zero fractional part, so `"12.00"` reads as `12`.
fn integer_digits(text: &str) -> &str {
    match text.split_once('.') {
        Some((whole, frac)) if !whole.is_empty() && frac.bytes().all(|b| b == b'0') => whole,
        _ => text,
    }
}
