//! Writing records and value rows into a sheet.

use crate::annotation::{BindingRule, parse_annotation};
use crate::document::Document;
use crate::engine::DocumentEngine;
use crate::error::{BindError, Result};
use crate::schema::{Record, RowData};
use rustc_hash::FxHashMap;
use sheetbind_common::{CellValue, parse_axis, strip_row, to_axis};

/// Header text → column letters, e.g. `"姓名" → "A"`.
pub type HeaderMap = FxHashMap<String, String>;

impl<E: DocumentEngine> Document<E> {
    /// Write one record at the cursor row, then advance the cursor.
    ///
    /// Each annotated field goes to its rule's axis (merging first when the
    /// axis is an `A1-B1` range). Fields without an annotation are skipped.
    pub fn write_record(&mut self, sheet: &str, record: &dyn Record) -> Result<()> {
        self.put_record(sheet, record, None)?;
        self.cursor.increment(sheet);
        Ok(())
    }

    /// Write values from column `A` on the cursor row, then advance the cursor.
    pub fn write_row<I>(&mut self, sheet: &str, values: I) -> Result<()>
    where
        I: IntoIterator,
        I::Item: Into<CellValue>,
    {
        let values: Vec<CellValue> = values.into_iter().map(Into::into).collect();
        self.put_values(sheet, values)?;
        self.cursor.increment(sheet);
        Ok(())
    }

    /// Write a mix of records and value rows, one cursor row per element.
    pub fn write_rows<'a, I>(&mut self, sheet: &str, rows: I) -> Result<()>
    where
        I: IntoIterator<Item = RowData<'a>>,
    {
        for row in rows {
            match row {
                RowData::Record(record) => self.put_record(sheet, record, None)?,
                RowData::Values(values) => self.put_values(sheet, values)?,
            }
            self.cursor.increment(sheet);
        }
        Ok(())
    }

    /// [`write_rows`](Self::write_rows) for a homogeneous slice of records.
    pub fn write_records<R: Record>(&mut self, sheet: &str, records: &[R]) -> Result<()> {
        self.write_rows(sheet, records.iter().map(RowData::from))
    }

    /// Write records under the headers found on `header_row`, matching each
    /// field's `column:` annotation against the header text.
    pub fn write_rows_by_header<R: Record>(
        &mut self,
        sheet: &str,
        header_row: u32,
        records: &[R],
    ) -> Result<()> {
        let headers = self.header_map(sheet, header_row)?;
        self.write_rows_by_header_map(sheet, &headers, records)
    }

    /// Header-directed write with a caller-built header map.
    pub fn write_rows_by_header_map<R: Record>(
        &mut self,
        sheet: &str,
        headers: &HeaderMap,
        records: &[R],
    ) -> Result<()> {
        for record in records {
            self.put_record(sheet, record, Some(headers))?;
            self.cursor.increment(sheet);
        }
        Ok(())
    }

    /// Index the trimmed, non-blank texts of `header_row` by column letters.
    /// A row past the end of the sheet gives an empty map.
    pub fn header_map(&self, sheet: &str, header_row: u32) -> Result<HeaderMap> {
        let rows = self.engine.rows(sheet).map_err(BindError::engine)?;
        let mut headers = HeaderMap::default();
        let Some(cells) = header_row
            .checked_sub(1)
            .and_then(|idx| rows.get(idx as usize))
        else {
            return Ok(headers);
        };
        for (idx, text) in cells.iter().enumerate() {
            let text = text.trim();
            if text.is_empty() {
                continue;
            }
            headers.insert(text.to_string(), to_axis(idx as u32 + 1, None));
        }
        Ok(headers)
    }

    fn put_record(
        &mut self,
        sheet: &str,
        record: &dyn Record,
        headers: Option<&HeaderMap>,
    ) -> Result<()> {
        let row = self.cursor.get(sheet);
        let schema = record.schema();
        // An empty header map means no header matching at all.
        let headers = headers.filter(|h| !h.is_empty());
        for (index, field) in schema.fields().iter().enumerate() {
            let rule = self
                .annotations
                .parse(field.annotation.unwrap_or_default(), index, Some(row))?;
            if rule.ignore {
                continue;
            }
            let Some(axis) = self.target_axis(sheet, &rule, headers, row)? else {
                tracing::trace!(sheet, field = field.name, "no target cell; field skipped");
                continue;
            };
            self.engine
                .set_cell_value(sheet, &axis, record.cell_value(index))
                .map_err(BindError::engine)?;
            if let Some(style) = &rule.style {
                let id = self.engine.new_style(style).map_err(BindError::engine)?;
                self.engine
                    .set_cell_style(sheet, &axis, id)
                    .map_err(BindError::engine)?;
            }
            if let Some(width) = rule.col_width {
                self.engine
                    .set_col_width(sheet, strip_row(&axis), width)
                    .map_err(BindError::engine)?;
            }
        }
        Ok(())
    }

    /// Cell a field is written to, or `None` when it has nowhere to go.
    fn target_axis(
        &mut self,
        sheet: &str,
        rule: &BindingRule,
        headers: Option<&HeaderMap>,
        row: u32,
    ) -> Result<Option<String>> {
        if let Some(headers) = headers {
            return Ok(rule
                .column
                .as_deref()
                .and_then(|name| headers.get(name))
                .map(|col| format!("{col}{row}")));
        }
        if let Some((start, end)) = rule.merge_range() {
            parse_axis(start)?;
            parse_axis(end)?;
            self.engine
                .merge_cells(sheet, start, end)
                .map_err(BindError::engine)?;
            return Ok(Some(start.to_string()));
        }
        Ok(rule.axis.clone())
    }

    fn put_values(&mut self, sheet: &str, values: Vec<CellValue>) -> Result<()> {
        let row = self.cursor.get(sheet);
        for (idx, value) in values.into_iter().enumerate() {
            let axis = to_axis(idx as u32 + 1, Some(row));
            self.engine
                .set_cell_value(sheet, &axis, value)
                .map_err(BindError::engine)?;
        }
        Ok(())
    }
}

/// Lay a record out along `headers`: each annotated `column:` value lands at
/// the index of the matching header, everything else stays `Empty`.
pub fn project_record(record: &dyn Record, headers: &[&str]) -> Result<Vec<CellValue>> {
    let mut out = vec![CellValue::Empty; headers.len()];
    for (index, field) in record.schema().fields().iter().enumerate() {
        let rule = parse_annotation(field.annotation.unwrap_or_default(), index, None)?;
        if rule.ignore {
            continue;
        }
        let Some(name) = rule.column.as_deref() else {
            continue;
        };
        if let Some(pos) = headers.iter().position(|h| *h == name) {
            out[pos] = record.cell_value(index);
        }
    }
    Ok(out)
}
