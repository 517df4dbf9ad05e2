//! `.xlsx` document engine over umya-spreadsheet.
//!
//! umya does not evaluate formulas. `calc_cell_value` returns the value the
//! file carried for the formula cell and fails when there is none.

use super::{DocumentEngine, StyleId};
use crate::style::{Border, Style};
use parking_lot::RwLock;
use sheetbind_common::{AxisError, CellValue, parse_axis, to_axis};
use std::io::Cursor;
use std::path::Path;
use umya_spreadsheet::{
    HorizontalAlignmentValues, Spreadsheet, VerticalAlignmentValues, Worksheet, reader::xlsx,
};

#[derive(Debug, thiserror::Error)]
pub enum UmyaEngineError {
    #[error(transparent)]
    Xlsx(#[from] umya_spreadsheet::XlsxError),
    #[error("sheet `{0}` does not exist")]
    SheetNotFound(String),
    #[error(transparent)]
    Axis(#[from] AxisError),
    #[error("style {0} was never registered")]
    UnknownStyle(StyleId),
    #[error("formula at {sheet}!{axis} has no computed value")]
    NoCachedValue { sheet: String, axis: String },
}

pub struct UmyaEngine {
    workbook: RwLock<Spreadsheet>,
    styles: Vec<Style>,
}

impl UmyaEngine {
    /// A fresh workbook holding `Sheet1`.
    pub fn new() -> Self {
        Self::from_spreadsheet(umya_spreadsheet::new_file())
    }

    pub fn from_spreadsheet(book: Spreadsheet) -> Self {
        Self {
            workbook: RwLock::new(book),
            styles: Vec::new(),
        }
    }

    pub fn open_path<P: AsRef<Path>>(path: P) -> Result<Self, UmyaEngineError> {
        // Full read so every sheet is deserialized before it is edited or saved.
        let book = xlsx::read(path.as_ref())?;
        Ok(Self::from_spreadsheet(book))
    }

    pub fn open_bytes(data: Vec<u8>) -> Result<Self, UmyaEngineError> {
        let book = xlsx::read_reader(Cursor::new(data), true)?;
        Ok(Self::from_spreadsheet(book))
    }

    pub fn save_to_path<P: AsRef<Path>>(&self, path: P) -> Result<(), UmyaEngineError> {
        let wb = self.workbook.read();
        umya_spreadsheet::writer::xlsx::write(&*wb, path.as_ref())?;
        Ok(())
    }

    pub fn save_to_bytes(&self) -> Result<Vec<u8>, UmyaEngineError> {
        let wb = self.workbook.read();
        let mut buf = Cursor::new(Vec::new());
        umya_spreadsheet::writer::xlsx::write_writer(&*wb, &mut buf)?;
        Ok(buf.into_inner())
    }

    pub fn into_spreadsheet(self) -> Spreadsheet {
        self.workbook.into_inner()
    }

    fn sheet_mut(&mut self, sheet: &str) -> Result<&mut Worksheet, UmyaEngineError> {
        self.workbook
            .get_mut()
            .get_sheet_by_name_mut(sheet)
            .ok_or_else(|| UmyaEngineError::SheetNotFound(sheet.to_string()))
    }
}

impl Default for UmyaEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for UmyaEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UmyaEngine")
            .field("sheets", &self.sheet_names().unwrap_or_default())
            .field("styles", &self.styles.len())
            .finish()
    }
}

impl DocumentEngine for UmyaEngine {
    type Error = UmyaEngineError;

    fn sheet_names(&self) -> Result<Vec<String>, Self::Error> {
        let wb = self.workbook.read();
        Ok(wb
            .get_sheet_collection()
            .iter()
            .map(|ws| ws.get_name().to_string())
            .collect())
    }

    fn rows(&self, sheet: &str) -> Result<Vec<Vec<String>>, Self::Error> {
        let wb = self.workbook.read();
        let ws = wb
            .get_sheet_by_name(sheet)
            .ok_or_else(|| UmyaEngineError::SheetNotFound(sheet.to_string()))?;
        let mut rows: Vec<Vec<String>> = Vec::new();
        for cell in ws.get_cell_collection() {
            let text = cell.get_value();
            if text.is_empty() {
                continue;
            }
            let coord = cell.get_coordinate();
            let row = *coord.get_row_num() as usize;
            let col = *coord.get_col_num() as usize;
            if rows.len() < row {
                rows.resize_with(row, Vec::new);
            }
            let cells = &mut rows[row - 1];
            if cells.len() < col {
                cells.resize(col, String::new());
            }
            cells[col - 1] = text.into_owned();
        }
        Ok(rows)
    }

    fn set_cell_value(
        &mut self,
        sheet: &str,
        axis: &str,
        value: CellValue,
    ) -> Result<(), Self::Error> {
        let (col, row) = parse_axis(axis)?;
        let cell = self.sheet_mut(sheet)?.get_cell_mut((col, row));
        match value {
            CellValue::Int(i) => cell.set_value_number(i as f64),
            CellValue::Number(n) => cell.set_value_number(n),
            CellValue::Text(s) => cell.set_value_string(s),
            CellValue::Boolean(b) => cell.set_value_bool(b),
            CellValue::Empty => cell.set_blank(),
        };
        Ok(())
    }

    fn new_style(&mut self, style: &Style) -> Result<StyleId, Self::Error> {
        self.styles.push(style.clone());
        Ok(self.styles.len() as StyleId - 1)
    }

    fn set_cell_style(
        &mut self,
        sheet: &str,
        axis: &str,
        style: StyleId,
    ) -> Result<(), Self::Error> {
        let (col, row) = parse_axis(axis)?;
        let payload = self
            .styles
            .get(style as usize)
            .cloned()
            .ok_or(UmyaEngineError::UnknownStyle(style))?;
        let target = self.sheet_mut(sheet)?.get_style_mut((col, row));
        apply_style(target, &payload);
        Ok(())
    }

    fn set_col_width(&mut self, sheet: &str, col: &str, width: f64) -> Result<(), Self::Error> {
        self.sheet_mut(sheet)?
            .get_column_dimension_mut(col)
            .set_width(width);
        Ok(())
    }

    fn merge_cells(&mut self, sheet: &str, start: &str, end: &str) -> Result<(), Self::Error> {
        self.sheet_mut(sheet)?.add_merge_cells(format!("{start}:{end}"));
        Ok(())
    }

    fn duplicate_row_to(&mut self, sheet: &str, row: u32, target: u32) -> Result<(), Self::Error> {
        let ws = self.sheet_mut(sheet)?;
        ws.insert_new_row(&target, &1);
        let source = if row >= target { row + 1 } else { row };
        let copies: Vec<_> = ws
            .get_cell_collection()
            .into_iter()
            .filter(|cell| *cell.get_coordinate().get_row_num() == source)
            .map(|cell| {
                (
                    *cell.get_coordinate().get_col_num(),
                    cell.get_cell_value().clone(),
                    cell.get_style().clone(),
                )
            })
            .collect();
        for (col, value, style) in copies {
            let cell = ws.get_cell_mut((col, target));
            cell.set_cell_value(value);
            cell.set_style(style);
        }
        Ok(())
    }

    fn remove_row(&mut self, sheet: &str, row: u32) -> Result<(), Self::Error> {
        self.sheet_mut(sheet)?.remove_row(&row, &1);
        Ok(())
    }

    fn cell_formula(&self, sheet: &str, axis: &str) -> Result<Option<String>, Self::Error> {
        let (col, row) = parse_axis(axis)?;
        let wb = self.workbook.read();
        let ws = wb
            .get_sheet_by_name(sheet)
            .ok_or_else(|| UmyaEngineError::SheetNotFound(sheet.to_string()))?;
        Ok(ws.get_cell((col, row)).and_then(|cell| {
            let value = cell.get_cell_value();
            let formula = value.get_formula();
            (value.is_formula() && !formula.is_empty()).then(|| formula.to_string())
        }))
    }

    fn calc_cell_value(&self, sheet: &str, axis: &str) -> Result<String, Self::Error> {
        let (col, row) = parse_axis(axis)?;
        let wb = self.workbook.read();
        let ws = wb
            .get_sheet_by_name(sheet)
            .ok_or_else(|| UmyaEngineError::SheetNotFound(sheet.to_string()))?;
        let cached = ws
            .get_cell((col, row))
            .map(|cell| cell.get_value().into_owned())
            .unwrap_or_default();
        if cached.is_empty() {
            return Err(UmyaEngineError::NoCachedValue {
                sheet: sheet.to_string(),
                axis: to_axis(col, Some(row)),
            });
        }
        Ok(cached)
    }

    fn update_linked_values(&mut self) -> Result<(), Self::Error> {
        tracing::trace!("umya recalculates on open; nothing to refresh");
        Ok(())
    }
}

fn apply_style(target: &mut umya_spreadsheet::Style, payload: &Style) {
    if let Some(alignment) = &payload.alignment {
        let out = target.get_alignment_mut();
        if let Some(h) = alignment.horizontal.as_deref().and_then(horizontal) {
            out.set_horizontal(h);
        }
        if let Some(v) = alignment.vertical.as_deref().and_then(vertical) {
            out.set_vertical(v);
        }
        if alignment.wrap_text {
            out.set_wrap_text(true);
        }
    }
    if let Some(font) = &payload.font {
        let out = target.get_font_mut();
        out.set_bold(font.bold);
        out.set_italic(font.italic);
        if let Some(family) = &font.family {
            out.set_name(family.clone());
        }
        if let Some(size) = font.size {
            out.set_size(size);
        }
        if let Some(color) = &font.color {
            out.get_color_mut().set_argb(argb(color));
        }
    }
    if let Some(fill) = &payload.fill
        && let Some(color) = fill.color.first()
    {
        target.set_background_color(argb(color));
    }
    for border in &payload.border {
        apply_border(target, border);
    }
    if let Some(code) = &payload.custom_num_fmt {
        target.get_number_format_mut().set_format_code(code.clone());
    } else if let Some(id) = payload.num_fmt {
        target.get_number_format_mut().set_number_format_id(id);
    }
}

fn apply_border(target: &mut umya_spreadsheet::Style, border: &Border) {
    let borders = target.get_borders_mut();
    let out = match border.side.as_str() {
        "left" => borders.get_left_border_mut(),
        "right" => borders.get_right_border_mut(),
        "top" => borders.get_top_border_mut(),
        "bottom" => borders.get_bottom_border_mut(),
        "diagonalDown" | "diagonalUp" | "diagonal" => borders.get_diagonal_border_mut(),
        other => {
            tracing::warn!(side = other, "ignoring unknown border side");
            return;
        }
    };
    out.set_border_style(border_style(border.style));
    if let Some(color) = &border.color {
        out.get_color_mut().set_argb(argb(color));
    }
}

/// Border line names indexed by the numeric style id.
fn border_style(id: u32) -> &'static str {
    const STYLES: [&str; 14] = [
        "none",
        "thin",
        "medium",
        "dashed",
        "dotted",
        "thick",
        "double",
        "hair",
        "mediumDashed",
        "dashDot",
        "mediumDashDot",
        "dashDotDot",
        "mediumDashDotDot",
        "slantDashDot",
    ];
    STYLES.get(id as usize).copied().unwrap_or("thin")
}

/// `#RRGGBB` / `RRGGBB` → `FFRRGGBB`.
fn argb(color: &str) -> String {
    let hex = color.trim_start_matches('#').to_ascii_uppercase();
    if hex.len() == 6 { format!("FF{hex}") } else { hex }
}

fn horizontal(name: &str) -> Option<HorizontalAlignmentValues> {
    Some(match name {
        "left" => HorizontalAlignmentValues::Left,
        "center" => HorizontalAlignmentValues::Center,
        "right" => HorizontalAlignmentValues::Right,
        "fill" => HorizontalAlignmentValues::Fill,
        "justify" => HorizontalAlignmentValues::Justify,
        "centerContinuous" => HorizontalAlignmentValues::CenterContinuous,
        "distributed" => HorizontalAlignmentValues::Distributed,
        "general" => HorizontalAlignmentValues::General,
        _ => return None,
    })
}

fn vertical(name: &str) -> Option<VerticalAlignmentValues> {
    Some(match name {
        "top" => VerticalAlignmentValues::Top,
        "center" => VerticalAlignmentValues::Center,
        "bottom" => VerticalAlignmentValues::Bottom,
        "justify" => VerticalAlignmentValues::Justify,
        "distributed" => VerticalAlignmentValues::Distributed,
        _ => return None,
    })
}
