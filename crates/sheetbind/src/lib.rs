//! Annotation-driven record binding and row templates for spreadsheets.
//!
//! Two ways of moving data between Rust values and a sheet:
//!
//! - **Records.** A `#[derive(Record)]` struct describes where each field
//!   lives through `#[xlsx("axis:B2;colWidth:20")]` annotations.
//!   [`Document::write_record`] and friends write records at a per-sheet
//!   cursor row; [`Document::read_rows`] reads a row range back.
//! - **Templates.** [`Document::render`] expands `{{ range .List }}` …
//!   `{{ end }}` blocks against a serializable datum and substitutes every
//!   `{{ .Field }}` span.
//!
//! The workbook itself sits behind [`DocumentEngine`]. [`MemoryEngine`] keeps
//! sheets in memory; the `umya` feature adds an `.xlsx` engine.

extern crate self as sheetbind;

pub mod annotation;
pub mod config;
pub mod cursor;
pub mod document;
pub mod engine;
pub mod error;
pub mod marshal;
pub mod schema;
pub mod style;
pub mod template;
pub mod unmarshal;

pub use annotation::{AnnotationParser, BindingRule, IGNORE_MARKER, parse_annotation};
pub use config::DocumentConfig;
pub use cursor::CursorMap;
pub use document::Document;
pub use engine::{DocumentEngine, MemoryEngine, MemoryEngineError, StyleId};
#[cfg(feature = "umya")]
pub use engine::{UmyaEngine, UmyaEngineError};
pub use error::{BindError, Result};
pub use marshal::{HeaderMap, project_record};
pub use schema::{
    FieldDescriptor, FieldKind, FieldType, FieldValue, FieldValueError, Record, RowData, Schema,
};
pub use style::{Alignment, Border, Fill, Font, Style};
pub use template::{
    EvalError, ExpressionEvaluator, PathEvaluator, RangeBlock, RowEdit, plan_edits, scan_blocks,
};

pub use sheetbind_common::{
    AxisError, CellValue, column_to_letters, letters_to_column, parse_axis, strip_row, to_axis,
};
pub use sheetbind_macros::Record;
