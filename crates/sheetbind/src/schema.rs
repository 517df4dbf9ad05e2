//! Schema descriptors for bindable records.
//!
//! A record type describes its fields once, as a static [`Schema`], and exposes
//! positional access to their values. `#[derive(Record)]` generates both from
//! the struct definition and its `#[xlsx("...")]` attributes.

use sheetbind_common::CellValue;
use std::fmt;

/// Semantic kind of a record field, as far as cell coercion is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    Int,
    Uint,
    Float,
    Text,
    Bool,
    /// Excluded from binding; any Rust type.
    Unsupported,
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FieldKind::Int => "signed integer",
            FieldKind::Uint => "unsigned integer",
            FieldKind::Float => "float",
            FieldKind::Text => "text",
            FieldKind::Bool => "bool",
            FieldKind::Unsupported => "unsupported",
        })
    }
}

/// A value already coerced from cell text into a field's kind.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Int(i64),
    Uint(u64),
    Float(f64),
    Text(String),
}

/// A [`FieldValue`] that the destination Rust type cannot hold.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{value:?} does not fit in {target}")]
pub struct FieldValueError {
    pub target: &'static str,
    pub value: FieldValue,
}

/// Conversion between a field's Rust type and the binding layer.
pub trait FieldType: Sized {
    const KIND: FieldKind;

    fn to_cell(&self) -> CellValue;

    fn from_field(value: FieldValue) -> Result<Self, FieldValueError>;
}

macro_rules! signed_field {
    ($($t:ty),*) => {$(
        impl FieldType for $t {
            const KIND: FieldKind = FieldKind::Int;

            fn to_cell(&self) -> CellValue {
                CellValue::Int(*self as i64)
            }

            fn from_field(value: FieldValue) -> Result<Self, FieldValueError> {
                match value {
                    FieldValue::Int(i) => <$t>::try_from(i).ok(),
                    _ => None,
                }
                .ok_or(FieldValueError { target: stringify!($t), value })
            }
        }
    )*};
}

macro_rules! unsigned_field {
    ($($t:ty),*) => {$(
        impl FieldType for $t {
            const KIND: FieldKind = FieldKind::Uint;

            fn to_cell(&self) -> CellValue {
                CellValue::from(*self as u64)
            }

            fn from_field(value: FieldValue) -> Result<Self, FieldValueError> {
                match value {
                    FieldValue::Uint(u) => <$t>::try_from(u).ok(),
                    _ => None,
                }
                .ok_or(FieldValueError { target: stringify!($t), value })
            }
        }
    )*};
}

signed_field!(i8, i16, i32, i64, isize);
unsigned_field!(u8, u16, u32, u64, usize);

impl FieldType for f64 {
    const KIND: FieldKind = FieldKind::Float;

    fn to_cell(&self) -> CellValue {
        CellValue::Number(*self)
    }

    fn from_field(value: FieldValue) -> Result<Self, FieldValueError> {
        match value {
            FieldValue::Float(f) => Ok(f),
            other => Err(FieldValueError { target: "f64", value: other }),
        }
    }
}

impl FieldType for f32 {
    const KIND: FieldKind = FieldKind::Float;

    fn to_cell(&self) -> CellValue {
        CellValue::Number(*self as f64)
    }

    fn from_field(value: FieldValue) -> Result<Self, FieldValueError> {
        match value {
            FieldValue::Float(f) => Ok(f as f32),
            other => Err(FieldValueError { target: "f32", value: other }),
        }
    }
}

impl FieldType for String {
    const KIND: FieldKind = FieldKind::Text;

    fn to_cell(&self) -> CellValue {
        CellValue::Text(self.clone())
    }

    fn from_field(value: FieldValue) -> Result<Self, FieldValueError> {
        match value {
            FieldValue::Text(s) => Ok(s),
            other => Err(FieldValueError { target: "String", value: other }),
        }
    }
}

// Writable, but never read back: the unmarshaller rejects `Bool` fields.
impl FieldType for bool {
    const KIND: FieldKind = FieldKind::Bool;

    fn to_cell(&self) -> CellValue {
        CellValue::Boolean(*self)
    }

    fn from_field(value: FieldValue) -> Result<Self, FieldValueError> {
        Err(FieldValueError { target: "bool", value })
    }
}

/// Static description of one field: name, kind and raw annotation text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub name: &'static str,
    pub kind: FieldKind,
    pub annotation: Option<&'static str>,
}

impl FieldDescriptor {
    pub const fn new(
        name: &'static str,
        kind: FieldKind,
        annotation: Option<&'static str>,
    ) -> Self {
        Self {
            name,
            kind,
            annotation,
        }
    }
}

/// Ordered field list of a record type, computed once per type.
#[derive(Debug, PartialEq, Eq)]
pub struct Schema {
    type_name: &'static str,
    fields: &'static [FieldDescriptor],
}

impl Schema {
    pub const fn new(type_name: &'static str, fields: &'static [FieldDescriptor]) -> Self {
        Self { type_name, fields }
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Fields in declaration order.
    pub fn fields(&self) -> &'static [FieldDescriptor] {
        self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn field(&self, index: usize) -> Option<&'static FieldDescriptor> {
        self.fields.get(index)
    }
}

/// A typed record that can be written to and read from a row of cells.
///
/// The trait is object safe so heterogeneous rows can be written through
/// `&dyn Record`; [`Record::descriptor`] gives the schema without an instance.
pub trait Record {
    fn descriptor() -> &'static Schema
    where
        Self: Sized;

    fn schema(&self) -> &'static Schema;

    /// Value of the field at `index`; out-of-range indices give `Empty`.
    fn cell_value(&self, index: usize) -> CellValue;

    /// Store an already coerced value into the field at `index`.
    fn set_field(&mut self, index: usize, value: FieldValue) -> Result<(), FieldValueError>;
}

impl<R: Record> Record for Box<R> {
    fn descriptor() -> &'static Schema {
        R::descriptor()
    }

    fn schema(&self) -> &'static Schema {
        (**self).schema()
    }

    fn cell_value(&self, index: usize) -> CellValue {
        (**self).cell_value(index)
    }

    fn set_field(&mut self, index: usize, value: FieldValue) -> Result<(), FieldValueError> {
        (**self).set_field(index, value)
    }
}

/// One top-level element of a multi-row write.
pub enum RowData<'a> {
    /// Laid out by the record's annotations.
    Record(&'a dyn Record),
    /// Laid out positionally from column `A`.
    Values(Vec<CellValue>),
}

impl<'a, R: Record> From<&'a R> for RowData<'a> {
    fn from(record: &'a R) -> Self {
        RowData::Record(record)
    }
}

impl From<Vec<CellValue>> for RowData<'_> {
    fn from(values: Vec<CellValue>) -> Self {
        RowData::Values(values)
    }
}

impl fmt::Debug for RowData<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowData::Record(record) => f
                .debug_tuple("Record")
                .field(&record.schema().type_name())
                .finish(),
            RowData::Values(values) => f.debug_tuple("Values").field(values).finish(),
        }
    }
}
