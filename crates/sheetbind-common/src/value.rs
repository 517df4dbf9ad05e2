use std::fmt::{self, Display};

/// A scalar written to or read from a single cell.
///
/// Narrower than a full formula value: the binding layer only moves record
/// fields and substituted template text.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    Int(i64),
    Number(f64),
    Text(String),
    Boolean(bool),
    #[default]
    Empty,
}

impl CellValue {
    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.is_empty(),
            _ => false,
        }
    }

    /// Numeric view of the value, if it has one.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Int(i) => Some(*i as f64),
            CellValue::Number(n) => Some(*n),
            _ => None,
        }
    }
}

impl Display for CellValue {
    /// Renders the text a spreadsheet would show for the value.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Int(i) => write!(f, "{i}"),
            CellValue::Number(n) => write!(f, "{n}"),
            CellValue::Text(s) => f.write_str(s),
            CellValue::Boolean(true) => f.write_str("TRUE"),
            CellValue::Boolean(false) => f.write_str("FALSE"),
            CellValue::Empty => Ok(()),
        }
    }
}

macro_rules! from_signed {
    ($($t:ty),*) => {$(
        impl From<$t> for CellValue {
            fn from(value: $t) -> Self {
                CellValue::Int(value as i64)
            }
        }
    )*};
}

from_signed!(i8, i16, i32, i64, isize, u8, u16, u32);

impl From<u64> for CellValue {
    fn from(value: u64) -> Self {
        match i64::try_from(value) {
            Ok(i) => CellValue::Int(i),
            Err(_) => CellValue::Number(value as f64),
        }
    }
}

impl From<usize> for CellValue {
    fn from(value: usize) -> Self {
        CellValue::from(value as u64)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

impl From<f32> for CellValue {
    fn from(value: f32) -> Self {
        CellValue::Number(value as f64)
    }
}

impl From<bool> for CellValue {
    fn from(value: bool) -> Self {
        CellValue::Boolean(value)
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(CellValue::Empty, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_matches_sheet_text() {
        assert_eq!(CellValue::Number(95.5).to_string(), "95.5");
        assert_eq!(CellValue::Number(95.0).to_string(), "95");
        assert_eq!(CellValue::Int(-3).to_string(), "-3");
        assert_eq!(CellValue::Boolean(true).to_string(), "TRUE");
        assert_eq!(CellValue::Empty.to_string(), "");
    }

    #[test]
    fn wide_unsigned_falls_back_to_number() {
        assert_eq!(CellValue::from(7u64), CellValue::Int(7));
        assert_eq!(CellValue::from(u64::MAX), CellValue::Number(u64::MAX as f64));
    }

    #[test]
    fn emptiness() {
        assert!(CellValue::Empty.is_empty());
        assert!(CellValue::from("").is_empty());
        assert!(!CellValue::from(0).is_empty());
        assert_eq!(CellValue::from(None::<i32>), CellValue::Empty);
    }
}
