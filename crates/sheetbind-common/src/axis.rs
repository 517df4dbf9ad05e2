//! Spreadsheet axis labels ("A1" style) for 1-based column/row positions.
//!
//! Columns use bijective base-26 lettering: there is no zero digit, so `Z`
//! is 26 and `AA` follows it. An axis is the column letters followed by the
//! decimal row number; a column-only label carries no digits at all.

use std::error::Error;
use std::fmt;

/// Errors returned when an axis label cannot be decoded.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum AxisError {
    /// The label had no leading column letters.
    MissingColumn(String),
    /// The label had no trailing row digits.
    MissingRow(String),
    /// Characters other than `[A-Za-z]+[0-9]+` were present.
    Malformed(String),
    /// Column or row was zero or did not fit in `u32`.
    OutOfRange(String),
}

impl fmt::Display for AxisError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AxisError::MissingColumn(axis) => write!(f, "axis `{axis}` has no column letters"),
            AxisError::MissingRow(axis) => write!(f, "axis `{axis}` has no row number"),
            AxisError::Malformed(axis) => write!(f, "axis `{axis}` is not a cell label"),
            AxisError::OutOfRange(axis) => write!(f, "axis `{axis}` is out of range"),
        }
    }
}

impl Error for AxisError {}

/// Encode a 1-based column as letters: 1 → `A`, 26 → `Z`, 27 → `AA`.
///
/// Panics if `col` is zero.
pub fn column_to_letters(mut col: u32) -> String {
    assert!(col >= 1, "columns are 1-based");
    let mut buf = Vec::new();
    while col > 0 {
        let rem = ((col - 1) % 26) as u8;
        buf.push(b'A' + rem);
        col = (col - 1) / 26;
    }
    buf.iter().rev().map(|b| char::from(*b)).collect()
}

/// Decode column letters back to a 1-based index. Lowercase letters are accepted.
pub fn letters_to_column(s: &str) -> Option<u32> {
    if s.is_empty() {
        return None;
    }
    let mut col: u32 = 0;
    for ch in s.bytes() {
        if !ch.is_ascii_alphabetic() {
            return None;
        }
        let val = (ch.to_ascii_uppercase() - b'A') as u32 + 1;
        col = col.checked_mul(26)?.checked_add(val)?;
    }
    Some(col)
}

/// Build an axis label. Without a row only the column letters are returned.
///
/// ```
/// use sheetbind_common::to_axis;
/// assert_eq!(to_axis(28, Some(3)), "AB3");
/// assert_eq!(to_axis(52, None), "AZ");
/// ```
pub fn to_axis(column: u32, row: Option<u32>) -> String {
    let letters = column_to_letters(column);
    match row {
        Some(row) => format!("{letters}{row}"),
        None => letters,
    }
}

/// Split an axis into its leading letters and trailing digits.
///
/// No validation is performed; `"B"` yields `("B", "")`.
pub fn split_axis(axis: &str) -> (&str, &str) {
    let idx = axis
        .find(|c: char| !c.is_ascii_alphabetic())
        .unwrap_or(axis.len());
    axis.split_at(idx)
}

/// Strip the trailing row digits, leaving the column part of the label.
pub fn strip_row(axis: &str) -> &str {
    axis.trim_end_matches(|c: char| c.is_ascii_digit())
}

/// True when the label ends in a row number.
pub fn has_row(axis: &str) -> bool {
    axis.chars().last().is_some_and(|c| c.is_ascii_digit())
}

/// Decode a full axis into a 1-based `(column, row)` pair.
pub fn parse_axis(axis: &str) -> Result<(u32, u32), AxisError> {
    let trimmed = axis.trim();
    let (letters, digits) = split_axis(trimmed);
    if letters.is_empty() {
        return Err(AxisError::MissingColumn(axis.to_string()));
    }
    if digits.is_empty() {
        return Err(AxisError::MissingRow(axis.to_string()));
    }
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(AxisError::Malformed(axis.to_string()));
    }
    let col = letters_to_column(letters).ok_or_else(|| AxisError::OutOfRange(axis.to_string()))?;
    let row: u32 = digits
        .parse()
        .map_err(|_| AxisError::OutOfRange(axis.to_string()))?;
    if row == 0 {
        return Err(AxisError::OutOfRange(axis.to_string()));
    }
    Ok((col, row))
}
