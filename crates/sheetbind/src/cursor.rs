//! Per-sheet write cursor.

use parking_lot::Mutex;
use rustc_hash::FxHashMap;

/// Row pointer per sheet, 1-based.
///
/// An unseen sheet starts at row 1. The pointer only moves through
/// [`CursorMap::set`] and [`CursorMap::increment`]; every call takes the
/// same short lock, so the map may be shared across threads writing to
/// different sheets.
#[derive(Debug, Default)]
pub struct CursorMap {
    rows: Mutex<FxHashMap<String, u32>>,
}

impl CursorMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, sheet: &str) -> u32 {
        *self.rows.lock().entry(sheet.to_string()).or_insert(1)
    }

    /// Move the cursor. Row 0 is not a valid row and is ignored.
    pub fn set(&self, sheet: &str, row: u32) {
        if row == 0 {
            tracing::debug!(sheet, "ignoring cursor reset to row 0");
            return;
        }
        self.rows.lock().insert(sheet.to_string(), row);
    }

    /// Advance by one row and return the new position.
    pub fn increment(&self, sheet: &str) -> u32 {
        let mut rows = self.rows.lock();
        let row = rows.entry(sheet.to_string()).or_insert(1);
        *row += 1;
        *row
    }
}
