use crate::annotation::AnnotationParser;
use crate::config::DocumentConfig;
use crate::cursor::CursorMap;
use crate::engine::DocumentEngine;
use crate::error::{BindError, Result};
use crate::template::{ExpressionEvaluator, PathEvaluator};

/// A document engine together with the binding state tied to it: the
/// per-sheet write cursor and the annotation cache.
///
/// Write operations on one sheet must not run concurrently; the cursor lock
/// protects the row pointer, not the interleaving of cell writes.
pub struct Document<E: DocumentEngine> {
    pub(crate) engine: E,
    pub(crate) cursor: CursorMap,
    pub(crate) annotations: AnnotationParser,
    pub(crate) evaluator: Box<dyn ExpressionEvaluator>,
    pub(crate) config: DocumentConfig,
}

impl<E: DocumentEngine> Document<E> {
    pub fn new(engine: E) -> Self {
        Self::with_config(engine, DocumentConfig::default())
    }

    pub fn with_config(engine: E, config: DocumentConfig) -> Self {
        Self {
            engine,
            cursor: CursorMap::new(),
            annotations: AnnotationParser::new(config.cache_annotations),
            evaluator: Box::new(PathEvaluator),
            config,
        }
    }

    /// Replace the template expression evaluator.
    pub fn with_evaluator(mut self, evaluator: impl ExpressionEvaluator + 'static) -> Self {
        self.evaluator = Box::new(evaluator);
        self
    }

    pub fn config(&self) -> &DocumentConfig {
        &self.config
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    pub fn into_engine(self) -> E {
        self.engine
    }

    /// Set the next row to write on `sheet`. Row 0 is ignored.
    pub fn set_cursor(&mut self, sheet: &str, row: u32) -> &mut Self {
        self.cursor.set(sheet, row);
        self
    }

    /// Next row to write on `sheet`; 1 for a sheet never written.
    pub fn get_cursor(&self, sheet: &str) -> u32 {
        self.cursor.get(sheet)
    }

    pub fn cursor(&self) -> &CursorMap {
        &self.cursor
    }

    pub fn first_sheet(&self) -> Result<Option<String>> {
        let names = self.engine.sheet_names().map_err(BindError::engine)?;
        Ok(names.into_iter().next())
    }

    /// One past the run of leading rows that contain any text.
    pub fn last_non_empty_row(&self, sheet: &str) -> Result<u32> {
        let rows = self.engine.rows(sheet).map_err(BindError::engine)?;
        let filled = rows
            .iter()
            .take_while(|cells| cells.iter().any(|c| !c.is_empty()))
            .count();
        Ok(filled as u32 + 1)
    }
}

impl<E: DocumentEngine + std::fmt::Debug> std::fmt::Debug for Document<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("engine", &self.engine)
            .field("cursor", &self.cursor)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::MemoryEngine;

    #[test]
    fn cursor_chains_and_starts_at_one() {
        let mut doc = Document::new(MemoryEngine::with_sheets(["Sheet1"]));
        assert_eq!(doc.get_cursor("Sheet1"), 1);
        assert_eq!(doc.set_cursor("Sheet1", 4).get_cursor("Sheet1"), 4);
    }

    #[test]
    fn sheet_helpers() {
        let mut engine = MemoryEngine::with_sheets(["Data", "Other"]);
        engine
            .set_rows("Data", [vec!["h1", "h2"], vec!["", "x"], vec![], vec!["after gap"]])
            .unwrap();
        let doc = Document::new(engine);
        assert_eq!(doc.first_sheet().unwrap().as_deref(), Some("Data"));
        assert_eq!(doc.last_non_empty_row("Data").unwrap(), 3);
        assert_eq!(doc.last_non_empty_row("Other").unwrap(), 1);
        assert!(doc.last_non_empty_row("Missing").is_err());
    }
}
