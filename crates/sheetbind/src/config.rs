use serde::{Deserialize, Serialize};

/// Behaviour switches for a [`Document`](crate::Document).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentConfig {
    /// Memoize parsed annotations by `(text, ordinal, row)`.
    pub cache_annotations: bool,
    /// Write substituted template text back as a number when it parses as one.
    pub infer_numbers: bool,
    /// Ask the engine to refresh formula links after a render.
    pub refresh_formulas: bool,
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self {
            cache_annotations: true,
            infer_numbers: true,
            refresh_formulas: true,
        }
    }
}

impl DocumentConfig {
    /// Always write template output as text.
    pub fn text_only() -> Self {
        Self {
            infer_numbers: false,
            ..Self::default()
        }
    }

    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}
