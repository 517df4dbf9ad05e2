//! Error type for the binding and template surface.

use crate::schema::{FieldKind, FieldValueError};
use crate::template::EvalError;
use sheetbind_common::AxisError;

/// All failures reported by [`Document`](crate::Document) operations.
#[derive(Debug, thiserror::Error)]
pub enum BindError {
    /// A caller-supplied argument had the wrong shape.
    #[error("invalid target: {0}")]
    InvalidTarget(String),

    /// A `range` marker resolved to something that is not a list.
    #[error("`.{path}` is not a list")]
    NotAList { path: String },

    /// A dotted field path did not resolve against the render datum.
    #[error("cannot resolve field path `.{path}`")]
    UnresolvedPath { path: String },

    /// The `style:` payload of an annotation was not valid JSON style data.
    #[error("invalid style in annotation `{annotation}`: {source}")]
    Style {
        annotation: String,
        #[source]
        source: serde_json::Error,
    },

    /// A template marker was recognised but could not be parsed.
    #[error("template marker error at row {row}: {message}")]
    MarkerSyntax { row: u32, message: String },

    /// Cell text could not be coerced into the destination field.
    #[error("cannot convert `{text}` at {axis} into {kind}")]
    Coerce {
        axis: String,
        kind: FieldKind,
        text: String,
    },

    /// The coerced value did not fit the field's Rust type.
    #[error("field `{field}` at {axis}: {source}")]
    FieldRange {
        field: &'static str,
        axis: String,
        #[source]
        source: FieldValueError,
    },

    /// The destination field kind cannot be read from a cell.
    #[error("unsupported type {kind} for field `{field}`")]
    UnsupportedType { field: &'static str, kind: FieldKind },

    /// A cell label could not be parsed.
    #[error(transparent)]
    Axis(#[from] AxisError),

    /// The expression evaluator rejected a cell template.
    #[error(transparent)]
    Expression(#[from] EvalError),

    /// The render datum could not be turned into a field tree.
    #[error("render datum is not serializable: {0}")]
    Datum(#[source] serde_json::Error),

    /// Failure reported by the document engine, passed through unchanged.
    #[error(transparent)]
    Engine(Box<dyn std::error::Error + Send + Sync + 'static>),
}

impl BindError {
    pub fn engine<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        BindError::Engine(Box::new(err))
    }

    /// Downcast the engine error, if this is one.
    pub fn engine_error<E: std::error::Error + 'static>(&self) -> Option<&E> {
        match self {
            BindError::Engine(inner) => inner.downcast_ref::<E>(),
            _ => None,
        }
    }
}

pub type Result<T, E = BindError> = std::result::Result<T, E>;
