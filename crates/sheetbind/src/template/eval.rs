//! Expression evaluation for `{{ ... }}` spans in cell text.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde_json::Value;

static SPAN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{\{(.*?)\}\}").expect("valid span regex"));

/// Evaluator failure; aborts the render.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("cannot evaluate `{expression}`: {message}")]
pub struct EvalError {
    pub expression: String,
    pub message: String,
}

impl EvalError {
    pub fn new(expression: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            expression: expression.into(),
            message: message.into(),
        }
    }
}

/// Renders the template text of one cell against the current render datum.
pub trait ExpressionEvaluator: Send + Sync {
    fn evaluate(&self, template: &str, datum: &Value) -> Result<String, EvalError>;
}

/// Evaluator for field-path spans.
///
/// Supports `{{ . }}` (the datum itself), `{{ .a.b }}` (nested field lookup)
/// and quoted string literals. Text outside spans is kept as is. Missing
/// fields are errors.
#[derive(Debug, Clone, Copy, Default)]
pub struct PathEvaluator;

impl ExpressionEvaluator for PathEvaluator {
    fn evaluate(&self, template: &str, datum: &Value) -> Result<String, EvalError> {
        let mut failure = None;
        let out = SPAN.replace_all(template, |caps: &Captures<'_>| {
            let expr = caps[1].trim();
            match eval_expr(expr, datum) {
                Ok(text) => text,
                Err(err) => {
                    failure.get_or_insert(err);
                    String::new()
                }
            }
        });
        match failure {
            Some(err) => Err(err),
            None => Ok(out.into_owned()),
        }
    }
}

fn eval_expr(expr: &str, datum: &Value) -> Result<String, EvalError> {
    if let Some(path) = expr.strip_prefix('.') {
        let value = lookup(datum, path)
            .ok_or_else(|| EvalError::new(expr, "field path does not resolve"))?;
        return Ok(display(value));
    }
    if expr.len() >= 2 && expr.starts_with('"') && expr.ends_with('"') {
        return serde_json::from_str::<String>(expr)
            .map_err(|e| EvalError::new(expr, e.to_string()));
    }
    Err(EvalError::new(expr, "unsupported expression"))
}

/// Walk a dotted path (without the leading dot) through nested objects.
/// The empty path is the value itself.
pub fn lookup<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    let path = path.trim();
    if path.is_empty() {
        return Some(root);
    }
    path.split('.')
        .try_fold(root, |current, segment| current.as_object()?.get(segment.trim()))
}

fn display(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => number(n),
        other => other.to_string(),
    }
}

/// Whole floats print without a fraction (`90.0` → `90`).
fn number(n: &serde_json::Number) -> String {
    const EXACT: f64 = 9_007_199_254_740_992.0; // 2^53
    match n.as_f64() {
        Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() <= EXACT => {
            format!("{}", f as i64)
        }
        _ => n.to_string(),
    }
}
