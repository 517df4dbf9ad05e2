//! Field annotation parsing.
//!
//! An annotation is a `;`-separated list of `key:value` pairs attached to a
//! record field, e.g. `axis:B2;colWidth:20;style:{"font":{"bold":true}}`.
//! `\;` keeps a literal semicolon inside a value. An empty annotation or the
//! single `-` marker excludes the field from writes.

use crate::error::{BindError, Result};
use crate::style::Style;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use sheetbind_common::{has_row, strip_row, to_axis};
use std::sync::Arc;

pub const IGNORE_MARKER: &str = "-";

const SEP: char = ';';
const ESCAPE: char = '\\';
const MERGE_SEP: char = '-';

const KEY_AXIS: &str = "axis";
const KEY_STYLE: &str = "style";
const KEY_COLUMN: &str = "column";
const KEY_COL_WIDTH: &str = "colWidth";

/// How one record field binds to a cell.
///
/// When `ignore` is set every other member is `None`. Otherwise `axis` is
/// always present (synthesized from the field ordinal when not annotated) and
/// `col` is its column part.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BindingRule {
    /// Target cell, or a two-cell merge range written `A1-B1`.
    pub axis: Option<String>,
    /// Header text for header-directed writes.
    pub column: Option<String>,
    pub col_width: Option<f64>,
    pub style: Option<Style>,
    /// Column letters of the (first) target cell.
    pub col: Option<String>,
    pub ignore: bool,
}

impl BindingRule {
    pub fn ignored() -> Self {
        Self {
            ignore: true,
            ..Default::default()
        }
    }

    /// The two ends of a merge range, if `axis` names one.
    pub fn merge_range(&self) -> Option<(&str, &str)> {
        let axis = self.axis.as_deref()?;
        let mut parts = axis.split(MERGE_SEP);
        match (parts.next(), parts.next(), parts.next()) {
            (Some(start), Some(end), None) => Some((start, end)),
            _ => None,
        }
    }
}

/// Parse an annotation without caching.
///
/// `ordinal` is the zero-based field position and `row` the row the record is
/// being written to; together they supply the default axis.
pub fn parse_annotation(text: &str, ordinal: usize, row: Option<u32>) -> Result<BindingRule> {
    if text.is_empty() || text == IGNORE_MARKER {
        return Ok(BindingRule::ignored());
    }

    let mut rule = BindingRule::default();
    for token in split_escaped(text) {
        let (key, value) = match token.split_once(':') {
            Some((key, value)) => (key.trim(), value.to_string()),
            None => {
                let key = token.trim();
                if key.is_empty() {
                    continue;
                }
                (key, key.to_string())
            }
        };
        match key {
            KEY_AXIS => rule.axis = Some(value),
            KEY_STYLE => {
                let style = Style::from_json(&value).map_err(|source| BindError::Style {
                    annotation: text.to_string(),
                    source,
                })?;
                rule.style = Some(style);
            }
            KEY_COLUMN => rule.column = Some(value),
            KEY_COL_WIDTH => match value.trim().parse::<f64>() {
                Ok(width) if width > 0.0 => rule.col_width = Some(width),
                _ => tracing::warn!(annotation = text, value = %value, "ignoring invalid colWidth"),
            },
            _ => tracing::trace!(annotation = text, key, "ignoring unknown annotation key"),
        }
    }

    let axis = match rule.axis.take() {
        Some(axis) => match row {
            Some(row) => with_row(&axis, row),
            None => axis,
        },
        None => to_axis(ordinal as u32 + 1, row),
    };
    let first = axis.split(MERGE_SEP).next().unwrap_or(axis.as_str());
    rule.col = Some(strip_row(first).to_string());
    rule.axis = Some(axis);
    Ok(rule)
}

/// Append `row` to every cell of `axis` that does not already end in digits.
fn with_row(axis: &str, row: u32) -> String {
    axis.split(MERGE_SEP)
        .map(|cell| {
            if has_row(cell) {
                cell.to_string()
            } else {
                format!("{cell}{row}")
            }
        })
        .collect::<Vec<_>>()
        .join("-")
}

/// Split on `;`, re-joining chunks whose separator was escaped with `\`.
fn split_escaped(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut pending: Option<String> = None;
    for chunk in text.split(SEP) {
        let mut current = match pending.take() {
            Some(mut head) => {
                head.push(SEP);
                head.push_str(chunk);
                head
            }
            None => chunk.to_string(),
        };
        if current.ends_with(ESCAPE) {
            current.pop();
            pending = Some(current);
        } else {
            tokens.push(current);
        }
    }
    // A trailing escape has nothing to join; keep it literally.
    if let Some(mut rest) = pending {
        rest.push(ESCAPE);
        tokens.push(rest);
    }
    tokens
}

type CacheKey = (String, usize, Option<u32>);

/// Memoizing front end for [`parse_annotation`].
///
/// Keyed by `(annotation, ordinal, row)`. Entries are never evicted; schema
/// annotations are static, so the cache is bounded by distinct rows written.
/// Safe to share between threads.
#[derive(Debug)]
pub struct AnnotationParser {
    cache: RwLock<FxHashMap<CacheKey, Arc<BindingRule>>>,
    enabled: bool,
}

impl Default for AnnotationParser {
    fn default() -> Self {
        Self::new(true)
    }
}

impl AnnotationParser {
    pub fn new(enabled: bool) -> Self {
        Self {
            cache: RwLock::new(FxHashMap::default()),
            enabled,
        }
    }

    pub fn parse(&self, text: &str, ordinal: usize, row: Option<u32>) -> Result<Arc<BindingRule>> {
        if !self.enabled {
            return parse_annotation(text, ordinal, row).map(Arc::new);
        }
        let key = (text.to_string(), ordinal, row);
        if let Some(rule) = self.cache.read().get(&key) {
            return Ok(Arc::clone(rule));
        }
        tracing::trace!(annotation = text, ordinal, ?row, "annotation cache miss");
        let rule = Arc::new(parse_annotation(text, ordinal, row)?);
        self.cache.write().insert(key, Arc::clone(&rule));
        Ok(rule)
    }

    pub fn len(&self) -> usize {
        self.cache.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.read().is_empty()
    }

    pub fn clear(&self) {
        self.cache.write().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_and_width() {
        let rule = parse_annotation("column:姓名;colWidth:20", 0, None).unwrap();
        assert_eq!(rule.column.as_deref(), Some("姓名"));
        assert_eq!(rule.col_width, Some(20.0));
        assert!(!rule.ignore);
        assert_eq!(rule.axis.as_deref(), Some("A"));
        assert_eq!(rule.col.as_deref(), Some("A"));
    }

    #[test]
    fn empty_and_dash_are_ignored() {
        assert_eq!(parse_annotation("", 3, Some(2)).unwrap(), BindingRule::ignored());
        assert_eq!(parse_annotation("-", 3, Some(2)).unwrap(), BindingRule::ignored());
    }

    #[test]
    fn axis_without_digits_takes_row() {
        let rule = parse_annotation("axis:C", 0, Some(2)).unwrap();
        assert_eq!(rule.axis.as_deref(), Some("C2"));
        assert_eq!(rule.col.as_deref(), Some("C"));

        let rule = parse_annotation("axis:C7", 0, Some(2)).unwrap();
        assert_eq!(rule.axis.as_deref(), Some("C7"));
    }

    #[test]
    fn default_axis_from_ordinal() {
        let rule = parse_annotation("colWidth:12", 27, Some(4)).unwrap();
        assert_eq!(rule.axis.as_deref(), Some("AB4"));
        assert_eq!(rule.col.as_deref(), Some("AB"));
    }

    #[test]
    fn merge_axis_gets_row_on_both_ends() {
        let rule = parse_annotation("axis:A-B", 0, Some(5)).unwrap();
        assert_eq!(rule.axis.as_deref(), Some("A5-B5"));
        assert_eq!(rule.merge_range(), Some(("A5", "B5")));
        assert_eq!(rule.col.as_deref(), Some("A"));
    }

    #[test]
    fn escaped_separator_stays_in_value() {
        let rule = parse_annotation(r"column:a\;b;colWidth:3", 0, None).unwrap();
        assert_eq!(rule.column.as_deref(), Some("a;b"));
        assert_eq!(rule.col_width, Some(3.0));
        assert_eq!(split_escaped(r"x\;y\;z"), vec!["x;y;z".to_string()]);
        assert_eq!(split_escaped(r"x\"), vec![r"x\".to_string()]);
    }

    #[test]
    fn shorthand_keys_and_unknown_keys() {
        let rule = parse_annotation("column;frozen:true", 1, Some(1)).unwrap();
        assert_eq!(rule.column.as_deref(), Some("column"));
        assert_eq!(rule.axis.as_deref(), Some("B1"));
    }

    #[test]
    fn style_value_may_contain_colons() {
        let rule =
            parse_annotation(r#"axis:A2;style:{"alignment":{"horizontal":"center"}}"#, 0, None)
                .unwrap();
        let style = rule.style.unwrap();
        assert_eq!(
            style.alignment.unwrap().horizontal.as_deref(),
            Some("center")
        );
    }

    #[test]
    fn malformed_style_fails() {
        let err = parse_annotation("style:{oops", 0, None).unwrap_err();
        assert!(matches!(err, BindError::Style { .. }));
    }

    #[test]
    fn invalid_width_is_dropped() {
        let rule = parse_annotation("colWidth:wide", 0, None).unwrap();
        assert_eq!(rule.col_width, None);
    }

    #[test]
    fn cache_is_transparent() {
        let cached = AnnotationParser::new(true);
        let uncached = AnnotationParser::new(false);
        for row in [Some(1), Some(2), Some(1), None] {
            let a = cached.parse("colWidth:20", 2, row).unwrap();
            let b = uncached.parse("colWidth:20", 2, row).unwrap();
            assert_eq!(a, b);
        }
        assert_eq!(cached.len(), 3);
        assert!(uncached.is_empty());
        assert!(cached.parse("style:{", 0, None).is_err());
        assert_eq!(cached.len(), 3);
    }
}
