//! Applies resolved matches and builds the consumer-facing error list.

use serde::{Deserialize, Serialize};

use crate::catalog::{Catalog, Category, Severity};
use crate::matcher::Match;

/// Location metadata in 1-based line/column coordinates.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Location {
    pub line: usize,
    pub column: usize,
}

/// A finding reported to the caller. `start`/`end` are byte offsets into the
/// text the engine was given, never into the corrected output.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CorrectionError {
    pub id: String,
    #[serde(rename = "type")]
    pub category: Category,
    pub severity: Severity,
    pub rule: String,
    pub original: String,
    pub suggestion: String,
    pub explanation: String,
    pub start: usize,
    pub end: usize,
    pub location: Location,
}

/// Rewrite `text` with `resolved` matches, which must be sorted by start and
/// must not overlap (the output of [`crate::resolver::resolve`]).
pub fn apply(text: &str, resolved: &[Match], catalog: &Catalog) -> (String, Vec<CorrectionError>) {
    let mut corrected = String::with_capacity(text.len());
    let mut errors = Vec::with_capacity(resolved.len());
    let mut cursor = 0;
    let mut locator = Locator::new(text);

    for m in resolved {
        debug_assert!(m.start >= cursor, "matches must be sorted and disjoint");
        let Some(rule) = catalog.rule(m.rule) else {
            continue;
        };
        corrected.push_str(&text[cursor..m.start]);
        corrected.push_str(&m.suggestion);
        cursor = m.end;

        errors.push(CorrectionError {
            id: format!("error-{}", errors.len()),
            category: rule.category,
            severity: rule.severity,
            rule: rule.id.clone(),
            original: m.original.clone(),
            suggestion: m.suggestion.clone(),
            explanation: rule.explain(&m.original, &m.suggestion),
            start: m.start,
            end: m.end,
            location: locator.locate(m.start),
        });
    }
    corrected.push_str(&text[cursor..]);
    (corrected, errors)
}

/// Converts ascending byte offsets to line/column without rescanning.
struct Locator<'a> {
    text: &'a str,
    offset: usize,
    line: usize,
    line_start: usize,
}

impl<'a> Locator<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            text,
            offset: 0,
            line: 1,
            line_start: 0,
        }
    }

    fn locate(&mut self, byte_offset: usize) -> Location {
        if byte_offset < self.offset {
            *self = Locator::new(self.text);
        }
        for (idx, ch) in self.text[self.offset..byte_offset].char_indices() {
            if ch == '\n' {
                self.line += 1;
                self.line_start = self.offset + idx + 1;
            }
        }
        self.offset = byte_offset;
        let column = self.text[self.line_start..byte_offset].chars().count() + 1;
        Location {
            line: self.line,
            column,
        }
    }
}
