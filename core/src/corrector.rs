//! The `Corrector` seam and the deterministic rule-based implementation.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::analytics::{style_report, StyleReport};
use crate::catalog::{Catalog, CatalogKind, Severity};
use crate::improvements::suggest_improvements;
use crate::matcher::find_matches;
use crate::resolver::resolve;
use crate::rewriter::{apply, CorrectionError};
use crate::stats::compute_statistics_with;
use crate::validate::ValidationWarning;

/// Summary counters for a correction run.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CorrectionStats {
    /// Findings with severity `error`.
    pub errors: usize,
    /// Findings with severity `warning` or `suggestion`.
    pub improvements: usize,
    pub word_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CorrectionResult {
    /// Sanitised input; every error offset points into this string.
    pub original: String,
    pub corrected: String,
    pub errors: Vec<CorrectionError>,
    pub improvements: Vec<String>,
    /// Rounded Flesch score of `original`, `0..=100`.
    pub readability_score: u32,
    pub stats: CorrectionStats,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<ValidationWarning>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<StyleReport>,
}

impl CorrectionResult {
    /// Every error span lies inside `original` and slices to the reported text,
    /// and spans are sorted and disjoint.
    pub fn has_valid_offsets(&self) -> bool {
        let mut last_end = 0;
        for err in &self.errors {
            if err.start >= err.end || err.start < last_end {
                return false;
            }
            if self.original.get(err.start..err.end) != Some(err.original.as_str()) {
                return false;
            }
            last_end = err.end;
        }
        true
    }
}

/// Anything that can turn sanitised, validated text into a correction result.
///
/// The rule engine is one implementation; a remote service can be another.
/// [`crate::Engine::correct_with`] falls back to the rules when an
/// implementation fails.
pub trait Corrector: Send + Sync {
    fn name(&self) -> &str;

    fn correct(&self, text: &str) -> anyhow::Result<CorrectionResult>;
}

/// Match, resolve and rewrite against one catalog.
#[derive(Debug, Clone)]
pub struct RuleCorrector {
    catalog: Arc<Catalog>,
    words_per_minute: usize,
}

impl RuleCorrector {
    pub fn new(catalog: Arc<Catalog>, words_per_minute: usize) -> Self {
        Self {
            catalog,
            words_per_minute,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn run(&self, text: &str) -> CorrectionResult {
        let candidates = find_matches(text, &self.catalog);
        let candidate_count = candidates.len();
        let resolved = resolve(candidates);
        let (corrected, errors) = apply(text, &resolved, &self.catalog);
        tracing::debug!(
            catalog = %self.catalog.kind(),
            candidates = candidate_count,
            applied = errors.len(),
            "rule pass finished"
        );

        let statistics = compute_statistics_with(text, self.words_per_minute);
        let improvements = suggest_improvements(text, errors.len());
        let style = (self.catalog.kind() == CatalogKind::Extended)
            .then(|| style_report(text, &errors, &statistics));
        let error_count = errors
            .iter()
            .filter(|e| e.severity == Severity::Error)
            .count();

        CorrectionResult {
            original: text.to_string(),
            corrected,
            stats: CorrectionStats {
                errors: error_count,
                improvements: errors.len() - error_count,
                word_count: statistics.word_count,
            },
            errors,
            improvements,
            readability_score: statistics.flesch_score,
            warnings: Vec::new(),
            style,
        }
    }
}

impl Corrector for RuleCorrector {
    fn name(&self) -> &str {
        "rules"
    }

    fn correct(&self, text: &str) -> anyhow::Result<CorrectionResult> {
        Ok(self.run(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules(kind: CatalogKind) -> RuleCorrector {
        let catalog = Catalog::build(kind, Vec::new(), &[]).unwrap();
        RuleCorrector::new(Arc::new(catalog), 200)
    }

    #[test]
    fn counts_errors_and_improvements_separately() {
        let result = rules(CatalogKind::Basic).run("She dont like it , really.");
        assert_eq!(result.stats.errors, 1);
        assert_eq!(result.stats.improvements, 1);
        assert_eq!(result.corrected, "She don't like it, really.");
        assert!(result.has_valid_offsets());
    }

    #[test]
    fn basic_mode_has_no_style_report() {
        assert!(rules(CatalogKind::Basic).run("in order to win").style.is_none());
    }

    #[test]
    fn extended_mode_attaches_style_report() {
        let result = rules(CatalogKind::Extended)
            .run("We left early due to the fact that it rained. It was very good.");
        let style = result.style.expect("extended style report");
        assert_eq!(style.style_suggestions.len(), 2);
        assert_eq!(
            result.corrected,
            "We left early because it rained. It was excellent."
        );
    }

    #[test]
    fn detects_tampered_offsets() {
        let mut result = rules(CatalogKind::Basic).run("teh end");
        assert!(result.has_valid_offsets());
        result.errors[0].start = 1;
        assert!(!result.has_valid_offsets());
    }
}
