//! Deterministic rule-based text correction engine.
//! Matches an ordered catalog of regex rules against sanitised text,
//! resolves overlapping matches and rewrites the text in one pass, then
//! attaches statistics, readability and writing advice.

pub mod analytics;
pub mod catalog;
pub mod config;
pub mod corrector;
pub mod goals;
pub mod improvements;
pub mod matcher;
pub mod resolver;
pub mod rewriter;
pub mod rules;
pub mod stats;
pub mod validate;

use std::{io, path::Path, sync::Arc};

use thiserror::Error;

pub use analytics::{AdvancedStats, StyleKind, StyleReport, StyleSuggestion};
pub use catalog::{Catalog, CatalogError, CatalogKind, Category, Severity};
pub use config::Config;
pub use corrector::{CorrectionResult, CorrectionStats, Corrector, RuleCorrector};
pub use goals::{create_goal, update_goal_progress, GoalKind, WritingGoal};
pub use rewriter::{CorrectionError, Location};
pub use stats::{compute_statistics, Difficulty, TextStatistics};
pub use validate::{
    sanitize, sanitize_mapped, Sanitized, ValidationError, ValidationReport, ValidationWarning,
};

/// Reasons a correction request produces no result.
#[derive(Debug, Error)]
pub enum CorrectError {
    #[error("input rejected: {reason}")]
    Rejected {
        reason: ValidationError,
        report: ValidationReport,
    },
}

/// Compiled catalogs plus the configuration they were built from.
///
/// Immutable after construction and safe to share across threads.
#[derive(Debug)]
pub struct Engine {
    config: Config,
    basic: Arc<Catalog>,
    extended: Arc<Catalog>,
}

impl Engine {
    pub fn new(config: Config) -> Result<Self, CatalogError> {
        let custom = config.custom_specs();
        let basic = Catalog::build(CatalogKind::Basic, custom.clone(), &config.disabled_rules)?;
        let extended = Catalog::build(CatalogKind::Extended, custom, &config.disabled_rules)?;
        tracing::debug!(
            basic = basic.len(),
            extended = extended.len(),
            custom = config.rules.len(),
            disabled = config.disabled_rules.len(),
            "compiled rule catalogs"
        );
        Ok(Self {
            config,
            basic: Arc::new(basic),
            extended: Arc::new(extended),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn catalog(&self, kind: CatalogKind) -> &Catalog {
        match kind {
            CatalogKind::Basic => &self.basic,
            CatalogKind::Extended => &self.extended,
        }
    }

    pub fn rule_corrector(&self, kind: CatalogKind) -> RuleCorrector {
        let catalog = match kind {
            CatalogKind::Basic => Arc::clone(&self.basic),
            CatalogKind::Extended => Arc::clone(&self.extended),
        };
        RuleCorrector::new(catalog, self.config.statistics.words_per_minute)
    }

    pub fn validate(&self, text: &str) -> ValidationReport {
        validate::validate(text, &self.config.validation)
    }

    pub fn validate_file(&self, path: &Path) -> io::Result<ValidationReport> {
        validate::validate_file(path, &self.config.validation)
    }

    /// Statistics of the sanitised text. Never fails; empty text yields zeros.
    pub fn compute_statistics(&self, raw: &str) -> TextStatistics {
        stats::compute_statistics_with(&sanitize(raw), self.config.statistics.words_per_minute)
    }

    /// Correct with the configured catalog.
    pub fn correct(&self, raw: &str) -> Result<CorrectionResult, CorrectError> {
        self.correct_in(self.config.catalog, raw)
    }

    /// Correct with the extended catalog regardless of configuration.
    pub fn correct_extended(&self, raw: &str) -> Result<CorrectionResult, CorrectError> {
        self.correct_in(CatalogKind::Extended, raw)
    }

    #[tracing::instrument(level = "debug", skip_all, fields(catalog = %kind, bytes = raw.len()))]
    pub fn correct_in(&self, kind: CatalogKind, raw: &str) -> Result<CorrectionResult, CorrectError> {
        let (text, warnings) = self.admit(raw)?;
        let mut result = self.rule_corrector(kind).run(&text);
        result.warnings = warnings;
        Ok(result)
    }

    /// Run an external corrector, degrading to the configured rule catalog
    /// when it fails or returns spans that do not fit the text.
    #[tracing::instrument(level = "debug", skip_all, fields(corrector = corrector.name()))]
    pub fn correct_with(
        &self,
        corrector: &dyn Corrector,
        raw: &str,
    ) -> Result<CorrectionResult, CorrectError> {
        let (text, warnings) = self.admit(raw)?;
        let mut result = match corrector.correct(&text) {
            Ok(result) if result.original == text && result.has_valid_offsets() => result,
            Ok(_) => {
                tracing::warn!(
                    corrector = corrector.name(),
                    "corrector returned inconsistent spans, using rules"
                );
                self.rule_corrector(self.config.catalog).run(&text)
            }
            Err(err) => {
                tracing::warn!(
                    corrector = corrector.name(),
                    error = %err,
                    "corrector failed, using rules"
                );
                self.rule_corrector(self.config.catalog).run(&text)
            }
        };
        result.warnings = warnings;
        Ok(result)
    }

    /// Sanitise then validate. Returns the text every offset will refer to.
    fn admit(&self, raw: &str) -> Result<(String, Vec<ValidationWarning>), CorrectError> {
        let text = sanitize(raw);
        let report = self.validate(&text);
        if let Some(reason) = report.first_error().cloned() {
            tracing::debug!(%reason, "input rejected");
            return Err(CorrectError::Rejected { reason, report });
        }
        for warning in &report.warnings {
            tracing::debug!(%warning, "validation warning");
        }
        Ok((text, report.warnings))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> Engine {
        Engine::new(Config::default()).unwrap()
    }

    #[test]
    fn engine_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Engine>();
    }

    #[test]
    fn rejects_blank_input_after_sanitising() {
        let err = engine().correct(" \r\n\u{0} ").unwrap_err();
        let CorrectError::Rejected { reason, report } = err;
        assert_eq!(reason, ValidationError::Empty);
        assert!(!report.is_valid);
    }

    #[test]
    fn offsets_refer_to_sanitised_text() {
        let result = engine().correct("\r\n  teh end\r\n").unwrap();
        assert_eq!(result.original, "teh end");
        assert_eq!(result.errors[0].start, 0);
        assert_eq!(result.corrected, "the end");
    }

    #[test]
    fn configured_catalog_drives_correct() {
        let config = Config {
            catalog: CatalogKind::Extended,
            ..Config::default()
        };
        let engine = Engine::new(config).unwrap();
        let result = engine.correct("we left. it rained.").unwrap();
        assert_eq!(result.corrected, "We left. It rained.");
        assert!(result.style.is_some());
    }

    #[test]
    fn warnings_ride_along_with_accepted_input() {
        let result = engine()
            .correct(&format!("wait{} teh", "!".repeat(25)))
            .unwrap();
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.corrected, format!("wait{} the", "!".repeat(25)));
    }

    #[test]
    fn statistics_use_configured_reading_speed() {
        let mut config = Config::default();
        config.statistics.words_per_minute = 1;
        let engine = Engine::new(config).unwrap();
        assert_eq!(engine.compute_statistics("one two three").reading_time_minutes, 3);
    }
}
