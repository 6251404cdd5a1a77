//! Engine configuration, loaded from YAML.

use std::fs;
use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::catalog::{CatalogKind, Category, Equality, Replacement, RuleSpec, Severity};
use crate::stats::DEFAULT_WORDS_PER_MINUTE;

/// Limits enforced before any matching happens.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Hard limit in characters.
    pub max_length: usize,
    /// Soft limit in characters; exceeding it only warns.
    pub soft_length: usize,
    pub repeated_char_run: usize,
    pub whitespace_run: usize,
    pub max_file_bytes: u64,
    pub allowed_extensions: Vec<String>,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            max_length: 50_000,
            soft_length: 10_000,
            repeated_char_run: 20,
            whitespace_run: 10,
            max_file_bytes: 5 * 1024 * 1024,
            allowed_extensions: vec!["txt".into(), "rtf".into(), "md".into()],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StatisticsConfig {
    pub words_per_minute: usize,
}

impl Default for StatisticsConfig {
    fn default() -> Self {
        Self {
            words_per_minute: DEFAULT_WORDS_PER_MINUTE,
        }
    }
}

fn default_explanation() -> String {
    "Replace '{original}' with '{suggestion}'".into()
}

/// User-defined rule appended after the built-in catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomRule {
    pub id: String,
    pub pattern: String,
    #[serde(default)]
    pub case_insensitive: bool,
    pub category: Category,
    #[serde(default)]
    pub severity: Severity,
    pub replace: String,
    #[serde(default = "default_explanation")]
    pub explanation: String,
    #[serde(default)]
    pub equality: Equality,
}

impl CustomRule {
    pub fn to_spec(&self) -> RuleSpec {
        RuleSpec {
            id: self.id.clone(),
            pattern: self.pattern.clone(),
            case_insensitive: self.case_insensitive,
            category: self.category,
            severity: self.severity,
            replace: Replacement::Literal(self.replace.clone()),
            explanation: self.explanation.clone(),
            equality: self.equality,
        }
    }
}

/// Top-level configuration for the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Catalog used by [`crate::Engine::correct`].
    pub catalog: CatalogKind,
    pub disabled_rules: Vec<String>,
    pub rules: Vec<CustomRule>,
    pub validation: ValidationConfig,
    pub statistics: StatisticsConfig,
    /// Paths skipped when collecting files from directories.
    pub ignore_globs: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            catalog: CatalogKind::Basic,
            disabled_rules: Vec::new(),
            rules: Vec::new(),
            validation: ValidationConfig::default(),
            statistics: StatisticsConfig::default(),
            ignore_globs: vec![
                "**/.git/**".into(),
                "**/target/**".into(),
                "**/node_modules/**".into(),
                "**/dist/**".into(),
                "**/build/**".into(),
            ],
        }
    }
}

impl Config {
    pub fn from_yaml_str(text: &str) -> anyhow::Result<Self> {
        let value: serde_yaml::Value =
            serde_yaml::from_str(text).context("Failed to parse YAML")?;
        let cfg: Config = serde_yaml::from_value(value).context("Invalid config structure")?;
        Ok(cfg)
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        Self::from_yaml_str(&text).with_context(|| format!("Invalid config {}", path.display()))
    }

    pub fn custom_specs(&self) -> Vec<RuleSpec> {
        self.rules.iter().map(CustomRule::to_spec).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_yaml_gives_defaults() {
        let cfg = Config::from_yaml_str("{}").unwrap();
        assert_eq!(cfg.catalog, CatalogKind::Basic);
        assert_eq!(cfg.validation.max_length, 50_000);
        assert_eq!(cfg.statistics.words_per_minute, 200);
    }

    #[test]
    fn parses_custom_rules_and_sections() {
        let cfg = Config::from_yaml_str(
            r#"
catalog: extended
disabled_rules: [lone-i]
rules:
  - id: utilize
    pattern: '\butilize\b'
    category: style
    replace: use
validation:
  max_length: 1000
"#,
        )
        .unwrap();
        assert_eq!(cfg.catalog, CatalogKind::Extended);
        assert_eq!(cfg.disabled_rules, vec!["lone-i".to_string()]);
        assert_eq!(cfg.validation.max_length, 1000);
        assert_eq!(cfg.validation.soft_length, 10_000);
        let rule = &cfg.rules[0];
        assert_eq!(rule.severity, Severity::Suggestion);
        assert_eq!(rule.equality, Equality::Exact);
        assert_eq!(rule.explanation, "Replace '{original}' with '{suggestion}'");
    }

    #[test]
    fn rejects_unknown_category() {
        let err = Config::from_yaml_str(
            "rules:\n  - id: x\n    pattern: x\n    category: tone\n    replace: y\n",
        )
        .unwrap_err();
        assert!(format!("{err:#}").contains("Invalid config structure"));
    }

    #[test]
    fn loads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("redpen.yml");
        fs::write(&path, "statistics:\n  words_per_minute: 250\n").unwrap();
        let cfg = Config::load(&path).unwrap();
        assert_eq!(cfg.statistics.words_per_minute, 250);
    }
}
