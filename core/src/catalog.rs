//! Correction rules and the immutable catalogs compiled from them.
//!
//! A catalog is built once (see [`Catalog::build`]) and never mutated. Rule
//! order is significant: when two matches tie on start and length, the rule
//! that appears first in the catalog wins.

use std::collections::HashSet;
use std::fmt;

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::rules;

/// Name of the optional capture group that narrows the edited span.
///
/// When a pattern defines `(?P<fix>...)`, only that group is replaced and
/// reported; the rest of the match acts as context.
pub const FIX_GROUP: &str = "fix";

/// Rule category identifiers.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Ord, PartialOrd)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    Grammar,
    Spelling,
    Punctuation,
    Style,
    Clarity,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Grammar,
        Category::Spelling,
        Category::Punctuation,
        Category::Style,
        Category::Clarity,
    ];

    pub fn parse(name: &str) -> Option<Self> {
        let n = name.trim().to_lowercase();
        Category::ALL.into_iter().find(|cat| cat.to_string() == n)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Category::Grammar => "grammar",
            Category::Spelling => "spelling",
            Category::Punctuation => "punctuation",
            Category::Style => "style",
            Category::Clarity => "clarity",
        };
        f.write_str(name)
    }
}

/// How serious a finding is, independent of its category.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Ord, PartialOrd)]
#[serde(rename_all = "kebab-case")]
pub enum Severity {
    Error,
    Warning,
    Suggestion,
}

impl Default for Severity {
    fn default() -> Self {
        Severity::Suggestion
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Suggestion => "suggestion",
        };
        f.write_str(name)
    }
}

/// Comparison used to decide whether a suggestion is a no-op.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Equality {
    #[default]
    Exact,
    IgnoreCase,
}

impl Equality {
    pub fn same(self, original: &str, suggestion: &str) -> bool {
        match self {
            Equality::Exact => original == suggestion,
            Equality::IgnoreCase => original.to_lowercase() == suggestion.to_lowercase(),
        }
    }
}

/// Replacement policy of a rule.
#[derive(Clone)]
pub enum Replacement {
    /// Fixed text substituted for every occurrence.
    Literal(String),
    /// Pure function of the matched text.
    Transform(fn(&str) -> String),
}

impl Replacement {
    pub fn apply(&self, matched: &str) -> String {
        match self {
            Replacement::Literal(text) => text.clone(),
            Replacement::Transform(transform) => transform(matched),
        }
    }
}

impl fmt::Debug for Replacement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Replacement::Literal(text) => f.debug_tuple("Literal").field(text).finish(),
            Replacement::Transform(_) => f.write_str("Transform(..)"),
        }
    }
}

/// Uncompiled rule description, as written in the rule tables or config.
#[derive(Debug, Clone)]
pub struct RuleSpec {
    pub id: String,
    pub pattern: String,
    pub case_insensitive: bool,
    pub category: Category,
    pub severity: Severity,
    pub replace: Replacement,
    pub explanation: String,
    pub equality: Equality,
}

impl RuleSpec {
    pub fn compile(self) -> Result<CorrectionRule, CatalogError> {
        let pattern = RegexBuilder::new(&self.pattern)
            .case_insensitive(self.case_insensitive)
            .build()
            .map_err(|source| CatalogError::InvalidPattern {
                rule: self.id.clone(),
                source,
            })?;
        if let Replacement::Literal(text) = &self.replace {
            if pattern.is_match(text) {
                return Err(CatalogError::SelfTriggering {
                    rule: self.id,
                    replacement: text.clone(),
                });
            }
        }
        let narrowed = pattern
            .capture_names()
            .any(|name| name == Some(FIX_GROUP));
        Ok(CorrectionRule {
            id: self.id,
            pattern,
            narrowed,
            category: self.category,
            severity: self.severity,
            replace: self.replace,
            explanation: self.explanation,
            equality: self.equality,
        })
    }
}

/// A compiled correction rule.
#[derive(Debug, Clone)]
pub struct CorrectionRule {
    pub id: String,
    pub pattern: Regex,
    narrowed: bool,
    pub category: Category,
    pub severity: Severity,
    pub replace: Replacement,
    pub explanation: String,
    pub equality: Equality,
}

impl CorrectionRule {
    /// Whether the pattern narrows its edit span with a `fix` group.
    pub fn is_narrowed(&self) -> bool {
        self.narrowed
    }

    /// Render the explanation template for one match.
    pub fn explain(&self, original: &str, suggestion: &str) -> String {
        self.explanation
            .replace("{original}", original)
            .replace("{suggestion}", suggestion)
    }
}

/// Built-in catalog variants.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum CatalogKind {
    #[default]
    Basic,
    Extended,
}

impl fmt::Display for CatalogKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogKind::Basic => f.write_str("basic"),
            CatalogKind::Extended => f.write_str("extended"),
        }
    }
}

/// Problems detected while building a catalog. These are startup failures.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("rule `{rule}` has an invalid pattern: {source}")]
    InvalidPattern {
        rule: String,
        #[source]
        source: regex::Error,
    },
    #[error("rule `{rule}` matches its own replacement `{replacement}`")]
    SelfTriggering { rule: String, replacement: String },
    #[error("custom rule `{0}` reuses an existing rule id")]
    DuplicateId(String),
    #[error("cannot disable unknown rule `{0}`")]
    UnknownDisabledRule(String),
}

/// Ordered, immutable sequence of compiled rules.
#[derive(Debug)]
pub struct Catalog {
    kind: CatalogKind,
    rules: Vec<CorrectionRule>,
}

impl Catalog {
    pub fn basic() -> Result<Self, CatalogError> {
        Self::build(CatalogKind::Basic, Vec::new(), &[])
    }

    pub fn extended() -> Result<Self, CatalogError> {
        Self::build(CatalogKind::Extended, Vec::new(), &[])
    }

    /// Compile a catalog: built-in rules for `kind`, then `custom` rules
    /// appended in order, minus every rule whose id is in `disabled`.
    pub fn build(
        kind: CatalogKind,
        custom: Vec<RuleSpec>,
        disabled: &[String],
    ) -> Result<Self, CatalogError> {
        let basic = rules::basic_rules();
        let additional = rules::extended_rules();

        let builtin_ids: HashSet<&str> = basic
            .iter()
            .chain(additional.iter())
            .map(|spec| spec.id.as_str())
            .collect();
        let mut custom_ids = HashSet::new();
        for spec in &custom {
            if builtin_ids.contains(spec.id.as_str()) || !custom_ids.insert(spec.id.as_str()) {
                return Err(CatalogError::DuplicateId(spec.id.clone()));
            }
        }
        for id in disabled {
            let known = builtin_ids.contains(id.as_str()) || custom.iter().any(|s| &s.id == id);
            if !known {
                return Err(CatalogError::UnknownDisabledRule(id.clone()));
            }
        }

        let mut specs = basic;
        if kind == CatalogKind::Extended {
            specs.extend(additional);
        }
        specs.extend(custom);

        let rules = specs
            .into_iter()
            .filter(|spec| !disabled.contains(&spec.id))
            .map(RuleSpec::compile)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { kind, rules })
    }

    pub fn kind(&self) -> CatalogKind {
        self.kind
    }

    pub fn rules(&self) -> &[CorrectionRule] {
        &self.rules
    }

    pub fn rule(&self, index: usize) -> Option<&CorrectionRule> {
        self.rules.get(index)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
