//! Scans text against a catalog and collects candidate matches.

use crate::catalog::{Catalog, FIX_GROUP};

/// One occurrence of a rule's pattern, in original-text byte offsets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match {
    /// Index of the rule in its catalog; lower is higher priority.
    pub rule: usize,
    pub original: String,
    pub suggestion: String,
    pub start: usize,
    pub end: usize,
}

impl Match {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn overlaps(&self, other: &Match) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// Find every non-overlapping occurrence of every rule.
///
/// Matches from different rules may overlap; [`crate::resolver::resolve`]
/// settles that. Empty matches and no-op suggestions are dropped here.
pub fn find_matches(text: &str, catalog: &Catalog) -> Vec<Match> {
    let mut matches = Vec::new();
    for (index, rule) in catalog.rules().iter().enumerate() {
        let mut push = |start: usize, end: usize| {
            if start == end {
                return;
            }
            let original = &text[start..end];
            let suggestion = rule.replace.apply(original);
            if rule.equality.same(original, &suggestion) {
                return;
            }
            matches.push(Match {
                rule: index,
                original: original.to_string(),
                suggestion,
                start,
                end,
            });
        };

        if rule.is_narrowed() {
            for caps in rule.pattern.captures_iter(text) {
                if let Some(fix) = caps.name(FIX_GROUP) {
                    push(fix.start(), fix.end());
                }
            }
        } else {
            for found in rule.pattern.find_iter(text) {
                push(found.start(), found.end());
            }
        }
    }
    tracing::trace!(candidates = matches.len(), "matched catalog");
    matches
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{CatalogKind, Category, Equality, Replacement, RuleSpec, Severity};

    fn custom(id: &str, pattern: &str, replace: Replacement, equality: Equality) -> RuleSpec {
        RuleSpec {
            id: id.into(),
            pattern: pattern.into(),
            case_insensitive: false,
            category: Category::Style,
            severity: Severity::Suggestion,
            replace,
            explanation: String::new(),
            equality,
        }
    }

    fn catalog_with(custom: Vec<RuleSpec>) -> Catalog {
        Catalog::build(CatalogKind::Basic, custom, &[]).unwrap()
    }

    #[test]
    fn reports_original_offsets() {
        let catalog = Catalog::basic().unwrap();
        let matches = find_matches("She dont like it.", &catalog);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].original, "dont");
        assert_eq!(matches[0].suggestion, "don't");
        assert_eq!((matches[0].start, matches[0].end), (4, 8));
    }

    #[test]
    fn finds_every_occurrence_of_a_rule() {
        let catalog = Catalog::basic().unwrap();
        let matches = find_matches("teh cat and teh dog", &catalog);
        let spans: Vec<_> = matches.iter().map(|m| (m.start, m.end)).collect();
        assert_eq!(spans, vec![(0, 3), (12, 15)]);
    }

    #[test]
    fn skips_transform_no_ops() {
        let catalog = catalog_with(vec![custom(
            "shout",
            r"\b[A-Za-z]+!",
            Replacement::Transform(|m| m.to_string()),
            Equality::Exact,
        )]);
        assert!(find_matches("stop!", &catalog)
            .iter()
            .all(|m| catalog.rule(m.rule).unwrap().id != "shout"));
    }

    #[test]
    fn ignore_case_equality_drops_case_only_edits() {
        let catalog = catalog_with(vec![custom(
            "title",
            r"\bacme\b",
            Replacement::Transform(|m| m.to_uppercase()),
            Equality::IgnoreCase,
        )]);
        assert!(find_matches("we like acme", &catalog).is_empty());
    }

    #[test]
    fn narrowed_rules_report_only_the_fix_group() {
        let catalog = Catalog::extended().unwrap();
        let text = "It works. then it stops.";
        let matches = find_matches(text, &catalog);
        let cap = matches
            .iter()
            .find(|m| catalog.rule(m.rule).unwrap().id == "sentence-start")
            .unwrap();
        assert_eq!((cap.start, cap.end), (10, 11));
        assert_eq!(cap.suggestion, "T");
    }

    #[test]
    fn never_emits_empty_matches() {
        let catalog = catalog_with(vec![custom(
            "maybe",
            r"x*",
            Replacement::Transform(|_| "y".to_string()),
            Equality::Exact,
        )]);
        let matches = find_matches("abc", &catalog);
        assert!(matches.iter().all(|m| !m.is_empty()));
    }

    #[test]
    fn overlapping_candidates_are_kept_for_the_resolver() {
        let catalog = Catalog::basic().unwrap();
        let matches = find_matches("thier is here", &catalog);
        assert_eq!(matches.len(), 2);
        assert!(matches[0].overlaps(&matches[1]));
    }
}
