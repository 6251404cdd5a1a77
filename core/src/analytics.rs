//! Extended-mode style suggestions and advanced writing metrics.
//!
//! Kept apart from [`crate::stats`]: these metrics are heuristic scores
//! layered on top of the statistics, not part of the statistics themselves.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use unicode_segmentation::UnicodeSegmentation;

use crate::catalog::Category;
use crate::rewriter::CorrectionError;
use crate::stats::{self, TextStatistics};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum StyleKind {
    Conciseness,
    Engagement,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StyleSuggestion {
    #[serde(rename = "type")]
    pub kind: StyleKind,
    pub original: String,
    pub suggestion: String,
    pub explanation: String,
    pub position: Span,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum VocabularyLevel {
    Elementary,
    Intermediate,
    Advanced,
}

/// Scores are integers in `0..=100`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AdvancedStats {
    pub sentence_complexity: u32,
    pub vocabulary_level: VocabularyLevel,
    pub lexical_diversity: u32,
    pub formality_score: u32,
    pub clarity_score: u32,
    pub engagement_score: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StyleReport {
    pub style_suggestions: Vec<StyleSuggestion>,
    pub advanced: AdvancedStats,
}

pub fn style_report(text: &str, errors: &[CorrectionError], stats: &TextStatistics) -> StyleReport {
    StyleReport {
        style_suggestions: style_suggestions(errors),
        advanced: advanced_stats(text, stats),
    }
}

/// Style and clarity findings re-expressed as style suggestions.
pub fn style_suggestions(errors: &[CorrectionError]) -> Vec<StyleSuggestion> {
    errors
        .iter()
        .filter_map(|err| {
            let kind = match err.category {
                Category::Clarity => StyleKind::Conciseness,
                Category::Style => StyleKind::Engagement,
                _ => return None,
            };
            Some(StyleSuggestion {
                kind,
                original: err.original.clone(),
                suggestion: err.suggestion.clone(),
                explanation: err.explanation.clone(),
                position: Span {
                    start: err.start,
                    end: err.end,
                },
            })
        })
        .collect()
}

pub fn advanced_stats(text: &str, stats: &TextStatistics) -> AdvancedStats {
    let words: Vec<&str> = text.split_whitespace().collect();
    let syllables = stats::average_syllables(&words);

    let vocabulary_level = if syllables < 1.4 {
        VocabularyLevel::Elementary
    } else if syllables < 1.7 {
        VocabularyLevel::Intermediate
    } else {
        VocabularyLevel::Advanced
    };

    let sentence_complexity = percent(stats.average_words_per_sentence / 30.0);

    let unicode_words: Vec<String> = text.unicode_words().map(str::to_lowercase).collect();
    let lexical_diversity = if unicode_words.is_empty() {
        0
    } else {
        let unique: HashSet<&String> = unicode_words.iter().collect();
        percent(unique.len() as f64 / unicode_words.len() as f64)
    };

    let contractions = words
        .iter()
        .filter(|w| {
            let w = w.trim_matches(|c: char| !c.is_alphanumeric());
            w.contains('\'') || w.contains('\u{2019}')
        })
        .count();
    let formality_score = if words.is_empty() {
        100
    } else {
        percent(1.0 - 10.0 * contractions as f64 / words.len() as f64)
    };

    let openers: Vec<String> = stats::sentences(text)
        .filter_map(|s| s.split_whitespace().next())
        .map(str::to_lowercase)
        .collect();
    let engagement_score = if openers.is_empty() {
        0
    } else {
        let distinct: HashSet<&String> = openers.iter().collect();
        percent(distinct.len() as f64 / openers.len() as f64)
    };

    AdvancedStats {
        sentence_complexity,
        vocabulary_level,
        lexical_diversity,
        formality_score,
        clarity_score: stats.flesch_score,
        engagement_score,
    }
}

fn percent(ratio: f64) -> u32 {
    (ratio * 100.0).clamp(0.0, 100.0).round() as u32
}
