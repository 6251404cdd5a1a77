//! Text statistics and the Flesch-like readability score.
//!
//! Everything here is a pure function of the input text: identical input
//! always produces identical output.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Average adult reading speed used for reading-time estimates.
pub const DEFAULT_WORDS_PER_MINUTE: usize = 200;

static PARAGRAPH_BREAK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n\s*\n").expect("valid paragraph regex"));

/// Readability bucket derived from the Flesch score.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn from_score(score: f64) -> Self {
        if score >= 60.0 {
            Difficulty::Easy
        } else if score >= 30.0 {
            Difficulty::Medium
        } else {
            Difficulty::Hard
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TextStatistics {
    pub word_count: usize,
    pub character_count: usize,
    pub character_count_no_spaces: usize,
    pub sentence_count: usize,
    pub paragraph_count: usize,
    /// Rounded to one decimal place.
    pub average_words_per_sentence: f64,
    pub reading_time_minutes: usize,
    pub difficulty: Difficulty,
    /// Rounded Flesch reading-ease score, always within `0..=100`.
    pub flesch_score: u32,
}

pub fn compute_statistics(text: &str) -> TextStatistics {
    compute_statistics_with(text, DEFAULT_WORDS_PER_MINUTE)
}

pub fn compute_statistics_with(text: &str, words_per_minute: usize) -> TextStatistics {
    let words: Vec<&str> = text.split_whitespace().collect();
    let word_count = words.len();
    let sentence_count = sentences(text).count();
    let paragraph_count = if text.trim().is_empty() {
        0
    } else {
        PARAGRAPH_BREAK
            .split(text)
            .filter(|p| !p.trim().is_empty())
            .count()
            .max(1)
    };

    let average_words_per_sentence = if sentence_count > 0 {
        word_count as f64 / sentence_count as f64
    } else {
        0.0
    };
    let raw_score = flesch_score(average_words_per_sentence, average_syllables(&words));
    let words_per_minute = words_per_minute.max(1);

    TextStatistics {
        word_count,
        character_count: text.chars().count(),
        character_count_no_spaces: text.chars().filter(|c| !c.is_whitespace()).count(),
        sentence_count,
        paragraph_count,
        average_words_per_sentence: (average_words_per_sentence * 10.0).round() / 10.0,
        reading_time_minutes: word_count.div_ceil(words_per_minute),
        difficulty: Difficulty::from_score(raw_score),
        flesch_score: raw_score.round() as u32,
    }
}

/// Non-blank fragments between runs of `.`, `!` and `?`.
pub(crate) fn sentences(text: &str) -> impl Iterator<Item = &str> {
    text.split(['.', '!', '?'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Flesch reading ease clamped to `0..=100`.
pub fn flesch_score(words_per_sentence: f64, syllables_per_word: f64) -> f64 {
    (206.835 - 1.015 * words_per_sentence - 84.6 * syllables_per_word).clamp(0.0, 100.0)
}

pub(crate) fn average_syllables(words: &[&str]) -> f64 {
    if words.is_empty() {
        return 0.0;
    }
    let total: usize = words.iter().map(|w| count_syllables(w)).sum();
    total as f64 / words.len() as f64
}

/// Heuristic syllable count: vowel groups (`y` included), minus a silent
/// trailing `e`, with short words counted as one syllable.
pub fn count_syllables(word: &str) -> usize {
    let letters: Vec<char> = word
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase())
        .collect();
    if letters.is_empty() {
        return 0;
    }
    if letters.len() <= 3 {
        return 1;
    }

    let mut syllables = 0;
    let mut previous_was_vowel = false;
    for &ch in &letters {
        let is_vowel = matches!(ch, 'a' | 'e' | 'i' | 'o' | 'u' | 'y');
        if is_vowel && !previous_was_vowel {
            syllables += 1;
        }
        previous_was_vowel = is_vowel;
    }
    if letters.last() == Some(&'e') && syllables > 1 {
        syllables -= 1;
    }
    syllables.max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_simple_text() {
        let stats = compute_statistics("Hello world. This is fine.");
        assert_eq!(stats.word_count, 5);
        assert_eq!(stats.sentence_count, 2);
        assert_eq!(stats.paragraph_count, 1);
        assert_eq!(stats.average_words_per_sentence, 2.5);
        assert_eq!(stats.reading_time_minutes, 1);
        assert_eq!(stats.difficulty, Difficulty::Easy);
    }

    #[test]
    fn empty_text_has_no_paragraphs_or_reading_time() {
        let stats = compute_statistics("");
        assert_eq!(stats.word_count, 0);
        assert_eq!(stats.sentence_count, 0);
        assert_eq!(stats.paragraph_count, 0);
        assert_eq!(stats.reading_time_minutes, 0);
        assert!(stats.flesch_score <= 100);
    }

    #[test]
    fn splits_paragraphs_on_blank_lines() {
        let stats = compute_statistics("One.\n\nTwo.\n   \nThree.\n\n\n");
        assert_eq!(stats.paragraph_count, 3);
    }

    #[test]
    fn runs_of_terminators_count_once() {
        let stats = compute_statistics("Really?! Yes... fine");
        assert_eq!(stats.sentence_count, 3);
    }

    #[test]
    fn characters_with_and_without_spaces() {
        let stats = compute_statistics("a b\tc\nd");
        assert_eq!(stats.character_count, 7);
        assert_eq!(stats.character_count_no_spaces, 4);
    }

    #[test]
    fn reading_time_rounds_up() {
        let text = vec!["word"; 201].join(" ");
        assert_eq!(compute_statistics(&text).reading_time_minutes, 2);
        assert_eq!(compute_statistics_with(&text, 100).reading_time_minutes, 3);
    }

    #[test]
    fn syllable_heuristic() {
        assert_eq!(count_syllables("the"), 1);
        assert_eq!(count_syllables("make"), 1);
        assert_eq!(count_syllables("table"), 1);
        assert_eq!(count_syllables("reading"), 2);
        assert_eq!(count_syllables("syllable"), 2);
        assert_eq!(count_syllables("rhythm"), 1);
        assert_eq!(count_syllables("Hello,"), 2);
        assert_eq!(count_syllables("42"), 0);
    }

    #[test]
    fn score_is_clamped() {
        assert_eq!(flesch_score(0.0, 0.0), 100.0);
        assert_eq!(flesch_score(200.0, 5.0), 0.0);
        let long = "Incomprehensibilities notwithstanding, institutionalization characteristically necessitates extraordinarily multidimensional considerations";
        assert_eq!(compute_statistics(long).flesch_score, 0);
        assert_eq!(compute_statistics(long).difficulty, Difficulty::Hard);
    }

    #[test]
    fn statistics_are_deterministic() {
        let text = "The quick brown fox jumps over the lazy dog. It was not amused!\n\nAnother paragraph follows here.";
        assert_eq!(compute_statistics(text), compute_statistics(text));
    }
}
