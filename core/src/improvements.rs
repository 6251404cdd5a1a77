//! Position-free writing advice derived from the whole text.

use crate::stats::sentences;

const LONG_SENTENCE_WORDS: usize = 25;

pub const BREAK_LONG_SENTENCES: &str =
    "Consider breaking long sentences into shorter ones for better readability";
pub const ADD_SENTENCE_ENDINGS: &str = "Add proper sentence endings with periods";
pub const USE_PUNCTUATION: &str = "Consider using punctuation marks like commas to separate ideas";
pub const CAPITALIZE: &str = "Consider proper capitalization at the beginning of sentences";
pub const PROOFREAD: &str = "Multiple errors detected - consider proofreading more carefully";

pub fn suggest_improvements(text: &str, finding_count: usize) -> Vec<String> {
    let mut advice = Vec::new();
    let chars = text.chars().count();

    if sentences(text).any(|s| s.split_whitespace().count() > LONG_SENTENCE_WORDS) {
        advice.push(BREAK_LONG_SENTENCES.to_string());
    }
    if chars > 50 && !text.contains(['.', '!', '?']) {
        advice.push(ADD_SENTENCE_ENDINGS.to_string());
    }
    if text.split_whitespace().count() > 10 && !text.contains([',', ';', ':']) {
        advice.push(USE_PUNCTUATION.to_string());
    }
    if chars > 10
        && text.chars().any(char::is_alphabetic)
        && !text.chars().any(char::is_uppercase)
    {
        advice.push(CAPITALIZE.to_string());
    }
    if finding_count > 3 {
        advice.push(PROOFREAD.to_string());
    }
    advice
}
