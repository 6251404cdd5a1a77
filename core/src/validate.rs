//! Pre-flight validation and sanitisation of raw input.

use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::ValidationConfig;

/// Blocking problems. Any of these rejects the input.
#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ValidationError {
    #[error("Text cannot be empty")]
    Empty,
    #[error("Text is too long. Maximum {max} characters allowed (got {length}).")]
    TooLong { length: usize, max: usize },
    #[error("File is too large. Maximum {} MB allowed.", .max / (1024 * 1024))]
    FileTooLarge { size: u64, max: u64 },
    #[error("Unsupported file type `{extension}`; allowed: {}", .allowed.join(", "))]
    UnsupportedFileType {
        extension: String,
        allowed: Vec<String>,
    },
}

/// Non-blocking observations attached to an accepted input.
#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ValidationWarning {
    #[error("Large text ({length} characters) may take longer to process")]
    LargeText { length: usize, threshold: usize },
    #[error("Text repeats '{character}' {run} times in a row")]
    RepeatedCharacters { character: char, run: usize },
    #[error("Text contains {run} consecutive whitespace characters")]
    ExcessiveWhitespace { run: usize },
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ValidationReport {
    pub is_valid: bool,
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationReport {
    fn from_parts(errors: Vec<ValidationError>, warnings: Vec<ValidationWarning>) -> Self {
        Self {
            is_valid: errors.is_empty(),
            errors,
            warnings,
        }
    }

    /// The first blocking reason, if any.
    pub fn first_error(&self) -> Option<&ValidationError> {
        self.errors.first()
    }
}

pub fn validate(text: &str, config: &ValidationConfig) -> ValidationReport {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    let length = text.chars().count();
    if length == 0 {
        errors.push(ValidationError::Empty);
    }
    if length > config.max_length {
        errors.push(ValidationError::TooLong {
            length,
            max: config.max_length,
        });
    }
    if length > config.soft_length {
        warnings.push(ValidationWarning::LargeText {
            length,
            threshold: config.soft_length,
        });
    }

    let runs = longest_runs(text);
    if let Some((character, run)) = runs.repeated {
        if run >= config.repeated_char_run {
            warnings.push(ValidationWarning::RepeatedCharacters { character, run });
        }
    }
    if runs.whitespace >= config.whitespace_run && runs.whitespace > 0 {
        warnings.push(ValidationWarning::ExcessiveWhitespace {
            run: runs.whitespace,
        });
    }

    ValidationReport::from_parts(errors, warnings)
}

/// Boundary checks for an uploaded file: size and extension.
pub fn validate_file(path: &Path, config: &ValidationConfig) -> io::Result<ValidationReport> {
    let metadata = fs::metadata(path)?;
    let mut errors = Vec::new();

    if metadata.len() > config.max_file_bytes {
        errors.push(ValidationError::FileTooLarge {
            size: metadata.len(),
            max: config.max_file_bytes,
        });
    }

    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();
    let allowed = config
        .allowed_extensions
        .iter()
        .any(|ext| ext.trim_start_matches('.').eq_ignore_ascii_case(&extension));
    if !allowed {
        errors.push(ValidationError::UnsupportedFileType {
            extension,
            allowed: config.allowed_extensions.clone(),
        });
    }

    Ok(ValidationReport::from_parts(errors, Vec::new()))
}

/// Strip ASCII control characters (keeping tab and newlines), normalise line
/// endings to `\n` and trim surrounding whitespace.
pub fn sanitize(text: &str) -> String {
    sanitize_mapped(text).text
}

/// Sanitised text plus the raw byte range each sanitised byte came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sanitized {
    pub text: String,
    starts: Vec<usize>,
    ends: Vec<usize>,
    raw_len: usize,
}

impl Sanitized {
    /// Map a byte span of [`Sanitized::text`] back onto the raw input.
    pub fn raw_span(&self, start: usize, end: usize) -> (usize, usize) {
        let raw_start = self.starts.get(start).copied().unwrap_or_else(|| {
            end.checked_sub(1)
                .and_then(|last| self.ends.get(last))
                .copied()
                .unwrap_or(self.raw_len)
        });
        let raw_end = match end.checked_sub(1) {
            Some(last) => self.ends.get(last).copied().unwrap_or(self.raw_len),
            None => raw_start,
        };
        (raw_start, raw_end.max(raw_start))
    }
}

/// [`sanitize`] that remembers where every output byte came from.
pub fn sanitize_mapped(raw: &str) -> Sanitized {
    let mut text = String::with_capacity(raw.len());
    let mut starts = Vec::with_capacity(raw.len());
    let mut ends = Vec::with_capacity(raw.len());
    let mut chars = raw.char_indices().peekable();

    while let Some((idx, ch)) = chars.next() {
        let mut raw_end = idx + ch.len_utf8();
        let out = match ch {
            '\r' => {
                // Controls are stripped before line endings are normalised.
                let mut ahead = chars.clone();
                while ahead.next_if(|&(_, c)| is_stripped_control(c)).is_some() {}
                if let Some((lf, _)) = ahead.next_if(|&(_, c)| c == '\n') {
                    raw_end = lf + 1;
                    chars = ahead;
                }
                '\n'
            }
            c if is_stripped_control(c) => continue,
            c => c,
        };
        text.push(out);
        for _ in 0..out.len_utf8() {
            starts.push(idx);
            ends.push(raw_end);
        }
    }

    let lead = text.len() - text.trim_start().len();
    let tail = text.trim_end().len().max(lead);
    Sanitized {
        text: text[lead..tail].to_string(),
        starts: starts[lead..tail].to_vec(),
        ends: ends[lead..tail].to_vec(),
        raw_len: raw.len(),
    }
}

fn is_stripped_control(c: char) -> bool {
    matches!(c, '\u{00}'..='\u{08}' | '\u{0B}' | '\u{0C}' | '\u{0E}'..='\u{1F}' | '\u{7F}')
}

struct Runs {
    /// Longest run of one repeated non-whitespace character.
    repeated: Option<(char, usize)>,
    whitespace: usize,
}

fn longest_runs(text: &str) -> Runs {
    let mut repeated: Option<(char, usize)> = None;
    let mut whitespace = 0;
    let mut current: Option<(char, usize)> = None;
    let mut ws_run = 0;

    for ch in text.chars() {
        if ch.is_whitespace() {
            ws_run += 1;
            whitespace = whitespace.max(ws_run);
            current = None;
            continue;
        }
        ws_run = 0;
        current = match current {
            Some((prev, n)) if prev == ch => Some((prev, n + 1)),
            _ => Some((ch, 1)),
        };
        if let Some((c, n)) = current {
            if repeated.map_or(true, |(_, best)| n > best) {
                repeated = Some((c, n));
            }
        }
    }
    Runs {
        repeated,
        whitespace,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> ValidationConfig {
        ValidationConfig::default()
    }

    #[test]
    fn empty_text_is_rejected() {
        let report = validate("", &cfg());
        assert!(!report.is_valid);
        assert_eq!(report.first_error(), Some(&ValidationError::Empty));
        assert_eq!(report.errors[0].to_string(), "Text cannot be empty");
    }

    #[test]
    fn over_long_text_is_rejected() {
        let text = "a ".repeat(25_500);
        let report = validate(&text, &cfg());
        assert!(!report.is_valid);
        assert!(matches!(
            report.first_error(),
            Some(ValidationError::TooLong { length: 51_000, max: 50_000 })
        ));
    }

    #[test]
    fn length_counts_characters_not_bytes() {
        let mut config = cfg();
        config.max_length = 4;
        assert!(validate("éééé", &config).is_valid);
        assert!(!validate("ééééé", &config).is_valid);
    }

    #[test]
    fn large_text_only_warns() {
        let text = "word ".repeat(2_500);
        let report = validate(&text, &cfg());
        assert!(report.is_valid);
        assert!(matches!(
            report.warnings.as_slice(),
            [ValidationWarning::LargeText { .. }]
        ));
    }

    #[test]
    fn repeated_characters_warn() {
        let report = validate(&format!("wait{}", "!".repeat(20)), &cfg());
        assert!(report.is_valid);
        assert_eq!(
            report.warnings,
            vec![ValidationWarning::RepeatedCharacters {
                character: '!',
                run: 20
            }]
        );
        assert!(validate(&format!("wait{}", "!".repeat(19)), &cfg())
            .warnings
            .is_empty());
    }

    #[test]
    fn whitespace_runs_warn_without_repeated_char_warning() {
        let report = validate(&format!("a{}b", " ".repeat(25)), &cfg());
        assert_eq!(
            report.warnings,
            vec![ValidationWarning::ExcessiveWhitespace { run: 25 }]
        );
    }

    #[test]
    fn sanitize_strips_controls_and_normalises_newlines() {
        let raw = "  \u{0}Hello\u{7}\r\nworld\rnext\u{1B}\t end\u{7F}  ";
        assert_eq!(sanitize(raw), "Hello\nworld\nnext\t end");
    }

    #[test]
    fn crlf_split_by_control_still_collapses() {
        assert_eq!(sanitize("a\r\u{0}\nb"), "a\nb");
    }

    #[test]
    fn mapped_spans_point_back_into_raw_text() {
        let raw = "  \u{0}teh\r\nCafé teh  ";
        let mapped = sanitize_mapped(raw);
        assert_eq!(mapped.text, "teh\nCafé teh");
        assert_eq!(mapped.raw_span(0, 3), (3, 6));
        assert_eq!(&raw[3..6], "teh");
        let (start, end) = mapped.raw_span(10, 13);
        assert_eq!(&raw[start..end], "teh");
        let (start, end) = mapped.raw_span(3, 4);
        assert_eq!(&raw[start..end], "\r\n");
    }

    #[test]
    fn mapped_empty_text_maps_to_nothing() {
        let mapped = sanitize_mapped(" \u{7} ");
        assert!(mapped.text.is_empty());
        assert_eq!(mapped.raw_span(0, 0), (3, 3));
    }

    #[test]
    fn sanitize_keeps_clean_text() {
        assert_eq!(sanitize("She dont like it."), "She dont like it.");
    }

    #[test]
    fn file_checks_extension_and_size() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("notes.TXT");
        fs::write(&good, "hello").unwrap();
        assert!(validate_file(&good, &cfg()).unwrap().is_valid);

        let bad = dir.path().join("image.png");
        fs::write(&bad, "hello").unwrap();
        let report = validate_file(&bad, &cfg()).unwrap();
        assert!(matches!(
            report.first_error(),
            Some(ValidationError::UnsupportedFileType { extension, .. }) if extension == "png"
        ));

        let mut small = cfg();
        small.max_file_bytes = 2;
        let report = validate_file(&good, &small).unwrap();
        assert!(matches!(
            report.first_error(),
            Some(ValidationError::FileTooLarge { size: 5, max: 2 })
        ));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        assert!(validate_file(Path::new("/definitely/not/here.txt"), &cfg()).is_err());
    }
}
