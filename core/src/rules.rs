//! Built-in rule tables for the basic and extended catalogs.

use crate::catalog::{Category, Equality, Replacement, RuleSpec, Severity};

const CONTRACTION: &str = "Missing apostrophe in contraction: use '{suggestion}'";
const MISSPELLING: &str = "Spelling error: '{original}' should be '{suggestion}'";
const WORDINESS: &str = "Simplify: '{suggestion}' is more concise than '{original}'";

const CONTRACTIONS: &[(&str, &str)] = &[
    ("dont", "don't"),
    ("cant", "can't"),
    ("wont", "won't"),
    ("isnt", "isn't"),
    ("arent", "aren't"),
    ("wasnt", "wasn't"),
    ("werent", "weren't"),
    ("havent", "haven't"),
    ("hasnt", "hasn't"),
    ("hadnt", "hadn't"),
    ("doesnt", "doesn't"),
    ("didnt", "didn't"),
    ("couldnt", "couldn't"),
    ("shouldnt", "shouldn't"),
    ("wouldnt", "wouldn't"),
];

const MISSPELLINGS: &[(&str, &str)] = &[
    ("teh", "the"),
    ("grammer", "grammar"),
    ("checkc", "check"),
    ("seperate", "separate"),
    ("definately", "definitely"),
    ("occured", "occurred"),
    ("neccessary", "necessary"),
    ("thier", "their"),
    ("becaus", "because"),
    ("yuo", "you"),
    ("adn", "and"),
    ("wiht", "with"),
    ("thsi", "this"),
    ("hii", "hi"),
    ("gope", "hope"),
    ("letr", "let"),
    ("applicayion", "application"),
    ("enhancemnet", "enhancement"),
];

const WORDY_PHRASES: &[(&str, &str, &str)] = &[
    ("due-to-the-fact-that", "due to the fact that", "because"),
    ("at-this-point-in-time", "at this point in time", "now"),
    ("for-the-purpose-of", "for the purpose of", "to"),
    ("in-the-event-that", "in the event that", "if"),
    ("with-regard-to", "with regard to", "regarding"),
    ("in-spite-of-the-fact-that", "in spite of the fact that", "although"),
];

/// Rules shared by every catalog, in tie-break order.
pub fn basic_rules() -> Vec<RuleSpec> {
    let mut rules = Vec::new();

    for (word, fix) in CONTRACTIONS {
        cased(
            &mut rules,
            word,
            word,
            fix,
            Category::Grammar,
            Severity::Error,
            CONTRACTION,
        );
    }
    rules.push(rule(
        "contraction-im",
        r"\b(?:im|Im)\b",
        Category::Grammar,
        Severity::Error,
        Replacement::Literal("I'm".into()),
        CONTRACTION,
    ));

    for (word, fix) in MISSPELLINGS {
        cased(
            &mut rules,
            word,
            word,
            fix,
            Category::Spelling,
            Severity::Error,
            MISSPELLING,
        );
    }
    cased(
        &mut rules,
        "recieve",
        "recieve",
        "receive",
        Category::Spelling,
        Severity::Error,
        "Common spelling mistake: 'i' before 'e' except after 'c'",
    );

    rules.push(rule(
        "their-is",
        r"\b(?:[Tt]heir|[Tt]hier)\s+is\b",
        Category::Grammar,
        Severity::Error,
        Replacement::Transform(there_is),
        "Incorrect use of 'their' instead of 'there'",
    ));
    rules.push(rule(
        "your-contraction",
        r"\b[Yy]our\s+(?:going|coming|running|welcome)\b",
        Category::Grammar,
        Severity::Error,
        Replacement::Transform(you_are),
        "Use 'you're' (you are) instead of 'your' (possessive)",
    ));
    rules.push(rule(
        "its-contraction",
        r"\b[Ii]ts\s+(?:going|coming|running|a\s+good)\b",
        Category::Grammar,
        Severity::Error,
        Replacement::Transform(it_is),
        "Use 'it's' (it is) instead of 'its' (possessive)",
    ));
    rules.push(rule(
        "there-going",
        r"\b[Tt]here\s+going\b",
        Category::Grammar,
        Severity::Error,
        Replacement::Transform(they_are),
        "Use 'they're' (they are) instead of 'there'",
    ));
    rules.push(rule(
        "to-much",
        r"\b[Tt]o\s+much\b",
        Category::Grammar,
        Severity::Error,
        Replacement::Transform(too),
        "Use 'too' (excessive) instead of 'to'",
    ));
    rules.push(rule(
        "subject-verb-agreement",
        r"\b(?:[Hh]e|[Ss]he|[Ii]t)\s+(?:think|like|want|need|have)\b",
        Category::Grammar,
        Severity::Error,
        Replacement::Transform(third_person_verb),
        "Subject-verb disagreement: third person singular requires '{suggestion}'",
    ));
    rules.push(rule(
        "lone-i",
        r"\b(?P<fix>i)(?:[^.\w]|\.\B|$)",
        Category::Grammar,
        Severity::Error,
        Replacement::Literal("I".into()),
        "The pronoun 'I' is always capitalised",
    ));

    let mut intensifier = rule(
        "intensifier",
        r"\b(?:very|really|quite)\s+(?:good|bad|nice|great)\b",
        Category::Style,
        Severity::Suggestion,
        Replacement::Transform(stronger_adjective),
        "Consider using a stronger adjective instead of intensifier + basic adjective",
    );
    intensifier.case_insensitive = true;
    intensifier.equality = Equality::IgnoreCase;
    rules.push(intensifier);

    let mut repeated = rule(
        "that-that",
        r"\bthat(?:\s+that)+\b",
        Category::Style,
        Severity::Warning,
        Replacement::Transform(first_word),
        "Redundant word repetition",
    );
    repeated.case_insensitive = true;
    rules.push(repeated);

    cased(
        &mut rules,
        "in-order-to",
        "in order to",
        "to",
        Category::Clarity,
        Severity::Suggestion,
        WORDINESS,
    );

    rules.push(rule(
        "space-before-punctuation",
        r"[ \t]+(?:[,!?]|\.\B)",
        Category::Punctuation,
        Severity::Warning,
        Replacement::Transform(trim_leading_space),
        "Remove the space before '{suggestion}'",
    ));

    rules
}

/// Rules only present in the extended catalog, appended after the basic ones.
pub fn extended_rules() -> Vec<RuleSpec> {
    let mut rules = Vec::new();
    for (id, phrase, fix) in WORDY_PHRASES {
        cased(
            &mut rules,
            id,
            phrase,
            fix,
            Category::Clarity,
            Severity::Suggestion,
            WORDINESS,
        );
    }
    cased(
        &mut rules,
        "which-is-why",
        "which is why",
        "therefore",
        Category::Style,
        Severity::Suggestion,
        "Consider '{suggestion}' for a tighter transition",
    );
    rules.push(rule(
        "sentence-start",
        r"(?m)(?:^|[.!?][ \t]+)(?P<fix>[a-z])",
        Category::Grammar,
        Severity::Suggestion,
        Replacement::Transform(uppercase),
        "Sentences should start with a capital letter",
    ));
    rules.push(rule(
        "double-space",
        r"[ ]{2,}",
        Category::Punctuation,
        Severity::Suggestion,
        Replacement::Literal(" ".into()),
        "Use a single space between words",
    ));
    rules.push(rule(
        "missing-final-period",
        r"(?P<fix>[^.!?\s])\s*\z",
        Category::Punctuation,
        Severity::Suggestion,
        Replacement::Transform(append_period),
        "End the text with a period",
    ));
    rules
}

fn rule(
    id: &str,
    pattern: &str,
    category: Category,
    severity: Severity,
    replace: Replacement,
    explanation: &str,
) -> RuleSpec {
    RuleSpec {
        id: id.into(),
        pattern: pattern.into(),
        case_insensitive: false,
        category,
        severity,
        replace,
        explanation: explanation.into(),
        equality: Equality::Exact,
    }
}

/// Push a lower-case and a Capitalised variant of one literal rule. Both share
/// the same id, so disabling the id removes both.
fn cased(
    rules: &mut Vec<RuleSpec>,
    id: &str,
    phrase: &str,
    fix: &str,
    category: Category,
    severity: Severity,
    explanation: &str,
) {
    for (phrase, fix) in [
        (phrase.to_string(), fix.to_string()),
        (capitalize_first(phrase), capitalize_first(fix)),
    ] {
        let words: Vec<String> = phrase.split_whitespace().map(regex::escape).collect();
        let pattern = format!(r"\b{}\b", words.join(r"\s+"));
        rules.push(rule(
            id,
            &pattern,
            category,
            severity,
            Replacement::Literal(fix),
            explanation,
        ));
    }
}

fn capitalize_first(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn starts_upper(text: &str) -> bool {
    text.chars().next().is_some_and(char::is_uppercase)
}

/// Replace the first word of `matched` with `fix`, keeping its capital and
/// everything after it.
fn swap_leading_word(matched: &str, fix: &str) -> String {
    let split = matched.find(char::is_whitespace).unwrap_or(matched.len());
    let lead = if starts_upper(matched) {
        capitalize_first(fix)
    } else {
        fix.to_string()
    };
    format!("{lead}{}", &matched[split..])
}

fn there_is(matched: &str) -> String {
    swap_leading_word(matched, "there")
}

fn you_are(matched: &str) -> String {
    swap_leading_word(matched, "you're")
}

fn it_is(matched: &str) -> String {
    swap_leading_word(matched, "it's")
}

fn they_are(matched: &str) -> String {
    swap_leading_word(matched, "they're")
}

fn too(matched: &str) -> String {
    swap_leading_word(matched, "too")
}

fn third_person_verb(matched: &str) -> String {
    let split = matched
        .char_indices()
        .rev()
        .find(|(_, ch)| ch.is_whitespace())
        .map(|(idx, ch)| idx + ch.len_utf8())
        .unwrap_or(0);
    let (subject, verb) = matched.split_at(split);
    if verb == "have" {
        format!("{subject}has")
    } else {
        format!("{subject}{verb}s")
    }
}

fn stronger_adjective(matched: &str) -> String {
    let adjective = matched
        .split_whitespace()
        .last()
        .unwrap_or(matched)
        .to_lowercase();
    let stronger = match adjective.as_str() {
        "good" => "excellent",
        "bad" => "terrible",
        "nice" => "wonderful",
        "great" => "outstanding",
        _ => return matched.to_string(),
    };
    if starts_upper(matched) {
        capitalize_first(stronger)
    } else {
        stronger.to_string()
    }
}

fn first_word(matched: &str) -> String {
    matched
        .split_whitespace()
        .next()
        .unwrap_or(matched)
        .to_string()
}

fn uppercase(matched: &str) -> String {
    matched.to_uppercase()
}

fn trim_leading_space(matched: &str) -> String {
    matched.trim_start().to_string()
}

fn append_period(matched: &str) -> String {
    format!("{matched}.")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cased_generates_both_variants_under_one_id() {
        let mut rules = Vec::new();
        cased(
            &mut rules,
            "in-order-to",
            "in order to",
            "to",
            Category::Clarity,
            Severity::Suggestion,
            WORDINESS,
        );
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[0].pattern, r"\bin\s+order\s+to\b");
        assert_eq!(rules[1].pattern, r"\bIn\s+order\s+to\b");
        assert!(rules.iter().all(|r| r.id == "in-order-to"));
        assert!(matches!(&rules[1].replace, Replacement::Literal(fix) if fix == "To"));
    }

    #[test]
    fn swaps_leading_word_and_keeps_case() {
        assert_eq!(you_are("Your  going"), "You're  going");
        assert_eq!(it_is("its a good"), "it's a good");
        assert_eq!(there_is("thier is"), "there is");
        assert_eq!(too("To much"), "Too much");
    }

    #[test]
    fn conjugates_third_person() {
        assert_eq!(third_person_verb("she like"), "she likes");
        assert_eq!(third_person_verb("It have"), "It has");
        assert_eq!(third_person_verb("he\tthink"), "he\tthinks");
    }

    #[test]
    fn strengthens_adjectives() {
        assert_eq!(stronger_adjective("very good"), "excellent");
        assert_eq!(stronger_adjective("Really bad"), "Terrible");
        assert_eq!(stronger_adjective("quite odd"), "quite odd");
    }

    #[test]
    fn repeated_that_collapses_in_one_edit() {
        let spec = basic_rules()
            .into_iter()
            .find(|spec| spec.id == "that-that")
            .unwrap();
        let rule = spec.compile().unwrap();
        let found = rule.pattern.find("said that that that is").unwrap();
        assert_eq!(found.as_str(), "that that that");
        assert_eq!(rule.replace.apply(found.as_str()), "that");
    }

    #[test]
    fn rule_ids_are_kebab_case() {
        for spec in basic_rules().iter().chain(extended_rules().iter()) {
            assert!(
                spec.id
                    .chars()
                    .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-'),
                "bad id {}",
                spec.id
            );
        }
    }
}
