//! Overlap resolution between candidate matches.

use crate::matcher::Match;

/// Keep a maximal set of non-overlapping matches.
///
/// Candidates are ordered by start, then longer span first, then catalog
/// order; a sweep accepts a candidate only if it starts at or after the end
/// of the last accepted one. The result is sorted by start.
pub fn resolve(mut matches: Vec<Match>) -> Vec<Match> {
    matches.sort_by(|a, b| {
        a.start
            .cmp(&b.start)
            .then_with(|| b.len().cmp(&a.len()))
            .then_with(|| a.rule.cmp(&b.rule))
    });

    let mut accepted: Vec<Match> = Vec::with_capacity(matches.len());
    let mut last_end = 0;
    for candidate in matches {
        if candidate.start < last_end {
            tracing::trace!(
                rule = candidate.rule,
                start = candidate.start,
                end = candidate.end,
                "shadowed match dropped"
            );
            continue;
        }
        last_end = candidate.end;
        accepted.push(candidate);
    }
    accepted
}

#[cfg(test)]
mod tests {
    use super::*;

    fn m(rule: usize, start: usize, end: usize) -> Match {
        Match {
            rule,
            original: "x".repeat(end - start),
            suggestion: String::new(),
            start,
            end,
        }
    }

    fn spans(matches: &[Match]) -> Vec<(usize, usize, usize)> {
        matches.iter().map(|m| (m.rule, m.start, m.end)).collect()
    }

    #[test]
    fn longer_match_wins_at_same_start() {
        let resolved = resolve(vec![m(0, 0, 5), m(1, 0, 8)]);
        assert_eq!(spans(&resolved), vec![(1, 0, 8)]);
    }

    #[test]
    fn earlier_rule_wins_ties() {
        let resolved = resolve(vec![m(4, 2, 6), m(2, 2, 6)]);
        assert_eq!(spans(&resolved), vec![(2, 2, 6)]);
    }

    #[test]
    fn earlier_start_shadows_later_overlap() {
        let resolved = resolve(vec![m(0, 3, 9), m(1, 0, 4), m(2, 9, 12)]);
        assert_eq!(spans(&resolved), vec![(1, 0, 4), (2, 9, 12)]);
    }

    #[test]
    fn adjacent_matches_both_survive() {
        let resolved = resolve(vec![m(0, 4, 8), m(1, 0, 4)]);
        assert_eq!(spans(&resolved), vec![(1, 0, 4), (0, 4, 8)]);
    }

    #[test]
    fn output_never_overlaps() {
        let mut input = Vec::new();
        for start in 0..20 {
            for len in 1..5 {
                input.push(m(start % 3 + len, start, start + len));
            }
        }
        let resolved = resolve(input);
        for pair in resolved.windows(2) {
            assert!(!pair[0].overlaps(&pair[1]));
            assert!(pair[0].end <= pair[1].start);
        }
    }

    #[test]
    fn empty_input_is_empty_output() {
        assert!(resolve(Vec::new()).is_empty());
    }
}
