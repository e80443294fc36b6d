//! Fuzzy name matching for member and class lookups.

/// Minimum score for a candidate to count as a match.
pub const DEFAULT_MIN_SCORE: u8 = 60;

/// Scores at or above this skip the partial-word pass.
const HIGH_CONFIDENCE: u8 = 90;

/// A candidate that matched a query.
#[derive(Debug)]
pub struct FuzzyMatch<'a, T> {
    pub item: &'a T,
    /// 0..=100
    pub score: u8,
}

impl<T> Clone for FuzzyMatch<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for FuzzyMatch<'_, T> {}

fn levenshtein(a: &[char], b: &[char]) -> usize {
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut cur = vec![0; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        cur[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let substitution = prev[j] + usize::from(ca != cb);
            cur[j + 1] = substitution.min(prev[j + 1] + 1).min(cur[j] + 1);
        }
        std::mem::swap(&mut prev, &mut cur);
    }
    prev[b.len()]
}

/// Edit-distance similarity of two strings, case-insensitive, 0..=100.
pub fn similarity(a: &str, b: &str) -> u8 {
    let a: Vec<char> = a.trim().to_lowercase().chars().collect();
    let b: Vec<char> = b.trim().to_lowercase().chars().collect();
    if a.is_empty() || b.is_empty() {
        return 0;
    }
    if a == b {
        return 100;
    }
    let max_len = a.len().max(b.len());
    let distance = levenshtein(&a, &b);
    (((max_len - distance) as f64 / max_len as f64) * 100.0).round() as u8
}

fn words(s: &str) -> Vec<String> {
    s.to_lowercase()
        .split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|w| w.chars().count() > 2)
        .map(str::to_string)
        .collect()
}

/// Share of query words (longer than two characters) that appear inside, or
/// contain, some target word. 0..=100.
pub fn partial_match(query: &str, target: &str) -> u8 {
    let query_words = words(query);
    if query_words.is_empty() {
        return 0;
    }
    let target_words = words(target);
    let matched = query_words
        .iter()
        .filter(|q| {
            target_words
                .iter()
                .any(|t| t.contains(q.as_str()) || q.contains(t.as_str()))
        })
        .count();
    ((matched as f64 / query_words.len() as f64) * 100.0).round() as u8
}

/// Best candidate for `query`, or `None` when nothing reaches `min_score`.
///
/// A candidate's score is its edit-distance similarity, raised to its
/// partial-word score unless the best similarity is already high confidence.
/// Ties keep the earlier candidate.
pub fn best_match<'a, T>(
    query: &str,
    items: &'a [T],
    key: impl Fn(&T) -> &str,
    min_score: u8,
) -> Option<FuzzyMatch<'a, T>> {
    if query.trim().is_empty() {
        return None;
    }
    let scored: Vec<FuzzyMatch<'a, T>> = items
        .iter()
        .map(|item| FuzzyMatch {
            item,
            score: similarity(query, key(item)),
        })
        .collect();

    let pick = |candidates: Vec<FuzzyMatch<'a, T>>| {
        candidates
            .into_iter()
            .fold(None, |best: Option<FuzzyMatch<'a, T>>, m| match best {
                Some(b) if b.score >= m.score => Some(b),
                _ => Some(m),
            })
            .filter(|m| m.score >= min_score)
    };

    let direct = pick(scored.clone());
    if matches!(direct, Some(m) if m.score >= HIGH_CONFIDENCE) {
        return direct;
    }
    pick(
        scored
            .into_iter()
            .map(|m| FuzzyMatch {
                score: m.score.max(partial_match(query, key(m.item))),
                ..m
            })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn similarity_is_case_and_whitespace_insensitive() {
        assert_eq!(similarity("Jiu Jitsu", "  jiu jitsu "), 100);
        assert_eq!(similarity("", "x"), 0);
        assert_eq!(similarity("kitten", "sitting"), 57);
    }

    #[test]
    fn partial_match_ignores_short_words() {
        assert_eq!(partial_match("Bob", "Bob Johnson"), 100);
        assert_eq!(partial_match("BJJ class", "Kids BJJ"), 50);
        assert_eq!(partial_match("a b", "a b"), 0);
    }

    #[test]
    fn best_match_prefers_exact_then_partial() {
        let names = ["Bob Johnson", "Alice Chen", "Bobby Tables"];
        let m = best_match("alice chen", &names, |s| *s, DEFAULT_MIN_SCORE).unwrap();
        assert_eq!(*m.item, "Alice Chen");
        assert_eq!(m.score, 100);

        let m = best_match("Bob", &names, |s| *s, DEFAULT_MIN_SCORE).unwrap();
        assert_eq!(*m.item, "Bob Johnson");
    }

    #[test]
    fn best_match_tolerates_typos() {
        let classes = ["Jiu Jitsu", "Yoga Flow", "MMA Striking"];
        let m = best_match("Jiu Jitzu", &classes, |s| *s, DEFAULT_MIN_SCORE).unwrap();
        assert_eq!(*m.item, "Jiu Jitsu");
    }

    #[test]
    fn best_match_rejects_unrelated_and_blank_queries() {
        let classes = ["Jiu Jitsu", "Yoga Flow"];
        assert!(best_match("Pottery", &classes, |s| *s, DEFAULT_MIN_SCORE).is_none());
        assert!(best_match("  ", &classes, |s| *s, DEFAULT_MIN_SCORE).is_none());
    }
}
