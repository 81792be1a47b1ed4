use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;
use unicode_normalization::UnicodeNormalization;

use super::types::SearchHit;

/// How a search hit was chosen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MatchKind {
    /// Titles are equal after normalization.
    Exact,
    /// Fuzzy match with confidence (0.0–1.0).
    Fuzzy(f64),
}

/// Pick the search hit whose title best matches `query`.
///
/// Strategy: normalized exact → fuzzy (Skim) above `threshold` → none.
pub fn best_hit<'a>(
    query: &str,
    hits: &'a [SearchHit],
    threshold: f64,
) -> Option<(&'a SearchHit, MatchKind)> {
    let normalized_query = normalize(query);
    if normalized_query.is_empty() || hits.is_empty() {
        return None;
    }

    if let Some(hit) = hits.iter().find(|h| normalize(&h.title) == normalized_query) {
        return Some((hit, MatchKind::Exact));
    }

    let matcher = SkimMatcherV2::default();
    let mut best: Option<(&SearchHit, f64)> = None;

    for hit in hits {
        let confidence = confidence(&matcher, &normalized_query, &normalize(&hit.title));
        if best.is_none_or(|(_, c)| confidence > c) {
            best = Some((hit, confidence));
        }
    }

    best.filter(|(_, c)| *c >= threshold)
        .map(|(hit, c)| (hit, MatchKind::Fuzzy(c)))
}

/// Fuzzy similarity in either direction, scaled by the pattern's self-score.
fn confidence(matcher: &SkimMatcherV2, a: &str, b: &str) -> f64 {
    let ratio = |choice: &str, pattern: &str| -> f64 {
        let max_possible = matcher.fuzzy_match(pattern, pattern).unwrap_or(1).max(1);
        matcher
            .fuzzy_match(choice, pattern)
            .map(|score| score as f64 / max_possible as f64)
            .unwrap_or(0.0)
    };
    ratio(b, a).max(ratio(a, b))
}

/// NFKC fold and lowercase, then drop apostrophes, turn other punctuation
/// into spaces and collapse whitespace.
pub fn normalize(s: &str) -> String {
    let folded = s.nfkc().collect::<String>().to_lowercase();
    let cleaned: String = folded
        .chars()
        .filter(|c| !matches!(c, '\'' | '’'))
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}
