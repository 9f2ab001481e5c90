//! Near-miss suggestions for unresolvable identifiers

use serde::{Deserialize, Serialize};

/// Tuning for "did you mean" suggestions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SuggestionConfig {
    pub max_suggestions: usize,
    /// Minimum normalized similarity (0.0 to 1.0) for a candidate to be suggested.
    pub similarity_threshold: f64,
}

impl Default for SuggestionConfig {
    fn default() -> Self {
        Self {
            max_suggestions: 3,
            similarity_threshold: 0.6,
        }
    }
}

/// Ranks candidates by normalized edit distance to a target.
#[derive(Debug, Clone, Copy, Default)]
pub struct FuzzyMatcher {
    config: SuggestionConfig,
}

impl FuzzyMatcher {
    pub fn new(config: SuggestionConfig) -> Self {
        Self { config }
    }

    /// The most similar candidates, best first.
    pub fn find_similar<I, S>(&self, target: &str, candidates: I) -> Vec<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut scored: Vec<(f64, String)> = candidates
            .into_iter()
            .map(|candidate| {
                let candidate = candidate.as_ref();
                (strsim::normalized_levenshtein(target, candidate), candidate.to_string())
            })
            .filter(|(score, _)| *score >= self.config.similarity_threshold)
            .collect();

        scored.sort_by(|a, b| b.0.total_cmp(&a.0).then_with(|| a.1.cmp(&b.1)));
        scored.dedup_by(|a, b| a.1 == b.1);
        scored
            .into_iter()
            .take(self.config.max_suggestions)
            .map(|(_, name)| name)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finds_near_miss() {
        let matcher = FuzzyMatcher::default();
        let suggestions = matcher.find_similar("PersonInterface", ["PersonInterfce", "Logger"]);
        assert_eq!(suggestions, vec!["PersonInterfce".to_string()]);
    }

    #[test]
    fn test_orders_by_similarity_and_limits() {
        let matcher = FuzzyMatcher::default();
        let suggestions = matcher.find_similar(
            "service",
            ["servic", "servce", "sevice", "service2", "unrelated"],
        );

        assert_eq!(suggestions.len(), 3);
        assert!(!suggestions.contains(&"unrelated".to_string()));
    }

    #[test]
    fn test_empty_candidates() {
        let matcher = FuzzyMatcher::default();
        assert!(matcher.find_similar("x", Vec::<String>::new()).is_empty());
    }

    #[test]
    fn test_threshold_is_configurable() {
        let strict = FuzzyMatcher::new(SuggestionConfig {
            max_suggestions: 3,
            similarity_threshold: 1.0,
        });
        assert!(strict.find_similar("Logger", ["Loggr"]).is_empty());
        assert_eq!(strict.find_similar("Logger", ["Logger"]), vec!["Logger".to_string()]);
    }
}
