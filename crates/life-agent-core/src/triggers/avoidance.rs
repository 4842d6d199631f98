//! Avoidance-language scoring of free text.

use serde::{Deserialize, Serialize};

/// Phrase sets in ascending severity. A message scores the highest severity
/// among the sets it matches; matches never accumulate.
pub const AVOIDANCE_TIERS: [(&[&str], f64); 5] = [
    (&["maybe", "might", "possibly"], 0.3),
    (&["try to", "hope to", "plan to"], 0.4),
    (&["later", "eventually", "sometime"], 0.5),
    (&["too tired", "not feeling", "overwhelmed"], 0.6),
    (&["can't", "impossible", "no time"], 0.7),
];

/// Result of scanning one message.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AvoidanceScan {
    /// Whether the score crossed the trigger threshold
    pub avoidance_detected: bool,
    /// Highest severity among matched tiers (0.0 when nothing matched)
    pub score: f64,
    /// Every matched phrase, in tier order
    pub patterns: Vec<String>,
}

/// Score `text` against [`AVOIDANCE_TIERS`] with case-insensitive substring
/// matching. Detection requires a score strictly greater than `threshold`.
pub fn score_avoidance(text: &str, threshold: f64) -> AvoidanceScan {
    let lower = text.to_lowercase();
    let mut score = 0.0_f64;
    let mut patterns = Vec::new();

    for (phrases, severity) in AVOIDANCE_TIERS {
        let matched: Vec<&str> = phrases
            .iter()
            .copied()
            .filter(|phrase| lower.contains(phrase))
            .collect();
        if !matched.is_empty() {
            score = score.max(severity);
            patterns.extend(matched.into_iter().map(String::from));
        }
    }

    AvoidanceScan {
        avoidance_detected: score > threshold,
        score,
        patterns,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn highest_tier_wins() {
        let scan = score_avoidance("I might try to call clients later", 0.3);
        assert_eq!(scan.score, 0.5);
        assert!(scan.avoidance_detected);
        assert_eq!(scan.patterns, vec!["might", "try to", "later"]);
    }

    #[test]
    fn concrete_plan_does_not_match() {
        let scan = score_avoidance("I will call clients at 2pm", 0.3);
        assert_eq!(scan.score, 0.0);
        assert!(!scan.avoidance_detected);
        assert!(scan.patterns.is_empty());
    }

    #[test]
    fn lone_maybe_sits_on_threshold() {
        let scan = score_avoidance("Maybe a walk", 0.3);
        assert_eq!(scan.score, 0.3);
        assert!(!scan.avoidance_detected);
        assert_eq!(scan.patterns, vec!["maybe"]);
    }

    #[test]
    fn case_insensitive() {
        let scan = score_avoidance("I CAN'T, I'm Overwhelmed", 0.3);
        assert_eq!(scan.score, 0.7);
        assert_eq!(scan.patterns, vec!["overwhelmed", "can't"]);
    }

    #[test]
    fn not_cumulative() {
        // Three tier-0.4 phrases still score 0.4.
        let scan = score_avoidance("try to, hope to and plan to", 0.3);
        assert_eq!(scan.score, 0.4);
        assert_eq!(scan.patterns.len(), 3);
    }
}
