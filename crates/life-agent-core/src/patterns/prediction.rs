//! Heuristic success prediction for a freshly stated commitment.
//!
//! The score starts from the domain's recent completion rate and is nudged by
//! the wording of the commitment. It is a deterministic scoring function, not a
//! learned model.


use crate::context::RequestContext;
use crate::domain::Domain;
use crate::error::Result;
use crate::storage::Database;

/// Hedging words lower the estimate.
const HEDGE_WORDS: [&str; 4] = ["maybe", "try", "hope", "might"];
/// Firm words raise it.
const FIRM_WORDS: [&str; 3] = ["will", "committed", "definitely"];
/// Whole words that anchor the commitment to a time.
const ANCHOR_WORDS: [&str; 4] = ["at", "by", "before", "during"];

/// Estimate when there is no history to go on.
pub const NO_HISTORY_ESTIMATE: f64 = 0.5;

#[derive(Debug, Clone)]
pub struct SuccessPredictor {
    pub history_days: u32,
    pub hedge_factor: f64,
    pub firm_factor: f64,
    pub anchor_factor: f64,
    pub floor: f64,
    pub ceiling: f64,
}

impl Default for SuccessPredictor {
    fn default() -> Self {
        Self {
            history_days: 14,
            hedge_factor: 0.7,
            firm_factor: 1.2,
            anchor_factor: 1.1,
            floor: 0.1,
            ceiling: 0.9,
        }
    }
}

impl SuccessPredictor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Score `text` against a completion history (any order).
    pub fn predict(&self, history: &[bool], text: &str) -> f64 {
        if history.is_empty() {
            return NO_HISTORY_ESTIMATE;
        }

        let completed = history.iter().filter(|&&done| done).count();
        let mut estimate = completed as f64 / history.len() as f64;

        let lower = text.to_lowercase();
        let words: Vec<&str> = lower
            .split(|c: char| !c.is_alphanumeric() && c != '\'')
            .filter(|w| !w.is_empty())
            .collect();

        if HEDGE_WORDS.iter().any(|w| lower.contains(w)) {
            estimate *= self.hedge_factor;
        }
        if FIRM_WORDS.iter().any(|w| lower.contains(w)) {
            estimate *= self.firm_factor;
        }
        if words.iter().any(|w| ANCHOR_WORDS.contains(w)) {
            estimate *= self.anchor_factor;
        }

        estimate.clamp(self.floor, self.ceiling)
    }

    /// Score `text` against the user's recent history in `domain`.
    ///
    /// # Errors
    /// Returns a storage error if the history cannot be read.
    pub fn predict_for(
        &self,
        db: &Database,
        ctx: &RequestContext,
        domain: Domain,
        text: &str,
    ) -> Result<f64> {
        let after = ctx.days_back(self.history_days);
        let history: Vec<bool> = db
            .commitments_after(ctx.user_id, Some(domain), after)?
            .iter()
            .map(|c| c.completed)
            .collect();
        let estimate = self.predict(&history, text);
        tracing::debug!(user_id = ctx.user_id, %domain, samples = history.len(), estimate, "predicted success");
        Ok(estimate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_history_is_even_odds() {
        let p = SuccessPredictor::new();
        assert_eq!(p.predict(&[], "I will run at 6am"), 0.5);
    }

    #[test]
    fn hedging_lowers_estimate() {
        let p = SuccessPredictor::new();
        let history = [true, true, false, false];
        let plain = p.predict(&history, "Run five kilometres");
        let hedged = p.predict(&history, "Maybe run five kilometres");
        assert_eq!(plain, 0.5);
        assert!((hedged - 0.35).abs() < 1e-9);
    }

    #[test]
    fn firm_and_anchored_raise_estimate() {
        let p = SuccessPredictor::new();
        let history = [true, true, false, false];
        let estimate = p.predict(&history, "I will call the client at 2pm");
        assert!((estimate - 0.5 * 1.2 * 1.1).abs() < 1e-9);
    }

    #[test]
    fn anchor_words_match_whole_words_only() {
        let p = SuccessPredictor::new();
        let history = [true, false];
        // "that" and "batch" contain "at" but are not anchors.
        assert_eq!(p.predict(&history, "Finish that batch"), 0.5);
    }

    #[test]
    fn estimate_is_clamped() {
        let p = SuccessPredictor::new();
        assert_eq!(p.predict(&[true; 10], "I will definitely ship by noon"), 0.9);
        assert_eq!(p.predict(&[false; 10], "whatever"), 0.1);
    }
}
