//! Decline tiers and cross-domain cascade classification.

use serde::{Deserialize, Serialize};

use super::types::{DeclineData, TriggerData, TriggerType};
use crate::domain::Domain;
use crate::patterns::{CrossDomainEffect, DomainPatternSummary, Trend};

/// A domain whose completion pattern earned a decline trigger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecliningDomain {
    pub domain: Domain,
    pub trigger_type: TriggerType,
    pub completion_rate: f64,
    pub trend: Trend,
    pub severity: f64,
}

/// A failing domain dragging down another.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CascadeFailure {
    pub source_domain: Domain,
    pub target_domain: Domain,
    pub cascade_strength: f64,
}

/// Classify a domain summary into at most one decline tier.
///
/// Tiers are checked most severe first and the first match wins:
/// crisis (< 0.3), declining performance (< 0.5 and declining),
/// performance warning (declining and < 0.7). Returns the trigger payload
/// carrying the summary's figures, and its severity.
pub fn classify_decline(summary: &DomainPatternSummary) -> Option<(TriggerData, f64)> {
    let rate = summary.completion_rate;
    let declining = summary.trend == Trend::Declining;
    let stats = DeclineData {
        completion_rate: rate,
        trend: summary.trend,
        total_commitments: summary.total_commitments,
    };

    if rate < 0.3 {
        Some((TriggerData::CrisisCompletionRate(stats), 0.9))
    } else if rate < 0.5 && declining {
        Some((TriggerData::DecliningPerformance(stats), 0.7))
    } else if declining && rate < 0.7 {
        Some((TriggerData::PerformanceWarning(stats), 0.5))
    } else {
        None
    }
}

/// Strong effects on a struggling target count as a cascade.
pub fn classify_cascade(effect: &CrossDomainEffect) -> Option<CascadeFailure> {
    (effect.strength > 0.6 && effect.success_correlation < 0.3).then(|| CascadeFailure {
        source_domain: effect.source,
        target_domain: effect.target,
        cascade_strength: effect.strength,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(rate: f64, trend: Trend) -> DomainPatternSummary {
        DomainPatternSummary {
            domain: Domain::Health,
            completion_rate: rate,
            total_commitments: 10,
            trend,
        }
    }

    fn tier(rate: f64, trend: Trend) -> Option<(TriggerType, f64)> {
        classify_decline(&summary(rate, trend)).map(|(data, severity)| (data.trigger_type(), severity))
    }

    #[test]
    fn crisis_ignores_trend() {
        assert_eq!(
            tier(0.2, Trend::Improving),
            Some((TriggerType::CrisisCompletionRate, 0.9))
        );
    }

    #[test]
    fn tiers_in_priority_order() {
        assert_eq!(
            tier(0.4, Trend::Declining),
            Some((TriggerType::DecliningPerformance, 0.7))
        );
        assert_eq!(
            tier(0.5, Trend::Declining),
            Some((TriggerType::PerformanceWarning, 0.5))
        );
        assert_eq!(
            tier(0.69, Trend::Declining),
            Some((TriggerType::PerformanceWarning, 0.5))
        );
    }

    #[test]
    fn payload_matches_tier_and_summary() {
        let (data, _) = classify_decline(&summary(0.4, Trend::Declining)).unwrap();
        assert_eq!(
            data,
            TriggerData::DecliningPerformance(DeclineData {
                completion_rate: 0.4,
                trend: Trend::Declining,
                total_commitments: 10,
            })
        );
        let (crisis, _) = classify_decline(&summary(0.1, Trend::Stable)).unwrap();
        assert!(matches!(crisis, TriggerData::CrisisCompletionRate(ref d) if d.completion_rate == 0.1));
    }

    #[test]
    fn no_trigger_without_decline() {
        assert_eq!(tier(0.4, Trend::Stable), None);
        assert_eq!(tier(0.7, Trend::Declining), None);
        assert_eq!(tier(0.95, Trend::Improving), None);
    }

    #[test]
    fn cascade_thresholds() {
        let effect = |strength, success_correlation| CrossDomainEffect {
            source: Domain::Health,
            target: Domain::Business,
            strength,
            success_correlation,
        };
        assert!(classify_cascade(&effect(0.8, 0.2)).is_some());
        assert!(classify_cascade(&effect(0.6, 0.2)).is_none());
        assert!(classify_cascade(&effect(0.8, 0.3)).is_none());
    }
}
