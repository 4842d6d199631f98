//! Property tests for rates, trends, avoidance scores and levels.

use chrono::{Duration, TimeZone, Utc};
use life_agent_core::intervention::{initial_level, next_level, TriggerSnapshot, MAX_LEVEL};
use life_agent_core::triggers::{score_avoidance, AVOIDANCE_TIERS};
use life_agent_core::{Commitment, Domain, PatternAnalyzer, Trend};
use proptest::prelude::*;

fn records(flags: &[(u8, bool)]) -> Vec<Commitment> {
    let base = Utc.with_ymd_and_hms(2024, 6, 14, 9, 0, 0).unwrap();
    flags
        .iter()
        .enumerate()
        .map(|(i, &(domain, completed))| {
            let created_at = base - Duration::hours(i as i64);
            Commitment {
                id: i as i64 + 1,
                user_id: 1,
                domain: Domain::ALL[domain as usize % Domain::ALL.len()],
                date: created_at.date_naive(),
                commitment: "x".into(),
                completed,
                notes: None,
                created_at,
            }
        })
        .collect()
}

proptest! {
    #[test]
    fn rates_stay_in_unit_interval(flags in prop::collection::vec((0u8..6, any::<bool>()), 0..60)) {
        let report = PatternAnalyzer::new().analyze_records(&records(&flags), 30);
        let avoidance = report.avoidance_patterns.total_avoidance_rate;
        prop_assert!((0.0..=1.0).contains(&avoidance));
        if flags.is_empty() {
            prop_assert_eq!(avoidance, 0.0);
        }
        let total: u32 = report
            .completion_patterns
            .by_domain
            .values()
            .map(|s| s.total_commitments)
            .sum();
        prop_assert_eq!(total as usize, flags.len());
        for summary in report.completion_patterns.by_domain.values() {
            prop_assert!((0.0..=1.0).contains(&summary.completion_rate));
            prop_assert!(summary.total_commitments > 0);
        }
        for effect in &report.cross_domain_effects {
            prop_assert!(effect.strength > 0.5 && effect.strength <= 1.0);
        }
    }

    #[test]
    fn short_histories_are_stable(flags in prop::collection::vec(any::<bool>(), 0..4)) {
        prop_assert_eq!(PatternAnalyzer::new().classify_trend(&flags), Trend::Stable);
    }

    #[test]
    fn trend_matches_band_rule(recent in prop::collection::vec(any::<bool>(), 2..20),
                               earlier in prop::collection::vec(any::<bool>(), 2..20)) {
        // Equal halves so the count split lands exactly on the boundary.
        let n = recent.len().min(earlier.len());
        let (recent, earlier) = (&recent[..n], &earlier[..n]);
        let rate = |f: &[bool]| f.iter().filter(|&&b| b).count() as f64 / f.len() as f64;
        let mut flags = recent.to_vec();
        flags.extend_from_slice(earlier);

        let expected = if rate(recent) > rate(earlier) + 0.1 {
            Trend::Improving
        } else if rate(recent) < rate(earlier) - 0.1 {
            Trend::Declining
        } else {
            Trend::Stable
        };
        prop_assert_eq!(PatternAnalyzer::new().classify_trend(&flags), expected);
    }

    #[test]
    fn avoidance_score_is_a_tier_severity(text in ".{0,80}") {
        let scan = score_avoidance(&text, 0.3);
        let allowed = scan.score == 0.0
            || AVOIDANCE_TIERS.iter().any(|(_, severity)| *severity == scan.score);
        prop_assert!(allowed);
        prop_assert_eq!(scan.avoidance_detected, scan.score > 0.3);
        prop_assert_eq!(scan.patterns.is_empty(), scan.score == 0.0);
    }

    #[test]
    fn levels_stay_in_range(open in prop::option::of(1u8..=5),
                            count in 0u32..20,
                            max_severity in 0.0f64..=1.0) {
        let snapshot = TriggerSnapshot {
            trigger_count: count,
            max_severity,
            trigger_types: Vec::new(),
        };
        let level = next_level(open, &snapshot);
        prop_assert!(level <= MAX_LEVEL);
        match open {
            _ if count == 0 => {
                prop_assert_eq!(level, 0);
            }
            Some(current) => {
                prop_assert!(level >= current);
                prop_assert!(level <= current + 1);
            }
            None => {
                prop_assert_eq!(level, initial_level(max_severity, count));
                prop_assert!((1..=4).contains(&level));
            }
        }
    }
}
