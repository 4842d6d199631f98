//! Positive-momentum detection.
//!
//! The mirror image of decline detection: domains that are going well are
//! surfaced so the message layer can reinforce them.

use serde::{Deserialize, Serialize};

use super::analyzer::{PatternAnalyzer, PatternReport, Trend};
use crate::context::RequestContext;
use crate::domain::Domain;
use crate::error::Result;
use crate::storage::Database;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuccessKind {
    /// High completion and still improving.
    MomentumBuilding,
    /// Very high completion regardless of trend.
    ExcellenceAchieved,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuccessPattern {
    pub domain: Domain,
    pub kind: SuccessKind,
    pub completion_rate: f64,
}

/// Momentum wins over excellence when both apply.
pub fn classify_success(completion_rate: f64, trend: Trend) -> Option<SuccessKind> {
    if completion_rate > 0.8 && trend == Trend::Improving {
        Some(SuccessKind::MomentumBuilding)
    } else if completion_rate > 0.9 {
        Some(SuccessKind::ExcellenceAchieved)
    } else {
        None
    }
}

/// Success patterns in a report, in domain order.
pub fn success_patterns(report: &PatternReport) -> Vec<SuccessPattern> {
    report
        .completion_patterns
        .by_domain
        .values()
        .filter_map(|summary| {
            classify_success(summary.completion_rate, summary.trend).map(|kind| SuccessPattern {
                domain: summary.domain,
                kind,
                completion_rate: summary.completion_rate,
            })
        })
        .collect()
}

/// Analyze the last `window_days` days and return the domains doing well.
///
/// # Errors
/// Returns a storage error if the commitments cannot be read.
pub fn detect_success(
    analyzer: &PatternAnalyzer,
    db: &Database,
    ctx: &RequestContext,
    window_days: u32,
) -> Result<Vec<SuccessPattern>> {
    let report = analyzer.analyze(db, ctx, window_days)?;
    Ok(success_patterns(&report))
}
