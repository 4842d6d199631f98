//! Trigger detector.
//!
//! Each detection returns what it found and appends one trigger row per
//! finding. Calling a detection twice appends twice; the trigger log is a
//! signal stream, not a dedup index.

use serde::{Deserialize, Serialize};

use super::avoidance::{score_avoidance, AvoidanceScan};
use super::deadline::{find_missed, MissedDeadline};
use super::decline::{classify_cascade, classify_decline, CascadeFailure, DecliningDomain};
use super::types::TriggerData;
use crate::context::RequestContext;
use crate::error::Result;
use crate::patterns::PatternAnalyzer;
use crate::storage::{Config, Database};

/// Thresholds and windows the detector runs with.
#[derive(Debug, Clone)]
pub struct TriggerDetector {
    analyzer: PatternAnalyzer,
    deadline_hours: f64,
    avoidance_threshold: f64,
    decline_window_days: u32,
    cascade_window_days: u32,
}

impl Default for TriggerDetector {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// Everything one full detection pass found.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DetectionSummary {
    pub missed_deadlines: Vec<MissedDeadline>,
    pub declining_domains: Vec<DecliningDomain>,
    pub cascade_failures: Vec<CascadeFailure>,
}

impl DetectionSummary {
    pub fn total(&self) -> usize {
        self.missed_deadlines.len() + self.declining_domains.len() + self.cascade_failures.len()
    }
}

impl TriggerDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &Config) -> Self {
        Self {
            analyzer: PatternAnalyzer::from_config(&config.analysis),
            deadline_hours: config.triggers.deadline_hours,
            avoidance_threshold: config.triggers.avoidance_threshold,
            decline_window_days: config.analysis.decline_window_days,
            cascade_window_days: config.analysis.cascade_window_days,
        }
    }

    /// Flag today's incomplete commitments that are older than the deadline.
    ///
    /// # Errors
    /// Returns a storage error if commitments cannot be read or a trigger
    /// cannot be written.
    pub fn missed_deadlines(&self, db: &Database, ctx: &RequestContext) -> Result<Vec<MissedDeadline>> {
        let open = db.incomplete_commitments_on(ctx.user_id, ctx.today())?;
        let missed = find_missed(&open, ctx.now, self.deadline_hours);

        for m in &missed {
            let data = TriggerData::MissedDeadline {
                commitment_id: m.commitment_id,
                commitment: m.commitment.clone(),
                hours_overdue: m.hours_overdue,
            };
            db.insert_trigger(ctx.user_id, Some(m.domain), &data, m.severity, ctx.now)?;
        }

        tracing::debug!(user_id = ctx.user_id, open = open.len(), missed = missed.len(), "checked deadlines");
        Ok(missed)
    }

    /// Classify every domain with data in the decline window.
    ///
    /// # Errors
    /// Returns a storage error if the analysis or a trigger write fails.
    pub fn pattern_decline(&self, db: &Database, ctx: &RequestContext) -> Result<Vec<DecliningDomain>> {
        let report = self.analyzer.analyze(db, ctx, self.decline_window_days)?;
        let mut declining = Vec::new();

        for summary in report.completion_patterns.by_domain.values() {
            let Some((data, severity)) = classify_decline(summary) else {
                continue;
            };
            let trigger_type = data.trigger_type();
            db.insert_trigger(ctx.user_id, Some(summary.domain), &data, severity, ctx.now)?;

            declining.push(DecliningDomain {
                domain: summary.domain,
                trigger_type,
                completion_rate: summary.completion_rate,
                trend: summary.trend,
                severity,
            });
        }

        tracing::debug!(user_id = ctx.user_id, declining = declining.len(), "checked decline");
        Ok(declining)
    }

    /// Score a message for avoidance language and record a trigger when the
    /// score clears the threshold.
    ///
    /// The trigger is filed under the context's domain, or under no domain
    /// when the context has none.
    ///
    /// # Errors
    /// Returns a storage error if the trigger cannot be written.
    pub fn avoidance_language(&self, db: &Database, ctx: &RequestContext, text: &str) -> Result<AvoidanceScan> {
        let scan = score_avoidance(text, self.avoidance_threshold);

        if scan.avoidance_detected {
            let data = TriggerData::AvoidanceLanguage {
                message: text.to_string(),
                detected_patterns: scan.patterns.clone(),
                avoidance_score: scan.score,
            };
            db.insert_trigger(ctx.user_id, ctx.domain, &data, scan.score, ctx.now)?;
            tracing::debug!(user_id = ctx.user_id, score = scan.score, "avoidance language detected");
        }

        Ok(scan)
    }

    /// Record a cascade trigger on each struggling target of a failing source.
    ///
    /// # Errors
    /// Returns a storage error if the analysis or a trigger write fails.
    pub fn cascade_failures(&self, db: &Database, ctx: &RequestContext) -> Result<Vec<CascadeFailure>> {
        let report = self.analyzer.analyze(db, ctx, self.cascade_window_days)?;
        let cascades: Vec<CascadeFailure> = report
            .cross_domain_effects
            .iter()
            .filter_map(classify_cascade)
            .collect();

        for cascade in &cascades {
            let data = TriggerData::CascadeFailure {
                source_domain: cascade.source_domain,
                cascade_strength: cascade.cascade_strength,
            };
            db.insert_trigger(
                ctx.user_id,
                Some(cascade.target_domain),
                &data,
                cascade.cascade_strength,
                ctx.now,
            )?;
        }

        Ok(cascades)
    }

    /// Run the deadline, decline and cascade detections in that order.
    ///
    /// # Errors
    /// Stops at the first storage error.
    pub fn detect_all(&self, db: &Database, ctx: &RequestContext) -> Result<DetectionSummary> {
        Ok(DetectionSummary {
            missed_deadlines: self.missed_deadlines(db, ctx)?,
            declining_domains: self.pattern_decline(db, ctx)?,
            cascade_failures: self.cascade_failures(db, ctx)?,
        })
    }
}
