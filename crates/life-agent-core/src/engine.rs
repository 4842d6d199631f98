//! Intervention engine.
//!
//! One entry point over the analyzer, detector, resolver and lifecycle
//! manager, built from a single [`Config`]. Callers such as schedulers and
//! conversational agents drive it once per user request.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::context::{hours_window, RequestContext};
use crate::domain::Domain;
use crate::error::{Result, ValidationError};
use crate::intervention::{Deployment, Intervention, LevelResolver, LifecycleManager};
use crate::patterns::{detect_success, PatternAnalyzer, PatternReport, SuccessPattern, SuccessPredictor};
use crate::storage::{Commitment, Config, Database};
use crate::triggers::{AvoidanceScan, DetectionSummary, Trigger, TriggerDetector};

/// A freshly logged commitment with its predicted chance of completion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggedCommitment {
    pub commitment: Commitment,
    pub predicted_success: f64,
}

/// A completed commitment and the intervention it closed, if any.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionOutcome {
    pub commitment: Commitment,
    pub resolved_intervention: Option<Intervention>,
}

/// Level and deployment for one domain after a check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainCheck {
    pub domain: Domain,
    pub level: u8,
    /// `None` when the level is 0 and nothing was deployed.
    pub deployment: Option<Deployment>,
    /// Triggers in the display window, newest first.
    pub recent_triggers: Vec<Trigger>,
    /// Triggers in the display window whose payload could not be read.
    pub corrupt_triggers: usize,
}

/// Result of a full check for one user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckReport {
    pub user_id: i64,
    pub checked_at: DateTime<Utc>,
    pub detections: DetectionSummary,
    pub domains: Vec<DomainCheck>,
}

impl CheckReport {
    /// Domains that ended the check with an intervention level above 0.
    pub fn escalated_domains(&self) -> impl Iterator<Item = &DomainCheck> {
        self.domains.iter().filter(|d| d.level > 0)
    }
}

pub struct InterventionEngine {
    analyzer: PatternAnalyzer,
    predictor: SuccessPredictor,
    detector: TriggerDetector,
    resolver: LevelResolver,
    lifecycle: LifecycleManager,
    default_window_days: u32,
    success_window_days: u32,
    display_window: Duration,
}

impl Default for InterventionEngine {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl InterventionEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &Config) -> Self {
        Self {
            analyzer: PatternAnalyzer::from_config(&config.analysis),
            predictor: SuccessPredictor::new(),
            detector: TriggerDetector::from_config(config),
            resolver: LevelResolver::from_config(&config.escalation),
            lifecycle: LifecycleManager::from_config(&config.lifecycle),
            default_window_days: config.analysis.default_window_days,
            success_window_days: config.analysis.success_window_days,
            display_window: hours_window(config.escalation.display_window_hours),
        }
    }

    pub fn resolver(&self) -> &LevelResolver {
        &self.resolver
    }

    pub fn lifecycle(&self) -> &LifecycleManager {
        &self.lifecycle
    }

    pub fn detector(&self) -> &TriggerDetector {
        &self.detector
    }

    /// Pattern report over `window_days`, or the configured default window.
    ///
    /// # Errors
    /// Returns a storage error if the commitments cannot be read.
    pub fn analyze(&self, db: &Database, ctx: &RequestContext, window_days: Option<u32>) -> Result<PatternReport> {
        self.analyzer
            .analyze(db, ctx, window_days.unwrap_or(self.default_window_days))
    }

    /// Predicted chance that `text` gets done, from recent history in `domain`.
    ///
    /// # Errors
    /// Returns a storage error if the history cannot be read.
    pub fn predict(&self, db: &Database, ctx: &RequestContext, domain: Domain, text: &str) -> Result<f64> {
        self.predictor.predict_for(db, ctx, domain, text)
    }

    /// Domains showing momentum or excellence over the success window.
    ///
    /// # Errors
    /// Returns a storage error if the commitments cannot be read.
    pub fn success_patterns(&self, db: &Database, ctx: &RequestContext) -> Result<Vec<SuccessPattern>> {
        detect_success(&self.analyzer, db, ctx, self.success_window_days)
    }

    /// Record a commitment dated today and predict its success.
    ///
    /// The prediction is made from the history before this commitment.
    ///
    /// # Errors
    /// Returns a storage error if the read or insert fails.
    pub fn log_commitment(
        &self,
        db: &Database,
        ctx: &RequestContext,
        domain: Domain,
        text: &str,
    ) -> Result<LoggedCommitment> {
        let predicted_success = self.predict(db, ctx, domain, text)?;
        let id = db.log_commitment(ctx, domain, text)?;
        let commitment = db
            .get_commitment(id)?
            .ok_or(ValidationError::NotFound {
                kind: "commitment",
                id,
            })?;
        tracing::debug!(user_id = ctx.user_id, %domain, commitment_id = id, predicted_success, "logged commitment");
        Ok(LoggedCommitment {
            commitment,
            predicted_success,
        })
    }

    /// Mark a commitment completed and apply the resolution policy to its
    /// domain.
    ///
    /// # Errors
    /// Returns `NotFound` if the commitment does not belong to the user, or a
    /// storage error.
    pub fn complete_commitment(&self, db: &Database, ctx: &RequestContext, id: i64) -> Result<CompletionOutcome> {
        let commitment = db.mark_completed(ctx.user_id, id)?;
        let resolved_intervention = self
            .lifecycle
            .apply_resolution_policy(db, ctx, commitment.domain)?;
        Ok(CompletionOutcome {
            commitment,
            resolved_intervention,
        })
    }

    /// Scan a message for avoidance language, recording a trigger when found.
    ///
    /// # Errors
    /// Returns a storage error if the trigger cannot be written.
    pub fn scan_message(&self, db: &Database, ctx: &RequestContext, text: &str) -> Result<AvoidanceScan> {
        self.detector.avoidance_language(db, ctx, text)
    }

    /// Run every detection, then resolve and deploy a level for each domain.
    ///
    /// # Errors
    /// Stops at the first storage error. Triggers already written and
    /// interventions already deployed stay.
    pub fn comprehensive_check(&self, db: &Database, ctx: &RequestContext) -> Result<CheckReport> {
        let detections = self.detector.detect_all(db, ctx)?;
        let mut domains = Vec::with_capacity(Domain::ALL.len());

        for domain in Domain::ALL {
            let assessment = self.resolver.assess(db, ctx, domain)?;
            let deployment = self.lifecycle.deploy_assessed(db, ctx, &assessment)?;

            let mut recent_triggers = Vec::new();
            let mut corrupt_triggers = 0;
            for read in self
                .lifecycle
                .query_triggers(db, ctx, Some(domain), self.display_window)?
            {
                match read {
                    Ok(trigger) => recent_triggers.push(trigger),
                    Err(e) => {
                        tracing::warn!(user_id = ctx.user_id, %domain, error = %e, "skipping unreadable trigger");
                        corrupt_triggers += 1;
                    }
                }
            }

            domains.push(DomainCheck {
                domain,
                level: deployment.map_or(assessment.level, |d| d.level),
                deployment,
                recent_triggers,
                corrupt_triggers,
            });
        }

        let report = CheckReport {
            user_id: ctx.user_id,
            checked_at: ctx.now,
            detections,
            domains,
        };
        tracing::info!(
            user_id = ctx.user_id,
            detections = report.detections.total(),
            escalated = report.escalated_domains().count(),
            "comprehensive check finished"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intervention::DeployOutcome;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 9, 2, 19, 0, 0).unwrap()
    }

    #[test]
    fn empty_user_checks_clean() {
        let db = Database::open_memory().unwrap();
        let engine = InterventionEngine::new();
        let report = engine
            .comprehensive_check(&db, &RequestContext::new(1).at(now()))
            .unwrap();
        assert_eq!(report.domains.len(), 6);
        assert_eq!(report.escalated_domains().count(), 0);
        assert!(report.domains.iter().all(|d| d.deployment.is_none()));
    }

    #[test]
    fn overdue_commitment_opens_intervention() {
        let db = Database::open_memory().unwrap();
        let engine = InterventionEngine::new();
        let morning = RequestContext::new(1).at(now() - Duration::hours(10));
        let logged = engine
            .log_commitment(&db, &morning, Domain::Parenting, "Read with the kids")
            .unwrap();
        assert_eq!(logged.predicted_success, 0.5);

        let report = engine
            .comprehensive_check(&db, &RequestContext::new(1).at(now()))
            .unwrap();
        assert_eq!(report.detections.missed_deadlines.len(), 1);

        let parenting = report
            .domains
            .iter()
            .find(|d| d.domain == Domain::Parenting)
            .unwrap();
        // Missed deadline (10/24) plus crisis rate (0 of 1 done, 0.9): level 4.
        assert_eq!(parenting.level, 4);
        assert_eq!(parenting.deployment.unwrap().outcome, DeployOutcome::Opened);
        assert_eq!(parenting.recent_triggers.len(), 2);
    }

    #[test]
    fn completing_unknown_commitment_fails() {
        let db = Database::open_memory().unwrap();
        let engine = InterventionEngine::new();
        assert!(engine
            .complete_commitment(&db, &RequestContext::new(1).at(now()), 42)
            .is_err());
    }
}
