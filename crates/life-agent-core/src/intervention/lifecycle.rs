//! Intervention lifecycle: open, escalate, answer and resolve.
//!
//! At most one intervention per (user, domain) is open (active or
//! escalated) at any time. [`LifecycleManager::deploy`] checks and writes
//! inside one `BEGIN IMMEDIATE` transaction, so two connections deploying for
//! the same pair serialize on SQLite's write lock. The partial unique index
//! from schema v2 rejects a second open row outright.
//!
//! A [`LevelAssessment`] is read before the transaction starts.
//! [`LifecycleManager::deploy_assessed`] compares the open row it assessed
//! against the one seen under the write lock and falls back to the initial
//! level when that row was closed in between.

use chrono::Duration;
use rusqlite::{Transaction, TransactionBehavior};

use super::resolver::{next_level, LevelAssessment};
use super::types::{DeployOutcome, Deployment, Intervention, TriggerSnapshot, MAX_LEVEL};
use crate::context::RequestContext;
use crate::domain::Domain;
use crate::error::{Result, ValidationError};
use crate::storage::interventions::{close, insert_open, raise_level, select_by_id, select_open};
use crate::storage::{Commitment, Database, LifecycleConfig};
use crate::triggers::TriggerRead;

/// True when the `streak` most recent records exist and are all completed.
///
/// `recent_first` must be ordered most recent first.
pub fn streak_satisfied(recent_first: &[Commitment], streak: usize) -> bool {
    streak > 0
        && recent_first.len() >= streak
        && recent_first.iter().take(streak).all(|c| c.completed)
}

/// Completion rate of `records`, `None` when there are none.
pub fn effectiveness(records: &[Commitment]) -> Option<f64> {
    if records.is_empty() {
        return None;
    }
    let completed = records.iter().filter(|c| c.completed).count();
    Some(completed as f64 / records.len() as f64)
}

#[derive(Debug, Clone)]
pub struct LifecycleManager {
    resolution_streak: usize,
}

impl Default for LifecycleManager {
    fn default() -> Self {
        Self::from_config(&LifecycleConfig::default())
    }
}

impl LifecycleManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &LifecycleConfig) -> Self {
        Self {
            resolution_streak: config.resolution_streak,
        }
    }

    /// Open or raise the intervention for `domain` at `level`.
    ///
    /// - No open intervention: a new `active` one is inserted.
    /// - Open below `level`: raised to `level` and marked `escalated`.
    /// - Open at or above `level`: left alone.
    ///
    /// # Errors
    /// Returns `InvalidLevel` for level 0 or above 5, `Locked` if the write
    /// lock cannot be taken within the busy timeout, or a storage error.
    pub fn deploy(
        &self,
        db: &Database,
        ctx: &RequestContext,
        domain: Domain,
        level: u8,
        snapshot: &TriggerSnapshot,
    ) -> Result<Deployment> {
        if level == 0 || level > MAX_LEVEL {
            return Err(ValidationError::InvalidLevel(level).into());
        }

        let tx = Transaction::new_unchecked(db.conn(), TransactionBehavior::Immediate)?;
        let open = select_open(&tx, ctx.user_id, domain)?;
        let deployment = upsert(&tx, ctx, domain, level, snapshot, open)?;
        tx.commit()?;

        log_deployment(ctx, domain, &deployment);
        Ok(deployment)
    }

    /// Deploy the level `assessment` calls for, or nothing at level 0.
    ///
    /// If the open intervention the assessment saw is no longer open once the
    /// write lock is held, the level is re-derived as if nothing were open.
    ///
    /// # Errors
    /// Returns `Locked` if the write lock cannot be taken within the busy
    /// timeout, or a storage error.
    pub fn deploy_assessed(
        &self,
        db: &Database,
        ctx: &RequestContext,
        assessment: &LevelAssessment,
    ) -> Result<Option<Deployment>> {
        if assessment.level == 0 {
            return Ok(None);
        }
        let domain = assessment.domain;

        let tx = Transaction::new_unchecked(db.conn(), TransactionBehavior::Immediate)?;
        let open = select_open(&tx, ctx.user_id, domain)?;
        let level = match (&assessment.open_intervention, &open) {
            (Some(seen), current) if current.as_ref().map(|i| i.id) != Some(seen.id) => {
                tracing::debug!(
                    user_id = ctx.user_id,
                    %domain,
                    intervention_id = seen.id,
                    "assessed intervention closed before deploy"
                );
                next_level(None, &assessment.snapshot)
            }
            _ => assessment.level,
        };
        if level == 0 || level > MAX_LEVEL {
            return Err(ValidationError::InvalidLevel(level).into());
        }
        let deployment = upsert(&tx, ctx, domain, level, &assessment.snapshot, open)?;
        tx.commit()?;

        log_deployment(ctx, domain, &deployment);
        Ok(Some(deployment))
    }

    /// Triggers for (user, domain) within `window` of `ctx.now`, newest first.
    ///
    /// `None` selects triggers not tied to a domain.
    ///
    /// # Errors
    /// Returns a storage error if the query fails. Corrupt payloads appear as
    /// per-row errors.
    pub fn query_triggers(
        &self,
        db: &Database,
        ctx: &RequestContext,
        domain: Option<Domain>,
        window: Duration,
    ) -> Result<Vec<TriggerRead>> {
        db.triggers_since(ctx.user_id, domain, ctx.since(window))
    }

    /// The open intervention for `domain`, if one is needed right now.
    ///
    /// # Errors
    /// Returns a storage error if the query fails.
    pub fn active_intervention(
        &self,
        db: &Database,
        ctx: &RequestContext,
        domain: Domain,
    ) -> Result<Option<Intervention>> {
        db.open_intervention(ctx.user_id, domain)
    }

    /// All of the user's open interventions.
    ///
    /// # Errors
    /// Returns a storage error if the query fails.
    pub fn open_interventions(&self, db: &Database, ctx: &RequestContext) -> Result<Vec<Intervention>> {
        db.open_interventions(ctx.user_id)
    }

    /// Mark that the user answered intervention `id`.
    ///
    /// # Errors
    /// Returns `NotFound` if the intervention does not exist.
    pub fn record_response(&self, db: &Database, id: i64) -> Result<Intervention> {
        if !db.set_response_received(id)? {
            return Err(ValidationError::NotFound {
                kind: "intervention",
                id,
            }
            .into());
        }
        fetch(db, id)
    }

    /// Close intervention `id` regardless of the completion streak.
    ///
    /// The effectiveness score is still computed from the domain's
    /// commitments since the intervention started. Resolving an already
    /// resolved intervention returns it unchanged.
    ///
    /// # Errors
    /// Returns `NotFound` if the intervention does not exist.
    pub fn resolve(&self, db: &Database, ctx: &RequestContext, id: i64) -> Result<Intervention> {
        let intervention = fetch(db, id)?;
        if !intervention.is_open() {
            return Ok(intervention);
        }
        let records = db.commitments_since(
            intervention.user_id,
            intervention.domain,
            intervention.start_time.date_naive(),
        )?;
        self.close_with(db, ctx, &intervention, effectiveness(&records))
    }

    /// Resolve the open intervention for `domain` if the latest commitments
    /// since it started form a completed streak.
    ///
    /// Returns the resolved intervention, or `None` when nothing was closed.
    ///
    /// # Errors
    /// Returns a storage error if a read or the update fails.
    pub fn apply_resolution_policy(
        &self,
        db: &Database,
        ctx: &RequestContext,
        domain: Domain,
    ) -> Result<Option<Intervention>> {
        let Some(open) = db.open_intervention(ctx.user_id, domain)? else {
            return Ok(None);
        };
        let records = db.commitments_since(ctx.user_id, domain, open.start_time.date_naive())?;
        if !streak_satisfied(&records, self.resolution_streak) {
            tracing::debug!(
                user_id = ctx.user_id,
                %domain,
                intervention_id = open.id,
                records = records.len(),
                "resolution streak not met"
            );
            return Ok(None);
        }
        self.close_with(db, ctx, &open, effectiveness(&records)).map(Some)
    }

    fn close_with(
        &self,
        db: &Database,
        ctx: &RequestContext,
        intervention: &Intervention,
        score: Option<f64>,
    ) -> Result<Intervention> {
        if close(db.conn(), intervention.id, score, ctx.now)? {
            tracing::info!(
                user_id = intervention.user_id,
                domain = %intervention.domain,
                intervention_id = intervention.id,
                level = intervention.intervention_level,
                effectiveness = score,
                "intervention resolved"
            );
        }
        fetch(db, intervention.id)
    }
}

fn fetch(db: &Database, id: i64) -> Result<Intervention> {
    select_by_id(db.conn(), id)?.ok_or_else(|| {
        ValidationError::NotFound {
            kind: "intervention",
            id,
        }
        .into()
    })
}

/// Insert, raise or keep the open row for `domain` against `level`.
fn upsert(
    tx: &Transaction<'_>,
    ctx: &RequestContext,
    domain: Domain,
    level: u8,
    snapshot: &TriggerSnapshot,
    open: Option<Intervention>,
) -> Result<Deployment> {
    let deployment = match open {
        None => {
            let id = insert_open(tx, ctx.user_id, domain, level, snapshot, ctx.now)?;
            Deployment {
                intervention_id: id,
                level,
                outcome: DeployOutcome::Opened,
            }
        }
        Some(open) if open.intervention_level < level => {
            raise_level(tx, open.id, level, snapshot, ctx.now)?;
            Deployment {
                intervention_id: open.id,
                level,
                outcome: DeployOutcome::Escalated {
                    from: open.intervention_level,
                },
            }
        }
        Some(open) => Deployment {
            intervention_id: open.id,
            level: open.intervention_level,
            outcome: DeployOutcome::Unchanged,
        },
    };
    Ok(deployment)
}

fn log_deployment(ctx: &RequestContext, domain: Domain, deployment: &Deployment) {
    let level = deployment.level;
    match deployment.outcome {
        DeployOutcome::Opened => tracing::info!(
            user_id = ctx.user_id,
            %domain,
            intervention_id = deployment.intervention_id,
            level,
            "intervention opened"
        ),
        DeployOutcome::Escalated { from } => tracing::info!(
            user_id = ctx.user_id,
            %domain,
            intervention_id = deployment.intervention_id,
            from,
            level,
            "intervention escalated"
        ),
        DeployOutcome::Unchanged => {}
    }
}
