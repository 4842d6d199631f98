//! Intervention level resolution.
//!
//! Levels run 0 to 5. Zero means no intervention is warranted; it comes only
//! from an empty trigger window or an explicit resolution, never from decay.
//! An open intervention climbs one step at a time and never restarts.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use super::types::{Intervention, TriggerSnapshot, MAX_LEVEL};
use crate::context::{hours_window, RequestContext};
use crate::domain::Domain;
use crate::error::Result;
use crate::storage::{Database, EscalationConfig};

/// Level for a domain with no open intervention, most severe rule first.
pub fn initial_level(max_severity: f64, trigger_count: u32) -> u8 {
    if max_severity > 0.8 || trigger_count > 3 {
        4
    } else if max_severity > 0.6 || trigger_count > 2 {
        3
    } else if max_severity > 0.4 || trigger_count > 1 {
        2
    } else {
        1
    }
}

/// Level for a domain given its open intervention level, if any, and the
/// trigger window.
pub fn next_level(open_level: Option<u8>, snapshot: &TriggerSnapshot) -> u8 {
    if snapshot.trigger_count == 0 {
        return 0;
    }
    match open_level {
        Some(level) if snapshot.trigger_count > 2 => level.saturating_add(1).min(MAX_LEVEL),
        Some(level) => level,
        None => initial_level(snapshot.max_severity, snapshot.trigger_count),
    }
}

/// The evidence and the level derived from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelAssessment {
    pub domain: Domain,
    pub level: u8,
    pub snapshot: TriggerSnapshot,
    pub open_intervention: Option<Intervention>,
}

#[derive(Debug, Clone)]
pub struct LevelResolver {
    window: Duration,
}

impl Default for LevelResolver {
    fn default() -> Self {
        Self::from_config(&EscalationConfig::default())
    }
}

impl LevelResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &EscalationConfig) -> Self {
        Self {
            window: hours_window(config.resolution_window_hours),
        }
    }

    /// Read the trailing trigger window and the open intervention for
    /// `domain` and derive a level.
    ///
    /// Only severity and count columns are read, so a corrupt payload cannot
    /// change the outcome.
    ///
    /// # Errors
    /// Returns a storage error if either read fails.
    pub fn assess(&self, db: &Database, ctx: &RequestContext, domain: Domain) -> Result<LevelAssessment> {
        let snapshot = db.trigger_summary(ctx.user_id, Some(domain), ctx.since(self.window))?;
        let open_intervention = if snapshot.trigger_count == 0 {
            None
        } else {
            db.open_intervention(ctx.user_id, domain)?
        };
        let level = next_level(open_intervention.as_ref().map(|i| i.intervention_level), &snapshot);

        tracing::debug!(
            user_id = ctx.user_id,
            %domain,
            triggers = snapshot.trigger_count,
            max_severity = snapshot.max_severity,
            open_level = open_intervention.as_ref().map(|i| i.intervention_level),
            level,
            "resolved intervention level"
        );

        Ok(LevelAssessment {
            domain,
            level,
            snapshot,
            open_intervention,
        })
    }

    /// The level alone.
    ///
    /// # Errors
    /// Returns a storage error if either read fails.
    pub fn resolve(&self, db: &Database, ctx: &RequestContext, domain: Domain) -> Result<u8> {
        Ok(self.assess(db, ctx, domain)?.level)
    }
}
