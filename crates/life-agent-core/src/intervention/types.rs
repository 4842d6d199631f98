//! Intervention records and deploy outcomes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::Domain;
use crate::error::ValidationError;
use crate::storage::TriggerSummary;

/// Highest intervention level.
pub const MAX_LEVEL: u8 = 5;

/// Lifecycle state of an intervention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionStatus {
    /// Opened and not raised since.
    Active,
    /// Closed by a qualifying completion streak or administratively.
    Resolved,
    /// Still open, raised at least once since it was opened.
    Escalated,
}

impl ResolutionStatus {
    /// Active and escalated interventions are both open.
    pub fn is_open(&self) -> bool {
        matches!(self, ResolutionStatus::Active | ResolutionStatus::Escalated)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ResolutionStatus::Active => "active",
            ResolutionStatus::Resolved => "resolved",
            ResolutionStatus::Escalated => "escalated",
        }
    }
}

impl fmt::Display for ResolutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResolutionStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(ResolutionStatus::Active),
            "resolved" => Ok(ResolutionStatus::Resolved),
            "escalated" => Ok(ResolutionStatus::Escalated),
            other => Err(ValidationError::InvalidValue {
                field: "resolution_status".into(),
                message: format!("unknown status '{other}'"),
            }),
        }
    }
}

/// Snapshot of the evidence an intervention was opened or raised on.
pub type TriggerSnapshot = TriggerSummary;

/// An escalation record for one (user, domain).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Intervention {
    pub id: i64,
    pub user_id: i64,
    pub domain: Domain,
    pub intervention_level: u8,
    pub trigger_condition: TriggerSnapshot,
    pub start_time: DateTime<Utc>,
    pub last_escalation: Option<DateTime<Utc>>,
    pub response_received: bool,
    pub resolution_status: ResolutionStatus,
    pub effectiveness_score: Option<f64>,
    pub resolved_at: Option<DateTime<Utc>>,
}

impl Intervention {
    pub fn is_open(&self) -> bool {
        self.resolution_status.is_open()
    }
}

/// What a deploy call did to the (user, domain) intervention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DeployOutcome {
    /// No open intervention existed; a new one was created.
    Opened,
    /// The open intervention was raised from `from`.
    Escalated { from: u8 },
    /// The open intervention already stood at or above the requested level.
    Unchanged,
}

/// Result of deploying an intervention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deployment {
    pub intervention_id: i64,
    pub level: u8,
    #[serde(flatten)]
    pub outcome: DeployOutcome,
}
