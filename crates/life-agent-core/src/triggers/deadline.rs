//! Missed-deadline detection for today's open commitments.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::Domain;
use crate::storage::Commitment;

/// An incomplete commitment that has aged past the deadline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissedDeadline {
    pub commitment_id: i64,
    pub domain: Domain,
    pub commitment: String,
    pub hours_overdue: f64,
    pub severity: f64,
}

/// Linear ramp from 0 at creation to 1.0 at 24 hours, saturating after.
pub fn missed_deadline_severity(elapsed_hours: f64) -> f64 {
    (elapsed_hours / 24.0).clamp(0.0, 1.0)
}

/// Hours between creation and `now`, fractional.
pub fn elapsed_hours(created_at: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    (now - created_at).num_milliseconds() as f64 / 3_600_000.0
}

/// Pick out the commitments older than `deadline_hours`.
///
/// Completed commitments are ignored even if passed in.
pub fn find_missed<'a, I>(commitments: I, now: DateTime<Utc>, deadline_hours: f64) -> Vec<MissedDeadline>
where
    I: IntoIterator<Item = &'a Commitment>,
{
    commitments
        .into_iter()
        .filter(|c| !c.completed)
        .filter_map(|c| {
            let hours = elapsed_hours(c.created_at, now);
            (hours > deadline_hours).then(|| MissedDeadline {
                commitment_id: c.id,
                domain: c.domain,
                commitment: c.commitment.clone(),
                hours_overdue: hours,
                severity: missed_deadline_severity(hours),
            })
        })
        .collect()
}
