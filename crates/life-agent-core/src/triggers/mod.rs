//! Behavioral triggers
//!
//! Missed deadlines, declining completion, avoidance language and cross-domain
//! cascades, each recorded as a timestamped, severity-scored row.

mod avoidance;
mod deadline;
mod decline;
mod detector;
mod types;

pub use avoidance::{score_avoidance, AvoidanceScan, AVOIDANCE_TIERS};
pub use deadline::{elapsed_hours, find_missed, missed_deadline_severity, MissedDeadline};
pub use decline::{classify_cascade, classify_decline, CascadeFailure, DecliningDomain};
pub use detector::{DetectionSummary, TriggerDetector};
pub use types::{DeclineData, Trigger, TriggerData, TriggerRead, TriggerType};
