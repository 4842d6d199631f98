//! Intervention escalation
//!
//! The resolver turns a domain's recent triggers into a level from 0 to 5;
//! the lifecycle manager persists that level as at most one open intervention
//! per (user, domain) and closes it again.

mod lifecycle;
mod resolver;
mod types;

pub use lifecycle::{effectiveness, streak_satisfied, LifecycleManager};
pub use resolver::{initial_level, next_level, LevelAssessment, LevelResolver};
pub use types::{
    DeployOutcome, Deployment, Intervention, ResolutionStatus, TriggerSnapshot, MAX_LEVEL,
};
