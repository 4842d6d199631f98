//! # Life Agent Core Library
//!
//! This library provides the pattern-detection and intervention-escalation
//! engine behind the life-agent accountability assistant. Users state daily
//! commitments across six life domains; the engine tracks completion, detects
//! declining behavior and escalates interventions. Conversational agents and
//! schedulers are thin callers over the same core, and so is the standalone
//! CLI binary.
//!
//! ## Architecture
//!
//! - **Storage**: SQLite-backed commitment, trigger and intervention tables and
//!   TOML-based configuration
//! - **Patterns**: Per-domain completion rates and trends, avoidance rate,
//!   cross-domain effects and a heuristic success predictor
//! - **Triggers**: Missed deadlines, completion decline, avoidance language and
//!   cascade failures, persisted as severity-scored signals
//! - **Intervention**: Level resolution (0 to 5) and the lifecycle of at most
//!   one open intervention per user and domain
//!
//! ## Key Components
//!
//! - [`InterventionEngine`]: One entry point for checks, logging and completion
//! - [`Database`]: Persistence for all three tables
//! - [`Config`]: Application configuration management
//! - [`RequestContext`]: Who, which domain and when, passed into every operation

pub mod context;
pub mod domain;
pub mod engine;
pub mod error;
pub mod intervention;
pub mod patterns;
pub mod storage;
pub mod triggers;

pub use context::RequestContext;
pub use domain::Domain;
pub use engine::{CheckReport, CompletionOutcome, DomainCheck, InterventionEngine, LoggedCommitment};
pub use error::{ConfigError, CoreError, StorageError, ValidationError};
pub use intervention::{
    DeployOutcome, Deployment, Intervention, LevelResolver, LifecycleManager, ResolutionStatus,
};
pub use patterns::{PatternAnalyzer, PatternReport, SuccessPredictor, Trend};
pub use storage::{Commitment, Config, Database, NewCommitment};
pub use triggers::{Trigger, TriggerData, TriggerDetector, TriggerRead, TriggerType};
