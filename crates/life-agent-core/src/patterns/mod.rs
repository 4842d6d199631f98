//! Pattern analysis over commitment history
//!
//! Completion rates, trends and avoidance rates per window, plus the
//! heuristic success prediction and positive-momentum detection built on them.

mod analyzer;
mod prediction;
mod reinforcement;

pub use analyzer::{
    AvoidancePatterns, CompletionPatterns, CrossDomainEffect, DomainPatternSummary,
    PatternAnalyzer, PatternReport, Trend,
};

pub use prediction::{SuccessPredictor, NO_HISTORY_ESTIMATE};

pub use reinforcement::{
    classify_success, detect_success, success_patterns, SuccessKind, SuccessPattern,
};
