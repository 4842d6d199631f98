//! Trigger records and their typed payloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::Domain;
use crate::error::{CoreError, ValidationError};
use crate::patterns::Trend;

/// Family of behavioral signal a trigger records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerType {
    MissedDeadline,
    CrisisCompletionRate,
    DecliningPerformance,
    PerformanceWarning,
    AvoidanceLanguage,
    CascadeFailure,
}

impl TriggerType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TriggerType::MissedDeadline => "missed_deadline",
            TriggerType::CrisisCompletionRate => "crisis_completion_rate",
            TriggerType::DecliningPerformance => "declining_performance",
            TriggerType::PerformanceWarning => "performance_warning",
            TriggerType::AvoidanceLanguage => "avoidance_language",
            TriggerType::CascadeFailure => "cascade_failure",
        }
    }
}

impl fmt::Display for TriggerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TriggerType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "missed_deadline" => Ok(TriggerType::MissedDeadline),
            "crisis_completion_rate" => Ok(TriggerType::CrisisCompletionRate),
            "declining_performance" => Ok(TriggerType::DecliningPerformance),
            "performance_warning" => Ok(TriggerType::PerformanceWarning),
            "avoidance_language" => Ok(TriggerType::AvoidanceLanguage),
            "cascade_failure" => Ok(TriggerType::CascadeFailure),
            other => Err(ValidationError::InvalidValue {
                field: "trigger_type".into(),
                message: format!("unknown trigger type '{other}'"),
            }),
        }
    }
}

/// Completion statistics captured by the three decline tiers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeclineData {
    pub completion_rate: f64,
    pub trend: Trend,
    pub total_commitments: u32,
}

/// Structured payload of a trigger, one variant per trigger type.
///
/// Serialized with an internal `type` tag that must agree with the stored
/// `trigger_type` column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TriggerData {
    MissedDeadline {
        commitment_id: i64,
        commitment: String,
        hours_overdue: f64,
    },
    CrisisCompletionRate(DeclineData),
    DecliningPerformance(DeclineData),
    PerformanceWarning(DeclineData),
    AvoidanceLanguage {
        message: String,
        detected_patterns: Vec<String>,
        avoidance_score: f64,
    },
    CascadeFailure {
        source_domain: Domain,
        cascade_strength: f64,
    },
}

impl TriggerData {
    pub fn trigger_type(&self) -> TriggerType {
        match self {
            TriggerData::MissedDeadline { .. } => TriggerType::MissedDeadline,
            TriggerData::CrisisCompletionRate(_) => TriggerType::CrisisCompletionRate,
            TriggerData::DecliningPerformance(_) => TriggerType::DecliningPerformance,
            TriggerData::PerformanceWarning(_) => TriggerType::PerformanceWarning,
            TriggerData::AvoidanceLanguage { .. } => TriggerType::AvoidanceLanguage,
            TriggerData::CascadeFailure { .. } => TriggerType::CascadeFailure,
        }
    }
}

/// A persisted, timestamped, severity-scored signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trigger {
    pub id: i64,
    pub user_id: i64,
    /// `None` for triggers not tied to a domain ("general").
    pub domain: Option<Domain>,
    pub data: TriggerData,
    pub severity_score: f64,
    pub timestamp: DateTime<Utc>,
}

impl Trigger {
    pub fn trigger_type(&self) -> TriggerType {
        self.data.trigger_type()
    }
}

/// One row of a windowed trigger scan. A corrupt payload fails only its own row.
pub type TriggerRead = Result<Trigger, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_tag_matches_type_name() {
        let data = TriggerData::PerformanceWarning(DeclineData {
            completion_rate: 0.5,
            trend: Trend::Declining,
            total_commitments: 14,
        });
        let json = serde_json::to_value(&data).unwrap();
        assert_eq!(json["type"], "performance_warning");
        assert_eq!(json["trend"], "declining");
        assert_eq!(data.trigger_type().as_str(), "performance_warning");
    }

    #[test]
    fn type_names_parse_back() {
        for t in [
            TriggerType::MissedDeadline,
            TriggerType::CrisisCompletionRate,
            TriggerType::DecliningPerformance,
            TriggerType::PerformanceWarning,
            TriggerType::AvoidanceLanguage,
            TriggerType::CascadeFailure,
        ] {
            assert_eq!(t.as_str().parse::<TriggerType>().unwrap(), t);
        }
        assert!("pattern_decline".parse::<TriggerType>().is_err());
    }

    #[test]
    fn payload_missing_fields_fails_to_parse() {
        let raw = r#"{"type":"missed_deadline","commitment":"x"}"#;
        assert!(serde_json::from_str::<TriggerData>(raw).is_err());
    }
}
