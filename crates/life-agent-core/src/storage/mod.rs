mod config;
mod commitments;
pub mod database;
pub mod interventions;
pub mod migrations;
mod triggers;

pub use commitments::{Commitment, NewCommitment};
pub use config::{AnalysisConfig, Config, EscalationConfig, LifecycleConfig, TriggerConfig};
pub use database::Database;
pub use triggers::TriggerSummary;

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use std::path::PathBuf;

use crate::error::ConfigError;

/// Returns `~/.config/life-agent[-dev]/` based on LIFE_AGENT_ENV.
///
/// Set LIFE_AGENT_ENV=dev to use development data directory.
///
/// # Errors
/// Returns an error if creating the config directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("LIFE_AGENT_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("life-agent-dev")
    } else {
        base_dir.join("life-agent")
    };

    std::fs::create_dir_all(&dir).map_err(|e| ConfigError::DataDir(e.to_string()))?;
    Ok(dir)
}

// Fixed-width UTC text so that lexical order in SQL equals chronological order.
pub(crate) fn format_ts(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn parse_ts(s: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| format!("bad timestamp '{s}': {e}"))
}

pub(crate) fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub(crate) fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| format!("bad date '{s}': {e}"))
}
