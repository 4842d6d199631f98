//! Append-only trigger log.

use chrono::{DateTime, Utc};
use rusqlite::{params, Row};
use serde::{Deserialize, Serialize};

use super::{format_ts, parse_ts, Database};
use crate::domain::{scope_from_str, scope_to_str, Domain};
use crate::error::{CoreError, Result};
use crate::triggers::{Trigger, TriggerData, TriggerRead, TriggerType};

/// Count and peak severity of a window of triggers, read from columns only.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TriggerSummary {
    pub trigger_count: u32,
    pub max_severity: f64,
    /// Distinct trigger types seen, in first-seen (newest first) order.
    pub trigger_types: Vec<TriggerType>,
}

struct TriggerRow {
    id: i64,
    user_id: i64,
    domain: String,
    trigger_type: String,
    trigger_data: String,
    severity_score: f64,
    timestamp: String,
}

impl TriggerRow {
    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            user_id: row.get(1)?,
            domain: row.get(2)?,
            trigger_type: row.get(3)?,
            trigger_data: row.get(4)?,
            severity_score: row.get(5)?,
            timestamp: row.get(6)?,
        })
    }

    fn decode(self) -> TriggerRead {
        let id = self.id;
        let corrupt = |reason: String| CoreError::CorruptTriggerData {
            trigger_id: id,
            reason,
        };

        let stored_type: TriggerType = self
            .trigger_type
            .parse()
            .map_err(|e: crate::error::ValidationError| corrupt(e.to_string()))?;
        let data: TriggerData =
            serde_json::from_str(&self.trigger_data).map_err(|e| corrupt(e.to_string()))?;
        if data.trigger_type() != stored_type {
            return Err(corrupt(format!(
                "payload is {} but row is {}",
                data.trigger_type(),
                stored_type
            )));
        }
        let domain = scope_from_str(&self.domain).map_err(|e| corrupt(e.to_string()))?;
        let timestamp = parse_ts(&self.timestamp).map_err(corrupt)?;

        Ok(Trigger {
            id,
            user_id: self.user_id,
            domain,
            data,
            severity_score: self.severity_score,
            timestamp,
        })
    }
}

impl Database {
    /// Append a trigger. Severity is clamped into [0, 1].
    ///
    /// # Errors
    /// Returns an error if the payload cannot be serialized or the insert fails.
    pub fn insert_trigger(
        &self,
        user_id: i64,
        domain: Option<Domain>,
        data: &TriggerData,
        severity: f64,
        timestamp: DateTime<Utc>,
    ) -> Result<i64> {
        let payload = serde_json::to_string(data)?;
        self.conn().execute(
            "INSERT INTO triggers (user_id, domain, trigger_type, trigger_data, severity_score, timestamp)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                user_id,
                scope_to_str(domain),
                data.trigger_type().as_str(),
                payload,
                severity.clamp(0.0, 1.0),
                format_ts(timestamp),
            ],
        )?;
        Ok(self.conn().last_insert_rowid())
    }

    /// Triggers newer than `since`, newest first, each decoded independently.
    ///
    /// # Errors
    /// Returns an error only if the query itself fails; payload problems are
    /// reported per row.
    pub fn triggers_since(
        &self,
        user_id: i64,
        domain: Option<Domain>,
        since: DateTime<Utc>,
    ) -> Result<Vec<TriggerRead>> {
        let mut stmt = self.conn().prepare(
            "SELECT id, user_id, domain, trigger_type, trigger_data, severity_score, timestamp
             FROM triggers
             WHERE user_id = ?1 AND domain = ?2 AND timestamp > ?3
             ORDER BY timestamp DESC, id DESC",
        )?;
        let rows = stmt.query_map(
            params![user_id, scope_to_str(domain), format_ts(since)],
            TriggerRow::read,
        )?;

        let mut out = Vec::new();
        for row in rows {
            out.push(row?.decode());
        }
        Ok(out)
    }

    /// Count, peak severity and types of triggers newer than `since`.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub fn trigger_summary(
        &self,
        user_id: i64,
        domain: Option<Domain>,
        since: DateTime<Utc>,
    ) -> Result<TriggerSummary> {
        let mut stmt = self.conn().prepare(
            "SELECT trigger_type, severity_score
             FROM triggers
             WHERE user_id = ?1 AND domain = ?2 AND timestamp > ?3
             ORDER BY timestamp DESC, id DESC",
        )?;
        let rows = stmt.query_map(
            params![user_id, scope_to_str(domain), format_ts(since)],
            |row| Ok((row.get::<_, String>(0)?, row.get::<_, f64>(1)?)),
        )?;

        let mut summary = TriggerSummary::default();
        for row in rows {
            let (type_str, severity) = row?;
            summary.trigger_count += 1;
            summary.max_severity = summary.max_severity.max(severity);
            if let Ok(t) = type_str.parse::<TriggerType>() {
                if !summary.trigger_types.contains(&t) {
                    summary.trigger_types.push(t);
                }
            }
        }
        Ok(summary)
    }
}
