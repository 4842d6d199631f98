//! Intervention rows.
//!
//! The write helpers take a bare `&Connection` so the lifecycle manager can
//! run them inside its own immediate transaction.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{format_ts, parse_ts, Database};
use crate::domain::Domain;
use crate::error::{Result, StorageError};
use crate::intervention::{Intervention, TriggerSnapshot};

const COLUMNS: &str = "id, user_id, domain, intervention_level, trigger_condition, start_time,
    last_escalation, response_received, resolution_status, effectiveness_score, resolved_at";

const OPEN: &str = "resolution_status IN ('active', 'escalated')";

struct InterventionRow {
    id: i64,
    user_id: i64,
    domain: String,
    intervention_level: u8,
    trigger_condition: String,
    start_time: String,
    last_escalation: Option<String>,
    response_received: bool,
    resolution_status: String,
    effectiveness_score: Option<f64>,
    resolved_at: Option<String>,
}

impl InterventionRow {
    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            user_id: row.get(1)?,
            domain: row.get(2)?,
            intervention_level: row.get(3)?,
            trigger_condition: row.get(4)?,
            start_time: row.get(5)?,
            last_escalation: row.get(6)?,
            response_received: row.get(7)?,
            resolution_status: row.get(8)?,
            effectiveness_score: row.get(9)?,
            resolved_at: row.get(10)?,
        })
    }

    fn decode(self) -> Result<Intervention> {
        let invalid = |message: String| StorageError::InvalidRow {
            table: "interventions",
            message,
        };
        Ok(Intervention {
            id: self.id,
            user_id: self.user_id,
            domain: self.domain.parse().map_err(|e: crate::error::ValidationError| invalid(e.to_string()))?,
            intervention_level: self.intervention_level,
            trigger_condition: serde_json::from_str(&self.trigger_condition)
                .map_err(|e| invalid(format!("trigger_condition: {e}")))?,
            start_time: parse_ts(&self.start_time).map_err(invalid)?,
            last_escalation: self
                .last_escalation
                .as_deref()
                .map(parse_ts)
                .transpose()
                .map_err(invalid)?,
            response_received: self.response_received,
            resolution_status: self
                .resolution_status
                .parse()
                .map_err(|e: crate::error::ValidationError| invalid(e.to_string()))?,
            effectiveness_score: self.effectiveness_score,
            resolved_at: self
                .resolved_at
                .as_deref()
                .map(parse_ts)
                .transpose()
                .map_err(invalid)?,
        })
    }
}

pub(crate) fn select_by_id(conn: &Connection, id: i64) -> Result<Option<Intervention>> {
    conn.query_row(
        &format!("SELECT {COLUMNS} FROM interventions WHERE id = ?1"),
        params![id],
        InterventionRow::read,
    )
    .optional()?
    .map(InterventionRow::decode)
    .transpose()
}

pub(crate) fn select_open(
    conn: &Connection,
    user_id: i64,
    domain: Domain,
) -> Result<Option<Intervention>> {
    conn.query_row(
        &format!(
            "SELECT {COLUMNS} FROM interventions
             WHERE user_id = ?1 AND domain = ?2 AND {OPEN}
             ORDER BY start_time DESC, id DESC LIMIT 1"
        ),
        params![user_id, domain.as_str()],
        InterventionRow::read,
    )
    .optional()?
    .map(InterventionRow::decode)
    .transpose()
}

pub(crate) fn insert_open(
    conn: &Connection,
    user_id: i64,
    domain: Domain,
    level: u8,
    snapshot: &TriggerSnapshot,
    now: DateTime<Utc>,
) -> Result<i64> {
    conn.execute(
        "INSERT INTO interventions
            (user_id, domain, intervention_level, trigger_condition, start_time, resolution_status)
         VALUES (?1, ?2, ?3, ?4, ?5, 'active')",
        params![
            user_id,
            domain.as_str(),
            level,
            serde_json::to_string(snapshot)?,
            format_ts(now),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub(crate) fn raise_level(
    conn: &Connection,
    id: i64,
    level: u8,
    snapshot: &TriggerSnapshot,
    now: DateTime<Utc>,
) -> Result<()> {
    conn.execute(
        "UPDATE interventions
         SET intervention_level = ?2, trigger_condition = ?3, last_escalation = ?4,
             resolution_status = 'escalated'
         WHERE id = ?1",
        params![id, level, serde_json::to_string(snapshot)?, format_ts(now)],
    )?;
    Ok(())
}

pub(crate) fn close(
    conn: &Connection,
    id: i64,
    effectiveness_score: Option<f64>,
    now: DateTime<Utc>,
) -> Result<bool> {
    let changed = conn.execute(
        &format!(
            "UPDATE interventions
             SET resolution_status = 'resolved', effectiveness_score = ?2, resolved_at = ?3
             WHERE id = ?1 AND {OPEN}"
        ),
        params![id, effectiveness_score, format_ts(now)],
    )?;
    Ok(changed > 0)
}

impl Database {
    /// Fetch one intervention by id, open or not.
    ///
    /// # Errors
    /// Returns an error if the query fails or the row cannot be decoded.
    pub fn get_intervention(&self, id: i64) -> Result<Option<Intervention>> {
        select_by_id(self.conn(), id)
    }

    /// The open intervention for (user, domain), if any.
    ///
    /// # Errors
    /// Returns an error if the query fails or the row cannot be decoded.
    pub fn open_intervention(&self, user_id: i64, domain: Domain) -> Result<Option<Intervention>> {
        select_open(self.conn(), user_id, domain)
    }

    /// All open interventions for a user, most recently started first.
    ///
    /// # Errors
    /// Returns an error if the query fails or a row cannot be decoded.
    pub fn open_interventions(&self, user_id: i64) -> Result<Vec<Intervention>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {COLUMNS} FROM interventions
             WHERE user_id = ?1 AND {OPEN}
             ORDER BY start_time DESC, id DESC"
        ))?;
        let rows = stmt.query_map(params![user_id], InterventionRow::read)?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?.decode()?);
        }
        Ok(out)
    }

    /// Every intervention for a user, newest first.
    ///
    /// # Errors
    /// Returns an error if the query fails or a row cannot be decoded.
    pub fn interventions_for_user(&self, user_id: i64) -> Result<Vec<Intervention>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {COLUMNS} FROM interventions
             WHERE user_id = ?1
             ORDER BY start_time DESC, id DESC"
        ))?;
        let rows = stmt.query_map(params![user_id], InterventionRow::read)?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?.decode()?);
        }
        Ok(out)
    }

    /// Mark that the user answered an intervention.
    ///
    /// # Errors
    /// Returns an error if the update fails.
    pub fn set_response_received(&self, id: i64) -> Result<bool> {
        let changed = self.conn().execute(
            "UPDATE interventions SET response_received = 1 WHERE id = ?1",
            params![id],
        )?;
        Ok(changed > 0)
    }
}
