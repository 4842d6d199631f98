//! Commitment log: per-user, per-domain, per-day records with a completion flag.
//!
//! Commitments are never deleted. Several commitments for the same domain and
//! day are allowed and all of them count.

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Row};
use serde::{Deserialize, Serialize};

use super::{format_date, format_ts, parse_date, parse_ts, Database};
use crate::context::RequestContext;
use crate::domain::Domain;
use crate::error::{Result, ValidationError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Commitment {
    pub id: i64,
    pub user_id: i64,
    pub domain: Domain,
    pub date: NaiveDate,
    pub commitment: String,
    pub completed: bool,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Fields for inserting a commitment with explicit dates.
#[derive(Debug, Clone)]
pub struct NewCommitment {
    pub user_id: i64,
    pub domain: Domain,
    pub date: NaiveDate,
    pub commitment: String,
    pub completed: bool,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

const COLUMNS: &str = "id, user_id, domain, date, commitment, completed, notes, created_at";

// Most recent first; ties on date fall back to insertion order.
const RECENT_FIRST: &str = "ORDER BY date DESC, created_at DESC, id DESC";

struct CommitmentRow {
    id: i64,
    user_id: i64,
    domain: String,
    date: String,
    commitment: String,
    completed: bool,
    notes: Option<String>,
    created_at: String,
}

impl CommitmentRow {
    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            user_id: row.get(1)?,
            domain: row.get(2)?,
            date: row.get(3)?,
            commitment: row.get(4)?,
            completed: row.get(5)?,
            notes: row.get(6)?,
            created_at: row.get(7)?,
        })
    }

    fn decode(self) -> std::result::Result<Commitment, String> {
        Ok(Commitment {
            id: self.id,
            user_id: self.user_id,
            domain: self.domain.parse().map_err(|e: ValidationError| e.to_string())?,
            date: parse_date(&self.date)?,
            commitment: self.commitment,
            completed: self.completed,
            notes: self.notes,
            created_at: parse_ts(&self.created_at)?,
        })
    }
}

impl Database {
    /// Insert a commitment with explicit date and creation time.
    ///
    /// # Errors
    /// Returns an error if the insert fails.
    pub fn insert_commitment(&self, new: &NewCommitment) -> Result<i64> {
        self.conn().execute(
            "INSERT INTO commitments (user_id, domain, date, commitment, completed, notes, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                new.user_id,
                new.domain.as_str(),
                format_date(new.date),
                new.commitment,
                new.completed,
                new.notes,
                format_ts(new.created_at),
            ],
        )?;
        Ok(self.conn().last_insert_rowid())
    }

    /// Record a commitment stated now, dated today.
    ///
    /// # Errors
    /// Returns an error if the insert fails.
    pub fn log_commitment(&self, ctx: &RequestContext, domain: Domain, text: &str) -> Result<i64> {
        self.insert_commitment(&NewCommitment {
            user_id: ctx.user_id,
            domain,
            date: ctx.today(),
            commitment: text.to_string(),
            completed: false,
            notes: None,
            created_at: ctx.now,
        })
    }

    /// Fetch one commitment by id.
    ///
    /// # Errors
    /// Returns an error if the query fails or the row cannot be decoded.
    pub fn get_commitment(&self, id: i64) -> Result<Option<Commitment>> {
        let mut stmt = self
            .conn()
            .prepare(&format!("SELECT {COLUMNS} FROM commitments WHERE id = ?1"))?;
        let row = match stmt.query_row(params![id], CommitmentRow::read) {
            Ok(row) => row,
            Err(rusqlite::Error::QueryReturnedNoRows) => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        row.decode().map(Some).map_err(|message| {
            crate::error::StorageError::InvalidRow {
                table: "commitments",
                message,
            }
            .into()
        })
    }

    /// Flip a user's commitment to completed.
    ///
    /// Completing an already completed commitment is a no-op.
    ///
    /// # Errors
    /// Returns `NotFound` if the commitment does not exist for this user.
    pub fn mark_completed(&self, user_id: i64, id: i64) -> Result<Commitment> {
        let changed = self.conn().execute(
            "UPDATE commitments SET completed = 1 WHERE id = ?1 AND user_id = ?2",
            params![id, user_id],
        )?;
        if changed == 0 {
            return Err(ValidationError::NotFound {
                kind: "commitment",
                id,
            }
            .into());
        }
        self.get_commitment(id)?.ok_or_else(|| {
            ValidationError::NotFound {
                kind: "commitment",
                id,
            }
            .into()
        })
    }

    /// Commitments dated strictly after `after`, most recent first.
    ///
    /// Rows that cannot be decoded are skipped with a warning.
    ///
    /// # Errors
    /// Returns an error only if the query itself fails.
    pub fn commitments_after(
        &self,
        user_id: i64,
        domain: Option<Domain>,
        after: NaiveDate,
    ) -> Result<Vec<Commitment>> {
        let after = format_date(after);
        match domain {
            Some(domain) => self.query_commitments(
                &format!(
                    "SELECT {COLUMNS} FROM commitments
                     WHERE user_id = ?1 AND domain = ?2 AND date > ?3 {RECENT_FIRST}"
                ),
                params![user_id, domain.as_str(), after],
            ),
            None => self.query_commitments(
                &format!(
                    "SELECT {COLUMNS} FROM commitments
                     WHERE user_id = ?1 AND date > ?2 {RECENT_FIRST}"
                ),
                params![user_id, after],
            ),
        }
    }

    /// Commitments for one domain dated on or after `from`, most recent first.
    ///
    /// # Errors
    /// Returns an error only if the query itself fails.
    pub fn commitments_since(
        &self,
        user_id: i64,
        domain: Domain,
        from: NaiveDate,
    ) -> Result<Vec<Commitment>> {
        self.query_commitments(
            &format!(
                "SELECT {COLUMNS} FROM commitments
                 WHERE user_id = ?1 AND domain = ?2 AND date >= ?3 {RECENT_FIRST}"
            ),
            params![user_id, domain.as_str(), format_date(from)],
        )
    }

    /// Incomplete commitments dated `date`, oldest first.
    ///
    /// # Errors
    /// Returns an error only if the query itself fails.
    pub fn incomplete_commitments_on(&self, user_id: i64, date: NaiveDate) -> Result<Vec<Commitment>> {
        self.query_commitments(
            &format!(
                "SELECT {COLUMNS} FROM commitments
                 WHERE user_id = ?1 AND date = ?2 AND completed = 0
                 ORDER BY created_at ASC, id ASC"
            ),
            params![user_id, format_date(date)],
        )
    }

    fn query_commitments(
        &self,
        sql: &str,
        params: impl rusqlite::Params,
    ) -> Result<Vec<Commitment>> {
        let mut stmt = self.conn().prepare(sql)?;
        let rows = stmt.query_map(params, CommitmentRow::read)?;

        let mut out = Vec::new();
        for row in rows {
            let row = row?;
            let id = row.id;
            match row.decode() {
                Ok(commitment) => out.push(commitment),
                Err(reason) => {
                    tracing::warn!(commitment_id = id, %reason, "skipping undecodable commitment");
                }
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 20, 18, 0, 0).unwrap()
    }

    fn commitment(domain: Domain, days_ago: i64, completed: bool) -> NewCommitment {
        let created_at = now() - Duration::days(days_ago);
        NewCommitment {
            user_id: 1,
            domain,
            date: created_at.date_naive(),
            commitment: format!("{domain} task"),
            completed,
            notes: None,
            created_at,
        }
    }

    #[test]
    fn log_and_fetch() {
        let db = Database::open_memory().unwrap();
        let ctx = RequestContext::new(1).at(now());
        let id = db.log_commitment(&ctx, Domain::Work, "Ship report").unwrap();
        let got = db.get_commitment(id).unwrap().unwrap();
        assert_eq!(got.domain, Domain::Work);
        assert_eq!(got.date, ctx.today());
        assert!(!got.completed);
        assert!(db.get_commitment(id + 1).unwrap().is_none());
    }

    #[test]
    fn mark_completed_flips_flag_and_checks_owner() {
        let db = Database::open_memory().unwrap();
        let id = db.insert_commitment(&commitment(Domain::Health, 0, false)).unwrap();
        assert!(db.mark_completed(2, id).is_err());
        assert!(db.mark_completed(1, id).unwrap().completed);
        // Idempotent.
        assert!(db.mark_completed(1, id).unwrap().completed);
    }

    #[test]
    fn window_is_exclusive_and_recent_first() {
        let db = Database::open_memory().unwrap();
        for days_ago in [0, 3, 13, 14] {
            db.insert_commitment(&commitment(Domain::Finance, days_ago, false))
                .unwrap();
        }
        let after = now().date_naive() - Duration::days(14);
        let rows = db.commitments_after(1, None, after).unwrap();
        assert_eq!(rows.len(), 3);
        assert!(rows.windows(2).all(|w| w[0].date >= w[1].date));
    }

    #[test]
    fn multiple_commitments_same_day_all_count() {
        let db = Database::open_memory().unwrap();
        for _ in 0..3 {
            db.insert_commitment(&commitment(Domain::Business, 1, true)).unwrap();
        }
        let after = now().date_naive() - Duration::days(7);
        let rows = db.commitments_after(1, Some(Domain::Business), after).unwrap();
        assert_eq!(rows.len(), 3);
        // Same date: later ids come first.
        assert!(rows[0].id > rows[1].id);
    }

    #[test]
    fn undecodable_rows_are_skipped() {
        let db = Database::open_memory().unwrap();
        db.insert_commitment(&commitment(Domain::Work, 1, true)).unwrap();
        db.conn()
            .execute(
                "INSERT INTO commitments (user_id, domain, date, commitment, completed, created_at)
                 VALUES (1, 'hobbies', ?1, 'paint', 0, ?2)",
                params![format_date(now().date_naive()), format_ts(now())],
            )
            .unwrap();
        let after = now().date_naive() - Duration::days(7);
        let rows = db.commitments_after(1, None, after).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].domain, Domain::Work);
    }

    #[test]
    fn incomplete_on_date_filters_completed() {
        let db = Database::open_memory().unwrap();
        db.insert_commitment(&commitment(Domain::Work, 0, false)).unwrap();
        db.insert_commitment(&commitment(Domain::Work, 0, true)).unwrap();
        db.insert_commitment(&commitment(Domain::Work, 1, false)).unwrap();
        let rows = db.incomplete_commitments_on(1, now().date_naive()).unwrap();
        assert_eq!(rows.len(), 1);
    }
}
