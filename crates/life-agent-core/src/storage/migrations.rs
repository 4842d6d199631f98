//! Database schema migrations for life-agent.
//!
//! Migrations are versioned and applied automatically when opening the database.
//! The `schema_version` table tracks the current migration version.

use rusqlite::{Connection, Result as SqliteResult};

/// Current schema version.
///
/// Increment this when adding new migrations.
pub const CURRENT_VERSION: i32 = 2;

/// Apply all pending migrations to bring the database to the current schema version.
///
/// # Errors
/// Returns an error if migration fails.
pub fn migrate(conn: &Connection) -> SqliteResult<()> {
    create_schema_version_table(conn)?;

    let current_version = schema_version(conn);

    if current_version < 1 {
        migrate_v1(conn)?;
    }
    if current_version < 2 {
        migrate_v2(conn)?;
    }

    Ok(())
}

fn create_schema_version_table(conn: &Connection) -> SqliteResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY
        );",
    )
}

/// Get the current schema version from the database.
///
/// Returns 0 if no version is set (initial database).
pub fn schema_version(conn: &Connection) -> i32 {
    conn.query_row("SELECT version FROM schema_version", [], |row| {
        row.get::<_, i32>(0)
    })
    .unwrap_or_else(|e| {
        if !matches!(e, rusqlite::Error::QueryReturnedNoRows) {
            tracing::warn!(error = %e, "failed to read schema_version");
        }
        0
    })
}

fn set_schema_version(conn: &Connection, version: i32) -> SqliteResult<()> {
    conn.execute("DELETE FROM schema_version", [])?;
    conn.execute(
        "INSERT INTO schema_version (version) VALUES (?1)",
        [version],
    )?;
    Ok(())
}

/// Migration v1: the three accountability tables.
///
/// Range-scan indexes cover the (user, domain, time) access pattern every
/// windowed query uses.
fn migrate_v1(conn: &Connection) -> SqliteResult<()> {
    let tx = conn.unchecked_transaction()?;

    tx.execute_batch(
        "CREATE TABLE IF NOT EXISTS commitments (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id     INTEGER NOT NULL,
            domain      TEXT NOT NULL,
            date        TEXT NOT NULL,
            commitment  TEXT NOT NULL,
            completed   INTEGER NOT NULL DEFAULT 0,
            notes       TEXT,
            created_at  TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS triggers (
            id             INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id        INTEGER NOT NULL,
            domain         TEXT NOT NULL,
            trigger_type   TEXT NOT NULL,
            trigger_data   TEXT NOT NULL,
            severity_score REAL NOT NULL,
            timestamp      TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS interventions (
            id                  INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id             INTEGER NOT NULL,
            domain              TEXT NOT NULL,
            intervention_level  INTEGER NOT NULL,
            trigger_condition   TEXT NOT NULL,
            start_time          TEXT NOT NULL,
            last_escalation     TEXT,
            response_received   INTEGER NOT NULL DEFAULT 0,
            resolution_status   TEXT NOT NULL DEFAULT 'active',
            effectiveness_score REAL
        );

        CREATE INDEX IF NOT EXISTS idx_commitments_user_domain_date
            ON commitments(user_id, domain, date);
        CREATE INDEX IF NOT EXISTS idx_commitments_user_date
            ON commitments(user_id, date);
        CREATE INDEX IF NOT EXISTS idx_triggers_user_domain_ts
            ON triggers(user_id, domain, timestamp);
        CREATE INDEX IF NOT EXISTS idx_interventions_user_domain_status
            ON interventions(user_id, domain, resolution_status);",
    )?;

    set_schema_version(&tx, 1)?;
    tx.commit()
}

/// Migration v2: resolution timestamp and the one-open-intervention index.
///
/// The partial unique index rejects a second open row for the same
/// (user_id, domain) even if a writer bypasses the lifecycle manager.
fn migrate_v2(conn: &Connection) -> SqliteResult<()> {
    let tx = conn.unchecked_transaction()?;

    tx.execute_batch(
        "ALTER TABLE interventions ADD COLUMN resolved_at TEXT;

        CREATE UNIQUE INDEX IF NOT EXISTS idx_interventions_one_open
            ON interventions(user_id, domain)
            WHERE resolution_status IN ('active', 'escalated');",
    )?;

    set_schema_version(&tx, 2)?;
    tx.commit()
}
