//! Schema for the generation cache.
//!
//! Version 1 creates the namespace table, version 2 the entry table that
//! cascades off it. The highest applied version is recorded in
//! `_migrations`; opening a cache applies whatever is newer, one
//! transaction per version.

use super::Error;
use tokio_rusqlite::rusqlite::Connection as SqliteConnection;
use tokio_rusqlite::{Connection, params};

/// Schema versions, ascending.
const MIGRATIONS: &[(i64, &str)] = &[
    (1, include_str!("../../migrations/001_namespaces.sql")),
    (2, include_str!("../../migrations/002_entries.sql")),
];

/// Bring the cache schema up to the latest version.
///
/// # Errors
///
/// Returns [`Error::MigrationFailed`] naming the version whose SQL was
/// rejected; earlier versions stay applied.
pub async fn run(conn: &Connection) -> Result<(), Error> {
    conn.call(|conn| -> Result<(), Error> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS _migrations (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL
            )",
            [],
        )?;

        let current: i64 =
            conn.query_row("SELECT COALESCE(MAX(version), 0) FROM _migrations", [], |row| row.get(0))?;

        for &(version, sql) in MIGRATIONS.iter().filter(|(version, _)| *version > current) {
            apply(conn, version, sql).map_err(|e| Error::MigrationFailed(format!("version {version}: {e}")))?;
            tracing::debug!(version, "cache schema upgraded");
        }

        Ok(())
    })
    .await
    .map_err(Error::from)
}

fn apply(conn: &mut SqliteConnection, version: i64, sql: &str) -> Result<(), Error> {
    let tx = conn.transaction()?;
    tx.execute_batch(sql)?;
    tx.execute(
        "INSERT INTO _migrations (version, applied_at) VALUES (?1, ?2)",
        params![version, chrono::Utc::now().to_rfc3339()],
    )?;
    tx.commit()?;
    Ok(())
}
