use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result, bail};
use rusqlite::{Connection, OpenFlags, params};
use serde::Serialize;

use crate::entry::IndexEntry;

const SEARCH_INDEX_TABLE: &str = "searchIndex";

#[derive(Debug, Clone, Serialize)]
pub struct InsertReport {
    pub inserted_rows: usize,
    pub skipped_rows: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct StoredIndexStats {
    pub total_rows: usize,
    pub by_type: BTreeMap<String, usize>,
}

/// Insert entries into the pre-existing searchIndex table. Duplicates are
/// silently skipped (the table's uniqueness constraint plus
/// `INSERT OR IGNORE`), so re-running against unchanged sources is
/// idempotent. All inserts happen inside one transaction; any failure
/// rolls back and closes the connection.
pub fn write_entries(db_path: &Path, entries: &[IndexEntry]) -> Result<InsertReport> {
    let mut connection = open_rw(db_path)?;
    if !table_exists(&connection, SEARCH_INDEX_TABLE)? {
        bail!(
            "searchIndex table missing from {}; the docset database shell must exist before indexing",
            db_path.display(),
        );
    }

    let transaction = connection
        .transaction()
        .context("failed to start search-index transaction")?;

    let mut inserted_rows = 0usize;
    let mut skipped_rows = 0usize;
    {
        let mut statement = transaction
            .prepare("INSERT OR IGNORE INTO searchIndex(name, type, path) VALUES (?1, ?2, ?3)")
            .context("failed to prepare searchIndex insert")?;
        for entry in entries {
            let affected = statement
                .execute(params![entry.name, entry.kind.as_str(), entry.path])
                .with_context(|| format!("failed to insert {}", entry.path))?;
            if affected == 0 {
                skipped_rows += 1;
            } else {
                inserted_rows += affected;
            }
        }
    }

    transaction
        .commit()
        .context("failed to commit search-index transaction")?;

    Ok(InsertReport {
        inserted_rows,
        skipped_rows,
    })
}

/// Read back row counts from an existing index. Returns None when the
/// database or the searchIndex table doesn't exist yet.
pub fn load_stored_index_stats(db_path: &Path) -> Result<Option<StoredIndexStats>> {
    if !db_path.exists() {
        return Ok(None);
    }

    let connection = Connection::open_with_flags(db_path, OpenFlags::SQLITE_OPEN_READ_ONLY)
        .with_context(|| format!("failed to open {}", db_path.display()))?;
    if !table_exists(&connection, SEARCH_INDEX_TABLE)? {
        return Ok(None);
    }

    let total_rows = count_query(&connection, "SELECT COUNT(*) FROM searchIndex")
        .context("failed to count index rows")?;

    let mut by_type = BTreeMap::new();
    let mut statement = connection
        .prepare("SELECT type, COUNT(*) FROM searchIndex GROUP BY type ORDER BY type")
        .context("failed to prepare per-type count")?;
    let rows = statement
        .query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })
        .context("failed to count rows per type")?;
    for row in rows {
        let (kind, count) = row.context("failed to read per-type count row")?;
        by_type.insert(kind, usize::try_from(count).unwrap_or(0));
    }

    Ok(Some(StoredIndexStats {
        total_rows,
        by_type,
    }))
}

fn open_rw(db_path: &Path) -> Result<Connection> {
    // No CREATE flag: a missing database file is an error, never a fresh
    // empty database next to the docset.
    Connection::open_with_flags(
        db_path,
        OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_URI,
    )
    .with_context(|| format!("failed to open {}", db_path.display()))
}

fn table_exists(connection: &Connection, table: &str) -> Result<bool> {
    let count: i64 = connection
        .query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
            params![table],
            |row| row.get(0),
        )
        .with_context(|| format!("failed to check for table {table}"))?;
    Ok(count > 0)
}

fn count_query(connection: &Connection, sql: &str) -> Result<usize> {
    let count: i64 = connection.query_row(sql, [], |row| row.get(0))?;
    Ok(usize::try_from(count).unwrap_or(0))
}
