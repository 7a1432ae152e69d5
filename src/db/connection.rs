use std::path::Path;

use log::info;
use rusqlite::Connection;

use crate::errors::EtlError;

/// Production schema, embedded so a fresh database file can be provisioned
/// without shipping the .sql next to the binary.
pub const SCHEMA_SQL: &str = include_str!("../../sql/schema.sql");

/// The one connection of a run.
///
/// Records are written strictly one at a time through this handle. Generated
/// identifiers come back from the INSERT itself (`RETURNING`), so nothing
/// relies on a separate "last inserted id" read.
pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, EtlError> {
        let path = path.as_ref();
        let conn = Connection::open(path).map_err(|e| {
            EtlError::Connectivity(format!("Open DB {} failed: {e}", path.display()))
        })?;
        Self::configure(conn)
    }

    pub fn open_in_memory() -> Result<Self, EtlError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| EtlError::Connectivity(format!("Open in-memory DB failed: {e}")))?;
        Self::configure(conn)
    }

    fn configure(conn: Connection) -> Result<Self, EtlError> {
        conn.pragma_update(None, "foreign_keys", true)
            .map_err(|e| EtlError::Connectivity(format!("Enable foreign keys failed: {e}")))?;
        Ok(Self { conn })
    }

    /// Provides the mutable connection to the closure.
    pub fn with_conn<F, T, E>(&mut self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut Connection) -> Result<T, E>,
    {
        f(&mut self.conn)
    }
}

/// Creates any missing tables. Safe to run against an already provisioned
/// database.
pub fn init_db(db: &mut Database, schema_sql: &str) -> Result<(), EtlError> {
    db.with_conn(|conn| {
        conn.execute_batch(schema_sql)
            .map_err(|e| EtlError::Schema(format!("Failed to apply schema: {e}")))
    })?;

    info!("Database schema ready");
    Ok(())
}

/// Reads a schema file from disk, for databases provisioned outside the
/// embedded default.
pub fn init_db_from_file(db: &mut Database, schema_path: &Path) -> Result<(), EtlError> {
    let schema_sql = std::fs::read_to_string(schema_path).map_err(|e| {
        EtlError::Schema(format!(
            "Failed to read schema file {}: {e}",
            schema_path.display()
        ))
    })?;
    init_db(db, &schema_sql)
}
