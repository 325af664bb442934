//! Durable key-value storage contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide string-keyed, whole-value reads and overwrites.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - `put` fully overwrites the previous value for a key.
//! - `put_many` is all-or-nothing: either every entry is written or none is.
//! - `get_bytes` returns stored bytes as-is, whatever their column type or
//!   encoding; only `get` requires UTF-8.

use crate::db::DbError;
use rusqlite::types::ValueRef;
use rusqlite::{params, Connection, OptionalExtension};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type StorageResult<T> = Result<T, StorageError>;

/// Failure of the durable storage backend.
#[derive(Debug)]
pub enum StorageError {
    Db(DbError),
    /// Stored value is not UTF-8 text.
    NotText { key: String },
}

impl Display for StorageError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "storage backend error: {err}"),
            Self::NotText { key } => write!(f, "stored value for `{key}` is not UTF-8 text"),
        }
    }
}

impl Error for StorageError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::NotText { .. } => None,
        }
    }
}

impl From<DbError> for StorageError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StorageError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Durable string key-value storage.
pub trait KeyValueStore {
    /// Raw stored bytes, with no encoding check.
    fn get_bytes(&self, key: &str) -> StorageResult<Option<Vec<u8>>>;
    fn put(&self, key: &str, value: &str) -> StorageResult<()>;
    /// Stores `value` verbatim; used to keep undecodable values.
    fn put_bytes(&self, key: &str, value: &[u8]) -> StorageResult<()>;
    /// Writes all entries as one atomic step.
    fn put_many(&self, entries: &[(&str, &str)]) -> StorageResult<()>;

    /// Stored value as text.
    ///
    /// # Errors
    /// - [`StorageError::NotText`] when the bytes are not UTF-8.
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        self.get_bytes(key)?
            .map(|bytes| {
                String::from_utf8(bytes).map_err(|_| StorageError::NotText {
                    key: key.to_string(),
                })
            })
            .transpose()
    }
}

/// SQLite-backed key-value store over the `kv_store` table.
#[derive(Clone, Copy)]
pub struct SqliteKeyValueStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteKeyValueStore<'conn> {
    /// Wraps a connection returned by [`crate::db::open_db`] or
    /// [`crate::db::open_db_in_memory`] (migrations already applied).
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

const UPSERT_SQL: &str = "INSERT INTO kv_store (key, value, updated_at)
     VALUES (?1, ?2, (strftime('%s', 'now') * 1000))
     ON CONFLICT(key) DO UPDATE SET
        value = excluded.value,
        updated_at = excluded.updated_at;";

impl KeyValueStore for SqliteKeyValueStore<'_> {
    fn get_bytes(&self, key: &str) -> StorageResult<Option<Vec<u8>>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM kv_store WHERE key = ?1;",
                [key],
                |row| Ok(value_bytes(row.get_ref(0)?)),
            )
            .optional()?;
        Ok(value)
    }

    fn put(&self, key: &str, value: &str) -> StorageResult<()> {
        self.conn.execute(UPSERT_SQL, params![key, value])?;
        Ok(())
    }

    fn put_bytes(&self, key: &str, value: &[u8]) -> StorageResult<()> {
        self.conn.execute(UPSERT_SQL, params![key, value])?;
        Ok(())
    }

    fn put_many(&self, entries: &[(&str, &str)]) -> StorageResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare(UPSERT_SQL)?;
            for (key, value) in entries {
                stmt.execute(params![key, value])?;
            }
        }
        tx.commit()?;
        Ok(())
    }
}

/// Column bytes regardless of the SQLite storage class they were written with.
fn value_bytes(value: ValueRef<'_>) -> Vec<u8> {
    match value {
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => bytes.to_vec(),
        ValueRef::Integer(number) => number.to_string().into_bytes(),
        ValueRef::Real(number) => number.to_string().into_bytes(),
        ValueRef::Null => Vec::new(),
    }
}
