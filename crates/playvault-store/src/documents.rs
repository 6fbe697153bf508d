// ABOUTME: Generic JSON-document table access keyed by (username, key).
// ABOUTME: Each per-user entity declares its document type; decode failures surface as Corrupt, never as absent.

use std::collections::HashMap;

use rusqlite::{Connection, OptionalExtension, params};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::StoreError;

/// A per-user document table with a single text key column.
pub(crate) struct DocumentTable {
    pub name: &'static str,
    pub key_column: &'static str,
}

pub(crate) const PLAY_RECORDS: DocumentTable = DocumentTable {
    name: "play_records",
    key_column: "record_key",
};

pub(crate) const FAVORITES: DocumentTable = DocumentTable {
    name: "favorites",
    key_column: "favorite_key",
};

pub(crate) fn encode<T: Serialize>(doc: &T) -> Result<String, StoreError> {
    serde_json::to_string(doc).map_err(StoreError::Serialize)
}

pub(crate) fn decode<T: DeserializeOwned>(
    table: &'static str,
    key: &str,
    text: &str,
) -> Result<T, StoreError> {
    serde_json::from_str(text).map_err(|source| StoreError::Corrupt {
        table,
        key: key.to_string(),
        source,
    })
}

pub(crate) fn now_secs() -> i64 {
    chrono::Utc::now().timestamp()
}

pub(crate) fn get<T: DeserializeOwned>(
    conn: &Connection,
    table: &DocumentTable,
    username: &str,
    key: &str,
) -> Result<Option<T>, StoreError> {
    let sql = format!(
        "SELECT data FROM {} WHERE username = ?1 AND {} = ?2",
        table.name, table.key_column
    );
    let text: Option<String> = conn
        .query_row(&sql, params![username, key], |row| row.get(0))
        .optional()?;

    text.map(|t| decode(table.name, key, &t)).transpose()
}

/// Insert or replace the document at `(username, key)`.
pub(crate) fn set<T: Serialize>(
    conn: &Connection,
    table: &DocumentTable,
    username: &str,
    key: &str,
    doc: &T,
) -> Result<(), StoreError> {
    let data = encode(doc)?;
    let sql = format!(
        "INSERT INTO {name} (username, {key_col}, data, updated_at)
         VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(username, {key_col}) DO UPDATE SET
            data = excluded.data,
            updated_at = excluded.updated_at",
        name = table.name,
        key_col = table.key_column
    );
    conn.execute(&sql, params![username, key, data, now_secs()])?;
    Ok(())
}

pub(crate) fn all<T: DeserializeOwned>(
    conn: &Connection,
    table: &DocumentTable,
    username: &str,
) -> Result<HashMap<String, T>, StoreError> {
    let sql = format!(
        "SELECT {}, data FROM {} WHERE username = ?1",
        table.key_column, table.name
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![username], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
    })?;

    let mut docs = HashMap::new();
    for row in rows {
        let (key, text) = row?;
        let doc = decode(table.name, &key, &text)?;
        docs.insert(key, doc);
    }
    Ok(docs)
}

/// Returns true if a row was removed.
pub(crate) fn delete(
    conn: &Connection,
    table: &DocumentTable,
    username: &str,
    key: &str,
) -> Result<bool, StoreError> {
    let sql = format!(
        "DELETE FROM {} WHERE username = ?1 AND {} = ?2",
        table.name, table.key_column
    );
    Ok(conn.execute(&sql, params![username, key])? > 0)
}

pub(crate) fn delete_all(
    conn: &Connection,
    table: &DocumentTable,
    username: &str,
) -> Result<usize, StoreError> {
    let sql = format!("DELETE FROM {} WHERE username = ?1", table.name);
    Ok(conn.execute(&sql, params![username])?)
}
