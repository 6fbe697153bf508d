// ABOUTME: Search history repository: bounded, newest-first keyword list per user.
// ABOUTME: Re-adding a keyword bumps it to the front; the cap is enforced inside the same transaction as the insert.

use rusqlite::{Connection, TransactionBehavior, params};

use crate::documents::now_secs;
use crate::error::StoreError;
use crate::storage::Storage;

/// Maximum number of keywords retained per user.
pub const SEARCH_HISTORY_LIMIT: i64 = 20;

impl Storage {
    /// Keywords for `username`, newest first, at most `SEARCH_HISTORY_LIMIT`.
    pub async fn get_search_history(&self, username: &str) -> Result<Vec<String>, StoreError> {
        let username = username.to_string();
        self.run("get_search_history", move |conn| history(conn, &username))
            .await
    }

    /// Record a search. Runs delete, insert and trim as one transaction.
    pub async fn add_search_history(&self, username: &str, keyword: &str) -> Result<(), StoreError> {
        let (username, keyword) = (username.to_string(), keyword.to_string());
        self.run("add_search_history", move |conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

            tx.execute(
                "DELETE FROM search_history WHERE username = ?1 AND keyword = ?2",
                params![username, keyword],
            )?;
            tx.execute(
                "INSERT INTO search_history (username, keyword, created_at) VALUES (?1, ?2, ?3)",
                params![username, keyword, now_secs()],
            )?;
            // Ties on created_at (same second) are broken by insertion order
            tx.execute(
                "DELETE FROM search_history
                 WHERE username = ?1 AND id NOT IN (
                    SELECT id FROM search_history
                    WHERE username = ?1
                    ORDER BY created_at DESC, id DESC
                    LIMIT ?2
                 )",
                params![username, SEARCH_HISTORY_LIMIT],
            )?;

            tx.commit()?;
            Ok(())
        })
        .await
    }

    /// Remove one keyword, or the user's whole history when `keyword` is `None`.
    pub async fn delete_search_history(
        &self,
        username: &str,
        keyword: Option<&str>,
    ) -> Result<usize, StoreError> {
        let username = username.to_string();
        let keyword = keyword.map(str::to_string);
        self.run("delete_search_history", move |conn| {
            let removed = match &keyword {
                Some(k) => conn.execute(
                    "DELETE FROM search_history WHERE username = ?1 AND keyword = ?2",
                    params![username, k],
                )?,
                None => conn.execute(
                    "DELETE FROM search_history WHERE username = ?1",
                    params![username],
                )?,
            };
            Ok(removed)
        })
        .await
    }
}

fn history(conn: &Connection, username: &str) -> Result<Vec<String>, StoreError> {
    let mut stmt = conn.prepare(
        "SELECT keyword FROM search_history
         WHERE username = ?1
         ORDER BY created_at DESC, id DESC
         LIMIT ?2",
    )?;
    let rows = stmt.query_map(params![username, SEARCH_HISTORY_LIMIT], |row| row.get(0))?;

    let mut keywords = Vec::new();
    for row in rows {
        keywords.push(row?);
    }
    Ok(keywords)
}
