// ABOUTME: User group (tag) repository: named sets of enabled content sources.
// ABOUTME: Groups are referenced from users by name only; replace swaps the whole collection.

use playvault_core::UserGroup;
use rusqlite::{Connection, TransactionBehavior, params};

use crate::documents::encode;
use crate::error::StoreError;
use crate::storage::Storage;
use crate::users::decode_set;

impl Storage {
    /// All groups in the order they were last written.
    pub async fn list_user_groups(&self) -> Result<Vec<UserGroup>, StoreError> {
        self.run("list_user_groups", |conn| list_user_groups(conn)).await
    }

    /// Replace the group collection. Duplicate names in `groups` keep the last entry.
    pub async fn replace_user_groups(&self, groups: &[UserGroup]) -> Result<(), StoreError> {
        let groups = groups.to_vec();
        self.run("replace_user_groups", move |conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            replace_user_groups(&tx, &groups)?;
            tx.commit()?;
            Ok(())
        })
        .await
    }
}

pub(crate) fn list_user_groups(conn: &Connection) -> Result<Vec<UserGroup>, StoreError> {
    let mut stmt =
        conn.prepare("SELECT name, enabled_apis FROM user_groups ORDER BY sort_order, name")?;
    let rows = stmt.query_map([], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, Option<String>>(1)?))
    })?;

    let mut groups = Vec::new();
    for row in rows {
        let (name, raw) = row?;
        let enabled_apis = decode_set("enabled_apis", &name, raw).unwrap_or_default();
        groups.push(UserGroup { name, enabled_apis });
    }
    Ok(groups)
}

pub(crate) fn replace_user_groups(conn: &Connection, groups: &[UserGroup]) -> Result<(), StoreError> {
    conn.execute("DELETE FROM user_groups", [])?;

    let mut stmt = conn.prepare(
        "INSERT OR REPLACE INTO user_groups (name, enabled_apis, sort_order) VALUES (?1, ?2, ?3)",
    )?;
    for (order, group) in groups.iter().enumerate() {
        stmt.execute(params![group.name, encode(&group.enabled_apis)?, order as i64])?;
    }
    Ok(())
}
