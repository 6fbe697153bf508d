// ABOUTME: User repository: registration, password verification, role/ban/tag administration and deletion.
// ABOUTME: Deleting a user cascades to every per-user table; tag and source sets decode tolerantly.

use playvault_core::{Role, StoredUser, UserRecord};
use rusqlite::{Connection, OptionalExtension, TransactionBehavior, params};
use tracing::{info, warn};

use crate::documents::{encode, now_secs};
use crate::error::StoreError;
use crate::password::{hash_password, is_legacy, verify_password};
use crate::storage::Storage;

impl Storage {
    /// Create a `user` role account. A taken username fails with a
    /// constraint error and leaves the existing row untouched.
    pub async fn register_user(&self, username: &str, password: &str) -> Result<(), StoreError> {
        let username = username.to_string();
        let secret = hash_off_runtime(password).await?;
        self.run("register_user", move |conn| {
            insert_user(conn, &username, &secret, Role::User)
        })
        .await
    }

    /// Check a password. Unknown users verify as false.
    ///
    /// Secrets stored before hashing was introduced are compared verbatim and
    /// rewritten as argon2id hashes on the first successful match. Hashing
    /// runs outside the connection lock.
    pub async fn verify_user(&self, username: &str, password: &str) -> Result<bool, StoreError> {
        let owned = username.to_string();
        let stored: Option<String> = self
            .run("verify_user", move |conn| {
                Ok(conn
                    .query_row(
                        "SELECT password FROM users WHERE username = ?1",
                        params![owned],
                        |row| row.get(0),
                    )
                    .optional()?)
            })
            .await?;

        let Some(stored) = stored else {
            return Ok(false);
        };

        let (candidate, secret) = (password.to_string(), stored.clone());
        let matched =
            tokio::task::spawn_blocking(move || verify_password(&candidate, &secret)).await?;
        if !matched {
            return Ok(false);
        }

        if is_legacy(&stored) {
            let upgraded = hash_off_runtime(password).await?;
            let owned = username.to_string();
            // Only replace the exact legacy value that was verified
            let replaced = self
                .run("upgrade_password", move |conn| {
                    Ok(conn.execute(
                        "UPDATE users SET password = ?1 WHERE username = ?2 AND password = ?3",
                        params![upgraded, owned, stored],
                    )?)
                })
                .await?;
            if replaced > 0 {
                info!("upgraded legacy password storage for user '{}'", username);
            }
        }
        Ok(true)
    }

    pub async fn user_exists(&self, username: &str) -> Result<bool, StoreError> {
        let username = username.to_string();
        self.run("user_exists", move |conn| {
            let found: Option<i64> = conn
                .query_row(
                    "SELECT 1 FROM users WHERE username = ?1",
                    params![username],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(found.is_some())
        })
        .await
    }

    /// Returns false if the user does not exist.
    pub async fn change_password(&self, username: &str, new_password: &str) -> Result<bool, StoreError> {
        let username = username.to_string();
        let secret = hash_off_runtime(new_password).await?;
        self.run("change_password", move |conn| {
            let updated = conn.execute(
                "UPDATE users SET password = ?1 WHERE username = ?2",
                params![secret, username],
            )?;
            Ok(updated > 0)
        })
        .await
    }

    /// Delete a user and, through the foreign keys, all of their play
    /// records, favorites, search history and skip configs.
    pub async fn delete_user(&self, username: &str) -> Result<bool, StoreError> {
        let username = username.to_string();
        self.run("delete_user", move |conn| {
            let removed = conn.execute("DELETE FROM users WHERE username = ?1", params![username])?;
            if removed > 0 {
                info!("deleted user '{}' and owned rows", username);
            }
            Ok(removed > 0)
        })
        .await
    }

    /// Every user in creation order. Secrets are included only when asked for.
    pub async fn list_users(&self, include_secret: bool) -> Result<Vec<StoredUser>, StoreError> {
        self.run("list_users", move |conn| list_users(conn, include_secret))
            .await
    }

    pub async fn get_user(&self, username: &str) -> Result<Option<UserRecord>, StoreError> {
        let username = username.to_string();
        self.run("get_user", move |conn| {
            let row = conn
                .query_row(
                    "SELECT username, password, role, banned, tags, enabled_apis
                     FROM users WHERE username = ?1",
                    params![username],
                    UserRow::from_row,
                )
                .optional()?;
            row.map(|r| r.into_stored(false).map(|s| s.user)).transpose()
        })
        .await
    }

    pub async fn user_count(&self) -> Result<i64, StoreError> {
        self.run("user_count", |conn| {
            Ok(conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?)
        })
        .await
    }

    /// Update role, ban flag, tags and enabled sources of existing users.
    /// Usernames with no matching row are skipped; nothing is inserted.
    /// Returns the number of users updated.
    pub async fn replace_users(&self, users: &[UserRecord]) -> Result<usize, StoreError> {
        let users = users.to_vec();
        self.run("replace_users", move |conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let updated = replace_users(&tx, &users)?;
            tx.commit()?;
            Ok(updated)
        })
        .await
    }

    pub async fn set_user_role(&self, username: &str, role: Role) -> Result<bool, StoreError> {
        let username = username.to_string();
        self.run("set_user_role", move |conn| {
            let updated = conn.execute(
                "UPDATE users SET role = ?1 WHERE username = ?2",
                params![role.as_str(), username],
            )?;
            Ok(updated > 0)
        })
        .await
    }

    pub async fn set_user_banned(&self, username: &str, banned: bool) -> Result<bool, StoreError> {
        let username = username.to_string();
        self.run("set_user_banned", move |conn| {
            let updated = conn.execute(
                "UPDATE users SET banned = ?1 WHERE username = ?2",
                params![banned, username],
            )?;
            Ok(updated > 0)
        })
        .await
    }

    /// Insert or overwrite a user including its already-stored secret, as
    /// produced by `list_users(true)`.
    pub async fn restore_user(&self, user: &StoredUser) -> Result<(), StoreError> {
        let secret = user
            .password
            .clone()
            .ok_or_else(|| StoreError::MissingSecret(user.user.username.clone()))?;
        let record = user.user.clone();
        self.run("restore_user", move |conn| {
            conn.execute(
                "INSERT INTO users (username, password, role, banned, tags, enabled_apis, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                 ON CONFLICT(username) DO UPDATE SET
                    password = excluded.password,
                    role = excluded.role,
                    banned = excluded.banned,
                    tags = excluded.tags,
                    enabled_apis = excluded.enabled_apis",
                params![
                    record.username,
                    secret,
                    record.role.as_str(),
                    record.banned,
                    encode_set(&record.tags)?,
                    encode_set(&record.enabled_apis)?,
                    now_secs(),
                ],
            )?;
            Ok(())
        })
        .await
    }
}

/// Insert the bootstrap owner. Existing rows are left alone.
pub(crate) fn seed_owner(conn: &Connection, username: &str, password: &str) -> Result<(), StoreError> {
    conn.execute(
        "INSERT OR IGNORE INTO users (username, password, role, banned, created_at)
         VALUES (?1, ?2, ?3, 0, ?4)",
        params![username, hash_password(password)?, Role::Owner.as_str(), now_secs()],
    )?;
    Ok(())
}

async fn hash_off_runtime(password: &str) -> Result<String, StoreError> {
    let password = password.to_string();
    tokio::task::spawn_blocking(move || hash_password(&password)).await?
}

fn insert_user(conn: &Connection, username: &str, secret: &str, role: Role) -> Result<(), StoreError> {
    conn.execute(
        "INSERT INTO users (username, password, role, banned, created_at)
         VALUES (?1, ?2, ?3, 0, ?4)",
        params![username, secret, role.as_str(), now_secs()],
    )?;
    Ok(())
}

pub(crate) fn list_users(conn: &Connection, include_secret: bool) -> Result<Vec<StoredUser>, StoreError> {
    let mut stmt = conn.prepare(
        "SELECT username, password, role, banned, tags, enabled_apis
         FROM users ORDER BY created_at ASC, rowid ASC",
    )?;
    let rows = stmt.query_map([], UserRow::from_row)?;

    let mut users = Vec::new();
    for row in rows {
        users.push(row?.into_stored(include_secret)?);
    }
    Ok(users)
}

pub(crate) fn replace_users(conn: &Connection, users: &[UserRecord]) -> Result<usize, StoreError> {
    let mut stmt = conn.prepare(
        "UPDATE users SET role = ?1, banned = ?2, tags = ?3, enabled_apis = ?4
         WHERE username = ?5",
    )?;

    let mut updated = 0;
    for user in users {
        updated += stmt.execute(params![
            user.role.as_str(),
            user.banned,
            encode_set(&user.tags)?,
            encode_set(&user.enabled_apis)?,
            user.username,
        ])?;
    }
    Ok(updated)
}

fn encode_set(set: &Option<Vec<String>>) -> Result<Option<String>, StoreError> {
    set.as_ref().map(encode).transpose()
}

/// Decode a JSON string list. Malformed values are logged and read as an
/// empty set rather than failing the whole listing.
pub(crate) fn decode_set(column: &str, owner: &str, raw: Option<String>) -> Option<Vec<String>> {
    let raw = raw?;
    match serde_json::from_str(&raw) {
        Ok(set) => Some(set),
        Err(e) => {
            warn!("unreadable {} for '{}', treating as empty: {}", column, owner, e);
            Some(Vec::new())
        }
    }
}

struct UserRow {
    username: String,
    password: String,
    role: String,
    banned: bool,
    tags: Option<String>,
    enabled_apis: Option<String>,
}

impl UserRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            username: row.get(0)?,
            password: row.get(1)?,
            role: row.get(2)?,
            banned: row.get(3)?,
            tags: row.get(4)?,
            enabled_apis: row.get(5)?,
        })
    }

    fn into_stored(self, include_secret: bool) -> Result<StoredUser, StoreError> {
        let tags = decode_set("tags", &self.username, self.tags);
        let enabled_apis = decode_set("enabled_apis", &self.username, self.enabled_apis);
        Ok(StoredUser {
            user: UserRecord {
                role: self.role.parse()?,
                banned: self.banned,
                tags,
                enabled_apis,
                username: self.username,
            },
            password: include_secret.then_some(self.password),
        })
    }
}

#[cfg(test)]
mod tests {
    use playvault_core::{Favorite, PlayRecord, SkipConfig};

    use super::*;
    use crate::storage::testing::{OWNER, OWNER_PASSWORD, open_temp};

    #[tokio::test]
    async fn register_and_verify() {
        let (_dir, storage) = open_temp();
        storage.register_user("alice", "s3cret").await.unwrap();

        assert!(storage.user_exists("alice").await.unwrap());
        assert!(storage.verify_user("alice", "s3cret").await.unwrap());
        assert!(!storage.verify_user("alice", "wrong").await.unwrap());
        assert!(!storage.verify_user("nobody", "s3cret").await.unwrap());
        assert!(storage.verify_user(OWNER, OWNER_PASSWORD).await.unwrap());

        let alice = storage.get_user("alice").await.unwrap().unwrap();
        assert_eq!(alice.role, Role::User);
        assert!(!alice.banned);
    }

    #[tokio::test]
    async fn duplicate_register_fails_and_keeps_password() {
        let (_dir, storage) = open_temp();
        storage.register_user("alice", "first").await.unwrap();

        let err = storage.register_user("alice", "second").await.unwrap_err();
        assert!(err.is_constraint(), "expected constraint error, got {:?}", err);

        assert!(storage.verify_user("alice", "first").await.unwrap());
        assert!(!storage.verify_user("alice", "second").await.unwrap());
    }

    #[tokio::test]
    async fn secrets_are_hashed_at_rest() {
        let (_dir, storage) = open_temp();
        storage.register_user("alice", "plain").await.unwrap();

        let users = storage.list_users(true).await.unwrap();
        let alice = users.iter().find(|u| u.user.username == "alice").unwrap();
        let secret = alice.password.as_deref().unwrap();
        assert_ne!(secret, "plain");
        assert!(secret.starts_with("$argon2id$"));

        let without = storage.list_users(false).await.unwrap();
        assert!(without.iter().all(|u| u.password.is_none()));
    }

    #[tokio::test]
    async fn legacy_plaintext_is_upgraded_on_verify() {
        let (_dir, storage) = open_temp();
        storage
            .run("legacy", |conn| {
                conn.execute(
                    "INSERT INTO users (username, password, role, banned, created_at)
                     VALUES ('old', 'letmein', 'user', 0, 0)",
                    [],
                )?;
                Ok(())
            })
            .await
            .unwrap();

        assert!(storage.verify_user("old", "letmein").await.unwrap());

        let stored = storage.list_users(true).await.unwrap();
        let old = stored.iter().find(|u| u.user.username == "old").unwrap();
        let upgraded = old.password.as_deref().unwrap();
        assert!(argon2::password_hash::PasswordHash::new(upgraded).is_ok());
        assert!(!is_legacy(upgraded));
        assert!(storage.verify_user("old", "letmein").await.unwrap());
    }

    #[tokio::test]
    async fn change_password_replaces_secret() {
        let (_dir, storage) = open_temp();
        storage.register_user("bob", "old").await.unwrap();

        assert!(storage.change_password("bob", "new").await.unwrap());
        assert!(!storage.verify_user("bob", "old").await.unwrap());
        assert!(storage.verify_user("bob", "new").await.unwrap());
        assert!(!storage.change_password("ghost", "x").await.unwrap());
    }

    #[tokio::test]
    async fn delete_user_cascades_to_owned_rows() {
        let (_dir, storage) = open_temp();
        storage.register_user("erin", "pw").await.unwrap();

        let record = PlayRecord {
            title: "T".to_string(),
            source_name: "S".to_string(),
            cover: String::new(),
            year: String::new(),
            index: 1,
            total_episodes: 1,
            play_time: 1,
            total_time: 2,
            save_time: 0,
            search_title: String::new(),
        };
        let favorite = Favorite {
            source_name: "S".to_string(),
            total_episodes: 1,
            title: "T".to_string(),
            year: String::new(),
            cover: String::new(),
            save_time: 0,
            search_title: String::new(),
            origin: None,
        };
        let skip = SkipConfig {
            enable: true,
            intro_time: 1.0,
            outro_time: 2.0,
        };

        storage.set_play_record("erin", "s+1", &record).await.unwrap();
        storage.set_favorite("erin", "s+1", &favorite).await.unwrap();
        storage.add_search_history("erin", "query").await.unwrap();
        storage.set_skip_config("erin", "s", "1", &skip).await.unwrap();

        assert!(storage.delete_user("erin").await.unwrap());

        assert!(!storage.user_exists("erin").await.unwrap());
        assert!(storage.get_all_play_records("erin").await.unwrap().is_empty());
        assert!(storage.get_all_favorites("erin").await.unwrap().is_empty());
        assert!(storage.get_search_history("erin").await.unwrap().is_empty());
        assert!(storage.get_all_skip_configs("erin").await.unwrap().is_empty());
        assert!(!storage.delete_user("erin").await.unwrap());
    }

    #[tokio::test]
    async fn replace_users_updates_only_existing() {
        let (_dir, storage) = open_temp();
        storage.register_user("alice", "pw").await.unwrap();

        let mut alice = UserRecord::new("alice");
        alice.role = Role::Admin;
        alice.banned = true;
        alice.tags = Some(vec!["vip".to_string()]);
        alice.enabled_apis = Some(vec!["src1".to_string(), "src2".to_string()]);

        let updated = storage
            .replace_users(&[alice.clone(), UserRecord::new("stranger")])
            .await
            .unwrap();

        assert_eq!(updated, 1);
        assert!(!storage.user_exists("stranger").await.unwrap());
        assert_eq!(storage.get_user("alice").await.unwrap(), Some(alice));
        // Password is untouched by replace
        assert!(storage.verify_user("alice", "pw").await.unwrap());
    }

    #[tokio::test]
    async fn malformed_tag_sets_read_as_empty() {
        let (_dir, storage) = open_temp();
        storage.register_user("frank", "pw").await.unwrap();
        storage
            .run("corrupt_tags", |conn| {
                conn.execute(
                    "UPDATE users SET tags = '[oops', enabled_apis = '[\"a\"]' WHERE username = 'frank'",
                    [],
                )?;
                Ok(())
            })
            .await
            .unwrap();

        let frank = storage.get_user("frank").await.unwrap().unwrap();
        assert_eq!(frank.tags, Some(Vec::new()));
        assert_eq!(frank.enabled_apis, Some(vec!["a".to_string()]));
        assert_eq!(storage.list_users(false).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn role_and_ban_mutations() {
        let (_dir, storage) = open_temp();
        storage.register_user("gina", "pw").await.unwrap();

        assert!(storage.set_user_role("gina", Role::Admin).await.unwrap());
        assert!(storage.set_user_banned("gina", true).await.unwrap());
        assert!(!storage.set_user_banned("ghost", true).await.unwrap());

        let gina = storage.get_user("gina").await.unwrap().unwrap();
        assert_eq!(gina.role, Role::Admin);
        assert!(gina.banned);
        assert_eq!(storage.user_count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn restore_round_trips_listing_with_secret() {
        let (_dir, source) = open_temp();
        source.register_user("hank", "pw").await.unwrap();
        source.set_user_role("hank", Role::Admin).await.unwrap();
        let dump = source.list_users(true).await.unwrap();

        let (_dir2, target) = open_temp();
        target.clear_all_data().await.unwrap();
        for user in &dump {
            target.restore_user(user).await.unwrap();
        }

        assert_eq!(target.list_users(true).await.unwrap(), dump);
        assert!(target.verify_user("hank", "pw").await.unwrap());

        let err = target
            .restore_user(&StoredUser {
                user: UserRecord::new("nosecret"),
                password: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::MissingSecret(_)));
    }
}
