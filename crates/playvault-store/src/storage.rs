// ABOUTME: Connection manager: opens the store file once, applies pragmas and schema, seeds the owner.
// ABOUTME: Hands out a cloneable Storage handle whose operations run off the async runtime with retries.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use playvault_core::SiteConfig;
use rusqlite::{Connection, TransactionBehavior};
use tracing::{error, info, warn};

use crate::config::StoreConfig;
use crate::error::StoreError;
use crate::retry::{RetryPolicy, with_retry};
use crate::{schema, users};

/// Handle to the store. Cloning is cheap and every clone shares the same
/// connection, so the composition root opens it once and passes it around.
#[derive(Clone)]
pub struct Storage {
    inner: Arc<Inner>,
}

struct Inner {
    conn: Mutex<Connection>,
    retry: RetryPolicy,
    path: PathBuf,
    site_defaults: SiteConfig,
}

impl Storage {
    /// Open (or create) the store described by `config`.
    ///
    /// Creates the data directory if missing, enables WAL and foreign keys,
    /// applies the schema, and seeds the owner account when the store has no
    /// users yet. Failures here are not retried.
    pub fn open(config: &StoreConfig) -> Result<Self, StoreError> {
        fs::create_dir_all(&config.data_dir).map_err(|source| StoreError::CreateDir {
            path: config.data_dir.clone(),
            source,
        })?;

        let path = config.db_path();
        let fresh = !path.exists();

        let conn = Connection::open(&path).map_err(|source| StoreError::Open {
            path: path.clone(),
            source,
        })?;

        bootstrap(&conn, config, fresh).map_err(|err| match err {
            StoreError::Sqlite(source)
            | StoreError::Contention { source, .. }
            | StoreError::Constraint(source) => StoreError::Open {
                path: path.clone(),
                source,
            },
            other => other,
        })?;

        info!("opened store at {} (new: {})", path.display(), fresh);

        Ok(Self {
            inner: Arc::new(Inner {
                conn: Mutex::new(conn),
                retry: config.retry,
                path,
                site_defaults: config.site_defaults.clone(),
            }),
        })
    }

    /// Path of the backing store file.
    pub fn path(&self) -> &Path {
        &self.inner.path
    }

    pub(crate) fn site_defaults(&self) -> &SiteConfig {
        &self.inner.site_defaults
    }

    /// Run `op` against the shared connection on the blocking pool, retrying
    /// on contention per the configured policy.
    pub(crate) async fn run<T, F>(&self, operation_name: &'static str, op: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: Fn(&mut Connection) -> Result<T, StoreError> + Send + Sync + 'static,
    {
        let op = Arc::new(op);
        with_retry(&self.inner.retry, operation_name, || {
            let op = Arc::clone(&op);
            let inner = Arc::clone(&self.inner);
            async move {
                tokio::task::spawn_blocking(move || {
                    let mut conn = inner.conn.lock().unwrap_or_else(PoisonError::into_inner);
                    op(&mut conn)
                })
                .await?
            }
        })
        .await
    }

    /// Returns true if the store answers a trivial query.
    pub async fn health_check(&self) -> bool {
        let result = self
            .run("health_check", |conn| {
                Ok(conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?)
            })
            .await;

        match result {
            Ok(_) => true,
            Err(e) => {
                error!("store health check failed: {}", e);
                false
            }
        }
    }

    /// Delete every row from every table in a single transaction.
    pub async fn clear_all_data(&self) -> Result<(), StoreError> {
        self.run("clear_all_data", |conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            for table in schema::TABLES.iter().rev() {
                tx.execute(&format!("DELETE FROM {table}"), [])?;
            }
            tx.commit()?;
            Ok(())
        })
        .await?;

        warn!("cleared all data from store at {}", self.path().display());
        Ok(())
    }
}

fn bootstrap(conn: &Connection, config: &StoreConfig, fresh: bool) -> Result<(), StoreError> {
    conn.busy_timeout(config.busy_timeout)?;
    conn.execute_batch("PRAGMA journal_mode=WAL;")?;
    conn.execute_batch("PRAGMA foreign_keys=ON;")?;
    schema::apply(conn)?;

    if fresh {
        info!("initialized schema for new store");
    }

    // An existing file with no accounts (pre-created empty, or a first open
    // that failed after creating it) is seeded like a new one
    let user_count: i64 = conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
    if user_count == 0 {
        match &config.owner {
            Some(owner) => {
                users::seed_owner(conn, &owner.username, &owner.password)?;
                info!("seeded owner account '{}'", owner.username);
            }
            None => warn!("store has no users and no owner credentials were supplied"),
        }
    }

    Ok(())
}


#[cfg(test)]
mod tests {
    use playvault_core::Role;
    use tempfile::TempDir;

    use super::testing::{OWNER, OWNER_PASSWORD, open_temp};
    use super::*;

    #[tokio::test]
    async fn open_creates_directory_and_seeds_owner() {
        let dir = TempDir::new().unwrap();
        let data_dir = dir.path().join("nested").join("data");
        let config = StoreConfig::new(&data_dir).with_owner("root", "pw");

        let storage = Storage::open(&config).unwrap();

        assert!(data_dir.join("playvault.db").exists());
        assert_eq!(storage.path(), data_dir.join("playvault.db"));
        let owner = storage.get_user("root").await.unwrap().expect("owner should exist");
        assert_eq!(owner.role, Role::Owner);
        assert!(storage.verify_user("root", "pw").await.unwrap());
    }

    #[tokio::test]
    async fn reopen_does_not_reseed_owner() {
        let dir = TempDir::new().unwrap();
        let data_dir = dir.path().join("data");

        let first = Storage::open(&StoreConfig::new(&data_dir).with_owner("root", "pw")).unwrap();
        first.change_password("root", "changed").await.unwrap();
        drop(first);

        // Different bootstrap credentials on an existing store are ignored
        let second = Storage::open(&StoreConfig::new(&data_dir).with_owner("other", "x")).unwrap();
        assert!(second.verify_user("root", "changed").await.unwrap());
        assert!(!second.user_exists("other").await.unwrap());
    }

    #[tokio::test]
    async fn pre_created_empty_file_still_gets_owner() {
        let dir = TempDir::new().unwrap();
        let data_dir = dir.path().join("data");
        fs::create_dir_all(&data_dir).unwrap();
        fs::write(data_dir.join("playvault.db"), b"").unwrap();

        let storage = Storage::open(&StoreConfig::new(&data_dir).with_owner("root", "pw")).unwrap();

        let owner = storage.get_user("root").await.unwrap().expect("owner should exist");
        assert_eq!(owner.role, Role::Owner);
        assert!(storage.verify_user("root", "pw").await.unwrap());
    }

    #[tokio::test]
    async fn owner_is_seeded_once_credentials_arrive() {
        let dir = TempDir::new().unwrap();
        let data_dir = dir.path().join("data");

        let bare = Storage::open(&StoreConfig::new(&data_dir)).unwrap();
        assert_eq!(bare.user_count().await.unwrap(), 0);
        drop(bare);

        let seeded = Storage::open(&StoreConfig::new(&data_dir).with_owner("root", "pw")).unwrap();
        assert_eq!(seeded.user_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn open_without_owner_leaves_users_empty() {
        let dir = TempDir::new().unwrap();
        let storage = Storage::open(&StoreConfig::new(dir.path())).unwrap();
        assert_eq!(storage.user_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn open_fails_when_data_dir_is_a_file() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("not-a-dir");
        fs::write(&blocker, b"x").unwrap();

        let result = Storage::open(&StoreConfig::new(&blocker));
        assert!(matches!(result, Err(StoreError::CreateDir { .. })));
    }

    #[tokio::test]
    async fn pragmas_are_enabled() {
        let (_dir, storage) = open_temp();
        let (journal, fks) = storage
            .run("pragmas", |conn| {
                let journal: String = conn.query_row("PRAGMA journal_mode", [], |r| r.get(0))?;
                let fks: i64 = conn.query_row("PRAGMA foreign_keys", [], |r| r.get(0))?;
                Ok((journal, fks))
            })
            .await
            .unwrap();
        assert_eq!(journal.to_lowercase(), "wal");
        assert_eq!(fks, 1);
    }

    #[tokio::test]
    async fn clones_share_one_connection() {
        let (_dir, storage) = open_temp();
        let other = storage.clone();
        other.register_user("carol", "pw").await.unwrap();
        assert!(storage.user_exists("carol").await.unwrap());
    }

    #[tokio::test]
    async fn health_check_and_clear_all() {
        let (_dir, storage) = open_temp();
        assert!(storage.health_check().await);

        storage.add_search_history(OWNER, "matrix").await.unwrap();
        storage.clear_all_data().await.unwrap();

        assert_eq!(storage.user_count().await.unwrap(), 0);
        assert!(!storage.verify_user(OWNER, OWNER_PASSWORD).await.unwrap());
    }
}
