// ABOUTME: Skip config repository: per-episode intro/outro markers keyed by (source, episode id).
// ABOUTME: The two key parts live in separate columns so no separator can make two keys collide.

use std::collections::HashMap;

use playvault_core::{SkipConfig, SkipKey};
use rusqlite::{OptionalExtension, params};

use crate::documents::{decode, encode, now_secs};
use crate::error::StoreError;
use crate::storage::Storage;

const TABLE: &str = "skip_configs";

impl Storage {
    /// Skip markers for one episode of one source.
    pub async fn get_skip_config(
        &self,
        username: &str,
        source: &str,
        episode_id: &str,
    ) -> Result<Option<SkipConfig>, StoreError> {
        let username = username.to_string();
        let key = SkipKey::new(source, episode_id);
        self.run("get_skip_config", move |conn| {
            let text: Option<String> = conn
                .query_row(
                    "SELECT data FROM skip_configs
                     WHERE username = ?1 AND source = ?2 AND episode_id = ?3",
                    params![username, key.source, key.episode_id],
                    |row| row.get(0),
                )
                .optional()?;
            text.map(|t| decode(TABLE, &key.to_string(), &t)).transpose()
        })
        .await
    }

    /// Insert or replace the skip markers for `(source, episode_id)`.
    pub async fn set_skip_config(
        &self,
        username: &str,
        source: &str,
        episode_id: &str,
        config: &SkipConfig,
    ) -> Result<(), StoreError> {
        let username = username.to_string();
        let key = SkipKey::new(source, episode_id);
        let config = config.clone();
        self.run("set_skip_config", move |conn| {
            conn.execute(
                "INSERT INTO skip_configs (username, source, episode_id, data, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(username, source, episode_id) DO UPDATE SET
                    data = excluded.data,
                    updated_at = excluded.updated_at",
                params![username, key.source, key.episode_id, encode(&config)?, now_secs()],
            )?;
            Ok(())
        })
        .await
    }

    /// All of a user's skip markers keyed by source and episode.
    pub async fn get_all_skip_configs(
        &self,
        username: &str,
    ) -> Result<HashMap<SkipKey, SkipConfig>, StoreError> {
        let username = username.to_string();
        self.run("get_all_skip_configs", move |conn| {
            let mut stmt = conn.prepare(
                "SELECT source, episode_id, data FROM skip_configs WHERE username = ?1",
            )?;
            let rows = stmt.query_map(params![username], |row| {
                Ok((
                    SkipKey::new(row.get::<_, String>(0)?, row.get::<_, String>(1)?),
                    row.get::<_, String>(2)?,
                ))
            })?;

            let mut configs = HashMap::new();
            for row in rows {
                let (key, text) = row?;
                let config = decode(TABLE, &key.to_string(), &text)?;
                configs.insert(key, config);
            }
            Ok(configs)
        })
        .await
    }

    /// Returns true if a skip config was removed.
    pub async fn delete_skip_config(
        &self,
        username: &str,
        source: &str,
        episode_id: &str,
    ) -> Result<bool, StoreError> {
        let username = username.to_string();
        let key = SkipKey::new(source, episode_id);
        self.run("delete_skip_config", move |conn| {
            let removed = conn.execute(
                "DELETE FROM skip_configs WHERE username = ?1 AND source = ?2 AND episode_id = ?3",
                params![username, key.source, key.episode_id],
            )?;
            Ok(removed > 0)
        })
        .await
    }

    /// Remove every skip config owned by `username`, returning the count.
    pub async fn delete_all_skip_configs(&self, username: &str) -> Result<usize, StoreError> {
        let username = username.to_string();
        self.run("delete_all_skip_configs", move |conn| {
            Ok(conn.execute(
                "DELETE FROM skip_configs WHERE username = ?1",
                params![username],
            )?)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::testing::{OWNER, open_temp};

    fn make_config(intro: f64) -> SkipConfig {
        SkipConfig {
            enable: true,
            intro_time: intro,
            outro_time: 90.0,
        }
    }

    #[tokio::test]
    async fn skip_config_crud() {
        let (_dir, storage) = open_temp();

        storage.set_skip_config(OWNER, "src1", "ep1", &make_config(30.0)).await.unwrap();
        assert_eq!(
            storage.get_skip_config(OWNER, "src1", "ep1").await.unwrap(),
            Some(make_config(30.0))
        );

        storage.set_skip_config(OWNER, "src1", "ep1", &make_config(45.0)).await.unwrap();
        let all = storage.get_all_skip_configs(OWNER).await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[&SkipKey::new("src1", "ep1")].intro_time, 45.0);

        assert!(storage.delete_skip_config(OWNER, "src1", "ep1").await.unwrap());
        assert_eq!(storage.get_skip_config(OWNER, "src1", "ep1").await.unwrap(), None);
    }

    #[tokio::test]
    async fn key_parts_never_collide() {
        let (_dir, storage) = open_temp();

        storage.set_skip_config(OWNER, "src1", "ep1", &make_config(10.0)).await.unwrap();
        assert_eq!(storage.get_skip_config(OWNER, "src1+ep1", "").await.unwrap(), None);
        assert_eq!(storage.get_skip_config(OWNER, "src1", "+ep1").await.unwrap(), None);

        // Both pairs render as "a+b+c" but are distinct rows
        storage.set_skip_config(OWNER, "a+b", "c", &make_config(1.0)).await.unwrap();
        storage.set_skip_config(OWNER, "a", "b+c", &make_config(2.0)).await.unwrap();

        assert_eq!(
            storage.get_skip_config(OWNER, "a+b", "c").await.unwrap().unwrap().intro_time,
            1.0
        );
        assert_eq!(
            storage.get_skip_config(OWNER, "a", "b+c").await.unwrap().unwrap().intro_time,
            2.0
        );
        assert_eq!(storage.get_all_skip_configs(OWNER).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn delete_all_clears_only_that_user() {
        let (_dir, storage) = open_temp();
        storage.register_user("dave", "pw").await.unwrap();
        storage.set_skip_config(OWNER, "s", "e", &make_config(5.0)).await.unwrap();
        storage.set_skip_config("dave", "s", "e", &make_config(6.0)).await.unwrap();

        assert_eq!(storage.delete_all_skip_configs("dave").await.unwrap(), 1);
        assert!(storage.get_all_skip_configs("dave").await.unwrap().is_empty());
        assert_eq!(storage.get_all_skip_configs(OWNER).await.unwrap().len(), 1);
    }
}
