// ABOUTME: Play record repository: per-user playback progress keyed by record key.
// ABOUTME: Set is an upsert; stored documents that fail to decode are reported as corrupt.

use std::collections::HashMap;

use playvault_core::PlayRecord;

use crate::documents::{self, PLAY_RECORDS};
use crate::error::StoreError;
use crate::storage::Storage;

impl Storage {
    /// Fetch one play record. Absent rows return `Ok(None)`.
    pub async fn get_play_record(
        &self,
        username: &str,
        key: &str,
    ) -> Result<Option<PlayRecord>, StoreError> {
        let (username, key) = (username.to_string(), key.to_string());
        self.run("get_play_record", move |conn| {
            documents::get(conn, &PLAY_RECORDS, &username, &key)
        })
        .await
    }

    /// Insert or replace the play record at `(username, key)`. Fails with a
    /// constraint error if the user does not exist.
    pub async fn set_play_record(
        &self,
        username: &str,
        key: &str,
        record: &PlayRecord,
    ) -> Result<(), StoreError> {
        let (username, key, record) = (username.to_string(), key.to_string(), record.clone());
        self.run("set_play_record", move |conn| {
            documents::set(conn, &PLAY_RECORDS, &username, &key, &record)
        })
        .await
    }

    /// All play records of a user, keyed by record key.
    pub async fn get_all_play_records(
        &self,
        username: &str,
    ) -> Result<HashMap<String, PlayRecord>, StoreError> {
        let username = username.to_string();
        self.run("get_all_play_records", move |conn| {
            documents::all(conn, &PLAY_RECORDS, &username)
        })
        .await
    }

    /// Returns true if a record was removed.
    pub async fn delete_play_record(&self, username: &str, key: &str) -> Result<bool, StoreError> {
        let (username, key) = (username.to_string(), key.to_string());
        self.run("delete_play_record", move |conn| {
            documents::delete(conn, &PLAY_RECORDS, &username, &key)
        })
        .await
    }

    pub async fn delete_all_play_records(&self, username: &str) -> Result<usize, StoreError> {
        let username = username.to_string();
        self.run("delete_all_play_records", move |conn| {
            documents::delete_all(conn, &PLAY_RECORDS, &username)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use rusqlite::params;

    use super::*;
    use crate::storage::testing::{OWNER, open_temp};

    fn make_record(title: &str, index: u32) -> PlayRecord {
        PlayRecord {
            title: title.to_string(),
            source_name: "Source A".to_string(),
            cover: "https://img.example/cover.jpg".to_string(),
            year: "2023".to_string(),
            index,
            total_episodes: 24,
            play_time: 600,
            total_time: 1440,
            save_time: 1_700_000_000_000,
            search_title: title.to_lowercase(),
        }
    }

    #[tokio::test]
    async fn set_then_get_returns_same_document() {
        let (_dir, storage) = open_temp();
        let record = make_record("Show", 3);

        storage.set_play_record(OWNER, "src+101", &record).await.unwrap();

        let loaded = storage.get_play_record(OWNER, "src+101").await.unwrap();
        assert_eq!(loaded, Some(record));
    }

    #[tokio::test]
    async fn set_is_upsert() {
        let (_dir, storage) = open_temp();
        storage.set_play_record(OWNER, "k", &make_record("Show", 1)).await.unwrap();
        storage.set_play_record(OWNER, "k", &make_record("Show", 7)).await.unwrap();

        let all = storage.get_all_play_records(OWNER).await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all["k"].index, 7);
    }

    #[tokio::test]
    async fn delete_then_get_is_absent() {
        let (_dir, storage) = open_temp();
        storage.set_play_record(OWNER, "k", &make_record("Show", 1)).await.unwrap();

        assert!(storage.delete_play_record(OWNER, "k").await.unwrap());
        assert!(!storage.delete_play_record(OWNER, "k").await.unwrap());
        assert_eq!(storage.get_play_record(OWNER, "k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn records_are_scoped_per_user() {
        let (_dir, storage) = open_temp();
        storage.register_user("alice", "pw").await.unwrap();
        storage.set_play_record(OWNER, "k", &make_record("Mine", 1)).await.unwrap();
        storage.set_play_record("alice", "k", &make_record("Hers", 2)).await.unwrap();

        assert_eq!(storage.get_play_record(OWNER, "k").await.unwrap().unwrap().title, "Mine");
        assert_eq!(storage.get_play_record("alice", "k").await.unwrap().unwrap().title, "Hers");

        assert_eq!(storage.delete_all_play_records("alice").await.unwrap(), 1);
        assert!(storage.get_all_play_records("alice").await.unwrap().is_empty());
        assert_eq!(storage.get_all_play_records(OWNER).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn set_for_unknown_user_is_constraint_error() {
        let (_dir, storage) = open_temp();
        let err = storage
            .set_play_record("ghost", "k", &make_record("Show", 1))
            .await
            .unwrap_err();
        assert!(err.is_constraint(), "expected constraint error, got {:?}", err);
    }

    #[tokio::test]
    async fn corrupt_row_is_an_error_not_absent() {
        let (_dir, storage) = open_temp();
        storage
            .run("corrupt", |conn| {
                conn.execute(
                    "INSERT INTO play_records (username, record_key, data, updated_at)
                     VALUES (?1, 'bad', '{not json', 0)",
                    params![OWNER],
                )?;
                Ok(())
            })
            .await
            .unwrap();

        let err = storage.get_play_record(OWNER, "bad").await.unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { table: "play_records", .. }));
        assert!(storage.get_all_play_records(OWNER).await.is_err());
    }
}
