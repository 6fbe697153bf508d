// ABOUTME: Favorites repository: per-user starred titles keyed by favorite key.
// ABOUTME: Same upsert and fail-fast decode semantics as play records.

use std::collections::HashMap;

use playvault_core::Favorite;

use crate::documents::{self, FAVORITES};
use crate::error::StoreError;
use crate::storage::Storage;

impl Storage {
    /// Fetch one favorite. Absent rows return `Ok(None)`.
    pub async fn get_favorite(
        &self,
        username: &str,
        key: &str,
    ) -> Result<Option<Favorite>, StoreError> {
        let (username, key) = (username.to_string(), key.to_string());
        self.run("get_favorite", move |conn| {
            documents::get(conn, &FAVORITES, &username, &key)
        })
        .await
    }

    /// Insert or replace the favorite at `(username, key)`.
    pub async fn set_favorite(
        &self,
        username: &str,
        key: &str,
        favorite: &Favorite,
    ) -> Result<(), StoreError> {
        let (username, key, favorite) = (username.to_string(), key.to_string(), favorite.clone());
        self.run("set_favorite", move |conn| {
            documents::set(conn, &FAVORITES, &username, &key, &favorite)
        })
        .await
    }

    /// All of a user's favorites keyed by favorite key.
    pub async fn get_all_favorites(
        &self,
        username: &str,
    ) -> Result<HashMap<String, Favorite>, StoreError> {
        let username = username.to_string();
        self.run("get_all_favorites", move |conn| {
            documents::all(conn, &FAVORITES, &username)
        })
        .await
    }

    /// Returns true if a favorite was removed.
    pub async fn delete_favorite(&self, username: &str, key: &str) -> Result<bool, StoreError> {
        let (username, key) = (username.to_string(), key.to_string());
        self.run("delete_favorite", move |conn| {
            documents::delete(conn, &FAVORITES, &username, &key)
        })
        .await
    }

    /// Remove every favorite owned by `username`, returning the count.
    pub async fn delete_all_favorites(&self, username: &str) -> Result<usize, StoreError> {
        let username = username.to_string();
        self.run("delete_all_favorites", move |conn| {
            documents::delete_all(conn, &FAVORITES, &username)
        })
        .await
    }
}
