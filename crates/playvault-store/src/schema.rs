// ABOUTME: Table and index definitions for the store, applied idempotently on every open.
// ABOUTME: Per-user tables reference users(username) with ON DELETE CASCADE.

use rusqlite::Connection;

/// Every table in dependency order (parents first).
pub const TABLES: &[&str] = &[
    "users",
    "play_records",
    "favorites",
    "search_history",
    "skip_configs",
    "user_groups",
    "content_sources",
    "live_sources",
    "categories",
    "admin_settings",
];

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS users (
    username TEXT PRIMARY KEY,
    password TEXT NOT NULL,
    role TEXT NOT NULL DEFAULT 'user' CHECK (role IN ('user', 'admin', 'owner')),
    banned INTEGER NOT NULL DEFAULT 0,
    tags TEXT,
    enabled_apis TEXT,
    created_at INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS play_records (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    username TEXT NOT NULL REFERENCES users(username) ON DELETE CASCADE,
    record_key TEXT NOT NULL,
    data TEXT NOT NULL,
    updated_at INTEGER NOT NULL,
    UNIQUE (username, record_key)
);

CREATE TABLE IF NOT EXISTS favorites (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    username TEXT NOT NULL REFERENCES users(username) ON DELETE CASCADE,
    favorite_key TEXT NOT NULL,
    data TEXT NOT NULL,
    updated_at INTEGER NOT NULL,
    UNIQUE (username, favorite_key)
);

CREATE TABLE IF NOT EXISTS search_history (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    username TEXT NOT NULL REFERENCES users(username) ON DELETE CASCADE,
    keyword TEXT NOT NULL,
    created_at INTEGER NOT NULL,
    UNIQUE (username, keyword)
);

CREATE TABLE IF NOT EXISTS skip_configs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    username TEXT NOT NULL REFERENCES users(username) ON DELETE CASCADE,
    source TEXT NOT NULL,
    episode_id TEXT NOT NULL,
    data TEXT NOT NULL,
    updated_at INTEGER NOT NULL,
    UNIQUE (username, source, episode_id)
);

CREATE TABLE IF NOT EXISTS user_groups (
    name TEXT PRIMARY KEY,
    enabled_apis TEXT NOT NULL,
    sort_order INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS content_sources (
    source_key TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    api TEXT NOT NULL,
    detail TEXT,
    origin TEXT NOT NULL DEFAULT 'config' CHECK (origin IN ('config', 'custom')),
    disabled INTEGER NOT NULL DEFAULT 0,
    sort_order INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS live_sources (
    source_key TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    url TEXT NOT NULL,
    ua TEXT,
    epg TEXT,
    origin TEXT NOT NULL DEFAULT 'config' CHECK (origin IN ('config', 'custom')),
    channel_number INTEGER,
    disabled INTEGER NOT NULL DEFAULT 0,
    sort_order INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS categories (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT,
    kind TEXT NOT NULL CHECK (kind IN ('movie', 'tv')),
    query TEXT NOT NULL,
    origin TEXT NOT NULL DEFAULT 'config' CHECK (origin IN ('config', 'custom')),
    disabled INTEGER NOT NULL DEFAULT 0,
    sort_order INTEGER NOT NULL DEFAULT 0,
    UNIQUE (query, kind)
);

CREATE TABLE IF NOT EXISTS admin_settings (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    updated_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_play_records_username ON play_records(username);
CREATE INDEX IF NOT EXISTS idx_favorites_username ON favorites(username);
CREATE INDEX IF NOT EXISTS idx_search_history_username_created
    ON search_history(username, created_at DESC);
CREATE INDEX IF NOT EXISTS idx_skip_configs_username ON skip_configs(username);
";

/// Create all tables and indexes. Safe to run against an existing store.
pub fn apply(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA)
}
