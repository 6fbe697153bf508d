// ABOUTME: Admin config aggregator: assembles AdminConfig from the settings table and the normalized collections.
// ABOUTME: Writes decompose the config back into those tables inside a single transaction.

use playvault_core::AdminConfig;
use rusqlite::{Connection, TransactionBehavior, params};
use tracing::debug;

use crate::documents::{decode, encode, now_secs};
use crate::error::StoreError;
use crate::storage::Storage;
use crate::{groups, sources, users};

const SETTINGS_TABLE: &str = "admin_settings";

pub const CONFIG_FILE_KEY: &str = "config_file";
pub const CONFIG_SUBSCRIPTION_KEY: &str = "config_subscription";
pub const SITE_CONFIG_KEY: &str = "site_config";

impl Storage {
    /// Assemble the admin config.
    ///
    /// Starts from the deployment site defaults, overlays the recognized
    /// settings rows, then fills users, tags, sources, live sources and
    /// categories from their own tables. Any recognized settings row that
    /// fails to decode fails the whole read.
    pub async fn read_admin_config(&self) -> Result<AdminConfig, StoreError> {
        let defaults = self.site_defaults().clone();
        self.run("read_admin_config", move |conn| {
            // One read transaction so the collections come from the same snapshot
            let tx = conn.transaction()?;

            let mut config = AdminConfig::with_site(defaults.clone());
            overlay_settings(&tx, &mut config)?;

            config.users = users::list_users(&tx, false)?
                .into_iter()
                .map(|stored| stored.user)
                .collect();
            config.tags = groups::list_user_groups(&tx)?;
            config.sources = sources::list_content_sources(&tx)?;
            config.live_sources = sources::list_live_sources(&tx)?;
            config.categories = sources::list_categories(&tx)?;

            tx.commit()?;
            Ok(config)
        })
        .await
    }

    /// Persist the admin config.
    ///
    /// An empty `config_file` and a missing `config_subscription` leave their
    /// stored rows untouched. Users are updated in place (never inserted);
    /// tags, sources, live sources and categories are replaced wholesale. All
    /// of it commits or none of it does.
    pub async fn write_admin_config(&self, config: &AdminConfig) -> Result<(), StoreError> {
        let config = config.clone();
        self.run("write_admin_config", move |conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

            if !config.config_file.is_empty() {
                put_setting(&tx, CONFIG_FILE_KEY, &encode(&config.config_file)?)?;
            }
            if let Some(subscription) = &config.config_subscription {
                put_setting(&tx, CONFIG_SUBSCRIPTION_KEY, &encode(subscription)?)?;
            }
            put_setting(&tx, SITE_CONFIG_KEY, &encode(&config.site_config)?)?;

            users::replace_users(&tx, &config.users)?;
            groups::replace_user_groups(&tx, &config.tags)?;
            sources::replace_content_sources(&tx, &config.sources)?;
            sources::replace_live_sources(&tx, &config.live_sources)?;
            sources::replace_categories(&tx, &config.categories)?;

            tx.commit()?;
            Ok(())
        })
        .await
    }
}

fn overlay_settings(conn: &Connection, config: &mut AdminConfig) -> Result<(), StoreError> {
    let mut stmt = conn.prepare("SELECT key, value FROM admin_settings")?;
    let rows = stmt.query_map([], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
    })?;

    for row in rows {
        let (key, value) = row?;
        match key.as_str() {
            CONFIG_FILE_KEY => config.config_file = decode(SETTINGS_TABLE, &key, &value)?,
            CONFIG_SUBSCRIPTION_KEY => {
                config.config_subscription = Some(decode(SETTINGS_TABLE, &key, &value)?)
            }
            SITE_CONFIG_KEY => config.site_config = decode(SETTINGS_TABLE, &key, &value)?,
            other => debug!("ignoring unrecognized admin setting '{}'", other),
        }
    }
    Ok(())
}

fn put_setting(conn: &Connection, key: &str, value: &str) -> Result<(), StoreError> {
    conn.execute(
        "INSERT INTO admin_settings (key, value, updated_at) VALUES (?1, ?2, ?3)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
        params![key, value, now_secs()],
    )?;
    Ok(())
}
