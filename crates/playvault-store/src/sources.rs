// ABOUTME: Admin-owned source repositories: API content sources, live channel sources and categories.
// ABOUTME: Lists come back in written order; replace swaps each collection wholesale inside one transaction.

use playvault_core::{Category, ContentSource, LiveSource};
use rusqlite::{Connection, TransactionBehavior, params};

use crate::error::StoreError;
use crate::storage::Storage;

impl Storage {
    /// All API content sources in the order they were last written.
    pub async fn list_content_sources(&self) -> Result<Vec<ContentSource>, StoreError> {
        self.run("list_content_sources", |conn| list_content_sources(conn))
            .await
    }

    /// Replace the content source collection. Duplicate keys keep the last entry.
    pub async fn replace_content_sources(&self, sources: &[ContentSource]) -> Result<(), StoreError> {
        let sources = sources.to_vec();
        self.run("replace_content_sources", move |conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            replace_content_sources(&tx, &sources)?;
            tx.commit()?;
            Ok(())
        })
        .await
    }

    /// All live channel sources in the order they were last written.
    pub async fn list_live_sources(&self) -> Result<Vec<LiveSource>, StoreError> {
        self.run("list_live_sources", |conn| list_live_sources(conn))
            .await
    }

    /// Replace the live source collection. Duplicate keys keep the last entry.
    pub async fn replace_live_sources(&self, sources: &[LiveSource]) -> Result<(), StoreError> {
        let sources = sources.to_vec();
        self.run("replace_live_sources", move |conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            replace_live_sources(&tx, &sources)?;
            tx.commit()?;
            Ok(())
        })
        .await
    }

    /// All categories in the order they were last written.
    pub async fn list_categories(&self) -> Result<Vec<Category>, StoreError> {
        self.run("list_categories", |conn| list_categories(conn)).await
    }

    /// Replace all categories. Entries sharing `(query, type)` keep the last one.
    pub async fn replace_categories(&self, categories: &[Category]) -> Result<(), StoreError> {
        let categories = categories.to_vec();
        self.run("replace_categories", move |conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            replace_categories(&tx, &categories)?;
            tx.commit()?;
            Ok(())
        })
        .await
    }
}

pub(crate) fn list_content_sources(conn: &Connection) -> Result<Vec<ContentSource>, StoreError> {
    let mut stmt = conn.prepare(
        "SELECT source_key, name, api, detail, origin, disabled
         FROM content_sources ORDER BY sort_order, source_key",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, Option<String>>(3)?,
            row.get::<_, String>(4)?,
            row.get::<_, bool>(5)?,
        ))
    })?;

    let mut sources = Vec::new();
    for row in rows {
        let (key, name, api, detail, origin, disabled) = row?;
        sources.push(ContentSource {
            key,
            name,
            api,
            detail,
            from: origin.parse()?,
            disabled,
        });
    }
    Ok(sources)
}

pub(crate) fn replace_content_sources(
    conn: &Connection,
    sources: &[ContentSource],
) -> Result<(), StoreError> {
    conn.execute("DELETE FROM content_sources", [])?;

    let mut stmt = conn.prepare(
        "INSERT OR REPLACE INTO content_sources
            (source_key, name, api, detail, origin, disabled, sort_order)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
    )?;
    for (order, s) in sources.iter().enumerate() {
        stmt.execute(params![
            s.key,
            s.name,
            s.api,
            s.detail,
            s.from.as_str(),
            s.disabled,
            order as i64,
        ])?;
    }
    Ok(())
}

pub(crate) fn list_live_sources(conn: &Connection) -> Result<Vec<LiveSource>, StoreError> {
    let mut stmt = conn.prepare(
        "SELECT source_key, name, url, ua, epg, origin, channel_number, disabled
         FROM live_sources ORDER BY sort_order, source_key",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok((
            (
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
            ),
            (
                row.get::<_, Option<String>>(3)?,
                row.get::<_, Option<String>>(4)?,
            ),
            row.get::<_, String>(5)?,
            row.get::<_, Option<i64>>(6)?,
            row.get::<_, bool>(7)?,
        ))
    })?;

    let mut sources = Vec::new();
    for row in rows {
        let ((key, name, url), (ua, epg), origin, channel_number, disabled) = row?;
        sources.push(LiveSource {
            key,
            name,
            url,
            ua,
            epg,
            from: origin.parse()?,
            channel_number,
            disabled,
        });
    }
    Ok(sources)
}

pub(crate) fn replace_live_sources(conn: &Connection, sources: &[LiveSource]) -> Result<(), StoreError> {
    conn.execute("DELETE FROM live_sources", [])?;

    let mut stmt = conn.prepare(
        "INSERT OR REPLACE INTO live_sources
            (source_key, name, url, ua, epg, origin, channel_number, disabled, sort_order)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
    )?;
    for (order, s) in sources.iter().enumerate() {
        stmt.execute(params![
            s.key,
            s.name,
            s.url,
            s.ua,
            s.epg,
            s.from.as_str(),
            s.channel_number,
            s.disabled,
            order as i64,
        ])?;
    }
    Ok(())
}

pub(crate) fn list_categories(conn: &Connection) -> Result<Vec<Category>, StoreError> {
    let mut stmt = conn.prepare(
        "SELECT name, kind, query, origin, disabled
         FROM categories ORDER BY sort_order, id",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, Option<String>>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, String>(3)?,
            row.get::<_, bool>(4)?,
        ))
    })?;

    let mut categories = Vec::new();
    for row in rows {
        let (name, kind, query, origin, disabled) = row?;
        categories.push(Category {
            name,
            kind: kind.parse()?,
            query,
            from: origin.parse()?,
            disabled,
        });
    }
    Ok(categories)
}

pub(crate) fn replace_categories(conn: &Connection, categories: &[Category]) -> Result<(), StoreError> {
    conn.execute("DELETE FROM categories", [])?;

    let mut stmt = conn.prepare(
        "INSERT OR REPLACE INTO categories (name, kind, query, origin, disabled, sort_order)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    )?;
    for (order, c) in categories.iter().enumerate() {
        stmt.execute(params![
            c.name,
            c.kind.as_str(),
            c.query,
            c.from.as_str(),
            c.disabled,
            order as i64,
        ])?;
    }
    Ok(())
}
