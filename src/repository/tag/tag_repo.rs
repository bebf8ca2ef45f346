//! Tag Repository - Core CRUD Operations
//!
//! SQLite-backed implementation for Tag CRUD.
//! Specialized operations are in separate modules:
//! - tag_lookup: find / find-or-create by name
//! - tag_positioning: sortable position management
//! - tag_query: composable query scopes

use async_trait::async_trait;
use log::{debug, warn};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};

use super::tag_positioning::{highest_order_number, in_transaction, order_at, reindex};
use super::tag_query::{TagQuery, TAG_COLUMNS};
use crate::domain::{
    slug_candidates, DomainError, DomainResult, Locale, Tag, Translations,
};
use crate::repository::db::SharedConnection;
use crate::repository::traits::{Repository, SearchableRepository};

/// SQLite implementation of Tag repository
///
/// Carries the current locale used whenever an operation is called
/// without an explicit one.
pub struct TagRepository {
    pub(super) conn: SharedConnection,
    locale: Locale,
}

impl TagRepository {
    pub fn new(conn: SharedConnection, locale: Locale) -> Self {
        Self { conn, locale }
    }

    /// The current locale
    pub fn locale(&self) -> &Locale {
        &self.locale
    }

    pub fn set_locale(&mut self, locale: Locale) {
        self.locale = locale;
    }

    /// Resolve an optional per-call locale against the current one
    pub fn resolve_locale(&self, locale: Option<&str>) -> DomainResult<Locale> {
        match locale {
            Some(code) => Locale::new(code),
            None => Ok(self.locale.clone()),
        }
    }

    /// Run a query and return every matching tag
    pub async fn get(&self, query: &TagQuery) -> DomainResult<Vec<Tag>> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(DomainError::not_initialized)?;
        fetch(conn, query)
    }

    /// Run a query and return the first matching tag
    pub async fn first(&self, query: &TagQuery) -> DomainResult<Option<Tag>> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(DomainError::not_initialized)?;
        fetch_first(conn, query)
    }
}

#[async_trait]
impl Repository<Tag> for TagRepository {
    async fn create(&self, entity: &Tag) -> DomainResult<Tag> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(DomainError::not_initialized)?;
        insert_tag(conn, entity)
    }

    async fn find_by_id(&self, id: u32) -> DomainResult<Option<Tag>> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(DomainError::not_initialized)?;
        find_tag(conn, id)
    }

    async fn list(&self) -> DomainResult<Vec<Tag>> {
        self.get(&TagQuery::new().ordered()).await
    }

    async fn update(&self, entity: &Tag) -> DomainResult<Tag> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(DomainError::not_initialized)?;

        if entity.name().is_empty() {
            return Err(DomainError::InvalidInput("tag name has no translations".to_string()));
        }

        let mut tag = entity.clone();
        ensure_unique_slugs(conn, &mut tag)?;

        // job_id is fixed at creation and never written here
        let changed = conn.execute(
            "UPDATE tags SET type = ?, name = ?, slug = ?, updated_at = ? WHERE id = ?",
            params![
                tag.tag_type,
                tag.name().to_json()?,
                tag.slug().to_json()?,
                chrono::Utc::now().timestamp_millis(),
                tag.id
            ],
        )?;
        if changed == 0 {
            return Err(DomainError::NotFound(format!("Tag {} not found", tag.id)));
        }

        debug!("Updated tag {}", tag.id);
        find_tag(conn, tag.id)?
            .ok_or_else(|| DomainError::NotFound(format!("Tag {} not found", tag.id)))
    }

    async fn delete(&self, id: u32) -> DomainResult<()> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(DomainError::not_initialized)?;

        in_transaction(conn, |tx| {
            let removed = tx.execute("DELETE FROM tags WHERE id = ?", params![id])?;
            if removed == 0 {
                return Err(DomainError::NotFound(format!("Tag {} not found", id)));
            }

            // Close the gap left in the sort order
            reindex(tx)
        })?;
        debug!("Deleted tag {}", id);
        Ok(())
    }
}

#[async_trait]
impl SearchableRepository<Tag> for TagRepository {
    async fn search(&self, query: &str) -> DomainResult<Vec<Tag>> {
        let scope = TagQuery::new()
            .containing(query, self.locale.as_str())
            .ordered();
        self.get(&scope).await
    }
}

pub(super) fn fetch(conn: &Connection, query: &TagQuery) -> DomainResult<Vec<Tag>> {
    let (sql, values) = query.to_sql()?;
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query(params_from_iter(values))?;

    let mut tags = Vec::new();
    while let Some(row) = rows.next()? {
        tags.push(row_to_tag(row)?);
    }
    Ok(tags)
}

pub(super) fn fetch_first(conn: &Connection, query: &TagQuery) -> DomainResult<Option<Tag>> {
    let query = query.clone().limit(1);
    Ok(fetch(conn, &query)?.into_iter().next())
}

pub(super) fn find_tag(conn: &Connection, id: u32) -> DomainResult<Option<Tag>> {
    let sql = format!("SELECT {} FROM tags WHERE id = ?", TAG_COLUMNS);
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query(params![id])?;

    match rows.next()? {
        Some(row) => Ok(Some(row_to_tag(row)?)),
        None => Ok(None),
    }
}

/// Insert a new tag at the end of the sort order
pub(super) fn insert_tag(conn: &Connection, entity: &Tag) -> DomainResult<Tag> {
    if entity.name().is_empty() {
        return Err(DomainError::InvalidInput("tag name has no translations".to_string()));
    }

    let mut tag = entity.clone();
    tag.id = 0;
    ensure_unique_slugs(conn, &mut tag)?;
    tag.order_column = order_at(highest_order_number(conn)?, 1)?;

    let now = chrono::Utc::now().timestamp_millis();
    conn.execute(
        "INSERT INTO tags (job_id, type, name, slug, order_column, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?, ?)",
        params![
            tag.job_id(),
            tag.tag_type,
            tag.name().to_json()?,
            tag.slug().to_json()?,
            tag.order_column,
            now,
            now
        ],
    )?;

    tag.id = u32::try_from(conn.last_insert_rowid())
        .map_err(|e| DomainError::Internal(e.to_string()))?;

    debug!(
        "Created tag {} for job {} (type {:?}) at position {}",
        tag.id,
        tag.job_id(),
        tag.tag_type,
        tag.order_column
    );
    Ok(tag)
}

/// Suffix slugs that collide within the same job, type and locale
fn ensure_unique_slugs(conn: &Connection, tag: &mut Tag) -> DomainResult<()> {
    let slugs: Vec<(String, String)> = tag
        .slug()
        .iter()
        .map(|(locale, slug)| (locale.to_string(), slug.to_string()))
        .collect();

    for (locale, slug) in slugs {
        let path = format!("$.\"{}\"", Locale::new(locale.as_str())?);
        let mut chosen = None;

        for candidate in slug_candidates(&slug) {
            let taken = conn
                .query_row(
                    "SELECT 1 FROM tags
                     WHERE job_id = ? AND type IS ? AND id != ? AND json_extract(slug, ?) = ?
                     LIMIT 1",
                    params![tag.job_id(), tag.tag_type, tag.id, path, candidate],
                    |_| Ok(()),
                )
                .optional()?
                .is_some();
            if !taken {
                chosen = Some(candidate);
                break;
            }
        }

        if let Some(candidate) = chosen {
            if candidate != slug {
                warn!(
                    "Slug {:?} already used in job {} ({}), using {:?}",
                    slug,
                    tag.job_id(),
                    locale,
                    candidate
                );
                tag.set_slug(&locale, &candidate);
            }
        }
    }

    Ok(())
}

/// Convert a database row to Tag
pub(super) fn row_to_tag(row: &rusqlite::Row) -> DomainResult<Tag> {
    let name: String = row.get(3)?;
    let slug: String = row.get(4)?;
    Ok(Tag::from_parts(
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        Translations::from_json(&name)?,
        Translations::from_json(&slug)?,
        row.get(5)?,
    ))
}
