//! Tag Lookup Operations
//!
//! Resolving tags by name or slug within a job, creating them on a miss.

use async_trait::async_trait;
use rusqlite::Connection;

use super::tag_query::TagQuery;
use super::tag_repo::{fetch_first, insert_tag, TagRepository};
use crate::domain::{DomainError, DomainResult, Tag, TagInput};

/// Trait for lookup and find-or-create operations
#[async_trait]
pub trait TagLookupOperations {
    /// First tag of `job` with exactly `tag_type` (untyped when `None`)
    /// whose name or slug in `locale` equals `name`
    async fn find_from_string(
        &self,
        job_id: i64,
        name: &str,
        tag_type: Option<&str>,
        locale: Option<&str>,
    ) -> DomainResult<Option<Tag>>;

    /// All tags of `job`, whatever their type, whose name or slug in
    /// `locale` equals `name`
    async fn find_from_string_of_any_type(
        &self,
        job_id: i64,
        name: &str,
        locale: Option<&str>,
    ) -> DomainResult<Vec<Tag>>;

    /// `find_from_string`, creating the tag when nothing matches
    async fn find_or_create_from_string(
        &self,
        job_id: i64,
        name: &str,
        tag_type: Option<&str>,
        locale: Option<&str>,
    ) -> DomainResult<Tag>;

    /// Resolve every input in order. Existing tags pass through untouched.
    async fn find_or_create(
        &self,
        job_id: i64,
        values: Vec<TagInput>,
        tag_type: Option<&str>,
    ) -> DomainResult<Vec<Tag>>;

    /// Single-name form of `find_or_create`
    async fn find_or_create_one(
        &self,
        job_id: i64,
        name: &str,
        tag_type: Option<&str>,
    ) -> DomainResult<Tag>;

    /// All tags of `job` with `tag_type`, in sort order
    async fn get_with_type(&self, job_id: i64, tag_type: &str) -> DomainResult<Vec<Tag>>;

    /// Distinct types across every job; `None` stands for untyped tags
    async fn get_types(&self) -> DomainResult<Vec<Option<String>>>;
}

#[async_trait]
impl TagLookupOperations for TagRepository {
    async fn find_from_string(
        &self,
        job_id: i64,
        name: &str,
        tag_type: Option<&str>,
        locale: Option<&str>,
    ) -> DomainResult<Option<Tag>> {
        let locale = self.resolve_locale(locale)?;
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(DomainError::not_initialized)?;
        find_in(conn, job_id, name, tag_type, locale.as_str())
    }

    async fn find_from_string_of_any_type(
        &self,
        job_id: i64,
        name: &str,
        locale: Option<&str>,
    ) -> DomainResult<Vec<Tag>> {
        let locale = self.resolve_locale(locale)?;
        let query = TagQuery::new()
            .where_job(job_id)
            .where_any(name_or_slug(name, locale.as_str()));
        self.get(&query).await
    }

    async fn find_or_create_from_string(
        &self,
        job_id: i64,
        name: &str,
        tag_type: Option<&str>,
        locale: Option<&str>,
    ) -> DomainResult<Tag> {
        let locale = self.resolve_locale(locale)?;

        // Lookup and insert share one lock so this process never creates twice
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(DomainError::not_initialized)?;

        if let Some(tag) = find_in(conn, job_id, name, tag_type, locale.as_str())? {
            return Ok(tag);
        }
        insert_tag(conn, &Tag::new(job_id, name, tag_type, locale.as_str()))
    }

    async fn find_or_create(
        &self,
        job_id: i64,
        values: Vec<TagInput>,
        tag_type: Option<&str>,
    ) -> DomainResult<Vec<Tag>> {
        let mut tags = Vec::with_capacity(values.len());
        for value in values {
            let tag = match value {
                TagInput::Existing(tag) => tag,
                TagInput::Name(name) => {
                    self.find_or_create_from_string(job_id, &name, tag_type, None)
                        .await?
                }
            };
            tags.push(tag);
        }
        Ok(tags)
    }

    async fn find_or_create_one(
        &self,
        job_id: i64,
        name: &str,
        tag_type: Option<&str>,
    ) -> DomainResult<Tag> {
        self.find_or_create_from_string(job_id, name, tag_type, None)
            .await
    }

    async fn get_with_type(&self, job_id: i64, tag_type: &str) -> DomainResult<Vec<Tag>> {
        let query = TagQuery::new()
            .where_job(job_id)
            .with_type(Some(tag_type));
        self.get(&query).await
    }

    async fn get_types(&self) -> DomainResult<Vec<Option<String>>> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(DomainError::not_initialized)?;

        let mut stmt = conn.prepare("SELECT type FROM tags GROUP BY type")?;
        let types = stmt
            .query_map([], |row| row.get::<_, Option<String>>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(types)
    }
}

fn name_or_slug(name: &str, locale: &str) -> Vec<TagQuery> {
    vec![
        TagQuery::new().where_name(locale, name),
        TagQuery::new().where_slug(locale, name),
    ]
}

fn find_in(
    conn: &Connection,
    job_id: i64,
    name: &str,
    tag_type: Option<&str>,
    locale: &str,
) -> DomainResult<Option<Tag>> {
    let query = TagQuery::new()
        .where_job(job_id)
        .where_type(tag_type)
        .where_any(name_or_slug(name, locale));
    fetch_first(conn, &query)
}
