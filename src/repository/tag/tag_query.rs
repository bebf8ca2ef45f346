//! Tag Query Scopes
//!
//! Composable filters over the `tags` table. Conditions added by chaining
//! are combined with AND; `where_any` adds a parenthesised OR group.

use rusqlite::types::Value;

use crate::domain::{DomainResult, Locale, TranslatableField};
use crate::repository::db::LOWER_FN;

pub(super) const TAG_COLUMNS: &str = "id, job_id, type, name, slug, order_column";

#[derive(Debug, Clone, PartialEq)]
enum Condition {
    Job(i64),
    Type(Option<String>),
    Translated {
        field: TranslatableField,
        locale: String,
        value: String,
    },
    Contains {
        field: TranslatableField,
        locale: String,
        needle: String,
    },
    Any(Vec<TagQuery>),
}

/// A composable query over tags
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TagQuery {
    conditions: Vec<Condition>,
    ordered: bool,
    limit: Option<u32>,
}

impl TagQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tags of `tag_type`, in sort order. `None` leaves the query untouched.
    pub fn with_type(self, tag_type: Option<&str>) -> Self {
        match tag_type {
            Some(tag_type) => self.where_type(Some(tag_type)).ordered(),
            None => self,
        }
    }

    /// Tags of one job, in sort order
    pub fn with_job(self, job_id: i64) -> Self {
        self.where_job(job_id).ordered()
    }

    /// Case-insensitive substring match on the name in `locale`
    pub fn containing(mut self, name: &str, locale: &str) -> Self {
        self.conditions.push(Condition::Contains {
            field: TranslatableField::Name,
            locale: locale.to_string(),
            needle: name.to_lowercase(),
        });
        self
    }

    pub fn where_job(mut self, job_id: i64) -> Self {
        self.conditions.push(Condition::Job(job_id));
        self
    }

    /// Exact type match; `None` matches untyped tags only
    pub fn where_type(mut self, tag_type: Option<&str>) -> Self {
        self.conditions
            .push(Condition::Type(tag_type.map(str::to_string)));
        self
    }

    pub fn where_name(self, locale: &str, name: &str) -> Self {
        self.where_translated(TranslatableField::Name, locale, name)
    }

    pub fn where_slug(self, locale: &str, slug: &str) -> Self {
        self.where_translated(TranslatableField::Slug, locale, slug)
    }

    pub fn where_translated(mut self, field: TranslatableField, locale: &str, value: &str) -> Self {
        self.conditions.push(Condition::Translated {
            field,
            locale: locale.to_string(),
            value: value.to_string(),
        });
        self
    }

    /// Require at least one of `alternatives` to match
    pub fn where_any(mut self, alternatives: Vec<TagQuery>) -> Self {
        self.conditions.push(Condition::Any(alternatives));
        self
    }

    /// Ascending by sort position
    pub fn ordered(mut self) -> Self {
        self.ordered = true;
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn is_ordered(&self) -> bool {
        self.ordered
    }

    /// Render the full SELECT with its bound parameters
    pub fn to_sql(&self) -> DomainResult<(String, Vec<Value>)> {
        let mut params = Vec::new();
        let mut sql = format!("SELECT {} FROM tags", TAG_COLUMNS);

        let filter = self.where_clause(&mut params)?;
        if !filter.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&filter);
        }
        if self.ordered {
            sql.push_str(" ORDER BY order_column ASC, id ASC");
        }
        if let Some(limit) = self.limit {
            sql.push_str(&format!(" LIMIT {}", limit));
        }
        Ok((sql, params))
    }

    fn where_clause(&self, params: &mut Vec<Value>) -> DomainResult<String> {
        let mut parts = Vec::with_capacity(self.conditions.len());

        for condition in &self.conditions {
            let part = match condition {
                Condition::Job(job_id) => {
                    params.push(Value::Integer(*job_id));
                    "job_id = ?".to_string()
                }
                Condition::Type(None) => "type IS NULL".to_string(),
                Condition::Type(Some(tag_type)) => {
                    params.push(Value::Text(tag_type.clone()));
                    "type = ?".to_string()
                }
                Condition::Translated { field, locale, value } => {
                    let path = locale_path(locale)?;
                    params.push(Value::Text(path));
                    params.push(Value::Text(value.clone()));
                    format!("json_extract({}, ?) = ?", field.column())
                }
                Condition::Contains { field, locale, needle } => {
                    let path = locale_path(locale)?;
                    params.push(Value::Text(path));
                    params.push(Value::Text(needle.clone()));
                    format!(
                        "instr({}(json_extract({}, ?)), ?) > 0",
                        LOWER_FN,
                        field.column()
                    )
                }
                Condition::Any(alternatives) => {
                    if alternatives.is_empty() {
                        "0".to_string()
                    } else {
                        let mut branches = Vec::with_capacity(alternatives.len());
                        for alternative in alternatives {
                            let clause = alternative.where_clause(params)?;
                            branches.push(if clause.is_empty() {
                                "1".to_string()
                            } else {
                                format!("({})", clause)
                            });
                        }
                        format!("({})", branches.join(" OR "))
                    }
                }
            };
            parts.push(part);
        }

        Ok(parts.join(" AND "))
    }
}

/// JSON path selecting one locale key
fn locale_path(locale: &str) -> DomainResult<String> {
    let locale = Locale::new(locale)?;
    Ok(format!("$.\"{}\"", locale))
}
