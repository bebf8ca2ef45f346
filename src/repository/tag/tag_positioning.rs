//! Tag Positioning Operations
//!
//! Sortable behaviour for tags. All tags share a single ordering group and
//! positions run from 1 upwards. Combine `TagQuery::ordered` with
//! `with_type` or `with_job` to read a sorted subset.

use async_trait::async_trait;
use log::debug;
use rusqlite::{params, Connection, OptionalExtension};

use crate::domain::{DomainError, DomainResult};

/// Trait for tag positioning operations
#[async_trait]
pub trait TagSortableOperations {
    /// Highest position in use, 0 when there are no tags
    async fn highest_order_number(&self) -> DomainResult<i32>;

    /// Lowest position in use, 0 when there are no tags
    async fn lowest_order_number(&self) -> DomainResult<i32>;

    /// Assign `start_order, start_order + 1, ...` to `ids` in the given order
    async fn set_new_order(&self, ids: &[u32], start_order: i32) -> DomainResult<()>;

    /// Swap with the tag directly before this one
    async fn move_order_up(&self, id: u32) -> DomainResult<()>;

    /// Swap with the tag directly after this one
    async fn move_order_down(&self, id: u32) -> DomainResult<()>;

    async fn move_to_start(&self, id: u32) -> DomainResult<()>;

    async fn move_to_end(&self, id: u32) -> DomainResult<()>;

    /// Move a tag to `new_position`, shifting the tags in between
    async fn move_tag(&self, id: u32, new_position: i32) -> DomainResult<()>;

    async fn swap_order(&self, first: u32, second: u32) -> DomainResult<()>;

    /// Renumber all positions to be sequential (1, 2, 3, ...)
    async fn reindex(&self) -> DomainResult<()>;
}

#[async_trait]
impl TagSortableOperations for super::tag_repo::TagRepository {
    async fn highest_order_number(&self) -> DomainResult<i32> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(DomainError::not_initialized)?;
        highest_order_number(conn)
    }

    async fn lowest_order_number(&self) -> DomainResult<i32> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(DomainError::not_initialized)?;
        Ok(conn.query_row("SELECT COALESCE(MIN(order_column), 0) FROM tags", [], |row| {
            row.get(0)
        })?)
    }

    async fn set_new_order(&self, ids: &[u32], start_order: i32) -> DomainResult<()> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(DomainError::not_initialized)?;

        // Resolve every id and position before writing anything
        let mut positions = Vec::with_capacity(ids.len());
        for (offset, id) in ids.iter().enumerate() {
            position_of(conn, *id)?;
            positions.push((*id, order_at(start_order, offset)?));
        }

        let tx = conn.unchecked_transaction()?;
        let now = chrono::Utc::now().timestamp_millis();
        for (id, position) in positions {
            tx.execute(
                "UPDATE tags SET order_column = ?, updated_at = ? WHERE id = ?",
                params![position, now, id],
            )?;
        }
        tx.commit()?;

        debug!("Set new order for {} tags starting at {}", ids.len(), start_order);
        Ok(())
    }

    async fn move_order_up(&self, id: u32) -> DomainResult<()> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(DomainError::not_initialized)?;

        let position = position_of(conn, id)?;
        let neighbour: Option<u32> = conn
            .query_row(
                "SELECT id FROM tags WHERE order_column < ? ORDER BY order_column DESC, id DESC LIMIT 1",
                params![position],
                |row| row.get(0),
            )
            .optional()?;

        match neighbour {
            Some(other) => in_transaction(conn, |tx| swap_positions(tx, id, other)),
            None => Ok(()),
        }
    }

    async fn move_order_down(&self, id: u32) -> DomainResult<()> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(DomainError::not_initialized)?;

        let position = position_of(conn, id)?;
        let neighbour: Option<u32> = conn
            .query_row(
                "SELECT id FROM tags WHERE order_column > ? ORDER BY order_column ASC, id ASC LIMIT 1",
                params![position],
                |row| row.get(0),
            )
            .optional()?;

        match neighbour {
            Some(other) => in_transaction(conn, |tx| swap_positions(tx, id, other)),
            None => Ok(()),
        }
    }

    async fn move_to_start(&self, id: u32) -> DomainResult<()> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(DomainError::not_initialized)?;
        in_transaction(conn, |tx| move_to(tx, id, 1))
    }

    async fn move_to_end(&self, id: u32) -> DomainResult<()> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(DomainError::not_initialized)?;
        in_transaction(conn, |tx| {
            let last = highest_order_number(tx)?;
            move_to(tx, id, last)
        })
    }

    async fn move_tag(&self, id: u32, new_position: i32) -> DomainResult<()> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(DomainError::not_initialized)?;
        in_transaction(conn, |tx| move_to(tx, id, new_position))
    }

    async fn swap_order(&self, first: u32, second: u32) -> DomainResult<()> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(DomainError::not_initialized)?;
        in_transaction(conn, |tx| swap_positions(tx, first, second))
    }

    async fn reindex(&self) -> DomainResult<()> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(DomainError::not_initialized)?;
        in_transaction(conn, reindex)
    }
}

/// Run `work` inside a transaction, rolling back on error
pub(super) fn in_transaction<T>(
    conn: &Connection,
    work: impl FnOnce(&Connection) -> DomainResult<T>,
) -> DomainResult<T> {
    let tx = conn.unchecked_transaction()?;
    let value = work(&tx)?;
    tx.commit()?;
    Ok(value)
}

/// `start + offset`, rejecting positions past `i32::MAX`
pub(super) fn order_at(start: i32, offset: usize) -> DomainResult<i32> {
    i32::try_from(offset)
        .ok()
        .and_then(|offset| start.checked_add(offset))
        .ok_or_else(|| {
            DomainError::InvalidInput(format!(
                "sort position {} + {} is out of range",
                start, offset
            ))
        })
}

pub(super) fn highest_order_number(conn: &Connection) -> DomainResult<i32> {
    Ok(conn.query_row("SELECT COALESCE(MAX(order_column), 0) FROM tags", [], |row| {
        row.get(0)
    })?)
}

fn position_of(conn: &Connection, id: u32) -> DomainResult<i32> {
    conn.query_row(
        "SELECT order_column FROM tags WHERE id = ?",
        params![id],
        |row| row.get(0),
    )
    .optional()?
    .ok_or_else(|| DomainError::NotFound(format!("Tag {} not found", id)))
}

fn swap_positions(conn: &Connection, first: u32, second: u32) -> DomainResult<()> {
    let first_position = position_of(conn, first)?;
    let second_position = position_of(conn, second)?;
    let now = chrono::Utc::now().timestamp_millis();

    conn.execute(
        "UPDATE tags SET order_column = ?, updated_at = ? WHERE id = ?",
        params![second_position, now, first],
    )?;
    conn.execute(
        "UPDATE tags SET order_column = ?, updated_at = ? WHERE id = ?",
        params![first_position, now, second],
    )?;

    debug!("Swapped order of tags {} and {}", first, second);
    Ok(())
}

fn move_to(conn: &Connection, id: u32, new_position: i32) -> DomainResult<()> {
    let old_position = position_of(conn, id)?;
    let new_position = new_position.clamp(1, highest_order_number(conn)?.max(1));

    if old_position == new_position {
        return Ok(());
    }

    if new_position < old_position {
        // Moving up: shift tags in [new_position, old_position) down by +1
        conn.execute(
            "UPDATE tags SET order_column = order_column + 1 WHERE order_column >= ? AND order_column < ?",
            params![new_position, old_position],
        )?;
    } else {
        // Moving down: shift tags in (old_position, new_position] up by -1
        conn.execute(
            "UPDATE tags SET order_column = order_column - 1 WHERE order_column > ? AND order_column <= ?",
            params![old_position, new_position],
        )?;
    }

    conn.execute(
        "UPDATE tags SET order_column = ?, updated_at = ? WHERE id = ?",
        params![new_position, chrono::Utc::now().timestamp_millis(), id],
    )?;

    // Remove any gaps or duplicates left behind
    reindex(conn)?;
    debug!("Moved tag {} from {} to {}", id, old_position, new_position);
    Ok(())
}

pub(super) fn reindex(conn: &Connection) -> DomainResult<()> {
    let ids = {
        let mut stmt = conn.prepare("SELECT id FROM tags ORDER BY order_column, id")?;
        let ids = stmt
            .query_map([], |row| row.get::<_, u32>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        ids
    };

    let now = chrono::Utc::now().timestamp_millis();
    for (index, id) in ids.iter().enumerate() {
        let position = order_at(1, index)?;
        conn.execute(
            "UPDATE tags SET order_column = ?, updated_at = ? WHERE id = ? AND order_column != ?",
            params![position, now, *id, position],
        )?;
    }

    Ok(())
}
