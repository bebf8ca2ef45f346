//! Database Connection and Setup
//!
//! Manages the SQLite connection, SQL helper functions and migrations.

use log::info;
use rusqlite::functions::FunctionFlags;
use rusqlite::Connection;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::domain::DomainResult;

/// Unicode-aware lower-casing, used by the `containing` scope
pub(crate) const LOWER_FN: &str = "polytag_lower";

/// Shared handle to the (possibly not yet opened) connection
pub type SharedConnection = Arc<Mutex<Option<Connection>>>;

/// Database state wrapper
#[derive(Clone, Default)]
pub struct DbState {
    conn: SharedConnection,
}

impl DbState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle to pass to repositories
    pub fn connection(&self) -> SharedConnection {
        Arc::clone(&self.conn)
    }

    pub async fn is_initialized(&self) -> bool {
        self.conn.lock().await.is_some()
    }
}

/// Open the database at `db_path` (`:memory:` is accepted) and migrate it
pub async fn init_db(db_path: &Path) -> DomainResult<DbState> {
    let conn = if db_path == Path::new(":memory:") {
        Connection::open_in_memory()?
    } else {
        Connection::open(db_path)?
    };

    register_functions(&conn)?;
    run_migrations(&conn)?;

    let state = DbState::new();
    *state.conn.lock().await = Some(conn);

    info!("Tag database ready at {}", db_path.display());
    Ok(state)
}

fn register_functions(conn: &Connection) -> DomainResult<()> {
    conn.create_scalar_function(
        LOWER_FN,
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let value: Option<String> = ctx.get(0)?;
            Ok(value.map(|v| v.to_lowercase()))
        },
    )?;
    Ok(())
}

/// Check if a column exists in a table
fn column_exists(conn: &Connection, table: &str, column: &str) -> DomainResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", table))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let name: String = row.get(1)?;
        if name == column {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Run database migrations
fn run_migrations(conn: &Connection) -> DomainResult<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS tags (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            job_id INTEGER NOT NULL,
            type TEXT,
            name TEXT NOT NULL,
            slug TEXT NOT NULL DEFAULT '{}',
            order_column INTEGER NOT NULL DEFAULT 0
        )",
        (),
    )?;

    // Timestamps were added after the first schema
    for column in ["created_at", "updated_at"] {
        if !column_exists(conn, "tags", column)? {
            conn.execute(
                &format!("ALTER TABLE tags ADD COLUMN {} INTEGER", column),
                (),
            )?;
        }
    }

    conn.execute("CREATE INDEX IF NOT EXISTS idx_tags_job ON tags(job_id)", ())?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_tags_job_type ON tags(job_id, type)",
        (),
    )?;

    Ok(())
}
