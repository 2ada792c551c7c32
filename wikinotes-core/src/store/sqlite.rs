use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row};
use tracing::{debug, info};

use super::schema::{PAGE_COLUMNS, PRAGMAS_SQL, SCHEMA_SQL};
use super::{LinkTransaction, PageStore};
use crate::error::StoreError;
use wikinotes_types::{Link, LinkDirection, NewPage, Page, PageId, PageUpdate};

/// SQLite-backed implementation of [`PageStore`].
#[derive(Debug)]
pub struct SqliteStore {
    conn: Mutex<Connection>,
    db_path: Option<PathBuf>,
}

impl SqliteStore {
    /// Open (or create) a store at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| StoreError::Open {
                path: path.to_path_buf(),
                source,
            })?;
        }

        let conn = Connection::open(path)?;
        let store = Self {
            conn: Mutex::new(conn),
            db_path: Some(path.to_path_buf()),
        };
        store.initialize()?;
        info!(path = %path.display(), "page store opened");
        Ok(store)
    }

    /// Create an in-memory store (for testing).
    pub fn in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
            db_path: None,
        };
        store.initialize()?;
        Ok(store)
    }

    /// Location of the database file, `None` for in-memory stores.
    pub fn path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    fn initialize(&self) -> Result<(), StoreError> {
        let conn = self.conn.lock();
        conn.execute_batch(PRAGMAS_SQL)?;
        conn.busy_timeout(Duration::from_secs(5))?;

        // In-memory databases refuse WAL; nothing to do about it.
        let _ = conn.execute_batch("PRAGMA journal_mode = WAL;");

        conn.execute_batch(SCHEMA_SQL)?;
        Ok(())
    }
}

fn page_from_row(row: &Row<'_>) -> rusqlite::Result<Page> {
    Ok(Page {
        id: PageId(row.get(0)?),
        name: row.get(1)?,
        content: row.get(2)?,
        created_at: row.get(3)?,
        updated_at: row.get(4)?,
    })
}

fn link_from_row(row: &Row<'_>) -> rusqlite::Result<Link> {
    Ok(Link {
        from_page_id: PageId(row.get(0)?),
        to_page_id: PageId(row.get(1)?),
        link_text: row.get(2)?,
        created_at: row.get(3)?,
    })
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.code == ErrorCode::ConstraintViolation
                && e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

fn name_conflict(name: &str) -> impl FnOnce(rusqlite::Error) -> StoreError + '_ {
    move |err| {
        if is_unique_violation(&err) {
            StoreError::NameTaken(name.to_string())
        } else {
            StoreError::Sqlite(err)
        }
    }
}

/// Edge writes scoped to one open transaction.
struct SqliteLinkTx<'a> {
    conn: &'a Connection,
    now: DateTime<Utc>,
}

impl LinkTransaction for SqliteLinkTx<'_> {
    fn clear_outbound(&mut self, from: PageId) -> Result<usize, StoreError> {
        let removed = self.conn.execute(
            "DELETE FROM page_links WHERE from_page_id = ?1",
            params![from.0],
        )?;
        Ok(removed)
    }

    fn page_content(&mut self, page: PageId) -> Result<Option<String>, StoreError> {
        let content = self
            .conn
            .query_row(
                "SELECT content FROM pages WHERE id = ?1",
                params![page.0],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(content)
    }

    fn resolve_name(&mut self, name: &str) -> Result<Option<PageId>, StoreError> {
        let id = self
            .conn
            .query_row(
                "SELECT id FROM pages WHERE name = ?1",
                params![name],
                |row| row.get::<_, i64>(0),
            )
            .optional()?;
        Ok(id.map(PageId))
    }

    fn upsert_link(
        &mut self,
        from: PageId,
        to: PageId,
        link_text: &str,
    ) -> Result<bool, StoreError> {
        let inserted = self.conn.execute(
            "INSERT INTO page_links (from_page_id, to_page_id, link_text, created_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT (from_page_id, to_page_id) DO NOTHING",
            params![from.0, to.0, link_text, self.now],
        )?;
        Ok(inserted > 0)
    }
}

impl PageStore for SqliteStore {
    fn find_by_id(&self, id: PageId) -> Result<Option<Page>, StoreError> {
        let conn = self.conn.lock();
        let page = conn
            .query_row(
                &format!("SELECT {PAGE_COLUMNS} FROM pages WHERE id = ?1"),
                params![id.0],
                page_from_row,
            )
            .optional()?;
        Ok(page)
    }

    fn find_by_name(&self, name: &str) -> Result<Option<Page>, StoreError> {
        let conn = self.conn.lock();
        let page = conn
            .query_row(
                &format!("SELECT {PAGE_COLUMNS} FROM pages WHERE name = ?1"),
                params![name],
                page_from_row,
            )
            .optional()?;
        Ok(page)
    }

    fn list_all(&self) -> Result<Vec<Page>, StoreError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&format!("SELECT {PAGE_COLUMNS} FROM pages ORDER BY name"))?;
        let pages = stmt
            .query_map([], page_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(pages)
    }

    fn create(&self, page: &NewPage) -> Result<Page, StoreError> {
        let now = Utc::now();
        let conn = self.conn.lock();
        let created = conn
            .query_row(
                &format!(
                    "INSERT INTO pages (name, content, created_at, updated_at)
                     VALUES (?1, ?2, ?3, ?3)
                     RETURNING {PAGE_COLUMNS}"
                ),
                params![page.name, page.content, now],
                page_from_row,
            )
            .map_err(name_conflict(&page.name))?;
        debug!(page = %created.id, name = %created.name, "page inserted");
        Ok(created)
    }

    fn update(&self, id: PageId, update: &PageUpdate) -> Result<Option<Page>, StoreError> {
        let now = Utc::now();
        let conn = self.conn.lock();
        conn.query_row(
            &format!(
                "UPDATE pages
                 SET name = COALESCE(?1, name),
                     content = COALESCE(?2, content),
                     updated_at = ?3
                 WHERE id = ?4
                 RETURNING {PAGE_COLUMNS}"
            ),
            params![update.name, update.content, now, id.0],
            page_from_row,
        )
        .optional()
        .map_err(name_conflict(update.name.as_deref().unwrap_or_default()))
    }

    fn delete(&self, id: PageId) -> Result<bool, StoreError> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        let edges = tx.execute(
            "DELETE FROM page_links WHERE from_page_id = ?1 OR to_page_id = ?1",
            params![id.0],
        )?;
        let rows = tx.execute("DELETE FROM pages WHERE id = ?1", params![id.0])?;
        tx.commit()?;

        if rows > 0 {
            debug!(page = %id, edges, "page deleted");
        }
        Ok(rows > 0)
    }

    fn link_transaction(
        &self,
        body: &mut dyn FnMut(&mut dyn LinkTransaction) -> Result<(), StoreError>,
    ) -> Result<(), StoreError> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        let mut links = SqliteLinkTx {
            conn: &tx,
            now: Utc::now(),
        };
        // Dropping `tx` without commit rolls back
        body(&mut links)?;
        tx.commit()?;
        Ok(())
    }

    fn linked_pages(
        &self,
        id: PageId,
        direction: LinkDirection,
    ) -> Result<Vec<Page>, StoreError> {
        let (join_column, filter_column) = match direction {
            LinkDirection::Incoming => ("from_page_id", "to_page_id"),
            LinkDirection::Outgoing => ("to_page_id", "from_page_id"),
        };
        let sql = format!(
            "SELECT p.id, p.name, p.content, p.created_at, p.updated_at
             FROM pages p
             INNER JOIN page_links pl ON p.id = pl.{join_column}
             WHERE pl.{filter_column} = ?1
             ORDER BY p.name"
        );

        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&sql)?;
        let pages = stmt
            .query_map(params![id.0], page_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(pages)
    }

    fn outbound_links(&self, id: PageId) -> Result<Vec<Link>, StoreError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT from_page_id, to_page_id, link_text, created_at
             FROM page_links WHERE from_page_id = ?1
             ORDER BY to_page_id",
        )?;
        let links = stmt
            .query_map(params![id.0], link_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(links)
    }

    fn all_links(&self) -> Result<Vec<Link>, StoreError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT from_page_id, to_page_id, link_text, created_at
             FROM page_links
             ORDER BY from_page_id, to_page_id",
        )?;
        let links = stmt
            .query_map([], link_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(links)
    }
}
