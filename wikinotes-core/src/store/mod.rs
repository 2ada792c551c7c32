//! Page storage.
//!
//! [`PageStore`] is the seam between the link-graph logic and the database.
//! Page rows are mutated through the plain CRUD methods; edges are only ever
//! written through [`PageStore::link_transaction`], which the
//! [`crate::LinkMaintainer`] drives.

mod schema;
mod sqlite;

pub use sqlite::SqliteStore;

use crate::error::StoreError;
use wikinotes_types::{Link, LinkDirection, NewPage, Page, PageId, PageUpdate};

/// Edge operations available inside one atomic link update.
pub trait LinkTransaction {
    /// Remove every edge leaving `from`. Returns how many were removed.
    fn clear_outbound(&mut self, from: PageId) -> Result<usize, StoreError>;

    /// Content of `page` as committed, or `None` if it no longer exists.
    fn page_content(&mut self, page: PageId) -> Result<Option<String>, StoreError>;

    /// Look up the page currently called `name` (exact match).
    fn resolve_name(&mut self, name: &str) -> Result<Option<PageId>, StoreError>;

    /// Insert the edge `from -> to` unless it already exists.
    ///
    /// Returns `false` when the edge was already present.
    fn upsert_link(&mut self, from: PageId, to: PageId, link_text: &str)
        -> Result<bool, StoreError>;
}

/// Durable record of pages and their derived edges.
///
/// Implementations are shared between concurrent requests and must not
/// assume exclusive access.
pub trait PageStore: Send + Sync {
    fn find_by_id(&self, id: PageId) -> Result<Option<Page>, StoreError>;

    fn find_by_name(&self, name: &str) -> Result<Option<Page>, StoreError>;

    /// All pages, ordered by name.
    fn list_all(&self) -> Result<Vec<Page>, StoreError>;

    /// Insert a page. Fails with [`StoreError::NameTaken`] on a duplicate name.
    fn create(&self, page: &NewPage) -> Result<Page, StoreError>;

    /// Overwrite the provided fields and bump `updated_at`.
    ///
    /// Returns `None` when no page has this id.
    fn update(&self, id: PageId, update: &PageUpdate) -> Result<Option<Page>, StoreError>;

    /// Delete a page together with every edge it takes part in.
    ///
    /// Returns `false` when no page has this id.
    fn delete(&self, id: PageId) -> Result<bool, StoreError>;

    /// Run `body` inside a single transaction over the edge table.
    ///
    /// Commits if `body` returns `Ok`, rolls back otherwise, so readers only
    /// ever see the edge set from before or after the whole body.
    fn link_transaction(
        &self,
        body: &mut dyn FnMut(&mut dyn LinkTransaction) -> Result<(), StoreError>,
    ) -> Result<(), StoreError>;

    /// Pages on the other end of `id`'s edges in `direction`, ordered by name.
    fn linked_pages(&self, id: PageId, direction: LinkDirection)
        -> Result<Vec<Page>, StoreError>;

    /// Edges leaving `id`.
    fn outbound_links(&self, id: PageId) -> Result<Vec<Link>, StoreError>;

    /// Every committed edge.
    fn all_links(&self) -> Result<Vec<Link>, StoreError>;
}
