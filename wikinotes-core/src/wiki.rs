//! The page operations offered to the HTTP layer.
//!
//! Page mutations and link maintenance are deliberately decoupled: a page
//! write that succeeded is reported as a success even if re-deriving its links
//! failed afterwards. The edge table catches up on the next save of the page
//! or on [`Wiki::reindex`].

use std::sync::Arc;

use tracing::{info, warn};

use crate::error::{Result, WikiError};
use crate::maintainer::{HealReport, LinkMaintainer};
use crate::query::LinkQuery;
use crate::store::PageStore;
use wikinotes_types::{LinkGraph, NewPage, Page, PageId, PageUpdate, ResolvedLink};

#[derive(Clone)]
pub struct Wiki {
    store: Arc<dyn PageStore>,
    maintainer: LinkMaintainer,
    query: LinkQuery,
}

impl Wiki {
    pub fn new(store: Arc<dyn PageStore>) -> Self {
        Self {
            maintainer: LinkMaintainer::new(store.clone()),
            query: LinkQuery::new(store.clone()),
            store,
        }
    }

    pub fn maintainer(&self) -> &LinkMaintainer {
        &self.maintainer
    }

    pub fn create_page(&self, new_page: NewPage) -> Result<Page> {
        let name = new_page.name.trim();
        if name.is_empty() {
            return Err(WikiError::Validation("page name is required".into()));
        }

        let page = self.store.create(&NewPage::new(name, new_page.content))?;
        info!(page = %page.id, name = %page.name, "page created");

        self.reconcile_quietly(&page);
        if let Err(err) = self.maintainer.heal_backlinks(page.id, &page.name) {
            warn!(page = %page.id, %err, "backlink healing skipped");
        }

        Ok(page)
    }

    pub fn update_page(&self, id: PageId, update: PageUpdate) -> Result<Page> {
        let update = update.normalized();
        let previous = self
            .store
            .find_by_id(id)?
            .ok_or_else(|| WikiError::NotFound(id.to_string()))?;

        let page = self
            .store
            .update(id, &update)?
            .ok_or_else(|| WikiError::NotFound(id.to_string()))?;
        info!(page = %page.id, name = %page.name, "page updated");

        self.reconcile_quietly(&page);

        if page.name != previous.name {
            // Links written against the old name stop resolving, links
            // written against the new one start to.
            if let Err(err) = self.maintainer.relink_backlinkers(page.id) {
                warn!(page = %page.id, %err, "relinking after rename skipped");
            }
            if let Err(err) = self.maintainer.heal_backlinks(page.id, &page.name) {
                warn!(page = %page.id, %err, "backlink healing skipped");
            }
        }

        Ok(page)
    }

    pub fn delete_page(&self, id: PageId) -> Result<()> {
        if !self.store.delete(id)? {
            return Err(WikiError::NotFound(id.to_string()));
        }
        info!(page = %id, "page deleted");
        Ok(())
    }

    pub fn get_page(&self, id: PageId) -> Result<Page> {
        self.store
            .find_by_id(id)?
            .ok_or_else(|| WikiError::NotFound(id.to_string()))
    }

    pub fn get_page_by_name(&self, name: &str) -> Result<Page> {
        self.store
            .find_by_name(name)?
            .ok_or_else(|| WikiError::NotFound(name.to_string()))
    }

    /// All pages, ordered by name.
    pub fn list_pages(&self) -> Result<Vec<Page>> {
        Ok(self.store.list_all()?)
    }

    /// Pages linking to `id`. Empty for an unknown page.
    pub fn backlinks(&self, id: PageId) -> Result<Vec<Page>> {
        Ok(self.query.backlinks_of(id)?)
    }

    /// Pages `id` links to. Empty for an unknown page.
    pub fn forward_links(&self, id: PageId) -> Result<Vec<Page>> {
        Ok(self.query.forward_links_of(id)?)
    }

    pub fn link_status(&self, id: PageId) -> Result<Vec<ResolvedLink>> {
        self.query
            .link_status(id)?
            .ok_or_else(|| WikiError::NotFound(id.to_string()))
    }

    pub fn graph(&self) -> Result<LinkGraph> {
        Ok(self.query.graph()?)
    }

    /// Re-derive the links of every page.
    pub fn reindex(&self) -> Result<HealReport> {
        Ok(self.maintainer.reindex_all()?)
    }

    fn reconcile_quietly(&self, page: &Page) {
        if let Err(err) = self.maintainer.reconcile(page.id, &page.content) {
            warn!(page = %page.id, %err, "link update failed, will retry on next save");
        }
    }
}
