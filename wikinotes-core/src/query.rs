//! Read-side queries over the committed link graph.

use std::sync::Arc;

use crate::error::StoreError;
use crate::store::PageStore;
use crate::wikilinks::extract_wikilinks;
use wikinotes_types::{LinkDirection, LinkGraph, Page, PageId, ResolvedLink};

#[derive(Clone)]
pub struct LinkQuery {
    store: Arc<dyn PageStore>,
}

impl LinkQuery {
    pub fn new(store: Arc<dyn PageStore>) -> Self {
        Self { store }
    }

    /// Pages linking to `page`, ordered by name.
    pub fn backlinks_of(&self, page: PageId) -> Result<Vec<Page>, StoreError> {
        self.store.linked_pages(page, LinkDirection::Incoming)
    }

    /// Pages `page` links to, ordered by name.
    pub fn forward_links_of(&self, page: PageId) -> Result<Vec<Page>, StoreError> {
        self.store.linked_pages(page, LinkDirection::Outgoing)
    }

    /// Resolution state of each link written in `page`, in link order.
    ///
    /// Unlike the edge queries this reads the page text, so dangling links
    /// show up with `exists: false`. Returns `None` for an unknown page.
    pub fn link_status(&self, page: PageId) -> Result<Option<Vec<ResolvedLink>>, StoreError> {
        let Some(page) = self.store.find_by_id(page)? else {
            return Ok(None);
        };

        let statuses = extract_wikilinks(&page.content)
            .into_iter()
            .map(|name| -> Result<ResolvedLink, StoreError> {
                let page_id = self.store.find_by_name(&name)?.map(|p| p.id);
                Ok(ResolvedLink {
                    exists: page_id.is_some(),
                    page_id,
                    name,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Some(statuses))
    }

    /// Adjacency maps of every committed edge.
    pub fn graph(&self) -> Result<LinkGraph, StoreError> {
        let mut graph = LinkGraph::new();
        for link in self.store.all_links()? {
            graph.add_link(link.from_page_id, link.to_page_id);
        }
        Ok(graph)
    }
}
