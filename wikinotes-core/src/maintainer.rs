//! Link graph maintenance.
//!
//! The edge table is derived data: the outbound edges of a page are always a
//! function of its current content and of which names currently resolve. The
//! maintainer recomputes that function for one page at a time, each inside its
//! own store transaction, and knows which other pages need the same treatment
//! when the set of names changes (a page is created or renamed).

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{ReconcileError, StoreError};
use crate::store::{LinkTransaction, PageStore};
use crate::wikilinks::{extract_wikilinks, references};
use wikinotes_types::{LinkDirection, Page, PageId};

/// Outcome of re-deriving one page's outbound edges.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Reconciliation {
    /// Targets that now have an edge from the page, in link order
    pub linked: Vec<PageId>,

    /// Names that did not resolve to any page
    pub dangling: Vec<String>,
}

/// Outcome of a multi-page pass (healing, relinking or a full reindex).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct HealReport {
    /// Pages inspected
    pub scanned: usize,

    /// Pages whose edges were re-derived
    pub healed: usize,

    /// Pages whose re-derivation failed and were skipped
    pub failed: usize,
}

/// Owns every write to the edge table.
#[derive(Clone)]
pub struct LinkMaintainer {
    store: Arc<dyn PageStore>,
}

impl LinkMaintainer {
    pub fn new(store: Arc<dyn PageStore>) -> Self {
        Self { store }
    }

    /// Replace the outbound edges of `page` with the links found in `content`.
    ///
    /// Runs as one transaction: on error the previous edges are kept.
    pub fn reconcile(&self, page: PageId, content: &str) -> Result<Reconciliation, ReconcileError> {
        let names = extract_wikilinks(content);
        let mut outcome = Reconciliation::default();

        self.store
            .link_transaction(&mut |tx| {
                outcome = replace_edges(tx, page, &names)?;
                Ok(())
            })
            .map_err(|source| ReconcileError { page, source })?;

        debug!(
            %page,
            linked = outcome.linked.len(),
            dangling = outcome.dangling.len(),
            "links reconciled"
        );
        Ok(outcome)
    }

    /// Like [`Self::reconcile`], but reads the page's content inside the same
    /// transaction that rewrites its edges.
    ///
    /// Returns `None` when the page no longer exists.
    pub fn rederive(&self, page: PageId) -> Result<Option<Reconciliation>, ReconcileError> {
        let mut outcome = None;

        self.store
            .link_transaction(&mut |tx| {
                outcome = match tx.page_content(page)? {
                    Some(content) => Some(replace_edges(tx, page, &extract_wikilinks(&content))?),
                    None => None,
                };
                Ok(())
            })
            .map_err(|source| ReconcileError { page, source })?;

        Ok(outcome)
    }

    /// Give pages that already mention `new_name` an edge to the page just
    /// created under that name.
    ///
    /// Scans every page. A page that fails to reconcile is logged and skipped
    /// so one broken page does not stop the others from healing.
    pub fn heal_backlinks(
        &self,
        new_page: PageId,
        new_name: &str,
    ) -> Result<HealReport, StoreError> {
        let pages = self.store.list_all()?;
        let candidates = pages
            .iter()
            .filter(|p| p.id != new_page && references(&p.content, new_name));

        let mut report = self.reconcile_each(candidates);
        report.scanned = pages.len();

        if report.healed > 0 || report.failed > 0 {
            info!(
                page = %new_page,
                name = %new_name,
                healed = report.healed,
                failed = report.failed,
                "healed dangling links"
            );
        }
        Ok(report)
    }

    /// Re-derive every page that currently links to `page`.
    ///
    /// After a rename the stored edges still point at the page even though
    /// the text `[[Old Name]]` no longer resolves; this drops them.
    pub fn relink_backlinkers(&self, page: PageId) -> Result<HealReport, StoreError> {
        let sources = self.store.linked_pages(page, LinkDirection::Incoming)?;
        let mut report = self.reconcile_each(sources.iter());
        report.scanned = sources.len();
        Ok(report)
    }

    /// Re-derive the edges of every page.
    pub fn reindex_all(&self) -> Result<HealReport, StoreError> {
        let pages = self.store.list_all()?;
        let mut report = self.reconcile_each(pages.iter());
        report.scanned = pages.len();

        info!(
            pages = report.scanned,
            failed = report.failed,
            "link graph reindexed"
        );
        Ok(report)
    }

    /// Re-derive each page from its committed content, not from the text in
    /// `pages`, which may be stale by the time the page is reached.
    fn reconcile_each<'a>(&self, pages: impl Iterator<Item = &'a Page>) -> HealReport {
        let mut report = HealReport::default();
        for page in pages {
            match self.rederive(page.id) {
                Ok(Some(_)) => report.healed += 1,
                Ok(None) => debug!(page = %page.id, "page deleted before relink"),
                Err(err) => {
                    warn!(page = %page.id, name = %page.name, %err, "skipping page");
                    report.failed += 1;
                }
            }
        }
        report
    }
}

fn replace_edges(
    tx: &mut dyn LinkTransaction,
    page: PageId,
    names: &[String],
) -> Result<Reconciliation, StoreError> {
    let mut outcome = Reconciliation::default();
    tx.clear_outbound(page)?;
    for name in names {
        match tx.resolve_name(name)? {
            Some(target) => {
                tx.upsert_link(page, target, name)?;
                outcome.linked.push(target);
            }
            None => outcome.dangling.push(name.clone()),
        }
    }
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SqliteStore;
    use wikinotes_types::NewPage;

    fn setup() -> (Arc<dyn PageStore>, LinkMaintainer) {
        let store: Arc<dyn PageStore> = Arc::new(SqliteStore::in_memory().unwrap());
        let maintainer = LinkMaintainer::new(store.clone());
        (store, maintainer)
    }

    fn targets(store: &Arc<dyn PageStore>, page: PageId) -> Vec<(PageId, String)> {
        store
            .outbound_links(page)
            .unwrap()
            .into_iter()
            .map(|l| (l.to_page_id, l.link_text))
            .collect()
    }

    #[test]
    fn test_reconcile_resolves_and_skips_dangling() {
        let (store, maintainer) = setup();
        let foo = store.create(&NewPage::new("Foo", "")).unwrap();
        let src = store.create(&NewPage::new("Src", "")).unwrap();

        let outcome = maintainer
            .reconcile(src.id, "[[ Foo ]] and [[Missing]]")
            .unwrap();

        assert_eq!(outcome.linked, vec![foo.id]);
        assert_eq!(outcome.dangling, vec!["Missing".to_string()]);
        assert_eq!(targets(&store, src.id), vec![(foo.id, "Foo".to_string())]);
    }

    #[test]
    fn test_reconcile_is_idempotent() {
        let (store, maintainer) = setup();
        let a = store.create(&NewPage::new("A", "")).unwrap();
        let b = store.create(&NewPage::new("B", "")).unwrap();
        let content = "[[A]] [[B]] [[A]]";

        let first = maintainer.reconcile(b.id, content).unwrap();
        let edges_first = targets(&store, b.id);
        let second = maintainer.reconcile(b.id, content).unwrap();
        let edges_second = targets(&store, b.id);

        assert_eq!(first, second);
        assert_eq!(edges_first, edges_second);
        assert_eq!(edges_first.len(), 2);
        assert!(edges_first.iter().any(|(id, _)| *id == a.id));
    }

    #[test]
    fn test_reconcile_replaces_stale_edges() {
        let (store, maintainer) = setup();
        let b = store.create(&NewPage::new("B", "")).unwrap();
        let c = store.create(&NewPage::new("C", "")).unwrap();
        let a = store.create(&NewPage::new("A", "")).unwrap();

        maintainer.reconcile(a.id, "[[B]] [[C]]").unwrap();
        maintainer.reconcile(a.id, "only [[C]]").unwrap();

        assert_eq!(targets(&store, a.id), vec![(c.id, "C".to_string())]);
        assert!(store
            .linked_pages(b.id, LinkDirection::Incoming)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_reconcile_of_deleted_page_fails_cleanly() {
        let (store, maintainer) = setup();
        let foo = store.create(&NewPage::new("Foo", "")).unwrap();
        let gone = store.create(&NewPage::new("Gone", "")).unwrap();
        store.delete(gone.id).unwrap();

        let err = maintainer.reconcile(gone.id, "[[Foo]]").unwrap_err();
        assert_eq!(err.page, gone.id);
        assert!(store
            .linked_pages(foo.id, LinkDirection::Incoming)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_heal_backlinks_only_touches_referencing_pages() {
        let (store, maintainer) = setup();
        let bar = store.create(&NewPage::new("Bar", "see [[Foo]]")).unwrap();
        store.create(&NewPage::new("Baz", "nothing here")).unwrap();
        let foo = store.create(&NewPage::new("Foo", "")).unwrap();

        let report = maintainer.heal_backlinks(foo.id, "Foo").unwrap();

        assert_eq!(
            report,
            HealReport {
                scanned: 3,
                healed: 1,
                failed: 0
            }
        );
        let backlinks = store.linked_pages(foo.id, LinkDirection::Incoming).unwrap();
        assert_eq!(backlinks.len(), 1);
        assert_eq!(backlinks[0].id, bar.id);
    }

    #[test]
    fn test_relink_backlinkers_drops_edges_after_rename() {
        let (store, maintainer) = setup();
        let foo = store.create(&NewPage::new("Foo", "")).unwrap();
        let bar = store.create(&NewPage::new("Bar", "[[Foo]]")).unwrap();
        maintainer.reconcile(bar.id, &bar.content).unwrap();

        store
            .update(foo.id, &wikinotes_types::PageUpdate::name("Renamed"))
            .unwrap();
        let report = maintainer.relink_backlinkers(foo.id).unwrap();

        assert_eq!(report.healed, 1);
        assert!(targets(&store, bar.id).is_empty());
    }

    #[test]
    fn test_reindex_all_rebuilds_every_page() {
        let (store, maintainer) = setup();
        let a = store.create(&NewPage::new("A", "[[B]]")).unwrap();
        let b = store.create(&NewPage::new("B", "[[A]]")).unwrap();

        let report = maintainer.reindex_all().unwrap();

        assert_eq!(report.scanned, 2);
        assert_eq!(report.healed, 2);
        assert_eq!(targets(&store, a.id), vec![(b.id, "B".to_string())]);
        assert_eq!(targets(&store, b.id), vec![(a.id, "A".to_string())]);
    }

    #[test]
    fn test_multi_page_pass_uses_committed_content() {
        let (store, maintainer) = setup();
        let foo = store.create(&NewPage::new("Foo", "")).unwrap();
        let baz = store.create(&NewPage::new("Baz", "")).unwrap();
        let bar = store.create(&NewPage::new("Bar", "[[Foo]]")).unwrap();
        let gone = store.create(&NewPage::new("Gone", "[[Foo]]")).unwrap();
        let snapshot = store.list_all().unwrap();

        // Edited and deleted after the snapshot was taken
        store
            .update(bar.id, &wikinotes_types::PageUpdate::content("[[Baz]]"))
            .unwrap();
        maintainer.reconcile(bar.id, "[[Baz]]").unwrap();
        store.delete(gone.id).unwrap();

        let report = maintainer.reconcile_each(snapshot.iter());

        assert_eq!(report.failed, 0);
        assert_eq!(report.healed, 3);
        assert_eq!(targets(&store, bar.id), vec![(baz.id, "Baz".to_string())]);
        assert!(store
            .linked_pages(foo.id, LinkDirection::Incoming)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_rederive_missing_page() {
        let (_, maintainer) = setup();
        assert_eq!(maintainer.rederive(PageId(99)).unwrap(), None);
    }
}
