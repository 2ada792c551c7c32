//! # wikinotes-core
//!
//! Storage and link-graph maintenance for the wikinotes backend.
//!
//! Pages live in a [`PageStore`]. Every time a page's content is saved the
//! [`LinkMaintainer`] re-derives its outbound `[[wiki links]]` into an edge
//! table, and the [`LinkQuery`] layer answers backlink and forward-link
//! questions from those edges. [`Wiki`] ties the three together into the
//! operations the HTTP layer calls.

pub mod error;
pub mod maintainer;
pub mod query;
pub mod store;
pub mod wiki;
pub mod wikilinks;

pub use error::{ReconcileError, StoreError, WikiError};
pub use maintainer::{HealReport, LinkMaintainer, Reconciliation};
pub use query::LinkQuery;
pub use store::{LinkTransaction, PageStore, SqliteStore};
pub use wiki::Wiki;
pub use wikilinks::extract_wikilinks;

pub use wikinotes_types::{
    Link, LinkDirection, LinkGraph, NewPage, Page, PageId, PageUpdate, ResolvedLink,
};
