//! Shared types for wikinotes
//!
//! This crate provides the page and link records exchanged between the
//! storage core and the HTTP layer, plus the request shapes for mutations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Page identifier, assigned by the store and never reused for another page
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct PageId(pub i64);

impl PageId {
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl From<i64> for PageId {
    fn from(id: i64) -> Self {
        PageId(id)
    }
}

impl From<PageId> for i64 {
    fn from(id: PageId) -> Self {
        id.0
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A named text document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub id: PageId,

    /// Display name, also the key `[[...]]` links resolve against
    pub name: String,

    pub content: String,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

/// A derived edge from one page to another
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub from_page_id: PageId,
    pub to_page_id: PageId,

    /// The name as written inside the brackets, after trimming
    pub link_text: String,

    pub created_at: DateTime<Utc>,
}

/// Input for creating a page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPage {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub content: String,
}

impl NewPage {
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }
}

/// Partial update of a page. Fields left as `None` keep their current value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl PageUpdate {
    pub fn name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            content: None,
        }
    }

    pub fn content(content: impl Into<String>) -> Self {
        Self {
            name: None,
            content: Some(content.into()),
        }
    }

    /// Treat empty strings as "not provided" and trim the name.
    ///
    /// Clients send `""` for untouched fields, so an empty value never
    /// overwrites stored data.
    pub fn normalized(&self) -> Self {
        Self {
            name: self
                .name
                .as_deref()
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .map(str::to_string),
            content: self.content.clone().filter(|c| !c.is_empty()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.content.is_none()
    }
}

/// Which side of an edge a query starts from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkDirection {
    /// Edges pointing at the page (backlinks)
    Incoming,
    /// Edges leaving the page (forward links)
    Outgoing,
}

/// Resolution state of one link written in a page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedLink {
    pub name: String,
    pub exists: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_id: Option<PageId>,
}

/// Snapshot of every committed edge as adjacency maps
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkGraph {
    /// Map from page to the pages it links to
    pub outgoing: BTreeMap<PageId, Vec<PageId>>,

    /// Map from page to the pages linking to it (backlinks)
    pub incoming: BTreeMap<PageId, Vec<PageId>>,
}

impl LinkGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a link from source to target
    pub fn add_link(&mut self, source: PageId, target: PageId) {
        self.outgoing.entry(source).or_default().push(target);
        self.incoming.entry(target).or_default().push(source);
    }

    /// Get backlinks for a given page
    pub fn backlinks(&self, page: PageId) -> Vec<PageId> {
        self.incoming.get(&page).cloned().unwrap_or_default()
    }

    /// Get outgoing links for a given page
    pub fn outgoing(&self, page: PageId) -> Vec<PageId> {
        self.outgoing.get(&page).cloned().unwrap_or_default()
    }

    pub fn edge_count(&self) -> usize {
        self.outgoing.values().map(Vec::len).sum()
    }
}
