//! Sidebar navigation.
//!
//! Items come from configuration or, when none are configured, from the
//! documents storage lists. Consecutive items sharing a group name form one
//! collapsible group; the group holding the active document is expanded.

use mdview_renderer::doc_href;
use mdview_storage::Listing;
use serde::Serialize;

/// One link in the sidebar.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct NavItem {
    pub title: String,
    /// Document path the link opens.
    pub doc: String,
    /// Viewer link, `?doc=<encoded path>`.
    pub href: String,
    pub active: bool,
}

impl NavItem {
    pub fn new(title: impl Into<String>, doc: impl Into<String>) -> Self {
        let doc = doc.into();
        Self {
            title: title.into(),
            href: doc_href(&doc),
            doc,
            active: false,
        }
    }
}

/// A run of items, optionally under a collapsible heading.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct NavGroup {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub items: Vec<NavItem>,
    /// True when the group holds the active item.
    pub expanded: bool,
}

/// The whole sidebar.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Navigation {
    pub groups: Vec<NavGroup>,
}

impl Navigation {
    /// Build from `(title, doc, group)` entries, keeping their order.
    pub fn from_entries<I, T, D>(entries: I) -> Self
    where
        I: IntoIterator<Item = (T, D, Option<String>)>,
        T: Into<String>,
        D: Into<String>,
    {
        let mut groups: Vec<NavGroup> = Vec::new();
        for (title, doc, group) in entries {
            let item = NavItem::new(title, doc);
            match groups.last_mut() {
                Some(last) if last.name == group => last.items.push(item),
                _ => groups.push(NavGroup {
                    name: group,
                    items: vec![item],
                    expanded: false,
                }),
            }
        }
        Self { groups }
    }

    /// Build from a storage listing, grouping documents by their directory
    /// below `root`.
    pub fn from_listings(listings: Vec<Listing>, root: &str) -> Self {
        Self::from_entries(listings.into_iter().map(|listing| {
            let relative = listing.path.strip_prefix(root).unwrap_or(&listing.path);
            let group = relative
                .rsplit_once('/')
                .map(|(dir, _)| dir.to_owned());
            (listing.title, listing.path, group)
        }))
    }

    pub fn is_empty(&self) -> bool {
        self.groups.iter().all(|g| g.items.is_empty())
    }

    pub fn items(&self) -> impl Iterator<Item = &NavItem> {
        self.groups.iter().flat_map(|g| g.items.iter())
    }

    /// Copy of the sidebar with the item for `doc` marked active.
    ///
    /// With `None`, or a document that has no item, nothing is active.
    #[must_use]
    pub fn with_active(&self, doc: Option<&str>) -> Self {
        let mut nav = self.clone();
        for group in &mut nav.groups {
            for item in &mut group.items {
                item.active = doc == Some(item.doc.as_str());
            }
            group.expanded = group.items.iter().any(|item| item.active);
        }
        nav
    }

    pub fn active(&self) -> Option<&NavItem> {
        self.items().find(|item| item.active)
    }
}
