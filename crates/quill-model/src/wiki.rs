//! Wiki entity and tree mutation operations.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::page::WikiPage;
use crate::slug::{slugify, unique_slug};

/// Id of the seed page every new wiki starts with.
pub const SEED_PAGE_ID: &str = "introduction";

/// Direction for sibling reordering.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    /// Swap with the nearest sibling sorted before this page.
    Up,
    /// Swap with the nearest sibling sorted after this page.
    Down,
}

/// Error returned by tree mutations.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// Referenced page id does not exist in this wiki.
    #[error("Page not found: {0}")]
    PageNotFound(String),
}

/// A named tree of pages compiled into one HTML artifact.
///
/// `tags` is a derived aggregate: a superset of the union of all page tags
/// that may also carry manually curated tags with no current member.
/// [`Wiki::reconcile_tags`] recomputes the union without dropping curated
/// entries.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Wiki {
    /// Unique wiki name, also the persisted directory key.
    pub name: String,
    /// Pages keyed by id. `BTreeMap` iteration order (id order) is the
    /// deterministic tiebreak for equal sibling `order` values.
    pub pages: BTreeMap<String, WikiPage>,
    /// Tag aggregate; transported as a JSON array.
    #[serde(default)]
    pub tags: BTreeSet<String>,
    /// Author applied to newly created pages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_author: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp.
    pub modified_at: DateTime<Utc>,
}

impl Wiki {
    /// Create a wiki seeded with its `introduction` root page.
    #[must_use]
    pub fn new(name: impl Into<String>, default_author: Option<String>) -> Self {
        let now = Utc::now();
        let mut seed = WikiPage::new(
            SEED_PAGE_ID.to_owned(),
            "Introduction".to_owned(),
            None,
            0,
        );
        seed.content = "<p>Welcome to your new wiki.</p>".to_owned();
        seed.author = default_author.clone();

        let mut pages = BTreeMap::new();
        pages.insert(seed.id.clone(), seed);

        Self {
            name: name.into(),
            pages,
            tags: BTreeSet::new(),
            default_author,
            created_at: now,
            modified_at: now,
        }
    }

    /// Get a page by id.
    #[must_use]
    pub fn page(&self, id: &str) -> Option<&WikiPage> {
        self.pages.get(id)
    }

    /// Create a page, slugifying `title` into a unique id.
    ///
    /// The new page gets `order = pages.len()`, the wiki's default author,
    /// and is appended to the parent's `children` when `parent_id` is
    /// given. A title whose slug is already taken gets a numeric suffix
    /// (`specs-2`, `specs-3`, ...).
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::PageNotFound`] if `parent_id` references a
    /// page that does not exist. No state changes in that case.
    pub fn create_page(
        &mut self,
        title: &str,
        parent_id: Option<&str>,
        tags: BTreeSet<String>,
    ) -> Result<&WikiPage, ModelError> {
        let id = unique_slug(&slugify(title), |s| self.pages.contains_key(s));
        let order = i64::try_from(self.pages.len()).unwrap_or(i64::MAX);

        if let Some(pid) = parent_id {
            let parent = self
                .pages
                .get_mut(pid)
                .ok_or_else(|| ModelError::PageNotFound(pid.to_owned()))?;
            parent.children.push(id.clone());
            parent.touch();
        }

        let mut page = WikiPage::new(
            id.clone(),
            title.to_owned(),
            parent_id.map(str::to_owned),
            order,
        );
        page.author = self.default_author.clone();
        self.tags.extend(tags.iter().cloned());
        page.tags = tags;

        self.modified_at = page.modified_at;
        Ok(self.pages.entry(id).or_insert(page))
    }

    /// Swap `order` with the nearest sibling in the given direction.
    ///
    /// A sibling is any other page with the same `parent_id`, including
    /// `None`. Returns `Ok(false)` when no such sibling exists (page is
    /// already first/last).
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::PageNotFound`] if `page_id` does not exist.
    pub fn reorder_sibling(
        &mut self,
        page_id: &str,
        direction: Direction,
    ) -> Result<bool, ModelError> {
        let page = self
            .pages
            .get(page_id)
            .ok_or_else(|| ModelError::PageNotFound(page_id.to_owned()))?;
        let parent_id = page.parent_id.clone();
        let my_order = page.order;

        // Nearest sibling by order. Sibling orders are unique, so strict
        // comparisons suffice; map iteration keeps the scan deterministic.
        let mut nearest: Option<(String, i64)> = None;
        for (id, p) in &self.pages {
            if id == page_id || p.parent_id != parent_id {
                continue;
            }
            let candidate = match direction {
                Direction::Up => p.order < my_order,
                Direction::Down => p.order > my_order,
            };
            if !candidate {
                continue;
            }
            let closer = match (&nearest, direction) {
                (None, _) => true,
                (Some((_, o)), Direction::Up) => p.order > *o,
                (Some((_, o)), Direction::Down) => p.order < *o,
            };
            if closer {
                nearest = Some((id.clone(), p.order));
            }
        }

        let Some((sibling_id, sibling_order)) = nearest else {
            return Ok(false);
        };

        if let Some(p) = self.pages.get_mut(page_id) {
            p.order = sibling_order;
            p.touch();
        }
        if let Some(s) = self.pages.get_mut(&sibling_id) {
            s.order = my_order;
            s.touch();
        }
        self.modified_at = Utc::now();
        Ok(true)
    }

    /// Delete a page, reparenting its children to the deleted page's own
    /// parent (root level when the deleted page was a root page).
    ///
    /// The page is removed from `pages` and from its former parent's
    /// `children`; no dangling id survives in any `children` list.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::PageNotFound`] if `page_id` does not exist.
    pub fn delete_page(&mut self, page_id: &str) -> Result<WikiPage, ModelError> {
        let removed = self
            .pages
            .remove(page_id)
            .ok_or_else(|| ModelError::PageNotFound(page_id.to_owned()))?;

        // Children that still exist keep their relative order under the
        // new parent.
        let surviving: Vec<String> = removed
            .children
            .iter()
            .filter(|c| self.pages.contains_key(*c))
            .cloned()
            .collect();

        for child_id in &surviving {
            if let Some(child) = self.pages.get_mut(child_id) {
                child.parent_id = removed.parent_id.clone();
                child.touch();
            }
        }

        if let Some(pid) = &removed.parent_id
            && let Some(parent) = self.pages.get_mut(pid)
        {
            parent.children.retain(|c| c != page_id);
            parent.children.extend(surviving.iter().cloned());
            parent.touch();
        }

        self.modified_at = Utc::now();
        Ok(removed)
    }

    /// Replace a page's content.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::PageNotFound`] if `page_id` does not exist.
    pub fn set_page_content(&mut self, page_id: &str, content: String) -> Result<(), ModelError> {
        let page = self
            .pages
            .get_mut(page_id)
            .ok_or_else(|| ModelError::PageNotFound(page_id.to_owned()))?;
        page.content = content;
        page.touch();
        self.modified_at = page.modified_at;
        Ok(())
    }

    /// Replace a page's tags.
    ///
    /// New tags join the wiki aggregate. Tags removed from the page stay
    /// in the aggregate as curated entries; use [`Wiki::reconcile_tags`]
    /// after bulk edits.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::PageNotFound`] if `page_id` does not exist.
    pub fn set_page_tags(&mut self, page_id: &str, tags: BTreeSet<String>) -> Result<(), ModelError> {
        let page = self
            .pages
            .get_mut(page_id)
            .ok_or_else(|| ModelError::PageNotFound(page_id.to_owned()))?;
        page.tags = tags;
        page.touch();
        self.modified_at = page.modified_at;
        let union: Vec<String> = self
            .pages
            .values()
            .flat_map(|p| p.tags.iter().cloned())
            .collect();
        self.tags.extend(union);
        Ok(())
    }

    /// Rename a page. The id is stable and never changes with the title.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::PageNotFound`] if `page_id` does not exist.
    pub fn rename_page_title(&mut self, page_id: &str, title: String) -> Result<(), ModelError> {
        let page = self
            .pages
            .get_mut(page_id)
            .ok_or_else(|| ModelError::PageNotFound(page_id.to_owned()))?;
        page.title = title;
        page.touch();
        self.modified_at = page.modified_at;
        Ok(())
    }

    /// Union every page's tags into the wiki aggregate.
    ///
    /// Reconciles, never overwrites: curated tags with no current page
    /// member are preserved.
    pub fn reconcile_tags(&mut self) {
        let union: Vec<String> = self
            .pages
            .values()
            .flat_map(|p| p.tags.iter().cloned())
            .collect();
        self.tags.extend(union);
    }

    /// Pages with the given parent, stable-sorted by `order`.
    ///
    /// `None` selects root pages. Equal orders keep id order.
    #[must_use]
    pub fn sorted_children(&self, parent_id: Option<&str>) -> Vec<&WikiPage> {
        let mut pages: Vec<&WikiPage> = self
            .pages
            .values()
            .filter(|p| p.parent_id.as_deref() == parent_id)
            .collect();
        pages.sort_by_key(|p| p.order);
        pages
    }

    /// Root pages, stable-sorted by `order`.
    #[must_use]
    pub fn root_pages(&self) -> Vec<&WikiPage> {
        self.sorted_children(None)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn tagged(tags: &[&str]) -> BTreeSet<String> {
        tags.iter().map(|t| (*t).to_owned()).collect()
    }

    #[test]
    fn test_new_wiki_seeds_introduction() {
        let wiki = Wiki::new("Demo", None);

        let intro = wiki.page("introduction").unwrap();
        assert_eq!(intro.order, 0);
        assert_eq!(intro.parent_id, None);
        assert_eq!(intro.title, "Introduction");
    }

    #[test]
    fn test_create_page_under_parent() {
        let mut wiki = Wiki::new("Demo", None);

        let specs = wiki
            .create_page("Specs", Some("introduction"), BTreeSet::new())
            .unwrap();
        assert_eq!(specs.id, "specs");
        assert_eq!(specs.order, 1);
        assert_eq!(specs.parent_id.as_deref(), Some("introduction"));

        let intro = wiki.page("introduction").unwrap();
        assert_eq!(intro.children, vec!["specs".to_owned()]);
    }

    #[test]
    fn test_create_page_missing_parent_changes_nothing() {
        let mut wiki = Wiki::new("Demo", None);

        let result = wiki.create_page("Orphan", Some("nope"), BTreeSet::new());
        assert!(matches!(result, Err(ModelError::PageNotFound(_))));
        assert_eq!(wiki.pages.len(), 1);
    }

    #[test]
    fn test_create_page_duplicate_title_gets_suffix() {
        let mut wiki = Wiki::new("Demo", None);

        wiki.create_page("Specs", None, BTreeSet::new()).unwrap();
        let second = wiki.create_page("Specs", None, BTreeSet::new()).unwrap();
        assert_eq!(second.id, "specs-2");
    }

    #[test]
    fn test_create_page_applies_default_author_and_tags() {
        let mut wiki = Wiki::new("Demo", Some("alice".to_owned()));

        let page = wiki
            .create_page("Guide", None, tagged(&["howto"]))
            .unwrap();
        assert_eq!(page.author.as_deref(), Some("alice"));
        assert!(wiki.tags.contains("howto"));
    }

    #[test]
    fn test_sibling_order_consistent_with_insertion() {
        let mut wiki = Wiki::new("Demo", None);
        wiki.create_page("Alpha", None, BTreeSet::new()).unwrap();
        wiki.create_page("Beta", None, BTreeSet::new()).unwrap();
        wiki.create_page("Gamma", None, BTreeSet::new()).unwrap();

        let ids: Vec<&str> = wiki.root_pages().iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["introduction", "alpha", "beta", "gamma"]);
    }

    #[test]
    fn test_reorder_up_swaps_orders() {
        let mut wiki = Wiki::new("Demo", None);
        wiki.create_page("Alpha", None, BTreeSet::new()).unwrap();
        wiki.create_page("Beta", None, BTreeSet::new()).unwrap();

        let swapped = wiki.reorder_sibling("beta", Direction::Up).unwrap();
        assert!(swapped);

        let ids: Vec<&str> = wiki.root_pages().iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["introduction", "beta", "alpha"]);
    }

    #[test]
    fn test_reorder_down_swaps_orders() {
        let mut wiki = Wiki::new("Demo", None);
        wiki.create_page("Alpha", None, BTreeSet::new()).unwrap();

        let swapped = wiki
            .reorder_sibling("introduction", Direction::Down)
            .unwrap();
        assert!(swapped);

        let ids: Vec<&str> = wiki.root_pages().iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["alpha", "introduction"]);
    }

    #[test]
    fn test_reorder_at_boundary_is_noop() {
        let mut wiki = Wiki::new("Demo", None);
        wiki.create_page("Alpha", None, BTreeSet::new()).unwrap();

        // Introduction is already first
        let swapped = wiki.reorder_sibling("introduction", Direction::Up).unwrap();
        assert!(!swapped);

        let ids: Vec<&str> = wiki.root_pages().iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["introduction", "alpha"]);
    }

    #[test]
    fn test_reorder_only_considers_same_parent() {
        let mut wiki = Wiki::new("Demo", None);
        wiki.create_page("Child", Some("introduction"), BTreeSet::new())
            .unwrap();

        // Child has no siblings under introduction
        let swapped = wiki.reorder_sibling("child", Direction::Up).unwrap();
        assert!(!swapped);
    }

    #[test]
    fn test_delete_page_removes_everywhere() {
        let mut wiki = Wiki::new("Demo", None);
        wiki.create_page("Specs", Some("introduction"), BTreeSet::new())
            .unwrap();

        wiki.delete_page("specs").unwrap();

        assert!(wiki.page("specs").is_none());
        for page in wiki.pages.values() {
            assert!(!page.children.contains(&"specs".to_owned()));
        }
    }

    #[test]
    fn test_delete_page_reparents_children() {
        let mut wiki = Wiki::new("Demo", None);
        wiki.create_page("Middle", Some("introduction"), BTreeSet::new())
            .unwrap();
        wiki.create_page("Leaf", Some("middle"), BTreeSet::new())
            .unwrap();

        wiki.delete_page("middle").unwrap();

        let leaf = wiki.page("leaf").unwrap();
        assert_eq!(leaf.parent_id.as_deref(), Some("introduction"));
        let intro = wiki.page("introduction").unwrap();
        assert_eq!(intro.children, vec!["leaf".to_owned()]);
    }

    #[test]
    fn test_delete_root_page_promotes_children_to_root() {
        let mut wiki = Wiki::new("Demo", None);
        wiki.create_page("Child", Some("introduction"), BTreeSet::new())
            .unwrap();

        wiki.delete_page("introduction").unwrap();

        let child = wiki.page("child").unwrap();
        assert_eq!(child.parent_id, None);
        assert_eq!(wiki.root_pages()[0].id, "child");
    }

    #[test]
    fn test_delete_missing_page_errors() {
        let mut wiki = Wiki::new("Demo", None);
        assert!(matches!(
            wiki.delete_page("nope"),
            Err(ModelError::PageNotFound(_))
        ));
    }

    #[test]
    fn test_set_page_tags_keeps_curated_wiki_tags() {
        let mut wiki = Wiki::new("Demo", None);
        wiki.create_page("Guide", None, tagged(&["howto", "draft"]))
            .unwrap();

        // Dropping "draft" from the page keeps it in the aggregate
        wiki.set_page_tags("guide", tagged(&["howto"])).unwrap();
        assert!(wiki.tags.contains("draft"));
        assert!(wiki.tags.contains("howto"));
    }

    #[test]
    fn test_reconcile_tags_adds_missing_members() {
        let mut wiki = Wiki::new("Demo", None);
        wiki.create_page("Guide", None, BTreeSet::new()).unwrap();
        if let Some(page) = wiki.pages.get_mut("guide") {
            page.tags.insert("direct-edit".to_owned());
        }

        wiki.reconcile_tags();
        assert!(wiki.tags.contains("direct-edit"));
    }

    #[test]
    fn test_set_page_content_touches_timestamps() {
        let mut wiki = Wiki::new("Demo", None);
        let before = wiki.page("introduction").unwrap().modified_at;

        wiki.set_page_content("introduction", "<p>Hello</p>".to_owned())
            .unwrap();

        let intro = wiki.page("introduction").unwrap();
        assert_eq!(intro.content, "<p>Hello</p>");
        assert!(intro.modified_at >= before);
    }

    #[test]
    fn test_snapshot_serialization_is_stable() {
        let mut wiki = Wiki::new("Demo", None);
        wiki.create_page("Specs", Some("introduction"), tagged(&["spec"]))
            .unwrap();

        let first = serde_json::to_string(&wiki).unwrap();
        let second = serde_json::to_string(&wiki).unwrap();
        assert_eq!(first, second);

        let parsed: Wiki = serde_json::from_str(&first).unwrap();
        assert_eq!(parsed, wiki);
    }
}
