//! Wiki page entity.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single content unit with a stable id, a position in the tree and tags.
///
/// The serde representation is the snapshot wire format: camelCase keys,
/// ISO-8601 timestamps, tag set transported as a JSON array. A page's `id`
/// never changes after creation; anchors and tag-cloud links depend on it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WikiPage {
    /// Slug, unique within the wiki, used as the HTML anchor.
    pub id: String,
    /// Display title.
    pub title: String,
    /// Raw HTML fragment; may embed table placeholders.
    #[serde(default)]
    pub content: String,
    /// Parent page id; `None` for root pages.
    #[serde(default)]
    pub parent_id: Option<String>,
    /// Ordered child page ids. Authoritative for tree traversal and kept
    /// consistent with each child's `parent_id` by the mutation operations.
    #[serde(default)]
    pub children: Vec<String>,
    /// Page tags.
    #[serde(default)]
    pub tags: BTreeSet<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp, updated by every mutation.
    pub modified_at: DateTime<Utc>,
    /// Optional author.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    /// Sibling-relative sort key. Advisory: not contiguous or gap-free;
    /// ties break by id order.
    pub order: i64,
}

impl WikiPage {
    /// Create a page with the given identity and position.
    #[must_use]
    pub fn new(id: String, title: String, parent_id: Option<String>, order: i64) -> Self {
        let now = Utc::now();
        Self {
            id,
            title,
            content: String::new(),
            parent_id,
            children: Vec::new(),
            tags: BTreeSet::new(),
            created_at: now,
            modified_at: now,
            author: None,
            order,
        }
    }

    /// Update the modification timestamp.
    pub(crate) fn touch(&mut self) {
        self.modified_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_wire_format_uses_camel_case() {
        let page = WikiPage::new("intro".to_owned(), "Intro".to_owned(), None, 0);
        let json = serde_json::to_value(&page).unwrap();

        assert!(json.get("parentId").is_some());
        assert!(json.get("createdAt").is_some());
        assert!(json.get("modifiedAt").is_some());
        // Absent author is omitted entirely
        assert!(json.get("author").is_none());
        // Tags transport as an array
        assert!(json.get("tags").unwrap().is_array());
    }

    #[test]
    fn test_deserialize_tolerates_missing_optional_fields() {
        let json = r#"{
            "id": "intro",
            "title": "Intro",
            "createdAt": "2024-01-01T00:00:00Z",
            "modifiedAt": "2024-01-01T00:00:00Z",
            "order": 0
        }"#;
        let page: WikiPage = serde_json::from_str(json).unwrap();
        assert_eq!(page.content, "");
        assert_eq!(page.parent_id, None);
        assert!(page.children.is_empty());
        assert!(page.tags.is_empty());
    }
}
