//! Page tree model for the Quill wiki engine.
//!
//! Provides the [`Wiki`] and [`WikiPage`] entities with sibling ordering,
//! parent/child links and tag indexing, plus the mutation operations the
//! editor boundary drives (create, reorder, delete, content and tag edits).
//!
//! # Architecture
//!
//! Pages are stored in a `BTreeMap` keyed by page id. Deterministic map
//! iteration (id order) is what makes sibling ordering stable: `order`
//! values are advisory sort keys, and ties between equal `order` values
//! always break the same way.
//!
//! The serialized form of a [`Wiki`] is the snapshot the document compiler
//! embeds into compiled HTML, so the serde representation (camelCase keys,
//! tag sets as arrays) is part of the persisted format.

mod page;
mod slug;
mod wiki;

pub use page::WikiPage;
pub use slug::slugify;
pub use wiki::{Direction, ModelError, SEED_PAGE_ID, Wiki};
