//! Persistence layer for the Quill wiki engine.
//!
//! A wiki's only long-lived persisted form is its compiled HTML document
//! plus sidecar files; this crate owns that on-disk layout and the keyed
//! table store sitting next to it.
//!
//! # Per-wiki layout
//!
//! ```text
//! {root}/{wiki}/
//!   document.html          compiled document
//!   theme.css              user theme
//!   wiki.json              serialized snapshot
//!   images/                uploaded images
//!   tables/{id}.json       table data
//!   tables/{id}_style.json table style
//! ```
//!
//! Table ids arriving from URL paths are percent-encoded by transport,
//! while ids embedded in HTML attributes are already decoded. The store
//! normalizes by percent-decoding **exactly once** at its boundary; call
//! sites never decode.

mod fs;
#[cfg(any(test, feature = "mock"))]
mod memory;
mod store;

pub use fs::{
    DOCUMENT_FILE, FsWikiStore, IMAGES_DIR, SNAPSHOT_FILE, TABLES_DIR, THEME_FILE, WikiTables,
};
#[cfg(any(test, feature = "mock"))]
pub use memory::MemoryTableStore;
pub use store::{StoreError, TableHalf, TableStore, decode_table_id};
