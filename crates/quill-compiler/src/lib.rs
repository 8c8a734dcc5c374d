//! Bidirectional wiki document compiler.
//!
//! The canonical persisted form of a wiki is compiled HTML, not
//! structured data. This crate owns both directions of that boundary:
//!
//! - [`DocumentCompiler`] serializes a [`Wiki`](quill_model::Wiki) plus a
//!   CSS theme into one static HTML document carrying a navigation
//!   sidebar, all pages (one visible at a time via an embedded script), a
//!   tag cloud and a machine-readable snapshot of the tree.
//! - [`DocumentDecompiler`] recovers the structured wiki back out of that
//!   document. It is a parser over the specific tag/attribute/script
//!   shapes the compiler emits, falling soft into a degraded
//!   reconstruction rather than attempting general HTML parsing.
//!
//! Embedded tables resolve through a [`TableStore`](quill_storage::TableStore):
//! live placeholders compile into static `<table>` markup, and static
//! tables decompile back into live placeholders, persisting recovered
//! pairs along the way.

mod compile;
mod decompile;

pub use compile::{
    CompileError, DocumentCompiler, SNAPSHOT_SCRIPT_ID, WIKI_DATA_GLOBAL, save_wiki,
    table_placeholder,
};
pub use decompile::{DecompileResult, DocumentDecompiler};
