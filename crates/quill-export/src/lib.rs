//! Offline bundle export.
//!
//! Produces portable copies of a wiki with no reference pointing outside
//! the bundle: either a ZIP of the wiki's persisted directory with image
//! references rewritten to relative paths, or a single self-contained
//! HTML file (CSS inlined, external scripts stripped, snapshot embedded)
//! archived together with its images.
//!
//! Every export works on a private temporary copy so concurrent edits to
//! the live document are never blocked or corrupted. Temp workspaces are
//! removed on success and failure alike; a cleanup failure is logged,
//! never escalated.

mod archive;
mod exporter;
mod images;

pub use exporter::{ExportError, Exporter};
