//! Table store trait and error types.

use std::fmt;

use percent_encoding::percent_decode_str;
use quill_tables::{TableData, TableStyle};

/// Which half of a table's data/style pair is missing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TableHalf {
    /// The `{id}.json` data file.
    Data,
    /// The `{id}_style.json` style file.
    Style,
}

impl fmt::Display for TableHalf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Data => "data",
            Self::Style => "style",
        })
    }
}

/// Storage error with the semantic categories callers dispatch on.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Wiki directory does not exist.
    #[error("Wiki not found: {0}")]
    WikiNotFound(String),
    /// Wiki name is already taken.
    #[error("Wiki already exists: {0}")]
    WikiExists(String),
    /// Wiki name or table id would escape the storage root.
    #[error("Invalid storage key: {0}")]
    InvalidKey(String),
    /// Neither half of the table pair exists.
    #[error("Table not found: {0}")]
    TableNotFound(String),
    /// Exactly one half of the table pair exists. A corruption state:
    /// callers substitute a visible error marker, never fail the whole
    /// document.
    #[error("Table {id} is missing its {missing} file")]
    PartialTable {
        /// Table id.
        id: String,
        /// Which half is absent.
        missing: TableHalf,
    },
    /// A required per-wiki source file is absent.
    #[error("Wiki {wiki} is missing {file}")]
    SourceMissing {
        /// Wiki name.
        wiki: String,
        /// Missing file name.
        file: &'static str,
    },
    /// Sidecar file holds invalid JSON.
    #[error("Invalid JSON in {context}")]
    Json {
        /// File being parsed.
        context: String,
        /// Parse failure.
        #[source]
        source: serde_json::Error,
    },
    /// Underlying filesystem failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Keyed storage of table data/style pairs.
///
/// A pair sharing an id is always persisted and loaded together; one half
/// existing without the other surfaces as [`StoreError::PartialTable`].
pub trait TableStore: Send + Sync {
    /// Load the pair stored under `table_id`.
    ///
    /// `table_id` may arrive percent-encoded (URL transport) or decoded
    /// (HTML attributes); implementations normalize via
    /// [`decode_table_id`] before use.
    fn get_table(&self, table_id: &str) -> Result<(TableData, TableStyle), StoreError>;

    /// Persist both halves of a pair under `data.id`.
    fn put_table(&self, data: &TableData, style: &TableStyle) -> Result<(), StoreError>;
}

/// Percent-decode a table id exactly once.
///
/// Ids from URL paths are percent-encoded by transport; ids from HTML
/// attribute values are already decoded. Decoding once at the store
/// boundary makes both spellings address the same key. An id without
/// percent escapes decodes to itself, so decoding an already-decoded id
/// is a no-op.
#[must_use]
pub fn decode_table_id(raw: &str) -> String {
    percent_decode_str(raw).decode_utf8_lossy().into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_table_id_decodes_once() {
        assert_eq!(decode_table_id("demo%5F1700"), "demo_1700");
        // Already-decoded ids pass through unchanged
        assert_eq!(decode_table_id("demo_1700"), "demo_1700");
        // Double-encoded input is decoded a single time only
        assert_eq!(decode_table_id("demo%255F1700"), "demo%5F1700");
    }

    #[test]
    fn test_table_half_display() {
        assert_eq!(TableHalf::Data.to_string(), "data");
        assert_eq!(TableHalf::Style.to_string(), "style");
    }
}
