//! Table data types.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// One positioned cell of a table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableCell {
    /// Zero-based row index. Row 0 is the header row when the table has
    /// a header.
    pub row: u32,
    /// Zero-based column index.
    pub col: u32,
    /// Cell text.
    #[serde(default)]
    pub content: String,
    /// True for header cells.
    #[serde(default)]
    pub is_header: bool,
}

/// Structured table content.
///
/// `cells` is sparse: a cell absent from the list renders as empty, and
/// that sparseness is preserved through render/extract round trips rather
/// than being defaulted to a dense grid.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableData {
    /// Globally unique table id, typically `{wikiSlug}_{timestamp}`.
    pub id: String,
    /// Row count, including the header row when present.
    pub rows: u32,
    /// Column count.
    pub columns: u32,
    /// Whether row 0 is a header row.
    pub has_header: bool,
    /// Sparse cell list.
    #[serde(default)]
    pub cells: Vec<TableCell>,
}

impl TableData {
    /// Build a `(row, col)` lookup over the sparse cell list.
    ///
    /// Rendering iterates `rows x columns`; the map avoids a linear scan
    /// per position. Later duplicates win, matching last-write semantics
    /// of editor updates.
    #[must_use]
    pub fn cell_index(&self) -> HashMap<(u32, u32), &TableCell> {
        self.cells.iter().map(|c| ((c.row, c.col), c)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_index_lookup() {
        let data = TableData {
            id: "t1".to_owned(),
            rows: 2,
            columns: 2,
            has_header: false,
            cells: vec![TableCell {
                row: 1,
                col: 0,
                content: "a".to_owned(),
                is_header: false,
            }],
        };

        let index = data.cell_index();
        assert_eq!(index.get(&(1, 0)).unwrap().content, "a");
        assert!(index.get(&(0, 0)).is_none());
    }

    #[test]
    fn test_sparse_cells_survive_serde() {
        let data = TableData {
            id: "t1".to_owned(),
            rows: 3,
            columns: 3,
            has_header: true,
            cells: vec![TableCell {
                row: 2,
                col: 2,
                content: "only".to_owned(),
                is_header: false,
            }],
        };

        let json = serde_json::to_string(&data).unwrap();
        let back: TableData = serde_json::from_str(&json).unwrap();
        assert_eq!(back, data);
        assert_eq!(back.cells.len(), 1);
    }
}
