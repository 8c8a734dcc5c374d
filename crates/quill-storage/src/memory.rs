//! In-memory table store for tests.

use std::collections::HashMap;
use std::sync::Mutex;

use quill_tables::{TableData, TableStyle};

use crate::store::{StoreError, TableHalf, TableStore, decode_table_id};

#[derive(Default)]
struct Entry {
    data: Option<TableData>,
    style: Option<TableStyle>,
}

/// In-memory [`TableStore`] with the same miss/partial semantics as the
/// filesystem store. Half-pairs can be staged directly to exercise the
/// corruption paths.
#[derive(Default)]
pub struct MemoryTableStore {
    entries: Mutex<HashMap<String, Entry>>,
}

impl MemoryTableStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style seeding of a full pair.
    #[must_use]
    pub fn with_table(self, data: TableData, style: TableStyle) -> Self {
        self.put_table(&data, &style).expect("memory put cannot fail");
        self
    }

    /// Stage only the data half, simulating a missing style file.
    pub fn put_data_only(&self, data: TableData) {
        let id = decode_table_id(&data.id);
        let mut entries = self.entries.lock().expect("store lock poisoned");
        entries.entry(id).or_default().data = Some(data);
    }

    /// Stage only the style half, simulating a missing data file.
    pub fn put_style_only(&self, style: TableStyle) {
        let id = decode_table_id(&style.id);
        let mut entries = self.entries.lock().expect("store lock poisoned");
        entries.entry(id).or_default().style = Some(style);
    }
}

impl TableStore for MemoryTableStore {
    fn get_table(&self, table_id: &str) -> Result<(TableData, TableStyle), StoreError> {
        let id = decode_table_id(table_id);
        let entries = self.entries.lock().expect("store lock poisoned");
        let entry = entries
            .get(&id)
            .ok_or_else(|| StoreError::TableNotFound(id.clone()))?;
        match (&entry.data, &entry.style) {
            (Some(data), Some(style)) => Ok((data.clone(), style.clone())),
            (Some(_), None) => Err(StoreError::PartialTable {
                id,
                missing: TableHalf::Style,
            }),
            (None, Some(_)) => Err(StoreError::PartialTable {
                id,
                missing: TableHalf::Data,
            }),
            (None, None) => Err(StoreError::TableNotFound(id)),
        }
    }

    fn put_table(&self, data: &TableData, style: &TableStyle) -> Result<(), StoreError> {
        let id = decode_table_id(&data.id);
        let mut entries = self.entries.lock().expect("store lock poisoned");
        entries.insert(
            id,
            Entry {
                data: Some(data.clone()),
                style: Some(style.clone()),
            },
        );
        Ok(())
    }
}
