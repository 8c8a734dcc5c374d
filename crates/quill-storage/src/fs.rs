//! Filesystem store implementation.
//!
//! Provides [`FsWikiStore`], owning the per-wiki directory layout under a
//! single root directory. Wiki-level files (document, theme, snapshot) and
//! the table sidecar files are all plain files; there is no database.

use std::fs;
use std::path::{Path, PathBuf};

use quill_tables::{TableData, TableStyle};

use crate::store::{StoreError, TableHalf, TableStore, decode_table_id};

/// Compiled document file name.
pub const DOCUMENT_FILE: &str = "document.html";
/// Theme stylesheet file name.
pub const THEME_FILE: &str = "theme.css";
/// Snapshot JSON file name.
pub const SNAPSHOT_FILE: &str = "wiki.json";
/// Images directory name.
pub const IMAGES_DIR: &str = "images";
/// Tables directory name.
pub const TABLES_DIR: &str = "tables";

/// Filesystem-backed wiki store.
///
/// # Example
///
/// ```ignore
/// use quill_storage::{FsWikiStore, TableStore};
///
/// let store = FsWikiStore::new(PathBuf::from("data"));
/// store.create_wiki("demo")?;
/// store.write_document("demo", "<!DOCTYPE html>...")?;
/// ```
pub struct FsWikiStore {
    /// Root directory holding one subdirectory per wiki.
    root: PathBuf,
}

impl FsWikiStore {
    /// Create a store rooted at `root`. The directory itself is created
    /// lazily on the first wiki creation.
    #[must_use]
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Storage root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding a wiki's persisted files.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidKey`] when `name` would escape the
    /// storage root.
    pub fn wiki_dir(&self, name: &str) -> Result<PathBuf, StoreError> {
        validate_key(name)?;
        Ok(self.root.join(name))
    }

    /// Create a wiki directory with its `images/` and `tables/`
    /// subdirectories.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::WikiExists`] when the name is taken; nothing
    /// is created in that case.
    pub fn create_wiki(&self, name: &str) -> Result<PathBuf, StoreError> {
        let dir = self.wiki_dir(name)?;
        if dir.exists() {
            return Err(StoreError::WikiExists(name.to_owned()));
        }
        fs::create_dir_all(dir.join(IMAGES_DIR))?;
        fs::create_dir_all(dir.join(TABLES_DIR))?;
        Ok(dir)
    }

    /// Whether a wiki directory exists.
    #[must_use]
    pub fn wiki_exists(&self, name: &str) -> bool {
        self.wiki_dir(name).is_ok_and(|d| d.is_dir())
    }

    /// List wiki names under the root, sorted.
    pub fn list_wikis(&self) -> Result<Vec<String>, StoreError> {
        let mut names = Vec::new();
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(names),
            Err(e) => return Err(e.into()),
        };
        for entry in entries.filter_map(Result::ok) {
            if entry.file_type().is_ok_and(|t| t.is_dir()) {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        names.sort();
        Ok(names)
    }

    /// Read the compiled document.
    pub fn read_document(&self, name: &str) -> Result<String, StoreError> {
        self.read_wiki_file(name, DOCUMENT_FILE)
    }

    /// Write the compiled document.
    pub fn write_document(&self, name: &str, html: &str) -> Result<(), StoreError> {
        self.write_wiki_file(name, DOCUMENT_FILE, html)
    }

    /// Read the theme stylesheet.
    pub fn read_theme(&self, name: &str) -> Result<String, StoreError> {
        self.read_wiki_file(name, THEME_FILE)
    }

    /// Write the theme stylesheet.
    pub fn write_theme(&self, name: &str, css: &str) -> Result<(), StoreError> {
        self.write_wiki_file(name, THEME_FILE, css)
    }

    /// Read the snapshot JSON.
    pub fn read_snapshot(&self, name: &str) -> Result<String, StoreError> {
        self.read_wiki_file(name, SNAPSHOT_FILE)
    }

    /// Write the snapshot JSON.
    pub fn write_snapshot(&self, name: &str, json: &str) -> Result<(), StoreError> {
        self.write_wiki_file(name, SNAPSHOT_FILE, json)
    }

    /// List image file names for a wiki, sorted.
    pub fn list_images(&self, name: &str) -> Result<Vec<String>, StoreError> {
        let dir = self.existing_wiki_dir(name)?.join(IMAGES_DIR);
        let mut names = Vec::new();
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(names),
            Err(e) => return Err(e.into()),
        };
        for entry in entries.filter_map(Result::ok) {
            if entry.file_type().is_ok_and(|t| t.is_file()) {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        names.sort();
        Ok(names)
    }

    fn existing_wiki_dir(&self, name: &str) -> Result<PathBuf, StoreError> {
        let dir = self.wiki_dir(name)?;
        if !dir.is_dir() {
            return Err(StoreError::WikiNotFound(name.to_owned()));
        }
        Ok(dir)
    }

    fn read_wiki_file(&self, name: &str, file: &'static str) -> Result<String, StoreError> {
        let path = self.existing_wiki_dir(name)?.join(file);
        match fs::read_to_string(&path) {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(StoreError::SourceMissing {
                wiki: name.to_owned(),
                file,
            }),
            Err(e) => Err(e.into()),
        }
    }

    fn write_wiki_file(&self, name: &str, file: &str, content: &str) -> Result<(), StoreError> {
        let path = self.existing_wiki_dir(name)?.join(file);
        fs::write(path, content)?;
        Ok(())
    }

    fn table_paths(&self, name: &str, table_id: &str) -> Result<(PathBuf, PathBuf), StoreError> {
        validate_key(table_id)?;
        let tables = self.existing_wiki_dir(name)?.join(TABLES_DIR);
        Ok((
            tables.join(format!("{table_id}.json")),
            tables.join(format!("{table_id}_style.json")),
        ))
    }

    /// Table store scoped to one wiki.
    #[must_use]
    pub fn tables<'a>(&'a self, wiki: &'a str) -> WikiTables<'a> {
        WikiTables { store: self, wiki }
    }
}

/// [`TableStore`] view over one wiki's `tables/` directory.
pub struct WikiTables<'a> {
    store: &'a FsWikiStore,
    wiki: &'a str,
}

impl TableStore for WikiTables<'_> {
    fn get_table(&self, table_id: &str) -> Result<(TableData, TableStyle), StoreError> {
        let id = decode_table_id(table_id);
        let (data_path, style_path) = self.store.table_paths(self.wiki, &id)?;

        match (data_path.is_file(), style_path.is_file()) {
            (false, false) => Err(StoreError::TableNotFound(id)),
            (true, false) => Err(StoreError::PartialTable {
                id,
                missing: TableHalf::Style,
            }),
            (false, true) => Err(StoreError::PartialTable {
                id,
                missing: TableHalf::Data,
            }),
            (true, true) => {
                let data = read_json(&data_path)?;
                let style = read_json(&style_path)?;
                Ok((data, style))
            }
        }
    }

    fn put_table(&self, data: &TableData, style: &TableStyle) -> Result<(), StoreError> {
        let id = decode_table_id(&data.id);
        let (data_path, style_path) = self.store.table_paths(self.wiki, &id)?;

        if let Some(parent) = data_path.parent() {
            fs::create_dir_all(parent)?;
        }
        write_json(&data_path, data)?;
        write_json(&style_path, style)?;
        Ok(())
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, StoreError> {
    let content = fs::read_to_string(path)?;
    serde_json::from_str(&content).map_err(|source| StoreError::Json {
        context: path.display().to_string(),
        source,
    })
}

fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<(), StoreError> {
    let json = serde_json::to_string_pretty(value).map_err(|source| StoreError::Json {
        context: path.display().to_string(),
        source,
    })?;
    fs::write(path, json)?;
    Ok(())
}

/// Reject keys that would escape the storage root.
fn validate_key(key: &str) -> Result<(), StoreError> {
    if key.is_empty()
        || key == "."
        || key == ".."
        || key.contains('/')
        || key.contains('\\')
        || key.contains('\0')
    {
        return Err(StoreError::InvalidKey(key.to_owned()));
    }
    Ok(())
}
