//! HTML document to wiki decompilation.
//!
//! The inverse of compilation. Works as a grammar over the shapes the
//! compiler emits (the snapshot script, `wiki-table` markup) rather than
//! a general HTML parser, and falls soft into a degraded reconstruction
//! when those shapes are missing or corrupt.

use std::collections::BTreeSet;

use quill_model::{SEED_PAGE_ID, Wiki};
use quill_storage::TableStore;
use quill_tables::extract;

use crate::compile::{WIKI_DATA_GLOBAL, table_placeholder};

/// Opening shape of a compiled static table.
const TABLE_OPEN: &str = r#"<table class="wiki-table" data-table-id=""#;
/// Closing shape of a compiled static table. Wiki tables never nest.
const TABLE_CLOSE: &str = "</table>";

/// Result of decompiling a document.
#[derive(Debug)]
pub struct DecompileResult {
    /// Reconstructed wiki. Page content is the editable variant: static
    /// tables are swapped for live placeholder containers.
    pub wiki: Wiki,
    /// Ids of tables recovered from static markup and re-persisted to
    /// the table store, sorted.
    pub recovered_tables: Vec<String>,
    /// True when the snapshot was missing or unparsable and the wiki was
    /// synthesized from raw page-content markup.
    pub degraded: bool,
}

/// Recovers a structured wiki from a previously compiled document.
pub struct DocumentDecompiler<'a> {
    tables: &'a dyn TableStore,
}

impl<'a> DocumentDecompiler<'a> {
    /// Create a decompiler persisting recovered tables into `tables`.
    #[must_use]
    pub fn new(tables: &'a dyn TableStore) -> Self {
        Self { tables }
    }

    /// Decompile a document into its structured wiki.
    ///
    /// Never fails: a missing or corrupt snapshot degrades to a
    /// single-page reconstruction carrying whatever content markup could
    /// be found, so raw content stays reachable. Static tables found
    /// anywhere in the document are extracted and re-persisted so edits
    /// have something to attach to even for tables predating the current
    /// session; tables inside page content are additionally swapped for
    /// live placeholders.
    #[must_use]
    pub fn decompile(&self, html: &str) -> DecompileResult {
        let (mut wiki, degraded) = match extract_snapshot(html) {
            Some(wiki) => (wiki, false),
            None => (degraded_wiki(html), true),
        };

        // The snapshot's tag aggregate may lag direct page edits;
        // reconcile without dropping curated tags.
        wiki.reconcile_tags();

        let mut recovered = BTreeSet::new();

        // Harvest static tables from the rendered document.
        let (_, document_ids) = self.swap_static_tables(html);
        recovered.extend(document_ids);

        // Rewrite page content to the editable form.
        for page in wiki.pages.values_mut() {
            let (editable, ids) = self.swap_static_tables(&page.content);
            if !ids.is_empty() {
                page.content = editable;
                recovered.extend(ids);
            }
        }

        DecompileResult {
            wiki,
            recovered_tables: recovered.into_iter().collect(),
            degraded,
        }
    }

    /// Replace every static wiki table with a live placeholder,
    /// persisting each extracted pair.
    ///
    /// Extraction or persistence failures keep the original markup in
    /// place and log; one bad table never loses the rest.
    fn swap_static_tables(&self, content: &str) -> (String, Vec<String>) {
        let mut out = String::with_capacity(content.len());
        let mut ids = Vec::new();
        let mut pos = 0;

        while let Some(found) = content[pos..].find(TABLE_OPEN) {
            let start = pos + found;
            let Some(close) = content[start..].find(TABLE_CLOSE) else {
                // Unterminated table: keep the remainder as-is
                break;
            };
            let end = start + close + TABLE_CLOSE.len();
            let span = &content[start..end];
            out.push_str(&content[pos..start]);

            match extract(span) {
                Ok((data, style)) => {
                    if let Err(e) = self.tables.put_table(&data, &style) {
                        tracing::warn!(table_id = %data.id, error = %e, "Failed to persist recovered table");
                    }
                    out.push_str(&table_placeholder(&data.id));
                    ids.push(data.id);
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to extract static table");
                    out.push_str(span);
                }
            }
            pos = end;
        }
        out.push_str(&content[pos..]);
        (out, ids)
    }
}

/// Locate and parse the embedded snapshot.
fn extract_snapshot(html: &str) -> Option<Wiki> {
    let marker = format!("window.{WIKI_DATA_GLOBAL} = ");
    let start = html.find(&marker)? + marker.len();
    let end = html[start..].find("</script>")? + start;
    let json = html[start..end].trim().trim_end_matches(';');

    match serde_json::from_str::<Wiki>(json) {
        Ok(wiki) => Some(wiki),
        Err(e) => {
            tracing::warn!(error = %e, "Snapshot unparsable, falling back to degraded reconstruction");
            None
        }
    }
}

/// Synthesize a single-page wiki from whatever content markup exists.
fn degraded_wiki(html: &str) -> Wiki {
    let name = slice_between(html, "<title>", "</title>")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .unwrap_or("recovered");

    let content = slice_between(html, r#"<main class="wiki-content">"#, "</main>")
        .or_else(|| slice_between(html, "<body>", "</body>"))
        .unwrap_or(html);

    let mut wiki = Wiki::new(name, None);
    if let Some(page) = wiki.pages.get_mut(SEED_PAGE_ID) {
        page.title = "Recovered content".to_owned();
        page.content = content.trim().to_owned();
    }
    wiki
}

/// First slice between two markers.
fn slice_between<'h>(haystack: &'h str, open: &str, close: &str) -> Option<&'h str> {
    let start = haystack.find(open)? + open.len();
    let end = haystack[start..].find(close)? + start;
    Some(&haystack[start..end])
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use pretty_assertions::assert_eq;
    use quill_storage::{MemoryTableStore, StoreError};
    use quill_tables::{StylePreset, TableCell, TableData, TableStyle, render};

    use super::*;
    use crate::compile::DocumentCompiler;

    fn tagged(tags: &[&str]) -> BTreeSet<String> {
        tags.iter().map(|t| (*t).to_owned()).collect()
    }

    fn sample_table(id: &str) -> (TableData, TableStyle) {
        let data = TableData {
            id: id.to_owned(),
            rows: 2,
            columns: 2,
            has_header: true,
            cells: vec![
                TableCell { row: 0, col: 0, content: "H1".to_owned(), is_header: true },
                TableCell { row: 0, col: 1, content: "H2".to_owned(), is_header: true },
                TableCell { row: 1, col: 0, content: "a".to_owned(), is_header: false },
                TableCell { row: 1, col: 1, content: "b".to_owned(), is_header: false },
            ],
        };
        let style = TableStyle::preset(id, StylePreset::Striped);
        (data, style)
    }

    fn build_wiki() -> Wiki {
        let mut wiki = Wiki::new("Demo", Some("alice".to_owned()));
        wiki.create_page("Specs", Some("introduction"), tagged(&["spec"]))
            .unwrap();
        wiki.create_page("Notes", None, tagged(&["misc"])).unwrap();
        wiki.set_page_content("specs", "<p>All the <b>specs</b>.</p>".to_owned())
            .unwrap();
        wiki
    }

    #[test]
    fn test_round_trip_reproduces_wiki() {
        let store = MemoryTableStore::new();
        let wiki = build_wiki();

        let html = DocumentCompiler::new(&store).compile(&wiki).unwrap();
        let result = DocumentDecompiler::new(&store).decompile(&html);

        assert!(!result.degraded);
        assert_eq!(result.wiki.name, wiki.name);
        assert_eq!(result.wiki.pages, wiki.pages);
        assert_eq!(result.wiki.tags, wiki.tags);
    }

    #[test]
    fn test_recompile_is_idempotent() {
        let store = MemoryTableStore::new();
        let wiki = build_wiki();
        let compiler = DocumentCompiler::new(&store);

        let first = compiler.compile(&wiki).unwrap();
        let result = DocumentDecompiler::new(&store).decompile(&first);
        let second = compiler.compile(&result.wiki).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn test_static_table_swapped_for_placeholder_and_persisted() {
        let (data, style) = sample_table("demo_5");
        let static_html = render(&data, &style);

        // Content carries a fully static table; the store starts empty
        let store = MemoryTableStore::new();
        let mut wiki = Wiki::new("Demo", None);
        wiki.set_page_content("introduction", format!("<p>before</p>{static_html}"))
            .unwrap();
        let html = DocumentCompiler::new(&store).compile(&wiki).unwrap();

        let result = DocumentDecompiler::new(&store).decompile(&html);

        assert_eq!(result.recovered_tables, vec!["demo_5".to_owned()]);
        let intro = result.wiki.page("introduction").unwrap();
        assert!(intro.content.contains(r#"class="table-placeholder""#));
        assert!(intro.content.contains(r#"data-table-id="demo_5""#));
        assert!(!intro.content.contains("<table"));

        let (stored, _) = store.get_table("demo_5").unwrap();
        assert_eq!(stored.cells, data.cells);
    }

    #[test]
    fn test_tables_predating_session_regain_store_entries() {
        let (data, style) = sample_table("old_table");
        let seeded = MemoryTableStore::new().with_table(data.clone(), style);
        let mut wiki = Wiki::new("Demo", None);
        wiki.set_page_content(
            "introduction",
            crate::compile::table_placeholder("old_table"),
        )
        .unwrap();
        let html = DocumentCompiler::new(&seeded).compile(&wiki).unwrap();

        // Fresh store: the sidecar files are gone
        let fresh = MemoryTableStore::new();
        let result = DocumentDecompiler::new(&fresh).decompile(&html);

        assert!(result.recovered_tables.contains(&"old_table".to_owned()));
        let (recovered, _) = fresh.get_table("old_table").unwrap();
        assert_eq!(recovered.cells, data.cells);
        // Snapshot content kept its placeholder untouched
        assert_eq!(
            result.wiki.page("introduction").unwrap().content,
            crate::compile::table_placeholder("old_table")
        );
    }

    #[test]
    fn test_missing_snapshot_degrades_to_single_page() {
        let store = MemoryTableStore::new();
        let html = "<html><head><title>Lost Wiki</title></head>\
                    <body><p>orphaned content</p></body></html>";

        let result = DocumentDecompiler::new(&store).decompile(html);

        assert!(result.degraded);
        assert_eq!(result.wiki.name, "Lost Wiki");
        let page = result.wiki.page("introduction").unwrap();
        assert!(page.content.contains("orphaned content"));
    }

    #[test]
    fn test_corrupt_snapshot_degrades_but_keeps_content() {
        let store = MemoryTableStore::new();
        let mut wiki = Wiki::new("Demo", None);
        wiki.set_page_content("introduction", "<p>precious</p>".to_owned())
            .unwrap();
        let html = DocumentCompiler::new(&store).compile(&wiki).unwrap();

        // Corrupt the snapshot JSON in place
        let broken = html.replace(
            &format!("window.{WIKI_DATA_GLOBAL} = {{"),
            &format!("window.{WIKI_DATA_GLOBAL} = {{!"),
        );
        let result = DocumentDecompiler::new(&store).decompile(&broken);

        assert!(result.degraded);
        let page = result.wiki.page("introduction").unwrap();
        assert!(page.content.contains("precious"));
    }

    #[test]
    fn test_decompile_reconciles_page_tags_into_aggregate() {
        let store = MemoryTableStore::new();
        let mut wiki = build_wiki();
        // Simulate a stale aggregate with a curated-only tag
        wiki.tags.insert("curated".to_owned());
        wiki.tags.remove("spec");
        let html = DocumentCompiler::new(&store).compile(&wiki).unwrap();

        let result = DocumentDecompiler::new(&store).decompile(&html);

        assert!(result.wiki.tags.contains("spec"));
        assert!(result.wiki.tags.contains("curated"));
    }

    #[test]
    fn test_unstored_table_marker_round_trips() {
        // A marker compiled for an unknown table decompiles into content
        // that still carries the marker, not a crash
        let store = MemoryTableStore::new();
        let mut wiki = Wiki::new("Demo", None);
        wiki.set_page_content(
            "introduction",
            crate::compile::table_placeholder("never_saved"),
        )
        .unwrap();
        let html = DocumentCompiler::new(&store).compile(&wiki).unwrap();

        let result = DocumentDecompiler::new(&store).decompile(&html);

        assert!(matches!(
            store.get_table("never_saved"),
            Err(StoreError::TableNotFound(_))
        ));
        assert_eq!(
            result.wiki.page("introduction").unwrap().content,
            crate::compile::table_placeholder("never_saved")
        );
    }
}
