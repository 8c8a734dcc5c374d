//! Wiki to HTML document compilation.

use std::fmt::Write;

use quill_model::{Wiki, WikiPage};
use quill_storage::{FsWikiStore, StoreError, TableStore};
use quill_tables::{TABLE_ERROR_HTML, escape_html};
use regex::Regex;

/// Global variable the snapshot script assigns the serialized wiki to.
pub const WIKI_DATA_GLOBAL: &str = "__WIKI_DATA__";

/// Element id of the snapshot script tag.
pub const SNAPSHOT_SCRIPT_ID: &str = "wiki-data";

/// How far back to scan for a `data-table-id` attribute when resolving a
/// bare error marker in page content.
const MARKER_SCAN_WINDOW: usize = 400;

/// Layout styles embedded in every compiled document so navigation works
/// without the external theme.
const BASE_STYLES: &str = "\
.wiki-layout { display: flex; min-height: 100vh; }
.wiki-sidebar { width: 260px; flex-shrink: 0; padding: 16px; border-right: 1px solid #ddd; }
.wiki-content { flex: 1; padding: 24px; }
.wiki-page { display: none; }
.wiki-page.active { display: block; }
.wiki-nav { list-style: none; padding-left: 12px; }
.wiki-nav-link.active { font-weight: bold; }
.wiki-page-meta { color: #666; font-size: 0.85em; }
.wiki-page-tag { background: #eef; border-radius: 3px; padding: 1px 6px; margin-right: 4px; }
.wiki-tag-cloud a { margin-right: 6px; }
.table-error { color: #a00; border: 1px dashed #a00; padding: 8px; }
.table-placeholder { border: 1px dashed #aaa; padding: 8px; }";

/// Client-side navigation: show the page from the URL fragment, else the
/// last-viewed page from session state, else the first page.
const NAV_SCRIPT: &str = "\
(function () {
  var STORAGE_KEY = 'quill-last-page';
  function allPages() { return document.querySelectorAll('.wiki-page'); }
  function show(id) {
    var target = document.getElementById(id);
    if (!target) { return; }
    var pages = allPages();
    for (var i = 0; i < pages.length; i++) { pages[i].classList.remove('active'); }
    target.classList.add('active');
    var links = document.querySelectorAll('.wiki-nav-link');
    for (var j = 0; j < links.length; j++) {
      links[j].classList.toggle('active', links[j].getAttribute('data-page-id') === id);
    }
    try { sessionStorage.setItem(STORAGE_KEY, id); } catch (e) { }
  }
  document.addEventListener('click', function (ev) {
    var link = ev.target.closest ? ev.target.closest('.wiki-nav-link') : null;
    if (!link) { return; }
    ev.preventDefault();
    var id = link.getAttribute('data-page-id');
    window.location.hash = id;
    show(id);
  });
  var initial = window.location.hash.replace(/^#/, '');
  if (!initial || !document.getElementById(initial)) {
    try { initial = sessionStorage.getItem(STORAGE_KEY); } catch (e) { initial = null; }
  }
  if (!initial || !document.getElementById(initial)) {
    var pages = allPages();
    initial = pages.length ? pages[0].id : null;
  }
  if (initial) { show(initial); }
})();";

/// Error returned when compilation fails outright.
///
/// Table resolution is best-effort and never lands here; only snapshot
/// serialization and (for [`save_wiki`]) persistence can fail.
#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    /// Wiki snapshot could not be serialized.
    #[error("Snapshot serialization failed: {0}")]
    Snapshot(#[from] serde_json::Error),
    /// Persisting the compiled artifact failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Live-editable placeholder markup for a table id.
///
/// The shape the editor renders an isolated table surface into, and the
/// shape the compiler resolves back into static markup.
#[must_use]
pub fn table_placeholder(table_id: &str) -> String {
    format!(r#"<div class="table-placeholder" data-table-id="{}"></div>"#, escape_html(table_id))
}

/// Compiles a wiki into one static, navigable HTML document.
pub struct DocumentCompiler<'a> {
    tables: &'a dyn TableStore,
    placeholder_re: Regex,
    table_id_re: Regex,
}

impl<'a> DocumentCompiler<'a> {
    /// Create a compiler resolving table ids through `tables`.
    ///
    /// # Panics
    ///
    /// Panics if the internal regexes fail to compile. This should never
    /// happen as they are compile-time constants.
    #[must_use]
    pub fn new(tables: &'a dyn TableStore) -> Self {
        Self {
            tables,
            placeholder_re: Regex::new(
                r#"<div class="table-placeholder" data-table-id="([^"]+)"[^>]*>\s*</div>"#,
            )
            .unwrap(),
            table_id_re: Regex::new(r#"data-table-id="([^"]+)""#).unwrap(),
        }
    }

    /// Compile `wiki` into a complete HTML document.
    ///
    /// The document carries the sidebar navigation, every page (hidden
    /// until selected), the tag cloud, the serialized snapshot and the
    /// navigation script. The `theme.css` stylesheet is referenced by
    /// link; [`save_wiki`] persists it next to the document.
    ///
    /// # Errors
    ///
    /// Returns [`CompileError::Snapshot`] if the wiki cannot be
    /// serialized. Table lookup failures never abort compilation; they
    /// substitute a visible error marker.
    pub fn compile(&self, wiki: &Wiki) -> Result<String, CompileError> {
        let snapshot = self.snapshot_json(wiki)?;

        let mut out = String::with_capacity(4096);
        out.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
        out.push_str("<meta charset=\"utf-8\">\n");
        out.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
        writeln!(out, "<title>{}</title>", escape_html(&wiki.name)).unwrap();
        out.push_str("<link rel=\"stylesheet\" href=\"theme.css\">\n");
        writeln!(out, "<style>\n{BASE_STYLES}\n</style>").unwrap();
        out.push_str("</head>\n<body>\n<div class=\"wiki-layout\">\n");

        self.write_sidebar(wiki, &mut out);
        self.write_pages(wiki, &mut out);

        out.push_str("</div>\n");
        writeln!(
            out,
            r#"<script id="{SNAPSHOT_SCRIPT_ID}">window.{WIKI_DATA_GLOBAL} = {snapshot};</script>"#
        )
        .unwrap();
        writeln!(out, "<script>\n{NAV_SCRIPT}\n</script>").unwrap();
        out.push_str("</body>\n</html>\n");

        Ok(out)
    }

    /// Serialize the snapshot, escaping `</` so embedded content can
    /// never terminate the script tag early.
    fn snapshot_json(&self, wiki: &Wiki) -> Result<String, serde_json::Error> {
        Ok(serde_json::to_string(wiki)?.replace("</", r"<\/"))
    }

    fn write_sidebar(&self, wiki: &Wiki, out: &mut String) {
        out.push_str("<nav class=\"wiki-sidebar\">\n");
        writeln!(out, "<h1 class=\"wiki-name\">{}</h1>", escape_html(&wiki.name)).unwrap();
        self.write_nav_list(wiki, None, out);
        out.push('\n');

        out.push_str("<div class=\"wiki-tag-cloud\">\n<h2>Tags</h2>\n");
        for tag in &wiki.tags {
            writeln!(
                out,
                r##"<a class="wiki-tag" href="#" data-tag="{0}">{0}</a>"##,
                escape_html(tag)
            )
            .unwrap();
        }
        out.push_str("</div>\n</nav>\n");
    }

    /// Recursively nested `<ul>` of pages sorted by `order`.
    fn write_nav_list(&self, wiki: &Wiki, parent: Option<&str>, out: &mut String) {
        let children = wiki.sorted_children(parent);
        if children.is_empty() {
            return;
        }
        out.push_str("<ul class=\"wiki-nav\">");
        for page in children {
            write!(
                out,
                r##"<li><a class="wiki-nav-link" href="#{0}" data-page-id="{0}">{1}</a>"##,
                escape_html(&page.id),
                escape_html(&page.title)
            )
            .unwrap();
            self.write_nav_list(wiki, Some(&page.id), out);
            out.push_str("</li>");
        }
        out.push_str("</ul>");
    }

    fn write_pages(&self, wiki: &Wiki, out: &mut String) {
        out.push_str("<main class=\"wiki-content\">\n");
        self.write_page_subtree(wiki, None, out);
        out.push_str("</main>\n");
    }

    /// Pages in tree order: roots sorted by `order`, each followed by its
    /// children. The navigation script shows the first emitted page when
    /// no fragment or session state selects one.
    fn write_page_subtree(&self, wiki: &Wiki, parent: Option<&str>, out: &mut String) {
        for page in wiki.sorted_children(parent) {
            self.write_page(page, out);
            self.write_page_subtree(wiki, Some(&page.id), out);
        }
    }

    fn write_page(&self, page: &WikiPage, out: &mut String) {
        writeln!(
            out,
            r#"<div id="{}" class="wiki-page">"#,
            escape_html(&page.id)
        )
        .unwrap();
        out.push_str("<header class=\"wiki-page-header\">\n");
        writeln!(out, "<h1>{}</h1>", escape_html(&page.title)).unwrap();
        out.push_str("<div class=\"wiki-page-meta\">");
        for tag in &page.tags {
            write!(out, r#"<span class="wiki-page-tag">{}</span>"#, escape_html(tag)).unwrap();
        }
        write!(
            out,
            r#"<span class="wiki-page-dates">Created {} · Modified {}</span>"#,
            page.created_at.format("%Y-%m-%d"),
            page.modified_at.format("%Y-%m-%d")
        )
        .unwrap();
        if let Some(author) = &page.author {
            write!(out, r#"<span class="wiki-page-author">by {}</span>"#, escape_html(author))
                .unwrap();
        }
        out.push_str("</div>\n</header>\n");
        writeln!(
            out,
            "<div class=\"wiki-page-body\">{}</div>",
            self.resolve_tables(&page.content)
        )
        .unwrap();
        out.push_str("</div>\n");
    }

    /// Resolve embedded tables in page content.
    ///
    /// Bare error markers are resolved first (their table id lives in the
    /// surrounding markup the editor saved), then live placeholders. Both
    /// passes are best-effort: a failed lookup substitutes or keeps a
    /// visible marker and logs, never aborting compilation.
    fn resolve_tables(&self, content: &str) -> String {
        let resolved = self.resolve_error_markers(content);
        self.resolve_placeholders(&resolved)
    }

    /// Replace live placeholder containers with static table markup.
    fn resolve_placeholders(&self, content: &str) -> String {
        let mut out = String::with_capacity(content.len());
        let mut last = 0;
        for caps in self.placeholder_re.captures_iter(content) {
            let whole = caps.get(0).unwrap();
            let id = &caps[1];
            out.push_str(&content[last..whole.start()]);
            match self.tables.get_table(id) {
                Ok((data, style)) => out.push_str(&quill_tables::render(&data, &style)),
                Err(e) => {
                    tracing::warn!(table_id = %id, error = %e, "Table placeholder unresolved");
                    out.push_str(TABLE_ERROR_HTML);
                }
            }
            last = whole.end();
        }
        out.push_str(&content[last..]);
        out
    }

    /// Resolve literal error markers left in saved content.
    ///
    /// Scans backward a bounded window from each marker for the nearest
    /// preceding `data-table-id` attribute; a store hit replaces the
    /// marker with real table markup, anything else leaves it intact.
    fn resolve_error_markers(&self, content: &str) -> String {
        let mut out = String::with_capacity(content.len());
        let mut pos = 0;
        while let Some(found) = content[pos..].find(TABLE_ERROR_HTML) {
            let start = pos + found;
            out.push_str(&content[pos..start]);

            let mut window_start = start.saturating_sub(MARKER_SCAN_WINDOW);
            while !content.is_char_boundary(window_start) {
                window_start -= 1;
            }
            let window = &content[window_start..start];

            let nearest_id = self
                .table_id_re
                .captures_iter(window)
                .last()
                .map(|caps| caps[1].to_owned());

            match nearest_id {
                Some(id) => match self.tables.get_table(&id) {
                    Ok((data, style)) => out.push_str(&quill_tables::render(&data, &style)),
                    Err(e) => {
                        tracing::warn!(table_id = %id, error = %e, "Error marker unresolved");
                        out.push_str(TABLE_ERROR_HTML);
                    }
                },
                None => {
                    tracing::warn!("Error marker without preceding table id");
                    out.push_str(TABLE_ERROR_HTML);
                }
            }
            pos = start + TABLE_ERROR_HTML.len();
        }
        out.push_str(&content[pos..]);
        out
    }
}

/// Compile and persist the full artifact for a wiki.
///
/// Rewrites the compiled document, the theme stylesheet and the snapshot
/// JSON in the wiki's directory. Each save rewrites the whole artifact;
/// there is no incremental persistence.
///
/// # Errors
///
/// Returns [`CompileError::Store`] when any of the three writes fails.
/// The caller is responsible for serializing saves to the same wiki.
pub fn save_wiki(store: &FsWikiStore, wiki: &Wiki, theme_css: &str) -> Result<(), CompileError> {
    let tables = store.tables(&wiki.name);
    let compiler = DocumentCompiler::new(&tables);
    let html = compiler.compile(wiki)?;
    let snapshot = serde_json::to_string_pretty(wiki)?;

    store.write_document(&wiki.name, &html)?;
    store.write_theme(&wiki.name, theme_css)?;
    store.write_snapshot(&wiki.name, &snapshot)?;
    Ok(())
}
