//! Export pipeline for both bundle modes.

use std::fs;
use std::path::Path;

use chrono::Utc;
use quill_compiler::{SNAPSHOT_SCRIPT_ID, WIKI_DATA_GLOBAL};
use quill_storage::{DOCUMENT_FILE, FsWikiStore, IMAGES_DIR, StoreError};
use regex::Regex;
use tempfile::TempDir;

use crate::archive::zip_dir;
use crate::images::rewrite_image_srcs;

/// External stylesheet link the compiler emits; single-file export
/// replaces it with the inlined theme.
const STYLESHEET_LINK: &str = r#"<link rel="stylesheet" href="theme.css">"#;

/// Error returned when an export fails.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// Wiki or a required source file (document, theme, snapshot) is
    /// absent. Raised before any archive is created.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// Archive assembly failed.
    #[error("Archive error: {0}")]
    Zip(#[from] zip::result::ZipError),
    /// Filesystem failure while copying or writing.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Produces portable wiki bundles.
///
/// Both modes share the invariant that no reference in the bundle points
/// outside it, and both fail atomically: required sources are read before
/// any temp workspace or archive exists.
pub struct Exporter<'a> {
    store: &'a FsWikiStore,
    external_script_re: Regex,
}

impl<'a> Exporter<'a> {
    /// Create an exporter over the given store.
    ///
    /// # Panics
    ///
    /// Panics if the internal regex fails to compile. This should never
    /// happen as it is a compile-time constant.
    #[must_use]
    pub fn new(store: &'a FsWikiStore) -> Self {
        Self {
            store,
            external_script_re: Regex::new(r#"<script[^>]*\bsrc="[^"]*"[^>]*>\s*</script>\n?"#)
                .unwrap(),
        }
    }

    /// Export the wiki's persisted directory as a ZIP archive.
    ///
    /// The directory is copied verbatim into a private temp workspace,
    /// image references in the document are rewritten to relative
    /// `images/` paths, and the copy is archived to `out_path`.
    ///
    /// # Errors
    ///
    /// Aborts before creating anything when the wiki or any required
    /// source file is missing. Temp cleanup runs on success and failure;
    /// a partial archive left by a failed run is removed best-effort.
    pub fn export_zip(&self, wiki: &str, out_path: &Path) -> Result<(), ExportError> {
        let document = self.store.read_document(wiki)?;
        self.store.read_theme(wiki)?;
        self.store.read_snapshot(wiki)?;

        let workspace = self.workspace(wiki)?;
        let result = self.run_zip(wiki, &document, workspace.path(), out_path);
        close_workspace(workspace);
        if result.is_err() {
            remove_stale_archive(out_path);
        }
        result
    }

    fn run_zip(
        &self,
        wiki: &str,
        document: &str,
        workspace: &Path,
        out_path: &Path,
    ) -> Result<(), ExportError> {
        let copy_root = workspace.join(wiki);
        copy_dir(&self.store.wiki_dir(wiki)?, &copy_root)?;
        fs::write(
            copy_root.join(DOCUMENT_FILE),
            rewrite_image_srcs(document, wiki),
        )?;
        zip_dir(&copy_root, out_path)
    }

    /// Export the wiki as one self-contained HTML file plus its images,
    /// archived to `out_path`.
    ///
    /// The theme is inlined into a `<style>` tag, external script
    /// references are stripped, the snapshot assignment is injected when
    /// the source document lacks one, image references are rewritten and
    /// a provenance comment is prepended after the doctype.
    ///
    /// # Errors
    ///
    /// Aborts before creating anything when the wiki or any required
    /// source file is missing.
    pub fn export_single_file(&self, wiki: &str, out_path: &Path) -> Result<(), ExportError> {
        let document = self.store.read_document(wiki)?;
        let theme = self.store.read_theme(wiki)?;
        let snapshot = self.store.read_snapshot(wiki)?;

        let html = self.build_single_file(&document, &theme, &snapshot, wiki);

        let workspace = self.workspace(wiki)?;
        let result = self.run_single_file(wiki, &html, workspace.path(), out_path);
        close_workspace(workspace);
        if result.is_err() {
            remove_stale_archive(out_path);
        }
        result
    }

    fn run_single_file(
        &self,
        wiki: &str,
        html: &str,
        workspace: &Path,
        out_path: &Path,
    ) -> Result<(), ExportError> {
        fs::write(workspace.join("index.html"), html)?;

        let images_src = self.store.wiki_dir(wiki)?.join(IMAGES_DIR);
        let images_dst = workspace.join(IMAGES_DIR);
        fs::create_dir_all(&images_dst)?;
        for name in self.store.list_images(wiki)? {
            fs::copy(images_src.join(&name), images_dst.join(&name))?;
        }

        zip_dir(workspace, out_path)
    }

    fn build_single_file(&self, document: &str, theme: &str, snapshot: &str, wiki: &str) -> String {
        let mut html = document.to_owned();

        // Inline the theme, replacing the external stylesheet link
        let style_block = format!("<style>\n{theme}\n</style>");
        if html.contains(STYLESHEET_LINK) {
            html = html.replace(STYLESHEET_LINK, &style_block);
        } else if let Some(idx) = html.find("</head>") {
            html.insert_str(idx, &style_block);
        }

        // No external script may survive in the bundle
        html = self.external_script_re.replace_all(&html, "").into_owned();

        // Ensure the snapshot assignment is present
        let marker = format!("window.{WIKI_DATA_GLOBAL}");
        if !html.contains(&marker) {
            let escaped = snapshot.replace("</", r"<\/");
            let tag = format!(
                "<script id=\"{SNAPSHOT_SCRIPT_ID}\">window.{WIKI_DATA_GLOBAL} = {escaped};</script>\n"
            );
            match html.find("</body>") {
                Some(idx) => html.insert_str(idx, &tag),
                None => html.push_str(&tag),
            }
        }

        html = rewrite_image_srcs(&html, wiki);

        // Provenance comment right after the doctype
        let comment = format!(
            "<!-- Exported from wiki \"{wiki}\" on {} -->\n",
            Utc::now().to_rfc3339()
        );
        match html.find('\n').filter(|_| html.starts_with("<!DOCTYPE")) {
            Some(doctype_end) => html.insert_str(doctype_end + 1, &comment),
            None => html.insert_str(0, &comment),
        }
        html
    }

    /// Private, timestamp-suffixed temp workspace. Concurrent exports of
    /// the same wiki each get their own.
    fn workspace(&self, wiki: &str) -> Result<TempDir, ExportError> {
        let timestamp = Utc::now().format("%Y%m%d%H%M%S");
        Ok(tempfile::Builder::new()
            .prefix(&format!("quill-export-{wiki}-{timestamp}-"))
            .tempdir()?)
    }
}

/// Remove the temp workspace, logging instead of escalating on failure.
fn close_workspace(workspace: TempDir) {
    if let Err(e) = workspace.close() {
        tracing::warn!(error = %e, "Failed to remove export workspace");
    }
}

/// Best-effort removal of a partial archive after a failed export.
fn remove_stale_archive(path: &Path) {
    if path.exists()
        && let Err(e) = fs::remove_file(path)
    {
        tracing::warn!(path = %path.display(), error = %e, "Failed to remove partial archive");
    }
}

/// Copy a directory tree.
fn copy_dir(src: &Path, dst: &Path) -> Result<(), ExportError> {
    fs::create_dir_all(dst)?;
    for entry in fs::read_dir(src)?.filter_map(Result::ok) {
        let target = dst.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copy_dir(&entry.path(), &target)?;
        } else {
            fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}
