//! ZIP archive assembly.

use std::fs::{self, File};
use std::io;
use std::path::Path;

use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use crate::exporter::ExportError;

/// Archive a directory's contents into a ZIP file at `out_path`.
///
/// Entry names are relative to `src` with forward slashes, so the bundle
/// unpacks with the same layout on every platform.
pub(crate) fn zip_dir(src: &Path, out_path: &Path) -> Result<(), ExportError> {
    let file = File::create(out_path)?;
    let mut writer = ZipWriter::new(file);
    add_dir(&mut writer, src, "")?;
    writer.finish()?;
    Ok(())
}

fn add_dir(
    writer: &mut ZipWriter<File>,
    dir: &Path,
    prefix: &str,
) -> Result<(), ExportError> {
    let options = SimpleFileOptions::default();

    let mut entries: Vec<_> = fs::read_dir(dir)?.filter_map(Result::ok).collect();
    entries.sort_by_key(std::fs::DirEntry::file_name);

    for entry in entries {
        let name = entry.file_name().to_string_lossy().into_owned();
        let entry_name = if prefix.is_empty() {
            name
        } else {
            format!("{prefix}/{name}")
        };

        if entry.file_type()?.is_dir() {
            writer.add_directory(format!("{entry_name}/"), options)?;
            add_dir(writer, &entry.path(), &entry_name)?;
        } else {
            writer.start_file(entry_name.as_str(), options)?;
            let mut source = File::open(entry.path())?;
            io::copy(&mut source, writer)?;
        }
    }
    Ok(())
}
