//! Class files on disk and the packaged output archive.

use std::collections::BTreeMap;
use std::io::{Read, Write};
use std::path::{Component, Path};

use zip::write::SimpleFileOptions;

use jinc_util::errors::JincError;

/// `true` for a relative path that stays inside its base directory.
pub fn is_safe_relative(path: &str) -> bool {
    let path = Path::new(path);
    !path.as_os_str().is_empty()
        && path
            .components()
            .all(|c| matches!(c, Component::Normal(_)))
}

/// Write class files under `classes_dir`, replacing existing ones.
pub fn write_outputs(classes_dir: &Path, outputs: &BTreeMap<String, Vec<u8>>) -> miette::Result<()> {
    for (relative, bytes) in outputs {
        let path = classes_dir.join(relative);
        if let Some(parent) = path.parent() {
            jinc_util::fs::ensure_dir(parent).map_err(JincError::Io)?;
        }
        std::fs::write(&path, bytes).map_err(|e| JincError::Generic {
            message: format!("cannot write {}: {e}", path.display()),
        })?;
    }
    Ok(())
}

/// Delete class files, pruning directories left empty. Returns the paths that
/// existed and were removed.
pub fn delete_outputs<'a>(
    classes_dir: &Path,
    relative_paths: impl IntoIterator<Item = &'a String>,
) -> miette::Result<Vec<String>> {
    let mut deleted = Vec::new();
    for relative in relative_paths {
        let path = classes_dir.join(relative);
        let removed = jinc_util::fs::remove_file_pruning(&path, classes_dir).map_err(|e| {
            JincError::Generic {
                message: format!("cannot delete {}: {e}", path.display()),
            }
        })?;
        if removed {
            deleted.push(relative.clone());
        }
    }
    Ok(deleted)
}

/// Remove the whole classes directory.
pub fn wipe_classes(classes_dir: &Path) -> miette::Result<()> {
    if classes_dir.exists() {
        std::fs::remove_dir_all(classes_dir).map_err(|e| JincError::Generic {
            message: format!("cannot wipe {}: {e}", classes_dir.display()),
        })?;
        tracing::debug!("wiped {}", classes_dir.display());
    }
    Ok(())
}

/// Package every file under `classes_dir` into the archive at `archive_path`.
///
/// Entries are sorted and carry a fixed timestamp so identical class files
/// always produce an identical archive. Returns the number of entries.
pub fn package_archive(classes_dir: &Path, archive_path: &Path) -> miette::Result<usize> {
    let dir = archive_path.parent().unwrap_or(Path::new("."));
    jinc_util::fs::ensure_dir(dir).map_err(JincError::Io)?;

    let tmp = tempfile::NamedTempFile::new_in(dir).map_err(JincError::Io)?;
    let mut writer = zip::ZipWriter::new(tmp);
    let options = SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Deflated)
        .last_modified_time(zip::DateTime::default());

    let files = jinc_util::fs::collect_files(classes_dir);
    for file in &files {
        let Ok(relative) = file.strip_prefix(classes_dir) else {
            continue;
        };
        let name = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join("/");
        let bytes = std::fs::read(file).map_err(JincError::Io)?;
        writer.start_file(name.as_str(), options).map_err(zip_error)?;
        writer.write_all(&bytes).map_err(JincError::Io)?;
    }

    let tmp = writer.finish().map_err(zip_error)?;
    tmp.persist(archive_path).map_err(|e| JincError::Io(e.error))?;
    tracing::debug!(
        "packaged {} entries into {}",
        files.len(),
        archive_path.display()
    );
    Ok(files.len())
}

/// Read every entry of an archive into memory, keyed by entry name.
pub fn read_archive(archive_path: &Path) -> miette::Result<BTreeMap<String, Vec<u8>>> {
    let file = std::fs::File::open(archive_path).map_err(|e| JincError::Generic {
        message: format!("cannot open {}: {e}", archive_path.display()),
    })?;
    let mut archive = zip::ZipArchive::new(file).map_err(zip_error)?;
    let mut entries = BTreeMap::new();
    for i in 0..archive.len() {
        let mut entry = archive.by_index(i).map_err(zip_error)?;
        if entry.is_dir() {
            continue;
        }
        let mut bytes = Vec::new();
        entry.read_to_end(&mut bytes).map_err(JincError::Io)?;
        entries.insert(entry.name().to_string(), bytes);
    }
    Ok(entries)
}

pub(crate) fn zip_error(e: zip::result::ZipError) -> JincError {
    JincError::Generic {
        message: format!("archive error: {e}"),
    }
}
