//! Diagnostics archive (`diagnostic.zip`).
//!
//! Every round adds a `session-<n>/description.txt` entry. The newest session
//! is stored first and only the most recent `retention` sessions are kept.

use std::io::{Read, Write};
use std::path::Path;

use zip::write::SimpleFileOptions;

use jinc_util::errors::JincError;

use crate::output::zip_error;

const DESCRIPTION_FILE_NAME: &str = "description.txt";

/// Append a session to the archive at `path`. Returns the session number.
pub fn append_session(path: &Path, description: &str, retention: usize) -> miette::Result<u64> {
    let previous = read_entries(path)?;
    let number = previous.first().map(|(n, _)| n + 1).unwrap_or(1);

    let dir = path.parent().unwrap_or(Path::new("."));
    jinc_util::fs::ensure_dir(dir).map_err(JincError::Io)?;
    let tmp = tempfile::NamedTempFile::new_in(dir).map_err(JincError::Io)?;
    let mut writer = zip::ZipWriter::new(tmp);
    let options = SimpleFileOptions::default();

    let sessions = std::iter::once((number, description.to_string()))
        .chain(previous)
        .take(retention.max(1));
    for (n, text) in sessions {
        writer
            .start_file(format!("session-{n}/{DESCRIPTION_FILE_NAME}"), options)
            .map_err(zip_error)?;
        writer.write_all(text.as_bytes()).map_err(JincError::Io)?;
    }

    let tmp = writer.finish().map_err(zip_error)?;
    tmp.persist(path).map_err(|e| JincError::Io(e.error))?;
    Ok(number)
}

/// Session descriptions, most recent first. A missing archive has none.
pub fn read_sessions(path: &Path) -> miette::Result<Vec<String>> {
    Ok(read_entries(path)?.into_iter().map(|(_, text)| text).collect())
}

fn read_entries(path: &Path) -> miette::Result<Vec<(u64, String)>> {
    let file = match std::fs::File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(JincError::Io(e).into()),
    };
    let mut archive = match zip::ZipArchive::new(file) {
        Ok(archive) => archive,
        Err(e) => {
            tracing::warn!("discarding unreadable {}: {e}", path.display());
            return Ok(Vec::new());
        }
    };
    let mut entries = Vec::new();
    for i in 0..archive.len() {
        let mut entry = archive.by_index(i).map_err(zip_error)?;
        let Some(number) = session_number(entry.name()) else {
            continue;
        };
        let mut text = String::new();
        entry.read_to_string(&mut text).map_err(JincError::Io)?;
        entries.push((number, text));
    }
    Ok(entries)
}

fn session_number(name: &str) -> Option<u64> {
    let (dir, file) = name.split_once('/')?;
    if file != DESCRIPTION_FILE_NAME {
        return None;
    }
    dir.strip_prefix("session-")?.parse().ok()
}
