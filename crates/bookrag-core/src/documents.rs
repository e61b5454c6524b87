//! Source document enumeration for index builds.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::error::{Error, Result};

/// Raw documents keyed by source id. Ordered, so chunk order is reproducible.
pub type Documents = BTreeMap<String, String>;

/// Read every `*.txt` file under `root`. Unreadable files are logged and skipped.
pub fn read_documents(root: &Path) -> Result<Documents> {
    let files = list_txt_files(root)?;
    if files.is_empty() {
        warn!(dir = %root.display(), "no .txt files found");
    }
    let mut documents = Documents::new();
    for (file_index, path) in files.iter().enumerate() {
        info!("Processing file {}/{}: {}", file_index + 1, files.len(), path.display());
        match read_document(path) {
            Ok(text) => {
                documents.insert(source_id(root, path), text);
            }
            Err(e) => warn!(error = %e, "skipping document"),
        }
    }
    Ok(documents)
}

/// Read one document as UTF-8.
pub fn read_document(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|source| Error::DocumentRead { path: path.to_path_buf(), source })
}

/// Source id of `path`: its path relative to `root`, `/`-separated.
pub fn source_id(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

pub fn list_txt_files(root: &Path) -> Result<Vec<PathBuf>> {
    if !root.is_dir() {
        return Err(Error::NotFound(format!("textbooks directory {}", root.display())));
    }
    let mut txt_files = Vec::new();
    for entry in walkdir::WalkDir::new(root) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(error = %e, "skipping unreadable directory entry");
                continue;
            }
        };
        let path = entry.path();
        if entry.file_type().is_file() && path.extension().and_then(|s| s.to_str()) == Some("txt") {
            txt_files.push(path.to_path_buf());
        }
    }
    txt_files.sort();
    Ok(txt_files)
}
