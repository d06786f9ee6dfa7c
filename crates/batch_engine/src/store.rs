use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use batch_core::{Canonicalizer, RejectList, RejectRecord};
use batch_logging::{batch_info, batch_warn};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("invalid reject data: {0}")]
    Json(#[from] serde_json::Error),
    #[error("{0} is not a directory")]
    NotADirectory(PathBuf),
}

/// Structured form of a reject record, as exchanged with other tools.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectRecordData {
    pub url: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, rename = "auth")]
    pub author: Option<String>,
    #[serde(default)]
    pub note: String,
}

impl From<&RejectRecord> for RejectRecordData {
    fn from(record: &RejectRecord) -> Self {
        Self {
            url: record.url.clone(),
            title: record.title.clone(),
            author: record.author.clone(),
            note: record.note.clone(),
        }
    }
}

impl From<RejectRecordData> for RejectRecord {
    fn from(data: RejectRecordData) -> Self {
        RejectRecord::from_trusted(data.url, data.title, data.author, data.note)
    }
}

/// The reject list file: one encoded record per line.
#[derive(Debug, Clone)]
pub struct RejectListStore {
    path: PathBuf,
}

impl RejectListStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the list; a missing file is an empty list.
    pub fn load(&self, canonicalizer: Option<&dyn Canonicalizer>) -> Result<RejectList, StoreError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(RejectList::new()),
            Err(err) => return Err(err.into()),
        };
        let list = RejectList::parse(&text, canonicalizer);
        batch_info!("Loaded {} reject record(s) from {:?}", list.len(), self.path);
        Ok(list)
    }

    /// Replaces the file contents atomically.
    pub fn save(&self, list: &RejectList) -> Result<(), StoreError> {
        write_atomically(&self.path, &list.to_text())?;
        batch_info!("Saved {} reject record(s) to {:?}", list.len(), self.path);
        Ok(())
    }
}

/// Writes `list` as a JSON array of [`RejectRecordData`].
pub fn export_json(list: &RejectList, path: &Path) -> Result<(), StoreError> {
    let data: Vec<RejectRecordData> = list.iter().map(RejectRecordData::from).collect();
    let json = serde_json::to_string_pretty(&data)?;
    write_atomically(path, &json)
}

/// Reads a JSON array of [`RejectRecordData`]. The records are trusted: URLs
/// are kept as stored. Entries without a URL are dropped with a warning.
pub fn import_json(path: &Path) -> Result<RejectList, StoreError> {
    let text = fs::read_to_string(path)?;
    let data: Vec<RejectRecordData> = serde_json::from_str(&text)?;
    Ok(data
        .into_iter()
        .enumerate()
        .filter_map(|(index, entry)| {
            if entry.url.trim().is_empty() {
                batch_warn!("Skipping entry {} of {:?}: no url", index, path);
                None
            } else {
                Some(RejectRecord::from(entry))
            }
        })
        .collect())
}

/// Writes through a temp file in the target's directory, then renames it
/// over the target. A failed write leaves the previous file intact.
fn write_atomically(target: &Path, content: &str) -> Result<(), StoreError> {
    let dir = match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    if dir.exists() && !dir.is_dir() {
        return Err(StoreError::NotADirectory(dir.to_path_buf()));
    }
    fs::create_dir_all(dir)?;

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content.as_bytes())?;
    tmp.flush()?;
    tmp.as_file_mut().sync_all()?;
    tmp.persist(target).map_err(|err| StoreError::Io(err.error))?;
    Ok(())
}
