use chrono::NaiveDateTime;
use itertools::Itertools;
use log::{info, warn};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::PersistenceError;
use crate::session::SessionRecord;

pub const LOG_FILE_PREFIX: &str = "log_";
pub const LOG_FILE_EXT: &str = "json";
/// Sortable creation-time stamp embedded in each log file name.
pub const FILE_TIME_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

type Result<T> = std::result::Result<T, PersistenceError>;

/// A session log found on disk, with the header fields the log list shows.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredLog {
    pub path: PathBuf,
    pub file_name: String,
    pub duration_minutes: u32,
    pub slide_count: u32,
}

impl StoredLog {
    pub fn describe(&self) -> String {
        format!(
            "{} | {} min | {} slides",
            self.file_name, self.duration_minutes, self.slide_count
        )
    }
}

#[derive(Deserialize)]
struct LogHeader {
    duration_minutes: u32,
    slide_count: u32,
}

/// One JSON file per finished session inside a single directory.
#[derive(Debug, Clone)]
pub struct LogStore {
    dir: PathBuf,
}

impl LogStore {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn file_name_for(created_at: NaiveDateTime) -> String {
        format!(
            "{LOG_FILE_PREFIX}{}.{LOG_FILE_EXT}",
            created_at.format(FILE_TIME_FORMAT)
        )
    }

    /// Write `record` to a new file named after `created_at`.
    ///
    /// Existing files are never overwritten: a second session in the same
    /// second gets a `_2`, `_3`... suffix. The data goes to a temporary file
    /// first and is renamed into place once fully written.
    pub fn save(&self, record: &SessionRecord, created_at: NaiveDateTime) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir)?;

        let stem = format!("{LOG_FILE_PREFIX}{}", created_at.format(FILE_TIME_FORMAT));
        let mut path = self.dir.join(format!("{stem}.{LOG_FILE_EXT}"));
        let mut n = 2;
        while path.exists() {
            path = self.dir.join(format!("{stem}_{n}.{LOG_FILE_EXT}"));
            n += 1;
        }

        let data = serde_json::to_vec_pretty(record)?;
        let tmp = path.with_extension("json.tmp");
        if let Err(e) = fs::write(&tmp, &data).and_then(|_| fs::rename(&tmp, &path)) {
            let _ = fs::remove_file(&tmp);
            return Err(e.into());
        }

        info!("session log written to {}", path.display());
        Ok(path)
    }

    /// All readable logs, newest first. Unreadable files are skipped with a warning.
    pub fn list(&self) -> Result<Vec<StoredLog>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }

        let names: Vec<String> = fs::read_dir(&self.dir)?
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
            .filter_map(|entry| entry.file_name().into_string().ok())
            .filter(|name| name.ends_with(&format!(".{LOG_FILE_EXT}")))
            .sorted()
            .rev()
            .collect();

        let mut logs = Vec::with_capacity(names.len());
        for file_name in names {
            let path = self.dir.join(&file_name);
            match read_header(&path) {
                Ok(header) => logs.push(StoredLog {
                    path,
                    file_name,
                    duration_minutes: header.duration_minutes,
                    slide_count: header.slide_count,
                }),
                Err(e) => warn!("skipping log {file_name}: {e}"),
            }
        }
        Ok(logs)
    }

    pub fn latest(&self) -> Result<Option<StoredLog>> {
        Ok(self.list()?.into_iter().next())
    }

    /// Map a user-supplied name to a path: bare names live in the store
    /// directory and may omit the `.json` extension.
    pub fn resolve(&self, name: &str) -> PathBuf {
        let candidate = Path::new(name);
        if candidate.components().count() > 1 || candidate.is_absolute() {
            return candidate.to_path_buf();
        }
        if candidate.extension().is_some_and(|ext| ext == LOG_FILE_EXT) {
            self.dir.join(name)
        } else {
            self.dir.join(format!("{name}.{LOG_FILE_EXT}"))
        }
    }

    pub fn load(&self, path: &Path) -> Result<SessionRecord> {
        if !path.is_file() {
            return Err(PersistenceError::NotFound(path.to_path_buf()));
        }
        let bytes = fs::read(path)?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    pub fn delete(&self, path: &Path) -> Result<()> {
        if !path.is_file() {
            return Err(PersistenceError::NotFound(path.to_path_buf()));
        }
        fs::remove_file(path)?;
        info!("deleted session log {}", path.display());
        Ok(())
    }
}

fn read_header(path: &Path) -> Result<LogHeader> {
    let bytes = fs::read(path)?;
    Ok(serde_json::from_slice(&bytes)?)
}
