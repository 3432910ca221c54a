//! Record store - the I/O boundary for unit content records
//!
//! Records live as pretty-printed JSON files named `dayNN.json` in a single
//! directory. Writes go through a temp file in the same directory and an
//! atomic rename, so a failed write never leaves a half-written record.

use anyhow::{Context, Result};
use chrono::Local;
use serde_json::Value;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::error::{EngineError, EngineResult};
use crate::types::Day;

/// Source and sink of per-unit content records
#[cfg_attr(test, mockall::automock)]
pub trait RecordStore {
    /// Load a unit's record, `None` when it does not exist
    fn load(&self, day: Day) -> EngineResult<Option<Value>>;

    /// Replace a unit's record, all or nothing
    fn write(&self, day: Day, record: &Value) -> EngineResult<()>;
}

/// Result of a backup copy
#[derive(Debug, Clone)]
pub struct BackupOutcome {
    pub backup_dir: PathBuf,
    /// Where an earlier backup was moved, if there was one
    pub previous: Option<PathBuf>,
    pub files_copied: usize,
}

/// Directory of `dayNN.json` records
pub struct DayStore {
    base_dir: PathBuf,
}

impl DayStore {
    /// Open an existing record directory
    pub fn with_dir(base_dir: PathBuf) -> Result<Self> {
        if !base_dir.is_dir() {
            anyhow::bail!("Record directory not found: {}", base_dir.display());
        }
        Ok(Self { base_dir })
    }

    /// File name for a day, e.g. `day07.json`
    pub fn file_name(day: Day) -> String {
        format!("day{:02}.json", day)
    }

    pub fn path_for(&self, day: Day) -> PathBuf {
        self.base_dir.join(Self::file_name(day))
    }

    /// Copy the record directory to `backup_dir`.
    ///
    /// An existing backup is first renamed with a timestamp suffix. The
    /// backup and the record directory may not contain one another.
    pub fn backup(&self, backup_dir: &Path) -> Result<BackupOutcome> {
        let source = self
            .base_dir
            .canonicalize()
            .with_context(|| format!("Failed to resolve {}", self.base_dir.display()))?;
        let target = resolve(backup_dir)?;
        if target.starts_with(&source) {
            anyhow::bail!(
                "Backup directory {} is inside the record directory {}",
                backup_dir.display(),
                self.base_dir.display()
            );
        }
        if source.starts_with(&target) {
            anyhow::bail!(
                "Backup directory {} contains the record directory {}",
                backup_dir.display(),
                self.base_dir.display()
            );
        }

        let previous = if backup_dir.exists() {
            let moved = rotated_name(backup_dir);
            std::fs::rename(backup_dir, &moved).with_context(|| {
                format!("Failed to move existing backup {}", backup_dir.display())
            })?;
            info!("Moved previous backup to {}", moved.display());
            Some(moved)
        } else {
            None
        };

        let files_copied = copy_tree(&self.base_dir, backup_dir)?;
        info!("Backed up {} files to {}", files_copied, backup_dir.display());

        Ok(BackupOutcome {
            backup_dir: backup_dir.to_path_buf(),
            previous,
            files_copied,
        })
    }

    // --- File I/O ---

    fn write_atomic(&self, day: Day, contents: &str) -> std::io::Result<()> {
        let mut tmp = NamedTempFile::new_in(&self.base_dir)?;
        tmp.write_all(contents.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(self.path_for(day)).map_err(|e| e.error)?;
        Ok(())
    }
}

impl RecordStore for DayStore {
    fn load(&self, day: Day) -> EngineResult<Option<Value>> {
        let path = self.path_for(day);
        if !path.exists() {
            debug!("No record for day {} at {}", day, path.display());
            return Ok(None);
        }

        let contents = std::fs::read_to_string(&path)
            .map_err(|e| EngineError::serialization(day, format!("read {}: {}", path.display(), e)))?;

        serde_json::from_str(&contents)
            .map(Some)
            .map_err(|e| EngineError::serialization(day, format!("parse {}: {}", path.display(), e)))
    }

    fn write(&self, day: Day, record: &Value) -> EngineResult<()> {
        let mut contents = serde_json::to_string_pretty(record)
            .map_err(|e| EngineError::serialization(day, e.to_string()))?;
        contents.push('\n');

        self.write_atomic(day, &contents).map_err(|e| {
            EngineError::serialization(day, format!("write {}: {}", self.path_for(day).display(), e))
        })?;

        debug!("Wrote {}", self.path_for(day).display());
        Ok(())
    }
}

/// Absolute form of a path whose last component may not exist yet
fn resolve(path: &Path) -> Result<PathBuf> {
    if let Ok(resolved) = path.canonicalize() {
        return Ok(resolved);
    }
    let name = path
        .file_name()
        .with_context(|| format!("Invalid backup path {}", path.display()))?;
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let parent = parent
        .canonicalize()
        .with_context(|| format!("Failed to resolve {}", parent.display()))?;
    Ok(parent.join(name))
}

/// Timestamped sibling name for an existing backup, never an existing path
fn rotated_name(backup_dir: &Path) -> PathBuf {
    let base = format!(
        "{}_{}",
        backup_dir.display(),
        Local::now().format("%Y%m%d_%H%M%S")
    );
    let mut candidate = PathBuf::from(&base);
    let mut n = 1;
    while candidate.exists() {
        candidate = PathBuf::from(format!("{}_{}", base, n));
        n += 1;
    }
    candidate
}

fn copy_tree(from: &Path, to: &Path) -> Result<usize> {
    let mut copied = 0;

    for entry in WalkDir::new(from) {
        let entry = entry.with_context(|| format!("Failed to walk {}", from.display()))?;
        let relative = entry
            .path()
            .strip_prefix(from)
            .context("Backup entry outside source directory")?;
        let target = to.join(relative);

        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&target)
                .with_context(|| format!("Failed to create {}", target.display()))?;
        } else {
            std::fs::copy(entry.path(), &target)
                .with_context(|| format!("Failed to copy {}", entry.path().display()))?;
            copied += 1;
        }
    }

    Ok(copied)
}
