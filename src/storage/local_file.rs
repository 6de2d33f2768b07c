//! Session reports as JSON files, one per session id, in a single directory

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use log::debug;
use uuid::Uuid;

use super::{StorageBackend, StorageError};

const EXTENSION: &str = "json";

/// Directory of `{id}.json` files. Writes go to a temporary sibling first
/// and are renamed into place, so readers never see a partial report.
pub struct LocalFileStorage {
    base_dir: PathBuf,
}

impl LocalFileStorage {
    /// Open the directory, creating it if needed
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self, StorageError> {
        let base_dir = base_dir.as_ref().to_path_buf();
        fs::create_dir_all(&base_dir).map_err(|e| {
            StorageError::PersistenceError(format!("Cannot create {}: {}", base_dir.display(), e))
        })?;
        Ok(Self { base_dir })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn file_path(&self, id: Uuid) -> PathBuf {
        self.base_dir.join(format!("{}.{}", id, EXTENSION))
    }

    fn temp_path(&self, id: Uuid) -> PathBuf {
        self.base_dir.join(format!(".{}.{}.tmp", id, EXTENSION))
    }
}

impl StorageBackend for LocalFileStorage {
    fn store(&self, id: Uuid, data: &[u8]) -> Result<(), StorageError> {
        let target = self.file_path(id);
        let temp = self.temp_path(id);

        fs::write(&temp, data)
            .and_then(|()| fs::rename(&temp, &target))
            .map_err(|e| {
                let _ = fs::remove_file(&temp);
                StorageError::PersistenceError(format!("Cannot write {}: {}", target.display(), e))
            })?;

        debug!("Stored {} bytes at {}", data.len(), target.display());
        Ok(())
    }

    fn load(&self, id: Uuid) -> Result<Vec<u8>, StorageError> {
        let path = self.file_path(id);
        fs::read(&path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => StorageError::NotFound(id),
            _ => StorageError::PersistenceError(format!("Cannot read {}: {}", path.display(), e)),
        })
    }

    fn exists(&self, id: Uuid) -> bool {
        self.file_path(id).is_file()
    }

    /// Session ids of the report files, sorted; other files are ignored
    fn list(&self) -> Result<Vec<Uuid>, StorageError> {
        let entries = fs::read_dir(&self.base_dir).map_err(|e| {
            StorageError::PersistenceError(format!("Cannot list {}: {}", self.base_dir.display(), e))
        })?;

        let mut ids: Vec<Uuid> = entries
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| path.extension().and_then(|ext| ext.to_str()) == Some(EXTENSION))
            .filter_map(|path| {
                path.file_stem()
                    .and_then(|stem| stem.to_str())
                    .and_then(|stem| Uuid::parse_str(stem).ok())
            })
            .collect();
        ids.sort();
        Ok(ids)
    }
}
