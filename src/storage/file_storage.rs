use std::fs;
use std::io::Write;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use log::{debug, error, info};
use tempfile::NamedTempFile;

use crate::error_handling::types::StorageError;
use crate::storage::storage_trait::{Record, Storage};
use crate::storage::types::RecordId;

/// JSON-file backed storage holding one collection as a single array.
///
/// Every mutation reads the whole collection, edits it in memory and writes
/// it back through a temporary file renamed over the original. Writers in
/// this process are serialized by `write_lock`; writers in other processes
/// are not, and the last one to rename wins.
pub struct FileStorage<R: Record> {
    path: PathBuf,
    write_lock: Mutex<()>,
    _record: PhantomData<fn() -> R>,
}

impl<R: Record> FileStorage<R> {
    /// Uses `path` as the collection file. The file itself is not created;
    /// until it exists every operation fails with `ReadFailed`.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| { error!("Failed to create data dir {}: {}", parent.display(), e); StorageError::WriteFailed })?;
        }
        info!("FileStorage for {} at {}", R::COLLECTION, path.display());
        Ok(Self { path, write_lock: Mutex::new(()), _record: PhantomData })
    }

    /// Like `new`, but seeds a missing collection file with an empty array.
    pub fn open_or_create<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let storage = Self::new(path)?;
        if !storage.path.exists() {
            storage.write_collection(&[])?;
            info!("Created empty {} collection at {}", R::COLLECTION, storage.path.display());
        }
        Ok(storage)
    }

    /// Collection file `<dir>/<collection>.json`, created if missing.
    pub fn in_directory<P: AsRef<Path>>(dir: P) -> Result<Self, StorageError> {
        Self::open_or_create(dir.as_ref().join(format!("{}.json", R::COLLECTION)))
    }

    fn read_collection(&self) -> Result<Vec<R>, StorageError> {
        let content = fs::read_to_string(&self.path).map_err(|e| { error!("Failed to read {} file {}: {}", R::COLLECTION, self.path.display(), e); StorageError::ReadFailed })?;
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }
        let records: Vec<R> = serde_json::from_str(&content).map_err(|e| { error!("Invalid JSON in {}: {}", self.path.display(), e); StorageError::ReadFailed })?;
        debug!("Loaded {} {} record(s) from {}", records.len(), R::COLLECTION, self.path.display());
        Ok(records)
    }

    fn write_collection(&self, records: &[R]) -> Result<(), StorageError> {
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let mut tmp = NamedTempFile::new_in(dir).map_err(|e| { error!("Failed to create temp file in {}: {}", dir.display(), e); StorageError::WriteFailed })?;
        serde_json::to_writer(&mut tmp, records).map_err(|e| { error!("Failed to serialize {}: {}", R::COLLECTION, e); StorageError::WriteFailed })?;
        tmp.flush().map_err(|e| { error!("Failed to flush temp file for {}: {}", self.path.display(), e); StorageError::WriteFailed })?;
        tmp.persist(&self.path).map_err(|e| { error!("Failed to replace {}: {}", self.path.display(), e.error); StorageError::WriteFailed })?;
        debug!("Wrote {} {} record(s) to {}", records.len(), R::COLLECTION, self.path.display());
        Ok(())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, ()>, StorageError> {
        self.write_lock.lock().map_err(|_| { error!("Write lock poisoned for {}", self.path.display()); StorageError::WriteFailed })
    }
}

fn next_id<R: Record>(records: &[R]) -> Result<RecordId, StorageError> {
    match records.iter().map(Record::id).max() {
        None => Ok(1),
        Some(max) => max.checked_add(1).ok_or_else(|| { error!("No {} id left after {}", R::COLLECTION, max); StorageError::WriteFailed }),
    }
}

impl<R: Record> Storage<R> for FileStorage<R> {
    fn get_all(&self) -> Result<Vec<R>, StorageError> {
        self.read_collection()
    }

    fn get_by_id(&self, id: RecordId) -> Result<Option<R>, StorageError> {
        Ok(self.read_collection()?.into_iter().find(|r| r.id() == id))
    }

    fn insert(&self, record: &R) -> Result<RecordId, StorageError> {
        let _guard = self.lock()?;
        let mut records = self.read_collection()?;
        let id = next_id(&records)?;
        let mut record = record.clone();
        record.set_id(id);
        records.push(record);
        self.write_collection(&records)?;
        info!("Inserted {} {} into {}", R::COLLECTION, id, self.path.display());
        Ok(id)
    }

    fn update(&self, id: RecordId, patch: &R::Patch) -> Result<(), StorageError> {
        let _guard = self.lock()?;
        let mut records = self.read_collection()?;
        let record = records.iter_mut().find(|r| r.id() == id).ok_or_else(|| { debug!("No {} with id {} to update", R::COLLECTION, id); StorageError::NotFound(id) })?;
        record.apply(patch);
        self.write_collection(&records)?;
        info!("Updated {} {}", R::COLLECTION, id);
        Ok(())
    }

    fn delete(&self, id: RecordId) -> Result<(), StorageError> {
        let _guard = self.lock()?;
        let mut records = self.read_collection()?;
        let before = records.len();
        records.retain(|r| r.id() != id);
        if records.len() == before {
            debug!("No {} with id {} to delete", R::COLLECTION, id);
            return Err(StorageError::NotFound(id));
        }
        self.write_collection(&records)?;
        info!("Deleted {} {}", R::COLLECTION, id);
        Ok(())
    }
}
