//! Fixtures shared by the repository tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tempfile::TempDir;

use crate::error_handling::types::StorageError;
use crate::metadata::{placeholder, MetadataProvider};
use crate::storage::storage_trait::{Record, Storage};
use crate::storage::types::{Movie, RecordId};
use crate::storage::Stores;

/// Metadata provider answering from a fixed record, or with a placeholder
/// as if the provider had timed out.
pub struct StubProvider {
    pub movie: Option<Movie>,
    pub calls: AtomicUsize,
}

impl StubProvider {
    pub fn offline() -> Arc<Self> {
        Arc::new(Self { movie: None, calls: AtomicUsize::new(0) })
    }

    pub fn answering(movie: Movie) -> Arc<Self> {
        Arc::new(Self { movie: Some(movie), calls: AtomicUsize::new(0) })
    }
}

impl MetadataProvider for StubProvider {
    fn fetch(&self, title: &str) -> Movie {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.movie.clone().unwrap_or_else(|| placeholder(title))
    }
}

/// Wraps a storage and counts insert calls.
pub struct CountingStorage<R: Record> {
    inner: Arc<dyn Storage<R>>,
    pub inserts: AtomicUsize,
}

impl<R: Record> CountingStorage<R> {
    pub fn wrap(inner: Arc<dyn Storage<R>>) -> Arc<Self> {
        Arc::new(Self { inner, inserts: AtomicUsize::new(0) })
    }
}

impl<R: Record> Storage<R> for CountingStorage<R> {
    fn get_all(&self) -> Result<Vec<R>, StorageError> {
        self.inner.get_all()
    }

    fn get_by_id(&self, id: RecordId) -> Result<Option<R>, StorageError> {
        self.inner.get_by_id(id)
    }

    fn insert(&self, record: &R) -> Result<RecordId, StorageError> {
        self.inserts.fetch_add(1, Ordering::SeqCst);
        self.inner.insert(record)
    }

    fn update(&self, id: RecordId, patch: &R::Patch) -> Result<(), StorageError> {
        self.inner.update(id, patch)
    }

    fn delete(&self, id: RecordId) -> Result<(), StorageError> {
        self.inner.delete(id)
    }
}

/// One fresh store set per backend; keep the `TempDir` alive for the test.
pub fn all_backends() -> Vec<(&'static str, TempDir, Stores)> {
    let file_dir = TempDir::new().unwrap();
    let file = Stores::file(file_dir.path()).unwrap();
    let db_dir = TempDir::new().unwrap();
    let db = Stores::database(db_dir.path().join("test.sqlite3")).unwrap();
    vec![("file", file_dir, file), ("sqlite", db_dir, db)]
}

pub fn movie(name: &str) -> Movie {
    Movie {
        id: 0,
        name: name.to_string(),
        director: String::from("James Cameron"),
        year: 1997,
        rating: 7.9,
        poster: String::new(),
        website: String::new(),
    }
}
