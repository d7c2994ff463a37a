//! Storage Trait
//!
//! This module defines the `Storage` trait, the capability set shared by every
//! persistence backend, and the `Record` trait describing what can be stored.
//!
//! Implementors of `Storage` are responsible for:
//! - Listing and looking up records
//! - Assigning ids on insert
//! - Merging partial updates into existing records
//! - Removing records by id
//!
//! All methods return a `Result`; a missing id on `update`/`delete` is
//! reported as `StorageError::NotFound`.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error_handling::types::StorageError;
use crate::storage::types::RecordId;

/// A persisted entity with a store-assigned integer id.
pub trait Record: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Partial update; every `Some` field overwrites the stored value.
    type Patch: Send + Sync;

    /// Collection name, used as file stem and table name.
    const COLLECTION: &'static str;

    fn id(&self) -> RecordId;

    fn set_id(&mut self, id: RecordId);

    /// Merges `patch` into `self`, leaving absent fields untouched.
    fn apply(&mut self, patch: &Self::Patch);
}

/// The `Storage` trait defines the interface for record storage backends.
///
/// Both the file-backed and the relational implementation honour the same
/// contract, so repositories can be built on either one.
pub trait Storage<R: Record>: Send + Sync {
    /// Returns every stored record. An empty collection is `Ok(vec![])`;
    /// an unreadable medium is an error.
    fn get_all(&self) -> Result<Vec<R>, StorageError>;

    /// Looks up a record by id, `Ok(None)` when absent.
    fn get_by_id(&self, id: RecordId) -> Result<Option<R>, StorageError>;

    /// Persists `record` under a fresh id and returns that id.
    ///
    /// Any id carried by `record` is ignored.
    fn insert(&self, record: &R) -> Result<RecordId, StorageError>;

    /// Merges `patch` into the record with `id`.
    fn update(&self, id: RecordId, patch: &R::Patch) -> Result<(), StorageError>;

    /// Removes the record with `id`.
    fn delete(&self, id: RecordId) -> Result<(), StorageError>;
}
