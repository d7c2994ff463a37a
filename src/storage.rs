//! Storage subsystem
//!
//! This module provides the record storage abstraction and its two
//! interchangeable implementations.
//!
//! Components:
//! - `storage_trait`: the `Storage` and `Record` traits defining a uniform API.
//! - `types`: the persisted records and their partial-update patches.
//! - `file_storage`: one JSON file per collection, whole-file rewrite per mutation.
//! - `database_storage`: ORM-based SQLite implementation using SeaORM.
//! - `db_entities`: SeaORM entity models for the database backend.

pub mod database_storage;
pub mod db_entities;
pub mod file_storage;
pub mod storage_trait;
pub mod types;

use std::path::Path;
use std::sync::Arc;

use database_storage::{DatabaseStorage, SqliteDatabase};
use file_storage::FileStorage;
use storage_trait::Storage;
use types::{Movie, MovieReview, User, UserMovie};

use crate::error_handling::types::StorageError;

/// One storage per collection, all on the same backend.
#[derive(Clone)]
pub struct Stores {
    pub users: Arc<dyn Storage<User>>,
    pub movies: Arc<dyn Storage<Movie>>,
    pub user_movies: Arc<dyn Storage<UserMovie>>,
    pub reviews: Arc<dyn Storage<MovieReview>>,
}

impl Stores {
    /// JSON collections under `dir`, created empty when missing.
    pub fn file<P: AsRef<Path>>(dir: P) -> Result<Self, StorageError> {
        let dir = dir.as_ref();
        Ok(Self {
            users: Arc::new(FileStorage::<User>::in_directory(dir)?),
            movies: Arc::new(FileStorage::<Movie>::in_directory(dir)?),
            user_movies: Arc::new(FileStorage::<UserMovie>::in_directory(dir)?),
            reviews: Arc::new(FileStorage::<MovieReview>::in_directory(dir)?),
        })
    }

    /// Tables in the SQLite file at `path`, schema created when missing.
    pub fn database<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let db = SqliteDatabase::open(path)?;
        Ok(Self {
            users: Arc::new(DatabaseStorage::<User>::new(db.clone())),
            movies: Arc::new(DatabaseStorage::<Movie>::new(db.clone())),
            user_movies: Arc::new(DatabaseStorage::<UserMovie>::new(db.clone())),
            reviews: Arc::new(DatabaseStorage::<MovieReview>::new(db)),
        })
    }
}
