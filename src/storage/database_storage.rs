use std::future::Future;
use std::marker::PhantomData;
use std::path::Path;
use std::sync::Arc;

use log::{debug, error, info};
use sea_orm::sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sea_orm::sqlx::ConnectOptions as _;
use sea_orm::{
    ActiveModelBehavior, ActiveModelTrait,
    ActiveValue::{NotSet, Set},
    ConnectionTrait, DatabaseConnection, DatabaseTransaction, DbErr, EntityTrait,
    IntoActiveModel, Schema, Select, SqlxSqliteConnector, TransactionTrait,
};

use crate::error_handling::types::StorageError;
use crate::storage::db_entities::{movie_reviews, movies, user_movies, users};
use crate::storage::storage_trait::{Record, Storage};
use crate::storage::types::{
    Movie, MoviePatch, MovieReview, MovieReviewPatch, RecordId, User, UserMovie, UserMoviePatch,
    UserPatch,
};

/// Shared SQLite handle: one connection plus the runtime that drives it.
///
/// The `Storage` trait is synchronous, so every call blocks on the private
/// current-thread runtime. Callers already inside a tokio runtime must go
/// through `spawn_blocking`.
pub struct SqliteDatabase {
    rt: tokio::runtime::Runtime,
    conn: DatabaseConnection,
}

impl SqliteDatabase {
    /// Opens the database at `path`, creating the file and schema if needed.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Arc<Self>, StorageError> {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| {
                error!("Failed to build database runtime: {}", e);
                StorageError::ConnectionFailed
            })?;
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|_| StorageError::WriteFailed)?;
        }
        // No URL: `?` and `#` stay part of the file name.
        let opts = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .foreign_keys(true)
            .disable_statement_logging();
        let conn = rt.block_on(async {
            let pool = SqlitePoolOptions::new()
                .max_connections(1)
                .connect_with(opts)
                .await
                .map_err(|e| {
                    error!("Failed to open database {}: {}", path.display(), e);
                    StorageError::ConnectionFailed
                })?;
            let conn = SqlxSqliteConnector::from_sqlx_sqlite_pool(pool);
            create_schema(&conn).await.map_err(|e| {
                error!("Failed to create schema: {}", e);
                StorageError::WriteFailed
            })?;
            Ok::<_, StorageError>(conn)
        })?;
        info!("Database storage opened at {}", path.display());
        Ok(Arc::new(Self { rt, conn }))
    }

    fn block_on<F: Future>(&self, future: F) -> F::Output {
        self.rt.block_on(future)
    }
}

async fn create_schema(conn: &DatabaseConnection) -> Result<(), DbErr> {
    let backend = conn.get_database_backend();
    let schema = Schema::new(backend);
    let statements = [
        schema.create_table_from_entity(users::Entity).if_not_exists().to_owned(),
        schema.create_table_from_entity(movies::Entity).if_not_exists().to_owned(),
        schema.create_table_from_entity(user_movies::Entity).if_not_exists().to_owned(),
        schema.create_table_from_entity(movie_reviews::Entity).if_not_exists().to_owned(),
    ];
    for statement in statements.iter() {
        conn.execute(backend.build(statement)).await?;
    }
    Ok(())
}

/// Maps a `Record` onto its SeaORM table.
pub trait TableRecord: Record {
    type Entity: EntityTrait;
    type ActiveModel: ActiveModelTrait<Entity = Self::Entity>
        + ActiveModelBehavior
        + From<<Self::Entity as EntityTrait>::Model>
        + Send
        + Sync
        + 'static;

    fn from_model(model: <Self::Entity as EntityTrait>::Model) -> Self;

    /// Active model for insertion; the primary key is left unset.
    fn to_active_model(&self) -> Self::ActiveModel;

    fn patch_active_model(active: &mut Self::ActiveModel, patch: &Self::Patch);

    fn select_by_id(id: RecordId) -> Select<Self::Entity>;
}

/// Relational storage for one table, sharing a `SqliteDatabase`.
///
/// Every operation runs in its own transaction. Any database error rolls it
/// back, gets logged, and is reported as a bare `StorageError`.
pub struct DatabaseStorage<R: TableRecord> {
    db: Arc<SqliteDatabase>,
    _record: PhantomData<fn() -> R>,
}

impl<R: TableRecord> DatabaseStorage<R> {
    pub fn new(db: Arc<SqliteDatabase>) -> Self {
        Self { db, _record: PhantomData }
    }

    async fn begin(&self) -> Result<DatabaseTransaction, StorageError> {
        self.db.conn.begin().await.map_err(|e| {
            error!("Failed to begin transaction on {}: {}", R::COLLECTION, e);
            StorageError::ConnectionFailed
        })
    }
}

/// Commits on success, rolls back and logs on failure.
async fn finish<T>(
    txn: DatabaseTransaction,
    result: Result<T, DbErr>,
    failure: StorageError,
    what: &str,
) -> Result<T, StorageError> {
    match result {
        Ok(value) => {
            txn.commit().await.map_err(|e| {
                error!("Commit failed for {}: {}", what, e);
                failure.clone()
            })?;
            Ok(value)
        }
        Err(e) => {
            error!("{} failed, rolling back: {}", what, e);
            if let Err(e) = txn.rollback().await {
                error!("Rollback failed for {}: {}", what, e);
            }
            Err(failure)
        }
    }
}

async fn rollback(txn: DatabaseTransaction, what: &str) {
    if let Err(e) = txn.rollback().await {
        error!("Rollback failed for {}: {}", what, e);
    }
}

impl<R> Storage<R> for DatabaseStorage<R>
where
    R: TableRecord,
    <R::Entity as EntityTrait>::Model: IntoActiveModel<R::ActiveModel>,
{
    fn get_all(&self) -> Result<Vec<R>, StorageError> {
        self.db.block_on(async {
            let txn = self.begin().await?;
            let result = R::Entity::find().all(&txn).await;
            let what = format!("list {}", R::COLLECTION);
            let models = finish(txn, result, StorageError::ReadFailed, &what).await?;
            debug!("Loaded {} {} row(s)", models.len(), R::COLLECTION);
            Ok(models.into_iter().map(R::from_model).collect())
        })
    }

    fn get_by_id(&self, id: RecordId) -> Result<Option<R>, StorageError> {
        self.db.block_on(async {
            let txn = self.begin().await?;
            let result = R::select_by_id(id).one(&txn).await;
            let what = format!("get {} {}", R::COLLECTION, id);
            let model = finish(txn, result, StorageError::ReadFailed, &what).await?;
            Ok(model.map(R::from_model))
        })
    }

    fn insert(&self, record: &R) -> Result<RecordId, StorageError> {
        self.db.block_on(async {
            let txn = self.begin().await?;
            let result = record.to_active_model().insert(&txn).await;
            let what = format!("insert into {}", R::COLLECTION);
            let model = finish(txn, result, StorageError::WriteFailed, &what).await?;
            let id = R::from_model(model).id();
            info!("Inserted {} {}", R::COLLECTION, id);
            Ok(id)
        })
    }

    fn update(&self, id: RecordId, patch: &R::Patch) -> Result<(), StorageError> {
        self.db.block_on(async {
            let txn = self.begin().await?;
            let what = format!("update {} {}", R::COLLECTION, id);
            let model = match R::select_by_id(id).one(&txn).await {
                Ok(Some(model)) => model,
                Ok(None) => {
                    rollback(txn, &what).await;
                    debug!("No {} with id {} to update", R::COLLECTION, id);
                    return Err(StorageError::NotFound(id));
                }
                Err(e) => return finish(txn, Err(e), StorageError::ReadFailed, &what).await,
            };
            let mut active: R::ActiveModel = model.into();
            R::patch_active_model(&mut active, patch);
            if !active.is_changed() {
                return finish(txn, Ok(()), StorageError::WriteFailed, &what).await;
            }
            let result = active.update(&txn).await.map(|_| ());
            finish(txn, result, StorageError::WriteFailed, &what).await?;
            info!("Updated {} {}", R::COLLECTION, id);
            Ok(())
        })
    }

    fn delete(&self, id: RecordId) -> Result<(), StorageError> {
        self.db.block_on(async {
            let txn = self.begin().await?;
            let what = format!("delete {} {}", R::COLLECTION, id);
            let model = match R::select_by_id(id).one(&txn).await {
                Ok(Some(model)) => model,
                Ok(None) => {
                    rollback(txn, &what).await;
                    debug!("No {} with id {} to delete", R::COLLECTION, id);
                    return Err(StorageError::NotFound(id));
                }
                Err(e) => return finish(txn, Err(e), StorageError::ReadFailed, &what).await,
            };
            let active: R::ActiveModel = model.into();
            let result = active.delete(&txn).await.map(|r| r.rows_affected);
            let affected = finish(txn, result, StorageError::WriteFailed, &what).await?;
            if affected == 0 {
                return Err(StorageError::NotFound(id));
            }
            info!("Deleted {} {}", R::COLLECTION, id);
            Ok(())
        })
    }
}

impl TableRecord for User {
    type Entity = users::Entity;
    type ActiveModel = users::ActiveModel;

    fn from_model(model: users::Model) -> Self {
        User { id: model.id, name: model.name }
    }

    fn to_active_model(&self) -> users::ActiveModel {
        users::ActiveModel { id: NotSet, name: Set(self.name.clone()) }
    }

    fn patch_active_model(active: &mut users::ActiveModel, patch: &UserPatch) {
        if let Some(ref name) = patch.name {
            active.name = Set(name.clone());
        }
    }

    fn select_by_id(id: RecordId) -> Select<users::Entity> {
        users::Entity::find_by_id(id)
    }
}

impl TableRecord for Movie {
    type Entity = movies::Entity;
    type ActiveModel = movies::ActiveModel;

    fn from_model(model: movies::Model) -> Self {
        Movie {
            id: model.id,
            name: model.name,
            director: model.director,
            year: model.year,
            rating: model.rating,
            poster: model.poster,
            website: model.website,
        }
    }

    fn to_active_model(&self) -> movies::ActiveModel {
        movies::ActiveModel {
            id: NotSet,
            name: Set(self.name.clone()),
            director: Set(self.director.clone()),
            year: Set(self.year),
            rating: Set(self.rating),
            poster: Set(self.poster.clone()),
            website: Set(self.website.clone()),
        }
    }

    fn patch_active_model(active: &mut movies::ActiveModel, patch: &MoviePatch) {
        if let Some(ref name) = patch.name {
            active.name = Set(name.clone());
        }
        if let Some(ref director) = patch.director {
            active.director = Set(director.clone());
        }
        if let Some(year) = patch.year {
            active.year = Set(year);
        }
        if let Some(rating) = patch.rating {
            active.rating = Set(rating);
        }
        if let Some(ref poster) = patch.poster {
            active.poster = Set(poster.clone());
        }
        if let Some(ref website) = patch.website {
            active.website = Set(website.clone());
        }
    }

    fn select_by_id(id: RecordId) -> Select<movies::Entity> {
        movies::Entity::find_by_id(id)
    }
}

impl TableRecord for UserMovie {
    type Entity = user_movies::Entity;
    type ActiveModel = user_movies::ActiveModel;

    fn from_model(model: user_movies::Model) -> Self {
        UserMovie { id: model.id, user_id: model.user_id, movie_id: model.movie_id }
    }

    fn to_active_model(&self) -> user_movies::ActiveModel {
        user_movies::ActiveModel {
            id: NotSet,
            user_id: Set(self.user_id),
            movie_id: Set(self.movie_id),
        }
    }

    fn patch_active_model(active: &mut user_movies::ActiveModel, patch: &UserMoviePatch) {
        if let Some(user_id) = patch.user_id {
            active.user_id = Set(user_id);
        }
        if let Some(movie_id) = patch.movie_id {
            active.movie_id = Set(movie_id);
        }
    }

    fn select_by_id(id: RecordId) -> Select<user_movies::Entity> {
        user_movies::Entity::find_by_id(id)
    }
}

impl TableRecord for MovieReview {
    type Entity = movie_reviews::Entity;
    type ActiveModel = movie_reviews::ActiveModel;

    fn from_model(model: movie_reviews::Model) -> Self {
        MovieReview {
            id: model.id,
            user_id: model.user_id,
            movie_id: model.movie_id,
            rating: model.rating,
            review_text: model.review_text,
        }
    }

    fn to_active_model(&self) -> movie_reviews::ActiveModel {
        movie_reviews::ActiveModel {
            id: NotSet,
            user_id: Set(self.user_id),
            movie_id: Set(self.movie_id),
            rating: Set(self.rating),
            review_text: Set(self.review_text.clone()),
        }
    }

    fn patch_active_model(active: &mut movie_reviews::ActiveModel, patch: &MovieReviewPatch) {
        if let Some(rating) = patch.rating {
            active.rating = Set(rating);
        }
        if let Some(ref review_text) = patch.review_text {
            active.review_text = Set(review_text.clone());
        }
    }

    fn select_by_id(id: RecordId) -> Select<movie_reviews::Entity> {
        movie_reviews::Entity::find_by_id(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn temp_db() -> (TempDir, Arc<SqliteDatabase>) {
        let dir = TempDir::new().unwrap();
        let db = SqliteDatabase::open(dir.path().join("test.sqlite3")).unwrap();
        (dir, db)
    }

    fn movie(name: &str) -> Movie {
        Movie {
            id: 0,
            name: name.into(),
            director: "James Cameron".into(),
            year: 1997,
            rating: 7.9,
            poster: "https://example.com/poster.jpg".into(),
            website: "https://www.imdb.com/title/tt0120338".into(),
        }
    }

    #[test]
    fn test_db_insert_then_get_by_id() {
        let (_dir, db) = temp_db();
        let storage: DatabaseStorage<Movie> = DatabaseStorage::new(db);
        let input = movie("Titanic");
        let id = storage.insert(&input).unwrap();
        assert_eq!(storage.get_by_id(id).unwrap(), Some(Movie { id, ..input }));
        assert_eq!(storage.get_all().unwrap().len(), 1);
    }

    #[test]
    fn test_db_path_with_url_characters() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("odd?name#1.sqlite3");
        let db = SqliteDatabase::open(&path).unwrap();
        let storage: DatabaseStorage<User> = DatabaseStorage::new(db);
        let id = storage.insert(&User { id: 0, name: "Alice".into() }).unwrap();
        drop(storage);

        assert!(path.exists());
        let reopened: DatabaseStorage<User> = DatabaseStorage::new(SqliteDatabase::open(&path).unwrap());
        assert_eq!(reopened.get_by_id(id).unwrap().map(|u| u.name), Some("Alice".to_string()));
    }

    #[test]
    fn test_db_empty_table_and_unknown_id() {
        let (_dir, db) = temp_db();
        let storage: DatabaseStorage<User> = DatabaseStorage::new(db);
        assert!(storage.get_all().unwrap().is_empty());
        assert_eq!(storage.get_by_id(99).unwrap(), None);
        let err = storage.update(99, &UserPatch { name: Some("Eve".into()) }).unwrap_err();
        assert_eq!(err, StorageError::NotFound(99));
        assert!(storage.get_all().unwrap().is_empty());
    }

    #[test]
    fn test_db_ids_increase_and_delete() {
        let (_dir, db) = temp_db();
        let storage: DatabaseStorage<User> = DatabaseStorage::new(db);
        let a = storage.insert(&User { id: 0, name: "Alice".into() }).unwrap();
        let b = storage.insert(&User { id: 0, name: "Bob".into() }).unwrap();
        assert!(a < b);
        storage.delete(a).unwrap();
        assert_eq!(storage.get_by_id(a).unwrap(), None);
        assert_eq!(storage.delete(a).unwrap_err(), StorageError::NotFound(a));
        assert_eq!(storage.get_all().unwrap().len(), 1);
    }

    #[test]
    fn test_db_partial_update() {
        let (_dir, db) = temp_db();
        let storage: DatabaseStorage<Movie> = DatabaseStorage::new(db);
        let id = storage.insert(&movie("Titanic")).unwrap();
        storage.update(id, &MoviePatch { rating: Some(8.5), ..Default::default() }).unwrap();
        storage.update(id, &MoviePatch::default()).unwrap();
        let stored = storage.get_by_id(id).unwrap().unwrap();
        assert_eq!(stored.rating, 8.5);
        assert_eq!(stored.director, "James Cameron");
    }

    #[test]
    fn test_db_delete_referenced_movie_fails() {
        let (_dir, db) = temp_db();
        let users: DatabaseStorage<User> = DatabaseStorage::new(db.clone());
        let movies: DatabaseStorage<Movie> = DatabaseStorage::new(db.clone());
        let links: DatabaseStorage<UserMovie> = DatabaseStorage::new(db);
        let user_id = users.insert(&User { id: 0, name: "Alice".into() }).unwrap();
        let movie_id = movies.insert(&movie("Titanic")).unwrap();
        links.insert(&UserMovie { id: 0, user_id, movie_id }).unwrap();

        assert_eq!(movies.delete(movie_id).unwrap_err(), StorageError::WriteFailed);
        assert!(movies.get_by_id(movie_id).unwrap().is_some());
    }

    #[test]
    fn test_db_duplicate_movie_name_rolls_back() {
        let (_dir, db) = temp_db();
        let movies: DatabaseStorage<Movie> = DatabaseStorage::new(db);
        movies.insert(&movie("Titanic")).unwrap();
        assert_eq!(movies.insert(&movie("Titanic")).unwrap_err(), StorageError::WriteFailed);
        assert_eq!(movies.get_all().unwrap().len(), 1);
    }
}
