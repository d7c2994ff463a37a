//! Domain repositories
//!
//! Each repository validates caller input, translates stored records into
//! the externally visible views, and delegates persistence to the `Stores`
//! it was built with. The backend is chosen once at startup; repositories
//! never know which one they run on.
//!
//! Uniqueness of favorite links and reviews, and review ownership, are
//! checked here with a read before the insert. Two concurrent requests can
//! both pass the check; the stores themselves do not enforce these rules.

pub mod movies;
pub mod movies_reviews;
pub mod types;
pub mod users;
pub mod users_movies;
pub mod validation;

#[cfg(test)]
pub mod test_support;

use std::collections::HashMap;
use std::sync::Arc;

pub use movies::MoviesRepository;
pub use movies_reviews::MoviesReviewsRepository;
pub use users::UsersRepository;
pub use users_movies::UsersMoviesRepository;

use crate::error_handling::types::{RepositoryError, StorageError};
use crate::metadata::MetadataProvider;
use crate::storage::storage_trait::Record;
use crate::storage::types::{MovieReview, RecordId, User};
use crate::storage::Stores;
use types::ReviewView;

/// All repositories, built once and shared with the request handlers.
pub struct Repositories {
    pub users: UsersRepository,
    pub user_movies: UsersMoviesRepository,
    pub movies: MoviesRepository,
    pub reviews: MoviesReviewsRepository,
}

impl Repositories {
    pub fn new(stores: Stores, metadata: Arc<dyn MetadataProvider>) -> Self {
        Self {
            users: UsersRepository::new(stores.clone()),
            user_movies: UsersMoviesRepository::new(stores.clone()),
            movies: MoviesRepository::new(stores.clone(), metadata),
            reviews: MoviesReviewsRepository::new(stores),
        }
    }
}

/// Maps a storage `NotFound` onto a repository `NotFound` for `entity`.
pub(crate) fn not_found(entity: &'static str) -> impl Fn(StorageError) -> RepositoryError {
    move |err| match err {
        StorageError::NotFound(_) => RepositoryError::NotFound(entity),
        other => RepositoryError::Storage(other),
    }
}

pub(crate) fn index_by_id<R: Record>(records: Vec<R>) -> HashMap<RecordId, R> {
    records.into_iter().map(|r| (r.id(), r)).collect()
}

pub(crate) fn review_view(review: MovieReview, users: &HashMap<RecordId, User>) -> ReviewView {
    let user_name = users
        .get(&review.user_id)
        .map(|u| u.name.clone())
        .unwrap_or_default();
    ReviewView {
        id: review.id,
        user_id: review.user_id,
        movie_id: review.movie_id,
        rating: review.rating,
        review_text: review.review_text,
        user_name,
    }
}
