use log::info;

use super::not_found;
use super::types::UserMovieDraft;
use super::validation::{check, require};
use crate::error_handling::types::RepositoryError;
use crate::storage::types::{RecordId, UserMovie};
use crate::storage::Stores;

/// Favorite links between users and movies.
pub struct UsersMoviesRepository {
    stores: Stores,
}

impl UsersMoviesRepository {
    pub fn new(stores: Stores) -> Self {
        Self { stores }
    }

    pub fn get_all_user_movies(&self) -> Result<Vec<UserMovie>, RepositoryError> {
        Ok(self.stores.user_movies.get_all()?)
    }

    pub fn get_user_movie(&self, id: RecordId) -> Result<UserMovie, RepositoryError> {
        self.stores
            .user_movies
            .get_by_id(id)?
            .ok_or(RepositoryError::NotFound("favorite movie"))
    }

    /// Links a movie to a user. A pair is linked at most once.
    pub fn add_user_movie(&self, draft: UserMovieDraft) -> Result<RecordId, RepositoryError> {
        let mut errors = Vec::new();
        let user_id = require(draft.user_id, "user_id", &mut errors);
        let movie_id = require(draft.movie_id, "movie_id", &mut errors);
        let (Some(user_id), Some(movie_id)) = (user_id, movie_id) else {
            return Err(RepositoryError::Validation(errors));
        };
        check(errors)?;

        if self.stores.users.get_by_id(user_id)?.is_none() {
            return Err(RepositoryError::NotFound("user"));
        }
        if self.stores.movies.get_by_id(movie_id)?.is_none() {
            return Err(RepositoryError::NotFound("movie"));
        }
        let linked = self
            .stores
            .user_movies
            .get_all()?
            .iter()
            .any(|link| link.user_id == user_id && link.movie_id == movie_id);
        if linked {
            return Err(RepositoryError::Rejected(String::from(
                "movie is already a favorite of this user",
            )));
        }

        let id = self.stores.user_movies.insert(&UserMovie {
            id: 0,
            user_id,
            movie_id,
        })?;
        info!("Movie {} linked to user {} as favorite {}", movie_id, user_id, id);
        Ok(id)
    }

    pub fn delete_user_movie(&self, id: RecordId) -> Result<(), RepositoryError> {
        self.stores
            .user_movies
            .delete(id)
            .map_err(not_found("favorite movie"))?;
        info!("Favorite {} removed", id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use super::*;
    use crate::repository::test_support::{all_backends, movie, CountingStorage};
    use crate::storage::types::User;

    fn draft(user_id: RecordId, movie_id: RecordId) -> UserMovieDraft {
        UserMovieDraft {
            user_id: Some(user_id),
            movie_id: Some(movie_id),
        }
    }

    #[test]
    fn test_duplicate_link_rejected_without_insert() {
        for (_backend, _dir, mut stores) in all_backends() {
            let user = stores.users.insert(&User { id: 0, name: "Alice".into() }).unwrap();
            let titanic = stores.movies.insert(&movie("Titanic")).unwrap();
            let counting = CountingStorage::wrap(stores.user_movies.clone());
            stores.user_movies = counting.clone();
            let repo = UsersMoviesRepository::new(stores);

            let id = repo.add_user_movie(draft(user, titanic)).unwrap();
            assert_eq!(counting.inserts.load(Ordering::SeqCst), 1);

            assert!(matches!(
                repo.add_user_movie(draft(user, titanic)),
                Err(RepositoryError::Rejected(_))
            ));
            assert_eq!(counting.inserts.load(Ordering::SeqCst), 1);
            assert_eq!(repo.get_all_user_movies().unwrap().len(), 1);
            assert_eq!(repo.get_user_movie(id).unwrap().movie_id, titanic);
        }
    }

    #[test]
    fn test_link_requires_existing_records() {
        for (_backend, _dir, stores) in all_backends() {
            let user = stores.users.insert(&User { id: 0, name: "Bob".into() }).unwrap();
            let repo = UsersMoviesRepository::new(stores);

            assert_eq!(
                repo.add_user_movie(UserMovieDraft { user_id: Some(user), movie_id: None }),
                Err(RepositoryError::Validation(vec!["movie_id is required".into()]))
            );
            assert_eq!(repo.add_user_movie(draft(user, 5)), Err(RepositoryError::NotFound("movie")));
            assert_eq!(repo.add_user_movie(draft(9, 5)), Err(RepositoryError::NotFound("user")));
        }
    }

    #[test]
    fn test_delete_link() {
        for (_backend, _dir, stores) in all_backends() {
            let user = stores.users.insert(&User { id: 0, name: "Carol".into() }).unwrap();
            let heat = stores.movies.insert(&movie("Heat")).unwrap();
            let repo = UsersMoviesRepository::new(stores);
            let id = repo.add_user_movie(draft(user, heat)).unwrap();

            repo.delete_user_movie(id).unwrap();
            assert_eq!(repo.delete_user_movie(id), Err(RepositoryError::NotFound("favorite movie")));
            assert_eq!(repo.get_user_movie(id), Err(RepositoryError::NotFound("favorite movie")));
        }
    }
}
