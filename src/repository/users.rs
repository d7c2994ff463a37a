use std::collections::{HashMap, HashSet};

use log::{debug, info};

use super::types::{FavoriteMovie, UserDraft, UserUpdate, UserView};
use super::validation::{check, require, validate_user_name};
use super::{index_by_id, not_found};
use crate::error_handling::types::RepositoryError;
use crate::storage::types::{Movie, RecordId, User, UserMovie, UserPatch};
use crate::storage::Stores;

pub struct UsersRepository {
    stores: Stores,
}

impl UsersRepository {
    pub fn new(stores: Stores) -> Self {
        Self { stores }
    }

    fn favorites(
        user_id: RecordId,
        links: &[UserMovie],
        movies: &HashMap<RecordId, Movie>,
    ) -> Vec<FavoriteMovie> {
        links
            .iter()
            .filter(|link| link.user_id == user_id)
            .filter_map(|link| {
                movies
                    .get(&link.movie_id)
                    .map(|movie| FavoriteMovie::new(link.id, movie.clone()))
            })
            .collect()
    }

    fn view(user: User, links: &[UserMovie], movies: &HashMap<RecordId, Movie>) -> UserView {
        UserView {
            movies: Self::favorites(user.id, links, movies),
            id: user.id,
            user_name: user.name,
        }
    }

    pub fn get_all_users(&self) -> Result<Vec<UserView>, RepositoryError> {
        let users = self.stores.users.get_all()?;
        let links = self.stores.user_movies.get_all()?;
        let movies = index_by_id(self.stores.movies.get_all()?);
        Ok(users
            .into_iter()
            .map(|user| Self::view(user, &links, &movies))
            .collect())
    }

    pub fn get_user(&self, id: RecordId) -> Result<UserView, RepositoryError> {
        let user = self
            .stores
            .users
            .get_by_id(id)?
            .ok_or(RepositoryError::NotFound("user"))?;
        let links = self.stores.user_movies.get_all()?;
        let movies = index_by_id(self.stores.movies.get_all()?);
        Ok(Self::view(user, &links, &movies))
    }

    pub fn get_user_movies(&self, id: RecordId) -> Result<Vec<FavoriteMovie>, RepositoryError> {
        Ok(self.get_user(id)?.movies)
    }

    /// Creates a user and links the listed movies as favorites.
    ///
    /// Every listed movie must exist; nothing is written otherwise.
    pub fn add_user(&self, draft: UserDraft) -> Result<RecordId, RepositoryError> {
        let mut errors = Vec::new();
        let name = require(draft.user_name, "user_name", &mut errors);
        let movie_ids = require(draft.movies, "movies", &mut errors);
        if let Some(name) = &name {
            validate_user_name(name, &mut errors);
        }
        let (Some(name), Some(movie_ids)) = (name, movie_ids) else {
            return Err(RepositoryError::Validation(errors));
        };
        check(errors)?;

        let mut seen = HashSet::new();
        let movie_ids: Vec<RecordId> = movie_ids.into_iter().filter(|id| seen.insert(*id)).collect();
        for movie_id in &movie_ids {
            if self.stores.movies.get_by_id(*movie_id)?.is_none() {
                return Err(RepositoryError::NotFound("movie"));
            }
        }

        let user_id = self.stores.users.insert(&User { id: 0, name })?;
        for movie_id in movie_ids {
            self.stores.user_movies.insert(&UserMovie {
                id: 0,
                user_id,
                movie_id,
            })?;
        }
        info!("User {} created", user_id);
        Ok(user_id)
    }

    pub fn update_user(&self, id: RecordId, update: UserUpdate) -> Result<(), RepositoryError> {
        let mut errors = Vec::new();
        if let Some(name) = &update.user_name {
            validate_user_name(name, &mut errors);
        }
        check(errors)?;
        self.stores
            .users
            .update(id, &UserPatch { name: update.user_name })
            .map_err(not_found("user"))?;
        debug!("User {} updated", id);
        Ok(())
    }

    /// Deletes a user that has no favorites and no reviews left.
    pub fn delete_user(&self, id: RecordId) -> Result<(), RepositoryError> {
        if self.stores.users.get_by_id(id)?.is_none() {
            return Err(RepositoryError::NotFound("user"));
        }
        let has_links = self
            .stores
            .user_movies
            .get_all()?
            .iter()
            .any(|link| link.user_id == id);
        let has_reviews = self
            .stores
            .reviews
            .get_all()?
            .iter()
            .any(|review| review.user_id == id);
        if has_links || has_reviews {
            return Err(RepositoryError::Rejected(String::from(
                "user still has favorite movies or reviews",
            )));
        }
        self.stores.users.delete(id).map_err(not_found("user"))?;
        info!("User {} deleted", id);
        Ok(())
    }
}
