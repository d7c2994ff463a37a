use std::collections::HashMap;
use std::sync::Arc;

use log::{debug, info, warn};

use super::types::{MovieDraft, MovieUpdate, MovieView};
use super::validation::{
    check, parse_rating, parse_year, require, validate_director, validate_movie_name,
};
use super::{index_by_id, not_found, review_view};
use crate::error_handling::types::RepositoryError;
use crate::metadata::MetadataProvider;
use crate::storage::types::{Movie, MoviePatch, MovieReview, RecordId, User};
use crate::storage::Stores;

/// Movies and their metadata. New movies are filled in from the metadata
/// provider, which degrades to a title-only placeholder when unavailable.
pub struct MoviesRepository {
    stores: Stores,
    metadata: Arc<dyn MetadataProvider>,
}

impl MoviesRepository {
    pub fn new(stores: Stores, metadata: Arc<dyn MetadataProvider>) -> Self {
        Self { stores, metadata }
    }

    fn view(movie: Movie, reviews: &[MovieReview], users: &HashMap<RecordId, User>) -> MovieView {
        let movie_reviews = reviews
            .iter()
            .filter(|review| review.movie_id == movie.id)
            .map(|review| review_view(review.clone(), users))
            .collect();
        MovieView::new(movie, movie_reviews)
    }

    /// Holds provider data to the rules user input must follow. A bad title
    /// falls back to the requested one; a bad director becomes unknown.
    fn conform(mut movie: Movie, requested: &str) -> Movie {
        let mut errors = Vec::new();
        validate_movie_name(&movie.name, &mut errors);
        if !errors.is_empty() {
            warn!("Provider title '{}' rejected, keeping '{}'", movie.name, requested);
            movie.name = requested.to_string();
        }
        errors.clear();
        validate_director(&movie.director, &mut errors);
        if !errors.is_empty() {
            warn!("Provider director '{}' rejected for '{}'", movie.director, movie.name);
            movie.director = String::new();
        }
        movie
    }

    fn name_taken(&self, name: &str, except: Option<RecordId>) -> Result<bool, RepositoryError> {
        Ok(self
            .stores
            .movies
            .get_all()?
            .iter()
            .any(|movie| movie.name == name && Some(movie.id) != except))
    }

    pub fn get_movies(&self) -> Result<Vec<MovieView>, RepositoryError> {
        let movies = self.stores.movies.get_all()?;
        let reviews = self.stores.reviews.get_all()?;
        let users = index_by_id(self.stores.users.get_all()?);
        Ok(movies
            .into_iter()
            .map(|movie| Self::view(movie, &reviews, &users))
            .collect())
    }

    pub fn get_movie(&self, id: RecordId) -> Result<MovieView, RepositoryError> {
        let movie = self
            .stores
            .movies
            .get_by_id(id)?
            .ok_or(RepositoryError::NotFound("movie"))?;
        let reviews = self.stores.reviews.get_all()?;
        let users = index_by_id(self.stores.users.get_all()?);
        Ok(Self::view(movie, &reviews, &users))
    }

    /// Adds a movie by title, filled in with whatever metadata is available.
    ///
    /// Titles are unique; both the requested title and the title reported
    /// by the provider are checked.
    pub fn add_movie(&self, draft: MovieDraft) -> Result<RecordId, RepositoryError> {
        let mut errors = Vec::new();
        let title = require(draft.movie_name, "movie_name", &mut errors);
        if let Some(title) = &title {
            validate_movie_name(title, &mut errors);
        }
        let Some(title) = title else {
            return Err(RepositoryError::Validation(errors));
        };
        check(errors)?;

        let duplicate = || RepositoryError::Rejected(String::from("movie already exists"));
        if self.name_taken(&title, None)? {
            return Err(duplicate());
        }
        let movie = Self::conform(self.metadata.fetch(&title), &title);
        if movie.name != title && self.name_taken(&movie.name, None)? {
            return Err(duplicate());
        }

        let id = self.stores.movies.insert(&movie)?;
        info!("Movie {} added as '{}'", id, movie.name);
        Ok(id)
    }

    /// Edits a movie from text fields. An empty year or rating resets it to
    /// unknown.
    pub fn update_movie(&self, id: RecordId, update: MovieUpdate) -> Result<(), RepositoryError> {
        if self.stores.movies.get_by_id(id)?.is_none() {
            return Err(RepositoryError::NotFound("movie"));
        }

        let mut errors = Vec::new();
        if let Some(name) = &update.movie_name {
            validate_movie_name(name, &mut errors);
        }
        if let Some(director) = &update.director {
            validate_director(director, &mut errors);
        }
        let year = update.year.as_deref().and_then(|y| parse_year(y, &mut errors));
        let rating = update
            .rating
            .as_deref()
            .and_then(|r| parse_rating(r, &mut errors));
        check(errors)?;

        if let Some(name) = &update.movie_name {
            if self.name_taken(name, Some(id))? {
                return Err(RepositoryError::Rejected(String::from("movie already exists")));
            }
        }

        let patch = MoviePatch {
            name: update.movie_name,
            director: update.director,
            year,
            rating,
            poster: None,
            website: None,
        };
        self.stores
            .movies
            .update(id, &patch)
            .map_err(not_found("movie"))?;
        debug!("Movie {} updated", id);
        Ok(())
    }

    /// Deletes a movie nobody has as favorite or has reviewed.
    pub fn delete_movie(&self, id: RecordId) -> Result<(), RepositoryError> {
        if self.stores.movies.get_by_id(id)?.is_none() {
            return Err(RepositoryError::NotFound("movie"));
        }
        let linked = self
            .stores
            .user_movies
            .get_all()?
            .iter()
            .any(|link| link.movie_id == id);
        let reviewed = self
            .stores
            .reviews
            .get_all()?
            .iter()
            .any(|review| review.movie_id == id);
        if linked || reviewed {
            return Err(RepositoryError::Rejected(String::from(
                "movie is still a favorite or has reviews",
            )));
        }
        self.stores.movies.delete(id).map_err(not_found("movie"))?;
        info!("Movie {} deleted", id);
        Ok(())
    }
}
