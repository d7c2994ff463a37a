use log::{debug, info};

use super::types::{ReviewDraft, ReviewUpdate, ReviewView};
use super::validation::{check, parse_review_rating, require};
use super::{index_by_id, not_found, review_view};
use crate::error_handling::types::RepositoryError;
use crate::storage::types::{MovieReview, MovieReviewPatch, RecordId};
use crate::storage::Stores;

/// Reviews a user writes about one of their favorite movies.
pub struct MoviesReviewsRepository {
    stores: Stores,
}

impl MoviesReviewsRepository {
    pub fn new(stores: Stores) -> Self {
        Self { stores }
    }

    fn views<F>(&self, keep: F) -> Result<Vec<ReviewView>, RepositoryError>
    where
        F: Fn(&MovieReview) -> bool,
    {
        let users = index_by_id(self.stores.users.get_all()?);
        Ok(self
            .stores
            .reviews
            .get_all()?
            .into_iter()
            .filter(|review| keep(review))
            .map(|review| review_view(review, &users))
            .collect())
    }

    pub fn get_movie_reviews(&self) -> Result<Vec<ReviewView>, RepositoryError> {
        self.views(|_| true)
    }

    pub fn get_reviews_for_movie(&self, movie_id: RecordId) -> Result<Vec<ReviewView>, RepositoryError> {
        if self.stores.movies.get_by_id(movie_id)?.is_none() {
            return Err(RepositoryError::NotFound("movie"));
        }
        self.views(|review| review.movie_id == movie_id)
    }

    /// Adds a review. The movie must be one of the user's favorites and a
    /// user reviews a movie at most once.
    pub fn add_movie_review(&self, draft: ReviewDraft) -> Result<RecordId, RepositoryError> {
        let mut errors = Vec::new();
        let user_id = require(draft.user_id, "user_id", &mut errors);
        let movie_id = require(draft.movie_id, "movie_id", &mut errors);
        let rating = require(draft.rating, "rating", &mut errors)
            .and_then(|r| parse_review_rating(&r, &mut errors));
        let review_text = require(draft.review_text, "review_text", &mut errors);
        let (Some(user_id), Some(movie_id), Some(rating), Some(review_text)) =
            (user_id, movie_id, rating, review_text)
        else {
            return Err(RepositoryError::Validation(errors));
        };
        check(errors)?;

        if self.stores.users.get_by_id(user_id)?.is_none() {
            return Err(RepositoryError::NotFound("user"));
        }
        if self.stores.movies.get_by_id(movie_id)?.is_none() {
            return Err(RepositoryError::NotFound("movie"));
        }
        let favorite = self
            .stores
            .user_movies
            .get_all()?
            .iter()
            .any(|link| link.user_id == user_id && link.movie_id == movie_id);
        if !favorite {
            return Err(RepositoryError::Rejected(String::from(
                "only favorite movies can be reviewed",
            )));
        }
        let reviewed = self
            .stores
            .reviews
            .get_all()?
            .iter()
            .any(|review| review.user_id == user_id && review.movie_id == movie_id);
        if reviewed {
            return Err(RepositoryError::Rejected(String::from(
                "movie already reviewed by this user",
            )));
        }

        let id = self.stores.reviews.insert(&MovieReview {
            id: 0,
            user_id,
            movie_id,
            rating,
            review_text,
        })?;
        info!("Review {} added by user {} for movie {}", id, user_id, movie_id);
        Ok(id)
    }

    pub fn update_movie_review(&self, id: RecordId, update: ReviewUpdate) -> Result<(), RepositoryError> {
        let mut errors = Vec::new();
        let rating = update
            .rating
            .as_deref()
            .and_then(|r| parse_review_rating(r, &mut errors));
        check(errors)?;
        let patch = MovieReviewPatch {
            rating,
            review_text: update.review_text,
        };
        self.stores
            .reviews
            .update(id, &patch)
            .map_err(not_found("review"))?;
        debug!("Review {} updated", id);
        Ok(())
    }

    pub fn delete_movie_review(&self, id: RecordId) -> Result<(), RepositoryError> {
        self.stores.reviews.delete(id).map_err(not_found("review"))?;
        info!("Review {} deleted", id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::{all_backends, movie};
    use crate::storage::types::{User, UserMovie};
    use crate::storage::Stores;

    struct Fixture {
        user: RecordId,
        favorite: RecordId,
        other: RecordId,
    }

    fn seed(stores: &Stores) -> Fixture {
        let user = stores.users.insert(&User { id: 0, name: "Alice".into() }).unwrap();
        let favorite = stores.movies.insert(&movie("Titanic")).unwrap();
        let other = stores.movies.insert(&movie("Avatar")).unwrap();
        stores
            .user_movies
            .insert(&UserMovie { id: 0, user_id: user, movie_id: favorite })
            .unwrap();
        Fixture { user, favorite, other }
    }

    fn draft(user_id: RecordId, movie_id: RecordId, rating: &str) -> ReviewDraft {
        ReviewDraft {
            user_id: Some(user_id),
            movie_id: Some(movie_id),
            rating: Some(rating.to_string()),
            review_text: Some("Loved it".to_string()),
        }
    }

    #[test]
    fn test_review_requires_favorite_and_is_unique() {
        for (backend, _dir, stores) in all_backends() {
            let f = seed(&stores);
            let repo = MoviesReviewsRepository::new(stores);

            assert!(matches!(
                repo.add_movie_review(draft(f.user, f.other, "6")),
                Err(RepositoryError::Rejected(_))
            ));

            let id = repo.add_movie_review(draft(f.user, f.favorite, "9.5")).unwrap();
            assert!(matches!(
                repo.add_movie_review(draft(f.user, f.favorite, "3")),
                Err(RepositoryError::Rejected(_))
            ));

            let reviews = repo.get_reviews_for_movie(f.favorite).unwrap();
            assert_eq!(reviews.len(), 1, "{}", backend);
            assert_eq!(reviews[0].id, id);
            assert_eq!(reviews[0].user_name, "Alice");
            assert_eq!(reviews[0].rating, 9.5);
            assert!(repo.get_reviews_for_movie(f.other).unwrap().is_empty());
            assert_eq!(repo.get_reviews_for_movie(99), Err(RepositoryError::NotFound("movie")));
        }
    }

    #[test]
    fn test_review_validation() {
        for (_backend, _dir, stores) in all_backends() {
            let f = seed(&stores);
            let repo = MoviesReviewsRepository::new(stores);

            assert_eq!(
                repo.add_movie_review(ReviewDraft::default()),
                Err(RepositoryError::Validation(vec![
                    "user_id is required".into(),
                    "movie_id is required".into(),
                    "rating is required".into(),
                    "review_text is required".into(),
                ]))
            );
            assert_eq!(
                repo.add_movie_review(draft(f.user, f.favorite, "12")),
                Err(RepositoryError::Validation(vec!["rating must be between 1 and 10".into()]))
            );
            assert_eq!(
                repo.add_movie_review(draft(42, f.favorite, "5")),
                Err(RepositoryError::NotFound("user"))
            );
            assert!(repo.get_movie_reviews().unwrap().is_empty());
        }
    }

    #[test]
    fn test_empty_review_rating_is_refused() {
        for (backend, _dir, stores) in all_backends() {
            let f = seed(&stores);
            let repo = MoviesReviewsRepository::new(stores);
            let out_of_range =
                || RepositoryError::Validation(vec!["rating must be between 1 and 10".into()]);

            assert_eq!(repo.add_movie_review(draft(f.user, f.favorite, "")), Err(out_of_range()), "{}", backend);
            assert!(repo.get_movie_reviews().unwrap().is_empty());

            let id = repo.add_movie_review(draft(f.user, f.favorite, "7")).unwrap();
            assert_eq!(
                repo.update_movie_review(id, ReviewUpdate { rating: Some("".into()), review_text: None }),
                Err(out_of_range())
            );
            assert_eq!(repo.get_movie_reviews().unwrap()[0].rating, 7.0);
        }
    }

    #[test]
    fn test_update_and_delete_review() {
        for (_backend, _dir, stores) in all_backends() {
            let f = seed(&stores);
            let repo = MoviesReviewsRepository::new(stores);
            let id = repo.add_movie_review(draft(f.user, f.favorite, "7")).unwrap();

            repo.update_movie_review(
                id,
                ReviewUpdate { rating: Some("8".into()), review_text: None },
            )
            .unwrap();
            let review = &repo.get_movie_reviews().unwrap()[0];
            assert_eq!(review.rating, 8.0);
            assert_eq!(review.review_text, "Loved it");

            assert_eq!(
                repo.update_movie_review(id, ReviewUpdate { rating: Some("x".into()), review_text: None }),
                Err(RepositoryError::Validation(vec!["rating must be a number".into()]))
            );
            repo.delete_movie_review(id).unwrap();
            assert_eq!(repo.delete_movie_review(id), Err(RepositoryError::NotFound("review")));
            assert_eq!(
                repo.update_movie_review(id, ReviewUpdate::default()),
                Err(RepositoryError::NotFound("review"))
            );
        }
    }
}
