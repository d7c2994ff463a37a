use serde::{Deserialize, Serialize};

use crate::storage::storage_trait::Record;

/// Store-assigned record identifier.
pub type RecordId = i32;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: RecordId,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserPatch {
    pub name: Option<String>,
}

impl Record for User {
    type Patch = UserPatch;
    const COLLECTION: &'static str = "users";

    fn id(&self) -> RecordId {
        self.id
    }

    fn set_id(&mut self, id: RecordId) {
        self.id = id;
    }

    fn apply(&mut self, patch: &UserPatch) {
        if let Some(ref name) = patch.name {
            self.name = name.clone();
        }
    }
}

/// A movie as stored. Zero values (`""`, `0`, `0.0`) mean "unknown".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movie {
    pub id: RecordId,
    pub name: String,
    pub director: String,
    pub year: i32,
    pub rating: f64,
    pub poster: String,
    pub website: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MoviePatch {
    pub name: Option<String>,
    pub director: Option<String>,
    pub year: Option<i32>,
    pub rating: Option<f64>,
    pub poster: Option<String>,
    pub website: Option<String>,
}

impl Record for Movie {
    type Patch = MoviePatch;
    const COLLECTION: &'static str = "movies";

    fn id(&self) -> RecordId {
        self.id
    }

    fn set_id(&mut self, id: RecordId) {
        self.id = id;
    }

    fn apply(&mut self, patch: &MoviePatch) {
        if let Some(ref name) = patch.name {
            self.name = name.clone();
        }
        if let Some(ref director) = patch.director {
            self.director = director.clone();
        }
        if let Some(year) = patch.year {
            self.year = year;
        }
        if let Some(rating) = patch.rating {
            self.rating = rating;
        }
        if let Some(ref poster) = patch.poster {
            self.poster = poster.clone();
        }
        if let Some(ref website) = patch.website {
            self.website = website.clone();
        }
    }
}

/// Favorite link between a user and a movie.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserMovie {
    pub id: RecordId,
    pub user_id: RecordId,
    pub movie_id: RecordId,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserMoviePatch {
    pub user_id: Option<RecordId>,
    pub movie_id: Option<RecordId>,
}

impl Record for UserMovie {
    type Patch = UserMoviePatch;
    const COLLECTION: &'static str = "user_movies";

    fn id(&self) -> RecordId {
        self.id
    }

    fn set_id(&mut self, id: RecordId) {
        self.id = id;
    }

    fn apply(&mut self, patch: &UserMoviePatch) {
        if let Some(user_id) = patch.user_id {
            self.user_id = user_id;
        }
        if let Some(movie_id) = patch.movie_id {
            self.movie_id = movie_id;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieReview {
    pub id: RecordId,
    pub user_id: RecordId,
    pub movie_id: RecordId,
    pub rating: f64,
    pub review_text: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MovieReviewPatch {
    pub rating: Option<f64>,
    pub review_text: Option<String>,
}

impl Record for MovieReview {
    type Patch = MovieReviewPatch;
    const COLLECTION: &'static str = "movie_reviews";

    fn id(&self) -> RecordId {
        self.id
    }

    fn set_id(&mut self, id: RecordId) {
        self.id = id;
    }

    fn apply(&mut self, patch: &MovieReviewPatch) {
        if let Some(rating) = patch.rating {
            self.rating = rating;
        }
        if let Some(ref review_text) = patch.review_text {
            self.review_text = review_text.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_movie_patch_only_touches_supplied_fields() {
        let mut movie = Movie {
            id: 3,
            name: "Titanic".into(),
            director: "James Cameron".into(),
            year: 1997,
            rating: 7.9,
            poster: "poster.jpg".into(),
            website: "https://www.imdb.com/title/tt0120338".into(),
        };
        movie.apply(&MoviePatch { rating: Some(8.1), ..Default::default() });
        assert_eq!(movie.rating, 8.1);
        assert_eq!(movie.name, "Titanic");
        assert_eq!(movie.year, 1997);
        assert_eq!(movie.id, 3);
    }

    #[test]
    fn test_empty_patch_is_noop() {
        let mut user = User { id: 1, name: "Alice".into() };
        let before = user.clone();
        user.apply(&UserPatch::default());
        assert_eq!(user, before);
    }
}
