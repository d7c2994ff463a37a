//! Input drafts and output views of the repositories.
//!
//! Drafts mirror decoded JSON bodies: every key is optional so that a
//! missing key becomes a validation message rather than a decode error.

use serde::{Deserialize, Deserializer, Serialize};

use crate::storage::types::{Movie, RecordId};

/// Accepts a JSON string or number and keeps its text form.
fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<serde_json::Value>::deserialize(deserializer)? {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserDraft {
    pub user_name: Option<String>,
    /// Movie ids to link as favorites right away
    pub movies: Option<Vec<RecordId>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserUpdate {
    pub user_name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserMovieDraft {
    pub user_id: Option<RecordId>,
    pub movie_id: Option<RecordId>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MovieDraft {
    pub movie_name: Option<String>,
}

/// Text-form movie edit. Only supplied keys change; an empty `year` or
/// `rating` resets the field to unknown.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MovieUpdate {
    pub movie_name: Option<String>,
    pub director: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub year: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub rating: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReviewDraft {
    pub user_id: Option<RecordId>,
    pub movie_id: Option<RecordId>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub rating: Option<String>,
    pub review_text: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReviewUpdate {
    #[serde(default, deserialize_with = "lenient_text")]
    pub rating: Option<String>,
    pub review_text: Option<String>,
}

/// A favorite as embedded in a user: the movie plus its link id.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FavoriteMovie {
    pub user_movie_id: RecordId,
    pub id: RecordId,
    pub movie_name: String,
    pub director: String,
    pub year: i32,
    pub rating: f64,
    pub poster: String,
    pub website: String,
}

impl FavoriteMovie {
    pub fn new(user_movie_id: RecordId, movie: Movie) -> Self {
        Self {
            user_movie_id,
            id: movie.id,
            movie_name: movie.name,
            director: movie.director,
            year: movie.year,
            rating: movie.rating,
            poster: movie.poster,
            website: movie.website,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserView {
    pub id: RecordId,
    pub user_name: String,
    pub movies: Vec<FavoriteMovie>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReviewView {
    pub id: RecordId,
    pub user_id: RecordId,
    pub movie_id: RecordId,
    pub rating: f64,
    pub review_text: String,
    pub user_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MovieView {
    pub id: RecordId,
    pub movie_name: String,
    pub director: String,
    pub year: i32,
    pub rating: f64,
    pub poster: String,
    pub website: String,
    pub movie_reviews: Vec<ReviewView>,
}

impl MovieView {
    pub fn new(movie: Movie, movie_reviews: Vec<ReviewView>) -> Self {
        Self {
            id: movie.id,
            movie_name: movie.name,
            director: movie.director,
            year: movie.year,
            rating: movie.rating,
            poster: movie.poster,
            website: movie.website,
            movie_reviews,
        }
    }
}
