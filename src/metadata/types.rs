use serde::Deserialize;

use crate::storage::types::Movie;

/// Flat lookup response as sent by the provider. Every field may be absent,
/// e.g. on a `{"Response": "False"}` not-found reply.
#[derive(Debug, Default, Deserialize)]
pub struct ProviderResponse {
    #[serde(rename = "Title")]
    pub title: Option<String>,
    #[serde(rename = "Director")]
    pub director: Option<String>,
    /// Leading 4 characters are the release year ("1999", "2008–2013").
    #[serde(rename = "Year")]
    pub year: Option<String>,
    #[serde(rename = "imdbRating")]
    pub rating: Option<String>,
    #[serde(rename = "Poster")]
    pub poster: Option<String>,
    #[serde(rename = "imdbID")]
    pub imdb_id: Option<String>,
}

impl ProviderResponse {
    /// Maps provider fields onto a movie, falling back to `title` for the
    /// name and zero values elsewhere.
    pub fn into_movie(self, title: &str, reference_base_url: &str) -> Movie {
        let year = self
            .year
            .map(|y| y.chars().take(4).collect::<String>())
            .and_then(|y| y.parse::<i32>().ok())
            .unwrap_or(0);
        let rating = self
            .rating
            .and_then(|r| r.trim().parse::<f64>().ok())
            .filter(|r| r.is_finite())
            .unwrap_or(0.0);
        let website = match self.imdb_id {
            Some(id) if !id.is_empty() => format!("{}{}", reference_base_url, id),
            _ => String::new(),
        };
        Movie {
            id: 0,
            name: self.title.unwrap_or_else(|| title.to_string()),
            director: self.director.unwrap_or_default(),
            year,
            rating,
            poster: self.poster.unwrap_or_default(),
            website,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const IMDB: &str = "https://www.imdb.com/title/";

    #[test]
    fn test_full_response_mapping() {
        let body = r#"{
            "Title": "Titanic", "Year": "1997", "Director": "James Cameron",
            "Poster": "https://m.media-amazon.com/images/titanic.jpg",
            "imdbRating": "7.9", "imdbID": "tt0120338", "Response": "True"
        }"#;
        let response: ProviderResponse = serde_json::from_str(body).unwrap();
        let movie = response.into_movie("titanic", IMDB);
        assert_eq!(movie.name, "Titanic");
        assert_eq!(movie.director, "James Cameron");
        assert_eq!(movie.year, 1997);
        assert_eq!(movie.rating, 7.9);
        assert_eq!(movie.website, "https://www.imdb.com/title/tt0120338");
    }

    #[test]
    fn test_year_range_is_truncated() {
        let response = ProviderResponse { year: Some("2008–2013".into()), ..Default::default() };
        assert_eq!(response.into_movie("Breaking Bad", IMDB).year, 2008);
    }

    #[test]
    fn test_not_found_reply_keeps_title_and_zero_values() {
        let body = r#"{"Response": "False", "Error": "Movie not found!"}"#;
        let response: ProviderResponse = serde_json::from_str(body).unwrap();
        let movie = response.into_movie("Unknown Film", IMDB);
        assert_eq!(movie, crate::metadata::placeholder("Unknown Film"));
    }

    #[test]
    fn test_unrated_movie_defaults_rating() {
        let response = ProviderResponse {
            rating: Some("N/A".into()),
            year: Some("N/A".into()),
            ..Default::default()
        };
        let movie = response.into_movie("Indie", IMDB);
        assert_eq!(movie.rating, 0.0);
        assert_eq!(movie.year, 0);
    }
}
