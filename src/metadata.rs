//! External movie metadata lookup.
//!
//! A lookup never fails from the caller's point of view: any network or
//! provider problem degrades to a placeholder movie carrying only the title.

pub mod fetcher;
pub mod types;

pub use fetcher::OmdbFetcher;

use crate::storage::types::Movie;

/// Source of movie metadata keyed by title.
pub trait MetadataProvider: Send + Sync {
    /// Returns the best known metadata for `title`; `id` is left at 0.
    fn fetch(&self, title: &str) -> Movie;
}

/// A movie with only its title known.
pub fn placeholder(title: &str) -> Movie {
    Movie {
        id: 0,
        name: title.to_string(),
        director: String::new(),
        year: 0,
        rating: 0.0,
        poster: String::new(),
        website: String::new(),
    }
}
