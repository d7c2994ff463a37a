//! Field checks shared by the repositories.
//!
//! Every check collects human-readable messages instead of stopping at the
//! first problem, so a caller can report all of them at once.

use crate::error_handling::types::RepositoryError;

pub const RATING_MIN: f64 = 1.0;
pub const RATING_MAX: f64 = 10.0;

fn starts_with_letter(text: &str) -> bool {
    text.chars().next().is_some_and(char::is_alphabetic)
}

/// Unwraps a required key, recording `"<key> is required"` when absent.
pub fn require<T>(value: Option<T>, key: &str, errors: &mut Vec<String>) -> Option<T> {
    if value.is_none() {
        errors.push(format!("{} is required", key));
    }
    value
}

/// Turns collected messages into a validation error, if any.
pub fn check(errors: Vec<String>) -> Result<(), RepositoryError> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(RepositoryError::Validation(errors))
    }
}

pub fn validate_user_name(name: &str, errors: &mut Vec<String>) {
    if name.is_empty() {
        errors.push(String::from("name cannot be empty"));
    } else if !starts_with_letter(name) {
        errors.push(String::from("name must start with a letter"));
    }
}

pub fn validate_movie_name(name: &str, errors: &mut Vec<String>) {
    if name.is_empty() {
        errors.push(String::from("movie name cannot be empty"));
    } else if !starts_with_letter(name) {
        errors.push(String::from("movie name must start with a letter"));
    }
}

/// An empty director is allowed and means "unknown".
pub fn validate_director(director: &str, errors: &mut Vec<String>) {
    if !director.is_empty() && !starts_with_letter(director) {
        errors.push(String::from("director must start with a letter"));
    }
}

/// Parses a release year. Empty text is 0 ("unknown"); otherwise exactly
/// four ASCII digits.
pub fn parse_year(text: &str, errors: &mut Vec<String>) -> Option<i32> {
    if text.is_empty() {
        return Some(0);
    }
    if !text.chars().all(|c| c.is_ascii_digit()) {
        errors.push(String::from("year must be a number"));
        return None;
    }
    if text.len() != 4 {
        errors.push(String::from("year must be 4 digits"));
        return None;
    }
    text.parse().ok()
}

/// Parses a rating. Empty text is 0.0 ("unrated"); otherwise a number in
/// `[RATING_MIN, RATING_MAX]`.
pub fn parse_rating(text: &str, errors: &mut Vec<String>) -> Option<f64> {
    if text.is_empty() {
        return Some(0.0);
    }
    match text.trim().parse::<f64>() {
        Err(_) => {
            errors.push(String::from("rating must be a number"));
            None
        }
        Ok(rating) if !(RATING_MIN..=RATING_MAX).contains(&rating) => {
            errors.push(String::from("rating must be between 1 and 10"));
            None
        }
        Ok(rating) => Some(rating),
    }
}

/// Parses a review rating. Unlike a movie, a review cannot be unrated.
pub fn parse_review_rating(text: &str, errors: &mut Vec<String>) -> Option<f64> {
    if text.trim().is_empty() {
        errors.push(String::from("rating must be between 1 and 10"));
        return None;
    }
    parse_rating(text, errors)
}
