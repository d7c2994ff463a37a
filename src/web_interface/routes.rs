use std::convert::Infallible;
use std::sync::Arc;

use log::{debug, error};
use serde::de::DeserializeOwned;
use serde::Serialize;
use warp::http::StatusCode;
use warp::reply::{self, Response};
use warp::{Filter, Rejection, Reply};

use super::types::{ApiError, Created, Message};
use crate::error_handling::types::RepositoryError;
use crate::repository::types::{
    MovieDraft, MovieUpdate, ReviewDraft, ReviewUpdate, UserDraft, UserMovieDraft, UserUpdate,
};
use crate::repository::Repositories;
use crate::storage::types::RecordId;

const BODY_LIMIT: u64 = 64 * 1024;

fn with_repos(
    repos: Arc<Repositories>,
) -> impl Filter<Extract = (Arc<Repositories>,), Error = Infallible> + Clone {
    warp::any().map(move || repos.clone())
}

fn json_body<T: DeserializeOwned + Send>() -> impl Filter<Extract = (T,), Error = Rejection> + Clone {
    warp::body::content_length_limit(BODY_LIMIT).and(warp::body::json())
}

pub fn error_reply(message: &str, status: StatusCode) -> Response {
    reply::with_status(
        reply::json(&ApiError {
            error_message: message.to_string(),
        }),
        status,
    )
    .into_response()
}

pub fn status_of(err: &RepositoryError) -> StatusCode {
    match err {
        RepositoryError::Validation(_) => StatusCode::BAD_REQUEST,
        RepositoryError::NotFound(_) => StatusCode::NOT_FOUND,
        RepositoryError::Rejected(_) => StatusCode::CONFLICT,
        RepositoryError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Client-facing text of a repository error. Storage details stay in the log.
pub fn message_of(err: &RepositoryError) -> String {
    match err {
        RepositoryError::Validation(messages) => messages.join(", "),
        RepositoryError::NotFound(what) => format!("{} not found", what),
        RepositoryError::Rejected(reason) => reason.clone(),
        RepositoryError::Storage(_) => String::from("storage failure"),
    }
}

/// Runs a repository call on the blocking pool and renders its outcome.
async fn run<T, F>(repos: Arc<Repositories>, success: StatusCode, call: F) -> Result<Response, Rejection>
where
    T: Serialize + Send + 'static,
    F: FnOnce(&Repositories) -> Result<T, RepositoryError> + Send + 'static,
{
    let outcome = tokio::task::spawn_blocking(move || call(&repos)).await;
    Ok(match outcome {
        Ok(Ok(body)) => reply::with_status(reply::json(&body), success).into_response(),
        Ok(Err(e)) => {
            match e {
                RepositoryError::Storage(_) => error!("Request failed: {}", e),
                _ => debug!("Request refused: {}", e),
            }
            error_reply(&message_of(&e), status_of(&e))
        }
        Err(e) => {
            error!("Request worker failed: {}", e);
            error_reply("internal error", StatusCode::INTERNAL_SERVER_ERROR)
        }
    })
}

/// GET /users
fn list_users(repos: Arc<Repositories>) -> impl Filter<Extract = (Response,), Error = Rejection> + Clone {
    warp::path!("users")
        .and(warp::get())
        .and(with_repos(repos))
        .and_then(|repos: Arc<Repositories>| run(repos, StatusCode::OK, |r| r.users.get_all_users()))
}

/// POST /users
fn create_user(repos: Arc<Repositories>) -> impl Filter<Extract = (Response,), Error = Rejection> + Clone {
    warp::path!("users")
        .and(warp::post())
        .and(json_body::<UserDraft>())
        .and(with_repos(repos))
        .and_then(|draft: UserDraft, repos: Arc<Repositories>| {
            run(repos, StatusCode::CREATED, move |r| {
                r.users.add_user(draft).map(|id| Created { id })
            })
        })
}

/// GET /users/:id
fn get_user(repos: Arc<Repositories>) -> impl Filter<Extract = (Response,), Error = Rejection> + Clone {
    warp::path!("users" / RecordId)
        .and(warp::get())
        .and(with_repos(repos))
        .and_then(|id: RecordId, repos: Arc<Repositories>| {
            run(repos, StatusCode::OK, move |r| r.users.get_user(id))
        })
}

/// PATCH /users/:id
fn update_user(repos: Arc<Repositories>) -> impl Filter<Extract = (Response,), Error = Rejection> + Clone {
    warp::path!("users" / RecordId)
        .and(warp::patch())
        .and(json_body::<UserUpdate>())
        .and(with_repos(repos))
        .and_then(|id: RecordId, update: UserUpdate, repos: Arc<Repositories>| {
            run(repos, StatusCode::OK, move |r| {
                r.users
                    .update_user(id, update)
                    .map(|_| Message::new("user updated"))
            })
        })
}

/// DELETE /users/:id
fn delete_user(repos: Arc<Repositories>) -> impl Filter<Extract = (Response,), Error = Rejection> + Clone {
    warp::path!("users" / RecordId)
        .and(warp::delete())
        .and(with_repos(repos))
        .and_then(|id: RecordId, repos: Arc<Repositories>| {
            run(repos, StatusCode::OK, move |r| {
                r.users.delete_user(id).map(|_| Message::new("user deleted"))
            })
        })
}

/// GET /users/:id/movies
fn user_favorites(repos: Arc<Repositories>) -> impl Filter<Extract = (Response,), Error = Rejection> + Clone {
    warp::path!("users" / RecordId / "movies")
        .and(warp::get())
        .and(with_repos(repos))
        .and_then(|id: RecordId, repos: Arc<Repositories>| {
            run(repos, StatusCode::OK, move |r| r.users.get_user_movies(id))
        })
}

/// GET /users/movies
fn list_favorites(repos: Arc<Repositories>) -> impl Filter<Extract = (Response,), Error = Rejection> + Clone {
    warp::path!("users" / "movies")
        .and(warp::get())
        .and(with_repos(repos))
        .and_then(|repos: Arc<Repositories>| {
            run(repos, StatusCode::OK, |r| r.user_movies.get_all_user_movies())
        })
}

/// GET /users/movies/:user_movie_id
fn get_favorite(repos: Arc<Repositories>) -> impl Filter<Extract = (Response,), Error = Rejection> + Clone {
    warp::path!("users" / "movies" / RecordId)
        .and(warp::get())
        .and(with_repos(repos))
        .and_then(|id: RecordId, repos: Arc<Repositories>| {
            run(repos, StatusCode::OK, move |r| r.user_movies.get_user_movie(id))
        })
}

/// POST /users/:id/movies/:movie_id
fn add_favorite(repos: Arc<Repositories>) -> impl Filter<Extract = (Response,), Error = Rejection> + Clone {
    warp::path!("users" / RecordId / "movies" / RecordId)
        .and(warp::post())
        .and(with_repos(repos))
        .and_then(|user_id: RecordId, movie_id: RecordId, repos: Arc<Repositories>| {
            let draft = UserMovieDraft {
                user_id: Some(user_id),
                movie_id: Some(movie_id),
            };
            run(repos, StatusCode::CREATED, move |r| {
                r.user_movies.add_user_movie(draft).map(|id| Created { id })
            })
        })
}

/// DELETE /users/movies/:user_movie_id
fn remove_favorite(repos: Arc<Repositories>) -> impl Filter<Extract = (Response,), Error = Rejection> + Clone {
    warp::path!("users" / "movies" / RecordId)
        .and(warp::delete())
        .and(with_repos(repos))
        .and_then(|id: RecordId, repos: Arc<Repositories>| {
            run(repos, StatusCode::OK, move |r| {
                r.user_movies
                    .delete_user_movie(id)
                    .map(|_| Message::new("favorite removed"))
            })
        })
}

/// GET /movies
fn list_movies(repos: Arc<Repositories>) -> impl Filter<Extract = (Response,), Error = Rejection> + Clone {
    warp::path!("movies")
        .and(warp::get())
        .and(with_repos(repos))
        .and_then(|repos: Arc<Repositories>| run(repos, StatusCode::OK, |r| r.movies.get_movies()))
}

/// GET /movies/:id
fn get_movie(repos: Arc<Repositories>) -> impl Filter<Extract = (Response,), Error = Rejection> + Clone {
    warp::path!("movies" / RecordId)
        .and(warp::get())
        .and(with_repos(repos))
        .and_then(|id: RecordId, repos: Arc<Repositories>| {
            run(repos, StatusCode::OK, move |r| r.movies.get_movie(id))
        })
}

/// POST /movies/add_movie
fn add_movie(repos: Arc<Repositories>) -> impl Filter<Extract = (Response,), Error = Rejection> + Clone {
    warp::path!("movies" / "add_movie")
        .and(warp::post())
        .and(json_body::<MovieDraft>())
        .and(with_repos(repos))
        .and_then(|draft: MovieDraft, repos: Arc<Repositories>| {
            run(repos, StatusCode::CREATED, move |r| {
                r.movies.add_movie(draft).map(|id| Created { id })
            })
        })
}

/// PATCH /movies/update_movie/:id
fn update_movie(repos: Arc<Repositories>) -> impl Filter<Extract = (Response,), Error = Rejection> + Clone {
    warp::path!("movies" / "update_movie" / RecordId)
        .and(warp::patch())
        .and(json_body::<MovieUpdate>())
        .and(with_repos(repos))
        .and_then(|id: RecordId, update: MovieUpdate, repos: Arc<Repositories>| {
            run(repos, StatusCode::OK, move |r| {
                r.movies
                    .update_movie(id, update)
                    .map(|_| Message::new("movie updated"))
            })
        })
}

/// DELETE /movies/delete_movie/:id
fn delete_movie(repos: Arc<Repositories>) -> impl Filter<Extract = (Response,), Error = Rejection> + Clone {
    warp::path!("movies" / "delete_movie" / RecordId)
        .and(warp::delete())
        .and(with_repos(repos))
        .and_then(|id: RecordId, repos: Arc<Repositories>| {
            run(repos, StatusCode::OK, move |r| {
                r.movies.delete_movie(id).map(|_| Message::new("movie deleted"))
            })
        })
}

/// GET /movies/:id/reviews
fn movie_reviews(repos: Arc<Repositories>) -> impl Filter<Extract = (Response,), Error = Rejection> + Clone {
    warp::path!("movies" / RecordId / "reviews")
        .and(warp::get())
        .and(with_repos(repos))
        .and_then(|id: RecordId, repos: Arc<Repositories>| {
            run(repos, StatusCode::OK, move |r| r.reviews.get_reviews_for_movie(id))
        })
}

/// GET /reviews
fn list_reviews(repos: Arc<Repositories>) -> impl Filter<Extract = (Response,), Error = Rejection> + Clone {
    warp::path!("reviews")
        .and(warp::get())
        .and(with_repos(repos))
        .and_then(|repos: Arc<Repositories>| {
            run(repos, StatusCode::OK, |r| r.reviews.get_movie_reviews())
        })
}

/// POST /users/:user_id/add_movie_review/:movie_id
fn add_review(repos: Arc<Repositories>) -> impl Filter<Extract = (Response,), Error = Rejection> + Clone {
    warp::path!("users" / RecordId / "add_movie_review" / RecordId)
        .and(warp::post())
        .and(json_body::<ReviewDraft>())
        .and(with_repos(repos))
        .and_then(
            |user_id: RecordId, movie_id: RecordId, draft: ReviewDraft, repos: Arc<Repositories>| {
                let draft = ReviewDraft {
                    user_id: Some(user_id),
                    movie_id: Some(movie_id),
                    ..draft
                };
                run(repos, StatusCode::CREATED, move |r| {
                    r.reviews.add_movie_review(draft).map(|id| Created { id })
                })
            },
        )
}

/// PATCH /reviews/:id
fn update_review(repos: Arc<Repositories>) -> impl Filter<Extract = (Response,), Error = Rejection> + Clone {
    warp::path!("reviews" / RecordId)
        .and(warp::patch())
        .and(json_body::<ReviewUpdate>())
        .and(with_repos(repos))
        .and_then(|id: RecordId, update: ReviewUpdate, repos: Arc<Repositories>| {
            run(repos, StatusCode::OK, move |r| {
                r.reviews
                    .update_movie_review(id, update)
                    .map(|_| Message::new("review updated"))
            })
        })
}

/// DELETE /reviews/:id
fn delete_review(repos: Arc<Repositories>) -> impl Filter<Extract = (Response,), Error = Rejection> + Clone {
    warp::path!("reviews" / RecordId)
        .and(warp::delete())
        .and(with_repos(repos))
        .and_then(|id: RecordId, repos: Arc<Repositories>| {
            run(repos, StatusCode::OK, move |r| {
                r.reviews
                    .delete_movie_review(id)
                    .map(|_| Message::new("review deleted"))
            })
        })
}

fn user_routes(repos: Arc<Repositories>) -> impl Filter<Extract = (Response,), Error = Rejection> + Clone {
    list_users(repos.clone())
        .or(create_user(repos.clone()))
        .unify()
        .or(list_favorites(repos.clone()))
        .unify()
        .or(get_favorite(repos.clone()))
        .unify()
        .or(remove_favorite(repos.clone()))
        .unify()
        .or(get_user(repos.clone()))
        .unify()
        .or(update_user(repos.clone()))
        .unify()
        .or(delete_user(repos.clone()))
        .unify()
        .or(user_favorites(repos.clone()))
        .unify()
        .or(add_favorite(repos))
        .unify()
}

fn movie_routes(repos: Arc<Repositories>) -> impl Filter<Extract = (Response,), Error = Rejection> + Clone {
    list_movies(repos.clone())
        .or(get_movie(repos.clone()))
        .unify()
        .or(add_movie(repos.clone()))
        .unify()
        .or(update_movie(repos.clone()))
        .unify()
        .or(delete_movie(repos.clone()))
        .unify()
        .or(movie_reviews(repos))
        .unify()
}

fn review_routes(repos: Arc<Repositories>) -> impl Filter<Extract = (Response,), Error = Rejection> + Clone {
    list_reviews(repos.clone())
        .or(add_review(repos.clone()))
        .unify()
        .or(update_review(repos.clone()))
        .unify()
        .or(delete_review(repos))
        .unify()
}

/// Turns unmatched routes and undecodable bodies into JSON errors.
pub async fn handle_rejection(err: Rejection) -> Result<Response, Infallible> {
    if err.is_not_found() {
        return Ok(error_reply("route not found", StatusCode::NOT_FOUND));
    }
    if let Some(e) = err.find::<warp::body::BodyDeserializeError>() {
        return Ok(error_reply(&e.to_string(), StatusCode::BAD_REQUEST));
    }
    if err.find::<warp::reject::PayloadTooLarge>().is_some() {
        return Ok(error_reply("request body too large", StatusCode::PAYLOAD_TOO_LARGE));
    }
    if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        return Ok(error_reply("method not allowed", StatusCode::METHOD_NOT_ALLOWED));
    }
    error!("Unhandled rejection: {:?}", err);
    Ok(error_reply("internal error", StatusCode::INTERNAL_SERVER_ERROR))
}

/// The complete JSON API.
pub fn api(repos: Arc<Repositories>) -> impl Filter<Extract = (impl Reply,), Error = Infallible> + Clone {
    user_routes(repos.clone())
        .or(movie_routes(repos.clone()))
        .unify()
        .or(review_routes(repos))
        .unify()
        .recover(handle_rejection)
}
