// Cinerent
// Copyright 2025 The Cinerent Authors
//
// Licensed under the Apache License, Version 2.0 (the "License"); you may not
// use this file except in compliance with the License.  You may obtain a copy
// of the License at:
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS, WITHOUT
// WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.  See the
// License for the specific language governing permissions and limitations
// under the License.

//! REST interface for the rental store.
//!
//! Every API is put in its own `.rs` file, using a name like `<entity>_<method>.rs`.  This may
//! seem overkill, but putting every API in its own file makes it easy to ensure all the
//! integration tests for the given API truly belong to that API.
//!
//! More specifically, the `tests` module within an API defines a `route` method that returns the
//! HTTP method and the API path under test.  All integration tests within the module then rely on
//! `route` to obtain this information, ensuring that they all test the desired API.

use crate::driver::{Driver, DriverError};
use crate::model::{ModelError, User};
use async_trait::async_trait;
use axum::Json;
use axum::Router;
use axum::body::HttpBody;
use axum::extract::{FromRequest, Request};
use axum::http::header::AsHeaderName;
use axum::http::{HeaderMap, HeaderValue};
use axum::response::IntoResponse;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

mod customer_delete;
mod customer_get;
mod customer_put;
mod customers_get;
mod customers_post;
mod genre_delete;
mod genre_get;
mod genre_put;
mod genres_get;
mod genres_post;
mod httputils;
mod login_post;
mod logout_post;
mod movie_delete;
mod movie_get;
mod movie_put;
mod movies_get;
mod movies_post;
mod rental_delete;
mod rental_get;
mod rentals_get;
mod rentals_post;
mod returns_post;
#[cfg(test)]
mod testutils;
mod users_me_get;
mod users_post;

pub(crate) use httputils::{get_basic_auth, get_bearer_auth};

/// Authorization realm presented to clients on authentication failures.
pub(crate) const REALM: &str = "cinerent";

/// Frontend errors.  These are the errors that are visible to the user on failed requests.
#[derive(Debug, PartialEq, thiserror::Error)]
pub(crate) enum RestError {
    /// Catch-all error type for all unexpected errors.
    #[error("{0}")]
    InternalError(String),

    /// Indicates an error in the contents of the request.
    #[error("{0}")]
    InvalidRequest(String),

    /// Indicates that a requested entity does not exist.
    #[error("{0}")]
    NotFound(String),

    /// Indicates that a request that should have empty content did not.
    #[error("Content should be empty")]
    PayloadNotEmpty,

    /// Indicates an authentication problem.
    #[error("Unauthorized: {message}")]
    Unauthorized {
        /// Expected authorization scheme.
        scheme: &'static str,

        /// Expected authorization realm.
        realm: &'static str,

        /// Descriptive message explaining the nature of the problem.
        message: String,
    },

    /// Indicates that the service is temporarily unable to process the request.
    #[error("{0}")]
    Unavailable(String),
}

impl From<DriverError> for RestError {
    fn from(e: DriverError) -> Self {
        match e {
            DriverError::AlreadyExists(_) => RestError::InvalidRequest(e.to_string()),
            DriverError::AlreadyProcessed(_) => RestError::InvalidRequest(e.to_string()),
            DriverError::BackendError(_) => RestError::InternalError(e.to_string()),
            DriverError::InsufficientStock(_) => RestError::InvalidRequest(e.to_string()),
            DriverError::InvalidInput(_) => RestError::InvalidRequest(e.to_string()),
            DriverError::NotFound(_) => RestError::NotFound(e.to_string()),
            DriverError::Unauthorized(_) => RestError::Unauthorized {
                scheme: "Bearer",
                realm: REALM,
                message: e.to_string(),
            },
            DriverError::Unavailable(_) => RestError::Unavailable(e.to_string()),
        }
    }
}

impl From<ModelError> for RestError {
    fn from(e: ModelError) -> Self {
        RestError::InvalidRequest(e.to_string())
    }
}

impl IntoResponse for RestError {
    fn into_response(self) -> axum::response::Response {
        let mut status;
        let mut headers = HeaderMap::new();
        match self {
            RestError::InternalError(_) => {
                status = http::StatusCode::INTERNAL_SERVER_ERROR;
            }
            RestError::InvalidRequest(_) => {
                status = http::StatusCode::BAD_REQUEST;
            }
            RestError::NotFound(_) => {
                status = http::StatusCode::NOT_FOUND;
            }
            RestError::PayloadNotEmpty => {
                status = http::StatusCode::PAYLOAD_TOO_LARGE;
            }
            RestError::Unauthorized { scheme, realm, message: _ } => {
                status = http::StatusCode::UNAUTHORIZED;
                match format!("{} realm=\"{}\"", scheme, realm).parse() {
                    Ok(value) => {
                        headers.insert("WWW-Authenticate", value);
                    }
                    Err(_) => {
                        status = http::StatusCode::INTERNAL_SERVER_ERROR;
                    }
                }
            }
            RestError::Unavailable(_) => {
                status = http::StatusCode::SERVICE_UNAVAILABLE;
            }
        };

        let response = ErrorResponse { message: self.to_string() };

        (status, headers, Json(response)).into_response()
    }
}

/// Result type for this module.
pub(crate) type RestResult<T> = Result<T, RestError>;

/// Representation of the details of an error response.
#[derive(Debug, Deserialize, Serialize)]
pub(crate) struct ErrorResponse {
    /// Textual representation of the error message.
    pub(crate) message: String,
}

/// A request body extractor that forbids any content.
///
/// Any API that doesn't expect a body should use this to ensure we don't get garbage data that we
/// don't care about.  This future-proofs the service.
pub(crate) struct EmptyBody {}

#[async_trait]
impl<S> FromRequest<S> for EmptyBody
where
    S: Send + Sync,
{
    type Rejection = RestError;

    async fn from_request(req: Request, _state: &S) -> Result<Self, Self::Rejection> {
        if req.into_body().is_end_stream() {
            Ok(EmptyBody {})
        } else {
            Err(RestError::PayloadNotEmpty)
        }
    }
}

/// Extracts the header `name` from `headers` and ensures it has at most one value.
pub(crate) fn get_unique_header<K: AsHeaderName + Copy>(
    headers: &HeaderMap,
    name: K,
) -> RestResult<Option<&HeaderValue>> {
    let mut iter = headers.get_all(name).iter();
    let value = iter.next();
    if iter.next().is_some() {
        return Err(RestError::InvalidRequest(format!(
            "Header {} cannot have more than one value",
            name.as_str()
        )));
    }
    Ok(value)
}

/// Validates the bearer token in `headers` and returns the user that owns the session.
///
/// Mutating APIs call this before touching the store; read-only APIs are public.
pub(crate) async fn require_session(
    driver: &Driver,
    headers: &HeaderMap,
) -> RestResult<Arc<User>> {
    let token = get_bearer_auth(headers, REALM)?;
    match driver.clone().whoami(token).await {
        Ok(user) => Ok(user),
        Err(e @ DriverError::Unauthorized(_)) => Err(RestError::Unauthorized {
            scheme: "Bearer",
            realm: REALM,
            message: e.to_string(),
        }),
        Err(e) => Err(e.into()),
    }
}

/// Creates the router for the application.
pub(crate) fn app(driver: Driver) -> Router {
    use axum::routing::{get, post};

    Router::new()
        .route("/api/genres", get(genres_get::handler).post(genres_post::handler))
        .route(
            "/api/genres/:id",
            get(genre_get::handler).put(genre_put::handler).delete(genre_delete::handler),
        )
        .route("/api/customers", get(customers_get::handler).post(customers_post::handler))
        .route(
            "/api/customers/:id",
            get(customer_get::handler)
                .put(customer_put::handler)
                .delete(customer_delete::handler),
        )
        .route("/api/movies", get(movies_get::handler).post(movies_post::handler))
        .route(
            "/api/movies/:id",
            get(movie_get::handler).put(movie_put::handler).delete(movie_delete::handler),
        )
        .route("/api/rentals", get(rentals_get::handler).post(rentals_post::handler))
        .route("/api/rentals/:id", get(rental_get::handler).delete(rental_delete::handler))
        .route("/api/returns", post(returns_post::handler))
        .route("/api/users", post(users_post::handler))
        .route("/api/users/me", get(users_me_get::handler))
        .route("/api/auth/login", post(login_post::handler))
        .route("/api/auth/logout", post(logout_post::handler))
        .with_state(driver)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_unique_header_missing() {
        let mut headers = HeaderMap::new();
        headers.append("ignore-me", "ignored".parse().unwrap());
        assert!(get_unique_header(&headers, "the-header").unwrap().is_none());
    }

    #[test]
    fn test_get_unique_header_one() {
        let mut headers = HeaderMap::new();
        headers.append("ignore-me", "ignored".parse().unwrap());
        headers.append("the-header", "foo".parse().unwrap());
        assert_eq!(b"foo", get_unique_header(&headers, "the-header").unwrap().unwrap().as_bytes());
    }

    #[test]
    fn test_get_unique_header_many() {
        let mut headers = HeaderMap::new();
        headers.append("the-header", "foo".parse().unwrap());
        headers.append("ignore-me", "ignored".parse().unwrap());
        headers.append("The-Header", "bar".parse().unwrap());
        assert_eq!(
            RestError::InvalidRequest(
                "Header the-header cannot have more than one value".to_owned()
            ),
            get_unique_header(&headers, "the-header").unwrap_err()
        );
    }
}
