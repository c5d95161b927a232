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

//! API to check out a movie for a customer.

use crate::driver::Driver;
use crate::rest::{RestError, require_session};
use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::{Json, http};
use serde::{Deserialize, Serialize};

/// Message sent to the server to check out or return a movie.
#[derive(Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RentalRequest {
    /// Identifier of the customer taking the movie home.
    pub(crate) customer_id: String,

    /// Identifier of the movie being rented.
    pub(crate) movie_id: String,
}

/// POST handler for this API.
pub(crate) async fn handler(
    State(driver): State<Driver>,
    headers: HeaderMap,
    Json(request): Json<RentalRequest>,
) -> Result<(http::StatusCode, impl IntoResponse), RestError> {
    require_session(&driver, &headers).await?;

    let rental = driver.create_rental(&request.customer_id, &request.movie_id).await?;
    Ok((http::StatusCode::CREATED, Json(rental)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CustomerId;
    use crate::rest::testutils::*;

    fn route() -> (http::Method, String) {
        (http::Method::POST, "/api/rentals".to_owned())
    }

    fn request(customer_id: &str, movie_id: &str) -> RentalRequest {
        RentalRequest { customer_id: customer_id.to_owned(), movie_id: movie_id.to_owned() }
    }

    #[tokio::test]
    async fn test_ok() {
        let context = TestContext::setup().await;
        let token = context.access_token().await;

        let genre = context.inner.insert_genre("Drama").await;
        let ada = context.inner.insert_customer("Ada").await;
        let movie = context.inner.insert_movie(&genre, "Casablanca", 1, 150).await;

        let response = OneShotBuilder::new(context.app(), route())
            .with_bearer_auth(token.as_str())
            .send_json(request(&ada.id().to_string(), &movie.id().to_string()))
            .await
            .expect_status(http::StatusCode::CREATED)
            .expect_json::<serde_json::Value>()
            .await;
        assert_eq!("Ada", response["customer"]["name"]);
        assert_eq!("Casablanca", response["movie"]["title"]);
        assert!(response["returnedDate"].is_null());

        let fetched =
            context.inner.driver().get_movie(&movie.id().to_string()).await.unwrap();
        assert_eq!(0, fetched.number_in_stock().as_u32());
    }

    #[tokio::test]
    async fn test_out_of_stock() {
        let context = TestContext::setup().await;
        let token = context.access_token().await;

        let genre = context.inner.insert_genre("Drama").await;
        let ada = context.inner.insert_customer("Ada").await;
        let movie = context.inner.insert_movie(&genre, "Casablanca", 0, 150).await;

        OneShotBuilder::new(context.into_app(), route())
            .with_bearer_auth(token.as_str())
            .send_json(request(&ada.id().to_string(), &movie.id().to_string()))
            .await
            .expect_status(http::StatusCode::BAD_REQUEST)
            .expect_error("Movie not in stock")
            .await;
    }

    #[tokio::test]
    async fn test_unknown_customer() {
        let context = TestContext::setup().await;
        let token = context.access_token().await;

        let genre = context.inner.insert_genre("Drama").await;
        let movie = context.inner.insert_movie(&genre, "Casablanca", 1, 150).await;

        OneShotBuilder::new(context.into_app(), route())
            .with_bearer_auth(token.as_str())
            .send_json(request(&CustomerId::random().to_string(), &movie.id().to_string()))
            .await
            .expect_status(http::StatusCode::NOT_FOUND)
            .expect_error("Entity not found")
            .await;
    }

    test_requires_auth!(
        TestContext::setup().await.into_app(),
        route(),
        request("irrelevant", "irrelevant")
    );

    test_payload_must_be_json!(TestContext::setup().await.into_app(), route());
}
