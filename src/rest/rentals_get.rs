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

//! API to list all rentals.

use crate::driver::Driver;
use crate::rest::{EmptyBody, RestError};
use axum::Json;
use axum::extract::State;
use axum::response::IntoResponse;

/// GET handler for this API.
pub(crate) async fn handler(
    State(driver): State<Driver>,
    _: EmptyBody,
) -> Result<impl IntoResponse, RestError> {
    let rentals = driver.list_rentals().await?;
    Ok(Json(rentals))
}

#[cfg(test)]
mod tests {
    use crate::rest::testutils::*;
    use axum::http;
    use std::time::Duration;

    fn route() -> (http::Method, String) {
        (http::Method::GET, "/api/rentals".to_owned())
    }

    #[tokio::test]
    async fn test_ok() {
        let context = TestContext::setup().await;

        let genre = context.inner.insert_genre("Drama").await;
        let ada = context.inner.insert_customer("Ada").await;
        let movie = context.inner.insert_movie(&genre, "Casablanca", 5, 150).await;

        let first = context
            .inner
            .driver()
            .create_rental(&ada.id().to_string(), &movie.id().to_string())
            .await
            .unwrap();
        context.inner.clock.advance(Duration::from_secs(60));
        let second = context
            .inner
            .driver()
            .create_rental(&ada.id().to_string(), &movie.id().to_string())
            .await
            .unwrap();

        let response = OneShotBuilder::new(context.into_app(), route())
            .send_empty()
            .await
            .expect_json::<serde_json::Value>()
            .await;
        // Newest rentals come first.
        assert_eq!(serde_json::to_value(vec![&second, &first]).unwrap(), response);
    }

    #[tokio::test]
    async fn test_empty() {
        let context = TestContext::setup().await;

        let response = OneShotBuilder::new(context.into_app(), route())
            .send_empty()
            .await
            .expect_json::<serde_json::Value>()
            .await;
        assert_eq!(serde_json::json!([]), response);
    }

    test_payload_must_be_empty!(TestContext::setup().await.into_app(), route());
}
