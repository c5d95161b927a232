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

//! API to update an existing customer.

use crate::driver::Driver;
use crate::rest::customers_post::CustomerRequest;
use crate::rest::{RestError, require_session};
use axum::Json;
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::response::IntoResponse;

/// PUT handler for this API.
pub(crate) async fn handler(
    State(driver): State<Driver>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(request): Json<CustomerRequest>,
) -> Result<impl IntoResponse, RestError> {
    require_session(&driver, &headers).await?;

    let customer =
        driver.update_customer(&id, request.name, request.phone, request.is_gold).await?;
    Ok(Json(customer))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CustomerId, CustomerName, Phone};
    use crate::rest::testutils::*;
    use axum::http;

    fn route(id: &str) -> (http::Method, String) {
        (http::Method::PUT, format!("/api/customers/{}", id))
    }

    fn request() -> CustomerRequest {
        CustomerRequest {
            name: CustomerName::new("Ada Lovelace").unwrap(),
            phone: Phone::new("555-0199").unwrap(),
            is_gold: true,
        }
    }

    #[tokio::test]
    async fn test_ok() {
        let context = TestContext::setup().await;
        let token = context.access_token().await;

        let ada = context.inner.insert_customer("Ada").await;

        let response = OneShotBuilder::new(context.app(), route(&ada.id().to_string()))
            .with_bearer_auth(token.as_str())
            .send_json(request())
            .await
            .expect_json::<serde_json::Value>()
            .await;
        assert_eq!("Ada Lovelace", response["name"]);
        assert_eq!(true, response["isGold"]);

        let fetched =
            context.inner.driver().get_customer(&ada.id().to_string()).await.unwrap();
        assert_eq!("Ada Lovelace", fetched.name().as_str());
        assert!(fetched.is_gold());
    }

    #[tokio::test]
    async fn test_not_found() {
        let context = TestContext::setup().await;
        let token = context.access_token().await;

        OneShotBuilder::new(context.into_app(), route(&CustomerId::random().to_string()))
            .with_bearer_auth(token.as_str())
            .send_json(request())
            .await
            .expect_status(http::StatusCode::NOT_FOUND)
            .expect_error("Entity not found")
            .await;
    }

    test_requires_auth!(TestContext::setup().await.into_app(), route("irrelevant"), request());

    test_payload_must_be_json!(TestContext::setup().await.into_app(), route("irrelevant"));
}
