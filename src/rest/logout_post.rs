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

//! API to terminate the current session.

use crate::driver::{Driver, DriverError};
use crate::rest::{EmptyBody, REALM, RestError, get_bearer_auth};
use axum::extract::State;
use axum::http::HeaderMap;

/// POST handler for this API.
pub(crate) async fn handler(
    State(driver): State<Driver>,
    headers: HeaderMap,
    _: EmptyBody,
) -> Result<(), RestError> {
    let token = get_bearer_auth(&headers, REALM)?;

    match driver.logout(token).await {
        Ok(()) => Ok(()),
        Err(e @ DriverError::Unauthorized(_)) => Err(RestError::Unauthorized {
            scheme: "Bearer",
            realm: REALM,
            message: e.to_string(),
        }),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use crate::rest::testutils::*;
    use axum::http;

    fn route() -> (http::Method, String) {
        (http::Method::POST, "/api/auth/logout".to_owned())
    }

    #[tokio::test]
    async fn test_ok() {
        let context = TestContext::setup().await;
        let token = context.access_token().await;

        let app = context.app();
        OneShotBuilder::new(app.clone(), route())
            .with_bearer_auth(token.as_str())
            .send_empty()
            .await
            .expect_empty()
            .await;

        // The session is gone, so a second logout must be rejected.
        OneShotBuilder::new(app, route())
            .with_bearer_auth(token.as_str())
            .send_empty()
            .await
            .expect_status(http::StatusCode::UNAUTHORIZED)
            .expect_error("Invalid session")
            .await;
    }

    #[tokio::test]
    async fn test_invalid_token() {
        let context = TestContext::setup().await;

        OneShotBuilder::new(context.into_app(), route())
            .with_bearer_auth(&"0".repeat(256))
            .send_empty()
            .await
            .expect_status(http::StatusCode::UNAUTHORIZED)
            .expect_error("Invalid session")
            .await;
    }

    test_requires_auth!(TestContext::setup().await.into_app(), route());

    test_payload_must_be_empty!(TestContext::setup().await.into_app(), route());
}
