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

//! API to start a session with Basic credentials.

use crate::driver::{Driver, DriverError};
use crate::model::AccessToken;
use crate::rest::{EmptyBody, REALM, RestError, get_basic_auth};
use axum::Json;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use serde::Serialize;

/// Message returned from the server to a successful login request.
#[derive(Serialize)]
#[cfg_attr(test, derive(serde::Deserialize))]
pub(crate) struct LoginResponse {
    /// Token that identifies the new session.
    pub(crate) access_token: AccessToken,
}

/// POST handler for this API.
pub(crate) async fn handler(
    State(driver): State<Driver>,
    headers: HeaderMap,
    _: EmptyBody,
) -> Result<impl IntoResponse, RestError> {
    let (username, password) = get_basic_auth(&headers, REALM)?;

    match driver.login(username, password).await {
        Ok(session) => {
            Ok(Json(LoginResponse { access_token: session.take_access_token() }))
        }
        Err(e @ DriverError::Unauthorized(_)) => Err(RestError::Unauthorized {
            scheme: "Basic",
            realm: REALM,
            message: e.to_string(),
        }),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Username;
    use crate::rest::testutils::*;
    use axum::http;

    fn route() -> (http::Method, String) {
        (http::Method::POST, "/api/auth/login".to_owned())
    }

    #[tokio::test]
    async fn test_ok() {
        let context = TestContext::setup().await;

        let username = Username::new("ruth").unwrap();
        context
            .inner
            .driver()
            .signup(
                username.clone(),
                crate::model::Password::from("sufficient4password"),
                crate::model::EmailAddress::new("ruth@example.com").unwrap(),
            )
            .await
            .unwrap();

        let response = OneShotBuilder::new(context.app(), route())
            .with_basic_auth("ruth", "sufficient4password")
            .send_empty()
            .await
            .expect_json::<LoginResponse>()
            .await;

        let user = context.inner.driver().whoami(response.access_token).await.unwrap();
        assert_eq!("ruth", user.username().as_str());
    }

    #[tokio::test]
    async fn test_unknown_user() {
        let context = TestContext::setup().await;

        OneShotBuilder::new(context.into_app(), route())
            .with_basic_auth("nosuchuser", "sufficient4password")
            .send_empty()
            .await
            .expect_status(http::StatusCode::UNAUTHORIZED)
            .expect_error("Unknown user")
            .await;
    }

    #[tokio::test]
    async fn test_invalid_password() {
        let context = TestContext::setup().await;
        let _token = context.access_token().await;

        OneShotBuilder::new(context.into_app(), route())
            .with_basic_auth("whoami", "wrong8password")
            .send_empty()
            .await
            .expect_status(http::StatusCode::UNAUTHORIZED)
            .expect_error("Invalid password")
            .await;
    }

    #[tokio::test]
    async fn test_no_credentials() {
        let context = TestContext::setup().await;

        OneShotBuilder::new(context.into_app(), route())
            .send_empty()
            .await
            .expect_status(http::StatusCode::UNAUTHORIZED)
            .expect_error("Missing Authorization header")
            .await;
    }

    test_payload_must_be_empty!(TestContext::setup().await.into_app(), route());
}
