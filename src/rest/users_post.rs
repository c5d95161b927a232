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

//! API to create a new user account.

use crate::driver::Driver;
use crate::model::{EmailAddress, Password, User, Username};
use crate::rest::RestError;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::{Json, http};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Message sent to the server to create a user account.
#[derive(Deserialize, Serialize)]
pub(crate) struct SignupRequest {
    /// Name for the new user.
    pub(crate) username: Username,

    /// Cleartext password for the new user.
    pub(crate) password: Password,

    /// Email address of the new user.
    pub(crate) email: EmailAddress,
}

/// Public view of a user account, without credentials.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct UserResponse {
    /// Name of the user.
    username: Username,

    /// Email address of the user.
    email: EmailAddress,

    /// Timestamp of the last successful login, if any.
    #[serde(with = "time::serde::rfc3339::option")]
    last_login: Option<OffsetDateTime>,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            username: user.username().clone(),
            email: user.email().clone(),
            last_login: user.last_login(),
        }
    }
}

/// POST handler for this API.
pub(crate) async fn handler(
    State(driver): State<Driver>,
    Json(request): Json<SignupRequest>,
) -> Result<(http::StatusCode, impl IntoResponse), RestError> {
    let user = driver.signup(request.username, request.password, request.email).await?;
    Ok((http::StatusCode::CREATED, Json(UserResponse::from(&user))))
}
