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

//! API to return a rented movie and settle its fee.

use crate::driver::Driver;
use crate::rest::rentals_post::RentalRequest;
use crate::rest::{RestError, require_session};
use axum::Json;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::IntoResponse;

/// POST handler for this API.
pub(crate) async fn handler(
    State(driver): State<Driver>,
    headers: HeaderMap,
    Json(request): Json<RentalRequest>,
) -> Result<impl IntoResponse, RestError> {
    require_session(&driver, &headers).await?;

    let rental = driver.return_rental(&request.customer_id, &request.movie_id).await?;
    Ok(Json(rental))
}
