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

//! API to add a new movie to the catalog.

use crate::driver::Driver;
use crate::model::{DailyRate, MovieTitle, Stock};
use crate::rest::{RestError, require_session};
use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::{Json, http};
use serde::{Deserialize, Serialize};

/// Message sent to the server to add or update a movie.
#[derive(Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct MovieRequest {
    /// Title of the movie.
    pub(crate) title: MovieTitle,

    /// Identifier of the genre the movie is filed under.
    pub(crate) genre_id: String,

    /// Number of copies available for rental.
    pub(crate) number_in_stock: u32,

    /// Fee charged per rental day, in cents.
    pub(crate) daily_rental_rate: u32,
}

/// POST handler for this API.
pub(crate) async fn handler(
    State(driver): State<Driver>,
    headers: HeaderMap,
    Json(request): Json<MovieRequest>,
) -> Result<(http::StatusCode, impl IntoResponse), RestError> {
    require_session(&driver, &headers).await?;

    let number_in_stock = Stock::new(request.number_in_stock)?;
    let daily_rental_rate = DailyRate::from_cents(request.daily_rental_rate)?;
    let movie = driver
        .create_movie(request.title, &request.genre_id, number_in_stock, daily_rental_rate)
        .await?;
    Ok((http::StatusCode::CREATED, Json(movie)))
}
