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

//! API to register a new customer.

use crate::driver::Driver;
use crate::model::{CustomerName, Phone};
use crate::rest::{RestError, require_session};
use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::{Json, http};
use serde::{Deserialize, Serialize};

/// Message sent to the server to register or update a customer.
#[derive(Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CustomerRequest {
    /// Full name of the customer.
    pub(crate) name: CustomerName,

    /// Contact phone number of the customer.
    pub(crate) phone: Phone,

    /// Whether the customer is enrolled in the loyalty program.
    pub(crate) is_gold: bool,
}

/// POST handler for this API.
pub(crate) async fn handler(
    State(driver): State<Driver>,
    headers: HeaderMap,
    Json(request): Json<CustomerRequest>,
) -> Result<(http::StatusCode, impl IntoResponse), RestError> {
    require_session(&driver, &headers).await?;

    let customer =
        driver.create_customer(request.name, request.phone, request.is_gold).await?;
    Ok((http::StatusCode::CREATED, Json(customer)))
}
