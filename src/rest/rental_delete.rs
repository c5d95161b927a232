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

//! API to delete an existing rental record.

use crate::driver::Driver;
use crate::rest::{EmptyBody, RestError, require_session};
use axum::extract::{Path, State};
use axum::http::HeaderMap;

/// DELETE handler for this API.
pub(crate) async fn handler(
    State(driver): State<Driver>,
    Path(id): Path<String>,
    headers: HeaderMap,
    _: EmptyBody,
) -> Result<(), RestError> {
    require_session(&driver, &headers).await?;

    driver.delete_rental(&id).await?;
    Ok(())
}
