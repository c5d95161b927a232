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

//! Business logic for the rental store.
//!
//! The operations exposed by the driver are all "one shot": they start and commit a transaction,
//! so it's incorrect for the caller to use two separate calls.  For this reason, these operations
//! consume the driver in an attempt to minimize the possibility of executing two operations.

use crate::clocks::Clock;
use crate::db::{Db, DbError, TxExecutor};
use crate::env::get_optional_var;
use crate::model::{AccessToken, ModelError, User};
use derivative::Derivative;
use futures::lock::Mutex;
use log::warn;
use lru_time_cache::LruCache;
use std::sync::Arc;
use std::time::Duration;
use time::OffsetDateTime;

mod customer;
mod genre;
mod movie;
mod rental;
mod returns;
mod session;
#[cfg(test)]
pub(crate) mod testutils;
mod user;

/// Default number of sessions to keep cached in memory.
const DEFAULT_SESSIONS_CACHE_CAPACITY: usize = 10 * 1024;

/// Default amount of time to keep cached sessions in memory.
const DEFAULT_SESSIONS_CACHE_TTL_SECONDS: u64 = 60;

/// Default value for the `SESSION_MAX_AGE` setting when not specified.
const DEFAULT_SESSION_MAX_AGE_SECONDS: u64 = 24 * 60 * 60;

/// Default value for the `SESSION_MAX_SKEW` setting when not specified.
const DEFAULT_SESSION_MAX_SKEW_SECONDS: u64 = 60 * 60;

/// Business logic errors.  These errors encompass backend and logical errors.
///
/// These errors are cloneable so that operation results can be held in the sessions cache and
/// handed out to multiple callers.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum DriverError {
    /// Indicates that a request to create an entry failed because it already exists.
    #[error("{0}")]
    AlreadyExists(String),

    /// Indicates that a rental was already returned and cannot be returned again.
    #[error("{0}")]
    AlreadyProcessed(String),

    /// Catch-all error type for unexpected database errors.
    #[error("{0}")]
    BackendError(String),

    /// Indicates that a movie has no copies left to rent.
    #[error("{0}")]
    InsufficientStock(String),

    /// Indicates an error in the input data.
    #[error("{0}")]
    InvalidInput(String),

    /// Indicates that a requested entry does not exist.
    #[error("{0}")]
    NotFound(String),

    /// Indicates that the caller is not authenticated or authorized to perform the operation.
    #[error("{0}")]
    Unauthorized(String),

    /// Indicates that the service is not available (maybe because the database is overloaded).
    #[error("{0}")]
    Unavailable(String),
}

impl From<DbError> for DriverError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::AlreadyExists => DriverError::AlreadyExists(e.to_string()),
            DbError::BackendError(_) => DriverError::BackendError(e.to_string()),
            DbError::DataIntegrityError(_) => DriverError::BackendError(e.to_string()),
            DbError::NotFound => DriverError::NotFound(e.to_string()),
            DbError::Unavailable => DriverError::Unavailable(e.to_string()),
        }
    }
}

impl From<ModelError> for DriverError {
    fn from(e: ModelError) -> Self {
        DriverError::InvalidInput(e.to_string())
    }
}

/// Result type for this module.
pub type DriverResult<T> = Result<T, DriverError>;

/// Configuration options for session handling.
#[derive(Clone, Debug)]
#[cfg_attr(test, derive(PartialEq))]
pub struct AuthOptions {
    /// The number of sessions to keep cached in memory.
    pub sessions_cache_capacity: usize,

    /// The amount of time to keep cached sessions in memory.
    pub sessions_cache_ttl: Duration,

    /// The amount of time we consider sessions valid for.
    pub session_max_age: Duration,

    /// The amount of time we tolerate in clock skew when validating sessions.  We should never
    /// see this, except if we end up serving requests from different machines and their clocks
    /// aren't properly synchronized.
    pub session_max_skew: Duration,
}

impl Default for AuthOptions {
    fn default() -> Self {
        Self {
            sessions_cache_capacity: DEFAULT_SESSIONS_CACHE_CAPACITY,
            sessions_cache_ttl: Duration::from_secs(DEFAULT_SESSIONS_CACHE_TTL_SECONDS),
            session_max_age: Duration::from_secs(DEFAULT_SESSION_MAX_AGE_SECONDS),
            session_max_skew: Duration::from_secs(DEFAULT_SESSION_MAX_SKEW_SECONDS),
        }
    }
}

impl AuthOptions {
    /// Creates a new set of options from environment variables.
    pub fn from_env(prefix: &str) -> Result<Self, String> {
        Ok(Self {
            sessions_cache_capacity: get_optional_var::<usize>(prefix, "SESSIONS_CACHE_CAPACITY")?
                .unwrap_or(DEFAULT_SESSIONS_CACHE_CAPACITY),
            sessions_cache_ttl: get_optional_var::<Duration>(prefix, "SESSIONS_CACHE_TTL")?
                .unwrap_or_else(|| Duration::from_secs(DEFAULT_SESSIONS_CACHE_TTL_SECONDS)),
            session_max_age: get_optional_var::<Duration>(prefix, "SESSION_MAX_AGE")?
                .unwrap_or_else(|| Duration::from_secs(DEFAULT_SESSION_MAX_AGE_SECONDS)),
            session_max_skew: get_optional_var::<Duration>(prefix, "SESSION_MAX_SKEW")?
                .unwrap_or_else(|| Duration::from_secs(DEFAULT_SESSION_MAX_SKEW_SECONDS)),
        })
    }
}

/// Business logic for the rental store.
#[derive(Derivative)]
#[derivative(Clone(bound = ""))]
pub struct Driver {
    /// The database that the driver uses for persistence.
    db: Arc<dyn Db + Send + Sync>,

    /// Clock instance to obtain the current time.
    clock: Arc<dyn Clock + Send + Sync>,

    /// Options for session handling.
    opts: AuthOptions,

    /// Cache of sessions.
    sessions_cache: Arc<Mutex<LruCache<AccessToken, DriverResult<Arc<User>>>>>,
}

impl Driver {
    /// Creates a new driver backed by the given dependencies.
    pub fn new(
        db: Arc<dyn Db + Send + Sync>,
        clock: Arc<dyn Clock + Send + Sync>,
        opts: AuthOptions,
    ) -> Self {
        let sessions_cache = LruCache::with_expiry_duration_and_capacity(
            opts.sessions_cache_ttl,
            opts.sessions_cache_capacity,
        );
        let sessions_cache = Arc::from(Mutex::from(sessions_cache));

        Self { db, clock, opts, sessions_cache }
    }

    /// Obtains the current time from the driver.
    #[cfg(test)]
    pub(crate) fn now_utc(&self) -> OffsetDateTime {
        self.clock.now_utc()
    }

    /// Validates the session in `token` and returns the user that owns the session.
    ///
    /// This is an internal helper for `get_session` that does not perform any caching.
    async fn get_session_uncached(
        &self,
        tx: &mut TxExecutor,
        now: OffsetDateTime,
        token: AccessToken,
    ) -> DriverResult<User> {
        let session = match crate::db::get_session(tx.ex(), &token).await {
            Ok(session) => session,
            Err(DbError::NotFound) => {
                return Err(DriverError::Unauthorized("Invalid session".to_owned()));
            }
            Err(e) => return Err(e.into()),
        };

        let whoami = crate::db::get_user_by_username(tx.ex(), session.username()).await?;

        let login_time = session.login_time();
        let expired = login_time < (now - self.opts.session_max_age);
        let skew = login_time > (now + self.opts.session_max_skew);
        if expired || skew {
            return Err(DriverError::Unauthorized(
                "Session expired; please log in again".to_owned(),
            ));
        }

        Ok(whoami)
    }

    /// Validates the session in `token` and returns the user that owns the session.
    ///
    /// Both OK and error results come from an internal cache, which should have been configured
    /// to evict entries relatively quickly.  In general, the cache should only hold entries for
    /// the predicted length of a frontend interaction.
    pub(crate) async fn get_session(
        &self,
        tx: &mut TxExecutor,
        now: OffsetDateTime,
        token: AccessToken,
    ) -> DriverResult<Arc<User>> {
        {
            let mut cache = self.sessions_cache.lock().await;
            if let Some(result) = cache.get(&token) {
                return result.clone();
            }
        }

        let result = self.get_session_uncached(tx, now, token.clone()).await.map(Arc::from);

        let mut cache = self.sessions_cache.lock().await;
        if let Some(old_result) = cache.insert(token, result.clone()) {
            if old_result != result {
                warn!(
                    "Cache insertion race detected with inconsistent values: {:?} != {:?}",
                    old_result, result
                );
            }
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    pub fn test_auth_options_from_env_all_missing() {
        temp_env::with_vars_unset(
            [
                "PREFIX_SESSIONS_CACHE_CAPACITY",
                "PREFIX_SESSIONS_CACHE_TTL",
                "PREFIX_SESSION_MAX_AGE",
                "PREFIX_SESSION_MAX_SKEW",
            ],
            || {
                let opts = AuthOptions::from_env("PREFIX").unwrap();
                assert_eq!(AuthOptions::default(), opts);
            },
        );
    }

    #[test]
    pub fn test_auth_options_from_env_all_present() {
        temp_env::with_vars(
            [
                ("PREFIX_SESSIONS_CACHE_CAPACITY", Some("512")),
                ("PREFIX_SESSIONS_CACHE_TTL", Some("10s")),
                ("PREFIX_SESSION_MAX_AGE", Some("12h")),
                ("PREFIX_SESSION_MAX_SKEW", Some("5m")),
            ],
            || {
                let opts = AuthOptions::from_env("PREFIX").unwrap();
                assert_eq!(
                    AuthOptions {
                        sessions_cache_capacity: 512,
                        sessions_cache_ttl: Duration::from_secs(10),
                        session_max_age: Duration::from_secs(12 * 60 * 60),
                        session_max_skew: Duration::from_secs(5 * 60),
                    },
                    opts
                );
            },
        );
    }

    #[test]
    pub fn test_auth_options_from_env_bad_value() {
        temp_env::with_vars([("PREFIX_SESSION_MAX_AGE", Some("not-a-duration"))], || {
            AuthOptions::from_env("PREFIX").unwrap_err();
        });
    }
}
