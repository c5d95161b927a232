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

//! Extends the driver with the session management operations.

use crate::db::{self, DbError};
use crate::driver::{Driver, DriverError, DriverResult};
use crate::model::{AccessToken, Password, Session, Username};

impl Driver {
    /// Logs a user in by validating `password` against the stored hash and returns the newly
    /// created session.
    pub(crate) async fn login(
        self,
        username: Username,
        password: Password,
    ) -> DriverResult<Session> {
        let now = self.clock.now_utc();

        let mut tx = self.db.begin().await?;

        let user = match db::get_user_by_username(tx.ex(), &username).await {
            Ok(user) => user,
            Err(DbError::NotFound) => {
                return Err(DriverError::Unauthorized("Unknown user".to_owned()));
            }
            Err(e) => return Err(e.into()),
        };
        let hash = match user.password() {
            Some(hash) => hash,
            None => return Err(DriverError::Unauthorized("Login not allowed".to_owned())),
        };
        if !password.verify(hash)? {
            return Err(DriverError::Unauthorized("Invalid password".to_owned()));
        }

        let session = Session::new(AccessToken::generate(), username.clone(), now);
        db::put_session(tx.ex(), &session).await?;
        db::update_user(tx.ex(), &username, now).await?;

        tx.commit().await?;

        Ok(session)
    }

    /// Logs the session identified by `token` out.
    pub(crate) async fn logout(self, token: AccessToken) -> DriverResult<()> {
        let now = self.clock.now_utc();

        let mut tx = self.db.begin().await?;
        match db::delete_session(tx.ex(), &token, now).await {
            Ok(()) => (),
            Err(DbError::NotFound) => {
                return Err(DriverError::Unauthorized("Invalid session".to_owned()));
            }
            Err(e) => return Err(e.into()),
        }
        tx.commit().await?;

        let mut cache = self.sessions_cache.lock().await;
        cache.remove(&token);

        Ok(())
    }
}
