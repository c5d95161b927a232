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

//! Database queries for users and their sessions.

use crate::db::sqlite::{build_timestamp, unpack_timestamp};
use crate::db::{DbError, DbResult, Executor, postgres, sqlite};
use crate::model::{AccessToken, EmailAddress, HashedPassword, Session, User, Username};
use sqlx::Row;
use sqlx::postgres::PgRow;
use sqlx::sqlite::SqliteRow;
use time::OffsetDateTime;

impl TryFrom<PgRow> for User {
    type Error = DbError;

    fn try_from(row: PgRow) -> DbResult<Self> {
        let username: String = row.try_get("username").map_err(postgres::map_sqlx_error)?;
        let password: Option<String> = row.try_get("password").map_err(postgres::map_sqlx_error)?;
        let email: String = row.try_get("email").map_err(postgres::map_sqlx_error)?;
        let last_login: Option<OffsetDateTime> =
            row.try_get("last_login").map_err(postgres::map_sqlx_error)?;

        let mut user = User::new(Username::new(username)?, EmailAddress::new(email)?);
        if let Some(password) = password {
            user = user.with_password(HashedPassword::new(password));
        }
        if let Some(last_login) = last_login {
            user = user.with_last_login(last_login);
        }
        Ok(user)
    }
}

impl TryFrom<SqliteRow> for User {
    type Error = DbError;

    fn try_from(row: SqliteRow) -> DbResult<Self> {
        let username: String = row.try_get("username").map_err(sqlite::map_sqlx_error)?;
        let password: Option<String> = row.try_get("password").map_err(sqlite::map_sqlx_error)?;
        let email: String = row.try_get("email").map_err(sqlite::map_sqlx_error)?;
        let last_login_secs: Option<i64> =
            row.try_get("last_login_secs").map_err(sqlite::map_sqlx_error)?;
        let last_login_nsecs: Option<i64> =
            row.try_get("last_login_nsecs").map_err(sqlite::map_sqlx_error)?;

        let mut user = User::new(Username::new(username)?, EmailAddress::new(email)?);
        if let Some(password) = password {
            user = user.with_password(HashedPassword::new(password));
        }
        match (last_login_secs, last_login_nsecs) {
            (Some(secs), Some(nsecs)) => user = user.with_last_login(build_timestamp(secs, nsecs)?),
            (None, None) => (),
            (_, _) => {
                return Err(DbError::DataIntegrityError(
                    "Inconsistent values for last_login".to_owned(),
                ));
            }
        }
        Ok(user)
    }
}

impl TryFrom<PgRow> for Session {
    type Error = DbError;

    fn try_from(row: PgRow) -> DbResult<Self> {
        let access_token: String = row.try_get("access_token").map_err(postgres::map_sqlx_error)?;
        let username: String = row.try_get("username").map_err(postgres::map_sqlx_error)?;
        let login_time: OffsetDateTime =
            row.try_get("login_time").map_err(postgres::map_sqlx_error)?;

        let access_token = AccessToken::new(access_token)?;
        let username = Username::new(username)?;

        Ok(Session::new(access_token, username, login_time))
    }
}

impl TryFrom<SqliteRow> for Session {
    type Error = DbError;

    fn try_from(row: SqliteRow) -> DbResult<Self> {
        let access_token: String = row.try_get("access_token").map_err(sqlite::map_sqlx_error)?;
        let username: String = row.try_get("username").map_err(sqlite::map_sqlx_error)?;
        let login_time_secs: i64 =
            row.try_get("login_time_secs").map_err(sqlite::map_sqlx_error)?;
        let login_time_nsecs: i64 =
            row.try_get("login_time_nsecs").map_err(sqlite::map_sqlx_error)?;

        let access_token = AccessToken::new(access_token)?;
        let username = Username::new(username)?;
        let login_time = build_timestamp(login_time_secs, login_time_nsecs)?;

        Ok(Session::new(access_token, username, login_time))
    }
}

/// Creates a new user named `username`, with a `password` in hashed form and an `email` address.
/// The user is created as not having logged in yet.
pub(crate) async fn create_user(
    ex: &mut Executor,
    username: Username,
    password: Option<HashedPassword>,
    email: EmailAddress,
) -> DbResult<User> {
    let rows_affected = match ex {
        Executor::Postgres(ex) => {
            let query_str = "INSERT INTO users (username, password, email) VALUES ($1, $2, $3)";
            let done = sqlx::query(query_str)
                .bind(username.as_str())
                .bind(password.as_ref().map(|x| x.as_str()))
                .bind(email.as_str())
                .execute(ex.conn())
                .await
                .map_err(postgres::map_sqlx_error)?;
            done.rows_affected()
        }

        Executor::Sqlite(ex) => {
            let query_str = "INSERT INTO users (username, password, email) VALUES (?, ?, ?)";
            let done = sqlx::query(query_str)
                .bind(username.as_str())
                .bind(password.as_ref().map(|x| x.as_str()))
                .bind(email.as_str())
                .execute(ex.conn())
                .await
                .map_err(sqlite::map_sqlx_error)?;
            done.rows_affected()
        }
    };

    if rows_affected != 1 {
        return Err(DbError::BackendError("Insertion affected more than one row".to_owned()));
    }
    let mut user = User::new(username, email);
    if let Some(password) = password {
        user = user.with_password(password);
    }
    Ok(user)
}

/// Gets information about an existing user named `username`.
pub(crate) async fn get_user_by_username(ex: &mut Executor, username: &Username) -> DbResult<User> {
    match ex {
        Executor::Postgres(ex) => {
            let query_str = "SELECT * FROM users WHERE username = $1";
            let raw_user = sqlx::query(query_str)
                .bind(username.as_str())
                .fetch_one(ex.conn())
                .await
                .map_err(postgres::map_sqlx_error)?;
            User::try_from(raw_user)
        }

        Executor::Sqlite(ex) => {
            let query_str = "SELECT * FROM users WHERE username = ?";
            let raw_user = sqlx::query(query_str)
                .bind(username.as_str())
                .fetch_one(ex.conn())
                .await
                .map_err(sqlite::map_sqlx_error)?;
            User::try_from(raw_user)
        }
    }
}

/// Updates an existing user `username` to have new `last_login` details.
pub(crate) async fn update_user(
    ex: &mut Executor,
    username: &Username,
    last_login: OffsetDateTime,
) -> DbResult<()> {
    let rows_affected = match ex {
        Executor::Postgres(ex) => {
            let query_str = "UPDATE users SET last_login = $1 WHERE username = $2";
            let done = sqlx::query(query_str)
                .bind(last_login)
                .bind(username.as_str())
                .execute(ex.conn())
                .await
                .map_err(postgres::map_sqlx_error)?;
            done.rows_affected()
        }

        Executor::Sqlite(ex) => {
            let (last_login_secs, last_login_nsecs) = unpack_timestamp(last_login);

            let query_str = "
                UPDATE users SET last_login_secs = ?, last_login_nsecs = ?
                WHERE username = ?";
            let done = sqlx::query(query_str)
                .bind(last_login_secs)
                .bind(last_login_nsecs)
                .bind(username.as_str())
                .execute(ex.conn())
                .await
                .map_err(sqlite::map_sqlx_error)?;
            done.rows_affected()
        }
    };

    match rows_affected {
        0 => Err(DbError::NotFound),
        1 => Ok(()),
        _ => Err(DbError::BackendError("Update affected more than one row".to_owned())),
    }
}

/// Records a new session for a logged-in user.
pub(crate) async fn put_session(ex: &mut Executor, session: &Session) -> DbResult<()> {
    let rows_affected = match ex {
        Executor::Postgres(ex) => {
            let query_str = "
                INSERT INTO sessions (access_token, username, login_time)
                VALUES ($1, $2, $3)";
            let done = sqlx::query(query_str)
                .bind(session.access_token().as_str())
                .bind(session.username().as_str())
                .bind(session.login_time())
                .execute(ex.conn())
                .await
                .map_err(postgres::map_sqlx_error)?;
            done.rows_affected()
        }

        Executor::Sqlite(ex) => {
            let (login_time_secs, login_time_nsecs) = unpack_timestamp(session.login_time());

            let query_str = "
                INSERT INTO sessions (access_token, username, login_time_secs, login_time_nsecs)
                VALUES (?, ?, ?, ?)";
            let done = sqlx::query(query_str)
                .bind(session.access_token().as_str())
                .bind(session.username().as_str())
                .bind(login_time_secs)
                .bind(login_time_nsecs)
                .execute(ex.conn())
                .await
                .map_err(sqlite::map_sqlx_error)?;
            done.rows_affected()
        }
    };

    if rows_affected != 1 {
        return Err(DbError::BackendError("Insertion affected more than one row".to_owned()));
    }
    Ok(())
}

/// Gets an active session from its access token.  Sessions marked as logged out are ignored.
pub(crate) async fn get_session(
    ex: &mut Executor,
    access_token: &AccessToken,
) -> DbResult<Session> {
    match ex {
        Executor::Postgres(ex) => {
            let query_str = "
                SELECT access_token, username, login_time FROM sessions
                WHERE access_token = $1 AND logout_time IS NULL";
            let raw_session = sqlx::query(query_str)
                .bind(access_token.as_str())
                .fetch_one(ex.conn())
                .await
                .map_err(postgres::map_sqlx_error)?;
            Session::try_from(raw_session)
        }

        Executor::Sqlite(ex) => {
            let query_str = "
                SELECT access_token, username, login_time_secs, login_time_nsecs FROM sessions
                WHERE access_token = ? AND logout_time_secs IS NULL";
            let raw_session = sqlx::query(query_str)
                .bind(access_token.as_str())
                .fetch_one(ex.conn())
                .await
                .map_err(sqlite::map_sqlx_error)?;
            Session::try_from(raw_session)
        }
    }
}

/// Marks the session identified by `access_token` as logged out at time `now`.  The session
/// record is kept around for auditing purposes.
pub(crate) async fn delete_session(
    ex: &mut Executor,
    access_token: &AccessToken,
    now: OffsetDateTime,
) -> DbResult<()> {
    let rows_affected = match ex {
        Executor::Postgres(ex) => {
            let query_str = "
                UPDATE sessions SET logout_time = $1
                WHERE access_token = $2 AND logout_time IS NULL";
            let done = sqlx::query(query_str)
                .bind(now)
                .bind(access_token.as_str())
                .execute(ex.conn())
                .await
                .map_err(postgres::map_sqlx_error)?;
            done.rows_affected()
        }

        Executor::Sqlite(ex) => {
            let (logout_time_secs, logout_time_nsecs) = unpack_timestamp(now);

            let query_str = "
                UPDATE sessions SET logout_time_secs = ?, logout_time_nsecs = ?
                WHERE access_token = ? AND logout_time_secs IS NULL";
            let done = sqlx::query(query_str)
                .bind(logout_time_secs)
                .bind(logout_time_nsecs)
                .bind(access_token.as_str())
                .execute(ex.conn())
                .await
                .map_err(sqlite::map_sqlx_error)?;
            done.rows_affected()
        }
    };

    match rows_affected {
        0 => Err(DbError::NotFound),
        1 => Ok(()),
        _ => Err(DbError::BackendError("Update affected more than one row".to_owned())),
    }
}
