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

//! Extends the driver with the user account operations.

use crate::db;
use crate::driver::{Driver, DriverResult};
use crate::model::{AccessToken, EmailAddress, Password, User, Username};
use std::sync::Arc;

/// Checks that a plaintext password is complex enough to be accepted at signup.
fn validate_password_strength(password: &str) -> Option<&'static str> {
    if password.len() < 8 {
        return Some("Must have at least 8 characters");
    }
    if !password.chars().any(|c| c.is_ascii_alphabetic()) {
        return Some("Must contain a letter");
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Some("Must contain a digit");
    }
    None
}

impl Driver {
    /// Registers a new user with a password-based login.
    pub(crate) async fn signup(
        self,
        username: Username,
        password: Password,
        email: EmailAddress,
    ) -> DriverResult<User> {
        let hashed = password.validate_and_hash(validate_password_strength)?;

        let mut tx = self.db.begin().await?;
        let user = db::create_user(tx.ex(), username, Some(hashed), email).await?;
        tx.commit().await?;

        Ok(user)
    }

    /// Returns the user that owns the session identified by `token`.
    pub(crate) async fn whoami(self, token: AccessToken) -> DriverResult<Arc<User>> {
        let mut tx = self.db.begin().await?;
        let user = self.get_session(&mut tx, self.clock.now_utc(), token).await?;
        tx.commit().await?;

        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::DriverError;
    use crate::driver::testutils::*;

    #[test]
    fn test_validate_password_strength() {
        assert_eq!(None, validate_password_strength("longenough1"));
        assert_eq!(
            Some("Must have at least 8 characters"),
            validate_password_strength("short1")
        );
        assert_eq!(Some("Must contain a letter"), validate_password_strength("12345678"));
        assert_eq!(Some("Must contain a digit"), validate_password_strength("abcdefgh"));
    }

    #[tokio::test]
    async fn test_signup_ok() {
        let context = TestContext::setup().await;

        let username = Username::new("some-user").unwrap();
        let email = EmailAddress::new("some-user@example.com").unwrap();
        let user = context
            .driver()
            .signup(username.clone(), Password::from("sufficiently1complex"), email.clone())
            .await
            .unwrap();
        assert_eq!(&username, user.username());
        assert_eq!(&email, user.email());
        assert!(user.last_login().is_none());
    }

    #[tokio::test]
    async fn test_signup_weak_password() {
        let context = TestContext::setup().await;

        match context
            .driver()
            .signup(
                Username::new("some-user").unwrap(),
                Password::from("short1"),
                EmailAddress::new("some-user@example.com").unwrap(),
            )
            .await
        {
            Err(DriverError::InvalidInput(e)) => assert!(e.contains("Weak password")),
            e => panic!("{:?}", e),
        }
    }

    #[tokio::test]
    async fn test_signup_duplicate_username() {
        let context = TestContext::setup().await;

        let username = Username::new("some-user").unwrap();
        context
            .driver()
            .signup(
                username.clone(),
                Password::from("sufficiently1complex"),
                EmailAddress::new("first@example.com").unwrap(),
            )
            .await
            .unwrap();
        match context
            .driver()
            .signup(
                username,
                Password::from("sufficiently1complex"),
                EmailAddress::new("second@example.com").unwrap(),
            )
            .await
        {
            Err(DriverError::AlreadyExists(_)) => (),
            e => panic!("{:?}", e),
        }
    }

    #[tokio::test]
    async fn test_whoami_ok() {
        let context = TestContext::setup().await;

        let username = Username::new("some-user").unwrap();
        let token = context.do_test_login(username.clone()).await;

        let whoami = context.driver().whoami(token).await.unwrap();
        assert_eq!(&username, whoami.username());
        assert_eq!(Some(context.driver().now_utc()), whoami.last_login());
    }

    #[tokio::test]
    async fn test_whoami_invalid_token() {
        let context = TestContext::setup().await;

        match context.driver().whoami(AccessToken::generate()).await {
            Err(DriverError::Unauthorized(e)) => assert_eq!("Invalid session", e),
            e => panic!("{:?}", e),
        }
    }
}
