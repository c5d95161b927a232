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

//! Data types for users, credentials and sessions.

use crate::model::{ModelError, ModelResult, deserialize_via_new};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use time::OffsetDateTime;

/// Maximum length of a username as specified in the schema.
const USERS_MAX_USERNAME_LENGTH: usize = 32;

/// Maximum length of an email address as specified in the schema.
const USERS_MAX_EMAIL_LENGTH: usize = 64;

/// Length of access tokens, in characters.
///
/// This is not customizable because this size is replicated in the database schema and we cannot
/// simply change what it is at runtime.
const TOKEN_LENGTH: usize = 256;

/// Represents a correctly-formatted (but maybe non-existent) username.
///
/// Usernames are case-insensitive and, for simplicity reasons, we force them to be all in
/// lowercase.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct Username(String);

impl Username {
    /// Creates a new username from an untrusted string `s`, making sure it is valid.
    pub fn new<S: Into<String>>(s: S) -> ModelResult<Self> {
        let s = s.into();

        if s.is_empty() {
            return Err(ModelError("Username cannot be empty".to_owned()));
        }
        if s.len() > USERS_MAX_USERNAME_LENGTH {
            return Err(ModelError("Username is too long".to_owned()));
        }

        for ch in s.chars() {
            if !(ch.is_ascii_alphanumeric() || ".-_".find(ch).is_some()) {
                return Err(ModelError(format!(
                    "Unsupported character '{}' in username '{}'",
                    ch, s
                )));
            }
        }

        Ok(Self(s.to_lowercase()))
    }

    /// Returns a string view of the username.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

#[cfg(test)]
impl From<&'static str> for Username {
    /// Creates a new username from a hardcoded string, which must be valid.
    fn from(name: &'static str) -> Self {
        assert_eq!(name, name.to_lowercase(), "Hardcoded usernames must be lowercase");
        Username::new(name).expect("Hardcoded usernames must be valid")
    }
}

deserialize_via_new!(Username, UsernameVisitor);

/// Represents a correctly-formatted email address.
///
/// According to the standard, the local part of an email address may be case sensitive but the
/// domain part is case insensitive.  Given that we only persist email addresses for contact
/// purposes, this treats them as case sensitive overall.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(transparent)]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Creates a new email address from an untrusted string `s`, making sure it is valid.
    pub fn new<S: Into<String>>(s: S) -> ModelResult<Self> {
        let s = s.into();

        if s.trim().is_empty() {
            return Err(ModelError("Email address cannot be empty".to_owned()));
        }
        if s.len() > USERS_MAX_EMAIL_LENGTH {
            return Err(ModelError("Email address is too long".to_owned()));
        }

        // Email addresses can have many formats, and attempting to validate them is futile, so
        // we do just enough checking to make sure we pass data around correctly.
        if !s.contains('@') || s.contains(' ') {
            return Err(ModelError(format!("Email does not look like a valid address '{}'", s)));
        }

        Ok(Self(s))
    }

    /// Returns a string view of the email address.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

#[cfg(test)]
impl From<&'static str> for EmailAddress {
    /// Creates a new email address from a hardcoded string, which must be valid.
    fn from(raw_email: &'static str) -> Self {
        Self::new(raw_email).expect("Hardcoded email addresses must be valid")
    }
}

deserialize_via_new!(EmailAddress, EmailAddressVisitor);

/// An opaque type to hold a password, protecting it from leaking into logs.
#[derive(Deserialize, PartialEq, Serialize)]
#[serde(transparent)]
#[cfg_attr(test, derive(Clone))]
pub(crate) struct Password(String);

impl Password {
    /// Creates a new password from a literal string.
    pub(crate) fn new<S: Into<String>>(s: S) -> ModelResult<Self> {
        let s = s.into();
        if s.len() > 56 {
            return Err(ModelError("Password is too long".to_owned()));
        }
        Ok(Password(s))
    }

    /// Returns a string view of the password.
    #[cfg(test)]
    pub(crate) fn as_str(&self) -> &str {
        &self.0
    }

    /// Hashes the password after validating that it is sufficiently complex via the `validator`
    /// hook.  Consumes the password because there is no context in which keeping the password
    /// alive once we have generated its hash is correct.
    pub(crate) fn validate_and_hash(
        self,
        validator: fn(&str) -> Option<&'static str>,
    ) -> ModelResult<HashedPassword> {
        if let Some(error) = validator(&self.0) {
            return Err(ModelError(format!("Weak password: {}", error)));
        }
        let hashed =
            bcrypt::hash(self.0, 10).map_err(|e| ModelError(format!("Password error: {}", e)))?;
        Ok(HashedPassword::new(hashed))
    }

    /// Verifies if this password matches a given `hash`.
    pub(crate) fn verify(self, hash: &HashedPassword) -> ModelResult<bool> {
        bcrypt::verify(self.0, hash.as_str())
            .map_err(|e| ModelError(format!("Password error: {}", e)))
    }
}

#[cfg(test)]
impl From<&'static str> for Password {
    /// Creates a new password from a hardcoded string, which must be valid.
    fn from(s: &'static str) -> Self {
        Password::new(s).expect("Hardcoded passwords must be valid")
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("scrubbed password")
    }
}

/// An opaque type to hold a hashed password, protecting it from leaking into logs.
#[derive(Clone, PartialEq)]
pub(crate) struct HashedPassword(String);

impl HashedPassword {
    /// Creates a new hashed password from a literal string.
    pub(crate) fn new<S: Into<String>>(s: S) -> Self {
        HashedPassword(s.into())
    }

    /// Returns a string view of the hash.
    pub(crate) fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for HashedPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("scrubbed hash")
    }
}

/// An opaque type representing a user's access token.
///
/// Access tokens are user-readable character sequences of a fixed size.
#[derive(Clone, Eq, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub(crate) struct AccessToken(String);

impl AccessToken {
    /// Creates a new access token.
    pub(crate) fn new<S: Into<String>>(token: S) -> ModelResult<Self> {
        let token = token.into();
        if token.len() != TOKEN_LENGTH {
            return Err(ModelError("Invalid access token".to_owned()));
        }
        for ch in token.chars() {
            if !ch.is_ascii_alphanumeric() {
                return Err(ModelError("Invalid access token".to_owned()));
            }
        }
        Ok(Self(token))
    }

    /// Generates a new access token.
    pub(crate) fn generate() -> Self {
        let mut rng = rand::rng();
        let mut token = String::with_capacity(TOKEN_LENGTH);
        for _ in 0..TOKEN_LENGTH {
            let i = rng.random_range(0..(10 + 26 + 26));
            let ch = if i < 10 {
                (b'0' + i) as char
            } else if i < 10 + 26 {
                (b'a' + (i - 10)) as char
            } else {
                (b'A' + (i - 10 - 26)) as char
            };
            token.push(ch);
        }
        Self(token)
    }

    /// Returns the string representation of the token.
    pub(crate) fn as_str(&self) -> &str {
        &self.0
    }
}

deserialize_via_new!(AccessToken, AccessTokenVisitor);

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("scrubbed access token")
    }
}

/// Representation of a user's information.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct User {
    /// Name of the user.
    username: Username,

    /// Hashed password.  None if the user is not allowed to log in.
    password: Option<HashedPassword>,

    /// Email of the user.
    email: EmailAddress,

    /// Time of last login of the user.  None if the user has never logged in.
    last_login: Option<OffsetDateTime>,
}

impl User {
    /// Creates a new user with the given fields.
    pub(crate) fn new(username: Username, email: EmailAddress) -> Self {
        Self { username, password: None, email, last_login: None }
    }

    /// Modifies a user to record their most recent login time.
    pub(crate) fn with_last_login(mut self, last_login: OffsetDateTime) -> Self {
        self.last_login = Some(last_login);
        self
    }

    /// Modifies a user to add a password.
    pub(crate) fn with_password(mut self, password: HashedPassword) -> Self {
        self.password = Some(password);
        self
    }

    /// Gets the user's username.
    pub(crate) fn username(&self) -> &Username {
        &self.username
    }

    /// Gets the user's password as a hash.
    pub(crate) fn password(&self) -> Option<&HashedPassword> {
        self.password.as_ref()
    }

    /// Gets the user's email address.
    pub(crate) fn email(&self) -> &EmailAddress {
        &self.email
    }

    /// Gets the user's last login timestamp, or `None` if the user has never logged in yet.
    pub(crate) fn last_login(&self) -> Option<OffsetDateTime> {
        self.last_login
    }
}

/// Represents a user session.
#[cfg_attr(test, derive(Clone, Debug, PartialEq))]
pub(crate) struct Session {
    /// The access token for the session, which acts as its identifier.
    access_token: AccessToken,

    /// The username for this session.
    username: Username,

    /// Timestamp to represent when the session was initiated.
    login_time: OffsetDateTime,
}

impl Session {
    /// Creates a new session from its parts.
    pub(crate) fn new(
        access_token: AccessToken,
        username: Username,
        login_time: OffsetDateTime,
    ) -> Self {
        Self { access_token, username, login_time }
    }

    /// Returns the session's access token.
    pub(crate) fn access_token(&self) -> &AccessToken {
        &self.access_token
    }

    /// Returns the session's username.
    pub(crate) fn username(&self) -> &Username {
        &self.username
    }

    /// Returns the session's login time.
    pub(crate) fn login_time(&self) -> OffsetDateTime {
        self.login_time
    }

    /// Consumes the session and extracts its access token.
    pub(crate) fn take_access_token(self) -> AccessToken {
        self.access_token
    }
}
