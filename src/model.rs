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

//! High-level data types for the rental domain.
//!
//! All types in this module use the newtype pattern with validating constructors so that
//! invalid values cannot flow past the REST boundary.  There is no business logic in here.

use derive_getters::Getters;
use derive_more::Constructor;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

mod auth;
pub(crate) use auth::{AccessToken, HashedPassword, Password, Session, User};
pub use auth::{EmailAddress, Username};

/// An error in the validation of a model type.
#[derive(Debug, PartialEq, thiserror::Error)]
#[error("{0}")]
pub struct ModelError(pub String);

/// Result type for this module.
pub type ModelResult<T> = Result<T, ModelError>;

/// Maximum length of a genre name as specified in the schema.
const GENRES_MAX_NAME_LENGTH: usize = 50;

/// Maximum length of a customer name as specified in the schema.
const CUSTOMERS_MAX_NAME_LENGTH: usize = 100;

/// Valid length range of a customer phone number.
const CUSTOMERS_PHONE_LENGTH: std::ops::RangeInclusive<usize> = 5..=50;

/// Maximum length of a movie title as specified in the schema.
const MOVIES_MAX_TITLE_LENGTH: usize = 255;

/// Maximum number of copies of a single movie we are willing to track.
const MOVIES_MAX_STOCK: u32 = 100_000;

/// Maximum daily rental rate, in cents.
const MOVIES_MAX_DAILY_RATE: u32 = 1_000_000;

/// Generates a `Deserialize` implementation for a newtype whose `new` constructor validates
/// untrusted string input.
macro_rules! deserialize_via_new [
    ( $t:ty, $visitor:ident ) => {
        /// A deserialization visitor for the wrapped type.
        struct $visitor;

        impl serde::de::Visitor<'_> for $visitor {
            type Value = $t;

            fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
                formatter.write_str("a string")
            }

            fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                <$t>::new(v).map_err(|e| E::custom(e.to_string()))
            }

            fn visit_string<E>(self, v: String) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                <$t>::new(v).map_err(|e| E::custom(e.to_string()))
            }
        }

        impl<'de> Deserialize<'de> for $t {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                deserializer.deserialize_string($visitor)
            }
        }
    }
];

pub(crate) use deserialize_via_new;

/// Generates the newtype for an entity identifier backed by a UUID.
macro_rules! id_type [
    ( $t:ident, $what:expr ) => {
        /// Identifier of an entity, unique across its collection and never reused.
        #[derive(
            Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize,
        )]
        #[serde(transparent)]
        pub(crate) struct $t(Uuid);

        impl $t {
            /// Generates a fresh random identifier for a new entity.
            pub(crate) fn random() -> Self {
                Self(Uuid::new_v4())
            }

            /// Parses an identifier from an untrusted string `s`.
            pub(crate) fn parse(s: &str) -> ModelResult<Self> {
                if s.is_empty() {
                    return Err(ModelError(format!("{} id cannot be empty", $what)));
                }
                match Uuid::parse_str(s) {
                    Ok(id) => Ok(Self(id)),
                    Err(_) => Err(ModelError(format!("Invalid {} id '{}'", $what, s))),
                }
            }
        }

        impl std::fmt::Display for $t {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                self.0.fmt(f)
            }
        }
    }
];

id_type!(GenreId, "genre");
id_type!(CustomerId, "customer");
id_type!(MovieId, "movie");
id_type!(RentalId, "rental");

/// Represents a valid (but maybe non-existent) genre name.
#[derive(Clone, Debug, Eq, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub(crate) struct GenreName(String);

impl GenreName {
    /// Creates a new genre name from an untrusted string `s`, making sure it is valid.
    pub(crate) fn new<S: Into<String>>(s: S) -> ModelResult<Self> {
        let s = s.into();
        if s.is_empty() {
            return Err(ModelError("Genre name cannot be empty".to_owned()));
        }
        if s.len() > GENRES_MAX_NAME_LENGTH {
            return Err(ModelError("Genre name is too long".to_owned()));
        }
        if s.chars().any(char::is_control) {
            return Err(ModelError("Genre name contains control characters".to_owned()));
        }
        Ok(Self(s))
    }

    /// Returns a string view of the name.
    pub(crate) fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

deserialize_via_new!(GenreName, GenreNameVisitor);

/// Represents a valid customer name.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(transparent)]
pub(crate) struct CustomerName(String);

impl CustomerName {
    /// Creates a new customer name from an untrusted string `s`, making sure it is valid.
    pub(crate) fn new<S: Into<String>>(s: S) -> ModelResult<Self> {
        let s = s.into();
        if s.is_empty() {
            return Err(ModelError("Customer name cannot be empty".to_owned()));
        }
        if s.len() > CUSTOMERS_MAX_NAME_LENGTH {
            return Err(ModelError("Customer name is too long".to_owned()));
        }
        if s.chars().any(char::is_control) {
            return Err(ModelError("Customer name contains control characters".to_owned()));
        }
        Ok(Self(s))
    }

    /// Returns a string view of the name.
    pub(crate) fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

deserialize_via_new!(CustomerName, CustomerNameVisitor);

/// Represents a valid customer phone number.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(transparent)]
pub(crate) struct Phone(String);

impl Phone {
    /// Creates a new phone number from an untrusted string `s`, making sure it is valid.
    pub(crate) fn new<S: Into<String>>(s: S) -> ModelResult<Self> {
        let s = s.into();
        if !CUSTOMERS_PHONE_LENGTH.contains(&s.len()) {
            return Err(ModelError(format!(
                "Phone number must be {} to {} characters long",
                CUSTOMERS_PHONE_LENGTH.start(),
                CUSTOMERS_PHONE_LENGTH.end()
            )));
        }
        for ch in s.chars() {
            if !(ch.is_ascii_digit() || " +-()".find(ch).is_some()) {
                return Err(ModelError(format!("Unsupported character '{}' in phone number", ch)));
            }
        }
        Ok(Self(s))
    }

    /// Returns a string view of the phone number.
    pub(crate) fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

deserialize_via_new!(Phone, PhoneVisitor);

/// Represents a valid movie title.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(transparent)]
pub(crate) struct MovieTitle(String);

impl MovieTitle {
    /// Creates a new movie title from an untrusted string `s`, making sure it is valid.
    pub(crate) fn new<S: Into<String>>(s: S) -> ModelResult<Self> {
        let s = s.into();
        if s.is_empty() {
            return Err(ModelError("Movie title cannot be empty".to_owned()));
        }
        if s.len() > MOVIES_MAX_TITLE_LENGTH {
            return Err(ModelError("Movie title is too long".to_owned()));
        }
        if s.chars().any(char::is_control) {
            return Err(ModelError("Movie title contains control characters".to_owned()));
        }
        Ok(Self(s))
    }

    /// Returns a string view of the title.
    pub(crate) fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

deserialize_via_new!(MovieTitle, MovieTitleVisitor);

/// Number of copies of a movie available for rental.  We store this as a `u32` but guarantee
/// that it is usable in an `i64` context because the database backends need it.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(transparent)]
pub(crate) struct Stock(u32);

impl Stock {
    /// Creates a stock count from a `u32` with range validation.
    pub(crate) fn new(count: u32) -> ModelResult<Stock> {
        if count > MOVIES_MAX_STOCK {
            return Err(ModelError(format!("Stock count {} is too large", count)));
        }
        Ok(Stock(count))
    }

    /// Creates a stock count from an `i64` coming from the database.
    pub(crate) fn from_i64(count: i64) -> ModelResult<Stock> {
        match u32::try_from(count) {
            Ok(count) => Stock::new(count),
            Err(_) => Err(ModelError(format!("Stock count {} cannot be represented", count))),
        }
    }

    /// Returns the count as a `u32`.
    pub(crate) fn as_u32(&self) -> u32 {
        self.0
    }

    /// Returns the count as an `i64` for database storage.
    pub(crate) fn as_i64(&self) -> i64 {
        i64::from(self.0)
    }
}

/// Daily rental rate of a movie, in cents.  Integer cents keep fee arithmetic exact.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(transparent)]
pub(crate) struct DailyRate(u32);

impl DailyRate {
    /// Creates a daily rate from a cents quantity with range validation.
    pub(crate) fn from_cents(cents: u32) -> ModelResult<DailyRate> {
        if cents > MOVIES_MAX_DAILY_RATE {
            return Err(ModelError(format!("Daily rental rate {} is too large", cents)));
        }
        Ok(DailyRate(cents))
    }

    /// Creates a daily rate from an `i64` coming from the database.
    pub(crate) fn from_i64(cents: i64) -> ModelResult<DailyRate> {
        match u32::try_from(cents) {
            Ok(cents) => DailyRate::from_cents(cents),
            Err(_) => {
                Err(ModelError(format!("Daily rental rate {} cannot be represented", cents)))
            }
        }
    }

    /// Returns the rate as a cents quantity.
    pub(crate) fn as_cents(&self) -> u32 {
        self.0
    }

    /// Returns the rate as an `i64` for database storage.
    pub(crate) fn as_i64(&self) -> i64 {
        i64::from(self.0)
    }
}

/// Total fee charged for a completed rental, in cents.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(transparent)]
pub(crate) struct RentalFee(i64);

impl RentalFee {
    /// Creates a fee from a cents quantity, which cannot be negative.
    pub(crate) fn from_cents(cents: i64) -> ModelResult<RentalFee> {
        if cents < 0 {
            return Err(ModelError(format!("Rental fee {} cannot be negative", cents)));
        }
        Ok(RentalFee(cents))
    }

    /// Returns the fee as a cents quantity.
    pub(crate) fn as_cents(&self) -> i64 {
        self.0
    }
}

/// A movie genre.
#[derive(Clone, Constructor, Debug, Eq, Getters, PartialEq, Serialize)]
pub(crate) struct Genre {
    /// Identifier of the genre.
    id: GenreId,

    /// Human-readable name of the genre, unique across all genres.
    name: GenreName,
}

/// A customer of the rental business.
#[derive(Clone, Constructor, Debug, Eq, Getters, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Customer {
    /// Identifier of the customer.
    id: CustomerId,

    /// Full name of the customer.
    name: CustomerName,

    /// Contact phone number of the customer.
    phone: Phone,

    /// Whether the customer is enrolled in the loyalty program.
    is_gold: bool,
}

/// A movie in the inventory.
#[derive(Clone, Constructor, Debug, Eq, Getters, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Movie {
    /// Identifier of the movie.
    id: MovieId,

    /// Title of the movie.
    title: MovieTitle,

    /// Genre the movie is filed under.
    genre: Genre,

    /// Number of copies currently available for rental.
    number_in_stock: Stock,

    /// Fee charged per rental day, in cents.
    daily_rental_rate: DailyRate,
}

/// Denormalized copy of the customer fields captured when a rental is created.
///
/// This is a snapshot, not a live reference: later edits to the customer do not retroactively
/// alter historical rental records.
#[derive(Clone, Constructor, Debug, Eq, Getters, PartialEq, Serialize)]
pub(crate) struct CustomerSnapshot {
    /// Identifier of the customer at rental time.
    id: CustomerId,

    /// Name of the customer at rental time.
    name: CustomerName,

    /// Phone number of the customer at rental time.
    phone: Phone,
}

/// Denormalized copy of the movie fields captured when a rental is created.
#[derive(Clone, Constructor, Debug, Eq, Getters, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct MovieSnapshot {
    /// Identifier of the movie at rental time.
    id: MovieId,

    /// Title of the movie at rental time.
    title: MovieTitle,

    /// Daily rental rate the fee is computed from, frozen at rental time.
    daily_rental_rate: DailyRate,
}

/// A record of a customer borrowing a movie.
///
/// A rental transitions exactly once from open to returned and is never otherwise mutated:
/// `returned_date` and `rental_fee` are set together, exactly once, at return time.
#[derive(Clone, Constructor, Debug, Eq, Getters, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Rental {
    /// Identifier of the rental.
    id: RentalId,

    /// Snapshot of the customer that checked out the movie.
    customer: CustomerSnapshot,

    /// Snapshot of the movie that was checked out.
    movie: MovieSnapshot,

    /// Time at which the movie was checked out.
    #[serde(with = "time::serde::rfc3339")]
    rental_date: OffsetDateTime,

    /// Time at which the movie was returned, if it has been.
    #[serde(with = "time::serde::rfc3339::option")]
    returned_date: Option<OffsetDateTime>,

    /// Fee charged for the rental, computed at return time.
    rental_fee: Option<RentalFee>,
}

impl Rental {
    /// Creates a record for a rental that is checked out right now.
    pub(crate) fn checked_out(
        customer: CustomerSnapshot,
        movie: MovieSnapshot,
        rental_date: OffsetDateTime,
    ) -> Self {
        Self::new(RentalId::random(), customer, movie, rental_date, None, None)
    }

    /// Whether the rental has completed its lifecycle.  Derived from `returned_date`.
    pub(crate) fn returned(&self) -> bool {
        self.returned_date.is_some()
    }
}
