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

//! Utilities to help testing driver operations.

use crate::clocks::testutils::{SettableClock, utc_datetime};
use crate::db::{self, Db, Executor};
use crate::driver::{AuthOptions, Driver};
use crate::model::{
    AccessToken, Customer, CustomerId, CustomerName, DailyRate, EmailAddress, Genre, GenreId,
    GenreName, Movie, MovieId, MovieTitle, Password, Phone, Stock, Username,
};
use std::sync::Arc;

/// State of a running test.
pub(crate) struct TestContext {
    /// The database the driver is backed by.
    pub(crate) db: Arc<dyn Db + Send + Sync>,

    /// The clock the driver is backed by, pre-advanced to a fixed date.
    pub(crate) clock: Arc<SettableClock>,

    /// The driver under test.
    driver: Driver,
}

impl TestContext {
    /// Initializes the driver using an in-memory database and a settable clock.
    pub(crate) async fn setup() -> Self {
        Self::setup_with_opts(AuthOptions::default()).await
    }

    /// Initializes the driver using an in-memory database, a settable clock and the given
    /// session handling options.
    pub(crate) async fn setup_with_opts(opts: AuthOptions) -> Self {
        let db: Arc<dyn Db + Send + Sync> =
            Arc::from(crate::db::sqlite::testutils::setup().await);
        db::init_schema(&mut db.ex().await.unwrap()).await.unwrap();

        let clock = Arc::from(SettableClock::new(utc_datetime((2025, 6, 20), (10, 0, 0))));

        let driver = Driver::new(db.clone(), clock.clone(), opts);

        TestContext { db, clock, driver }
    }

    /// Returns a clone of the driver so that a one-shot operation can be issued.
    pub(crate) fn driver(&self) -> Driver {
        self.driver.clone()
    }

    /// Returns an executor for direct database manipulation.
    pub(crate) async fn ex(&self) -> Executor {
        self.db.ex().await.unwrap()
    }

    /// Syntactic sugar to create a genre directly in the database.
    pub(crate) async fn insert_genre(&self, name: &str) -> Genre {
        let genre = Genre::new(GenreId::random(), GenreName::new(name).unwrap());
        db::create_genre(&mut self.ex().await, &genre).await.unwrap();
        genre
    }

    /// Syntactic sugar to create a customer directly in the database.
    pub(crate) async fn insert_customer(&self, name: &str) -> Customer {
        let customer = Customer::new(
            CustomerId::random(),
            CustomerName::new(name).unwrap(),
            Phone::new("555-0100").unwrap(),
            false,
        );
        db::create_customer(&mut self.ex().await, &customer).await.unwrap();
        customer
    }

    /// Syntactic sugar to create a movie directly in the database with `stock` copies at
    /// `daily_rate_cents` per day.
    pub(crate) async fn insert_movie(
        &self,
        genre: &Genre,
        title: &str,
        stock: u32,
        daily_rate_cents: u32,
    ) -> Movie {
        let movie = Movie::new(
            MovieId::random(),
            MovieTitle::new(title).unwrap(),
            genre.clone(),
            Stock::new(stock).unwrap(),
            DailyRate::from_cents(daily_rate_cents).unwrap(),
        );
        db::create_movie(&mut self.ex().await, &movie).await.unwrap();
        movie
    }

    /// Syntactic sugar to create a user and log them in, returning the session's access token.
    pub(crate) async fn do_test_login(&self, username: Username) -> AccessToken {
        let password = Password::from("test1password");
        let email = EmailAddress::new(format!("{}@example.com", username.as_str())).unwrap();
        self.driver().signup(username.clone(), password.clone(), email).await.unwrap();

        let session = self.driver().login(username, password).await.unwrap();
        session.take_access_token()
    }
}
