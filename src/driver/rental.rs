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

//! Extends the driver with the rental check-out operations.

use crate::db;
use crate::driver::{Driver, DriverError, DriverResult};
use crate::model::{CustomerId, CustomerSnapshot, MovieId, MovieSnapshot, Rental, RentalId};

impl Driver {
    /// Lists all rentals, most recent first.
    pub(crate) async fn list_rentals(self) -> DriverResult<Vec<Rental>> {
        let mut ex = self.db.ex().await?;
        Ok(db::list_rentals(&mut ex).await?)
    }

    /// Gets the rental identified by the raw `id`.
    pub(crate) async fn get_rental(self, id: &str) -> DriverResult<Rental> {
        let id = RentalId::parse(id)?;
        let mut ex = self.db.ex().await?;
        Ok(db::get_rental(&mut ex, id).await?)
    }

    /// Checks out one copy of the movie identified by the raw `movie_id` to the customer
    /// identified by the raw `customer_id`.
    ///
    /// The stock decrement and the rental insertion happen in the same transaction, and the
    /// decrement is conditional on stock remaining, so two concurrent check-outs of the last
    /// copy cannot both succeed.
    pub(crate) async fn create_rental(
        self,
        customer_id: &str,
        movie_id: &str,
    ) -> DriverResult<Rental> {
        let customer_id = CustomerId::parse(customer_id)?;
        let movie_id = MovieId::parse(movie_id)?;

        let mut tx = self.db.begin().await?;

        let customer = db::get_customer(tx.ex(), customer_id).await?;
        let movie = db::get_movie(tx.ex(), movie_id).await?;

        if !db::decrement_movie_stock(tx.ex(), movie_id).await? {
            return Err(DriverError::InsufficientStock("Movie not in stock".to_owned()));
        }

        let rental = Rental::checked_out(
            CustomerSnapshot::new(
                *customer.id(),
                customer.name().clone(),
                customer.phone().clone(),
            ),
            MovieSnapshot::new(*movie.id(), movie.title().clone(), *movie.daily_rental_rate()),
            self.clock.now_utc(),
        );
        db::create_rental(tx.ex(), &rental).await?;

        tx.commit().await?;

        Ok(rental)
    }

    /// Deletes the rental identified by the raw `id`.
    pub(crate) async fn delete_rental(self, id: &str) -> DriverResult<()> {
        let id = RentalId::parse(id)?;

        let mut tx = self.db.begin().await?;
        db::delete_rental(tx.ex(), id).await?;
        tx.commit().await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::testutils::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_rentals_create_and_list() {
        let context = TestContext::setup().await;

        let genre = context.insert_genre("Drama").await;
        let customer = context.insert_customer("Ada").await;
        let movie = context.insert_movie(&genre, "Casablanca", 2, 150).await;

        let first = context
            .driver()
            .create_rental(&customer.id().to_string(), &movie.id().to_string())
            .await
            .unwrap();
        assert_eq!(customer.id(), first.customer().id());
        assert_eq!(movie.id(), first.movie().id());
        assert_eq!(movie.daily_rental_rate(), first.movie().daily_rental_rate());
        assert_eq!(context.driver().now_utc(), *first.rental_date());
        assert!(!first.returned());

        context.clock.advance(Duration::from_secs(60));
        let second = context
            .driver()
            .create_rental(&customer.id().to_string(), &movie.id().to_string())
            .await
            .unwrap();

        assert_eq!(
            vec![second.clone(), first.clone()],
            context.driver().list_rentals().await.unwrap()
        );
        assert_eq!(first, context.driver().get_rental(&first.id().to_string()).await.unwrap());

        let stock = context.driver().get_movie(&movie.id().to_string()).await.unwrap();
        assert_eq!(0, stock.number_in_stock().as_u32());
    }

    #[tokio::test]
    async fn test_rentals_snapshots_survive_edits() {
        let context = TestContext::setup().await;

        let genre = context.insert_genre("Drama").await;
        let customer = context.insert_customer("Ada").await;
        let movie = context.insert_movie(&genre, "Casablanca", 1, 150).await;

        let rental = context
            .driver()
            .create_rental(&customer.id().to_string(), &movie.id().to_string())
            .await
            .unwrap();

        context
            .driver()
            .update_movie(
                &movie.id().to_string(),
                crate::model::MovieTitle::new("Renamed").unwrap(),
                &genre.id().to_string(),
                crate::model::Stock::new(9).unwrap(),
                crate::model::DailyRate::from_cents(999).unwrap(),
            )
            .await
            .unwrap();

        let fetched = context.driver().get_rental(&rental.id().to_string()).await.unwrap();
        assert_eq!("Casablanca", fetched.movie().title().as_str());
        assert_eq!(150, fetched.movie().daily_rental_rate().as_cents());
    }

    #[tokio::test]
    async fn test_rentals_out_of_stock() {
        let context = TestContext::setup().await;

        let genre = context.insert_genre("Drama").await;
        let customer = context.insert_customer("Ada").await;
        let movie = context.insert_movie(&genre, "Casablanca", 1, 150).await;

        context
            .driver()
            .create_rental(&customer.id().to_string(), &movie.id().to_string())
            .await
            .unwrap();

        match context
            .driver()
            .create_rental(&customer.id().to_string(), &movie.id().to_string())
            .await
        {
            Err(DriverError::InsufficientStock(e)) => assert_eq!("Movie not in stock", e),
            e => panic!("{:?}", e),
        }

        // The failed check-out must not leave a rental behind.
        assert_eq!(1, context.driver().list_rentals().await.unwrap().len());
    }

    #[tokio::test]
    async fn test_rentals_unknown_customer_or_movie() {
        let context = TestContext::setup().await;

        let genre = context.insert_genre("Drama").await;
        let customer = context.insert_customer("Ada").await;
        let movie = context.insert_movie(&genre, "Casablanca", 1, 150).await;

        match context
            .driver()
            .create_rental(&CustomerId::random().to_string(), &movie.id().to_string())
            .await
        {
            Err(DriverError::NotFound(_)) => (),
            e => panic!("{:?}", e),
        }
        match context
            .driver()
            .create_rental(&customer.id().to_string(), &MovieId::random().to_string())
            .await
        {
            Err(DriverError::NotFound(_)) => (),
            e => panic!("{:?}", e),
        }

        // Stock must be intact after the failed attempts.
        let fetched = context.driver().get_movie(&movie.id().to_string()).await.unwrap();
        assert_eq!(1, fetched.number_in_stock().as_u32());
    }

    #[tokio::test]
    async fn test_rentals_not_found() {
        let context = TestContext::setup().await;

        let id = RentalId::random().to_string();
        match context.driver().get_rental(&id).await {
            Err(DriverError::NotFound(_)) => (),
            e => panic!("{:?}", e),
        }
        match context.driver().delete_rental(&id).await {
            Err(DriverError::NotFound(_)) => (),
            e => panic!("{:?}", e),
        }
    }
}
