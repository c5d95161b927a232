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

//! Extends the driver with the rental return operation.

use crate::db::{self, DbError};
use crate::driver::{Driver, DriverError, DriverResult};
use crate::model::{CustomerId, DailyRate, MovieId, Rental, RentalFee};
use time::OffsetDateTime;

/// Number of seconds in a billing day.
const SECS_PER_DAY: i64 = 24 * 60 * 60;

/// Computes the fee owed for a rental checked out at `rental_date` and returned at `now`, at
/// `daily_rate` per day.
///
/// Every started day is billed as a whole day and a rental is never billed for less than one
/// day, so a same-day return and a return at exactly the 24 hour mark both cost one day.
fn compute_fee(
    rental_date: OffsetDateTime,
    now: OffsetDateTime,
    daily_rate: DailyRate,
) -> DriverResult<RentalFee> {
    let elapsed_secs = (now - rental_date).whole_seconds();
    let days = if elapsed_secs <= SECS_PER_DAY {
        1
    } else {
        (elapsed_secs + SECS_PER_DAY - 1) / SECS_PER_DAY
    };

    let cents = days
        .checked_mul(daily_rate.as_i64())
        .ok_or_else(|| DriverError::BackendError("Rental fee overflow".to_owned()))?;
    Ok(RentalFee::from_cents(cents)?)
}

impl Driver {
    /// Processes the return of the movie identified by the raw `movie_id` by the customer
    /// identified by the raw `customer_id`.
    ///
    /// The oldest open rental for the pair is the one that gets closed.  A pair whose rentals
    /// have all been settled already yields `AlreadyProcessed`; a pair that was never rented
    /// yields `NotFound`.  Closing the rental, computing the fee and restoring the movie's
    /// stock happen in the same transaction, and the close is conditional on the rental still
    /// being open, so concurrent returns of the same rental settle the fee exactly once.
    pub(crate) async fn return_rental(
        self,
        customer_id: &str,
        movie_id: &str,
    ) -> DriverResult<Rental> {
        let customer_id = CustomerId::parse(customer_id)?;
        let movie_id = MovieId::parse(movie_id)?;

        let mut tx = self.db.begin().await?;

        let rental = match db::find_open_rental(tx.ex(), customer_id, movie_id).await {
            Ok(rental) => rental,
            Err(e @ DbError::NotFound) => {
                // The pair may have no rentals at all, or only settled ones.
                if db::has_rental(tx.ex(), customer_id, movie_id).await? {
                    return Err(DriverError::AlreadyProcessed(
                        "Return already processed".to_owned(),
                    ));
                }
                return Err(e.into());
            }
            Err(e) => return Err(e.into()),
        };

        let now = self.clock.now_utc();
        let fee = compute_fee(*rental.rental_date(), now, *rental.movie().daily_rental_rate())?;

        if !db::mark_rental_returned(tx.ex(), *rental.id(), now, fee).await? {
            return Err(DriverError::AlreadyProcessed("Return already processed".to_owned()));
        }
        db::increment_movie_stock(tx.ex(), movie_id).await?;

        tx.commit().await?;

        db::get_rental(&mut self.db.ex().await?, *rental.id()).await.map_err(DriverError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::testutils::*;
    use std::time::Duration;

    #[test]
    fn test_compute_fee_minimum_one_day() {
        let rate = DailyRate::from_cents(150).unwrap();
        let start = crate::clocks::testutils::utc_datetime((2025, 6, 20), (10, 0, 0));

        // A same-instant or same-day return is billed as one day.
        assert_eq!(150, compute_fee(start, start, rate).unwrap().as_cents());
        let fee = compute_fee(start, start + time::Duration::hours(5), rate).unwrap();
        assert_eq!(150, fee.as_cents());

        // A clock that went backwards still bills one day.
        let fee = compute_fee(start, start - time::Duration::hours(1), rate).unwrap();
        assert_eq!(150, fee.as_cents());
    }

    #[test]
    fn test_compute_fee_day_boundaries() {
        let rate = DailyRate::from_cents(150).unwrap();
        let start = crate::clocks::testutils::utc_datetime((2025, 6, 20), (10, 0, 0));

        // Exactly 24 hours is still one day; one second past it starts the second day.
        let fee = compute_fee(start, start + time::Duration::hours(24), rate).unwrap();
        assert_eq!(150, fee.as_cents());
        let fee = compute_fee(
            start,
            start + time::Duration::hours(24) + time::Duration::seconds(1),
            rate,
        )
        .unwrap();
        assert_eq!(300, fee.as_cents());

        let fee = compute_fee(start, start + time::Duration::days(7), rate).unwrap();
        assert_eq!(7 * 150, fee.as_cents());
    }

    #[tokio::test]
    async fn test_returns_ok() {
        let context = TestContext::setup().await;

        let genre = context.insert_genre("Drama").await;
        let customer = context.insert_customer("Ada").await;
        let movie = context.insert_movie(&genre, "Casablanca", 1, 150).await;

        let rental = context
            .driver()
            .create_rental(&customer.id().to_string(), &movie.id().to_string())
            .await
            .unwrap();

        context.clock.advance(Duration::from_secs(3 * 24 * 60 * 60));
        let returned = context
            .driver()
            .return_rental(&customer.id().to_string(), &movie.id().to_string())
            .await
            .unwrap();

        assert_eq!(rental.id(), returned.id());
        assert!(returned.returned());
        assert_eq!(Some(context.driver().now_utc()), *returned.returned_date());
        assert_eq!(3 * 150, returned.rental_fee().unwrap().as_cents());

        // The returned copy is rentable again.
        let fetched = context.driver().get_movie(&movie.id().to_string()).await.unwrap();
        assert_eq!(1, fetched.number_in_stock().as_u32());
    }

    #[tokio::test]
    async fn test_returns_oldest_open_rental_first() {
        let context = TestContext::setup().await;

        let genre = context.insert_genre("Drama").await;
        let customer = context.insert_customer("Ada").await;
        let movie = context.insert_movie(&genre, "Casablanca", 2, 150).await;

        let first = context
            .driver()
            .create_rental(&customer.id().to_string(), &movie.id().to_string())
            .await
            .unwrap();
        context.clock.advance(Duration::from_secs(60));
        let second = context
            .driver()
            .create_rental(&customer.id().to_string(), &movie.id().to_string())
            .await
            .unwrap();

        let returned = context
            .driver()
            .return_rental(&customer.id().to_string(), &movie.id().to_string())
            .await
            .unwrap();
        assert_eq!(first.id(), returned.id());

        let returned = context
            .driver()
            .return_rental(&customer.id().to_string(), &movie.id().to_string())
            .await
            .unwrap();
        assert_eq!(second.id(), returned.id());
    }

    #[tokio::test]
    async fn test_returns_no_open_rental() {
        let context = TestContext::setup().await;

        let genre = context.insert_genre("Drama").await;
        let customer = context.insert_customer("Ada").await;
        let movie = context.insert_movie(&genre, "Casablanca", 1, 150).await;

        match context
            .driver()
            .return_rental(&customer.id().to_string(), &movie.id().to_string())
            .await
        {
            Err(DriverError::NotFound(_)) => (),
            e => panic!("{:?}", e),
        }
    }

    #[tokio::test]
    async fn test_returns_repeated_return_already_processed() {
        let context = TestContext::setup().await;

        let genre = context.insert_genre("Drama").await;
        let customer = context.insert_customer("Ada").await;
        let movie = context.insert_movie(&genre, "Casablanca", 1, 150).await;

        context
            .driver()
            .create_rental(&customer.id().to_string(), &movie.id().to_string())
            .await
            .unwrap();
        context.clock.advance(Duration::from_secs(2 * 24 * 60 * 60));
        let returned = context
            .driver()
            .return_rental(&customer.id().to_string(), &movie.id().to_string())
            .await
            .unwrap();

        // Asking again must not stamp a new date nor charge a second fee.
        context.clock.advance(Duration::from_secs(5 * 24 * 60 * 60));
        match context
            .driver()
            .return_rental(&customer.id().to_string(), &movie.id().to_string())
            .await
        {
            Err(DriverError::AlreadyProcessed(_)) => (),
            e => panic!("{:?}", e),
        }

        let rental = context.driver().get_rental(&returned.id().to_string()).await.unwrap();
        assert_eq!(returned.returned_date(), rental.returned_date());
        assert_eq!(returned.rental_fee(), rental.rental_fee());

        let fetched = context.driver().get_movie(&movie.id().to_string()).await.unwrap();
        assert_eq!(1, fetched.number_in_stock().as_u32());
    }
}
