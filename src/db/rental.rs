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

//! Database queries for rentals.
//!
//! Rentals are immutable once created except for the single transition performed by
//! `mark_rental_returned`, which stamps the return date and fee on an open rental exactly once.

use crate::db::sqlite::{build_timestamp, unpack_timestamp};
use crate::db::{DbError, DbResult, Executor, postgres, sqlite};
use crate::model::{
    CustomerId, CustomerName, CustomerSnapshot, DailyRate, MovieId, MovieSnapshot, MovieTitle,
    Phone, Rental, RentalFee, RentalId,
};
use sqlx::Row;
use sqlx::postgres::PgRow;
use sqlx::sqlite::SqliteRow;
use time::OffsetDateTime;

impl TryFrom<PgRow> for Rental {
    type Error = DbError;

    fn try_from(row: PgRow) -> DbResult<Self> {
        let id: String = row.try_get("id").map_err(postgres::map_sqlx_error)?;
        let customer_id: String = row.try_get("customer_id").map_err(postgres::map_sqlx_error)?;
        let customer_name: String =
            row.try_get("customer_name").map_err(postgres::map_sqlx_error)?;
        let customer_phone: String =
            row.try_get("customer_phone").map_err(postgres::map_sqlx_error)?;
        let movie_id: String = row.try_get("movie_id").map_err(postgres::map_sqlx_error)?;
        let movie_title: String = row.try_get("movie_title").map_err(postgres::map_sqlx_error)?;
        let movie_daily_rental_rate: i64 =
            row.try_get("movie_daily_rental_rate").map_err(postgres::map_sqlx_error)?;
        let rental_date: OffsetDateTime =
            row.try_get("rental_date").map_err(postgres::map_sqlx_error)?;
        let returned_date: Option<OffsetDateTime> =
            row.try_get("returned_date").map_err(postgres::map_sqlx_error)?;
        let rental_fee: Option<i64> =
            row.try_get("rental_fee").map_err(postgres::map_sqlx_error)?;

        let customer = CustomerSnapshot::new(
            CustomerId::parse(&customer_id)?,
            CustomerName::new(customer_name)?,
            Phone::new(customer_phone)?,
        );
        let movie = MovieSnapshot::new(
            MovieId::parse(&movie_id)?,
            MovieTitle::new(movie_title)?,
            DailyRate::from_i64(movie_daily_rental_rate)?,
        );
        let rental_fee = match rental_fee {
            Some(cents) => Some(RentalFee::from_cents(cents)?),
            None => None,
        };

        Ok(Rental::new(
            RentalId::parse(&id)?,
            customer,
            movie,
            rental_date,
            returned_date,
            rental_fee,
        ))
    }
}

impl TryFrom<SqliteRow> for Rental {
    type Error = DbError;

    fn try_from(row: SqliteRow) -> DbResult<Self> {
        let id: String = row.try_get("id").map_err(sqlite::map_sqlx_error)?;
        let customer_id: String = row.try_get("customer_id").map_err(sqlite::map_sqlx_error)?;
        let customer_name: String = row.try_get("customer_name").map_err(sqlite::map_sqlx_error)?;
        let customer_phone: String =
            row.try_get("customer_phone").map_err(sqlite::map_sqlx_error)?;
        let movie_id: String = row.try_get("movie_id").map_err(sqlite::map_sqlx_error)?;
        let movie_title: String = row.try_get("movie_title").map_err(sqlite::map_sqlx_error)?;
        let movie_daily_rental_rate: i64 =
            row.try_get("movie_daily_rental_rate").map_err(sqlite::map_sqlx_error)?;
        let rental_date_secs: i64 =
            row.try_get("rental_date_secs").map_err(sqlite::map_sqlx_error)?;
        let rental_date_nsecs: i64 =
            row.try_get("rental_date_nsecs").map_err(sqlite::map_sqlx_error)?;
        let returned_date_secs: Option<i64> =
            row.try_get("returned_date_secs").map_err(sqlite::map_sqlx_error)?;
        let returned_date_nsecs: Option<i64> =
            row.try_get("returned_date_nsecs").map_err(sqlite::map_sqlx_error)?;
        let rental_fee: Option<i64> = row.try_get("rental_fee").map_err(sqlite::map_sqlx_error)?;

        let customer = CustomerSnapshot::new(
            CustomerId::parse(&customer_id)?,
            CustomerName::new(customer_name)?,
            Phone::new(customer_phone)?,
        );
        let movie = MovieSnapshot::new(
            MovieId::parse(&movie_id)?,
            MovieTitle::new(movie_title)?,
            DailyRate::from_i64(movie_daily_rental_rate)?,
        );
        let rental_date = build_timestamp(rental_date_secs, rental_date_nsecs)?;
        let returned_date = match (returned_date_secs, returned_date_nsecs) {
            (Some(secs), Some(nsecs)) => Some(build_timestamp(secs, nsecs)?),
            (None, None) => None,
            (_, _) => {
                return Err(DbError::DataIntegrityError(
                    "Inconsistent values for returned_date".to_owned(),
                ));
            }
        };
        let rental_fee = match rental_fee {
            Some(cents) => Some(RentalFee::from_cents(cents)?),
            None => None,
        };

        Ok(Rental::new(
            RentalId::parse(&id)?,
            customer,
            movie,
            rental_date,
            returned_date,
            rental_fee,
        ))
    }
}

/// Gets all rentals, newest first.
pub(crate) async fn list_rentals(ex: &mut Executor) -> DbResult<Vec<Rental>> {
    match ex {
        Executor::Postgres(ex) => {
            let query_str = "SELECT * FROM rentals ORDER BY rental_date DESC";
            sqlx::query(query_str)
                .fetch_all(ex.conn())
                .await
                .map_err(postgres::map_sqlx_error)?
                .into_iter()
                .map(Rental::try_from)
                .collect()
        }

        Executor::Sqlite(ex) => {
            let query_str =
                "SELECT * FROM rentals ORDER BY rental_date_secs DESC, rental_date_nsecs DESC";
            sqlx::query(query_str)
                .fetch_all(ex.conn())
                .await
                .map_err(sqlite::map_sqlx_error)?
                .into_iter()
                .map(Rental::try_from)
                .collect()
        }
    }
}

/// Gets the rental with the given `id`.
pub(crate) async fn get_rental(ex: &mut Executor, id: RentalId) -> DbResult<Rental> {
    match ex {
        Executor::Postgres(ex) => {
            let query_str = "SELECT * FROM rentals WHERE id = $1";
            let raw_rental = sqlx::query(query_str)
                .bind(id.to_string())
                .fetch_one(ex.conn())
                .await
                .map_err(postgres::map_sqlx_error)?;
            Rental::try_from(raw_rental)
        }

        Executor::Sqlite(ex) => {
            let query_str = "SELECT * FROM rentals WHERE id = ?";
            let raw_rental = sqlx::query(query_str)
                .bind(id.to_string())
                .fetch_one(ex.conn())
                .await
                .map_err(sqlite::map_sqlx_error)?;
            Rental::try_from(raw_rental)
        }
    }
}

/// Creates a new rental from the details in `rental`.
pub(crate) async fn create_rental(ex: &mut Executor, rental: &Rental) -> DbResult<()> {
    let rows_affected = match ex {
        Executor::Postgres(ex) => {
            let query_str = "
                INSERT INTO rentals (id, customer_id, customer_name, customer_phone, movie_id,
                    movie_title, movie_daily_rental_rate, rental_date, returned_date, rental_fee)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)";
            let done = sqlx::query(query_str)
                .bind(rental.id().to_string())
                .bind(rental.customer().id().to_string())
                .bind(rental.customer().name().as_str())
                .bind(rental.customer().phone().as_str())
                .bind(rental.movie().id().to_string())
                .bind(rental.movie().title().as_str())
                .bind(rental.movie().daily_rental_rate().as_i64())
                .bind(*rental.rental_date())
                .bind(*rental.returned_date())
                .bind(rental.rental_fee().map(|fee| fee.as_cents()))
                .execute(ex.conn())
                .await
                .map_err(postgres::map_sqlx_error)?;
            done.rows_affected()
        }

        Executor::Sqlite(ex) => {
            let (rental_date_secs, rental_date_nsecs) = unpack_timestamp(*rental.rental_date());
            let (returned_date_secs, returned_date_nsecs) = match rental.returned_date() {
                Some(date) => {
                    let (secs, nsecs) = unpack_timestamp(*date);
                    (Some(secs), Some(nsecs))
                }
                None => (None, None),
            };

            let query_str = "
                INSERT INTO rentals (id, customer_id, customer_name, customer_phone, movie_id,
                    movie_title, movie_daily_rental_rate, rental_date_secs, rental_date_nsecs,
                    returned_date_secs, returned_date_nsecs, rental_fee)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)";
            let done = sqlx::query(query_str)
                .bind(rental.id().to_string())
                .bind(rental.customer().id().to_string())
                .bind(rental.customer().name().as_str())
                .bind(rental.customer().phone().as_str())
                .bind(rental.movie().id().to_string())
                .bind(rental.movie().title().as_str())
                .bind(rental.movie().daily_rental_rate().as_i64())
                .bind(rental_date_secs)
                .bind(rental_date_nsecs)
                .bind(returned_date_secs)
                .bind(returned_date_nsecs)
                .bind(rental.rental_fee().map(|fee| fee.as_cents()))
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

/// Finds the oldest open rental of `movie_id` by `customer_id`.
pub(crate) async fn find_open_rental(
    ex: &mut Executor,
    customer_id: CustomerId,
    movie_id: MovieId,
) -> DbResult<Rental> {
    match ex {
        Executor::Postgres(ex) => {
            let query_str = "
                SELECT * FROM rentals
                WHERE customer_id = $1 AND movie_id = $2 AND returned_date IS NULL
                ORDER BY rental_date LIMIT 1";
            let raw_rental = sqlx::query(query_str)
                .bind(customer_id.to_string())
                .bind(movie_id.to_string())
                .fetch_one(ex.conn())
                .await
                .map_err(postgres::map_sqlx_error)?;
            Rental::try_from(raw_rental)
        }

        Executor::Sqlite(ex) => {
            let query_str = "
                SELECT * FROM rentals
                WHERE customer_id = ? AND movie_id = ? AND returned_date_secs IS NULL
                ORDER BY rental_date_secs, rental_date_nsecs LIMIT 1";
            let raw_rental = sqlx::query(query_str)
                .bind(customer_id.to_string())
                .bind(movie_id.to_string())
                .fetch_one(ex.conn())
                .await
                .map_err(sqlite::map_sqlx_error)?;
            Rental::try_from(raw_rental)
        }
    }
}

/// Checks whether any rental of `movie_id` by `customer_id` exists, open or returned.
///
/// The return path uses this to distinguish a pair that was never rented from one whose
/// rentals have all been settled already.
pub(crate) async fn has_rental(
    ex: &mut Executor,
    customer_id: CustomerId,
    movie_id: MovieId,
) -> DbResult<bool> {
    let count: i64 = match ex {
        Executor::Postgres(ex) => {
            let query_str =
                "SELECT COUNT(*) AS count FROM rentals WHERE customer_id = $1 AND movie_id = $2";
            let row = sqlx::query(query_str)
                .bind(customer_id.to_string())
                .bind(movie_id.to_string())
                .fetch_one(ex.conn())
                .await
                .map_err(postgres::map_sqlx_error)?;
            row.try_get("count").map_err(postgres::map_sqlx_error)?
        }

        Executor::Sqlite(ex) => {
            let query_str =
                "SELECT COUNT(*) AS count FROM rentals WHERE customer_id = ? AND movie_id = ?";
            let row = sqlx::query(query_str)
                .bind(customer_id.to_string())
                .bind(movie_id.to_string())
                .fetch_one(ex.conn())
                .await
                .map_err(sqlite::map_sqlx_error)?;
            row.try_get("count").map_err(sqlite::map_sqlx_error)?
        }
    };
    Ok(count > 0)
}

/// Atomically closes the rental with the given `id` by stamping its `returned_date` and
/// `rental_fee`.
///
/// Returns true if the rental transitioned from open to returned and false if it was already
/// returned.  The `returned_date IS NULL` condition is what makes concurrent returns settle the
/// charge exactly once.
pub(crate) async fn mark_rental_returned(
    ex: &mut Executor,
    id: RentalId,
    returned_date: OffsetDateTime,
    fee: RentalFee,
) -> DbResult<bool> {
    let rows_affected = match ex {
        Executor::Postgres(ex) => {
            let query_str = "
                UPDATE rentals SET returned_date = $1, rental_fee = $2
                WHERE id = $3 AND returned_date IS NULL";
            let done = sqlx::query(query_str)
                .bind(returned_date)
                .bind(fee.as_cents())
                .bind(id.to_string())
                .execute(ex.conn())
                .await
                .map_err(postgres::map_sqlx_error)?;
            done.rows_affected()
        }

        Executor::Sqlite(ex) => {
            let (returned_date_secs, returned_date_nsecs) = unpack_timestamp(returned_date);

            let query_str = "
                UPDATE rentals
                SET returned_date_secs = ?, returned_date_nsecs = ?, rental_fee = ?
                WHERE id = ? AND returned_date_secs IS NULL";
            let done = sqlx::query(query_str)
                .bind(returned_date_secs)
                .bind(returned_date_nsecs)
                .bind(fee.as_cents())
                .bind(id.to_string())
                .execute(ex.conn())
                .await
                .map_err(sqlite::map_sqlx_error)?;
            done.rows_affected()
        }
    };

    match rows_affected {
        0 => Ok(false),
        1 => Ok(true),
        _ => Err(DbError::BackendError("Update affected more than one row".to_owned())),
    }
}

/// Deletes the rental with the given `id`.
pub(crate) async fn delete_rental(ex: &mut Executor, id: RentalId) -> DbResult<()> {
    let rows_affected = match ex {
        Executor::Postgres(ex) => {
            let query_str = "DELETE FROM rentals WHERE id = $1";
            let done = sqlx::query(query_str)
                .bind(id.to_string())
                .execute(ex.conn())
                .await
                .map_err(postgres::map_sqlx_error)?;
            done.rows_affected()
        }

        Executor::Sqlite(ex) => {
            let query_str = "DELETE FROM rentals WHERE id = ?";
            let done = sqlx::query(query_str)
                .bind(id.to_string())
                .execute(ex.conn())
                .await
                .map_err(sqlite::map_sqlx_error)?;
            done.rows_affected()
        }
    };

    match rows_affected {
        0 => Err(DbError::NotFound),
        1 => Ok(()),
        _ => Err(DbError::BackendError("Deletion affected more than one row".to_owned())),
    }
}
