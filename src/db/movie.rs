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

//! Database queries for movies.
//!
//! Movies embed their genre, so all read queries join against the genres table and expect the
//! genre columns under the `genre_id` and `genre_name` aliases.

use crate::db::{DbError, DbResult, Executor, postgres, sqlite};
use crate::model::{DailyRate, Genre, GenreId, GenreName, Movie, MovieId, MovieTitle, Stock};
use sqlx::Row;
use sqlx::postgres::PgRow;
use sqlx::sqlite::SqliteRow;

/// Columns to select when fetching movies with their genre.
const MOVIE_COLUMNS: &str = "movies.id, movies.title, movies.number_in_stock,
    movies.daily_rental_rate, genres.id AS genre_id, genres.name AS genre_name";

impl TryFrom<PgRow> for Movie {
    type Error = DbError;

    fn try_from(row: PgRow) -> DbResult<Self> {
        let id: String = row.try_get("id").map_err(postgres::map_sqlx_error)?;
        let title: String = row.try_get("title").map_err(postgres::map_sqlx_error)?;
        let number_in_stock: i64 =
            row.try_get("number_in_stock").map_err(postgres::map_sqlx_error)?;
        let daily_rental_rate: i64 =
            row.try_get("daily_rental_rate").map_err(postgres::map_sqlx_error)?;
        let genre_id: String = row.try_get("genre_id").map_err(postgres::map_sqlx_error)?;
        let genre_name: String = row.try_get("genre_name").map_err(postgres::map_sqlx_error)?;

        Ok(Movie::new(
            MovieId::parse(&id)?,
            MovieTitle::new(title)?,
            Genre::new(GenreId::parse(&genre_id)?, GenreName::new(genre_name)?),
            Stock::from_i64(number_in_stock)?,
            DailyRate::from_i64(daily_rental_rate)?,
        ))
    }
}

impl TryFrom<SqliteRow> for Movie {
    type Error = DbError;

    fn try_from(row: SqliteRow) -> DbResult<Self> {
        let id: String = row.try_get("id").map_err(sqlite::map_sqlx_error)?;
        let title: String = row.try_get("title").map_err(sqlite::map_sqlx_error)?;
        let number_in_stock: i64 =
            row.try_get("number_in_stock").map_err(sqlite::map_sqlx_error)?;
        let daily_rental_rate: i64 =
            row.try_get("daily_rental_rate").map_err(sqlite::map_sqlx_error)?;
        let genre_id: String = row.try_get("genre_id").map_err(sqlite::map_sqlx_error)?;
        let genre_name: String = row.try_get("genre_name").map_err(sqlite::map_sqlx_error)?;

        Ok(Movie::new(
            MovieId::parse(&id)?,
            MovieTitle::new(title)?,
            Genre::new(GenreId::parse(&genre_id)?, GenreName::new(genre_name)?),
            Stock::from_i64(number_in_stock)?,
            DailyRate::from_i64(daily_rental_rate)?,
        ))
    }
}

/// Gets all movies with their genres, sorted by title.
pub(crate) async fn list_movies(ex: &mut Executor) -> DbResult<Vec<Movie>> {
    let query_str = format!(
        "SELECT {} FROM movies JOIN genres ON genres.id = movies.genre_id ORDER BY movies.title",
        MOVIE_COLUMNS
    );
    match ex {
        Executor::Postgres(ex) => sqlx::query(&query_str)
            .fetch_all(ex.conn())
            .await
            .map_err(postgres::map_sqlx_error)?
            .into_iter()
            .map(Movie::try_from)
            .collect(),

        Executor::Sqlite(ex) => sqlx::query(&query_str)
            .fetch_all(ex.conn())
            .await
            .map_err(sqlite::map_sqlx_error)?
            .into_iter()
            .map(Movie::try_from)
            .collect(),
    }
}

/// Gets the movie with the given `id`, with its genre.
pub(crate) async fn get_movie(ex: &mut Executor, id: MovieId) -> DbResult<Movie> {
    match ex {
        Executor::Postgres(ex) => {
            let query_str = format!(
                "SELECT {} FROM movies JOIN genres ON genres.id = movies.genre_id
                WHERE movies.id = $1",
                MOVIE_COLUMNS
            );
            let raw_movie = sqlx::query(&query_str)
                .bind(id.to_string())
                .fetch_one(ex.conn())
                .await
                .map_err(postgres::map_sqlx_error)?;
            Movie::try_from(raw_movie)
        }

        Executor::Sqlite(ex) => {
            let query_str = format!(
                "SELECT {} FROM movies JOIN genres ON genres.id = movies.genre_id
                WHERE movies.id = ?",
                MOVIE_COLUMNS
            );
            let raw_movie = sqlx::query(&query_str)
                .bind(id.to_string())
                .fetch_one(ex.conn())
                .await
                .map_err(sqlite::map_sqlx_error)?;
            Movie::try_from(raw_movie)
        }
    }
}

/// Creates a new movie from the details in `movie`.  The genre referenced by `movie` must
/// already exist.
pub(crate) async fn create_movie(ex: &mut Executor, movie: &Movie) -> DbResult<()> {
    let rows_affected = match ex {
        Executor::Postgres(ex) => {
            let query_str = "
                INSERT INTO movies (id, title, genre_id, number_in_stock, daily_rental_rate)
                VALUES ($1, $2, $3, $4, $5)";
            let done = sqlx::query(query_str)
                .bind(movie.id().to_string())
                .bind(movie.title().as_str())
                .bind(movie.genre().id().to_string())
                .bind(movie.number_in_stock().as_i64())
                .bind(movie.daily_rental_rate().as_i64())
                .execute(ex.conn())
                .await
                .map_err(postgres::map_sqlx_error)?;
            done.rows_affected()
        }

        Executor::Sqlite(ex) => {
            let query_str = "
                INSERT INTO movies (id, title, genre_id, number_in_stock, daily_rental_rate)
                VALUES (?, ?, ?, ?, ?)";
            let done = sqlx::query(query_str)
                .bind(movie.id().to_string())
                .bind(movie.title().as_str())
                .bind(movie.genre().id().to_string())
                .bind(movie.number_in_stock().as_i64())
                .bind(movie.daily_rental_rate().as_i64())
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

/// Updates the movie with the id in `movie` to carry the other details in `movie`.
pub(crate) async fn update_movie(ex: &mut Executor, movie: &Movie) -> DbResult<()> {
    let rows_affected = match ex {
        Executor::Postgres(ex) => {
            let query_str = "
                UPDATE movies
                SET title = $1, genre_id = $2, number_in_stock = $3, daily_rental_rate = $4
                WHERE id = $5";
            let done = sqlx::query(query_str)
                .bind(movie.title().as_str())
                .bind(movie.genre().id().to_string())
                .bind(movie.number_in_stock().as_i64())
                .bind(movie.daily_rental_rate().as_i64())
                .bind(movie.id().to_string())
                .execute(ex.conn())
                .await
                .map_err(postgres::map_sqlx_error)?;
            done.rows_affected()
        }

        Executor::Sqlite(ex) => {
            let query_str = "
                UPDATE movies
                SET title = ?, genre_id = ?, number_in_stock = ?, daily_rental_rate = ?
                WHERE id = ?";
            let done = sqlx::query(query_str)
                .bind(movie.title().as_str())
                .bind(movie.genre().id().to_string())
                .bind(movie.number_in_stock().as_i64())
                .bind(movie.daily_rental_rate().as_i64())
                .bind(movie.id().to_string())
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

/// Deletes the movie with the given `id`.
pub(crate) async fn delete_movie(ex: &mut Executor, id: MovieId) -> DbResult<()> {
    let rows_affected = match ex {
        Executor::Postgres(ex) => {
            let query_str = "DELETE FROM movies WHERE id = $1";
            let done = sqlx::query(query_str)
                .bind(id.to_string())
                .execute(ex.conn())
                .await
                .map_err(postgres::map_sqlx_error)?;
            done.rows_affected()
        }

        Executor::Sqlite(ex) => {
            let query_str = "DELETE FROM movies WHERE id = ?";
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

/// Atomically claims one copy of the movie with the given `id`.
///
/// Returns true if a copy was claimed and false if the movie had no stock left.  The conditional
/// update is what guarantees that concurrent claims never take the count below zero, so callers
/// must not pre-check the count and skip this call.
pub(crate) async fn decrement_movie_stock(ex: &mut Executor, id: MovieId) -> DbResult<bool> {
    let rows_affected = match ex {
        Executor::Postgres(ex) => {
            let query_str = "
                UPDATE movies SET number_in_stock = number_in_stock - 1
                WHERE id = $1 AND number_in_stock > 0";
            let done = sqlx::query(query_str)
                .bind(id.to_string())
                .execute(ex.conn())
                .await
                .map_err(postgres::map_sqlx_error)?;
            done.rows_affected()
        }

        Executor::Sqlite(ex) => {
            let query_str = "
                UPDATE movies SET number_in_stock = number_in_stock - 1
                WHERE id = ? AND number_in_stock > 0";
            let done = sqlx::query(query_str)
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

/// Returns one copy of the movie with the given `id` to the shelf.
pub(crate) async fn increment_movie_stock(ex: &mut Executor, id: MovieId) -> DbResult<()> {
    let rows_affected = match ex {
        Executor::Postgres(ex) => {
            let query_str =
                "UPDATE movies SET number_in_stock = number_in_stock + 1 WHERE id = $1";
            let done = sqlx::query(query_str)
                .bind(id.to_string())
                .execute(ex.conn())
                .await
                .map_err(postgres::map_sqlx_error)?;
            done.rows_affected()
        }

        Executor::Sqlite(ex) => {
            let query_str = "UPDATE movies SET number_in_stock = number_in_stock + 1 WHERE id = ?";
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
        _ => Err(DbError::BackendError("Update affected more than one row".to_owned())),
    }
}
