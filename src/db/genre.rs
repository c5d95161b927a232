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

//! Database queries for genres.

use crate::db::{DbError, DbResult, Executor, postgres, sqlite};
use crate::model::{Genre, GenreId, GenreName};
use sqlx::Row;
use sqlx::postgres::PgRow;
use sqlx::sqlite::SqliteRow;

impl TryFrom<PgRow> for Genre {
    type Error = DbError;

    fn try_from(row: PgRow) -> DbResult<Self> {
        let id: String = row.try_get("id").map_err(postgres::map_sqlx_error)?;
        let name: String = row.try_get("name").map_err(postgres::map_sqlx_error)?;

        Ok(Genre::new(GenreId::parse(&id)?, GenreName::new(name)?))
    }
}

impl TryFrom<SqliteRow> for Genre {
    type Error = DbError;

    fn try_from(row: SqliteRow) -> DbResult<Self> {
        let id: String = row.try_get("id").map_err(sqlite::map_sqlx_error)?;
        let name: String = row.try_get("name").map_err(sqlite::map_sqlx_error)?;

        Ok(Genre::new(GenreId::parse(&id)?, GenreName::new(name)?))
    }
}

/// Gets all genres, sorted by name.
pub(crate) async fn list_genres(ex: &mut Executor) -> DbResult<Vec<Genre>> {
    let query_str = "SELECT id, name FROM genres ORDER BY name";
    let raw_genres = match ex {
        Executor::Postgres(ex) => sqlx::query(query_str)
            .fetch_all(ex.conn())
            .await
            .map_err(postgres::map_sqlx_error)?
            .into_iter()
            .map(Genre::try_from)
            .collect::<DbResult<Vec<Genre>>>(),

        Executor::Sqlite(ex) => sqlx::query(query_str)
            .fetch_all(ex.conn())
            .await
            .map_err(sqlite::map_sqlx_error)?
            .into_iter()
            .map(Genre::try_from)
            .collect::<DbResult<Vec<Genre>>>(),
    }?;
    Ok(raw_genres)
}

/// Gets the genre with the given `id`.
pub(crate) async fn get_genre(ex: &mut Executor, id: GenreId) -> DbResult<Genre> {
    match ex {
        Executor::Postgres(ex) => {
            let query_str = "SELECT id, name FROM genres WHERE id = $1";
            let raw_genre = sqlx::query(query_str)
                .bind(id.to_string())
                .fetch_one(ex.conn())
                .await
                .map_err(postgres::map_sqlx_error)?;
            Genre::try_from(raw_genre)
        }

        Executor::Sqlite(ex) => {
            let query_str = "SELECT id, name FROM genres WHERE id = ?";
            let raw_genre = sqlx::query(query_str)
                .bind(id.to_string())
                .fetch_one(ex.conn())
                .await
                .map_err(sqlite::map_sqlx_error)?;
            Genre::try_from(raw_genre)
        }
    }
}

/// Creates a new genre from the details in `genre`.
pub(crate) async fn create_genre(ex: &mut Executor, genre: &Genre) -> DbResult<()> {
    let rows_affected = match ex {
        Executor::Postgres(ex) => {
            let query_str = "INSERT INTO genres (id, name) VALUES ($1, $2)";
            let done = sqlx::query(query_str)
                .bind(genre.id().to_string())
                .bind(genre.name().as_str())
                .execute(ex.conn())
                .await
                .map_err(postgres::map_sqlx_error)?;
            done.rows_affected()
        }

        Executor::Sqlite(ex) => {
            let query_str = "INSERT INTO genres (id, name) VALUES (?, ?)";
            let done = sqlx::query(query_str)
                .bind(genre.id().to_string())
                .bind(genre.name().as_str())
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

/// Renames the genre with the given `id` to `name`.
pub(crate) async fn update_genre(ex: &mut Executor, id: GenreId, name: &GenreName) -> DbResult<()> {
    let rows_affected = match ex {
        Executor::Postgres(ex) => {
            let query_str = "UPDATE genres SET name = $1 WHERE id = $2";
            let done = sqlx::query(query_str)
                .bind(name.as_str())
                .bind(id.to_string())
                .execute(ex.conn())
                .await
                .map_err(postgres::map_sqlx_error)?;
            done.rows_affected()
        }

        Executor::Sqlite(ex) => {
            let query_str = "UPDATE genres SET name = ? WHERE id = ?";
            let done = sqlx::query(query_str)
                .bind(name.as_str())
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

/// Deletes the genre with the given `id`.
pub(crate) async fn delete_genre(ex: &mut Executor, id: GenreId) -> DbResult<()> {
    let rows_affected = match ex {
        Executor::Postgres(ex) => {
            let query_str = "DELETE FROM genres WHERE id = $1";
            let done = sqlx::query(query_str)
                .bind(id.to_string())
                .execute(ex.conn())
                .await
                .map_err(postgres::map_sqlx_error)?;
            done.rows_affected()
        }

        Executor::Sqlite(ex) => {
            let query_str = "DELETE FROM genres WHERE id = ?";
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
