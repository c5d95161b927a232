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

//! Extends the driver with the movie operations.

use crate::db::{self, DbError};
use crate::driver::{Driver, DriverError, DriverResult};
use crate::model::{DailyRate, GenreId, Movie, MovieId, MovieTitle, Stock};

impl Driver {
    /// Lists all movies, sorted by title.
    pub(crate) async fn list_movies(self) -> DriverResult<Vec<Movie>> {
        let mut ex = self.db.ex().await?;
        Ok(db::list_movies(&mut ex).await?)
    }

    /// Gets the movie identified by the raw `id`.
    pub(crate) async fn get_movie(self, id: &str) -> DriverResult<Movie> {
        let id = MovieId::parse(id)?;
        let mut ex = self.db.ex().await?;
        Ok(db::get_movie(&mut ex, id).await?)
    }

    /// Adds a new movie to the catalog under the genre identified by the raw `genre_id`.
    pub(crate) async fn create_movie(
        self,
        title: MovieTitle,
        genre_id: &str,
        number_in_stock: Stock,
        daily_rental_rate: DailyRate,
    ) -> DriverResult<Movie> {
        let genre_id = GenreId::parse(genre_id)?;

        let mut tx = self.db.begin().await?;
        let genre = match db::get_genre(tx.ex(), genre_id).await {
            Ok(genre) => genre,
            Err(DbError::NotFound) => {
                return Err(DriverError::InvalidInput("Invalid genre".to_owned()));
            }
            Err(e) => return Err(e.into()),
        };
        let movie =
            Movie::new(MovieId::random(), title, genre, number_in_stock, daily_rental_rate);
        db::create_movie(tx.ex(), &movie).await?;
        tx.commit().await?;

        Ok(movie)
    }

    /// Updates the movie identified by the raw `id` with new details.
    pub(crate) async fn update_movie(
        self,
        id: &str,
        title: MovieTitle,
        genre_id: &str,
        number_in_stock: Stock,
        daily_rental_rate: DailyRate,
    ) -> DriverResult<Movie> {
        let id = MovieId::parse(id)?;
        let genre_id = GenreId::parse(genre_id)?;

        let mut tx = self.db.begin().await?;
        let genre = match db::get_genre(tx.ex(), genre_id).await {
            Ok(genre) => genre,
            Err(DbError::NotFound) => {
                return Err(DriverError::InvalidInput("Invalid genre".to_owned()));
            }
            Err(e) => return Err(e.into()),
        };
        let movie = Movie::new(id, title, genre, number_in_stock, daily_rental_rate);
        db::update_movie(tx.ex(), &movie).await?;
        tx.commit().await?;

        Ok(movie)
    }

    /// Deletes the movie identified by the raw `id`.
    pub(crate) async fn delete_movie(self, id: &str) -> DriverResult<()> {
        let id = MovieId::parse(id)?;

        let mut tx = self.db.begin().await?;
        db::delete_movie(tx.ex(), id).await?;
        tx.commit().await?;

        Ok(())
    }
}
