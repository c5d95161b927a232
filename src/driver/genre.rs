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

//! Extends the driver with the genre operations.

use crate::db;
use crate::driver::{Driver, DriverResult};
use crate::model::{Genre, GenreId, GenreName};

impl Driver {
    /// Lists all genres, sorted by name.
    pub(crate) async fn list_genres(self) -> DriverResult<Vec<Genre>> {
        let mut ex = self.db.ex().await?;
        Ok(db::list_genres(&mut ex).await?)
    }

    /// Gets the genre identified by the raw `id`.
    pub(crate) async fn get_genre(self, id: &str) -> DriverResult<Genre> {
        let id = GenreId::parse(id)?;
        let mut ex = self.db.ex().await?;
        Ok(db::get_genre(&mut ex, id).await?)
    }

    /// Creates a new genre with `name`.
    pub(crate) async fn create_genre(self, name: GenreName) -> DriverResult<Genre> {
        let genre = Genre::new(GenreId::random(), name);

        let mut tx = self.db.begin().await?;
        db::create_genre(tx.ex(), &genre).await?;
        tx.commit().await?;

        Ok(genre)
    }

    /// Renames the genre identified by the raw `id` to `name`.
    pub(crate) async fn update_genre(self, id: &str, name: GenreName) -> DriverResult<Genre> {
        let id = GenreId::parse(id)?;

        let mut tx = self.db.begin().await?;
        db::update_genre(tx.ex(), id, &name).await?;
        tx.commit().await?;

        Ok(Genre::new(id, name))
    }

    /// Deletes the genre identified by the raw `id`.
    pub(crate) async fn delete_genre(self, id: &str) -> DriverResult<()> {
        let id = GenreId::parse(id)?;

        let mut tx = self.db.begin().await?;
        db::delete_genre(tx.ex(), id).await?;
        tx.commit().await?;

        Ok(())
    }
}
