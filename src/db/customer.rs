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

//! Database queries for customers.

use crate::db::{DbError, DbResult, Executor, postgres, sqlite};
use crate::model::{Customer, CustomerId, CustomerName, Phone};
use sqlx::Row;
use sqlx::postgres::PgRow;
use sqlx::sqlite::SqliteRow;

impl TryFrom<PgRow> for Customer {
    type Error = DbError;

    fn try_from(row: PgRow) -> DbResult<Self> {
        let id: String = row.try_get("id").map_err(postgres::map_sqlx_error)?;
        let name: String = row.try_get("name").map_err(postgres::map_sqlx_error)?;
        let phone: String = row.try_get("phone").map_err(postgres::map_sqlx_error)?;
        let is_gold: bool = row.try_get("is_gold").map_err(postgres::map_sqlx_error)?;

        Ok(Customer::new(
            CustomerId::parse(&id)?,
            CustomerName::new(name)?,
            Phone::new(phone)?,
            is_gold,
        ))
    }
}

impl TryFrom<SqliteRow> for Customer {
    type Error = DbError;

    fn try_from(row: SqliteRow) -> DbResult<Self> {
        let id: String = row.try_get("id").map_err(sqlite::map_sqlx_error)?;
        let name: String = row.try_get("name").map_err(sqlite::map_sqlx_error)?;
        let phone: String = row.try_get("phone").map_err(sqlite::map_sqlx_error)?;
        let is_gold: bool = row.try_get("is_gold").map_err(sqlite::map_sqlx_error)?;

        Ok(Customer::new(
            CustomerId::parse(&id)?,
            CustomerName::new(name)?,
            Phone::new(phone)?,
            is_gold,
        ))
    }
}

/// Gets all customers, sorted by name.
pub(crate) async fn list_customers(ex: &mut Executor) -> DbResult<Vec<Customer>> {
    let query_str = "SELECT id, name, phone, is_gold FROM customers ORDER BY name";
    match ex {
        Executor::Postgres(ex) => sqlx::query(query_str)
            .fetch_all(ex.conn())
            .await
            .map_err(postgres::map_sqlx_error)?
            .into_iter()
            .map(Customer::try_from)
            .collect(),

        Executor::Sqlite(ex) => sqlx::query(query_str)
            .fetch_all(ex.conn())
            .await
            .map_err(sqlite::map_sqlx_error)?
            .into_iter()
            .map(Customer::try_from)
            .collect(),
    }
}

/// Gets the customer with the given `id`.
pub(crate) async fn get_customer(ex: &mut Executor, id: CustomerId) -> DbResult<Customer> {
    match ex {
        Executor::Postgres(ex) => {
            let query_str = "SELECT id, name, phone, is_gold FROM customers WHERE id = $1";
            let raw_customer = sqlx::query(query_str)
                .bind(id.to_string())
                .fetch_one(ex.conn())
                .await
                .map_err(postgres::map_sqlx_error)?;
            Customer::try_from(raw_customer)
        }

        Executor::Sqlite(ex) => {
            let query_str = "SELECT id, name, phone, is_gold FROM customers WHERE id = ?";
            let raw_customer = sqlx::query(query_str)
                .bind(id.to_string())
                .fetch_one(ex.conn())
                .await
                .map_err(sqlite::map_sqlx_error)?;
            Customer::try_from(raw_customer)
        }
    }
}

/// Creates a new customer from the details in `customer`.
pub(crate) async fn create_customer(ex: &mut Executor, customer: &Customer) -> DbResult<()> {
    let rows_affected = match ex {
        Executor::Postgres(ex) => {
            let query_str =
                "INSERT INTO customers (id, name, phone, is_gold) VALUES ($1, $2, $3, $4)";
            let done = sqlx::query(query_str)
                .bind(customer.id().to_string())
                .bind(customer.name().as_str())
                .bind(customer.phone().as_str())
                .bind(customer.is_gold())
                .execute(ex.conn())
                .await
                .map_err(postgres::map_sqlx_error)?;
            done.rows_affected()
        }

        Executor::Sqlite(ex) => {
            let query_str = "INSERT INTO customers (id, name, phone, is_gold) VALUES (?, ?, ?, ?)";
            let done = sqlx::query(query_str)
                .bind(customer.id().to_string())
                .bind(customer.name().as_str())
                .bind(customer.phone().as_str())
                .bind(customer.is_gold())
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

/// Updates the customer with the id in `customer` to carry the other details in `customer`.
pub(crate) async fn update_customer(ex: &mut Executor, customer: &Customer) -> DbResult<()> {
    let rows_affected = match ex {
        Executor::Postgres(ex) => {
            let query_str =
                "UPDATE customers SET name = $1, phone = $2, is_gold = $3 WHERE id = $4";
            let done = sqlx::query(query_str)
                .bind(customer.name().as_str())
                .bind(customer.phone().as_str())
                .bind(customer.is_gold())
                .bind(customer.id().to_string())
                .execute(ex.conn())
                .await
                .map_err(postgres::map_sqlx_error)?;
            done.rows_affected()
        }

        Executor::Sqlite(ex) => {
            let query_str = "UPDATE customers SET name = ?, phone = ?, is_gold = ? WHERE id = ?";
            let done = sqlx::query(query_str)
                .bind(customer.name().as_str())
                .bind(customer.phone().as_str())
                .bind(customer.is_gold())
                .bind(customer.id().to_string())
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

/// Deletes the customer with the given `id`.
pub(crate) async fn delete_customer(ex: &mut Executor, id: CustomerId) -> DbResult<()> {
    let rows_affected = match ex {
        Executor::Postgres(ex) => {
            let query_str = "DELETE FROM customers WHERE id = $1";
            let done = sqlx::query(query_str)
                .bind(id.to_string())
                .execute(ex.conn())
                .await
                .map_err(postgres::map_sqlx_error)?;
            done.rows_affected()
        }

        Executor::Sqlite(ex) => {
            let query_str = "DELETE FROM customers WHERE id = ?";
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
