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

//! Extends the driver with the customer operations.

use crate::db;
use crate::driver::{Driver, DriverResult};
use crate::model::{Customer, CustomerId, CustomerName, Phone};

impl Driver {
    /// Lists all customers, sorted by name.
    pub(crate) async fn list_customers(self) -> DriverResult<Vec<Customer>> {
        let mut ex = self.db.ex().await?;
        Ok(db::list_customers(&mut ex).await?)
    }

    /// Gets the customer identified by the raw `id`.
    pub(crate) async fn get_customer(self, id: &str) -> DriverResult<Customer> {
        let id = CustomerId::parse(id)?;
        let mut ex = self.db.ex().await?;
        Ok(db::get_customer(&mut ex, id).await?)
    }

    /// Registers a new customer.
    pub(crate) async fn create_customer(
        self,
        name: CustomerName,
        phone: Phone,
        is_gold: bool,
    ) -> DriverResult<Customer> {
        let customer = Customer::new(CustomerId::random(), name, phone, is_gold);

        let mut tx = self.db.begin().await?;
        db::create_customer(tx.ex(), &customer).await?;
        tx.commit().await?;

        Ok(customer)
    }

    /// Updates the customer identified by the raw `id` with new details.
    pub(crate) async fn update_customer(
        self,
        id: &str,
        name: CustomerName,
        phone: Phone,
        is_gold: bool,
    ) -> DriverResult<Customer> {
        let id = CustomerId::parse(id)?;
        let customer = Customer::new(id, name, phone, is_gold);

        let mut tx = self.db.begin().await?;
        db::update_customer(tx.ex(), &customer).await?;
        tx.commit().await?;

        Ok(customer)
    }

    /// Deletes the customer identified by the raw `id`.
    pub(crate) async fn delete_customer(self, id: &str) -> DriverResult<()> {
        let id = CustomerId::parse(id)?;

        let mut tx = self.db.begin().await?;
        db::delete_customer(tx.ex(), id).await?;
        tx.commit().await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::DriverError;
    use crate::driver::testutils::*;

    #[tokio::test]
    async fn test_customers_crud() {
        let context = TestContext::setup().await;

        let ada = context
            .driver()
            .create_customer(
                CustomerName::new("Ada").unwrap(),
                Phone::new("555-0100").unwrap(),
                false,
            )
            .await
            .unwrap();

        assert_eq!(ada, context.driver().get_customer(&ada.id().to_string()).await.unwrap());
        assert_eq!(vec![ada.clone()], context.driver().list_customers().await.unwrap());

        let updated = context
            .driver()
            .update_customer(
                &ada.id().to_string(),
                CustomerName::new("Ada Lovelace").unwrap(),
                Phone::new("555-0199").unwrap(),
                true,
            )
            .await
            .unwrap();
        assert!(updated.is_gold());
        assert_eq!(updated, context.driver().get_customer(&ada.id().to_string()).await.unwrap());

        context.driver().delete_customer(&ada.id().to_string()).await.unwrap();
        assert!(context.driver().list_customers().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_customers_invalid_id() {
        let context = TestContext::setup().await;

        match context.driver().get_customer("not-an-id").await {
            Err(DriverError::InvalidInput(_)) => (),
            e => panic!("{:?}", e),
        }
    }

    #[tokio::test]
    async fn test_customers_not_found() {
        let context = TestContext::setup().await;

        let id = CustomerId::random().to_string();
        match context.driver().get_customer(&id).await {
            Err(DriverError::NotFound(_)) => (),
            e => panic!("{:?}", e),
        }
        match context
            .driver()
            .update_customer(
                &id,
                CustomerName::new("Nobody").unwrap(),
                Phone::new("555-0100").unwrap(),
                false,
            )
            .await
        {
            Err(DriverError::NotFound(_)) => (),
            e => panic!("{:?}", e),
        }
    }
}
