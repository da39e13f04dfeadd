//! Order service providing a simplified API for order operations.

use common::{OrderId, ProductId, TaxRate};
use store::{CatalogStore, NewOrder, Order, OrderFilter, OrderStore, StoreError};

use crate::error::DomainError;

use super::{OrderAggregate, OrderChanges, OrderError};

impl From<OrderError> for DomainError {
    fn from(e: OrderError) -> Self {
        DomainError::Order(e)
    }
}

/// How many times a conflicted aggregate write is retried before giving up.
const MAX_WRITE_ATTEMPTS: u32 = 5;

/// Service for managing orders.
///
/// Wraps load-mutate-save around the store: every write goes through the
/// aggregate's rules and is persisted with an optimistic version check.
/// Conflicting writers reload and retry up to [`MAX_WRITE_ATTEMPTS`] times.
#[derive(Debug, Clone)]
pub struct OrderService<S> {
    store: S,
    tax_rate: TaxRate,
}

impl<S: OrderStore + CatalogStore> OrderService<S> {
    /// Creates a new order service over the given store.
    pub fn new(store: S, tax_rate: TaxRate) -> Self {
        Self { store, tax_rate }
    }

    /// Returns a reference to the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn tax_rate(&self) -> TaxRate {
        self.tax_rate
    }

    /// Creates a new pending order.
    #[tracing::instrument(skip(self))]
    pub async fn create_order(&self, new: NewOrder) -> Result<Order, DomainError> {
        let order = self.store.create_order(new).await?;
        metrics::counter!("orders_created_total").increment(1);
        Ok(order)
    }

    /// Loads an order and its lines.
    #[tracing::instrument(skip(self))]
    pub async fn get_order(&self, order_id: OrderId) -> Result<OrderAggregate, DomainError> {
        let order = self.store.get_order(order_id).await?;
        let items = self.store.get_order_items(order_id).await?;
        Ok(OrderAggregate::from_parts(order, items))
    }

    /// Lists orders matching the filter, newest first.
    pub async fn list_orders(&self, filter: OrderFilter) -> Result<Vec<Order>, DomainError> {
        Ok(self.store.list_orders(filter).await?)
    }

    /// Adds `quantity` units of a product to a pending order.
    ///
    /// Re-adding a product the order already carries merges into the
    /// existing line at its frozen unit price.
    #[tracing::instrument(skip(self))]
    pub async fn add_item(
        &self,
        order_id: OrderId,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<OrderAggregate, DomainError> {
        let product = self.store.get_product(product_id).await?;
        let tax_rate = self.tax_rate;

        let aggregate = self
            .mutate(order_id, |aggregate| {
                aggregate.add_item(&product, quantity, tax_rate)
            })
            .await?;

        metrics::counter!("order_items_added_total").increment(quantity as u64);
        Ok(aggregate)
    }

    /// Applies field changes to a pending order.
    #[tracing::instrument(skip(self))]
    pub async fn update_order(
        &self,
        order_id: OrderId,
        changes: OrderChanges,
    ) -> Result<OrderAggregate, DomainError> {
        let tax_rate = self.tax_rate;
        self.mutate(order_id, |aggregate| aggregate.update(changes, tax_rate))
            .await
    }

    /// Cancels a pending order.
    #[tracing::instrument(skip(self))]
    pub async fn cancel_order(&self, order_id: OrderId) -> Result<OrderAggregate, DomainError> {
        let aggregate = self
            .mutate(order_id, |aggregate| aggregate.cancel())
            .await?;

        metrics::counter!("orders_cancelled_total").increment(1);
        Ok(aggregate)
    }

    /// Deletes an order along with its lines and payment.
    #[tracing::instrument(skip(self))]
    pub async fn delete_order(&self, order_id: OrderId) -> Result<(), DomainError> {
        Ok(self.store.delete_order(order_id).await?)
    }

    /// Load-mutate-save with a bounded retry loop on version conflicts.
    ///
    /// Business-rule rejections abort immediately; only a conflicting
    /// concurrent write triggers a reload.
    async fn mutate<F>(&self, order_id: OrderId, mut apply: F) -> Result<OrderAggregate, DomainError>
    where
        F: FnMut(&mut OrderAggregate) -> Result<(), OrderError>,
    {
        let mut attempt = 0;
        loop {
            attempt += 1;

            let mut aggregate = self.get_order(order_id).await?;
            let loaded_version = aggregate.order().version;
            apply(&mut aggregate)?;

            let (order, items) = aggregate.into_parts();
            match self.store.save_order(&order, &items, loaded_version).await {
                Ok(saved) => return Ok(OrderAggregate::from_parts(saved, items)),
                Err(StoreError::VersionConflict { .. }) if attempt < MAX_WRITE_ATTEMPTS => {
                    tracing::debug!(%order_id, attempt, "conflicting write, reloading");
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}
