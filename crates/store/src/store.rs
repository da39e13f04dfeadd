use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use common::{CategoryId, CustomerId, OrderId, PaymentId, ProductId, Version};

use crate::Result;
use crate::entities::{
    Category, Customer, NewCategory, NewCustomer, NewOrder, NewPayment, NewProduct, Order,
    OrderFilter, OrderItem, Payment, Product, ProductFilter, UpdateCategory, UpdateCustomer,
    UpdatePayment, UpdateProduct,
};

/// What to do when a checkout would drive a product's stock below zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StockPolicy {
    /// Allow stock to go negative (the historical behavior).
    #[default]
    Permissive,

    /// Fail the checkout with an insufficient-stock error.
    Reject,
}

/// Storage for categories and products.
///
/// All implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn create_category(&self, new: NewCategory) -> Result<Category>;

    async fn get_category(&self, id: CategoryId) -> Result<Category>;

    async fn list_categories(&self) -> Result<Vec<Category>>;

    async fn update_category(&self, id: CategoryId, update: UpdateCategory) -> Result<Category>;

    /// Deletes a category and its products. Fails with `ProductInUse` if any
    /// of those products is referenced by an order item.
    async fn delete_category(&self, id: CategoryId) -> Result<()>;

    async fn create_product(&self, new: NewProduct) -> Result<Product>;

    async fn get_product(&self, id: ProductId) -> Result<Product>;

    async fn list_products(&self, filter: ProductFilter) -> Result<Vec<Product>>;

    async fn update_product(&self, id: ProductId, update: UpdateProduct) -> Result<Product>;

    /// Deletes a product. Fails with `ProductInUse` while any order item
    /// references it.
    async fn delete_product(&self, id: ProductId) -> Result<()>;

    /// Atomically adjusts a product's stock by `delta` (negative to
    /// decrement) and returns the updated product.
    async fn adjust_stock(&self, id: ProductId, delta: i32) -> Result<Product>;
}

/// Storage for customers.
#[async_trait]
pub trait CustomerStore: Send + Sync {
    async fn create_customer(&self, new: NewCustomer) -> Result<Customer>;

    async fn get_customer(&self, id: CustomerId) -> Result<Customer>;

    async fn list_customers(&self) -> Result<Vec<Customer>>;

    /// Case-insensitive substring match on the customer name.
    async fn search_customers(&self, query: &str) -> Result<Vec<Customer>>;

    async fn update_customer(&self, id: CustomerId, update: UpdateCustomer) -> Result<Customer>;

    /// Deletes a customer. Their orders keep existing with the customer
    /// reference cleared.
    async fn delete_customer(&self, id: CustomerId) -> Result<()>;
}

/// Storage for orders and their line items.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Creates a pending order with zero totals at version 1.
    async fn create_order(&self, new: NewOrder) -> Result<Order>;

    async fn get_order(&self, id: OrderId) -> Result<Order>;

    /// Returns the order's line items. An unknown order yields an empty list;
    /// callers that need existence checks use `get_order`.
    async fn get_order_items(&self, id: OrderId) -> Result<Vec<OrderItem>>;

    async fn list_orders(&self, filter: OrderFilter) -> Result<Vec<Order>>;

    /// Persists an order and its full item set as one atomic unit, guarded
    /// by optimistic concurrency: `expected` must equal the stored version
    /// or the write fails with `VersionConflict` and nothing changes. On
    /// success the stored version becomes `expected + 1` and the updated
    /// order is returned.
    async fn save_order(&self, order: &Order, items: &[OrderItem], expected: Version)
    -> Result<Order>;

    /// Deletes an order along with its items and payment.
    async fn delete_order(&self, id: OrderId) -> Result<()>;
}

/// Storage for payment records.
#[async_trait]
pub trait PaymentStore: Send + Sync {
    /// Records a payment for an order. At most one payment may exist per
    /// order; a second attempt fails with `DuplicatePayment`.
    async fn create_payment(&self, order_id: OrderId, new: NewPayment) -> Result<Payment>;

    async fn get_payment(&self, id: PaymentId) -> Result<Payment>;

    async fn get_payment_for_order(&self, order_id: OrderId) -> Result<Option<Payment>>;

    async fn list_payments(&self) -> Result<Vec<Payment>>;

    async fn update_payment(&self, id: PaymentId, update: UpdatePayment) -> Result<Payment>;

    async fn delete_payment(&self, id: PaymentId) -> Result<()>;
}

/// The outcome of a successful checkout commit.
#[derive(Debug, Clone)]
pub struct CheckoutOutcome {
    pub order: Order,
    pub payment: Payment,
}

/// The transactional participant for checkout.
#[async_trait]
pub trait CheckoutStore: Send + Sync {
    /// Commits a checkout as one atomic unit: re-checks that the order is
    /// still pending, marks it completed, records the payment, and
    /// decrements stock for every line item. Nothing is visible unless
    /// every step succeeds.
    ///
    /// Concurrent commits on the same order are serialized; the loser
    /// observes `OrderNotPending`. Under `StockPolicy::Reject` the stock
    /// check happens inside the same transaction, so two checkouts cannot
    /// both pass it for the same units.
    async fn commit_checkout(
        &self,
        order_id: OrderId,
        payment: NewPayment,
        policy: StockPolicy,
    ) -> Result<CheckoutOutcome>;
}

/// Umbrella over every store capability the backend wires together.
pub trait PosStore:
    CatalogStore + CustomerStore + OrderStore + PaymentStore + CheckoutStore + 'static
{
}

// Blanket implementation for any full backend
impl<T: CatalogStore + CustomerStore + OrderStore + PaymentStore + CheckoutStore + 'static> PosStore
    for T
{
}
