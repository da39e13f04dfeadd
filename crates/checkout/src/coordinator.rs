//! Checkout coordinator for finalizing pending orders.

use std::time::Instant;

use common::{Money, OrderId, OrderStatus, PaymentMethod};
use store::{CheckoutStore, NewPayment, Order, OrderStore, Payment, StockPolicy, StoreError};

use crate::error::{CheckoutError, Result};

/// Payment input for a checkout attempt.
#[derive(Debug, Clone)]
pub struct CheckoutRequest {
    pub amount: Money,
    pub method: PaymentMethod,
    pub transaction_id: Option<String>,
}

/// The completed order and its payment, returned from a successful checkout.
#[derive(Debug, Clone)]
pub struct CheckoutReceipt {
    pub order: Order,
    pub payment: Payment,
}

/// Drives the atomic pending → completed transition for an order.
///
/// The coordinator validates the payment input and the order state up
/// front, then hands the status flip, the payment insert, and the stock
/// decrement to the store as a single transaction. The store re-checks the
/// pending status inside that transaction, so however many checkouts race
/// on one order, exactly one commits.
#[derive(Debug, Clone)]
pub struct CheckoutCoordinator<S> {
    store: S,
    stock_policy: StockPolicy,
}

impl<S: OrderStore + CheckoutStore> CheckoutCoordinator<S> {
    /// Creates a new coordinator with the given stock policy.
    pub fn new(store: S, stock_policy: StockPolicy) -> Self {
        Self {
            store,
            stock_policy,
        }
    }

    pub fn stock_policy(&self) -> StockPolicy {
        self.stock_policy
    }

    /// Executes checkout for the given order.
    ///
    /// The order must be pending with at least one item, and the payment
    /// amount must be positive. Returns the completed order and the created
    /// payment; on any failure the order is left untouched.
    #[tracing::instrument(skip(self))]
    pub async fn checkout(
        &self,
        order_id: OrderId,
        request: CheckoutRequest,
    ) -> Result<CheckoutReceipt> {
        metrics::counter!("checkout_attempts_total").increment(1);
        let checkout_start = Instant::now();

        // 1. Validate the payment input; nothing has been written yet.
        if request.amount <= Money::zero() {
            return Err(CheckoutError::InvalidPayment {
                reason: "amount must be positive",
            });
        }

        // 2. The order must exist, be pending, and have at least one item.
        let order = self.store.get_order(order_id).await?;
        if order.status != OrderStatus::Pending {
            return Err(CheckoutError::OrderNotPending {
                order_id,
                status: order.status,
            });
        }
        if self.store.get_order_items(order_id).await?.is_empty() {
            return Err(CheckoutError::EmptyOrder { order_id });
        }

        // 3. Flip the status, record the payment, and decrement stock in
        //    one store transaction. A concurrent winner surfaces here as
        //    OrderNotPending.
        let payment = NewPayment {
            amount: request.amount,
            method: request.method,
            transaction_id: request.transaction_id,
            is_completed: true,
        };
        let outcome = match self
            .store
            .commit_checkout(order_id, payment, self.stock_policy)
            .await
        {
            Ok(outcome) => outcome,
            Err(e) => {
                metrics::counter!("checkout_failed_total").increment(1);
                return Err(match e {
                    StoreError::OrderNotPending { order_id, status } => {
                        CheckoutError::OrderNotPending { order_id, status }
                    }
                    other => CheckoutError::Store(other),
                });
            }
        };

        let duration = checkout_start.elapsed().as_secs_f64();
        metrics::histogram!("checkout_duration_seconds").record(duration);
        metrics::counter!("checkout_completed_total").increment(1);
        tracing::info!(%order_id, duration, "checkout completed");

        Ok(CheckoutReceipt {
            order: outcome.order,
            payment: outcome.payment,
        })
    }
}
