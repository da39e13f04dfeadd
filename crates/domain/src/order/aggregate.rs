//! Order aggregate implementation.

use common::{CustomerId, Money, OperatorId, OrderItemId, OrderStatus, ProductId, TaxRate};
use store::{Order, OrderItem, Product};

use super::OrderError;

/// Field changes applied to a pending order.
///
/// `None` leaves the stored value unchanged. Changing the discount triggers
/// a totals recompute.
#[derive(Debug, Clone, Copy, Default)]
pub struct OrderChanges {
    pub customer_id: Option<CustomerId>,
    pub operator_id: Option<OperatorId>,
    pub discount: Option<Money>,
}

/// An order together with its item lines, and the business rules for
/// mutating them.
///
/// The aggregate is loaded from the store, mutated in memory, and written
/// back at the version it was loaded with. A concurrent writer surfaces as
/// a version conflict on save, and the caller reloads and retries.
#[derive(Debug, Clone)]
pub struct OrderAggregate {
    order: Order,
    items: Vec<OrderItem>,
}

// Query methods
impl OrderAggregate {
    /// Reassembles an aggregate from its stored parts.
    pub fn from_parts(order: Order, items: Vec<OrderItem>) -> Self {
        Self { order, items }
    }

    /// Splits the aggregate back into the shapes the store persists.
    pub fn into_parts(self) -> (Order, Vec<OrderItem>) {
        (self.order, self.items)
    }

    pub fn order(&self) -> &Order {
        &self.order
    }

    pub fn items(&self) -> &[OrderItem] {
        &self.items
    }

    /// Returns the line for a product, if the order carries one.
    pub fn item_for(&self, product_id: ProductId) -> Option<&OrderItem> {
        self.items.iter().find(|item| item.product_id == product_id)
    }

    pub fn line_count(&self) -> usize {
        self.items.len()
    }

    /// Total units across all lines.
    pub fn total_quantity(&self) -> i64 {
        self.items.iter().map(|item| i64::from(item.quantity)).sum()
    }

    pub fn has_items(&self) -> bool {
        !self.items.is_empty()
    }

    pub fn is_terminal(&self) -> bool {
        self.order.status.is_terminal()
    }
}

// Command methods
impl OrderAggregate {
    /// Adds `quantity` units of `product` to the order.
    ///
    /// If the order already carries a line for this product, the line's
    /// quantity grows and its total is recomputed from the line's original
    /// unit price; later catalog price changes never reprice an existing
    /// line. A new line freezes the product's current price.
    pub fn add_item(
        &mut self,
        product: &Product,
        quantity: i32,
        tax_rate: TaxRate,
    ) -> Result<(), OrderError> {
        if !self.order.status.can_modify_items() {
            return Err(OrderError::InvalidStateTransition {
                current_status: self.order.status,
                action: "add an item to",
            });
        }

        if quantity <= 0 {
            return Err(OrderError::InvalidQuantity { quantity });
        }

        if !product.is_active {
            return Err(OrderError::ProductInactive {
                product_id: product.id,
            });
        }

        match self
            .items
            .iter_mut()
            .find(|item| item.product_id == product.id)
        {
            Some(line) => {
                line.quantity += quantity;
                line.total = line.unit_price.multiply(i64::from(line.quantity));
            }
            None => {
                self.items.push(OrderItem {
                    id: OrderItemId::new(),
                    order_id: self.order.id,
                    product_id: product.id,
                    quantity,
                    unit_price: product.price,
                    total: product.price.multiply(i64::from(quantity)),
                });
            }
        }

        self.recompute_totals(tax_rate);
        Ok(())
    }

    /// Applies field changes to a pending order.
    pub fn update(&mut self, changes: OrderChanges, tax_rate: TaxRate) -> Result<(), OrderError> {
        if self.order.status != OrderStatus::Pending {
            return Err(OrderError::InvalidStateTransition {
                current_status: self.order.status,
                action: "update",
            });
        }

        if let Some(discount) = changes.discount
            && discount.is_negative()
        {
            return Err(OrderError::InvalidDiscount { discount });
        }

        if let Some(customer_id) = changes.customer_id {
            self.order.customer_id = Some(customer_id);
        }
        if let Some(operator_id) = changes.operator_id {
            self.order.operator_id = Some(operator_id);
        }
        if let Some(discount) = changes.discount {
            self.order.discount = discount;
            self.recompute_totals(tax_rate);
        }

        Ok(())
    }

    /// Cancels a pending order. Terminal orders cannot be cancelled.
    pub fn cancel(&mut self) -> Result<(), OrderError> {
        if !self.order.status.can_cancel() {
            return Err(OrderError::InvalidStateTransition {
                current_status: self.order.status,
                action: "cancel",
            });
        }

        self.order.status = OrderStatus::Cancelled;
        Ok(())
    }

    /// Recomputes the order's money fields from its lines.
    ///
    /// total = Σ line totals; tax = total at `tax_rate` (rounded half-up);
    /// grand_total = total + tax - discount. Pure integer arithmetic
    /// throughout.
    pub fn recompute_totals(&mut self, tax_rate: TaxRate) {
        let subtotal: Money = self.items.iter().map(|item| item.total).sum();
        self.order.total = subtotal;
        self.order.tax = subtotal.apply_rate(tax_rate);
        self.order.grand_total = subtotal + self.order.tax - self.order.discount;
    }
}
