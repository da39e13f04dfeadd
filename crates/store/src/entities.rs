//! Entity records and input shapes for the POS stores.
//!
//! Records are plain data as persisted; behavior (totals, merge semantics,
//! state transitions) lives in the domain crate. `New*` shapes carry the
//! caller-supplied fields for creation; `Update*` shapes carry optional
//! fields where `None` leaves the stored value unchanged.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use common::{
    CategoryId, CustomerId, Money, OperatorId, OrderId, OrderItemId, OrderStatus, PaymentId,
    PaymentMethod, ProductId, Version,
};

/// A product category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub description: Option<String>,
}

/// Fields for creating a category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCategory {
    pub name: String,
    pub description: Option<String>,
}

/// Partial update for a category.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateCategory {
    pub name: Option<String>,
    pub description: Option<String>,
}

/// A product in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub category_id: CategoryId,
    pub name: String,
    pub description: Option<String>,

    /// Current selling price. Order items freeze their own copy at add time.
    pub price: Money,
    pub cost: Money,

    /// On-hand stock. May go negative under the permissive stock policy.
    pub stock_quantity: i32,

    pub barcode: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields for creating a product.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProduct {
    pub category_id: CategoryId,
    pub name: String,
    pub description: Option<String>,
    pub price: Money,
    pub cost: Money,
    pub stock_quantity: i32,
    pub barcode: Option<String>,
    pub is_active: bool,
}

/// Partial update for a product.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateProduct {
    pub category_id: Option<CategoryId>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Money>,
    pub cost: Option<Money>,
    pub stock_quantity: Option<i32>,
    pub barcode: Option<String>,
    pub is_active: Option<bool>,
}

/// Filter for product listings.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProductFilter {
    pub category_id: Option<CategoryId>,
}

/// A customer on file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub loyalty_points: i32,
}

/// Fields for creating a customer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCustomer {
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub loyalty_points: i32,
}

/// Partial update for a customer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateCustomer {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub loyalty_points: Option<i32>,
}

/// An order as persisted.
///
/// Totals are maintained by the domain aggregate: `total` is the sum of the
/// item line totals, `tax` is `total` at the configured rate, and
/// `grand_total` is `total + tax - discount`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub customer_id: Option<CustomerId>,
    pub operator_id: Option<OperatorId>,
    pub status: OrderStatus,
    pub total: Money,
    pub tax: Money,
    pub discount: Money,
    pub grand_total: Money,

    /// Optimistic concurrency version; bumped on every successful write.
    pub version: Version,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields for creating an order. New orders start pending with zero totals.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct NewOrder {
    pub customer_id: Option<CustomerId>,
    pub operator_id: Option<OperatorId>,
}

/// Filter for order listings.
#[derive(Debug, Clone, Copy, Default)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
    pub customer_id: Option<CustomerId>,
}

/// One product line within an order.
///
/// `unit_price` is frozen when the line is first added; merging more of the
/// same product keeps the original price and only grows the quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub quantity: i32,
    pub unit_price: Money,
    pub total: Money,
}

/// A recorded payment, linked 1:1 to its order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    pub id: PaymentId,
    pub order_id: OrderId,
    pub amount: Money,
    pub method: PaymentMethod,
    pub transaction_id: Option<String>,
    pub is_completed: bool,
    pub created_at: DateTime<Utc>,
}

/// Payment fields captured at checkout, before the store assigns id and
/// timestamp.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPayment {
    pub amount: Money,
    pub method: PaymentMethod,
    pub transaction_id: Option<String>,
    pub is_completed: bool,
}

/// Partial update for a payment.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdatePayment {
    pub transaction_id: Option<String>,
    pub is_completed: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn product_serialization_roundtrip() {
        let product = Product {
            id: ProductId::new(),
            category_id: CategoryId::new(),
            name: "Espresso".to_string(),
            description: None,
            price: Money::from_cents(350),
            cost: Money::from_cents(90),
            stock_quantity: 40,
            barcode: Some("890123".to_string()),
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let json = serde_json::to_string(&product).unwrap();
        let back: Product = serde_json::from_str(&json).unwrap();
        assert_eq!(product, back);
    }

    #[test]
    fn order_money_fields_serialize_as_cents() {
        let order = Order {
            id: OrderId::new(),
            customer_id: None,
            operator_id: None,
            status: OrderStatus::Pending,
            total: Money::from_cents(2500),
            tax: Money::from_cents(250),
            discount: Money::zero(),
            grand_total: Money::from_cents(2750),
            version: Version::first(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let value = serde_json::to_value(&order).unwrap();
        assert_eq!(value["total"], 2500);
        assert_eq!(value["grand_total"], 2750);
        assert_eq!(value["status"], "pending");
    }

    #[test]
    fn update_shapes_default_to_no_changes() {
        let update = UpdateProduct::default();
        assert!(update.name.is_none());
        assert!(update.price.is_none());
        assert!(update.is_active.is_none());
    }
}
