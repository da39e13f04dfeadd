use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use common::{CategoryId, CustomerId, Money, OrderId, OrderStatus, PaymentId, ProductId, Version};

use crate::entities::{
    Category, Customer, NewCategory, NewCustomer, NewOrder, NewPayment, NewProduct, Order,
    OrderFilter, OrderItem, Payment, Product, ProductFilter, UpdateCategory, UpdateCustomer,
    UpdatePayment, UpdateProduct,
};
use crate::error::{Result, StoreError};
use crate::store::{
    CatalogStore, CheckoutOutcome, CheckoutStore, CustomerStore, OrderStore, PaymentStore,
    StockPolicy,
};

#[derive(Default)]
struct State {
    categories: HashMap<CategoryId, Category>,
    products: HashMap<ProductId, Product>,
    customers: HashMap<CustomerId, Customer>,
    orders: HashMap<OrderId, Order>,
    order_items: HashMap<OrderId, Vec<OrderItem>>,
    payments: HashMap<PaymentId, Payment>,
}

impl State {
    fn product_in_use(&self, product_id: ProductId) -> bool {
        self.order_items
            .values()
            .flatten()
            .any(|item| item.product_id == product_id)
    }

    fn payment_for_order(&self, order_id: OrderId) -> Option<&Payment> {
        self.payments.values().find(|p| p.order_id == order_id)
    }
}

/// In-memory store implementation.
///
/// All tables live behind one writer lock, so multi-entity operations
/// (checkout, order saves) are genuinely atomic and serialized, matching
/// the transactional guarantees of the PostgreSQL implementation. Used for
/// tests and database-less local runs.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<RwLock<State>>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CatalogStore for InMemoryStore {
    async fn create_category(&self, new: NewCategory) -> Result<Category> {
        let mut state = self.state.write().await;
        let category = Category {
            id: CategoryId::new(),
            name: new.name,
            description: new.description,
        };
        state.categories.insert(category.id, category.clone());
        Ok(category)
    }

    async fn get_category(&self, id: CategoryId) -> Result<Category> {
        let state = self.state.read().await;
        state
            .categories
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound {
                entity: "category",
                id: id.as_uuid(),
            })
    }

    async fn list_categories(&self) -> Result<Vec<Category>> {
        let state = self.state.read().await;
        let mut categories: Vec<_> = state.categories.values().cloned().collect();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }

    async fn update_category(&self, id: CategoryId, update: UpdateCategory) -> Result<Category> {
        let mut state = self.state.write().await;
        let category = state
            .categories
            .get_mut(&id)
            .ok_or(StoreError::NotFound {
                entity: "category",
                id: id.as_uuid(),
            })?;
        if let Some(name) = update.name {
            category.name = name;
        }
        if let Some(description) = update.description {
            category.description = Some(description);
        }
        Ok(category.clone())
    }

    async fn delete_category(&self, id: CategoryId) -> Result<()> {
        let mut state = self.state.write().await;
        if !state.categories.contains_key(&id) {
            return Err(StoreError::NotFound {
                entity: "category",
                id: id.as_uuid(),
            });
        }

        let product_ids: Vec<ProductId> = state
            .products
            .values()
            .filter(|p| p.category_id == id)
            .map(|p| p.id)
            .collect();
        for product_id in &product_ids {
            if state.product_in_use(*product_id) {
                return Err(StoreError::ProductInUse {
                    product_id: *product_id,
                });
            }
        }

        for product_id in product_ids {
            state.products.remove(&product_id);
        }
        state.categories.remove(&id);
        Ok(())
    }

    async fn create_product(&self, new: NewProduct) -> Result<Product> {
        let mut state = self.state.write().await;
        if !state.categories.contains_key(&new.category_id) {
            return Err(StoreError::NotFound {
                entity: "category",
                id: new.category_id.as_uuid(),
            });
        }
        if let Some(ref barcode) = new.barcode
            && state
                .products
                .values()
                .any(|p| p.barcode.as_deref() == Some(barcode))
        {
            return Err(StoreError::DuplicateBarcode {
                barcode: barcode.clone(),
            });
        }

        let now = Utc::now();
        let product = Product {
            id: ProductId::new(),
            category_id: new.category_id,
            name: new.name,
            description: new.description,
            price: new.price,
            cost: new.cost,
            stock_quantity: new.stock_quantity,
            barcode: new.barcode,
            is_active: new.is_active,
            created_at: now,
            updated_at: now,
        };
        state.products.insert(product.id, product.clone());
        Ok(product)
    }

    async fn get_product(&self, id: ProductId) -> Result<Product> {
        let state = self.state.read().await;
        state
            .products
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound {
                entity: "product",
                id: id.as_uuid(),
            })
    }

    async fn list_products(&self, filter: ProductFilter) -> Result<Vec<Product>> {
        let state = self.state.read().await;
        let mut products: Vec<_> = state
            .products
            .values()
            .filter(|p| {
                filter
                    .category_id
                    .is_none_or(|category_id| p.category_id == category_id)
            })
            .cloned()
            .collect();
        products.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(products)
    }

    async fn update_product(&self, id: ProductId, update: UpdateProduct) -> Result<Product> {
        let mut state = self.state.write().await;
        if !state.products.contains_key(&id) {
            return Err(StoreError::NotFound {
                entity: "product",
                id: id.as_uuid(),
            });
        }
        if let Some(category_id) = update.category_id
            && !state.categories.contains_key(&category_id)
        {
            return Err(StoreError::NotFound {
                entity: "category",
                id: category_id.as_uuid(),
            });
        }
        if let Some(ref barcode) = update.barcode
            && state
                .products
                .values()
                .any(|p| p.id != id && p.barcode.as_deref() == Some(barcode))
        {
            return Err(StoreError::DuplicateBarcode {
                barcode: barcode.clone(),
            });
        }

        let product = state
            .products
            .get_mut(&id)
            .ok_or(StoreError::NotFound {
                entity: "product",
                id: id.as_uuid(),
            })?;
        if let Some(category_id) = update.category_id {
            product.category_id = category_id;
        }
        if let Some(name) = update.name {
            product.name = name;
        }
        if let Some(description) = update.description {
            product.description = Some(description);
        }
        if let Some(price) = update.price {
            product.price = price;
        }
        if let Some(cost) = update.cost {
            product.cost = cost;
        }
        if let Some(stock_quantity) = update.stock_quantity {
            product.stock_quantity = stock_quantity;
        }
        if let Some(barcode) = update.barcode {
            product.barcode = Some(barcode);
        }
        if let Some(is_active) = update.is_active {
            product.is_active = is_active;
        }
        product.updated_at = Utc::now();
        Ok(product.clone())
    }

    async fn delete_product(&self, id: ProductId) -> Result<()> {
        let mut state = self.state.write().await;
        if !state.products.contains_key(&id) {
            return Err(StoreError::NotFound {
                entity: "product",
                id: id.as_uuid(),
            });
        }
        if state.product_in_use(id) {
            return Err(StoreError::ProductInUse { product_id: id });
        }
        state.products.remove(&id);
        Ok(())
    }

    async fn adjust_stock(&self, id: ProductId, delta: i32) -> Result<Product> {
        let mut state = self.state.write().await;
        let product = state
            .products
            .get_mut(&id)
            .ok_or(StoreError::NotFound {
                entity: "product",
                id: id.as_uuid(),
            })?;
        product.stock_quantity += delta;
        product.updated_at = Utc::now();
        Ok(product.clone())
    }
}

#[async_trait]
impl CustomerStore for InMemoryStore {
    async fn create_customer(&self, new: NewCustomer) -> Result<Customer> {
        let mut state = self.state.write().await;
        let customer = Customer {
            id: CustomerId::new(),
            name: new.name,
            phone: new.phone,
            email: new.email,
            address: new.address,
            loyalty_points: new.loyalty_points,
        };
        state.customers.insert(customer.id, customer.clone());
        Ok(customer)
    }

    async fn get_customer(&self, id: CustomerId) -> Result<Customer> {
        let state = self.state.read().await;
        state
            .customers
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound {
                entity: "customer",
                id: id.as_uuid(),
            })
    }

    async fn list_customers(&self) -> Result<Vec<Customer>> {
        let state = self.state.read().await;
        let mut customers: Vec<_> = state.customers.values().cloned().collect();
        customers.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(customers)
    }

    async fn search_customers(&self, query: &str) -> Result<Vec<Customer>> {
        let needle = query.to_lowercase();
        let state = self.state.read().await;
        let mut customers: Vec<_> = state
            .customers
            .values()
            .filter(|c| c.name.to_lowercase().contains(&needle))
            .cloned()
            .collect();
        customers.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(customers)
    }

    async fn update_customer(&self, id: CustomerId, update: UpdateCustomer) -> Result<Customer> {
        let mut state = self.state.write().await;
        let customer = state
            .customers
            .get_mut(&id)
            .ok_or(StoreError::NotFound {
                entity: "customer",
                id: id.as_uuid(),
            })?;
        if let Some(name) = update.name {
            customer.name = name;
        }
        if let Some(phone) = update.phone {
            customer.phone = Some(phone);
        }
        if let Some(email) = update.email {
            customer.email = Some(email);
        }
        if let Some(address) = update.address {
            customer.address = Some(address);
        }
        if let Some(loyalty_points) = update.loyalty_points {
            customer.loyalty_points = loyalty_points;
        }
        Ok(customer.clone())
    }

    async fn delete_customer(&self, id: CustomerId) -> Result<()> {
        let mut state = self.state.write().await;
        if state.customers.remove(&id).is_none() {
            return Err(StoreError::NotFound {
                entity: "customer",
                id: id.as_uuid(),
            });
        }
        for order in state.orders.values_mut() {
            if order.customer_id == Some(id) {
                order.customer_id = None;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl OrderStore for InMemoryStore {
    async fn create_order(&self, new: NewOrder) -> Result<Order> {
        let mut state = self.state.write().await;
        if let Some(customer_id) = new.customer_id
            && !state.customers.contains_key(&customer_id)
        {
            return Err(StoreError::NotFound {
                entity: "customer",
                id: customer_id.as_uuid(),
            });
        }

        let now = Utc::now();
        let order = Order {
            id: OrderId::new(),
            customer_id: new.customer_id,
            operator_id: new.operator_id,
            status: OrderStatus::Pending,
            total: Money::zero(),
            tax: Money::zero(),
            discount: Money::zero(),
            grand_total: Money::zero(),
            version: Version::first(),
            created_at: now,
            updated_at: now,
        };
        state.orders.insert(order.id, order.clone());
        state.order_items.insert(order.id, Vec::new());
        Ok(order)
    }

    async fn get_order(&self, id: OrderId) -> Result<Order> {
        let state = self.state.read().await;
        state.orders.get(&id).cloned().ok_or(StoreError::NotFound {
            entity: "order",
            id: id.as_uuid(),
        })
    }

    async fn get_order_items(&self, id: OrderId) -> Result<Vec<OrderItem>> {
        let state = self.state.read().await;
        Ok(state.order_items.get(&id).cloned().unwrap_or_default())
    }

    async fn list_orders(&self, filter: OrderFilter) -> Result<Vec<Order>> {
        let state = self.state.read().await;
        let mut orders: Vec<_> = state
            .orders
            .values()
            .filter(|o| {
                filter.status.is_none_or(|status| o.status == status)
                    && filter
                        .customer_id
                        .is_none_or(|customer_id| o.customer_id == Some(customer_id))
            })
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }

    async fn save_order(
        &self,
        order: &Order,
        items: &[OrderItem],
        expected: Version,
    ) -> Result<Order> {
        let mut state = self.state.write().await;
        let current = state
            .orders
            .get(&order.id)
            .ok_or(StoreError::NotFound {
                entity: "order",
                id: order.id.as_uuid(),
            })?;
        if current.version != expected {
            return Err(StoreError::VersionConflict {
                order_id: order.id,
                expected,
                actual: current.version,
            });
        }
        if let Some(customer_id) = order.customer_id
            && !state.customers.contains_key(&customer_id)
        {
            return Err(StoreError::NotFound {
                entity: "customer",
                id: customer_id.as_uuid(),
            });
        }

        let mut stored = order.clone();
        stored.version = expected.next();
        stored.updated_at = Utc::now();
        state.orders.insert(stored.id, stored.clone());
        state.order_items.insert(stored.id, items.to_vec());
        Ok(stored)
    }

    async fn delete_order(&self, id: OrderId) -> Result<()> {
        let mut state = self.state.write().await;
        if state.orders.remove(&id).is_none() {
            return Err(StoreError::NotFound {
                entity: "order",
                id: id.as_uuid(),
            });
        }
        state.order_items.remove(&id);
        state.payments.retain(|_, p| p.order_id != id);
        Ok(())
    }
}

#[async_trait]
impl PaymentStore for InMemoryStore {
    async fn create_payment(&self, order_id: OrderId, new: NewPayment) -> Result<Payment> {
        let mut state = self.state.write().await;
        if !state.orders.contains_key(&order_id) {
            return Err(StoreError::NotFound {
                entity: "order",
                id: order_id.as_uuid(),
            });
        }
        if state.payment_for_order(order_id).is_some() {
            return Err(StoreError::DuplicatePayment { order_id });
        }

        let payment = Payment {
            id: PaymentId::new(),
            order_id,
            amount: new.amount,
            method: new.method,
            transaction_id: new.transaction_id,
            is_completed: new.is_completed,
            created_at: Utc::now(),
        };
        state.payments.insert(payment.id, payment.clone());
        Ok(payment)
    }

    async fn get_payment(&self, id: PaymentId) -> Result<Payment> {
        let state = self.state.read().await;
        state
            .payments
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound {
                entity: "payment",
                id: id.as_uuid(),
            })
    }

    async fn get_payment_for_order(&self, order_id: OrderId) -> Result<Option<Payment>> {
        let state = self.state.read().await;
        Ok(state.payment_for_order(order_id).cloned())
    }

    async fn list_payments(&self) -> Result<Vec<Payment>> {
        let state = self.state.read().await;
        let mut payments: Vec<_> = state.payments.values().cloned().collect();
        payments.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(payments)
    }

    async fn update_payment(&self, id: PaymentId, update: UpdatePayment) -> Result<Payment> {
        let mut state = self.state.write().await;
        let payment = state
            .payments
            .get_mut(&id)
            .ok_or(StoreError::NotFound {
                entity: "payment",
                id: id.as_uuid(),
            })?;
        if let Some(transaction_id) = update.transaction_id {
            payment.transaction_id = Some(transaction_id);
        }
        if let Some(is_completed) = update.is_completed {
            payment.is_completed = is_completed;
        }
        Ok(payment.clone())
    }

    async fn delete_payment(&self, id: PaymentId) -> Result<()> {
        let mut state = self.state.write().await;
        if state.payments.remove(&id).is_none() {
            return Err(StoreError::NotFound {
                entity: "payment",
                id: id.as_uuid(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl CheckoutStore for InMemoryStore {
    async fn commit_checkout(
        &self,
        order_id: OrderId,
        payment: NewPayment,
        policy: StockPolicy,
    ) -> Result<CheckoutOutcome> {
        let mut state = self.state.write().await;

        // Validate every step before mutating anything, so a failure leaves
        // no partial state behind the single writer lock.
        let status = state
            .orders
            .get(&order_id)
            .ok_or(StoreError::NotFound {
                entity: "order",
                id: order_id.as_uuid(),
            })?
            .status;
        if !status.can_complete() {
            return Err(StoreError::OrderNotPending { order_id, status });
        }
        if state.payment_for_order(order_id).is_some() {
            return Err(StoreError::DuplicatePayment { order_id });
        }

        let items = state.order_items.get(&order_id).cloned().unwrap_or_default();
        for item in &items {
            let product = state
                .products
                .get(&item.product_id)
                .ok_or(StoreError::NotFound {
                    entity: "product",
                    id: item.product_id.as_uuid(),
                })?;
            if policy == StockPolicy::Reject && product.stock_quantity < item.quantity {
                return Err(StoreError::InsufficientStock {
                    product_id: item.product_id,
                    requested: item.quantity,
                    available: product.stock_quantity,
                });
            }
        }

        let now = Utc::now();
        let Some(order) = state.orders.get_mut(&order_id) else {
            return Err(StoreError::NotFound {
                entity: "order",
                id: order_id.as_uuid(),
            });
        };
        order.status = OrderStatus::Completed;
        order.version = order.version.next();
        order.updated_at = now;
        let order = order.clone();

        let payment = Payment {
            id: PaymentId::new(),
            order_id,
            amount: payment.amount,
            method: payment.method,
            transaction_id: payment.transaction_id,
            is_completed: payment.is_completed,
            created_at: now,
        };
        state.payments.insert(payment.id, payment.clone());

        for item in &items {
            if let Some(product) = state.products.get_mut(&item.product_id) {
                product.stock_quantity -= item.quantity;
                product.updated_at = now;
            }
        }

        Ok(CheckoutOutcome { order, payment })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::{Money, OrderItemId, PaymentMethod};

    async fn seed_category(store: &InMemoryStore) -> Category {
        store
            .create_category(NewCategory {
                name: "Beverages".to_string(),
                description: None,
            })
            .await
            .unwrap()
    }

    async fn seed_product(store: &InMemoryStore, category_id: CategoryId, stock: i32) -> Product {
        store
            .create_product(NewProduct {
                category_id,
                name: "Espresso".to_string(),
                description: None,
                price: Money::from_cents(350),
                cost: Money::from_cents(90),
                stock_quantity: stock,
                barcode: None,
                is_active: true,
            })
            .await
            .unwrap()
    }

    fn item_for(order: &Order, product: &Product, quantity: i32) -> OrderItem {
        OrderItem {
            id: OrderItemId::new(),
            order_id: order.id,
            product_id: product.id,
            quantity,
            unit_price: product.price,
            total: product.price.multiply(quantity as i64),
        }
    }

    fn cash_payment(amount: Money) -> NewPayment {
        NewPayment {
            amount,
            method: PaymentMethod::Cash,
            transaction_id: None,
            is_completed: true,
        }
    }

    /// Creates a pending order holding `quantity` units of a fresh product.
    async fn seed_order_with_item(
        store: &InMemoryStore,
        stock: i32,
        quantity: i32,
    ) -> (Order, Product) {
        let category = seed_category(store).await;
        let product = seed_product(store, category.id, stock).await;
        let order = store.create_order(NewOrder::default()).await.unwrap();
        let items = vec![item_for(&order, &product, quantity)];
        let order = store
            .save_order(&order, &items, order.version)
            .await
            .unwrap();
        (order, product)
    }

    #[tokio::test]
    async fn category_crud_roundtrip() {
        let store = InMemoryStore::new();
        let category = seed_category(&store).await;

        let fetched = store.get_category(category.id).await.unwrap();
        assert_eq!(fetched.name, "Beverages");

        let updated = store
            .update_category(
                category.id,
                UpdateCategory {
                    name: Some("Drinks".to_string()),
                    description: Some("Hot and cold".to_string()),
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.name, "Drinks");
        assert_eq!(updated.description.as_deref(), Some("Hot and cold"));

        store.delete_category(category.id).await.unwrap();
        assert!(matches!(
            store.get_category(category.id).await,
            Err(StoreError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn create_product_requires_category() {
        let store = InMemoryStore::new();
        let result = store
            .create_product(NewProduct {
                category_id: CategoryId::new(),
                name: "Orphan".to_string(),
                description: None,
                price: Money::from_cents(100),
                cost: Money::from_cents(50),
                stock_quantity: 0,
                barcode: None,
                is_active: true,
            })
            .await;
        assert!(matches!(
            result,
            Err(StoreError::NotFound { entity: "category", .. })
        ));
    }

    #[tokio::test]
    async fn duplicate_barcode_rejected() {
        let store = InMemoryStore::new();
        let category = seed_category(&store).await;

        let new = NewProduct {
            category_id: category.id,
            name: "Scanned".to_string(),
            description: None,
            price: Money::from_cents(100),
            cost: Money::from_cents(50),
            stock_quantity: 0,
            barcode: Some("555".to_string()),
            is_active: true,
        };
        store.create_product(new.clone()).await.unwrap();

        let result = store.create_product(new).await;
        assert!(matches!(result, Err(StoreError::DuplicateBarcode { .. })));
    }

    #[tokio::test]
    async fn adjust_stock_applies_delta() {
        let store = InMemoryStore::new();
        let category = seed_category(&store).await;
        let product = seed_product(&store, category.id, 10).await;

        let product = store.adjust_stock(product.id, -3).await.unwrap();
        assert_eq!(product.stock_quantity, 7);

        // adjust_stock itself has no floor; negative stock is a policy matter
        let product = store.adjust_stock(product.id, -20).await.unwrap();
        assert_eq!(product.stock_quantity, -13);
    }

    #[tokio::test]
    async fn customer_search_is_case_insensitive_substring() {
        let store = InMemoryStore::new();
        for name in ["Alice Carter", "Bob Carson", "Carol Jones"] {
            store
                .create_customer(NewCustomer {
                    name: name.to_string(),
                    phone: None,
                    email: None,
                    address: None,
                    loyalty_points: 0,
                })
                .await
                .unwrap();
        }

        let hits = store.search_customers("CAR").await.unwrap();
        let names: Vec<_> = hits.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Alice Carter", "Bob Carson", "Carol Jones"]);

        let hits = store.search_customers("carso").await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "Bob Carson");
    }

    #[tokio::test]
    async fn delete_customer_clears_order_reference() {
        let store = InMemoryStore::new();
        let customer = store
            .create_customer(NewCustomer {
                name: "Dana".to_string(),
                phone: None,
                email: None,
                address: None,
                loyalty_points: 0,
            })
            .await
            .unwrap();
        let order = store
            .create_order(NewOrder {
                customer_id: Some(customer.id),
                operator_id: None,
            })
            .await
            .unwrap();

        store.delete_customer(customer.id).await.unwrap();

        let order = store.get_order(order.id).await.unwrap();
        assert_eq!(order.customer_id, None);
    }

    #[tokio::test]
    async fn create_order_starts_pending_at_version_one() {
        let store = InMemoryStore::new();
        let order = store.create_order(NewOrder::default()).await.unwrap();

        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.version, Version::first());
        assert!(order.total.is_zero());
        assert!(order.grand_total.is_zero());
    }

    #[tokio::test]
    async fn save_order_bumps_version() {
        let store = InMemoryStore::new();
        let order = store.create_order(NewOrder::default()).await.unwrap();

        let saved = store.save_order(&order, &[], order.version).await.unwrap();
        assert_eq!(saved.version, Version::new(2));

        let saved = store.save_order(&saved, &[], saved.version).await.unwrap();
        assert_eq!(saved.version, Version::new(3));
    }

    #[tokio::test]
    async fn save_order_detects_version_conflict() {
        let store = InMemoryStore::new();
        let order = store.create_order(NewOrder::default()).await.unwrap();

        // First writer wins
        store.save_order(&order, &[], order.version).await.unwrap();

        // Second writer still holds version 1
        let result = store.save_order(&order, &[], order.version).await;
        assert!(matches!(
            result,
            Err(StoreError::VersionConflict { .. })
        ));
    }

    #[tokio::test]
    async fn save_order_replaces_item_set() {
        let store = InMemoryStore::new();
        let category = seed_category(&store).await;
        let product_a = seed_product(&store, category.id, 10).await;
        let product_b = store
            .create_product(NewProduct {
                category_id: category.id,
                name: "Muffin".to_string(),
                description: None,
                price: Money::from_cents(500),
                cost: Money::from_cents(150),
                stock_quantity: 10,
                barcode: None,
                is_active: true,
            })
            .await
            .unwrap();

        let order = store.create_order(NewOrder::default()).await.unwrap();
        let both = vec![
            item_for(&order, &product_a, 1),
            item_for(&order, &product_b, 2),
        ];
        let order = store.save_order(&order, &both, order.version).await.unwrap();
        assert_eq!(store.get_order_items(order.id).await.unwrap().len(), 2);

        // Drop the second line entirely
        let only_a = vec![item_for(&order, &product_a, 1)];
        store
            .save_order(&order, &only_a, order.version)
            .await
            .unwrap();
        let items = store.get_order_items(order.id).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].product_id, product_a.id);
    }

    #[tokio::test]
    async fn delete_order_cascades_items_and_payment() {
        let store = InMemoryStore::new();
        let (order, _product) = seed_order_with_item(&store, 10, 2).await;
        store
            .create_payment(order.id, cash_payment(Money::from_cents(700)))
            .await
            .unwrap();

        store.delete_order(order.id).await.unwrap();

        assert!(store.get_order_items(order.id).await.unwrap().is_empty());
        assert!(store.get_payment_for_order(order.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn second_payment_rejected() {
        let store = InMemoryStore::new();
        let order = store.create_order(NewOrder::default()).await.unwrap();

        store
            .create_payment(order.id, cash_payment(Money::from_cents(1000)))
            .await
            .unwrap();
        let result = store
            .create_payment(order.id, cash_payment(Money::from_cents(1000)))
            .await;
        assert!(matches!(result, Err(StoreError::DuplicatePayment { .. })));
    }

    #[tokio::test]
    async fn commit_checkout_completes_order_and_decrements_stock() {
        let store = InMemoryStore::new();
        let (order, product) = seed_order_with_item(&store, 10, 3).await;

        let outcome = store
            .commit_checkout(
                order.id,
                cash_payment(Money::from_cents(1050)),
                StockPolicy::Permissive,
            )
            .await
            .unwrap();

        assert_eq!(outcome.order.status, OrderStatus::Completed);
        assert_eq!(outcome.payment.amount, Money::from_cents(1050));
        assert!(outcome.payment.is_completed);

        let product = store.get_product(product.id).await.unwrap();
        assert_eq!(product.stock_quantity, 7);
    }

    #[tokio::test]
    async fn commit_checkout_rejects_non_pending_order() {
        let store = InMemoryStore::new();
        let (order, product) = seed_order_with_item(&store, 10, 3).await;

        store
            .commit_checkout(
                order.id,
                cash_payment(Money::from_cents(1050)),
                StockPolicy::Permissive,
            )
            .await
            .unwrap();

        // Second run must fail and not touch stock again
        let result = store
            .commit_checkout(
                order.id,
                cash_payment(Money::from_cents(1050)),
                StockPolicy::Permissive,
            )
            .await;
        assert!(matches!(
            result,
            Err(StoreError::OrderNotPending { .. })
        ));

        let product = store.get_product(product.id).await.unwrap();
        assert_eq!(product.stock_quantity, 7);
    }

    #[tokio::test]
    async fn commit_checkout_insufficient_stock_under_reject_policy() {
        let store = InMemoryStore::new();
        let (order, product) = seed_order_with_item(&store, 2, 3).await;

        let result = store
            .commit_checkout(
                order.id,
                cash_payment(Money::from_cents(1050)),
                StockPolicy::Reject,
            )
            .await;
        assert!(matches!(
            result,
            Err(StoreError::InsufficientStock {
                requested: 3,
                available: 2,
                ..
            })
        ));

        // Nothing committed
        let order = store.get_order(order.id).await.unwrap();
        assert_eq!(order.status, OrderStatus::Pending);
        assert!(store.get_payment_for_order(order.id).await.unwrap().is_none());
        let product = store.get_product(product.id).await.unwrap();
        assert_eq!(product.stock_quantity, 2);
    }

    #[tokio::test]
    async fn commit_checkout_permissive_allows_negative_stock() {
        let store = InMemoryStore::new();
        let (order, product) = seed_order_with_item(&store, 2, 3).await;

        store
            .commit_checkout(
                order.id,
                cash_payment(Money::from_cents(1050)),
                StockPolicy::Permissive,
            )
            .await
            .unwrap();

        let product = store.get_product(product.id).await.unwrap();
        assert_eq!(product.stock_quantity, -1);
    }

    #[tokio::test]
    async fn commit_checkout_with_existing_payment_leaves_order_pending() {
        let store = InMemoryStore::new();
        let (order, product) = seed_order_with_item(&store, 10, 3).await;
        store
            .create_payment(order.id, cash_payment(Money::from_cents(1)))
            .await
            .unwrap();

        let result = store
            .commit_checkout(
                order.id,
                cash_payment(Money::from_cents(1050)),
                StockPolicy::Permissive,
            )
            .await;
        assert!(matches!(result, Err(StoreError::DuplicatePayment { .. })));

        let order = store.get_order(order.id).await.unwrap();
        assert_eq!(order.status, OrderStatus::Pending);
        let product = store.get_product(product.id).await.unwrap();
        assert_eq!(product.stock_quantity, 10);
    }

    #[tokio::test]
    async fn delete_product_in_use_rejected() {
        let store = InMemoryStore::new();
        let (_order, product) = seed_order_with_item(&store, 10, 1).await;

        let result = store.delete_product(product.id).await;
        assert!(matches!(result, Err(StoreError::ProductInUse { .. })));
    }

    #[tokio::test]
    async fn delete_category_cascades_products() {
        let store = InMemoryStore::new();
        let category = seed_category(&store).await;
        let product = seed_product(&store, category.id, 5).await;

        store.delete_category(category.id).await.unwrap();

        assert!(matches!(
            store.get_product(product.id).await,
            Err(StoreError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn delete_category_blocked_by_product_in_use() {
        let store = InMemoryStore::new();
        let (order, product) = seed_order_with_item(&store, 10, 1).await;
        let category_id = store.get_product(product.id).await.unwrap().category_id;

        let result = store.delete_category(category_id).await;
        assert!(matches!(result, Err(StoreError::ProductInUse { .. })));

        // Order delete releases the reference
        store.delete_order(order.id).await.unwrap();
        store.delete_category(category_id).await.unwrap();
    }
}
