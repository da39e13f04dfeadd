//! Integration tests for the order service.
//!
//! These tests drive full order flows through [`OrderService`] against the
//! in-memory store, including totals arithmetic, lifecycle rules, and
//! conflicting-writer handling.

use common::{CustomerId, Money, OrderStatus, ProductId, TaxRate, Version};
use domain::{DomainError, OrderChanges, OrderError, OrderService};
use store::{
    CatalogStore, Customer, CustomerStore, InMemoryStore, NewCategory, NewCustomer, NewOrder,
    NewProduct, OrderFilter, OrderStore, Product, StoreError, UpdateProduct,
};

/// Helper to create a test order service with a 10% tax rate.
fn create_service() -> OrderService<InMemoryStore> {
    OrderService::new(InMemoryStore::new(), TaxRate::from_percent(10))
}

async fn seed_product(
    service: &OrderService<InMemoryStore>,
    name: &str,
    price_cents: i64,
) -> Product {
    let category = service
        .store()
        .create_category(NewCategory {
            name: "Beverages".to_string(),
            description: None,
        })
        .await
        .unwrap();

    service
        .store()
        .create_product(NewProduct {
            category_id: category.id,
            name: name.to_string(),
            description: None,
            price: Money::from_cents(price_cents),
            cost: Money::zero(),
            stock_quantity: 100,
            barcode: None,
            is_active: true,
        })
        .await
        .unwrap()
}

async fn seed_customer(service: &OrderService<InMemoryStore>, name: &str) -> Customer {
    service
        .store()
        .create_customer(NewCustomer {
            name: name.to_string(),
            phone: None,
            email: None,
            address: None,
            loyalty_points: 0,
        })
        .await
        .unwrap()
}

mod order_lifecycle {
    use super::*;

    #[tokio::test]
    async fn complete_order_lifecycle() {
        let service = create_service();
        let customer = seed_customer(&service, "Alice Carter").await;
        let widget_a = seed_product(&service, "Widget A", 1000).await;
        let widget_b = seed_product(&service, "Widget B", 500).await;

        // Create order
        let order = service
            .create_order(NewOrder {
                customer_id: Some(customer.id),
                operator_id: None,
            })
            .await
            .unwrap();
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.version, Version::first());

        // Add items: 2 x $10.00 + 1 x $5.00
        service.add_item(order.id, widget_a.id, 2).await.unwrap();
        let aggregate = service.add_item(order.id, widget_b.id, 1).await.unwrap();

        assert_eq!(aggregate.line_count(), 2);
        assert_eq!(aggregate.order().total, Money::from_cents(2500));
        assert_eq!(aggregate.order().tax, Money::from_cents(250));
        assert_eq!(aggregate.order().grand_total, Money::from_cents(2750));
        assert_eq!(aggregate.order().version, Version::new(3));

        // Apply a $5.00 discount
        let aggregate = service
            .update_order(
                order.id,
                OrderChanges {
                    discount: Some(Money::from_cents(500)),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(aggregate.order().grand_total, Money::from_cents(2250));

        // Cancel
        let aggregate = service.cancel_order(order.id).await.unwrap();
        assert_eq!(aggregate.order().status, OrderStatus::Cancelled);
        assert!(aggregate.is_terminal());
        assert_eq!(aggregate.order().version, Version::new(5));
    }

    #[tokio::test]
    async fn deleting_an_order_removes_its_lines() {
        let service = create_service();
        let cola = seed_product(&service, "Cola", 250).await;
        let order = service.create_order(NewOrder::default()).await.unwrap();
        service.add_item(order.id, cola.id, 2).await.unwrap();

        service.delete_order(order.id).await.unwrap();

        let result = service.get_order(order.id).await;
        assert!(matches!(
            result,
            Err(DomainError::Store(StoreError::NotFound { .. }))
        ));
        let items = service.store().get_order_items(order.id).await.unwrap();
        assert!(items.is_empty());
    }

    #[tokio::test]
    async fn list_orders_by_status_and_customer() {
        let service = create_service();
        let customer = seed_customer(&service, "Bob Carson").await;

        let walk_in = service.create_order(NewOrder::default()).await.unwrap();
        service.cancel_order(walk_in.id).await.unwrap();

        let regular = service
            .create_order(NewOrder {
                customer_id: Some(customer.id),
                operator_id: None,
            })
            .await
            .unwrap();

        let pending = service
            .list_orders(OrderFilter {
                status: Some(OrderStatus::Pending),
                customer_id: None,
            })
            .await
            .unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, regular.id);

        let for_customer = service
            .list_orders(OrderFilter {
                status: None,
                customer_id: Some(customer.id),
            })
            .await
            .unwrap();
        assert_eq!(for_customer.len(), 1);
        assert_eq!(for_customer[0].id, regular.id);
    }
}

mod concurrency {
    use super::*;

    #[tokio::test]
    async fn stale_writer_conflicts_at_the_store() {
        let store = InMemoryStore::new();
        let service = OrderService::new(store.clone(), TaxRate::from_percent(10));
        let cola = seed_product(&service, "Cola", 250).await;
        let order = service.create_order(NewOrder::default()).await.unwrap();
        service.add_item(order.id, cola.id, 1).await.unwrap();

        // Simulate two writers that both loaded the same version.
        let aggregate = service.get_order(order.id).await.unwrap();
        let loaded = aggregate.order().version;
        let (order_row, items) = aggregate.into_parts();

        store.save_order(&order_row, &items, loaded).await.unwrap();
        let stale = store.save_order(&order_row, &items, loaded).await;

        match stale {
            Err(StoreError::VersionConflict { expected, actual, .. }) => {
                assert_eq!(expected, loaded);
                assert_eq!(actual, loaded.next());
            }
            other => panic!("expected version conflict, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn interleaved_service_writers_both_land() {
        let service = create_service();
        let widget_a = seed_product(&service, "Widget A", 1000).await;
        let widget_b = seed_product(&service, "Widget B", 500).await;
        let order = service.create_order(NewOrder::default()).await.unwrap();

        let left = service.clone();
        let right = service.clone();
        let order_id = order.id;
        let (first, second) = tokio::join!(
            async move { left.add_item(order_id, widget_a.id, 2).await },
            async move { right.add_item(order_id, widget_b.id, 3).await }
        );
        first.unwrap();
        second.unwrap();

        let aggregate = service.get_order(order_id).await.unwrap();
        assert_eq!(aggregate.line_count(), 2);
        assert_eq!(aggregate.total_quantity(), 5);
        // 2 x $10.00 + 3 x $5.00 = $35.00, plus 10% tax.
        assert_eq!(aggregate.order().total, Money::from_cents(3500));
        assert_eq!(aggregate.order().grand_total, Money::from_cents(3850));
    }
}

mod error_handling {
    use super::*;

    #[tokio::test]
    async fn cannot_add_item_to_cancelled_order() {
        let service = create_service();
        let cola = seed_product(&service, "Cola", 250).await;
        let order = service.create_order(NewOrder::default()).await.unwrap();
        service.cancel_order(order.id).await.unwrap();

        let result = service.add_item(order.id, cola.id, 1).await;

        assert!(matches!(
            result,
            Err(DomainError::Order(
                OrderError::InvalidStateTransition { .. }
            ))
        ));
    }

    #[tokio::test]
    async fn unknown_references_are_not_found() {
        let service = create_service();
        let order = service.create_order(NewOrder::default()).await.unwrap();

        let result = service.add_item(order.id, ProductId::new(), 1).await;
        assert!(matches!(
            result,
            Err(DomainError::Store(StoreError::NotFound { .. }))
        ));

        let result = service
            .update_order(
                order.id,
                OrderChanges {
                    customer_id: Some(CustomerId::new()),
                    ..Default::default()
                },
            )
            .await;
        assert!(matches!(
            result,
            Err(DomainError::Store(StoreError::NotFound { .. }))
        ));
    }

    #[tokio::test]
    async fn rejected_write_leaves_order_untouched() {
        let service = create_service();
        let cola = seed_product(&service, "Cola", 250).await;
        service
            .store()
            .update_product(
                cola.id,
                UpdateProduct {
                    is_active: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let order = service.create_order(NewOrder::default()).await.unwrap();

        let result = service.add_item(order.id, cola.id, 1).await;
        assert!(matches!(
            result,
            Err(DomainError::Order(OrderError::ProductInactive { .. }))
        ));

        let aggregate = service.get_order(order.id).await.unwrap();
        assert!(!aggregate.has_items());
        assert_eq!(aggregate.order().version, Version::first());
    }

    #[tokio::test]
    async fn negative_discount_is_rejected() {
        let service = create_service();
        let order = service.create_order(NewOrder::default()).await.unwrap();

        let result = service
            .update_order(
                order.id,
                OrderChanges {
                    discount: Some(Money::from_cents(-100)),
                    ..Default::default()
                },
            )
            .await;

        assert!(matches!(
            result,
            Err(DomainError::Order(OrderError::InvalidDiscount { .. }))
        ));
    }
}

mod item_management {
    use super::*;

    #[tokio::test]
    async fn merging_keeps_the_first_seen_price() {
        let service = create_service();
        let cola = seed_product(&service, "Cola", 250).await;
        let order = service.create_order(NewOrder::default()).await.unwrap();

        service.add_item(order.id, cola.id, 2).await.unwrap();
        service
            .store()
            .update_product(
                cola.id,
                UpdateProduct {
                    price: Some(Money::from_cents(400)),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let aggregate = service.add_item(order.id, cola.id, 3).await.unwrap();

        assert_eq!(aggregate.line_count(), 1);
        let line = aggregate.item_for(cola.id).unwrap();
        assert_eq!(line.quantity, 5);
        assert_eq!(line.unit_price, Money::from_cents(250));
        assert_eq!(line.total, Money::from_cents(1250));
    }

    #[tokio::test]
    async fn total_calculation_with_multiple_lines() {
        let service = create_service();
        let a = seed_product(&service, "Widget A", 1000).await;
        let b = seed_product(&service, "Widget B", 550).await;
        let c = seed_product(&service, "Widget C", 2599).await;
        let order = service.create_order(NewOrder::default()).await.unwrap();

        // 2 x $10.00 + 3 x $5.50 + 1 x $25.99 = $62.49
        service.add_item(order.id, a.id, 2).await.unwrap();
        service.add_item(order.id, b.id, 3).await.unwrap();
        let aggregate = service.add_item(order.id, c.id, 1).await.unwrap();

        assert_eq!(aggregate.total_quantity(), 6);
        assert_eq!(aggregate.order().total, Money::from_cents(6249));
        assert_eq!(aggregate.order().tax, Money::from_cents(625));
        assert_eq!(aggregate.order().grand_total, Money::from_cents(6874));
    }
}
