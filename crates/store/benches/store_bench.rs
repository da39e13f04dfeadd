use criterion::{Criterion, criterion_group, criterion_main};
use store::{
    CatalogStore, CheckoutStore, CustomerStore, InMemoryStore, Money, NewCategory, NewCustomer,
    NewOrder, NewPayment, NewProduct, OrderItem, OrderItemId, OrderStore, PaymentMethod, Product,
    StockPolicy,
};

async fn seed_product(store: &InMemoryStore, name: &str, price_cents: i64) -> Product {
    let category = store
        .create_category(NewCategory {
            name: "Bench".to_string(),
            description: None,
        })
        .await
        .unwrap();

    store
        .create_product(NewProduct {
            category_id: category.id,
            name: name.to_string(),
            description: None,
            price: Money::from_cents(price_cents),
            cost: Money::zero(),
            stock_quantity: 1_000_000,
            barcode: None,
            is_active: true,
        })
        .await
        .unwrap()
}

fn line_for(order_id: store::OrderId, product: &Product, quantity: i32) -> OrderItem {
    OrderItem {
        id: OrderItemId::new(),
        order_id,
        product_id: product.id,
        quantity,
        unit_price: product.price,
        total: product.price.multiply(quantity as i64),
    }
}

fn bench_create_order(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let store = InMemoryStore::new();

    c.bench_function("store/create_order", |b| {
        b.iter(|| {
            rt.block_on(async {
                store.create_order(NewOrder::default()).await.unwrap();
            });
        });
    });
}

fn bench_save_order_single_line(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let store = InMemoryStore::new();
    let product = rt.block_on(seed_product(&store, "Cola", 250));

    c.bench_function("store/save_order_single_line", |b| {
        b.iter(|| {
            rt.block_on(async {
                let order = store.create_order(NewOrder::default()).await.unwrap();
                let line = line_for(order.id, &product, 2);
                store
                    .save_order(&order, &[line], order.version)
                    .await
                    .unwrap();
            });
        });
    });
}

fn bench_get_order_items_20_lines(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let store = InMemoryStore::new();

    let order_id = rt.block_on(async {
        let order = store.create_order(NewOrder::default()).await.unwrap();
        let mut lines = Vec::new();
        for i in 0..20 {
            let product = seed_product(&store, &format!("Product {i}"), 100 + i).await;
            lines.push(line_for(order.id, &product, 1));
        }
        store
            .save_order(&order, &lines, order.version)
            .await
            .unwrap();
        order.id
    });

    c.bench_function("store/get_order_items_20", |b| {
        b.iter(|| {
            rt.block_on(async {
                let items = store.get_order_items(order_id).await.unwrap();
                assert_eq!(items.len(), 20);
            });
        });
    });
}

fn bench_search_customers_1000(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let store = InMemoryStore::new();

    rt.block_on(async {
        for i in 0..1000 {
            store
                .create_customer(NewCustomer {
                    name: format!("Customer {i}"),
                    phone: None,
                    email: None,
                    address: None,
                    loyalty_points: 0,
                })
                .await
                .unwrap();
        }
    });

    c.bench_function("store/search_customers_1000", |b| {
        b.iter(|| {
            rt.block_on(async {
                store.search_customers("customer 5").await.unwrap();
            });
        });
    });
}

fn bench_commit_checkout(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let store = InMemoryStore::new();
    let product = rt.block_on(seed_product(&store, "Cola", 250));

    c.bench_function("store/commit_checkout", |b| {
        b.iter(|| {
            rt.block_on(async {
                let order = store.create_order(NewOrder::default()).await.unwrap();
                let line = line_for(order.id, &product, 1);
                let order = store
                    .save_order(&order, &[line], order.version)
                    .await
                    .unwrap();

                store
                    .commit_checkout(
                        order.id,
                        NewPayment {
                            amount: order.grand_total,
                            method: PaymentMethod::Cash,
                            transaction_id: None,
                            is_completed: true,
                        },
                        StockPolicy::Permissive,
                    )
                    .await
                    .unwrap();
            });
        });
    });
}

criterion_group!(
    benches,
    bench_create_order,
    bench_save_order_single_line,
    bench_get_order_items_20_lines,
    bench_search_customers_1000,
    bench_commit_checkout,
);
criterion_main!(benches);
