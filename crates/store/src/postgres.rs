use async_trait::async_trait;
use chrono::Utc;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use uuid::Uuid;

use common::{
    CategoryId, CustomerId, Money, OperatorId, OrderId, OrderItemId, OrderStatus, PaymentId,
    PaymentMethod, ProductId, Version,
};

use crate::{
    Result, StoreError,
    entities::{
        Category, Customer, NewCategory, NewCustomer, NewOrder, NewPayment, NewProduct,
        Order, OrderFilter, OrderItem, Payment, Product, ProductFilter, UpdateCategory,
        UpdateCustomer, UpdatePayment, UpdateProduct,
    },
    store::{
        CatalogStore, CheckoutOutcome, CheckoutStore, CustomerStore, OrderStore, PaymentStore,
        StockPolicy,
    },
};

/// PostgreSQL-backed store.
///
/// All multi-row writes run inside a transaction. Order writes use the
/// `version` column for optimistic concurrency; checkout serializes on a
/// conditional `UPDATE ... WHERE status = 'pending'` so that exactly one of
/// any number of concurrent checkouts can complete an order.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a new PostgreSQL store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects to the database and returns a store over a fresh pool.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;
        Ok(Self::new(pool))
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        tracing::info!("running database migrations");
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }

    fn constraint_of(error: &sqlx::Error) -> Option<&str> {
        if let sqlx::Error::Database(db_err) = error {
            db_err.constraint()
        } else {
            None
        }
    }

    fn decode_status(raw: &str) -> Result<OrderStatus> {
        OrderStatus::parse(raw).ok_or_else(|| {
            StoreError::Database(sqlx::Error::Decode(
                format!("unknown order status: {raw}").into(),
            ))
        })
    }

    fn decode_method(raw: &str) -> Result<PaymentMethod> {
        PaymentMethod::parse(raw).ok_or_else(|| {
            StoreError::Database(sqlx::Error::Decode(
                format!("unknown payment method: {raw}").into(),
            ))
        })
    }

    fn row_to_category(row: PgRow) -> Result<Category> {
        Ok(Category {
            id: CategoryId::from_uuid(row.try_get::<Uuid, _>("id")?),
            name: row.try_get("name")?,
            description: row.try_get("description")?,
        })
    }

    fn row_to_product(row: PgRow) -> Result<Product> {
        Ok(Product {
            id: ProductId::from_uuid(row.try_get::<Uuid, _>("id")?),
            category_id: CategoryId::from_uuid(row.try_get::<Uuid, _>("category_id")?),
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            price: Money::from_cents(row.try_get("price_cents")?),
            cost: Money::from_cents(row.try_get("cost_cents")?),
            stock_quantity: row.try_get("stock_quantity")?,
            barcode: row.try_get("barcode")?,
            is_active: row.try_get("is_active")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn row_to_customer(row: PgRow) -> Result<Customer> {
        Ok(Customer {
            id: CustomerId::from_uuid(row.try_get::<Uuid, _>("id")?),
            name: row.try_get("name")?,
            phone: row.try_get("phone")?,
            email: row.try_get("email")?,
            address: row.try_get("address")?,
            loyalty_points: row.try_get("loyalty_points")?,
        })
    }

    fn row_to_order(row: PgRow) -> Result<Order> {
        let raw_status: String = row.try_get("status")?;
        Ok(Order {
            id: OrderId::from_uuid(row.try_get::<Uuid, _>("id")?),
            customer_id: row
                .try_get::<Option<Uuid>, _>("customer_id")?
                .map(CustomerId::from_uuid),
            operator_id: row
                .try_get::<Option<Uuid>, _>("operator_id")?
                .map(OperatorId::from_uuid),
            status: Self::decode_status(&raw_status)?,
            total: Money::from_cents(row.try_get("total_cents")?),
            tax: Money::from_cents(row.try_get("tax_cents")?),
            discount: Money::from_cents(row.try_get("discount_cents")?),
            grand_total: Money::from_cents(row.try_get("grand_total_cents")?),
            version: Version::new(row.try_get("version")?),
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn row_to_order_item(row: PgRow) -> Result<OrderItem> {
        Ok(OrderItem {
            id: OrderItemId::from_uuid(row.try_get::<Uuid, _>("id")?),
            order_id: OrderId::from_uuid(row.try_get::<Uuid, _>("order_id")?),
            product_id: ProductId::from_uuid(row.try_get::<Uuid, _>("product_id")?),
            quantity: row.try_get("quantity")?,
            unit_price: Money::from_cents(row.try_get("unit_price_cents")?),
            total: Money::from_cents(row.try_get("total_cents")?),
        })
    }

    fn row_to_payment(row: PgRow) -> Result<Payment> {
        let raw_method: String = row.try_get("method")?;
        Ok(Payment {
            id: PaymentId::from_uuid(row.try_get::<Uuid, _>("id")?),
            order_id: OrderId::from_uuid(row.try_get::<Uuid, _>("order_id")?),
            amount: Money::from_cents(row.try_get("amount_cents")?),
            method: Self::decode_method(&raw_method)?,
            transaction_id: row.try_get("transaction_id")?,
            is_completed: row.try_get("is_completed")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

const ORDER_COLUMNS: &str = "id, customer_id, operator_id, status, total_cents, tax_cents, \
     discount_cents, grand_total_cents, version, created_at, updated_at";

const PRODUCT_COLUMNS: &str = "id, category_id, name, description, price_cents, cost_cents, \
     stock_quantity, barcode, is_active, created_at, updated_at";

const CUSTOMER_COLUMNS: &str = "id, name, phone, email, address, loyalty_points";

const PAYMENT_COLUMNS: &str =
    "id, order_id, amount_cents, method, transaction_id, is_completed, created_at";

#[async_trait]
impl CatalogStore for PostgresStore {
    async fn create_category(&self, new: NewCategory) -> Result<Category> {
        let category = Category {
            id: CategoryId::new(),
            name: new.name,
            description: new.description,
        };

        sqlx::query(r#"INSERT INTO categories (id, name, description) VALUES ($1, $2, $3)"#)
            .bind(category.id.as_uuid())
            .bind(&category.name)
            .bind(&category.description)
            .execute(&self.pool)
            .await?;

        Ok(category)
    }

    async fn get_category(&self, id: CategoryId) -> Result<Category> {
        let row = sqlx::query(r#"SELECT id, name, description FROM categories WHERE id = $1"#)
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Self::row_to_category(row),
            None => Err(StoreError::NotFound {
                entity: "category",
                id: id.as_uuid(),
            }),
        }
    }

    async fn list_categories(&self) -> Result<Vec<Category>> {
        let rows =
            sqlx::query(r#"SELECT id, name, description FROM categories ORDER BY name ASC"#)
                .fetch_all(&self.pool)
                .await?;

        rows.into_iter().map(Self::row_to_category).collect()
    }

    async fn update_category(&self, id: CategoryId, update: UpdateCategory) -> Result<Category> {
        let row = sqlx::query(
            r#"
            UPDATE categories
            SET name = COALESCE($2, name),
                description = COALESCE($3, description)
            WHERE id = $1
            RETURNING id, name, description
            "#,
        )
        .bind(id.as_uuid())
        .bind(update.name)
        .bind(update.description)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Self::row_to_category(row),
            None => Err(StoreError::NotFound {
                entity: "category",
                id: id.as_uuid(),
            }),
        }
    }

    async fn delete_category(&self, id: CategoryId) -> Result<()> {
        // Deleting a category cascades to its products, so a product that
        // still appears on an order line must block the whole delete.
        let referenced: Option<Uuid> = sqlx::query_scalar(
            r#"
            SELECT i.product_id FROM order_items i
            JOIN products p ON p.id = i.product_id
            WHERE p.category_id = $1
            LIMIT 1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        if let Some(product_id) = referenced {
            return Err(StoreError::ProductInUse {
                product_id: ProductId::from_uuid(product_id),
            });
        }

        let result = sqlx::query(r#"DELETE FROM categories WHERE id = $1"#)
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound {
                entity: "category",
                id: id.as_uuid(),
            });
        }
        Ok(())
    }

    async fn create_product(&self, new: NewProduct) -> Result<Product> {
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

        sqlx::query(
            r#"
            INSERT INTO products (id, category_id, name, description, price_cents, cost_cents,
                                  stock_quantity, barcode, is_active, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(product.id.as_uuid())
        .bind(product.category_id.as_uuid())
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price.cents())
        .bind(product.cost.cents())
        .bind(product.stock_quantity)
        .bind(&product.barcode)
        .bind(product.is_active)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match Self::constraint_of(&e) {
            Some("products_barcode_key") => StoreError::DuplicateBarcode {
                barcode: product.barcode.clone().unwrap_or_default(),
            },
            Some("products_category_id_fkey") => StoreError::NotFound {
                entity: "category",
                id: product.category_id.as_uuid(),
            },
            _ => StoreError::Database(e),
        })?;

        Ok(product)
    }

    async fn get_product(&self, id: ProductId) -> Result<Product> {
        let row = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Self::row_to_product(row),
            None => Err(StoreError::NotFound {
                entity: "product",
                id: id.as_uuid(),
            }),
        }
    }

    async fn list_products(&self, filter: ProductFilter) -> Result<Vec<Product>> {
        let rows = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products \
             WHERE $1::uuid IS NULL OR category_id = $1 \
             ORDER BY name ASC"
        ))
        .bind(filter.category_id.map(|c| c.as_uuid()))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_product).collect()
    }

    async fn update_product(&self, id: ProductId, update: UpdateProduct) -> Result<Product> {
        let row = sqlx::query(&format!(
            "UPDATE products \
             SET category_id = COALESCE($2, category_id), \
                 name = COALESCE($3, name), \
                 description = COALESCE($4, description), \
                 price_cents = COALESCE($5, price_cents), \
                 cost_cents = COALESCE($6, cost_cents), \
                 stock_quantity = COALESCE($7, stock_quantity), \
                 barcode = COALESCE($8, barcode), \
                 is_active = COALESCE($9, is_active), \
                 updated_at = $10 \
             WHERE id = $1 \
             RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(id.as_uuid())
        .bind(update.category_id.map(|c| c.as_uuid()))
        .bind(&update.name)
        .bind(&update.description)
        .bind(update.price.map(|p| p.cents()))
        .bind(update.cost.map(|c| c.cents()))
        .bind(update.stock_quantity)
        .bind(&update.barcode)
        .bind(update.is_active)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| match Self::constraint_of(&e) {
            Some("products_barcode_key") => StoreError::DuplicateBarcode {
                barcode: update.barcode.clone().unwrap_or_default(),
            },
            Some("products_category_id_fkey") => StoreError::NotFound {
                entity: "category",
                id: update.category_id.map(|c| c.as_uuid()).unwrap_or_default(),
            },
            _ => StoreError::Database(e),
        })?;

        match row {
            Some(row) => Self::row_to_product(row),
            None => Err(StoreError::NotFound {
                entity: "product",
                id: id.as_uuid(),
            }),
        }
    }

    async fn delete_product(&self, id: ProductId) -> Result<()> {
        let result = sqlx::query(r#"DELETE FROM products WHERE id = $1"#)
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| match Self::constraint_of(&e) {
                Some("order_items_product_id_fkey") => StoreError::ProductInUse { product_id: id },
                _ => StoreError::Database(e),
            })?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound {
                entity: "product",
                id: id.as_uuid(),
            });
        }
        Ok(())
    }

    async fn adjust_stock(&self, id: ProductId, delta: i32) -> Result<Product> {
        let row = sqlx::query(&format!(
            "UPDATE products \
             SET stock_quantity = stock_quantity + $2, updated_at = $3 \
             WHERE id = $1 \
             RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(id.as_uuid())
        .bind(delta)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Self::row_to_product(row),
            None => Err(StoreError::NotFound {
                entity: "product",
                id: id.as_uuid(),
            }),
        }
    }
}

#[async_trait]
impl CustomerStore for PostgresStore {
    async fn create_customer(&self, new: NewCustomer) -> Result<Customer> {
        let customer = Customer {
            id: CustomerId::new(),
            name: new.name,
            phone: new.phone,
            email: new.email,
            address: new.address,
            loyalty_points: new.loyalty_points,
        };

        sqlx::query(
            r#"
            INSERT INTO customers (id, name, phone, email, address, loyalty_points)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(customer.id.as_uuid())
        .bind(&customer.name)
        .bind(&customer.phone)
        .bind(&customer.email)
        .bind(&customer.address)
        .bind(customer.loyalty_points)
        .execute(&self.pool)
        .await?;

        Ok(customer)
    }

    async fn get_customer(&self, id: CustomerId) -> Result<Customer> {
        let row = sqlx::query(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers WHERE id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Self::row_to_customer(row),
            None => Err(StoreError::NotFound {
                entity: "customer",
                id: id.as_uuid(),
            }),
        }
    }

    async fn list_customers(&self) -> Result<Vec<Customer>> {
        let rows = sqlx::query(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers ORDER BY name ASC"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_customer).collect()
    }

    async fn search_customers(&self, query: &str) -> Result<Vec<Customer>> {
        let rows = sqlx::query(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers \
             WHERE name ILIKE '%' || $1 || '%' \
             ORDER BY name ASC"
        ))
        .bind(query)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_customer).collect()
    }

    async fn update_customer(&self, id: CustomerId, update: UpdateCustomer) -> Result<Customer> {
        let row = sqlx::query(&format!(
            "UPDATE customers \
             SET name = COALESCE($2, name), \
                 phone = COALESCE($3, phone), \
                 email = COALESCE($4, email), \
                 address = COALESCE($5, address), \
                 loyalty_points = COALESCE($6, loyalty_points) \
             WHERE id = $1 \
             RETURNING {CUSTOMER_COLUMNS}"
        ))
        .bind(id.as_uuid())
        .bind(update.name)
        .bind(update.phone)
        .bind(update.email)
        .bind(update.address)
        .bind(update.loyalty_points)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Self::row_to_customer(row),
            None => Err(StoreError::NotFound {
                entity: "customer",
                id: id.as_uuid(),
            }),
        }
    }

    async fn delete_customer(&self, id: CustomerId) -> Result<()> {
        let result = sqlx::query(r#"DELETE FROM customers WHERE id = $1"#)
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound {
                entity: "customer",
                id: id.as_uuid(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl OrderStore for PostgresStore {
    async fn create_order(&self, new: NewOrder) -> Result<Order> {
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

        sqlx::query(
            r#"
            INSERT INTO orders (id, customer_id, operator_id, status, total_cents, tax_cents,
                                discount_cents, grand_total_cents, version, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(order.id.as_uuid())
        .bind(order.customer_id.map(|c| c.as_uuid()))
        .bind(order.operator_id.map(|o| o.as_uuid()))
        .bind(order.status.as_str())
        .bind(order.total.cents())
        .bind(order.tax.cents())
        .bind(order.discount.cents())
        .bind(order.grand_total.cents())
        .bind(order.version.as_i64())
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match Self::constraint_of(&e) {
            Some("orders_customer_id_fkey") => StoreError::NotFound {
                entity: "customer",
                id: order.customer_id.map(|c| c.as_uuid()).unwrap_or_default(),
            },
            _ => StoreError::Database(e),
        })?;

        Ok(order)
    }

    async fn get_order(&self, id: OrderId) -> Result<Order> {
        let row = sqlx::query(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Self::row_to_order(row),
            None => Err(StoreError::NotFound {
                entity: "order",
                id: id.as_uuid(),
            }),
        }
    }

    async fn get_order_items(&self, id: OrderId) -> Result<Vec<OrderItem>> {
        let rows = sqlx::query(
            r#"
            SELECT id, order_id, product_id, quantity, unit_price_cents, total_cents
            FROM order_items
            WHERE order_id = $1
            ORDER BY product_id ASC
            "#,
        )
        .bind(id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_order_item).collect()
    }

    async fn list_orders(&self, filter: OrderFilter) -> Result<Vec<Order>> {
        let rows = sqlx::query(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders \
             WHERE ($1::uuid IS NULL OR customer_id = $1) \
               AND ($2::text IS NULL OR status = $2) \
             ORDER BY created_at DESC"
        ))
        .bind(filter.customer_id.map(|c| c.as_uuid()))
        .bind(filter.status.map(|s| s.as_str()))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_order).collect()
    }

    async fn save_order(
        &self,
        order: &Order,
        items: &[OrderItem],
        expected: Version,
    ) -> Result<Order> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(&format!(
            "UPDATE orders \
             SET customer_id = $2, operator_id = $3, status = $4, total_cents = $5, \
                 tax_cents = $6, discount_cents = $7, grand_total_cents = $8, \
                 version = $9, updated_at = $10 \
             WHERE id = $1 AND version = $11 \
             RETURNING {ORDER_COLUMNS}"
        ))
        .bind(order.id.as_uuid())
        .bind(order.customer_id.map(|c| c.as_uuid()))
        .bind(order.operator_id.map(|o| o.as_uuid()))
        .bind(order.status.as_str())
        .bind(order.total.cents())
        .bind(order.tax.cents())
        .bind(order.discount.cents())
        .bind(order.grand_total.cents())
        .bind(expected.next().as_i64())
        .bind(Utc::now())
        .bind(expected.as_i64())
        .fetch_optional(&mut *tx)
        .await?;

        let Some(order_row) = updated else {
            let actual: Option<i64> =
                sqlx::query_scalar(r#"SELECT version FROM orders WHERE id = $1"#)
                    .bind(order.id.as_uuid())
                    .fetch_optional(&mut *tx)
                    .await?;

            return Err(match actual {
                Some(actual) => StoreError::VersionConflict {
                    order_id: order.id,
                    expected,
                    actual: Version::new(actual),
                },
                None => StoreError::NotFound {
                    entity: "order",
                    id: order.id.as_uuid(),
                },
            });
        };

        // Replace the line set: drop rows for products no longer present,
        // then upsert the rest keyed on (order_id, product_id).
        let kept: Vec<Uuid> = items.iter().map(|i| i.product_id.as_uuid()).collect();
        sqlx::query(r#"DELETE FROM order_items WHERE order_id = $1 AND product_id != ALL($2)"#)
            .bind(order.id.as_uuid())
            .bind(&kept)
            .execute(&mut *tx)
            .await?;

        for item in items {
            sqlx::query(
                r#"
                INSERT INTO order_items (id, order_id, product_id, quantity, unit_price_cents, total_cents)
                VALUES ($1, $2, $3, $4, $5, $6)
                ON CONFLICT (order_id, product_id)
                DO UPDATE SET quantity = EXCLUDED.quantity,
                              unit_price_cents = EXCLUDED.unit_price_cents,
                              total_cents = EXCLUDED.total_cents
                "#,
            )
            .bind(item.id.as_uuid())
            .bind(order.id.as_uuid())
            .bind(item.product_id.as_uuid())
            .bind(item.quantity)
            .bind(item.unit_price.cents())
            .bind(item.total.cents())
            .execute(&mut *tx)
            .await
            .map_err(|e| match Self::constraint_of(&e) {
                Some("order_items_product_id_fkey") => StoreError::NotFound {
                    entity: "product",
                    id: item.product_id.as_uuid(),
                },
                _ => StoreError::Database(e),
            })?;
        }

        tx.commit().await?;
        Self::row_to_order(order_row)
    }

    async fn delete_order(&self, id: OrderId) -> Result<()> {
        let result = sqlx::query(r#"DELETE FROM orders WHERE id = $1"#)
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound {
                entity: "order",
                id: id.as_uuid(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl PaymentStore for PostgresStore {
    async fn create_payment(&self, order_id: OrderId, new: NewPayment) -> Result<Payment> {
        let payment = Payment {
            id: PaymentId::new(),
            order_id,
            amount: new.amount,
            method: new.method,
            transaction_id: new.transaction_id,
            is_completed: new.is_completed,
            created_at: Utc::now(),
        };

        sqlx::query(
            r#"
            INSERT INTO payments (id, order_id, amount_cents, method, transaction_id, is_completed, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(payment.id.as_uuid())
        .bind(payment.order_id.as_uuid())
        .bind(payment.amount.cents())
        .bind(payment.method.as_str())
        .bind(&payment.transaction_id)
        .bind(payment.is_completed)
        .bind(payment.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match Self::constraint_of(&e) {
            Some("payments_order_id_key") => StoreError::DuplicatePayment { order_id },
            Some("payments_order_id_fkey") => StoreError::NotFound {
                entity: "order",
                id: order_id.as_uuid(),
            },
            _ => StoreError::Database(e),
        })?;

        Ok(payment)
    }

    async fn get_payment(&self, id: PaymentId) -> Result<Payment> {
        let row = sqlx::query(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments WHERE id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Self::row_to_payment(row),
            None => Err(StoreError::NotFound {
                entity: "payment",
                id: id.as_uuid(),
            }),
        }
    }

    async fn get_payment_for_order(&self, order_id: OrderId) -> Result<Option<Payment>> {
        let row = sqlx::query(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments WHERE order_id = $1"
        ))
        .bind(order_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_payment).transpose()
    }

    async fn list_payments(&self) -> Result<Vec<Payment>> {
        let rows = sqlx::query(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_payment).collect()
    }

    async fn update_payment(&self, id: PaymentId, update: UpdatePayment) -> Result<Payment> {
        let row = sqlx::query(&format!(
            "UPDATE payments \
             SET transaction_id = COALESCE($2, transaction_id), \
                 is_completed = COALESCE($3, is_completed) \
             WHERE id = $1 \
             RETURNING {PAYMENT_COLUMNS}"
        ))
        .bind(id.as_uuid())
        .bind(update.transaction_id)
        .bind(update.is_completed)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Self::row_to_payment(row),
            None => Err(StoreError::NotFound {
                entity: "payment",
                id: id.as_uuid(),
            }),
        }
    }

    async fn delete_payment(&self, id: PaymentId) -> Result<()> {
        let result = sqlx::query(r#"DELETE FROM payments WHERE id = $1"#)
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound {
                entity: "payment",
                id: id.as_uuid(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl CheckoutStore for PostgresStore {
    async fn commit_checkout(
        &self,
        order_id: OrderId,
        payment: NewPayment,
        policy: StockPolicy,
    ) -> Result<CheckoutOutcome> {
        let mut tx = self.pool.begin().await?;
        let now = Utc::now();

        // The conditional update is the serialization point: of any number
        // of concurrent checkouts for one order, exactly one sees 'pending'.
        let updated = sqlx::query(&format!(
            "UPDATE orders \
             SET status = 'completed', version = version + 1, updated_at = $2 \
             WHERE id = $1 AND status = 'pending' \
             RETURNING {ORDER_COLUMNS}"
        ))
        .bind(order_id.as_uuid())
        .bind(now)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(order_row) = updated else {
            let raw: Option<String> =
                sqlx::query_scalar(r#"SELECT status FROM orders WHERE id = $1"#)
                    .bind(order_id.as_uuid())
                    .fetch_optional(&mut *tx)
                    .await?;

            return match raw {
                Some(raw) => {
                    let status = Self::decode_status(&raw)?;
                    Err(StoreError::OrderNotPending { order_id, status })
                }
                None => Err(StoreError::NotFound {
                    entity: "order",
                    id: order_id.as_uuid(),
                }),
            };
        };

        if policy == StockPolicy::Reject {
            // Lock the product rows in a stable order, then verify every
            // line can be covered before anything is decremented.
            let lines = sqlx::query(
                r#"
                SELECT p.id AS product_id, p.stock_quantity, i.quantity
                FROM order_items i
                JOIN products p ON p.id = i.product_id
                WHERE i.order_id = $1
                ORDER BY p.id
                FOR UPDATE OF p
                "#,
            )
            .bind(order_id.as_uuid())
            .fetch_all(&mut *tx)
            .await?;

            for line in lines {
                let available: i32 = line.try_get("stock_quantity")?;
                let requested: i32 = line.try_get("quantity")?;
                if available < requested {
                    let product_id: Uuid = line.try_get("product_id")?;
                    return Err(StoreError::InsufficientStock {
                        product_id: ProductId::from_uuid(product_id),
                        requested,
                        available,
                    });
                }
            }
        }

        let payment = Payment {
            id: PaymentId::new(),
            order_id,
            amount: payment.amount,
            method: payment.method,
            transaction_id: payment.transaction_id,
            is_completed: payment.is_completed,
            created_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO payments (id, order_id, amount_cents, method, transaction_id, is_completed, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(payment.id.as_uuid())
        .bind(payment.order_id.as_uuid())
        .bind(payment.amount.cents())
        .bind(payment.method.as_str())
        .bind(&payment.transaction_id)
        .bind(payment.is_completed)
        .bind(payment.created_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| match Self::constraint_of(&e) {
            Some("payments_order_id_key") => StoreError::DuplicatePayment { order_id },
            _ => StoreError::Database(e),
        })?;

        sqlx::query(
            r#"
            UPDATE products p
            SET stock_quantity = p.stock_quantity - i.quantity, updated_at = $2
            FROM order_items i
            WHERE i.order_id = $1 AND p.id = i.product_id
            "#,
        )
        .bind(order_id.as_uuid())
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        let order = Self::row_to_order(order_row)?;
        Ok(CheckoutOutcome { order, payment })
    }
}
