pub mod entities;
pub mod error;
pub mod memory;
pub mod postgres;
pub mod store;

pub use common::{
    CategoryId, CustomerId, Money, OperatorId, OrderId, OrderItemId, OrderStatus, PaymentId,
    PaymentMethod, ProductId, TaxRate, Version,
};
pub use entities::{
    Category, Customer, NewCategory, NewCustomer, NewOrder, NewPayment, NewProduct, Order,
    OrderFilter, OrderItem, Payment, Product, ProductFilter, UpdateCategory, UpdateCustomer,
    UpdatePayment, UpdateProduct,
};
pub use error::{Result, StoreError};
pub use memory::InMemoryStore;
pub use postgres::PostgresStore;
pub use store::{
    CatalogStore, CheckoutOutcome, CheckoutStore, CustomerStore, OrderStore, PaymentStore,
    PosStore, StockPolicy,
};
