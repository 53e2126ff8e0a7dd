//! # bistro-service: Use Cases for Bistro
//!
//! Wires bistro-core rules to bistro-db storage. Every mutating call is a
//! unit of work on one aggregate:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  Bistro::connect(&config)                                              │
//! │       │                                                                 │
//! │       ├── orders       OrderService      create, pending, finish, ...  │
//! │       ├── group_items  GroupItemService  start, ready, complement, ... │
//! │       ├── items        ItemService       add_to_order, cancel, ...     │
//! │       └── shifts       ShiftService      open, close                   │
//! │                                                                         │
//! │  each call:  lock(order) ─► load ─► bistro-core method ─► save         │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use bistro_service::{init_tracing, Bistro, ServiceConfig};
//!
//! let config = ServiceConfig::load(None)?;
//! init_tracing(&config.logging.filter);
//!
//! let app = Bistro::connect(&config).await?;
//! let shift = app.shifts.open("attendant-1").await?;
//! let order = app.orders.create(&shift.id, "attendant-1").await?;
//! ```

pub mod config;
pub mod context;
pub mod error;
pub mod group_item;
pub mod item;
pub mod locks;
pub mod order;
pub mod shift;
pub mod telemetry;

pub use config::ServiceConfig;
pub use context::ServiceContext;
pub use error::{ConfigError, ErrorBody, ErrorCode, ServiceError, ServiceResult};
pub use group_item::GroupItemService;
pub use item::ItemService;
pub use locks::LockTable;
pub use order::OrderService;
pub use shift::ShiftService;
pub use telemetry::init_tracing;

use bistro_db::Database;
use tracing::info;

/// All services over one database and one lock table.
#[derive(Debug, Clone)]
pub struct Bistro {
    pub orders: OrderService,
    pub group_items: GroupItemService,
    pub items: ItemService,
    pub shifts: ShiftService,
    ctx: ServiceContext,
}

impl Bistro {
    pub fn new(db: Database, config: &ServiceConfig) -> Self {
        let ctx = ServiceContext::new(db);

        Bistro {
            orders: OrderService::new(ctx.clone(), config.orders.reject_overpayment),
            group_items: GroupItemService::new(ctx.clone()),
            items: ItemService::new(ctx.clone()),
            shifts: ShiftService::new(ctx.clone()),
            ctx,
        }
    }

    /// Opens the database described by `config` and builds the services.
    pub async fn connect(config: &ServiceConfig) -> ServiceResult<Self> {
        let db = Database::new(config.db_config()).await?;
        info!(
            reject_overpayment = config.orders.reject_overpayment,
            "Services ready"
        );
        Ok(Self::new(db, config))
    }

    /// Shared handles, for building a differently configured service.
    pub fn context(&self) -> ServiceContext {
        self.ctx.clone()
    }

    pub fn db(&self) -> &Database {
        self.ctx.db()
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::path::PathBuf;

    use crate::{Bistro, ServiceConfig};
    use bistro_core::{Category, Money, Order, Product, QuantityOption};

    pub async fn test_services() -> Bistro {
        let mut config = ServiceConfig::default();
        config.database.path = PathBuf::from(":memory:");
        Bistro::connect(&config).await.unwrap()
    }

    pub struct TestCatalog {
        /// Margherita, Large, 40.00
        pub pizza: Product,
        /// Cheese border, Large, 5.00
        pub border: Product,
        /// Cheese border, Small, 3.00
        pub small_border: Product,
        /// Soda, 350ml, 5.50
        pub soda: Product,
        pub whole: QuantityOption,
        pub half: QuantityOption,
        pub one_drink: QuantityOption,
    }

    pub async fn seed_catalog(app: &Bistro) -> TestCatalog {
        let products = app.db().products();

        let pizzas = Category::new("Pizza");
        let borders = Category::new("Borders");
        let drinks = Category::new("Drinks");
        for category in [&pizzas, &borders, &drinks] {
            products.insert_category(category).await.unwrap();
        }

        let catalog = TestCatalog {
            pizza: Product::new("Margherita", Money::from_cents(4000), &pizzas.id, "Large"),
            border: Product::new("Cheese border", Money::from_cents(500), &borders.id, "Large"),
            small_border: Product::new("Cheese border", Money::from_cents(300), &borders.id, "Small"),
            soda: Product::new("Soda", Money::from_cents(550), &drinks.id, "350ml"),
            whole: QuantityOption::new(1.0, &pizzas.id),
            half: QuantityOption::new(0.5, &pizzas.id),
            one_drink: QuantityOption::new(1.0, &drinks.id),
        };

        for product in [&catalog.pizza, &catalog.border, &catalog.small_border, &catalog.soda] {
            products.insert(product).await.unwrap();
        }
        for quantity in [&catalog.whole, &catalog.half, &catalog.one_drink] {
            products.insert_quantity(quantity).await.unwrap();
        }

        catalog
    }

    /// A staging order with one whole pizza, reloaded from storage.
    pub async fn order_with_pizza(app: &Bistro, catalog: &TestCatalog) -> Order {
        let shift = app.shifts.open("attendant-1").await.unwrap();
        let order = app.orders.create(&shift.id, "attendant-1").await.unwrap();
        app.items
            .add_to_order(&order.id, &catalog.pizza.id, &catalog.whole.id, None)
            .await
            .unwrap();

        app.orders.get(&order.id).await.unwrap()
    }
}
