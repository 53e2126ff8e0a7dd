//! # bistro-core: Order Domain for Bistro
//!
//! Entities, state machines and money arithmetic for restaurant orders.
//! No I/O happens in this crate.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Bistro Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                bistro-service (use cases)                       │   │
//! │  │   load ──► mutate entity ──► save, one writer per order         │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ bistro-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   Order ──owns──► GroupItem ──owns──► Item                      │   │
//! │  │     │                 └──────────────► complement Item          │   │
//! │  │     ├──owns──► PaymentOrder                                     │   │
//! │  │     └──owns──► DeliveryOrder | TableOrder                       │   │
//! │  │                                                                 │   │
//! │  │   Shift, catalog (Product, Category, Size, QuantityOption)      │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 bistro-db (SQLite repositories)                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`order`] - Order aggregate, status lattice, totals and payments
//! - [`group_item`] - Groups of items sent to the kitchen together
//! - [`item`] - Priced line entries
//! - [`payment`] - Payments and payment methods
//! - [`shift`] - Operating sessions and order numbering
//! - [`catalog`] - Products and their categories, sizes, quantities
//! - [`money`] - Integer money
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation
//!
//! ## Example Usage
//!
//! ```rust
//! use bistro_core::{GroupItem, Item, Money, Order, Product};
//!
//! let mut order = Order::new("shift-1", 1, "attendant-1").unwrap();
//! let pizza = Product::new("Margherita", Money::from_cents(3000), "cat-pizza", "Large");
//!
//! let mut group = GroupItem::for_product(&order.id, &pizza);
//! let item = Item::from_product(&pizza, 1.0, &group.id, None).unwrap();
//! group.add_item(item).unwrap();
//! order.add_group(group).unwrap();
//!
//! order.pending().unwrap();
//! assert_eq!(order.total_payable.cents(), 3000);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod catalog;
pub mod error;
pub mod group_item;
pub mod item;
pub mod money;
pub mod order;
pub mod payment;
pub mod shift;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use catalog::{Category, Product, QuantityOption, Size};
pub use error::{
    CoreError, CoreResult, ErrorKind, GroupItemError, ItemError, OrderError, ShiftError,
    ValidationError,
};
pub use group_item::{GroupItem, GroupItemStatus};
pub use item::{Item, ItemStatus};
pub use money::Money;
pub use order::{DeliveryOrder, Order, OrderStatus, TableOrder};
pub use payment::{PaymentMethod, PaymentOrder};
pub use shift::Shift;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Largest quantity accepted for a single item.
///
/// Catches typing 1000 instead of 10 at the counter.
pub const MAX_ITEM_QUANTITY: f64 = 999.0;

/// Longest observation accepted on orders, groups and items.
pub const MAX_OBSERVATION_LENGTH: usize = 500;
