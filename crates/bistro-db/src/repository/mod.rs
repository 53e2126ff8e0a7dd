//! # Repository Module
//!
//! Database repository implementations for Bistro.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Service                                                                │
//! │       │                                                                 │
//! │       │  db.orders().get_by_id(id)  ──►  Order (whole graph)           │
//! │       │  order.pending()?               (pure, bistro-core)            │
//! │       │  db.orders().save(&order)   ──►  one transaction               │
//! │       ▼                                                                 │
//! │  OrderRepository / GroupItemRepository / ItemRepository                │
//! │  ProductRepository / ShiftRepository                                   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Lookups return `Ok(None)` for a missing row. Writes that target a row
//! that must exist return `DbError::NotFound`.
//!
//! ## Available Repositories
//!
//! - [`OrderRepository`](order::OrderRepository) - Whole order graphs
//! - [`GroupItemRepository`](group_item::GroupItemRepository) - Groups with items and complement
//! - [`ItemRepository`](item::ItemRepository) - Single items
//! - [`ProductRepository`](product::ProductRepository) - Catalog
//! - [`ShiftRepository`](shift::ShiftRepository) - Shifts and order numbering

pub mod group_item;
pub mod item;
pub mod order;
pub mod product;
pub mod shift;
