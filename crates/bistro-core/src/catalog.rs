//! # Catalog Types
//!
//! Read-only descriptions of what can be ordered.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Category "Pizza"                                                       │
//! │  ├── Sizes:      Small, Medium, Large                                   │
//! │  ├── Quantities: 0.5, 1, 2                                              │
//! │  └── Products:   Margherita (Large, 40.00), Calabresa (Medium, 35.90)   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! An item is synthesized from one product and one quantity option of the
//! same category. The catalog is never consulted again after that.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::money::Money;

/// A product category (Pizza, Drinks, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Category {
    pub id: String,
    pub name: String,
}

impl Category {
    pub fn new(name: impl Into<String>) -> Self {
        Category {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
        }
    }
}

/// A size available inside a category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Size {
    pub id: String,
    pub name: String,
    pub category_id: String,
}

impl Size {
    pub fn new(name: impl Into<String>, category_id: impl Into<String>) -> Self {
        Size {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            category_id: category_id.into(),
        }
    }
}

/// A quantity option offered by a category (half, one, two...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct QuantityOption {
    pub id: String,
    pub quantity: f64,
    pub category_id: String,
}

impl QuantityOption {
    pub fn new(quantity: f64, category_id: impl Into<String>) -> Self {
        QuantityOption {
            id: Uuid::new_v4().to_string(),
            quantity,
            category_id: category_id.into(),
        }
    }
}

/// A product available for ordering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Product {
    pub id: String,

    /// Short business code printed on kitchen tickets.
    pub code: String,

    pub name: String,

    pub description: Option<String>,

    /// Unit price in cents.
    pub price_cents: i64,

    /// Cost in cents (for margin reports).
    pub cost_cents: Option<i64>,

    pub category_id: String,

    /// Size name; must match the group the product is ordered into.
    pub size: String,

    pub is_available: bool,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Creates an available product with a generated id and code.
    pub fn new(
        name: impl Into<String>,
        price: Money,
        category_id: impl Into<String>,
        size: impl Into<String>,
    ) -> Self {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();
        Product {
            code: id[..8].to_uppercase(),
            id,
            name: name.into(),
            description: None,
            price_cents: price.cents(),
            cost_cents: None,
            category_id: category_id.into(),
            size: size.into(),
            is_available: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// Returns the unit price as Money.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }
}
