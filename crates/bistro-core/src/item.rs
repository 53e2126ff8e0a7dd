//! # Item
//!
//! The smallest priced unit of an order.
//!
//! ## Item Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   Staging ──► Pending ──► Started ──► Ready                             │
//! │      │           │           │          │                               │
//! │      └───────────┴─────┬─────┴──────────┘                               │
//! │                        ▼                                                │
//! │                    Canceled                                             │
//! │                                                                         │
//! │  Forward moves only; cancel from anything but Canceled.                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Snapshot Pattern
//! Name and price are copied from the product when the item is created.
//! A later change to the product price never touches items already placed.

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::catalog::Product;
use crate::error::{CoreResult, ItemError};
use crate::money::Money;
use crate::validation::{validate_observation, validate_quantity};

// =============================================================================
// Item Status
// =============================================================================

/// The kitchen status of an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    /// Still being composed; not sent to the kitchen.
    #[default]
    Staging,
    /// Sent to the kitchen.
    Pending,
    /// Kitchen started preparing it.
    Started,
    /// Ready to be served.
    Ready,
    Canceled,
}

impl ItemStatus {
    /// Position on the forward path. Canceled sits outside it.
    fn rank(self) -> Option<u8> {
        match self {
            ItemStatus::Staging => Some(0),
            ItemStatus::Pending => Some(1),
            ItemStatus::Started => Some(2),
            ItemStatus::Ready => Some(3),
            ItemStatus::Canceled => None,
        }
    }

    /// True when `self` comes before `other` on the forward path.
    pub(crate) fn is_behind(self, other: ItemStatus) -> bool {
        matches!((self.rank(), other.rank()), (Some(a), Some(b)) if a < b)
    }

    /// True once kitchen work has begun.
    pub fn is_in_progress(self) -> bool {
        matches!(self, ItemStatus::Started | ItemStatus::Ready)
    }
}

// =============================================================================
// Item
// =============================================================================

/// A line entry inside a group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Item {
    pub id: String,

    /// Owning group. `None` for complement items, which the group
    /// references through `complement_item_id` instead.
    pub group_item_id: Option<String>,

    pub product_id: String,

    /// Product name at time of ordering (frozen).
    pub name: String,

    pub description: Option<String>,

    /// Customer note ("no onions").
    pub observation: Option<String>,

    /// Size name at time of ordering (frozen).
    pub size: String,

    /// Product price × quantity at time of ordering (frozen).
    pub price: Money,

    pub quantity: f64,

    pub status: ItemStatus,
}

impl Item {
    /// Creates a staging item for a group from a product and a quantity option.
    ///
    /// ## Example
    /// ```rust
    /// use bistro_core::catalog::Product;
    /// use bistro_core::item::{Item, ItemStatus};
    /// use bistro_core::money::Money;
    ///
    /// let product = Product::new("Margherita", Money::from_cents(4000), "cat-pizza", "Large");
    /// let item = Item::from_product(&product, 0.5, "group-1", None).unwrap();
    ///
    /// assert_eq!(item.name, "Margherita (Large)");
    /// assert_eq!(item.price.cents(), 2000);
    /// assert_eq!(item.status, ItemStatus::Staging);
    /// ```
    pub fn from_product(
        product: &Product,
        quantity: f64,
        group_item_id: &str,
        observation: Option<String>,
    ) -> CoreResult<Self> {
        validate_quantity(quantity)?;
        if let Some(note) = observation.as_deref() {
            validate_observation(note)?;
        }

        Ok(Item {
            id: Uuid::new_v4().to_string(),
            group_item_id: Some(group_item_id.to_string()),
            product_id: product.id.clone(),
            name: format!("{} ({})", product.name, product.size),
            description: product.description.clone(),
            observation,
            size: product.size.clone(),
            price: product.price().multiply_quantity(quantity),
            quantity,
            status: ItemStatus::Staging,
        })
    }

    /// Creates the add-on item that a group links as its complement.
    ///
    /// Quantity follows the group, and status mirrors the group's status.
    pub(crate) fn complement(product: &Product, quantity: f64, status: ItemStatus) -> Self {
        Item {
            id: Uuid::new_v4().to_string(),
            group_item_id: None,
            product_id: product.id.clone(),
            name: product.name.clone(),
            description: product.description.clone(),
            observation: None,
            size: product.size.clone(),
            price: product.price().multiply_quantity(quantity),
            quantity,
            status,
        }
    }

    pub fn is_canceled(&self) -> bool {
        self.status == ItemStatus::Canceled
    }

    /// Sends a staging item to the kitchen. Already pending is a no-op.
    pub fn pending(&mut self) -> CoreResult<()> {
        self.advance(ItemStatus::Pending)
    }

    /// Marks the item as being prepared.
    pub fn start(&mut self) -> CoreResult<()> {
        self.advance(ItemStatus::Started)
    }

    /// Marks the item as ready to serve.
    pub fn ready(&mut self) -> CoreResult<()> {
        self.advance(ItemStatus::Ready)
    }

    /// Cancels the item from any state except Canceled.
    pub fn cancel(&mut self) -> CoreResult<()> {
        if self.is_canceled() {
            return Err(ItemError::AlreadyCanceled.into());
        }
        self.status = ItemStatus::Canceled;
        Ok(())
    }

    /// Checks that the item may move one step forward to `to`.
    ///
    /// Staying in place is accepted so cascades from the group are idempotent.
    pub(crate) fn check_advance(&self, to: ItemStatus) -> Result<(), ItemError> {
        if self.is_canceled() {
            return Err(ItemError::AlreadyCanceled);
        }

        let from = self.status;
        match (from.rank(), to.rank()) {
            (Some(current), Some(target)) if target == current || target == current + 1 => Ok(()),
            _ => Err(ItemError::InvalidTransition { from, to }),
        }
    }

    fn advance(&mut self, to: ItemStatus) -> CoreResult<()> {
        self.check_advance(to)?;
        self.status = to;
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
