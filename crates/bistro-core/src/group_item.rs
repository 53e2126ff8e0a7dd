//! # Group Item
//!
//! Items of one category and size that travel to the kitchen together.
//!
//! ## Group Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  Staging ──pending()──► Pending ──start()──► Started ──ready()──► Ready │
//! │     │                     │                    │                   │    │
//! │     └─────────────────────┴──────cancel()──────┴───────────────────┘    │
//! │                                     │                                   │
//! │                                     ▼                                   │
//! │                                 Canceled                                │
//! │                                                                         │
//! │  Every transition cascades to the items (and the complement).           │
//! │  Guards are checked for the whole group before anything changes.        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Totals
//! `total = Σ item.price + complement.price`, `quantity = Σ item.quantity`.
//! Item prices already include their quantity, so nothing is multiplied here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::catalog::Product;
use crate::error::{CoreResult, GroupItemError};
use crate::item::{Item, ItemStatus};
use crate::money::Money;

// =============================================================================
// Group Item Status
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum GroupItemStatus {
    #[default]
    Staging,
    Pending,
    Started,
    Ready,
    Canceled,
}

impl From<GroupItemStatus> for ItemStatus {
    fn from(status: GroupItemStatus) -> Self {
        match status {
            GroupItemStatus::Staging => ItemStatus::Staging,
            GroupItemStatus::Pending => ItemStatus::Pending,
            GroupItemStatus::Started => ItemStatus::Started,
            GroupItemStatus::Ready => ItemStatus::Ready,
            GroupItemStatus::Canceled => ItemStatus::Canceled,
        }
    }
}

// =============================================================================
// Group Item
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct GroupItem {
    pub id: String,
    pub order_id: String,
    pub category_id: String,
    pub size: String,

    /// Σ item quantities, written by `calculate_total`.
    pub quantity: f64,

    /// Σ item prices + complement, written by `calculate_total`.
    pub total: Money,

    pub status: GroupItemStatus,
    pub observation: Option<String>,

    pub complement_item_id: Option<String>,
    pub complement_item: Option<Item>,

    pub items: Vec<Item>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub pending_at: Option<DateTime<Utc>>,
    #[ts(as = "Option<String>")]
    pub started_at: Option<DateTime<Utc>>,
    #[ts(as = "Option<String>")]
    pub ready_at: Option<DateTime<Utc>>,
    #[ts(as = "Option<String>")]
    pub canceled_at: Option<DateTime<Utc>>,
}

impl GroupItem {
    /// Creates an empty staging group.
    pub fn new(
        order_id: impl Into<String>,
        category_id: impl Into<String>,
        size: impl Into<String>,
    ) -> Self {
        GroupItem {
            id: Uuid::new_v4().to_string(),
            order_id: order_id.into(),
            category_id: category_id.into(),
            size: size.into(),
            quantity: 0.0,
            total: Money::zero(),
            status: GroupItemStatus::Staging,
            observation: None,
            complement_item_id: None,
            complement_item: None,
            items: Vec::new(),
            created_at: Utc::now(),
            pending_at: None,
            started_at: None,
            ready_at: None,
            canceled_at: None,
        }
    }

    /// Creates an empty staging group shaped for `product`.
    pub fn for_product(order_id: impl Into<String>, product: &Product) -> Self {
        GroupItem::new(order_id, product.category_id.clone(), product.size.clone())
    }

    pub fn is_canceled(&self) -> bool {
        self.status == GroupItemStatus::Canceled
    }

    // =========================================================================
    // Membership
    // =========================================================================

    /// Checks that an item of `product` may be added to this group.
    pub fn check_accepts(&self, product: &Product) -> Result<(), GroupItemError> {
        if self.status != GroupItemStatus::Staging {
            return Err(GroupItemError::NotStaging);
        }

        if self.category_id != product.category_id {
            return Err(GroupItemError::CategoryInvalid);
        }

        if self.size != product.size {
            return Err(GroupItemError::SizeInvalid);
        }

        Ok(())
    }

    /// Appends a staging item and recomputes the total.
    pub fn add_item(&mut self, mut item: Item) -> CoreResult<()> {
        if self.status != GroupItemStatus::Staging {
            return Err(GroupItemError::NotStaging.into());
        }

        item.group_item_id = Some(self.id.clone());
        self.items.push(item);
        self.calculate_total();
        Ok(())
    }

    /// Removes an item and recomputes the total.
    ///
    /// Refused once the kitchen has started on the group.
    pub fn remove_item(&mut self, item_id: &str) -> CoreResult<Item> {
        match self.status {
            GroupItemStatus::Started | GroupItemStatus::Ready => {
                return Err(GroupItemError::ItemsFinished.into())
            }
            GroupItemStatus::Canceled => return Err(GroupItemError::Canceled.into()),
            GroupItemStatus::Staging | GroupItemStatus::Pending => {}
        }

        let index = self
            .items
            .iter()
            .position(|item| item.id == item_id)
            .ok_or_else(|| GroupItemError::ItemNotFound(item_id.to_string()))?;

        let removed = self.items.remove(index);
        self.calculate_total();
        Ok(removed)
    }

    pub fn item_mut(&mut self, item_id: &str) -> Option<&mut Item> {
        if let Some(item) = self.items.iter_mut().find(|item| item.id == item_id) {
            return Some(item);
        }
        self.complement_item
            .as_mut()
            .filter(|item| item.id == item_id)
    }

    /// Items plus the complement, skipping canceled ones.
    fn live_items_mut(&mut self) -> impl Iterator<Item = &mut Item> {
        self.items
            .iter_mut()
            .chain(self.complement_item.iter_mut())
            .filter(|item| !item.is_canceled())
    }

    fn live_items(&self) -> impl Iterator<Item = &Item> {
        self.items
            .iter()
            .chain(self.complement_item.iter())
            .filter(|item| !item.is_canceled())
    }

    // =========================================================================
    // Transitions
    // =========================================================================

    /// Checks the pending guard without mutating anything.
    ///
    /// ## Guard
    /// - Staging or Pending group: OK (pending again is a no-op)
    /// - Group or any live item already Started/Ready: `ItemsFinished`
    /// - Canceled group: `Canceled`
    pub fn check_pending(&self) -> Result<(), GroupItemError> {
        match self.status {
            GroupItemStatus::Canceled => Err(GroupItemError::Canceled),
            GroupItemStatus::Started | GroupItemStatus::Ready => Err(GroupItemError::ItemsFinished),
            GroupItemStatus::Staging | GroupItemStatus::Pending => {
                if self.live_items().any(|item| item.status.is_in_progress()) {
                    return Err(GroupItemError::ItemsFinished);
                }
                Ok(())
            }
        }
    }

    /// Sends the group and its staging items to the kitchen.
    pub fn pending(&mut self) -> CoreResult<()> {
        self.check_pending()?;

        for item in self.live_items_mut() {
            item.status = ItemStatus::Pending;
        }

        self.status = GroupItemStatus::Pending;
        self.pending_at.get_or_insert_with(Utc::now);
        Ok(())
    }

    /// Kitchen starts preparing the group.
    pub fn start(&mut self) -> CoreResult<()> {
        self.advance(GroupItemStatus::Pending, GroupItemStatus::Started)?;
        self.started_at = Some(Utc::now());
        Ok(())
    }

    /// Kitchen finished the group.
    pub fn ready(&mut self) -> CoreResult<()> {
        self.advance(GroupItemStatus::Started, GroupItemStatus::Ready)?;
        self.ready_at = Some(Utc::now());
        Ok(())
    }

    fn advance(&mut self, expected: GroupItemStatus, to: GroupItemStatus) -> CoreResult<()> {
        if self.status == GroupItemStatus::Canceled {
            return Err(GroupItemError::Canceled.into());
        }
        if self.status != expected {
            return Err(GroupItemError::InvalidStatus {
                expected,
                found: self.status,
            }
            .into());
        }

        // Items moved ahead on their own keep their status.
        let target = ItemStatus::from(to);
        for item in self.live_items().filter(|item| item.status.is_behind(target)) {
            item.check_advance(target)?;
        }
        for item in self
            .live_items_mut()
            .filter(|item| item.status.is_behind(target))
        {
            item.status = target;
        }

        self.status = to;
        Ok(())
    }

    /// Cancels the group and every item in it. Always succeeds.
    pub fn cancel(&mut self) {
        for item in self.live_items_mut() {
            item.status = ItemStatus::Canceled;
        }

        self.status = GroupItemStatus::Canceled;
        self.canceled_at.get_or_insert_with(Utc::now);
    }

    // =========================================================================
    // Totals
    // =========================================================================

    /// Recomputes `total` and `quantity` from the items and the complement.
    pub fn calculate_total(&mut self) {
        let items_total: Money = self.items.iter().map(|item| item.price).sum();
        let complement_total = self
            .complement_item
            .as_ref()
            .map(|item| item.price)
            .unwrap_or_default();

        self.total = items_total + complement_total;
        self.quantity = self.items.iter().map(|item| item.quantity).sum();
    }

    // =========================================================================
    // Complement
    // =========================================================================

    /// Links an add-on built from `product` to this group.
    ///
    /// The add-on takes the group's quantity and mirrors its status.
    /// Replaces any previous complement.
    ///
    /// ## Errors
    /// `SizeMustBeTheSame` when the product size differs from the group size;
    /// the group is left untouched.
    pub fn add_complement_item(&mut self, product: &Product) -> CoreResult<&Item> {
        if self.size != product.size {
            return Err(GroupItemError::SizeMustBeTheSame.into());
        }

        let complement = Item::complement(product, self.quantity, self.status.into());
        let items_total: Money = self.items.iter().map(|item| item.price).sum();

        self.total = items_total + complement.price;
        self.complement_item_id = Some(complement.id.clone());

        Ok(&*self.complement_item.insert(complement))
    }

    /// Unlinks the complement, returning it so the caller can delete it.
    pub fn delete_complement_item(&mut self) -> Option<Item> {
        self.complement_item_id = None;
        let removed = self.complement_item.take();
        self.calculate_total();
        removed
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{CoreError, ItemError};

    fn pizza(size: &str, cents: i64) -> Product {
        Product::new("Margherita", Money::from_cents(cents), "cat-pizza", size)
    }

    fn group_with_items(prices: &[i64]) -> GroupItem {
        let mut group = GroupItem::new("order-1", "cat-pizza", "Large");
        for &cents in prices {
            let item = Item::from_product(&pizza("Large", cents), 1.0, &group.id, None).unwrap();
            group.add_item(item).unwrap();
        }
        group
    }

    #[test]
    fn test_total_is_sum_of_item_prices() {
        let group = group_with_items(&[2000, 1000]);
        assert_eq!(group.total.cents(), 3000);
        assert_eq!(group.quantity, 2.0);
    }

    #[test]
    fn test_fractional_items() {
        let mut group = GroupItem::new("order-1", "cat-pizza", "Large");
        for _ in 0..2 {
            let item = Item::from_product(&pizza("Large", 5000), 0.5, &group.id, None).unwrap();
            group.add_item(item).unwrap();
        }
        assert_eq!(group.total.cents(), 5000);
        assert_eq!(group.quantity, 1.0);
    }

    #[test]
    fn test_check_accepts() {
        let group = GroupItem::new("order-1", "cat-pizza", "Large");
        assert!(group.check_accepts(&pizza("Large", 100)).is_ok());
        assert_eq!(
            group.check_accepts(&pizza("Small", 100)),
            Err(GroupItemError::SizeInvalid)
        );

        let drink = Product::new("Cola", Money::from_cents(650), "cat-drinks", "Large");
        assert_eq!(group.check_accepts(&drink), Err(GroupItemError::CategoryInvalid));

        let mut pending = group_with_items(&[100]);
        pending.pending().unwrap();
        assert_eq!(
            pending.check_accepts(&pizza("Large", 100)),
            Err(GroupItemError::NotStaging)
        );
    }

    #[test]
    fn test_pending_cascades_to_items() {
        let mut group = group_with_items(&[2000, 1000]);
        group.pending().unwrap();

        assert_eq!(group.status, GroupItemStatus::Pending);
        assert!(group.pending_at.is_some());
        assert!(group.items.iter().all(|i| i.status == ItemStatus::Pending));
    }

    #[test]
    fn test_pending_twice_keeps_first_timestamp() {
        let mut group = group_with_items(&[2000]);
        group.pending().unwrap();
        let first = group.pending_at;
        group.pending().unwrap();
        assert_eq!(group.pending_at, first);
    }

    #[test]
    fn test_pending_refused_once_kitchen_started() {
        let mut group = group_with_items(&[2000, 1000]);
        group.pending().unwrap();
        group.items[0].start().unwrap();

        let before = group.clone();
        assert!(matches!(
            group.pending(),
            Err(CoreError::GroupItem(GroupItemError::ItemsFinished))
        ));
        assert_eq!(group, before);

        group.start().unwrap();
        assert_eq!(group.check_pending(), Err(GroupItemError::ItemsFinished));
    }

    #[test]
    fn test_start_and_ready() {
        let mut group = group_with_items(&[2000, 1000]);
        assert!(matches!(
            group.start(),
            Err(CoreError::GroupItem(GroupItemError::InvalidStatus {
                expected: GroupItemStatus::Pending,
                found: GroupItemStatus::Staging
            }))
        ));

        group.pending().unwrap();
        group.items[1].cancel().unwrap();
        group.start().unwrap();
        group.ready().unwrap();

        assert_eq!(group.status, GroupItemStatus::Ready);
        assert_eq!(group.items[0].status, ItemStatus::Ready);
        assert_eq!(group.items[1].status, ItemStatus::Canceled);
        assert!(group.ready_at.is_some());
    }

    #[test]
    fn test_item_ahead_of_group() {
        let mut group = group_with_items(&[2000, 1000]);
        group.pending().unwrap();
        group.items[0].start().unwrap();
        group.items[0].ready().unwrap();

        group.start().unwrap();
        assert_eq!(group.status, GroupItemStatus::Started);
        assert_eq!(group.items[0].status, ItemStatus::Ready);
        assert_eq!(group.items[1].status, ItemStatus::Started);

        group.ready().unwrap();
        assert_eq!(group.status, GroupItemStatus::Ready);
        assert!(group.items.iter().all(|i| i.status == ItemStatus::Ready));
    }

    #[test]
    fn test_cancel_cascades_and_is_idempotent() {
        let mut group = group_with_items(&[2000, 1000]);
        group.pending().unwrap();
        group.cancel();
        group.cancel();

        assert!(group.is_canceled());
        assert!(group.items.iter().all(|i| i.is_canceled()));
        assert!(matches!(
            group.items[0].cancel(),
            Err(CoreError::Item(ItemError::AlreadyCanceled))
        ));
        assert_eq!(group.check_pending(), Err(GroupItemError::Canceled));
    }

    #[test]
    fn test_add_complement_adds_to_total() {
        let mut group = group_with_items(&[2000, 1000]);
        let border = Product::new("Cheese border", Money::from_cents(500), "cat-border", "Large");

        let complement = group.add_complement_item(&border).unwrap();
        assert_eq!(complement.quantity, 2.0);
        assert_eq!(complement.price.cents(), 1000);
        assert_eq!(complement.status, ItemStatus::Staging);

        assert_eq!(group.total.cents(), 4000);
        assert!(group.complement_item_id.is_some());

        // Recomputing keeps the complement contribution.
        group.calculate_total();
        assert_eq!(group.total.cents(), 4000);
    }

    #[test]
    fn test_complement_size_mismatch_leaves_group_untouched() {
        let mut group = group_with_items(&[2000]);
        let border = Product::new("Cheese border", Money::from_cents(500), "cat-border", "Small");

        let err = group.add_complement_item(&border).unwrap_err();
        assert!(matches!(
            err,
            CoreError::GroupItem(GroupItemError::SizeMustBeTheSame)
        ));
        assert_eq!(err.to_string(), "size must be the same");
        assert!(group.complement_item_id.is_none());
        assert!(group.complement_item.is_none());
        assert_eq!(group.total.cents(), 2000);
    }

    #[test]
    fn test_delete_complement() {
        let mut group = group_with_items(&[2000]);
        let border = Product::new("Cheese border", Money::from_cents(500), "cat-border", "Large");
        group.add_complement_item(&border).unwrap();

        let removed = group.delete_complement_item().unwrap();
        assert_eq!(removed.name, "Cheese border");
        assert!(group.complement_item_id.is_none());
        assert_eq!(group.total.cents(), 2000);
    }

    #[test]
    fn test_complement_follows_group_transitions() {
        let mut group = group_with_items(&[2000]);
        let border = Product::new("Cheese border", Money::from_cents(500), "cat-border", "Large");
        group.add_complement_item(&border).unwrap();

        group.pending().unwrap();
        group.start().unwrap();

        let complement = group.complement_item.as_ref().unwrap();
        assert_eq!(complement.status, ItemStatus::Started);
    }

    #[test]
    fn test_remove_item() {
        let mut group = group_with_items(&[2000, 1000]);
        let id = group.items[1].id.clone();

        let removed = group.remove_item(&id).unwrap();
        assert_eq!(removed.price.cents(), 1000);
        assert_eq!(group.total.cents(), 2000);

        assert!(matches!(
            group.remove_item("missing"),
            Err(CoreError::GroupItem(GroupItemError::ItemNotFound(_)))
        ));

        group.pending().unwrap();
        group.start().unwrap();
        let id = group.items[0].id.clone();
        assert!(group.remove_item(&id).is_err());
    }
}
