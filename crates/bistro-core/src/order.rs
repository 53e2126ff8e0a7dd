//! # Order
//!
//! The order aggregate: groups of items, payments, an optional delivery or
//! table sub-order, and the top-level state machine.
//!
//! ## Order Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  Staging ──pending()──► Pending ──finish()──► Finished ──┐              │
//! │     │                     │  ▲                           │              │
//! │     │                     └──┘ pending() again           ├─archive()─►  │
//! │     │                     │                              │   Archived   │
//! │     └─────cancel()────────┴──────► Canceled ─────────────┘      │       │
//! │                                                                 │       │
//! │           unarchive(): Canceled if canceled_at is set, ◄────────┘       │
//! │                        Finished otherwise                               │
//! │                                                                         │
//! │  schedule() may be called in any state and changes only start_at.      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Money Flow
//! ```text
//! group.total ─┐
//! group.total ─┼─► Σ ─► + delivery tax ─► total_payable
//! group.total ─┘
//!
//! payment.amount ─► Σ ─► total_paid ─► max(0, total_paid - payable) ─► total_change
//! ```
//!
//! Every guard is evaluated before anything is mutated. A failed call leaves
//! the order exactly as it was, cascades included.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::catalog::Product;
use crate::error::{CoreResult, GroupItemError, OrderError};
use crate::group_item::{GroupItem, GroupItemStatus};
use crate::item::Item;
use crate::money::Money;
use crate::payment::PaymentOrder;
use crate::validation::{validate_delivery_tax, validate_observation, validate_required};

// =============================================================================
// Order Status
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Being composed at the counter.
    #[default]
    Staging,
    /// Sent to the kitchen; payments are accepted.
    Pending,
    Finished,
    Canceled,
    /// Hidden from the day's views.
    Archived,
}

// =============================================================================
// Sub-orders
// =============================================================================

/// Delivery details. The tax is added to the payable total.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DeliveryOrder {
    pub id: String,
    pub order_id: String,
    pub client_id: String,
    pub address_id: String,
    pub driver_id: Option<String>,
    pub delivery_tax: Money,
}

impl DeliveryOrder {
    pub fn new(
        order_id: impl Into<String>,
        client_id: impl Into<String>,
        address_id: impl Into<String>,
        delivery_tax: Money,
    ) -> CoreResult<Self> {
        let client_id = client_id.into();
        let address_id = address_id.into();
        validate_required("client_id", &client_id)?;
        validate_required("address_id", &address_id)?;
        validate_delivery_tax(delivery_tax)?;

        Ok(DeliveryOrder {
            id: Uuid::new_v4().to_string(),
            order_id: order_id.into(),
            client_id,
            address_id,
            driver_id: None,
            delivery_tax,
        })
    }
}

/// Dine-in details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TableOrder {
    pub id: String,
    pub order_id: String,
    pub table_id: String,
    /// Name the customer gave at the table.
    pub name: Option<String>,
}

impl TableOrder {
    pub fn new(
        order_id: impl Into<String>,
        table_id: impl Into<String>,
        name: Option<String>,
    ) -> CoreResult<Self> {
        let table_id = table_id.into();
        validate_required("table_id", &table_id)?;

        Ok(TableOrder {
            id: Uuid::new_v4().to_string(),
            order_id: order_id.into(),
            table_id,
            name,
        })
    }
}

// =============================================================================
// Order
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Order {
    pub id: String,

    /// Sequential within the shift.
    pub order_number: i64,

    pub status: OrderStatus,
    pub observation: Option<String>,
    pub attendant_id: String,
    pub shift_id: String,

    /// Σ group totals + delivery tax, written by `recalculate_totals`.
    pub total_payable: Money,
    pub total_paid: Money,
    pub total_change: Money,
    pub quantity_items: f64,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub pending_at: Option<DateTime<Utc>>,
    #[ts(as = "Option<String>")]
    pub finished_at: Option<DateTime<Utc>>,
    #[ts(as = "Option<String>")]
    pub canceled_at: Option<DateTime<Utc>>,
    #[ts(as = "Option<String>")]
    pub archived_at: Option<DateTime<Utc>>,

    /// Scheduled start for orders placed in advance.
    #[ts(as = "Option<String>")]
    pub start_at: Option<DateTime<Utc>>,

    pub delivery: Option<DeliveryOrder>,
    pub table: Option<TableOrder>,

    pub groups: Vec<GroupItem>,
    pub payments: Vec<PaymentOrder>,
}

impl Order {
    /// Creates a staging order bound to a shift and an attendant.
    ///
    /// ```rust
    /// use bistro_core::order::{Order, OrderStatus};
    ///
    /// let order = Order::new("shift-1", 7, "attendant-1").unwrap();
    /// assert_eq!(order.status, OrderStatus::Staging);
    /// assert_eq!(order.order_number, 7);
    ///
    /// assert!(Order::new("", 1, "attendant-1").is_err());
    /// ```
    pub fn new(
        shift_id: impl Into<String>,
        order_number: i64,
        attendant_id: impl Into<String>,
    ) -> CoreResult<Self> {
        let shift_id = shift_id.into();
        let attendant_id = attendant_id.into();
        validate_required("shift_id", &shift_id)?;
        validate_required("attendant_id", &attendant_id)?;

        Ok(Order {
            id: Uuid::new_v4().to_string(),
            order_number,
            status: OrderStatus::Staging,
            observation: None,
            attendant_id,
            shift_id,
            total_payable: Money::zero(),
            total_paid: Money::zero(),
            total_change: Money::zero(),
            quantity_items: 0.0,
            created_at: Utc::now(),
            pending_at: None,
            finished_at: None,
            canceled_at: None,
            archived_at: None,
            start_at: None,
            delivery: None,
            table: None,
            groups: Vec::new(),
            payments: Vec::new(),
        })
    }

    // =========================================================================
    // State Machine
    // =========================================================================

    /// Sends the order and every live group to the kitchen.
    ///
    /// ## Guards (checked before any change)
    /// - Finished/Canceled/Archived: `Already*`
    /// - No live group: `WithoutItems`
    /// - Any live group refusing pending: that group's error
    pub fn pending(&mut self) -> CoreResult<()> {
        if let Some(err) = OrderError::already(self.status) {
            return Err(err.into());
        }

        let mut live = self.groups.iter().filter(|group| !group.is_canceled()).peekable();
        if live.peek().is_none() {
            return Err(OrderError::WithoutItems.into());
        }
        for group in live {
            group.check_pending()?;
        }

        for group in self.groups.iter_mut().filter(|group| !group.is_canceled()) {
            group.pending()?;
        }
        self.recalculate_totals();

        self.status = OrderStatus::Pending;
        self.pending_at.get_or_insert_with(Utc::now);
        Ok(())
    }

    pub fn finish(&mut self) -> CoreResult<()> {
        match self.status {
            OrderStatus::Pending => {}
            OrderStatus::Finished => return Err(OrderError::AlreadyFinished.into()),
            _ => return Err(OrderError::MustBePending.into()),
        }

        self.status = OrderStatus::Finished;
        self.finished_at = Some(Utc::now());
        Ok(())
    }

    /// Cancels the order and every group in it.
    ///
    /// Only Staging and Pending orders can be canceled; a finished order
    /// can only be archived.
    pub fn cancel(&mut self) -> CoreResult<()> {
        if let Some(err) = OrderError::already(self.status) {
            return Err(err.into());
        }

        for group in &mut self.groups {
            group.cancel();
        }

        self.status = OrderStatus::Canceled;
        self.canceled_at = Some(Utc::now());
        Ok(())
    }

    pub fn archive(&mut self) -> CoreResult<()> {
        match self.status {
            OrderStatus::Finished | OrderStatus::Canceled => {}
            OrderStatus::Archived => return Err(OrderError::AlreadyArchived.into()),
            _ => return Err(OrderError::MustBeFinishedOrCanceled.into()),
        }

        self.status = OrderStatus::Archived;
        self.archived_at = Some(Utc::now());
        Ok(())
    }

    /// Restores the status the order had before archiving.
    pub fn unarchive(&mut self) -> CoreResult<()> {
        if self.status != OrderStatus::Archived {
            return Err(OrderError::MustBeArchived.into());
        }

        self.status = if self.canceled_at.is_some() {
            OrderStatus::Canceled
        } else {
            OrderStatus::Finished
        };
        self.archived_at = None;
        Ok(())
    }

    /// Sets (or clears) the scheduled start. No state guard.
    pub fn schedule(&mut self, start_at: Option<DateTime<Utc>>) {
        self.start_at = start_at;
    }

    // =========================================================================
    // Totals & Payments
    // =========================================================================

    /// Σ cached group totals + delivery tax.
    pub fn total_to_pay(&self) -> Money {
        let groups: Money = self.groups.iter().map(|group| group.total).sum();
        groups + self.delivery_tax()
    }

    /// What is still owed, never negative.
    pub fn remaining(&self) -> Money {
        self.total_to_pay().saturating_excess(self.total_paid)
    }

    fn delivery_tax(&self) -> Money {
        self.delivery
            .as_ref()
            .map(|delivery| delivery.delivery_tax)
            .unwrap_or_default()
    }

    /// Recomputes every group total, then `total_payable` and
    /// `quantity_items`. Idempotent.
    pub fn recalculate_totals(&mut self) {
        let mut total = Money::zero();
        let mut quantity = 0.0;

        for group in &mut self.groups {
            group.calculate_total();
            total += group.total;
            quantity += group.quantity;
        }

        self.total_payable = total + self.delivery_tax();
        self.quantity_items = quantity;
    }

    /// Checks that the order accepts payments and is not overpaid.
    pub fn validate_payments(&self) -> CoreResult<()> {
        if self.status != OrderStatus::Pending {
            return Err(OrderError::MustBePending.into());
        }

        if self.total_paid > self.total_to_pay() {
            return Err(OrderError::PaidMoreThanTotal.into());
        }

        Ok(())
    }

    /// Appends a payment. Validation is a separate step.
    pub fn add_payment(&mut self, payment: PaymentOrder) {
        self.total_paid += payment.amount;
        self.payments.push(payment);
    }

    /// Re-derives `total_paid` from the payments and computes the change.
    ///
    /// ```rust
    /// use bistro_core::money::Money;
    /// use bistro_core::order::Order;
    /// use bistro_core::payment::{PaymentMethod, PaymentOrder};
    ///
    /// let mut order = Order::new("shift-1", 1, "attendant-1").unwrap();
    /// let payment = PaymentOrder::new(&order.id, Money::from_cents(1000), PaymentMethod::Cash).unwrap();
    /// order.add_payment(payment);
    /// order.calculate_total_change();
    ///
    /// // Nothing to pay yet, so everything is change.
    /// assert_eq!(order.total_change.cents(), 1000);
    /// ```
    pub fn calculate_total_change(&mut self) {
        self.total_paid = self.payments.iter().map(|payment| payment.amount).sum();
        self.total_change = self.total_paid.saturating_excess(self.total_to_pay());
    }

    // =========================================================================
    // Content
    // =========================================================================

    fn check_open(&self) -> Result<(), OrderError> {
        match OrderError::already(self.status) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Adds a group and recomputes the totals.
    pub fn add_group(&mut self, mut group: GroupItem) -> CoreResult<()> {
        self.check_open()?;

        group.order_id = self.id.clone();
        self.groups.push(group);
        self.recalculate_totals();
        Ok(())
    }

    /// Removes a group and recomputes the totals.
    pub fn remove_group(&mut self, group_id: &str) -> CoreResult<GroupItem> {
        self.check_open()?;

        let index = self
            .groups
            .iter()
            .position(|group| group.id == group_id)
            .ok_or_else(|| OrderError::GroupNotFound(group_id.to_string()))?;

        let removed = self.groups.remove(index);
        self.recalculate_totals();
        Ok(removed)
    }

    pub fn group_mut(&mut self, group_id: &str) -> Option<&mut GroupItem> {
        self.groups.iter_mut().find(|group| group.id == group_id)
    }

    /// Finds an open staging group that accepts items of this category and
    /// size.
    pub fn staging_group_for(&mut self, category_id: &str, size: &str) -> Option<&mut GroupItem> {
        self.groups.iter_mut().find(|group| {
            group.status == GroupItemStatus::Staging
                && group.category_id == category_id
                && group.size == size
        })
    }

    /// Attaches delivery details. Refused when a table is attached.
    pub fn attach_delivery(&mut self, mut delivery: DeliveryOrder) -> CoreResult<()> {
        self.check_open()?;
        if self.table.is_some() {
            return Err(OrderError::OrderTypeAlreadySet("table").into());
        }

        delivery.order_id = self.id.clone();
        self.delivery = Some(delivery);
        self.recalculate_totals();
        Ok(())
    }

    /// Attaches table details. Refused when a delivery is attached.
    pub fn attach_table(&mut self, mut table: TableOrder) -> CoreResult<()> {
        self.check_open()?;
        if self.delivery.is_some() {
            return Err(OrderError::OrderTypeAlreadySet("delivery").into());
        }

        table.order_id = self.id.clone();
        self.table = Some(table);
        Ok(())
    }

    /// Drops any delivery or table details.
    pub fn detach_order_type(&mut self) -> CoreResult<()> {
        self.check_open()?;

        self.delivery = None;
        self.table = None;
        self.recalculate_totals();
        Ok(())
    }

    // =========================================================================
    // Items
    // =========================================================================

    /// Adds an item of `product` to the staging group shaped for it, opening
    /// a new group when there is none. Returns the stored item.
    ///
    /// On a pending order the new group stays in staging until the order is
    /// sent again with [`Order::pending`].
    pub fn add_item(
        &mut self,
        product: &Product,
        quantity: f64,
        observation: Option<String>,
    ) -> CoreResult<Item> {
        self.check_open()?;

        let item = if let Some(group) = self.staging_group_for(&product.category_id, &product.size) {
            group.check_accepts(product)?;
            let item = Item::from_product(product, quantity, &group.id, observation)?;
            group.add_item(item.clone())?;
            item
        } else {
            let mut group = GroupItem::for_product(&self.id, product);
            let item = Item::from_product(product, quantity, &group.id, observation)?;
            group.add_item(item.clone())?;
            self.groups.push(group);
            item
        };

        self.recalculate_totals();
        Ok(item)
    }

    /// Removes an item from whichever group holds it.
    pub fn remove_item(&mut self, item_id: &str) -> CoreResult<Item> {
        self.check_open()?;

        let group = self
            .groups
            .iter_mut()
            .find(|group| group.items.iter().any(|item| item.id == item_id))
            .ok_or_else(|| GroupItemError::ItemNotFound(item_id.to_string()))?;

        let removed = group.remove_item(item_id)?;
        self.recalculate_totals();
        Ok(removed)
    }

    /// Links a complement built from `product` to a group.
    pub fn add_complement(&mut self, group_id: &str, product: &Product) -> CoreResult<Item> {
        self.check_open()?;

        let group = self
            .group_mut(group_id)
            .ok_or_else(|| OrderError::GroupNotFound(group_id.to_string()))?;
        let complement = group.add_complement_item(product)?.clone();

        self.recalculate_totals();
        Ok(complement)
    }

    /// Unlinks a group's complement, returning it when there was one.
    pub fn delete_complement(&mut self, group_id: &str) -> CoreResult<Option<Item>> {
        self.check_open()?;

        let group = self
            .group_mut(group_id)
            .ok_or_else(|| OrderError::GroupNotFound(group_id.to_string()))?;
        let removed = group.delete_complement_item();

        self.recalculate_totals();
        Ok(removed)
    }

    pub fn update_observation(&mut self, observation: Option<String>) -> CoreResult<()> {
        if let Some(text) = observation.as_deref() {
            validate_observation(text)?;
        }

        self.observation = observation;
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{CoreError, ErrorKind};
    use crate::item::ItemStatus;
    use crate::payment::PaymentMethod;

    fn order() -> Order {
        Order::new("shift-1", 1, "attendant-1").unwrap()
    }

    fn group(order: &Order, cents: i64) -> GroupItem {
        let product = Product::new("Margherita", Money::from_cents(cents), "cat-pizza", "Large");
        let mut group = GroupItem::for_product(&order.id, &product);
        let item = Item::from_product(&product, 1.0, &group.id, None).unwrap();
        group.add_item(item).unwrap();
        group
    }

    fn order_with_groups(prices: &[i64]) -> Order {
        let mut order = order();
        for &cents in prices {
            let group = group(&order, cents);
            order.add_group(group).unwrap();
        }
        order
    }

    fn pay(order: &mut Order, cents: i64) {
        let payment =
            PaymentOrder::new(&order.id, Money::from_cents(cents), PaymentMethod::Cash).unwrap();
        order.add_payment(payment);
    }

    #[test]
    fn test_new_order_requires_references() {
        assert!(Order::new("shift-1", 1, " ").is_err());
        let err = Order::new("", 1, "attendant-1").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[test]
    fn test_pending_without_groups_fails() {
        let mut order = order();
        let err = order.pending().unwrap_err();

        assert!(matches!(err, CoreError::Order(OrderError::WithoutItems)));
        assert_eq!(err.to_string(), "order must have at least one item");
        assert_eq!(order.status, OrderStatus::Staging);
        assert!(order.pending_at.is_none());
    }

    #[test]
    fn test_pending_cascades_to_groups() {
        let mut order = order_with_groups(&[3000, 1550]);
        order.pending().unwrap();

        assert_eq!(order.status, OrderStatus::Pending);
        assert!(order.pending_at.is_some());
        for group in &order.groups {
            assert_eq!(group.status, GroupItemStatus::Pending);
            assert!(group.items.iter().all(|i| i.status == ItemStatus::Pending));
        }
    }

    #[test]
    fn test_pending_skips_canceled_groups() {
        let mut order = order_with_groups(&[3000, 1550]);
        order.groups[1].cancel();
        order.pending().unwrap();
        assert_eq!(order.groups[1].status, GroupItemStatus::Canceled);

        let mut only_canceled = order_with_groups(&[3000]);
        only_canceled.groups[0].cancel();
        assert!(matches!(
            only_canceled.pending(),
            Err(CoreError::Order(OrderError::WithoutItems))
        ));
    }

    #[test]
    fn test_pending_is_atomic() {
        let mut order = order_with_groups(&[3000, 1550]);
        order.pending().unwrap();

        // Add a fresh staging group, then start the first one in the kitchen.
        let fresh = group(&order, 900);
        order.add_group(fresh).unwrap();
        order.groups[0].start().unwrap();

        let before = order.clone();
        let err = order.pending().unwrap_err();
        assert!(matches!(
            err,
            CoreError::GroupItem(GroupItemError::ItemsFinished)
        ));
        assert_eq!(order, before);
        assert_eq!(order.groups[2].status, GroupItemStatus::Staging);
    }

    #[test]
    fn test_pending_on_finished_order() {
        let mut order = order_with_groups(&[3000]);
        order.pending().unwrap();
        order.finish().unwrap();

        assert!(matches!(
            order.pending(),
            Err(CoreError::Order(OrderError::AlreadyFinished))
        ));
    }

    #[test]
    fn test_finish_requires_pending() {
        let mut order = order_with_groups(&[3000]);
        assert!(matches!(
            order.finish(),
            Err(CoreError::Order(OrderError::MustBePending))
        ));

        order.pending().unwrap();
        order.finish().unwrap();
        assert!(order.finished_at.is_some());
        assert!(matches!(
            order.finish(),
            Err(CoreError::Order(OrderError::AlreadyFinished))
        ));
    }

    #[test]
    fn test_cancel_cascades() {
        let mut order = order_with_groups(&[3000, 1550]);
        order.pending().unwrap();
        order.cancel().unwrap();

        assert_eq!(order.status, OrderStatus::Canceled);
        assert!(order.canceled_at.is_some());
        assert!(order.groups.iter().all(|g| g.is_canceled()));
        assert!(order
            .groups
            .iter()
            .flat_map(|g| g.items.iter())
            .all(|i| i.is_canceled()));

        assert!(matches!(
            order.cancel(),
            Err(CoreError::Order(OrderError::AlreadyCanceled))
        ));
    }

    #[test]
    fn test_cancel_refused_after_finish_or_archive() {
        let mut order = order_with_groups(&[3000]);
        order.pending().unwrap();
        order.finish().unwrap();
        assert!(matches!(
            order.cancel(),
            Err(CoreError::Order(OrderError::AlreadyFinished))
        ));

        order.archive().unwrap();
        assert!(matches!(
            order.cancel(),
            Err(CoreError::Order(OrderError::AlreadyArchived))
        ));
        assert_eq!(order.status, OrderStatus::Archived);
    }

    #[test]
    fn test_archive_guards() {
        let mut order = order_with_groups(&[3000]);
        let err = order.archive().unwrap_err();
        assert_eq!(err.to_string(), "order must be canceled or finished");
        assert_eq!(order.status, OrderStatus::Staging);

        order.cancel().unwrap();
        order.archive().unwrap();
        assert!(matches!(
            order.archive(),
            Err(CoreError::Order(OrderError::AlreadyArchived))
        ));
    }

    #[test]
    fn test_unarchive_restores_previous_status() {
        let mut canceled = order_with_groups(&[3000]);
        canceled.cancel().unwrap();
        canceled.archive().unwrap();
        canceled.unarchive().unwrap();
        assert_eq!(canceled.status, OrderStatus::Canceled);

        let mut finished = order_with_groups(&[3000]);
        finished.pending().unwrap();
        finished.finish().unwrap();
        finished.archive().unwrap();
        finished.unarchive().unwrap();
        assert_eq!(finished.status, OrderStatus::Finished);

        let err = finished.unarchive().unwrap_err();
        assert!(matches!(err, CoreError::Order(OrderError::MustBeArchived)));
    }

    #[test]
    fn test_schedule_has_no_guard() {
        let mut order = order_with_groups(&[3000]);
        order.cancel().unwrap();

        let at = Utc::now();
        order.schedule(Some(at));
        assert_eq!(order.start_at, Some(at));
        assert_eq!(order.status, OrderStatus::Canceled);
    }

    #[test]
    fn test_totals_and_change() {
        let mut order = order_with_groups(&[3000, 1550]);
        order.recalculate_totals();
        assert_eq!(order.total_payable.cents(), 4550);
        assert_eq!(order.quantity_items, 2.0);

        order.pending().unwrap();
        pay(&mut order, 5000);
        order.calculate_total_change();

        assert_eq!(order.total_paid.cents(), 5000);
        assert_eq!(order.total_change.cents(), 450);
        assert!(order.remaining().is_zero());
    }

    #[test]
    fn test_recalculate_totals_is_idempotent() {
        let mut order = order_with_groups(&[3000, 1550]);
        order.recalculate_totals();
        let first = order.clone();
        order.recalculate_totals();
        assert_eq!(order, first);
    }

    #[test]
    fn test_delivery_tax_is_payable() {
        let mut order = order_with_groups(&[3000]);
        let delivery =
            DeliveryOrder::new(&order.id, "client-1", "address-1", Money::from_cents(500)).unwrap();
        order.attach_delivery(delivery).unwrap();

        assert_eq!(order.total_payable.cents(), 3500);
        assert_eq!(order.total_to_pay().cents(), 3500);

        order.pending().unwrap();
        pay(&mut order, 3500);
        order.validate_payments().unwrap();
        order.calculate_total_change();
        assert!(order.total_change.is_zero());
    }

    #[test]
    fn test_change_is_never_negative() {
        let mut order = order_with_groups(&[3000]);
        order.pending().unwrap();
        pay(&mut order, 1000);
        order.calculate_total_change();

        assert!(order.total_change.is_zero());
        assert_eq!(order.remaining().cents(), 2000);
    }

    #[test]
    fn test_validate_payments() {
        let mut order = order_with_groups(&[3000]);
        assert!(matches!(
            order.validate_payments(),
            Err(CoreError::Order(OrderError::MustBePending))
        ));

        order.pending().unwrap();
        pay(&mut order, 3000);
        order.validate_payments().unwrap();

        pay(&mut order, 1);
        let err = order.validate_payments().unwrap_err();
        assert_eq!(err.to_string(), "order paid more than total");
        assert_eq!(err.kind(), ErrorKind::OverpaymentDetected);
    }

    #[test]
    fn test_order_types_are_exclusive() {
        let mut order = order_with_groups(&[3000]);
        let table = TableOrder::new(&order.id, "table-4", None).unwrap();
        order.attach_table(table).unwrap();

        let delivery =
            DeliveryOrder::new(&order.id, "client-1", "address-1", Money::from_cents(500)).unwrap();
        assert!(matches!(
            order.attach_delivery(delivery.clone()),
            Err(CoreError::Order(OrderError::OrderTypeAlreadySet("table")))
        ));

        order.detach_order_type().unwrap();
        order.attach_delivery(delivery).unwrap();
        assert!(order.table.is_none());
        assert!(order.delivery.is_some());
    }

    #[test]
    fn test_content_frozen_once_closed() {
        let mut order = order_with_groups(&[3000]);
        order.cancel().unwrap();

        let extra = group(&order, 100);
        assert!(matches!(
            order.add_group(extra),
            Err(CoreError::Order(OrderError::AlreadyCanceled))
        ));

        let id = order.groups[0].id.clone();
        assert!(order.remove_group(&id).is_err());
        assert_eq!(order.groups.len(), 1);
    }

    #[test]
    fn test_remove_group_updates_totals() {
        let mut order = order_with_groups(&[3000, 1550]);
        let id = order.groups[0].id.clone();
        order.remove_group(&id).unwrap();
        assert_eq!(order.total_payable.cents(), 1550);

        assert!(matches!(
            order.remove_group("missing"),
            Err(CoreError::Order(OrderError::GroupNotFound(_)))
        ));
    }

    #[test]
    fn test_update_observation() {
        let mut order = order();
        order.update_observation(Some("ring twice".into())).unwrap();
        assert_eq!(order.observation.as_deref(), Some("ring twice"));
        assert!(order.update_observation(Some("x".repeat(1000))).is_err());
        assert_eq!(order.observation.as_deref(), Some("ring twice"));
    }

    #[test]
    fn test_add_item_reuses_staging_group() {
        let mut order = order();
        let large = Product::new("Margherita", Money::from_cents(4000), "cat-pizza", "Large");
        let other = Product::new("Pepperoni", Money::from_cents(4400), "cat-pizza", "Large");
        let small = Product::new("Margherita", Money::from_cents(3000), "cat-pizza", "Small");

        order.add_item(&large, 0.5, None).unwrap();
        order.add_item(&other, 0.5, None).unwrap();
        order.add_item(&small, 1.0, None).unwrap();

        assert_eq!(order.groups.len(), 2);
        assert_eq!(order.groups[0].items.len(), 2);
        assert_eq!(order.groups[0].total.cents(), 4200);
        assert_eq!(order.total_payable.cents(), 7200);
        assert_eq!(order.quantity_items, 2.0);
    }

    #[test]
    fn test_add_item_after_pending_opens_new_group() {
        let mut order = order_with_groups(&[3000]);
        order.pending().unwrap();

        let product = Product::new("Margherita", Money::from_cents(3000), "cat-pizza", "Large");
        let item = order.add_item(&product, 1.0, None).unwrap();

        assert_eq!(order.groups.len(), 2);
        assert_eq!(order.groups[1].status, GroupItemStatus::Staging);
        assert_eq!(item.group_item_id.as_deref(), Some(order.groups[1].id.as_str()));

        order.pending().unwrap();
        assert_eq!(order.groups[1].status, GroupItemStatus::Pending);
    }

    #[test]
    fn test_add_item_invalid_quantity_leaves_order_unchanged() {
        let mut order = order();
        let product = Product::new("Margherita", Money::from_cents(3000), "cat-pizza", "Large");

        assert!(order.add_item(&product, 0.0, None).is_err());
        assert!(order.groups.is_empty());
    }

    #[test]
    fn test_remove_item() {
        let mut order = order_with_groups(&[3000, 1550]);
        let item_id = order.groups[1].items[0].id.clone();

        order.remove_item(&item_id).unwrap();
        assert_eq!(order.total_payable.cents(), 3000);
        assert!(matches!(
            order.remove_item(&item_id),
            Err(CoreError::GroupItem(GroupItemError::ItemNotFound(_)))
        ));
    }

    #[test]
    fn test_complement_updates_order_total() {
        let mut order = order_with_groups(&[4000]);
        let group_id = order.groups[0].id.clone();
        let border = Product::new("Cheese border", Money::from_cents(500), "cat-borders", "Large");

        let complement = order.add_complement(&group_id, &border).unwrap();
        assert_eq!(complement.price.cents(), 500);
        assert_eq!(order.total_payable.cents(), 4500);

        let removed = order.delete_complement(&group_id).unwrap();
        assert_eq!(removed.map(|item| item.id), Some(complement.id));
        assert_eq!(order.total_payable.cents(), 4000);

        let small = Product::new("Cheese border", Money::from_cents(300), "cat-borders", "Small");
        assert!(matches!(
            order.add_complement(&group_id, &small),
            Err(CoreError::GroupItem(GroupItemError::SizeMustBeTheSame))
        ));
        assert!(order.groups[0].complement_item.is_none());
    }
}
