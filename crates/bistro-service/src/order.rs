//! # Order Service
//!
//! Order lifecycle, payments and order details. Each call is one unit of
//! work on the order aggregate:
//!
//! ```text
//! lock(order_id) ──► load graph ──► Order::<transition>() ──► save graph
//!                                        │
//!                                        └── error: nothing is written
//! ```

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use bistro_core::{DeliveryOrder, Money, Order, OrderStatus, PaymentMethod, PaymentOrder, TableOrder};

use crate::context::ServiceContext;
use crate::error::{ServiceError, ServiceResult};

#[derive(Debug, Clone)]
pub struct OrderService {
    ctx: ServiceContext,
    reject_overpayment: bool,
}

impl OrderService {
    pub fn new(ctx: ServiceContext, reject_overpayment: bool) -> Self {
        OrderService {
            ctx,
            reject_overpayment,
        }
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub async fn get(&self, id: &str) -> ServiceResult<Order> {
        self.ctx.load_order(id).await
    }

    pub async fn list_by_status(&self, status: OrderStatus) -> ServiceResult<Vec<Order>> {
        Ok(self.ctx.db.orders().list_by_status(status).await?)
    }

    pub async fn list_by_shift(&self, shift_id: &str) -> ServiceResult<Vec<Order>> {
        Ok(self.ctx.db.orders().list_by_shift(shift_id).await?)
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Opens a staging order with the shift's next order number.
    pub async fn create(&self, shift_id: &str, attendant_id: &str) -> ServiceResult<Order> {
        let _guard = self.ctx.locks.lock(shift_id).await;

        let mut shift = self
            .ctx
            .db
            .shifts()
            .get_by_id(shift_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Shift", shift_id))?;

        let number = shift.next_order_number()?;
        let order = Order::new(&shift.id, number, attendant_id)?;

        self.ctx.db.shifts().save(&shift).await?;
        self.ctx.db.orders().create(&order).await?;

        info!(order_id = %order.id, order_number = number, shift_id = %shift_id, "Order created");
        Ok(order)
    }

    /// Sends the order and every live group to the kitchen.
    pub async fn pending(&self, id: &str) -> ServiceResult<Order> {
        let (order, ()) = self.ctx.update_order(id, Order::pending).await?;
        info!(order_id = %id, total = %order.total_payable, "Order pending");
        Ok(order)
    }

    pub async fn finish(&self, id: &str) -> ServiceResult<Order> {
        let (order, ()) = self.ctx.update_order(id, Order::finish).await?;
        info!(order_id = %id, "Order finished");
        Ok(order)
    }

    pub async fn cancel(&self, id: &str) -> ServiceResult<Order> {
        let (order, ()) = self.ctx.update_order(id, Order::cancel).await?;
        info!(order_id = %id, "Order canceled");
        Ok(order)
    }

    pub async fn archive(&self, id: &str) -> ServiceResult<Order> {
        let (order, ()) = self.ctx.update_order(id, Order::archive).await?;
        info!(order_id = %id, "Order archived");
        Ok(order)
    }

    pub async fn unarchive(&self, id: &str) -> ServiceResult<Order> {
        let (order, ()) = self.ctx.update_order(id, Order::unarchive).await?;
        info!(order_id = %id, status = ?order.status, "Order unarchived");
        Ok(order)
    }

    /// Sets or clears the scheduled start.
    pub async fn schedule(&self, id: &str, start_at: Option<DateTime<Utc>>) -> ServiceResult<Order> {
        let (order, ()) = self
            .ctx
            .update_order(id, |order| {
                order.schedule(start_at);
                Ok(())
            })
            .await?;

        debug!(order_id = %id, start_at = ?start_at, "Order scheduled");
        Ok(order)
    }

    pub async fn delete(&self, id: &str) -> ServiceResult<()> {
        let _guard = self.ctx.locks.lock(id).await;
        self.ctx.db.orders().delete(id).await?;

        info!(order_id = %id, "Order deleted");
        Ok(())
    }

    // =========================================================================
    // Payments
    // =========================================================================

    /// Records a payment against a pending order and recomputes the change.
    ///
    /// With `orders.reject_overpayment` on, a payment that leaves the order
    /// overpaid is refused and nothing is stored.
    pub async fn add_payment(
        &self,
        id: &str,
        amount: Money,
        method: PaymentMethod,
    ) -> ServiceResult<Order> {
        let reject_overpayment = self.reject_overpayment;

        let (order, payment_id) = self
            .ctx
            .update_order(id, |order| {
                order.validate_payments()?;

                let payment = PaymentOrder::new(&order.id, amount, method)?;
                let payment_id = payment.id.clone();
                order.add_payment(payment);

                if reject_overpayment {
                    order.validate_payments()?;
                }
                order.calculate_total_change();
                Ok(payment_id)
            })
            .await?;

        info!(
            order_id = %id,
            payment_id = %payment_id,
            amount = %amount,
            method = ?method,
            total_paid = %order.total_paid,
            total_change = %order.total_change,
            "Payment added"
        );
        Ok(order)
    }

    // =========================================================================
    // Details
    // =========================================================================

    pub async fn attach_delivery(
        &self,
        id: &str,
        client_id: &str,
        address_id: &str,
        driver_id: Option<String>,
        delivery_tax: Money,
    ) -> ServiceResult<Order> {
        let (order, ()) = self
            .ctx
            .update_order(id, |order| {
                let mut delivery = DeliveryOrder::new(&order.id, client_id, address_id, delivery_tax)?;
                delivery.driver_id = driver_id;
                order.attach_delivery(delivery)
            })
            .await?;

        info!(order_id = %id, delivery_tax = %delivery_tax, "Delivery attached");
        Ok(order)
    }

    pub async fn attach_table(
        &self,
        id: &str,
        table_id: &str,
        name: Option<String>,
    ) -> ServiceResult<Order> {
        let (order, ()) = self
            .ctx
            .update_order(id, |order| {
                let table = TableOrder::new(&order.id, table_id, name)?;
                order.attach_table(table)
            })
            .await?;

        info!(order_id = %id, table_id = %table_id, "Table attached");
        Ok(order)
    }

    pub async fn detach_order_type(&self, id: &str) -> ServiceResult<Order> {
        let (order, ()) = self.ctx.update_order(id, Order::detach_order_type).await?;
        debug!(order_id = %id, "Order type detached");
        Ok(order)
    }

    pub async fn update_observation(
        &self,
        id: &str,
        observation: Option<String>,
    ) -> ServiceResult<Order> {
        let (order, ()) = self
            .ctx
            .update_order(id, |order| order.update_observation(observation))
            .await?;
        Ok(order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{seed_catalog, test_services};
    use bistro_core::{CoreError, GroupItemStatus, OrderError, ShiftError};

    #[tokio::test]
    async fn test_full_order_flow() {
        let app = test_services().await;
        let catalog = seed_catalog(&app).await;
        let shift = app.shifts.open("attendant-1").await.unwrap();

        let order = app.orders.create(&shift.id, "attendant-1").await.unwrap();
        assert_eq!(order.order_number, 1);
        assert_eq!(order.status, OrderStatus::Staging);

        app.items
            .add_to_order(&order.id, &catalog.pizza.id, &catalog.whole.id, None)
            .await
            .unwrap();
        app.items
            .add_to_order(&order.id, &catalog.soda.id, &catalog.one_drink.id, None)
            .await
            .unwrap();

        let order = app.orders.pending(&order.id).await.unwrap();
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.total_payable.cents(), 4550);
        assert!(order
            .groups
            .iter()
            .all(|group| group.status == GroupItemStatus::Pending));

        let order = app
            .orders
            .add_payment(&order.id, Money::from_cents(5000), PaymentMethod::Cash)
            .await
            .unwrap();
        assert_eq!(order.total_paid.cents(), 5000);
        assert_eq!(order.total_change.cents(), 450);

        let order = app.orders.finish(&order.id).await.unwrap();
        assert_eq!(order.status, OrderStatus::Finished);

        let order = app.orders.archive(&order.id).await.unwrap();
        assert_eq!(order.status, OrderStatus::Archived);

        let stored = app.orders.get(&order.id).await.unwrap();
        assert_eq!(stored, order);
        assert_eq!(stored.payments.len(), 1);
    }

    #[tokio::test]
    async fn test_order_numbers_follow_shift() {
        let app = test_services().await;
        let shift = app.shifts.open("attendant-1").await.unwrap();

        let first = app.orders.create(&shift.id, "attendant-1").await.unwrap();
        let second = app.orders.create(&shift.id, "attendant-2").await.unwrap();
        assert_eq!((first.order_number, second.order_number), (1, 2));

        app.shifts.close(&shift.id).await.unwrap();
        let err = app.orders.create(&shift.id, "attendant-1").await.unwrap_err();
        assert!(matches!(err, ServiceError::Core(CoreError::Shift(ShiftError::AlreadyClosed))));

        assert_eq!(app.orders.list_by_shift(&shift.id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_failed_pending_is_not_saved() {
        let app = test_services().await;
        let shift = app.shifts.open("attendant-1").await.unwrap();
        let order = app.orders.create(&shift.id, "attendant-1").await.unwrap();

        let err = app.orders.pending(&order.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::Core(CoreError::Order(OrderError::WithoutItems))));

        let stored = app.orders.get(&order.id).await.unwrap();
        assert_eq!(stored.status, OrderStatus::Staging);
        assert!(stored.pending_at.is_none());
    }

    #[tokio::test]
    async fn test_payment_requires_pending() {
        let app = test_services().await;
        let shift = app.shifts.open("attendant-1").await.unwrap();
        let order = app.orders.create(&shift.id, "attendant-1").await.unwrap();

        let err = app
            .orders
            .add_payment(&order.id, Money::from_cents(1000), PaymentMethod::Visa)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Core(CoreError::Order(OrderError::MustBePending))));
        assert!(app.orders.get(&order.id).await.unwrap().payments.is_empty());
    }

    #[tokio::test]
    async fn test_reject_overpayment() {
        let mut app = test_services().await;
        app.orders = OrderService::new(app.context(), true);
        let catalog = seed_catalog(&app).await;
        let shift = app.shifts.open("attendant-1").await.unwrap();
        let order = app.orders.create(&shift.id, "attendant-1").await.unwrap();
        app.items
            .add_to_order(&order.id, &catalog.soda.id, &catalog.one_drink.id, None)
            .await
            .unwrap();
        app.orders.pending(&order.id).await.unwrap();

        let err = app
            .orders
            .add_payment(&order.id, Money::from_cents(2000), PaymentMethod::Cash)
            .await
            .unwrap_err();
        assert_eq!(err.code(), crate::ErrorCode::PaymentError);

        let order = app
            .orders
            .add_payment(&order.id, Money::from_cents(550), PaymentMethod::Cash)
            .await
            .unwrap();
        assert_eq!(order.total_paid.cents(), 550);
        assert!(order.total_change.is_zero());
    }

    #[tokio::test]
    async fn test_cancel_then_unarchive() {
        let app = test_services().await;
        let catalog = seed_catalog(&app).await;
        let shift = app.shifts.open("attendant-1").await.unwrap();
        let order = app.orders.create(&shift.id, "attendant-1").await.unwrap();
        app.items
            .add_to_order(&order.id, &catalog.pizza.id, &catalog.whole.id, None)
            .await
            .unwrap();

        let order = app.orders.cancel(&order.id).await.unwrap();
        assert!(order.groups.iter().all(|group| group.is_canceled()));

        app.orders.archive(&order.id).await.unwrap();
        let order = app.orders.unarchive(&order.id).await.unwrap();
        assert_eq!(order.status, OrderStatus::Canceled);

        let stored = app.orders.get(&order.id).await.unwrap();
        assert_eq!(stored.status, OrderStatus::Canceled);
        assert!(stored.archived_at.is_none());
    }

    #[tokio::test]
    async fn test_delivery_and_table_details() {
        let app = test_services().await;
        let shift = app.shifts.open("attendant-1").await.unwrap();
        let order = app.orders.create(&shift.id, "attendant-1").await.unwrap();

        let order = app
            .orders
            .attach_delivery(&order.id, "client-1", "address-1", None, Money::from_cents(700))
            .await
            .unwrap();
        assert_eq!(order.total_payable.cents(), 700);

        let err = app
            .orders
            .attach_table(&order.id, "table-4", None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Core(CoreError::Order(OrderError::OrderTypeAlreadySet(_)))
        ));

        app.orders.detach_order_type(&order.id).await.unwrap();
        let order = app
            .orders
            .attach_table(&order.id, "table-4", Some("Ana".into()))
            .await
            .unwrap();
        assert_eq!(order.table.as_ref().map(|t| t.table_id.as_str()), Some("table-4"));

        let stored = app.orders.get(&order.id).await.unwrap();
        assert!(stored.delivery.is_none());
        assert_eq!(stored.total_payable.cents(), 0);
    }

    #[tokio::test]
    async fn test_schedule_observation_and_delete() {
        let app = test_services().await;
        let shift = app.shifts.open("attendant-1").await.unwrap();
        let order = app.orders.create(&shift.id, "attendant-1").await.unwrap();

        let start_at = Utc::now() + chrono::Duration::hours(2);
        let order = app.orders.schedule(&order.id, Some(start_at)).await.unwrap();
        assert_eq!(order.start_at, Some(start_at));

        let order = app
            .orders
            .update_observation(&order.id, Some("no onions".into()))
            .await
            .unwrap();
        assert_eq!(order.observation.as_deref(), Some("no onions"));

        app.orders.delete(&order.id).await.unwrap();
        let err = app.orders.get(&order.id).await.unwrap_err();
        assert_eq!(err.code(), crate::ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_concurrent_payments_are_serialized() {
        let app = test_services().await;
        let catalog = seed_catalog(&app).await;
        let shift = app.shifts.open("attendant-1").await.unwrap();
        let order = app.orders.create(&shift.id, "attendant-1").await.unwrap();
        app.items
            .add_to_order(&order.id, &catalog.pizza.id, &catalog.whole.id, None)
            .await
            .unwrap();
        app.orders.pending(&order.id).await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..4 {
            let orders = app.orders.clone();
            let id = order.id.clone();
            handles.push(tokio::spawn(async move {
                orders
                    .add_payment(&id, Money::from_cents(1000), PaymentMethod::Cash)
                    .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let stored = app.orders.get(&order.id).await.unwrap();
        assert_eq!(stored.payments.len(), 4);
        assert_eq!(stored.total_paid.cents(), 4000);
    }
}
