//! # Order Repository
//!
//! Persists the whole order graph.
//!
//! ## Graph Layout
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  orders                                                                 │
//! │  ├── delivery_orders   (0..1, exclusive with table_orders)              │
//! │  ├── table_orders      (0..1)                                           │
//! │  ├── payments          (ordered by position)                            │
//! │  └── group_items       (ordered by position)                            │
//! │      ├── items         (ordered by position)                            │
//! │      └── complement    (items row with group_item_id NULL)              │
//! │                                                                         │
//! │  save(order): one transaction, upsert the order row, then replace      │
//! │  every child row. Either the whole graph lands or nothing does.        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use super::group_item::{delete_order_groups, fetch_order_groups, write_group};
use crate::error::{DbError, DbResult};
use bistro_core::{
    DeliveryOrder, Money, Order, OrderStatus, PaymentMethod, PaymentOrder, TableOrder,
};

// =============================================================================
// Row Mapping
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: String,
    order_number: i64,
    status: OrderStatus,
    observation: Option<String>,
    attendant_id: String,
    shift_id: String,
    total_payable_cents: i64,
    total_paid_cents: i64,
    total_change_cents: i64,
    quantity_items: f64,
    created_at: DateTime<Utc>,
    pending_at: Option<DateTime<Utc>>,
    finished_at: Option<DateTime<Utc>>,
    canceled_at: Option<DateTime<Utc>>,
    archived_at: Option<DateTime<Utc>>,
    start_at: Option<DateTime<Utc>>,
}

impl OrderRow {
    fn into_order(self) -> Order {
        Order {
            id: self.id,
            order_number: self.order_number,
            status: self.status,
            observation: self.observation,
            attendant_id: self.attendant_id,
            shift_id: self.shift_id,
            total_payable: Money::from_cents(self.total_payable_cents),
            total_paid: Money::from_cents(self.total_paid_cents),
            total_change: Money::from_cents(self.total_change_cents),
            quantity_items: self.quantity_items,
            created_at: self.created_at,
            pending_at: self.pending_at,
            finished_at: self.finished_at,
            canceled_at: self.canceled_at,
            archived_at: self.archived_at,
            start_at: self.start_at,
            delivery: None,
            table: None,
            groups: Vec::new(),
            payments: Vec::new(),
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct PaymentRow {
    id: String,
    order_id: String,
    amount_cents: i64,
    method: PaymentMethod,
    is_paid: bool,
    created_at: DateTime<Utc>,
}

impl From<PaymentRow> for PaymentOrder {
    fn from(row: PaymentRow) -> Self {
        PaymentOrder {
            id: row.id,
            order_id: row.order_id,
            amount: Money::from_cents(row.amount_cents),
            method: row.method,
            is_paid: row.is_paid,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct DeliveryRow {
    id: String,
    order_id: String,
    client_id: String,
    address_id: String,
    driver_id: Option<String>,
    delivery_tax_cents: i64,
}

impl From<DeliveryRow> for DeliveryOrder {
    fn from(row: DeliveryRow) -> Self {
        DeliveryOrder {
            id: row.id,
            order_id: row.order_id,
            client_id: row.client_id,
            address_id: row.address_id,
            driver_id: row.driver_id,
            delivery_tax: Money::from_cents(row.delivery_tax_cents),
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct TableRow {
    id: String,
    order_id: String,
    table_id: String,
    name: Option<String>,
}

impl From<TableRow> for TableOrder {
    fn from(row: TableRow) -> Self {
        TableOrder {
            id: row.id,
            order_id: row.order_id,
            table_id: row.table_id,
            name: row.name,
        }
    }
}

const SELECT_ORDER: &str = r#"
    SELECT id, order_number, status, observation, attendant_id, shift_id,
           total_payable_cents, total_paid_cents, total_change_cents,
           quantity_items, created_at, pending_at, finished_at, canceled_at,
           archived_at, start_at
    FROM orders
"#;

// =============================================================================
// Graph Helpers
// =============================================================================

/// Loads delivery, table, groups and payments for row-only orders.
async fn hydrate(conn: &mut SqliteConnection, rows: Vec<OrderRow>) -> DbResult<Vec<Order>> {
    let mut orders = Vec::with_capacity(rows.len());

    for row in rows {
        let mut order = row.into_order();

        let delivery: Option<DeliveryRow> = sqlx::query_as(
            r#"
            SELECT id, order_id, client_id, address_id, driver_id, delivery_tax_cents
            FROM delivery_orders WHERE order_id = ?1
            "#,
        )
        .bind(&order.id)
        .fetch_optional(&mut *conn)
        .await?;
        order.delivery = delivery.map(DeliveryOrder::from);

        let table: Option<TableRow> = sqlx::query_as(
            "SELECT id, order_id, table_id, name FROM table_orders WHERE order_id = ?1",
        )
        .bind(&order.id)
        .fetch_optional(&mut *conn)
        .await?;
        order.table = table.map(TableOrder::from);

        let payments: Vec<PaymentRow> = sqlx::query_as(
            r#"
            SELECT id, order_id, amount_cents, method, is_paid, created_at
            FROM payments WHERE order_id = ?1
            ORDER BY position, rowid
            "#,
        )
        .bind(&order.id)
        .fetch_all(&mut *conn)
        .await?;
        order.payments = payments.into_iter().map(PaymentOrder::from).collect();

        order.groups = fetch_order_groups(conn, &order.id).await?;

        orders.push(order);
    }

    Ok(orders)
}

/// Replaces every child row of the order with the in-memory graph.
async fn write_children(conn: &mut SqliteConnection, order: &Order) -> DbResult<()> {
    for table in ["delivery_orders", "table_orders", "payments"] {
        sqlx::query(&format!("DELETE FROM {table} WHERE order_id = ?1"))
            .bind(&order.id)
            .execute(&mut *conn)
            .await?;
    }
    delete_order_groups(conn, &order.id).await?;

    if let Some(delivery) = &order.delivery {
        sqlx::query(
            r#"
            INSERT INTO delivery_orders (
                id, order_id, client_id, address_id, driver_id, delivery_tax_cents
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&delivery.id)
        .bind(&order.id)
        .bind(&delivery.client_id)
        .bind(&delivery.address_id)
        .bind(&delivery.driver_id)
        .bind(delivery.delivery_tax.cents())
        .execute(&mut *conn)
        .await?;
    }

    if let Some(table) = &order.table {
        sqlx::query(
            "INSERT INTO table_orders (id, order_id, table_id, name) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(&table.id)
        .bind(&order.id)
        .bind(&table.table_id)
        .bind(&table.name)
        .execute(&mut *conn)
        .await?;
    }

    for (position, payment) in order.payments.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO payments (
                id, order_id, position, amount_cents, method, is_paid, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&payment.id)
        .bind(&order.id)
        .bind(position as i64)
        .bind(payment.amount.cents())
        .bind(payment.method)
        .bind(payment.is_paid)
        .bind(payment.created_at)
        .execute(&mut *conn)
        .await?;
    }

    for (position, group) in order.groups.iter().enumerate() {
        write_group(conn, group, position as i64).await?;
    }

    Ok(())
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for whole order graphs.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    /// Inserts a new order graph. Fails on a duplicate id.
    pub async fn create(&self, order: &Order) -> DbResult<()> {
        debug!(id = %order.id, order_number = order.order_number, "Creating order");

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO orders (
                id, order_number, status, observation, attendant_id, shift_id,
                total_payable_cents, total_paid_cents, total_change_cents,
                quantity_items, created_at, pending_at, finished_at,
                canceled_at, archived_at, start_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)
            "#,
        )
        .bind(&order.id)
        .bind(order.order_number)
        .bind(order.status)
        .bind(&order.observation)
        .bind(&order.attendant_id)
        .bind(&order.shift_id)
        .bind(order.total_payable.cents())
        .bind(order.total_paid.cents())
        .bind(order.total_change.cents())
        .bind(order.quantity_items)
        .bind(order.created_at)
        .bind(order.pending_at)
        .bind(order.finished_at)
        .bind(order.canceled_at)
        .bind(order.archived_at)
        .bind(order.start_at)
        .execute(&mut *tx)
        .await?;

        write_children(&mut tx, order).await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;
        Ok(())
    }

    /// Writes the order graph in one transaction. The order must exist.
    pub async fn save(&self, order: &Order) -> DbResult<()> {
        debug!(id = %order.id, status = ?order.status, "Saving order");

        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE orders SET
                order_number = ?2, status = ?3, observation = ?4,
                attendant_id = ?5, shift_id = ?6,
                total_payable_cents = ?7, total_paid_cents = ?8,
                total_change_cents = ?9, quantity_items = ?10,
                pending_at = ?11, finished_at = ?12, canceled_at = ?13,
                archived_at = ?14, start_at = ?15
            WHERE id = ?1
            "#,
        )
        .bind(&order.id)
        .bind(order.order_number)
        .bind(order.status)
        .bind(&order.observation)
        .bind(&order.attendant_id)
        .bind(&order.shift_id)
        .bind(order.total_payable.cents())
        .bind(order.total_paid.cents())
        .bind(order.total_change.cents())
        .bind(order.quantity_items)
        .bind(order.pending_at)
        .bind(order.finished_at)
        .bind(order.canceled_at)
        .bind(order.archived_at)
        .bind(order.start_at)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Order", &order.id));
        }

        write_children(&mut tx, order).await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;
        Ok(())
    }

    /// Loads the full graph: groups, items, complements, payments and
    /// delivery/table details.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Order>> {
        let mut conn = self.pool.acquire().await?;

        let row: Option<OrderRow> = sqlx::query_as(&format!("{SELECT_ORDER} WHERE id = ?1"))
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;

        match row {
            Some(row) => Ok(hydrate(&mut conn, vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    /// Deletes the order and everything it owns.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting order");

        let mut tx = self.pool.begin().await?;

        delete_order_groups(&mut tx, id).await?;
        let result = sqlx::query("DELETE FROM orders WHERE id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Order", id));
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;
        Ok(())
    }

    /// Orders in a status, oldest first.
    pub async fn list_by_status(&self, status: OrderStatus) -> DbResult<Vec<Order>> {
        let mut conn = self.pool.acquire().await?;

        let rows: Vec<OrderRow> = sqlx::query_as(&format!(
            "{SELECT_ORDER} WHERE status = ?1 ORDER BY created_at, rowid"
        ))
        .bind(status)
        .fetch_all(&mut *conn)
        .await?;

        hydrate(&mut conn, rows).await
    }

    /// Orders of a shift by order number.
    pub async fn list_by_shift(&self, shift_id: &str) -> DbResult<Vec<Order>> {
        let mut conn = self.pool.acquire().await?;

        let rows: Vec<OrderRow> = sqlx::query_as(&format!(
            "{SELECT_ORDER} WHERE shift_id = ?1 ORDER BY order_number"
        ))
        .bind(shift_id)
        .fetch_all(&mut *conn)
        .await?;

        hydrate(&mut conn, rows).await
    }
}

// =============================================================================
// Tests
// =============================================================================
