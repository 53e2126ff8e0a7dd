//! # Group Item Repository
//!
//! Groups are stored with their items and their complement item.
//!
//! ## Write Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  save(group)  (one transaction)                                         │
//! │                                                                         │
//! │  1. DELETE previous complement item (looked up through the old row)     │
//! │  2. DELETE items WHERE group_item_id = group.id                        │
//! │  3. UPSERT group_items row                                             │
//! │  4. INSERT items in order, then the complement (group_item_id NULL)    │
//! │                                                                         │
//! │  The stored group is always exactly the in-memory group.               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use super::item::{fetch_group_items, fetch_item, upsert_item};
use crate::error::{DbError, DbResult};
use bistro_core::{GroupItem, GroupItemStatus, Money};

// =============================================================================
// Row Mapping
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct GroupItemRow {
    id: String,
    order_id: String,
    category_id: String,
    size: String,
    quantity: f64,
    total_cents: i64,
    status: GroupItemStatus,
    observation: Option<String>,
    complement_item_id: Option<String>,
    created_at: DateTime<Utc>,
    pending_at: Option<DateTime<Utc>>,
    started_at: Option<DateTime<Utc>>,
    ready_at: Option<DateTime<Utc>>,
    canceled_at: Option<DateTime<Utc>>,
}

impl GroupItemRow {
    fn into_group(self) -> GroupItem {
        GroupItem {
            id: self.id,
            order_id: self.order_id,
            category_id: self.category_id,
            size: self.size,
            quantity: self.quantity,
            total: Money::from_cents(self.total_cents),
            status: self.status,
            observation: self.observation,
            complement_item_id: self.complement_item_id,
            complement_item: None,
            items: Vec::new(),
            created_at: self.created_at,
            pending_at: self.pending_at,
            started_at: self.started_at,
            ready_at: self.ready_at,
            canceled_at: self.canceled_at,
        }
    }
}

const SELECT_GROUP: &str = r#"
    SELECT id, order_id, category_id, size, quantity, total_cents, status,
           observation, complement_item_id, created_at, pending_at,
           started_at, ready_at, canceled_at
    FROM group_items
"#;

// =============================================================================
// Connection-level Helpers
// =============================================================================

/// Loads items and complement into row-only groups.
async fn hydrate(conn: &mut SqliteConnection, rows: Vec<GroupItemRow>) -> DbResult<Vec<GroupItem>> {
    let mut groups = Vec::with_capacity(rows.len());

    for row in rows {
        let mut group = row.into_group();
        group.items = fetch_group_items(conn, &group.id).await?;
        if let Some(complement_id) = group.complement_item_id.clone() {
            group.complement_item = fetch_item(conn, &complement_id).await?;
        }
        groups.push(group);
    }

    Ok(groups)
}

pub(crate) async fn fetch_group(
    conn: &mut SqliteConnection,
    id: &str,
    with_relations: bool,
) -> DbResult<Option<GroupItem>> {
    let row: Option<GroupItemRow> = sqlx::query_as(&format!("{SELECT_GROUP} WHERE id = ?1"))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    if !with_relations {
        return Ok(Some(row.into_group()));
    }

    Ok(hydrate(conn, vec![row]).await?.pop())
}

/// Groups of an order with their items, in insertion order.
pub(crate) async fn fetch_order_groups(
    conn: &mut SqliteConnection,
    order_id: &str,
) -> DbResult<Vec<GroupItem>> {
    let rows: Vec<GroupItemRow> = sqlx::query_as(&format!(
        "{SELECT_GROUP} WHERE order_id = ?1 ORDER BY position, rowid"
    ))
    .bind(order_id)
    .fetch_all(&mut *conn)
    .await?;

    hydrate(conn, rows).await
}

/// Writes a group row with its items and complement, replacing whatever
/// was stored for it before.
pub(crate) async fn write_group(
    conn: &mut SqliteConnection,
    group: &GroupItem,
    position: i64,
) -> DbResult<()> {
    delete_group_children(conn, &group.id).await?;

    sqlx::query(
        r#"
        INSERT INTO group_items (
            id, order_id, position, category_id, size, quantity, total_cents,
            status, observation, complement_item_id, created_at, pending_at,
            started_at, ready_at, canceled_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
        ON CONFLICT(id) DO UPDATE SET
            position           = excluded.position,
            category_id        = excluded.category_id,
            size               = excluded.size,
            quantity           = excluded.quantity,
            total_cents        = excluded.total_cents,
            status             = excluded.status,
            observation        = excluded.observation,
            complement_item_id = excluded.complement_item_id,
            pending_at         = excluded.pending_at,
            started_at         = excluded.started_at,
            ready_at           = excluded.ready_at,
            canceled_at        = excluded.canceled_at
        "#,
    )
    .bind(&group.id)
    .bind(&group.order_id)
    .bind(position)
    .bind(&group.category_id)
    .bind(&group.size)
    .bind(group.quantity)
    .bind(group.total.cents())
    .bind(group.status)
    .bind(&group.observation)
    .bind(&group.complement_item_id)
    .bind(group.created_at)
    .bind(group.pending_at)
    .bind(group.started_at)
    .bind(group.ready_at)
    .bind(group.canceled_at)
    .execute(&mut *conn)
    .await?;

    for (index, item) in group.items.iter().enumerate() {
        upsert_item(conn, item, index as i64).await?;
    }
    if let Some(complement) = &group.complement_item {
        upsert_item(conn, complement, 0).await?;
    }

    Ok(())
}

/// Removes the items and the complement currently stored for a group.
async fn delete_group_children(conn: &mut SqliteConnection, group_id: &str) -> DbResult<()> {
    sqlx::query(
        r#"
        DELETE FROM items
        WHERE id = (SELECT complement_item_id FROM group_items WHERE id = ?1)
        "#,
    )
    .bind(group_id)
    .execute(&mut *conn)
    .await?;

    sqlx::query("DELETE FROM items WHERE group_item_id = ?1")
        .bind(group_id)
        .execute(&mut *conn)
        .await?;

    Ok(())
}

/// Deletes every group of an order together with items and complements.
pub(crate) async fn delete_order_groups(conn: &mut SqliteConnection, order_id: &str) -> DbResult<()> {
    sqlx::query(
        r#"
        DELETE FROM items WHERE id IN (
            SELECT complement_item_id FROM group_items
            WHERE order_id = ?1 AND complement_item_id IS NOT NULL
        )
        "#,
    )
    .bind(order_id)
    .execute(&mut *conn)
    .await?;

    // Items go with their group through ON DELETE CASCADE.
    sqlx::query("DELETE FROM group_items WHERE order_id = ?1")
        .bind(order_id)
        .execute(&mut *conn)
        .await?;

    Ok(())
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for group items.
#[derive(Debug, Clone)]
pub struct GroupItemRepository {
    pool: SqlitePool,
}

impl GroupItemRepository {
    pub fn new(pool: SqlitePool) -> Self {
        GroupItemRepository { pool }
    }

    /// Appends a new group to the end of its order.
    pub async fn create(&self, group: &GroupItem) -> DbResult<()> {
        debug!(id = %group.id, order_id = %group.order_id, "Creating group item");

        let mut tx = self.pool.begin().await?;

        let exists: Option<String> = sqlx::query_scalar("SELECT id FROM group_items WHERE id = ?1")
            .bind(&group.id)
            .fetch_optional(&mut *tx)
            .await?;
        if exists.is_some() {
            return Err(DbError::UniqueViolation {
                field: "group_items.id".to_string(),
                value: group.id.clone(),
            });
        }

        let position: i64 = sqlx::query_scalar(
            "SELECT COALESCE(MAX(position) + 1, 0) FROM group_items WHERE order_id = ?1",
        )
        .bind(&group.order_id)
        .fetch_one(&mut *tx)
        .await?;

        write_group(&mut tx, group, position).await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;
        Ok(())
    }

    /// Writes the group with its items and complement. Keeps its position.
    pub async fn save(&self, group: &GroupItem) -> DbResult<()> {
        debug!(id = %group.id, status = ?group.status, "Saving group item");

        let mut tx = self.pool.begin().await?;

        let position: Option<i64> =
            sqlx::query_scalar("SELECT position FROM group_items WHERE id = ?1")
                .bind(&group.id)
                .fetch_optional(&mut *tx)
                .await?;
        let position = position.ok_or_else(|| DbError::not_found("GroupItem", &group.id))?;

        write_group(&mut tx, group, position).await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;
        Ok(())
    }

    /// Loads a group. With `with_relations` its items and complement too.
    pub async fn get_by_id(&self, id: &str, with_relations: bool) -> DbResult<Option<GroupItem>> {
        let mut conn = self.pool.acquire().await?;
        fetch_group(&mut conn, id, with_relations).await
    }

    /// The group that links `item_id` as its complement.
    pub async fn get_by_complement(&self, item_id: &str) -> DbResult<Option<GroupItem>> {
        let row: Option<GroupItemRow> =
            sqlx::query_as(&format!("{SELECT_GROUP} WHERE complement_item_id = ?1"))
                .bind(item_id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(GroupItemRow::into_group))
    }

    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting group item");

        let mut tx = self.pool.begin().await?;

        delete_group_children(&mut tx, id).await?;
        let result = sqlx::query("DELETE FROM group_items WHERE id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("GroupItem", id));
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;
        Ok(())
    }

    /// Groups of one order in a given status (kitchen views).
    pub async fn list_by_order_and_status(
        &self,
        order_id: &str,
        status: GroupItemStatus,
    ) -> DbResult<Vec<GroupItem>> {
        let mut conn = self.pool.acquire().await?;

        let rows: Vec<GroupItemRow> = sqlx::query_as(&format!(
            "{SELECT_GROUP} WHERE order_id = ?1 AND status = ?2 ORDER BY position, rowid"
        ))
        .bind(order_id)
        .bind(status)
        .fetch_all(&mut *conn)
        .await?;

        hydrate(&mut conn, rows).await
    }

    /// Groups in a given status across all orders, oldest first.
    pub async fn list_by_status(&self, status: GroupItemStatus) -> DbResult<Vec<GroupItem>> {
        let mut conn = self.pool.acquire().await?;

        let rows: Vec<GroupItemRow> = sqlx::query_as(&format!(
            "{SELECT_GROUP} WHERE status = ?1 ORDER BY created_at, rowid"
        ))
        .bind(status)
        .fetch_all(&mut *conn)
        .await?;

        hydrate(&mut conn, rows).await
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::{seed_order_with_group, test_db};
    use bistro_core::{Item, ItemStatus, Product};

    #[tokio::test]
    async fn test_get_with_and_without_relations() {
        let db = test_db().await;
        let (_, group, _) = seed_order_with_group(&db).await;

        let bare = db.group_items().get_by_id(&group.id, false).await.unwrap().unwrap();
        assert!(bare.items.is_empty());
        assert_eq!(bare.total, group.total);

        let full = db.group_items().get_by_id(&group.id, true).await.unwrap().unwrap();
        assert_eq!(full, group);
    }

    #[tokio::test]
    async fn test_save_with_complement() {
        let db = test_db().await;
        let (_, mut group, product) = seed_order_with_group(&db).await;

        let border = Product::new(
            "Cheese border",
            Money::from_cents(500),
            &product.category_id,
            &product.size,
        );
        group.add_complement_item(&border).unwrap();
        db.group_items().save(&group).await.unwrap();

        let loaded = db.group_items().get_by_id(&group.id, true).await.unwrap().unwrap();
        assert_eq!(loaded.complement_item, group.complement_item);
        assert_eq!(loaded.total, group.total);

        // Detaching removes the stored complement row.
        let complement_id = group.complement_item_id.clone().unwrap();
        group.delete_complement_item();
        db.group_items().save(&group).await.unwrap();

        assert!(db.items().get_by_id(&complement_id).await.unwrap().is_none());
        let loaded = db.group_items().get_by_id(&group.id, true).await.unwrap().unwrap();
        assert!(loaded.complement_item.is_none());
    }

    #[tokio::test]
    async fn test_get_by_complement() {
        let db = test_db().await;
        let (order, mut group, product) = seed_order_with_group(&db).await;

        let border = Product::new(
            "Cheese border",
            Money::from_cents(500),
            &product.category_id,
            &product.size,
        );
        let complement_id = group.add_complement_item(&border).unwrap().id.clone();
        db.group_items().save(&group).await.unwrap();

        let owner = db.group_items().get_by_complement(&complement_id).await.unwrap().unwrap();
        assert_eq!(owner.id, group.id);
        assert_eq!(owner.order_id, order.id);

        let plain = &group.items[0].id;
        assert!(db.group_items().get_by_complement(plain).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_replaces_items() {
        let db = test_db().await;
        let (_, mut group, product) = seed_order_with_group(&db).await;

        let extra = Item::from_product(&product, 0.5, &group.id, None).unwrap();
        group.add_item(extra).unwrap();
        let first = group.items[0].id.clone();
        group.remove_item(&first).unwrap();
        db.group_items().save(&group).await.unwrap();

        let loaded = db.group_items().get_by_id(&group.id, true).await.unwrap().unwrap();
        assert_eq!(loaded.items.len(), 1);
        assert_eq!(loaded.items[0].quantity, 0.5);
        assert!(db.items().get_by_id(&first).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_by_status() {
        let db = test_db().await;
        let (order, mut group, product) = seed_order_with_group(&db).await;

        let mut second = GroupItem::for_product(&order.id, &product);
        let item = Item::from_product(&product, 1.0, &second.id, None).unwrap();
        second.add_item(item).unwrap();
        db.group_items().create(&second).await.unwrap();

        group.pending().unwrap();
        db.group_items().save(&group).await.unwrap();

        let pending = db.group_items().list_by_status(GroupItemStatus::Pending).await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, group.id);
        assert!(pending[0].items.iter().all(|i| i.status == ItemStatus::Pending));

        let staging = db
            .group_items()
            .list_by_order_and_status(&order.id, GroupItemStatus::Staging)
            .await
            .unwrap();
        assert_eq!(staging.len(), 1);
        assert_eq!(staging[0].id, second.id);
    }

    #[tokio::test]
    async fn test_delete_cascades_to_items() {
        let db = test_db().await;
        let (_, group, _) = seed_order_with_group(&db).await;

        db.group_items().delete(&group.id).await.unwrap();

        assert!(db.group_items().get_by_id(&group.id, false).await.unwrap().is_none());
        assert!(db.items().get_by_id(&group.items[0].id).await.unwrap().is_none());
        assert!(matches!(
            db.group_items().delete(&group.id).await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_save_missing_group() {
        let db = test_db().await;
        let (order, _, product) = seed_order_with_group(&db).await;

        let ghost = GroupItem::for_product(&order.id, &product);
        assert!(matches!(
            db.group_items().save(&ghost).await,
            Err(DbError::NotFound { .. })
        ));
    }
}
