//! # Item Repository
//!
//! Single-item access plus the row helpers the group and order repositories
//! use to write item lists.
//!
//! Items are normally written as part of their group (see
//! [`GroupItemRepository::save`](super::group_item::GroupItemRepository::save)).
//! This repository covers the cases where one item changes on its own.

use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use bistro_core::{Item, ItemStatus, Money};

// =============================================================================
// Row Mapping
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct ItemRow {
    id: String,
    group_item_id: Option<String>,
    product_id: String,
    name: String,
    description: Option<String>,
    observation: Option<String>,
    size: String,
    price_cents: i64,
    quantity: f64,
    status: ItemStatus,
}

impl From<ItemRow> for Item {
    fn from(row: ItemRow) -> Self {
        Item {
            id: row.id,
            group_item_id: row.group_item_id,
            product_id: row.product_id,
            name: row.name,
            description: row.description,
            observation: row.observation,
            size: row.size,
            price: Money::from_cents(row.price_cents),
            quantity: row.quantity,
            status: row.status,
        }
    }
}

const SELECT_ITEM: &str = r#"
    SELECT id, group_item_id, product_id, name, description, observation,
           size, price_cents, quantity, status
    FROM items
"#;

// =============================================================================
// Connection-level Helpers
// =============================================================================

/// Inserts or updates one item row. `position` is kept on update.
pub(crate) async fn upsert_item(
    conn: &mut SqliteConnection,
    item: &Item,
    position: i64,
) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO items (
            id, group_item_id, position, product_id, name, description,
            observation, size, price_cents, quantity, status
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
        ON CONFLICT(id) DO UPDATE SET
            group_item_id = excluded.group_item_id,
            name          = excluded.name,
            description   = excluded.description,
            observation   = excluded.observation,
            size          = excluded.size,
            price_cents   = excluded.price_cents,
            quantity      = excluded.quantity,
            status        = excluded.status
        "#,
    )
    .bind(&item.id)
    .bind(&item.group_item_id)
    .bind(position)
    .bind(&item.product_id)
    .bind(&item.name)
    .bind(&item.description)
    .bind(&item.observation)
    .bind(&item.size)
    .bind(item.price.cents())
    .bind(item.quantity)
    .bind(item.status)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

pub(crate) async fn fetch_item(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Item>> {
    let row: Option<ItemRow> = sqlx::query_as(&format!("{SELECT_ITEM} WHERE id = ?1"))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(row.map(Item::from))
}

/// Items of a group, in insertion order.
pub(crate) async fn fetch_group_items(
    conn: &mut SqliteConnection,
    group_item_id: &str,
) -> DbResult<Vec<Item>> {
    let rows: Vec<ItemRow> = sqlx::query_as(&format!(
        "{SELECT_ITEM} WHERE group_item_id = ?1 ORDER BY position, rowid"
    ))
    .bind(group_item_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(rows.into_iter().map(Item::from).collect())
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for individual items.
#[derive(Debug, Clone)]
pub struct ItemRepository {
    pool: SqlitePool,
}

impl ItemRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ItemRepository { pool }
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Item>> {
        let mut conn = self.pool.acquire().await?;
        fetch_item(&mut conn, id).await
    }

    /// Writes the item's current state. The item must already exist.
    pub async fn save(&self, item: &Item) -> DbResult<()> {
        debug!(id = %item.id, status = ?item.status, "Saving item");

        let result = sqlx::query(
            r#"
            UPDATE items SET
                name = ?2, description = ?3, observation = ?4, size = ?5,
                price_cents = ?6, quantity = ?7, status = ?8
            WHERE id = ?1
            "#,
        )
        .bind(&item.id)
        .bind(&item.name)
        .bind(&item.description)
        .bind(&item.observation)
        .bind(&item.size)
        .bind(item.price.cents())
        .bind(item.quantity)
        .bind(item.status)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Item", &item.id));
        }

        Ok(())
    }

    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting item");

        let result = sqlx::query("DELETE FROM items WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Item", id));
        }

        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::{seed_order_with_group, test_db};

    #[tokio::test]
    async fn test_get_by_id() {
        let db = test_db().await;
        let (_, mut group, product) = seed_order_with_group(&db).await;

        let item = Item::from_product(&product, 2.0, &group.id, Some("well done".into())).unwrap();
        group.add_item(item.clone()).unwrap();
        db.group_items().save(&group).await.unwrap();

        let loaded = db.items().get_by_id(&item.id).await.unwrap().unwrap();
        assert_eq!(loaded, item);
        assert_eq!(loaded.price.cents(), product.price_cents * 2);
        assert!(db.items().get_by_id("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_status() {
        let db = test_db().await;
        let (_, group, _) = seed_order_with_group(&db).await;

        let mut item = group.items[0].clone();
        item.pending().unwrap();
        item.start().unwrap();
        db.items().save(&item).await.unwrap();

        let loaded = db.items().get_by_id(&item.id).await.unwrap().unwrap();
        assert_eq!(loaded.status, ItemStatus::Started);
    }

    #[tokio::test]
    async fn test_save_and_delete_missing() {
        let db = test_db().await;
        let (_, group, _) = seed_order_with_group(&db).await;

        let mut ghost = group.items[0].clone();
        ghost.id = "missing".to_string();
        assert!(matches!(
            db.items().save(&ghost).await,
            Err(DbError::NotFound { .. })
        ));
        assert!(matches!(
            db.items().delete("missing").await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_delete() {
        let db = test_db().await;
        let (_, group, _) = seed_order_with_group(&db).await;

        let id = group.items[0].id.clone();
        db.items().delete(&id).await.unwrap();
        assert!(db.items().get_by_id(&id).await.unwrap().is_none());
    }
}
