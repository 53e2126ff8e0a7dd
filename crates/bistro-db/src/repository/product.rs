//! # Product Repository
//!
//! Catalog lookups and inserts: categories, sizes, quantity options and
//! products. Orders only read the catalog when an item is created.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use bistro_core::{Category, Product, QuantityOption, Size};

const SELECT_PRODUCT: &str = r#"
    SELECT id, code, name, description, price_cents, cost_cents, category_id,
           size, is_available, created_at, updated_at
    FROM products
"#;

/// Repository for the catalog.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    // =========================================================================
    // Products
    // =========================================================================

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(&format!("{SELECT_PRODUCT} WHERE id = ?1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    pub async fn get_by_code(&self, code: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(&format!("{SELECT_PRODUCT} WHERE code = ?1"))
            .bind(code)
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    /// Available products of a category, by name.
    pub async fn list_by_category(&self, category_id: &str) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "{SELECT_PRODUCT} WHERE category_id = ?1 AND is_available = 1 ORDER BY name, size"
        ))
        .bind(category_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    pub async fn insert(&self, product: &Product) -> DbResult<()> {
        debug!(id = %product.id, code = %product.code, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, code, name, description, price_cents, cost_cents,
                category_id, size, is_available, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
        )
        .bind(&product.id)
        .bind(&product.code)
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price_cents)
        .bind(product.cost_cents)
        .bind(&product.category_id)
        .bind(&product.size)
        .bind(product.is_available)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Changes the unit price. Items already ordered keep their snapshot.
    pub async fn update_price(&self, id: &str, price_cents: i64) -> DbResult<()> {
        debug!(id = %id, price_cents, "Updating product price");

        let result =
            sqlx::query("UPDATE products SET price_cents = ?2, updated_at = ?3 WHERE id = ?1")
                .bind(id)
                .bind(price_cents)
                .bind(Utc::now())
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    // =========================================================================
    // Categories, sizes, quantities
    // =========================================================================

    pub async fn insert_category(&self, category: &Category) -> DbResult<()> {
        debug!(id = %category.id, name = %category.name, "Inserting category");

        sqlx::query("INSERT INTO categories (id, name) VALUES (?1, ?2)")
            .bind(&category.id)
            .bind(&category.name)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    pub async fn get_category(&self, id: &str) -> DbResult<Option<Category>> {
        let category =
            sqlx::query_as::<_, Category>("SELECT id, name FROM categories WHERE id = ?1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(category)
    }

    pub async fn list_categories(&self) -> DbResult<Vec<Category>> {
        let categories =
            sqlx::query_as::<_, Category>("SELECT id, name FROM categories ORDER BY name")
                .fetch_all(&self.pool)
                .await?;

        Ok(categories)
    }

    pub async fn insert_size(&self, size: &Size) -> DbResult<()> {
        sqlx::query("INSERT INTO sizes (id, name, category_id) VALUES (?1, ?2, ?3)")
            .bind(&size.id)
            .bind(&size.name)
            .bind(&size.category_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    pub async fn list_sizes(&self, category_id: &str) -> DbResult<Vec<Size>> {
        let sizes = sqlx::query_as::<_, Size>(
            "SELECT id, name, category_id FROM sizes WHERE category_id = ?1 ORDER BY rowid",
        )
        .bind(category_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(sizes)
    }

    pub async fn insert_quantity(&self, quantity: &QuantityOption) -> DbResult<()> {
        sqlx::query("INSERT INTO quantities (id, quantity, category_id) VALUES (?1, ?2, ?3)")
            .bind(&quantity.id)
            .bind(quantity.quantity)
            .bind(&quantity.category_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    pub async fn get_quantity(&self, id: &str) -> DbResult<Option<QuantityOption>> {
        let quantity = sqlx::query_as::<_, QuantityOption>(
            "SELECT id, quantity, category_id FROM quantities WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(quantity)
    }

    pub async fn list_quantities(&self, category_id: &str) -> DbResult<Vec<QuantityOption>> {
        let quantities = sqlx::query_as::<_, QuantityOption>(
            "SELECT id, quantity, category_id FROM quantities WHERE category_id = ?1 ORDER BY quantity",
        )
        .bind(category_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(quantities)
    }
}
