//! # Shift Repository

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use bistro_core::Shift;

const SELECT_SHIFT: &str = r#"
    SELECT id, attendant_id, current_order_number, opened_at, closed_at
    FROM shifts
"#;

/// Repository for shifts.
#[derive(Debug, Clone)]
pub struct ShiftRepository {
    pool: SqlitePool,
}

impl ShiftRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ShiftRepository { pool }
    }

    pub async fn insert(&self, shift: &Shift) -> DbResult<()> {
        debug!(id = %shift.id, attendant_id = %shift.attendant_id, "Inserting shift");

        sqlx::query(
            r#"
            INSERT INTO shifts (id, attendant_id, current_order_number, opened_at, closed_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&shift.id)
        .bind(&shift.attendant_id)
        .bind(shift.current_order_number)
        .bind(shift.opened_at)
        .bind(shift.closed_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Shift>> {
        let shift = sqlx::query_as::<_, Shift>(&format!("{SELECT_SHIFT} WHERE id = ?1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(shift)
    }

    /// The most recently opened shift that is still open.
    pub async fn get_open(&self) -> DbResult<Option<Shift>> {
        let shift = sqlx::query_as::<_, Shift>(&format!(
            "{SELECT_SHIFT} WHERE closed_at IS NULL ORDER BY opened_at DESC LIMIT 1"
        ))
        .fetch_optional(&self.pool)
        .await?;

        Ok(shift)
    }

    /// Writes the counter and the closing time.
    pub async fn save(&self, shift: &Shift) -> DbResult<()> {
        debug!(
            id = %shift.id,
            current_order_number = shift.current_order_number,
            "Saving shift"
        );

        let result = sqlx::query(
            "UPDATE shifts SET current_order_number = ?2, closed_at = ?3 WHERE id = ?1",
        )
        .bind(&shift.id)
        .bind(shift.current_order_number)
        .bind(shift.closed_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Shift", &shift.id));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::test_db;

    #[tokio::test]
    async fn test_insert_get_save() {
        let db = test_db().await;
        let repo = db.shifts();

        let mut shift = Shift::open("attendant-1").unwrap();
        repo.insert(&shift).await.unwrap();
        assert_eq!(repo.get_open().await.unwrap(), Some(shift.clone()));

        shift.next_order_number().unwrap();
        shift.next_order_number().unwrap();
        shift.close().unwrap();
        repo.save(&shift).await.unwrap();

        let loaded = repo.get_by_id(&shift.id).await.unwrap().unwrap();
        assert_eq!(loaded.current_order_number, 2);
        assert!(!loaded.is_open());
        assert!(repo.get_open().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_missing_shift() {
        let db = test_db().await;
        let shift = Shift::open("attendant-1").unwrap();

        assert!(matches!(
            db.shifts().save(&shift).await,
            Err(DbError::NotFound { .. })
        ));
    }
}
