//! Shared handles and the order unit of work.

use std::sync::Arc;

use bistro_core::{CoreResult, Order};
use bistro_db::Database;

use crate::error::{ServiceError, ServiceResult};
use crate::locks::LockTable;

/// What every service holds: the database and the shared lock table.
#[derive(Debug, Clone)]
pub struct ServiceContext {
    pub(crate) db: Database,
    pub(crate) locks: Arc<LockTable>,
}

impl ServiceContext {
    pub fn new(db: Database) -> Self {
        ServiceContext {
            db,
            locks: Arc::new(LockTable::new()),
        }
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    pub(crate) async fn load_order(&self, order_id: &str) -> ServiceResult<Order> {
        self.db
            .orders()
            .get_by_id(order_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Order", order_id))
    }

    /// Locks the order, loads its graph, applies `change` and saves the
    /// graph. Nothing is written when `change` fails.
    pub(crate) async fn update_order<T, F>(&self, order_id: &str, change: F) -> ServiceResult<(Order, T)>
    where
        F: FnOnce(&mut Order) -> CoreResult<T>,
    {
        let _guard = self.locks.lock(order_id).await;

        let mut order = self.load_order(order_id).await?;
        let value = change(&mut order)?;
        self.db.orders().save(&order).await?;

        Ok((order, value))
    }

    /// The order a group belongs to.
    pub(crate) async fn order_id_of_group(&self, group_id: &str) -> ServiceResult<String> {
        self.db
            .group_items()
            .get_by_id(group_id, false)
            .await?
            .map(|group| group.order_id)
            .ok_or_else(|| ServiceError::not_found("GroupItem", group_id))
    }
}
