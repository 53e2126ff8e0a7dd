//! # Group Item Service
//!
//! Kitchen progress (start, ready, cancel) writes only the group and its
//! items. Removing a group or changing its complement changes what the
//! order owes, so those go through the whole order graph.

use tracing::info;

use bistro_core::{CoreResult, GroupItem, GroupItemStatus, Item};

use crate::context::ServiceContext;
use crate::error::{ServiceError, ServiceResult};

#[derive(Debug, Clone)]
pub struct GroupItemService {
    ctx: ServiceContext,
}

impl GroupItemService {
    pub fn new(ctx: ServiceContext) -> Self {
        GroupItemService { ctx }
    }

    /// Loads a group with its items and complement.
    pub async fn get(&self, id: &str) -> ServiceResult<GroupItem> {
        self.ctx
            .db
            .group_items()
            .get_by_id(id, true)
            .await?
            .ok_or_else(|| ServiceError::not_found("GroupItem", id))
    }

    /// Groups of an order in one status.
    pub async fn list(&self, order_id: &str, status: GroupItemStatus) -> ServiceResult<Vec<GroupItem>> {
        Ok(self
            .ctx
            .db
            .group_items()
            .list_by_order_and_status(order_id, status)
            .await?)
    }

    /// Groups in one status across all orders (the kitchen queue).
    pub async fn list_by_status(&self, status: GroupItemStatus) -> ServiceResult<Vec<GroupItem>> {
        Ok(self.ctx.db.group_items().list_by_status(status).await?)
    }

    pub async fn delete(&self, id: &str) -> ServiceResult<()> {
        let order_id = self.ctx.order_id_of_group(id).await?;
        self.ctx
            .update_order(&order_id, |order| order.remove_group(id))
            .await?;

        info!(group_item_id = %id, order_id = %order_id, "Group item deleted");
        Ok(())
    }

    // =========================================================================
    // Kitchen Progress
    // =========================================================================

    pub async fn start(&self, id: &str) -> ServiceResult<GroupItem> {
        let group = self.update_group(id, GroupItem::start).await?;
        info!(group_item_id = %id, "Group item started");
        Ok(group)
    }

    pub async fn ready(&self, id: &str) -> ServiceResult<GroupItem> {
        let group = self.update_group(id, GroupItem::ready).await?;
        info!(group_item_id = %id, "Group item ready");
        Ok(group)
    }

    pub async fn cancel(&self, id: &str) -> ServiceResult<GroupItem> {
        let group = self
            .update_group(id, |group| {
                group.cancel();
                Ok(())
            })
            .await?;

        info!(group_item_id = %id, "Group item canceled");
        Ok(group)
    }

    async fn update_group<F>(&self, id: &str, change: F) -> ServiceResult<GroupItem>
    where
        F: FnOnce(&mut GroupItem) -> CoreResult<()>,
    {
        let order_id = self.ctx.order_id_of_group(id).await?;
        let _guard = self.ctx.locks.lock(&order_id).await;

        let mut group = self.get(id).await?;
        change(&mut group)?;
        self.ctx.db.group_items().save(&group).await?;

        Ok(group)
    }

    // =========================================================================
    // Complement
    // =========================================================================

    /// Links an add-on (a pizza border, say) to the group.
    pub async fn add_complement(&self, id: &str, product_id: &str) -> ServiceResult<Item> {
        let product = self
            .ctx
            .db
            .products()
            .get_by_id(product_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Product", product_id))?;

        let order_id = self.ctx.order_id_of_group(id).await?;
        let (order, complement) = self
            .ctx
            .update_order(&order_id, |order| order.add_complement(id, &product))
            .await?;

        info!(
            group_item_id = %id,
            complement_item_id = %complement.id,
            total_payable = %order.total_payable,
            "Complement added"
        );
        Ok(complement)
    }

    /// Unlinks and deletes the group's add-on, if it has one.
    pub async fn delete_complement(&self, id: &str) -> ServiceResult<GroupItem> {
        let order_id = self.ctx.order_id_of_group(id).await?;
        let (order, removed) = self
            .ctx
            .update_order(&order_id, |order| order.delete_complement(id))
            .await?;

        if let Some(item) = removed {
            info!(group_item_id = %id, complement_item_id = %item.id, "Complement deleted");
        }

        order
            .groups
            .into_iter()
            .find(|group| group.id == id)
            .ok_or_else(|| ServiceError::not_found("GroupItem", id))
    }
}
