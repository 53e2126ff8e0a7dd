//! # Item Service
//!
//! Adding an item resolves the product and the chosen quantity option,
//! then lets the order pick (or open) the staging group for it.

use tracing::info;

use bistro_core::{CoreError, CoreResult, GroupItemError, Item};

use crate::context::ServiceContext;
use crate::error::{ServiceError, ServiceResult};

#[derive(Debug, Clone)]
pub struct ItemService {
    ctx: ServiceContext,
}

impl ItemService {
    pub fn new(ctx: ServiceContext) -> Self {
        ItemService { ctx }
    }

    pub async fn get(&self, id: &str) -> ServiceResult<Item> {
        self.ctx
            .db
            .items()
            .get_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Item", id))
    }

    /// Adds `product` in the quantity of `quantity_id` to an order.
    ///
    /// The quantity option must belong to the product's category.
    pub async fn add_to_order(
        &self,
        order_id: &str,
        product_id: &str,
        quantity_id: &str,
        observation: Option<String>,
    ) -> ServiceResult<Item> {
        let products = self.ctx.db.products();

        let product = products
            .get_by_id(product_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Product", product_id))?;
        let quantity = products
            .get_quantity(quantity_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Quantity", quantity_id))?;

        if quantity.category_id != product.category_id {
            return Err(CoreError::from(GroupItemError::CategoryInvalid).into());
        }

        let (order, item) = self
            .ctx
            .update_order(order_id, |order| {
                order.add_item(&product, quantity.quantity, observation)
            })
            .await?;

        info!(
            order_id = %order_id,
            item_id = %item.id,
            product_id = %product_id,
            quantity = quantity.quantity,
            total_payable = %order.total_payable,
            "Item added"
        );
        Ok(item)
    }

    /// Removes an item from its group and order.
    pub async fn delete(&self, id: &str) -> ServiceResult<()> {
        let group_id = self
            .get(id)
            .await?
            .group_item_id
            // A complement goes through GroupItemService::delete_complement.
            .ok_or_else(|| ServiceError::not_found("GroupItem", id))?;
        let order_id = self.ctx.order_id_of_group(&group_id).await?;

        self.ctx
            .update_order(&order_id, |order| order.remove_item(id))
            .await?;

        info!(item_id = %id, order_id = %order_id, "Item deleted");
        Ok(())
    }

    // =========================================================================
    // Kitchen Progress
    // =========================================================================

    pub async fn start(&self, id: &str) -> ServiceResult<Item> {
        self.update_item(id, Item::start).await
    }

    pub async fn ready(&self, id: &str) -> ServiceResult<Item> {
        self.update_item(id, Item::ready).await
    }

    pub async fn cancel(&self, id: &str) -> ServiceResult<Item> {
        let item = self.update_item(id, Item::cancel).await?;
        info!(item_id = %id, "Item canceled");
        Ok(item)
    }

    /// Serializes on the owning order, whether the item sits in a group or
    /// is linked as a group's complement.
    async fn update_item<F>(&self, id: &str, change: F) -> ServiceResult<Item>
    where
        F: FnOnce(&mut Item) -> CoreResult<()>,
    {
        let order_id = self.order_id_of_item(id).await?;
        let _guard = self.ctx.locks.lock(&order_id).await;

        let mut item = self.get(id).await?;
        change(&mut item)?;
        self.ctx.db.items().save(&item).await?;

        Ok(item)
    }

    async fn order_id_of_item(&self, id: &str) -> ServiceResult<String> {
        match self.get(id).await?.group_item_id {
            Some(group_id) => self.ctx.order_id_of_group(&group_id).await,
            None => self
                .ctx
                .db
                .group_items()
                .get_by_complement(id)
                .await?
                .map(|group| group.order_id)
                .ok_or_else(|| ServiceError::not_found("GroupItem", id)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{order_with_pizza, seed_catalog, test_services};
    use bistro_core::{CoreError, ItemError, ItemStatus};
    use std::time::Duration;

    #[tokio::test]
    async fn test_items_share_staging_group() {
        let app = test_services().await;
        let catalog = seed_catalog(&app).await;
        let order = order_with_pizza(&app, &catalog).await;

        let half = app
            .items
            .add_to_order(&order.id, &catalog.pizza.id, &catalog.half.id, Some("well done".into()))
            .await
            .unwrap();
        assert_eq!(half.price.cents(), 2000);
        assert_eq!(half.name, "Margherita (Large)");

        let stored = app.orders.get(&order.id).await.unwrap();
        assert_eq!(stored.groups.len(), 1);
        assert_eq!(stored.groups[0].items.len(), 2);
        assert_eq!(stored.total_payable.cents(), 6000);
        assert_eq!(stored.quantity_items, 1.5);
        assert_eq!(app.items.get(&half.id).await.unwrap(), half);
    }

    #[tokio::test]
    async fn test_quantity_from_other_category() {
        let app = test_services().await;
        let catalog = seed_catalog(&app).await;
        let order = order_with_pizza(&app, &catalog).await;

        let err = app
            .items
            .add_to_order(&order.id, &catalog.soda.id, &catalog.half.id, None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Core(CoreError::GroupItem(GroupItemError::CategoryInvalid))
        ));

        let err = app
            .items
            .add_to_order(&order.id, "missing", &catalog.half.id, None)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound { entity: "Product", .. }));
    }

    #[tokio::test]
    async fn test_item_progress() {
        let app = test_services().await;
        let catalog = seed_catalog(&app).await;
        let order = order_with_pizza(&app, &catalog).await;
        let item_id = order.groups[0].items[0].id.clone();

        let err = app.items.start(&item_id).await.unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Core(CoreError::Item(ItemError::InvalidTransition { .. }))
        ));

        app.orders.pending(&order.id).await.unwrap();
        assert_eq!(app.items.start(&item_id).await.unwrap().status, ItemStatus::Started);
        assert_eq!(app.items.ready(&item_id).await.unwrap().status, ItemStatus::Ready);

        let item = app.items.cancel(&item_id).await.unwrap();
        assert_eq!(item.status, ItemStatus::Canceled);
        assert!(matches!(
            app.items.cancel(&item_id).await,
            Err(ServiceError::Core(CoreError::Item(ItemError::AlreadyCanceled)))
        ));
    }

    #[tokio::test]
    async fn test_delete_item() {
        let app = test_services().await;
        let catalog = seed_catalog(&app).await;
        let order = order_with_pizza(&app, &catalog).await;
        let item_id = order.groups[0].items[0].id.clone();

        app.items.delete(&item_id).await.unwrap();

        let stored = app.orders.get(&order.id).await.unwrap();
        assert!(stored.groups[0].items.is_empty());
        assert!(stored.total_payable.is_zero());
        assert!(matches!(
            app.items.get(&item_id).await,
            Err(ServiceError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_complement_progress_waits_for_order_lock() {
        let app = test_services().await;
        let catalog = seed_catalog(&app).await;
        let order = order_with_pizza(&app, &catalog).await;
        let complement = app
            .group_items
            .add_complement(&order.groups[0].id, &catalog.border.id)
            .await
            .unwrap();
        app.orders.pending(&order.id).await.unwrap();

        // An order-level writer holds the lock and saves the graph it loaded.
        let ctx = app.context();
        let guard = ctx.locks.lock(&order.id).await;
        let loaded = app.orders.get(&order.id).await.unwrap();

        let items = app.items.clone();
        let complement_id = complement.id.clone();
        let start = tokio::spawn(async move { items.start(&complement_id).await });

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!start.is_finished());

        ctx.db().orders().save(&loaded).await.unwrap();
        drop(guard);

        let started = start.await.unwrap().unwrap();
        assert_eq!(started.status, ItemStatus::Started);
        let stored = app.items.get(&complement.id).await.unwrap();
        assert_eq!(stored.status, ItemStatus::Started);
    }
}
